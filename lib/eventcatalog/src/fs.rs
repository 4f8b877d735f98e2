use std::ffi::OsString;
use std::path::{Path, PathBuf};

use gray_matter::engine::YAML;
use gray_matter::Matter;
use markup::MarkupFormat;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::fs;
use tracing::debug;

use crate::model::Entity;
use crate::{
    is_latest, Catalog, CatalogError, CatalogResult, Domain, ResourcePointer, Service, Team, User,
    WriteOptions,
};

const VERSIONED_DIR: &str = "versioned";

// formats are probed in this order when reading
const READ_FORMATS: [MarkupFormat; 2] = [MarkupFormat::Mdx, MarkupFormat::Markdown];

/// Catalog backed by an EventCatalog project directory.
///
/// Layout:
/// - `domains/<id>/index.md` with previous versions under `domains/<id>/versioned/<version>/`
/// - `services/<id>/index.md` with the same versioning scheme
/// - `teams/<id>.md` and `users/<id>.md`
#[derive(Clone, Debug)]
pub struct FsCatalog {
    root: PathBuf,
}

impl FsCatalog {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn domain_dir(&self, id: &str) -> PathBuf {
        self.root.join("domains").join(id)
    }

    fn service_dir(&self, id: &str) -> PathBuf {
        self.root.join("services").join(id)
    }

    fn team_stem(&self, id: &str) -> PathBuf {
        self.root.join("teams").join(id)
    }

    fn user_stem(&self, id: &str) -> PathBuf {
        self.root.join("users").join(id)
    }

    async fn locate_versioned<T>(
        &self,
        dir: &Path,
        version: Option<&str>,
    ) -> CatalogResult<Option<(PathBuf, T)>>
    where
        T: DeserializeOwned + Entity,
    {
        if let Some(path) = find_index(dir).await? {
            let current: T = read_entity(&path).await?;
            if is_latest(version) || current.version() == version {
                return Ok(Some((path, current)));
            }
        } else if is_latest(version) {
            return Ok(None);
        }

        let Some(version) = version else {
            return Ok(None);
        };

        match find_index(&dir.join(VERSIONED_DIR).join(version)).await? {
            Some(path) => {
                let entity = read_entity(&path).await?;
                Ok(Some((path, entity)))
            }
            None => Ok(None),
        }
    }

    async fn write_versioned<T>(&self, dir: &Path, entity: &T, options: WriteOptions) -> CatalogResult<()>
    where
        T: Serialize + Entity,
    {
        if let Some(existing) = find_index(dir).await? {
            if !options.override_existing {
                return Err(CatalogError::AlreadyExists {
                    kind: T::KIND,
                    id: entity.id().to_string(),
                });
            }
            fs::remove_file(&existing).await?;
        }

        write_entity(&dir.join(options.format.index_file_name()), entity).await
    }

    async fn get_unversioned<T>(&self, stem: &Path) -> CatalogResult<Option<T>>
    where
        T: DeserializeOwned + Entity,
    {
        match find_file(stem).await? {
            Some(path) => Ok(Some(read_entity(&path).await?)),
            None => Ok(None),
        }
    }

    async fn write_unversioned<T>(&self, stem: &Path, entity: &T, options: WriteOptions) -> CatalogResult<()>
    where
        T: Serialize + Entity,
    {
        if let Some(existing) = find_file(stem).await? {
            if !options.override_existing {
                return Err(CatalogError::AlreadyExists {
                    kind: T::KIND,
                    id: entity.id().to_string(),
                });
            }
            fs::remove_file(&existing).await?;
        }

        write_entity(&append_extension(stem, options.format), entity).await
    }
}

#[async_trait::async_trait]
impl Catalog for FsCatalog {
    async fn get_domain(&self, id: &str, version: Option<&str>) -> CatalogResult<Option<Domain>> {
        Ok(self
            .locate_versioned(&self.domain_dir(id), version)
            .await?
            .map(|(_, domain)| domain))
    }

    async fn write_domain(&self, domain: &Domain, options: WriteOptions) -> CatalogResult<()> {
        self.write_versioned(&self.domain_dir(&domain.id), domain, options)
            .await
    }

    async fn version_domain(&self, id: &str) -> CatalogResult<()> {
        let dir = self.domain_dir(id);
        let Some(current_path) = find_index(&dir).await? else {
            return Err(CatalogError::NotFound {
                kind: Domain::KIND,
                id: id.to_string(),
            });
        };

        let current: Domain = read_entity(&current_path).await?;
        let target_dir = dir.join(VERSIONED_DIR).join(&current.version);
        fs::create_dir_all(&target_dir).await?;

        let file_name = current_path
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(MarkupFormat::default().index_file_name()));
        fs::rename(&current_path, target_dir.join(file_name)).await?;
        debug!("versioned domain {id} at {}", current.version);

        Ok(())
    }

    async fn restore_domain(&self, id: &str, version: &str) -> CatalogResult<()> {
        let dir = self.domain_dir(id);
        if find_index(&dir).await?.is_some() {
            return Err(CatalogError::AlreadyExists {
                kind: Domain::KIND,
                id: id.to_string(),
            });
        }

        let versioned_dir = dir.join(VERSIONED_DIR).join(version);
        let Some(versioned_path) = find_index(&versioned_dir).await? else {
            return Err(CatalogError::NotFound {
                kind: Domain::KIND,
                id: format!("{id}@{version}"),
            });
        };

        let file_name = versioned_path
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(MarkupFormat::default().index_file_name()));
        fs::rename(&versioned_path, dir.join(file_name)).await?;
        // only drops the directory when nothing else was stored next to the index
        if fs::remove_dir(&versioned_dir).await.is_err() {
            debug!("kept {} after restoring domain {id}", versioned_dir.to_string_lossy());
        }
        debug!("restored domain {id} at {version}");

        Ok(())
    }

    async fn add_service_to_domain(
        &self,
        domain_id: &str,
        service: &ResourcePointer,
        domain_version: &str,
    ) -> CatalogResult<()> {
        let Some((path, mut domain)) = self
            .locate_versioned::<Domain>(&self.domain_dir(domain_id), Some(domain_version))
            .await?
        else {
            return Err(CatalogError::NotFound {
                kind: Domain::KIND,
                id: format!("{domain_id}@{domain_version}"),
            });
        };

        if domain.services.contains(service) {
            return Ok(());
        }

        domain.services.push(service.clone());
        write_entity(&path, &domain).await
    }

    async fn get_service(&self, id: &str, version: Option<&str>) -> CatalogResult<Option<Service>> {
        Ok(self
            .locate_versioned(&self.service_dir(id), version)
            .await?
            .map(|(_, service)| service))
    }

    async fn write_service(&self, service: &Service, options: WriteOptions) -> CatalogResult<()> {
        self.write_versioned(&self.service_dir(&service.id), service, options)
            .await
    }

    async fn get_team(&self, id: &str) -> CatalogResult<Option<Team>> {
        self.get_unversioned(&self.team_stem(id)).await
    }

    async fn write_team(&self, team: &Team, options: WriteOptions) -> CatalogResult<()> {
        self.write_unversioned(&self.team_stem(&team.id), team, options)
            .await
    }

    async fn get_user(&self, id: &str) -> CatalogResult<Option<User>> {
        self.get_unversioned(&self.user_stem(id)).await
    }

    async fn write_user(&self, user: &User, options: WriteOptions) -> CatalogResult<()> {
        self.write_unversioned(&self.user_stem(&user.id), user, options)
            .await
    }
}

/// Appends the format's extension to `stem` without replacing anything already after a dot.
fn append_extension(stem: &Path, format: MarkupFormat) -> PathBuf {
    let mut path: OsString = stem.into();
    path.push(".");
    path.push(format.extension());
    path.into()
}

async fn find_index(dir: &Path) -> CatalogResult<Option<PathBuf>> {
    for format in READ_FORMATS {
        let candidate = dir.join(format.index_file_name());
        if fs::try_exists(&candidate).await? {
            return Ok(Some(candidate));
        }
    }

    Ok(None)
}

async fn find_file(stem: &Path) -> CatalogResult<Option<PathBuf>> {
    for format in READ_FORMATS {
        let candidate = append_extension(stem, format);
        if fs::try_exists(&candidate).await? {
            return Ok(Some(candidate));
        }
    }

    Ok(None)
}

async fn read_entity<T>(path: &Path) -> CatalogResult<T>
where
    T: DeserializeOwned + Entity,
{
    let content = fs::read_to_string(path).await?;
    parse_entity(path, &content)
}

fn parse_entity<T>(path: &Path, content: &str) -> CatalogResult<T>
where
    T: DeserializeOwned + Entity,
{
    let matter = Matter::<YAML>::new();
    let parsed = matter.parse(content);
    let frontmatter_error = |message: String| CatalogError::Frontmatter {
        path: path.to_path_buf(),
        message,
    };

    let data = parsed
        .data
        .ok_or_else(|| frontmatter_error("missing frontmatter".to_string()))?;
    let mut entity: T = data
        .deserialize()
        .map_err(|e| frontmatter_error(e.to_string()))?;
    entity.set_markdown(parsed.content.trim().to_string());

    Ok(entity)
}

fn render_entity<T>(entity: &T) -> CatalogResult<String>
where
    T: Serialize + Entity,
{
    let frontmatter = serde_yaml::to_string(entity)?;
    Ok(format!("---\n{frontmatter}---\n\n{}\n", entity.markdown()))
}

async fn write_entity<T>(path: &Path, entity: &T) -> CatalogResult<()>
where
    T: Serialize + Entity,
{
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }

    fs::write(path, render_entity(entity)?).await?;
    debug!("wrote {} {} to {}", T::KIND, entity.id(), path.to_string_lossy());
    Ok(())
}
