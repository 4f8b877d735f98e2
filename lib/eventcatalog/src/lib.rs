//! EventCatalog entity model and the catalog persistence seam.
//!
//! The generator never manages the catalog's file layout directly. It talks to a [`Catalog`],
//! which EventCatalog's directory structure ([`fs::FsCatalog`]) or any other store implements.

pub mod fs;
pub mod model;

use std::path::PathBuf;

use markup::MarkupFormat;
use thiserror::Error;

pub use crate::model::{
    Attachment, Badge, Domain, Repository, ResourcePointer, Service, Specification,
    SpecificationType, Styles, Team, User,
};

/// Version tag that addresses the current version of an entity.
pub const LATEST: &str = "latest";

#[remain::sorted]
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{kind} {id} already exists")]
    AlreadyExists { kind: &'static str, id: String },

    #[error("invalid frontmatter in {path}: {message}")]
    Frontmatter { path: PathBuf, message: String },

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },

    #[error("yaml serialize/deserialize error: {0}")]
    SerdeYaml(#[from] serde_yaml::Error),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WriteOptions {
    /// Replace an existing entity instead of failing with [`CatalogError::AlreadyExists`].
    pub override_existing: bool,
    pub format: MarkupFormat,
}

impl WriteOptions {
    pub fn new(override_existing: bool, format: MarkupFormat) -> Self {
        Self {
            override_existing,
            format,
        }
    }
}

/// Returns true when `version` addresses the current version of an entity.
pub fn is_latest(version: Option<&str>) -> bool {
    matches!(version, None | Some(LATEST))
}

#[async_trait::async_trait]
pub trait Catalog: Send + Sync {
    /// Fetches a domain at `version`, where `None` or `"latest"` means the current version.
    async fn get_domain(&self, id: &str, version: Option<&str>) -> CatalogResult<Option<Domain>>;

    async fn write_domain(&self, domain: &Domain, options: WriteOptions) -> CatalogResult<()>;

    /// Moves the current version of a domain aside so a new version can be written.
    async fn version_domain(&self, id: &str) -> CatalogResult<()>;

    /// Promotes a previously versioned domain back to the current version, keeping its stored
    /// content. The current version must have been moved aside first.
    async fn restore_domain(&self, id: &str, version: &str) -> CatalogResult<()>;

    async fn add_service_to_domain(
        &self,
        domain_id: &str,
        service: &ResourcePointer,
        domain_version: &str,
    ) -> CatalogResult<()>;

    async fn get_service(&self, id: &str, version: Option<&str>)
        -> CatalogResult<Option<Service>>;

    async fn write_service(&self, service: &Service, options: WriteOptions) -> CatalogResult<()>;

    async fn get_team(&self, id: &str) -> CatalogResult<Option<Team>>;

    async fn write_team(&self, team: &Team, options: WriteOptions) -> CatalogResult<()>;

    async fn get_user(&self, id: &str) -> CatalogResult<Option<User>>;

    async fn write_user(&self, user: &User, options: WriteOptions) -> CatalogResult<()>;
}
