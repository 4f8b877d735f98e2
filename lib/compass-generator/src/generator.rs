//! Runs a full generation: load components, resolve them against each other, write the catalog.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use compass_client::{Api, Client, Credentials};
use eventcatalog::{Catalog, ResourcePointer, WriteOptions};
use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::component::{last_segment, ComponentConfig};
use crate::dependencies::{build_identifier_map, resolve_dependencies};
use crate::domain;
use crate::errors::{GeneratorError, GeneratorResult};
use crate::markdown::{FileTemplate, MarkdownTemplate};
use crate::normalize::{normalize, RawComponent};
use crate::sanitize::sanitize_id;
use crate::service::{render, RenderContext};
use crate::settings::{GeneratorSettings, ServiceIdStrategyName, DEFAULT_SERVICE_VERSION};
use crate::team::{TeamEnricher, TeamLookup};

const UNNAMED_COMPONENT: &str = "<unnamed component>";

/// How a component's service id is derived when no explicit id was configured.
pub enum ServiceIdStrategy {
    /// Component name, through `nameMapping`.
    Name,
    /// Last segment of the component's external id, falling back to [`ServiceIdStrategy::Name`].
    CompassId,
    Custom(Box<dyn Fn(&ComponentConfig) -> String + Send + Sync>),
}

impl From<ServiceIdStrategyName> for ServiceIdStrategy {
    fn from(name: ServiceIdStrategyName) -> Self {
        match name {
            ServiceIdStrategyName::Name => ServiceIdStrategy::Name,
            ServiceIdStrategyName::CompassId => ServiceIdStrategy::CompassId,
        }
    }
}

impl fmt::Debug for ServiceIdStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceIdStrategy::Name => write!(f, "Name"),
            ServiceIdStrategy::CompassId => write!(f, "CompassId"),
            ServiceIdStrategy::Custom(_) => write!(f, "Custom"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GenerationFailure {
    pub name: String,
    pub error: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct GenerationSummary {
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub failures: Vec<GenerationFailure>,
}

impl GenerationSummary {
    fn record_failure<N: Into<String>>(&mut self, name: N, error: &GeneratorError) {
        let name = name.into();
        warn!("{name}: {error}");
        self.failed += 1;
        self.failures.push(GenerationFailure {
            name,
            error: error.to_string(),
        });
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

struct LoadedComponent {
    config: ComponentConfig,
    file_id: Option<String>,
    version: String,
}

enum Outcome {
    Written,
    Skipped,
}

pub struct Generator {
    settings: GeneratorSettings,
    catalog: Arc<dyn Catalog>,
    client: Option<Client>,
    strategy: ServiceIdStrategy,
    template: Option<Box<dyn MarkdownTemplate>>,
}

impl Generator {
    pub fn new(settings: GeneratorSettings, catalog: Arc<dyn Catalog>) -> Self {
        let strategy = settings.service_id_strategy.into();
        Self {
            settings,
            catalog,
            client: None,
            strategy,
            template: None,
        }
    }

    /// Uses this client in API mode instead of one built from the settings.
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn with_service_id_strategy(mut self, strategy: ServiceIdStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Replaces both the default markdown and any `markdownTemplate` file from the settings.
    pub fn with_markdown_template(mut self, template: Box<dyn MarkdownTemplate>) -> Self {
        self.template = Some(template);
        self
    }

    pub fn settings(&self) -> &GeneratorSettings {
        &self.settings
    }

    pub async fn run(&self) -> GeneratorResult<GenerationSummary> {
        self.settings.validate()?;

        let file_template = match (&self.template, &self.settings.markdown_template) {
            (None, Some(path)) => Some(FileTemplate::from_path(path)?),
            _ => None,
        };
        let template: Option<&dyn MarkdownTemplate> = match (&self.template, &file_template) {
            (Some(template), _) => Some(&**template),
            (None, Some(template)) => Some(template),
            (None, None) => None,
        };

        let client = self.client()?;
        let dry_run = self.settings.dry_run;
        if dry_run {
            info!("[dry run] no changes will be written to the catalog");
        }

        let mut summary = GenerationSummary::default();
        let loaded = match (&client, &self.settings.api) {
            (Some(client), Some(api)) => {
                self.load_from_api(client, &api.cloud_id, &mut summary)
                    .await?
            }
            _ => self.load_from_files(&mut summary).await,
        };

        let components: Vec<_> = loaded
            .into_iter()
            .filter(|c| self.retain(&c.config))
            .map(|c| {
                let service_id = self.service_id(&c.config, c.file_id.as_deref());
                (c, service_id)
            })
            .collect();
        info!("Processing {} components", components.len());

        let identifiers =
            build_identifier_map(components.iter().map(|(c, id)| (&c.config, id.as_str())));

        if let Some(domain) = &self.settings.domain {
            domain::reconcile(self.catalog.as_ref(), domain, self.settings.format, dry_run)
                .await?;
        }

        let lookup = match (&client, &self.settings.api) {
            (Some(client), Some(api)) => Some(TeamLookup {
                client,
                cloud_id: &api.cloud_id,
            }),
            _ => None,
        };
        let options = WriteOptions::new(self.settings.override_existing, self.settings.format);
        let mut teams = TeamEnricher::new(self.catalog.as_ref(), lookup, options, dry_run);

        for (component, service_id) in &components {
            let config = &component.config;
            let dependencies = resolve_dependencies(config, &identifiers);

            if let Some(owner_id) = &config.owner_id {
                if let Err(e) = teams.enrich(owner_id).await {
                    warn!("{}: unable to write team {owner_id}: {e}", config.name);
                }
            }

            let context = RenderContext {
                compass_url: &self.settings.compass_url,
                service_id,
                version: &component.version,
                dependencies: &dependencies,
                template,
                badges: self.settings.badges,
            };

            match self.write_service(config, &context).await {
                Ok(Outcome::Written) => summary.succeeded += 1,
                Ok(Outcome::Skipped) => summary.skipped += 1,
                Err(e) => {
                    summary.record_failure(config.name.as_str(), &e);
                    continue;
                }
            }

            if let Some(domain) = &self.settings.domain {
                let pointer = ResourcePointer::new(service_id.as_str(), component.version.as_str());
                if let Err(e) =
                    domain::add_service(self.catalog.as_ref(), domain, &pointer, dry_run).await
                {
                    warn!("{}: unable to add service to domain {}: {e}", config.name, domain.id);
                }
            }
        }

        if summary.has_failures() {
            warn!(
                "Generation finished with {} failures ({} succeeded, {} skipped)",
                summary.failed, summary.succeeded, summary.skipped
            );
        } else {
            info!(
                "Generation finished: {} succeeded, {} skipped",
                summary.succeeded, summary.skipped
            );
        }

        Ok(summary)
    }

    fn client(&self) -> GeneratorResult<Option<Client>> {
        let Some(api) = &self.settings.api else {
            return Ok(None);
        };

        if let Some(client) = &self.client {
            return Ok(Some(client.clone()));
        }

        let credentials = Credentials::new(&api.email, &api.api_token);
        Ok(Some(Client::new(Api::Compass, &api.base_url, credentials)?))
    }

    async fn load_from_api(
        &self,
        client: &Client,
        cloud_id: &str,
        summary: &mut GenerationSummary,
    ) -> GeneratorResult<Vec<LoadedComponent>> {
        let scorecards = match client.fetch_scorecard_names(cloud_id).await {
            Ok(names) => Some(names),
            Err(e) => {
                warn!("Unable to fetch scorecard names, using ids instead: {e}");
                None
            }
        };

        let mut loaded = Vec::new();
        for record in client.search_components(cloud_id).await? {
            match RawComponent::from_value(record) {
                Ok(raw) => loaded.push(LoadedComponent {
                    config: normalize(&raw, scorecards.as_ref()),
                    file_id: None,
                    version: DEFAULT_SERVICE_VERSION.to_string(),
                }),
                Err(e) => summary.record_failure(UNNAMED_COMPONENT, &e),
            }
        }

        Ok(loaded)
    }

    async fn load_from_files(&self, summary: &mut GenerationSummary) -> Vec<LoadedComponent> {
        let mut loaded = Vec::new();
        for source in self.settings.services.iter().flatten() {
            match load_file(&source.path).await {
                Ok(raw) => loaded.push(LoadedComponent {
                    config: normalize(&raw, None),
                    file_id: source.id.clone(),
                    version: source
                        .version
                        .clone()
                        .unwrap_or_else(|| DEFAULT_SERVICE_VERSION.to_string()),
                }),
                Err(e) => summary.record_failure(source.path.display().to_string(), &e),
            }
        }
        loaded
    }

    fn retain(&self, config: &ComponentConfig) -> bool {
        let types: Vec<&str> = self.settings.type_filters().collect();
        if !types.is_empty() {
            let matches = config
                .type_id
                .is_some_and(|t| types.iter().any(|f| f.trim().eq_ignore_ascii_case(t.as_ref())));
            if !matches {
                debug!("{}: filtered out by type", config.name);
                return false;
            }
        }

        let names = &self.settings.name_filter;
        if !names.is_empty()
            && !names
                .iter()
                .any(|n| n.trim().eq_ignore_ascii_case(config.name.trim()))
        {
            debug!("{}: filtered out by name", config.name);
            return false;
        }

        true
    }

    fn service_id(&self, config: &ComponentConfig, file_id: Option<&str>) -> String {
        if let Some(id) = file_id {
            return sanitize_id(id);
        }

        match &self.strategy {
            ServiceIdStrategy::Name => name_id(config, &self.settings.name_mapping),
            ServiceIdStrategy::CompassId => match config.id.as_deref() {
                Some(id) => sanitize_id(last_segment(id)),
                None => name_id(config, &self.settings.name_mapping),
            },
            ServiceIdStrategy::Custom(derive) => sanitize_id(&derive(config)),
        }
    }

    async fn write_service(
        &self,
        config: &ComponentConfig,
        context: &RenderContext<'_>,
    ) -> GeneratorResult<Outcome> {
        let service = render(config, context)?;
        let existing = self.catalog.get_service(&service.id, None).await?;

        if existing.is_some() && !self.settings.override_existing {
            info!("Service {} already exists, skipped", service.id);
            return Ok(Outcome::Skipped);
        }

        let action = if existing.is_some() { "update" } else { "create" };
        if self.settings.dry_run {
            info!(
                "[dry run] would {action} service {} ({})",
                service.id, service.version
            );
            return Ok(Outcome::Written);
        }

        let options = WriteOptions::new(self.settings.override_existing, self.settings.format);
        self.catalog.write_service(&service, options).await?;
        info!("Service {} ({}) {action}d", service.id, service.version);
        Ok(Outcome::Written)
    }
}

fn name_id(config: &ComponentConfig, name_mapping: &IndexMap<String, String>) -> String {
    let name = name_mapping
        .get(&config.name)
        .map(String::as_str)
        .unwrap_or(&config.name);
    sanitize_id(name)
}

async fn load_file(path: &Path) -> GeneratorResult<RawComponent> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| GeneratorError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
    RawComponent::from_yaml(&content)
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;
    use std::sync::Arc;

    use compass_client::{Api, Client, Credentials};
    use eventcatalog::Service;
    use serde_json::json;
    use tempfile::TempDir;
    use testing::{MemoryCatalog, ScriptedTransport};

    use crate::component::ComponentConfig;
    use crate::dependencies::ResolvedDependency;
    use crate::generator::{Generator, ServiceIdStrategy};
    use crate::markdown::StructuredLinks;
    use crate::settings::{
        ApiSettings, DomainSettings, GeneratorSettings, ServiceIdStrategyName, ServiceSource,
    };

    const COMPASS_URL: &str = "https://acme.atlassian.net/compass";

    fn write_component(dir: &Path, file: &str, content: &str) -> ServiceSource {
        let path = dir.join(file);
        fs::write(&path, content).unwrap();
        ServiceSource {
            path,
            ..Default::default()
        }
    }

    fn two_components(dir: &Path) -> Vec<ServiceSource> {
        vec![
            write_component(
                dir,
                "a.yml",
                "name: A\nid: eid-A\ntypeId: SERVICE\nownerId: ari:cloud:teams/platform\nrelationships:\n  DEPENDS_ON:\n    - eid-B\n",
            ),
            write_component(
                dir,
                "b.yml",
                "name: B\nid: eid-B\ntypeId: LIBRARY\nownerId: ari:cloud:teams/platform\n",
            ),
        ]
    }

    fn file_settings(services: Vec<ServiceSource>) -> GeneratorSettings {
        GeneratorSettings {
            services: Some(services),
            compass_url: COMPASS_URL.to_string(),
            domain: Some(DomainSettings {
                id: "orders".to_string(),
                name: "Orders".to_string(),
                version: "0.0.1".to_string(),
            }),
            ..Default::default()
        }
    }

    fn markdown(service: Option<Service>) -> String {
        service.unwrap().markdown
    }

    #[tokio::test]
    async fn dependencies_link_to_resolved_services() {
        let dir = TempDir::new().unwrap();
        let catalog = Arc::new(MemoryCatalog::new());
        let generator = Generator::new(file_settings(two_components(dir.path())), catalog.clone());

        let summary = generator.run().await.unwrap();

        assert_eq!(2, summary.succeeded);
        assert!(markdown(catalog.service("A")).contains("* [B](../../B/)"));
        assert!(markdown(catalog.service("B")).contains("No known dependencies."));
        assert_eq!(1, catalog.team_writes());
        assert_eq!(
            Some(vec!["platform".to_string()]),
            catalog.service("A").unwrap().owners
        );
    }

    #[tokio::test]
    async fn second_run_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let catalog = Arc::new(MemoryCatalog::new());
        let generator = Generator::new(file_settings(two_components(dir.path())), catalog.clone());

        generator.run().await.unwrap();
        let first = catalog.services();
        generator.run().await.unwrap();

        assert_eq!(1, catalog.domain_writes());
        assert_eq!(0, catalog.domain_versions());
        assert_eq!(first, catalog.services());
        let domain = catalog.domain("orders").unwrap();
        assert_eq!("0.0.1", domain.version);
        assert_eq!(2, domain.services.len());
    }

    #[tokio::test]
    async fn unreadable_file_is_recorded_and_others_are_written() {
        let dir = TempDir::new().unwrap();
        let mut services = two_components(dir.path());
        services.push(write_component(dir.path(), "broken.yml", "description: no name\n"));
        services.push(ServiceSource {
            path: dir.path().join("missing.yml"),
            ..Default::default()
        });
        let catalog = Arc::new(MemoryCatalog::new());

        let summary = Generator::new(file_settings(services), catalog.clone())
            .run()
            .await
            .unwrap();

        assert_eq!(2, summary.succeeded);
        assert_eq!(2, summary.failed);
        assert!(summary.failures[0].name.ends_with("broken.yml"));
        assert_eq!(
            "component record is missing a name",
            summary.failures[0].error
        );
        assert!(summary.failures[1].error.starts_with("unable to read"));
        assert_eq!(2, catalog.service_writes());
    }

    #[tokio::test]
    async fn existing_service_is_skipped_without_override() {
        let dir = TempDir::new().unwrap();
        let catalog = Arc::new(MemoryCatalog::new());
        catalog.insert_service(Service {
            id: "A".to_string(),
            name: "A".to_string(),
            version: "0.0.0".to_string(),
            markdown: "hand written".to_string(),
            ..Default::default()
        });
        let mut settings = file_settings(two_components(dir.path()));
        settings.override_existing = false;

        let summary = Generator::new(settings, catalog.clone()).run().await.unwrap();

        assert_eq!(1, summary.succeeded);
        assert_eq!(1, summary.skipped);
        assert_eq!("hand written", markdown(catalog.service("A")));
    }

    #[tokio::test]
    async fn dry_run_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let catalog = Arc::new(MemoryCatalog::new());
        let mut settings = file_settings(two_components(dir.path()));
        settings.dry_run = true;

        let summary = Generator::new(settings, catalog.clone()).run().await.unwrap();

        assert_eq!(2, summary.succeeded);
        assert_eq!(0, catalog.total_writes());
    }

    #[tokio::test]
    async fn invalid_settings_fail_before_any_io() {
        let catalog = Arc::new(MemoryCatalog::new());
        let settings = GeneratorSettings {
            compass_url: COMPASS_URL.to_string(),
            ..Default::default()
        };

        let err = Generator::new(settings, catalog.clone()).run().await.unwrap_err();

        assert!(err.to_string().starts_with("invalid configuration"));
        assert_eq!(0, catalog.total_writes());
    }

    #[tokio::test]
    async fn explicit_id_and_version_override_strategy() {
        let dir = TempDir::new().unwrap();
        let mut services = two_components(dir.path());
        services[0].id = Some("orders api".to_string());
        services[0].version = Some("1.2.0".to_string());
        let catalog = Arc::new(MemoryCatalog::new());

        Generator::new(file_settings(services), catalog.clone())
            .with_service_id_strategy(ServiceIdStrategy::Custom(Box::new(|c| {
                format!("custom/{}", c.name)
            })))
            .run()
            .await
            .unwrap();

        assert_eq!("1.2.0", catalog.service("orders-api").unwrap().version);
        assert!(catalog.service("custom-B").is_some());
    }

    #[tokio::test]
    async fn filters_by_type_and_name() {
        let dir = TempDir::new().unwrap();
        let catalog = Arc::new(MemoryCatalog::new());
        let mut settings = file_settings(two_components(dir.path()));
        settings.type_filter = vec!["service".to_string()];
        settings.name_mapping.insert("A".to_string(), "alpha".to_string());

        Generator::new(settings, catalog.clone()).run().await.unwrap();

        let ids: Vec<_> = catalog.services().into_iter().map(|s| s.id).collect();
        assert_eq!(vec!["alpha".to_string()], ids);
    }

    #[tokio::test]
    async fn custom_template_replaces_markdown() {
        let dir = TempDir::new().unwrap();
        let catalog = Arc::new(MemoryCatalog::new());

        Generator::new(file_settings(two_components(dir.path())), catalog.clone())
            .with_markdown_template(Box::new(
                |config: &ComponentConfig, deps: &[ResolvedDependency], _links: &StructuredLinks| {
                    format!("# {} ({} deps)", config.name, deps.len())
                },
            ))
            .run()
            .await
            .unwrap();

        assert_eq!("# A (1 deps)", markdown(catalog.service("A")));
    }

    #[tokio::test]
    async fn api_mode_fetches_and_writes_components() {
        let transport = Arc::new(ScriptedTransport::new());
        transport
            .push_data(json!({
                "compass": { "scorecards": { "nodes": [ { "id": "ari:scorecard/1", "name": "Security" } ] } }
            }))
            .push_data(json!({
                "compass": {
                    "searchComponents": {
                        "nodes": [
                            { "component": {
                                "id": "ari:cloud:compass:component/c-1",
                                "name": "Orders API",
                                "type": "SERVICE",
                                "scorecardScores": [ { "scorecardId": "ari:scorecard/1", "totalScore": 8, "maxTotalScore": 10 } ]
                            } },
                            { "component": { "id": "ari:cloud:compass:component/c-2", "name": "Website", "type": "WEBSITE" } }
                        ],
                        "pageInfo": { "hasNextPage": false, "endCursor": null }
                    }
                }
            }));
        let client = Client::with_transport(
            Api::Compass,
            "https://acme.atlassian.net",
            Credentials::new("dev@example.com", "token"),
            transport.clone(),
        )
        .unwrap();
        let settings = GeneratorSettings {
            api: Some(ApiSettings {
                cloud_id: "cloud-1".to_string(),
                api_token: "token".to_string(),
                email: "dev@example.com".to_string(),
                base_url: "https://acme.atlassian.net".to_string(),
                type_filter: vec!["SERVICE".to_string()],
            }),
            compass_url: COMPASS_URL.to_string(),
            service_id_strategy: ServiceIdStrategyName::CompassId,
            ..Default::default()
        };
        let catalog = Arc::new(MemoryCatalog::new());

        let summary = Generator::new(settings, catalog.clone())
            .with_client(client)
            .run()
            .await
            .unwrap();

        assert_eq!(1, summary.succeeded);
        let service = catalog.service("c-1").unwrap();
        assert_eq!("Orders API", service.name);
        let badges = service.badges.unwrap();
        assert!(badges.iter().any(|b| b.content == "Security: 80%"));
        assert_eq!(0, transport.remaining());
    }

    #[tokio::test]
    async fn api_fetch_failure_aborts_the_run() {
        let transport = Arc::new(ScriptedTransport::new());
        transport
            .push_failure("scorecards unavailable")
            .push_status(http::StatusCode::UNAUTHORIZED, json!({}));
        let client = Client::with_transport(
            Api::Compass,
            "https://acme.atlassian.net",
            Credentials::new("dev@example.com", "token"),
            transport.clone(),
        )
        .unwrap();
        let settings = GeneratorSettings {
            api: Some(ApiSettings {
                cloud_id: "cloud-1".to_string(),
                api_token: "token".to_string(),
                email: "dev@example.com".to_string(),
                base_url: "https://acme.atlassian.net".to_string(),
                type_filter: vec![],
            }),
            compass_url: COMPASS_URL.to_string(),
            ..Default::default()
        };

        let err = Generator::new(settings, Arc::new(MemoryCatalog::new()))
            .with_client(client)
            .run()
            .await
            .unwrap_err();

        assert_eq!(
            "Compass API authentication failed: invalid email or API token",
            err.to_string()
        );
    }
}
