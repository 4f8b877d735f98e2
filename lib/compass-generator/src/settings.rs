use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use markup::MarkupFormat;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::{GeneratorError, GeneratorResult};

pub const DEFAULT_SETTINGS_FILE: &str = "compass-catalog.toml";

pub const DEFAULT_SERVICE_VERSION: &str = "0.0.0";

/// Settings for a generator run, usually read from `compass-catalog.toml`.
///
/// Exactly one of `services` (local `compass.yml` files) or `api` (Compass GraphQL) selects where
/// components come from.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratorSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub services: Option<Vec<ServiceSource>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api: Option<ApiSettings>,

    /// Base of the human-facing Compass links, e.g. `https://acme.atlassian.net/compass`.
    #[serde(default)]
    pub compass_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<DomainSettings>,

    #[serde(default)]
    pub debug: bool,

    #[serde(default = "enabled")]
    pub override_existing: bool,

    #[serde(default)]
    pub type_filter: Vec<String>,

    #[serde(default)]
    pub name_filter: Vec<String>,

    /// Component name to the name its service id is derived from.
    #[serde(default)]
    pub name_mapping: IndexMap<String, String>,

    #[serde(default)]
    pub service_id_strategy: ServiceIdStrategyName,

    /// minijinja template replacing the default service markdown.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markdown_template: Option<PathBuf>,

    #[serde(default)]
    pub format: MarkupFormat,

    #[serde(default)]
    pub dry_run: bool,

    #[serde(default = "enabled")]
    pub badges: bool,
}

fn enabled() -> bool {
    true
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            services: None,
            api: None,
            compass_url: String::new(),
            domain: None,
            debug: false,
            override_existing: true,
            type_filter: vec![],
            name_filter: vec![],
            name_mapping: IndexMap::new(),
            service_id_strategy: ServiceIdStrategyName::default(),
            markdown_template: None,
            format: MarkupFormat::default(),
            dry_run: false,
            badges: true,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSource {
    pub path: PathBuf,
    /// Overrides whatever id the strategy would derive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Compass API access. `api_token` and `email` may be `$ENV_VAR` references.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSettings {
    #[serde(default)]
    pub cloud_id: String,
    #[serde(default)]
    pub api_token: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub type_filter: Vec<String>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
pub struct DomainSettings {
    pub id: String,
    pub name: String,
    pub version: String,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
pub enum ServiceIdStrategyName {
    #[default]
    #[serde(rename = "name")]
    Name,
    #[serde(rename = "compass-id")]
    CompassId,
}

impl GeneratorSettings {
    pub fn from_path(path: &Path) -> GeneratorResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| GeneratorError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> GeneratorResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Checks everything up front and reports all problems at once.
    pub fn validate(&self) -> GeneratorResult<()> {
        let mut errors = Vec::new();

        match (&self.services, &self.api) {
            (Some(_), Some(_)) => errors.push(
                "Cannot use both \"services\" and \"api\", choose one mode".to_string(),
            ),
            (None, None) => errors.push(
                "Either \"services\" (file mode) or \"api\" (API mode) must be provided"
                    .to_string(),
            ),
            _ => {}
        }

        if let Some(services) = &self.services {
            if services.is_empty() {
                errors.push("At least one service is required".to_string());
            }
            for (i, service) in services.iter().enumerate() {
                if service.path.as_os_str().is_empty() {
                    errors.push(format!("services[{i}]: Service path is required"));
                }
            }
        }

        if Url::parse(&self.compass_url).is_err() {
            errors.push("compassUrl must be a valid URL".to_string());
        }

        if let Some(api) = &self.api {
            for (field, value) in [
                ("cloudId", &api.cloud_id),
                ("apiToken", &api.api_token),
                ("email", &api.email),
            ] {
                if value.trim().is_empty() {
                    errors.push(format!("api.{field} is required"));
                }
            }

            match Url::parse(&api.base_url) {
                Ok(url) if url.scheme() == "https" => {}
                Ok(_) => errors
                    .push("api.baseUrl must use HTTPS to protect API credentials".to_string()),
                Err(_) => errors.push("api.baseUrl must be a valid URL".to_string()),
            }

            check_filter("api.typeFilter", &api.type_filter, &mut errors);
        }

        if let Some(domain) = &self.domain {
            for (field, value) in [
                ("id", &domain.id),
                ("name", &domain.name),
                ("version", &domain.version),
            ] {
                if value.trim().is_empty() {
                    errors.push(format!("domain.{field} is required"));
                }
            }
        }

        check_filter("typeFilter", &self.type_filter, &mut errors);
        check_filter("nameFilter", &self.name_filter, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(GeneratorError::InvalidConfiguration(errors))
        }
    }

    /// Type filter entries from both the top level and the API section.
    pub fn type_filters(&self) -> impl Iterator<Item = &str> {
        self.type_filter
            .iter()
            .chain(self.api.iter().flat_map(|a| a.type_filter.iter()))
            .map(String::as_str)
    }
}

fn check_filter(name: &str, entries: &[String], errors: &mut Vec<String>) {
    if entries.iter().any(|e| e.trim().is_empty()) {
        errors.push(format!("{name} entries must not be empty"));
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use markup::MarkupFormat;

    use crate::errors::GeneratorError;
    use crate::settings::{
        ApiSettings, GeneratorSettings, ServiceIdStrategyName, ServiceSource,
    };

    fn violations(settings: &GeneratorSettings) -> Vec<String> {
        match settings.validate() {
            Err(GeneratorError::InvalidConfiguration(errors)) => errors,
            other => panic!("expected invalid configuration, got {other:?}"),
        }
    }

    fn api() -> ApiSettings {
        ApiSettings {
            cloud_id: "cloud-1".to_string(),
            api_token: "$COMPASS_API_TOKEN".to_string(),
            email: "dev@example.com".to_string(),
            base_url: "https://acme.atlassian.net".to_string(),
            type_filter: vec![],
        }
    }

    #[test]
    fn parses_toml() {
        let settings = GeneratorSettings::from_toml(
            r#"
compassUrl = "https://acme.atlassian.net/compass"
format = "mdx"
serviceIdStrategy = "compass-id"
overrideExisting = false
typeFilter = ["SERVICE"]

[[services]]
path = "services/orders/compass.yml"
version = "1.2.0"

[domain]
id = "orders"
name = "Orders"
version = "0.0.1"

[nameMapping]
"Orders API" = "orders"
"#,
        )
        .unwrap();

        assert_eq!(MarkupFormat::Mdx, settings.format);
        assert_eq!(ServiceIdStrategyName::CompassId, settings.service_id_strategy);
        assert!(!settings.override_existing);
        assert!(settings.badges);
        assert_eq!(
            Some("1.2.0".to_string()),
            settings.services.as_ref().unwrap()[0].version
        );
        assert_eq!("orders", settings.name_mapping["Orders API"]);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn defaults_override_existing() {
        let settings = GeneratorSettings::from_toml(
            "compassUrl = \"https://acme.atlassian.net/compass\"\n[[services]]\npath = \"a.yml\"",
        )
        .unwrap();
        assert!(settings.override_existing);
        assert_eq!(ServiceIdStrategyName::Name, settings.service_id_strategy);
    }

    #[test]
    fn both_modes_are_rejected() {
        let settings = GeneratorSettings {
            services: Some(vec![ServiceSource {
                path: PathBuf::from("a.yml"),
                ..Default::default()
            }]),
            api: Some(api()),
            compass_url: "https://acme.atlassian.net/compass".to_string(),
            ..Default::default()
        };

        assert_eq!(
            vec!["Cannot use both \"services\" and \"api\", choose one mode".to_string()],
            violations(&settings)
        );
    }

    #[test]
    fn all_violations_are_reported() {
        let settings = GeneratorSettings {
            compass_url: "not a url".to_string(),
            type_filter: vec!["".to_string()],
            ..Default::default()
        };

        let errors = violations(&settings);
        assert_eq!(3, errors.len());
        assert!(errors[0].starts_with("Either \"services\""));
        assert_eq!("compassUrl must be a valid URL", errors[1]);
        assert_eq!("typeFilter entries must not be empty", errors[2]);
    }

    #[test]
    fn empty_services_list_is_rejected() {
        let settings = GeneratorSettings {
            services: Some(vec![]),
            compass_url: "https://acme.atlassian.net/compass".to_string(),
            ..Default::default()
        };

        assert_eq!(
            vec!["At least one service is required".to_string()],
            violations(&settings)
        );
    }

    #[test]
    fn api_base_url_must_be_https() {
        let mut api = api();
        api.base_url = "http://acme.atlassian.net".to_string();
        api.email = " ".to_string();
        let settings = GeneratorSettings {
            api: Some(api),
            compass_url: "https://acme.atlassian.net/compass".to_string(),
            ..Default::default()
        };

        assert_eq!(
            vec![
                "api.email is required".to_string(),
                "api.baseUrl must use HTTPS to protect API credentials".to_string(),
            ],
            violations(&settings)
        );
    }

    #[test]
    fn type_filters_merge_both_sections() {
        let mut api = api();
        api.type_filter = vec!["WEBSITE".to_string()];
        let settings = GeneratorSettings {
            api: Some(api),
            type_filter: vec!["SERVICE".to_string()],
            ..Default::default()
        };

        assert_eq!(
            vec!["SERVICE", "WEBSITE"],
            settings.type_filters().collect::<Vec<_>>()
        );
    }
}
