use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use crate::component::ComponentConfig;

/// Where a component ended up in the catalog.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceRef {
    pub service_id: String,
    pub name: String,
}

/// External component id to the service generated for it, built once per run.
pub type IdentifierMap = HashMap<String, ServiceRef>;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ResolvedDependency {
    pub id: String,
    pub name: String,
}

/// Records every component that has an external id. Later duplicates replace earlier ones.
pub fn build_identifier_map<'a, I>(components: I) -> IdentifierMap
where
    I: IntoIterator<Item = (&'a ComponentConfig, &'a str)>,
{
    let mut map = IdentifierMap::new();
    for (config, service_id) in components {
        if let Some(id) = &config.id {
            map.insert(
                id.clone(),
                ServiceRef {
                    service_id: service_id.to_string(),
                    name: config.name.clone(),
                },
            );
        }
    }
    map
}

/// Resolves `DEPENDS_ON` references against the map, skipping references outside this run.
pub fn resolve_dependencies(config: &ComponentConfig, map: &IdentifierMap) -> Vec<ResolvedDependency> {
    config
        .relationships
        .depends_on
        .iter()
        .filter_map(|reference| match map.get(reference) {
            Some(target) => Some(ResolvedDependency {
                id: target.service_id.clone(),
                name: target.name.clone(),
            }),
            None => {
                debug!("{}: dependency {reference} is not part of this run", config.name);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::component::ComponentConfig;
    use crate::dependencies::{build_identifier_map, resolve_dependencies, ResolvedDependency};

    fn component(name: &str, id: Option<&str>, depends_on: &[&str]) -> ComponentConfig {
        let mut config = ComponentConfig::new(name);
        config.id = id.map(str::to_string);
        config.relationships.depends_on = depends_on.iter().map(|d| d.to_string()).collect();
        config
    }

    #[test]
    fn resolves_known_and_skips_dangling() {
        let a = component("A", Some("eid-A"), &["eid-B", "eid-missing"]);
        let b = component("B", Some("eid-B"), &[]);
        let map = build_identifier_map([(&a, "a-service"), (&b, "b-service")]);

        assert_eq!(
            vec![ResolvedDependency {
                id: "b-service".to_string(),
                name: "B".to_string()
            }],
            resolve_dependencies(&a, &map)
        );
        assert!(resolve_dependencies(&b, &map).is_empty());
    }

    #[test]
    fn self_dependency_resolves() {
        let a = component("A", Some("eid-A"), &["eid-A"]);
        let map = build_identifier_map([(&a, "a-service")]);

        assert_eq!("a-service", resolve_dependencies(&a, &map)[0].id);
    }

    #[test]
    fn last_duplicate_wins() {
        let first = component("First", Some("eid"), &[]);
        let second = component("Second", Some("eid"), &[]);
        let anonymous = component("NoId", None, &[]);
        let map = build_identifier_map([(&first, "first"), (&second, "second"), (&anonymous, "x")]);

        assert_eq!(1, map.len());
        assert_eq!("second", map["eid"].service_id);
    }
}
