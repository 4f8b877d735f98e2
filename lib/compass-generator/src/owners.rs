//! Batch assignment of Compass component owners from a Terraform team list.

use std::collections::HashMap;

use compass_client::Client;
use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::errors::GeneratorResult;

lazy_static! {
    static ref GROUPS_BLOCK: Regex = Regex::new(r"\bgroups\s*=\s*\[([\s\S]*?)\n\]").unwrap();
    static ref GROUP_NAME: Regex = Regex::new(r#"(?m)^\s*\{?\s*name\s*=\s*"([^"]+)""#).unwrap();
}

/// Team names declared inside the `groups = [ ... ]` block of a tfvars file.
pub fn parse_team_names(tfvars: &str) -> Vec<String> {
    let Some(block) = GROUPS_BLOCK.captures(tfvars).and_then(|c| c.get(1)) else {
        return vec![];
    };

    GROUP_NAME
        .captures_iter(block.as_str())
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Team name to the names of the components it owns.
pub type OwnerMappings = IndexMap<String, Vec<String>>;

pub fn parse_mappings(json: &str) -> GeneratorResult<OwnerMappings> {
    Ok(serde_json::from_str(json)?)
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AssignmentSummary {
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Clients and identifiers used for an owner assignment run.
pub struct OwnerAssignment<'a> {
    pub teams: &'a Client,
    pub compass: &'a Client,
    pub org_id: &'a str,
    /// Compass cloud id, also used as the Teams site id.
    pub cloud_id: &'a str,
    pub dry_run: bool,
}

impl OwnerAssignment<'_> {
    /// Ensures every team exists, then points each mapped component at its team.
    ///
    /// Only the component fetch is fatal. Teams that cannot be ensured and unknown components are
    /// counted as skipped; failed updates are counted as failed.
    pub async fn assign(
        &self,
        team_names: &[String],
        mappings: &OwnerMappings,
    ) -> GeneratorResult<AssignmentSummary> {
        if self.dry_run {
            info!("[dry run] no changes will be made");
        }

        let team_aris = self.ensure_teams(team_names).await;

        let components = self.compass.search_components(self.cloud_id).await?;
        let component_aris = component_aris(&components);
        info!("Fetched {} components", components.len());

        let mut summary = AssignmentSummary::default();
        for (team_name, component_names) in mappings {
            let Some(team_ari) = team_aris.get(team_name) else {
                warn!(
                    "team \"{team_name}\" not available (not in tfvars or creation failed), skipping"
                );
                summary.skipped += component_names.len();
                continue;
            };

            for component_name in component_names {
                let Some(component_ari) = component_aris.get(component_name.as_str()) else {
                    warn!("component \"{component_name}\" not found in Compass, skipping");
                    summary.skipped += 1;
                    continue;
                };

                if self.dry_run {
                    info!("[dry run] would set \"{component_name}\" owner -> {team_name}");
                    summary.updated += 1;
                    continue;
                }

                match self
                    .compass
                    .update_component_owner(component_ari, team_ari)
                    .await
                {
                    Ok(()) => {
                        info!("\"{component_name}\" owner -> {team_name}");
                        summary.updated += 1;
                    }
                    Err(e) => {
                        error!("Failed to update \"{component_name}\": {e}");
                        summary.failed += 1;
                    }
                }
            }
        }

        info!(
            "Done. Updated: {}, Skipped: {}, Failed: {}",
            summary.updated, summary.skipped, summary.failed
        );
        Ok(summary)
    }

    async fn ensure_teams(&self, team_names: &[String]) -> HashMap<String, String> {
        let mut aris = HashMap::new();
        let mut failed = 0;

        for name in team_names {
            if self.dry_run {
                info!("[dry run] would ensure team: {name}");
                aris.insert(name.clone(), format!("ari:cloud:identity::team/dry-run-{name}"));
                continue;
            }

            match self.teams.ensure_team(self.org_id, self.cloud_id, name).await {
                Ok(team) => {
                    info!("Team {name} -> {}", team.id);
                    aris.insert(name.clone(), team.id);
                }
                Err(e) => {
                    warn!("could not ensure team \"{name}\": {e}");
                    failed += 1;
                }
            }
        }

        if failed > 0 {
            warn!("{failed} team(s) could not be created or found and will be skipped");
        }
        aris
    }
}

fn component_aris(components: &[Value]) -> HashMap<&str, &str> {
    components
        .iter()
        .filter_map(|c| {
            let name = c.get("name")?.as_str().filter(|n| !n.is_empty())?;
            let id = c.get("id")?.as_str().filter(|i| !i.is_empty())?;
            Some((name, id))
        })
        .collect()
}
