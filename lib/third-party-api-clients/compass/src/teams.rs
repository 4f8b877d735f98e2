use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::{queries, Client, ClientError, ClientResult};

const TEAM_ARI_PREFIX: &str = "ari:cloud:identity::team/";

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AtlassianTeam {
    pub id: String,
    pub display_name: String,
}

/// Qualifies a bare team id as an identity ARI. Ids that already are ARIs are returned as is.
pub fn team_to_ari(team_id: &str) -> String {
    if team_id.starts_with("ari:") {
        team_id.to_string()
    } else {
        format!("{TEAM_ARI_PREFIX}{team_id}")
    }
}

pub fn org_ari(org_id: &str) -> String {
    format!("ari:cloud:platform::org/{org_id}")
}

#[derive(Debug, Deserialize)]
struct TeamNode {
    team: AtlassianTeam,
}

#[derive(Debug, Deserialize)]
struct TeamSearch {
    nodes: Option<Vec<TeamNode>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TeamSearchQuery {
    team_search_v2: Option<TeamSearch>,
}

#[derive(Debug, Deserialize)]
struct ListTeamsData {
    team: Option<TeamSearchQuery>,
}

#[derive(Debug, Deserialize)]
struct PayloadError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct CreateTeamPayload {
    #[serde(default)]
    errors: Option<Vec<PayloadError>>,
    team: Option<AtlassianTeam>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateTeamMutation {
    create_team: Option<CreateTeamPayload>,
}

#[derive(Debug, Deserialize)]
struct CreateTeamData {
    team: Option<CreateTeamMutation>,
}

impl Client {
    /// Lists the teams of an organization. The search returns at most 200 teams.
    pub async fn list_teams(&self, org_id: &str, site_id: &str) -> ClientResult<Vec<AtlassianTeam>> {
        let data: ListTeamsData = self
            .execute(
                queries::LIST_TEAMS,
                json!({ "orgAri": org_ari(org_id), "siteId": site_id }),
            )
            .await?;

        let teams: Vec<AtlassianTeam> = data
            .team
            .and_then(|t| t.team_search_v2)
            .and_then(|s| s.nodes)
            .unwrap_or_default()
            .into_iter()
            .map(|n| n.team)
            .collect();

        debug!("found {} teams in org {}", teams.len(), org_id);
        Ok(teams)
    }

    pub async fn create_team(&self, org_id: &str, display_name: &str) -> ClientResult<AtlassianTeam> {
        let operation = format!("Create team \"{display_name}\"");
        let data: CreateTeamData = self
            .execute(
                queries::CREATE_TEAM,
                json!({
                    "input": {
                        "displayName": display_name,
                        "description": "",
                        "membershipSettings": "MEMBER_INVITE",
                        "scopeId": org_ari(org_id),
                    }
                }),
            )
            .await?;

        let payload = data.team.and_then(|t| t.create_team);
        let Some(payload) = payload else {
            return Err(ClientError::MutationError {
                operation,
                message: "no team returned".to_string(),
            });
        };

        if let Some(error) = payload.errors.and_then(|e| e.into_iter().next()) {
            return Err(ClientError::MutationError {
                operation,
                message: error.message,
            });
        }

        let team = payload.team.ok_or_else(|| ClientError::MutationError {
            operation,
            message: "no team returned".to_string(),
        })?;
        info!("created team {} ({})", team.display_name, team.id);
        Ok(team)
    }

    /// Returns the team whose display name matches case-insensitively, creating it when absent.
    pub async fn ensure_team(
        &self,
        org_id: &str,
        site_id: &str,
        display_name: &str,
    ) -> ClientResult<AtlassianTeam> {
        let wanted = display_name.to_lowercase();
        let existing = self.list_teams(org_id, site_id).await?;
        if let Some(team) = existing
            .into_iter()
            .find(|t| t.display_name.to_lowercase() == wanted)
        {
            return Ok(team);
        }

        self.create_team(org_id, display_name).await
    }
}

#[cfg(test)]
mod tests {
    use crate::teams::{org_ari, team_to_ari};

    #[test]
    fn bare_team_id_becomes_ari() {
        assert_eq!("ari:cloud:identity::team/abc-123", team_to_ari("abc-123"));
    }

    #[test]
    fn team_ari_is_kept() {
        let ari = "ari:cloud:identity::team/abc-123";
        assert_eq!(ari, team_to_ari(ari));
    }

    #[test]
    fn org_id_becomes_ari() {
        assert_eq!("ari:cloud:platform::org/test-org-id", org_ari("test-org-id"));
    }
}
