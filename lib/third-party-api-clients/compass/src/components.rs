use std::collections::HashMap;

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::{queries, Client, ClientError, ClientResult};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    has_next_page: bool,
    end_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ComponentNode {
    component: Value,
}

// searchComponents is a union of the connection and a QueryError
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchComponentsResult {
    nodes: Option<Vec<ComponentNode>>,
    page_info: Option<PageInfo>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompassSearch {
    search_components: SearchComponentsResult,
}

#[derive(Debug, Deserialize)]
struct SearchComponentsData {
    compass: CompassSearch,
}

/// One page of raw component records. Components are left as JSON for the caller to normalize.
#[derive(Debug, Default)]
pub struct ComponentPage {
    pub components: Vec<Value>,
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ScorecardNode {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct ScorecardConnection {
    #[serde(default)]
    nodes: Vec<ScorecardNode>,
}

#[derive(Debug, Deserialize)]
struct CompassScorecards {
    scorecards: Option<ScorecardConnection>,
}

#[derive(Debug, Deserialize)]
struct ScorecardsData {
    compass: CompassScorecards,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct TeamMember {
    pub name: String,
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TeamDetails {
    pub id: String,
    pub display_name: String,
    pub members: Vec<TeamMember>,
}

#[derive(Debug, Deserialize)]
struct MemberNode {
    member: Option<TeamMember>,
}

#[derive(Debug, Deserialize)]
struct MemberConnection {
    #[serde(default)]
    nodes: Vec<MemberNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TeamV2 {
    id: String,
    display_name: String,
    members: Option<MemberConnection>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TeamQuery {
    team_v2: Option<TeamV2>,
}

#[derive(Debug, Deserialize)]
struct TeamData {
    team: Option<TeamQuery>,
}

#[derive(Debug, Deserialize)]
struct PayloadError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct UpdateComponentPayload {
    #[serde(default)]
    errors: Option<Vec<PayloadError>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompassUpdate {
    update_component: Option<UpdateComponentPayload>,
}

#[derive(Debug, Deserialize)]
struct UpdateComponentData {
    compass: CompassUpdate,
}

impl Client {
    pub async fn search_components_page(
        &self,
        cloud_id: &str,
        after: Option<&str>,
    ) -> ClientResult<ComponentPage> {
        let data: SearchComponentsData = self
            .execute(
                queries::SEARCH_COMPONENTS,
                json!({ "cloudId": cloud_id, "after": after }),
            )
            .await?;

        let result = data.compass.search_components;
        let Some(nodes) = result.nodes else {
            return Err(ClientError::GraphqlError {
                api: self.api,
                message: result
                    .message
                    .unwrap_or_else(|| "searchComponents returned no results".to_string()),
            });
        };

        let (has_next_page, end_cursor) = result
            .page_info
            .map(|p| (p.has_next_page, p.end_cursor))
            .unwrap_or((false, None));

        Ok(ComponentPage {
            components: nodes.into_iter().map(|n| n.component).collect(),
            has_next_page,
            end_cursor,
        })
    }

    /// Fetches every component, following `endCursor` while `hasNextPage` is set.
    pub async fn search_components(&self, cloud_id: &str) -> ClientResult<Vec<Value>> {
        let mut components = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let page = self
                .search_components_page(cloud_id, cursor.as_deref())
                .await?;
            debug!("fetched page of {} components", page.components.len());
            components.extend(page.components);

            if !page.has_next_page {
                break;
            }

            match page.end_cursor {
                Some(next) => cursor = Some(next),
                None => {
                    warn!("searchComponents reported another page without a cursor, stopping");
                    break;
                }
            }
        }

        info!("Fetched {} components from Compass", components.len());
        Ok(components)
    }

    /// Maps scorecard ids to their display names.
    pub async fn fetch_scorecard_names(
        &self,
        cloud_id: &str,
    ) -> ClientResult<HashMap<String, String>> {
        let data: ScorecardsData = self
            .execute(queries::SCORECARDS, json!({ "cloudId": cloud_id }))
            .await?;

        Ok(data
            .compass
            .scorecards
            .map(|s| s.nodes)
            .unwrap_or_default()
            .into_iter()
            .map(|n| (n.id, n.name))
            .collect())
    }

    /// Looks up a team and its members. `Ok(None)` means the API does not know the team.
    pub async fn fetch_team_by_id(
        &self,
        team_id: &str,
        site_id: &str,
    ) -> ClientResult<Option<TeamDetails>> {
        let data: TeamData = self
            .execute(
                queries::TEAM_BY_ID,
                json!({ "id": team_id, "siteId": site_id }),
            )
            .await?;

        Ok(data.team.and_then(|t| t.team_v2).map(|team| TeamDetails {
            id: team.id,
            display_name: team.display_name,
            members: team
                .members
                .map(|m| m.nodes)
                .unwrap_or_default()
                .into_iter()
                .filter_map(|n| n.member)
                .collect(),
        }))
    }

    pub async fn update_component_owner(
        &self,
        component_id: &str,
        owner_id: &str,
    ) -> ClientResult<()> {
        let data: UpdateComponentData = self
            .execute(
                queries::UPDATE_COMPONENT_OWNER,
                json!({ "input": { "id": component_id, "ownerId": owner_id } }),
            )
            .await?;

        let first_error = data
            .compass
            .update_component
            .and_then(|p| p.errors)
            .and_then(|errors| errors.into_iter().next());

        match first_error {
            Some(error) => Err(ClientError::MutationError {
                operation: "Compass update component".to_string(),
                message: error.message,
            }),
            None => Ok(()),
        }
    }
}
