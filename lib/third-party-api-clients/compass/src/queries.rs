pub(crate) const SEARCH_COMPONENTS: &str = r#"
  query searchComponents($cloudId: String!, $after: String) {
    compass {
      searchComponents(cloudId: $cloudId, query: { after: $after, first: 50 }) {
        ... on CompassSearchComponentConnection {
          nodes {
            component {
              id
              name
              typeId
              description
              ownerId
              fields {
                definition { name }
                ... on CompassEnumField { value }
              }
              links { type url name }
              relationships(query: { relationshipType: DEPENDS_ON, direction: OUTWARD }) {
                ... on CompassRelationshipConnection {
                  nodes {
                    relationshipType
                    endNode { id }
                  }
                }
              }
              labels { name }
              customFields {
                definition { name }
                ... on CompassCustomTextField { textValue }
                ... on CompassCustomBooleanField { booleanValue }
                ... on CompassCustomNumberField { numberValue }
              }
              scorecardScores { scorecardId totalScore maxTotalScore }
            }
          }
          pageInfo { hasNextPage endCursor }
        }
        ... on QueryError { message }
      }
    }
  }
"#;

pub(crate) const SCORECARDS: &str = r#"
  query scorecards($cloudId: ID!) {
    compass {
      scorecards(cloudId: $cloudId) {
        ... on CompassScorecardConnection {
          nodes { id name }
        }
      }
    }
  }
"#;

pub(crate) const TEAM_BY_ID: &str = r#"
  query teamById($id: ID!, $siteId: String!) {
    team {
      teamV2(id: $id, siteId: $siteId) {
        id
        displayName
        members {
          nodes {
            member {
              name
              picture
              ... on AtlassianAccountUser { email }
              ... on CustomerUser { email }
            }
          }
        }
      }
    }
  }
"#;

pub(crate) const UPDATE_COMPONENT_OWNER: &str = r#"
  mutation updateComponentOwner($input: UpdateCompassComponentInput!) {
    compass {
      updateComponent(input: $input) {
        success
        errors { message }
        componentDetails { id ownerId }
      }
    }
  }
"#;

// teamSearchV2 requires both organizationId (as ARI) and siteId.
pub(crate) const LIST_TEAMS: &str = r#"
  query listTeams($orgAri: ID!, $siteId: ID!) {
    team {
      teamSearchV2(organizationId: $orgAri, siteId: $siteId, first: 200) {
        __typename
        ... on TeamSearchResultConnectionV2 {
          nodes {
            team { id displayName }
          }
        }
      }
    }
  }
"#;

// createTeam requires @optIn(to: "Team-crud") and scopeId as an org ARI.
pub(crate) const CREATE_TEAM: &str = r#"
  mutation createTeam($input: TeamCreateTeamInput!) {
    team {
      createTeam(input: $input) @optIn(to: "Team-crud") {
        success
        errors { message }
        team { id displayName }
      }
    }
  }
"#;
