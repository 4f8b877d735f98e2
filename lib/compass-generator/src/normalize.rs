//! Turns raw component records into [`ComponentConfig`].
//!
//! Records arrive either as parsed `compass.yml` files or as GraphQL search results, and the API
//! has used several shapes for the same data over time. Each shape is one serde adapter below;
//! anything that fits none of them is treated as absent.

use std::collections::HashMap;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::trace;

use crate::component::{
    last_segment, ComponentConfig, CustomField, CustomFieldType, Fields, Lifecycle, Link,
    LinkType, Relationships, Scorecard, TypeId,
};
use crate::errors::{GeneratorError, GeneratorResult};

const DEPENDS_ON: &str = "DEPENDS_ON";

/// A component record whose only verified property is a non-blank `name`.
#[derive(Clone, Debug, PartialEq)]
pub struct RawComponent {
    name: String,
    record: Value,
}

impl RawComponent {
    pub fn from_value(record: Value) -> GeneratorResult<Self> {
        let name = record
            .get("name")
            .and_then(Value::as_str)
            .filter(|n| !n.trim().is_empty())
            .ok_or(GeneratorError::MissingComponentName)?
            .to_string();

        Ok(Self { name, record })
    }

    /// Parses a `compass.yml` document.
    pub fn from_yaml(content: &str) -> GeneratorResult<Self> {
        let record: Value = serde_yaml::from_str(content)?;
        Self::from_value(record)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> Option<&str> {
        non_empty_str(self.record.get("id"))
    }

    pub fn record(&self) -> &Value {
        &self.record
    }
}

pub fn normalize(
    raw: &RawComponent,
    scorecard_names: Option<&HashMap<String, String>>,
) -> ComponentConfig {
    let record = &raw.record;

    ComponentConfig {
        name: raw.name.clone(),
        id: raw.id().map(str::to_string),
        description: non_empty_str(record.get("description")).map(str::to_string),
        type_id: non_empty_str(present(record, "typeId").or_else(|| present(record, "type")))
            .and_then(|t| TypeId::from_str(&t.trim().to_uppercase()).ok()),
        owner_id: non_empty_str(record.get("ownerId")).map(str::to_string),
        fields: lenient::<FieldsShape>(record.get("fields"))
            .map(FieldsShape::into_fields)
            .unwrap_or_default(),
        links: lenient::<Vec<Value>>(record.get("links"))
            .unwrap_or_default()
            .iter()
            .filter_map(link)
            .collect(),
        relationships: Relationships {
            depends_on: lenient::<RelationshipsShape>(record.get("relationships"))
                .map(RelationshipsShape::into_depends_on)
                .unwrap_or_default(),
        },
        labels: lenient::<Vec<Value>>(record.get("labels"))
            .unwrap_or_default()
            .iter()
            .filter_map(label)
            .collect(),
        custom_fields: lenient::<Vec<Value>>(record.get("customFields"))
            .unwrap_or_default()
            .iter()
            .filter_map(|v| lenient::<CustomFieldShape>(Some(v)))
            .filter_map(CustomFieldShape::into_custom_field)
            .collect(),
        scorecards: lenient::<Vec<Value>>(
            present(record, "scorecardScores").or_else(|| present(record, "scorecards")),
        )
        .unwrap_or_default()
        .iter()
        .filter_map(|v| lenient::<ScorecardShape>(Some(v)))
        .map(|s| s.into_scorecard(scorecard_names))
        .collect(),
    }
}

/// First digit 1-4 found anywhere in the value, e.g. `"Tier 3"` or `2`.
pub fn map_tier(raw: &str) -> Option<u8> {
    raw.chars()
        .find(char::is_ascii_digit)
        .and_then(|c| c.to_digit(10))
        .filter(|d| (1..=4).contains(d))
        .map(|d| d as u8)
}

/// Case-normalizes and looks the value up in the known lifecycles. `Prerelease` is accepted.
pub fn map_lifecycle(raw: &str) -> Option<Lifecycle> {
    let raw = raw.trim();
    let mut chars = raw.chars();
    let normalized: String = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => return None,
    };

    match normalized {
        n if n == "Prerelease" => Some(Lifecycle::PreRelease),
        n => Lifecycle::from_str(&n).ok(),
    }
}

/// Display name for a scorecard id: the lookup when it knows the id, else the last path segment.
pub fn resolve_scorecard_name(id: &str, names: Option<&HashMap<String, String>>) -> String {
    names
        .and_then(|n| n.get(id))
        .cloned()
        .unwrap_or_else(|| last_segment(id).to_string())
}

/// The value under `key`, treating an explicit `null` like a missing key.
fn present<'a>(record: &'a Value, key: &str) -> Option<&'a Value> {
    record.get(key).filter(|v| !v.is_null())
}

fn lenient<T: DeserializeOwned>(value: Option<&Value>) -> Option<T> {
    let value = value.filter(|v| !v.is_null())?;
    match T::deserialize(value) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            trace!("ignoring malformed value {value}: {e}");
            None
        }
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

/// Scalar behind `{label}`, `{value}` or single-element list wrappers.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(values) => values.first().and_then(scalar_text),
        Value::Object(map) => ["label", "value", "name"]
            .iter()
            .find_map(|k| map.get(*k))
            .and_then(scalar_text),
        Value::Null => None,
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FieldsShape {
    /// `[{definition: {name}, value}]`
    Definitions(Vec<Value>),
    /// `{lifecycle: "Active", tier: 1}` or `{lifecycle: {label}, tier: {label}}`
    Keyed(Map<String, Value>),
}

impl FieldsShape {
    fn into_fields(self) -> Fields {
        let pairs: Vec<(String, Value)> = match self {
            FieldsShape::Keyed(map) => map.into_iter().collect(),
            FieldsShape::Definitions(entries) => entries
                .into_iter()
                .filter_map(|entry| {
                    let name = entry
                        .get("definition")
                        .and_then(|d| d.get("name"))
                        .and_then(Value::as_str)?
                        .to_string();
                    Some((name, entry.get("value").cloned().unwrap_or(Value::Null)))
                })
                .collect(),
        };

        let mut fields = Fields::default();
        for (name, value) in pairs {
            let Some(text) = scalar_text(&value) else {
                continue;
            };
            match name.to_lowercase().as_str() {
                "lifecycle" => fields.lifecycle = fields.lifecycle.or(map_lifecycle(&text)),
                "tier" => fields.tier = fields.tier.or(map_tier(&text)),
                _ => {}
            }
        }
        fields
    }
}

fn link(value: &Value) -> Option<Link> {
    let url = non_empty_str(value.get("url"))?.to_string();
    let link_type = non_empty_str(value.get("type"))
        .map(LinkType::parse)
        .unwrap_or(LinkType::OtherLink);
    let name = non_empty_str(value.get("name")).map(str::to_string);

    Some(Link {
        link_type,
        url,
        name,
    })
}

fn label(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Object(_) => non_empty_str(value.get("name")).map(str::to_string),
        _ => None,
    }
    .filter(|l| !l.trim().is_empty())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RelationshipsShape {
    /// GraphQL connection `{nodes: [...]}`
    Connection { nodes: Vec<Value> },
    /// Bare list of relationship nodes
    Nodes(Vec<Value>),
    /// `{DEPENDS_ON: [...]}`
    Keyed(Map<String, Value>),
}

impl RelationshipsShape {
    fn into_depends_on(self) -> Vec<String> {
        match self {
            RelationshipsShape::Connection { nodes } | RelationshipsShape::Nodes(nodes) => {
                nodes.iter().filter_map(depends_on_target).collect()
            }
            RelationshipsShape::Keyed(map) => map
                .get(DEPENDS_ON)
                .and_then(Value::as_array)
                .map(|targets| {
                    targets
                        .iter()
                        .filter_map(|t| non_empty_str(Some(t)).map(str::to_string))
                        .collect()
                })
                .unwrap_or_default(),
        }
    }
}

fn depends_on_target(node: &Value) -> Option<String> {
    let relationship_type = node
        .get("type")
        .or_else(|| node.get("relationshipType"))
        .and_then(Value::as_str);
    if relationship_type.is_some_and(|t| t != DEPENDS_ON) {
        return None;
    }

    node.get("endNode")
        .and_then(|n| non_empty_str(n.get("id")))
        .or_else(|| non_empty_str(node.get("endNodeAri")))
        .or_else(|| non_empty_str(node.get("nodeId")))
        .map(str::to_string)
}

#[derive(Deserialize)]
struct CustomFieldDefinition {
    name: String,
    #[serde(rename = "type", default)]
    field_type: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CustomFieldShape {
    #[serde(rename_all = "camelCase")]
    Graphql {
        definition: CustomFieldDefinition,
        #[serde(default)]
        text_value: Option<String>,
        #[serde(default)]
        boolean_value: Option<bool>,
        #[serde(default)]
        number_value: Option<f64>,
    },
    Config {
        #[serde(rename = "type", default)]
        field_type: Option<String>,
        name: String,
        #[serde(default)]
        value: Value,
    },
}

impl CustomFieldShape {
    fn into_custom_field(self) -> Option<CustomField> {
        let (name, explicit_type, inferred, value) = match self {
            CustomFieldShape::Graphql {
                definition,
                text_value,
                boolean_value,
                number_value,
            } => {
                let inferred = if boolean_value.is_some() {
                    CustomFieldType::Boolean
                } else if number_value.is_some() {
                    CustomFieldType::Number
                } else {
                    CustomFieldType::Text
                };
                let value = text_value
                    .or_else(|| boolean_value.map(|b| b.to_string()))
                    .or_else(|| number_value.map(|n| n.to_string()))
                    .unwrap_or_default();
                (definition.name, definition.field_type, inferred, value)
            }
            CustomFieldShape::Config {
                field_type,
                name,
                value,
            } => {
                let inferred = match value {
                    Value::Bool(_) => CustomFieldType::Boolean,
                    Value::Number(_) => CustomFieldType::Number,
                    _ => CustomFieldType::Text,
                };
                (name, field_type, inferred, scalar_text(&value).unwrap_or_default())
            }
        };

        if name.trim().is_empty() {
            return None;
        }

        let field_type = explicit_type
            .and_then(|t| CustomFieldType::from_str(t.trim()).ok())
            .unwrap_or(inferred);

        Some(CustomField {
            field_type,
            name,
            value,
        })
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ScorecardShape {
    /// GraphQL `scorecardScores` entry
    #[serde(rename_all = "camelCase")]
    Score {
        scorecard_id: String,
        total_score: f64,
        max_total_score: f64,
    },
    #[serde(rename_all = "camelCase")]
    Named {
        name: String,
        score: f64,
        max_score: f64,
    },
}

impl ScorecardShape {
    fn into_scorecard(self, names: Option<&HashMap<String, String>>) -> Scorecard {
        match self {
            ScorecardShape::Score {
                scorecard_id,
                total_score,
                max_total_score,
            } => Scorecard {
                name: resolve_scorecard_name(&scorecard_id, names),
                score: total_score,
                max_score: max_total_score,
            },
            ScorecardShape::Named {
                name,
                score,
                max_score,
            } => Scorecard {
                name,
                score,
                max_score,
            },
        }
    }
}
