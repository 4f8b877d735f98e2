//! Canonical component record, independent of whether it came from a `compass.yml` or the API.
//!
//! See https://developer.atlassian.com/cloud/compass/config-as-code/structure-and-contents-of-a-compass-yml-file/

use std::fmt;

use serde::{Serialize, Serializer};
use strum::{AsRefStr, Display, EnumIter, EnumString};

#[derive(
    AsRefStr, Clone, Copy, Debug, Display, EnumIter, EnumString, Eq, Hash, PartialEq, Serialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TypeId {
    Application,
    Service,
    Capability,
    CloudResource,
    DataPipeline,
    Library,
    MachineLearningModel,
    Other,
    UiElement,
    Website,
}

#[derive(
    AsRefStr, Clone, Copy, Debug, Display, EnumIter, EnumString, Eq, Hash, PartialEq, Serialize,
)]
pub enum Lifecycle {
    #[strum(serialize = "Active")]
    #[serde(rename = "Active")]
    Active,

    #[strum(serialize = "Pre-release")]
    #[serde(rename = "Pre-release")]
    PreRelease,

    #[strum(serialize = "Deprecated")]
    #[serde(rename = "Deprecated")]
    Deprecated,
}

/// Link category. Categories this crate does not know are kept verbatim.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum LinkType {
    ChatChannel,
    Document,
    Dashboard,
    OnCall,
    Project,
    Repository,
    OtherLink,
    Other(String),
}

impl LinkType {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_uppercase().as_str() {
            "CHAT_CHANNEL" => LinkType::ChatChannel,
            "DOCUMENT" => LinkType::Document,
            "DASHBOARD" => LinkType::Dashboard,
            "ON_CALL" => LinkType::OnCall,
            "PROJECT" => LinkType::Project,
            "REPOSITORY" => LinkType::Repository,
            "OTHER_LINK" => LinkType::OtherLink,
            _ => LinkType::Other(value.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            LinkType::ChatChannel => "CHAT_CHANNEL",
            LinkType::Document => "DOCUMENT",
            LinkType::Dashboard => "DASHBOARD",
            LinkType::OnCall => "ON_CALL",
            LinkType::Project => "PROJECT",
            LinkType::Repository => "REPOSITORY",
            LinkType::OtherLink => "OTHER_LINK",
            LinkType::Other(value) => value,
        }
    }
}

impl fmt::Display for LinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for LinkType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(
    AsRefStr, Clone, Copy, Debug, Display, EnumIter, EnumString, Eq, Hash, PartialEq, Serialize,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum CustomFieldType {
    Text,
    Boolean,
    Number,
    User,
    SingleSelect,
    MultiSelect,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Fields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lifecycle: Option<Lifecycle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Link {
    #[serde(rename = "type")]
    pub link_type: LinkType,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Relationships {
    #[serde(rename = "DEPENDS_ON")]
    pub depends_on: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CustomField {
    #[serde(rename = "type")]
    pub field_type: CustomFieldType,
    pub name: String,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Scorecard {
    pub name: String,
    pub score: f64,
    pub max_score: f64,
}

impl Scorecard {
    /// Rounded percentage, 0 when the scorecard has no maximum.
    pub fn percentage(&self) -> u32 {
        if self.max_score <= 0.0 {
            return 0;
        }
        (self.score / self.max_score * 100.0).round().max(0.0) as u32
    }
}

/// Normalized component. Only `name` is guaranteed.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentConfig {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_id: Option<TypeId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
    pub fields: Fields,
    pub links: Vec<Link>,
    pub relationships: Relationships,
    pub labels: Vec<String>,
    pub custom_fields: Vec<CustomField>,
    pub scorecards: Vec<Scorecard>,
}

impl ComponentConfig {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn links_of<'a>(&'a self, link_type: &'a LinkType) -> impl Iterator<Item = &'a Link> {
        self.links.iter().filter(move |l| &l.link_type == link_type)
    }
}

/// Last `/`-separated segment of an ARI or path.
pub fn last_segment(value: &str) -> &str {
    value.rsplit('/').next().unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use test_case::test_case;

    use crate::component::{last_segment, CustomFieldType, LinkType, Scorecard, TypeId};

    #[test_case("UI_ELEMENT", TypeId::UiElement)]
    #[test_case("MACHINE_LEARNING_MODEL", TypeId::MachineLearningModel)]
    #[test_case("SERVICE", TypeId::Service)]
    fn type_ids_parse(value: &str, expected: TypeId) {
        assert_eq!(expected, TypeId::from_str(value).unwrap());
        assert_eq!(value, expected.to_string());
    }

    #[test]
    fn unknown_link_type_is_preserved() {
        let link_type = LinkType::parse("RUNBOOK");
        assert_eq!(LinkType::Other("RUNBOOK".to_string()), link_type);
        assert_eq!("RUNBOOK", link_type.as_str());
        assert_eq!(LinkType::OnCall, LinkType::parse("on_call"));
    }

    #[test]
    fn custom_field_types_use_snake_case() {
        assert_eq!(
            CustomFieldType::MultiSelect,
            CustomFieldType::from_str("multi_select").unwrap()
        );
        assert_eq!(CustomFieldType::Text, CustomFieldType::from_str("TEXT").unwrap());
    }

    #[test_case(8.0, 10.0, 80)]
    #[test_case(2.0, 3.0, 67)]
    #[test_case(5.0, 0.0, 0 ; "zero max")]
    fn scorecard_percentage(score: f64, max_score: f64, expected: u32) {
        let scorecard = Scorecard {
            name: "Security".to_string(),
            score,
            max_score,
        };
        assert_eq!(expected, scorecard.percentage());
    }

    #[test]
    fn last_segment_of_ari() {
        assert_eq!("abc", last_segment("ari:cloud:compass:site/component/abc"));
        assert_eq!("plain", last_segment("plain"));
    }
}
