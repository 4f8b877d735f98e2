use serde::{Deserialize, Serialize};

// https://www.eventcatalog.dev/docs/development/guides/services/introduction

#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Badge {
    pub content: String,
    pub background_color: String,
    pub text_color: String,
}

impl Badge {
    pub fn new<C: Into<String>, B: Into<String>>(content: C, background_color: B) -> Self {
        Self {
            content: content.into(),
            background_color: background_color.into(),
            text_color: "#fff".to_string(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
pub struct Repository {
    pub url: String,
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq, Serialize)]
pub enum SpecificationType {
    #[serde(rename = "openapi")]
    OpenApi,
    #[serde(rename = "asyncapi")]
    AsyncApi,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
pub struct Specification {
    #[serde(rename = "type")]
    pub spec_type: SpecificationType,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
pub struct Attachment {
    pub url: String,
    pub title: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub attachment_type: Option<String>,
}

/// Reference from one entity to a specific version of another.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
pub struct ResourcePointer {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl ResourcePointer {
    pub fn new<I: Into<String>, V: Into<String>>(id: I, version: V) -> Self {
        Self {
            id: id.into(),
            version: Some(version.into()),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
pub struct Styles {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: String,
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub summary: String,
    #[serde(skip)]
    pub markdown: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badges: Option<Vec<Badge>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<Repository>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owners: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specifications: Option<Vec<Specification>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<Attachment>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sends: Option<Vec<ResourcePointer>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub styles: Option<Styles>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
pub struct Domain {
    pub id: String,
    pub name: String,
    pub version: String,
    #[serde(skip)]
    pub markdown: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub services: Vec<ResourcePointer>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
pub struct Team {
    pub id: String,
    pub name: String,
    #[serde(skip)]
    pub markdown: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<String>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip)]
    pub markdown: String,
}

/// Common view over catalog entities used by catalog implementations.
pub trait Entity {
    const KIND: &'static str;

    fn id(&self) -> &str;

    /// Teams and users are unversioned.
    fn version(&self) -> Option<&str> {
        None
    }

    fn markdown(&self) -> &str;

    fn set_markdown(&mut self, markdown: String);
}

impl Entity for Domain {
    const KIND: &'static str = "domain";

    fn id(&self) -> &str {
        &self.id
    }

    fn version(&self) -> Option<&str> {
        Some(&self.version)
    }

    fn markdown(&self) -> &str {
        &self.markdown
    }

    fn set_markdown(&mut self, markdown: String) {
        self.markdown = markdown;
    }
}

impl Entity for Service {
    const KIND: &'static str = "service";

    fn id(&self) -> &str {
        &self.id
    }

    fn version(&self) -> Option<&str> {
        Some(&self.version)
    }

    fn markdown(&self) -> &str {
        &self.markdown
    }

    fn set_markdown(&mut self, markdown: String) {
        self.markdown = markdown;
    }
}

impl Entity for Team {
    const KIND: &'static str = "team";

    fn id(&self) -> &str {
        &self.id
    }

    fn markdown(&self) -> &str {
        &self.markdown
    }

    fn set_markdown(&mut self, markdown: String) {
        self.markdown = markdown;
    }
}

impl Entity for User {
    const KIND: &'static str = "user";

    fn id(&self) -> &str {
        &self.id
    }

    fn markdown(&self) -> &str {
        &self.markdown
    }

    fn set_markdown(&mut self, markdown: String) {
        self.markdown = markdown;
    }
}
