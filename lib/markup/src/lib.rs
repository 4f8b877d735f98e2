use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum::{Display, EnumString, VariantNames};

/// Document format EventCatalog entities are written in.
#[derive(Clone, Copy, Debug, Default, Display, EnumString, VariantNames, PartialEq, Eq)]
pub enum MarkupFormat {
    #[default]
    #[strum(serialize = "md")]
    Markdown,
    #[strum(serialize = "mdx")]
    Mdx,
}

impl MarkupFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Markdown => "md",
            Self::Mdx => "mdx",
        }
    }

    /// File name EventCatalog uses for a directory-backed entity, e.g. `index.mdx`.
    pub fn index_file_name(&self) -> String {
        format!("index.{}", self.extension())
    }
}

impl Serialize for MarkupFormat {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.extension().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for MarkupFormat {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        MarkupFormat::from_str(&s).map_err(|_| {
            serde::de::Error::unknown_variant(&s, <MarkupFormat as VariantNames>::VARIANTS)
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::MarkupFormat;

    #[test]
    fn deserializes_from_extension() {
        let format: MarkupFormat = serde_json::from_str("\"mdx\"").unwrap();
        assert_eq!(MarkupFormat::Mdx, format);
        assert_eq!("index.mdx", format.index_file_name());
        assert!(serde_json::from_str::<MarkupFormat>("\"html\"").is_err());
    }

    #[test]
    fn serializes_as_extension() {
        assert_eq!("\"md\"", serde_json::to_string(&MarkupFormat::Markdown).unwrap());
        assert_eq!(MarkupFormat::Markdown, MarkupFormat::default());
    }
}
