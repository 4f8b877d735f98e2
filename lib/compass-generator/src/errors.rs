use std::path::PathBuf;

use thiserror::Error;

#[remain::sorted]
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error(transparent)]
    CatalogError(#[from] eventcatalog::CatalogError),

    #[error(transparent)]
    ClientError(#[from] compass_client::ClientError),

    /// Every violation found while validating settings, reported together.
    #[error("invalid configuration:\n  - {}", .0.join("\n  - "))]
    InvalidConfiguration(Vec<String>),

    #[error("component record is missing a name")]
    MissingComponentName,

    #[error("unable to read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("json serialize/deserialize error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("yaml serialize/deserialize error: {0}")]
    SerdeYaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    TemplatingError(#[from] catalog_templating::TemplatingError),

    /// Errors that may occur when deserializing types from TOML format.
    #[error("toml deserialize error: {0}")]
    TomlDeserialize(#[from] toml::de::Error),
}

pub type GeneratorResult<T> = Result<T, GeneratorError>;
