use thiserror::Error;

#[remain::sorted]
#[derive(Debug, Error)]
pub enum CompassStdError {
    /// A `$NAME` reference pointed at an environment variable that is not set.
    #[error("Environment variable {0} is not set")]
    MissingEnvVar(String),
}

pub type CompassStdResult<T> = Result<T, CompassStdError>;
