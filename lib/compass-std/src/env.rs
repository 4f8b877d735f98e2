use std::env;

use tracing::debug;

use crate::error::{CompassStdError, CompassStdResult};

/// Resolves a configuration value that may reference an environment variable.
///
/// Values starting with `$` are treated as `$NAME` references and looked up in the process
/// environment at call time. Any other value is returned unchanged.
pub fn resolve_value(value: &str) -> CompassStdResult<String> {
    match value.strip_prefix('$') {
        Some(name) => match env::var(name) {
            Ok(resolved) if !resolved.is_empty() => {
                debug!("resolved value from environment variable {name}");
                Ok(resolved)
            }
            _ => Err(CompassStdError::MissingEnvVar(name.to_string())),
        },
        None => Ok(value.to_string()),
    }
}
