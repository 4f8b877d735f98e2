pub mod components;
mod queries;
pub mod teams;
pub mod transport;

use std::fmt;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use compass_std::env::resolve_value;
use http::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

pub use crate::components::{ComponentPage, TeamDetails, TeamMember};
pub use crate::teams::{org_ari, team_to_ari, AtlassianTeam};
pub use crate::transport::{GraphqlRequest, GraphqlTransport, ReqwestTransport, TransportResponse};

const GRAPHQL_PATH: &str = "/gateway/api/graphql";

/// Which Atlassian API a client talks to. Only used to word error messages.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Api {
    Compass,
    Teams,
}

impl fmt::Display for Api {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Api::Compass => write!(f, "Compass"),
            Api::Teams => write!(f, "Teams"),
        }
    }
}

/// Errors returned by the client
#[remain::sorted]
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{api} API authentication failed: invalid email or API token")]
    Authentication { api: Api },

    #[error("{api} API authorization failed: insufficient permissions")]
    Authorization { api: Api },

    /// Credentials referenced an environment variable that is not set
    #[error(transparent)]
    Credentials(#[from] compass_std::error::CompassStdError),

    #[error("{api} GraphQL error: {message}")]
    GraphqlError { api: Api, message: String },

    /// Generic HTTP Error
    #[error("{api} API request failed with status {status}")]
    HttpError { api: Api, status: u16 },

    #[error("{api} API returned no data")]
    MissingData { api: Api },

    /// A mutation was accepted but reported errors in its payload
    #[error("{operation} error: {message}")]
    MutationError { operation: String, message: String },

    #[error("{api} API rate limit exceeded: too many requests")]
    RateLimited { api: Api },

    /// Errors returned by reqwest
    #[error(transparent)]
    ReqwestError(#[from] reqwest::Error),

    /// Serde JSON parsing error
    #[error(transparent)]
    SerdeJsonError(#[from] serde_json::Error),

    /// Any other failure reported by a transport
    #[error("transport error: {0}")]
    Transport(String),

    /// URL Parsing Error
    #[error(transparent)]
    UrlParserError(#[from] url::ParseError),
}

pub type ClientResult<T> = Result<T, ClientError>;

/// HTTP Basic credentials. Either value may be a `$ENV_VAR` reference, resolved on every request.
#[derive(PartialEq, Clone)]
pub struct Credentials {
    pub email: String,
    pub api_token: String,
}

impl Credentials {
    pub fn new<E: Into<String>, T: Into<String>>(email: E, api_token: T) -> Self {
        Self {
            email: email.into(),
            api_token: api_token.into(),
        }
    }

    pub fn authorization_header(&self) -> ClientResult<String> {
        let email = resolve_value(&self.email)?;
        let api_token = resolve_value(&self.api_token)?;
        Ok(format!(
            "Basic {}",
            STANDARD.encode(format!("{email}:{api_token}"))
        ))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("api_token", &"*".repeat(self.api_token.len()))
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct GraphqlErrorMessage {
    message: String,
}

#[derive(Debug, Deserialize)]
struct GraphqlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Option<Vec<GraphqlErrorMessage>>,
}

/// Entrypoint for interacting with the Atlassian GraphQL gateway.
#[derive(Clone)]
pub struct Client {
    api: Api,
    endpoint: String,
    credentials: Credentials,
    transport: Arc<dyn GraphqlTransport>,
}

impl Client {
    pub fn new(api: Api, base_url: &str, credentials: Credentials) -> ClientResult<Self> {
        Self::with_transport(api, base_url, credentials, Arc::new(ReqwestTransport::new()?))
    }

    pub fn with_transport(
        api: Api,
        base_url: &str,
        credentials: Credentials,
        transport: Arc<dyn GraphqlTransport>,
    ) -> ClientResult<Self> {
        // validate early, the endpoint itself is kept as a string
        url::Url::parse(base_url)?;
        Ok(Self {
            api,
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), GRAPHQL_PATH),
            credentials,
            transport,
        })
    }

    pub fn api(&self) -> Api {
        self.api
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Posts a query and returns its `data`, mapping HTTP and GraphQL failures to [`ClientError`].
    pub(crate) async fn execute<T>(&self, query: &str, variables: Value) -> ClientResult<T>
    where
        T: DeserializeOwned,
    {
        let authorization = self.credentials.authorization_header()?;
        let request = GraphqlRequest {
            query: query.to_string(),
            variables,
        };

        let response = self
            .transport
            .post(&self.endpoint, &authorization, &request)
            .await?;

        if !response.status.is_success() {
            return Err(self.status_error(response.status));
        }

        debug!("Received successful response from {} API. Read payload.", self.api);
        let parsed: GraphqlResponse<T> = serde_json::from_slice(&response.body)?;
        if let Some(error) = parsed.errors.and_then(|e| e.into_iter().next()) {
            return Err(ClientError::GraphqlError {
                api: self.api,
                message: error.message,
            });
        }

        parsed.data.ok_or(ClientError::MissingData { api: self.api })
    }

    fn status_error(&self, status: StatusCode) -> ClientError {
        match status {
            StatusCode::UNAUTHORIZED => ClientError::Authentication { api: self.api },
            StatusCode::FORBIDDEN => ClientError::Authorization { api: self.api },
            StatusCode::TOO_MANY_REQUESTS => ClientError::RateLimited { api: self.api },
            _ => ClientError::HttpError {
                api: self.api,
                status: status.as_u16(),
            },
        }
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("api", &self.api)
            .field("endpoint", &self.endpoint)
            .field("credentials", &self.credentials)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::{ClientError, Credentials};

    #[test]
    fn debug_masks_api_token() {
        let credentials = Credentials::new("test@example.com", "secret");
        let debug = format!("{credentials:?}");
        assert!(debug.contains("test@example.com"));
        assert!(!debug.contains("secret"));
    }

    #[test]
    fn basic_authorization_header() {
        let credentials = Credentials::new("test@example.com", "test-api-token");
        assert_eq!(
            "Basic dGVzdEBleGFtcGxlLmNvbTp0ZXN0LWFwaS10b2tlbg==",
            credentials.authorization_header().unwrap()
        );
    }

    #[test]
    fn credentials_resolve_environment_references() {
        temp_env::with_vars(
            [
                ("COMPASS_TEST_EMAIL", Some("env@example.com")),
                ("COMPASS_TEST_TOKEN", Some("env-resolved-token")),
            ],
            || {
                let credentials = Credentials::new("$COMPASS_TEST_EMAIL", "$COMPASS_TEST_TOKEN");
                assert_eq!(
                    "Basic ZW52QGV4YW1wbGUuY29tOmVudi1yZXNvbHZlZC10b2tlbg==",
                    credentials.authorization_header().unwrap()
                );
            },
        );
    }

    #[test]
    fn unset_environment_reference_is_a_credentials_error() {
        temp_env::with_var_unset("COMPASS_TEST_MISSING_TOKEN", || {
            let credentials = Credentials::new("test@example.com", "$COMPASS_TEST_MISSING_TOKEN");
            let err = credentials.authorization_header().unwrap_err();
            assert!(matches!(err, ClientError::Credentials(_)));
        });
    }
}
