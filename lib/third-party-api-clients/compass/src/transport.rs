use http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use http::StatusCode;
use serde::Serialize;
use serde_json::Value;

use crate::ClientResult;

const AGENT: &str = concat!("compass-catalog/", env!("CARGO_PKG_VERSION"));

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GraphqlRequest {
    pub query: String,
    pub variables: Value,
}

#[derive(Clone, Debug)]
pub struct TransportResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl TransportResponse {
    pub fn new(status: StatusCode, body: Vec<u8>) -> Self {
        Self { status, body }
    }
}

/// POSTs a GraphQL request and hands back the raw status and body.
///
/// Status handling lives in [`crate::Client`] so every transport maps errors the same way.
#[async_trait::async_trait]
pub trait GraphqlTransport: Send + Sync {
    async fn post(
        &self,
        endpoint: &str,
        authorization: &str,
        request: &GraphqlRequest,
    ) -> ClientResult<TransportResponse>;
}

#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> ClientResult<Self> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl GraphqlTransport for ReqwestTransport {
    async fn post(
        &self,
        endpoint: &str,
        authorization: &str,
        request: &GraphqlRequest,
    ) -> ClientResult<TransportResponse> {
        let response = self
            .client
            .post(endpoint)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, AGENT)
            .header(AUTHORIZATION, authorization)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;
        Ok(TransportResponse::new(status, body.to_vec()))
    }
}
