use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use compass_client::{ClientError, ClientResult, GraphqlRequest, GraphqlTransport, TransportResponse};
use http::StatusCode;
use serde_json::Value;

#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub endpoint: String,
    pub authorization: String,
    pub request: GraphqlRequest,
}

#[derive(Debug)]
enum Scripted {
    Response(StatusCode, Vec<u8>),
    Failure(String),
}

/// Transport that replays queued responses in order and records every request it sees.
///
/// Running out of responses is reported as a transport error.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn responses(&self) -> MutexGuard<'_, VecDeque<Scripted>> {
        self.responses.lock().expect("scripted transport lock poisoned")
    }

    /// Queues a `200 OK` carrying `body`.
    pub fn push_ok(&self, body: Value) -> &Self {
        self.push_status(StatusCode::OK, body)
    }

    pub fn push_status(&self, status: StatusCode, body: Value) -> &Self {
        self.responses()
            .push_back(Scripted::Response(status, body.to_string().into_bytes()));
        self
    }

    /// Queues a `200 OK` whose body is `{"data": data}`.
    pub fn push_data(&self, data: Value) -> &Self {
        self.push_ok(serde_json::json!({ "data": data }))
    }

    pub fn push_failure<S: Into<String>>(&self, message: S) -> &Self {
        self.responses().push_back(Scripted::Failure(message.into()));
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .expect("scripted transport lock poisoned")
            .clone()
    }

    pub fn remaining(&self) -> usize {
        self.responses().len()
    }
}

#[async_trait::async_trait]
impl GraphqlTransport for ScriptedTransport {
    async fn post(
        &self,
        endpoint: &str,
        authorization: &str,
        request: &GraphqlRequest,
    ) -> ClientResult<TransportResponse> {
        self.requests
            .lock()
            .expect("scripted transport lock poisoned")
            .push(RecordedRequest {
                endpoint: endpoint.to_string(),
                authorization: authorization.to_string(),
                request: request.clone(),
            });

        match self.responses().pop_front() {
            Some(Scripted::Response(status, body)) => Ok(TransportResponse::new(status, body)),
            Some(Scripted::Failure(message)) => Err(ClientError::Transport(message)),
            None => Err(ClientError::Transport(format!(
                "no scripted response left for {endpoint}"
            ))),
        }
    }
}
