//! `reqwest`-backed [`TargetService`].

use std::time::Duration;

use async_trait::async_trait;
use crudperf_core::ObjectType;
use crudperf_harness::{EntityId, OperationError, OperationOutcome, OperationResult, TargetService};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde_json::Value;
use tracing::debug;

use crate::error::{ClientError, ClientResult};
use crate::payload::Payload;

/// Client for the Todo Manager REST API.
///
/// Creates answer `201 Created` with the new entity (including its `id`) in
/// the body; updates and deletes answer `200 OK`.
#[derive(Debug, Clone)]
pub struct HttpTargetService {
    client: Client,
    base_url: String,
}

impl HttpTargetService {
    /// Build a client for `base_url`. Without `timeout` a request may block
    /// for as long as the target takes to answer.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> ClientResult<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        Url::parse(&base_url).map_err(|e| ClientError::InvalidBaseUrl {
            url: base_url.clone(),
            reason: e.to_string(),
        })?;

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Whether the target answers `GET /` with `200 OK`.
    pub async fn is_running(&self) -> bool {
        match self.client.get(&self.base_url).send().await {
            Ok(response) => response.status() == StatusCode::OK,
            Err(err) => {
                debug!(error = %err, base_url = %self.base_url, "health check failed");
                false
            }
        }
    }

    fn collection_url(&self, object_type: ObjectType) -> String {
        format!("{}/{}", self.base_url, collection(object_type))
    }

    fn entity_url(&self, object_type: ObjectType, id: &EntityId) -> String {
        format!("{}/{}/{}", self.base_url, collection(object_type), id)
    }

    /// Send a request that succeeds on `expected`, without reading the body.
    async fn send_expecting(&self, request: RequestBuilder, expected: StatusCode) -> OperationResult {
        let response = match send(request).await {
            Ok(response) => response,
            Err(result) => return result,
        };

        let status = response.status();
        if status == expected {
            Ok(OperationOutcome::succeeded())
        } else {
            Ok(OperationOutcome::failed(status.to_string()))
        }
    }
}

#[async_trait]
impl TargetService for HttpTargetService {
    async fn create(&self, object_type: ObjectType) -> OperationResult {
        let request = self
            .client
            .post(self.collection_url(object_type))
            .json(&Payload::create(object_type));

        let response = match send(request).await {
            Ok(response) => response,
            Err(result) => return result,
        };

        let status = response.status();
        if status != StatusCode::CREATED {
            return Ok(OperationOutcome::failed(status.to_string()));
        }

        match response.json::<Value>().await {
            Ok(body) => match entity_id(&body) {
                Some(id) => Ok(OperationOutcome::created(id)),
                None => Ok(OperationOutcome::succeeded()),
            },
            Err(err) => Ok(OperationOutcome::failed(format!("unreadable create response: {}", err))),
        }
    }

    async fn update(&self, object_type: ObjectType, id: &EntityId) -> OperationResult {
        let request = self
            .client
            .request(Method::PUT, self.entity_url(object_type, id))
            .json(&Payload::update(object_type));
        self.send_expecting(request, StatusCode::OK).await
    }

    async fn delete(&self, object_type: ObjectType, id: &EntityId) -> OperationResult {
        let request = self.client.delete(self.entity_url(object_type, id));
        self.send_expecting(request, StatusCode::OK).await
    }
}

fn collection(object_type: ObjectType) -> &'static str {
    match object_type {
        ObjectType::Todo => "todos",
        ObjectType::Project => "projects",
    }
}

/// Send `request`, sorting transport errors: a refused connection ends the
/// run, anything else (timeouts, broken bodies) fails this one operation.
async fn send(request: RequestBuilder) -> Result<Response, OperationResult> {
    request.send().await.map_err(|err| {
        if err.is_connect() {
            Err(OperationError::Unreachable(err.to_string()))
        } else {
            Ok(OperationOutcome::failed(err.to_string()))
        }
    })
}

/// Identifier of a created entity; the API returns it as a string but a
/// numeric `id` is accepted as well.
fn entity_id(body: &Value) -> Option<EntityId> {
    match body.get("id")? {
        Value::String(id) => Some(EntityId::new(id.as_str())),
        Value::Number(id) => Some(EntityId::new(id.to_string())),
        _ => None,
    }
}
