//! Remote function-call client
//!
//! Executes one named remote call per request: HTTP POST to the `mutation`
//! or `query` endpoint with body `{path, args, format: "json"}`, decoding
//! the `{status, value, errorMessage}` envelope. Every call attaches a
//! bearer token supplied by the caller; the client does not own credential
//! lifecycle.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sitework_domain::constants::WIRE_FORMAT_JSON;
use sitework_domain::{ApiConfig, EntityKind, RemoteRecord, SyncRecord};
use tracing::{debug, instrument};

use super::errors::ApiError;
use crate::http::HttpClient;

/// Configuration for the remote client
#[derive(Debug, Clone)]
pub struct RemoteClientConfig {
    /// Base URL for the backend (e.g., "https://api.sitework.app")
    pub base_url: String,
    /// Timeout for a single remote call
    pub timeout: Duration,
}

impl Default for RemoteClientConfig {
    fn default() -> Self {
        Self {
            base_url: sitework_domain::constants::DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(sitework_domain::constants::DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl From<&ApiConfig> for RemoteClientConfig {
    fn from(config: &ApiConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }
}

/// The two logical endpoints of the backend function API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    Mutation,
    Query,
}

impl FunctionKind {
    fn endpoint(self) -> &'static str {
        match self {
            Self::Mutation => "mutation",
            Self::Query => "query",
        }
    }
}

/// Structured argument map for a remote call.
pub type CallArgs = BTreeMap<String, Value>;

#[derive(Serialize)]
struct CallRequest<'a> {
    path: &'a str,
    args: &'a CallArgs,
    format: &'static str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CallEnvelope {
    status: String,
    #[serde(default)]
    value: Option<Value>,
    #[serde(default)]
    error_message: Option<String>,
}

/// Schema-agnostic client for the backend function API.
pub struct RemoteClient {
    http: HttpClient,
    config: RemoteClientConfig,
}

impl RemoteClient {
    /// Create a new remote client.
    pub fn new(config: RemoteClientConfig) -> Result<Self, ApiError> {
        let http = HttpClient::builder()
            .timeout(config.timeout)
            .user_agent("sitework/0.1")
            .build()
            .map_err(|e| ApiError::Config(format!("Failed to build HttpClient: {e}")))?;

        Ok(Self { http, config })
    }

    /// Execute a named mutation.
    pub async fn mutation(
        &self,
        path: &str,
        args: CallArgs,
        token: &str,
    ) -> Result<Value, ApiError> {
        self.call(FunctionKind::Mutation, path, args, token).await
    }

    /// Execute a named query.
    pub async fn query(&self, path: &str, args: CallArgs, token: &str) -> Result<Value, ApiError> {
        self.call(FunctionKind::Query, path, args, token).await
    }

    /// Upsert one record, keyed by its local id.
    ///
    /// The backend treats a re-sent record as a no-op update, so an
    /// unconfirmed-success retry never creates a duplicate.
    pub async fn upsert_record(
        &self,
        record: &SyncRecord,
        token: &str,
    ) -> Result<RemoteRecord, ApiError> {
        let path = format!("{}:upsert", record.entity.remote_namespace());

        let mut args = CallArgs::new();
        args.insert("localId".into(), Value::String(record.local_id.clone()));
        args.insert("updatedAt".into(), Value::from(record.updated_at_ms()));
        args.insert("payload".into(), record.payload.clone());
        if let Some(remote_id) = &record.remote_id {
            args.insert("remoteId".into(), Value::String(remote_id.clone()));
        }

        let value = self.mutation(&path, args, token).await?;
        serde_json::from_value(value)
            .map_err(|e| ApiError::Decode(format!("Invalid upsert response: {e}")))
    }

    /// List remote records of one kind changed at or after `since_ms`.
    pub async fn list_since(
        &self,
        entity: EntityKind,
        since_ms: i64,
        token: &str,
    ) -> Result<Vec<RemoteRecord>, ApiError> {
        let path = format!("{}:listSince", entity.remote_namespace());

        let mut args = CallArgs::new();
        args.insert("since".into(), Value::from(since_ms));

        let value = self.query(&path, args, token).await?;
        serde_json::from_value(value)
            .map_err(|e| ApiError::Decode(format!("Invalid listSince response: {e}")))
    }

    /// Register this device with the identity backend.
    pub async fn register_identity(
        &self,
        device_id: &str,
        device_name: Option<&str>,
        token: &str,
    ) -> Result<(), ApiError> {
        let mut args = CallArgs::new();
        args.insert("deviceId".into(), Value::String(device_id.to_string()));
        if let Some(name) = device_name {
            args.insert("deviceName".into(), Value::String(name.to_string()));
        }

        self.mutation("users:register", args, token).await?;
        Ok(())
    }

    #[instrument(skip(self, args, token), fields(endpoint = kind.endpoint(), path = %path))]
    async fn call(
        &self,
        kind: FunctionKind,
        path: &str,
        args: CallArgs,
        token: &str,
    ) -> Result<Value, ApiError> {
        let url = format!("{}/{}", self.config.base_url.trim_end_matches('/'), kind.endpoint());
        let body = CallRequest { path, args: &args, format: WIRE_FORMAT_JSON };

        debug!(url = %url, "remote call");

        let request = self
            .http
            .request(Method::POST, &url)
            .header("Authorization", format!("Bearer {token}"))
            .header("Content-Type", "application/json")
            .json(&body);

        let response = self
            .http
            .send(request)
            .await
            .map_err(|e| map_transport_error(&e, self.config.timeout))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_status_error(status, body));
        }

        let envelope: CallEnvelope = response
            .json()
            .await
            .map_err(|e| ApiError::Decode(format!("Failed to parse response: {e}")))?;

        if envelope.status != "success" {
            let message = envelope
                .error_message
                .unwrap_or_else(|| format!("function reported status {}", envelope.status));
            return Err(ApiError::Server { status: status.as_u16(), body: message });
        }

        Ok(envelope.value.unwrap_or(Value::Null))
    }
}

fn map_status_error(status: StatusCode, body: String) -> ApiError {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        ApiError::Auth(format!("status {status}: {body}"))
    } else {
        ApiError::Server { status: status.as_u16(), body }
    }
}

fn map_transport_error(err: &reqwest::Error, timeout: Duration) -> ApiError {
    if err.is_timeout() {
        ApiError::Timeout(timeout)
    } else if err.is_builder() {
        ApiError::Config(err.to_string())
    } else if err.is_decode() {
        ApiError::Decode(err.to_string())
    } else {
        ApiError::Network(err.to_string())
    }
}
