//! Request envelopes for the JSON-RPC endpoint and the REST endpoints.

use chrono::Utc;
use reqwest::Url;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{error, info};

use crate::error::{Error, Result};
use crate::helpers::transport::{HttpMethod, HttpRequest, HttpRequester};
use crate::models::untis::RpcResponse;
use crate::session::Credentials;

pub const JSONRPC_VERSION: &str = "2.0";
pub const RPC_PATH: &str = "jsonrpc.do";
pub const SESSION_COOKIE: &str = "JSESSIONID";

static REQUEST_SEQ: AtomicU64 = AtomicU64::new(0);

/// Timestamp plus a process-wide sequence number.
pub fn correlation_id() -> String {
    let seq = REQUEST_SEQ.fetch_add(1, Ordering::Relaxed);
    format!("{}-{seq}", Utc::now().timestamp_millis())
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RpcEnvelope {
    pub jsonrpc: &'static str,
    pub method: String,
    pub params: Value,
    pub id: String,
}

impl RpcEnvelope {
    /// `params` defaults to an empty object.
    pub fn new(method: &str, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            method: method.to_string(),
            params: params.unwrap_or_else(|| Value::Object(Default::default())),
            id: correlation_id(),
        }
    }
}

pub fn session_cookie(credentials: &Credentials<'_>) -> (String, String) {
    (
        "Cookie".to_string(),
        format!("{SESSION_COOKIE}={}", credentials.session_token),
    )
}

fn build_url(base_url: &str, path: &str, params: &[(&str, String)]) -> Result<String> {
    let raw = format!("{}/{}", base_url.trim_end_matches('/'), path);
    let url = if params.is_empty() {
        Url::parse(&raw)
    } else {
        Url::parse_with_params(&raw, params)
    };

    url.map(String::from)
        .map_err(|e| Error::invalid_argument(format!("invalid base url '{base_url}': {e}")))
}

/// `POST {base}/jsonrpc.do?school={school}`. Only `authenticate` goes out without credentials.
pub fn rpc_request(
    base_url: &str,
    school: &str,
    envelope: &RpcEnvelope,
    credentials: Option<&Credentials<'_>>,
) -> Result<HttpRequest> {
    let body = serde_json::to_string(envelope)
        .map_err(|e| Error::invalid_argument(format!("rpc params: {e}")))?;

    let mut headers = vec![("Content-Type".to_string(), "application/json".to_string())];
    if let Some(credentials) = credentials {
        headers.push(session_cookie(credentials));
    }

    Ok(HttpRequest {
        method: HttpMethod::Post,
        url: build_url(base_url, RPC_PATH, &[("school", school.to_string())])?,
        headers,
        body: Some(body),
    })
}

/// `GET {base}/{path}?{params}` carrying the session cookie.
pub fn rest_request(
    base_url: &str,
    path: &str,
    params: &[(&str, String)],
    credentials: &Credentials<'_>,
) -> Result<HttpRequest> {
    Ok(HttpRequest {
        method: HttpMethod::Get,
        url: build_url(base_url, path, params)?,
        headers: vec![session_cookie(credentials)],
        body: None,
    })
}

/// Send `request` and decode a successful body as `T`.
///
/// Non-2xx responses become `RequestFailed` with the raw body; bodies that do
/// not match `T` become `Protocol` errors naming the offending JSON path.
pub async fn send_json<T, R>(requester: &R, request: HttpRequest) -> Result<T>
where
    T: DeserializeOwned,
    R: HttpRequester + ?Sized,
{
    let url = request.url.clone();
    let response = requester.send(request).await?;

    if !response.is_success() {
        error!("WebUntis returned error status {} for {}", response.status, url);
        return Err(Error::RequestFailed {
            status: response.status,
            body: response.body,
        });
    }

    let deserializer = &mut serde_json::Deserializer::from_str(&response.body);
    match serde_path_to_error::deserialize::<_, T>(deserializer) {
        Ok(value) => {
            info!("Successfully parsed response from {}", url);
            Ok(value)
        }
        Err(e) => {
            error!("Failed to parse WebUntis response at '{}': {}", e.path(), e.inner());
            Err(Error::protocol(format!(
                "unexpected response shape at '{}': {}",
                e.path(),
                e.inner()
            )))
        }
    }
}

/// Unwrap the `result` of an RPC response, turning `error` objects into `Protocol` errors.
pub fn rpc_result<T>(response: RpcResponse<T>, method: &str) -> Result<T> {
    if let Some(rpc_error) = response.error {
        error!(
            "RPC method {} failed with code {:?}: {:?}",
            method, rpc_error.code, rpc_error.message
        );
        return Err(Error::protocol(format!(
            "{method} failed with code {}: {}",
            rpc_error.code.map_or_else(|| "?".to_string(), |c| c.to_string()),
            rpc_error.message.unwrap_or_default()
        )));
    }

    response
        .result
        .ok_or_else(|| Error::protocol(format!("{method} response has no 'result'")))
}
