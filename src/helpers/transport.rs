//! HTTP transport seam.
//!
//! The client never talks to the network itself. It builds `HttpRequest`
//! values and hands them to an injected `HttpRequester`; `ReqwestRequester`
//! is the stock implementation.

use async_trait::async_trait;
use reqwest::{header, Client};
use tracing::{error, info};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// An HTTP request described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Executes one request. Timeouts and cancellation belong to the implementor.
#[async_trait]
pub trait HttpRequester: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// `HttpRequester` backed by a `reqwest::Client`.
#[derive(Clone)]
pub struct ReqwestRequester {
    client: Client,
}

impl ReqwestRequester {
    /// Build a client with JSON default headers.
    pub fn init() -> Result<Self> {
        info!("Initializing WebUntis HTTP client");

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        headers.insert(
            header::CACHE_CONTROL,
            header::HeaderValue::from_static("no-cache"),
        );

        match Client::builder().default_headers(headers).build() {
            Ok(client) => {
                info!("WebUntis HTTP client initialized successfully");
                Ok(Self { client })
            }
            Err(e) => {
                error!("Failed to build HTTP client: {}", e);
                Err(Error::Transport(e.to_string()))
            }
        }
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpRequester for ReqwestRequester {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self.client.post(&request.url),
        };

        for (name, value) in &request.headers {
            let mut value = match header::HeaderValue::from_str(value) {
                Ok(value) => value,
                Err(e) => {
                    error!("Invalid value for header {}: {}", name, e);
                    return Err(Error::invalid_argument(format!("header {name}: {e}")));
                }
            };
            if name.eq_ignore_ascii_case("cookie") {
                value.set_sensitive(true);
            }
            builder = builder.header(name.as_str(), value);
        }

        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = match builder.send().await {
            Ok(resp) => resp,
            Err(e) => {
                error!("Failed to send request to WebUntis: {}", e);
                return Err(Error::Transport(e.to_string()));
            }
        };

        let status = response.status().as_u16();
        match response.text().await {
            Ok(body) => Ok(HttpResponse { status, body }),
            Err(e) => {
                error!("Failed to read response body: {}", e);
                Err(Error::Transport(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_is_any_2xx() {
        let ok = |status| HttpResponse { status, body: String::new() };
        assert!(ok(200).is_success());
        assert!(ok(204).is_success());
        assert!(!ok(302).is_success());
        assert!(!ok(401).is_success());
        assert!(!ok(500).is_success());
    }

    #[test]
    fn header_lookup_ignores_case() {
        let request = HttpRequest {
            method: HttpMethod::Get,
            url: "http://localhost".to_string(),
            headers: vec![("Cookie".to_string(), "JSESSIONID=abc".to_string())],
            body: None,
        };
        assert_eq!(request.header("cookie"), Some("JSESSIONID=abc"));
        assert_eq!(request.header("accept"), None);
    }
}
