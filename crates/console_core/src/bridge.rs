use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client, Method};
use serde_json::Value;
use shared::{
    error::{ApiError, ErrorCode},
    protocol::{error_message, ApiResponse, UNKNOWN_ERROR_MESSAGE},
};
use tracing::{debug, error};
use url::Url;

use crate::payload::{RequestBody, JSON_CONTENT_TYPE};

/// The four verbs the console issues against the management API.
///
/// Implementations never return transport failures to the caller; every
/// outcome is folded into an [`ApiResponse`].
#[async_trait]
pub trait RequestBridge: Send + Sync {
    async fn get(&self, url: &str, token: &str) -> ApiResponse;
    async fn post(&self, url: &str, body: RequestBody, token: &str) -> ApiResponse;
    async fn put(&self, url: &str, body: RequestBody, token: &str) -> ApiResponse;
    /// Issues `DELETE`. Named `delete` so that calls through `Arc<B>` don't
    /// resolve to `Drop::drop`.
    #[doc(alias = "drop")]
    async fn delete(&self, url: &str, token: &str) -> ApiResponse;
}

pub struct HttpBridge {
    http: Client,
    base_url: String,
}

impl HttpBridge {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute `http(s)` URLs pass through; anything else is a path under the base URL.
    pub fn resolve(&self, url: &str) -> String {
        let is_absolute = Url::parse(url)
            .map(|parsed| matches!(parsed.scheme(), "http" | "https"))
            .unwrap_or(false);
        if is_absolute {
            return url.to_string();
        }
        join_url(&self.base_url, url)
    }

    async fn execute(
        &self,
        method: Method,
        url: &str,
        body: Option<RequestBody>,
        token: &str,
    ) -> ApiResponse {
        let target = self.resolve(url);
        match self.send(method.clone(), &target, body, token).await {
            Ok(data) => ApiResponse::ok(data),
            Err(failure) => {
                error!(
                    method = %method,
                    url = %target,
                    code = ?failure.error.code,
                    reason = %failure.error.message,
                    detail = %failure.detail,
                    "api request failed"
                );
                ApiResponse::fail(failure.error.message)
            }
        }
    }

    async fn send(
        &self,
        method: Method,
        target: &str,
        body: Option<RequestBody>,
        token: &str,
    ) -> Result<Value, Failure> {
        let mut request = self.http.request(method.clone(), target);
        if !token.is_empty() {
            request = request.bearer_auth(token);
        }
        request = match body {
            None => request,
            Some(RequestBody::Json(raw)) => request
                .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
                .body(raw),
            Some(RequestBody::Multipart(payload)) => {
                request.multipart(payload.into_form().map_err(transport_error)?)
            }
        };

        debug!(method = %method, url = %target, "issuing api request");
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(transport_error)?;

        if status.is_success() {
            return Ok(parse_success_body(&bytes));
        }

        let message = serde_json::from_slice::<Value>(&bytes)
            .ok()
            .as_ref()
            .and_then(error_message)
            .unwrap_or_else(|| UNKNOWN_ERROR_MESSAGE.to_string());
        Err(Failure {
            error: ApiError::new(ErrorCode::from_status(status.as_u16()), message),
            detail: format!("{status}: {}", String::from_utf8_lossy(&bytes)),
        })
    }
}

/// Joins `path` onto `base` with exactly one `/` between them.
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// A failed request before it is folded into an envelope. `detail` carries
/// the raw body or transport error for the log line only.
struct Failure {
    error: ApiError,
    detail: String,
}

fn transport_error(err: reqwest::Error) -> Failure {
    Failure {
        error: ApiError::new(ErrorCode::Transport, UNKNOWN_ERROR_MESSAGE),
        detail: err.to_string(),
    }
}

/// Empty bodies become `null`; bodies that aren't JSON are kept as a string.
fn parse_success_body(bytes: &[u8]) -> Value {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

#[async_trait]
impl RequestBridge for HttpBridge {
    async fn get(&self, url: &str, token: &str) -> ApiResponse {
        self.execute(Method::GET, url, None, token).await
    }

    async fn post(&self, url: &str, body: RequestBody, token: &str) -> ApiResponse {
        self.execute(Method::POST, url, Some(body), token).await
    }

    async fn put(&self, url: &str, body: RequestBody, token: &str) -> ApiResponse {
        self.execute(Method::PUT, url, Some(body), token).await
    }

    async fn delete(&self, url: &str, token: &str) -> ApiResponse {
        self.execute(Method::DELETE, url, None, token).await
    }
}

#[cfg(test)]
#[path = "tests/bridge_tests.rs"]
mod tests;
