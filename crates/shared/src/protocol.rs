use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

/// Message used whenever a failed call carries no usable server message.
pub const UNKNOWN_ERROR_MESSAGE: &str = "An unknown error occurred";

/// Uniform result of a bridge call.
///
/// `status == true` means `data` holds the parsed response body; otherwise
/// `message` carries a human readable cause. The management API wraps its own
/// payloads in the same `{status, message, data}` shape, see [`ServerReply`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T = Value> {
    #[serde(default)]
    pub status: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// The body the management API returns inside a successful HTTP response.
pub type ServerReply<T = Value> = ApiResponse<T>;

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            status: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            status: false,
            data: None,
            message: Some(message.into()),
        }
    }

    pub fn with_message(mut self, message: Option<String>) -> Self {
        self.message = message;
        self
    }

    /// Message for display, falling back to [`UNKNOWN_ERROR_MESSAGE`].
    pub fn message_or_fallback(&self) -> &str {
        self.message.as_deref().unwrap_or(UNKNOWN_ERROR_MESSAGE)
    }
}

impl ApiResponse<Value> {
    /// Re-types `data`, leaving `status` and `message` untouched.
    pub fn decode<T: DeserializeOwned>(self) -> Result<ApiResponse<T>, serde_json::Error> {
        let data = match self.data {
            Some(Value::Null) | None => None,
            Some(value) => Some(serde_json::from_value(value)?),
        };
        Ok(ApiResponse {
            status: self.status,
            data,
            message: self.message,
        })
    }

    /// Reads the envelope's `data` as the API's own `{status, message}` reply.
    ///
    /// Bodies that are not objects decode to a reply with `status == false`.
    pub fn server_reply(&self) -> ServerReply {
        match &self.data {
            Some(value @ Value::Object(_)) => {
                serde_json::from_value(value.clone()).unwrap_or_else(|_| ServerReply::default())
            }
            _ => ServerReply::default(),
        }
    }
}

impl<T> Default for ApiResponse<T> {
    fn default() -> Self {
        Self {
            status: false,
            data: None,
            message: None,
        }
    }
}

/// Extracts the `message` string from an error body, if it has one.
pub fn error_message(body: &Value) -> Option<String> {
    body.get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
}
