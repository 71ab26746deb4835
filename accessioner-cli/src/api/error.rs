//! ArchivesSpace API errors

use serde_json::Value;

/// A failed call to the archival-management API. Never retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Request could not be sent or the connection failed
    Transport { url: String, message: String },
    /// Server answered with a non-success status
    Status {
        url: String,
        status: u16,
        message: String,
    },
    /// A lookup (repository, agent, container) found nothing usable
    NotFound { what: &'static str, value: String },
    /// Response body was not the JSON we expected
    Decode { url: String, message: String },
}

impl ApiError {
    pub fn transport(url: &str, err: &reqwest::Error) -> Self {
        ApiError::Transport {
            url: url.to_string(),
            message: err.to_string(),
        }
    }

    /// Build a status error, pulling the message out of an ArchivesSpace error body
    pub fn from_response(url: &str, status: u16, body: &str) -> Self {
        ApiError::Status {
            url: url.to_string(),
            status,
            message: error_message(body),
        }
    }

    pub fn not_found(what: &'static str, value: impl Into<String>) -> Self {
        ApiError::NotFound {
            what,
            value: value.into(),
        }
    }

    pub fn decode(url: &str, message: impl Into<String>) -> Self {
        ApiError::Decode {
            url: url.to_string(),
            message: message.into(),
        }
    }
}

/// ArchivesSpace reports errors as `{"error": ...}` where the value is a
/// string or a map of field names to messages.
fn error_message(body: &str) -> String {
    let Ok(json) = serde_json::from_str::<Value>(body) else {
        let trimmed = body.trim();
        return if trimmed.is_empty() {
            "empty response body".to_string()
        } else {
            trimmed.chars().take(300).collect()
        };
    };

    match json.get("error") {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => json.to_string(),
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Transport { url, message } => {
                write!(f, "request to {} failed: {}", url, message)
            }
            ApiError::Status {
                url,
                status,
                message,
            } => write!(
                f,
                "ArchivesSpace error! URI: {}, Status code: {}, Message: {}",
                url, status, message
            ),
            ApiError::NotFound { what, value } => {
                write!(f, "{} not found: {}", what, value)
            }
            ApiError::Decode { url, message } => {
                write!(f, "unexpected response from {}: {}", url, message)
            }
        }
    }
}

impl std::error::Error for ApiError {}
