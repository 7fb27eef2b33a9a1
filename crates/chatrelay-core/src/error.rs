use http::StatusCode;

use crate::dispatch::DispatchError;

/// Client-visible failure. `message` ends up in the `error` field of the
/// response envelope, so it never carries upstream payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyError {
    pub status: StatusCode,
    pub message: String,
}

pub const BACKEND_FAILED: &str = "AI backend failed.";

impl ProxyError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    pub fn method_not_allowed(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::METHOD_NOT_ALLOWED,
            message: message.into(),
        }
    }

    pub fn backend_failed() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: BACKEND_FAILED.to_string(),
        }
    }
}

impl From<DispatchError> for ProxyError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::Validation(err) => ProxyError::bad_request(err.to_string()),
            DispatchError::AllProvidersFailed { .. } => ProxyError::backend_failed(),
        }
    }
}
