pub type AttemptResult<T> = Result<T, AttemptError>;

/// Why a single provider attempt did not produce a reply.
///
/// Every variant moves the dispatcher on to the next provider; none of them
/// reaches the downstream caller verbatim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AttemptError {
    #[error("provider {provider} is not configured: {reason}")]
    Unconfigured { provider: String, reason: String },
    #[error("provider {provider} timed out after {after_ms}ms")]
    Timeout { provider: String, after_ms: u64 },
    #[error("provider {provider} failed{}: {message}", status_suffix(.status))]
    Upstream {
        provider: String,
        status: Option<u16>,
        message: String,
    },
}

impl AttemptError {
    pub fn unconfigured(provider: impl Into<String>, reason: impl Into<String>) -> Self {
        AttemptError::Unconfigured {
            provider: provider.into(),
            reason: reason.into(),
        }
    }

    pub fn upstream(
        provider: impl Into<String>,
        status: Option<u16>,
        message: impl Into<String>,
    ) -> Self {
        AttemptError::Upstream {
            provider: provider.into(),
            status,
            message: message.into(),
        }
    }

    /// Short label for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            AttemptError::Unconfigured { .. } => "unconfigured",
            AttemptError::Timeout { .. } => "timeout",
            AttemptError::Upstream { .. } => "error",
        }
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status
        .map(|status| format!(" with status {status}"))
        .unwrap_or_default()
}
