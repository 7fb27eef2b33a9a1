use async_trait::async_trait;
use bytes::Bytes;

use chatrelay_transform::BoundedConversation;

use crate::headers::Headers;
use crate::{AttemptResult, ProviderConfig, ProviderKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Post,
}

#[derive(Debug, Clone)]
pub struct UpstreamHttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Headers,
    pub body: Option<Bytes>,
}

#[derive(Debug, Clone)]
pub struct UpstreamHttpResponse {
    pub status: u16,
    pub headers: Headers,
    pub body: Bytes,
}

impl UpstreamHttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamTransportErrorKind {
    Timeout,
    Connect,
    Other,
}

/// Transport-level failure: no HTTP response was received.
#[derive(Debug, Clone)]
pub enum UpstreamFailure {
    Transport {
        kind: UpstreamTransportErrorKind,
        message: String,
    },
}

impl UpstreamFailure {
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            UpstreamFailure::Transport {
                kind: UpstreamTransportErrorKind::Timeout,
                ..
            }
        )
    }

    pub fn message(&self) -> &str {
        match self {
            UpstreamFailure::Transport { message, .. } => message,
        }
    }
}

/// What a provider is asked to answer.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatPrompt {
    pub system_instruction: Option<String>,
    pub conversation: BoundedConversation,
    pub temperature: Option<f32>,
}

impl ChatPrompt {
    pub fn new(conversation: BoundedConversation) -> Self {
        Self {
            system_instruction: None,
            conversation,
            temperature: None,
        }
    }
}

#[async_trait]
pub trait UpstreamProvider: Send + Sync {
    fn name(&self) -> &'static str;

    fn kind(&self) -> ProviderKind;

    /// Fails fast when the credential cannot possibly work, so the
    /// dispatcher never spends a timeout on it.
    fn validate(&self, config: &ProviderConfig) -> AttemptResult<()>;

    async fn build_chat(
        &self,
        config: &ProviderConfig,
        prompt: &ChatPrompt,
    ) -> AttemptResult<UpstreamHttpRequest>;

    /// Extracts the reply text. Non-2xx statuses, upstream error bodies and
    /// empty replies are errors.
    fn decode_reply(
        &self,
        config: &ProviderConfig,
        response: &UpstreamHttpResponse,
    ) -> AttemptResult<String>;
}
