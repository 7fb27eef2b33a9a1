use chatrelay_provider_core::{
    AttemptResult, ChatPrompt, ProviderConfig, ProviderKind, UpstreamHttpRequest,
    UpstreamHttpResponse, UpstreamProvider,
};

use super::{api_key, openai_compat};

const PROVIDER_NAME: &str = "openai";
pub(super) const DEFAULT_BASE_URL: &str = "https://api.openai.com";
pub(super) const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Any OpenAI-compatible chat completions endpoint.
#[derive(Debug, Default)]
pub struct OpenAIProvider;

impl OpenAIProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl UpstreamProvider for OpenAIProvider {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAI
    }

    fn validate(&self, config: &ProviderConfig) -> AttemptResult<()> {
        api_key(config).map(|_| ())
    }

    async fn build_chat(
        &self,
        config: &ProviderConfig,
        prompt: &ChatPrompt,
    ) -> AttemptResult<UpstreamHttpRequest> {
        openai_compat::build_chat(config, prompt, DEFAULT_BASE_URL, DEFAULT_MODEL)
    }

    fn decode_reply(
        &self,
        config: &ProviderConfig,
        response: &UpstreamHttpResponse,
    ) -> AttemptResult<String> {
        openai_compat::decode_reply(config, response)
    }
}
