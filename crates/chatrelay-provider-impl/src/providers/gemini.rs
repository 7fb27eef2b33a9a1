use bytes::Bytes;

use chatrelay_protocol::ChatRole;
use chatrelay_protocol::gemini::{
    Content, ContentRole, ErrorResponse, GenerateContentRequestBody, GenerateContentResponse,
    GenerationConfig,
};
use chatrelay_provider_core::{
    AttemptError, AttemptResult, ChatPrompt, HttpMethod, ProviderConfig, ProviderKind,
    UpstreamHttpRequest, UpstreamHttpResponse, UpstreamProvider,
};

use super::{api_key, body_excerpt, build_url, encode_json, model_or_default};
use crate::auth_extractor;

const PROVIDER_NAME: &str = "gemini";
pub(super) const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub(super) const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Google AI Studio `generateContent`.
#[derive(Debug, Default)]
pub struct GeminiProvider;

impl GeminiProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl UpstreamProvider for GeminiProvider {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    fn validate(&self, config: &ProviderConfig) -> AttemptResult<()> {
        api_key(config).map(|_| ())
    }

    async fn build_chat(
        &self,
        config: &ProviderConfig,
        prompt: &ChatPrompt,
    ) -> AttemptResult<UpstreamHttpRequest> {
        let api_key = api_key(config)?;
        let model = model_or_default(config, DEFAULT_MODEL);
        let model = model.strip_prefix("models/").unwrap_or(model);
        let url = build_url(
            config.base_url.as_deref(),
            DEFAULT_BASE_URL,
            &format!("/v1beta/models/{model}:generateContent"),
        );

        let contents = prompt
            .conversation
            .turns()
            .map(|turn| {
                let role = match turn.role {
                    ChatRole::User => ContentRole::User,
                    ChatRole::Assistant => ContentRole::Model,
                };
                Content::text(Some(role), turn.content)
            })
            .collect();
        let body = GenerateContentRequestBody {
            contents,
            system_instruction: prompt
                .system_instruction
                .as_deref()
                .map(|text| Content::text(None, text)),
            generation_config: prompt.temperature.map(|temperature| GenerationConfig {
                temperature: Some(temperature),
                ..Default::default()
            }),
        };
        let body = encode_json(config, &body)?;

        let mut headers = Vec::new();
        auth_extractor::set_header(&mut headers, "x-goog-api-key", api_key);
        auth_extractor::set_accept_json(&mut headers);
        auth_extractor::set_content_type_json(&mut headers);
        Ok(UpstreamHttpRequest {
            method: HttpMethod::Post,
            url,
            headers,
            body: Some(Bytes::from(body)),
        })
    }

    fn decode_reply(
        &self,
        config: &ProviderConfig,
        response: &UpstreamHttpResponse,
    ) -> AttemptResult<String> {
        if !response.is_success() {
            let message = serde_json::from_slice::<ErrorResponse>(&response.body)
                .ok()
                .map(|err| match err.error.status {
                    Some(status) if !err.error.message.is_empty() => {
                        format!("{status}: {}", err.error.message)
                    }
                    _ => err.error.message,
                })
                .filter(|message| !message.is_empty())
                .unwrap_or_else(|| body_excerpt(&response.body));
            return Err(AttemptError::upstream(
                &config.name,
                Some(response.status),
                message,
            ));
        }

        let decoded: GenerateContentResponse = serde_json::from_slice(&response.body)
            .map_err(|err| {
                AttemptError::upstream(
                    &config.name,
                    Some(response.status),
                    format!("decode response: {err}"),
                )
            })?;
        if let Some(text) = decoded.first_text() {
            return Ok(text);
        }
        let reason = decoded
            .prompt_feedback
            .and_then(|feedback| feedback.block_reason)
            .map(|reason| format!("prompt blocked: {reason}"))
            .unwrap_or_else(|| "no candidate text in response".to_string());
        Err(AttemptError::upstream(
            &config.name,
            Some(response.status),
            reason,
        ))
    }
}
