//! Chat completions wire format shared by DeepSeek and OpenAI.

use bytes::Bytes;

use chatrelay_protocol::ChatRole;
use chatrelay_protocol::openai::{
    ChatCompletionMessage, ChatCompletionRole, CreateChatCompletionRequestBody,
    CreateChatCompletionResponse, ErrorResponse,
};
use chatrelay_provider_core::{
    AttemptError, AttemptResult, ChatPrompt, HttpMethod, ProviderConfig, UpstreamHttpRequest,
    UpstreamHttpResponse,
};

use super::{api_key, body_excerpt, build_url, encode_json, model_or_default};
use crate::auth_extractor;

pub(super) const DEFAULT_TEMPERATURE: f32 = 0.7;

pub(super) fn build_chat(
    config: &ProviderConfig,
    prompt: &ChatPrompt,
    default_base: &str,
    default_model: &str,
) -> AttemptResult<UpstreamHttpRequest> {
    let api_key = api_key(config)?;
    let url = build_url(config.base_url.as_deref(), default_base, "/v1/chat/completions");

    let mut messages = Vec::with_capacity(prompt.conversation.len() + 1);
    if let Some(system) = prompt.system_instruction.as_deref() {
        messages.push(ChatCompletionMessage {
            role: ChatCompletionRole::System,
            content: system.to_string(),
        });
    }
    messages.extend(prompt.conversation.turns().map(|turn| ChatCompletionMessage {
        role: match turn.role {
            ChatRole::User => ChatCompletionRole::User,
            ChatRole::Assistant => ChatCompletionRole::Assistant,
        },
        content: turn.content,
    }));

    let body = CreateChatCompletionRequestBody {
        model: model_or_default(config, default_model).to_string(),
        messages,
        temperature: Some(prompt.temperature.unwrap_or(DEFAULT_TEMPERATURE)),
        stream: Some(false),
    };
    let body = encode_json(config, &body)?;

    let mut headers = Vec::new();
    auth_extractor::set_bearer(&mut headers, api_key);
    auth_extractor::set_accept_json(&mut headers);
    auth_extractor::set_content_type_json(&mut headers);
    Ok(UpstreamHttpRequest {
        method: HttpMethod::Post,
        url,
        headers,
        body: Some(Bytes::from(body)),
    })
}

pub(super) fn decode_reply(
    config: &ProviderConfig,
    response: &UpstreamHttpResponse,
) -> AttemptResult<String> {
    if !response.is_success() {
        let message = serde_json::from_slice::<ErrorResponse>(&response.body)
            .ok()
            .map(|err| err.error.message)
            .filter(|message| !message.is_empty())
            .unwrap_or_else(|| body_excerpt(&response.body));
        return Err(AttemptError::upstream(
            &config.name,
            Some(response.status),
            message,
        ));
    }

    let decoded: CreateChatCompletionResponse = serde_json::from_slice(&response.body)
        .map_err(|err| {
            AttemptError::upstream(
                &config.name,
                Some(response.status),
                format!("decode response: {err}"),
            )
        })?;
    decoded
        .first_text()
        .map(str::to_string)
        .ok_or_else(|| {
            AttemptError::upstream(&config.name, Some(response.status), "no reply text in response")
        })
}
