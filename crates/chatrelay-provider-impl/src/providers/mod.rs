mod deepseek;
mod gemini;
mod openai;
mod openai_compat;

pub use deepseek::DeepSeekProvider;
pub use gemini::GeminiProvider;
pub use openai::OpenAIProvider;

use chatrelay_provider_core::{AttemptError, AttemptResult, ProviderConfig, ProviderKind};

const ERROR_EXCERPT_CHARS: usize = 200;

pub fn default_base_url(kind: ProviderKind) -> &'static str {
    match kind {
        ProviderKind::Gemini => gemini::DEFAULT_BASE_URL,
        ProviderKind::DeepSeek => deepseek::DEFAULT_BASE_URL,
        ProviderKind::OpenAI => openai::DEFAULT_BASE_URL,
    }
}

pub fn default_model(kind: ProviderKind) -> &'static str {
    match kind {
        ProviderKind::Gemini => gemini::DEFAULT_MODEL,
        ProviderKind::DeepSeek => deepseek::DEFAULT_MODEL,
        ProviderKind::OpenAI => openai::DEFAULT_MODEL,
    }
}

fn build_url(base_url: Option<&str>, default_base: &str, path: &str) -> String {
    let base = base_url
        .map(str::trim)
        .filter(|base| !base.is_empty())
        .unwrap_or(default_base)
        .trim_end_matches('/');
    let mut path = path.trim_start_matches('/');
    if base.ends_with("/v1") && (path == "v1" || path.starts_with("v1/")) {
        path = path.trim_start_matches("v1/").trim_start_matches("v1");
    }
    format!("{base}/{path}")
}

fn model_or_default<'a>(config: &'a ProviderConfig, default_model: &'a str) -> &'a str {
    config
        .model
        .as_deref()
        .map(str::trim)
        .filter(|model| !model.is_empty())
        .unwrap_or(default_model)
}

/// The trimmed API key, or `Unconfigured` when it is missing or cannot be
/// sent as a header value.
fn api_key(config: &ProviderConfig) -> AttemptResult<&str> {
    let Some(key) = config.api_key.as_deref().map(str::trim) else {
        return Err(AttemptError::unconfigured(&config.name, "missing api key"));
    };
    if key.is_empty() {
        return Err(AttemptError::unconfigured(&config.name, "blank api key"));
    }
    if key.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(AttemptError::unconfigured(
            &config.name,
            "api key contains whitespace or control characters",
        ));
    }
    Ok(key)
}

fn body_excerpt(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() {
        return "empty body".to_string();
    }
    let mut excerpt: String = text.chars().take(ERROR_EXCERPT_CHARS).collect();
    if text.chars().count() > ERROR_EXCERPT_CHARS {
        excerpt.push_str("...");
    }
    excerpt
}

fn encode_json(config: &ProviderConfig, body: &impl serde::Serialize) -> AttemptResult<Vec<u8>> {
    serde_json::to_vec(body)
        .map_err(|err| AttemptError::upstream(&config.name, None, format!("encode request: {err}")))
}
