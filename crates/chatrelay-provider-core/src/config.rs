use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use chatrelay_common::canonical_provider_name;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Gemini,
    DeepSeek,
    OpenAI,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini",
            ProviderKind::DeepSeek => "deepseek",
            ProviderKind::OpenAI => "openai",
        }
    }

    /// Accepts the configured provider names, aliases included.
    pub fn parse(name: &str) -> Option<Self> {
        match canonical_provider_name(name).as_str() {
            "gemini" => Some(ProviderKind::Gemini),
            "deepseek" => Some(ProviderKind::DeepSeek),
            "openai" => Some(ProviderKind::OpenAI),
            _ => None,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One configured upstream. Immutable after bootstrap.
///
/// `base_url` and `model` fall back to the provider's defaults when unset.
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub name: String,
    pub kind: ProviderKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub timeout_ms: u64,
    /// Position in the fallback chain; 0 is tried first.
    pub priority: usize,
}

impl ProviderConfig {
    pub fn new(kind: ProviderKind, priority: usize) -> Self {
        Self {
            name: kind.as_str().to_string(),
            kind,
            base_url: None,
            api_key: None,
            model: None,
            timeout_ms: 15_000,
            priority,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty())
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("timeout_ms", &self.timeout_ms)
            .field("priority", &self.priority)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_parses_aliases() {
        assert_eq!(ProviderKind::parse("Gemini"), Some(ProviderKind::Gemini));
        assert_eq!(ProviderKind::parse("aistudio"), Some(ProviderKind::Gemini));
        assert_eq!(ProviderKind::parse(" deepseek "), Some(ProviderKind::DeepSeek));
        assert_eq!(ProviderKind::parse("claude"), None);
    }

    #[test]
    fn debug_output_hides_api_key() {
        let mut config = ProviderConfig::new(ProviderKind::OpenAI, 2);
        config.api_key = Some("sk-secret".to_string());
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("<redacted>"));
    }
}
