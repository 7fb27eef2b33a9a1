use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Role of a turn as the relay sees it. Provider-specific role names are
/// assigned when a request is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    /// Accepts the role spellings used by the browser clients.
    pub fn parse(role: &str) -> Option<Self> {
        let role = role.trim();
        if role.eq_ignore_ascii_case("user") {
            Some(ChatRole::User)
        } else if role.eq_ignore_ascii_case("assistant")
            || role.eq_ignore_ascii_case("ai")
            || role.eq_ignore_ascii_case("model")
            || role.eq_ignore_ascii_case("bot")
        {
            Some(ChatRole::Assistant)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ConversationTurn {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, content)
    }

    pub fn is_user(&self) -> bool {
        self.role == ChatRole::User
    }
}

/// Downstream request body.
///
/// Clients send one of `messages`, `chatHistory` or the legacy single
/// `prompt`. The conversation fields stay untyped here so that a
/// non-array value can be reported as a validation error rather than a
/// JSON error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequestBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messages: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_history: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_type: Option<String>,
}

/// `{ "role": "...", "content": "..." }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageEntry {
    pub role: String,
    #[serde(default)]
    pub content: Option<String>,
}

/// `{ "role": "...", "parts": [{ "text": "..." }] }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: String,
    #[serde(default)]
    pub parts: Vec<TextPart>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextPart {
    #[serde(default)]
    pub text: Option<String>,
}

impl HistoryEntry {
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect::<Vec<_>>()
            .join("")
    }
}

/// Success body of the `messages` endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyBody {
    pub reply: String,
}

/// Success body of the `chatHistory` endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuccessBody {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_name: Option<String>,
}

impl SuccessBody {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            success: true,
            text: Some(text.into()),
            chat_name: None,
        }
    }

    pub fn chat_name(name: impl Into<String>) -> Self {
        Self {
            success: true,
            text: None,
            chat_name: Some(name.into()),
        }
    }
}

/// Error body for both envelopes; `success` is only present on the
/// `chatHistory` variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    pub error: String,
}
