use http::Method;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use chatrelay_protocol::chat::{ChatRequestBody, HistoryEntry, MessageEntry};
use chatrelay_protocol::{ChatRole, ConversationTurn};

use crate::error::ProxyError;

const CHAT_NAME_REQUEST: &str = "generateChatName";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestType {
    Reply,
    ChatName,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatCall {
    pub turns: Vec<ConversationTurn>,
    pub request_type: RequestType,
}

/// Parses a downstream body into a conversation. Accepts `messages`,
/// `chatHistory` or a bare `prompt`, checked in that order.
pub fn classify_body(body: &[u8]) -> Result<ChatCall, ProxyError> {
    let parsed: ChatRequestBody = parse_json(body, "chat request")?;

    let request_type = match parsed.request_type.as_deref().map(str::trim) {
        Some(kind) if kind.eq_ignore_ascii_case(CHAT_NAME_REQUEST) => RequestType::ChatName,
        _ => RequestType::Reply,
    };

    let turns = if let Some(messages) = parsed.messages {
        parse_turns::<MessageEntry>(messages, "messages", |entry| {
            (entry.role, entry.content.unwrap_or_default())
        })?
    } else if let Some(history) = parsed.chat_history {
        parse_turns::<HistoryEntry>(history, "chatHistory", |entry| {
            let text = entry.text();
            (entry.role, text)
        })?
    } else if let Some(prompt) = parsed.prompt.filter(|p| !p.trim().is_empty()) {
        vec![ConversationTurn::user(prompt)]
    } else {
        return Err(ProxyError::bad_request("Missing or invalid chatHistory"));
    };

    Ok(ChatCall {
        turns,
        request_type,
    })
}

pub fn ensure_method(method: &Method, expected: Method) -> Result<(), ProxyError> {
    if *method == expected {
        Ok(())
    } else {
        Err(ProxyError::method_not_allowed(format!(
            "Method Not Allowed. Please use {expected}."
        )))
    }
}

fn parse_turns<T>(
    value: JsonValue,
    field: &str,
    split: impl Fn(T) -> (String, String),
) -> Result<Vec<ConversationTurn>, ProxyError>
where
    T: DeserializeOwned,
{
    let JsonValue::Array(items) = value else {
        return Err(ProxyError::bad_request(format!("{field} must be an array")));
    };

    let mut turns = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        let entry: T = serde_json::from_value(item).map_err(|err| {
            ProxyError::bad_request(format!("invalid {field} entry at index {index}: {err}"))
        })?;
        let (role, content) = split(entry);
        let Some(role) = ChatRole::parse(&role) else {
            return Err(ProxyError::bad_request(format!(
                "unknown role {role:?} at {field} index {index}"
            )));
        };
        turns.push(ConversationTurn::new(role, content));
    }
    Ok(turns)
}

fn parse_json<T>(body: &[u8], label: &str) -> Result<T, ProxyError>
where
    T: DeserializeOwned,
{
    if body.is_empty() {
        return Err(ProxyError::bad_request(format!("missing body for {label}")));
    }
    serde_json::from_slice(body).map_err(|err| ProxyError::bad_request(format!("invalid json: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;

    #[test]
    fn messages_shape_maps_roles() {
        let call = classify_body(
            br#"{"messages":[{"role":"user","content":"hi"},{"role":"ai","content":"hello"},{"role":"user","content":"bye"}]}"#,
        )
        .unwrap();
        assert_eq!(call.request_type, RequestType::Reply);
        assert_eq!(
            call.turns,
            vec![
                ConversationTurn::user("hi"),
                ConversationTurn::assistant("hello"),
                ConversationTurn::user("bye"),
            ]
        );
    }

    #[test]
    fn chat_history_shape_with_chat_name_request() {
        let call = classify_body(
            br#"{"chatHistory":[{"role":"user","parts":[{"text":"Tell me a joke"}]},{"role":"model","parts":[{"text":"Why?"}]}],"requestType":"generateChatName"}"#,
        )
        .unwrap();
        assert_eq!(call.request_type, RequestType::ChatName);
        assert_eq!(call.turns[1], ConversationTurn::assistant("Why?"));
    }

    #[test]
    fn legacy_prompt_is_a_single_user_turn() {
        let call = classify_body(br#"{"prompt":"hello"}"#).unwrap();
        assert_eq!(call.turns, vec![ConversationTurn::user("hello")]);
    }

    #[test]
    fn invalid_bodies_are_bad_requests() {
        let bodies: [&[u8]; 7] = [
            b"",
            b"not json",
            b"{}",
            br#"{"chatHistory":"hello"}"#,
            br#"{"messages":{"role":"user"}}"#,
            br#"{"messages":[{"role":"system","content":"x"}]}"#,
            br#"{"messages":[{"content":"no role"}]}"#,
        ];
        for body in bodies {
            let err = classify_body(body).unwrap_err();
            assert_eq!(err.status, StatusCode::BAD_REQUEST, "body: {body:?}");
        }
    }

    #[test]
    fn only_post_is_allowed() {
        assert!(ensure_method(&Method::POST, Method::POST).is_ok());
        let err = ensure_method(&Method::GET, Method::POST).unwrap_err();
        assert_eq!(err.status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(err.message, "Method Not Allowed. Please use POST.");
    }
}
