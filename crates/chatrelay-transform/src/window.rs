use chatrelay_common::DEFAULT_MAX_HISTORY;
use chatrelay_protocol::{ChatRole, ConversationTurn};

use crate::sanitize::Sanitizer;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowPolicy {
    /// Prior turns kept ahead of the current user turn.
    pub max_history: usize,
    /// Client-side pending markers that never reach a provider.
    pub placeholders: Vec<String>,
}

impl Default for WindowPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY)
    }
}

impl WindowPolicy {
    pub fn new(max_history: usize) -> Self {
        Self {
            max_history,
            placeholders: vec!["...".to_string()],
        }
    }

    pub fn is_placeholder(&self, content: &str) -> bool {
        let content = content.trim();
        content.is_empty() || self.placeholders.iter().any(|p| p == content)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum WindowError {
    #[error("conversation is empty")]
    Empty,
    #[error("conversation must end with a user turn")]
    MissingUserTurn,
}

/// The prompt actually sent upstream: a bounded history plus the current
/// user turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundedConversation {
    pub history: Vec<ConversationTurn>,
    pub current: String,
}

impl BoundedConversation {
    /// A single user turn with no history.
    pub fn single(current: impl Into<String>) -> Self {
        Self {
            history: Vec::new(),
            current: current.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.history.len() + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// History followed by the current turn.
    pub fn turns(&self) -> impl Iterator<Item = ConversationTurn> + '_ {
        self.history
            .iter()
            .cloned()
            .chain(std::iter::once(ConversationTurn::new(
                ChatRole::User,
                self.current.clone(),
            )))
    }
}

/// Drops placeholder turns, splits off the trailing user turn and keeps the
/// last `max_history` turns before it. User text is sanitized.
pub fn window(
    turns: &[ConversationTurn],
    policy: &WindowPolicy,
    sanitizer: &Sanitizer,
) -> Result<BoundedConversation, WindowError> {
    let mut kept: Vec<&ConversationTurn> = turns
        .iter()
        .filter(|turn| !policy.is_placeholder(&turn.content))
        .collect();

    let current = match kept.pop() {
        None => return Err(WindowError::Empty),
        Some(turn) if !turn.is_user() => return Err(WindowError::MissingUserTurn),
        Some(turn) => sanitizer.sanitize_text(&turn.content),
    };

    let skip = kept.len().saturating_sub(policy.max_history);
    let history = kept[skip..]
        .iter()
        .map(|turn| sanitizer.sanitize_turn(turn))
        .collect();

    Ok(BoundedConversation { history, current })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alternating(count: usize) -> Vec<ConversationTurn> {
        (0..count)
            .map(|i| {
                if i % 2 == 0 {
                    ConversationTurn::user(format!("u{i}"))
                } else {
                    ConversationTurn::assistant(format!("a{i}"))
                }
            })
            .collect()
    }

    #[test]
    fn long_history_is_cut_to_max_plus_current() {
        let mut turns = alternating(20);
        turns.push(ConversationTurn::user("now"));
        let bounded = window(&turns, &WindowPolicy::new(12), &Sanitizer::disabled()).unwrap();

        assert_eq!(bounded.len(), 13);
        assert_eq!(bounded.current, "now");
        assert_eq!(bounded.history, turns[8..20].to_vec());
    }

    #[test]
    fn short_history_is_kept_whole() {
        let turns = alternating(3);
        let bounded = window(&turns, &WindowPolicy::default(), &Sanitizer::disabled()).unwrap();
        assert_eq!(bounded.len(), 3);
        assert_eq!(bounded.current, "u2");
    }

    #[test]
    fn placeholder_turns_are_dropped() {
        let turns = vec![
            ConversationTurn::user("first"),
            ConversationTurn::assistant("..."),
            ConversationTurn::assistant("   "),
            ConversationTurn::user("second"),
            ConversationTurn::assistant(" ... "),
        ];
        let bounded = window(&turns, &WindowPolicy::default(), &Sanitizer::disabled()).unwrap();
        assert_eq!(bounded.history, vec![ConversationTurn::user("first")]);
        assert_eq!(bounded.current, "second");
    }

    #[test]
    fn trailing_assistant_turn_is_rejected() {
        let turns = alternating(2);
        assert_eq!(
            window(&turns, &WindowPolicy::default(), &Sanitizer::disabled()),
            Err(WindowError::MissingUserTurn)
        );
        assert_eq!(
            window(&[], &WindowPolicy::default(), &Sanitizer::disabled()),
            Err(WindowError::Empty)
        );
    }

    #[test]
    fn zero_history_keeps_only_current() {
        let turns = alternating(5);
        let bounded = window(&turns, &WindowPolicy::new(0), &Sanitizer::disabled()).unwrap();
        assert!(bounded.history.is_empty());
        assert_eq!(bounded.len(), 1);
    }

    #[test]
    fn user_text_is_sanitized() {
        let sanitizer = Sanitizer::new(["calmash1"], "Google").unwrap();
        let turns = vec![
            ConversationTurn::user("hi calmash1"),
            ConversationTurn::assistant("calmash1 says hi"),
            ConversationTurn::user("bye Calmash1"),
        ];
        let bounded = window(&turns, &WindowPolicy::default(), &sanitizer).unwrap();
        assert_eq!(bounded.history[0].content, "hi Google");
        assert_eq!(bounded.history[1].content, "calmash1 says hi");
        assert_eq!(bounded.current, "bye Google");
    }
}
