use std::sync::LazyLock;

use chatrelay_common::BrandConfig;
use chatrelay_protocol::ConversationTurn;
use regex::Regex;

const CREATOR_TRIGGERS: [&str; 9] = [
    "who made you",
    "who created you",
    "your creator",
    "your author",
    "who is your developer",
    "who's your developer",
    "who built you",
    "who trained you",
    "who are you trained by",
];

const BRAND_FOLLOW_UPS: [&str; 3] = ["who is", "what is", "tell me about"];

/// Broader origin questions that slip past the substring triggers.
static ORIGIN_QUESTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?ix)
        \bwho\s*(?:is|'s|are)?\s+(?:your|ur)\s+(?:maker|makers|creator|creators|developer|developers|owner|owners|author|authors|father|parent\s+company)\b
        | \bwho\s+(?:owns|made|built|created|developed|trained|designed|programmed|coded)\s+(?:you|u)\b
        | \b(?:which|what)\s+(?:company|organi[sz]ation|team|person|lab)\s+(?:made|built|created|developed|trained|owns|designed|is\s+behind)\s+(?:you|u)\b
        | \bwho\s+(?:are|were)\s+you\s+(?:made|built|created|developed|trained|designed)\s+by\b
        | \bwho\s+is\s+behind\s+(?:you|u)\b
        ",
    )
    .expect("hardcoded regex")
});

/// Fixed answer to questions about who made the assistant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributionOverride {
    trigger_phrases: Vec<String>,
    fixed_reply: String,
}

impl AttributionOverride {
    pub fn new(trigger_phrases: Vec<String>, fixed_reply: impl Into<String>) -> Self {
        let trigger_phrases = trigger_phrases
            .into_iter()
            .map(|phrase| phrase.trim().to_lowercase())
            .filter(|phrase| !phrase.is_empty())
            .collect();
        Self {
            trigger_phrases,
            fixed_reply: fixed_reply.into(),
        }
    }

    pub fn from_brand(brand: &BrandConfig) -> Self {
        let mut triggers: Vec<String> = CREATOR_TRIGGERS.iter().map(|t| t.to_string()).collect();
        for name in [&brand.name, &brand.alias] {
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            for lead in BRAND_FOLLOW_UPS {
                triggers.push(format!("{lead} {name}"));
            }
        }
        Self::new(triggers, brand.attribution_reply.clone())
    }

    pub fn fixed_reply(&self) -> &str {
        &self.fixed_reply
    }

    /// Returns the fixed reply when the latest user turn contains a trigger
    /// phrase, ignoring case.
    pub fn check(&self, turns: &[ConversationTurn]) -> Option<&str> {
        let prompt = latest_user_prompt(turns).to_lowercase();
        if prompt.is_empty() {
            return None;
        }
        self.trigger_phrases
            .iter()
            .any(|phrase| prompt.contains(phrase.as_str()))
            .then_some(self.fixed_reply.as_str())
    }

    /// True when `text` asks about the assistant's origin, either through a
    /// trigger phrase or a looser phrasing.
    pub fn asks_about_origin(&self, text: &str) -> bool {
        let lowered = text.to_lowercase();
        self.trigger_phrases
            .iter()
            .any(|phrase| lowered.contains(phrase.as_str()))
            || ORIGIN_QUESTION.is_match(text)
    }
}

/// Content of the last user turn, or `""` when there is none.
pub fn latest_user_prompt(turns: &[ConversationTurn]) -> &str {
    turns
        .iter()
        .rev()
        .find(|turn| turn.is_user())
        .map(|turn| turn.content.as_str())
        .unwrap_or("")
}
