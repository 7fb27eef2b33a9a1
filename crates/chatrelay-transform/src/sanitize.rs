use chatrelay_common::BrandConfig;
use chatrelay_protocol::ConversationTurn;
use regex::{NoExpand, Regex, RegexBuilder};

/// Replaces the custom brand names in outbound user text so the upstream
/// model sees its own brand.
#[derive(Debug, Clone)]
pub struct Sanitizer {
    names: Option<Regex>,
    placeholder: String,
}

impl Sanitizer {
    pub fn new<I, S>(names: I, placeholder: impl Into<String>) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let alternatives: Vec<String> = names
            .into_iter()
            .map(|name| name.as_ref().trim().to_string())
            .filter(|name| !name.is_empty())
            .map(|name| regex::escape(&name))
            .collect();
        let names = if alternatives.is_empty() {
            None
        } else {
            Some(
                RegexBuilder::new(&alternatives.join("|"))
                    .case_insensitive(true)
                    .build()?,
            )
        };
        Ok(Self {
            names,
            placeholder: placeholder.into(),
        })
    }

    pub fn from_brand(brand: &BrandConfig) -> Result<Self, regex::Error> {
        Self::new([&brand.name, &brand.alias], brand.sanitize_placeholder.clone())
    }

    /// A sanitizer that leaves text untouched.
    pub fn disabled() -> Self {
        Self {
            names: None,
            placeholder: String::new(),
        }
    }

    pub fn sanitize_text(&self, text: &str) -> String {
        match &self.names {
            Some(names) => names
                .replace_all(text, NoExpand(&self.placeholder))
                .into_owned(),
            None => text.to_string(),
        }
    }

    /// Sanitizes user turns; assistant turns pass through.
    pub fn sanitize_turn(&self, turn: &ConversationTurn) -> ConversationTurn {
        if turn.is_user() {
            ConversationTurn::new(turn.role, self.sanitize_text(&turn.content))
        } else {
            turn.clone()
        }
    }
}
