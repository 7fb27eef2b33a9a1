use regex::{NoExpand, Regex, RegexBuilder};

/// A single case-insensitive substitution.
#[derive(Debug, Clone)]
pub struct RewriteRule {
    pattern: Regex,
    replacement: String,
}

impl RewriteRule {
    pub fn new(pattern: &str, replacement: impl Into<String>) -> Result<Self, regex::Error> {
        let pattern = RegexBuilder::new(pattern).case_insensitive(true).build()?;
        Ok(Self {
            pattern,
            replacement: replacement.into(),
        })
    }

    /// Matches `phrase` literally.
    pub fn literal(phrase: &str, replacement: impl Into<String>) -> Result<Self, regex::Error> {
        Self::new(&regex::escape(phrase), replacement)
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    fn apply(&self, text: &str) -> String {
        self.pattern
            .replace_all(text, NoExpand(&self.replacement))
            .into_owned()
    }
}

/// Ordered rules; each one sees the output of the previous.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<RewriteRule>,
}

impl RuleSet {
    pub fn new(rules: Vec<RewriteRule>) -> Self {
        Self { rules }
    }

    /// Rewrites self-descriptions that credit `upstream` so they credit
    /// `custom` instead. Only the listed phrases are touched; other
    /// mentions of `upstream` pass through.
    pub fn brand_rules(upstream: &str, custom: &str) -> Result<Self, regex::Error> {
        let sentences = [
            ("I am a large language model, trained by {u}.", "I am a large language model, trained by {c}."),
            ("I'm a large language model, trained by {u}.", "I'm a large language model, trained by {c}."),
            ("I am an AI assistant developed by {u}.", "I am an AI assistant developed by {c}."),
            ("I'm an AI assistant developed by {u}.", "I'm an AI assistant developed by {c}."),
            ("I was developed by {u}.", "I was developed by {c}."),
            ("I was trained by {u}.", "I was trained by {c}."),
            ("I am a {u}-trained AI.", "I am a {c}-trained AI."),
        ];
        let phrases = [
            ("trained by {u}", "trained by {c}"),
            ("developed by {u}", "developed by {c}"),
            ("{u}'s AI", "{c}'s AI"),
            ("a {u} product", "a {c} product"),
            ("{u} engineers", "{c}'s developers"),
            ("my developers at {u}", "my developer, {c}"),
            ("my creators at {u}", "my creator, {c}"),
            ("{u}-trained", "{c}-trained"),
        ];

        let fill = |template: &str| template.replace("{u}", upstream).replace("{c}", custom);
        let mut rules = Vec::with_capacity(sentences.len() + phrases.len());
        for (pattern, replacement) in sentences.into_iter().chain(phrases) {
            rules.push(RewriteRule::literal(&fill(pattern), fill(replacement))?);
        }
        Ok(Self::new(rules))
    }

    pub fn rewrite(&self, text: &str) -> String {
        rewrite(text, &self.rules)
    }
}

/// Applies `rules` in order. Each rule replaces every non-overlapping match.
pub fn rewrite(text: &str, rules: &[RewriteRule]) -> String {
    let mut out = text.to_string();
    for rule in rules {
        out = rule.apply(&out);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_rules() -> RuleSet {
        RuleSet::brand_rules("Google", "calmash1").unwrap()
    }

    #[test]
    fn self_description_is_rebranded() {
        let rules = default_rules();
        assert_eq!(
            rules.rewrite("I am a large language model, trained by Google."),
            "I am a large language model, trained by calmash1."
        );
        assert_eq!(
            rules.rewrite("Hi! I'm an AI assistant developed by Google. Ask away."),
            "Hi! I'm an AI assistant developed by calmash1. Ask away."
        );
        assert_eq!(rules.rewrite("I am a Google-trained AI."), "I am a calmash1-trained AI.");
    }

    #[test]
    fn matching_ignores_case_and_replaces_every_occurrence() {
        let rules = default_rules();
        assert_eq!(
            rules.rewrite("TRAINED BY GOOGLE, then trained by google again"),
            "trained by calmash1, then trained by calmash1 again"
        );
        assert_eq!(
            rules.rewrite("Google engineers and my creators at Google"),
            "calmash1's developers and my creator, calmash1"
        );
    }

    #[test]
    fn bare_brand_mentions_are_left_alone() {
        let rules = default_rules();
        let text = "You can search it on Google or open Google Maps.";
        assert_eq!(rules.rewrite(text), text);
    }

    #[test]
    fn default_rules_are_idempotent() {
        let rules = default_rules();
        let samples = [
            "I'm a large language model, trained by Google.",
            "I was developed by Google. Google's AI team and Google engineers helped.",
            "This is a Google product made by my developers at Google.",
            "Nothing to see here.",
            "",
        ];
        for sample in samples {
            let once = rules.rewrite(sample);
            assert_eq!(rules.rewrite(&once), once, "sample: {sample}");
        }
    }

    #[test]
    fn replacement_text_is_not_expanded() {
        let rule = RewriteRule::new("cost", "$1 dollars").unwrap();
        assert_eq!(rewrite("the cost", &[rule]), "the $1 dollars");
    }

    #[test]
    fn rules_compose_in_order() {
        let rules = vec![
            RewriteRule::literal("a", "b").unwrap(),
            RewriteRule::literal("b", "c").unwrap(),
        ];
        assert_eq!(rewrite("a", &rules), "c");
    }
}
