use chatrelay_protocol::ConversationTurn;

const SNIPPET_LIMIT: usize = 1000;

/// Prompt asking a model to name a conversation.
pub fn title_prompt(turns: &[ConversationTurn]) -> String {
    let snippet = turns
        .iter()
        .map(|turn| format!("{}: {}", turn.role.as_str(), turn.content))
        .collect::<Vec<_>>()
        .join("\n");
    let snippet: String = snippet.chars().take(SNIPPET_LIMIT).collect();
    format!(
        "Summarize the following conversation into a very short, descriptive chat title (max 5 words). Do NOT use quotes in the title.\nConversation snippet:\n{snippet}\nTitle:"
    )
}

/// First line of the model's answer with surrounding quotes removed.
pub fn clean_title(raw: &str) -> String {
    let line = raw.trim().lines().next().unwrap_or("").trim();
    let line = line.strip_prefix(['"', '\'']).unwrap_or(line);
    let line = line.strip_suffix(['"', '\'']).unwrap_or(line);
    line.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_lists_turns_by_role() {
        let prompt = title_prompt(&[
            ConversationTurn::user("How do I sort a Vec?"),
            ConversationTurn::assistant("Use sort()."),
        ]);
        assert!(prompt.starts_with("Summarize the following conversation"));
        assert!(prompt.contains("user: How do I sort a Vec?\nassistant: Use sort()."));
        assert!(prompt.ends_with("\nTitle:"));
    }

    #[test]
    fn prompt_snippet_is_truncated() {
        let prompt = title_prompt(&[ConversationTurn::user("#".repeat(5000))]);
        assert_eq!(prompt.matches('#').count(), SNIPPET_LIMIT - "user: ".len());
    }

    #[test]
    fn clean_title_strips_quotes_and_extra_lines() {
        assert_eq!(clean_title("  \"Sorting Vectors\"  "), "Sorting Vectors");
        assert_eq!(clean_title("'Rust Tips'\nBecause the user asked"), "Rust Tips");
        assert_eq!(clean_title(""), "");
    }
}
