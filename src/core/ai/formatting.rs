//! Text helpers for turning chat messages into prompts and answers into
//! Discord-sized messages.

/// Discord's per-message content limit, in characters.
pub const DISCORD_MESSAGE_LIMIT: usize = 2000;

/// Remove every `<@id>` and `<@!id>` mention of the given users and trim.
pub fn strip_mentions(content: &str, mention_ids: &[u64]) -> String {
    let mut prompt = content.to_string();
    for id in mention_ids {
        prompt = prompt.replace(&format!("<@!{}>", id), "");
        prompt = prompt.replace(&format!("<@{}>", id), "");
    }
    prompt.trim().to_string()
}

/// Split text into chunks of at most `limit` characters.
///
/// Counts characters, not bytes, so multi-byte text is never cut mid-char.
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    if text.is_empty() || limit == 0 {
        return Vec::new();
    }

    text.chars()
        .collect::<Vec<char>>()
        .chunks(limit)
        .map(|chunk| chunk.iter().collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_both_mention_forms() {
        let content = "<@123> what is <@!123> the capital of <@456> France?";
        assert_eq!(
            strip_mentions(content, &[123, 456]),
            "what is  the capital of  France?"
        );
    }

    #[test]
    fn only_mention_leaves_empty_prompt() {
        assert_eq!(strip_mentions("  <@!99>  ", &[99]), "");
    }

    #[test]
    fn other_ids_are_untouched() {
        assert_eq!(strip_mentions("<@1> hi <@2>", &[1]), "hi <@2>");
    }

    #[test]
    fn short_text_is_one_chunk() {
        assert_eq!(split_message("hello", DISCORD_MESSAGE_LIMIT), vec!["hello"]);
        assert!(split_message("", DISCORD_MESSAGE_LIMIT).is_empty());
    }

    #[test]
    fn long_text_is_split_on_char_boundaries() {
        let text = "ü".repeat(4500);
        let chunks = split_message(&text, DISCORD_MESSAGE_LIMIT);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].chars().count(), 2000);
        assert_eq!(chunks[2].chars().count(), 500);
    }
}
