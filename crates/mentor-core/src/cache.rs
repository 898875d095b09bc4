//! Local canned replies for trivial prompts, and the savings they produce.

use serde::{Deserialize, Serialize};

/// Approximate token size of the full system prompt.
pub const FULL_SYSTEM_PROMPT_TOKENS: u64 = 200;
/// Approximate token size of the cost-saver system prompt.
pub const COST_SAVER_SYSTEM_PROMPT_TOKENS: u64 = 65;

const CORE_REPLIES: &[(&str, &str)] = &[
    ("hello", "Hello! How can I assist you today?"),
    ("hi", "Hi there! What can I do for you?"),
    (
        "how are you",
        "I am MentorX, operating at peak efficiency. Thanks for asking!",
    ),
    ("what is your name", "I am MentorX, your personal AI mentor."),
    (
        "thanks",
        "You're welcome! Let me know if you need anything else.",
    ),
    (
        "thank you",
        "You're welcome! Is there anything else I can help with?",
    ),
];

/// Lowercases, trims and drops trailing punctuation so "Hello!" hits "hello".
pub fn normalize_prompt(prompt: &str) -> String {
    prompt
        .trim()
        .trim_end_matches(|c: char| c.is_ascii_punctuation() || c.is_whitespace())
        .to_lowercase()
}

/// Rough token estimate, four characters per token.
pub fn estimate_tokens(text: &str) -> u64 {
    (text.chars().count() as u64).div_ceil(4)
}

pub fn cached_reply(prompt: &str) -> Option<&'static str> {
    let normalized = normalize_prompt(prompt);
    CORE_REPLIES
        .iter()
        .find(|(key, _)| *key == normalized)
        .map(|(_, reply)| *reply)
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EfficiencyStats {
    pub api_calls_avoided: u64,
    pub tokens_saved: u64,
}

impl EfficiencyStats {
    pub fn record_cache_hit(&mut self, prompt: &str, reply: &str, cost_saver: bool) {
        let system_tokens = if cost_saver {
            COST_SAVER_SYSTEM_PROMPT_TOKENS
        } else {
            FULL_SYSTEM_PROMPT_TOKENS
        };
        self.api_calls_avoided += 1;
        self.tokens_saved += system_tokens + estimate_tokens(prompt) + estimate_tokens(reply);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cached_reply_matches_normalized_prompt() {
        assert_eq!(
            cached_reply("  Hello! "),
            Some("Hello! How can I assist you today?")
        );
        assert_eq!(
            cached_reply("What is your name?"),
            Some("I am MentorX, your personal AI mentor.")
        );
        assert_eq!(cached_reply("hello there"), None);
    }

    #[test]
    fn stats_accumulate_per_hit() {
        let mut stats = EfficiencyStats::default();
        stats.record_cache_hit("hi", "Hi there! What can I do for you?", false);
        stats.record_cache_hit("hi", "Hi there! What can I do for you?", true);

        assert_eq!(stats.api_calls_avoided, 2);
        assert_eq!(stats.tokens_saved, 200 + 65 + 2 * (1 + 8));
    }
}
