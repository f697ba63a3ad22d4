//! Word extraction from raw transcription fragments.
//!
//! The speech engine echoes status chatter ("listening", "ready", ...) into
//! its output, sometimes concatenated with real words and with no separator
//! at all. This filter normalizes a fragment, strips the chatter and keeps
//! only plausible command words. The containment check is intentionally
//! aggressive: a genuine word that happens to contain a status substring is
//! rejected too, the accepted cost of staying robust against chatter.

/// Status phrases the engine is known to emit. Overridable in config.
pub const DEFAULT_STATUS_WORDS: &[&str] = &[
    "speak",
    "now",
    "speaknow",
    "recording",
    "transcribing",
    "listening",
    "ready",
    "model",
    "loaded",
    "error",
    "warning",
];

const MIN_WORD_LEN: usize = 2;
const MAX_WORD_LEN: usize = 20;
/// Candidates longer than this are suspected status concatenations.
const CONCAT_SUSPECT_LEN: usize = 14;
const MAX_STRIP_PASSES: usize = 30;
const MAX_REPEAT: usize = 10;

pub struct WordFilter {
    /// Status words, lowercase, longest first so compound phrases strip
    /// before their components.
    status: Vec<String>,
}

impl WordFilter {
    pub fn new(status_words: &[String]) -> Self {
        let mut status: Vec<String> = status_words.iter().map(|w| w.to_lowercase()).collect();
        status.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()));
        Self { status }
    }

    /// Extracts the valid words of one fragment, in original order.
    /// Never fails; unusable input yields an empty list.
    pub fn extract(&self, raw: &str) -> Vec<String> {
        let normalized: String = raw
            .to_lowercase()
            .chars()
            .filter(|c| c.is_alphabetic() || c.is_whitespace())
            .collect();

        let mut words = Vec::new();
        for candidate in normalized.split_whitespace() {
            let len = candidate.chars().count();
            if len < MIN_WORD_LEN {
                continue;
            }
            let cleaned = if len > CONCAT_SUSPECT_LEN {
                match self.strip_status(candidate) {
                    Some(cleaned) => cleaned,
                    None => continue,
                }
            } else {
                candidate.to_string()
            };

            let len = cleaned.chars().count();
            if len < MIN_WORD_LEN || len > MAX_WORD_LEN {
                continue;
            }
            if self.contains_status(&cleaned) {
                continue;
            }
            words.push(cleaned);
        }
        words
    }

    fn contains_status(&self, word: &str) -> bool {
        self.status.iter().any(|s| word.contains(s.as_str()))
    }

    /// Iteratively strips every status substring, and every small integer
    /// repetition of it, from a suspiciously long candidate. Returns None
    /// when nothing usable remains.
    fn strip_status(&self, word: &str) -> Option<String> {
        let mut cleaned = word.to_string();
        for _ in 0..MAX_STRIP_PASSES {
            if cleaned.is_empty() {
                break;
            }
            let before = cleaned.clone();
            for status in &self.status {
                cleaned = cleaned.replace(status.as_str(), "");
                for repeat in (1..=MAX_REPEAT).rev() {
                    let pattern = status.repeat(repeat);
                    if cleaned.contains(&pattern) {
                        cleaned = cleaned.replace(&pattern, "");
                    }
                }
            }
            if cleaned == before {
                break;
            }
        }

        if cleaned.chars().count() < MIN_WORD_LEN {
            return None;
        }
        if self.contains_status(&cleaned) {
            return None;
        }
        Some(cleaned)
    }
}

impl Default for WordFilter {
    fn default() -> Self {
        let defaults: Vec<String> = DEFAULT_STATUS_WORDS.iter().map(|s| s.to_string()).collect();
        Self::new(&defaults)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_fragment() {
        let filter = WordFilter::default();
        assert_eq!(filter.extract("Jump! Attack, left."), vec!["jump", "attack", "left"]);
    }

    #[test]
    fn test_concatenated_chatter_is_stripped() {
        let filter = WordFilter::default();
        assert_eq!(filter.extract("listeningjumpready"), vec!["jump"]);
    }

    #[test]
    fn test_exact_status_word_is_discarded() {
        let filter = WordFilter::default();
        assert!(filter.extract("now").is_empty());
        assert!(filter.extract("listening").is_empty());
    }

    #[test]
    fn test_status_substring_rejects_genuine_words() {
        // Accepted false positive: "snowman" contains "now".
        let filter = WordFilter::default();
        assert!(filter.extract("snowman").is_empty());
    }

    #[test]
    fn test_repeated_chatter_strips_to_nothing() {
        let filter = WordFilter::default();
        assert!(filter.extract("listeninglistening").is_empty());
        assert!(filter.extract("speaknowspeaknowspeaknow").is_empty());
    }

    #[test]
    fn test_short_and_overlong_candidates_are_discarded() {
        let filter = WordFilter::default();
        assert!(filter.extract("a").is_empty());
        // 21 letters, no status substrings: too long to be a real word.
        assert!(filter.extract("abcdefghijklmnopqrstu").is_empty());
    }

    #[test]
    fn test_digits_and_punctuation_are_dropped() {
        let filter = WordFilter::default();
        assert_eq!(filter.extract("jump 42 left!!"), vec!["jump", "left"]);
    }

    #[test]
    fn test_empty_input_yields_no_output() {
        let filter = WordFilter::default();
        assert!(filter.extract("").is_empty());
        assert!(filter.extract("   \t ").is_empty());
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let filter = WordFilter::default();
        let first = filter.extract("listeningjumpready attack speaknow dodge");
        let second = filter.extract(&first.join(" "));
        assert_eq!(first, second);
    }
}
