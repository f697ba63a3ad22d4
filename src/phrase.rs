//! Phrase matching over a bounded queue of recent words.
//!
//! Keywords may be multi-word phrases, so each incoming word is appended to
//! a short queue and the trailing 3-, 2- and 1-word candidates are checked
//! longest first. Matched words leave the queue so a phrase can never fire
//! twice off the same utterance; unmatched words simply age out.

use std::collections::{HashMap, VecDeque};

use log::{debug, info};

use crate::keymap::Token;

pub struct PhraseMatcher {
    mappings: HashMap<String, Vec<Token>>,
    recent: VecDeque<String>,
    depth: usize,
}

impl PhraseMatcher {
    pub fn new(mappings: HashMap<String, Vec<Token>>, depth: usize) -> Self {
        Self {
            mappings,
            recent: VecDeque::new(),
            depth: depth.max(1),
        }
    }

    /// Feeds one word and returns the keymap of the longest matching
    /// trailing phrase, if any.
    pub fn push_word(&mut self, word: &str) -> Option<Vec<Token>> {
        self.recent.push_back(word.to_lowercase());
        while self.recent.len() > self.depth {
            self.recent.pop_front();
        }

        let len = self.recent.len();
        for take in (1..=len).rev() {
            let phrase = self
                .recent
                .iter()
                .skip(len - take)
                .cloned()
                .collect::<Vec<_>>()
                .join(" ");
            if let Some(keymap) = self.mappings.get(&phrase).cloned() {
                info!("matched phrase {phrase:?}");
                for _ in 0..take {
                    self.recent.pop_back();
                }
                return Some(keymap);
            }
        }
        debug!("no phrase match in {:?}", self.recent);
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keymap::Token;

    fn mappings(entries: &[(&str, &str)]) -> HashMap<String, Vec<Token>> {
        entries
            .iter()
            .map(|(phrase, marker)| {
                (phrase.to_string(), vec![Token::Text(marker.to_string())])
            })
            .collect()
    }

    fn marker(keymap: &[Token]) -> &str {
        match &keymap[0] {
            Token::Text(marker) => marker,
            Token::Number(_) => unreachable!(),
        }
    }

    #[test]
    fn test_single_word_match() {
        let mut matcher = PhraseMatcher::new(mappings(&[("jump", "m-jump")]), 3);
        let hit = matcher.push_word("jump").unwrap();
        assert_eq!(marker(&hit), "m-jump");
    }

    #[test]
    fn test_longest_phrase_wins() {
        let mut matcher =
            PhraseMatcher::new(mappings(&[("go run fast", "m-long"), ("fast", "m-fast")]), 3);
        assert!(matcher.push_word("go").is_none());
        assert!(matcher.push_word("run").is_none());
        // "fast" alone also maps, but the three-word candidate is checked
        // first.
        let hit = matcher.push_word("fast").unwrap();
        assert_eq!(marker(&hit), "m-long");
    }

    #[test]
    fn test_matched_words_leave_the_queue() {
        let mut matcher = PhraseMatcher::new(mappings(&[("jump", "m-jump")]), 3);
        assert!(matcher.push_word("jump").is_some());
        // The queue was cleared of the match; a stale "jump" cannot combine
        // with later words.
        assert!(matcher.push_word("higher").is_none());
    }

    #[test]
    fn test_unmatched_words_age_out() {
        let mut matcher = PhraseMatcher::new(mappings(&[("one two three", "m-long")]), 3);
        assert!(matcher.push_word("zero").is_none());
        assert!(matcher.push_word("one").is_none());
        assert!(matcher.push_word("two").is_none());
        // "zero" has aged out; the trailing three words now match.
        let hit = matcher.push_word("three").unwrap();
        assert_eq!(marker(&hit), "m-long");
    }

    #[test]
    fn test_case_is_normalized() {
        let mut matcher = PhraseMatcher::new(mappings(&[("jump", "m-jump")]), 3);
        assert!(matcher.push_word("JUMP").is_some());
    }
}
