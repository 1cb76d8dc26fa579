//! Keyword heuristic over a normalized description.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

pub const DEFAULT_LIMIT: usize = 5;

const MIN_LEN: usize = 5;

const STOPWORDS: &[&str] = &["this", "that", "with", "from", "have", "heres", "thats"];

static PUNCTUATION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").unwrap());

/// Picks up to `limit` distinct words longer than four characters, in order of
/// first appearance, skipping a small stoplist.
pub fn extract_keywords(text: &str, limit: usize) -> Vec<String> {
    let cleaned = PUNCTUATION_RE.replace_all(text, "");
    let mut seen = HashSet::new();
    let mut keywords = Vec::new();

    for word in cleaned.split_whitespace() {
        if keywords.len() == limit {
            break;
        }
        if word.chars().count() < MIN_LEN {
            continue;
        }
        if STOPWORDS.contains(&word.to_lowercase().as_str()) {
            continue;
        }
        if seen.insert(word) {
            keywords.push(word.to_string());
        }
    }

    keywords
}

pub fn extract_default(text: &str) -> Vec<String> {
    extract_keywords(text, DEFAULT_LIMIT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_short_and_stoplisted_words() {
        let words = extract_default("This cat sat with a wonderful sunset");
        assert_eq!(words, vec!["wonderful", "sunset"]);
    }

    #[test]
    fn stoplist_is_case_insensitive() {
        assert!(extract_default("Heres THATS Thats heres").is_empty());
    }

    #[test]
    fn punctuation_is_removed_before_splitting() {
        let words = extract_default("A harbor, at dusk; boats (moored) quietly... harbor!");
        assert_eq!(words, vec!["harbor", "boats", "moored", "quietly"]);
    }

    #[test]
    fn respects_limit_without_duplicates() {
        let text = "mountain valley river forest meadow mountain glacier canyon";
        for limit in 0..8 {
            let words = extract_keywords(text, limit);
            assert!(words.len() <= limit);
            let unique: HashSet<_> = words.iter().collect();
            assert_eq!(unique.len(), words.len());
            assert!(words.iter().all(|w| w.chars().count() > 4));
        }
        assert_eq!(
            extract_default(text),
            vec!["mountain", "valley", "river", "forest", "meadow"]
        );
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        assert_eq!(extract_default("niño árbol"), vec!["árbol"]);
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(extract_default("").is_empty());
        assert!(extract_default("   \n ").is_empty());
    }
}
