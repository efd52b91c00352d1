//! Accent resolution with placeholder protection
//!
//! Text is cut into alternating word runs and non-word runs. Word tokens that
//! already carry a combining acute, or that match a user override, are
//! resolved up front and swapped for opaque placeholders. Only the remaining
//! text reaches the automatic accenter; the resolved tokens are put back
//! afterwards, so the accenter can never re-mark them.
//!
//! Precedence per word token:
//! 1. manual accent mark in the token (kept verbatim)
//! 2. user override for the lowercased token
//! 3. left for the automatic accenter

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

/// Combining acute accent (U+0301)
pub const ACCENT_MARK: char = '\u{301}';

const PLACEHOLDER_OPEN: char = '\u{E000}';
const PLACEHOLDER_CLOSE: char = '\u{E001}';

/// Letters, the combining acute, and hyphens
static WORD_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\p{L}\x{0301}-]+").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    Word(&'a str),
    Other(&'a str),
}

impl<'a> Token<'a> {
    pub fn as_str(&self) -> &'a str {
        match self {
            Token::Word(s) | Token::Other(s) => s,
        }
    }
}

/// Split text into alternating word / non-word runs covering the whole input
pub fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut last = 0;
    for m in WORD_RUN.find_iter(text) {
        if m.start() > last {
            tokens.push(Token::Other(&text[last..m.start()]));
        }
        tokens.push(Token::Word(m.as_str()));
        last = m.end();
    }
    if last < text.len() {
        tokens.push(Token::Other(&text[last..]));
    }
    tokens
}

pub fn has_accent_mark(token: &str) -> bool {
    token.contains(ACCENT_MARK)
}

/// Lookup key for the override map: lowercase, accent marks removed
pub fn override_key(token: &str) -> String {
    token.replace(ACCENT_MARK, "").to_lowercase()
}

fn placeholder(index: usize) -> String {
    format!("{}{}{}", PLACEHOLDER_OPEN, index, PLACEHOLDER_CLOSE)
}

/// Text with resolved tokens swapped for placeholders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtectedText {
    /// Joined text as handed to the automatic accenter
    pub text: String,
    resolved: Vec<String>,
}

impl ProtectedText {
    /// Number of tokens resolved by a manual mark or an override
    pub fn resolved_count(&self) -> usize {
        self.resolved.len()
    }

    /// True if every placeholder survived in `candidate`
    pub fn placeholders_intact(&self, candidate: &str) -> bool {
        (0..self.resolved.len()).all(|i| candidate.contains(&placeholder(i)))
    }

    /// Substitute resolved tokens back into `accented`
    pub fn restore(&self, accented: &str) -> String {
        self.resolved
            .iter()
            .enumerate()
            .fold(accented.to_string(), |acc, (i, value)| {
                acc.replace(&placeholder(i), value)
            })
    }

    /// Restore into the un-accented joined text
    pub fn restore_unaccented(&self) -> String {
        self.restore(&self.text)
    }
}

/// Resolve manual marks and overrides, protecting them behind placeholders
///
/// `overrides` of `None` disables rule 2.
pub fn protect(text: &str, overrides: Option<&HashMap<String, String>>) -> ProtectedText {
    let mut out = String::with_capacity(text.len());
    let mut resolved = Vec::new();

    for token in tokenize(text) {
        let word = match token {
            Token::Word(word) => word,
            Token::Other(other) => {
                out.push_str(other);
                continue;
            }
        };

        let replacement = if has_accent_mark(word) {
            Some(word.to_string())
        } else {
            overrides.and_then(|map| map.get(&override_key(word)).cloned())
        };

        match replacement {
            Some(value) => {
                out.push_str(&placeholder(resolved.len()));
                resolved.push(value);
            }
            None => out.push_str(word),
        }
    }

    ProtectedText {
        text: out,
        resolved,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overrides(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_tokenize_covers_input() {
        let text = "Привет, кто-то! 42";
        let tokens = tokenize(text);
        let joined: String = tokens.iter().map(|t| t.as_str()).collect();
        assert_eq!(joined, text);
        assert_eq!(tokens[0], Token::Word("Привет"));
        assert_eq!(tokens[1], Token::Other(", "));
        assert_eq!(tokens[2], Token::Word("кто-то"));
        assert_eq!(tokens[3], Token::Other("! 42"));
    }

    #[test]
    fn test_tokenize_keeps_accent_inside_word() {
        let tokens = tokenize("за\u{301}мок");
        assert_eq!(tokens, vec![Token::Word("за\u{301}мок")]);
    }

    #[test]
    fn test_manual_mark_is_protected() {
        let protected = protect("мой за\u{301}мок", None);
        assert_eq!(protected.resolved_count(), 1);
        assert!(!protected.text.contains("за\u{301}мок"));
        assert_eq!(protected.restore_unaccented(), "мой за\u{301}мок");
    }

    #[test]
    fn test_override_applies_case_insensitively() {
        let map = overrides(&[("замок", "замо\u{301}к")]);
        let protected = protect("Замок закрыт", Some(&map));
        assert_eq!(protected.resolved_count(), 1);
        assert_eq!(protected.restore_unaccented(), "замо\u{301}к закрыт");
    }

    #[test]
    fn test_manual_mark_beats_override() {
        let map = overrides(&[("замок", "замо\u{301}к")]);
        let protected = protect("за\u{301}мок", Some(&map));
        assert_eq!(protected.restore_unaccented(), "за\u{301}мок");
    }

    #[test]
    fn test_overrides_disabled() {
        let protected = protect("замок", None);
        assert_eq!(protected.resolved_count(), 0);
        assert_eq!(protected.text, "замок");
    }

    #[test]
    fn test_placeholders_survive_accenting() {
        let text = (0..11)
            .map(|i| format!("с{}о\u{301}в", i))
            .collect::<Vec<_>>()
            .join(" ");
        let protected = protect(&text, None);
        assert_eq!(protected.resolved_count(), 11);
        // index 1 must not clobber index 10
        assert_eq!(protected.restore_unaccented(), text);
        assert!(protected.placeholders_intact(&protected.text));
        assert!(!protected.placeholders_intact("nothing here"));
    }
}
