//! Utterance splitting
//!
//! Story text is cut into sentences; poem text keeps its line structure and
//! turns blank lines into stanza breaks.

use once_cell::sync::Lazy;
use regex::Regex;

/// Whitespace run that follows sentence-ending punctuation
static SENTENCE_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]\s+").unwrap());

/// One element of an utterance sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Utterance {
    Text(String),
    StanzaBreak,
}

impl Utterance {
    pub fn text(&self) -> Option<&str> {
        match self {
            Utterance::Text(text) => Some(text),
            Utterance::StanzaBreak => None,
        }
    }

    pub fn is_stanza_break(&self) -> bool {
        matches!(self, Utterance::StanzaBreak)
    }
}

/// Split on whitespace that follows `.`, `!` or `?`; trimmed, empties dropped
pub fn split_story(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0;
    for m in SENTENCE_END.find_iter(text) {
        // punctuation is a single byte
        let end = m.start() + 1;
        push_trimmed(&mut sentences, &text[start..end]);
        start = m.end();
    }
    push_trimmed(&mut sentences, &text[start..]);
    sentences
}

fn push_trimmed(out: &mut Vec<String>, piece: &str) {
    let piece = piece.trim();
    if !piece.is_empty() {
        out.push(piece.to_string());
    }
}

/// One element per line; blank lines become [`Utterance::StanzaBreak`]
///
/// Non-blank lines pass through verbatim.
pub fn split_poem(text: &str) -> Vec<Utterance> {
    text.lines()
        .map(|line| {
            if line.trim().is_empty() {
                Utterance::StanzaBreak
            } else {
                Utterance::Text(line.to_string())
            }
        })
        .collect()
}
