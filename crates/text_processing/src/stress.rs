//! Stress-hint encodings for synthesis backends

use once_cell::sync::Lazy;
use regex::Regex;
use voice_render_core::StressFormat;

use crate::accents::ACCENT_MARK;

/// A letter followed by the combining acute
static MARKED_LETTER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\p{L})\x{0301}").unwrap());

/// Re-encode combining acute marks the way the backend expects
pub fn to_stress_hint_format(text: &str, format: StressFormat) -> String {
    match format {
        StressFormat::None => text.to_string(),
        StressFormat::Plus => MARKED_LETTER
            .replace_all(text, "+$1")
            .replace(ACCENT_MARK, ""),
        StressFormat::PlusAndAcute => MARKED_LETTER
            .replace_all(text, "+${1}\u{301}")
            .into_owned(),
    }
}
