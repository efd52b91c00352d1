//! Literal text normalization
//!
//! Fixed substitution tables only. There is deliberately no general
//! number-to-words grammar: a numeral that is not in the table is left as-is.

use once_cell::sync::Lazy;
use regex::Regex;

/// Exact numeric/date expansions, applied in order
pub const NUMERIC_SUBSTITUTIONS: &[(&str, &str)] = &[
    ("2024", "две тысячи двадцать четыре"),
    ("2025", "две тысячи двадцать пять"),
    ("24.04.3", "двадцать четыре ноль четыре три"),
];

/// Literal abbreviation expansions, applied before the regex rules
pub const ABBREVIATIONS: &[(&str, &str)] = &[("т.д.", "так далее"), ("т.п.", "тому подобное")];

static CITY_ABBREVIATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bг\.\b").unwrap());

static WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").unwrap());

pub fn expand_numbers(text: &str) -> String {
    NUMERIC_SUBSTITUTIONS
        .iter()
        .fold(text.to_string(), |acc, (from, to)| acc.replace(from, to))
}

pub fn expand_abbreviations(text: &str) -> String {
    let text = ABBREVIATIONS
        .iter()
        .fold(text.to_string(), |acc, (from, to)| acc.replace(from, to));
    CITY_ABBREVIATION.replace_all(&text, "город").into_owned()
}

/// Collapse whitespace runs (newlines included) to one space and trim
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}

/// Numbers, then abbreviations, then whitespace
pub fn normalize(text: &str) -> String {
    collapse_whitespace(&expand_abbreviations(&expand_numbers(text)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_table() {
        assert_eq!(expand_numbers("в 2024 году"), "в две тысячи двадцать четыре году");
        assert_eq!(expand_numbers("2025"), "две тысячи двадцать пять");
        assert_eq!(expand_numbers("версия 24.04.3"), "версия двадцать четыре ноль четыре три");
        // Not in the table
        assert_eq!(expand_numbers("1999"), "1999");
    }

    #[test]
    fn test_abbreviations() {
        assert_eq!(expand_abbreviations("яблоки, груши и т.д."), "яблоки, груши и так далее");
        assert_eq!(expand_abbreviations("и т.п."), "и тому подобное");
        assert_eq!(expand_abbreviations("г.Москва"), "городМосква");
    }

    #[test]
    fn test_city_abbreviation_needs_word_after_dot() {
        // `\b` after the dot requires a word character to follow
        assert_eq!(expand_abbreviations("г. Москва"), "г. Москва");
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  один \n\t два   три "), "один два три");
        assert_eq!(collapse_whitespace("   "), "");
    }

    #[test]
    fn test_normalize_order() {
        assert_eq!(
            normalize(" В  2025\nи т.д. "),
            "В две тысячи двадцать пять и так далее"
        );
    }
}
