//! Field cleaners for values pulled out of recognized card text.
//!
//! OCR of the Devanagari card template leaks a characteristic set of
//! artifacts into captured values: box-drawing bars read as `|`, stray
//! short Latin tokens, and scattered `=`/`z`/`&`/`*` glyphs. The cleaners
//! remove exactly that noise and nothing more.

use crate::parse::normalize::normalize_digits;
use once_cell::sync::Lazy;
use regex::Regex;

static BAR_NOISE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[|¦\\/<>]").unwrap());
static LATIN_NOISE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+[A-Za-z]{1,3}\s*").unwrap());
static GLYPH_NOISE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[=z&*]").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Maximum word count kept for the voter's own name.
pub const VOTER_NAME_WORDS: usize = 4;
/// Maximum word count kept for the relation's name.
pub const RELATION_NAME_WORDS: usize = 3;

/// Clean a captured person name and cap it at `max_words` words.
pub fn clean_person_name(raw: &str, max_words: usize) -> String {
    let text = BAR_NOISE.replace_all(raw, " ");
    let text = LATIN_NOISE.replace_all(&text, " ");
    let text = GLYPH_NOISE.replace_all(&text, "");
    let text = WHITESPACE.replace_all(text.trim(), " ");

    text.split(' ')
        .filter(|w| !w.is_empty())
        .take(max_words)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Reduce a captured house-number value to ASCII digits.
///
/// Values with no digits at all collapse to the `"NA"` sentinel, matching
/// cards where the field is present but unreadable or genuinely blank.
pub fn clean_house_number(raw: &str) -> String {
    let digits: String = normalize_digits(raw)
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect();
    if digits.is_empty() {
        "NA".to_string()
    } else {
        digits
    }
}

/// Normalize a captured age to ASCII digits.
pub fn clean_age(raw: &str) -> String {
    normalize_digits(raw)
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect()
}

/// Classify a captured gender token.
///
/// The feminine token is frequently mangled by OCR, so any of its common
/// corruptions count; everything else defaults to masculine, which is what
/// the template prints when the field fails to scan.
pub fn classify_gender(raw: &str) -> (&'static str, &'static str) {
    if raw.contains("स्त्री") || raw.contains("स्री") || raw.contains("जी") {
        ("स्त्री", "महिला")
    } else {
        ("पु", "पुरुष")
    }
}
