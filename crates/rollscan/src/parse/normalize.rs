//! Script and glyph normalization for recognized text.

/// Map Devanagari digits to their ASCII equivalents, leaving every other
/// character untouched.
pub fn normalize_digits(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '०' => '0',
            '१' => '1',
            '२' => '2',
            '३' => '3',
            '४' => '4',
            '५' => '5',
            '६' => '6',
            '७' => '7',
            '८' => '8',
            '९' => '9',
            other => other,
        })
        .collect()
}

/// Repair the Latin glyphs Tesseract most often confuses inside card
/// identifiers, then drop everything that cannot appear in one.
///
/// The confusion table is directional: letters become the digits they get
/// misread as, never the reverse, so an already-clean identifier passes
/// through unchanged.
pub fn normalize_id_candidate(raw: &str) -> String {
    raw.to_uppercase()
        .chars()
        .map(|c| match c {
            'O' => '0',
            'I' => '1',
            'L' => '1',
            'B' => '8',
            'S' => '5',
            'G' => '6',
            other => other,
        })
        .filter(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || *c == '/')
        .collect()
}
