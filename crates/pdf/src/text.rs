use unicode_normalization::UnicodeNormalization;

const LIGATURES: [(char, &str); 5] = [
    ('\u{FB00}', "ff"),
    ('\u{FB01}', "fi"),
    ('\u{FB02}', "fl"),
    ('\u{FB03}', "ffi"),
    ('\u{FB04}', "ffl"),
];

/// Clean up the text of a single decoded glyph run.
///
/// Applies NFC normalization (decomposed Hangul jamo become syllables),
/// expands Latin ligatures and drops U+FFFD replacement characters left by
/// undecodable bytes. Whitespace is preserved: spacing belongs to line
/// reconstruction.
pub fn normalize_glyph_text(text: &str) -> String {
    let mut result = String::with_capacity(text.len());

    for c in text.nfc() {
        if c == '\u{FFFD}' {
            continue;
        }
        match LIGATURES.iter().find(|(lig, _)| *lig == c) {
            Some((_, expanded)) => result.push_str(expanded),
            None => result.push(c),
        }
    }

    result
}
