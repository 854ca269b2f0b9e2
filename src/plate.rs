//! Plate extraction
//!
//! Scans recognized lines for a 7-character plate shaped as 2 letters, 3
//! digits and 2 letters. OCR confuses similar glyphs, so each segment of a
//! candidate window gets its own substitution table before the strict type
//! check. The first window that survives wins.

use crate::engine::RecognizedLine;
use regex::Regex;
use std::sync::LazyLock;

/// Plate length in characters
pub const PLATE_LEN: usize = 7;

/// Punctuation, symbols and whitespace removed before scanning
static NOISE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"[&/\\#,+()\-\[\]$~%.'":*?°‘’`<>{}\s]"#).expect("valid noise pattern")
});

/// Ordered (from, to) substitutions for the leading letter pair
pub const LEADING_LETTER_FIXES: &[(char, char)] = &[('1', 'T')];

/// Ordered (from, to) substitutions for the digit triple
pub const DIGIT_FIXES: &[(char, char)] =
    &[('S', '5'), ('O', '0'), ('I', '1'), ('T', '1'), ('Z', '7')];

/// Ordered (from, to) substitutions for the trailing letter pair
pub const TRAILING_LETTER_FIXES: &[(char, char)] = &[('1', 'T'), ('7', 'Z'), ('8', 'Z')];

/// Strip noise characters and whitespace, then uppercase
pub fn normalize_line(text: &str) -> String {
    NOISE.replace_all(text, "").to_uppercase()
}

/// Apply each substitution in order, every occurrence in the segment
pub fn apply_fixes(segment: &str, fixes: &[(char, char)]) -> String {
    fixes.iter().fold(segment.to_string(), |acc, &(from, to)| {
        acc.replace(from, &to.to_string())
    })
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn all_letters(segment: &str) -> bool {
    segment.chars().all(|c| c.is_ascii_alphabetic())
}

fn all_digits(segment: &str) -> bool {
    segment.chars().all(|c| c.is_ascii_digit())
}

/// Check and correct one 7-character window
///
/// Windows containing anything but word characters are skipped without
/// touching the correction tables.
pub fn match_window(window: &[char]) -> Option<String> {
    if window.len() != PLATE_LEN || !window.iter().copied().all(is_word_char) {
        return None;
    }

    let first: String = window[..2].iter().collect();
    let middle: String = window[2..5].iter().collect();
    let last: String = window[5..].iter().collect();

    let first = apply_fixes(&first, LEADING_LETTER_FIXES);
    if !all_letters(&first) {
        return None;
    }

    let middle = apply_fixes(&middle, DIGIT_FIXES);
    if !all_digits(&middle) {
        return None;
    }

    let last = apply_fixes(&last, TRAILING_LETTER_FIXES);
    if !all_letters(&last) {
        return None;
    }

    Some(format!("{}{}{}", first, middle, last))
}

/// Find the first plate in a single line of text
pub fn find_in_text(text: &str) -> Option<String> {
    let chars: Vec<char> = normalize_line(text).chars().collect();
    if chars.len() < PLATE_LEN {
        return None;
    }

    chars.windows(PLATE_LEN).find_map(match_window)
}

/// Find the first plate across recognized lines, in line order
pub fn extract_plate(lines: &[RecognizedLine]) -> Option<String> {
    let plate = lines.iter().find_map(|line| find_in_text(&line.text));
    match &plate {
        Some(plate) => tracing::debug!("Extracted plate {}", plate),
        None => tracing::debug!("No plate in {} lines", lines.len()),
    }
    plate
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(texts: &[&str]) -> Vec<RecognizedLine> {
        texts.iter().map(|t| RecognizedLine::from_raw(*t)).collect()
    }

    #[test]
    fn test_clean_plate() {
        assert_eq!(extract_plate(&lines(&["AB123CD"])), Some("AB123CD".to_string()));
    }

    #[test]
    fn test_digit_segment_confusion_is_corrected() {
        assert_eq!(extract_plate(&lines(&["AB1Z3CD"])), Some("AB173CD".to_string()));
    }

    #[test]
    fn test_all_digit_confusions() {
        assert_eq!(find_in_text("ABSOICD"), Some("AB501CD".to_string()));
        assert_eq!(find_in_text("ABT2ZCD"), Some("AB127CD".to_string()));
    }

    #[test]
    fn test_letter_segment_confusions_are_corrected() {
        assert_eq!(find_in_text("1B123C1"), Some("TB123CT".to_string()));
        assert_eq!(find_in_text("AB12378"), Some("AB123ZZ".to_string()));
    }

    #[test]
    fn test_substitutions_apply_to_every_occurrence() {
        assert_eq!(apply_fixes("SS5", DIGIT_FIXES), "555");
        assert_eq!(apply_fixes("11", LEADING_LETTER_FIXES), "TT");
        assert_eq!(find_in_text("11SS5CD"), Some("TT555CD".to_string()));
    }

    #[test]
    fn test_substitution_order_is_fixed() {
        // T becomes 1 before Z becomes 7; neither maps back
        assert_eq!(apply_fixes("TZT", DIGIT_FIXES), "171");
        assert_eq!(apply_fixes("17", TRAILING_LETTER_FIXES), "TZ");
    }

    #[test]
    fn test_all_letters_line_has_no_plate() {
        assert_eq!(extract_plate(&lines(&["HELLO WORLD"])), None);
    }

    #[test]
    fn test_short_line_is_skipped() {
        assert_eq!(find_in_text("AB12CD"), None);
        assert_eq!(find_in_text(""), None);
    }

    #[test]
    fn test_noise_is_stripped_before_scanning() {
        assert_eq!(find_in_text(" ab-123 cd. "), Some("AB123CD".to_string()));
        assert_eq!(find_in_text("[AB] 123 {CD}"), Some("AB123CD".to_string()));
        assert_eq!(normalize_line("a/b\\c#d,e+f°g‘h’i`j"), "ABCDEFGHIJ");
    }

    #[test]
    fn test_sliding_window_finds_plate_mid_line() {
        assert_eq!(find_in_text("XXAB123CDXX"), Some("AB123CD".to_string()));
    }

    #[test]
    fn test_first_match_wins_within_line() {
        assert_eq!(find_in_text("AB123CDEF456GH"), Some("AB123CD".to_string()));
    }

    #[test]
    fn test_first_line_with_match_wins() {
        let input = lines(&["NOTHING HERE", "ZZ999YY", "AB123CD"]);
        assert_eq!(extract_plate(&input), Some("ZZ999YY".to_string()));
    }

    #[test]
    fn test_window_with_non_word_char_is_skipped() {
        let window: Vec<char> = "AB1!3CD".chars().collect();
        assert_eq!(match_window(&window), None);
        // Underscore passes the shape check but fails the typed check
        let window: Vec<char> = "A_123CD".chars().collect();
        assert_eq!(match_window(&window), None);
    }

    #[test]
    fn test_corrected_segments_are_fixed_points() {
        for plate in ["AB123CD", "TB501CT", "ZZ999YY"] {
            let (first, rest) = plate.split_at(2);
            let (middle, last) = rest.split_at(3);
            assert_eq!(apply_fixes(first, LEADING_LETTER_FIXES), first);
            assert_eq!(apply_fixes(middle, DIGIT_FIXES), middle);
            assert_eq!(apply_fixes(last, TRAILING_LETTER_FIXES), last);
        }
    }

    #[test]
    fn test_no_lines_no_plate() {
        assert_eq!(extract_plate(&[]), None);
    }
}
