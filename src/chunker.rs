//! Splits extracted text into overlapping fixed-size windows.
//!
//! Windows are measured in characters, never bytes, so multi-byte
//! input cannot split a code point. Consecutive windows overlap by
//! exactly `chunk_overlap` characters; the final window may be shorter.

use crate::errors::RagError;

/// One window over the original text. Offsets are character offsets
/// into the extracted document text, half-open `[start, end)`.
#[derive(Debug, Clone, PartialEq)]
pub struct TextWindow {
    pub text: String,
    pub start_offset: usize,
    pub end_offset: usize,
}

/// Split `text` into overlapping windows of `window_size` characters.
///
/// Deterministic. Empty input yields an empty sequence. Fails only on
/// invalid parameters (`window_size == 0` or `overlap >= window_size`).
pub fn split_text(
    text: &str,
    window_size: usize,
    overlap: usize,
) -> Result<Vec<TextWindow>, RagError> {
    if window_size == 0 {
        return Err(RagError::Config("chunk window size must be positive".into()));
    }
    if overlap >= window_size {
        return Err(RagError::Config(format!(
            "chunk overlap ({}) must be smaller than window size ({})",
            overlap, window_size
        )));
    }

    let chars: Vec<char> = text.chars().collect();
    let total = chars.len();
    let mut windows = Vec::new();
    if total == 0 {
        return Ok(windows);
    }

    let step = window_size - overlap;
    let mut start = 0;
    loop {
        let end = (start + window_size).min(total);
        windows.push(TextWindow {
            text: chars[start..end].iter().collect(),
            start_offset: start,
            end_offset: end,
        });
        if end == total {
            break;
        }
        start += step;
    }

    Ok(windows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_no_windows() {
        assert!(split_text("", 100, 20).unwrap().is_empty());
    }

    #[test]
    fn invalid_parameters_rejected() {
        assert!(split_text("abc", 0, 0).is_err());
        assert!(split_text("abc", 10, 10).is_err());
        assert!(split_text("abc", 10, 20).is_err());
    }

    #[test]
    fn short_input_is_a_single_window() {
        let windows = split_text("hello", 100, 20).unwrap();
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].text, "hello");
        assert_eq!((windows[0].start_offset, windows[0].end_offset), (0, 5));
    }

    #[test]
    fn default_settings_on_2500_chars() {
        let text = "x".repeat(2500);
        let windows = split_text(&text, 1000, 200).unwrap();
        let offsets: Vec<(usize, usize)> = windows
            .iter()
            .map(|w| (w.start_offset, w.end_offset))
            .collect();
        assert_eq!(offsets, vec![(0, 1000), (800, 1800), (1600, 2500)]);
    }

    #[test]
    fn window_count_matches_formula() {
        // ceil((len - overlap) / (window - overlap)) for len > overlap
        for (len, window, overlap) in [(2500, 1000, 200), (1000, 300, 50), (999, 100, 10)] {
            let text = "a".repeat(len);
            let windows = split_text(&text, window, overlap).unwrap();
            let expected = (len - overlap).div_ceil(window - overlap);
            assert_eq!(windows.len(), expected, "len={len} window={window}");
        }
    }

    #[test]
    fn overlaps_removed_reconstructs_original() {
        let text: String = ('a'..='z').cycle().take(1234).collect();
        let overlap = 30;
        let windows = split_text(&text, 100, overlap).unwrap();

        let mut rebuilt = windows[0].text.clone();
        for window in &windows[1..] {
            let tail: String = window.text.chars().skip(overlap).collect();
            rebuilt.push_str(&tail);
        }
        assert_eq!(rebuilt, text);

        for window in &windows[..windows.len() - 1] {
            assert_eq!(window.text.chars().count(), 100);
        }
    }

    #[test]
    fn offsets_are_character_based() {
        let text = "é".repeat(10);
        let windows = split_text(&text, 4, 1).unwrap();
        assert_eq!(windows[0].end_offset, 4);
        assert_eq!(windows[1].start_offset, 3);
        assert_eq!(windows[0].text.chars().count(), 4);
    }
}
