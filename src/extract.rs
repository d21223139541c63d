//! Text extraction seam.
//!
//! Format-specific extraction (PDF and friends) lives outside the
//! engine; hosts inject an extractor for the media types they support.
//! The engine only validates that what came back is plausibly text.

use crate::config::EngineConfig;
use crate::errors::RagError;

/// Converts raw file bytes into text. Implementations are external
/// collaborators; the shipped `PlainTextExtractor` handles UTF-8 input.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, bytes: &[u8], media_type: &str) -> Result<String, RagError>;
}

/// Extractor for plain-text media types. Lossy-decodes UTF-8.
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, bytes: &[u8], _media_type: &str) -> Result<String, RagError> {
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }
}

/// Reject extraction output that is empty, implausibly short, or mostly
/// outside the printable-ASCII + whitespace class (a scanned or binary
/// file the extractor mangled).
pub fn validate_extracted(text: &str, config: &EngineConfig) -> Result<(), RagError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(RagError::Extraction("document contains no text".into()));
    }
    let total = trimmed.chars().count();
    if total < config.min_extract_chars {
        return Err(RagError::Extraction(format!(
            "extracted text too short ({} chars) to be a readable document",
            total
        )));
    }

    let non_printable = trimmed
        .chars()
        .filter(|c| !(('\x20'..='\x7e').contains(c) || matches!(c, '\n' | '\r' | '\t')))
        .count();
    let ratio = non_printable as f64 / total as f64;
    if ratio > config.max_nonprintable_ratio {
        return Err(RagError::Extraction(format!(
            "text looks binary or encoded ({:.0}% non-printable characters)",
            ratio * 100.0
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> EngineConfig {
        EngineConfig::default()
    }

    #[test]
    fn plain_text_passes() {
        let text = "This is a perfectly ordinary paragraph of readable text, long enough to index.";
        assert!(validate_extracted(text, &config()).is_ok());
    }

    #[test]
    fn empty_and_short_rejected() {
        assert!(validate_extracted("", &config()).is_err());
        assert!(validate_extracted("   \n ", &config()).is_err());
        assert!(validate_extracted("too short", &config()).is_err());
    }

    #[test]
    fn mostly_binary_rejected() {
        let mut text = String::from("header ");
        text.push_str(&"\u{0001}\u{0002}\u{0003}\u{0007}".repeat(30));
        assert!(matches!(
            validate_extracted(&text, &config()),
            Err(RagError::Extraction(_))
        ));
    }

    #[test]
    fn text_outside_printable_ascii_class_rejected() {
        // The ratio is measured against printable ASCII plus
        // whitespace, so fully non-ASCII output reads as unreadable.
        let text = "これは日本語の文書です。".repeat(10);
        assert!(matches!(
            validate_extracted(&text, &config()),
            Err(RagError::Extraction(_))
        ));
    }

    #[test]
    fn accented_prose_below_ratio_passes() {
        let text = "Café menus and naïve résumés appear in otherwise plain English text, \
                    well under the binary-detection ceiling."
            .repeat(2);
        assert!(validate_extracted(&text, &config()).is_ok());
    }

    #[test]
    fn plain_text_extractor_decodes_utf8() {
        let out = PlainTextExtractor
            .extract("héllo wörld".as_bytes(), "text/plain")
            .unwrap();
        assert_eq!(out, "héllo wörld");
    }
}
