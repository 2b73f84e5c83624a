//! Local classification fallback used when the vision classifier fails for
//! a page. Text-only: a page with non-trivial extractable text is `other`,
//! an empty one is `blank`.

use crate::core::model::{ContentType, PageClassification};

/// Confidence assigned to heuristic classifications.
pub const FALLBACK_CONFIDENCE: f32 = 0.3;

/// Minimum non-whitespace characters before a page counts as textual.
const TEXT_THRESHOLD: usize = 20;

pub fn classify_from_text(pdf_page: u32, extracted_text: &str) -> PageClassification {
    let glyphs = extracted_text.chars().filter(|c| !c.is_whitespace()).count();
    let content_type = if glyphs >= TEXT_THRESHOLD {
        ContentType::Other
    } else {
        ContentType::Blank
    };
    PageClassification {
        pdf_page,
        printed_page: None,
        content_type,
        detected_title: None,
        has_notation: false,
        confidence: FALLBACK_CONFIDENCE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn textual_page_classifies_as_other() {
        let page = classify_from_text(3, "Sheet music for a song, verse and chorus lyrics.");
        assert_eq!(page.content_type, ContentType::Other);
        assert_eq!(page.confidence, FALLBACK_CONFIDENCE);
        assert_eq!(page.pdf_page, 3);
    }

    #[test]
    fn empty_page_classifies_as_blank() {
        let page = classify_from_text(4, "  \n\t ");
        assert_eq!(page.content_type, ContentType::Blank);
    }

    #[test]
    fn trivial_text_still_counts_as_blank() {
        let page = classify_from_text(5, "12");
        assert_eq!(page.content_type, ContentType::Blank);
    }
}
