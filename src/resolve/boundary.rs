//! Converts the sorted match list into contiguous, non-overlapping page
//! ranges. Pages before the first match (cover, TOC) stay unassigned; the
//! last boundary always runs to the end of the document.

use crate::core::model::{SongBoundary, SongMatch};
use crate::core::title::titles_match;

/// Assign boundaries to a pdf_page-sorted match list.
pub fn assign(matches: &[SongMatch], total_pages: u32) -> Vec<SongBoundary> {
    let deduped = merge_duplicates(matches);

    let mut boundaries = Vec::with_capacity(deduped.len());
    for (i, m) in deduped.iter().enumerate() {
        let start = m.pdf_page;
        let end = match deduped.get(i + 1) {
            Some(next) => next.pdf_page.saturating_sub(1).max(start),
            None => total_pages.max(start),
        };
        boundaries.push(SongBoundary {
            title: m.title.clone(),
            toc_page: m.toc_page,
            start_pdf_page: start,
            end_pdf_page: end,
            page_count: end - start + 1,
            match_method: m.method,
            confidence: m.confidence,
            artist: m.artist.clone(),
        });
    }
    boundaries
}

/// Drop a match whose title duplicates the immediately preceding one (a
/// spurious re-detection; the earlier boundary absorbs its pages), and
/// collapse matches sharing a page, keeping the stronger record. Only the
/// previous match is inspected, so a title legitimately recurring later in
/// the book survives.
fn merge_duplicates(matches: &[SongMatch]) -> Vec<SongMatch> {
    let mut kept: Vec<SongMatch> = Vec::with_capacity(matches.len());
    for m in matches {
        if let Some(prev) = kept.last_mut() {
            if prev.pdf_page == m.pdf_page {
                if m.confidence > prev.confidence {
                    *prev = m.clone();
                }
                continue;
            }
            if titles_match(&prev.title, &m.title) {
                continue;
            }
        }
        kept.push(m.clone());
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::MatchMethod;

    fn m(title: &str, pdf_page: u32, confidence: f32) -> SongMatch {
        SongMatch {
            title: title.to_string(),
            toc_page: None,
            artist: None,
            pdf_page,
            method: MatchMethod::DirectMatch,
            confidence,
        }
    }

    #[test]
    fn ranges_are_contiguous_and_end_at_document() {
        let matches = vec![m("A", 10, 0.9), m("B", 15, 0.9), m("C", 20, 0.9)];
        let boundaries = assign(&matches, 30);

        assert_eq!(boundaries.len(), 3);
        assert_eq!(
            (boundaries[0].start_pdf_page, boundaries[0].end_pdf_page),
            (10, 14)
        );
        assert_eq!(
            (boundaries[1].start_pdf_page, boundaries[1].end_pdf_page),
            (15, 19)
        );
        assert_eq!(
            (boundaries[2].start_pdf_page, boundaries[2].end_pdf_page),
            (20, 30)
        );
        assert_eq!(boundaries[2].page_count, 11);
    }

    #[test]
    fn adjacent_duplicate_title_is_absorbed() {
        let matches = vec![m("Imagine", 10, 0.9), m("IMAGINE!", 11, 0.6), m("Next", 14, 0.9)];
        let boundaries = assign(&matches, 20);

        assert_eq!(boundaries.len(), 2);
        assert_eq!(boundaries[0].title, "Imagine");
        assert_eq!(boundaries[0].end_pdf_page, 13);
    }

    #[test]
    fn non_adjacent_duplicate_titles_are_kept() {
        // A compilation can legitimately reprise a song later in the book.
        let matches = vec![m("Imagine", 10, 0.9), m("Other", 20, 0.9), m("Imagine", 50, 0.9)];
        let boundaries = assign(&matches, 60);
        assert_eq!(boundaries.len(), 3);
        assert_eq!(boundaries[2].title, "Imagine");
    }

    #[test]
    fn same_page_matches_collapse_to_strongest() {
        let matches = vec![m("Weak Guess", 12, 0.3), m("Strong Match", 12, 0.95)];
        let boundaries = assign(&matches, 20);
        assert_eq!(boundaries.len(), 1);
        assert_eq!(boundaries[0].title, "Strong Match");
        assert_eq!(boundaries[0].start_pdf_page, 12);
    }

    #[test]
    fn single_match_spans_to_end() {
        let boundaries = assign(&[m("Only", 5, 0.8)], 9);
        assert_eq!(boundaries.len(), 1);
        assert_eq!(boundaries[0].end_pdf_page, 9);
        assert_eq!(boundaries[0].page_count, 5);
    }

    #[test]
    fn empty_matches_give_no_boundaries() {
        assert!(assign(&[], 100).is_empty());
    }

    #[test]
    fn boundaries_never_overlap() {
        let matches = vec![m("A", 3, 0.9), m("B", 4, 0.9), m("C", 4, 0.8), m("D", 5, 0.9)];
        let boundaries = assign(&matches, 10);
        for pair in boundaries.windows(2) {
            assert!(pair[0].end_pdf_page < pair[1].start_pdf_page);
        }
    }
}
