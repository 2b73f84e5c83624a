//! Rewrites page classifications to agree with the assigned boundaries.
//! Start pages are forced to `song_start` with the song's title; weakly
//! labeled interior pages become `song_continuation`. Photo, lyrics and
//! credits pages are legitimately part of a song and stay untouched.

use crate::core::model::{ContentType, PageClassification, SongBoundary};

/// `pages` must be ordered 1..=N, so page `p` lives at index `p - 1`.
pub fn relabel_pages(pages: &mut [PageClassification], boundaries: &[SongBoundary]) {
    for boundary in boundaries {
        for pdf_page in boundary.start_pdf_page..=boundary.end_pdf_page {
            let Some(page) = pages.get_mut(pdf_page as usize - 1) else {
                continue;
            };
            if pdf_page == boundary.start_pdf_page {
                page.content_type = ContentType::SongStart;
                page.detected_title = Some(boundary.title.clone());
            } else if page.content_type.is_relabelable() {
                page.content_type = ContentType::SongContinuation;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::MatchMethod;

    fn page(pdf_page: u32, content_type: ContentType) -> PageClassification {
        PageClassification {
            pdf_page,
            printed_page: None,
            content_type,
            detected_title: None,
            has_notation: false,
            confidence: 0.5,
        }
    }

    fn boundary(title: &str, start: u32, end: u32) -> SongBoundary {
        SongBoundary {
            title: title.to_string(),
            toc_page: None,
            start_pdf_page: start,
            end_pdf_page: end,
            page_count: end - start + 1,
            match_method: MatchMethod::DirectMatch,
            confidence: 0.95,
            artist: None,
        }
    }

    #[test]
    fn start_page_is_forced_to_song_start_with_title() {
        let mut pages = vec![
            page(1, ContentType::Cover),
            page(2, ContentType::Other), // classifier disagreed with the boundary
            page(3, ContentType::Unknown),
        ];
        relabel_pages(&mut pages, &[boundary("Imagine", 2, 3)]);

        assert_eq!(pages[1].content_type, ContentType::SongStart);
        assert_eq!(pages[1].detected_title.as_deref(), Some("Imagine"));
        assert_eq!(pages[2].content_type, ContentType::SongContinuation);
        // Page before the boundary is untouched.
        assert_eq!(pages[0].content_type, ContentType::Cover);
    }

    #[test]
    fn photo_lyrics_credits_pages_keep_their_labels() {
        let mut pages = vec![
            page(1, ContentType::SongStart),
            page(2, ContentType::Photo),
            page(3, ContentType::Lyrics),
            page(4, ContentType::Credits),
            page(5, ContentType::Blank),
        ];
        relabel_pages(&mut pages, &[boundary("Hey Jude", 1, 5)]);

        assert_eq!(pages[1].content_type, ContentType::Photo);
        assert_eq!(pages[2].content_type, ContentType::Lyrics);
        assert_eq!(pages[3].content_type, ContentType::Credits);
        assert_eq!(pages[4].content_type, ContentType::SongContinuation);
    }

    #[test]
    fn out_of_range_boundary_pages_are_ignored() {
        let mut pages = vec![page(1, ContentType::Unknown)];
        relabel_pages(&mut pages, &[boundary("Overlong", 1, 4)]);
        assert_eq!(pages[0].content_type, ContentType::SongStart);
    }
}
