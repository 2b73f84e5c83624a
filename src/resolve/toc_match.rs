//! Direct matching of TOC entries against classifier-flagged song starts.
//!
//! Match-and-remove over two pools, implemented with consumed flags rather
//! than list mutation: each TOC entry and each song-start page is used at
//! most once.

use crate::core::model::{MatchMethod, PageClassification, SongMatch, TocEntry};
use crate::core::title::titles_match;

/// Confidence of a title-verified direct match. Reflects the strength of
/// the title evidence, not the classifier's own page score.
pub const DIRECT_MATCH_CONFIDENCE: f32 = 0.95;

/// Matches plus the leftovers for the fallback phase, as indices into the
/// caller's TOC and song-start slices.
#[derive(Debug, Clone)]
pub struct DirectMatchOutcome {
    pub matches: Vec<SongMatch>,
    pub unmatched_entries: Vec<usize>,
    pub unmatched_starts: Vec<usize>,
}

/// Single pass: for each TOC entry in ascending printed-page order, take
/// the first unconsumed song-start page whose detected title matches.
pub fn match_toc_entries(
    toc: &[TocEntry],
    song_starts: &[PageClassification],
) -> DirectMatchOutcome {
    let mut consumed = vec![false; song_starts.len()];
    let mut matches = Vec::new();
    let mut unmatched_entries = Vec::new();

    for (entry_idx, entry) in toc.iter().enumerate() {
        let found = song_starts.iter().enumerate().find(|(idx, page)| {
            if consumed[*idx] {
                return false;
            }
            page.detected_title
                .as_deref()
                .is_some_and(|title| titles_match(&entry.title, title))
        });

        match found {
            Some((idx, page)) => {
                consumed[idx] = true;
                matches.push(SongMatch {
                    title: entry.title.clone(),
                    toc_page: Some(entry.printed_page),
                    artist: entry.artist.clone(),
                    pdf_page: page.pdf_page,
                    method: MatchMethod::DirectMatch,
                    confidence: DIRECT_MATCH_CONFIDENCE,
                });
            }
            None => unmatched_entries.push(entry_idx),
        }
    }

    let unmatched_starts = consumed
        .iter()
        .enumerate()
        .filter(|(_, used)| !**used)
        .map(|(idx, _)| idx)
        .collect();

    DirectMatchOutcome {
        matches,
        unmatched_entries,
        unmatched_starts,
    }
}
