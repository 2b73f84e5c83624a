//! Offset-guided recovery of TOC entries the direct matcher could not
//! place, plus surfacing of detected songs the TOC never listed.
//!
//! Three sub-algorithms run in order: verified search around the
//! offset-projected page, unverified placement for whatever remains, and
//! orphan adoption of unconsumed song-start pages.

use tracing::{debug, warn};

use crate::classify::{PageClassifier, PageProvider};
use crate::core::model::{MatchMethod, PageClassification, SongMatch, TocEntry};
use crate::core::title::{similarity, titles_match};
use crate::resolve::offset::OffsetEstimate;
use crate::resolve::toc_match::DirectMatchOutcome;

/// How far (pages, each side) the verified search probes around the
/// expected page.
pub const SEARCH_RADIUS: i64 = 5;

/// Confidence when verification succeeded on the projected page itself.
const VERIFIED_AT_OFFSET_CONFIDENCE: f32 = 0.8;
/// Confidence when verification succeeded on a neighbor.
const VERIFIED_NEARBY_CONFIDENCE: f32 = 0.7;
/// Unverified placements inherit half the offset confidence.
const UNVERIFIED_CONFIDENCE_FACTOR: f32 = 0.5;
/// Similarity floor for mentioning a near-miss title in a warning.
const NEAR_MISS_SIMILARITY: f32 = 0.5;

pub struct FallbackContext<'a> {
    pub provider: &'a dyn PageProvider,
    pub classifier: &'a dyn PageClassifier,
    pub total_pages: u32,
    pub offset: OffsetEstimate,
}

#[derive(Debug, Clone)]
pub struct FallbackOutcome {
    /// Combined match set (direct + fallback), sorted by pdf_page.
    pub matches: Vec<SongMatch>,
    pub warnings: Vec<String>,
}

pub fn locate(
    ctx: &FallbackContext,
    toc: &[TocEntry],
    direct: DirectMatchOutcome,
    song_starts: &[PageClassification],
) -> FallbackOutcome {
    let mut matches = direct.matches;
    let mut warnings = Vec::new();

    // A — offset-guided search with classifier verification.
    let mut still_unmatched = Vec::new();
    for &entry_idx in &direct.unmatched_entries {
        let entry = &toc[entry_idx];
        match search_verified(ctx, entry) {
            Some(found) => matches.push(found),
            None => still_unmatched.push(entry_idx),
        }
    }

    // B — unverified placement at the projected page.
    for &entry_idx in &still_unmatched {
        let entry = &toc[entry_idx];
        let placed = project(entry.printed_page, ctx.offset.offset, ctx.total_pages);
        let confidence = ctx.offset.confidence * UNVERIFIED_CONFIDENCE_FACTOR;

        let mut message = format!(
            "could not verify a location for '{}'; placed at page {} from TOC page {} \
             (confidence {:.2})",
            entry.title, placed, entry.printed_page, confidence
        );
        if let Some((near_title, near_page, score)) =
            closest_detected(&entry.title, &direct.unmatched_starts, song_starts)
        {
            message.push_str(&format!(
                "; closest detected title '{near_title}' at page {near_page} \
                 (similarity {score:.2})"
            ));
        }
        warn!(title = %entry.title, placed, "unverified TOC placement");
        warnings.push(message);

        matches.push(SongMatch {
            title: entry.title.clone(),
            toc_page: Some(entry.printed_page),
            artist: entry.artist.clone(),
            pdf_page: placed,
            method: MatchMethod::TocOnly,
            confidence,
        });
    }

    // C — adopt detected song starts absent from the TOC. Pages already
    // covered by a match, or whose title duplicates one, are skipped.
    for &start_idx in &direct.unmatched_starts {
        let page = &song_starts[start_idx];
        if matches.iter().any(|m| m.pdf_page == page.pdf_page) {
            continue;
        }
        let title = page
            .detected_title
            .clone()
            .unwrap_or_else(|| format!("Song at Page {}", page.pdf_page));
        if matches.iter().any(|m| titles_match(&m.title, &title)) {
            continue;
        }

        warn!(title = %title, pdf_page = page.pdf_page, "detected song missing from TOC");
        warnings.push(format!(
            "classifier detected '{}' at page {} but the TOC does not list it",
            title, page.pdf_page
        ));
        matches.push(SongMatch {
            title,
            toc_page: None,
            artist: None,
            pdf_page: page.pdf_page,
            method: MatchMethod::DetectedOnly,
            confidence: page.confidence,
        });
    }

    matches.sort_by_key(|m| m.pdf_page);
    FallbackOutcome { matches, warnings }
}

/// Probe pages around the projected location, nearest first, and accept
/// the first one the classifier verifies. Verification errors count as
/// "not verified": a missed match surfaces as a warning, a wrong match
/// would be silently committed.
fn search_verified(ctx: &FallbackContext, entry: &TocEntry) -> Option<SongMatch> {
    let expected = project(entry.printed_page, ctx.offset.offset, ctx.total_pages);

    for delta in probe_deltas() {
        let candidate = expected as i64 + delta;
        if candidate < 1 || candidate > ctx.total_pages as i64 {
            continue;
        }
        let candidate = candidate as u32;

        let image = match ctx.provider.page_image(candidate) {
            Ok(image) => image,
            Err(_) => continue,
        };
        let verified = ctx
            .classifier
            .verify(&image, &entry.title)
            .unwrap_or(false);
        if !verified {
            continue;
        }

        let confidence = if delta == 0 {
            VERIFIED_AT_OFFSET_CONFIDENCE
        } else {
            VERIFIED_NEARBY_CONFIDENCE
        };
        debug!(title = %entry.title, candidate, delta, "verified offset fallback");
        return Some(SongMatch {
            title: entry.title.clone(),
            toc_page: Some(entry.printed_page),
            artist: entry.artist.clone(),
            pdf_page: candidate,
            method: MatchMethod::OffsetFallback,
            confidence,
        });
    }
    None
}

/// Probe order: 0, -1, +1, -2, +2, ... out to SEARCH_RADIUS.
fn probe_deltas() -> impl Iterator<Item = i64> {
    std::iter::once(0).chain((1..=SEARCH_RADIUS).flat_map(|d| [-d, d]))
}

fn project(printed_page: u32, offset: i64, total_pages: u32) -> u32 {
    (printed_page as i64 + offset).clamp(1, total_pages.max(1) as i64) as u32
}

fn closest_detected(
    title: &str,
    unmatched_starts: &[usize],
    song_starts: &[PageClassification],
) -> Option<(String, u32, f32)> {
    unmatched_starts
        .iter()
        .filter_map(|&idx| {
            let page = &song_starts[idx];
            let detected = page.detected_title.as_deref()?;
            Some((detected.to_string(), page.pdf_page, similarity(title, detected)))
        })
        .filter(|(_, _, score)| *score >= NEAR_MISS_SIMILARITY)
        .max_by(|a, b| a.2.total_cmp(&b.2))
}
