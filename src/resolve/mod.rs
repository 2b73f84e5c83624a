//! Page-to-song resolution: reconciles TOC entries, per-page
//! classifications and fuzzy title matching into a gapless partition of
//! the document into song boundaries.

pub mod boundary;
pub mod fallback;
pub mod finalize;
pub mod offset;
pub mod toc_match;

pub use offset::OffsetEstimate;

use tracing::info;

use crate::classify::{PageClassifier, PageProvider, ScanOutcome};
use crate::core::model::{AnalysisResult, MatchMethod, TocEntry};

/// Top-level orchestrator. The classifier and page provider are injected;
/// the engine is stateless per invocation given fixed classifier answers.
pub struct ResolutionEngine<'a> {
    classifier: &'a dyn PageClassifier,
    provider: &'a dyn PageProvider,
}

impl<'a> ResolutionEngine<'a> {
    pub fn new(classifier: &'a dyn PageClassifier, provider: &'a dyn PageProvider) -> Self {
        Self {
            classifier,
            provider,
        }
    }

    /// Run the matching phases over a completed scan. Never fails for
    /// data-quality reasons: the worst input yields zero songs and a pile
    /// of warnings, not an error.
    pub fn resolve(
        &self,
        book_id: &str,
        total_pages: u32,
        toc_entries: &[TocEntry],
        scan: ScanOutcome,
    ) -> AnalysisResult {
        let ScanOutcome {
            mut pages,
            song_starts,
            mut warnings,
        } = scan;

        let mut toc = toc_entries.to_vec();
        toc.sort_by_key(|entry| entry.printed_page);

        if toc.is_empty() {
            warnings.push(
                "TOC is empty; relying on detected song starts for the whole document".to_string(),
            );
        }

        let direct = toc_match::match_toc_entries(&toc, &song_starts);
        info!(
            direct_matches = direct.matches.len(),
            unmatched_entries = direct.unmatched_entries.len(),
            unmatched_starts = direct.unmatched_starts.len(),
            "direct TOC matching complete"
        );

        let calibration: Vec<(u32, u32)> = direct
            .matches
            .iter()
            .filter_map(|m| m.toc_page.map(|toc_page| (toc_page, m.pdf_page)))
            .collect();
        let offset_estimate = offset::estimate(&calibration);
        if !toc.is_empty() && offset_estimate.samples == 0 {
            warnings.push(
                "no calibration points: no TOC entry matched directly; \
                 unverified placements use offset 0 at confidence 0"
                    .to_string(),
            );
        }
        info!(
            offset = offset_estimate.offset,
            confidence = offset_estimate.confidence,
            samples = offset_estimate.samples,
            "estimated printed-page offset"
        );

        let ctx = fallback::FallbackContext {
            provider: self.provider,
            classifier: self.classifier,
            total_pages,
            offset: offset_estimate,
        };
        let fb = fallback::locate(&ctx, &toc, direct, &song_starts);
        warnings.extend(fb.warnings);

        let matched_song_count = fb
            .matches
            .iter()
            .filter(|m| {
                matches!(
                    m.method,
                    MatchMethod::DirectMatch | MatchMethod::OffsetFallback
                )
            })
            .count();

        let songs = boundary::assign(&fb.matches, total_pages);
        finalize::relabel_pages(&mut pages, &songs);
        info!(songs = songs.len(), warnings = warnings.len(), "resolution complete");

        AnalysisResult {
            book_id: book_id.to_string(),
            total_pages,
            toc_song_count: toc.len(),
            detected_song_count: song_starts.len(),
            matched_song_count,
            calculated_offset: offset_estimate.offset,
            offset_confidence: offset_estimate.confidence,
            warnings,
            pages,
            songs,
        }
    }
}
