//! Per-page classification pass. The only phase that calls the classifier
//! for every page, so it is the only parallel phase: classifications are
//! independent, and each result lands in a fixed slot by page index.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::classify::{heuristic, PageClassifier, PageProvider};
use crate::core::model::PageClassification;

/// Result of a scan: every page in order, the song-start subset, and the
/// warnings accumulated along the way.
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub pages: Vec<PageClassification>,
    pub song_starts: Vec<PageClassification>,
    pub warnings: Vec<String>,
}

impl ScanOutcome {
    pub fn from_pages(pages: Vec<PageClassification>, warnings: Vec<String>) -> Self {
        let song_starts = pages.iter().filter(|p| p.is_song_start()).cloned().collect();
        Self {
            pages,
            song_starts,
            warnings,
        }
    }
}

pub struct Scanner<'a> {
    provider: &'a dyn PageProvider,
    classifier: &'a dyn PageClassifier,
    pool: rayon::ThreadPool,
    time_budget: Option<Duration>,
}

impl<'a> Scanner<'a> {
    pub fn new(
        provider: &'a dyn PageProvider,
        classifier: &'a dyn PageClassifier,
        jobs: usize,
        time_budget: Option<Duration>,
    ) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(jobs.max(1))
            .build()
            .context("failed to build scan worker pool")?;
        Ok(Self {
            provider,
            classifier,
            pool,
            time_budget,
        })
    }

    /// Classify pages 1..=total_pages. A classifier failure on one page
    /// falls back to the local heuristic; the scan itself never fails.
    pub fn scan(&self, total_pages: u32, hint_titles: &[String]) -> ScanOutcome {
        let deadline = self.time_budget.map(|budget| Instant::now() + budget);

        let results: Vec<(PageClassification, Option<String>)> = self.pool.install(|| {
            (1..total_pages + 1)
                .into_par_iter()
                .map(|pdf_page| self.scan_page(pdf_page, hint_titles, deadline))
                .collect()
        });

        let mut pages = Vec::with_capacity(results.len());
        let mut warnings = Vec::new();
        for (page, warning) in results {
            pages.push(page);
            if let Some(message) = warning {
                warnings.push(message);
            }
        }
        ScanOutcome::from_pages(pages, warnings)
    }

    fn scan_page(
        &self,
        pdf_page: u32,
        hint_titles: &[String],
        deadline: Option<Instant>,
    ) -> (PageClassification, Option<String>) {
        if deadline.is_some_and(|d| Instant::now() >= d) {
            return (
                PageClassification::unscanned(pdf_page),
                Some(format!("page {pdf_page}: not scanned (time budget exhausted)")),
            );
        }

        let image = match self.provider.page_image(pdf_page) {
            Ok(image) => image,
            Err(err) => return self.fallback(pdf_page, &format!("render failed: {err}")),
        };

        match self.classifier.classify(&image, hint_titles) {
            Ok(mut page) => {
                // The slot index is authoritative, whatever the bridge said.
                page.pdf_page = pdf_page;
                debug!(
                    pdf_page,
                    content_type = ?page.content_type,
                    confidence = page.confidence,
                    "classified page"
                );
                (page, None)
            }
            Err(err) => self.fallback(pdf_page, &err.to_string()),
        }
    }

    fn fallback(&self, pdf_page: u32, reason: &str) -> (PageClassification, Option<String>) {
        let text = self.provider.page_text(pdf_page).unwrap_or_default();
        let page = heuristic::classify_from_text(pdf_page, &text);
        warn!(pdf_page, reason, "classifier failed; using text heuristic");
        (
            page,
            Some(format!("page {pdf_page}: classifier failed ({reason}); used text heuristic")),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{OfflineSource, PageImage};
    use crate::core::error::ClassifierError;
    use crate::core::model::ContentType;

    struct FixedClassifier;

    impl PageClassifier for FixedClassifier {
        fn classify(
            &self,
            page: &PageImage,
            _hint_titles: &[String],
        ) -> Result<PageClassification, ClassifierError> {
            Ok(PageClassification {
                pdf_page: 999, // deliberately wrong; scanner must fix it
                printed_page: None,
                content_type: if page.pdf_page == 2 {
                    ContentType::SongStart
                } else {
                    ContentType::Other
                },
                detected_title: (page.pdf_page == 2).then(|| "Imagine".to_string()),
                has_notation: false,
                confidence: 0.9,
            })
        }

        fn verify(&self, _page: &PageImage, _title: &str) -> Result<bool, ClassifierError> {
            Ok(false)
        }
    }

    struct StubProvider;

    impl PageProvider for StubProvider {
        fn page_image(&self, pdf_page: u32) -> Result<PageImage> {
            Ok(PageImage {
                pdf_page,
                path: std::path::PathBuf::from(format!("page_{pdf_page}.png")),
            })
        }

        fn page_text(&self, _pdf_page: u32) -> Result<String> {
            Ok(String::new())
        }
    }

    #[test]
    fn scan_keeps_page_order_and_slot_numbers() {
        let provider = StubProvider;
        let classifier = FixedClassifier;
        let scanner = Scanner::new(&provider, &classifier, 4, None).unwrap();
        let outcome = scanner.scan(5, &[]);

        assert_eq!(outcome.pages.len(), 5);
        for (idx, page) in outcome.pages.iter().enumerate() {
            assert_eq!(page.pdf_page, idx as u32 + 1);
        }
        assert_eq!(outcome.song_starts.len(), 1);
        assert_eq!(outcome.song_starts[0].pdf_page, 2);
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn classifier_failure_degrades_to_heuristic() {
        let provider = StubProvider;
        let classifier = OfflineSource;
        let scanner = Scanner::new(&provider, &classifier, 2, None).unwrap();
        let outcome = scanner.scan(3, &[]);

        assert_eq!(outcome.pages.len(), 3);
        for page in &outcome.pages {
            assert_eq!(page.content_type, ContentType::Blank);
            assert_eq!(page.confidence, heuristic::FALLBACK_CONFIDENCE);
        }
        assert_eq!(outcome.warnings.len(), 3);
    }

    #[test]
    fn exhausted_budget_leaves_pages_unknown() {
        let provider = StubProvider;
        let classifier = FixedClassifier;
        let scanner =
            Scanner::new(&provider, &classifier, 2, Some(Duration::from_secs(0))).unwrap();
        let outcome = scanner.scan(4, &[]);

        assert_eq!(outcome.pages.len(), 4);
        for page in &outcome.pages {
            assert_eq!(page.content_type, ContentType::Unknown);
            assert_eq!(page.confidence, 0.0);
        }
        assert!(outcome.song_starts.is_empty());
    }
}
