pub mod bridge;
pub mod heuristic;
pub mod scanner;

pub use bridge::VisionBridge;
pub use scanner::{ScanOutcome, Scanner};

use std::path::PathBuf;

use anyhow::Result;

use crate::core::error::ClassifierError;
use crate::core::model::{PageClassification, TocEntry};

/// How many TOC titles are passed to the classifier as hints.
const HINT_TITLE_LIMIT: usize = 15;
/// Marker appended when the hint list was truncated.
const HINT_TRUNCATION_MARKER: &str = "…";

/// A rendered page handed to the classifier. `pdf_page` is 1-indexed.
#[derive(Debug, Clone)]
pub struct PageImage {
    pub pdf_page: u32,
    pub path: PathBuf,
}

/// The external vision classifier. Injected wherever classification or
/// verification is needed; implementations must never panic on bad input.
pub trait PageClassifier: Sync {
    /// Classify one page, optionally guided by known TOC titles.
    fn classify(
        &self,
        page: &PageImage,
        hint_titles: &[String],
    ) -> Result<PageClassification, ClassifierError>;

    /// Binary check: could this page plausibly be the start of the named
    /// song? Implementations are biased to answer yes when uncertain;
    /// downstream verification re-checks accepted matches.
    fn verify(&self, page: &PageImage, expected_title: &str) -> Result<bool, ClassifierError>;
}

/// Supplies page images and per-page extractable text for the source
/// document. Failures degrade (empty text, classification fallback)
/// instead of aborting the scan.
pub trait PageProvider: Sync {
    fn page_image(&self, pdf_page: u32) -> Result<PageImage>;
    fn page_text(&self, pdf_page: u32) -> Result<String>;
}

/// First `HINT_TITLE_LIMIT` TOC titles, with a truncation marker when the
/// TOC is longer.
pub fn hint_titles(toc: &[TocEntry]) -> Vec<String> {
    let mut hints: Vec<String> = toc
        .iter()
        .take(HINT_TITLE_LIMIT)
        .map(|entry| entry.title.clone())
        .collect();
    if toc.len() > HINT_TITLE_LIMIT {
        hints.push(HINT_TRUNCATION_MARKER.to_string());
    }
    hints
}

/// Stand-in collaborator for offline runs over a saved scan: every call
/// reports the classifier/source as unavailable, which downstream phases
/// already tolerate.
#[derive(Debug, Default)]
pub struct OfflineSource;

impl PageClassifier for OfflineSource {
    fn classify(
        &self,
        _page: &PageImage,
        _hint_titles: &[String],
    ) -> Result<PageClassification, ClassifierError> {
        Err(ClassifierError::Unavailable("offline run".to_string()))
    }

    fn verify(&self, _page: &PageImage, _expected_title: &str) -> Result<bool, ClassifierError> {
        Err(ClassifierError::Unavailable("offline run".to_string()))
    }
}

impl PageProvider for OfflineSource {
    fn page_image(&self, pdf_page: u32) -> Result<PageImage> {
        anyhow::bail!("no page source configured for page {pdf_page}")
    }

    fn page_text(&self, _pdf_page: u32) -> Result<String> {
        Ok(String::new())
    }
}
