use serde::{Deserialize, Serialize};

/// Content category assigned to a single page by the vision classifier
/// (or by the local heuristic when the classifier fails).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    SongStart,
    SongContinuation,
    Toc,
    Cover,
    Blank,
    Photo,
    Lyrics,
    Credits,
    Other,
    Error,
    Unknown,
}

impl ContentType {
    /// Labels weak enough to be overwritten by the finalization pass.
    pub fn is_relabelable(self) -> bool {
        matches!(self, ContentType::Unknown | ContentType::Other | ContentType::Blank)
    }
}

/// Per-page result of the classification scan. `pdf_page` is 1-indexed.
/// `content_type` and `detected_title` may be rewritten once during
/// finalization; everything else is immutable after the scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageClassification {
    pub pdf_page: u32,
    #[serde(default)]
    pub printed_page: Option<u32>,
    pub content_type: ContentType,
    #[serde(default)]
    pub detected_title: Option<String>,
    #[serde(default)]
    pub has_notation: bool,
    pub confidence: f32,
}

impl PageClassification {
    /// Placeholder for a page the scan never reached (time budget exhausted).
    pub fn unscanned(pdf_page: u32) -> Self {
        Self {
            pdf_page,
            printed_page: None,
            content_type: ContentType::Unknown,
            detected_title: None,
            has_notation: false,
            confidence: 0.0,
        }
    }

    pub fn is_song_start(&self) -> bool {
        self.content_type == ContentType::SongStart
    }
}

/// One table-of-contents row, extracted upstream. Read-only input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TocEntry {
    pub title: String,
    pub printed_page: u32,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default = "default_toc_confidence")]
    pub confidence: f32,
}

fn default_toc_confidence() -> f32 {
    1.0
}

/// How a song was tied to its start page.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MatchMethod {
    DirectMatch,
    OffsetFallback,
    TocOnly,
    DetectedOnly,
}

/// A song pinned to a document page. Produced by the matching and fallback
/// phases, consumed by the boundary assigner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SongMatch {
    pub title: String,
    #[serde(default)]
    pub toc_page: Option<u32>,
    #[serde(default)]
    pub artist: Option<String>,
    pub pdf_page: u32,
    pub method: MatchMethod,
    pub confidence: f32,
}

/// Final page range for one song; both ends inclusive, 1-indexed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SongBoundary {
    pub title: String,
    #[serde(default)]
    pub toc_page: Option<u32>,
    pub start_pdf_page: u32,
    pub end_pdf_page: u32,
    pub page_count: u32,
    pub match_method: MatchMethod,
    pub confidence: f32,
    #[serde(default)]
    pub artist: Option<String>,
}

/// Aggregate output of a resolution run. JSON-serializable for reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub book_id: String,
    pub total_pages: u32,
    pub toc_song_count: usize,
    pub detected_song_count: usize,
    pub matched_song_count: usize,
    pub calculated_offset: i64,
    pub offset_confidence: f32,
    pub warnings: Vec<String>,
    pub pages: Vec<PageClassification>,
    pub songs: Vec<SongBoundary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unscanned_page_is_unknown_with_zero_confidence() {
        let page = PageClassification::unscanned(7);
        assert_eq!(page.pdf_page, 7);
        assert_eq!(page.content_type, ContentType::Unknown);
        assert_eq!(page.confidence, 0.0);
        assert!(!page.is_song_start());
    }

    #[test]
    fn content_type_serializes_snake_case() {
        let json = serde_json::to_string(&ContentType::SongStart).unwrap();
        assert_eq!(json, "\"song_start\"");
        let back: ContentType = serde_json::from_str("\"song_continuation\"").unwrap();
        assert_eq!(back, ContentType::SongContinuation);
    }

    #[test]
    fn toc_entry_defaults_confidence() {
        let entry: TocEntry =
            serde_json::from_str(r#"{"title": "Imagine", "printed_page": 48}"#).unwrap();
        assert_eq!(entry.confidence, 1.0);
        assert!(entry.artist.is_none());
    }
}
