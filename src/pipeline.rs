use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use crate::classify::{self, OfflineSource, PageClassifier, ScanOutcome, Scanner};
use crate::core::model::{AnalysisResult, PageClassification, TocEntry};
use crate::export::{Exporter, JsonExporter, ReportExporter};
use crate::resolve::ResolutionEngine;
use crate::source::{book_id, PdfSource};

#[derive(Debug, Clone)]
pub struct AnalyzeConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub dpi: u32,
    pub jobs: usize,
    pub time_budget: Option<Duration>,
}

impl AnalyzeConfig {
    pub fn new(input: PathBuf, output: PathBuf) -> Self {
        Self {
            input,
            output,
            dpi: 200,
            jobs: 4,
            time_budget: None,
        }
    }
}

/// Full pipeline: open the document, scan every page, resolve songs.
/// Only an un-openable document or a broken worker pool is fatal;
/// everything else degrades into warnings on the result.
pub fn analyze_document(
    config: &AnalyzeConfig,
    toc: &[TocEntry],
    classifier: &dyn PageClassifier,
) -> Result<AnalysisResult> {
    let source = PdfSource::new(
        config.input.clone(),
        config.output.join("render"),
        config.dpi,
    )?;
    let total_pages = source.page_count()? as u32;
    info!(total_pages, input = %config.input.display(), "opened source document");

    let hints = classify::hint_titles(toc);
    let scanner = Scanner::new(&source, classifier, config.jobs, config.time_budget)?;
    let scan = scanner.scan(total_pages, &hints);

    let engine = ResolutionEngine::new(classifier, &source);
    Ok(engine.resolve(&book_id(&config.input), total_pages, toc, scan))
}

/// Resolve a saved scan without any classifier or source document.
/// Unresolved TOC entries degrade to unverified placements.
pub fn resolve_offline(
    book_id: &str,
    total_pages: u32,
    toc: &[TocEntry],
    pages: Vec<PageClassification>,
) -> AnalysisResult {
    let source = OfflineSource;
    let engine = ResolutionEngine::new(&source, &source);
    engine.resolve(book_id, total_pages, toc, ScanOutcome::from_pages(pages, Vec::new()))
}

pub fn export_analysis(analysis: &AnalysisResult, out_dir: &Path) -> Result<()> {
    JsonExporter::new(out_dir.to_path_buf()).export(analysis)?;
    ReportExporter::new(out_dir.to_path_buf()).export(analysis)?;
    Ok(())
}

pub fn load_toc(path: &Path) -> Result<Vec<TocEntry>> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read TOC file: {}", path.display()))?;
    serde_json::from_str(&data)
        .with_context(|| format!("failed to parse TOC JSON: {}", path.display()))
}

pub fn load_pages(path: &Path) -> Result<Vec<PageClassification>> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read pages file: {}", path.display()))?;
    serde_json::from_str(&data)
        .with_context(|| format!("failed to parse pages JSON: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    use crate::core::model::ContentType;

    fn temp_output_dir(prefix: &str) -> PathBuf {
        let mut out = std::env::temp_dir();
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_millis();
        let pid = std::process::id();
        out.push(format!("{prefix}-{pid}-{now}"));
        out
    }

    fn song_start(pdf_page: u32, title: &str) -> PageClassification {
        PageClassification {
            pdf_page,
            printed_page: None,
            content_type: ContentType::SongStart,
            detected_title: Some(title.to_string()),
            has_notation: true,
            confidence: 0.9,
        }
    }

    #[test]
    fn offline_resolution_resolves_saved_scan() {
        let mut pages: Vec<PageClassification> = (1..=20)
            .map(|p| PageClassification {
                pdf_page: p,
                printed_page: None,
                content_type: ContentType::Other,
                detected_title: None,
                has_notation: false,
                confidence: 0.5,
            })
            .collect();
        pages[9] = song_start(10, "Imagine");

        let toc = vec![TocEntry {
            title: "Imagine".to_string(),
            printed_page: 8,
            artist: None,
            confidence: 1.0,
        }];

        let result = resolve_offline("book", 20, &toc, pages);
        assert_eq!(result.songs.len(), 1);
        assert_eq!(result.songs[0].start_pdf_page, 10);
        assert_eq!(result.songs[0].end_pdf_page, 20);
        assert_eq!(result.calculated_offset, 2);
    }

    #[test]
    fn export_analysis_writes_outputs() -> Result<()> {
        let out = temp_output_dir("songsplit-pipeline");
        fs::create_dir_all(&out)?;

        let pages = vec![song_start(1, "Only Song")];
        let analysis = resolve_offline("tiny", 1, &[], pages);
        export_analysis(&analysis, &out)?;

        assert!(out.join("analysis.json").exists());
        assert!(out.join("songs.txt").exists());

        let json = fs::read_to_string(out.join("analysis.json"))?;
        assert!(json.contains("Only Song"));
        let report = fs::read_to_string(out.join("songs.txt"))?;
        assert!(report.contains("Only Song"));

        let _ = fs::remove_dir_all(&out);
        Ok(())
    }

    #[test]
    fn toc_and_pages_round_trip_through_json() -> Result<()> {
        let out = temp_output_dir("songsplit-load");
        fs::create_dir_all(&out)?;

        let toc_path = out.join("toc.json");
        fs::write(
            &toc_path,
            r#"[{"title": "Imagine", "printed_page": 48, "artist": "John Lennon"}]"#,
        )?;
        let toc = load_toc(&toc_path)?;
        assert_eq!(toc.len(), 1);
        assert_eq!(toc[0].artist.as_deref(), Some("John Lennon"));

        let pages_path = out.join("pages.json");
        let pages = vec![song_start(3, "Imagine")];
        fs::write(&pages_path, serde_json::to_string(&pages)?)?;
        let loaded = load_pages(&pages_path)?;
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].pdf_page, 3);

        let _ = fs::remove_dir_all(&out);
        Ok(())
    }
}
