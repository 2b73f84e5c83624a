use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;

use anyhow::Result;

use crate::core::model::{AnalysisResult, MatchMethod, SongBoundary};
use crate::export::Exporter;

/// Writes `songs.txt`, a human-readable summary of the resolved songs.
#[derive(Debug, Clone)]
pub struct ReportExporter {
    out_dir: PathBuf,
}

impl ReportExporter {
    pub fn new(out_dir: PathBuf) -> Self {
        Self { out_dir }
    }

    fn method_label(method: MatchMethod) -> &'static str {
        match method {
            MatchMethod::DirectMatch => "direct_match",
            MatchMethod::OffsetFallback => "offset_fallback",
            MatchMethod::TocOnly => "toc_only",
            MatchMethod::DetectedOnly => "detected_only",
        }
    }

    fn format_song(index: usize, song: &SongBoundary) -> String {
        let artist = song
            .artist
            .as_deref()
            .map(|a| format!(" — {a}"))
            .unwrap_or_default();
        format!(
            "{:3}. {}{}  pages {}-{}  [{} {:.2}]",
            index + 1,
            song.title,
            artist,
            song.start_pdf_page,
            song.end_pdf_page,
            Self::method_label(song.match_method),
            song.confidence,
        )
    }
}

impl Exporter for ReportExporter {
    fn export(&self, analysis: &AnalysisResult) -> Result<()> {
        fs::create_dir_all(&self.out_dir)?;

        let mut report = String::new();
        writeln!(report, "Songbook analysis: {}", analysis.book_id)?;
        writeln!(
            report,
            "Pages: {}  TOC songs: {}  detected: {}  matched: {}",
            analysis.total_pages,
            analysis.toc_song_count,
            analysis.detected_song_count,
            analysis.matched_song_count,
        )?;
        writeln!(
            report,
            "Offset: {:+}  (confidence {:.2})",
            analysis.calculated_offset, analysis.offset_confidence
        )?;
        writeln!(report)?;

        for (index, song) in analysis.songs.iter().enumerate() {
            writeln!(report, "{}", Self::format_song(index, song))?;
        }

        if !analysis.warnings.is_empty() {
            writeln!(report)?;
            writeln!(report, "Warnings:")?;
            for warning in &analysis.warnings {
                writeln!(report, "  - {warning}")?;
            }
        }

        let path = self.out_dir.join("songs.txt");
        fs::write(path, report)?;
        Ok(())
    }
}
