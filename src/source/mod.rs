//! Source-document collaborators, all thin wrappers over poppler tools:
//! page count via `pdfinfo`, page images via `pdftoppm`, page text via
//! `pdftotext`. Image and text failures degrade; only an un-openable
//! document is fatal.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result};

use crate::classify::{PageImage, PageProvider};

#[derive(Debug, Clone)]
pub struct PdfSource {
    path: PathBuf,
    render_dir: PathBuf,
    dpi: u32,
}

impl PdfSource {
    pub fn new(path: PathBuf, render_dir: PathBuf, dpi: u32) -> Result<Self> {
        if !path.is_file() {
            anyhow::bail!("input is not a readable file: {}", path.display());
        }
        Ok(Self {
            path,
            render_dir,
            dpi,
        })
    }

    pub fn page_count(&self) -> Result<usize> {
        let output = Command::new("pdfinfo")
            .arg(&self.path)
            .output()
            .with_context(|| format!("failed to invoke pdfinfo on {}", self.path.display()))?;

        if !output.status.success() {
            anyhow::bail!("pdfinfo failed with status: {}", output.status);
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        for line in stdout.lines() {
            if let Some(rest) = line.strip_prefix("Pages:") {
                let num_str = rest.trim();
                return num_str.parse().with_context(|| {
                    format!("failed to parse page count from 'Pages:' line: {num_str}")
                });
            }
        }

        anyhow::bail!(
            "pdfinfo output did not contain a 'Pages:' line for {}",
            self.path.display()
        )
    }
}

impl PageProvider for PdfSource {
    fn page_image(&self, pdf_page: u32) -> Result<PageImage> {
        fs::create_dir_all(&self.render_dir)?;

        // pdftoppm appends "-<page>" to the prefix it is given.
        let prefix = self.render_dir.join(format!("page_{pdf_page:04}"));
        let rendered = self
            .render_dir
            .join(format!("page_{pdf_page:04}-{pdf_page}.png"));
        if rendered.exists() {
            return Ok(PageImage {
                pdf_page,
                path: rendered,
            });
        }

        let prefix_str = prefix
            .to_str()
            .ok_or_else(|| anyhow::anyhow!("non-UTF8 render path not supported"))?;
        let status = Command::new("pdftoppm")
            .arg("-png")
            .arg("-r")
            .arg(self.dpi.to_string())
            .arg("-f")
            .arg(pdf_page.to_string())
            .arg("-l")
            .arg(pdf_page.to_string())
            .arg(&self.path)
            .arg(prefix_str)
            .status()
            .with_context(|| "failed to invoke pdftoppm; is poppler-utils installed?")?;

        if !status.success() {
            anyhow::bail!("pdftoppm failed with status: {status}");
        }
        if !rendered.exists() {
            anyhow::bail!("expected rendered image not found: {}", rendered.display());
        }

        Ok(PageImage {
            pdf_page,
            path: rendered,
        })
    }

    fn page_text(&self, pdf_page: u32) -> Result<String> {
        let output = Command::new("pdftotext")
            .arg("-f")
            .arg(pdf_page.to_string())
            .arg("-l")
            .arg(pdf_page.to_string())
            .arg(&self.path)
            .arg("-") // stdout
            .output()
            .with_context(|| "failed to invoke pdftotext")?;

        if !output.status.success() {
            anyhow::bail!("pdftotext failed with status: {}", output.status);
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Derive a book id from the input filename, mirroring how output
/// directories are named elsewhere.
pub fn book_id(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "book".to_string())
}
