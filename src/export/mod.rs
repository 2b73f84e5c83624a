pub mod json_export;
pub mod report_export;

use anyhow::Result;

use crate::core::model::AnalysisResult;

pub use json_export::JsonExporter;
pub use report_export::ReportExporter;

pub trait Exporter {
    fn export(&self, analysis: &AnalysisResult) -> Result<()>;
}
