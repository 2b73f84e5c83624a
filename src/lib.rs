pub mod classify;
pub mod core;
pub mod export;
pub mod pipeline;
pub mod quality;
pub mod resolve;
pub mod source;

pub use crate::core::model::{AnalysisResult, PageClassification, SongBoundary, TocEntry};
