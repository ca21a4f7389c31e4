use serde::{Deserialize, Serialize};

use crate::headings::PageStats;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Level {
    H1,
    H2,
    H3,
    H4,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineEntry {
    pub level: Level,
    pub text: String,
    pub page: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentResult {
    pub title: String,
    pub outline: Vec<OutlineEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolVersions {
    pub pdftohtml: String,
    pub pdftoppm: Option<String>,
    pub tesseract: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractPaths {
    pub input_dir: String,
    pub output_dir: String,
    pub manifest_path: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractCounts {
    pub pdf_count: usize,
    pub succeeded_count: usize,
    pub failed_count: usize,
    pub page_count: usize,
    pub text_page_count: usize,
    pub ocr_page_count: usize,
    pub ocr_failed_page_count: usize,
    pub ocr_skipped_page_count: usize,
    pub outline_entry_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentReport {
    pub filename: String,
    pub sha256: Option<String>,
    pub output_path: Option<String>,
    pub status: DocumentStatus,
    pub error: Option<String>,
    pub title: Option<String>,
    pub outline_entry_count: usize,
    pub pages: PageStats,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub command: String,
    pub level_preset: String,
    pub ocr_mode: String,
    pub tool_versions: ToolVersions,
    pub paths: ExtractPaths,
    pub counts: ExtractCounts,
    pub documents: Vec<DocumentReport>,
    pub warnings: Vec<String>,
}
