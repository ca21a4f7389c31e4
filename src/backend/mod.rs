use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};

use crate::cli::ToolArgs;
use crate::headings::{Glyph, OcrWord, PageSource};
use crate::model::ToolVersions;

mod pdftohtml;
mod process;
mod tesseract;

#[derive(Debug, Clone)]
pub struct ToolConfig {
    pub pdftohtml: PathBuf,
    pub pdftoppm: PathBuf,
    pub tesseract: PathBuf,
    pub ocr_lang: String,
    pub ocr_dpi: u32,
    pub timeout: Duration,
}

impl From<&ToolArgs> for ToolConfig {
    fn from(args: &ToolArgs) -> Self {
        Self {
            pdftohtml: args.pdftohtml_bin.clone(),
            pdftoppm: args.pdftoppm_bin.clone(),
            tesseract: args.tesseract_bin.clone(),
            ocr_lang: args.ocr_lang.clone(),
            ocr_dpi: args.ocr_dpi,
            timeout: Duration::from_secs(args.tool_timeout_secs),
        }
    }
}

pub struct PopplerDocument<'a> {
    path: PathBuf,
    config: &'a ToolConfig,
    pages: Vec<Vec<Glyph>>,
}

impl<'a> PopplerDocument<'a> {
    pub fn open(path: &Path, config: &'a ToolConfig) -> Result<Self> {
        let pages = pdftohtml::extract_glyph_pages(path, config)
            .with_context(|| format!("failed to read text layer of {}", path.display()))?;

        Ok(Self {
            path: path.to_path_buf(),
            config,
            pages,
        })
    }
}

impl PageSource for PopplerDocument<'_> {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn glyphs(&self, page: usize) -> &[Glyph] {
        page.checked_sub(1)
            .and_then(|index| self.pages.get(index))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn ocr_words(&mut self, page: usize) -> Result<Vec<OcrWord>> {
        tesseract::ocr_page(&self.path, page, self.config)
    }
}

pub fn collect_tool_versions(config: &ToolConfig) -> Result<ToolVersions> {
    Ok(ToolVersions {
        pdftohtml: process::command_version(&config.pdftohtml, &["-v"])?,
        pdftoppm: process::command_version_optional(&config.pdftoppm, &["-v"]),
        tesseract: process::command_version_optional(&config.tesseract, &["--version"]),
    })
}
