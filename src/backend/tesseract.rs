use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result, bail};
use tracing::debug;

use crate::headings::OcrWord;
use crate::util::scratch_path;

use super::ToolConfig;
use super::process::{ensure_success, run_with_timeout};

const WORD_LEVEL: &str = "5";
const TSV_COLUMNS: usize = 12;

pub fn ocr_page(pdf_path: &Path, page_number: usize, config: &ToolConfig) -> Result<Vec<OcrWord>> {
    let png_path = render_page(pdf_path, page_number, config)?;
    let recognised = recognise_words(&png_path, config);
    let _ = fs::remove_file(&png_path);

    let words = recognised.with_context(|| {
        format!(
            "tesseract failed for {} page {}",
            pdf_path.display(),
            page_number
        )
    })?;

    debug!(page = page_number, words = words.len(), "OCR complete");
    Ok(words)
}

fn render_page(pdf_path: &Path, page_number: usize, config: &ToolConfig) -> Result<PathBuf> {
    let output_root = scratch_path(pdf_path, &format!("p{page_number}"));
    let png_path = PathBuf::from(format!("{}.png", output_root.display()));

    let mut command = Command::new(&config.pdftoppm);
    command
        .arg("-r")
        .arg(config.ocr_dpi.to_string())
        .arg("-f")
        .arg(page_number.to_string())
        .arg("-l")
        .arg(page_number.to_string())
        .arg("-singlefile")
        .arg("-png")
        .arg(pdf_path)
        .arg(&output_root);

    let output = run_with_timeout(&mut command, config.timeout)
        .with_context(|| format!("failed to render {} page {}", pdf_path.display(), page_number))?;
    ensure_success(
        &output,
        &format!("pdftoppm for {} page {}", pdf_path.display(), page_number),
    )?;

    if !png_path.exists() {
        bail!(
            "pdftoppm did not produce expected image for {} page {}",
            pdf_path.display(),
            page_number
        );
    }

    Ok(png_path)
}

fn recognise_words(png_path: &Path, config: &ToolConfig) -> Result<Vec<OcrWord>> {
    let mut command = Command::new(&config.tesseract);
    command
        .arg(png_path)
        .arg("stdout")
        .arg("-l")
        .arg(&config.ocr_lang)
        .arg("tsv");

    let output = run_with_timeout(&mut command, config.timeout)?;
    ensure_success(&output, &format!("tesseract for {}", png_path.display()))?;

    parse_tesseract_tsv(&String::from_utf8_lossy(&output.stdout))
}

pub fn parse_tesseract_tsv(tsv: &str) -> Result<Vec<OcrWord>> {
    let mut words = Vec::new();

    for (index, line) in tsv.lines().enumerate() {
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < TSV_COLUMNS || fields[0] != WORD_LEVEL {
            continue;
        }

        let text = fields[TSV_COLUMNS - 1..].join("\t").replace('\u{0000}', "");
        let text = text.trim();
        if text.is_empty() {
            continue;
        }

        let number = |column: usize| -> Result<f64> {
            fields[column].trim().parse::<f64>().with_context(|| {
                format!("invalid tesseract tsv value on line {}: {}", index + 1, fields[column])
            })
        };

        words.push(OcrWord {
            text: text.to_string(),
            left: number(6)?,
            top: number(7)?,
            width: number(8)?,
            height: number(9)?,
        });
    }

    Ok(words)
}
