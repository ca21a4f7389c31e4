use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::commands::extract::{MANIFEST_DIR, MANIFEST_PREFIX};
use crate::model::{DocumentStatus, ExtractRunManifest};
use crate::util::read_json;

#[cfg(test)]
mod tests;

pub fn run(args: StatusArgs) -> Result<()> {
    info!(output_dir = %args.output_dir.display(), "status requested");

    let manifest_path = match args.manifest_path {
        Some(path) => path,
        None => match latest_manifest_path(&args.output_dir.join(MANIFEST_DIR))? {
            Some(path) => path,
            None => {
                warn!(output_dir = %args.output_dir.display(), "no extract run manifest found");
                return Ok(());
            }
        },
    };

    let manifest: ExtractRunManifest = read_json(&manifest_path)?;

    info!(
        path = %manifest_path.display(),
        run_id = %manifest.run_id,
        status = %manifest.status,
        started_at = %manifest.started_at,
        updated_at = %manifest.updated_at,
        level_preset = %manifest.level_preset,
        ocr_mode = %manifest.ocr_mode,
        pdftohtml = %manifest.tool_versions.pdftohtml,
        tesseract = %manifest.tool_versions.tesseract.as_deref().unwrap_or("unavailable"),
        "loaded extract run manifest"
    );
    info!(
        pdf_count = manifest.counts.pdf_count,
        succeeded = manifest.counts.succeeded_count,
        failed = manifest.counts.failed_count,
        pages = manifest.counts.page_count,
        text_pages = manifest.counts.text_page_count,
        ocr_pages = manifest.counts.ocr_page_count,
        ocr_failed_pages = manifest.counts.ocr_failed_page_count,
        ocr_skipped_pages = manifest.counts.ocr_skipped_page_count,
        outline_entries = manifest.counts.outline_entry_count,
        "run counts"
    );

    for document in &manifest.documents {
        if document.status == DocumentStatus::Failed {
            warn!(
                file = %document.filename,
                error = %document.error.as_deref().unwrap_or_default(),
                "document failed"
            );
        }
    }
    for warning in &manifest.warnings {
        warn!(warning = %warning, "run warning");
    }

    Ok(())
}

pub fn latest_manifest_path(manifest_dir: &Path) -> Result<Option<PathBuf>> {
    if !manifest_dir.exists() {
        return Ok(None);
    }

    let entries = fs::read_dir(manifest_dir)
        .with_context(|| format!("failed to read {}", manifest_dir.display()))?;

    let mut latest: Option<PathBuf> = None;
    for entry in entries {
        let entry =
            entry.with_context(|| format!("failed to read entry in {}", manifest_dir.display()))?;
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        if !name.starts_with(MANIFEST_PREFIX) || !name.ends_with(".json") {
            continue;
        }
        if latest.as_ref().is_none_or(|current| path > *current) {
            latest = Some(path);
        }
    }

    Ok(latest)
}
