use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use tracing::{info, warn};

use crate::backend::{ToolConfig, collect_tool_versions};
use crate::cli::{ExtractArgs, OcrMode};
use crate::commands::outline::outline_pdf;
use crate::headings::{OutlineReport, PageStats, PipelineConfig};
use crate::model::{
    DocumentReport, DocumentStatus, ExtractCounts, ExtractPaths, ExtractRunManifest,
};
use crate::util::{
    ensure_directory, now_utc_string, sha256_file, utc_compact_string, write_json_pretty,
};


pub const MANIFEST_DIR: &str = "manifests";
pub const MANIFEST_PREFIX: &str = "extract_run_";

pub fn run(args: ExtractArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("run-{}", utc_compact_string(started_ts));

    let pipeline = PipelineConfig::from(&args.pipeline);
    let tools = ToolConfig::from(&args.tools);

    info!(
        input_dir = %args.input_dir.display(),
        output_dir = %args.output_dir.display(),
        run_id = %run_id,
        "starting extract"
    );

    let pdf_paths = discover_pdfs(&args.input_dir)?;

    if args.dry_run {
        for path in &pdf_paths {
            info!(file = %path.display(), "would process");
        }
        info!(pdf_count = pdf_paths.len(), "extract dry-run complete");
        return Ok(());
    }

    ensure_directory(&args.output_dir)?;
    let tool_versions = collect_tool_versions(&tools)?;
    let manifest_path = args
        .manifest_path
        .clone()
        .unwrap_or_else(|| default_manifest_path(&args.output_dir, started_ts));

    let documents = process_documents(&pdf_paths, &args.output_dir, args.jobs, |path| {
        outline_pdf(path, &pipeline, &tools)
    })?;
    let counts = summarize(&documents);

    let mut warnings = Vec::new();
    if pdf_paths.is_empty() {
        warnings.push(format!("no PDFs found in {}", args.input_dir.display()));
    }

    let manifest = ExtractRunManifest {
        manifest_version: 1,
        run_id,
        status: "completed".to_string(),
        started_at,
        updated_at: now_utc_string(),
        command: render_extract_command(&args),
        level_preset: args.pipeline.level_preset.as_str().to_string(),
        ocr_mode: args.pipeline.ocr_mode.as_str().to_string(),
        tool_versions,
        paths: ExtractPaths {
            input_dir: args.input_dir.display().to_string(),
            output_dir: args.output_dir.display().to_string(),
            manifest_path: manifest_path.display().to_string(),
        },
        counts,
        documents,
        warnings,
    };

    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote run manifest");
    info!(
        pdf_count = manifest.counts.pdf_count,
        succeeded = manifest.counts.succeeded_count,
        failed = manifest.counts.failed_count,
        ocr_pages = manifest.counts.ocr_page_count,
        "extract completed"
    );

    Ok(())
}

pub fn discover_pdfs(input_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut pdfs = Vec::new();

    let entries = fs::read_dir(input_dir)
        .with_context(|| format!("failed to read {}", input_dir.display()))?;

    for entry in entries {
        let entry =
            entry.with_context(|| format!("failed to read entry in {}", input_dir.display()))?;
        let path = entry.path();

        if !entry
            .file_type()
            .with_context(|| format!("failed to inspect file type: {}", path.display()))?
            .is_file()
        {
            continue;
        }

        let is_pdf = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));

        if is_pdf {
            pdfs.push(path);
        }
    }

    pdfs.sort();
    Ok(pdfs)
}

pub fn output_path_for(output_dir: &Path, pdf_path: &Path) -> PathBuf {
    let stem = pdf_path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    output_dir.join(format!("{stem}.json"))
}

pub fn default_manifest_path(output_dir: &Path, started_ts: DateTime<Utc>) -> PathBuf {
    output_dir.join(MANIFEST_DIR).join(format!(
        "{}{}.json",
        MANIFEST_PREFIX,
        utc_compact_string(started_ts)
    ))
}

pub fn process_documents<F>(
    pdf_paths: &[PathBuf],
    output_dir: &Path,
    jobs: usize,
    outline: F,
) -> Result<Vec<DocumentReport>>
where
    F: Fn(&Path) -> Result<OutlineReport> + Sync,
{
    let planned: Vec<_> = pdf_paths
        .iter()
        .zip(plan_output_paths(pdf_paths, output_dir))
        .collect();
    let process =
        |(path, output): &(&PathBuf, Result<PathBuf>)| process_document(path, output, &outline);

    if jobs <= 1 {
        return Ok(planned.iter().map(process).collect());
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs)
        .build()
        .context("failed to build document worker pool")?;
    Ok(pool.install(|| planned.par_iter().map(process).collect()))
}

// "a.pdf" and "a.PDF" share a stem; the first in input order keeps the output.
pub fn plan_output_paths(pdf_paths: &[PathBuf], output_dir: &Path) -> Vec<Result<PathBuf>> {
    let mut claimed: HashMap<String, &Path> = HashMap::new();

    pdf_paths
        .iter()
        .map(|pdf_path| {
            let output_path = output_path_for(output_dir, pdf_path);
            let key = output_path.to_string_lossy().to_lowercase();
            match claimed.get(&key) {
                Some(owner) => bail!(
                    "output {} already claimed by {}",
                    output_path.display(),
                    owner.display()
                ),
                None => {
                    claimed.insert(key, pdf_path);
                    Ok(output_path)
                }
            }
        })
        .collect()
}

fn process_document<F>(
    pdf_path: &Path,
    output_path: &Result<PathBuf>,
    outline: &F,
) -> DocumentReport
where
    F: Fn(&Path) -> Result<OutlineReport>,
{
    let filename = pdf_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    info!(file = %filename, "processing");

    let sha256 = match sha256_file(pdf_path) {
        Ok(digest) => Some(digest),
        Err(err) => {
            warn!(file = %filename, error = %format!("{err:#}"), "failed to hash source");
            None
        }
    };

    let outcome = match output_path {
        Ok(output_path) => outline(pdf_path).and_then(|report| {
            write_json_pretty(output_path, &report.result)?;
            Ok((output_path, report))
        }),
        Err(err) => Err(anyhow!("{err:#}")),
    };

    match outcome {
        Ok((output_path, report)) => DocumentReport {
            filename,
            sha256,
            output_path: Some(output_path.display().to_string()),
            status: DocumentStatus::Completed,
            error: None,
            title: Some(report.result.title.clone()),
            outline_entry_count: report.result.outline.len(),
            pages: report.stats,
            warnings: report.warnings,
        },
        Err(err) => {
            let detail = format!("{err:#}");
            warn!(file = %filename, error = %detail, "document failed");
            DocumentReport {
                filename,
                sha256,
                output_path: None,
                status: DocumentStatus::Failed,
                error: Some(detail),
                title: None,
                outline_entry_count: 0,
                pages: PageStats::default(),
                warnings: Vec::new(),
            }
        }
    }
}

pub fn summarize(documents: &[DocumentReport]) -> ExtractCounts {
    let mut counts = ExtractCounts {
        pdf_count: documents.len(),
        ..ExtractCounts::default()
    };

    for document in documents {
        match document.status {
            DocumentStatus::Completed => counts.succeeded_count += 1,
            DocumentStatus::Failed => counts.failed_count += 1,
        }
        counts.page_count += document.pages.page_count;
        counts.text_page_count += document.pages.text_pages;
        counts.ocr_page_count += document.pages.ocr_pages;
        counts.ocr_failed_page_count += document.pages.ocr_failed_pages;
        counts.ocr_skipped_page_count += document.pages.ocr_skipped_pages;
        counts.outline_entry_count += document.outline_entry_count;
    }

    counts
}

fn render_extract_command(args: &ExtractArgs) -> String {
    let mut command = vec![
        "pdf-outline".to_string(),
        "extract".to_string(),
        "--input-dir".to_string(),
        args.input_dir.display().to_string(),
        "--output-dir".to_string(),
        args.output_dir.display().to_string(),
    ];

    if let Some(path) = &args.manifest_path {
        command.push("--manifest-path".to_string());
        command.push(path.display().to_string());
    }
    if args.jobs != 1 {
        command.push("--jobs".to_string());
        command.push(args.jobs.to_string());
    }
    command.push("--level-preset".to_string());
    command.push(args.pipeline.level_preset.as_str().to_string());
    if args.pipeline.ocr_mode != OcrMode::Auto {
        command.push("--ocr-mode".to_string());
        command.push(args.pipeline.ocr_mode.as_str().to_string());
    }
    if args.pipeline.ocr_mode != OcrMode::Off {
        command.push("--ocr-lang".to_string());
        command.push(args.tools.ocr_lang.clone());
        command.push("--ocr-dpi".to_string());
        command.push(args.tools.ocr_dpi.to_string());
    }
    if let Some(secs) = args.pipeline.document_timeout_secs {
        command.push("--document-timeout-secs".to_string());
        command.push(secs.to_string());
    }
    command.push("--tool-timeout-secs".to_string());
    command.push(args.tools.tool_timeout_secs.to_string());

    command.join(" ")
}
