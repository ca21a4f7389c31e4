use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::backend::{PopplerDocument, ToolConfig};
use crate::cli::OutlineArgs;
use crate::headings::{OutlineReport, PipelineConfig, extract_outline};
use crate::util::write_json_pretty;

pub fn run(args: OutlineArgs) -> Result<()> {
    let pipeline = PipelineConfig::from(&args.pipeline);
    let tools = ToolConfig::from(&args.tools);

    let report = outline_pdf(&args.pdf_path, &pipeline, &tools)?;
    for warning in &report.warnings {
        warn!(warning = %warning, "page warning");
    }

    match &args.output {
        Some(path) => {
            write_json_pretty(path, &report.result)?;
            info!(
                path = %path.display(),
                entries = report.result.outline.len(),
                "wrote outline"
            );
        }
        None => {
            let mut output = io::BufWriter::new(io::stdout().lock());
            serde_json::to_writer_pretty(&mut output, &report.result)
                .context("failed to serialize outline json output")?;
            writeln!(output)?;
            output.flush()?;
        }
    }

    Ok(())
}

pub fn outline_pdf(
    pdf_path: &Path,
    pipeline: &PipelineConfig,
    tools: &ToolConfig,
) -> Result<OutlineReport> {
    let mut document = PopplerDocument::open(pdf_path, tools)?;
    Ok(extract_outline(&mut document, pipeline))
}
