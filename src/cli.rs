use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "pdf-outline",
    version,
    about = "Infer a PDF's title and heading outline from its text layer or OCR"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write one outline JSON per PDF in a directory.
    Extract(ExtractArgs),
    /// Print the outline of a single PDF.
    Outline(OutlineArgs),
    /// Summarise the most recent extract run.
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ExtractArgs {
    #[arg(long, default_value = "input")]
    pub input_dir: PathBuf,

    #[arg(long, default_value = "output")]
    pub output_dir: PathBuf,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    #[arg(long, default_value_t = 1)]
    pub jobs: usize,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    #[command(flatten)]
    pub pipeline: PipelineArgs,

    #[command(flatten)]
    pub tools: ToolArgs,
}

#[derive(Args, Debug, Clone)]
pub struct OutlineArgs {
    pub pdf_path: PathBuf,

    #[arg(long)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub pipeline: PipelineArgs,

    #[command(flatten)]
    pub tools: ToolArgs,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = "output")]
    pub output_dir: PathBuf,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct PipelineArgs {
    #[arg(long, value_enum, default_value_t = LevelPreset::Standard)]
    pub level_preset: LevelPreset,

    #[arg(long, value_enum, default_value_t = OcrMode::Auto)]
    pub ocr_mode: OcrMode,

    #[arg(long)]
    pub document_timeout_secs: Option<u64>,
}

#[derive(Args, Debug, Clone)]
pub struct ToolArgs {
    #[arg(long, default_value = "pdftohtml")]
    pub pdftohtml_bin: PathBuf,

    #[arg(long, default_value = "pdftoppm")]
    pub pdftoppm_bin: PathBuf,

    #[arg(long, default_value = "tesseract")]
    pub tesseract_bin: PathBuf,

    #[arg(long, default_value = "eng")]
    pub ocr_lang: String,

    #[arg(long, default_value_t = 300)]
    pub ocr_dpi: u32,

    #[arg(long, default_value_t = 120)]
    pub tool_timeout_secs: u64,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum OcrMode {
    Off,
    Auto,
    Force,
}

impl OcrMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Auto => "auto",
            Self::Force => "force",
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum LevelPreset {
    Standard,
    Compact,
}

impl LevelPreset {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Compact => "compact",
        }
    }
}
