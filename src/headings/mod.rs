use std::time::{Duration, Instant};

use tracing::debug;

use crate::cli::{OcrMode, PipelineArgs};
use crate::model::{DocumentResult, OutlineEntry};

mod classify;
mod levels;
mod lines;
mod merge;
mod router;
#[cfg(test)]
mod tests;
mod title;
mod types;

pub use levels::LevelTable;
pub use router::{PageSource, PageStats};
pub use types::{Glyph, OcrWord};

use types::PageHeadingMap;

use classify::suppress_body_text;
use levels::simplify;
use merge::merge_similar_headings;
use router::collect_candidates;
use title::{TITLE_PAGE, detect_title};

#[derive(Debug, Clone, Copy)]
pub struct PipelineConfig {
    pub ocr_mode: OcrMode,
    pub levels: LevelTable,
    pub document_timeout: Option<Duration>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            ocr_mode: OcrMode::Auto,
            levels: LevelTable::default(),
            document_timeout: None,
        }
    }
}

impl From<&PipelineArgs> for PipelineConfig {
    fn from(args: &PipelineArgs) -> Self {
        Self {
            ocr_mode: args.ocr_mode,
            levels: LevelTable::for_preset(args.level_preset),
            document_timeout: args.document_timeout_secs.map(Duration::from_secs),
        }
    }
}

#[derive(Debug)]
pub struct OutlineReport {
    pub result: DocumentResult,
    pub stats: PageStats,
    pub warnings: Vec<String>,
}

pub fn extract_outline<S: PageSource + ?Sized>(
    source: &mut S,
    config: &PipelineConfig,
) -> OutlineReport {
    let deadline = config
        .document_timeout
        .map(|timeout| Instant::now() + timeout);
    let routed = collect_candidates(source, config.ocr_mode, deadline);

    debug!(
        pages = routed.stats.page_count,
        candidates = routed.map.candidate_count(),
        "collected heading candidates"
    );

    OutlineReport {
        result: build_outline(routed.map, &config.levels),
        stats: routed.stats,
        warnings: routed.warnings,
    }
}

pub fn build_outline(mut map: PageHeadingMap, levels: &LevelTable) -> DocumentResult {
    suppress_body_text(&mut map);
    let title = detect_title(&mut map);

    let mut outline = Vec::new();
    for (page, candidates) in map.into_pages() {
        for (index, candidate) in merge_similar_headings(candidates).into_iter().enumerate() {
            // The first line left on the title page is subtitle or cover noise.
            if page == TITLE_PAGE && index == 0 {
                continue;
            }
            let Some(level) = levels.level_for(&candidate) else {
                debug!(
                    page,
                    size = candidate.font_size,
                    source = candidate.source.as_str(),
                    "dropped undersized heading"
                );
                continue;
            };
            outline.push(OutlineEntry {
                level,
                text: simplify(&candidate.text),
                page,
            });
        }
    }

    DocumentResult { title, outline }
}
