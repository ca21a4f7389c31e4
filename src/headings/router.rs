use std::time::Instant;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cli::OcrMode;

use super::classify::{classify_ocr_page, classify_text_page};
use super::types::{Glyph, OcrWord, PageHeadingMap};

pub const MIN_TEXT_GLYPHS: usize = 10;

pub trait PageSource {
    fn page_count(&self) -> usize;

    fn glyphs(&self, page: usize) -> &[Glyph];

    fn ocr_words(&mut self, page: usize) -> Result<Vec<OcrWord>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageRoute {
    Text,
    Ocr,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageStats {
    pub page_count: usize,
    pub text_pages: usize,
    pub ocr_pages: usize,
    pub ocr_failed_pages: usize,
    pub ocr_skipped_pages: usize,
}

#[derive(Debug, Default)]
pub struct RoutedPages {
    pub map: PageHeadingMap,
    pub stats: PageStats,
    pub warnings: Vec<String>,
}

pub fn glyph_char_count(glyphs: &[Glyph]) -> usize {
    glyphs
        .iter()
        .flat_map(|glyph| glyph.text.chars())
        .filter(|character| !character.is_whitespace())
        .count()
}

pub fn choose_route(glyphs: &[Glyph], ocr_mode: OcrMode) -> PageRoute {
    match ocr_mode {
        OcrMode::Off => PageRoute::Text,
        OcrMode::Force => PageRoute::Ocr,
        OcrMode::Auto => {
            if glyph_char_count(glyphs) < MIN_TEXT_GLYPHS {
                PageRoute::Ocr
            } else {
                PageRoute::Text
            }
        }
    }
}

pub fn collect_candidates<S: PageSource + ?Sized>(
    source: &mut S,
    ocr_mode: OcrMode,
    deadline: Option<Instant>,
) -> RoutedPages {
    let mut routed = RoutedPages::default();
    let page_count = source.page_count();
    routed.stats.page_count = page_count;

    for page in 1..=page_count {
        let route = choose_route(source.glyphs(page), ocr_mode);

        let candidates = match route {
            PageRoute::Text => {
                routed.stats.text_pages += 1;
                classify_text_page(source.glyphs(page), page)
            }
            PageRoute::Ocr if deadline.is_some_and(|deadline| Instant::now() >= deadline) => {
                let message = format!("page {page}: OCR skipped, document deadline exceeded");
                warn!(page, "OCR skipped after document deadline");
                routed.stats.ocr_skipped_pages += 1;
                routed.warnings.push(message);
                Vec::new()
            }
            PageRoute::Ocr => match source.ocr_words(page) {
                Ok(words) => {
                    routed.stats.ocr_pages += 1;
                    classify_ocr_page(&words, page)
                }
                Err(err) => {
                    let detail = format!("{err:#}");
                    warn!(page, error = %detail, "OCR failed");
                    routed.stats.ocr_failed_pages += 1;
                    routed.warnings.push(format!("page {page}: OCR failed: {detail}"));
                    Vec::new()
                }
            },
        };

        debug!(
            page,
            route = ?route,
            candidates = candidates.len(),
            "classified page"
        );
        routed.map.insert(page, candidates);
    }

    routed
}
