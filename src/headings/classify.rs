use tracing::debug;

use super::lines::{Segment, glyph_segments, group_ocr_lines, heading_text, ocr_line_text};
use super::types::{Glyph, HeadingCandidate, OcrWord, PageHeadingMap, Source, Style, round_to};

pub const MIXED_FAMILY: &str = "Mixed";
pub const OCR_FAMILY: &str = "OCR";

const ARIAL_MIN_SIZE: f64 = 9.0;
const BOLD_MIN_SIZE: f64 = 11.5;
const REGULAR_MIN_SIZE: f64 = 12.5;

pub const BODY_TEXT_MAX_SIZE: f64 = 15.0;
pub const BODY_TEXT_SLACK: usize = 10;

pub fn classify_text_page(glyphs: &[Glyph], page: usize) -> Vec<HeadingCandidate> {
    glyph_segments(glyphs)
        .into_iter()
        .filter_map(|segment| classify_segment(&segment, page))
        .collect()
}

pub fn classify_segment(segment: &Segment, page: usize) -> Option<HeadingCandidate> {
    let first = segment.glyphs.first()?;

    let style = first.weight();
    if segment.glyphs.iter().any(|glyph| glyph.weight() != style) {
        return None;
    }

    let family = if segment
        .glyphs
        .iter()
        .all(|glyph| glyph.font_family() == first.font_family())
    {
        first.font_family()
    } else {
        MIXED_FAMILY
    };

    let font_size = round_to(char_weighted_size(&segment.glyphs), 2);

    if !accepts_text_heading(family, style, font_size) {
        return None;
    }

    match HeadingCandidate::new(
        segment.text.as_str(),
        font_size,
        style,
        family,
        first.top,
        first.height,
        page,
        Source::Text,
    ) {
        Ok(candidate) => Some(candidate),
        Err(err) => {
            debug!(page, text = %segment.text, error = %err, "rejected text segment");
            None
        }
    }
}

pub fn char_weighted_size(glyphs: &[Glyph]) -> f64 {
    let (weighted, chars) = glyphs.iter().fold((0.0, 0usize), |(sum, count), glyph| {
        let chars = glyph.text.chars().count().max(1);
        (sum + glyph.size * chars as f64, count + chars)
    });
    if chars == 0 {
        0.0
    } else {
        weighted / chars as f64
    }
}

pub fn accepts_text_heading(family: &str, style: Style, font_size: f64) -> bool {
    if family.eq_ignore_ascii_case("arial") && font_size > ARIAL_MIN_SIZE {
        return true;
    }

    match style {
        Style::Bold => font_size >= BOLD_MIN_SIZE,
        Style::Regular => font_size > REGULAR_MIN_SIZE,
        Style::Ocr => false,
    }
}

pub fn classify_ocr_page(words: &[OcrWord], page: usize) -> Vec<HeadingCandidate> {
    let mut candidates = Vec::new();

    for line in group_ocr_lines(words) {
        let Some(text) = heading_text(&ocr_line_text(&line)) else {
            continue;
        };

        let total: f64 = line.iter().map(OcrWord::font_size).sum();
        let font_size = round_to(total / line.len() as f64, 1);
        let top = line
            .iter()
            .map(|word| word.top)
            .fold(f64::INFINITY, f64::min);
        let height = line
            .iter()
            .map(|word| word.height)
            .fold(f64::NEG_INFINITY, f64::max);

        match HeadingCandidate::new(
            text,
            font_size,
            Style::Ocr,
            OCR_FAMILY,
            top,
            height,
            page,
            Source::Ocr,
        ) {
            Ok(candidate) => candidates.push(candidate),
            Err(err) => debug!(page, error = %err, "rejected OCR line"),
        }
    }

    candidates
}

fn is_body_text_suspect(candidate: &HeadingCandidate) -> bool {
    candidate.style == Style::Regular && candidate.font_size <= BODY_TEXT_MAX_SIZE
}

pub fn suppress_body_text(map: &mut PageHeadingMap) -> usize {
    let suspects = map
        .iter()
        .flat_map(|(_, candidates)| candidates.iter())
        .filter(|candidate| is_body_text_suspect(candidate))
        .count();

    if suspects <= map.page_count() + BODY_TEXT_SLACK {
        return 0;
    }

    for (_, candidates) in map.iter_mut() {
        candidates.retain(|candidate| !is_body_text_suspect(candidate));
    }

    debug!(removed = suspects, pages = map.page_count(), "suppressed body text candidates");
    suspects
}

