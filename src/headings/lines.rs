use std::collections::HashMap;

use super::types::{Glyph, MAX_HEADING_WORDS, OcrWord};

pub const SEGMENT_GAP: f64 = 50.0;
pub const SPACE_GAP: f64 = 1.5;
pub const OCR_LINE_TOP_TOLERANCE: f64 = 200.0;
pub const OCR_LINE_SIZE_TOLERANCE: f64 = 7.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub text: String,
    pub glyphs: Vec<Glyph>,
}

pub fn glyph_segments(glyphs: &[Glyph]) -> Vec<Segment> {
    let mut segments = Vec::new();

    for line in group_glyph_lines(glyphs) {
        for run in split_on_large_gaps(line, SEGMENT_GAP) {
            let raw = reconstruct_text(&run, SPACE_GAP);
            if let Some(text) = heading_text(&raw) {
                segments.push(Segment { text, glyphs: run });
            }
        }
    }

    segments
}

pub fn group_glyph_lines(glyphs: &[Glyph]) -> Vec<Vec<Glyph>> {
    let mut lines: Vec<Vec<Glyph>> = Vec::new();
    let mut index_by_top: HashMap<i64, usize> = HashMap::new();

    for glyph in glyphs {
        let text = glyph.text.trim();
        if text.is_empty() {
            continue;
        }

        let mut glyph = glyph.clone();
        glyph.text = text.to_string();

        let key = (glyph.top * 10.0).round() as i64;
        match index_by_top.get(&key) {
            Some(&index) => lines[index].push(glyph),
            None => {
                index_by_top.insert(key, lines.len());
                lines.push(vec![glyph]);
            }
        }
    }

    lines
}

pub fn split_on_large_gaps(mut line: Vec<Glyph>, gap_threshold: f64) -> Vec<Vec<Glyph>> {
    line.sort_by(|a, b| a.x0.total_cmp(&b.x0));

    let mut segments = Vec::new();
    let mut current: Vec<Glyph> = Vec::new();

    for glyph in line {
        if let Some(previous) = current.last() {
            if glyph.x0 - previous.x1 > gap_threshold {
                segments.push(std::mem::take(&mut current));
            }
        }
        current.push(glyph);
    }

    if !current.is_empty() {
        segments.push(current);
    }

    segments
}

pub fn reconstruct_text(glyphs: &[Glyph], space_threshold: f64) -> String {
    let mut text = String::new();
    let mut previous: Option<&Glyph> = None;

    for glyph in glyphs {
        if let Some(previous) = previous {
            if glyph.x0 - previous.x1 > space_threshold {
                text.push(' ');
            }
        }
        text.push_str(&glyph.text);
        previous = Some(glyph);
    }

    text
}

// A lone trailing period marks a sentence; a dot leader cuts the text.
pub fn clean_line_text(text: &str) -> Option<String> {
    let text = text.trim();
    if text.ends_with('.') && !text.ends_with("..") {
        return None;
    }

    let text = match text.find("...") {
        Some(index) => text[..index].trim(),
        None => text,
    };

    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

pub fn heading_text(raw: &str) -> Option<String> {
    clean_line_text(raw).filter(|text| text.split_whitespace().count() <= MAX_HEADING_WORDS)
}

pub fn group_ocr_lines(words: &[OcrWord]) -> Vec<Vec<OcrWord>> {
    let mut words: Vec<OcrWord> = words
        .iter()
        .filter(|word| !word.text.trim().is_empty())
        .map(|word| OcrWord {
            text: word.text.trim().to_string(),
            ..word.clone()
        })
        .collect();
    words.sort_by(|a, b| a.top.total_cmp(&b.top).then(a.left.total_cmp(&b.left)));

    let mut lines = Vec::new();
    let mut current: Vec<OcrWord> = Vec::new();

    for word in words {
        let joins_current = current.last().is_some_and(|last| {
            (word.top - last.top).abs() <= OCR_LINE_TOP_TOLERANCE
                && (word.font_size() - last.font_size()).abs() < OCR_LINE_SIZE_TOLERANCE
        });

        if !joins_current && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        current.push(word);
    }

    if !current.is_empty() {
        lines.push(current);
    }

    lines
}

pub fn ocr_line_text(line: &[OcrWord]) -> String {
    let mut words: Vec<&OcrWord> = line.iter().collect();
    words.sort_by(|a, b| a.left.total_cmp(&b.left));
    words
        .iter()
        .map(|word| word.text.as_str())
        .collect::<Vec<&str>>()
        .join(" ")
}
