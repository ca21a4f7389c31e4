use std::collections::BTreeMap;

use anyhow::{Result, ensure};

pub const MAX_HEADING_WORDS: usize = 12;

#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    pub text: String,
    pub font_name: String,
    pub size: f64,
    pub bold: bool,
    pub top: f64,
    pub height: f64,
    pub x0: f64,
    pub x1: f64,
}

impl Glyph {
    pub fn new(
        text: impl Into<String>,
        font_name: impl Into<String>,
        size: f64,
        top: f64,
        height: f64,
        x0: f64,
        x1: f64,
    ) -> Self {
        let font_name = font_name.into();
        Self {
            text: text.into(),
            bold: font_name_is_bold(&font_name),
            font_name,
            size: round_to(size, 2),
            top: round_to(top, 1),
            height: round_to(height, 1),
            x0,
            x1,
        }
    }

    pub fn with_bold(mut self, bold: bool) -> Self {
        self.bold = self.bold || bold;
        self
    }

    pub fn weight(&self) -> Style {
        if self.bold { Style::Bold } else { Style::Regular }
    }

    pub fn font_family(&self) -> &str {
        font_family(&self.font_name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OcrWord {
    pub text: String,
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl OcrWord {
    pub fn font_size(&self) -> f64 {
        self.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Bold,
    Regular,
    Ocr,
}

impl Style {
    pub fn is_bold_like(self) -> bool {
        matches!(self, Self::Bold | Self::Ocr)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Text,
    Ocr,
}

impl Source {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Ocr => "ocr",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeadingCandidate {
    pub text: String,
    pub font_size: f64,
    pub style: Style,
    pub font_family: String,
    pub top: f64,
    pub height: f64,
    pub page: usize,
    pub source: Source,
}

impl HeadingCandidate {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        text: impl Into<String>,
        font_size: f64,
        style: Style,
        font_family: impl Into<String>,
        top: f64,
        height: f64,
        page: usize,
        source: Source,
    ) -> Result<Self> {
        let text = text.into().trim().to_string();
        ensure!(!text.is_empty(), "heading text is empty");
        let word_count = text.split_whitespace().count();
        ensure!(
            word_count <= MAX_HEADING_WORDS,
            "heading text has {word_count} words (max {MAX_HEADING_WORDS})"
        );
        ensure!(
            font_size.is_finite() && font_size > 0.0,
            "heading font size must be positive, got {font_size}"
        );
        ensure!(page >= 1, "page numbers are 1-indexed");

        Ok(Self {
            text,
            font_size,
            style,
            font_family: font_family.into(),
            top,
            height,
            page,
            source,
        })
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageHeadingMap {
    pages: BTreeMap<usize, Vec<HeadingCandidate>>,
}

impl PageHeadingMap {
    #[cfg(test)]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, page: usize, candidates: Vec<HeadingCandidate>) {
        self.pages.insert(page, candidates);
    }

    #[cfg(test)]
    pub fn page(&self, page: usize) -> &[HeadingCandidate] {
        self.pages.get(&page).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn page_mut(&mut self, page: usize) -> Option<&mut Vec<HeadingCandidate>> {
        self.pages.get_mut(&page)
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn candidate_count(&self) -> usize {
        self.pages.values().map(Vec::len).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &Vec<HeadingCandidate>)> {
        self.pages.iter().map(|(page, candidates)| (*page, candidates))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (usize, &mut Vec<HeadingCandidate>)> {
        self.pages
            .iter_mut()
            .map(|(page, candidates)| (*page, candidates))
    }

    pub fn into_pages(self) -> impl Iterator<Item = (usize, Vec<HeadingCandidate>)> {
        self.pages.into_iter()
    }
}

pub fn font_name_is_bold(font_name: &str) -> bool {
    let lowered = font_name.to_lowercase();
    lowered.contains("bold") || lowered.contains("bd")
}

pub fn font_family(font_name: &str) -> &str {
    let name = strip_subset_prefix(font_name);
    match name.split_once('-') {
        Some((family, _)) => family,
        None => name.split(',').next().unwrap_or(name),
    }
}

// Embedded subsets are named like "ABCDEF+Arial-BoldMT".
fn strip_subset_prefix(font_name: &str) -> &str {
    match font_name.split_once('+') {
        Some((prefix, rest))
            if prefix.len() == 6 && prefix.chars().all(|ch| ch.is_ascii_uppercase()) =>
        {
            rest
        }
        _ => font_name,
    }
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
