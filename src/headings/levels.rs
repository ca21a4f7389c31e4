use crate::cli::LevelPreset;
use crate::model::Level;

use super::types::{HeadingCandidate, Source};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextLevelTable {
    pub h1_min: f64,
    pub h2_min: f64,
    pub h3_min: Option<f64>,
    pub fallback: Level,
}

/// Sizes here are word heights in pixels on a page rendered at 300 DPI.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OcrLevelTable {
    pub h1_min: f64,
    pub h2_min: f64,
    pub h3_min: f64,
    pub discard_max: f64,
    pub fallback: Level,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelTable {
    pub text: TextLevelTable,
    pub ocr: OcrLevelTable,
}

const OCR_LEVELS: OcrLevelTable = OcrLevelTable {
    h1_min: 80.0,
    h2_min: 60.0,
    h3_min: 40.0,
    discard_max: 25.0,
    fallback: Level::H4,
};

impl LevelTable {
    pub const STANDARD: Self = Self {
        text: TextLevelTable {
            h1_min: 16.0,
            h2_min: 13.0,
            h3_min: Some(9.5),
            fallback: Level::H4,
        },
        ocr: OCR_LEVELS,
    };

    pub const COMPACT: Self = Self {
        text: TextLevelTable {
            h1_min: 18.0,
            h2_min: 14.0,
            h3_min: None,
            fallback: Level::H3,
        },
        ocr: OCR_LEVELS,
    };

    pub fn for_preset(preset: LevelPreset) -> Self {
        match preset {
            LevelPreset::Standard => Self::STANDARD,
            LevelPreset::Compact => Self::COMPACT,
        }
    }

    pub fn level_for(&self, candidate: &HeadingCandidate) -> Option<Level> {
        let size = candidate.font_size;
        match candidate.source {
            Source::Text => {
                let table = &self.text;
                let level = if size >= table.h1_min {
                    Level::H1
                } else if size >= table.h2_min {
                    Level::H2
                } else if table.h3_min.is_some_and(|min| size >= min) {
                    Level::H3
                } else {
                    table.fallback
                };
                Some(level)
            }
            Source::Ocr => {
                let table = &self.ocr;
                if size >= table.h1_min {
                    Some(Level::H1)
                } else if size >= table.h2_min {
                    Some(Level::H2)
                } else if size >= table.h3_min {
                    Some(Level::H3)
                } else if size <= table.discard_max {
                    None
                } else {
                    Some(table.fallback)
                }
            }
        }
    }
}

impl Default for LevelTable {
    fn default() -> Self {
        Self::STANDARD
    }
}

const ARTIFACT_RUN_MIN: usize = 3;
const DOUBLED_WORD_MIN: usize = 4;

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

fn is_doubled_word(word: &[char]) -> bool {
    word.len() >= DOUBLED_WORD_MIN
        && word.len() % 2 == 0
        && word.iter().any(|ch| ch.is_alphabetic())
        && word.chunks(2).all(|pair| pair[0] == pair[1])
}

// Fake-bold text layers emit every character twice: "HHeeaaddiinngg".
fn undouble_words(chars: &[char]) -> Vec<char> {
    let mut out = Vec::with_capacity(chars.len());
    let mut index = 0;

    while index < chars.len() {
        let len = chars[index..]
            .iter()
            .take_while(|&&ch| is_word_char(ch))
            .count();
        if len == 0 {
            out.push(chars[index]);
            index += 1;
            continue;
        }

        let mut word = chars[index..index + len].to_vec();
        while is_doubled_word(&word) {
            word = word.iter().step_by(2).copied().collect();
        }
        out.extend(word);
        index += len;
    }

    out
}

/// Real doubles such as "Annual", "2000" or "LLC" survive.
pub fn simplify(text: &str) -> String {
    let chars = undouble_words(&text.chars().collect::<Vec<char>>());
    let mut collapsed: Vec<char> = Vec::with_capacity(chars.len());

    let mut index = 0;
    while index < chars.len() {
        let ch = chars[index];
        let run = chars[index..].iter().take_while(|&&next| next == ch).count();
        let keep = if ch.is_lowercase() && run >= ARTIFACT_RUN_MIN {
            1
        } else {
            run
        };
        collapsed.extend(std::iter::repeat_n(ch, keep));
        index += run;
    }

    let mut out = String::with_capacity(collapsed.len());
    for (index, &ch) in collapsed.iter().enumerate() {
        let word_start = index == 0 || !is_word_char(collapsed[index - 1]);
        let doubled_capital = word_start
            && ch.is_uppercase()
            && collapsed.get(index + 1) == Some(&ch)
            && collapsed.get(index + 2).is_some_and(|next| next.is_lowercase());
        if !doubled_capital {
            out.push(ch);
        }
    }

    out.trim().to_string()
}
