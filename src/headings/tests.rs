use std::collections::HashMap;

use anyhow::anyhow;

use super::*;
use crate::cli::LevelPreset;
use crate::model::Level;

use super::classify::{MIXED_FAMILY, accepts_text_heading, classify_ocr_page, classify_text_page};
use super::lines::{clean_line_text, glyph_segments, heading_text, reconstruct_text};
use super::router::{PageRoute, choose_route, glyph_char_count};
use super::types::{HeadingCandidate, Source, Style};

fn word(text: &str, font: &str, size: f64, top: f64, x0: f64) -> Glyph {
    let width = text.chars().count() as f64 * size * 0.5;
    Glyph::new(text, font, size, top, size, x0, x0 + width)
}

/// Lays words out left to right with a word-sized gap between them.
fn text_line(text: &str, font: &str, size: f64, top: f64) -> Vec<Glyph> {
    let mut x0 = 72.0;
    let mut glyphs = Vec::new();
    for part in text.split_whitespace() {
        let glyph = word(part, font, size, top, x0);
        x0 = glyph.x1 + size * 0.25;
        glyphs.push(glyph);
    }
    glyphs
}

fn candidate(text: &str, size: f64, style: Style, top: f64, page: usize) -> HeadingCandidate {
    let (family, source) = match style {
        Style::Ocr => ("OCR", Source::Ocr),
        _ => ("Arial", Source::Text),
    };
    HeadingCandidate::new(text, size, style, family, top, size, page, source).unwrap()
}

fn ocr_word(text: &str, left: f64, top: f64, height: f64) -> OcrWord {
    OcrWord {
        text: text.to_string(),
        left,
        top,
        width: text.chars().count() as f64 * height * 0.6,
        height,
    }
}

#[derive(Default)]
struct FakeSource {
    pages: Vec<Vec<Glyph>>,
    ocr: HashMap<usize, Result<Vec<OcrWord>, String>>,
    ocr_calls: Vec<usize>,
}

impl PageSource for FakeSource {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn glyphs(&self, page: usize) -> &[Glyph] {
        &self.pages[page - 1]
    }

    fn ocr_words(&mut self, page: usize) -> anyhow::Result<Vec<OcrWord>> {
        self.ocr_calls.push(page);
        match self.ocr.get(&page) {
            Some(Ok(words)) => Ok(words.clone()),
            Some(Err(message)) => Err(anyhow!("{message}")),
            None => Ok(Vec::new()),
        }
    }
}

#[test]
fn glyph_font_metadata_is_normalized() {
    let glyph = word("Scope", "ABCDEF+Arial-BoldMT", 14.004, 100.04, 72.0);
    assert!(glyph.bold);
    assert_eq!(glyph.font_family(), "Arial");
    assert_eq!(glyph.size, 14.0);
    assert_eq!(glyph.top, 100.0);

    let comma = word("Scope", "Helvetica,Bold", 12.0, 50.0, 72.0);
    assert!(comma.bold);
    assert_eq!(comma.font_family(), "Helvetica");

    let plain = word("Scope", "TimesNewRomanPSMT", 12.0, 50.0, 72.0);
    assert!(!plain.bold);
    assert_eq!(plain.weight(), Style::Regular);
}

#[test]
fn candidate_construction_enforces_shape() {
    assert!(HeadingCandidate::new("  ", 12.0, Style::Bold, "Arial", 0.0, 12.0, 1, Source::Text).is_err());
    assert!(HeadingCandidate::new("Scope", 0.0, Style::Bold, "Arial", 0.0, 12.0, 1, Source::Text).is_err());
    assert!(HeadingCandidate::new("Scope", 12.0, Style::Bold, "Arial", 0.0, 12.0, 0, Source::Text).is_err());

    let long = "one two three four five six seven eight nine ten eleven twelve thirteen";
    assert!(HeadingCandidate::new(long, 12.0, Style::Bold, "Arial", 0.0, 12.0, 1, Source::Text).is_err());

    let trimmed =
        HeadingCandidate::new(" Scope ", 12.0, Style::Bold, "Arial", 10.0, 12.0, 1, Source::Text)
            .unwrap();
    assert_eq!(trimmed.text, "Scope");
    assert_eq!(trimmed.bottom(), 22.0);
}

#[test]
fn trailing_period_discards_and_leaders_truncate() {
    assert_eq!(clean_line_text("Introduction."), None);
    assert_eq!(clean_line_text("Contents....."), Some("Contents".to_string()));
    assert_eq!(
        clean_line_text("2.1 Scope ........ 7"),
        Some("2.1 Scope".to_string())
    );
    assert_eq!(clean_line_text("...."), None);
    assert_eq!(clean_line_text("  Overview  "), Some("Overview".to_string()));
}

#[test]
fn heading_text_enforces_word_limit() {
    let twelve = "one two three four five six seven eight nine ten eleven twelve";
    assert_eq!(heading_text(twelve), Some(twelve.to_string()));
    assert_eq!(heading_text(&format!("{twelve} thirteen")), None);
}

#[test]
fn reconstruct_text_infers_spaces_from_gaps() {
    let tight = vec![
        Glyph::new("Hel", "Arial", 12.0, 10.0, 12.0, 72.0, 90.0),
        Glyph::new("lo", "Arial", 12.0, 10.0, 12.0, 90.5, 100.0),
    ];
    assert_eq!(reconstruct_text(&tight, 1.5), "Hello");

    let spaced = vec![
        Glyph::new("Hel", "Arial", 12.0, 10.0, 12.0, 72.0, 90.0),
        Glyph::new("lo", "Arial", 12.0, 10.0, 12.0, 93.0, 100.0),
    ];
    assert_eq!(reconstruct_text(&spaced, 1.5), "Hel lo");
}

#[test]
fn large_gaps_split_a_row_into_segments() {
    let mut glyphs = vec![word("Page", "Arial-BoldMT", 14.0, 40.0, 460.0)];
    glyphs.extend(text_line("Annual Review", "Arial-BoldMT", 14.0, 40.0));
    glyphs.push(word("Body", "Arial-BoldMT", 14.0, 90.0, 72.0));

    let texts: Vec<String> = glyph_segments(&glyphs)
        .into_iter()
        .map(|segment| segment.text)
        .collect();
    assert_eq!(texts, vec!["Annual Review", "Page", "Body"]);
}

#[test]
fn mixed_weight_segment_is_rejected() {
    let glyphs = vec![
        word("Bold", "Arial-BoldMT", 14.0, 100.0, 72.0),
        word("Plain", "ArialMT", 14.0, 100.0, 114.0),
    ];
    assert!(classify_text_page(&glyphs, 1).is_empty());
}

#[test]
fn mixed_family_segment_is_kept_as_mixed() {
    let glyphs = vec![
        word("Risk", "Times-Bold", 14.0, 100.0, 72.0),
        word("Register", "Arial-BoldMT", 14.0, 100.0, 104.0),
    ];
    let candidates = classify_text_page(&glyphs, 3);
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].font_family, MIXED_FAMILY);
    assert_eq!(candidates[0].style, Style::Bold);
    assert_eq!(candidates[0].page, 3);
    assert_eq!(candidates[0].text, "Risk Register");
}

#[test]
fn segment_size_is_weighted_by_characters() {
    let glyphs = vec![
        word("Big", "Arial-BoldMT", 20.0, 100.0, 72.0),
        word("smalltext", "Arial-BoldMT", 11.0, 100.0, 106.0),
    ];
    let candidates = classify_text_page(&glyphs, 1);
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].text, "Big smalltext");
    assert_eq!(candidates[0].font_size, 13.25);
}

#[test]
fn text_acceptance_thresholds() {
    assert!(accepts_text_heading("Arial", Style::Regular, 10.0));
    assert!(!accepts_text_heading("Arial", Style::Regular, 9.0));
    assert!(accepts_text_heading("Times", Style::Bold, 11.5));
    assert!(!accepts_text_heading("Times", Style::Bold, 11.4));
    assert!(!accepts_text_heading("Times", Style::Regular, 12.5));
    assert!(accepts_text_heading("Times", Style::Regular, 12.6));
}

#[test]
fn ocr_words_group_into_lines_by_position_and_height() {
    let words = vec![
        ocr_word("Two", 420.0, 505.0, 85.0),
        ocr_word("Chapter", 100.0, 500.0, 84.0),
        ocr_word("small", 100.0, 520.0, 30.0),
        ocr_word(" ", 300.0, 520.0, 30.0),
    ];
    let candidates = classify_ocr_page(&words, 2);

    assert_eq!(candidates.len(), 2);
    assert_eq!(candidates[0].text, "Chapter Two");
    assert_eq!(candidates[0].font_size, 84.5);
    assert_eq!(candidates[0].top, 500.0);
    assert_eq!(candidates[0].height, 85.0);
    assert_eq!(candidates[0].style, Style::Ocr);
    assert_eq!(candidates[0].source, Source::Ocr);
    assert_eq!(candidates[1].text, "small");
}

#[test]
fn simplify_repairs_duplication_artifacts() {
    assert_eq!(simplify("HHeading"), "Heading");
    assert_eq!(simplify("1. HHeading"), "1. Heading");
    assert_eq!(simplify("  Heaaading  "), "Heading");
    assert_eq!(simplify("Annual Report 2000"), "Annual Report 2000");
    assert_eq!(simplify("Part III"), "Part III");
    assert_eq!(simplify("LLC Filings"), "LLC Filings");
}

#[test]
fn simplify_undoubles_fake_bold_words() {
    assert_eq!(simplify("HHeeaaddiinngg"), "Heading");
    assert_eq!(simplify("1. HHeeaaddiinngg"), "1. Heading");
    assert_eq!(simplify("SSccooppee and Limits"), "Scope and Limits");
    assert_eq!(simplify("HHHHeeee"), "He");
    assert_eq!(simplify("Annual Report"), "Annual Report");
    assert_eq!(simplify("Book 2000"), "Book 2000");
}

#[test]
fn simplify_is_idempotent() {
    for text in [
        "HHeading",
        "HHHeading",
        "Heaaading Tooools",
        "Annual Report",
        " Ssummary of   results ",
        "__init__ aaa",
        "HHeeaaddiinngg",
        "1. HHHHeeee",
    ] {
        let once = simplify(text);
        assert_eq!(simplify(&once), once, "input {text:?}");
    }
}

#[test]
fn contiguous_bold_lines_merge_into_title() {
    let mut map = PageHeadingMap::new();
    map.insert(
        1,
        vec![
            candidate("Annual", 24.0, Style::Bold, 100.0, 1),
            candidate("Report", 24.0, Style::Bold, 134.0, 1),
            candidate("Overview", 16.0, Style::Bold, 300.0, 1),
        ],
    );
    map.insert(2, vec![candidate("Background", 16.0, Style::Bold, 80.0, 2)]);

    let result = build_outline(map, &LevelTable::STANDARD);

    assert_eq!(result.title, "Annual Report");
    assert_eq!(
        result.outline,
        vec![OutlineEntry {
            level: Level::H1,
            text: "Background".to_string(),
            page: 2,
        }]
    );
}

#[test]
fn mixed_weight_max_size_lines_do_not_merge_into_title() {
    let mut map = PageHeadingMap::new();
    map.insert(
        1,
        vec![
            candidate("Annual", 24.0, Style::Bold, 100.0, 1),
            candidate("Report", 24.0, Style::Regular, 134.0, 1),
            candidate("Summary", 18.0, Style::Bold, 300.0, 1),
        ],
    );

    let result = build_outline(map, &LevelTable::STANDARD);

    assert_eq!(result.title, "Annual");
    assert_eq!(
        result.outline,
        vec![OutlineEntry {
            level: Level::H1,
            text: "Summary".to_string(),
            page: 1,
        }]
    );
}

#[test]
fn detect_title_handles_empty_first_page() {
    let mut map = PageHeadingMap::new();
    map.insert(1, Vec::new());
    map.insert(2, vec![candidate("Scope", 20.0, Style::Bold, 80.0, 2)]);

    assert_eq!(detect_title(&mut map), "");
    assert_eq!(map.page(2).len(), 1);
}

#[test]
fn widely_spaced_max_size_lines_keep_first_as_title() {
    let mut map = PageHeadingMap::new();
    map.insert(
        TITLE_PAGE,
        vec![
            candidate("Handbook", 30.0, Style::Bold, 100.0, 1),
            candidate("Appendix", 30.0, Style::Bold, 600.0, 1),
        ],
    );

    assert_eq!(detect_title(&mut map), "Handbook");
    assert_eq!(map.page(TITLE_PAGE)[0].text, "Appendix");
}

#[test]
fn abundant_small_regular_candidates_are_suppressed() {
    let mut map = PageHeadingMap::new();
    for page in 1..=3 {
        let count = if page == 3 { 6 } else { 7 };
        let mut candidates: Vec<HeadingCandidate> = (0..count)
            .map(|index| candidate("Body line", 12.0, Style::Regular, 100.0 + index as f64 * 20.0, page))
            .collect();
        if page == 2 {
            candidates.push(candidate("Findings", 20.0, Style::Bold, 40.0, 2));
            candidates.push(candidate("Large regular", 16.0, Style::Regular, 60.0, 2));
        }
        map.insert(page, candidates);
    }

    assert_eq!(suppress_body_text(&mut map), 20);
    assert_eq!(map.candidate_count(), 2);
    assert!(map.page(1).is_empty());
    assert!(map.page(3).is_empty());
}

#[test]
fn few_small_regular_candidates_are_kept() {
    let mut map = PageHeadingMap::new();
    for page in 1..=3 {
        map.insert(page, Vec::new());
    }
    let candidates = (0..13)
        .map(|index| candidate("Item", 13.0, Style::Regular, index as f64 * 30.0, 1))
        .collect();
    map.insert(1, candidates);

    assert_eq!(suppress_body_text(&mut map), 0);
    assert_eq!(map.candidate_count(), 13);
}

#[test]
fn merge_compares_against_last_merged_entry_only() {
    let merged = merge_similar_headings(vec![
        candidate("Gamma", 20.0, Style::Bold, 175.0, 2),
        candidate("Alpha", 20.0, Style::Bold, 100.0, 2),
        candidate("Beta", 20.0, Style::Bold, 135.0, 2),
    ]);

    let texts: Vec<&str> = merged.iter().map(|entry| entry.text.as_str()).collect();
    assert_eq!(texts, vec!["Alpha Beta", "Gamma"]);
    assert_eq!(merged[0].top, 100.0);
}

#[test]
fn merge_skips_small_or_differently_styled_lines() {
    let small = merge_similar_headings(vec![
        candidate("Terms", 12.0, Style::Bold, 100.0, 2),
        candidate("Definitions", 12.0, Style::Bold, 115.0, 2),
    ]);
    assert_eq!(small.len(), 2);

    let styled = merge_similar_headings(vec![
        candidate("Terms", 18.0, Style::Bold, 100.0, 2),
        candidate("Definitions", 18.0, Style::Regular, 115.0, 2),
    ]);
    assert_eq!(styled.len(), 2);
}

#[test]
fn text_levels_follow_presets() {
    let at = |size: f64| candidate("Heading", size, Style::Bold, 10.0, 2);

    let standard = LevelTable::for_preset(LevelPreset::Standard);
    assert_eq!(standard.level_for(&at(16.0)), Some(Level::H1));
    assert_eq!(standard.level_for(&at(13.0)), Some(Level::H2));
    assert_eq!(standard.level_for(&at(9.5)), Some(Level::H3));
    assert_eq!(standard.level_for(&at(9.0)), Some(Level::H4));

    let compact = LevelTable::for_preset(LevelPreset::Compact);
    assert_eq!(compact.level_for(&at(18.0)), Some(Level::H1));
    assert_eq!(compact.level_for(&at(16.0)), Some(Level::H2));
    assert_eq!(compact.level_for(&at(13.9)), Some(Level::H3));
    assert_eq!(compact.level_for(&at(9.0)), Some(Level::H3));
}

#[test]
fn ocr_levels_discard_small_lines() {
    let at = |size: f64| candidate("Heading", size, Style::Ocr, 10.0, 2);
    let table = LevelTable::default();

    assert_eq!(table.level_for(&at(85.0)), Some(Level::H1));
    assert_eq!(table.level_for(&at(60.0)), Some(Level::H2));
    assert_eq!(table.level_for(&at(45.0)), Some(Level::H3));
    assert_eq!(table.level_for(&at(30.0)), Some(Level::H4));
    assert_eq!(table.level_for(&at(25.0)), None);
    assert_eq!(table.level_for(&at(20.0)), None);
}

#[test]
fn routing_follows_ocr_mode() {
    let sparse = text_line("p. 4", "ArialMT", 10.0, 10.0);
    let dense = text_line("Executive summary", "ArialMT", 10.0, 10.0);
    assert_eq!(glyph_char_count(&sparse), 3);

    assert_eq!(choose_route(&sparse, OcrMode::Auto), PageRoute::Ocr);
    assert_eq!(choose_route(&dense, OcrMode::Auto), PageRoute::Text);
    assert_eq!(choose_route(&[], OcrMode::Off), PageRoute::Text);
    assert_eq!(choose_route(&dense, OcrMode::Force), PageRoute::Ocr);
}

fn three_page_source() -> FakeSource {
    let mut page_one = text_line("Quarterly Results", "Arial-BoldMT", 24.0, 80.0);
    page_one.extend(text_line(
        "Revenue grew across every region this quarter.",
        "TimesNewRomanPSMT",
        10.0,
        200.0,
    ));

    let mut ocr = HashMap::new();
    ocr.insert(2, Err("tesseract exited with status 1".to_string()));
    ocr.insert(
        3,
        Ok(vec![
            ocr_word("Chapter", 100.0, 500.0, 85.0),
            ocr_word("Two", 420.0, 505.0, 85.0),
            ocr_word("footnote", 100.0, 3000.0, 20.0),
        ]),
    );

    FakeSource {
        pages: vec![page_one, Vec::new(), Vec::new()],
        ocr,
        ocr_calls: Vec::new(),
    }
}

#[test]
fn ocr_failure_is_isolated_to_its_page() {
    let mut source = three_page_source();
    let report = extract_outline(&mut source, &PipelineConfig::default());

    assert_eq!(source.ocr_calls, vec![2, 3]);
    assert_eq!(report.result.title, "Quarterly Results");
    assert_eq!(
        report.result.outline,
        vec![OutlineEntry {
            level: Level::H1,
            text: "Chapter Two".to_string(),
            page: 3,
        }]
    );
    assert_eq!(
        report.stats,
        PageStats {
            page_count: 3,
            text_pages: 1,
            ocr_pages: 1,
            ocr_failed_pages: 1,
            ocr_skipped_pages: 0,
        }
    );
    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].starts_with("page 2: OCR failed"));
}

#[test]
fn ocr_off_never_calls_ocr() {
    let mut source = three_page_source();
    let config = PipelineConfig {
        ocr_mode: OcrMode::Off,
        ..PipelineConfig::default()
    };
    let report = extract_outline(&mut source, &config);

    assert!(source.ocr_calls.is_empty());
    assert_eq!(report.stats.text_pages, 3);
    assert!(report.result.outline.is_empty());
}

#[test]
fn expired_deadline_skips_remaining_ocr_pages() {
    let mut source = three_page_source();
    let config = PipelineConfig {
        document_timeout: Some(Duration::ZERO),
        ..PipelineConfig::default()
    };
    let report = extract_outline(&mut source, &config);

    assert!(source.ocr_calls.is_empty());
    assert_eq!(report.stats.ocr_skipped_pages, 2);
    assert_eq!(report.result.title, "Quarterly Results");
    assert_eq!(report.warnings.len(), 2);
}

#[test]
fn outline_pages_are_non_decreasing() {
    let mut source = FakeSource {
        pages: vec![
            text_line("Field Guide", "Arial-BoldMT", 28.0, 60.0),
            [
                text_line("Methods", "Arial-BoldMT", 18.0, 400.0),
                text_line("Sampling", "Arial-BoldMT", 14.0, 100.0),
            ]
            .concat(),
            text_line("Results and Discussion", "Arial-BoldMT", 18.0, 90.0),
        ],
        ..FakeSource::default()
    };
    let report = extract_outline(&mut source, &PipelineConfig::default());

    assert_eq!(report.result.title, "Field Guide");
    let pages: Vec<usize> = report.result.outline.iter().map(|entry| entry.page).collect();
    assert!(pages.windows(2).all(|pair| pair[0] <= pair[1]));
    let texts: Vec<&str> = report
        .result
        .outline
        .iter()
        .map(|entry| entry.text.as_str())
        .collect();
    assert_eq!(texts, vec!["Sampling", "Methods", "Results and Discussion"]);
    assert!(source.ocr_calls.is_empty());
}

#[test]
fn document_result_json_round_trips() {
    let result = DocumentResult {
        title: "Annual Report".to_string(),
        outline: vec![
            OutlineEntry {
                level: Level::H1,
                text: "Introduction".to_string(),
                page: 2,
            },
            OutlineEntry {
                level: Level::H3,
                text: "Données".to_string(),
                page: 4,
            },
        ],
    };

    let json = crate::util::to_json_pretty(&result).unwrap();
    assert!(json.contains("\"level\": \"H1\""));
    assert!(json.contains("Données"));
    assert!(json.ends_with('\n'));

    let parsed: DocumentResult = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, result);
}
