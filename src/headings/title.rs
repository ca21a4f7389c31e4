use super::levels::simplify;
use super::types::{HeadingCandidate, PageHeadingMap};

pub const TITLE_PAGE: usize = 1;
pub const TITLE_LINE_GAP: f64 = 40.0;
const MAX_TITLE_LINES: usize = 3;

pub fn detect_title(map: &mut PageHeadingMap) -> String {
    let Some(candidates) = map.page_mut(TITLE_PAGE) else {
        return String::new();
    };
    if candidates.is_empty() {
        return String::new();
    }

    let max_size = candidates
        .iter()
        .map(|candidate| candidate.font_size)
        .fold(f64::NEG_INFINITY, f64::max);

    if let Some(title) = multi_line_title(candidates, max_size) {
        candidates.retain(|candidate| candidate.font_size != max_size);
        return title;
    }

    let Some(top_line) = candidates
        .iter()
        .find(|candidate| candidate.font_size == max_size)
        .cloned()
    else {
        return String::new();
    };

    candidates.retain(|candidate| *candidate != top_line);
    simplify(&top_line.text)
}

fn multi_line_title(candidates: &[HeadingCandidate], max_size: f64) -> Option<String> {
    let mut largest: Vec<&HeadingCandidate> = candidates
        .iter()
        .filter(|candidate| candidate.font_size == max_size)
        .collect();

    if !(2..=MAX_TITLE_LINES).contains(&largest.len()) {
        return None;
    }

    largest.sort_by(|a, b| a.top.total_cmp(&b.top));

    let all_bold = largest.iter().all(|line| line.style.is_bold_like());
    let contiguous = largest
        .windows(2)
        .all(|pair| (pair[1].top - pair[0].bottom()).abs() < TITLE_LINE_GAP);

    if !all_bold || !contiguous {
        return None;
    }

    Some(
        largest
            .iter()
            .map(|line| simplify(&line.text))
            .collect::<Vec<String>>()
            .join(" "),
    )
}
