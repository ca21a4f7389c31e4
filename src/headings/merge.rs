use super::types::HeadingCandidate;

pub const MERGE_VERTICAL_GAP: f64 = 40.0;
pub const MERGE_MIN_FONT_SIZE: f64 = 15.0;

pub fn vertically_adjacent(previous: &HeadingCandidate, next: &HeadingCandidate, gap: f64) -> bool {
    (next.top - previous.top).abs() <= gap || (next.top - previous.bottom()).abs() <= gap
}

fn same_style(a: &HeadingCandidate, b: &HeadingCandidate) -> bool {
    a.font_size == b.font_size && a.style == b.style && a.font_family == b.font_family
}

// Single pass: each candidate is compared with the last merged entry only.
pub fn merge_similar_headings(mut candidates: Vec<HeadingCandidate>) -> Vec<HeadingCandidate> {
    candidates.sort_by(|a, b| a.top.total_cmp(&b.top));

    let mut merged: Vec<HeadingCandidate> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if let Some(last) = merged.last_mut() {
            if vertically_adjacent(last, &candidate, MERGE_VERTICAL_GAP)
                && same_style(last, &candidate)
                && candidate.font_size >= MERGE_MIN_FONT_SIZE
            {
                last.text.push(' ');
                last.text.push_str(&candidate.text);
                continue;
            }
        }
        merged.push(candidate);
    }

    merged
}
