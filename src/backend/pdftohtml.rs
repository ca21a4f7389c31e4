use std::collections::HashMap;
use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result, bail};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::debug;

use crate::headings::Glyph;

use super::ToolConfig;
use super::process::{ensure_success, run_with_timeout};

#[derive(Debug, Clone)]
struct FontSpec {
    size: f64,
    family: String,
}

#[derive(Debug)]
struct OpenRun {
    attrs: HashMap<String, String>,
    spans: Vec<Span>,
    bold_depth: usize,
}

#[derive(Debug)]
struct Span {
    text: String,
    bold: bool,
}

pub fn extract_glyph_pages(pdf_path: &Path, config: &ToolConfig) -> Result<Vec<Vec<Glyph>>> {
    let mut command = Command::new(&config.pdftohtml);
    command
        .arg("-xml")
        .arg("-i")
        .arg("-hidden")
        .arg("-fontfullname")
        .arg("-q")
        .arg("-zoom")
        .arg("1")
        .arg(pdf_path)
        .arg("-stdout");

    let output = run_with_timeout(&mut command, config.timeout)
        .with_context(|| format!("failed to run pdftohtml for {}", pdf_path.display()))?;
    ensure_success(&output, &format!("pdftohtml for {}", pdf_path.display()))?;

    let xml = String::from_utf8_lossy(&output.stdout);
    let pages = parse_pdftohtml_xml(&xml)
        .with_context(|| format!("failed to parse pdftohtml output for {}", pdf_path.display()))?;

    debug!(
        path = %pdf_path.display(),
        pages = pages.len(),
        glyphs = pages.iter().map(Vec::len).sum::<usize>(),
        "parsed text layer"
    );
    Ok(pages)
}

pub fn parse_pdftohtml_xml(xml: &str) -> Result<Vec<Vec<Glyph>>> {
    let mut reader = Reader::from_str(xml);

    let mut pages: Vec<Vec<Glyph>> = Vec::new();
    let mut fonts: HashMap<String, FontSpec> = HashMap::new();
    let mut open: Option<OpenRun> = None;

    loop {
        let event = reader
            .read_event()
            .with_context(|| format!("malformed xml at byte {}", reader.buffer_position()))?;

        match event {
            Event::Start(element) => match element.name().as_ref() {
                b"page" => {
                    let attrs = attributes(&element)?;
                    let expected = pages.len() + 1;
                    if let Some(number) = attrs.get("number") {
                        let number = number
                            .parse::<usize>()
                            .with_context(|| format!("invalid page number: {number}"))?;
                        if number != expected {
                            bail!("pdftohtml pages out of order: expected {expected}, found {number}");
                        }
                    }
                    pages.push(Vec::new());
                }
                b"text" => {
                    open = Some(OpenRun {
                        attrs: attributes(&element)?,
                        spans: Vec::new(),
                        bold_depth: 0,
                    });
                }
                b"b" => {
                    if let Some(run) = open.as_mut() {
                        run.bold_depth += 1;
                    }
                }
                b"fontspec" => register_font(&mut fonts, &element)?,
                _ => {}
            },
            Event::Empty(element) => {
                if element.name().as_ref() == b"fontspec" {
                    register_font(&mut fonts, &element)?;
                }
            }
            Event::Text(text) => {
                if let Some(run) = open.as_mut() {
                    let decoded = text.unescape().context("invalid escape in text run")?;
                    push_span(run, &decoded.replace('\u{00a0}', " "));
                }
            }
            Event::CData(data) => {
                if let Some(run) = open.as_mut() {
                    push_span(run, &String::from_utf8_lossy(&data));
                }
            }
            Event::End(element) => match element.name().as_ref() {
                b"b" => {
                    if let Some(run) = open.as_mut() {
                        run.bold_depth = run.bold_depth.saturating_sub(1);
                    }
                }
                b"text" => {
                    if let Some(run) = open.take() {
                        let Some(page) = pages.last_mut() else {
                            continue;
                        };
                        page.extend(run_glyphs(&run, &fonts)?);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(pages)
}

fn attributes(element: &BytesStart<'_>) -> Result<HashMap<String, String>> {
    let mut attrs = HashMap::new();
    for attribute in element.attributes() {
        let attribute = attribute.context("malformed attribute")?;
        let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        let value = attribute
            .unescape_value()
            .with_context(|| format!("invalid escape in attribute {key}"))?
            .into_owned();
        attrs.insert(key, value);
    }
    Ok(attrs)
}

fn register_font(fonts: &mut HashMap<String, FontSpec>, element: &BytesStart<'_>) -> Result<()> {
    let attrs = attributes(element)?;
    let Some(id) = attrs.get("id") else {
        return Ok(());
    };
    fonts.insert(
        id.clone(),
        FontSpec {
            size: number_attribute(&attrs, "size")?,
            family: attrs.get("family").cloned().unwrap_or_default(),
        },
    );
    Ok(())
}

fn push_span(run: &mut OpenRun, text: &str) {
    let bold = run.bold_depth > 0;
    match run.spans.last_mut() {
        Some(last) if last.bold == bold => last.text.push_str(text),
        _ => run.spans.push(Span {
            text: text.to_string(),
            bold,
        }),
    }
}

// A run that changes weight part way becomes one glyph per weight, each
// taking its characters' share of the run width.
fn run_glyphs(run: &OpenRun, fonts: &HashMap<String, FontSpec>) -> Result<Vec<Glyph>> {
    let total_chars: usize = run.spans.iter().map(|span| span.text.chars().count()).sum();
    if run.spans.iter().all(|span| span.text.trim().is_empty()) {
        return Ok(Vec::new());
    }

    let font_id = run.attrs.get("font").map(String::as_str).unwrap_or_default();
    let font = fonts
        .get(font_id)
        .with_context(|| format!("text references unknown font id: {font_id}"))?;

    let top = number_attribute(&run.attrs, "top")?;
    let left = number_attribute(&run.attrs, "left")?;
    let width = number_attribute(&run.attrs, "width")?;
    let height = number_attribute(&run.attrs, "height")?;
    let position = |chars: usize| left + width * chars as f64 / total_chars as f64;

    let mut glyphs = Vec::new();
    let mut offset = 0;
    for span in &run.spans {
        let chars = span.text.chars().count();
        let trimmed = span.text.trim();
        if !trimmed.is_empty() {
            let leading = span.text.chars().take_while(|ch| ch.is_whitespace()).count();
            let start = offset + leading;
            let end = start + trimmed.chars().count();
            glyphs.push(
                Glyph::new(
                    trimmed,
                    font.family.as_str(),
                    font.size,
                    top,
                    height,
                    position(start),
                    position(end),
                )
                .with_bold(span.bold),
            );
        }
        offset += chars;
    }

    Ok(glyphs)
}

fn number_attribute(attrs: &HashMap<String, String>, key: &str) -> Result<f64> {
    let raw = attrs
        .get(key)
        .with_context(|| format!("missing numeric attribute: {key}"))?;
    raw.trim()
        .parse::<f64>()
        .with_context(|| format!("invalid numeric attribute {key}=\"{raw}\""))
}
