//! Lightweight markdown for chat bubbles.
//!
//! Parsing is split from drawing so the block and inline rules can be tested
//! without a UI. Handles the subset research answers actually use:
//! - `#` through `######` headings
//! - `- item`, `* item` and `• item` bullets, `1. item` numbered items
//! - `---` / `***` rules
//! - `**bold**`, `*italic*`, `` `code` `` and `[text](url)` inline

use eframe::egui;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block<'a> {
    Heading { level: u8, text: &'a str },
    Bullet(&'a str),
    Numbered { number: &'a str, text: &'a str },
    Rule,
    Paragraph(&'a str),
    /// One or more blank lines.
    Blank,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Span<'a> {
    Text(&'a str),
    Bold(&'a str),
    Italic(&'a str),
    Code(&'a str),
    Link { text: &'a str, url: &'a str },
}

pub fn parse_blocks(text: &str) -> Vec<Block<'_>> {
    let mut blocks = Vec::new();
    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            if !matches!(blocks.last(), Some(Block::Blank) | None) {
                blocks.push(Block::Blank);
            }
            continue;
        }
        blocks.push(parse_line(trimmed));
    }
    if matches!(blocks.last(), Some(Block::Blank)) {
        blocks.pop();
    }
    blocks
}

fn parse_line(line: &str) -> Block<'_> {
    let hashes = line.bytes().take_while(|&b| b == b'#').count();
    if (1..=6).contains(&hashes) {
        if let Some(text) = line[hashes..].strip_prefix(' ') {
            return Block::Heading {
                level: hashes as u8,
                text: text.trim(),
            };
        }
    }

    if is_rule(line) {
        return Block::Rule;
    }

    for marker in ["- ", "* ", "• "] {
        if let Some(text) = line.strip_prefix(marker) {
            return Block::Bullet(text.trim_start());
        }
    }

    let digits = line.bytes().take_while(u8::is_ascii_digit).count();
    if digits > 0 {
        let rest = &line[digits..];
        if let Some(text) = rest.strip_prefix(". ").or_else(|| rest.strip_prefix(") ")) {
            return Block::Numbered {
                number: &line[..digits],
                text: text.trim_start(),
            };
        }
    }

    Block::Paragraph(line)
}

fn is_rule(line: &str) -> bool {
    let compact: String = line.chars().filter(|c| !c.is_whitespace()).collect();
    compact.len() >= 3
        && ['-', '*', '_']
            .iter()
            .any(|&m| compact.chars().all(|c| c == m))
}

pub fn parse_inline(text: &str) -> Vec<Span<'_>> {
    let mut spans = Vec::new();
    let mut plain_start = 0;
    let mut i = 0;

    while let Some(offset) = text[i..].find(|c: char| matches!(c, '*' | '`' | '[')) {
        let pos = i + offset;
        let tail = &text[pos..];

        let parsed = if tail.starts_with("**") {
            enclosed(tail, "**").map(|(inner, n)| (Span::Bold(inner), n))
        } else if tail.starts_with('*') {
            enclosed(tail, "*").map(|(inner, n)| (Span::Italic(inner), n))
        } else if tail.starts_with('`') {
            enclosed(tail, "`").map(|(inner, n)| (Span::Code(inner), n))
        } else {
            link(tail)
        };

        match parsed {
            Some((span, consumed)) => {
                if plain_start < pos {
                    spans.push(Span::Text(&text[plain_start..pos]));
                }
                spans.push(span);
                i = pos + consumed;
                plain_start = i;
            }
            // Not a marker after all; it stays in the pending plain text.
            None => i = pos + 1,
        }
    }

    if plain_start < text.len() {
        spans.push(Span::Text(&text[plain_start..]));
    }
    spans
}

/// Inner text and total length of `marker inner marker` at the start of `s`.
fn enclosed<'a>(s: &'a str, marker: &str) -> Option<(&'a str, usize)> {
    let body = &s[marker.len()..];
    let end = body.find(marker)?;
    let inner = &body[..end];
    if inner.trim().is_empty() {
        return None;
    }
    Some((inner, marker.len() * 2 + end))
}

fn link(s: &str) -> Option<(Span<'_>, usize)> {
    let close = s.find("](")?;
    let text = &s[1..close];
    let after = &s[close + 2..];
    let end = after.find(')')?;
    let url = &after[..end];
    if text.is_empty() || text.contains('[') || url.contains(char::is_whitespace) {
        return None;
    }
    Some((Span::Link { text, url }, close + 2 + end + 1))
}

// ── Rendering ────────────────────────────────────────────────────────

const BASE_SIZE: f32 = 14.0;

/// Render markdown text into an egui UI region.
pub fn render_markdown(ui: &mut egui::Ui, text: &str, base_color: egui::Color32) {
    for block in parse_blocks(text) {
        match block {
            Block::Blank => ui.add_space(6.0),
            Block::Rule => {
                ui.separator();
            }
            Block::Heading { level, text } => {
                let size = match level {
                    1 => 18.0,
                    2 => 16.0,
                    3 => 15.0,
                    _ => 14.0,
                };
                ui.add_space(4.0);
                ui.horizontal_wrapped(|ui| {
                    for span in parse_inline(text) {
                        let plain = span_text(&span);
                        ui.label(egui::RichText::new(plain).strong().size(size).color(base_color));
                    }
                });
                ui.add_space(2.0);
            }
            Block::Bullet(text) => {
                ui.horizontal_wrapped(|ui| {
                    ui.label(egui::RichText::new("  •  ").size(BASE_SIZE).color(base_color));
                    render_inline(ui, text, base_color);
                });
            }
            Block::Numbered { number, text } => {
                ui.horizontal_wrapped(|ui| {
                    ui.label(
                        egui::RichText::new(format!("  {}.  ", number))
                            .size(BASE_SIZE)
                            .color(base_color),
                    );
                    render_inline(ui, text, base_color);
                });
            }
            Block::Paragraph(text) => {
                ui.horizontal_wrapped(|ui| render_inline(ui, text, base_color));
            }
        }
    }
}

fn span_text<'a>(span: &Span<'a>) -> &'a str {
    match *span {
        Span::Text(t) | Span::Bold(t) | Span::Italic(t) | Span::Code(t) => t,
        Span::Link { text, .. } => text,
    }
}

fn render_inline(ui: &mut egui::Ui, text: &str, base_color: egui::Color32) {
    let link_color = egui::Color32::from_rgb(100, 170, 240);
    let code_bg = if base_color.r() > 128 {
        egui::Color32::from_rgb(60, 60, 70)
    } else {
        egui::Color32::from_rgb(230, 232, 236)
    };

    for span in parse_inline(text) {
        match span {
            Span::Text(t) => {
                ui.label(egui::RichText::new(t).size(BASE_SIZE).color(base_color));
            }
            Span::Bold(t) => {
                ui.label(egui::RichText::new(t).size(BASE_SIZE).strong().color(base_color));
            }
            Span::Italic(t) => {
                ui.label(egui::RichText::new(t).size(BASE_SIZE).italics().color(base_color));
            }
            Span::Code(t) => {
                egui::Frame::none()
                    .fill(code_bg)
                    .rounding(egui::Rounding::same(3.0))
                    .inner_margin(egui::Margin::symmetric(4.0, 1.0))
                    .show(ui, |ui| {
                        ui.label(
                            egui::RichText::new(t)
                                .size(BASE_SIZE)
                                .monospace()
                                .color(base_color),
                        );
                    });
            }
            Span::Link { text, url } => {
                ui.add(egui::Hyperlink::from_label_and_url(
                    egui::RichText::new(text)
                        .size(BASE_SIZE)
                        .color(link_color)
                        .underline(),
                    url,
                ))
                .on_hover_text(url);
            }
        }
    }
}
