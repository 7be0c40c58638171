//! Lightweight markdown renderer for chat bubbles.
//!
//! Handles what assistant replies actually contain: fenced code blocks
//! (shell commands above all), `#` headings, `- ` bullets and inline
//! `**bold**` / `` `code` ``. A fence that is still streaming in renders as
//! code up to the end of the text.

use eframe::egui;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block<'a> {
    Text(&'a str),
    Code { lang: &'a str, body: &'a str },
}

/// Split `text` into prose and fenced code blocks.
pub fn split_blocks(text: &str) -> Vec<Block<'_>> {
    let mut blocks = Vec::new();
    let mut rest = text;
    while let Some(open) = rest.find("```") {
        if open > 0 {
            blocks.push(Block::Text(&rest[..open]));
        }
        let after_fence = &rest[open + 3..];
        let (lang, body_start) = match after_fence.find('\n') {
            Some(nl) => (after_fence[..nl].trim(), &after_fence[nl + 1..]),
            None => (after_fence.trim(), ""),
        };
        match body_start.find("```") {
            Some(close) => {
                blocks.push(Block::Code {
                    lang,
                    body: body_start[..close].trim_end_matches('\n'),
                });
                rest = &body_start[close + 3..];
            }
            None => {
                blocks.push(Block::Code {
                    lang,
                    body: body_start,
                });
                rest = "";
            }
        }
    }
    if !rest.is_empty() {
        blocks.push(Block::Text(rest));
    }
    blocks
}

pub fn render_markdown(ui: &mut egui::Ui, text: &str, base_color: egui::Color32) {
    let code_bg = if base_color.r() > 128 {
        egui::Color32::from_rgb(40, 40, 48)
    } else {
        egui::Color32::from_rgb(230, 232, 236)
    };

    for block in split_blocks(text) {
        match block {
            Block::Text(prose) => render_prose(ui, prose, base_color, code_bg),
            Block::Code { lang, body } => render_code_block(ui, lang, body, base_color, code_bg),
        }
    }
}

fn render_code_block(
    ui: &mut egui::Ui,
    lang: &str,
    body: &str,
    base_color: egui::Color32,
    code_bg: egui::Color32,
) {
    ui.add_space(4.0);
    egui::Frame::none()
        .fill(code_bg)
        .rounding(egui::Rounding::same(6.0))
        .inner_margin(egui::Margin::same(8.0))
        .show(ui, |ui| {
            ui.horizontal(|ui| {
                if !lang.is_empty() {
                    ui.label(egui::RichText::new(lang).small().weak());
                }
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.small_button("Copy").clicked() {
                        ui.output_mut(|o| o.copied_text = body.to_string());
                    }
                });
            });
            ui.label(egui::RichText::new(body).monospace().color(base_color));
        });
    ui.add_space(4.0);
}

fn render_prose(ui: &mut egui::Ui, text: &str, base_color: egui::Color32, code_bg: egui::Color32) {
    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            ui.add_space(6.0);
            continue;
        }

        let heading = trimmed
            .strip_prefix("### ")
            .map(|r| (r, 15.0))
            .or_else(|| trimmed.strip_prefix("## ").map(|r| (r, 16.0)))
            .or_else(|| trimmed.strip_prefix("# ").map(|r| (r, 18.0)));
        if let Some((rest, size)) = heading {
            ui.add_space(4.0);
            ui.label(egui::RichText::new(rest).strong().size(size).color(base_color));
            continue;
        }

        let bullet = trimmed
            .strip_prefix("- ")
            .or_else(|| trimmed.strip_prefix("* "));
        ui.horizontal_wrapped(|ui| {
            ui.spacing_mut().item_spacing.x = 0.0;
            let content = match bullet {
                Some(rest) => {
                    ui.label(egui::RichText::new("  •  ").color(base_color));
                    rest
                }
                None => trimmed,
            };
            render_inline(ui, content, base_color, code_bg);
        });
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Span<'a> {
    Plain(&'a str),
    Bold(&'a str),
    Code(&'a str),
}

/// Inline spans of one line; unmatched markers stay literal.
fn inline_spans(text: &str) -> Vec<Span<'_>> {
    let mut spans = Vec::new();
    let mut rest = text;
    loop {
        let bold = rest.find("**");
        let code = rest.find('`');
        let (pos, marker) = match (bold, code) {
            (Some(b), Some(c)) if c < b => (c, "`"),
            (Some(b), _) => (b, "**"),
            (None, Some(c)) => (c, "`"),
            (None, None) => break,
        };
        let inner = &rest[pos + marker.len()..];
        let Some(end) = inner.find(marker) else {
            break;
        };
        if pos > 0 {
            spans.push(Span::Plain(&rest[..pos]));
        }
        let body = &inner[..end];
        spans.push(if marker == "`" { Span::Code(body) } else { Span::Bold(body) });
        rest = &inner[end + marker.len()..];
    }
    if !rest.is_empty() {
        spans.push(Span::Plain(rest));
    }
    spans
}

fn render_inline(ui: &mut egui::Ui, text: &str, base_color: egui::Color32, code_bg: egui::Color32) {
    for span in inline_spans(text) {
        match span {
            Span::Plain(s) => {
                ui.label(egui::RichText::new(s).color(base_color));
            }
            Span::Bold(s) => {
                ui.label(egui::RichText::new(s).strong().color(base_color));
            }
            Span::Code(s) => {
                ui.label(
                    egui::RichText::new(s)
                        .monospace()
                        .background_color(code_bg)
                        .color(base_color),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_prose_and_fences() {
        let blocks = split_blocks("Run:\n```bash\nls -la\n```\nDone.");
        assert_eq!(
            blocks,
            vec![
                Block::Text("Run:\n"),
                Block::Code {
                    lang: "bash",
                    body: "ls -la"
                },
                Block::Text("\nDone."),
            ]
        );
    }

    #[test]
    fn test_unclosed_fence_runs_to_end() {
        let blocks = split_blocks("```sh\nsudo apt up");
        assert_eq!(
            blocks,
            vec![Block::Code {
                lang: "sh",
                body: "sudo apt up"
            }]
        );
    }

    #[test]
    fn test_inline_spans() {
        assert_eq!(
            inline_spans("use **sudo** with `apt` and *stars"),
            vec![
                Span::Plain("use "),
                Span::Bold("sudo"),
                Span::Plain(" with "),
                Span::Code("apt"),
                Span::Plain(" and *stars"),
            ]
        );
        assert_eq!(inline_spans("a `b"), vec![Span::Plain("a `b")]);
    }
}
