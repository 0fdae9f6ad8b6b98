//! Markdown → ratatui Lines renderer.
//!
//! Generated NPCs, chat answers and lore entries are loosely formatted
//! markdown. Source line breaks are kept because the generator relies on
//! them for `Label: value` lines.

use pulldown_cmark::{Event, Parser, Tag, TagEnd};
use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span},
};

use crate::tui::theme;

/// Convert markdown text to ratatui Lines.
pub fn markdown_to_lines(md: &str) -> Vec<Line<'static>> {
    let parser = Parser::new(md);
    let mut lines: Vec<Line<'static>> = Vec::new();

    let mut current_spans: Vec<Span<'static>> = Vec::new();
    let mut style_stack: Vec<Style> = vec![Style::default()];

    let mut in_code_block = false;
    let mut list_depth: usize = 0;
    let mut in_heading = false;

    for event in parser {
        match event {
            // ── Headings ─────────────────────────────────────────
            Event::Start(Tag::Heading { level, .. }) => {
                flush_line(&mut current_spans, &mut lines);
                let style = match level {
                    pulldown_cmark::HeadingLevel::H1 => theme::title(),
                    pulldown_cmark::HeadingLevel::H2 => {
                        Style::default().fg(theme::PRIMARY_LIGHT).add_modifier(Modifier::BOLD)
                    }
                    _ => Style::default().fg(theme::NPC).add_modifier(Modifier::BOLD),
                };
                style_stack.push(style);
                in_heading = true;
            }
            Event::End(TagEnd::Heading(_)) => {
                style_stack.pop();
                flush_line(&mut current_spans, &mut lines);
                in_heading = false;
            }

            // ── Bold / Italic ────────────────────────────────────
            Event::Start(Tag::Strong) => {
                let base = current_style(&style_stack);
                style_stack.push(base.add_modifier(Modifier::BOLD));
            }
            Event::Start(Tag::Emphasis) => {
                let base = current_style(&style_stack);
                style_stack.push(base.add_modifier(Modifier::ITALIC));
            }
            Event::End(TagEnd::Strong | TagEnd::Emphasis | TagEnd::Link) => {
                style_stack.pop();
            }

            Event::Code(code) => {
                current_spans.push(Span::styled(
                    code.to_string(),
                    Style::default().fg(theme::TEXT).bg(theme::BG_SURFACE),
                ));
            }

            // ── Code blocks: plain, on a surface background ─────
            Event::Start(Tag::CodeBlock(_)) => {
                flush_line(&mut current_spans, &mut lines);
                in_code_block = true;
            }
            Event::End(TagEnd::CodeBlock) => {
                in_code_block = false;
            }

            // ── Lists ────────────────────────────────────────────
            Event::Start(Tag::List(_)) => {
                flush_line(&mut current_spans, &mut lines);
                list_depth += 1;
            }
            Event::End(TagEnd::List(_)) => {
                list_depth = list_depth.saturating_sub(1);
                if list_depth == 0 {
                    lines.push(Line::raw(""));
                }
            }
            Event::Start(Tag::Item) => {
                flush_line(&mut current_spans, &mut lines);
                let indent = "  ".repeat(list_depth.saturating_sub(1));
                current_spans.push(Span::styled(
                    format!("{indent}• "),
                    Style::default().fg(theme::PRIMARY_LIGHT),
                ));
            }
            Event::End(TagEnd::Item) => {
                flush_line(&mut current_spans, &mut lines);
            }

            Event::Start(Tag::Link { .. }) => {
                style_stack.push(
                    Style::default()
                        .fg(theme::INFO)
                        .add_modifier(Modifier::UNDERLINED),
                );
            }

            // ── Paragraphs ───────────────────────────────────────
            Event::End(TagEnd::Paragraph) => {
                flush_line(&mut current_spans, &mut lines);
                if !in_heading && list_depth == 0 {
                    lines.push(Line::raw(""));
                }
            }

            Event::Text(text) => {
                if in_code_block {
                    for code_line in text.lines() {
                        lines.push(Line::styled(
                            code_line.to_string(),
                            Style::default().fg(theme::TEXT).bg(theme::BG_SURFACE),
                        ));
                    }
                } else {
                    let style = current_style(&style_stack);
                    current_spans.push(Span::styled(text.to_string(), style));
                }
            }

            Event::SoftBreak | Event::HardBreak => {
                flush_line(&mut current_spans, &mut lines);
            }

            Event::Rule => {
                flush_line(&mut current_spans, &mut lines);
                lines.push(Line::styled("─".repeat(40), theme::dim()));
                lines.push(Line::raw(""));
            }

            _ => {}
        }
    }

    flush_line(&mut current_spans, &mut lines);

    while lines.last().is_some_and(|l| l.spans.is_empty() || l.to_string().is_empty()) {
        lines.pop();
    }

    lines
}

fn current_style(stack: &[Style]) -> Style {
    stack.last().copied().unwrap_or_default()
}

fn flush_line(spans: &mut Vec<Span<'static>>, lines: &mut Vec<Line<'static>>) {
    if !spans.is_empty() {
        lines.push(Line::from(std::mem::take(spans)));
    }
}
