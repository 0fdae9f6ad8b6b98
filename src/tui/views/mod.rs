//! One view per tab, plus helpers they share.

pub mod chat;
pub mod lore;
pub mod maps;
pub mod npcs;
pub mod rulebooks;

use chrono::{DateTime, Utc};
use crossterm::event::KeyCode;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::tui::app::centered_rect;
use crate::tui::theme;
use crate::tui::widgets::form::Form;

/// Truncate to `max` characters, marking the cut with `…`.
pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let kept: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{kept}…")
    } else {
        s.to_string()
    }
}

pub(crate) fn format_timestamp(ts: Option<DateTime<Utc>>) -> String {
    ts.map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// `✗ <message>` in the error color.
pub(crate) fn error_line(message: &str) -> Line<'static> {
    Line::from(vec![
        Span::raw("  "),
        Span::styled(format!("✗ {message}"), theme::error()),
    ])
}

pub(crate) fn key_hints(hints: &[(&str, &str)]) -> Line<'static> {
    let mut spans = vec![Span::raw("  ")];
    for (key, desc) in hints {
        spans.push(Span::styled(key.to_string(), theme::key_hint().fg(theme::TEXT_MUTED)));
        spans.push(Span::raw(format!(":{desc} ")));
    }
    Line::from(spans)
}

/// Draw a form inside a centered modal with its footer and inline error.
pub(crate) fn render_form_modal(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    form: &Form,
    error: Option<&str>,
) {
    let modal_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, modal_area);

    let block = Block::default()
        .title(format!(" {title} "))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme::ACCENT));
    let inner = block.inner(modal_area);
    frame.render_widget(block, modal_area);

    let mut lines = vec![Line::raw("")];
    lines.extend(form.lines());
    lines.push(Line::raw(""));
    lines.push(Line::from(Span::styled(
        format!("  {}", "─".repeat(inner.width.saturating_sub(4) as usize)),
        theme::muted(),
    )));
    lines.push(key_hints(&[
        ("Tab", "field"),
        ("←/→", "choose"),
        ("Enter", "submit"),
        ("Esc", "cancel"),
    ]));
    if let Some(err) = error {
        lines.push(error_line(err));
    }

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}

/// Answer to a delete confirmation: `Some(true)` for y/Enter,
/// `Some(false)` for n/Esc, `None` for anything else.
pub(crate) fn confirm_key(code: KeyCode) -> Option<bool> {
    match code {
        KeyCode::Char('y') | KeyCode::Enter => Some(true),
        KeyCode::Char('n') | KeyCode::Esc => Some(false),
        _ => None,
    }
}

/// y/Enter confirms, n/Esc cancels.
pub(crate) fn render_delete_modal(frame: &mut Frame, area: Rect, title: &str, name: &str) {
    let modal_area = centered_rect(40, 20, area);
    frame.render_widget(Clear, modal_area);

    let block = Block::default()
        .title(format!(" {title} "))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme::ERROR));
    let inner = block.inner(modal_area);
    frame.render_widget(block, modal_area);

    let lines = vec![
        Line::raw(""),
        Line::from(vec![
            Span::raw("  Delete "),
            Span::styled(
                name.to_string(),
                Style::default().fg(theme::ACCENT).add_modifier(Modifier::BOLD),
            ),
            Span::raw("?"),
        ]),
        Line::raw(""),
        Line::from(vec![
            Span::raw("  "),
            Span::styled("y/Enter", Style::default().fg(theme::SUCCESS)),
            Span::raw(" to confirm, "),
            Span::styled("n/Esc", Style::default().fg(theme::ERROR)),
            Span::raw(" to cancel"),
        ]),
    ];

    frame.render_widget(Paragraph::new(lines), inner);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_truncate_helper() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 5), "hell…");
        assert_eq!(truncate("", 5), "");
        assert_eq!(truncate("ÉlaraÉlara", 4), "Éla…");
    }

    #[test]
    fn test_format_timestamp() {
        let dt = Utc.with_ymd_and_hms(2026, 2, 24, 12, 0, 0).single();
        assert_eq!(format_timestamp(dt), "2026-02-24 12:00");
        assert_eq!(format_timestamp(None), "-");
    }

    #[test]
    fn test_error_line_prefix() {
        assert_eq!(error_line("boom").to_string(), "  ✗ boom");
    }

    #[test]
    fn test_confirm_key() {
        assert_eq!(confirm_key(KeyCode::Char('y')), Some(true));
        assert_eq!(confirm_key(KeyCode::Enter), Some(true));
        assert_eq!(confirm_key(KeyCode::Esc), Some(false));
        assert_eq!(confirm_key(KeyCode::Char('x')), None);
    }
}
