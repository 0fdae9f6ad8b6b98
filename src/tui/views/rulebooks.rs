//! Rulebook view: semantic search over the indexed rulebooks, or an
//! AI answer grounded in them.
//!
//! `i` edits the query, `m` switches between search and ask, Enter runs.

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use tokio::sync::mpsc;

use super::{error_line, key_hints};
use crate::core::api::{RulebookAnswer, RulebookPassage, RulebookSearch};
use crate::tui::services::Services;
use crate::tui::theme;
use crate::tui::widgets::input_buffer::InputBuffer;
use crate::tui::widgets::markdown::markdown_to_lines;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RulebookMode {
    Search,
    Ask,
}

impl RulebookMode {
    fn label(self) -> &'static str {
        match self {
            RulebookMode::Search => "Search",
            RulebookMode::Ask => "Ask",
        }
    }

    fn empty_query_message(self) -> &'static str {
        match self {
            RulebookMode::Search => "Please enter a search query",
            RulebookMode::Ask => "Please enter a question",
        }
    }
}

enum RulebookDataEvent {
    Searched(RulebookSearch),
    Answered(RulebookAnswer),
    Failed(String),
}

enum RulebookResult {
    Passages(RulebookSearch),
    Answer(RulebookAnswer),
}

pub struct RulebookViewState {
    input: InputBuffer,
    editing: bool,
    mode: RulebookMode,
    result: Option<RulebookResult>,
    pending: bool,
    error: Option<String>,
    scroll: u16,
    data_tx: mpsc::UnboundedSender<RulebookDataEvent>,
    data_rx: mpsc::UnboundedReceiver<RulebookDataEvent>,
}

impl RulebookViewState {
    pub fn new() -> Self {
        let (data_tx, data_rx) = mpsc::unbounded_channel();
        Self {
            input: InputBuffer::new(),
            editing: false,
            mode: RulebookMode::Search,
            result: None,
            pending: false,
            error: None,
            scroll: 0,
            data_tx,
            data_rx,
        }
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    pub fn poll(&mut self) {
        while let Ok(event) = self.data_rx.try_recv() {
            self.pending = false;
            self.scroll = 0;
            match event {
                RulebookDataEvent::Searched(search) => {
                    self.error = None;
                    self.result = Some(RulebookResult::Passages(search));
                }
                RulebookDataEvent::Answered(answer) => {
                    self.error = None;
                    self.result = Some(RulebookResult::Answer(answer));
                }
                RulebookDataEvent::Failed(msg) => self.error = Some(msg),
            }
        }
    }

    // ── Input handling ─────────────────────────────────────────────────────

    pub fn handle_input(&mut self, event: &Event, services: &Services) -> bool {
        let Event::Key(KeyEvent { code, modifiers, kind: KeyEventKind::Press, .. }) = event else {
            return false;
        };

        if self.editing {
            match code {
                KeyCode::Esc => self.editing = false,
                KeyCode::Enter => self.run(services),
                _ => {
                    self.input.handle_key(*code, *modifiers);
                }
            }
            return true;
        }

        if *modifiers != KeyModifiers::NONE && *modifiers != KeyModifiers::SHIFT {
            return false;
        }
        match code {
            KeyCode::Char('i') | KeyCode::Char('/') => self.editing = true,
            KeyCode::Enter => self.run(services),
            KeyCode::Char('m') => {
                self.mode = match self.mode {
                    RulebookMode::Search => RulebookMode::Ask,
                    RulebookMode::Ask => RulebookMode::Search,
                };
            }
            KeyCode::Char('j') | KeyCode::Down => self.scroll = self.scroll.saturating_add(1),
            KeyCode::Char('k') | KeyCode::Up => self.scroll = self.scroll.saturating_sub(1),
            KeyCode::PageDown => self.scroll = self.scroll.saturating_add(10),
            KeyCode::PageUp => self.scroll = self.scroll.saturating_sub(10),
            _ => return false,
        }
        true
    }

    fn run(&mut self, services: &Services) {
        let query = self.input.text().trim().to_string();
        if query.is_empty() {
            self.error = Some(self.mode.empty_query_message().to_string());
            return;
        }
        if self.pending {
            return;
        }
        self.pending = true;
        self.error = None;

        let api = services.api.clone();
        let n_results = services.rulebook_results;
        let mode = self.mode;
        let tx = self.data_tx.clone();
        tokio::spawn(async move {
            let event = match mode {
                RulebookMode::Search => match api.search_rulebooks(&query, n_results).await {
                    Ok(search) => RulebookDataEvent::Searched(search),
                    Err(e) => RulebookDataEvent::Failed(format!("Error searching rulebooks: {e}")),
                },
                RulebookMode::Ask => match api.chat_with_rulebooks(&query).await {
                    Ok(answer) => RulebookDataEvent::Answered(answer),
                    Err(e) => RulebookDataEvent::Failed(format!("Error asking rulebooks: {e}")),
                },
            };
            let _ = tx.send(event);
        });
    }

    // ── Rendering ──────────────────────────────────────────────────────────

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::vertical([Constraint::Length(3), Constraint::Min(1), Constraint::Length(2)]).split(area);

        let line = if self.editing {
            Line::raw(self.input.with_cursor())
        } else if self.input.is_empty() {
            Line::styled("Press i to type a query", theme::muted())
        } else {
            Line::raw(self.input.text().to_string())
        };
        let input_block = theme::block(&format!("{} rulebooks", self.mode.label()), self.editing);
        frame.render_widget(Paragraph::new(line).block(input_block), chunks[0]);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(theme::border_default())
            .title(" Results ");
        let inner = block.inner(chunks[1]);
        frame.render_widget(block, chunks[1]);

        let mut lines: Vec<Line<'static>> = Vec::new();
        if self.pending {
            lines.push(Line::styled("  Searching rulebooks...", Style::default().fg(theme::PRIMARY_LIGHT)));
        } else {
            match &self.result {
                Some(RulebookResult::Passages(search)) => {
                    lines.push(Line::styled(
                        format!("  Found {} results for \"{}\"", search.count, search.query),
                        theme::heading(),
                    ));
                    lines.push(Line::raw(""));
                    for passage in &search.results {
                        lines.extend(passage_lines(passage));
                    }
                }
                Some(RulebookResult::Answer(answer)) => {
                    lines.extend(markdown_to_lines(&answer.response));
                    if !answer.sources.is_empty() {
                        lines.push(Line::raw(""));
                        lines.push(Line::styled("  Sources", theme::heading()));
                        for source in &answer.sources {
                            lines.push(Line::styled(
                                format!("  • {} (page {})", source.source, source.page()),
                                theme::muted(),
                            ));
                        }
                    }
                }
                None => lines.push(Line::styled(
                    "  Search the rulebooks, or press m to ask a question instead.",
                    theme::muted(),
                )),
            }
        }
        frame.render_widget(
            Paragraph::new(lines).wrap(Wrap { trim: false }).scroll((self.scroll, 0)),
            inner,
        );

        let mut footer = Vec::new();
        if let Some(err) = &self.error {
            footer.push(error_line(err));
        }
        footer.push(key_hints(&[("i", "edit"), ("Enter", "run"), ("m", "search/ask"), ("j/k", "scroll")]));
        frame.render_widget(Paragraph::new(footer), chunks[2]);
    }
}

/// Source, page and similarity header followed by the passage text.
fn passage_lines(passage: &RulebookPassage) -> Vec<Line<'static>> {
    let mut header = vec![
        Span::styled(
            format!("  {}", passage.source),
            Style::default().fg(theme::ACCENT).add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!("  page {}", passage.page()), theme::muted()),
    ];
    if let Some(similarity) = passage.similarity_percent() {
        header.push(Span::styled(
            format!("  {similarity} match"),
            Style::default().fg(theme::SUCCESS),
        ));
    }

    let mut lines = vec![Line::from(header)];
    lines.extend(passage.text.lines().map(|l| Line::raw(format!("  {l}"))));
    lines.push(Line::raw(""));
    lines
}

impl Default for RulebookViewState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::services::test_services;

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[tokio::test]
    async fn test_empty_query_rejected_inline() {
        let (services, _rx) = test_services();
        let mut state = RulebookViewState::new();
        state.handle_input(&key(KeyCode::Enter), &services);
        assert_eq!(state.error.as_deref(), Some("Please enter a search query"));
        assert!(!state.pending);

        state.handle_input(&key(KeyCode::Char('m')), &services);
        state.handle_input(&key(KeyCode::Enter), &services);
        assert_eq!(state.error.as_deref(), Some("Please enter a question"));
    }

    #[tokio::test]
    async fn test_editing_captures_keys() {
        let (services, _rx) = test_services();
        let mut state = RulebookViewState::new();
        state.handle_input(&key(KeyCode::Char('i')), &services);
        assert!(state.is_editing());
        assert!(state.handle_input(&key(KeyCode::Char('q')), &services));
        assert_eq!(state.input.text(), "q");
        state.handle_input(&key(KeyCode::Esc), &services);
        assert!(!state.is_editing());
    }

    #[test]
    fn test_passage_lines_show_similarity() {
        let passage: RulebookPassage = serde_json::from_value(serde_json::json!({
            "source": "PHB",
            "page_number": 192,
            "text": "Grappling\nUse the Attack action.",
            "similarity": 0.873,
        }))
        .unwrap();
        let lines = passage_lines(&passage);
        assert_eq!(lines[0].to_string(), "  PHB  page 192  87.3% match");
        assert_eq!(lines[1].to_string(), "  Grappling");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_poll_stores_search() {
        let mut state = RulebookViewState::new();
        state.pending = true;
        let search: RulebookSearch =
            serde_json::from_value(serde_json::json!({ "query": "grapple", "results": [], "count": 0 })).unwrap();
        let _ = state.data_tx.send(RulebookDataEvent::Searched(search));
        state.poll();
        assert!(!state.pending);
        assert!(matches!(state.result, Some(RulebookResult::Passages(_))));
    }
}
