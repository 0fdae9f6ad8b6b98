//! Chat view: free-form questions to the DM assistant.
//!
//! Normal mode scrolls the history and cycles the context type with `c`;
//! insert mode edits the message line and sends it with Enter.

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap},
    Frame,
};
use tokio::sync::mpsc;

use super::error_line;
use crate::core::api::{ChatResponse, CONTEXT_TYPES};
use crate::tui::services::Services;
use crate::tui::theme;
use crate::tui::widgets::input_buffer::InputBuffer;
use crate::tui::widgets::markdown::markdown_to_lines;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatInputMode {
    Normal,
    Insert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    User,
    Assistant,
    Error,
}

struct DisplayMessage {
    role: Role,
    rendered_lines: Vec<Line<'static>>,
}

impl DisplayMessage {
    fn new(role: Role, content: &str) -> Self {
        let rendered_lines = match role {
            Role::Error => vec![error_line(content)],
            _ => markdown_to_lines(content),
        };
        Self { role, rendered_lines }
    }

    fn all_lines(&self) -> Vec<Line<'static>> {
        let (label, color) = match self.role {
            Role::User => ("You", theme::PRIMARY_LIGHT),
            Role::Assistant => ("DM Assistant", theme::ACCENT),
            Role::Error => ("Error", theme::ERROR),
        };
        let mut out = vec![Line::from(Span::styled(
            format!("── {label} ──"),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ))];
        out.extend(self.rendered_lines.clone());
        out.push(Line::raw(""));
        out
    }
}

enum ChatDataEvent {
    Reply(ChatResponse),
    Failed(String),
}

pub struct ChatState {
    input: InputBuffer,
    input_mode: ChatInputMode,
    context: usize,
    messages: Vec<DisplayMessage>,
    pending: bool,
    scroll_offset: usize,
    auto_scroll: bool,
    data_tx: mpsc::UnboundedSender<ChatDataEvent>,
    data_rx: mpsc::UnboundedReceiver<ChatDataEvent>,
}

impl ChatState {
    pub fn new() -> Self {
        let (data_tx, data_rx) = mpsc::unbounded_channel();
        Self {
            input: InputBuffer::new(),
            input_mode: ChatInputMode::Normal,
            context: 0,
            messages: Vec::new(),
            pending: false,
            scroll_offset: 0,
            auto_scroll: true,
            data_tx,
            data_rx,
        }
    }

    pub fn input_mode(&self) -> ChatInputMode {
        self.input_mode
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn context_type(&self) -> &'static str {
        CONTEXT_TYPES[self.context % CONTEXT_TYPES.len()]
    }

    pub fn cycle_context(&mut self) {
        self.context = (self.context + 1) % CONTEXT_TYPES.len();
    }

    pub fn poll(&mut self) {
        while let Ok(event) = self.data_rx.try_recv() {
            self.pending = false;
            match event {
                ChatDataEvent::Reply(reply) => {
                    self.messages.push(DisplayMessage::new(Role::Assistant, &reply.response));
                }
                ChatDataEvent::Failed(msg) => {
                    self.messages.push(DisplayMessage::new(Role::Error, &msg));
                }
            }
            self.scroll_to_bottom();
        }
    }

    // ── Input handling ─────────────────────────────────────────────────────

    pub fn handle_input(&mut self, event: &Event, services: &Services) -> bool {
        let Event::Key(KeyEvent { code, modifiers, kind: KeyEventKind::Press, .. }) = event else {
            return false;
        };

        match self.input_mode {
            ChatInputMode::Insert => self.handle_insert_input(*code, *modifiers, services),
            ChatInputMode::Normal => self.handle_normal_input(*code, *modifiers),
        }
    }

    fn handle_insert_input(&mut self, code: KeyCode, modifiers: KeyModifiers, services: &Services) -> bool {
        match (modifiers, code) {
            (_, KeyCode::Esc) => {
                self.input_mode = ChatInputMode::Normal;
            }
            (_, KeyCode::Enter) => self.send(services),
            _ => {
                self.input.handle_key(code, modifiers);
            }
        }
        // Consume everything in insert mode so typing never triggers globals.
        true
    }

    fn handle_normal_input(&mut self, code: KeyCode, modifiers: KeyModifiers) -> bool {
        if modifiers != KeyModifiers::NONE && modifiers != KeyModifiers::SHIFT {
            return false;
        }

        match code {
            KeyCode::Char('i') | KeyCode::Char('a') | KeyCode::Enter => {
                self.input_mode = ChatInputMode::Insert;
            }
            KeyCode::Char('c') => self.cycle_context(),
            KeyCode::Char('x') => {
                self.messages.clear();
                self.scroll_to_top();
            }
            KeyCode::Char('j') | KeyCode::Down => self.scroll_down(1),
            KeyCode::Char('k') | KeyCode::Up => self.scroll_up(1),
            KeyCode::Char('G') | KeyCode::End => self.scroll_to_bottom(),
            KeyCode::Char('g') | KeyCode::Home => self.scroll_to_top(),
            KeyCode::PageDown => self.scroll_down(10),
            KeyCode::PageUp => self.scroll_up(10),
            _ => return false,
        }
        true
    }

    fn send(&mut self, services: &Services) {
        if self.pending {
            return;
        }
        let message = self.input.text().trim().to_string();
        if message.is_empty() {
            return;
        }
        self.input.clear();
        self.messages.push(DisplayMessage::new(Role::User, &message));
        self.pending = true;
        self.scroll_to_bottom();

        let api = services.api.clone();
        let context = self.context_type();
        let tx = self.data_tx.clone();
        tokio::spawn(async move {
            let event = match api.chat(&message, context).await {
                Ok(reply) => ChatDataEvent::Reply(reply),
                Err(e) => {
                    tracing::warn!(error = %e, "chat request failed");
                    ChatDataEvent::Failed(e.to_string())
                }
            };
            let _ = tx.send(event);
        });
    }

    // ── Scrolling ──────────────────────────────────────────────────────────

    fn total_content_lines(&self) -> usize {
        self.messages.iter().map(|m| m.rendered_lines.len() + 2).sum()
    }

    fn scroll_down(&mut self, n: usize) {
        self.scroll_offset = self.scroll_offset.saturating_add(n);
        self.auto_scroll = false;
    }

    fn scroll_up(&mut self, n: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(n);
        self.auto_scroll = false;
    }

    fn scroll_to_bottom(&mut self) {
        self.scroll_offset = self.total_content_lines();
        self.auto_scroll = true;
    }

    fn scroll_to_top(&mut self) {
        self.scroll_offset = 0;
        self.auto_scroll = false;
    }

    // ── Rendering ──────────────────────────────────────────────────────────

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::vertical([Constraint::Min(1), Constraint::Length(3)]).split(area);
        self.render_messages(frame, chunks[0]);
        self.render_input(frame, chunks[1]);
    }

    fn render_messages(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(theme::border_default())
            .title(format!(" Chat [{}] ", self.context_type()));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if self.messages.is_empty() {
            let welcome = Paragraph::new(vec![
                Line::raw(""),
                Line::styled("  Ask the DM Assistant anything", theme::title()),
                Line::raw(""),
                Line::styled("  Press i or Enter to start typing.", theme::muted()),
                Line::styled(
                    "  Press c to change the context (general, combat, roleplay...).",
                    theme::muted(),
                ),
            ]);
            frame.render_widget(welcome, inner);
            return;
        }

        let mut all_lines: Vec<Line> = self.messages.iter().flat_map(|m| m.all_lines()).collect();
        if self.pending {
            all_lines.push(Line::styled("  thinking...", Style::default().fg(theme::PRIMARY_LIGHT)));
        }

        let visible_height = inner.height as usize;
        let total = all_lines.len();
        let max_scroll = total.saturating_sub(visible_height);
        let effective_scroll = if self.auto_scroll {
            max_scroll
        } else {
            self.scroll_offset.min(max_scroll)
        };

        let visible: Vec<Line> = all_lines
            .into_iter()
            .skip(effective_scroll)
            .take(visible_height)
            .collect();
        frame.render_widget(Paragraph::new(visible).wrap(Wrap { trim: false }), inner);

        if total > visible_height {
            let mut scrollbar_state = ScrollbarState::new(total)
                .position(effective_scroll)
                .viewport_content_length(visible_height);
            frame.render_stateful_widget(
                Scrollbar::new(ScrollbarOrientation::VerticalRight),
                area,
                &mut scrollbar_state,
            );
        }
    }

    fn render_input(&self, frame: &mut Frame, area: Rect) {
        let (border, title) = match self.input_mode {
            ChatInputMode::Insert => (theme::ACCENT, " Message (Enter to send, Esc to exit) "),
            ChatInputMode::Normal => (theme::TEXT_MUTED, " Message "),
        };

        let line = if self.input_mode == ChatInputMode::Insert {
            Line::raw(self.input.with_cursor())
        } else if self.input.is_empty() {
            Line::styled("Type a message... (i to enter insert mode)", theme::muted())
        } else {
            Line::raw(self.input.text().to_string())
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .title(title);
        frame.render_widget(Paragraph::new(line).block(block), area);
    }
}

impl Default for ChatState {
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

    #[test]
    fn test_chat_new() {
        let state = ChatState::new();
        assert_eq!(state.input_mode(), ChatInputMode::Normal);
        assert_eq!(state.context_type(), "general");
        assert!(state.messages.is_empty());
    }

    #[test]
    fn test_context_cycles_through_all() {
        let mut state = ChatState::new();
        let mut seen = Vec::new();
        for _ in 0..CONTEXT_TYPES.len() {
            seen.push(state.context_type());
            state.cycle_context();
        }
        assert_eq!(seen, CONTEXT_TYPES);
        assert_eq!(state.context_type(), "general");
    }

    #[tokio::test]
    async fn test_insert_mode_consumes_global_keys() {
        let (services, _rx) = test_services();
        let mut state = ChatState::new();
        assert!(state.handle_input(&key(KeyCode::Char('i')), &services));
        assert!(state.handle_input(&key(KeyCode::Char('q')), &services));
        assert_eq!(state.input.text(), "q");
        assert!(state.handle_input(&key(KeyCode::Esc), &services));
        assert!(!state.handle_input(&key(KeyCode::Char('q')), &services));
    }

    #[tokio::test]
    async fn test_empty_message_is_not_sent() {
        let (services, _rx) = test_services();
        let mut state = ChatState::new();
        state.handle_input(&key(KeyCode::Enter), &services);
        state.handle_input(&key(KeyCode::Char(' ')), &services);
        state.handle_input(&key(KeyCode::Enter), &services);
        assert!(state.messages.is_empty());
        assert!(!state.is_pending());
    }

    #[test]
    fn test_poll_appends_reply_and_error() {
        let mut state = ChatState::new();
        state.pending = true;
        let _ = state.data_tx.send(ChatDataEvent::Reply(ChatResponse {
            response: "Roll initiative.".into(),
            timestamp: None,
        }));
        let _ = state.data_tx.send(ChatDataEvent::Failed("HTTP 500".into()));
        state.poll();

        assert!(!state.is_pending());
        assert_eq!(state.messages.len(), 2);
        assert_eq!(state.messages[0].role, Role::Assistant);
        assert_eq!(state.messages[1].role, Role::Error);
        assert_eq!(state.messages[1].rendered_lines[0].to_string(), "  ✗ HTTP 500");
    }
}
