use std::io;
use std::time::Duration;

use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures::StreamExt;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Tabs},
    Frame, Terminal,
};
use tokio::sync::mpsc;

use super::events::{Action, AppEvent, Focus, Notification, NotificationLevel};
use super::layout::AppLayout;
use super::services::Services;
use super::theme;
use super::views::chat::{ChatInputMode, ChatState};
use super::views::lore::LoreViewState;
use super::views::maps::MapViewState;
use super::views::npcs::NpcViewState;
use super::views::rulebooks::RulebookViewState;

const MAX_NOTIFICATIONS: usize = 3;

/// Central application state (Elm architecture).
pub struct AppState {
    /// Whether the app is still running.
    pub running: bool,
    /// The one visible tab.
    pub focus: Focus,
    pub chat: ChatState,
    pub npcs: NpcViewState,
    pub lore: LoreViewState,
    pub rulebooks: RulebookViewState,
    pub maps: MapViewState,
    /// Active notifications (max 3 visible).
    pub notifications: Vec<Notification>,
    /// Monotonic counter for notification IDs.
    notification_counter: u64,
    /// Whether the help modal is open.
    pub show_help: bool,
    /// Receiver for notifications and actions sent from tasks.
    event_rx: mpsc::UnboundedReceiver<AppEvent>,
    services: Services,
}

impl AppState {
    pub fn new(event_rx: mpsc::UnboundedReceiver<AppEvent>, services: Services, initial: Focus) -> Self {
        Self {
            running: true,
            focus: initial,
            chat: ChatState::new(),
            npcs: NpcViewState::new(),
            lore: LoreViewState::new(),
            rulebooks: RulebookViewState::new(),
            maps: MapViewState::new(),
            notifications: Vec::new(),
            notification_counter: 0,
            show_help: false,
            event_rx,
            services,
        }
    }

    // ── Elm event loop ──────────────────────────────────────────────────

    /// Main event loop: render → select → update → loop.
    pub async fn run(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
        tick_rate: Duration,
    ) -> io::Result<()> {
        let mut tick_interval = tokio::time::interval(tick_rate);
        let mut event_stream = EventStream::new();

        self.on_focus_changed();

        while self.running {
            terminal.draw(|frame| self.render(frame))?;

            tokio::select! {
                _ = tick_interval.tick() => {
                    self.on_tick();
                }
                Some(event) = self.event_rx.recv() => {
                    self.handle_event(event);
                }
                Some(Ok(crossterm_event)) = event_stream.next() => {
                    self.handle_event(AppEvent::Input(crossterm_event));
                }
            }
        }

        Ok(())
    }

    // ── Event handling ──────────────────────────────────────────────────

    fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Input(crossterm_event) => {
                // Priority 1: Help modal
                if self.show_help {
                    if let Some(action) = self.map_help_input(&crossterm_event) {
                        self.handle_action(action);
                    }
                    return;
                }

                // Priority 2: Focused view
                if self.dispatch_view_input(&crossterm_event) {
                    return;
                }

                // Priority 3: Global keybindings
                if let Some(action) = self.map_input_to_action(crossterm_event) {
                    self.handle_action(action);
                }
            }
            AppEvent::Action(action) => self.handle_action(action),
            AppEvent::Tick => self.on_tick(),
            AppEvent::Notification(notification) => {
                self.push_notification(notification.message, notification.level);
            }
            AppEvent::Quit => self.running = false,
        }
    }

    /// Dispatch input to the visible view. Returns true if consumed.
    fn dispatch_view_input(&mut self, event: &Event) -> bool {
        match self.focus {
            Focus::Chat => self.chat.handle_input(event, &self.services),
            Focus::Npcs => self.npcs.handle_input(event, &self.services),
            Focus::Lore => self.lore.handle_input(event, &self.services),
            Focus::Rulebooks => self.rulebooks.handle_input(event, &self.services),
            Focus::Maps => self.maps.handle_input(event, &self.services),
        }
    }

    // ── Input mapping ───────────────────────────────────────────────────

    fn map_help_input(&self, event: &Event) -> Option<Action> {
        let Event::Key(KeyEvent { code, kind: KeyEventKind::Press, .. }) = event else {
            return None;
        };
        match code {
            KeyCode::Esc | KeyCode::Char('?') => Some(Action::CloseHelp),
            _ => None,
        }
    }

    fn map_input_to_action(&self, event: Event) -> Option<Action> {
        let Event::Key(KeyEvent { code, modifiers, kind: KeyEventKind::Press, .. }) = event else {
            return None;
        };

        match (modifiers, code) {
            (KeyModifiers::CONTROL, KeyCode::Char('c')) => Some(Action::Quit),
            (KeyModifiers::NONE | KeyModifiers::SHIFT, _) => match code {
                KeyCode::Char('q') => Some(Action::Quit),
                KeyCode::Char('?') => Some(Action::ShowHelp),
                KeyCode::Tab => Some(Action::TabNext),
                KeyCode::BackTab => Some(Action::TabPrev),
                KeyCode::Char(c) => c
                    .to_digit(10)
                    .and_then(|n| Focus::from_number(n as usize))
                    .map(Action::Focus),
                _ => None,
            },
            _ => None,
        }
    }

    fn handle_action(&mut self, action: Action) {
        match action {
            Action::Quit => self.running = false,
            Action::Focus(focus) => self.set_focus(focus),
            Action::TabNext => self.set_focus(self.focus.next()),
            Action::TabPrev => self.set_focus(self.focus.prev()),
            Action::ShowHelp => self.show_help = true,
            Action::CloseHelp => self.show_help = false,
        }
    }

    fn set_focus(&mut self, focus: Focus) {
        if self.focus != focus {
            tracing::debug!(from = %self.focus, to = %focus, "tab change");
            self.focus = focus;
            self.on_focus_changed();
        }
    }

    /// Refresh server-backed lists when their tab becomes visible.
    fn on_focus_changed(&mut self) {
        match self.focus {
            Focus::Npcs => self.npcs.load(&self.services),
            Focus::Lore => self.lore.load(&self.services),
            Focus::Chat | Focus::Rulebooks | Focus::Maps => {}
        }
    }

    // ── Notifications ───────────────────────────────────────────────────

    /// Push a notification (dedup by message, max 3).
    pub fn push_notification(&mut self, message: String, level: NotificationLevel) {
        if self.notifications.iter().any(|n| n.message == message) {
            return;
        }

        self.notification_counter += 1;
        let mut notification = Notification::new(message, level);
        notification.id = self.notification_counter;
        self.notifications.push(notification);

        while self.notifications.len() > MAX_NOTIFICATIONS {
            self.notifications.remove(0);
        }
    }

    /// Tick: decrement notification TTLs, dismiss expired, poll async data.
    fn on_tick(&mut self) {
        for n in &mut self.notifications {
            n.ttl_ticks = n.ttl_ticks.saturating_sub(1);
        }
        self.notifications.retain(|n| n.ttl_ticks > 0);

        self.chat.poll();
        self.npcs.poll();
        self.lore.poll();
        self.rulebooks.poll();
        self.maps.poll();
    }

    /// Whether a text field of the visible view is capturing keys.
    fn is_typing(&self) -> bool {
        match self.focus {
            Focus::Chat => self.chat.input_mode() == ChatInputMode::Insert,
            Focus::Rulebooks => self.rulebooks.is_editing(),
            Focus::Maps => self.maps.is_editing(),
            Focus::Npcs | Focus::Lore => false,
        }
    }

    // ── Rendering ───────────────────────────────────────────────────────

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();
        let layout = AppLayout::compute(area);

        if let Some(tabs_area) = layout.tabs {
            self.render_tabs(frame, tabs_area);
        }

        match self.focus {
            Focus::Chat => self.chat.render(frame, layout.main),
            Focus::Npcs => self.npcs.render(frame, layout.main),
            Focus::Lore => self.lore.render(frame, layout.main),
            Focus::Rulebooks => self.rulebooks.render(frame, layout.main),
            Focus::Maps => self.maps.render(frame, layout.main),
        }

        self.render_status_bar(frame, layout.status);
        self.render_notifications(frame, area);

        if self.show_help {
            self.render_help_modal(frame, area);
        }
    }

    fn render_tabs(&self, frame: &mut Frame, area: Rect) {
        let titles = Focus::ALL
            .iter()
            .map(|f| format!(" {} {} {} ", f.number(), f.icon(), f.label()));
        let tabs = Tabs::new(titles)
            .select(self.focus.index())
            .style(theme::muted())
            .highlight_style(theme::tab_active())
            .divider(Span::styled("│", theme::dim()))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(theme::border_default())
                    .title(Span::styled(" 🎲 DM Assistant ", theme::title())),
            );
        frame.render_widget(tabs, area);
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let busy = self.chat.is_pending();
        let backend = if busy {
            Span::styled("waiting", Style::default().fg(theme::PRIMARY_LIGHT))
        } else {
            Span::styled("ready", theme::muted())
        };

        let mode = if self.is_typing() {
            Span::styled(" INSERT ", theme::insert_badge())
        } else {
            Span::raw("")
        };

        let status = Line::from(vec![
            Span::styled(" DM ", theme::brand_badge()),
            Span::raw(" "),
            mode,
            Span::raw(" "),
            Span::styled(
                self.focus.label(),
                Style::default().fg(theme::PRIMARY_LIGHT).add_modifier(Modifier::BOLD),
            ),
            Span::raw(" │ "),
            Span::styled(self.services.api.base_url().to_string(), theme::key_hint()),
            Span::raw(" "),
            backend,
            Span::raw(" │ "),
            Span::styled("Tab", theme::key_hint()),
            Span::raw(":nav "),
            Span::styled("1-5", theme::key_hint()),
            Span::raw(":tab "),
            Span::styled("?", theme::key_hint()),
            Span::raw(":help "),
            Span::styled("q", theme::key_hint()),
            Span::raw(":quit"),
        ]);

        frame.render_widget(Paragraph::new(status), area);
    }

    fn render_notifications(&self, frame: &mut Frame, area: Rect) {
        if self.notifications.is_empty() {
            return;
        }

        let max_width = 50.min(area.width.saturating_sub(2));
        let height = (self.notifications.len() as u16).min(area.height);
        let x = area.width.saturating_sub(max_width + 1);
        let notification_area = Rect::new(x, 1.min(area.height.saturating_sub(height)), max_width, height);

        let lines: Vec<Line> = self
            .notifications
            .iter()
            .map(|n| {
                let (prefix, color) = match n.level {
                    NotificationLevel::Info => ("ℹ", theme::INFO),
                    NotificationLevel::Success => ("✓", theme::SUCCESS),
                    NotificationLevel::Warning => ("⚠", theme::WARNING),
                    NotificationLevel::Error => ("✗", theme::ERROR),
                };
                Line::from(vec![
                    Span::styled(format!(" {prefix} "), Style::default().fg(color).bold()),
                    Span::raw(n.message.as_str()),
                ])
            })
            .collect();

        frame.render_widget(Clear, notification_area);
        frame.render_widget(Paragraph::new(lines), notification_area);
    }

    fn render_help_modal(&self, frame: &mut Frame, area: Rect) {
        let modal = centered_rect(60, 80, area);

        let keybindings = [
            ("Global:", ""),
            ("q", "Quit application"),
            ("?", "Toggle this help"),
            ("Tab / Shift+Tab", "Next / previous tab"),
            ("1-5", "Jump to tab by number"),
            ("Ctrl+C", "Force quit"),
            ("", ""),
            ("Chat:", ""),
            ("i / Enter", "Type a message (Enter sends, Esc stops)"),
            ("c", "Cycle context type"),
            ("j/k  g/G", "Scroll / top / bottom"),
            ("x", "Clear history"),
            ("", ""),
            ("NPCs:", ""),
            ("g", "Generate an NPC"),
            ("s", "Save draft to campaign lore"),
            ("x", "Export draft to Google Docs"),
            ("Enter / Esc", "View saved NPC / back to draft"),
            ("d", "Delete saved NPC"),
            ("", ""),
            ("Lore:", ""),
            ("a / e / d", "Add / edit / delete entry"),
            ("/", "Search by query and category"),
            ("r", "Reload all entries"),
            ("", ""),
            ("Rulebooks:", ""),
            ("i", "Edit query"),
            ("m", "Switch search / ask"),
            ("Enter", "Run"),
            ("", ""),
            ("Maps:", ""),
            ("e", "Edit map settings"),
            ("g", "Generate map"),
            ("", ""),
            ("Forms:", ""),
            ("Tab / ←→ / Space", "Next field / choose / toggle"),
            ("Enter", "Submit"),
            ("Esc", "Cancel"),
        ];

        let mut lines = vec![
            Line::raw(""),
            Line::from(Span::styled(" Keybindings", theme::title())),
            Line::raw(""),
        ];

        for (key, desc) in &keybindings {
            if key.is_empty() {
                lines.push(Line::raw(""));
            } else if desc.is_empty() {
                lines.push(Line::from(Span::styled(format!("  {key}"), theme::title())));
            } else {
                lines.push(Line::from(vec![
                    Span::raw("  "),
                    Span::styled(format!("{:<22}", key), Style::default().fg(theme::PRIMARY_LIGHT).bold()),
                    Span::raw(*desc),
                ]));
            }
        }

        lines.push(Line::raw(""));
        lines.push(Line::from(vec![
            Span::raw("  Press "),
            Span::styled("?", Style::default().fg(theme::PRIMARY_LIGHT).bold()),
            Span::raw(" or "),
            Span::styled("Esc", Style::default().fg(theme::PRIMARY_LIGHT).bold()),
            Span::raw(" to close"),
        ]));

        let block = Block::default()
            .title(" Help ")
            .title_alignment(Alignment::Center)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme::ACCENT));

        frame.render_widget(Clear, modal);
        frame.render_widget(Paragraph::new(lines).block(block), modal);
    }
}

/// Calculate a centered rect using percentage of parent area.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::vertical([
        Constraint::Percentage((100 - percent_y) / 2),
        Constraint::Percentage(percent_y),
        Constraint::Percentage((100 - percent_y) / 2),
    ])
    .split(area);

    Layout::horizontal([
        Constraint::Percentage((100 - percent_x) / 2),
        Constraint::Percentage(percent_x),
        Constraint::Percentage((100 - percent_x) / 2),
    ])
    .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::services::test_services;

    fn app(initial: Focus) -> AppState {
        let (services, rx) = test_services();
        AppState::new(rx, services, initial)
    }

    fn key(code: KeyCode) -> AppEvent {
        AppEvent::Input(Event::Key(KeyEvent::new(code, KeyModifiers::NONE)))
    }

    #[tokio::test]
    async fn test_tab_cycling_keeps_one_tab() {
        let mut app = app(Focus::Chat);
        let mut seen = Vec::new();
        for _ in 0..Focus::ALL.len() {
            app.handle_action(Action::TabNext);
            seen.push(app.focus);
        }
        assert_eq!(app.focus, Focus::Chat);
        for f in Focus::ALL {
            assert_eq!(seen.iter().filter(|s| **s == f).count(), 1);
        }
        app.handle_action(Action::TabPrev);
        assert_eq!(app.focus, Focus::Maps);
    }

    #[tokio::test]
    async fn test_number_keys_jump() {
        let mut app = app(Focus::Chat);
        app.handle_event(key(KeyCode::Char('3')));
        assert_eq!(app.focus, Focus::Lore);
        app.handle_event(key(KeyCode::Char('5')));
        assert_eq!(app.focus, Focus::Maps);
        app.handle_event(key(KeyCode::Char('9')));
        assert_eq!(app.focus, Focus::Maps);
    }

    #[tokio::test]
    async fn test_help_modal_swallows_input() {
        let mut app = app(Focus::Rulebooks);
        app.handle_event(key(KeyCode::Char('?')));
        assert!(app.show_help);
        app.handle_event(key(KeyCode::Char('q')));
        assert!(app.running);
        app.handle_event(key(KeyCode::Esc));
        assert!(!app.show_help);
        app.handle_event(key(KeyCode::Char('q')));
        assert!(!app.running);
    }

    #[tokio::test]
    async fn test_typing_in_chat_does_not_quit() {
        let mut app = app(Focus::Chat);
        app.handle_event(key(KeyCode::Char('i')));
        app.handle_event(key(KeyCode::Char('q')));
        app.handle_event(key(KeyCode::Char('2')));
        assert!(app.running);
        assert_eq!(app.focus, Focus::Chat);
        assert!(app.is_typing());
    }

    #[tokio::test]
    async fn test_notifications_dedup_and_cap() {
        let mut app = app(Focus::Chat);
        app.push_notification("a".into(), NotificationLevel::Info);
        app.push_notification("a".into(), NotificationLevel::Info);
        assert_eq!(app.notifications.len(), 1);

        for msg in ["b", "c", "d"] {
            app.push_notification(msg.into(), NotificationLevel::Success);
        }
        assert_eq!(app.notifications.len(), MAX_NOTIFICATIONS);
        assert_eq!(app.notifications[0].message, "b");
        assert!(app.notifications.windows(2).all(|w| w[0].id < w[1].id));
    }

    #[tokio::test]
    async fn test_notifications_expire() {
        let mut app = app(Focus::Chat);
        app.push_notification("gone soon".into(), NotificationLevel::Info);
        for _ in 0..100 {
            app.on_tick();
        }
        assert!(app.notifications.is_empty());
    }

    #[test]
    fn test_centered_rect() {
        let area = Rect::new(0, 0, 100, 50);
        let centered = centered_rect(50, 50, area);
        assert!(centered.x > 0);
        assert!(centered.y > 0);
        assert!(centered.x + centered.width <= area.width);
        assert!(centered.y + centered.height <= area.height);
    }
}
