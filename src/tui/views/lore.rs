//! Campaign lore view: browse, add, edit, delete and search entries.
//!
//! Master-detail layout. `a` add, `e` edit, `d` delete, `/` search,
//! `r` reload the full list.

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use tokio::sync::mpsc;

use super::{
    confirm_key, error_line, format_timestamp, key_hints, render_delete_modal, render_form_modal,
    truncate,
};
use crate::core::api::{DmApiClient, LoreEntry, LoreInput, LORE_CATEGORIES};
use crate::tui::services::Services;
use crate::tui::theme;
use crate::tui::widgets::form::{Form, FormField, FormOutcome};
use crate::tui::widgets::markdown::markdown_to_lines;

const ANY_CATEGORY: &str = "(any)";

// Entry form.
const F_TITLE: usize = 0;
const F_CATEGORY: usize = 1;
const F_CONTENT: usize = 2;

// Search form.
const S_QUERY: usize = 0;
const S_CATEGORY: usize = 1;

enum LoreDataEvent {
    Loaded(Vec<LoreEntry>),
    SearchResults { label: String, entries: Vec<LoreEntry> },
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoreModal {
    Create,
    Edit,
    Search,
    Delete,
}

pub struct LoreViewState {
    entries: Vec<LoreEntry>,
    selected: usize,
    /// Set while the list shows search results instead of everything.
    search_label: Option<String>,

    modal: Option<LoreModal>,
    entry_form: Form,
    search_form: Form,
    editing_id: Option<String>,

    loading: bool,
    error: Option<String>,
    scroll: u16,

    data_tx: mpsc::UnboundedSender<LoreDataEvent>,
    data_rx: mpsc::UnboundedReceiver<LoreDataEvent>,
}

fn entry_form() -> Form {
    Form::new(vec![
        FormField::text("Title", "(required)"),
        FormField::choice("Category", LORE_CATEGORIES),
        FormField::text("Content", "(required)"),
    ])
}

fn search_form() -> Form {
    Form::new(vec![
        FormField::text("Query", "(empty lists everything)"),
        FormField::choice("Category", std::iter::once(ANY_CATEGORY).chain(LORE_CATEGORIES)),
    ])
}

impl LoreViewState {
    pub fn new() -> Self {
        let (data_tx, data_rx) = mpsc::unbounded_channel();
        Self {
            entries: Vec::new(),
            selected: 0,
            search_label: None,
            modal: None,
            entry_form: entry_form(),
            search_form: search_form(),
            editing_id: None,
            loading: false,
            error: None,
            scroll: 0,
            data_tx,
            data_rx,
        }
    }

    pub fn load(&mut self, services: &Services) {
        self.loading = true;
        let api = services.api.clone();
        let tx = self.data_tx.clone();
        tokio::spawn(async move { reload(&api, &tx).await });
    }

    pub fn poll(&mut self) {
        while let Ok(event) = self.data_rx.try_recv() {
            match event {
                LoreDataEvent::Loaded(entries) => self.show(entries, None),
                LoreDataEvent::SearchResults { label, entries } => self.show(entries, Some(label)),
                LoreDataEvent::Failed(msg) => {
                    self.loading = false;
                    self.error = Some(msg);
                }
            }
        }
    }

    fn show(&mut self, entries: Vec<LoreEntry>, label: Option<String>) {
        self.entries = entries;
        self.search_label = label;
        self.selected = self.selected.min(self.entries.len().saturating_sub(1));
        self.loading = false;
        self.error = None;
        self.scroll = 0;
    }

    // ── Input handling ─────────────────────────────────────────────────────

    pub fn handle_input(&mut self, event: &Event, services: &Services) -> bool {
        let Event::Key(KeyEvent { code, modifiers, kind: KeyEventKind::Press, .. }) = event else {
            return false;
        };

        match self.modal {
            Some(LoreModal::Create | LoreModal::Edit) => self.handle_entry_form(*code, *modifiers, services),
            Some(LoreModal::Search) => self.handle_search_form(*code, *modifiers, services),
            Some(LoreModal::Delete) => self.handle_delete_input(*code, services),
            None => self.handle_list_input(*code, *modifiers, services),
        }
    }

    fn handle_list_input(&mut self, code: KeyCode, modifiers: KeyModifiers, services: &Services) -> bool {
        if modifiers != KeyModifiers::NONE && modifiers != KeyModifiers::SHIFT {
            return false;
        }
        match code {
            KeyCode::Char('j') | KeyCode::Down => {
                if !self.entries.is_empty() {
                    self.selected = (self.selected + 1).min(self.entries.len() - 1);
                    self.scroll = 0;
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.selected = self.selected.saturating_sub(1);
                self.scroll = 0;
            }
            KeyCode::PageDown => self.scroll = self.scroll.saturating_add(10),
            KeyCode::PageUp => self.scroll = self.scroll.saturating_sub(10),
            KeyCode::Char('a') => self.open_create(),
            KeyCode::Char('e') => self.open_edit(),
            KeyCode::Char('d') => {
                if !self.entries.is_empty() {
                    self.modal = Some(LoreModal::Delete);
                }
            }
            KeyCode::Char('/') => {
                self.modal = Some(LoreModal::Search);
                self.error = None;
            }
            KeyCode::Char('r') => self.load(services),
            _ => return false,
        }
        true
    }

    fn handle_entry_form(&mut self, code: KeyCode, modifiers: KeyModifiers, services: &Services) -> bool {
        match self.entry_form.handle_key(code, modifiers) {
            FormOutcome::Cancel => {
                self.modal = None;
                self.error = None;
            }
            FormOutcome::Submit => self.submit_entry(services),
            FormOutcome::Consumed | FormOutcome::Ignored => {}
        }
        true
    }

    fn handle_search_form(&mut self, code: KeyCode, modifiers: KeyModifiers, services: &Services) -> bool {
        match self.search_form.handle_key(code, modifiers) {
            FormOutcome::Cancel => self.modal = None,
            FormOutcome::Submit => {
                self.modal = None;
                self.search(services);
            }
            FormOutcome::Consumed | FormOutcome::Ignored => {}
        }
        true
    }

    fn handle_delete_input(&mut self, code: KeyCode, services: &Services) -> bool {
        match confirm_key(code) {
            Some(true) => {
                if let Some(entry) = self.entries.get(self.selected) {
                    let id = entry.id.clone();
                    let api = services.api.clone();
                    let notifier = services.notifier.clone();
                    let tx = self.data_tx.clone();
                    tokio::spawn(async move {
                        match api.delete_lore(&id).await {
                            Ok(_) => {
                                notifier.success("Lore entry deleted");
                                reload(&api, &tx).await;
                            }
                            Err(e) => {
                                let _ = tx.send(LoreDataEvent::Failed(format!("Error deleting lore: {e}")));
                            }
                        }
                    });
                }
                self.modal = None;
            }
            Some(false) => self.modal = None,
            None => {}
        }
        true
    }

    // ── Form helpers ───────────────────────────────────────────────────────

    fn open_create(&mut self) {
        self.modal = Some(LoreModal::Create);
        self.editing_id = None;
        self.error = None;
        self.entry_form = entry_form();
    }

    fn open_edit(&mut self) {
        if let Some(entry) = self.entries.get(self.selected) {
            self.modal = Some(LoreModal::Edit);
            self.editing_id = Some(entry.id.clone());
            self.error = None;
            self.entry_form = entry_form();
            self.entry_form.set_text(F_TITLE, &entry.title);
            self.entry_form.select(F_CATEGORY, &entry.category);
            self.entry_form.set_text(F_CONTENT, &entry.content);
        }
    }

    /// Title and content are both required.
    fn entry_input(&self) -> Result<LoreInput, String> {
        let title = self.entry_form.value(F_TITLE);
        let content = self.entry_form.value(F_CONTENT);
        if title.is_empty() || content.is_empty() {
            return Err("Please fill in title and content".to_string());
        }
        Ok(LoreInput::new(title, content, self.entry_form.value(F_CATEGORY)))
    }

    fn submit_entry(&mut self, services: &Services) {
        let input = match self.entry_input() {
            Ok(input) => input,
            Err(msg) => {
                self.error = Some(msg);
                return;
            }
        };
        self.modal = None;
        self.error = None;

        let editing = self.editing_id.take();
        let api = services.api.clone();
        let notifier = services.notifier.clone();
        let tx = self.data_tx.clone();
        tokio::spawn(async move {
            let result = match &editing {
                Some(id) => api.update_lore(id, &input).await,
                None => api.create_lore(&input).await,
            };
            match result {
                Ok(_) => {
                    notifier.success(if editing.is_some() {
                        "Lore entry updated"
                    } else {
                        "Lore entry added"
                    });
                    reload(&api, &tx).await;
                }
                Err(e) => {
                    let _ = tx.send(LoreDataEvent::Failed(format!("Error saving lore: {e}")));
                }
            }
        });
    }

    fn search(&mut self, services: &Services) {
        let query = self.search_form.value(S_QUERY).to_string();
        let category = Some(self.search_form.value(S_CATEGORY).to_string())
            .filter(|c| c != ANY_CATEGORY);

        if query.is_empty() && category.is_none() {
            self.load(services);
            return;
        }

        self.loading = true;
        let api = services.api.clone();
        let tx = self.data_tx.clone();
        tokio::spawn(async move {
            let result = if query.is_empty() {
                api.lore_by_category(category.as_deref().unwrap_or_default()).await
            } else {
                api.search_lore(&query, category.as_deref()).await.map(|r| r.results)
            };
            let label = match (query.is_empty(), &category) {
                (false, Some(c)) => format!("\"{query}\" in {c}"),
                (false, None) => format!("\"{query}\""),
                (true, c) => c.clone().unwrap_or_default(),
            };
            let event = match result {
                Ok(entries) => LoreDataEvent::SearchResults { label, entries },
                Err(e) => LoreDataEvent::Failed(format!("Error searching lore: {e}")),
            };
            let _ = tx.send(event);
        });
    }

    // ── Rendering ──────────────────────────────────────────────────────────

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::horizontal([Constraint::Percentage(40), Constraint::Percentage(60)]).split(area);
        self.render_list(frame, chunks[0]);
        self.render_detail(frame, chunks[1]);

        match self.modal {
            Some(LoreModal::Create) => {
                render_form_modal(frame, area, "Add Lore", &self.entry_form, self.error.as_deref())
            }
            Some(LoreModal::Edit) => {
                render_form_modal(frame, area, "Edit Lore", &self.entry_form, self.error.as_deref())
            }
            Some(LoreModal::Search) => render_form_modal(frame, area, "Search Lore", &self.search_form, None),
            Some(LoreModal::Delete) => {
                let title = self.entries.get(self.selected).map(|e| e.title.as_str()).unwrap_or("?");
                render_delete_modal(frame, area, "Delete Lore", title);
            }
            None => {}
        }
    }

    fn render_list(&self, frame: &mut Frame, area: Rect) {
        let title = match &self.search_label {
            Some(label) => format!("Lore: {label} ({})", self.entries.len()),
            None => format!("Lore ({})", self.entries.len()),
        };
        let block = theme::block_default(&title);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let mut lines: Vec<Line<'static>> = vec![Line::raw("")];
        if self.loading {
            lines.push(Line::styled("  Loading...", theme::muted()));
        } else if self.entries.is_empty() {
            lines.push(Line::from(vec![
                Span::styled("  No lore entries. Press ", theme::muted()),
                Span::styled("a", theme::highlight()),
                Span::styled(" to add one.", theme::muted()),
            ]));
        }

        let width = inner.width.saturating_sub(16) as usize;
        for (i, entry) in self.entries.iter().enumerate() {
            let is_selected = i == self.selected;
            let cursor = if is_selected { "▸ " } else { "  " };
            let title_style = if is_selected {
                Style::default().fg(theme::TEXT).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            lines.push(Line::from(vec![
                Span::styled(cursor.to_string(), Style::default().fg(theme::ACCENT)),
                Span::styled(format!("{:<10} ", entry.category), Style::default().fg(theme::LORE)),
                Span::styled(truncate(&entry.title, width), title_style),
            ]));
        }

        lines.push(Line::raw(""));
        lines.push(key_hints(&[
            ("a", "add"),
            ("e", "edit"),
            ("d", "del"),
            ("/", "search"),
            ("r", "all"),
        ]));
        if let Some(err) = self.error.as_deref().filter(|_| self.modal.is_none()) {
            lines.push(error_line(err));
        }

        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn render_detail(&self, frame: &mut Frame, area: Rect) {
        let Some(entry) = self.entries.get(self.selected) else {
            frame.render_widget(theme::block_default("Entry"), area);
            return;
        };

        let block = Block::default()
            .title(format!(" {} ", entry.title))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme::LORE));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let mut lines = vec![
            Line::from(vec![
                Span::styled("  Category: ", theme::muted()),
                Span::styled(entry.category.clone(), Style::default().fg(theme::LORE)),
            ]),
            Line::from(vec![
                Span::styled("  Updated: ", theme::dim()),
                Span::styled(format_timestamp(entry.updated_at.or(entry.created_at)), theme::dim()),
            ]),
            Line::raw(""),
        ];
        lines.extend(markdown_to_lines(&entry.content));

        frame.render_widget(
            Paragraph::new(lines).wrap(Wrap { trim: false }).scroll((self.scroll, 0)),
            inner,
        );
    }
}

/// Fetch the full list and hand it to the view.
async fn reload(api: &DmApiClient, tx: &mpsc::UnboundedSender<LoreDataEvent>) {
    let event = match api.list_lore().await {
        Ok(entries) => LoreDataEvent::Loaded(entries),
        Err(e) => LoreDataEvent::Failed(format!("Error loading lore: {e}")),
    };
    let _ = tx.send(event);
}

impl Default for LoreViewState {
    fn default() -> Self {
        Self::new()
    }
}
