//! NPC view: generate NPCs, keep the latest draft, save or export it.
//!
//! Left side lists NPCs stored by the backend, right side shows the current
//! draft (or a saved NPC opened with Enter). `g` opens the generation form,
//! `s` saves the draft to lore, `x` exports it to Google Docs, `d` deletes
//! the selected saved NPC.

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
use crate::core::api::{LoreEntry, NpcGenerationParams, SavedNpc};
use crate::core::docs::ExportedDocument;
use crate::core::npc::{NpcDraft, NpcType, NPC_ROLES};
use crate::tui::services::Services;
use crate::tui::theme;
use crate::tui::widgets::form::{Form, FormField, FormOutcome};
use crate::tui::widgets::markdown::markdown_to_lines;

const NO_DRAFT: &str = "Generate an NPC first";
const NO_LINK: &str = "(none)";

// Generation form field indices.
const F_RACE: usize = 0;
const F_CLASS: usize = 1;
const F_ALIGNMENT: usize = 2;
const F_TYPE: usize = 3;
const F_ROLE: usize = 4;
const F_LEVEL: usize = 5;
const F_CR: usize = 6;
const F_LOCATION: usize = 7;
const F_FACTION: usize = 8;

// ── Internal async data events ─────────────────────────────────────────────

enum NpcDataEvent {
    Generated { seq: u64, result: Result<NpcDraft, String> },
    SavedList(Vec<SavedNpc>),
    Opened(SavedNpc),
    SavedToLore,
    Exported(ExportedDocument),
    Deleted(String),
    LoreLinks { locations: Vec<LoreEntry>, factions: Vec<LoreEntry> },
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NpcModal {
    Generate,
    Delete,
}

// ── State ──────────────────────────────────────────────────────────────────

pub struct NpcViewState {
    /// Latest generation result; save and export take a copy of it.
    draft: Option<NpcDraft>,
    /// Sequence number of the newest generation request.
    generation_seq: u64,
    generating: bool,

    saved: Vec<SavedNpc>,
    selected: usize,
    viewing: Option<SavedNpc>,

    modal: Option<NpcModal>,
    form: Form,
    locations: Vec<LoreEntry>,
    factions: Vec<LoreEntry>,

    last_export: Option<ExportedDocument>,
    busy: Option<&'static str>,
    error: Option<String>,
    scroll: u16,

    data_tx: mpsc::UnboundedSender<NpcDataEvent>,
    data_rx: mpsc::UnboundedReceiver<NpcDataEvent>,
}

fn generation_form() -> Form {
    let mut form = Form::new(vec![
        FormField::text("Race", "random"),
        FormField::text("Class", "random"),
        FormField::text("Alignment", "random"),
        FormField::choice("Type", [NpcType::Character.as_str(), NpcType::Creature.as_str()]),
        FormField::choice("Role", NPC_ROLES),
        FormField::text(NpcType::Character.power_label(), "any"),
        FormField::text(NpcType::Creature.power_label(), "any"),
        FormField::choice("Location", [NO_LINK]),
        FormField::choice("Faction", [NO_LINK]),
    ]);
    form.set_visible(F_CR, false);
    form
}

impl NpcViewState {
    pub fn new() -> Self {
        let (data_tx, data_rx) = mpsc::unbounded_channel();
        Self {
            draft: None,
            generation_seq: 0,
            generating: false,
            saved: Vec::new(),
            selected: 0,
            viewing: None,
            modal: None,
            form: generation_form(),
            locations: Vec::new(),
            factions: Vec::new(),
            last_export: None,
            busy: None,
            error: None,
            scroll: 0,
            data_tx,
            data_rx,
        }
    }

    pub fn draft(&self) -> Option<&NpcDraft> {
        self.draft.as_ref()
    }

    pub fn load(&self, services: &Services) {
        let api = services.api.clone();
        let tx = self.data_tx.clone();
        tokio::spawn(async move {
            let event = match api.list_npcs().await {
                Ok(npcs) => NpcDataEvent::SavedList(npcs),
                Err(e) => NpcDataEvent::Failed(format!("Error loading NPCs: {e}")),
            };
            let _ = tx.send(event);
        });
    }

    pub fn poll(&mut self) {
        while let Ok(event) = self.data_rx.try_recv() {
            self.apply(event);
        }
    }

    fn apply(&mut self, event: NpcDataEvent) {
        match event {
            NpcDataEvent::Generated { seq, result } => {
                if seq != self.generation_seq {
                    tracing::debug!(seq, latest = self.generation_seq, "dropping stale generation");
                    return;
                }
                self.generating = false;
                match result {
                    Ok(draft) => {
                        self.draft = Some(draft);
                        self.viewing = None;
                        self.last_export = None;
                        self.scroll = 0;
                        self.error = None;
                    }
                    Err(msg) => self.error = Some(msg),
                }
            }
            NpcDataEvent::SavedList(npcs) => {
                self.saved = npcs;
                self.selected = self.selected.min(self.saved.len().saturating_sub(1));
            }
            NpcDataEvent::Opened(npc) => {
                self.viewing = Some(npc);
                self.scroll = 0;
                self.error = None;
            }
            NpcDataEvent::SavedToLore => {
                self.busy = None;
                self.error = None;
            }
            NpcDataEvent::Exported(doc) => {
                self.busy = None;
                self.error = None;
                self.last_export = Some(doc);
            }
            NpcDataEvent::Deleted(id) => {
                self.saved.retain(|n| n.id != id);
                self.selected = self.selected.min(self.saved.len().saturating_sub(1));
                if self.viewing.as_ref().is_some_and(|n| n.id == id) {
                    self.viewing = None;
                }
            }
            NpcDataEvent::LoreLinks { locations, factions } => {
                let titles = |entries: &[LoreEntry]| {
                    std::iter::once(NO_LINK.to_string())
                        .chain(entries.iter().map(|e| e.title.clone()))
                        .collect::<Vec<_>>()
                };
                self.form.set_options(F_LOCATION, titles(&locations));
                self.form.set_options(F_FACTION, titles(&factions));
                self.locations = locations;
                self.factions = factions;
            }
            NpcDataEvent::Failed(msg) => {
                self.busy = None;
                self.error = Some(msg);
            }
        }
    }

    // ── Input handling ─────────────────────────────────────────────────────

    pub fn handle_input(&mut self, event: &Event, services: &Services) -> bool {
        let Event::Key(KeyEvent { code, modifiers, kind: KeyEventKind::Press, .. }) = event else {
            return false;
        };

        match self.modal {
            Some(NpcModal::Generate) => self.handle_form_input(*code, *modifiers, services),
            Some(NpcModal::Delete) => self.handle_delete_input(*code, services),
            None => self.handle_list_input(*code, *modifiers, services),
        }
    }

    fn handle_list_input(&mut self, code: KeyCode, modifiers: KeyModifiers, services: &Services) -> bool {
        if modifiers != KeyModifiers::NONE && modifiers != KeyModifiers::SHIFT {
            return false;
        }
        match code {
            KeyCode::Char('j') | KeyCode::Down => {
                if !self.saved.is_empty() {
                    self.selected = (self.selected + 1).min(self.saved.len() - 1);
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.selected = self.selected.saturating_sub(1);
            }
            KeyCode::PageDown => self.scroll = self.scroll.saturating_add(10),
            KeyCode::PageUp => self.scroll = self.scroll.saturating_sub(10),
            KeyCode::Enter => self.open_selected(services),
            KeyCode::Esc if self.viewing.is_some() => {
                self.viewing = None;
                self.scroll = 0;
            }
            KeyCode::Char('g') => self.open_generate_form(services),
            KeyCode::Char('s') => self.save_to_lore(services),
            KeyCode::Char('x') => self.export(services),
            KeyCode::Char('d') => {
                if !self.saved.is_empty() {
                    self.modal = Some(NpcModal::Delete);
                }
            }
            KeyCode::Char('r') => self.load(services),
            _ => return false,
        }
        true
    }

    fn handle_form_input(&mut self, code: KeyCode, modifiers: KeyModifiers, services: &Services) -> bool {
        match self.form.handle_key(code, modifiers) {
            FormOutcome::Cancel => {
                self.modal = None;
                self.error = None;
            }
            FormOutcome::Submit => self.submit_generation(services),
            FormOutcome::Consumed | FormOutcome::Ignored => self.sync_power_field(),
        }
        true
    }

    fn handle_delete_input(&mut self, code: KeyCode, services: &Services) -> bool {
        match confirm_key(code) {
            Some(true) => {
                if let Some(npc) = self.saved.get(self.selected) {
                    let id = npc.id.clone();
                    let name = npc.name();
                    let api = services.api.clone();
                    let notifier = services.notifier.clone();
                    let tx = self.data_tx.clone();
                    tokio::spawn(async move {
                        match api.delete_npc(&id).await {
                            Ok(_) => {
                                notifier.success(format!("NPC \"{name}\" deleted"));
                                let _ = tx.send(NpcDataEvent::Deleted(id));
                            }
                            Err(e) => {
                                let _ = tx.send(NpcDataEvent::Failed(format!("Error deleting NPC: {e}")));
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

    /// Level applies to characters, CR to creatures; only one is shown.
    fn sync_power_field(&mut self) {
        let creature = self.form.value(F_TYPE) == NpcType::Creature.as_str();
        self.form.set_visible(F_LEVEL, !creature);
        self.form.set_visible(F_CR, creature);
    }

    // ── Actions ────────────────────────────────────────────────────────────

    fn open_generate_form(&mut self, services: &Services) {
        self.modal = Some(NpcModal::Generate);
        self.error = None;
        self.form.set_focus(F_RACE);

        let api = services.api.clone();
        let tx = self.data_tx.clone();
        tokio::spawn(async move {
            let (locations, factions) =
                tokio::join!(api.lore_by_category("location"), api.lore_by_category("faction"));
            match (locations, factions) {
                (Ok(locations), Ok(factions)) => {
                    let _ = tx.send(NpcDataEvent::LoreLinks { locations, factions });
                }
                (Err(e), _) | (_, Err(e)) => {
                    tracing::warn!(error = %e, "could not load lore links for NPC form");
                }
            }
        });
    }

    fn params_from_form(&self) -> Result<NpcGenerationParams, String> {
        let npc_type = if self.form.value(F_TYPE) == NpcType::Creature.as_str() {
            NpcType::Creature
        } else {
            NpcType::Character
        };

        let level = match self.form.value(F_LEVEL) {
            "" => None,
            raw => Some(
                raw.parse::<u32>()
                    .map_err(|_| "Level must be a whole number".to_string())?,
            ),
        };

        let linked = |entries: &[LoreEntry], field: usize| {
            self.form
                .selected_index(field)
                .checked_sub(1)
                .and_then(|i| entries.get(i))
                .map(|e| e.id.clone())
        };

        Ok(NpcGenerationParams {
            race: self.form.value(F_RACE).to_string(),
            character_class: self.form.value(F_CLASS).to_string(),
            alignment: self.form.value(F_ALIGNMENT).to_string(),
            npc_type,
            role: self.form.value(F_ROLE).to_string(),
            level,
            cr: Some(self.form.value(F_CR).to_string()).filter(|cr| !cr.is_empty()),
            location_id: linked(&self.locations, F_LOCATION),
            faction_id: linked(&self.factions, F_FACTION),
        })
    }

    fn submit_generation(&mut self, services: &Services) {
        let params = match self.params_from_form() {
            Ok(params) => params,
            Err(msg) => {
                self.error = Some(msg);
                return;
            }
        };

        self.modal = None;
        self.error = None;
        self.generating = true;
        self.generation_seq += 1;
        let seq = self.generation_seq;

        let api = services.api.clone();
        let tx = self.data_tx.clone();
        tokio::spawn(async move {
            let result = api
                .generate_npc_enhanced(&params)
                .await
                .map_err(|e| format!("Error generating NPC: {e}"));
            let _ = tx.send(NpcDataEvent::Generated { seq, result });
        });
    }

    fn open_selected(&mut self, services: &Services) {
        let Some(npc) = self.saved.get(self.selected) else {
            return;
        };
        let id = npc.id.clone();
        let api = services.api.clone();
        let tx = self.data_tx.clone();
        tokio::spawn(async move {
            let event = match api.get_npc(&id).await {
                Ok(npc) => NpcDataEvent::Opened(npc),
                Err(e) => NpcDataEvent::Failed(format!("Error loading NPC: {e}")),
            };
            let _ = tx.send(event);
        });
    }

    fn save_to_lore(&mut self, services: &Services) {
        let Some(draft) = self.draft.clone() else {
            self.error = Some(NO_DRAFT.to_string());
            return;
        };
        self.busy = Some("Saving to lore...");

        let api = services.api.clone();
        let notifier = services.notifier.clone();
        let tx = self.data_tx.clone();
        tokio::spawn(async move {
            let name = draft.display_name();
            let event = match api.save_npc_to_lore(&draft).await {
                Ok(_) => {
                    notifier.success(format!("NPC \"{name}\" saved to campaign lore"));
                    NpcDataEvent::SavedToLore
                }
                Err(e) => NpcDataEvent::Failed(format!("Error saving to lore: {e}")),
            };
            let _ = tx.send(event);
        });
    }

    fn export(&mut self, services: &Services) {
        let Some(draft) = self.draft.clone() else {
            self.error = Some(NO_DRAFT.to_string());
            return;
        };
        let Some(exporter) = services.exporter.clone() else {
            let reason = services.exporter_error.as_deref().unwrap_or("not configured");
            self.error = Some(format!("Google Docs export unavailable: {reason}"));
            return;
        };
        self.busy = Some("Exporting to Google Docs...");

        let notifier = services.notifier.clone();
        let tx = self.data_tx.clone();
        tokio::spawn(async move {
            let event = match exporter.export(draft).await {
                Ok(doc) => {
                    notifier.success(format!("Exported \"{}\"", doc.title));
                    NpcDataEvent::Exported(doc)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "npc export failed");
                    NpcDataEvent::Failed(format!("Error saving to Google Drive: {e}"))
                }
            };
            let _ = tx.send(event);
        });
    }

    // ── Rendering ──────────────────────────────────────────────────────────

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::horizontal([Constraint::Percentage(35), Constraint::Percentage(65)]).split(area);
        self.render_list(frame, chunks[0]);
        self.render_detail(frame, chunks[1]);

        match self.modal {
            Some(NpcModal::Generate) => {
                render_form_modal(frame, area, "Generate NPC", &self.form, self.error.as_deref())
            }
            Some(NpcModal::Delete) => {
                let name = self.saved.get(self.selected).map(SavedNpc::name).unwrap_or_default();
                render_delete_modal(frame, area, "Delete NPC", &name);
            }
            None => {}
        }
    }

    fn render_list(&self, frame: &mut Frame, area: Rect) {
        let block = theme::block_default(&format!("Saved NPCs ({})", self.saved.len()));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let mut lines: Vec<Line<'static>> = vec![Line::raw("")];
        if self.saved.is_empty() {
            lines.push(Line::styled("  No saved NPCs.", theme::muted()));
        }
        let name_width = inner.width.saturating_sub(6) as usize;
        for (i, npc) in self.saved.iter().enumerate() {
            let is_selected = i == self.selected;
            let cursor = if is_selected { "▸ " } else { "  " };
            let name_style = if is_selected {
                Style::default().fg(theme::TEXT).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            let meta = [npc.race.as_deref(), npc.class.as_deref()]
                .into_iter()
                .flatten()
                .collect::<Vec<_>>()
                .join(" ");

            lines.push(Line::from(vec![
                Span::styled(cursor.to_string(), Style::default().fg(theme::ACCENT)),
                Span::styled(truncate(&npc.name(), name_width), name_style),
            ]));
            if !meta.is_empty() {
                lines.push(Line::styled(format!("    {}", truncate(&meta, name_width)), theme::muted()));
            }
        }

        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn render_detail(&self, frame: &mut Frame, area: Rect) {
        let (title, body) = match (&self.viewing, &self.draft) {
            (Some(npc), _) => (format!("{} (saved)", npc.name()), Some(npc.content.as_str())),
            (None, Some(draft)) => (draft.display_name(), Some(draft.text.as_str())),
            (None, None) => ("NPC".to_string(), None),
        };
        let block = Block::default()
            .title(format!(" {title} "))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme::NPC));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let sections = Layout::vertical([Constraint::Min(1), Constraint::Length(4)]).split(inner);

        let mut lines: Vec<Line<'static>> = Vec::new();
        if self.generating {
            lines.push(Line::styled("  Generating NPC...", Style::default().fg(theme::PRIMARY_LIGHT)));
            lines.push(Line::raw(""));
        }
        match body {
            Some(text) => {
                if let Some(npc) = &self.viewing {
                    lines.push(Line::styled(
                        format!("  Saved {}", format_timestamp(npc.created_at)),
                        theme::dim(),
                    ));
                    lines.push(Line::raw(""));
                }
                lines.extend(markdown_to_lines(text));
            }
            None if !self.generating => {
                lines.push(Line::raw(""));
                lines.push(Line::from(vec![
                    Span::styled("  No NPC yet. Press ", theme::muted()),
                    Span::styled("g", theme::highlight()),
                    Span::styled(" to generate one.", theme::muted()),
                ]));
            }
            None => {}
        }
        frame.render_widget(
            Paragraph::new(lines).wrap(Wrap { trim: false }).scroll((self.scroll, 0)),
            sections[0],
        );

        let mut footer = Vec::new();
        if let Some(doc) = &self.last_export {
            footer.push(Line::from(vec![
                Span::styled("  ✓ ", Style::default().fg(theme::SUCCESS)),
                Span::raw(doc.url.clone()),
            ]));
        }
        if let Some(busy) = self.busy {
            footer.push(Line::styled(format!("  {busy}"), Style::default().fg(theme::PRIMARY_LIGHT)));
        }
        if let Some(err) = self.error.as_deref().filter(|_| self.modal.is_none()) {
            footer.push(error_line(err));
        }
        footer.push(key_hints(&[
            ("g", "generate"),
            ("s", "save to lore"),
            ("x", "export"),
            ("Enter", "view"),
            ("d", "del"),
            ("r", "refresh"),
        ]));
        frame.render_widget(Paragraph::new(footer), sections[1]);
    }
}

impl Default for NpcViewState {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::services::test_services;

    fn draft(text: &str) -> NpcDraft {
        NpcDraft::new(text)
    }

    fn saved(id: &str, content: &str) -> SavedNpc {
        serde_json::from_value(serde_json::json!({ "id": id, "content": content })).unwrap()
    }

    fn lore(id: &str, title: &str) -> LoreEntry {
        serde_json::from_value(serde_json::json!({ "id": id, "title": title })).unwrap()
    }

    #[test]
    fn test_npc_view_new() {
        let state = NpcViewState::new();
        assert!(state.draft().is_none());
        assert!(state.saved.is_empty());
        assert!(state.modal.is_none());
        assert_eq!(state.generation_seq, 0);
    }

    #[test]
    fn test_latest_generation_wins() {
        let mut state = NpcViewState::new();
        state.generation_seq = 2;
        state.generating = true;

        state.apply(NpcDataEvent::Generated { seq: 2, result: Ok(draft("Name: Second")) });
        state.apply(NpcDataEvent::Generated { seq: 1, result: Ok(draft("Name: First")) });

        assert_eq!(state.draft().map(NpcDraft::display_name).as_deref(), Some("Second"));
        assert!(!state.generating);
    }

    #[test]
    fn test_stale_failure_is_ignored() {
        let mut state = NpcViewState::new();
        state.generation_seq = 3;
        state.apply(NpcDataEvent::Generated { seq: 2, result: Err("boom".into()) });
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn test_save_without_draft_shows_message() {
        let (services, _rx) = test_services();
        let mut state = NpcViewState::new();
        state.save_to_lore(&services);
        assert_eq!(state.error.as_deref(), Some(NO_DRAFT));
        state.error = None;
        state.export(&services);
        assert_eq!(state.error.as_deref(), Some(NO_DRAFT));
    }

    #[tokio::test]
    async fn test_export_without_config_reports_reason() {
        let (services, _rx) = test_services();
        let mut state = NpcViewState::new();
        state.draft = Some(draft("Name: Bob"));
        state.export(&services);
        let err = state.error.unwrap();
        assert!(err.starts_with("Google Docs export unavailable"), "{err}");
        assert!(state.busy.is_none());
    }

    #[test]
    fn test_power_field_follows_type() {
        let mut state = NpcViewState::new();
        state.form.set_focus(F_TYPE);
        state.form.handle_key(KeyCode::Right, KeyModifiers::NONE);
        state.sync_power_field();
        assert_eq!(state.form.value(F_TYPE), "creature");

        state.form.set_focus(F_CR);
        for c in "1/2".chars() {
            state.form.handle_key(KeyCode::Char(c), KeyModifiers::NONE);
        }
        let params = state.params_from_form().unwrap();
        assert_eq!(params.npc_type, NpcType::Creature);
        assert_eq!(params.cr.as_deref(), Some("1/2"));
        assert!(params.level.is_none());
    }

    #[test]
    fn test_level_must_be_numeric() {
        let mut state = NpcViewState::new();
        state.form.set_text(F_LEVEL, "five");
        assert!(state.params_from_form().is_err());
        state.form.set_text(F_LEVEL, "5");
        assert_eq!(state.params_from_form().unwrap().level, Some(5));
    }

    #[test]
    fn test_lore_links_map_to_ids() {
        let mut state = NpcViewState::new();
        state.apply(NpcDataEvent::LoreLinks {
            locations: vec![lore("loc-1", "Waterdeep"), lore("loc-2", "Neverwinter")],
            factions: vec![lore("fac-1", "Harpers")],
        });
        let params = state.params_from_form().unwrap();
        assert!(params.location_id.is_none());

        state.form.select(F_LOCATION, "Neverwinter");
        state.form.select(F_FACTION, "Harpers");
        let params = state.params_from_form().unwrap();
        assert_eq!(params.location_id.as_deref(), Some("loc-2"));
        assert_eq!(params.faction_id.as_deref(), Some("fac-1"));
    }

    #[test]
    fn test_deleted_npc_leaves_list() {
        let mut state = NpcViewState::new();
        state.apply(NpcDataEvent::SavedList(vec![saved("1", "Name: A"), saved("2", "Name: B")]));
        state.selected = 1;
        state.viewing = Some(saved("2", "Name: B"));
        state.apply(NpcDataEvent::Deleted("2".into()));
        assert_eq!(state.saved.len(), 1);
        assert_eq!(state.selected, 0);
        assert!(state.viewing.is_none());
    }

    #[tokio::test]
    async fn test_delete_requires_confirmation() {
        let (services, _rx) = test_services();
        let mut state = NpcViewState::new();
        state.apply(NpcDataEvent::SavedList(vec![saved("1", "Name: A")]));
        let d = Event::Key(KeyEvent::new(KeyCode::Char('d'), KeyModifiers::NONE));
        assert!(state.handle_input(&d, &services));
        assert_eq!(state.modal, Some(NpcModal::Delete));

        let n = Event::Key(KeyEvent::new(KeyCode::Char('n'), KeyModifiers::NONE));
        state.handle_input(&n, &services);
        assert!(state.modal.is_none());
        assert_eq!(state.saved.len(), 1);
    }
}
