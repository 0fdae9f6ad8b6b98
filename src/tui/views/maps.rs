//! Battle map view: describe a map, generate it, keep the PNG.

use std::path::{Path, PathBuf};

use base64::Engine;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
    Frame,
};
use thiserror::Error;
use tokio::sync::mpsc;

use super::{error_line, key_hints};
use crate::core::api::{MapRequest, MapResult, MAP_STYLES};
use crate::tui::services::Services;
use crate::tui::theme;
use crate::tui::widgets::form::{Form, FormField, FormOutcome};

pub const MAX_GRID: u32 = 100;
const DEFAULT_GRID: &str = "20";

const F_DESCRIPTION: usize = 0;
const F_ROWS: usize = 1;
const F_COLUMNS: usize = 2;
const F_STYLE: usize = 3;
const F_GRID: usize = 4;

#[derive(Debug, Error)]
pub enum MapSaveError {
    #[error("invalid image data: {0}")]
    Decode(#[from] base64::DecodeError),
    #[error("could not write map: {0}")]
    Io(#[from] std::io::Error),
}

/// Decode the PNG and write it to `<dir>/<timestamp>.png`.
pub async fn save_map_image(dir: &Path, image_base64: &str) -> Result<PathBuf, MapSaveError> {
    let bytes = base64::engine::general_purpose::STANDARD.decode(image_base64.trim())?;
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(format!("{}.png", chrono::Local::now().format("%Y%m%d_%H%M%S%.3f")));
    tokio::fs::write(&path, bytes).await?;
    Ok(path)
}

enum MapDataEvent {
    Generated { result: MapResult, saved: Option<Result<PathBuf, String>> },
    Failed(String),
}

pub struct MapViewState {
    form: Form,
    editing: bool,
    pending: bool,
    result: Option<MapResult>,
    saved_to: Option<PathBuf>,
    error: Option<String>,
    data_tx: mpsc::UnboundedSender<MapDataEvent>,
    data_rx: mpsc::UnboundedReceiver<MapDataEvent>,
}

fn map_form() -> Form {
    let mut form = Form::new(vec![
        FormField::text("Description", "(required) e.g. a ruined temple in a swamp"),
        FormField::text("Rows", DEFAULT_GRID),
        FormField::text("Columns", DEFAULT_GRID),
        FormField::choice("Style", MAP_STYLES),
        FormField::toggle("Show grid", true),
    ]);
    form.set_text(F_ROWS, DEFAULT_GRID);
    form.set_text(F_COLUMNS, DEFAULT_GRID);
    form
}

fn parse_grid(label: &str, raw: &str) -> Result<u32, String> {
    match raw.parse::<u32>() {
        Ok(n) if (1..=MAX_GRID).contains(&n) => Ok(n),
        _ => Err(format!("{label} must be between 1 and {MAX_GRID}")),
    }
}

impl MapViewState {
    pub fn new() -> Self {
        let (data_tx, data_rx) = mpsc::unbounded_channel();
        Self {
            form: map_form(),
            editing: false,
            pending: false,
            result: None,
            saved_to: None,
            error: None,
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
            match event {
                MapDataEvent::Generated { result, saved } => {
                    self.error = None;
                    self.saved_to = None;
                    match saved {
                        Some(Ok(path)) => self.saved_to = Some(path),
                        Some(Err(msg)) => self.error = Some(msg),
                        None => {}
                    }
                    self.result = Some(result);
                }
                MapDataEvent::Failed(msg) => self.error = Some(msg),
            }
        }
    }

    fn request_from_form(&self) -> Result<MapRequest, String> {
        let description = self.form.value(F_DESCRIPTION);
        if description.is_empty() {
            return Err("Please describe the map you want to generate".to_string());
        }
        Ok(MapRequest {
            description: description.to_string(),
            rows: parse_grid("Rows", self.form.value(F_ROWS))?,
            columns: parse_grid("Columns", self.form.value(F_COLUMNS))?,
            style: self.form.value(F_STYLE).to_string(),
            show_grid: self.form.toggled(F_GRID),
        })
    }

    // ── Input handling ─────────────────────────────────────────────────────

    pub fn handle_input(&mut self, event: &Event, services: &Services) -> bool {
        let Event::Key(KeyEvent { code, modifiers, kind: KeyEventKind::Press, .. }) = event else {
            return false;
        };

        if self.editing {
            match self.form.handle_key(*code, *modifiers) {
                FormOutcome::Cancel => self.editing = false,
                FormOutcome::Submit => self.generate(services),
                FormOutcome::Consumed | FormOutcome::Ignored => {}
            }
            return true;
        }

        match (*modifiers, *code) {
            (KeyModifiers::NONE, KeyCode::Char('e') | KeyCode::Char('i') | KeyCode::Enter) => {
                self.editing = true;
                true
            }
            (KeyModifiers::NONE, KeyCode::Char('g')) => {
                self.generate(services);
                true
            }
            _ => false,
        }
    }

    fn generate(&mut self, services: &Services) {
        let request = match self.request_from_form() {
            Ok(request) => request,
            Err(msg) => {
                self.error = Some(msg);
                return;
            }
        };
        if self.pending {
            return;
        }
        self.editing = false;
        self.pending = true;
        self.error = None;

        let api = services.api.clone();
        let maps_dir = services.maps_dir.clone();
        let notifier = services.notifier.clone();
        let tx = self.data_tx.clone();
        tokio::spawn(async move {
            let result = match api.generate_map(&request).await {
                Ok(result) => result,
                Err(e) => {
                    let _ = tx.send(MapDataEvent::Failed(format!("Error: {e}")));
                    return;
                }
            };
            let saved = match result.image_base64.as_deref() {
                Some(image) => Some(match save_map_image(&maps_dir, image).await {
                    Ok(path) => {
                        tracing::info!(path = %path.display(), "saved battle map");
                        notifier.success(format!("Map saved to {}", path.display()));
                        Ok(path)
                    }
                    Err(e) => Err(e.to_string()),
                }),
                None => None,
            };
            let _ = tx.send(MapDataEvent::Generated { result, saved });
        });
    }

    // ── Rendering ──────────────────────────────────────────────────────────

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::vertical([Constraint::Length(9), Constraint::Min(1)]).split(area);

        let form_block = theme::block("Battle Map", self.editing);
        let form_inner = form_block.inner(chunks[0]);
        frame.render_widget(form_block, chunks[0]);
        let mut form_lines = self.form.lines();
        form_lines.push(Line::raw(""));
        form_lines.push(if self.editing {
            key_hints(&[("Tab", "field"), ("←/→", "choose"), ("Enter", "generate"), ("Esc", "done")])
        } else {
            key_hints(&[("e", "edit"), ("g", "generate")])
        });
        frame.render_widget(Paragraph::new(form_lines), form_inner);

        let result_block = theme::block_default("Result");
        let inner = result_block.inner(chunks[1]);
        frame.render_widget(result_block, chunks[1]);

        let mut lines: Vec<Line<'static>> = Vec::new();
        if self.pending {
            lines.push(Line::styled("  Generating your battle map...", Style::default().fg(theme::PRIMARY_LIGHT)));
            lines.push(Line::styled("  This may take 30-60 seconds.", theme::muted()));
        } else if let Some(result) = &self.result {
            lines.push(Line::styled("  Generated Battle Map", theme::title()));
            lines.push(Line::raw(""));
            lines.push(Line::raw(format!("  {}", result.summary())));
            if let Some(url) = &result.image_url {
                lines.push(Line::from(vec![
                    Span::styled("  URL: ", theme::muted()),
                    Span::styled(url.clone(), Style::default().fg(theme::INFO)),
                ]));
            }
            if let Some(path) = &self.saved_to {
                lines.push(Line::from(vec![
                    Span::styled("  Saved: ", theme::muted()),
                    Span::raw(path.display().to_string()),
                ]));
            }
        }
        if let Some(err) = &self.error {
            lines.push(error_line(err));
        }
        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
    }
}

impl Default for MapViewState {
    fn default() -> Self {
        Self::new()
    }
}
