//! Single-line form used by the generation, lore and map modals.
//!
//! Tab / Shift+Tab (or Up / Down) move between fields, Left / Right cycle a
//! choice, Space flips a toggle, Enter or Ctrl+Enter submits, Esc cancels.

use crossterm::event::{KeyCode, KeyModifiers};
use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span},
};

use crate::tui::theme;
use crate::tui::widgets::input_buffer::InputBuffer;

#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Text(InputBuffer),
    Choice { options: Vec<String>, selected: usize },
    Toggle(bool),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormField {
    pub label: &'static str,
    pub kind: FieldKind,
    /// Shown in place of an empty, unfocused text value.
    pub placeholder: &'static str,
    pub visible: bool,
}

impl FormField {
    pub fn text(label: &'static str, placeholder: &'static str) -> Self {
        Self {
            label,
            kind: FieldKind::Text(InputBuffer::new()),
            placeholder,
            visible: true,
        }
    }

    pub fn choice<S: Into<String>>(label: &'static str, options: impl IntoIterator<Item = S>) -> Self {
        Self {
            label,
            kind: FieldKind::Choice {
                options: options.into_iter().map(Into::into).collect(),
                selected: 0,
            },
            placeholder: "",
            visible: true,
        }
    }

    pub fn toggle(label: &'static str, on: bool) -> Self {
        Self {
            label,
            kind: FieldKind::Toggle(on),
            placeholder: "",
            visible: true,
        }
    }
}

/// Result of feeding a key to a [`Form`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormOutcome {
    /// Key was not a form key.
    Ignored,
    Consumed,
    Submit,
    Cancel,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Form {
    fields: Vec<FormField>,
    focus: usize,
}

impl Form {
    pub fn new(fields: Vec<FormField>) -> Self {
        Self { fields, focus: 0 }
    }

    pub fn focus(&self) -> usize {
        self.focus
    }

    pub fn set_focus(&mut self, index: usize) {
        if self.fields.get(index).is_some_and(|f| f.visible) {
            self.focus = index;
        }
    }

    pub fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> FormOutcome {
        match (modifiers, code) {
            (KeyModifiers::NONE, KeyCode::Esc) => FormOutcome::Cancel,
            (_, KeyCode::Enter) => FormOutcome::Submit,
            (KeyModifiers::NONE, KeyCode::Tab | KeyCode::Down) => {
                self.step(1);
                FormOutcome::Consumed
            }
            (_, KeyCode::BackTab) | (KeyModifiers::NONE, KeyCode::Up) => {
                self.step(-1);
                FormOutcome::Consumed
            }
            _ => self.edit_focused(code, modifiers),
        }
    }

    fn edit_focused(&mut self, code: KeyCode, modifiers: KeyModifiers) -> FormOutcome {
        let Some(field) = self.fields.get_mut(self.focus) else {
            return FormOutcome::Ignored;
        };
        let handled = match &mut field.kind {
            FieldKind::Text(buf) => buf.handle_key(code, modifiers),
            FieldKind::Choice { options, selected } => match code {
                KeyCode::Right | KeyCode::Char(' ') if !options.is_empty() => {
                    *selected = (*selected + 1) % options.len();
                    true
                }
                KeyCode::Left if !options.is_empty() => {
                    *selected = (*selected + options.len() - 1) % options.len();
                    true
                }
                _ => false,
            },
            FieldKind::Toggle(on) => match code {
                KeyCode::Char(' ') | KeyCode::Left | KeyCode::Right => {
                    *on = !*on;
                    true
                }
                _ => false,
            },
        };
        if handled {
            FormOutcome::Consumed
        } else {
            FormOutcome::Ignored
        }
    }

    /// Move focus by `delta`, skipping hidden fields.
    fn step(&mut self, delta: isize) {
        let len = self.fields.len() as isize;
        if len == 0 {
            return;
        }
        let mut index = self.focus as isize;
        for _ in 0..len {
            index = (index + delta).rem_euclid(len);
            if self.fields[index as usize].visible {
                self.focus = index as usize;
                return;
            }
        }
    }

    // ── Accessors ──────────────────────────────────────────────────────────

    /// Trimmed text of a text field, or the selected option of a choice.
    pub fn value(&self, index: usize) -> &str {
        match self.fields.get(index).map(|f| &f.kind) {
            Some(FieldKind::Text(buf)) => buf.text().trim(),
            Some(FieldKind::Choice { options, selected }) => {
                options.get(*selected).map(String::as_str).unwrap_or("")
            }
            _ => "",
        }
    }

    pub fn selected_index(&self, index: usize) -> usize {
        match self.fields.get(index).map(|f| &f.kind) {
            Some(FieldKind::Choice { selected, .. }) => *selected,
            _ => 0,
        }
    }

    pub fn toggled(&self, index: usize) -> bool {
        matches!(self.fields.get(index).map(|f| &f.kind), Some(FieldKind::Toggle(true)))
    }

    pub fn set_text(&mut self, index: usize, text: &str) {
        if let Some(FieldKind::Text(buf)) = self.fields.get_mut(index).map(|f| &mut f.kind) {
            buf.set_text(text);
        }
    }

    /// Select `value` in a choice field; unknown values leave it unchanged.
    pub fn select(&mut self, index: usize, value: &str) {
        if let Some(FieldKind::Choice { options, selected }) =
            self.fields.get_mut(index).map(|f| &mut f.kind)
        {
            if let Some(pos) = options.iter().position(|o| o == value) {
                *selected = pos;
            }
        }
    }

    pub fn set_options(&mut self, index: usize, new_options: Vec<String>) {
        if let Some(FieldKind::Choice { options, selected }) =
            self.fields.get_mut(index).map(|f| &mut f.kind)
        {
            *options = new_options;
            *selected = (*selected).min(options.len().saturating_sub(1));
        }
    }

    pub fn set_visible(&mut self, index: usize, visible: bool) {
        if let Some(field) = self.fields.get_mut(index) {
            field.visible = visible;
        }
        if !visible && self.focus == index {
            self.step(-1);
        }
    }

    // ── Rendering ──────────────────────────────────────────────────────────

    pub fn lines(&self) -> Vec<Line<'static>> {
        let label_width = self
            .fields
            .iter()
            .map(|f| f.label.len() + 1)
            .max()
            .unwrap_or(0);

        self.fields
            .iter()
            .enumerate()
            .filter(|(_, f)| f.visible)
            .map(|(i, field)| {
                let focused = i == self.focus;
                let marker = if focused { "▸" } else { " " };
                let label_style = if focused {
                    theme::highlight()
                } else {
                    theme::muted()
                };

                let (value, value_style) = match &field.kind {
                    FieldKind::Text(buf) if focused => (buf.with_cursor(), Style::default().fg(theme::TEXT)),
                    FieldKind::Text(buf) if buf.is_empty() => (field.placeholder.to_string(), theme::dim()),
                    FieldKind::Text(buf) => (buf.text().to_string(), Style::default()),
                    FieldKind::Choice { options, selected } => {
                        let current = options.get(*selected).cloned().unwrap_or_default();
                        let style = if focused {
                            Style::default().fg(theme::TEXT).add_modifier(Modifier::BOLD)
                        } else {
                            Style::default()
                        };
                        (format!("◂ {current} ▸"), style)
                    }
                    FieldKind::Toggle(on) => {
                        let mark = if *on { "[x]" } else { "[ ]" };
                        (mark.to_string(), Style::default())
                    }
                };

                Line::from(vec![
                    Span::raw(format!("  {marker} ")),
                    Span::styled(
                        format!("{:<width$} ", format!("{}:", field.label), width = label_width),
                        label_style,
                    ),
                    Span::styled(value, value_style),
                ])
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Form {
        Form::new(vec![
            FormField::text("Name", "(required)"),
            FormField::choice("Style", ["fantasy", "dungeon"]),
            FormField::toggle("Grid", true),
        ])
    }

    fn type_str(form: &mut Form, s: &str) {
        for c in s.chars() {
            form.handle_key(KeyCode::Char(c), KeyModifiers::NONE);
        }
    }

    #[test]
    fn test_typing_fills_focused_text() {
        let mut form = sample();
        type_str(&mut form, "  Bob ");
        assert_eq!(form.value(0), "Bob");
    }

    #[test]
    fn test_tab_cycles_and_wraps() {
        let mut form = sample();
        form.handle_key(KeyCode::Tab, KeyModifiers::NONE);
        assert_eq!(form.focus(), 1);
        form.handle_key(KeyCode::Tab, KeyModifiers::NONE);
        form.handle_key(KeyCode::Tab, KeyModifiers::NONE);
        assert_eq!(form.focus(), 0);
        form.handle_key(KeyCode::BackTab, KeyModifiers::SHIFT);
        assert_eq!(form.focus(), 2);
    }

    #[test]
    fn test_choice_cycles() {
        let mut form = sample();
        form.set_focus(1);
        assert_eq!(form.value(1), "fantasy");
        form.handle_key(KeyCode::Right, KeyModifiers::NONE);
        assert_eq!(form.value(1), "dungeon");
        form.handle_key(KeyCode::Right, KeyModifiers::NONE);
        assert_eq!(form.value(1), "fantasy");
        form.handle_key(KeyCode::Left, KeyModifiers::NONE);
        assert_eq!(form.selected_index(1), 1);
    }

    #[test]
    fn test_toggle_flips() {
        let mut form = sample();
        form.set_focus(2);
        assert!(form.toggled(2));
        form.handle_key(KeyCode::Char(' '), KeyModifiers::NONE);
        assert!(!form.toggled(2));
    }

    #[test]
    fn test_hidden_fields_are_skipped() {
        let mut form = sample();
        form.set_visible(1, false);
        form.handle_key(KeyCode::Tab, KeyModifiers::NONE);
        assert_eq!(form.focus(), 2);
        assert_eq!(form.lines().len(), 2);
    }

    #[test]
    fn test_submit_and_cancel() {
        let mut form = sample();
        assert_eq!(form.handle_key(KeyCode::Enter, KeyModifiers::NONE), FormOutcome::Submit);
        assert_eq!(form.handle_key(KeyCode::Enter, KeyModifiers::CONTROL), FormOutcome::Submit);
        assert_eq!(form.handle_key(KeyCode::Esc, KeyModifiers::NONE), FormOutcome::Cancel);
        assert_eq!(form.handle_key(KeyCode::F(2), KeyModifiers::NONE), FormOutcome::Ignored);
    }

    #[test]
    fn test_set_options_clamps_selection() {
        let mut form = sample();
        form.select(1, "dungeon");
        form.set_options(1, vec!["(none)".into()]);
        assert_eq!(form.value(1), "(none)");
    }
}
