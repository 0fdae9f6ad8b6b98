//! Shared text input buffer with cursor management.
//!
//! Used by the chat line, the rulebook query and every form field.

use crossterm::event::{KeyCode, KeyModifiers};

/// A simple text input buffer with cursor positioning.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputBuffer {
    content: String,
    cursor: usize,
}

impl InputBuffer {
    pub fn new() -> Self {
        Self {
            content: String::new(),
            cursor: 0,
        }
    }

    /// Replace the content and put the cursor at the end.
    pub fn set_text(&mut self, text: &str) {
        self.content = text.to_string();
        self.cursor = self.content.len();
    }

    /// Apply an editing key. Returns false for keys that are not editing
    /// keys so callers can handle them.
    pub fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> bool {
        match (modifiers, code) {
            (KeyModifiers::NONE | KeyModifiers::SHIFT, KeyCode::Char(c)) => self.insert_char(c),
            (KeyModifiers::NONE, KeyCode::Backspace) => self.backspace(),
            (KeyModifiers::NONE, KeyCode::Delete) => self.delete(),
            (KeyModifiers::NONE, KeyCode::Left) => self.move_left(),
            (KeyModifiers::NONE, KeyCode::Right) => self.move_right(),
            (KeyModifiers::NONE, KeyCode::Home) | (KeyModifiers::CONTROL, KeyCode::Char('a')) => {
                self.move_home()
            }
            (KeyModifiers::NONE, KeyCode::End) | (KeyModifiers::CONTROL, KeyCode::Char('e')) => {
                self.move_end()
            }
            (KeyModifiers::CONTROL, KeyCode::Char('u')) => self.clear(),
            _ => return false,
        }
        true
    }

    /// Content with a cursor marker inserted, for rendering a focused field.
    pub fn with_cursor(&self) -> String {
        let (before, after) = self.content.split_at(self.cursor);
        format!("{before}▎{after}")
    }

    pub fn insert_char(&mut self, c: char) {
        self.content.insert(self.cursor, c);
        self.cursor += c.len_utf8();
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            let prev = self.content[..self.cursor]
                .char_indices()
                .next_back()
                .map(|(i, _)| i)
                .unwrap_or(0);
            self.content.drain(prev..self.cursor);
            self.cursor = prev;
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.content.len() {
            let next = self.content[self.cursor..]
                .char_indices()
                .nth(1)
                .map(|(i, _)| self.cursor + i)
                .unwrap_or(self.content.len());
            self.content.drain(self.cursor..next);
        }
    }

    pub fn move_left(&mut self) {
        if self.cursor > 0 {
            self.cursor = self.content[..self.cursor]
                .char_indices()
                .next_back()
                .map(|(i, _)| i)
                .unwrap_or(0);
        }
    }

    pub fn move_right(&mut self) {
        if self.cursor < self.content.len() {
            self.cursor = self.content[self.cursor..]
                .char_indices()
                .nth(1)
                .map(|(i, _)| self.cursor + i)
                .unwrap_or(self.content.len());
        }
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.content.len();
    }

    /// Take the content out, resetting the buffer.
    pub fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.content)
    }

    pub fn clear(&mut self) {
        self.content.clear();
        self.cursor = 0;
    }

    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty()
    }

    pub fn text(&self) -> &str {
        &self.content
    }

    pub fn cursor_position(&self) -> usize {
        self.cursor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_cursor() {
        let mut buf = InputBuffer::new();
        buf.insert_char('h');
        buf.insert_char('i');
        assert_eq!(buf.text(), "hi");
        assert_eq!(buf.cursor_position(), 2);
    }

    #[test]
    fn test_backspace() {
        let mut buf = InputBuffer::new();
        buf.insert_char('a');
        buf.insert_char('b');
        buf.backspace();
        assert_eq!(buf.text(), "a");
        assert_eq!(buf.cursor_position(), 1);
    }

    #[test]
    fn test_movement() {
        let mut buf = InputBuffer::new();
        buf.insert_char('a');
        buf.insert_char('b');
        buf.insert_char('c');
        buf.move_home();
        assert_eq!(buf.cursor_position(), 0);
        buf.move_end();
        assert_eq!(buf.cursor_position(), 3);
        buf.move_left();
        assert_eq!(buf.cursor_position(), 2);
        buf.move_right();
        assert_eq!(buf.cursor_position(), 3);
    }

    #[test]
    fn test_take_resets() {
        let mut buf = InputBuffer::new();
        buf.insert_char('x');
        let text = buf.take();
        assert_eq!(text, "x");
        assert!(buf.text().is_empty());
        assert_eq!(buf.cursor_position(), 0);
    }

    #[test]
    fn test_set_text_moves_cursor_to_end() {
        let mut buf = InputBuffer::new();
        buf.set_text("héllo");
        assert_eq!(buf.cursor_position(), "héllo".len());
        buf.move_left();
        buf.insert_char('!');
        assert_eq!(buf.text(), "héll!o");
    }

    #[test]
    fn test_handle_key() {
        let mut buf = InputBuffer::new();
        assert!(buf.handle_key(KeyCode::Char('A'), KeyModifiers::SHIFT));
        assert!(buf.handle_key(KeyCode::Char('b'), KeyModifiers::NONE));
        assert!(buf.handle_key(KeyCode::Home, KeyModifiers::NONE));
        assert_eq!(buf.with_cursor(), "▎Ab");
        assert!(buf.handle_key(KeyCode::Char('u'), KeyModifiers::CONTROL));
        assert!(buf.text().is_empty());
        assert!(!buf.handle_key(KeyCode::Enter, KeyModifiers::NONE));
        assert!(!buf.handle_key(KeyCode::Tab, KeyModifiers::NONE));
    }

    #[test]
    fn test_is_empty_trims() {
        let mut buf = InputBuffer::new();
        assert!(buf.is_empty());
        buf.insert_char(' ');
        assert!(buf.is_empty()); // whitespace-only is "empty"
        buf.insert_char('a');
        assert!(!buf.is_empty());
    }
}
