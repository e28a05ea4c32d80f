// ── Simple text input with cursor ───────────────────────────────────────────

#[derive(Clone, Debug, Default)]
pub struct TextInput {
    pub value: String,
    pub cursor: usize, // byte position
}

impl TextInput {
    pub fn new() -> Self { Self::default() }

    pub fn with_value(value: impl Into<String>) -> Self {
        let value = value.into();
        let cursor = value.len();
        Self { value, cursor }
    }

    /// Replaces the whole value and parks the cursor at the end.
    pub fn set(&mut self, value: impl Into<String>) {
        self.value = value.into();
        self.cursor = self.value.len();
    }

    pub fn insert_char(&mut self, c: char) {
        self.value.insert(self.cursor, c);
        self.cursor += c.len_utf8();
    }

    pub fn insert_newline(&mut self) {
        self.insert_char('\n');
    }

    pub fn delete_char_before(&mut self) {
        if self.cursor == 0 { return; }
        let prev = self.value[..self.cursor]
            .char_indices().next_back().map(|(i, _)| i).unwrap_or(0);
        self.value.remove(prev);
        self.cursor = prev;
    }

    pub fn delete_char_after(&mut self) {
        if self.cursor >= self.value.len() { return; }
        self.value.remove(self.cursor);
    }

    pub fn move_left(&mut self) {
        if self.cursor == 0 { return; }
        self.cursor = self.value[..self.cursor]
            .char_indices().next_back().map(|(i, _)| i).unwrap_or(0);
    }

    pub fn move_right(&mut self) {
        if let Some(ch) = self.value[self.cursor..].chars().next() {
            self.cursor += ch.len_utf8();
        }
    }

    pub fn move_home(&mut self) { self.cursor = 0; }
    pub fn move_end(&mut self) { self.cursor = self.value.len(); }

    pub fn clear(&mut self) { self.value.clear(); self.cursor = 0; }

    /// Logical line index of the cursor, used to keep it scrolled into view.
    pub fn cursor_line(&self) -> u16 {
        self.value[..self.cursor].matches('\n').count() as u16
    }

    /// Same length as the value, every char replaced by a bullet.
    pub fn masked(&self) -> String {
        "•".repeat(self.value.chars().count())
    }

    /// Returns (text_before_cursor, cursor_char_or_space, text_after_cursor)
    pub fn split_at_cursor(&self) -> (&str, &str, &str) {
        let before = &self.value[..self.cursor];
        match self.value[self.cursor..].chars().next() {
            None => (before, " ", ""),
            Some(ch) => {
                let ch_end = self.cursor + ch.len_utf8();
                (before, &self.value[self.cursor..ch_end], &self.value[ch_end..])
            }
        }
    }
}

// ── TextInput key handler ─────────────────────────────────────────────────────

/// Applies an editing key. Returns true if the value changed.
pub fn handle_text_input_key(input: &mut TextInput, key: crossterm::event::KeyEvent, multiline: bool) -> bool {
    use crossterm::event::{KeyCode, KeyModifiers};
    let before = input.value.len();
    match key.code {
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => input.insert_char(c),
        KeyCode::Backspace => input.delete_char_before(),
        KeyCode::Delete => input.delete_char_after(),
        KeyCode::Left => input.move_left(),
        KeyCode::Right => input.move_right(),
        KeyCode::Home => input.move_home(),
        KeyCode::End => input.move_end(),
        KeyCode::Enter if multiline => input.insert_newline(),
        _ => {}
    }
    input.value.len() != before
}
