/// Single-line text editor used by the form fields.
#[derive(Default, Clone, Debug)]
pub struct LineEdit {
    pub value: String,
    pub cursor: usize,
    /// Accept digits only (amounts, years, quantities).
    pub numeric: bool,
}

impl LineEdit {
    pub fn numeric() -> Self {
        Self {
            numeric: true,
            ..Self::default()
        }
    }

    pub fn set(&mut self, s: impl Into<String>) {
        self.value = s.into();
        if self.numeric {
            self.value.retain(|c| c.is_ascii_digit());
        }
        self.cursor = self.value.chars().count();
    }
    pub fn push(&mut self, ch: char) {
        if self.numeric && !ch.is_ascii_digit() {
            return;
        }
        let at = self.byte_index();
        self.value.insert(at, ch);
        self.cursor += 1;
    }
    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let at = self.byte_index();
            self.value.remove(at);
        }
    }
    pub fn delete(&mut self) {
        if self.cursor < self.value.chars().count() {
            let at = self.byte_index();
            self.value.remove(at);
        }
    }
    pub fn left(&mut self) {
        if self.cursor > 0 { self.cursor -= 1; }
    }
    pub fn right(&mut self) {
        if self.cursor < self.value.chars().count() { self.cursor += 1; }
    }
    fn byte_index(&self) -> usize {
        self.value
            .char_indices()
            .nth(self.cursor)
            .map_or(self.value.len(), |(i, _)| i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_fields_ignore_other_characters() {
        let mut edit = LineEdit::numeric();
        for ch in "1a.5x00".chars() {
            edit.push(ch);
        }
        assert_eq!(edit.value, "1500");
    }

    #[test]
    fn editing_in_the_middle_handles_multibyte_text() {
        let mut edit = LineEdit::default();
        edit.set("Tabungan é");
        edit.left();
        edit.push('X');
        assert_eq!(edit.value, "Tabungan Xé");
        edit.backspace();
        edit.delete();
        assert_eq!(edit.value, "Tabungan ");
    }
}
