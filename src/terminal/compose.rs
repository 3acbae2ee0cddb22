/// Keys the demo reacts to; everything else is ignored by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Space,
    Backspace,
    /// Accept the shown suggestion.
    Tab,
    Enter,
    Interrupt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The text changed and should be republished.
    Edited,
    Unchanged,
    Finished,
    Interrupted,
}

/// Email body being typed: committed words plus the word in progress.
#[derive(Debug, Default)]
pub struct Composer {
    body: String,
    buffer: String,
    show_suggestion: bool,
}

impl Composer {
    pub fn text(&self) -> String {
        format!("{}{}", self.body, self.buffer)
    }

    /// Suggestions are offered only right after a word is completed.
    pub fn wants_suggestion(&self) -> bool {
        self.show_suggestion
    }

    /// `suggestion` must already be fresh for the current text.
    pub fn apply(&mut self, key: Key, suggestion: Option<&str>) -> Outcome {
        match key {
            Key::Char(c) => {
                self.buffer.push(c);
                self.show_suggestion = false;
                Outcome::Edited
            }
            Key::Space => {
                self.body.push_str(&self.buffer);
                self.body.push(' ');
                self.buffer.clear();
                self.show_suggestion = true;
                Outcome::Edited
            }
            Key::Backspace => {
                if self.buffer.pop().is_none() && self.body.pop().is_none() {
                    return Outcome::Unchanged;
                }
                self.show_suggestion = false;
                Outcome::Edited
            }
            Key::Tab => match suggestion.map(str::trim).filter(|s| !s.is_empty()) {
                Some(s) if self.wants_suggestion() => {
                    self.body.push_str(s);
                    self.body.push(' ');
                    self.buffer.clear();
                    self.show_suggestion = false;
                    Outcome::Edited
                }
                _ => Outcome::Unchanged,
            },
            Key::Enter => Outcome::Finished,
            Key::Interrupt => Outcome::Interrupted,
        }
    }

    pub fn render_line(&self, suggestion: Option<&str>) -> String {
        match suggestion.filter(|s| self.wants_suggestion() && !s.is_empty()) {
            Some(s) => format!("{} [SUGGESTION] {s}", self.text()),
            None => self.text(),
        }
    }

    pub fn final_body(&self) -> String {
        self.text().trim().to_string()
    }
}
