//! Single-line text field backed by tui-input.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tui_input::{Input, InputRequest};

#[derive(Debug, Default, Clone)]
pub struct TextInput {
    input: Input,
    char_limit: usize,
    masked: bool,
}

impl TextInput {
    pub fn new(char_limit: usize) -> Self {
        Self { input: Input::default(), char_limit, masked: false }
    }

    /// Renders as bullets, for secrets.
    pub fn masked(char_limit: usize) -> Self {
        Self { masked: true, ..Self::new(char_limit) }
    }

    pub fn value(&self) -> &str {
        self.input.value()
    }

    pub fn reset(&mut self) {
        self.input.reset();
    }

    /// Cursor position in characters.
    pub fn cursor(&self) -> usize {
        self.input.cursor()
    }

    /// What the field shows: the value, or one bullet per character when masked.
    pub fn display_value(&self) -> String {
        if self.masked {
            "•".repeat(self.input.value().chars().count())
        } else {
            self.input.value().to_string()
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let request: Option<InputRequest> = match key.code {
            KeyCode::Char('a') if ctrl => Some(InputRequest::GoToStart),
            KeyCode::Char('e') if ctrl => Some(InputRequest::GoToEnd),
            KeyCode::Char('u') if ctrl => Some(InputRequest::DeleteLine),
            KeyCode::Char('w') if ctrl => Some(InputRequest::DeletePrevWord),
            KeyCode::Char(_) if ctrl => None,
            KeyCode::Char(c) => {
                if self.input.value().chars().count() >= self.char_limit {
                    None
                } else {
                    Some(InputRequest::InsertChar(c))
                }
            }
            KeyCode::Backspace => Some(InputRequest::DeletePrevChar),
            KeyCode::Delete => Some(InputRequest::DeleteNextChar),
            KeyCode::Left => Some(InputRequest::GoToPrevChar),
            KeyCode::Right => Some(InputRequest::GoToNextChar),
            KeyCode::Home => Some(InputRequest::GoToStart),
            KeyCode::End => Some(InputRequest::GoToEnd),
            _ => None,
        };
        if let Some(request) = request {
            self.input.handle(request);
        }
    }
}
