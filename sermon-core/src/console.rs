//! Bounded text console.
//!
//! Keeps the tail of everything shown in the console area, trimming the
//! oldest characters once `max_chars` would be exceeded.

use crate::receiver::Frame;

/// Default console capacity in characters.
pub const DEFAULT_MAX_CHARS: usize = 10_000;

/// Console text with a character limit.
#[derive(Debug, Clone)]
pub struct ConsoleBuffer {
    text: String,
    chars: usize,
    max_chars: usize,
}

impl ConsoleBuffer {
    /// An empty console holding at most `max_chars` characters.
    pub const fn new(max_chars: usize) -> Self {
        Self { text: String::new(), chars: 0, max_chars }
    }

    /// Console line for a received frame: `timestamp \t text`.
    pub fn format_frame(frame: &Frame) -> String {
        format!("{} \t {}\n", frame.timestamp_string(), frame.text())
    }

    /// Append the console line for `frame`.
    pub fn push_frame(&mut self, frame: &Frame) {
        self.push_text(&Self::format_frame(frame));
    }

    /// Append `message`, dropping old content so the limit holds.
    pub fn push_text(&mut self, message: &str) {
        let message_chars = message.chars().count();
        if message_chars >= self.max_chars {
            let skip = message_chars - self.max_chars;
            self.text = message.chars().skip(skip).collect();
            self.chars = self.max_chars;
            return;
        }

        let keep = self.max_chars - message_chars;
        if self.chars > keep {
            let cut = self.text.char_indices().nth(self.chars - keep).map_or(self.text.len(), |(i, _)| i);
            self.text.drain(..cut);
            self.chars = keep;
        }
        self.text.push_str(message);
        self.chars += message_chars;
    }

    /// Current console text.
    pub fn contents(&self) -> &str {
        &self.text
    }

    /// Length of the console text in characters.
    pub const fn len_chars(&self) -> usize {
        self.chars
    }

    /// Empty the console.
    pub fn clear(&mut self) {
        self.text.clear();
        self.chars = 0;
    }
}

impl Default for ConsoleBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CHARS)
    }
}
