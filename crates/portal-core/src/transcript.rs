//! Append-only exchange log. The plain-text rendering is the context string
//! sent to the remote gateway, so its format is load-bearing.

use contracts::{Sender, TranscriptLine};

#[derive(Debug, Clone, Default)]
pub struct TranscriptLog {
    lines: Vec<TranscriptLine>,
}

impl TranscriptLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, sender: Sender, text: impl Into<String>) {
        self.lines.push(TranscriptLine {
            sender,
            text: text.into(),
        });
    }

    /// `"{sender}: {text}"` per line, newline-separated, in insertion order.
    pub fn as_plain_text(&self) -> String {
        self.lines
            .iter()
            .map(TranscriptLine::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Case reset only; no individual line is ever removed.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn lines(&self) -> &[TranscriptLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
