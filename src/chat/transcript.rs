//! Ordered transcript of turns for one chat session.

use uuid::Uuid;

use crate::llm::types::{Role, Turn};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TranscriptError {
    #[error("prompt is empty")]
    EmptyPrompt,
    #[error("regenerate needs at least two turns ending with an assistant reply")]
    CannotRegenerate,
}

/// One appended turn. `id` is fresh per append, so a regenerated reply is a
/// new entry even when its text repeats.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub id: Uuid,
    pub turn: Turn,
}

impl Entry {
    fn new(turn: Turn) -> Self {
        Self { id: Uuid::new_v4(), turn }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Transcript {
    entries: Vec<Entry>,
}

impl Transcript {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a user turn built from `text`.
    ///
    /// # Errors
    ///
    /// Returns [`TranscriptError::EmptyPrompt`] for blank text.
    pub fn append_user(&mut self, text: &str) -> Result<&[Entry], TranscriptError> {
        if text.trim().is_empty() {
            return Err(TranscriptError::EmptyPrompt);
        }
        self.entries.push(Entry::new(Turn::user(text)));
        Ok(&self.entries)
    }

    /// Append a provider reply as-is.
    pub fn append_assistant(&mut self, turn: Turn) -> &[Entry] {
        self.entries.push(Entry::new(turn));
        &self.entries
    }

    /// Put back an entry removed by [`Transcript::pop_last`], keeping its id.
    pub(crate) fn restore(&mut self, entry: Entry) {
        self.entries.push(entry);
    }

    pub fn pop_last(&mut self) -> Option<Entry> {
        self.entries.pop()
    }

    #[must_use]
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    #[must_use]
    pub fn last(&self) -> Option<&Entry> {
        self.entries.last()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Turns in conversation order, as sent to the relay.
    #[must_use]
    pub fn history(&self) -> Vec<Turn> {
        self.entries.iter().map(|e| e.turn.clone()).collect()
    }

    #[must_use]
    pub fn can_regenerate(&self) -> bool {
        self.entries.len() >= 2 && self.last().is_some_and(|e| e.turn.role == Role::Assistant)
    }

    /// Display text of the entry with `id`, for the copy affordance.
    #[must_use]
    pub fn copy_text(&self, id: Uuid) -> Option<String> {
        self.entries
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.turn.display_text())
    }
}
