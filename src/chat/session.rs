//! Chat session state — one transcript plus the UI flags around it.
//!
//! DESIGN
//! ======
//! A `ChatSession` is an explicit container owned by whoever drives the UI and
//! passed by `&mut` into each operation. Because `submit` and `regenerate`
//! hold that borrow across the relay call, the two can never interleave on one
//! session.
//!
//! Failure handling reconciles the optimistic update: a failed submit rolls
//! back the user turn (its text moves to `draft`), a failed regenerate puts the
//! previous reply back. Either way `error` carries one user-facing string.

use uuid::Uuid;

use super::client::{RelayCallError, RelayClient};
use super::transcript::{Entry, Transcript, TranscriptError};
use crate::services::relay::RelayMode;

pub const UNAVAILABLE_MESSAGE: &str = "Our AI service is currently unavailable. Please try again later :)";
pub const SUBMIT_FAILED_MESSAGE: &str = "Something went wrong. Please try again.";
pub const REGENERATE_FAILED_MESSAGE: &str = "Failed to regenerate response. Please try again.";

/// Result of a session operation that reached the relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The reply was appended.
    Replied,
    /// The relay call failed; `error` is set and the transcript reconciled.
    Failed,
}

#[derive(Debug)]
pub struct ChatSession {
    mode: RelayMode,
    transcript: Transcript,
    error: Option<String>,
    draft: Option<String>,
    scroll_ticks: u64,
}

impl ChatSession {
    #[must_use]
    pub fn new(mode: RelayMode) -> Self {
        Self { mode, transcript: Transcript::new(), error: None, draft: None, scroll_ticks: 0 }
    }

    #[must_use]
    pub fn mode(&self) -> RelayMode {
        self.mode
    }

    #[must_use]
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    #[must_use]
    pub fn entries(&self) -> &[Entry] {
        self.transcript.entries()
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Prompt text recovered from the last failed submit.
    #[must_use]
    pub fn draft(&self) -> Option<&str> {
        self.draft.as_deref()
    }

    /// Whether the regenerate control should be enabled. There is no busy
    /// flag: an operation in progress holds the `&mut` borrow.
    #[must_use]
    pub fn can_regenerate(&self) -> bool {
        self.transcript.can_regenerate()
    }

    /// Monotonic counter bumped on every transcript mutation; the view scrolls
    /// to the end whenever it changes.
    #[must_use]
    pub fn scroll_ticks(&self) -> u64 {
        self.scroll_ticks
    }

    #[must_use]
    pub fn copy_text(&self, id: Uuid) -> Option<String> {
        self.transcript.copy_text(id)
    }

    /// Append `text` as a user turn and ask the relay for a reply.
    ///
    /// # Errors
    ///
    /// Returns [`TranscriptError::EmptyPrompt`] for blank text; nothing is sent.
    /// Relay failures are not errors here: they yield [`Outcome::Failed`].
    pub async fn submit(&mut self, relay: &dyn RelayClient, text: &str) -> Result<Outcome, TranscriptError> {
        self.transcript.append_user(text)?;
        self.error = None;
        self.draft = None;
        self.touch();

        let result = relay.send(self.mode, &self.transcript.history()).await;

        match result {
            Ok(reply) => {
                self.transcript.append_assistant(reply);
                self.touch();
                Ok(Outcome::Replied)
            }
            Err(e) => {
                tracing::warn!(error = %e, error_code = e.error_code(), mode = ?self.mode, "submit failed");
                if let Some(rolled_back) = self.transcript.pop_last() {
                    self.draft = Some(rolled_back.turn.display_text());
                }
                self.error = Some(submit_error_message(&e).to_owned());
                self.touch();
                Ok(Outcome::Failed)
            }
        }
    }

    /// Replace the trailing assistant reply with a fresh one.
    ///
    /// # Errors
    ///
    /// Returns [`TranscriptError::CannotRegenerate`] when the transcript has
    /// fewer than two turns or does not end with an assistant turn. The
    /// transcript is untouched and no relay call is made.
    pub async fn regenerate(&mut self, relay: &dyn RelayClient) -> Result<Outcome, TranscriptError> {
        if !self.transcript.can_regenerate() {
            return Err(TranscriptError::CannotRegenerate);
        }
        let Some(previous) = self.transcript.pop_last() else {
            return Err(TranscriptError::CannotRegenerate);
        };
        self.error = None;
        self.touch();

        let result = relay.send(self.mode, &self.transcript.history()).await;

        match result {
            Ok(reply) => {
                self.transcript.append_assistant(reply);
                self.touch();
                Ok(Outcome::Replied)
            }
            Err(e) => {
                tracing::warn!(error = %e, error_code = e.error_code(), mode = ?self.mode, "regenerate failed");
                self.transcript.restore(previous);
                self.error = Some(REGENERATE_FAILED_MESSAGE.to_owned());
                self.touch();
                Ok(Outcome::Failed)
            }
        }
    }

    fn touch(&mut self) {
        self.scroll_ticks += 1;
    }
}

fn submit_error_message(err: &RelayCallError) -> &'static str {
    if err.is_rate_limited() { UNAVAILABLE_MESSAGE } else { SUBMIT_FAILED_MESSAGE }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
