//! Chat — client-side transcript state for the conversation and code tools.
//!
//! SYSTEM CONTEXT
//! ==============
//! A [`session::ChatSession`] owns one [`transcript::Transcript`] and talks to
//! the relay through a [`client::RelayClient`]. The CLI drives it over HTTP;
//! tests drive it with scripted clients.

pub mod client;
pub mod session;
pub mod transcript;

pub use client::{HttpRelayClient, RelayCallError, RelayClient};
pub use session::{ChatSession, Outcome};
pub use transcript::{Entry, Transcript, TranscriptError};
