//! Visura — authenticated relay to a hosted model provider, plus the chat
//! transcript state that drives it.

pub mod chat;
pub mod llm;
pub mod routes;
pub mod services;
pub mod state;
