//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! holds only immutable collaborators: the model provider (absent when no
//! credential is configured) and the identity provider. Requests share no
//! mutable state, so handlers run fully in parallel.

use std::sync::Arc;

use crate::llm::LlmChat;
use crate::services::identity::IdentityProvider;

#[derive(Clone)]
pub struct AppState {
    /// Model provider. `None` when `OPENAI_API_KEY` is unset.
    pub llm: Option<Arc<dyn LlmChat>>,
    pub identity: Arc<dyn IdentityProvider>,
}

impl AppState {
    #[must_use]
    pub fn new(llm: Option<Arc<dyn LlmChat>>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self { llm, identity }
    }

    /// Borrow the provider as a trait object for the services layer.
    #[must_use]
    pub fn llm(&self) -> Option<&dyn LlmChat> {
        self.llm.as_deref()
    }
}
