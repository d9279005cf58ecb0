//! Domain services used by the HTTP routes.
//!
//! Each module is provider-agnostic: it takes an `Option<&dyn LlmChat>` and
//! returns a `RelayError` on failure, leaving status mapping to the routes.

pub mod catalog;
pub mod identity;
pub mod image;
pub mod relay;
