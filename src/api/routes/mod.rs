//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`media`] — Metadata probing and download/playlist jobs
//! - [`system`] — Service info, health, events, OpenAPI

mod media;
mod system;

// Re-export all handlers so `routes::function_name` continues to work
pub use media::*;
pub use system::*;
