//! Anthropic Messages API client used as the judgment oracle.

pub mod client;
pub mod error;
pub(crate) mod retry;
pub(crate) mod types;

pub use client::ClaudeClient;
pub use error::ClaudeError;
