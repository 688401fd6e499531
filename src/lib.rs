//! Commit message generator library
//!
//! Turns staged changes into an emoji-tagged conventional commit message via
//! an OpenAI-compatible endpoint, then lets the user commit, edit or cancel.
pub mod api;
pub mod app;
pub mod config;
pub mod diff;
pub mod editor;
pub mod error;
pub mod git;
pub mod interaction;
pub mod interrupt;
pub mod normalization;
pub mod style;
pub mod templates;
pub mod tokens;
pub mod types;
pub mod validation;

// Re-export commonly used types
pub use config::{AppConfig, FormatConfig};
pub use error::{CommitGenError, Result};
pub use interaction::{SessionOutcome, run_session};
pub use normalization::normalize;
pub use types::{Args, CommitMessage, CommitType, DescriptionMode, StyleProfile};
