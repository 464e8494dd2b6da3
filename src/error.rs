// src/error.rs
//! Error handling for the whole crate.
//!
//! - Enum discriminant (cheap match), allocations only on error paths.
//! - Transparent std/foreign conversions via `#[from]`, works with `?` everywhere.
//! - `Result` alias used crate-wide.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type — lightweight, Send + Sync + 'static.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// I/O errors (font files).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Layout asset (de)serialization failures.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Structurally invalid layout table (duplicate codes, empty table, ...).
    #[error("invalid layout: {0}")]
    Layout(String),

    /// Legend font could not be parsed.
    #[error("font error: {0}")]
    Font(String),

    /// Simple custom message (allocation only when the error happens).
    #[error("{0}")]
    Custom(String),
}

impl Error {
    /// Create a custom error from anything `Display`.
    #[inline]
    pub fn custom(msg: impl std::fmt::Display) -> Self {
        Error::Custom(msg.to_string())
    }

    #[inline]
    pub fn is_layout(&self) -> bool {
        matches!(self, Error::Layout(_))
    }
}
