//! Error types for tiktok-dl
//!
//! Two layers of errors:
//! - [`Error`] — the crate-level error returned from public entry points.
//!   Covers configuration, transport, and serialization failures.
//! - [`ScrapeError`] — per-session domain errors. Fatal variants
//!   ([`ScrapeError::Resolution`], [`ScrapeError::Session`]) abort the
//!   session before any page is fetched; the rest are collected into the
//!   session result's error list without aborting sibling page iterations.

use crate::types::ScrapeKind;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for tiktok-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for tiktok-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "target.input")
        key: Option<String>,
    },

    /// Scrape-session error (resolution failure, page fetch failure, ...)
    #[error("scrape error: {0}")]
    Scrape(#[from] ScrapeError),

    /// Network error from the HTTP transport
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid URL
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Scrape-session errors
///
/// Variants are either fatal (abort the session) or collected (recorded in
/// [`crate::types::SessionResult::errors`] while the session keeps going).
/// [`ScrapeError::NoMorePosts`] is a sentinel, not a true failure: it signals
/// normal pagination exhaustion and never appears in the error list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScrapeError {
    /// Target id lookup failed — fatal, no pages are fetched without an id
    #[error("cannot resolve {kind} target {input:?}: {reason}")]
    Resolution {
        /// The scrape target kind being resolved
        kind: ScrapeKind,
        /// The raw target input (username, hashtag name, ...)
        input: String,
        /// Why the lookup failed
        reason: String,
    },

    /// Session token bootstrap failed — fatal, requests cannot be signed
    #[error("cannot obtain session token: {0}")]
    Session(String),

    /// One page fetch failed — recorded, aborts only that iteration
    #[error("page {page} fetch failed: {reason}")]
    Fetch {
        /// The 1-based page index that failed
        page: u64,
        /// Why the fetch failed (network error, malformed payload, ...)
        reason: String,
    },

    /// Normal pagination termination signal, not a true error
    #[error("no more posts")]
    NoMorePosts,

    /// Watermark resolution failed for one record — non-fatal, the record's
    /// no-watermark URL is simply left empty
    #[error("watermark resolution failed for post {id}: {reason}")]
    Watermark {
        /// Id of the post whose media could not be resolved
        id: String,
        /// Why resolution failed
        reason: String,
    },

    /// History file read/write failed — logged and swallowed, never fails
    /// the session (the in-memory result is still valid for this run)
    #[error("history persistence failed at {path}: {reason}")]
    Persistence {
        /// The history file involved
        path: PathBuf,
        /// Why persistence failed
        reason: String,
    },
}

impl ScrapeError {
    /// Whether this error aborts the whole session before any page fetch
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ScrapeError::Resolution { .. } | ScrapeError::Session(_)
        )
    }
}
