//! # tiktok-dl
//!
//! Backend library for scraping TikTok feed metadata.
//!
//! ## Design Philosophy
//!
//! tiktok-dl is designed to be:
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//! - **Pluggable at the seams** - HTTP transport and the signature
//!   algorithm are traits supplied by the caller
//! - **Partial-failure tolerant** - A failed page never discards records
//!   already collected
//! - **Event-driven** - Consumers can subscribe to per-record events
//!   instead of waiting for the bulk result
//!
//! ## Quick Start
//!
//! ```no_run
//! use tiktok_dl::{Config, ScrapeKind, TikTokScraper, UnsignedSigner};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = Config::default();
//!     config.target.kind = ScrapeKind::Hashtag;
//!     config.target.input = "rust".to_string();
//!     config.target.target_count = Some(50);
//!
//!     let scraper = TikTokScraper::new(config, Arc::new(UnsignedSigner))?;
//!
//!     // Subscribe to events
//!     let mut events = scraper.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let result = scraper.scrape().await?;
//!     println!("collected {} posts", result.posts.len());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Cross-run history store
pub mod history;
/// Scrape orchestration engine (decomposed into focused submodules)
pub mod scraper;
/// Request signing seam
pub mod signer;
/// HTTP transport seam
pub mod transport;
/// Core types and events
pub mod types;

pub use config::{
    AuthConfig, Config, HistoryConfig, NetworkConfig, ScrapingConfig, TargetConfig,
    WatermarkConfig,
};
pub use error::{Error, Result, ScrapeError};
pub use history::HistoryStore;
pub use scraper::{SessionState, TikTokScraper};
pub use signer::{Signer, SignerAdapter, UnsignedSigner};
pub use transport::{HttpTransport, Transport, TransportRequest, TransportResponse};
pub use types::{Event, Post, ScrapeKind, SessionResult};
