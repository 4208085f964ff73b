//! Scrape orchestration engine
//!
//! The [`TikTokScraper`] struct ties the pieces together:
//! - [`query`] - page request building and target id resolution
//! - [`session`] - pagination state machine and page scheduler
//! - [`collect`] - normalization and in-session dedup
//! - [`watermark`] - best-effort no-watermark URL resolution
//!
//! A session runs: validate target, bootstrap the session token, resolve
//! the target id, drive the page loop, then optionally resolve watermark
//! URLs and merge against cross-run history. Collected records are also
//! streamed over a broadcast channel for callers that want incremental
//! consumption.

mod collect;
mod query;
mod session;
mod watermark;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

pub use session::SessionState;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::history::HistoryStore;
use crate::signer::{Signer, SignerAdapter};
use crate::transport::{HttpTransport, Transport};
use crate::types::{Challenge, Event, ScrapeKind, SessionResult, UserData};
use session::Session;
use std::sync::{Arc, OnceLock};
use tokio::sync::broadcast;

/// Capacity of the event broadcast channel
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Scrape session orchestrator
///
/// Cheap to share; the target id resolved for this session is memoized so
/// every page reuses one lookup.
pub struct TikTokScraper {
    config: Arc<Config>,
    transport: Arc<dyn Transport>,
    signer: SignerAdapter,
    event_tx: broadcast::Sender<Event>,
    resolved_id: OnceLock<String>,
}

impl TikTokScraper {
    /// Create a scraper with the production HTTP transport
    pub fn new(config: Config, signer: Arc<dyn Signer>) -> Result<Self> {
        let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(&config.network)?);
        Ok(Self::with_transport(config, signer, transport))
    }

    /// Create a scraper over a caller-provided transport
    pub fn with_transport(
        config: Config,
        signer: Arc<dyn Signer>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let adapter = SignerAdapter::new(
            signer,
            config.auth.signature.clone(),
            config.auth.session_token.clone(),
        );
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            config: Arc::new(config),
            transport,
            signer: adapter,
            event_tx,
            resolved_id: OnceLock::new(),
        }
    }

    /// Subscribe to session events (collected records, page failures,
    /// completion). Slow subscribers may miss events; the bulk result is
    /// unaffected.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    fn emit_event(&self, event: Event) {
        // Nobody listening is fine
        let _ = self.event_tx.send(event);
    }

    fn validate(&self) -> Result<()> {
        if self.config.target.kind != ScrapeKind::Trend && self.config.target.input.is_empty() {
            return Err(Error::Config {
                message: format!(
                    "{} scraping requires a target input",
                    self.config.target.kind
                ),
                key: Some("target.input".into()),
            });
        }
        Ok(())
    }

    /// The id pagination runs against, resolved once per session
    async fn resolve_id(&self) -> Result<String> {
        if let Some(id) = self.resolved_id.get() {
            return Ok(id.clone());
        }
        let id = query::resolve_target_id(self.transport.as_ref(), &self.config).await?;
        Ok(self.resolved_id.get_or_init(|| id).clone())
    }

    /// Run one full scrape session.
    ///
    /// A partially successful session still returns the collected records
    /// plus a non-empty error list; only target resolution and session
    /// token bootstrap failures abort before any page is fetched.
    pub async fn scrape(&self) -> Result<SessionResult> {
        self.validate()?;
        self.signer
            .ensure_token(self.transport.as_ref(), &self.config.network.web_host)
            .await?;
        let id = self.resolve_id().await?;

        tracing::info!(
            kind = %self.config.target.kind,
            input = %self.config.target.input,
            resolved_id = %id,
            "starting scrape session"
        );

        let session = Session::new(&self.config, id.clone(), Arc::clone(&self.transport));
        let (mut posts, errors, state) = session
            .run(&self.signer, &mut |event| self.emit_event(event))
            .await;

        tracing::info!(
            state = ?state,
            collected = posts.len(),
            errors = errors.len(),
            "scrape session finished"
        );

        if self.config.watermark.no_watermark {
            watermark::resolve_all(&self.transport, &mut posts, self.config.watermark.hd_video)
                .await;
        }

        if self.config.history.enabled {
            let store = HistoryStore::new(self.config.history.dir.clone());
            let store_value = if self.config.target.kind == ScrapeKind::Trend {
                "trend".to_string()
            } else {
                id
            };
            posts = store
                .apply(
                    self.config.target.kind,
                    &self.config.target.input,
                    &store_value,
                    posts,
                )
                .await;
        }

        self.emit_event(Event::Done {
            collected: posts.len(),
        });

        Ok(SessionResult { posts, errors })
    }

    /// Fetch public profile data for the configured user input
    pub async fn user_profile(&self) -> Result<UserData> {
        if self.config.target.input.is_empty() {
            return Err(Error::Config {
                message: "username is missing".into(),
                key: Some("target.input".into()),
            });
        }
        query::fetch_user(
            self.transport.as_ref(),
            &self.config.network.api_host,
            &self.config.target.input,
        )
        .await
    }

    /// Fetch public data for the configured hashtag input
    pub async fn hashtag_info(&self) -> Result<Challenge> {
        if self.config.target.input.is_empty() {
            return Err(Error::Config {
                message: "hashtag is missing".into(),
                key: Some("target.input".into()),
            });
        }
        query::fetch_challenge(
            self.transport.as_ref(),
            &self.config.network.api_host,
            &self.config.target.input,
        )
        .await
    }

    /// Sign an arbitrary URL with the session's signer, bootstrapping the
    /// session token first when needed
    pub async fn sign_url(&self, url: &str) -> Result<String> {
        self.signer
            .ensure_token(self.transport.as_ref(), &self.config.network.web_host)
            .await?;
        self.signer.sign_raw(url, &self.config.network.user_agent)
    }
}
