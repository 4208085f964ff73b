//! Pagination state machine and bounded-concurrency page scheduler
//!
//! One [`Session`] drives the page loop for a single target. Requests are
//! built and signed in the driver; only the network fetch runs inside a
//! spawned task, so the collected set, the dedup set, and the shared
//! cursor are mutated from exactly one place as each page completes.
//!
//! Concurrency width depends on cursor semantics: user and trend feeds
//! advance by the server-returned cursor, so their pages are serialized to
//! one in flight; hashtag and music feeds paginate by a locally computed
//! offset and fetch up to the configured width concurrently. Once a
//! terminal condition is observed no new pages are launched, but pages
//! already in flight always run to completion and their items are still
//! collected.

use crate::config::Config;
use crate::error::ScrapeError;
use crate::scraper::collect::Collector;
use crate::scraper::query::PageRequest;
use crate::signer::SignerAdapter;
use crate::transport::{Transport, TransportRequest};
use crate::types::{Event, PagePayload, Post, ScrapeKind};
use std::sync::Arc;
use tokio::task::JoinSet;

/// Items per page the planning heuristic assumes the API actually returns,
/// which is lower than the requested page size
const PLANNING_PAGE_YIELD: usize = 27;

/// Pagination lifecycle of one session
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// No page fetched yet
    Init,
    /// Pages are being fetched
    Fetching,
    /// Normal termination: feed exhausted or target count reached
    Exhausted,
    /// A page iteration failed; in-flight pages were still drained
    Failed,
}

impl SessionState {
    fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Exhausted | SessionState::Failed)
    }

    /// Enter a terminal state; the first terminal observation wins
    fn finish(&mut self, terminal: SessionState) {
        if !self.is_terminal() {
            *self = terminal;
        }
    }
}

/// Number of pages to plan when a target count is set.
///
/// The API tends to yield around 27 usable items per 30-item page, so the
/// plan divides by that yield; an exact multiple gets one extra page of
/// slack. Without a target count the plan falls back to `max_pages` and
/// relies on `hasMore` to stop.
pub(crate) fn plan_pages(target_count: Option<usize>, max_pages: usize) -> usize {
    match target_count {
        Some(n) if n > 0 => {
            let pages = n.div_ceil(PLANNING_PAGE_YIELD);
            if n % PLANNING_PAGE_YIELD == 0 {
                pages + 1
            } else {
                pages
            }
        }
        _ => max_pages,
    }
}

/// One scrape session over a resolved target id
pub(crate) struct Session {
    kind: ScrapeKind,
    id: String,
    api_host: String,
    user_agent: String,
    page_size: usize,
    width: usize,
    planned_pages: u64,
    target_count: Option<usize>,
    transport: Arc<dyn Transport>,
}

impl Session {
    pub(crate) fn new(config: &Config, id: String, transport: Arc<dyn Transport>) -> Self {
        let kind = config.target.kind;
        let width = if kind.serialized() {
            1
        } else {
            config.scraping.async_scraping.max(1)
        };
        Self {
            kind,
            id,
            api_host: config.network.api_host.clone(),
            user_agent: config.network.user_agent.clone(),
            page_size: config.scraping.page_size,
            width,
            planned_pages: plan_pages(config.target.target_count, config.scraping.max_pages) as u64,
            target_count: config.target.target_count,
            transport,
        }
    }

    /// Cursor for one page: serialized kinds use the shared server-returned
    /// cursor, offset kinds compute it from the page index
    fn cursor_for(&self, page: u64, shared_cursor: u64) -> u64 {
        if self.kind.serialized() {
            shared_cursor
        } else if page == 1 {
            0
        } else {
            (page - 1) * self.page_size as u64
        }
    }

    /// Run the page loop to completion.
    ///
    /// Returns the collected posts in arrival order, the per-page errors
    /// recorded along the way, and the terminal state reached.
    pub(crate) async fn run(
        &self,
        signer: &SignerAdapter,
        on_event: &mut dyn FnMut(Event),
    ) -> (Vec<Post>, Vec<ScrapeError>, SessionState) {
        let mut collector = Collector::new(self.target_count);
        let mut errors: Vec<ScrapeError> = Vec::new();
        let mut state = SessionState::Init;
        let mut shared_cursor: u64 = 0;
        let mut next_page: u64 = 1;
        let mut in_flight: JoinSet<(u64, crate::error::Result<crate::transport::TransportResponse>)> =
            JoinSet::new();

        loop {
            while !state.is_terminal()
                && next_page <= self.planned_pages
                && in_flight.len() < self.width
            {
                let page = next_page;
                next_page += 1;
                state = match state {
                    SessionState::Init => SessionState::Fetching,
                    other => other,
                };

                let cursor = self.cursor_for(page, shared_cursor);
                let request =
                    PageRequest::new(self.kind, &self.id, self.page_size).with_cursor(cursor);
                let signature =
                    match signer.signature_for(&request.signable_url(&self.api_host), &self.user_agent) {
                        Ok(signature) => signature,
                        Err(e) => {
                            let error = ScrapeError::Fetch {
                                page,
                                reason: e.to_string(),
                            };
                            on_event(Event::PageFailed {
                                page,
                                error: error.to_string(),
                            });
                            errors.push(error);
                            state.finish(SessionState::Failed);
                            continue;
                        }
                    };

                let url = request.endpoint(&self.api_host);
                let params = request.query_params(&signature);
                let transport = Arc::clone(&self.transport);
                tracing::debug!(page, cursor, "launching page fetch");
                in_flight.spawn(async move {
                    let request = params
                        .into_iter()
                        .fold(TransportRequest::get(url).with_proxy(), |r, (k, v)| {
                            r.query(k, v)
                        })
                        .header("accept", "application/json, text/plain, */*")
                        .header("referer", "https://www.tiktok.com/");
                    let outcome = transport.fetch(request).await;
                    (page, outcome)
                });
            }

            let Some(joined) = in_flight.join_next().await else {
                break;
            };
            let (page, outcome) = match joined {
                Ok(pair) => pair,
                Err(e) => {
                    errors.push(ScrapeError::Fetch {
                        page: 0,
                        reason: format!("page task failed: {e}"),
                    });
                    state.finish(SessionState::Failed);
                    continue;
                }
            };

            let payload = outcome
                .and_then(|response| response.json::<PagePayload>())
                .map_err(|e| ScrapeError::Fetch {
                    page,
                    reason: e.to_string(),
                })
                .and_then(|payload| {
                    // Non-zero status means the feed has nothing more to give
                    if payload.status_code == 0 {
                        Ok(payload)
                    } else {
                        Err(ScrapeError::NoMorePosts)
                    }
                });
            match payload {
                Ok(payload) => {
                    collector.collect_page(payload.body.item_list_data, &mut |post| {
                        on_event(Event::Record {
                            post: Box::new(post.clone()),
                        })
                    });
                    if self.kind.serialized() {
                        shared_cursor = payload.body.max_cursor.parse().unwrap_or(shared_cursor);
                    }
                    if !payload.body.has_more || collector.target_reached() {
                        tracing::debug!(page, collected = collector.len(), "pagination exhausted");
                        state.finish(SessionState::Exhausted);
                    }
                }
                // Termination sentinel, never recorded as a failure
                Err(ScrapeError::NoMorePosts) => {
                    tracing::debug!(page, "feed reported no more posts");
                    state.finish(SessionState::Exhausted);
                }
                Err(error) => {
                    tracing::warn!(page, error = %error, "page fetch failed");
                    on_event(Event::PageFailed {
                        page,
                        error: error.to_string(),
                    });
                    errors.push(error);
                    state.finish(SessionState::Failed);
                }
            }
        }

        // Plan ran out without the feed saying so
        state.finish(SessionState::Exhausted);

        (collector.into_posts(), errors, state)
    }
}
