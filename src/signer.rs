//! Request signing seam
//!
//! The signature algorithm itself lives outside this crate: callers provide
//! a [`Signer`] implementation wrapping their `sign(url, user_agent, token)`
//! function. [`SignerAdapter`] layers session behavior on top: the session
//! token is bootstrapped once from an unauthenticated fetch of the discover
//! page (or injected by the caller), and a caller-provided pre-computed
//! signature is consumed by exactly one request before fresh signatures
//! take over.

use crate::error::{Result, ScrapeError};
use crate::transport::{Transport, TransportRequest};
use regex::Regex;
use std::sync::{Arc, Mutex, OnceLock};

/// The signature collaborator contract
///
/// A pure function from the caller's perspective: the full query-string URL,
/// the user agent, and the session token go in; a signature string comes out.
pub trait Signer: Send + Sync {
    /// Compute a signature over the exact fully-qualified query string
    fn sign(&self, url: &str, user_agent: &str, session_token: &str) -> Result<String>;
}

/// Signer that produces empty signatures
///
/// Useful against endpoints that do not verify signatures, and in tests.
pub struct UnsignedSigner;

impl Signer for UnsignedSigner {
    fn sign(&self, _url: &str, _user_agent: &str, _session_token: &str) -> Result<String> {
        Ok(String::new())
    }
}

fn tac_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        #[allow(clippy::expect_used)]
        Regex::new(r"<script>tac='([^']*)'</script>").expect("static regex must compile")
    })
}

/// Wraps an external [`Signer`] with session-token and one-shot-signature
/// handling
pub struct SignerAdapter {
    inner: Arc<dyn Signer>,
    presupplied: Mutex<Option<String>>,
    token: OnceLock<String>,
}

impl SignerAdapter {
    /// Create an adapter around `inner`.
    ///
    /// `presupplied` is consumed by the first signature request; `token`
    /// skips the bootstrap fetch when the caller already holds a session
    /// token.
    pub fn new(inner: Arc<dyn Signer>, presupplied: Option<String>, token: Option<String>) -> Self {
        let cell = OnceLock::new();
        if let Some(token) = token {
            let _ = cell.set(token);
        }
        Self {
            inner,
            presupplied: Mutex::new(presupplied),
            token: cell,
        }
    }

    /// The session token, if already obtained
    pub fn session_token(&self) -> Option<&str> {
        self.token.get().map(String::as_str)
    }

    /// Ensure a session token is available, bootstrapping it from the
    /// discover page when absent. Failure is fatal to the session.
    pub async fn ensure_token(&self, transport: &dyn Transport, web_host: &str) -> Result<()> {
        if self.token.get().is_some() {
            return Ok(());
        }

        let request = TransportRequest::get(format!("{web_host}discover"))
            .header("accept", "application/json, text/plain, */*")
            .header("referer", "https://www.tiktok.com/");
        let response = transport
            .fetch(request)
            .await
            .map_err(|e| ScrapeError::Session(e.to_string()))?;

        let page = response.text();
        match tac_regex().captures(&page).and_then(|c| c.get(1)) {
            Some(found) => {
                let _ = self.token.set(found.as_str().to_string());
                tracing::debug!("session token extracted from discover page");
                Ok(())
            }
            None => Err(ScrapeError::Session("tac marker not found in discover page".into()).into()),
        }
    }

    /// Signature for one request.
    ///
    /// Consumes the pre-supplied signature on first call; every subsequent
    /// call computes a fresh one over `url`.
    pub fn signature_for(&self, url: &str, user_agent: &str) -> Result<String> {
        let taken = {
            let mut slot = self
                .presupplied
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            slot.take()
        };
        if let Some(signature) = taken {
            return Ok(signature);
        }
        self.sign_raw(url, user_agent)
    }

    /// Compute a fresh signature over an arbitrary URL, ignoring any
    /// pre-supplied signature
    pub fn sign_raw(&self, url: &str, user_agent: &str) -> Result<String> {
        let token = self.token.get().map(String::as_str).unwrap_or_default();
        self.inner.sign(url, user_agent, token)
    }
}
