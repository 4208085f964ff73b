//! Page request building and target id resolution
//!
//! The feed endpoint signs requests over the exact fully-qualified query
//! string, so [`PageRequest::signable_url`] fixes both the field set and
//! the field order. User and hashtag targets need a one-time lookup fetch
//! to resolve the numeric id that pagination runs against; a lookup
//! failure is fatal to the whole session.

use crate::config::Config;
use crate::error::{Error, Result, ScrapeError};
use crate::transport::{Transport, TransportRequest};
use crate::types::{Challenge, ChallengeLookup, ScrapeKind, UserData, UserLookup};

/// The fields of one feed page request
#[derive(Clone, Debug)]
pub(crate) struct PageRequest {
    pub(crate) id: String,
    pub(crate) sec_uid: String,
    pub(crate) share_uid: String,
    pub(crate) lang: String,
    pub(crate) verify_fp: String,
    pub(crate) type_code: u8,
    pub(crate) count: usize,
    pub(crate) min_cursor: u64,
    pub(crate) max_cursor: u64,
}

impl PageRequest {
    pub(crate) fn new(kind: ScrapeKind, id: impl Into<String>, count: usize) -> Self {
        Self {
            id: id.into(),
            sec_uid: String::new(),
            share_uid: String::new(),
            lang: String::new(),
            verify_fp: String::new(),
            type_code: kind.type_code(),
            count,
            min_cursor: 0,
            max_cursor: 0,
        }
    }

    pub(crate) fn with_cursor(mut self, max_cursor: u64) -> Self {
        self.max_cursor = max_cursor;
        self
    }

    /// The feed endpoint URL (query parameters travel separately)
    pub(crate) fn endpoint(&self, api_host: &str) -> String {
        format!("{api_host}share/item/list")
    }

    /// The exact string signatures are computed over.
    ///
    /// Field order is fixed by the endpoint's signature check. Music and
    /// trend requests (type codes 4 and 5) carry an extra empty `shareUid`
    /// field after the cursor.
    pub(crate) fn signable_url(&self, api_host: &str) -> String {
        let share_uid_extra = if self.type_code == 4 || self.type_code == 5 {
            "&shareUid="
        } else {
            ""
        };
        format!(
            "{api_host}share/item/list?secUid={}&id={}&type={}&count={}&minCursor={}&maxCursor={}{}&lang={}&shareUid={}&verifyFp={}",
            self.sec_uid,
            self.id,
            self.type_code,
            self.count,
            self.min_cursor,
            self.max_cursor,
            share_uid_extra,
            self.lang,
            self.share_uid,
            self.verify_fp,
        )
    }

    /// Query parameters for the page fetch itself, signature included
    pub(crate) fn query_params(&self, signature: &str) -> Vec<(String, String)> {
        vec![
            ("id".into(), self.id.clone()),
            ("secUid".into(), self.sec_uid.clone()),
            ("shareUid".into(), self.share_uid.clone()),
            ("lang".into(), self.lang.clone()),
            ("type".into(), self.type_code.to_string()),
            ("count".into(), self.count.to_string()),
            ("minCursor".into(), self.min_cursor.to_string()),
            ("verifyFp".into(), self.verify_fp.clone()),
            ("_signature".into(), signature.to_string()),
            ("maxCursor".into(), self.max_cursor.to_string()),
        ]
    }
}

/// Resolve the id pagination runs against.
///
/// User targets resolve through the profile lookup unless the caller
/// marked the input as an already-numeric id; hashtag targets resolve
/// through the tag lookup; music targets use the input directly; the
/// trend feed has no id.
pub(crate) async fn resolve_target_id(transport: &dyn Transport, config: &Config) -> Result<String> {
    let input = config.target.input.as_str();
    match config.target.kind {
        ScrapeKind::User => {
            if config.target.by_user_id {
                return Ok(input.to_string());
            }
            let user = fetch_user(transport, &config.network.api_host, input).await?;
            Ok(user.user_id)
        }
        ScrapeKind::Hashtag => {
            let challenge = fetch_challenge(transport, &config.network.api_host, input).await?;
            Ok(challenge.challenge_id)
        }
        ScrapeKind::Music => Ok(input.to_string()),
        ScrapeKind::Trend => Ok(String::new()),
    }
}

/// One-time profile lookup (`node/share/user/@name`)
pub(crate) async fn fetch_user(
    transport: &dyn Transport,
    api_host: &str,
    username: &str,
) -> Result<UserData> {
    let resolution = |reason: String| {
        Error::from(ScrapeError::Resolution {
            kind: ScrapeKind::User,
            input: username.to_string(),
            reason,
        })
    };

    let url = format!("{api_host}node/share/user/@{}", urlencoding::encode(username));
    let response = transport
        .fetch(TransportRequest::get(url).with_proxy())
        .await
        .map_err(|e| resolution(e.to_string()))?;
    let payload: UserLookup = response.json().map_err(|e| resolution(e.to_string()))?;

    if payload.status_code != 0 {
        return Err(resolution(format!(
            "lookup rejected with status {}",
            payload.status_code
        )));
    }
    payload
        .body
        .user_data
        .ok_or_else(|| resolution("no userData in response".into()))
}

/// One-time hashtag lookup (`node/share/tag/name`)
pub(crate) async fn fetch_challenge(
    transport: &dyn Transport,
    api_host: &str,
    tag: &str,
) -> Result<Challenge> {
    let resolution = |reason: String| {
        Error::from(ScrapeError::Resolution {
            kind: ScrapeKind::Hashtag,
            input: tag.to_string(),
            reason,
        })
    };

    let url = format!("{api_host}node/share/tag/{}", urlencoding::encode(tag));
    let response = transport
        .fetch(TransportRequest::get(url).with_proxy())
        .await
        .map_err(|e| resolution(e.to_string()))?;
    let payload: ChallengeLookup = response.json().map_err(|e| resolution(e.to_string()))?;

    if payload.status_code != 0 {
        return Err(resolution(format!(
            "lookup rejected with status {}",
            payload.status_code
        )));
    }
    payload
        .body
        .challenge_data
        .ok_or_else(|| resolution("no challengeData in response".into()))
}
