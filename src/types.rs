//! Core types for tiktok-dl

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The category of entity being paginated
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrapeKind {
    /// A user's feed, paginated by server-returned cursor
    User,
    /// A hashtag (challenge) feed, paginated by local offset
    Hashtag,
    /// The trending feed, paginated by server-returned cursor
    Trend,
    /// A music (sound) feed, paginated by local offset
    Music,
}

impl ScrapeKind {
    /// Wire code for the feed endpoint's `type` field
    pub fn type_code(&self) -> u8 {
        match self {
            ScrapeKind::User => 1,
            ScrapeKind::Hashtag => 3,
            ScrapeKind::Music => 4,
            ScrapeKind::Trend => 5,
        }
    }

    /// Whether pagination must be serialized to one in-flight page.
    ///
    /// User and Trend feeds advance by the server-returned cursor, so the
    /// next page request depends on the previous page's response. Hashtag
    /// and Music feeds use locally computable offsets and can be fetched
    /// concurrently.
    pub fn serialized(&self) -> bool {
        matches!(self, ScrapeKind::User | ScrapeKind::Trend)
    }

    /// Whether the target id must be resolved via a one-time lookup fetch
    pub fn requires_lookup(&self) -> bool {
        matches!(self, ScrapeKind::User | ScrapeKind::Hashtag)
    }
}

impl std::fmt::Display for ScrapeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ScrapeKind::User => "user",
            ScrapeKind::Hashtag => "hashtag",
            ScrapeKind::Trend => "trend",
            ScrapeKind::Music => "music",
        };
        write!(f, "{name}")
    }
}

// ---------------------------------------------------------------------------
// Raw API payloads (wire format, camelCase)
// ---------------------------------------------------------------------------

/// One raw item from a feed page, as returned by the API
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawItem {
    /// Post-level fields (id, text, media, engagement counters)
    #[serde(default)]
    pub item_infos: ItemInfos,
    /// Author identity fields
    #[serde(default)]
    pub author_infos: AuthorInfos,
    /// Author engagement counters
    #[serde(default)]
    pub author_stats: AuthorStats,
    /// Associated sound metadata
    #[serde(default)]
    pub music_infos: MusicInfos,
    /// Associated hashtag (challenge) list
    #[serde(default)]
    pub challenge_info_list: Vec<ChallengeInfo>,
}

/// Post-level fields of a raw item
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemInfos {
    /// Natural key of the post
    #[serde(default)]
    pub id: String,
    /// Caption text
    #[serde(default)]
    pub text: String,
    /// Creation timestamp (seconds since epoch)
    #[serde(default)]
    pub create_time: i64,
    /// Id of the associated sound
    #[serde(default)]
    pub music_id: String,
    /// Default cover URLs
    #[serde(default)]
    pub covers: Vec<String>,
    /// Original-resolution cover URLs
    #[serde(default)]
    pub covers_origin: Vec<String>,
    /// Animated cover URLs
    #[serde(default)]
    pub covers_dynamic: Vec<String>,
    /// Video media info
    #[serde(default)]
    pub video: VideoInfo,
    /// Like count
    #[serde(default)]
    pub digg_count: i64,
    /// Share count
    #[serde(default)]
    pub share_count: i64,
    /// Play count
    #[serde(default)]
    pub play_count: i64,
    /// Comment count
    #[serde(default)]
    pub comment_count: i64,
}

/// Video media info of a raw item
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoInfo {
    /// Playable (watermarked) media URLs
    #[serde(default)]
    pub urls: Vec<String>,
    /// Opaque media metadata (dimensions, duration, ...), passed through
    #[serde(default)]
    pub video_meta: serde_json::Value,
}

/// Author identity fields of a raw item
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorInfos {
    /// Numeric author id
    #[serde(default)]
    pub user_id: String,
    /// Secondary (signed) author id
    #[serde(default)]
    pub sec_uid: String,
    /// Handle (login name)
    #[serde(default)]
    pub unique_id: String,
    /// Display name
    #[serde(default)]
    pub nick_name: String,
    /// Verified badge
    #[serde(default)]
    pub verified: bool,
    /// Private-account flag
    #[serde(default)]
    pub is_secret: bool,
    /// Profile bio text
    #[serde(default)]
    pub signature: String,
    /// Avatar URLs
    #[serde(default)]
    pub covers_medium: Vec<String>,
}

/// Author engagement counters of a raw item
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorStats {
    /// Accounts the author follows
    #[serde(default)]
    pub following_count: i64,
    /// Followers
    #[serde(default)]
    pub follower_count: i64,
    /// Total likes received
    #[serde(default)]
    pub heart_count: i64,
    /// Posted videos
    #[serde(default)]
    pub video_count: i64,
    /// Likes given
    #[serde(default)]
    pub digg_count: i64,
}

/// Sound metadata of a raw item
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MusicInfos {
    /// Sound title
    #[serde(default)]
    pub music_name: String,
    /// Sound author name
    #[serde(default)]
    pub author_name: String,
    /// Whether the sound is an original creation
    #[serde(default)]
    pub original: bool,
    /// Playable sound URLs
    #[serde(default)]
    pub play_url: Vec<String>,
}

/// One hashtag (challenge) entry attached to a raw item
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeInfo {
    /// Challenge id
    #[serde(default)]
    pub challenge_id: String,
    /// Challenge name (the tag itself)
    #[serde(default)]
    pub challenge_name: String,
    /// Challenge title text
    #[serde(default)]
    pub text: String,
    /// Challenge cover URLs
    #[serde(default)]
    pub covers_larger: Vec<String>,
}

/// Feed page payload: status envelope around the item list body
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagePayload {
    /// API status code; 0 means success, anything else means the feed is
    /// exhausted or the request was rejected
    #[serde(default)]
    pub status_code: i32,
    /// The page body
    #[serde(default)]
    pub body: PageBody,
}

/// Body of a feed page
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageBody {
    /// Items on this page, in API order
    #[serde(default)]
    pub item_list_data: Vec<RawItem>,
    /// Whether more pages exist after this one
    #[serde(default)]
    pub has_more: bool,
    /// Continuation cursor for the next page (stringly-typed on the wire)
    #[serde(default)]
    pub max_cursor: String,
}

/// User lookup payload (`node/share/user/@name`)
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserLookup {
    /// API status code; 0 means success
    #[serde(default)]
    pub status_code: i32,
    /// Lookup body
    #[serde(default)]
    pub body: UserLookupBody,
}

/// Body of a user lookup response
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserLookupBody {
    /// Profile data; absent when the user does not exist
    #[serde(default)]
    pub user_data: Option<UserData>,
}

/// Public profile data for one user
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    /// Numeric user id — the resolved id used for feed pagination
    #[serde(default)]
    pub user_id: String,
    /// Handle (login name)
    #[serde(default)]
    pub unique_id: String,
    /// Secondary (signed) id
    #[serde(default)]
    pub sec_uid: String,
    /// Remaining profile fields, passed through untyped
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Hashtag lookup payload (`node/share/tag/name`)
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeLookup {
    /// API status code; 0 means success
    #[serde(default)]
    pub status_code: i32,
    /// Lookup body
    #[serde(default)]
    pub body: ChallengeLookupBody,
}

/// Body of a hashtag lookup response
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeLookupBody {
    /// Challenge data; absent when the hashtag does not exist
    #[serde(default)]
    pub challenge_data: Option<Challenge>,
}

/// Public data for one hashtag (challenge)
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Challenge {
    /// Numeric challenge id — the resolved id used for feed pagination
    #[serde(default)]
    pub challenge_id: String,
    /// The tag itself
    #[serde(default)]
    pub challenge_name: String,
    /// Remaining challenge fields, passed through untyped
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

// ---------------------------------------------------------------------------
// Canonical records (normalized output)
// ---------------------------------------------------------------------------

/// The canonical, normalized post record
///
/// `id` is the natural key: the final collected set never contains two
/// records with the same id. `video_url_no_watermark` stays empty unless
/// watermark resolution is enabled and succeeds for this record.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// Natural key
    pub id: String,
    /// Caption text
    pub text: String,
    /// Creation timestamp (seconds since epoch)
    pub create_time: i64,
    /// Author sub-record
    pub author_meta: AuthorMeta,
    /// Sound sub-record
    pub music_meta: MusicMeta,
    /// Cover image URLs
    pub covers: Covers,
    /// Original-resolution cover URL (same as `covers.origin`)
    pub image_url: String,
    /// Canonical web page URL for the post
    pub web_video_url: String,
    /// Raw (watermarked) media URL
    pub video_url: String,
    /// Resolved no-watermark media URL; empty when unresolved
    pub video_url_no_water_mark: String,
    /// Opaque media metadata, passed through from the API
    pub video_meta: serde_json::Value,
    /// Like count
    pub digg_count: i64,
    /// Share count
    pub share_count: i64,
    /// Play count
    pub play_count: i64,
    /// Comment count
    pub comment_count: i64,
    /// Whether the media has been downloaded (set by the download collaborator)
    pub downloaded: bool,
    /// `@mention` tokens extracted from the caption
    pub mentions: Vec<String>,
    /// Hashtags attached to the post
    pub hashtags: Vec<HashtagMeta>,
}

/// Author sub-record of a [`Post`]
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorMeta {
    /// Numeric author id
    pub id: String,
    /// Secondary (signed) author id
    pub sec_uid: String,
    /// Handle (login name)
    pub name: String,
    /// Display name
    pub nick_name: String,
    /// Accounts the author follows
    pub following: i64,
    /// Followers
    pub fans: i64,
    /// Total likes received
    pub heart: i64,
    /// Posted videos
    pub video: i64,
    /// Likes given
    pub digg: i64,
    /// Verified badge
    pub verified: bool,
    /// Private-account flag
    #[serde(rename = "private")]
    pub private_account: bool,
    /// Profile bio text
    pub signature: String,
    /// Avatar URL
    pub avatar: String,
}

/// Sound sub-record of a [`Post`]
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MusicMeta {
    /// Sound id
    pub music_id: String,
    /// Sound title
    pub music_name: String,
    /// Sound author name
    pub music_author: String,
    /// Whether the sound is an original creation
    pub music_original: bool,
    /// Playable sound URL
    pub play_url: String,
}

/// Cover image URLs of a [`Post`]
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Covers {
    /// Default cover
    #[serde(rename = "default")]
    pub default_url: String,
    /// Original-resolution cover
    pub origin: String,
    /// Animated cover
    pub dynamic: String,
}

/// One hashtag attached to a [`Post`]
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HashtagMeta {
    /// Challenge id
    pub id: String,
    /// The tag itself
    pub name: String,
    /// Challenge title text
    pub title: String,
    /// Challenge cover URL
    pub cover: String,
}

// ---------------------------------------------------------------------------
// Session result and events
// ---------------------------------------------------------------------------

/// Final result of one scrape session
///
/// A partially successful session still returns whatever records were
/// collected plus a non-empty error list. Callers must not assume an empty
/// error list implies completeness, nor that a non-empty one implies zero
/// records.
#[derive(Clone, Debug, Default)]
pub struct SessionResult {
    /// Collected posts, deduplicated within the session (and against history
    /// when history mode is on)
    pub posts: Vec<Post>,
    /// Per-iteration errors recorded without aborting the session
    pub errors: Vec<crate::error::ScrapeError>,
}

/// Event emitted during a scrape session
///
/// Subscribers receive each collected record as it is normalized, page
/// failures as they are recorded, and a final completion marker. Bulk return
/// and streaming share the same collection step; this channel only adds the
/// incremental hand-off.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A post was collected
    Record {
        /// The normalized post
        post: Box<Post>,
    },

    /// One page iteration failed; the session continues
    PageFailed {
        /// The 1-based page index that failed
        page: u64,
        /// Error message
        error: String,
    },

    /// The session finished; no further events follow
    Done {
        /// Number of posts in the final result
        collected: usize,
    },
}

// ---------------------------------------------------------------------------
// History records (cross-run persistence)
// ---------------------------------------------------------------------------

/// Per-target persisted history record, stored in `tiktok_history.json`
///
/// Field names match the on-disk JSON format, which is shared with other
/// implementations of this scraper.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// Target kind
    #[serde(rename = "type")]
    pub kind: ScrapeKind,
    /// Raw target input
    pub input: String,
    /// Total posts downloaded across all runs; only ever increases
    pub downloaded_posts: u64,
    /// When this record was last updated
    pub last_change: DateTime<Utc>,
    /// Location of the sibling id-store file for this target
    pub file_location: PathBuf,
}
