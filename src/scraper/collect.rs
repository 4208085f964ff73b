//! Normalization and in-session dedup
//!
//! Pure, synchronous transform from raw API items to canonical [`Post`]
//! records. Page order is preserved; ids already seen in this session are
//! skipped; once the target count is reached the rest of the page is
//! dropped.

use crate::types::{AuthorMeta, Covers, HashtagMeta, MusicMeta, Post, RawItem};
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

fn mention_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        #[allow(clippy::expect_used)]
        Regex::new(r"(@\w+)").expect("static regex must compile")
    })
}

/// Project one raw API item into the canonical record shape.
///
/// Array-valued media fields collapse to their first entry; the
/// no-watermark URL starts empty and is only filled by the watermark
/// resolver.
pub(crate) fn normalize_item(raw: &RawItem) -> Post {
    let info = &raw.item_infos;
    let author = &raw.author_infos;
    let stats = &raw.author_stats;
    let music = &raw.music_infos;

    Post {
        id: info.id.clone(),
        text: info.text.clone(),
        create_time: info.create_time,
        author_meta: AuthorMeta {
            id: author.user_id.clone(),
            sec_uid: author.sec_uid.clone(),
            name: author.unique_id.clone(),
            nick_name: author.nick_name.clone(),
            following: stats.following_count,
            fans: stats.follower_count,
            heart: stats.heart_count,
            video: stats.video_count,
            digg: stats.digg_count,
            verified: author.verified,
            private_account: author.is_secret,
            signature: author.signature.clone(),
            avatar: author.covers_medium.first().cloned().unwrap_or_default(),
        },
        music_meta: MusicMeta {
            music_id: info.music_id.clone(),
            music_name: music.music_name.clone(),
            music_author: music.author_name.clone(),
            music_original: music.original,
            play_url: music.play_url.first().cloned().unwrap_or_default(),
        },
        covers: Covers {
            default_url: info.covers.first().cloned().unwrap_or_default(),
            origin: info.covers_origin.first().cloned().unwrap_or_default(),
            dynamic: info.covers_dynamic.first().cloned().unwrap_or_default(),
        },
        image_url: info.covers_origin.first().cloned().unwrap_or_default(),
        web_video_url: format!(
            "https://www.tiktok.com/@{}/video/{}",
            author.unique_id, info.id
        ),
        video_url: info.video.urls.first().cloned().unwrap_or_default(),
        video_url_no_water_mark: String::new(),
        video_meta: info.video.video_meta.clone(),
        digg_count: info.digg_count,
        share_count: info.share_count,
        play_count: info.play_count,
        comment_count: info.comment_count,
        downloaded: false,
        mentions: mention_regex()
            .find_iter(&info.text)
            .map(|m| m.as_str().to_string())
            .collect(),
        hashtags: raw
            .challenge_info_list
            .iter()
            .map(|challenge| HashtagMeta {
                id: challenge.challenge_id.clone(),
                name: challenge.challenge_name.clone(),
                title: challenge.text.clone(),
                cover: challenge.covers_larger.first().cloned().unwrap_or_default(),
            })
            .collect(),
    }
}

/// Session-scoped collected set with dedup and target-count enforcement
///
/// Mutated only from the session driver, synchronously, as each page
/// completes. The seen-id set grows monotonically and never shrinks.
pub(crate) struct Collector {
    posts: Vec<Post>,
    seen: HashSet<String>,
    target_count: Option<usize>,
}

impl Collector {
    pub(crate) fn new(target_count: Option<usize>) -> Self {
        Self {
            posts: Vec::new(),
            seen: HashSet::new(),
            target_count,
        }
    }

    /// Whether the configured target count has been reached.
    /// A zero target counts as unset.
    pub(crate) fn target_reached(&self) -> bool {
        self.target_count
            .is_some_and(|n| n > 0 && self.posts.len() >= n)
    }

    pub(crate) fn len(&self) -> usize {
        self.posts.len()
    }

    /// Fold one page of raw items into the collected set, in page order.
    ///
    /// Stops early once the target count is reached, skips ids already
    /// seen this session, and calls `on_record` once per newly collected
    /// record.
    pub(crate) fn collect_page(
        &mut self,
        items: Vec<RawItem>,
        on_record: &mut dyn FnMut(&Post),
    ) {
        for raw in items {
            if self.target_reached() {
                break;
            }
            let id = raw.item_infos.id.clone();
            if !self.seen.insert(id) {
                continue;
            }
            let post = normalize_item(&raw);
            on_record(&post);
            self.posts.push(post);
        }
    }

    pub(crate) fn into_posts(self) -> Vec<Post> {
        self.posts
    }
}
