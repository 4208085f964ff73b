use crate::scraper::collect::{Collector, normalize_item};
use crate::types::{Post, RawItem};

fn raw(id: &str) -> RawItem {
    let mut item = RawItem::default();
    item.item_infos.id = id.to_string();
    item
}

fn full_raw() -> RawItem {
    serde_json::from_str(
        r#"{
            "itemInfos": {
                "id": "6800000000000000001",
                "text": "duet with @friend and @other #rust",
                "createTime": 1584000000,
                "musicId": "42",
                "covers": ["https://cdn.test/c.jpg"],
                "coversOrigin": ["https://cdn.test/o.jpg"],
                "coversDynamic": ["https://cdn.test/d.webp"],
                "video": {"urls": ["https://cdn.test/v.mp4"], "videoMeta": {"width": 540}},
                "diggCount": 12,
                "shareCount": 3,
                "playCount": 99,
                "commentCount": 5
            },
            "authorInfos": {
                "userId": "7000",
                "secUid": "MS4w",
                "uniqueId": "someone",
                "nickName": "Someone",
                "verified": true,
                "isSecret": true,
                "signature": "bio",
                "coversMedium": ["https://cdn.test/a.jpg"]
            },
            "authorStats": {
                "followingCount": 10,
                "followerCount": 20,
                "heartCount": 30,
                "videoCount": 4,
                "diggCount": 7
            },
            "musicInfos": {
                "musicName": "song",
                "authorName": "artist",
                "original": true,
                "playUrl": ["https://cdn.test/s.mp3"]
            },
            "challengeInfoList": [
                {"challengeId": "1", "challengeName": "rust", "text": "Rust", "coversLarger": ["https://cdn.test/t.jpg"]}
            ]
        }"#,
    )
    .unwrap()
}

fn collect_all(collector: &mut Collector, items: Vec<RawItem>) -> Vec<Post> {
    let mut emitted = Vec::new();
    collector.collect_page(items, &mut |post| emitted.push(post.clone()));
    emitted
}

#[test]
fn test_normalize_projects_all_fields() {
    let post = normalize_item(&full_raw());

    assert_eq!(post.id, "6800000000000000001");
    assert_eq!(post.create_time, 1_584_000_000);
    assert_eq!(post.author_meta.id, "7000");
    assert_eq!(post.author_meta.name, "someone");
    assert_eq!(post.author_meta.fans, 20);
    assert!(post.author_meta.private_account);
    assert_eq!(post.author_meta.avatar, "https://cdn.test/a.jpg");
    assert_eq!(post.music_meta.music_id, "42");
    assert_eq!(post.music_meta.music_author, "artist");
    assert_eq!(post.music_meta.play_url, "https://cdn.test/s.mp3");
    assert_eq!(post.covers.default_url, "https://cdn.test/c.jpg");
    assert_eq!(post.covers.origin, "https://cdn.test/o.jpg");
    assert_eq!(post.image_url, "https://cdn.test/o.jpg");
    assert_eq!(
        post.web_video_url,
        "https://www.tiktok.com/@someone/video/6800000000000000001"
    );
    assert_eq!(post.video_url, "https://cdn.test/v.mp4");
    assert_eq!(post.video_url_no_water_mark, "", "starts unresolved");
    assert_eq!(post.video_meta["width"], 540);
    assert_eq!(post.digg_count, 12);
    assert!(!post.downloaded);
}

#[test]
fn test_normalize_extracts_mentions_and_hashtags() {
    let post = normalize_item(&full_raw());

    assert_eq!(post.mentions, vec!["@friend", "@other"]);
    assert_eq!(post.hashtags.len(), 1);
    assert_eq!(post.hashtags[0].name, "rust");
    assert_eq!(post.hashtags[0].title, "Rust");
    assert_eq!(post.hashtags[0].cover, "https://cdn.test/t.jpg");
}

#[test]
fn test_normalize_tolerates_empty_media_arrays() {
    let post = normalize_item(&raw("1"));

    assert_eq!(post.video_url, "");
    assert_eq!(post.covers.origin, "");
    assert_eq!(post.author_meta.avatar, "");
    assert!(post.mentions.is_empty());
}

#[test]
fn test_duplicate_ids_collected_once() {
    let mut collector = Collector::new(None);

    collect_all(&mut collector, vec![raw("1"), raw("2"), raw("1")]);
    // Same item arriving again on a later page changes nothing
    collect_all(&mut collector, vec![raw("1")]);

    let posts = collector.into_posts();
    assert_eq!(posts.len(), 2, "each id appears exactly once");
    assert_eq!(posts[0].id, "1");
    assert_eq!(posts[1].id, "2");
}

#[test]
fn test_target_count_truncates_mid_page() {
    let mut collector = Collector::new(Some(3));

    collect_all(&mut collector, vec![raw("1"), raw("2")]);
    assert!(!collector.target_reached());

    collect_all(
        &mut collector,
        vec![raw("3"), raw("4"), raw("5")],
    );
    assert!(collector.target_reached());

    let posts = collector.into_posts();
    assert_eq!(posts.len(), 3, "items past the target are dropped");
    assert_eq!(posts[2].id, "3");
}

#[test]
fn test_zero_target_count_means_unbounded() {
    let mut collector = Collector::new(Some(0));
    collect_all(&mut collector, vec![raw("1"), raw("2")]);

    assert!(!collector.target_reached());
    assert_eq!(collector.len(), 2);
}

#[test]
fn test_each_new_record_is_emitted_once() {
    let mut collector = Collector::new(None);

    let emitted = collect_all(&mut collector, vec![raw("1"), raw("1"), raw("2")]);

    assert_eq!(emitted.len(), 2, "duplicates are not emitted");
    assert_eq!(emitted[0].id, "1");
    assert_eq!(emitted[1].id, "2");
}

#[test]
fn test_page_order_is_preserved() {
    let mut collector = Collector::new(None);
    collect_all(&mut collector, vec![raw("c"), raw("a"), raw("b")]);

    let ids: Vec<String> = collector.into_posts().into_iter().map(|p| p.id).collect();
    assert_eq!(ids, vec!["c", "a", "b"]);
}
