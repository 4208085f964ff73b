//! End-to-end scrape flow against a mock HTTP server

use std::sync::Arc;
use tiktok_dl::{Config, Event, ScrapeKind, TikTokScraper, UnsignedSigner};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn page_body(ids: &[&str], has_more: bool, max_cursor: &str) -> String {
    let items: Vec<String> = ids
        .iter()
        .map(|id| {
            format!(
                r#"{{
                    "itemInfos": {{
                        "id": "{id}",
                        "text": "caption @someone",
                        "createTime": 1584000000,
                        "coversOrigin": ["https://cdn.test/{id}.jpg"],
                        "video": {{"urls": ["https://cdn.test/{id}.mp4"]}}
                    }},
                    "authorInfos": {{"userId": "7000", "uniqueId": "someone"}}
                }}"#
            )
        })
        .collect();
    format!(
        r#"{{"statusCode": 0, "body": {{"itemListData": [{}], "hasMore": {has_more}, "maxCursor": "{max_cursor}"}}}}"#,
        items.join(",")
    )
}

async fn mock_api(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/discover"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html><script>tac='tac-value-123'</script></html>"),
        )
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/node/share/user/@someone"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"statusCode": 0, "body": {"userData": {"userId": "7000", "uniqueId": "someone"}}}"#,
        ))
        .mount(server)
        .await;
}

fn config_for(server: &MockServer) -> Config {
    let mut config = Config::default();
    config.target.kind = ScrapeKind::User;
    config.target.input = "someone".to_string();
    config.network.api_host = format!("{}/", server.uri());
    config.network.web_host = format!("{}/", server.uri());
    config
}

#[tokio::test]
async fn scrape_bootstraps_token_resolves_user_and_collects_pages() {
    let server = MockServer::start().await;
    mock_api(&server).await;

    Mock::given(method("GET"))
        .and(path("/share/item/list"))
        .and(query_param("id", "7000"))
        .and(query_param("maxCursor", "0"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(page_body(&["1", "2"], true, "1700")),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/share/item/list"))
        .and(query_param("maxCursor", "1700"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(page_body(&["3"], false, "3400")),
        )
        .mount(&server)
        .await;

    let scraper = TikTokScraper::new(config_for(&server), Arc::new(UnsignedSigner)).unwrap();
    let mut events = scraper.subscribe();

    let result = scraper.scrape().await.unwrap();

    assert_eq!(result.posts.len(), 3);
    assert!(result.errors.is_empty());
    assert_eq!(result.posts[0].id, "1");
    assert_eq!(result.posts[2].id, "3");
    assert_eq!(result.posts[0].author_meta.name, "someone");
    assert_eq!(
        result.posts[0].web_video_url,
        "https://www.tiktok.com/@someone/video/1"
    );
    assert_eq!(result.posts[0].mentions, vec!["@someone"]);

    let mut record_count = 0;
    let mut done_count = 0;
    while let Ok(event) = events.try_recv() {
        match event {
            Event::Record { .. } => record_count += 1,
            Event::Done { collected } => {
                assert_eq!(collected, 3);
                done_count += 1;
            }
            Event::PageFailed { .. } => panic!("no page should fail"),
        }
    }
    assert_eq!(record_count, 3);
    assert_eq!(done_count, 1);
}

#[tokio::test]
async fn second_run_with_history_filters_already_seen_posts() {
    let server = MockServer::start().await;
    mock_api(&server).await;

    Mock::given(method("GET"))
        .and(path("/share/item/list"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(page_body(&["1", "2"], false, "0")),
        )
        .mount(&server)
        .await;

    let history_dir = tempfile::tempdir().unwrap();
    let mut config = config_for(&server);
    config.history.enabled = true;
    config.history.dir = history_dir.path().to_path_buf();

    let first = TikTokScraper::new(config.clone(), Arc::new(UnsignedSigner)).unwrap();
    let first_run = first.scrape().await.unwrap();
    assert_eq!(first_run.posts.len(), 2);

    let second = TikTokScraper::new(config, Arc::new(UnsignedSigner)).unwrap();
    let second_run = second.scrape().await.unwrap();
    assert!(
        second_run.posts.is_empty(),
        "everything was seen in the first run"
    );

    // The id store is keyed by the resolved user id
    let ids: Vec<String> = serde_json::from_slice(
        &std::fs::read(history_dir.path().join("7000.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(ids, vec!["1", "2"]);

    let index: serde_json::Value = serde_json::from_slice(
        &std::fs::read(history_dir.path().join("tiktok_history.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(index["user_someone"]["downloaded_posts"], 2);
    assert_eq!(index["user_someone"]["type"], "user");
}

#[tokio::test]
async fn watermark_resolution_rewrites_media_urls() {
    let server = MockServer::start().await;
    mock_api(&server).await;

    // The page's media URL points back at the mock server so the resolver
    // can fetch it
    let media_url = format!("{}/media/1.mp4", server.uri());
    let page = format!(
        r#"{{"statusCode": 0, "body": {{"itemListData": [{{
            "itemInfos": {{"id": "1", "video": {{"urls": ["{media_url}"]}}}},
            "authorInfos": {{"uniqueId": "someone"}}
        }}], "hasMore": false, "maxCursor": "0"}}}}"#
    );
    Mock::given(method("GET"))
        .and(path("/share/item/list"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/media/1.mp4"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            "prefix vid:{} suffix",
            "a".repeat(32)
        )))
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.watermark.no_watermark = true;
    config.watermark.hd_video = true;

    let scraper = TikTokScraper::new(config, Arc::new(UnsignedSigner)).unwrap();
    let result = scraper.scrape().await.unwrap();

    assert_eq!(result.posts.len(), 1);
    assert_eq!(
        result.posts[0].video_url_no_water_mark,
        format!(
            "https://api2.musical.ly/aweme/v1/playwm/?video_id={}&improve_bitrate=1&ratio=1080p",
            "a".repeat(32)
        )
    );
}

#[tokio::test]
async fn sign_url_bootstraps_the_session_token_first() {
    let server = MockServer::start().await;
    mock_api(&server).await;

    struct RecordingSigner;
    impl tiktok_dl::Signer for RecordingSigner {
        fn sign(
            &self,
            url: &str,
            _user_agent: &str,
            session_token: &str,
        ) -> tiktok_dl::Result<String> {
            Ok(format!("{session_token}:{url}"))
        }
    }

    let mut config = config_for(&server);
    config.target.input = "https://www.tiktok.com/@someone/video/1".to_string();

    let scraper = TikTokScraper::new(config, Arc::new(RecordingSigner)).unwrap();
    let signature = scraper
        .sign_url("https://www.tiktok.com/@someone/video/1")
        .await
        .unwrap();

    assert_eq!(
        signature,
        "tac-value-123:https://www.tiktok.com/@someone/video/1"
    );
}
