//! Shared helpers for scraper tests

use crate::config::Config;
use crate::error::Result;
use crate::transport::{Transport, TransportRequest, TransportResponse};
use crate::types::ScrapeKind;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// One scripted route: matches by URL substring and optionally by one
/// query parameter, and serves responses in FIFO order (the last response
/// repeats once the queue is down to one).
struct Route {
    fragment: String,
    query: Option<(String, String)>,
    responses: VecDeque<TransportResponse>,
}

/// Scripted transport for unit tests.
///
/// Every request is recorded so tests can assert on URLs, query
/// parameters, and call counts.
pub(crate) struct MockTransport {
    routes: Mutex<Vec<Route>>,
    pub(crate) requests: Mutex<Vec<TransportRequest>>,
}

impl MockTransport {
    pub(crate) fn new() -> Self {
        Self {
            routes: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Serve `body` for every request whose URL contains `fragment`
    pub(crate) fn stub(self, fragment: &str, body: &str) -> Self {
        self.push_route(fragment, None, vec![body]);
        self
    }

    /// Serve `bodies` in order for requests whose URL contains `fragment`
    pub(crate) fn stub_sequence(self, fragment: &str, bodies: Vec<&str>) -> Self {
        self.push_route(fragment, None, bodies);
        self
    }

    /// Serve `body` for requests whose URL contains `fragment` and whose
    /// query includes the `key=value` pair
    pub(crate) fn stub_query(self, fragment: &str, key: &str, value: &str, body: &str) -> Self {
        self.push_route(fragment, Some((key.to_string(), value.to_string())), vec![body]);
        self
    }

    fn push_route(&self, fragment: &str, query: Option<(String, String)>, bodies: Vec<&str>) {
        self.routes.lock().unwrap().push(Route {
            fragment: fragment.to_string(),
            query,
            responses: bodies
                .into_iter()
                .map(|body| TransportResponse {
                    status: 200,
                    body: body.as_bytes().to_vec(),
                })
                .collect(),
        });
    }

    /// URLs fetched so far, in call order
    pub(crate) fn fetched_urls(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.url.clone())
            .collect()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn fetch(&self, request: TransportRequest) -> Result<TransportResponse> {
        self.requests.lock().unwrap().push(request.clone());

        let mut routes = self.routes.lock().unwrap();
        for route in routes.iter_mut() {
            if !request.url.contains(&route.fragment) {
                continue;
            }
            if let Some((key, value)) = &route.query {
                let matched = request
                    .query
                    .iter()
                    .any(|(k, v)| k == key && v == value);
                if !matched {
                    continue;
                }
            }
            let response = if route.responses.len() > 1 {
                route.responses.pop_front()
            } else {
                route.responses.front().cloned()
            };
            if let Some(response) = response {
                return Ok(response);
            }
        }

        Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("no stub for {}", request.url),
        )
        .into())
    }
}

/// Config pointed at a fake host, with history and watermark off
pub(crate) fn test_config(kind: ScrapeKind, input: &str) -> Config {
    let mut config = Config::default();
    config.target.kind = kind;
    config.target.input = input.to_string();
    config.network.api_host = "https://api.test/".to_string();
    config.network.web_host = "https://web.test/".to_string();
    // Pre-supplied token skips the discover bootstrap in unit tests
    config.auth.session_token = Some("test-token".to_string());
    config
}

/// JSON for one raw feed item with the given post id
pub(crate) fn raw_item_json(id: &str) -> String {
    format!(
        r#"{{
            "itemInfos": {{
                "id": "{id}",
                "text": "caption for {id}",
                "createTime": 1584000000,
                "covers": ["https://cdn.test/{id}-c.jpg"],
                "coversOrigin": ["https://cdn.test/{id}-o.jpg"],
                "video": {{"urls": ["https://cdn.test/{id}.mp4"]}}
            }},
            "authorInfos": {{"userId": "7000", "uniqueId": "someone"}}
        }}"#
    )
}

/// JSON for one feed page payload
pub(crate) fn page_json(ids: &[&str], has_more: bool, max_cursor: &str) -> String {
    let items: Vec<String> = ids.iter().map(|id| raw_item_json(id)).collect();
    format!(
        r#"{{
            "statusCode": 0,
            "body": {{
                "itemListData": [{}],
                "hasMore": {has_more},
                "maxCursor": "{max_cursor}"
            }}
        }}"#,
        items.join(",")
    )
}

/// JSON for a page with `count` sequential ids starting at `start`
pub(crate) fn numbered_page_json(start: usize, count: usize, has_more: bool, max_cursor: &str) -> String {
    let ids: Vec<String> = (start..start + count).map(|n| n.to_string()).collect();
    let borrowed: Vec<&str> = ids.iter().map(String::as_str).collect();
    page_json(&borrowed, has_more, max_cursor)
}
