//! HTTP transport seam
//!
//! The orchestration core never talks to reqwest directly; it goes through
//! the [`Transport`] trait so tests can script responses and embedders can
//! substitute their own HTTP stack. [`HttpTransport`] is the production
//! implementation: reqwest with per-call proxy selection (SOCKS or plain
//! HTTP, chosen at random from the configured pool) and a fixed timeout.

use crate::config::NetworkConfig;
use crate::error::Result;
use async_trait::async_trait;
use rand::Rng;
use std::time::Duration;

/// One HTTP exchange request
#[derive(Clone, Debug)]
pub struct TransportRequest {
    /// Absolute request URL (query parameters go in `query`)
    pub url: String,
    /// Query parameters appended to the URL
    pub query: Vec<(String, String)>,
    /// Extra request headers (User-Agent is always added by the transport)
    pub headers: Vec<(String, String)>,
    /// Route this call through the configured proxy pool
    pub use_proxy: bool,
}

impl TransportRequest {
    /// A plain GET of `url` with no extra query or headers
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            query: vec![],
            headers: vec![],
            use_proxy: false,
        }
    }

    /// Append a query parameter
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Add a request header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    /// Route through the proxy pool
    pub fn with_proxy(mut self) -> Self {
        self.use_proxy = true;
        self
    }
}

/// One HTTP exchange response
#[derive(Clone, Debug)]
pub struct TransportResponse {
    /// HTTP status code
    pub status: u16,
    /// Raw response body
    pub body: Vec<u8>,
}

impl TransportResponse {
    /// Body as UTF-8 text (lossy)
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Body parsed as JSON
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// The transport collaborator contract
///
/// Implementations perform one HTTP exchange and return the raw body, or
/// fail with a network error. Proxy routing is selected per call.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform one GET exchange
    async fn fetch(&self, request: TransportRequest) -> Result<TransportResponse>;
}

/// Production transport: reqwest with a random-per-call proxy pool
pub struct HttpTransport {
    direct: reqwest::Client,
    proxies: Vec<String>,
    user_agent: String,
    timeout: Duration,
    request_delay: Option<Duration>,
}

impl HttpTransport {
    /// Build a transport from the network configuration
    pub fn new(network: &NetworkConfig) -> Result<Self> {
        let direct = reqwest::Client::builder()
            .timeout(network.request_timeout)
            .build()?;

        Ok(Self {
            direct,
            proxies: network.proxies.clone(),
            user_agent: network.user_agent.clone(),
            timeout: network.request_timeout,
            request_delay: network.request_delay,
        })
    }

    /// Pick one proxy entry at random, normalized to a scheme reqwest accepts.
    /// Plain `host:port` entries are treated as HTTP proxies; `socks4://` and
    /// `socks5://` entries pass through as-is.
    fn pick_proxy(&self) -> Option<String> {
        if self.proxies.is_empty() {
            return None;
        }
        let index = rand::thread_rng().gen_range(0..self.proxies.len());
        let entry = &self.proxies[index];
        if entry.is_empty() {
            return None;
        }
        if entry.starts_with("socks4://")
            || entry.starts_with("socks5://")
            || entry.starts_with("http://")
            || entry.starts_with("https://")
        {
            Some(entry.clone())
        } else {
            Some(format!("http://{entry}/"))
        }
    }

    fn client_for(&self, use_proxy: bool) -> Result<reqwest::Client> {
        if !use_proxy {
            return Ok(self.direct.clone());
        }
        match self.pick_proxy() {
            Some(proxy_url) => {
                let client = reqwest::Client::builder()
                    .timeout(self.timeout)
                    .proxy(reqwest::Proxy::all(&proxy_url)?)
                    .build()?;
                Ok(client)
            }
            None => Ok(self.direct.clone()),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, request: TransportRequest) -> Result<TransportResponse> {
        // Reject malformed URLs up front instead of handing them to reqwest
        let url = url::Url::parse(&request.url)?;
        let client = self.client_for(request.use_proxy)?;

        let mut builder = client
            .get(url)
            .header(reqwest::header::USER_AGENT, &self.user_agent);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (key, value) in &request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }

        tracing::debug!(url = %request.url, use_proxy = request.use_proxy, "fetching");

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();

        if let Some(delay) = self.request_delay {
            tokio::time::sleep(delay).await;
        }

        Ok(TransportResponse { status, body })
    }
}
