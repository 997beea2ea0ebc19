use anyhow::Context;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, ClientBuilder};
use std::error::Error as _;
use std::time::Duration;

use crate::config::ScanConfig;

/// Issues a single GET and reports the raw status code.
///
/// Implementations must not follow redirects. Any transport-level failure is
/// returned as a human-readable description.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str) -> Result<u16, String>;
}

/// Build the probing client: merged headers, fixed timeout, redirects off.
pub fn build_client(config: &ScanConfig) -> anyhow::Result<Client> {
    let client = ClientBuilder::new()
        .default_headers(header_map(config.headers())?)
        // Connection pooling - sized to the concurrency cap
        .pool_max_idle_per_host(config.concurrency())
        .pool_idle_timeout(Some(Duration::from_secs(90)))
        .tcp_keepalive(Some(Duration::from_secs(60)))
        .tcp_nodelay(true)
        .timeout(config.timeout())
        .gzip(true)
        .brotli(true)
        .use_rustls_tls()
        // The raw 3xx status is the finding, never its destination
        .redirect(reqwest::redirect::Policy::none())
        .danger_accept_invalid_certs(config.insecure())
        .build()
        .context("failed to build HTTP client")?;
    Ok(client)
}

pub fn header_map(headers: &[(String, String)]) -> anyhow::Result<HeaderMap> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (key, value) in headers {
        let name = HeaderName::from_bytes(key.as_bytes())
            .with_context(|| format!("invalid header name {:?}", key))?;
        let value = HeaderValue::from_str(value)
            .with_context(|| format!("invalid value for header {}", key))?;
        map.insert(name, value);
    }
    Ok(map)
}

/// [`Transport`] backed by a shared reqwest client.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn from_config(config: &ScanConfig) -> anyhow::Result<Self> {
        Ok(Self::new(build_client(config)?))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<u16, String> {
        match self.client.get(url).send().await {
            Ok(resp) => Ok(resp.status().as_u16()),
            Err(e) => Err(describe_error(&e)),
        }
    }
}

fn describe_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        return "request timed out".to_string();
    }
    // Innermost cause carries the useful bit (refused, dns, tls)
    let mut root: Option<&dyn std::error::Error> = e.source();
    while let Some(next) = root.and_then(|r| r.source()) {
        root = Some(next);
    }
    match (e.is_connect(), root) {
        (true, Some(cause)) => format!("connection failed: {}", cause),
        (true, None) => "connection failed".to_string(),
        (false, Some(cause)) => format!("{}: {}", e, cause),
        (false, None) => e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_map_rejects_bad_names() {
        let ok = header_map(&[("X-Test".into(), "1".into())]).unwrap();
        assert_eq!(ok.get("x-test").unwrap(), "1");
        assert!(header_map(&[("Bad Header".into(), "1".into())]).is_err());
    }

    #[test]
    fn client_builds_from_config() {
        let cfg = ScanConfig::builder("https://example.test")
            .paths(["admin"])
            .header("X-Test", "1")
            .build()
            .unwrap();
        assert!(build_client(&cfg).is_ok());
    }
}
