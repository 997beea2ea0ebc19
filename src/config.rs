use anyhow::bail;
use once_cell::sync::Lazy;
use std::time::Duration;

pub const DEFAULT_CONCURRENCY: usize = 10;

/// Largest slot count the concurrency limiter can hold.
pub const MAX_CONCURRENCY: usize = tokio::sync::Semaphore::MAX_PERMITS;

/// Every probe gets the same hard request timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Browser-like header set sent with every probe unless overridden.
pub static DEFAULT_HEADERS: Lazy<Vec<(String, String)>> = Lazy::new(|| {
    [
        ("User-Agent", "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/100.0.4896.75 Safari/537.36"),
        ("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8"),
        ("Accept-Language", "en-US,en;q=0.5"),
        ("Accept-Encoding", "gzip, deflate, br"),
        ("Connection", "keep-alive"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
});

/// Immutable parameters of one scan. Build it with [`ScanConfig::builder`].
#[derive(Debug, Clone)]
pub struct ScanConfig {
    base_url: String,
    paths: Vec<String>,
    concurrency: usize,
    rate_limit: f64,
    headers: Vec<(String, String)>,
    timeout: Duration,
    insecure: bool,
}

impl ScanConfig {
    pub fn builder(base_url: impl Into<String>) -> ScanConfigBuilder {
        ScanConfigBuilder {
            base_url: base_url.into(),
            paths: Vec::new(),
            concurrency: DEFAULT_CONCURRENCY as i64,
            rate_limit: 0.0,
            custom_headers: Vec::new(),
            insecure: false,
        }
    }

    /// Target address without trailing slashes.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Requests per second, `0.0` means unbounded.
    pub fn rate_limit(&self) -> f64 {
        self.rate_limit
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn insecure(&self) -> bool {
        self.insecure
    }
}

#[derive(Debug, Clone)]
pub struct ScanConfigBuilder {
    base_url: String,
    paths: Vec<String>,
    concurrency: i64,
    rate_limit: f64,
    custom_headers: Vec<(String, String)>,
    insecure: bool,
}

impl ScanConfigBuilder {
    pub fn paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.paths = paths.into_iter().map(Into::into).collect();
        self
    }

    pub fn concurrency(mut self, concurrency: i64) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn rate_limit(mut self, rps: f64) -> Self {
        self.rate_limit = rps;
        self
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_headers.push((key.into(), value.into()));
        self
    }

    pub fn headers<I>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.custom_headers.extend(headers);
        self
    }

    pub fn insecure(mut self, insecure: bool) -> Self {
        self.insecure = insecure;
        self
    }

    /// Validate and freeze the configuration.
    ///
    /// An empty target or an empty path list is fatal. A non-positive
    /// concurrency falls back to [`DEFAULT_CONCURRENCY`], one above
    /// [`MAX_CONCURRENCY`] is capped, and a negative or non-finite rate falls
    /// back to unbounded, each with a warning.
    pub fn build(self) -> anyhow::Result<ScanConfig> {
        let base_url = self.base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            bail!("target URL must not be empty");
        }
        if let Err(e) = url::Url::parse(&base_url) {
            tracing::warn!(target_url = %base_url, error = %e, "target does not parse as an absolute URL; probes will likely fail");
        }
        if self.paths.is_empty() {
            bail!("no endpoints to scan");
        }

        let concurrency = if self.concurrency <= 0 {
            tracing::warn!(requested = self.concurrency, "concurrency must be positive, using default ({})", DEFAULT_CONCURRENCY);
            DEFAULT_CONCURRENCY
        } else if self.concurrency as u64 > MAX_CONCURRENCY as u64 {
            tracing::warn!(requested = self.concurrency, "concurrency too large, capping at {}", MAX_CONCURRENCY);
            MAX_CONCURRENCY
        } else {
            self.concurrency as usize
        };

        let rate_limit = if !self.rate_limit.is_finite() || self.rate_limit < 0.0 {
            tracing::warn!(requested = self.rate_limit, "rate limit cannot be negative, using no limit");
            0.0
        } else {
            self.rate_limit
        };

        Ok(ScanConfig {
            base_url,
            paths: self.paths,
            concurrency,
            rate_limit,
            headers: merge_headers(&DEFAULT_HEADERS, &self.custom_headers),
            timeout: REQUEST_TIMEOUT,
            insecure: self.insecure,
        })
    }
}

/// Overlay `custom` on `defaults`. Keys compare case-insensitively, the custom
/// value wins and new keys keep their given order after the defaults.
pub fn merge_headers(defaults: &[(String, String)], custom: &[(String, String)]) -> Vec<(String, String)> {
    let mut merged: Vec<(String, String)> = defaults.to_vec();
    for (key, value) in custom {
        match merged.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(key)) {
            Some(slot) => *slot = (key.clone(), value.clone()),
            None => merged.push((key.clone(), value.clone())),
        }
    }
    merged
}

/// Parse one `Key:Value` header entry. Splits on the first colon only.
pub fn parse_header_entry(raw: &str) -> Option<(String, String)> {
    let (key, value) = raw.split_once(':')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key.to_string(), value.trim().to_string()))
}

/// Lenient concurrency parsing: blank, non-numeric or non-positive input
/// yields the default.
pub fn parse_concurrency(raw: &str) -> usize {
    let raw = raw.trim();
    if raw.is_empty() {
        return DEFAULT_CONCURRENCY;
    }
    match raw.parse::<i64>() {
        Ok(n) if n > 0 => n as usize,
        Ok(n) => {
            tracing::warn!(requested = n, "max concurrent requests must be positive, using default ({})", DEFAULT_CONCURRENCY);
            DEFAULT_CONCURRENCY
        }
        Err(_) => {
            tracing::warn!(input = raw, "invalid concurrency, using default ({})", DEFAULT_CONCURRENCY);
            DEFAULT_CONCURRENCY
        }
    }
}

/// Lenient rate parsing: blank, non-numeric or negative input yields `0.0`.
pub fn parse_rate_limit(raw: &str) -> f64 {
    let raw = raw.trim();
    if raw.is_empty() {
        return 0.0;
    }
    match raw.parse::<f64>() {
        Ok(r) if r.is_finite() && r >= 0.0 => r,
        Ok(r) => {
            tracing::warn!(requested = r, "RPS limit cannot be negative, using no limit");
            0.0
        }
        Err(_) => {
            tracing::warn!(input = raw, "invalid RPS limit, using no limit");
            0.0
        }
    }
}
