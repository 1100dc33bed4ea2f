use crate::readability::Readability;
use crate::traits::ArticleSource;
use crate::types::{DigestError, FetchConfig, FetchResult, Result};
use async_trait::async_trait;
use backoff::{backoff::Backoff, exponential::ExponentialBackoff};
use encoding_rs::{Encoding, UTF_8};
use interfaces::ReadableExtractor;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, REFERER};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use url::Url;

pub struct Fetcher {
    client: Client,
    config: FetchConfig,
    extractor: Box<dyn ReadableExtractor + Send + Sync>,
}

impl Fetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        Self::with_extractor(config, Box::new(Readability::new()))
    }

    pub fn with_extractor(
        config: FetchConfig,
        extractor: Box<dyn ReadableExtractor + Send + Sync>,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let referer = HeaderValue::from_str(&config.referer)
            .map_err(|e| DigestError::config(format!("invalid referer header: {}", e)))?;
        headers.insert(REFERER, referer);

        let client = Client::builder()
            .user_agent(&config.user_agent)
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()?;

        Ok(Self {
            client,
            config,
            extractor,
        })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Read the raw bytes of a feed source, retrying transient failures.
    pub async fn fetch_feed(&self, url: &str) -> Result<Vec<u8>> {
        Url::parse(url)?;
        debug!("Fetching feed: {}", url);

        let mut backoff: ExponentialBackoff<backoff::SystemClock> = ExponentialBackoff {
            current_interval: Duration::from_secs(self.config.retry_delay_seconds),
            initial_interval: Duration::from_secs(self.config.retry_delay_seconds),
            max_interval: Duration::from_secs(self.config.retry_delay_seconds * 32),
            multiplier: 2.0,
            max_elapsed_time: Some(Duration::from_secs(self.config.retry_delay_seconds * 60)),
            ..Default::default()
        };

        let mut last_error = String::from("no attempt made");

        for attempt in 0..=self.config.max_retries {
            match self.try_fetch_feed(url).await {
                Ok(bytes) => {
                    info!("Fetched feed: {} ({} bytes)", url, bytes.len());
                    return Ok(bytes);
                }
                Err(DigestError::SourceUnreachable { reason, .. }) if reason.starts_with("feed too large") => {
                    last_error = reason;
                    break;
                }
                Err(e) => {
                    last_error = e.to_string();
                    if attempt < self.config.max_retries {
                        if let Some(delay) = backoff.next_backoff() {
                            warn!("Attempt {} failed for {}, retrying in {:?}", attempt + 1, url, delay);
                            tokio::time::sleep(delay).await;
                            continue;
                        }
                    }
                    break;
                }
            }
        }

        error!("Failed to read feed {}: {}", url, last_error);
        Err(DigestError::SourceUnreachable {
            url: url.to_string(),
            reason: last_error,
        })
    }

    async fn try_fetch_feed(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(DigestError::SourceUnreachable {
                url: url.to_string(),
                reason: format!("HTTP {}", status),
            });
        }

        let limit = self.config.max_feed_size_mb * 1024 * 1024;
        if let Some(content_length) = response.content_length() {
            if content_length as usize > limit {
                return Err(DigestError::SourceUnreachable {
                    url: url.to_string(),
                    reason: format!("feed too large: {} bytes", content_length),
                });
            }
        }

        let bytes = response.bytes().await?;
        if bytes.len() > limit {
            return Err(DigestError::SourceUnreachable {
                url: url.to_string(),
                reason: format!("feed too large: {} bytes", bytes.len()),
            });
        }

        Ok(bytes.to_vec())
    }

    /// Retrieve one article page. Any failure is reported as `FetchFailed`
    /// and logged with the URL.
    pub async fn fetch_article(&self, url: &str, extract: bool) -> FetchResult {
        debug!("Fetching full content from: {}", url);

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(url, "article fetch failed: {}", e);
                return FetchResult::failed(e.status().map(|s| s.as_u16()));
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!(url, status = status.as_u16(), "article fetch failed: HTTP {}", status);
            return FetchResult::failed(Some(status.as_u16()));
        }

        let charset = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(charset_from_content_type);

        let bytes = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(url, "reading article body failed: {}", e);
                return FetchResult::failed(Some(status.as_u16()));
            }
        };

        let html = match decode(&bytes, charset.as_deref()) {
            Some(html) => html,
            None => {
                let err = DigestError::Decode {
                    url: url.to_string(),
                    charset: charset.unwrap_or_else(|| UTF_8.name().to_string()),
                };
                error!("{}", err);
                return FetchResult::failed(Some(status.as_u16()));
            }
        };

        let body = if extract {
            self.extractor.extract(&html).unwrap_or_else(|| {
                debug!(url, "nothing readable found, keeping raw page");
                html
            })
        } else {
            html
        };

        FetchResult::fetched(body, status.as_u16())
    }
}

#[async_trait]
impl ArticleSource for Fetcher {
    async fn fetch(&self, url: &str, extract: bool) -> FetchResult {
        self.fetch_article(url, extract).await
    }
}

/// Pull the `charset` parameter out of a `Content-Type` header value.
fn charset_from_content_type(value: &str) -> Option<String> {
    value.split(';').skip(1).find_map(|param| {
        let (key, val) = param.split_once('=')?;
        if key.trim().eq_ignore_ascii_case("charset") {
            Some(val.trim().trim_matches('"').to_string())
        } else {
            None
        }
    })
}

/// Decode with the declared charset, UTF-8 when none is declared. Returns
/// `None` for unknown labels and malformed input.
fn decode(bytes: &[u8], charset: Option<&str>) -> Option<String> {
    let encoding = match charset {
        Some(label) => Encoding::for_label(label.as_bytes())?,
        None => UTF_8,
    };
    encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(|text| text.into_owned())
}
