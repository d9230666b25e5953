use crate::parser::FeedParser;
use crate::types::{CandidateItem, FetchConfig, PipelineError, Result, Source};
use backoff::{backoff::Backoff, exponential::ExponentialBackoff};
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

pub struct Fetcher {
    client: Client,
    config: FetchConfig,
}

impl Fetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()?;

        Ok(Self { client, config })
    }

    /// Fetches and parses one source, returning at most
    /// `items_per_source` candidates in feed order. Any failure yields an
    /// error and no items.
    pub async fn fetch_source(&self, source: &Source) -> Result<Vec<CandidateItem>> {
        let start_time = Instant::now();
        let content = self.fetch_feed(&source.url).await?;
        let parsed = FeedParser::parse_feed(&content, self.config.items_per_source)?;

        info!(
            "Fetched {} candidate items from {} in {}ms",
            parsed.items.len(),
            source.name,
            start_time.elapsed().as_millis()
        );
        Ok(parsed.items)
    }

    /// Raw feed document with retries on transport errors and non-2xx statuses.
    pub async fn fetch_feed(&self, url: &str) -> Result<String> {
        debug!("Fetching feed: {}", url);

        let mut backoff: ExponentialBackoff<backoff::SystemClock> = ExponentialBackoff {
            current_interval: Duration::from_secs(self.config.retry_delay_seconds),
            initial_interval: Duration::from_secs(self.config.retry_delay_seconds),
            max_interval: Duration::from_secs(self.config.retry_delay_seconds * 32),
            multiplier: 2.0,
            // Attempts are bounded by max_retries.
            max_elapsed_time: None,
            ..Default::default()
        };

        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            match self.fetch_once(url).await {
                Ok(content) => return Ok(content),
                // Oversized feeds will not shrink on retry.
                Err(e @ PipelineError::FeedTooLarge { .. }) => return Err(e),
                Err(e) => {
                    last_error = Some(e);

                    if attempt < self.config.max_retries {
                        if let Some(delay) = backoff.next_backoff() {
                            warn!(
                                "Attempt {} failed for {}, retrying in {:?}",
                                attempt + 1,
                                url,
                                delay
                            );
                            tokio::time::sleep(delay).await;
                            continue;
                        }
                    }
                    break;
                }
            }
        }

        error!("Failed to fetch feed after {} attempts: {}", self.config.max_retries + 1, url);
        Err(last_error
            .unwrap_or_else(|| PipelineError::General(format!("Failed to fetch {}", url))))
    }

    async fn fetch_once(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(PipelineError::General(format!(
                "HTTP {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        let max_bytes = self.config.max_feed_size_mb * 1024 * 1024;
        if let Some(content_length) = response.content_length() {
            if content_length as usize > max_bytes {
                return Err(PipelineError::FeedTooLarge {
                    size_mb: content_length as usize / (1024 * 1024),
                });
            }
        }

        let content = response.text().await?;
        if content.len() > max_bytes {
            return Err(PipelineError::FeedTooLarge {
                size_mb: content.len() / (1024 * 1024),
            });
        }

        debug!("Fetched {} ({} bytes)", url, content.len());
        Ok(content)
    }
}
