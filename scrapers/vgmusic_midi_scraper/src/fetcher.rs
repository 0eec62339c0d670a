use std::{io::Read, thread, time::Duration};
use tracing::{info, warn};

use crate::{
    config::{RetryConfig, ScraperConfig},
    error::{Result, ScrapeError},
};

/// Network access used by the scraper.
pub trait Fetcher {
    /// Returns the body of the page at `url`.
    fn fetch_page(&self, url: &str) -> Result<String>;

    /// Opens the body at `url` for streaming. Fails before any byte is read
    /// if the request or its status is unsuccessful.
    fn open(&self, url: &str) -> Result<Box<dyn Read>>;
}

pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(&config.scraping.user_agent)
            .timeout(Duration::from_secs(config.scraping.request_timeout_secs))
            .build()?;

        Ok(Self { client })
    }

    fn get(&self, url: &str) -> Result<reqwest::blocking::Response> {
        let response = self.client.get(url).send()?;
        if !response.status().is_success() {
            return Err(ScrapeError::Status {
                url: url.to_string(),
                status: response.status(),
            });
        }
        Ok(response)
    }
}

impl Fetcher for HttpFetcher {
    fn fetch_page(&self, url: &str) -> Result<String> {
        let html = self.get(url)?.text()?;
        info!("Downloaded page ({} bytes) from {}", html.len(), url);
        Ok(html)
    }

    fn open(&self, url: &str) -> Result<Box<dyn Read>> {
        Ok(Box::new(self.get(url)?))
    }
}

fn next_delay(delay: Duration) -> Duration {
    delay.saturating_mul(2)
}

/// Runs `operation` up to `policy.max_attempts` times, doubling the delay
/// between attempts. `before_attempt` runs ahead of every attempt.
pub fn retry_with_backoff<T, F, B>(
    policy: &RetryConfig,
    mut before_attempt: B,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Result<T>,
    B: FnMut(),
{
    let max_attempts = policy.max_attempts.max(1);
    let mut delay = policy.initial_delay();
    let mut attempt = 1;

    loop {
        before_attempt();
        match operation() {
            Ok(value) => return Ok(value),
            Err(e) => {
                if attempt >= max_attempts {
                    return Err(e);
                }
                warn!("Retry attempt {} after error: {}", attempt, e);
                thread::sleep(delay);
                delay = next_delay(delay);
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use test_log::test;

    fn config_for(server: &mockito::Server) -> ScraperConfig {
        let mut config = ScraperConfig::default();
        config.site.base_url = server.url();
        config.scraping.request_timeout_secs = 5;
        config
    }

    #[test]
    fn test_fetch_page_returns_body() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/sega/dreamcast")
            .with_status(200)
            .with_body("<html>dreamcast</html>")
            .create();

        let fetcher = HttpFetcher::new(&config_for(&server)).unwrap();
        let body = fetcher
            .fetch_page(&format!("{}/sega/dreamcast", server.url()))
            .unwrap();

        assert_eq!(body, "<html>dreamcast</html>");
        mock.assert();
    }

    #[test]
    fn test_error_status_is_reported() {
        let mut server = mockito::Server::new();
        let _mock = server.mock("GET", "/sega/missing").with_status(404).create();

        let fetcher = HttpFetcher::new(&config_for(&server)).unwrap();
        let err = fetcher
            .fetch_page(&format!("{}/sega/missing", server.url()))
            .unwrap_err();

        match err {
            ScrapeError::Status { status, .. } => assert_eq!(status.as_u16(), 404),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_open_streams_bytes_verbatim() {
        let bytes: &[u8] = b"MThd\x00\x00\x00\x06\x00\x01\x00\x02\x01\xe0";
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/sega/dreamcast/a.mid")
            .with_status(200)
            .with_body(bytes)
            .create();

        let fetcher = HttpFetcher::new(&config_for(&server)).unwrap();
        let mut out = Vec::new();
        let copied = fetcher
            .open(&format!("{}/sega/dreamcast/a.mid", server.url()))
            .unwrap()
            .read_to_end(&mut out)
            .unwrap();

        assert_eq!(copied, bytes.len());
        assert_eq!(out, bytes);
        mock.assert();
    }

    #[test]
    fn test_open_fails_on_error_status() {
        let mut server = mockito::Server::new();
        let _mock = server.mock("GET", "/sega/dreamcast/gone.mid").with_status(404).create();

        let fetcher = HttpFetcher::new(&config_for(&server)).unwrap();
        let result = fetcher.open(&format!("{}/sega/dreamcast/gone.mid", server.url()));

        assert!(matches!(result, Err(ScrapeError::Status { .. })));
    }

    #[test]
    fn test_retry_stops_after_max_attempts() {
        let policy = RetryConfig {
            max_attempts: 3,
            initial_delay_ms: 1,
        };
        let mut before = 0;
        let mut calls = 0;

        let result: Result<()> = retry_with_backoff(
            &policy,
            || before += 1,
            || {
                calls += 1;
                Err(io::Error::new(io::ErrorKind::Other, "boom").into())
            },
        );

        assert!(result.is_err());
        assert_eq!(calls, 3);
        assert_eq!(before, 3);
    }

    #[test]
    fn test_retry_returns_first_success() {
        let policy = RetryConfig {
            max_attempts: 5,
            initial_delay_ms: 1,
        };
        let mut calls = 0;

        let result = retry_with_backoff(
            &policy,
            || {},
            || {
                calls += 1;
                if calls < 2 {
                    Err(io::Error::new(io::ErrorKind::Other, "flaky").into())
                } else {
                    Ok(calls)
                }
            },
        );

        assert_eq!(result.unwrap(), 2);
    }

    #[test]
    fn test_backoff_delay_doubles_and_saturates() {
        assert_eq!(next_delay(Duration::from_millis(250)), Duration::from_millis(500));
        assert_eq!(next_delay(Duration::from_millis(u64::MAX)), Duration::from_millis(u64::MAX) * 2);
        assert_eq!(next_delay(Duration::MAX), Duration::MAX);
    }

    #[test]
    fn test_single_attempt_policy_does_not_retry() {
        let mut calls = 0;
        let result: Result<()> = retry_with_backoff(&RetryConfig::default(), || {}, || {
            calls += 1;
            Err(io::Error::new(io::ErrorKind::Other, "once").into())
        });

        assert!(result.is_err());
        assert_eq!(calls, 1);
    }
}
