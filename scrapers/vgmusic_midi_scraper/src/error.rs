use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Request to {url} failed with HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Page {url} could not be accessed: {source}")]
    PageUnavailable {
        url: String,
        #[source]
        source: Box<ScrapeError>,
    },
}

pub type Result<T> = std::result::Result<T, ScrapeError>;
