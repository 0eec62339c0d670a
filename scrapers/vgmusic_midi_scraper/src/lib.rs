pub mod catalog;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod midi_scraper;
pub mod paths;
pub mod requests;
pub mod summary;
pub mod throttle;

pub use config::{PageErrorPolicy, ScraperConfig};
pub use error::ScrapeError;
pub use fetcher::{Fetcher, HttpFetcher};
pub use midi_scraper::{DownloadedFile, MidiScraper};
pub use summary::ScrapeSummary;
