use std::{
    fs::{self, File},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::{debug, error, info};

use crate::{
    catalog::{flatten_page, game_blocks},
    config::{PageErrorPolicy, ScraperConfig},
    error::{Result, ScrapeError},
    fetcher::{retry_with_backoff, Fetcher, HttpFetcher},
    paths::{device_page_url, local_file_name, source_url, target_dir},
    requests::{DeviceRequest, ScrapeRequestSet},
    summary::{DeviceState, ScrapeSummary},
    throttle::ThrottleGate,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedFile {
    pub path: PathBuf,
    pub bytes: u64,
}

/// Streams `<index_page_url>/<file_name>` into
/// `<root>/<vendor>/<device>/<game>/<file_name>`, creating directories as needed.
/// Nothing is written unless the request succeeds.
pub fn download_file<F: Fetcher + ?Sized>(
    fetcher: &F,
    root: &Path,
    index_page_url: &str,
    vendor: &str,
    device: &str,
    game: &str,
    file_name: &str,
) -> Result<DownloadedFile> {
    let url = source_url(index_page_url, file_name);
    let mut body = fetcher.open(&url)?;

    let dir = target_dir(root, vendor, device, game);
    fs::create_dir_all(&dir)?;

    let path = dir.join(local_file_name(file_name));
    let mut out = BufWriter::new(File::create(&path)?);
    let bytes = io::copy(&mut body, &mut out)?;
    out.flush()?;

    info!("Saved {} ({} bytes) to {:?}", url, bytes, path);
    Ok(DownloadedFile { path, bytes })
}

/// Downloads the MIDI files of registered games from the catalog.
pub struct MidiScraper<F: Fetcher = HttpFetcher> {
    fetcher: F,
    config: ScraperConfig,
    gate: ThrottleGate,
    requests: ScrapeRequestSet,
}

impl MidiScraper<HttpFetcher> {
    pub fn new(config: ScraperConfig) -> Result<Self> {
        let fetcher = HttpFetcher::new(&config)?;
        Ok(Self::with_fetcher(config, fetcher))
    }
}

impl<F: Fetcher> MidiScraper<F> {
    pub fn with_fetcher(config: ScraperConfig, fetcher: F) -> Self {
        Self {
            fetcher,
            config,
            gate: ThrottleGate::new(),
            requests: ScrapeRequestSet::new(),
        }
    }

    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn requests(&self) -> &ScrapeRequestSet {
        &self.requests
    }

    /// Registers a game. Names must match the site's, ignoring case; nothing
    /// is checked until the next scrape.
    pub fn add_game(&mut self, vendor: &str, device: &str, game: &str) {
        self.requests.add_game(vendor, device, game);
    }

    /// Single download into the configured download directory, spaced from
    /// the previous request by the configured interval.
    pub fn download(
        &mut self,
        index_page_url: &str,
        vendor: &str,
        device: &str,
        game: &str,
        file_name: &str,
    ) -> Result<DownloadedFile> {
        let root = PathBuf::from(&self.config.site.download_dir);
        let min_interval = self.config.rate_limits.min_interval();
        self.throttled(min_interval, |_| {}, |f| {
            download_file(f, &root, index_page_url, vendor, device, game, file_name)
        })
    }

    // Every attempt, retries included, passes the gate first
    fn throttled<T>(
        &mut self,
        min_interval: Duration,
        mut on_wait: impl FnMut(Duration),
        mut operation: impl FnMut(&F) -> Result<T>,
    ) -> Result<T> {
        let Self {
            fetcher,
            config,
            gate,
            ..
        } = self;
        let fetcher: &F = fetcher;

        retry_with_backoff(
            &config.retry,
            || on_wait(gate.wait_if_needed(min_interval)),
            || operation(fetcher),
        )
    }

    /// Scrapes every registered game, waiting at least `min_interval` between
    /// requests. The request set is emptied whatever the outcome.
    pub fn scrape_all(&mut self, min_interval: Duration) -> Result<ScrapeSummary> {
        let requests = std::mem::take(&mut self.requests);
        let root = PathBuf::from(&self.config.site.download_dir);
        let mut summary = ScrapeSummary::new();

        info!(
            "Starting scrape of {} device(s) with a {:?} interval",
            requests.len(),
            min_interval
        );

        for DeviceRequest { key, games } in requests {
            let slot = summary.begin_device(&key);
            let page_url = device_page_url(&self.config.site.base_url, &key.vendor, &key.device);

            info!("Fetching device page {}", page_url);
            let page = match self.throttled(
                min_interval,
                |waited| summary.record_throttle_wait(waited),
                |f| f.fetch_page(&page_url),
            ) {
                Ok(page) => page,
                Err(e) => {
                    let e = ScrapeError::PageUnavailable {
                        url: page_url.clone(),
                        source: Box::new(e),
                    };
                    error!("{}", e);
                    summary.record_page_failure(slot, e.to_string());
                    match self.config.on_page_error {
                        PageErrorPolicy::Abort => {
                            summary.aborted = true;
                            break;
                        }
                        PageErrorPolicy::SkipDevice => continue,
                    }
                }
            };
            summary.set_state(slot, DeviceState::PageFetched);

            let text = flatten_page(&page);
            let mut links = Vec::new();
            for block in game_blocks(&text) {
                if !block.is_wanted(&games) {
                    debug!("Skipping unrequested game {:?}", block.title);
                    continue;
                }
                let block_links = block.download_links();
                info!("Found {} file(s) for {:?}", block_links.len(), block.title);
                summary.record_match(slot, block.title);
                links.extend(block_links.into_iter().map(|link| (block.title.to_string(), link)));
            }
            summary.set_state(slot, DeviceState::BlocksScanned);

            for (game, link) in &links {
                let file = self.throttled(
                    min_interval,
                    |waited| summary.record_throttle_wait(waited),
                    |f| {
                        download_file(f, &root, &page_url, &key.vendor, &key.device, game, link)
                    },
                )?;
                summary.record_download(slot, file.bytes);
            }
            summary.set_state(slot, DeviceState::Done);
        }

        summary.finish();
        info!(
            "Scrape finished: {} file(s), {} bytes, aborted: {}",
            summary.files_downloaded, summary.bytes_written, summary.aborted
        );
        Ok(summary)
    }
}
