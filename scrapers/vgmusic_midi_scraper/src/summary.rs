use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

use crate::requests::DeviceKey;

/// Progress of one (vendor, device) pair through a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceState {
    Pending,
    PageFetched,
    BlocksScanned,
    Done,
    Aborted,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeviceOutcome {
    pub vendor: String,
    pub device: String,
    pub state: DeviceState,
    pub matched_games: Vec<String>,
    pub files_downloaded: u64,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScrapeSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub pages_fetched: u64,
    pub pages_failed: u64,
    pub files_downloaded: u64,
    pub bytes_written: u64,
    pub throttle_wait_ms: u64,
    pub aborted: bool,
    pub devices: Vec<DeviceOutcome>,
}

impl Default for ScrapeSummary {
    fn default() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            pages_fetched: 0,
            pages_failed: 0,
            files_downloaded: 0,
            bytes_written: 0,
            throttle_wait_ms: 0,
            aborted: false,
            devices: Vec::new(),
        }
    }
}

impl ScrapeSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_throttle_wait(&mut self, waited: Duration) {
        let waited_ms = u64::try_from(waited.as_millis()).unwrap_or(u64::MAX);
        self.throttle_wait_ms = self.throttle_wait_ms.saturating_add(waited_ms);
    }

    /// Starts tracking `key` and returns its slot.
    pub fn begin_device(&mut self, key: &DeviceKey) -> usize {
        self.devices.push(DeviceOutcome {
            vendor: key.vendor.clone(),
            device: key.device.clone(),
            state: DeviceState::Pending,
            matched_games: Vec::new(),
            files_downloaded: 0,
            error: None,
        });
        self.devices.len() - 1
    }

    pub fn set_state(&mut self, slot: usize, state: DeviceState) {
        if let Some(outcome) = self.devices.get_mut(slot) {
            outcome.state = state;
        }
        if state == DeviceState::PageFetched {
            self.pages_fetched += 1;
        }
    }

    pub fn record_page_failure(&mut self, slot: usize, error: String) {
        self.pages_failed += 1;
        if let Some(outcome) = self.devices.get_mut(slot) {
            outcome.state = DeviceState::Aborted;
            outcome.error = Some(error);
        }
    }

    pub fn record_match(&mut self, slot: usize, game: &str) {
        if let Some(outcome) = self.devices.get_mut(slot) {
            outcome.matched_games.push(game.to_string());
        }
    }

    pub fn record_download(&mut self, slot: usize, bytes: u64) {
        self.files_downloaded += 1;
        self.bytes_written += bytes;
        if let Some(outcome) = self.devices.get_mut(slot) {
            outcome.files_downloaded += 1;
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }
}
