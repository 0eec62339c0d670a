use serde::Serialize;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DeviceKey {
    pub vendor: String,
    pub device: String,
}

impl DeviceKey {
    pub fn new(vendor: &str, device: &str) -> Self {
        Self {
            vendor: vendor.to_lowercase(),
            device: device.to_lowercase(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceRequest {
    pub key: DeviceKey,
    pub games: HashSet<String>,
}

/// Games to scrape, grouped by device in first-registration order.
/// All names are stored lower-cased.
#[derive(Debug, Clone, Default)]
pub struct ScrapeRequestSet {
    devices: Vec<DeviceRequest>,
}

impl ScrapeRequestSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_game(&mut self, vendor: &str, device: &str, game: &str) {
        let key = DeviceKey::new(vendor, device);
        let game = game.to_lowercase();

        match self.devices.iter_mut().find(|d| d.key == key) {
            Some(request) => {
                request.games.insert(game);
            }
            None => self.devices.push(DeviceRequest {
                key,
                games: HashSet::from([game]),
            }),
        }
    }

    pub fn games_for(&self, vendor: &str, device: &str) -> Option<&HashSet<String>> {
        let key = DeviceKey::new(vendor, device);
        self.devices.iter().find(|d| d.key == key).map(|d| &d.games)
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DeviceRequest> {
        self.devices.iter()
    }

    pub fn clear(&mut self) {
        self.devices.clear();
    }
}

impl IntoIterator for ScrapeRequestSet {
    type Item = DeviceRequest;
    type IntoIter = std::vec::IntoIter<DeviceRequest>;

    fn into_iter(self) -> Self::IntoIter {
        self.devices.into_iter()
    }
}
