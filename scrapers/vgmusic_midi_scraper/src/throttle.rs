use std::{
    thread,
    time::{Duration, Instant},
};
use tracing::debug;

/// Enforces a minimum interval between consecutive outbound requests.
///
/// Each scraper owns its own gate, so independent runs keep independent
/// rate limits.
#[derive(Debug, Default)]
pub struct ThrottleGate {
    last_access: Option<Instant>,
}

impl ThrottleGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blocks until at least `min_interval` has passed since the previous
    /// call returned. The first call never blocks. Returns how long it slept.
    pub fn wait_if_needed(&mut self, min_interval: Duration) -> Duration {
        let mut waited = Duration::ZERO;

        if let Some(last) = self.last_access {
            let elapsed = last.elapsed();
            if elapsed < min_interval {
                waited = min_interval - elapsed;
                debug!("Throttling for {:?} before next request", waited);
                thread::sleep(waited);
            }
        }

        // Recorded on every pass, otherwise one long gap would disable the gate
        self.last_access = Some(Instant::now());
        waited
    }

    pub fn last_access(&self) -> Option<Instant> {
        self.last_access
    }
}
