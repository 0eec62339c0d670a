use anyhow::{anyhow, Context, Result};
use clap::Parser;
use dotenv::dotenv;
use tracing::info;
use tracing_subscriber::EnvFilter;

use vgmusic_midi_scraper::{MidiScraper, PageErrorPolicy, ScraperConfig};

#[derive(Debug, Clone, PartialEq, Eq)]
struct GameSpec {
    vendor: String,
    device: String,
    game: String,
}

// The game title may itself contain slashes
fn parse_game_spec(value: &str) -> Result<GameSpec> {
    let mut parts = value.splitn(3, '/');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(vendor), Some(device), Some(game))
            if !vendor.trim().is_empty() && !device.trim().is_empty() && !game.trim().is_empty() =>
        {
            Ok(GameSpec {
                vendor: vendor.trim().to_string(),
                device: device.trim().to_string(),
                game: game.trim().to_string(),
            })
        }
        _ => Err(anyhow!("Expected VENDOR/DEVICE/GAME, got {:?}", value)),
    }
}

#[derive(Debug, Parser)]
#[command(author, version, about = "Download game MIDI files from vgmusic.com", long_about = None)]
struct Cli {
    /// Game to download, as VENDOR/DEVICE/GAME (e.g. "sega/dreamcast/Sonic Adventure")
    #[arg(short, long = "game", required = true, value_parser = parse_game_spec)]
    games: Vec<GameSpec>,

    /// Minimum seconds between requests (overrides RATE_LIMIT_INTERVAL_SECS)
    #[arg(short, long)]
    interval: Option<f64>,

    /// Download directory (overrides VGMUSIC_DOWNLOAD_DIR)
    #[arg(short, long)]
    out: Option<String>,

    /// Keep going when a device page cannot be fetched
    #[arg(long)]
    skip_failed_pages: bool,

    /// Print the run summary as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let mut config = ScraperConfig::from_env();

    if let Some(interval) = cli.interval {
        if !interval.is_finite() || interval < 0.0 {
            return Err(anyhow!("Interval must be a non-negative number of seconds"));
        }
        config.rate_limits.min_interval_secs = interval;
    }
    if let Some(out) = cli.out {
        config.site.download_dir = out;
    }
    if cli.skip_failed_pages {
        config.on_page_error = PageErrorPolicy::SkipDevice;
    }

    let min_interval = config.rate_limits.min_interval();
    let mut scraper = MidiScraper::new(config).context("Failed to create HTTP client")?;
    for spec in &cli.games {
        info!("Queueing {} / {} / {}", spec.vendor, spec.device, spec.game);
        scraper.add_game(&spec.vendor, &spec.device, &spec.game);
    }

    let summary = scraper.scrape_all(min_interval).context("Scrape failed")?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!(
            "Downloaded {} file(s) ({} bytes) from {} page(s){}",
            summary.files_downloaded,
            summary.bytes_written,
            summary.pages_fetched,
            if summary.aborted { "; run aborted early" } else { "" }
        );
    }

    Ok(())
}
