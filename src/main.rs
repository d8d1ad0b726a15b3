//! StreamPlot binary: load settings and open the main window.
//!
//! Usage: `streamplot [settings.json]`. Log verbosity follows `RUST_LOG` (default `info`).

use std::path::PathBuf;

use log::{info, warn};

use streamplot::persistence::DEFAULT_SETTINGS_FILE;
use streamplot::{run_app, AppConfig, Settings};

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS_FILE));

    let settings = match Settings::load(&settings_path) {
        Ok(s) => s,
        Err(e) => {
            warn!(
                "ignoring settings in {}: {}",
                settings_path.display(),
                e
            );
            Settings::default()
        }
    };
    info!(
        "sampling every {:?}, keeping {} points per device",
        settings.sampling_interval(),
        settings.max_points
    );

    run_app(AppConfig::from_settings(&settings, settings_path))
}
