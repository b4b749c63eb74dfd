//! apalerts - A notification overlay for Archipelago multiworld sessions.
//!
//! This is the main entry point of the overlay, which follows one or more slots of a
//! multiworld room and displays their events (received items, traps, deaths, hints,
//! countdowns...) one at a time.
//!
//! # Overview
//!
//! Events are read from per-slot feeds written by a bridge connected to the multiworld
//! server. Each event becomes an alert, queued and displayed for a kind-specific duration.
//! Countdowns lock the queue so that only the countdown ticks are displayed until "GO".
//!
//! # Configuration
//!
//! Create a `config.yaml` file with your settings:
//!
//! ```yaml
//! server:
//!   host: "archipelago.gg"
//!   port: 38281
//!   slots: ["Karl"]
//!
//! feed:
//!   dir: "./feeds"
//! ```
//!
//! # Environment Variable Overrides
//!
//! Override any configuration value using environment variables with the `APALERTS_`
//! prefix:
//!
//! ```bash
//! export APALERTS_SERVER__PORT=38282
//! export APALERTS_DISPLAY__LANG="de-DE"
//! ```
//!
//! # Usage
//!
//! ```bash
//! apalerts --config config.yaml
//! apalerts --config config.yaml --test-alert item-received --test-alert death-received
//! ```
//!
//! # Architecture
//!
//! - [`alerts`] - Alert records, the priority queue, the scheduler and the display loop
//! - [`config`] - YAML configuration file structures and loading
//! - [`overlay`] - Wiring of sessions, scheduling and rendering
//! - [`render`] - Assets, translations and per-kind rendering into frames
//! - [`session`] - Slot sessions and their translation into alerts
//! - [`utils`] - Utility functions for paths and caption colours
//!
//! # Environment Variables
//!
//! - `RUST_LOG` - Controls logging level (default: `info`)

use clap::Parser;
use env_logger::Env;
use log::{error, info};

use crate::{config::Config, overlay::Overlay};

mod alerts;
mod config;
mod overlay;
mod render;
mod session;
mod utils;

/// Command-line arguments of the overlay.
///
/// # Examples
///
/// ```bash
/// apalerts --config config.yaml --test-alert hint
/// ```
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the YAML configuration file.
    ///
    /// See the [`config`] module for the expected format.
    #[arg(short, long)]
    config: String,

    /// Alert kind to display once at start-up with placeholder data, can be repeated.
    ///
    /// Kinds: connection, item-received, trap-received, goal-reached, death-received,
    /// hint, meta, countdown.
    #[arg(short, long)]
    test_alert: Vec<String>,
}

#[tokio::main]
async fn main() {
    // Put logger at info level by default
    let env = Env::default().filter_or("RUST_LOG", "info");
    env_logger::init_from_env(env);

    info!("Starting apalerts {}...", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();

    let config = match Config::load(&args.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load config file: {}", e);
            return;
        }
    };
    if let Err(e) = config.validate() {
        error!("Invalid config file: {}", e);
        return;
    }

    let overlay = match Overlay::new(config, args).await {
        Ok(o) => o,
        Err(e) => {
            error!("Failed to initialize overlay: {}", e);
            return;
        }
    };
    overlay.start().await;
}
