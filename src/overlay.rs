//! Overlay module wiring sessions, scheduling and rendering together.
//!
//! This module provides the main [`Overlay`] implementation. It loads the display
//! resources, starts the display loop and follows the configured slots until every
//! session has ended.
//!
//! # Architecture
//!
//! The overlay runs two kinds of concurrent tasks:
//!
//! 1. **Display Task**: Owns the [`AlertScheduler`] and the presenter. Displays queued
//!    alerts one at a time and handles queue locks.
//!
//! 2. **Session Tasks**: One per connected slot. Translates the slot's events into alerts
//!    sent to the display task.
//!
//! ```text
//! Feed → Session Task → DisplayHandle → Display Task → Renderer → Presenter
//! ```

use log::{error, info, warn};
use serde_json::Value;

use crate::{
    Args,
    alerts::{AlertKind, AlertRecord, AlertScheduler, DisplayLoop, Priority},
    config::Config,
    render::{AlertRenderer, AssetManifest, Catalog, LogPresenter, Presenter},
    session::{ConnectionHandler, FeedConnector},
};

/// Subject of the alerts requested with `--test-alert`.
const TEST_SLOT: &str = "TestSlot";

/// Main overlay structure, displaying alerts on a `P` surface.
pub struct Overlay<P: Presenter> {
    /// Display loop, not started yet
    display: DisplayLoop<P>,
    /// Session handler holding the only [`crate::alerts::DisplayHandle`]
    handler: ConnectionHandler<FeedConnector>,
    /// Kinds of the test alerts to queue at start-up
    test_alerts: Vec<String>,
}

impl Overlay<LogPresenter> {
    /// Creates a new overlay logging its frames, from configuration and command line
    /// arguments.
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// - The asset manifest cannot be read or parsed
    /// - The fallback translation catalog cannot be loaded
    pub async fn new(config: Config, args: Args) -> Result<Self, anyhow::Error> {
        Self::with_presenter(config, args, LogPresenter::new()).await
    }
}

impl<P: Presenter + 'static> Overlay<P> {
    /// Creates a new overlay displaying its frames on `presenter`.
    ///
    /// See [`Overlay::new`] for the errors.
    pub async fn with_presenter(
        config: Config,
        args: Args,
        presenter: P,
    ) -> Result<Self, anyhow::Error> {
        let manifest = AssetManifest::load(&config.display.manifest).await?;
        let catalog = Catalog::load(
            &config.display.lang_source,
            config.display.lang.as_deref(),
            &config.display.supported_languages,
        )
        .await?;
        info!("captions in {}", catalog.language());

        let renderer = AlertRenderer::new(manifest, Box::new(catalog), config.durations);
        let scheduler = AlertScheduler::new(renderer, presenter);
        let (display, handle) = DisplayLoop::new(scheduler);

        let connector = FeedConnector::new(&config.feed.dir);
        let handler = ConnectionHandler::new(connector, config.server, handle);

        Ok(Overlay {
            display,
            handler,
            test_alerts: args.test_alert,
        })
    }

    /// Starts the overlay.
    ///
    /// Queues the requested test alerts, connects every slot and runs until all sessions
    /// have ended and the remaining alerts have been displayed.
    pub async fn start(self) {
        let Overlay {
            display,
            mut handler,
            test_alerts,
        } = self;

        let display_task = tokio::spawn(display.run());

        for kind in &test_alerts {
            if AlertKind::from_name(kind).is_none() {
                warn!("unknown test alert kind {}", kind);
            }
            info!("queue test alert {}", kind);
            handler.register_alert(
                AlertRecord::from_raw(TEST_SLOT, kind, Value::Null),
                Priority::Low,
            );
        }

        if handler.connect_all().await == 0 {
            warn!("no slot connected");
        } else {
            info!("following {}", handler.sessions().join(", "));
        }
        handler.wait().await;
        info!("all sessions ended");

        // Dropping the last handle lets the display loop drain and stop
        drop(handler);
        if let Err(e) = display_task.await {
            error!("display task failed: {}", e);
        }
    }
}
