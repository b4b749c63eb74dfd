use log::{debug, info};

use crate::render::{Frame, Presenter};

/// A [`Presenter`] writing every frame to the log.
///
/// Used when the overlay runs headless, e.g. to check a catalog or an asset manifest
/// with `--test-alert`.
#[derive(Debug, Default)]
pub struct LogPresenter {
    shown: u64,
}

impl LogPresenter {
    pub fn new() -> Self {
        LogPresenter::default()
    }

    /// Number of frames shown so far.
    pub fn shown(&self) -> u64 {
        self.shown
    }
}

impl Presenter for LogPresenter {
    fn reset(&mut self) {
        debug!("reset overlay");
    }

    fn show(&mut self, frame: &Frame) {
        self.shown += 1;
        info!(
            "[{}] {} (image={}, sound={}, grayscale={}, {}ms)",
            frame.visibility.css_class(),
            frame.plain_caption(),
            frame.image.as_deref().unwrap_or("-"),
            frame.sound.as_deref().unwrap_or("-"),
            frame.grayscale,
            frame.duration.as_millis()
        );
    }
}
