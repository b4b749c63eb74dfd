//! Rendering of alerts into overlay frames.
//!
//! The render layer turns an [`crate::alerts::AlertRecord`] into a [`Frame`]: one image,
//! one sound, a caption and a visibility class, plus how long the frame stays visible.
//! Frames are handed to a [`Presenter`], which owns the actual display surface.
//!
//! # Modules
//!
//! - `assets` - Asset manifest mapping asset sets to candidate image and sound files
//! - `translator` - Translation catalogs with i18next-style keys and interpolation
//! - `renderer` - The per-kind descriptor table producing frames
//! - `log_presenter` - A [`Presenter`] writing frames to the log

mod assets;
mod log_presenter;
mod renderer;
mod translator;

use std::time::Duration;

use mockall::automock;

pub use crate::render::assets::{AssetManifest, AssetSet};
pub use crate::render::log_presenter::LogPresenter;
pub use crate::render::renderer::AlertRenderer;
pub use crate::render::translator::{Catalog, Translator};

#[cfg(test)]
pub(crate) use crate::render::renderer::tests::test_renderer;

/// Visibility class of a frame, driving the fade-out animation length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Short,
    Normal,
    Long,
}

impl Visibility {
    /// Returns the CSS class applied to the overlay for this visibility.
    pub fn css_class(&self) -> &'static str {
        match self {
            Visibility::Short => "hide-short",
            Visibility::Normal => "hide",
            Visibility::Long => "hide-long",
        }
    }
}

/// A fully rendered alert, ready to be presented.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Image to display, `None` when the asset set is empty
    pub image: Option<String>,
    /// Sound to play, `None` when the asset set is empty
    pub sound: Option<String>,
    /// Caption markup, player and item names wrapped in styled tags
    pub caption: String,
    pub visibility: Visibility,
    /// Whether the image is shown in grayscale
    pub grayscale: bool,
    /// How long the frame stays on screen before the next alert
    pub duration: Duration,
}

impl Frame {
    /// Returns the caption with its markup tags removed.
    pub fn plain_caption(&self) -> String {
        let mut plain = String::with_capacity(self.caption.len());
        let mut in_tag = false;
        for c in self.caption.chars() {
            match c {
                '<' => in_tag = true,
                '>' if in_tag => in_tag = false,
                _ if !in_tag => plain.push(c),
                _ => {}
            }
        }
        plain
    }
}

/// The display surface alerts are rendered onto.
///
/// A presenter owns one image slot, one caption slot and one audio slot. It is driven by
/// a single scheduler, which calls [`Presenter::reset`] then [`Presenter::show`] once per
/// display cycle.
#[automock]
pub trait Presenter: Send {
    /// Clears transient modifiers left by the previous frame and restarts the fade-in.
    fn reset(&mut self);
    /// Displays a frame.
    fn show(&mut self, frame: &Frame);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_caption_strips_markup() {
        let frame = Frame {
            image: None,
            sound: None,
            caption: r#"<player style="color: hsl(12, 80%, 50%);">Karl</player> received <item class="progression">Sword</item>"#.to_owned(),
            visibility: Visibility::Normal,
            grayscale: false,
            duration: Duration::from_millis(4000),
        };

        assert_eq!(frame.plain_caption(), "Karl received Sword");
    }

    #[test]
    fn test_css_classes() {
        assert_eq!(Visibility::Short.css_class(), "hide-short");
        assert_eq!(Visibility::Normal.css_class(), "hide");
        assert_eq!(Visibility::Long.css_class(), "hide-long");
    }
}
