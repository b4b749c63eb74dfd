//! Asset manifest for overlay images and sounds.
//!
//! The manifest is a JSON file with an `images` and a `sfx` section, each mapping an
//! asset set to a list of candidate files:
//!
//! ```json
//! {
//!   "images": {
//!     "itemReceived": ["img/chest.gif"],
//!     "progressionItemReceived": ["img/key.gif"],
//!     "connection": { "success": ["img/plug.png"], "failed": [], "lost": [] }
//!   },
//!   "sfx": {
//!     "itemReceived": ["sfx/ding.mp3"]
//!   }
//! }
//! ```
//!
//! Missing sets are empty, an empty set simply yields no asset.

use std::{fmt, io};

use log::info;
use rand::{Rng, seq::SliceRandom};
use serde::Deserialize;
use tokio::fs;

use crate::alerts::ConnectionStatus;

/// A named group of interchangeable assets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetSet {
    Meta,
    ItemReceived,
    ProgressionItemReceived,
    TrapReceived,
    GoalCompleted,
    Deathlink,
    NewHint,
    OldHint,
    CountdownTimer,
    CountdownGo,
    Connection(ConnectionStatus),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct ConnectionAssets {
    success: Vec<String>,
    failed: Vec<String>,
    lost: Vec<String>,
}

/// Candidate files for every asset set of one media type.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct AssetLists {
    meta: Vec<String>,
    item_received: Vec<String>,
    progression_item_received: Vec<String>,
    trap_received: Vec<String>,
    goal_completed: Vec<String>,
    deathlink: Vec<String>,
    new_hint: Vec<String>,
    old_hint: Vec<String>,
    countdown_timer: Vec<String>,
    countdown_go: Vec<String>,
    connection: ConnectionAssets,
}

impl AssetLists {
    fn candidates(&self, set: AssetSet) -> &[String] {
        match set {
            AssetSet::Meta => &self.meta,
            AssetSet::ItemReceived => &self.item_received,
            AssetSet::ProgressionItemReceived => &self.progression_item_received,
            AssetSet::TrapReceived => &self.trap_received,
            AssetSet::GoalCompleted => &self.goal_completed,
            AssetSet::Deathlink => &self.deathlink,
            AssetSet::NewHint => &self.new_hint,
            AssetSet::OldHint => &self.old_hint,
            AssetSet::CountdownTimer => &self.countdown_timer,
            AssetSet::CountdownGo => &self.countdown_go,
            AssetSet::Connection(ConnectionStatus::Success) => &self.connection.success,
            AssetSet::Connection(ConnectionStatus::Failed) => &self.connection.failed,
            AssetSet::Connection(ConnectionStatus::Lost) => &self.connection.lost,
        }
    }
}

/// Errors that can occur while loading the asset manifest.
#[derive(Debug)]
pub enum ManifestError {
    /// The manifest file could not be read
    Io(io::Error),
    /// The manifest is not valid JSON or has an unexpected shape
    Parse(serde_json::Error),
}

impl fmt::Display for ManifestError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ManifestError::Io(e) => write!(f, "unable to read asset manifest: {}", e),
            ManifestError::Parse(e) => write!(f, "invalid asset manifest: {}", e),
        }
    }
}

impl std::error::Error for ManifestError {}

/// Maps asset sets to candidate image and sound files.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AssetManifest {
    images: AssetLists,
    sfx: AssetLists,
}

impl AssetManifest {
    /// Parses a manifest from its JSON representation.
    pub fn from_json(json: &str) -> Result<Self, ManifestError> {
        serde_json::from_str(json).map_err(ManifestError::Parse)
    }

    /// Loads the manifest file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::Io`] if the file cannot be read and
    /// [`ManifestError::Parse`] if its content is not a valid manifest.
    pub async fn load(path: &str) -> Result<Self, ManifestError> {
        let json = fs::read_to_string(path).await.map_err(ManifestError::Io)?;
        let manifest = Self::from_json(&json)?;
        info!("loaded asset manifest {}", path);
        Ok(manifest)
    }

    /// Picks an image of `set` uniformly at random.
    pub fn image<R: Rng + ?Sized>(&self, set: AssetSet, rng: &mut R) -> Option<String> {
        self.images.candidates(set).choose(rng).cloned()
    }

    /// Picks a sound of `set` uniformly at random.
    pub fn sound<R: Rng + ?Sized>(&self, set: AssetSet, rng: &mut R) -> Option<String> {
        self.sfx.candidates(set).choose(rng).cloned()
    }
}
