//! Per-kind rendering of alert records into frames.
//!
//! Every alert kind is described by a [`Scene`]: the caption, the asset sets to pick the
//! image and sound from, the visibility class and the visible duration. Missing payloads
//! are replaced by fixed placeholder data, so rendering a known kind never fails.

use std::time::Duration;

use log::{debug, error};
use rand::{SeedableRng, rngs::StdRng};

use crate::{
    alerts::{
        AlertPayload, AlertRecord, ConnectionStatus, DeathDescriptor, HintDescriptor, HintItem,
        ItemDescriptor, PlayerDescriptor,
    },
    config::Durations,
    render::{AssetManifest, AssetSet, Frame, Translator, Visibility},
    utils::string_to_hue,
};

/// Everything needed to build a frame for one alert kind.
struct Scene {
    caption: String,
    images: AssetSet,
    sounds: AssetSet,
    /// Image set used in grayscale when `images` has no candidate
    grayscale_fallback: Option<AssetSet>,
    visibility: Visibility,
    duration: u64,
}

/// Renders alert records using an asset manifest and a translator.
pub struct AlertRenderer {
    manifest: AssetManifest,
    translator: Box<dyn Translator>,
    durations: Durations,
    rng: StdRng,
}

impl AlertRenderer {
    pub fn new(
        manifest: AssetManifest,
        translator: Box<dyn Translator>,
        durations: Durations,
    ) -> Self {
        AlertRenderer {
            manifest,
            translator,
            durations,
            rng: StdRng::from_entropy(),
        }
    }

    /// Renders a record into a frame.
    ///
    /// Returns `None` for an unrecognized kind, after reporting it.
    pub fn render(&mut self, record: &AlertRecord) -> Option<Frame> {
        let subject = record.subject.as_str();
        let scene = match &record.payload {
            AlertPayload::Connection(status) => {
                self.connection_scene(subject, status.unwrap_or(ConnectionStatus::Success))
            }
            AlertPayload::ItemReceived(item) => {
                self.item_scene(subject, item.clone().unwrap_or_else(default_item))
            }
            AlertPayload::TrapReceived(trap) => {
                self.trap_scene(subject, trap.clone().unwrap_or_else(default_trap))
            }
            AlertPayload::GoalReached(player) => {
                self.goal_scene(player.clone().unwrap_or_else(default_player))
            }
            AlertPayload::DeathReceived(death) => {
                self.death_scene(death.clone().unwrap_or_else(default_death))
            }
            AlertPayload::Hint(hint) => {
                self.hint_scene(subject, hint.clone().unwrap_or_else(default_hint))
            }
            AlertPayload::Meta(info) => {
                self.meta_scene(subject, info.as_deref().unwrap_or("TestAlert"))
            }
            AlertPayload::Countdown(value) => self.countdown_scene(value.unwrap_or(0)),
            AlertPayload::Unrecognized(kind) => {
                error!(
                    "{}",
                    self.translator
                        .translate("errors.eventNotImplemented", &[("type", kind.clone())])
                );
                return None;
            }
        };

        Some(self.compose(scene))
    }

    fn compose(&mut self, scene: Scene) -> Frame {
        let mut image = self.manifest.image(scene.images, &mut self.rng);
        let mut grayscale = false;
        if image.is_none()
            && let Some(fallback) = scene.grayscale_fallback
        {
            image = self.manifest.image(fallback, &mut self.rng);
            grayscale = true;
        }
        let sound = self.manifest.sound(scene.sounds, &mut self.rng);

        debug!("picked image {:?} and sound {:?}", image, sound);

        Frame {
            image,
            sound,
            caption: scene.caption,
            visibility: scene.visibility,
            grayscale,
            duration: Duration::from_millis(scene.duration),
        }
    }

    fn connection_scene(&self, subject: &str, status: ConnectionStatus) -> Scene {
        let caption = self.translator.translate(
            &format!("alerts.connection.{}", status.code()),
            &[("slot", player_tag(subject))],
        );
        let (visibility, duration) = match status {
            ConnectionStatus::Success => (Visibility::Short, self.durations.connection_success),
            ConnectionStatus::Failed | ConnectionStatus::Lost => {
                (Visibility::Normal, self.durations.connection_failure)
            }
        };

        Scene {
            caption,
            images: AssetSet::Connection(status),
            sounds: AssetSet::Connection(status),
            grayscale_fallback: None,
            visibility,
            duration,
        }
    }

    fn item_scene(&self, subject: &str, item: ItemDescriptor) -> Scene {
        let caption = self.translator.translate(
            "alerts.itemReceived",
            &[
                ("sender", player_tag(&item.sender.name)),
                ("receiver", player_tag(subject)),
                ("item", item_tag(&item.name, item.progression)),
            ],
        );
        let (assets, duration) = if item.progression {
            (
                AssetSet::ProgressionItemReceived,
                self.durations.progression_item,
            )
        } else {
            (AssetSet::ItemReceived, self.durations.item)
        };

        Scene {
            caption,
            images: assets,
            sounds: assets,
            grayscale_fallback: None,
            visibility: Visibility::Normal,
            duration,
        }
    }

    fn trap_scene(&self, subject: &str, trap: ItemDescriptor) -> Scene {
        let caption = self.translator.translate(
            "alerts.trapReceived",
            &[
                ("trap", format!("<trap>{}</trap>", trap.name)),
                ("sender", player_tag(&trap.sender.name)),
                ("receiver", player_tag(subject)),
            ],
        );

        Scene {
            caption,
            images: AssetSet::TrapReceived,
            sounds: AssetSet::TrapReceived,
            grayscale_fallback: None,
            visibility: Visibility::Normal,
            duration: self.durations.trap,
        }
    }

    fn goal_scene(&self, player: PlayerDescriptor) -> Scene {
        let caption = self
            .translator
            .translate("alerts.goalReceived", &[("sender", player_tag(&player.name))]);

        Scene {
            caption,
            images: AssetSet::GoalCompleted,
            sounds: AssetSet::GoalCompleted,
            grayscale_fallback: None,
            visibility: Visibility::Long,
            duration: self.durations.goal,
        }
    }

    fn death_scene(&self, death: DeathDescriptor) -> Scene {
        let caption = self.translator.translate(
            "alerts.deathReceived",
            &[
                ("victim", player_tag(&death.source)),
                ("reason", format!("<reason>{}</reason>", death.reason)),
            ],
        );

        Scene {
            caption,
            images: AssetSet::Deathlink,
            sounds: AssetSet::Deathlink,
            grayscale_fallback: None,
            visibility: Visibility::Long,
            duration: self.durations.death,
        }
    }

    fn hint_scene(&self, subject: &str, hint: HintDescriptor) -> Scene {
        let mut caption = self.translator.translate(
            "alerts.hintReceived",
            &[
                ("receiver", player_tag(subject)),
                ("item", item_tag(&hint.item.name, hint.item.progression)),
                ("location", location_tag(&hint.item.location_name)),
            ],
        );
        if hint.entrance != "Vanilla" {
            caption.push_str(&format!(" ({})", hint.entrance));
        }

        // An already found hint without its own image reuses the new hint image in grayscale
        let (images, sounds, grayscale_fallback) = if hint.found {
            (AssetSet::OldHint, AssetSet::OldHint, Some(AssetSet::NewHint))
        } else {
            (AssetSet::NewHint, AssetSet::NewHint, None)
        };

        Scene {
            caption,
            images,
            sounds,
            grayscale_fallback,
            visibility: Visibility::Normal,
            duration: self.durations.hint,
        }
    }

    fn meta_scene(&self, subject: &str, info: &str) -> Scene {
        let caption = self.translator.translate(
            "alerts.meta",
            &[("slot", player_tag(subject)), ("info", info.to_owned())],
        );

        Scene {
            caption,
            images: AssetSet::Meta,
            sounds: AssetSet::Meta,
            grayscale_fallback: None,
            visibility: Visibility::Normal,
            duration: self.durations.meta,
        }
    }

    fn countdown_scene(&self, value: u32) -> Scene {
        let go = value == 0;
        let text = if go {
            self.translator.translate("alerts.countdownGO", &[])
        } else {
            value.to_string()
        };
        let caption = format!(
            r#"<timer style="color: hsl({}, 80%, 50%);">{}</timer>"#,
            u64::from(value) * 36,
            text
        );
        let assets = if go {
            AssetSet::CountdownGo
        } else {
            AssetSet::CountdownTimer
        };

        Scene {
            caption,
            images: assets,
            sounds: assets,
            grayscale_fallback: None,
            visibility: Visibility::Short,
            duration: self.durations.countdown,
        }
    }
}

fn player_tag(name: &str) -> String {
    format!(
        r#"<player style="color: hsl({}, 80%, 50%);">{}</player>"#,
        string_to_hue(name),
        name
    )
}

fn item_tag(name: &str, progression: bool) -> String {
    let class = if progression { "progression" } else { "item" };
    format!(r#"<item class="{}">{}</item>"#, class, name)
}

fn location_tag(name: &str) -> String {
    format!(
        r#"<location style="color: hsl({}, 50%, 80%);">{}</location>"#,
        string_to_hue(name),
        name
    )
}

fn default_player() -> PlayerDescriptor {
    PlayerDescriptor {
        name: "TestAlert".to_owned(),
    }
}

fn default_item() -> ItemDescriptor {
    ItemDescriptor {
        name: "TestItem".to_owned(),
        progression: false,
        trap: false,
        sender: PlayerDescriptor {
            name: "TestSender".to_owned(),
        },
    }
}

fn default_trap() -> ItemDescriptor {
    ItemDescriptor {
        name: "TestTrap".to_owned(),
        trap: true,
        ..default_item()
    }
}

fn default_death() -> DeathDescriptor {
    DeathDescriptor {
        source: "TestPlayer".to_owned(),
        time: 0.0,
        reason: "TestAlert".to_owned(),
    }
}

fn default_hint() -> HintDescriptor {
    HintDescriptor {
        entrance: "TestEntrance".to_owned(),
        item: HintItem {
            name: "TestItem".to_owned(),
            progression: false,
            location_name: "TestLocation".to_owned(),
        },
        found: true,
    }
}
