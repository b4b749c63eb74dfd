//! Alert records and their typed payloads.
//!
//! This module provides the [`AlertRecord`] struct, one pending notification for the
//! overlay, along with the [`AlertKind`] enumeration and the kind-specific payload
//! descriptors. Payloads are typed per kind but every descriptor is optional: a missing
//! or malformed payload is kept as `None` and replaced by fallback data at render time.

use std::fmt;

use log::debug;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

/// Closed set of alert kinds the overlay knows how to display.
///
/// The serialized names are kebab-case (`item-received`, `death-received`, ...), which
/// is also what [`AlertKind::from_name`] accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlertKind {
    /// Session connection status change
    Connection,
    /// A regular or progression item was received
    ItemReceived,
    /// A trap item was received
    TrapReceived,
    /// A player completed their goal
    GoalReached,
    /// A death link was received
    DeathReceived,
    /// A hint was received or found
    Hint,
    /// Free-text informational message
    Meta,
    /// A countdown tick, `0` meaning "go"
    Countdown,
}

impl AlertKind {
    /// Every kind, in declaration order.
    pub const ALL: [AlertKind; 8] = [
        AlertKind::Connection,
        AlertKind::ItemReceived,
        AlertKind::TrapReceived,
        AlertKind::GoalReached,
        AlertKind::DeathReceived,
        AlertKind::Hint,
        AlertKind::Meta,
        AlertKind::Countdown,
    ];

    /// Returns the kebab-case name of the kind.
    pub fn name(&self) -> &'static str {
        match self {
            AlertKind::Connection => "connection",
            AlertKind::ItemReceived => "item-received",
            AlertKind::TrapReceived => "trap-received",
            AlertKind::GoalReached => "goal-reached",
            AlertKind::DeathReceived => "death-received",
            AlertKind::Hint => "hint",
            AlertKind::Meta => "meta",
            AlertKind::Countdown => "countdown",
        }
    }

    /// Looks a kind up by its kebab-case name.
    ///
    /// Returns `None` for names that do not belong to the closed set.
    pub fn from_name(name: &str) -> Option<AlertKind> {
        AlertKind::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Connection status carried by a [`AlertKind::Connection`] alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    /// The session is connected
    Success,
    /// The session could not be established
    Failed,
    /// An established session went away
    Lost,
}

impl ConnectionStatus {
    /// Returns the status code used in translation keys and asset sets.
    pub fn code(&self) -> &'static str {
        match self {
            ConnectionStatus::Success => "success",
            ConnectionStatus::Failed => "failed",
            ConnectionStatus::Lost => "lost",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerDescriptor {
    /// Display name of the player
    pub name: String,
}

/// An item sent from one slot to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDescriptor {
    /// Item name
    pub name: String,
    /// Whether the item unlocks progression
    #[serde(default)]
    pub progression: bool,
    /// Whether the item is a trap
    #[serde(default)]
    pub trap: bool,
    /// Player who sent the item
    pub sender: PlayerDescriptor,
}

/// A death link broadcast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeathDescriptor {
    /// Name of the player who died
    pub source: String,
    /// Timestamp of the death, as sent by the server
    #[serde(default)]
    pub time: f64,
    /// Free-text cause of death
    #[serde(default, alias = "cause")]
    pub reason: String,
}

/// The item a hint points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HintItem {
    pub name: String,
    #[serde(default)]
    pub progression: bool,
    /// Location where the item can be found
    pub location_name: String,
}

/// A hint about where an item is located.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HintDescriptor {
    /// Entrance leading to the location, `Vanilla` when not randomized
    #[serde(default = "vanilla_entrance")]
    pub entrance: String,
    pub item: HintItem,
    /// Whether the hinted location was already checked
    #[serde(default)]
    pub found: bool,
}

fn vanilla_entrance() -> String {
    "Vanilla".to_owned()
}

/// Kind-specific payload of an alert.
///
/// Each variant matches one [`AlertKind`]. The descriptor is `None` when the payload was
/// missing or failed validation; the renderer then substitutes fallback data so that a
/// display cycle always completes. [`AlertPayload::Unrecognized`] keeps the name of a kind
/// outside the closed set.
#[derive(Debug, Clone, PartialEq)]
pub enum AlertPayload {
    Connection(Option<ConnectionStatus>),
    ItemReceived(Option<ItemDescriptor>),
    TrapReceived(Option<ItemDescriptor>),
    GoalReached(Option<PlayerDescriptor>),
    DeathReceived(Option<DeathDescriptor>),
    Hint(Option<HintDescriptor>),
    Meta(Option<String>),
    Countdown(Option<u32>),
    Unrecognized(String),
}

/// Connection payloads arrive as `{"code": "success"}`.
#[derive(Deserialize)]
struct ConnectionPayload {
    code: ConnectionStatus,
}

impl AlertPayload {
    /// Validates an untyped payload against the shape expected for `kind`.
    ///
    /// A `null` or malformed payload yields the kind's variant with `None`.
    pub fn parse(kind: AlertKind, raw: Value) -> Self {
        match kind {
            AlertKind::Connection => AlertPayload::Connection(
                decode::<ConnectionPayload>(kind, raw).map(|payload| payload.code),
            ),
            AlertKind::ItemReceived => AlertPayload::ItemReceived(decode(kind, raw)),
            AlertKind::TrapReceived => AlertPayload::TrapReceived(decode(kind, raw)),
            AlertKind::GoalReached => AlertPayload::GoalReached(decode(kind, raw)),
            AlertKind::DeathReceived => AlertPayload::DeathReceived(decode(kind, raw)),
            AlertKind::Hint => AlertPayload::Hint(decode(kind, raw)),
            AlertKind::Meta => AlertPayload::Meta(
                decode::<String>(kind, raw).filter(|text| !text.is_empty()),
            ),
            AlertKind::Countdown => AlertPayload::Countdown(decode(kind, raw)),
        }
    }

    /// Returns the kind of the payload, `None` for unrecognized kinds.
    pub fn kind(&self) -> Option<AlertKind> {
        match self {
            AlertPayload::Connection(_) => Some(AlertKind::Connection),
            AlertPayload::ItemReceived(_) => Some(AlertKind::ItemReceived),
            AlertPayload::TrapReceived(_) => Some(AlertKind::TrapReceived),
            AlertPayload::GoalReached(_) => Some(AlertKind::GoalReached),
            AlertPayload::DeathReceived(_) => Some(AlertKind::DeathReceived),
            AlertPayload::Hint(_) => Some(AlertKind::Hint),
            AlertPayload::Meta(_) => Some(AlertKind::Meta),
            AlertPayload::Countdown(_) => Some(AlertKind::Countdown),
            AlertPayload::Unrecognized(_) => None,
        }
    }
}

fn decode<T: DeserializeOwned>(kind: AlertKind, raw: Value) -> Option<T> {
    if raw.is_null() {
        return None;
    }

    match serde_json::from_value(raw) {
        Ok(payload) => Some(payload),
        Err(e) => {
            debug!("malformed {} payload, falling back to defaults: {}", kind, e);
            None
        }
    }
}

/// One notification waiting to be displayed.
///
/// The record is owned by the queue from push until pop and dropped after rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertRecord {
    /// Player or slot the alert concerns
    pub subject: String,
    /// Kind and kind-specific data
    pub payload: AlertPayload,
}

impl AlertRecord {
    pub fn new(subject: impl Into<String>, payload: AlertPayload) -> Self {
        AlertRecord {
            subject: subject.into(),
            payload,
        }
    }

    /// Builds a record from an untyped boundary value.
    ///
    /// # Arguments
    ///
    /// * `subject` - Player or slot the alert concerns
    /// * `kind` - Kebab-case kind name, see [`AlertKind::from_name`]
    /// * `raw` - Untyped payload, validated against the kind
    ///
    /// An unknown `kind` produces an [`AlertPayload::Unrecognized`] record rather than an
    /// error, the scheduler reports and skips it.
    pub fn from_raw(subject: impl Into<String>, kind: &str, raw: Value) -> Self {
        let payload = match AlertKind::from_name(kind) {
            Some(kind) => AlertPayload::parse(kind, raw),
            None => AlertPayload::Unrecognized(kind.to_owned()),
        };

        AlertRecord::new(subject, payload)
    }

    /// Returns the kind name, including the name of an unrecognized kind.
    pub fn kind_name(&self) -> &str {
        match (&self.payload, self.payload.kind()) {
            (AlertPayload::Unrecognized(kind), _) => kind,
            (_, Some(kind)) => kind.name(),
            (_, None) => "unknown",
        }
    }
}

impl fmt::Display for AlertRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "subject={}, kind={}", self.subject, self.kind_name())
    }
}
