//! Multiworld sessions feeding the overlay.
//!
//! A session follows one slot of a multiworld room and yields [`SessionEvent`]s. The
//! [`ConnectionHandler`] opens one session per configured slot through a
//! [`SessionConnector`] and translates their events into alerts.
//!
//! # Modules
//!
//! - `handler` - Connects slots and forwards their events as alerts
//! - `feed` - A [`SessionConnector`] reading JSON Lines event feeds written by a bridge

mod feed;
mod handler;

use std::{fmt, io};

use mockall::automock;
use serde::Deserialize;
use tokio::sync::mpsc::Receiver;

use crate::{
    alerts::{HintDescriptor, ItemDescriptor, PlayerDescriptor},
    config::Server,
};

pub use crate::session::feed::FeedConnector;
pub use crate::session::handler::ConnectionHandler;

/// An event received from a multiworld session.
///
/// Events are tagged by a snake_case `type` field:
///
/// ```json
/// {"type": "items_received", "index": 3, "items": [{"name": "Sword", "sender": {"name": "Alice"}}]}
/// {"type": "countdown", "text": "Starting countdown of 10s", "value": 10}
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// A batch of items, `index` is the position of the batch in the slot's item history
    ItemsReceived {
        items: Vec<ItemDescriptor>,
        index: u64,
    },
    Goaled {
        player: PlayerDescriptor,
    },
    DeathReceived {
        source: String,
        #[serde(default)]
        time: f64,
        #[serde(default)]
        cause: String,
    },
    HintReceived {
        hint: HintDescriptor,
    },
    /// A hinted location was checked
    HintFound {
        hint: HintDescriptor,
    },
    /// A countdown message, either the announcement (`text` ends with `s`) or a tick
    Countdown {
        text: String,
        value: u32,
    },
    /// Free-text server message
    Status {
        text: String,
    },
}

/// An established session.
#[derive(Debug)]
pub struct Session {
    /// Display name of the slot, as resolved by the connector
    pub slot: String,
    /// Events of the slot, closed when the session ends
    pub events: Receiver<SessionEvent>,
}

/// Errors that can occur while opening a session.
#[derive(Debug)]
pub enum ConnectError {
    /// The session source could not be opened or read
    Io(io::Error),
}

impl fmt::Display for ConnectError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConnectError::Io(e) => write!(f, "unable to open session: {}", e),
        }
    }
}

impl std::error::Error for ConnectError {}

/// Opens sessions on a multiworld server.
///
/// This trait abstracts the transport for easier testing with mocks.
#[automock]
pub trait SessionConnector {
    /// Opens a session following `slot` on `server`.
    async fn connect(&self, server: &Server, slot: &str) -> Result<Session, ConnectError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_events() {
        let event: SessionEvent = serde_json::from_str(
            r#"{"type": "items_received", "index": 2, "items": [{"name": "Sword", "progression": true, "sender": {"name": "Alice"}}]}"#,
        )
        .unwrap();
        let SessionEvent::ItemsReceived { items, index } = event else {
            panic!("expected an item batch");
        };
        assert_eq!(index, 2);
        assert_eq!(items[0].name, "Sword");
        assert!(items[0].progression);

        let event: SessionEvent =
            serde_json::from_str(r#"{"type": "countdown", "text": "Starting countdown of 5s", "value": 5}"#)
                .unwrap();
        assert_eq!(
            event,
            SessionEvent::Countdown {
                text: "Starting countdown of 5s".to_owned(),
                value: 5
            }
        );

        let event: SessionEvent =
            serde_json::from_str(r#"{"type": "death_received", "source": "Bob"}"#).unwrap();
        assert_eq!(
            event,
            SessionEvent::DeathReceived {
                source: "Bob".to_owned(),
                time: 0.0,
                cause: String::new()
            }
        );
    }

    #[test]
    fn test_parse_unknown_event_fails() {
        assert!(serde_json::from_str::<SessionEvent>(r#"{"type": "bounce"}"#).is_err());
        assert!(serde_json::from_str::<SessionEvent>(r#"{"text": "no tag"}"#).is_err());
    }
}
