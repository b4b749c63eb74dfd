//! Session lifecycle and event forwarding.
//!
//! This module provides the [`ConnectionHandler`] which opens one session per configured
//! slot and spawns a forwarding task per session. Forwarding translates
//! [`SessionEvent`]s into alert records sent to the display loop.

use std::time::Duration;

use futures::{StreamExt, stream::FuturesUnordered};
use log::{debug, error, info, warn};
use tokio::{sync::mpsc::Receiver, task::JoinHandle};

use crate::{
    alerts::{AlertPayload, AlertRecord, ConnectionStatus, DeathDescriptor, DisplayHandle, Priority},
    config::Server,
    session::{SessionConnector, SessionEvent},
};

/// Connects the configured slots and forwards their events as alerts.
///
/// The first slot that connects successfully is the primary session: only its countdown
/// events are displayed, so that a countdown seen by every slot shows up once.
pub struct ConnectionHandler<C: SessionConnector> {
    connector: C,
    server: Server,
    display: DisplayHandle,
    /// Resolved names of the connected slots, in connection order
    sessions: Vec<String>,
    /// Forwarding task of each connected slot
    tasks: Vec<JoinHandle<()>>,
}

impl<C: SessionConnector> ConnectionHandler<C> {
    pub fn new(connector: C, server: Server, display: DisplayHandle) -> Self {
        ConnectionHandler {
            connector,
            server,
            display,
            sessions: Vec::new(),
            tasks: Vec::new(),
        }
    }

    /// Connects every configured slot.
    ///
    /// Slots are connected concurrently and each one is handled as soon as its connect
    /// completes: a connected slot gets its `success` alert and starts forwarding events
    /// while the other slots are still connecting. A failed slot is reported with a
    /// `failed` connection alert and skipped.
    ///
    /// # Returns
    ///
    /// The number of connected slots.
    pub async fn connect_all(&mut self) -> usize {
        let ConnectionHandler {
            connector,
            server,
            display,
            sessions,
            tasks,
        } = self;
        let (connector, server) = (&*connector, &*server);
        info!(
            "connecting {} slots to {}",
            server.slots.len(),
            server.address()
        );

        let mut connecting: FuturesUnordered<_> = server
            .slots
            .iter()
            .map(|slot| async move { (slot, connector.connect(server, slot).await) })
            .collect();

        while let Some((slot, result)) = connecting.next().await {
            match result {
                Ok(session) => {
                    let primary = sessions.is_empty();
                    info!(
                        "connected slot {} as {} (primary={})",
                        slot, session.slot, primary
                    );

                    display.register_alert(
                        connection_alert(&session.slot, ConnectionStatus::Success),
                        Priority::Low,
                    );

                    let forwarder = SessionForwarder {
                        slot: session.slot.to_owned(),
                        primary,
                        display: display.clone(),
                    };
                    sessions.push(session.slot);
                    tasks.push(tokio::spawn(forwarder.forward(session.events)));
                }
                Err(e) => {
                    error!("failed to connect slot {}: {}", slot, e);
                    display.register_alert(
                        connection_alert(slot, ConnectionStatus::Failed),
                        Priority::Low,
                    );
                }
            }
        }

        sessions.len()
    }

    /// Queues an alert, e.g. a test alert requested on the command line.
    pub fn register_alert(&self, record: AlertRecord, priority: Priority) {
        self.display.register_alert(record, priority);
    }

    /// Names of the connected slots, the primary one first.
    pub fn sessions(&self) -> &[String] {
        &self.sessions
    }

    /// Waits until every session has ended.
    pub async fn wait(&mut self) {
        for task in self.tasks.drain(..) {
            if let Err(e) = task.await {
                error!("session task failed: {}", e);
            }
        }
    }
}

fn connection_alert(slot: &str, status: ConnectionStatus) -> AlertRecord {
    AlertRecord::new(slot, AlertPayload::Connection(Some(status)))
}

/// Translates the events of one session into alerts.
struct SessionForwarder {
    slot: String,
    primary: bool,
    display: DisplayHandle,
}

impl SessionForwarder {
    /// Forwards events until the session closes, then reports the lost connection.
    async fn forward(self, mut events: Receiver<SessionEvent>) {
        while let Some(event) = events.recv().await {
            debug!("session {} event {:?}", self.slot, event);
            self.on_event(event);
        }

        warn!("session {} closed", self.slot);
        self.display.register_alert(
            connection_alert(&self.slot, ConnectionStatus::Lost),
            Priority::Low,
        );
    }

    fn on_event(&self, event: SessionEvent) {
        match event {
            SessionEvent::ItemsReceived { items, index } => {
                // The first batch replays items the slot already owns
                if index == 0 {
                    debug!("ignore initial batch of {} items", items.len());
                    return;
                }
                for item in items {
                    let payload = if item.trap {
                        AlertPayload::TrapReceived(Some(item))
                    } else {
                        AlertPayload::ItemReceived(Some(item))
                    };
                    self.push(payload, Priority::Low);
                }
            }
            SessionEvent::Goaled { player } => {
                self.push(AlertPayload::GoalReached(Some(player)), Priority::Low)
            }
            SessionEvent::DeathReceived {
                source,
                time,
                cause,
            } => self.push(
                AlertPayload::DeathReceived(Some(DeathDescriptor {
                    source,
                    time,
                    reason: cause,
                })),
                Priority::Low,
            ),
            SessionEvent::HintReceived { hint } => {
                self.push(AlertPayload::Hint(Some(hint)), Priority::Low)
            }
            SessionEvent::HintFound { mut hint } => {
                hint.found = true;
                self.push(AlertPayload::Hint(Some(hint)), Priority::Low);
            }
            SessionEvent::Countdown { text, value } => self.on_countdown(&text, value),
            SessionEvent::Status { text } => {
                let info = Some(text).filter(|text| !text.is_empty());
                self.push(AlertPayload::Meta(info), Priority::Low);
            }
        }
    }

    fn on_countdown(&self, text: &str, value: u32) {
        if !self.primary {
            debug!("ignore countdown of secondary session {}", self.slot);
            return;
        }

        // "Starting countdown of 10s" announces the length, ticks follow
        if text.trim_end().ends_with('s') {
            info!("countdown of {}s announced", value);
            self.display
                .lock_queue_for(Duration::from_secs(u64::from(value)));
            return;
        }

        self.push(AlertPayload::Countdown(Some(value)), Priority::Critical);
        if value == 0 {
            self.display.unlock_queue();
        }
    }

    fn push(&self, payload: AlertPayload, priority: Priority) {
        self.display
            .register_alert(AlertRecord::new(&self.slot, payload), priority);
    }
}

#[cfg(test)]
mod tests {
    use std::{io, sync::Mutex};

    use tokio::{
        sync::mpsc::{self, UnboundedReceiver},
        time,
    };

    use super::*;
    use crate::{
        alerts::{DisplayCommand, HintDescriptor, HintItem, ItemDescriptor, PlayerDescriptor},
        session::{ConnectError, MockSessionConnector, Session},
    };

    fn server(slots: &[&str]) -> Server {
        Server {
            host: "localhost".to_owned(),
            port: 38281,
            slots: slots.iter().map(|s| s.to_string()).collect(),
            password: None,
        }
    }

    fn item(name: &str, trap: bool) -> ItemDescriptor {
        ItemDescriptor {
            name: name.to_owned(),
            progression: false,
            trap,
            sender: PlayerDescriptor {
                name: "Alice".to_owned(),
            },
        }
    }

    fn hint(found: bool) -> HintDescriptor {
        HintDescriptor {
            entrance: "Vanilla".to_owned(),
            item: HintItem {
                name: "Hookshot".to_owned(),
                progression: true,
                location_name: "Deku Tree".to_owned(),
            },
            found,
        }
    }

    fn register(slot: &str, payload: AlertPayload, priority: Priority) -> DisplayCommand {
        DisplayCommand::Register(AlertRecord::new(slot, payload), priority)
    }

    fn drain(commands: &mut UnboundedReceiver<DisplayCommand>) -> Vec<DisplayCommand> {
        let mut drained = Vec::new();
        while let Ok(command) = commands.try_recv() {
            drained.push(command);
        }
        drained
    }

    /// Runs a forwarder over `events` until the session closes.
    async fn forward(primary: bool, events: Vec<SessionEvent>) -> Vec<DisplayCommand> {
        let (display, mut commands) = DisplayHandle::channel();
        let (sender, receiver) = mpsc::channel(16);
        for event in events {
            sender.send(event).await.unwrap();
        }
        drop(sender);

        let forwarder = SessionForwarder {
            slot: "Karl".to_owned(),
            primary,
            display,
        };
        forwarder.forward(receiver).await;
        drain(&mut commands)
    }

    #[tokio::test]
    async fn test_connect_all_isolates_failures() {
        let (display, mut commands) = DisplayHandle::channel();
        let (karl_events, karl_receiver) = mpsc::channel(16);
        let (eve_events, eve_receiver) = mpsc::channel(16);

        let mut connector = MockSessionConnector::new();
        connector
            .expect_connect()
            .withf(|_, slot| slot == "Karl")
            .times(1)
            .return_once(move |_, _| {
                Ok(Session {
                    slot: "Karl".to_owned(),
                    events: karl_receiver,
                })
            });
        connector
            .expect_connect()
            .withf(|_, slot| slot == "Bob")
            .times(1)
            .return_once(|_, _| {
                Err(ConnectError::Io(io::Error::new(
                    io::ErrorKind::ConnectionRefused,
                    "refused",
                )))
            });
        connector
            .expect_connect()
            .withf(|_, slot| slot == "Eve")
            .times(1)
            .return_once(move |_, _| {
                Ok(Session {
                    slot: "Eve (Hyrule)".to_owned(),
                    events: eve_receiver,
                })
            });

        let mut handler = ConnectionHandler::new(connector, server(&["Karl", "Bob", "Eve"]), display);
        assert_eq!(handler.connect_all().await, 2);
        assert_eq!(handler.sessions(), ["Karl", "Eve (Hyrule)"]);

        assert_eq!(
            drain(&mut commands),
            vec![
                register(
                    "Karl",
                    AlertPayload::Connection(Some(ConnectionStatus::Success)),
                    Priority::Low
                ),
                register(
                    "Bob",
                    AlertPayload::Connection(Some(ConnectionStatus::Failed)),
                    Priority::Low
                ),
                register(
                    "Eve (Hyrule)",
                    AlertPayload::Connection(Some(ConnectionStatus::Success)),
                    Priority::Low
                ),
            ]
        );

        // Only the primary session drives countdowns
        let tick = SessionEvent::Countdown {
            text: "3".to_owned(),
            value: 3,
        };
        eve_events.send(tick.clone()).await.unwrap();
        karl_events.send(tick).await.unwrap();
        drop(eve_events);
        drop(karl_events);
        handler.wait().await;

        let mut forwarded = drain(&mut commands);
        forwarded.sort_by_key(|command| format!("{:?}", command));
        assert_eq!(
            forwarded,
            vec![
                register(
                    "Eve (Hyrule)",
                    AlertPayload::Connection(Some(ConnectionStatus::Lost)),
                    Priority::Low
                ),
                register(
                    "Karl",
                    AlertPayload::Connection(Some(ConnectionStatus::Lost)),
                    Priority::Low
                ),
                register("Karl", AlertPayload::Countdown(Some(3)), Priority::Critical),
            ]
        );
    }

    /// Connects `Karl` right away and never completes the connect of any other slot.
    struct StalledConnector {
        karl: Mutex<Option<Receiver<SessionEvent>>>,
    }

    impl SessionConnector for StalledConnector {
        async fn connect(&self, _server: &Server, slot: &str) -> Result<Session, ConnectError> {
            if slot != "Karl" {
                return std::future::pending().await;
            }
            let events = self.karl.lock().unwrap().take().unwrap();
            Ok(Session {
                slot: slot.to_owned(),
                events,
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_slot_does_not_block_others() {
        let (display, mut commands) = DisplayHandle::channel();
        let (karl_events, karl_receiver) = mpsc::channel(16);
        karl_events
            .send(SessionEvent::Status {
                text: "Karl has joined".to_owned(),
            })
            .await
            .unwrap();

        let connector = StalledConnector {
            karl: Mutex::new(Some(karl_receiver)),
        };
        let mut handler = ConnectionHandler::new(connector, server(&["Hung", "Karl"]), display);

        let connecting = time::timeout(Duration::from_secs(60), handler.connect_all()).await;
        assert!(connecting.is_err());

        assert_eq!(
            drain(&mut commands),
            vec![
                register(
                    "Karl",
                    AlertPayload::Connection(Some(ConnectionStatus::Success)),
                    Priority::Low
                ),
                register(
                    "Karl",
                    AlertPayload::Meta(Some("Karl has joined".to_owned())),
                    Priority::Low
                ),
            ]
        );
        assert_eq!(handler.sessions(), ["Karl"]);
        drop(karl_events);
    }

    #[tokio::test]
    async fn test_custom_alert_is_forwarded() {
        let (display, mut commands) = DisplayHandle::channel();
        let handler = ConnectionHandler::new(MockSessionConnector::new(), server(&["Karl"]), display);

        let record = AlertRecord::new("TestSlot", AlertPayload::Meta(None));
        handler.register_alert(record.clone(), Priority::Low);

        assert_eq!(
            drain(&mut commands),
            vec![DisplayCommand::Register(record, Priority::Low)]
        );
        assert!(handler.sessions().is_empty());
    }

    #[tokio::test]
    async fn test_first_item_batch_is_suppressed() {
        let commands = forward(
            true,
            vec![
                SessionEvent::ItemsReceived {
                    items: vec![item("Rupee", false), item("Sword", false)],
                    index: 0,
                },
                SessionEvent::ItemsReceived {
                    items: vec![item("Bow", false), item("Ice Trap", true)],
                    index: 2,
                },
            ],
        )
        .await;

        assert_eq!(
            commands,
            vec![
                register(
                    "Karl",
                    AlertPayload::ItemReceived(Some(item("Bow", false))),
                    Priority::Low
                ),
                register(
                    "Karl",
                    AlertPayload::TrapReceived(Some(item("Ice Trap", true))),
                    Priority::Low
                ),
                register(
                    "Karl",
                    AlertPayload::Connection(Some(ConnectionStatus::Lost)),
                    Priority::Low
                ),
            ]
        );
    }

    #[tokio::test]
    async fn test_countdown_events() {
        let commands = forward(
            true,
            vec![
                SessionEvent::Countdown {
                    text: "Starting countdown of 3s".to_owned(),
                    value: 3,
                },
                SessionEvent::Countdown {
                    text: "2".to_owned(),
                    value: 2,
                },
                SessionEvent::Countdown {
                    text: "GO".to_owned(),
                    value: 0,
                },
            ],
        )
        .await;

        assert_eq!(
            commands,
            vec![
                DisplayCommand::LockFor(Duration::from_secs(3)),
                register("Karl", AlertPayload::Countdown(Some(2)), Priority::Critical),
                register("Karl", AlertPayload::Countdown(Some(0)), Priority::Critical),
                DisplayCommand::Unlock,
                register(
                    "Karl",
                    AlertPayload::Connection(Some(ConnectionStatus::Lost)),
                    Priority::Low
                ),
            ]
        );
    }

    #[tokio::test]
    async fn test_secondary_session_ignores_countdown() {
        let commands = forward(
            false,
            vec![SessionEvent::Countdown {
                text: "Starting countdown of 3s".to_owned(),
                value: 3,
            }],
        )
        .await;

        assert_eq!(
            commands,
            vec![register(
                "Karl",
                AlertPayload::Connection(Some(ConnectionStatus::Lost)),
                Priority::Low
            )]
        );
    }

    #[tokio::test]
    async fn test_other_events() {
        let commands = forward(
            false,
            vec![
                SessionEvent::Goaled {
                    player: PlayerDescriptor {
                        name: "Alice".to_owned(),
                    },
                },
                SessionEvent::DeathReceived {
                    source: "Bob".to_owned(),
                    time: 12.5,
                    cause: "lava".to_owned(),
                },
                SessionEvent::HintReceived { hint: hint(false) },
                SessionEvent::HintFound { hint: hint(false) },
                SessionEvent::Status {
                    text: "Karl has joined".to_owned(),
                },
                SessionEvent::Status {
                    text: String::new(),
                },
            ],
        )
        .await;

        assert_eq!(
            commands[..6],
            [
                register(
                    "Karl",
                    AlertPayload::GoalReached(Some(PlayerDescriptor {
                        name: "Alice".to_owned()
                    })),
                    Priority::Low
                ),
                register(
                    "Karl",
                    AlertPayload::DeathReceived(Some(DeathDescriptor {
                        source: "Bob".to_owned(),
                        time: 12.5,
                        reason: "lava".to_owned(),
                    })),
                    Priority::Low
                ),
                register("Karl", AlertPayload::Hint(Some(hint(false))), Priority::Low),
                register("Karl", AlertPayload::Hint(Some(hint(true))), Priority::Low),
                register(
                    "Karl",
                    AlertPayload::Meta(Some("Karl has joined".to_owned())),
                    Priority::Low
                ),
                register("Karl", AlertPayload::Meta(None), Priority::Low),
            ]
        );
    }
}
