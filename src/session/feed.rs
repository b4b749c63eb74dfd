//! JSON Lines event feeds.
//!
//! A bridge process connected to the multiworld server writes the events of each slot to
//! `<dir>/<slot>.jsonl`, a regular file or a FIFO. Each line is one [`SessionEvent`]. The
//! bridge may start the feed with a greeting carrying the slot display name:
//!
//! ```json
//! {"type": "hello", "slot": "Karl (Hyrule)"}
//! ```

use log::{debug, error, info, warn};
use serde_json::Value;
use tokio::{
    fs::File,
    io::{AsyncBufReadExt, BufReader, Lines},
    sync::mpsc::{self, Sender},
};

use crate::{
    config::Server,
    session::{ConnectError, Session, SessionConnector, SessionEvent},
    utils::get_path,
};

/// Number of parsed events buffered ahead of the forwarding task.
const FEED_CAPACITY: usize = 64;

/// Opens sessions from per-slot event feeds in a directory.
pub struct FeedConnector {
    dir: String,
}

impl FeedConnector {
    pub fn new(dir: &str) -> Self {
        FeedConnector {
            dir: dir.to_owned(),
        }
    }
}

impl SessionConnector for FeedConnector {
    /// Opens `<dir>/<slot>.jsonl` and spawns a task reading its events.
    ///
    /// For a FIFO this waits for the bridge to write the first line.
    async fn connect(&self, server: &Server, slot: &str) -> Result<Session, ConnectError> {
        let path = get_path(&self.dir, &format!("{}.jsonl", slot));
        debug!(
            "open feed {} for {} on {} (password={})",
            path,
            slot,
            server.address(),
            server.password.is_some()
        );

        let file = File::open(&path).await.map_err(ConnectError::Io)?;
        let mut lines = BufReader::new(file).lines();

        let mut name = slot.to_owned();
        let mut pending = None;
        if let Some(line) = lines.next_line().await.map_err(ConnectError::Io)? {
            match greeting(&line) {
                Some(greeted) => name = greeted,
                None => pending = Some(line),
            }
        }

        info!("reading feed {} as {}", path, name);
        let (sender, events) = mpsc::channel(FEED_CAPACITY);
        tokio::spawn(read_feed(name.to_owned(), pending, lines, sender));

        Ok(Session { slot: name, events })
    }
}

/// Returns the slot name of a greeting line.
fn greeting(line: &str) -> Option<String> {
    let value: Value = serde_json::from_str(line).ok()?;
    if value.get("type")?.as_str()? != "hello" {
        return None;
    }
    value.get("slot")?.as_str().map(str::to_owned)
}

async fn read_feed(
    slot: String,
    pending: Option<String>,
    mut lines: Lines<BufReader<File>>,
    sender: Sender<SessionEvent>,
) {
    if let Some(line) = pending
        && !forward_line(&slot, &line, &sender).await
    {
        return;
    }

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if !forward_line(&slot, &line, &sender).await {
                    return;
                }
            }
            Ok(None) => break,
            Err(e) => {
                error!("failed to read feed of {}: {}", slot, e);
                break;
            }
        }
    }

    debug!("feed of {} ended", slot);
}

/// Parses and sends one line, returns `false` once the session is no longer followed.
async fn forward_line(slot: &str, line: &str, sender: &Sender<SessionEvent>) -> bool {
    let line = line.trim();
    if line.is_empty() {
        return true;
    }

    match serde_json::from_str::<SessionEvent>(line) {
        Ok(event) => sender.send(event).await.is_ok(),
        Err(e) => {
            warn!("skip malformed event of {}: {}", slot, e);
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn server() -> Server {
        Server {
            host: "localhost".to_owned(),
            port: 38281,
            slots: vec!["Karl".to_owned()],
            password: None,
        }
    }

    async fn collect(mut session: Session) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        while let Some(event) = session.events.recv().await {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_feed_with_greeting() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("Karl.jsonl"),
            concat!(
                r#"{"type": "hello", "slot": "Karl (Hyrule)"}"#,
                "\n",
                r#"{"type": "status", "text": "Karl has joined"}"#,
                "\n",
                "not json\n",
                "\n",
                r#"{"type": "bounce"}"#,
                "\n",
                r#"{"type": "countdown", "text": "3", "value": 3}"#,
                "\n",
            ),
        )
        .unwrap();

        let connector = FeedConnector::new(dir.path().to_str().unwrap());
        let session = connector.connect(&server(), "Karl").await.unwrap();
        assert_eq!(session.slot, "Karl (Hyrule)");

        assert_eq!(
            collect(session).await,
            vec![
                SessionEvent::Status {
                    text: "Karl has joined".to_owned()
                },
                SessionEvent::Countdown {
                    text: "3".to_owned(),
                    value: 3
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_feed_without_greeting_keeps_first_event() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("Karl.jsonl"),
            r#"{"type": "goaled", "player": {"name": "Karl"}}"#,
        )
        .unwrap();

        let connector = FeedConnector::new(dir.path().to_str().unwrap());
        let session = connector.connect(&server(), "Karl").await.unwrap();
        assert_eq!(session.slot, "Karl");

        let events = collect(session).await;
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], SessionEvent::Goaled { .. }));
    }

    #[tokio::test]
    async fn test_empty_feed_closes_immediately() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("Karl.jsonl"), "").unwrap();

        let connector = FeedConnector::new(dir.path().to_str().unwrap());
        let session = connector.connect(&server(), "Karl").await.unwrap();

        assert!(collect(session).await.is_empty());
    }

    #[tokio::test]
    async fn test_missing_feed_fails() {
        let dir = TempDir::new().unwrap();
        let connector = FeedConnector::new(dir.path().to_str().unwrap());

        let result = connector.connect(&server(), "Bob").await;
        assert!(matches!(result, Err(ConnectError::Io(_))));
    }

    #[test]
    fn test_greeting() {
        assert_eq!(
            greeting(r#"{"type": "hello", "slot": "Karl"}"#).as_deref(),
            Some("Karl")
        );
        assert_eq!(greeting(r#"{"type": "status", "text": "hi"}"#), None);
        assert_eq!(greeting(r#"{"type": "hello"}"#), None);
        assert_eq!(greeting("garbage"), None);
    }
}
