//! Pushes snapshots to listeners as newline-delimited JSON.

use std::io::{self, Write};

use corridor_defence_core::wire::{GameSnapshot, ServerMessage};
use corridor_defence_engine::SnapshotObserver;
use tracing::warn;

/// Observer that writes every snapshot to a byte sink, one message per line.
#[derive(Debug)]
pub(crate) struct JsonLines<W> {
    sink: W,
}

impl JsonLines<io::Stdout> {
    pub(crate) fn stdout() -> Self {
        Self { sink: io::stdout() }
    }
}

impl<W: Write> JsonLines<W> {
    /// Serialises the snapshot inside its envelope and flushes it.
    pub(crate) fn send(&mut self, snapshot: &GameSnapshot) {
        if let Err(error) = write_message(&mut self.sink, snapshot) {
            warn!(%error, "failed to broadcast snapshot");
        }
    }
}

impl<W: Write> SnapshotObserver for JsonLines<W> {
    fn on_snapshot(&mut self, snapshot: &GameSnapshot) {
        self.send(snapshot);
    }
}

fn write_message<W: Write>(sink: &mut W, snapshot: &GameSnapshot) -> io::Result<()> {
    let message = ServerMessage::Snapshot {
        snapshot: snapshot.clone(),
    };
    serde_json::to_writer(&mut *sink, &message)?;
    sink.write_all(b"\n")?;
    sink.flush()
}
