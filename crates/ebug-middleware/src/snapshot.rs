//! Latest-value cell for [`SensorSnapshot`]s.
//!
//! Single writer (the sensing loop), any number of readers. Built on
//! [`tokio::sync::watch`], so a reader always gets a whole snapshot, never a
//! half-written one, and no history is kept.

use ebug_types::SensorSnapshot;
use tokio::sync::watch;

/// Create a connected publisher/reader pair, starting from a default
/// snapshot.
pub fn snapshot_cell() -> (SnapshotPublisher, SnapshotReader) {
    let (tx, rx) = watch::channel(SensorSnapshot::default());
    (SnapshotPublisher { tx }, SnapshotReader { rx })
}

/// The writing half. Not `Clone`: there is exactly one writer.
#[derive(Debug)]
pub struct SnapshotPublisher {
    tx: watch::Sender<SensorSnapshot>,
}

impl SnapshotPublisher {
    /// Replace the latest snapshot. Succeeds even with no readers attached.
    pub fn publish(&self, snapshot: SensorSnapshot) {
        self.tx.send_replace(snapshot);
    }

    pub fn reader(&self) -> SnapshotReader {
        SnapshotReader {
            rx: self.tx.subscribe(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct SnapshotReader {
    rx: watch::Receiver<SensorSnapshot>,
}

impl SnapshotReader {
    /// Copy of the most recently published snapshot.
    pub fn latest(&self) -> SensorSnapshot {
        *self.rx.borrow()
    }

    /// Wait until a snapshot newer than the last one seen is published.
    /// Returns `None` once the publisher is gone.
    pub async fn changed(&mut self) -> Option<SensorSnapshot> {
        self.rx.changed().await.ok()?;
        Some(*self.rx.borrow_and_update())
    }
}
