//! Committed snapshot handoff for render/UI observers.
//!
//! The authoritative tick path publishes one [`ZoneSnapshot`] per tick
//! after all state writes for that tick are complete. Observers hold a
//! [`watch::Receiver`] and only ever see a fully-committed value, so a
//! render thread can read concurrently with the simulation thread
//! without locks on the writer and without torn reads.

use tokio::sync::watch;

use safezone_types::ZoneSnapshot;

/// Publishes committed zone snapshots to any number of observers.
///
/// `watch` keeps only the latest value; an observer that lags simply
/// sees the newest committed snapshot, which is exactly the semantics a
/// HUD or zone-edge renderer wants.
#[derive(Debug)]
pub struct SnapshotPublisher {
    tx: watch::Sender<ZoneSnapshot>,
}

impl SnapshotPublisher {
    /// Create a publisher whose initial value is the inactive default.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(ZoneSnapshot::default());
        Self { tx }
    }

    /// Commit a snapshot, replacing the previous one.
    pub fn publish(&self, snapshot: ZoneSnapshot) {
        // send_replace succeeds even with zero receivers; a match with
        // no local observers still keeps a coherent latest value.
        let _previous = self.tx.send_replace(snapshot);
    }

    /// Subscribe a new observer. The receiver immediately holds the
    /// latest committed snapshot.
    pub fn subscribe(&self) -> watch::Receiver<ZoneSnapshot> {
        self.tx.subscribe()
    }
}

impl Default for SnapshotPublisher {
    fn default() -> Self {
        Self::new()
    }
}
