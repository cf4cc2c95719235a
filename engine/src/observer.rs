//! Subscription hook for snapshot listeners.

use corridor_defence_core::wire::GameSnapshot;

/// Receives every snapshot a simulation publishes.
///
/// Observers get a shared reference; the simulation keeps its own copy, so
/// nothing an observer does can reach live state.
pub trait SnapshotObserver {
    /// Called synchronously once per published snapshot.
    fn on_snapshot(&mut self, snapshot: &GameSnapshot);
}

impl<F> SnapshotObserver for F
where
    F: FnMut(&GameSnapshot),
{
    fn on_snapshot(&mut self, snapshot: &GameSnapshot) {
        self(snapshot);
    }
}
