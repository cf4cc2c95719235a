//! Authoritative tower state management utilities.

use std::time::Duration;

use corridor_defence_core::{CellCoord, TowerId, TowerSnapshot, TowerStats};

/// Tower stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct TowerState {
    /// Identifier supplied when the tower was placed.
    pub(crate) id: TowerId,
    /// Cell occupied by the tower.
    pub(crate) cell: CellCoord,
    /// Fixed combat parameters.
    pub(crate) stats: TowerStats,
    /// Time left before the tower may fire again.
    pub(crate) cooldown: Duration,
}

impl TowerState {
    fn snapshot(&self) -> TowerSnapshot {
        TowerSnapshot {
            id: self.id,
            cell: self.cell,
            stats: self.stats,
            cooldown: self.cooldown,
        }
    }
}

/// Registry that stores towers in placement order.
#[derive(Debug, Default)]
pub(crate) struct TowerRegistry {
    entries: Vec<TowerState>,
}

impl TowerRegistry {
    /// Creates an empty tower registry.
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Appends a ready-to-fire tower. Neither the cell nor the identifier is validated.
    pub(crate) fn place(&mut self, id: TowerId, cell: CellCoord, stats: TowerStats) {
        self.entries.push(TowerState {
            id,
            cell,
            stats,
            cooldown: Duration::ZERO,
        });
    }

    /// Ages every cooldown by `dt`, flooring at zero.
    pub(crate) fn cool_down(&mut self, dt: Duration) {
        for tower in &mut self.entries {
            tower.cooldown = tower.cooldown.saturating_sub(dt);
        }
    }

    /// First tower registered under the identifier.
    pub(crate) fn get_mut(&mut self, id: TowerId) -> Option<&mut TowerState> {
        self.entries.iter_mut().find(|tower| tower.id == id)
    }

    /// Captures every tower in placement order.
    pub(crate) fn snapshots(&self) -> Vec<TowerSnapshot> {
        self.entries.iter().map(TowerState::snapshot).collect()
    }
}
