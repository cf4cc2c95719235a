#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that emits firing commands for towers whose cooldown elapsed.

use corridor_defence_core::{
    CellCoord, Command, EnemyId, EnemyView, Health, TowerSnapshot, TowerView,
};

/// Tower combat system that queues firing commands for ready towers.
#[derive(Debug, Default)]
pub struct TowerCombat {
    scratch: Vec<Command>,
    targets: Vec<Target>,
}

#[derive(Clone, Copy, Debug)]
struct Target {
    enemy: EnemyId,
    cell: CellCoord,
    health: Health,
}

impl TowerCombat {
    /// Creates a new tower combat system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits `Command::FireAtEnemy` entries for ready towers in placement order.
    ///
    /// Each tower picks the first enemy in store order standing within reach.
    /// Shots queued earlier in the same call are projected onto the enemies, so
    /// a later tower never picks an enemy that an earlier one already killed.
    pub fn handle(&mut self, towers: &TowerView, enemies: &EnemyView, out: &mut Vec<Command>) {
        if towers.iter().all(|tower| !tower.is_ready()) {
            return;
        }

        self.targets.clear();
        self.targets.extend(enemies.iter().filter_map(|enemy| {
            enemy.cell.map(|cell| Target {
                enemy: enemy.id,
                cell,
                health: enemy.health,
            })
        }));
        if self.targets.is_empty() {
            return;
        }

        self.scratch.clear();

        for tower in towers.iter().filter(|tower| tower.is_ready()) {
            let Some(index) = self.select_target(tower) else {
                continue;
            };

            let target = &mut self.targets[index];
            let enemy = target.enemy;
            target.health = target.health.damaged_by(tower.stats.damage);
            if target.health.is_depleted() {
                let _ = self.targets.remove(index);
            }

            self.scratch.push(Command::FireAtEnemy {
                tower: tower.id,
                enemy,
            });
        }

        if self.scratch.is_empty() {
            return;
        }

        out.reserve(self.scratch.len());
        out.append(&mut self.scratch);
    }

    fn select_target(&self, tower: &TowerSnapshot) -> Option<usize> {
        self.targets
            .iter()
            .position(|target| target.cell.within_reach_of(tower.cell, tower.stats.range))
    }
}
