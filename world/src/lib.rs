#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Corridor Defence.
//!
//! The world owns the static grid, the enemy route computed from it, every
//! enemy and tower, and the player's health. All mutation flows through
//! [`apply`]; read access goes through the [`query`] module.

mod navigation;
mod towers;

use corridor_defence_core::{
    CellCoord, Command, Damage, EnemyId, Event, Grid, Health, LayoutError, Path, Speed,
    LEAK_PENALTY, STARTING_PLAYER_HEALTH,
};
use serde::{Deserialize, Serialize};

use self::towers::TowerRegistry;

/// Grid and route endpoints a world is built from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Layout {
    /// Passability rows indexed by `x`, `0` open and `1` blocked.
    pub grid: Vec<Vec<u8>>,
    /// Cell every enemy spawns on.
    pub start: CellCoord,
    /// Last cell of the route; enemies leak after walking past it.
    pub end: CellCoord,
}

impl Layout {
    /// Ten rows of nine cells with a single open corridor at `y = 4`.
    #[must_use]
    pub fn reference() -> Self {
        let row = vec![1, 1, 1, 1, 0, 1, 1, 1, 1];
        Self {
            grid: vec![row; 10],
            start: CellCoord::new(0, 4),
            end: CellCoord::new(9, 4),
        }
    }
}

impl Default for Layout {
    fn default() -> Self {
        Self::reference()
    }
}

/// Represents the authoritative Corridor Defence world state.
#[derive(Debug)]
pub struct World {
    grid: Grid,
    path: Path,
    enemies: Vec<Enemy>,
    towers: TowerRegistry,
    player_health: i32,
}

impl World {
    /// Builds a world, computing the enemy route once.
    ///
    /// Fails when the grid is malformed or the end cannot be reached from the
    /// start.
    pub fn new(layout: &Layout) -> Result<Self, LayoutError> {
        let grid = Grid::from_codes(&layout.grid)?;
        let path = navigation::find_path(&grid, layout.start, layout.end)?;
        Ok(Self {
            grid,
            path,
            enemies: Vec::new(),
            towers: TowerRegistry::new(),
            player_health: STARTING_PLAYER_HEALTH,
        })
    }

    fn advance_enemies(&mut self, out_events: &mut Vec<Event>) {
        let path_len = self.path.len();
        let starting_health = self.player_health;
        let mut player_health = self.player_health;

        self.enemies.retain_mut(|enemy| {
            if enemy.path_index < path_len {
                enemy.path_index += 1;
                out_events.push(Event::EnemyAdvanced {
                    enemy: enemy.id,
                    path_index: enemy.path_index,
                });
                return true;
            }

            player_health = player_health.saturating_sub(LEAK_PENALTY);
            out_events.push(Event::EnemyLeaked {
                enemy: enemy.id,
                player_health,
            });
            false
        });

        self.player_health = player_health;
        if starting_health > 0 && player_health <= 0 {
            out_events.push(Event::PlayerDefeated);
        }
    }

    fn fire_enemy(&mut self, damage: Damage, enemy_id: EnemyId, out_events: &mut Vec<Event>) {
        let Some(index) = self.enemies.iter().position(|enemy| enemy.id == enemy_id) else {
            return;
        };

        let enemy = &mut self.enemies[index];
        enemy.health = enemy.health.damaged_by(damage);
        if enemy.health.is_depleted() {
            let _ = self.enemies.remove(index);
            out_events.push(Event::EnemyKilled { enemy: enemy_id });
        } else {
            out_events.push(Event::EnemyDamaged {
                enemy: enemy_id,
                remaining: enemy.health,
            });
        }
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::SpawnEnemy {
            enemy,
            health,
            speed,
        } => {
            world.enemies.push(Enemy::spawn(enemy, health, speed));
            out_events.push(Event::EnemySpawned {
                enemy,
                health,
                speed,
            });
        }
        Command::PlaceTower { tower, cell, stats } => {
            world.towers.place(tower, cell, stats);
            out_events.push(Event::TowerPlaced { tower, cell });
        }
        Command::Tick { dt } => {
            world.towers.cool_down(dt);
            out_events.push(Event::TimeAdvanced { dt });
        }
        Command::AdvanceEnemies => world.advance_enemies(out_events),
        Command::FireAtEnemy { tower, enemy } => {
            let Some(state) = world.towers.get_mut(tower) else {
                return;
            };
            state.cooldown = state.stats.base_cooldown;
            let damage = state.stats.damage;
            out_events.push(Event::TowerFired { tower, enemy });
            world.fire_enemy(damage, enemy, out_events);
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use corridor_defence_core::{
        CellCoord, EnemyId, EnemySnapshot, EnemyView, Grid, Path, TowerView,
    };

    use super::World;

    /// Provides read-only access to the passability grid.
    #[must_use]
    pub fn grid(world: &World) -> &Grid {
        &world.grid
    }

    /// Provides read-only access to the enemy route.
    #[must_use]
    pub fn path(world: &World) -> &Path {
        &world.path
    }

    /// Remaining player health; zero or below means the game is over.
    #[must_use]
    pub fn player_health(world: &World) -> i32 {
        world.player_health
    }

    /// Reports whether the player ran out of health.
    #[must_use]
    pub fn is_defeated(world: &World) -> bool {
        world.player_health <= 0
    }

    /// Number of live enemies.
    #[must_use]
    pub fn enemy_count(world: &World) -> usize {
        world.enemies.len()
    }

    /// Captures a read-only view of the enemies in store order.
    #[must_use]
    pub fn enemy_view(world: &World) -> EnemyView {
        let snapshots = world
            .enemies
            .iter()
            .map(|enemy| EnemySnapshot {
                id: enemy.id,
                name: enemy.name.clone(),
                path_index: enemy.path_index,
                cell: world.path.cell(enemy.path_index),
                health: enemy.health,
                speed: enemy.speed,
            })
            .collect();
        EnemyView::from_snapshots(snapshots)
    }

    /// Captures a read-only view of the towers in placement order.
    #[must_use]
    pub fn tower_view(world: &World) -> TowerView {
        TowerView::from_snapshots(world.towers.snapshots())
    }

    /// First enemy, in store order, standing on a cell the tower can reach.
    ///
    /// Enemies that already walked off the path are never selected.
    #[must_use]
    pub fn target_enemy(world: &World, tower_cell: CellCoord, range: u32) -> Option<EnemyId> {
        world
            .enemies
            .iter()
            .find(|enemy| {
                world
                    .path
                    .cell(enemy.path_index)
                    .is_some_and(|cell| cell.within_reach_of(tower_cell, range))
            })
            .map(|enemy| enemy.id)
    }
}

#[derive(Clone, Debug)]
struct Enemy {
    id: EnemyId,
    name: String,
    path_index: usize,
    health: Health,
    speed: Speed,
}

impl Enemy {
    fn spawn(id: EnemyId, health: Health, speed: Speed) -> Self {
        Self {
            id,
            name: format!("Enemy {}", id.get()),
            path_index: 0,
            health,
            speed,
        }
    }
}
