//! Converts live simulation state into owned wire snapshots.

use corridor_defence_core::{
    millis::saturating_millis,
    wire::{EnemyRecord, GameSnapshot, TowerRecord, WaveConfigSnapshot, WaveSnapshot},
    EnemySnapshot, Timestamp, TowerSnapshot, WaveConfig,
};
use corridor_defence_system_waves::Waves;
use corridor_defence_world::{query, World};

/// Deep-copies the world and wave controller into a [`GameSnapshot`].
pub(crate) fn capture(world: &World, waves: &Waves, now: Timestamp) -> GameSnapshot {
    let status = waves.status();
    GameSnapshot {
        server_time_ms: now.as_millis(),
        user_health: query::player_health(world),
        wave: WaveSnapshot {
            current_wave: status.current_wave,
            state: status.phase,
            enemies_to_spawn: status.enemies_to_spawn,
            enemies_spawned: status.enemies_spawned,
            next_spawn_time_ms: status.next_spawn_at.as_millis(),
            wave_start_time_ms: status.phase_started_at.as_millis(),
            config: wave_config(waves.config()),
        },
        grid: query::grid(world).to_codes(),
        path: query::path(world).cells().to_vec(),
        enemies: query::enemy_view(world)
            .into_vec()
            .into_iter()
            .map(enemy_record)
            .collect(),
        towers: query::tower_view(world)
            .into_vec()
            .into_iter()
            .map(tower_record)
            .collect(),
    }
}

fn wave_config(config: &WaveConfig) -> WaveConfigSnapshot {
    WaveConfigSnapshot {
        time_between_waves: saturating_millis(config.time_between_waves),
        time_between_spawns: saturating_millis(config.time_between_spawns),
        base_enemies_per_wave: config.base_enemies_per_wave,
        enemy_health_scaling: config.enemy_health_scaling,
        enemy_speed_scaling: config.enemy_speed_scaling,
        base_enemy_health: config.base_enemy_health,
        base_enemy_speed: config.base_enemy_speed,
    }
}

fn enemy_record(enemy: EnemySnapshot) -> EnemyRecord {
    EnemyRecord {
        id: enemy.id.to_string(),
        name: enemy.name,
        location: enemy.path_index,
        health: enemy.health.get(),
        speed: enemy.speed.get(),
    }
}

fn tower_record(tower: TowerSnapshot) -> TowerRecord {
    TowerRecord {
        id: tower.id.to_string(),
        location: tower.cell,
        range: tower.stats.range,
        cooldown: saturating_millis(tower.cooldown),
        damage: tower.stats.damage.get(),
        base_cooldown_ms: saturating_millis(tower.stats.base_cooldown),
    }
}
