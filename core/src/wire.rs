//! Transport-ready snapshot of a running simulation.
//!
//! Field names are part of the client contract and serialise in camelCase.
//! Every type here owns its data; nothing borrows from live simulation state.

use serde::{Deserialize, Serialize};

use crate::{CellCoord, WavePhase};

/// Complete, self-contained copy of the simulation state at one instant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    /// Wall-clock time the snapshot was captured, in Unix milliseconds.
    pub server_time_ms: u64,
    /// Remaining player health; may be negative after the final leak.
    pub user_health: i32,
    /// Wave controller state and configuration.
    pub wave: WaveSnapshot,
    /// Passability grid, `grid[x][y]`, `0` open and `1` blocked.
    pub grid: Vec<Vec<u8>>,
    /// Cells of the enemy route in walking order.
    pub path: Vec<CellCoord>,
    /// Live enemies in store order.
    pub enemies: Vec<EnemyRecord>,
    /// Towers in placement order.
    pub towers: Vec<TowerRecord>,
}

/// Wave controller section of a [`GameSnapshot`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaveSnapshot {
    /// Number of the latest wave.
    pub current_wave: u32,
    /// Current phase of the state machine.
    pub state: WavePhase,
    /// Enemies the current wave spawns in total.
    pub enemies_to_spawn: u32,
    /// Enemies spawned so far by the current wave.
    pub enemies_spawned: u32,
    /// Instant of the next scheduled spawn, in Unix milliseconds.
    pub next_spawn_time_ms: u64,
    /// Instant the current phase began, in Unix milliseconds.
    pub wave_start_time_ms: u64,
    /// Wave constants.
    pub config: WaveConfigSnapshot,
}

/// Wave constants as exposed to clients; durations are milliseconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaveConfigSnapshot {
    /// Milliseconds between waves.
    pub time_between_waves: u64,
    /// Milliseconds between spawns of one wave.
    pub time_between_spawns: u64,
    /// Enemy count of a hypothetical wave zero.
    pub base_enemies_per_wave: u32,
    /// Extra enemy health per wave.
    pub enemy_health_scaling: u32,
    /// Extra enemy speed per wave.
    pub enemy_speed_scaling: u32,
    /// Enemy health of a hypothetical wave zero.
    pub base_enemy_health: u32,
    /// Enemy speed of a hypothetical wave zero.
    pub base_enemy_speed: u32,
}

/// Enemy entry of a [`GameSnapshot`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnemyRecord {
    /// Opaque enemy identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Index into the path.
    pub location: usize,
    /// Remaining health.
    pub health: u32,
    /// Descriptive speed.
    pub speed: u32,
}

/// Tower entry of a [`GameSnapshot`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TowerRecord {
    /// Opaque tower identifier.
    pub id: String,
    /// Cell occupied by the tower.
    pub location: CellCoord,
    /// Reach in grid cells.
    pub range: u32,
    /// Milliseconds left before the tower may fire.
    pub cooldown: u64,
    /// Damage per hit.
    pub damage: u32,
    /// Cooldown restored after firing, in milliseconds.
    pub base_cooldown_ms: u64,
}

/// Messages pushed from the simulation host to listeners.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    /// Latest simulation state.
    Snapshot {
        /// The captured state.
        snapshot: GameSnapshot,
    },
}

/// Control messages accepted by the simulation host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Starts the simulation.
    Start,
    /// Stops the simulation.
    Stop,
    /// Requests the current snapshot.
    Snapshot,
}

impl ClientMessage {
    /// Parses a JSON control message, returning `None` for anything malformed.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        serde_json::from_str(text.trim()).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> GameSnapshot {
        GameSnapshot {
            server_time_ms: 1_000,
            user_health: 70,
            wave: WaveSnapshot {
                current_wave: 1,
                state: WavePhase::Spawning,
                enemies_to_spawn: 6,
                enemies_spawned: 2,
                next_spawn_time_ms: 2_000,
                wave_start_time_ms: 500,
                config: WaveConfigSnapshot {
                    time_between_waves: 5_000,
                    time_between_spawns: 1_000,
                    base_enemies_per_wave: 5,
                    enemy_health_scaling: 20,
                    enemy_speed_scaling: 1,
                    base_enemy_health: 100,
                    base_enemy_speed: 10,
                },
            },
            grid: vec![vec![1, 0], vec![1, 0]],
            path: vec![CellCoord::new(0, 1), CellCoord::new(1, 1)],
            enemies: vec![EnemyRecord {
                id: "enemy-0".to_owned(),
                name: "Enemy 0".to_owned(),
                location: 1,
                health: 70,
                speed: 11,
            }],
            towers: vec![TowerRecord {
                id: "tower-0".to_owned(),
                location: CellCoord::new(0, 0),
                range: 5,
                cooldown: 500,
                damage: 50,
                base_cooldown_ms: 1_000,
            }],
        }
    }

    #[test]
    fn snapshot_uses_client_field_names() {
        let message = ServerMessage::Snapshot { snapshot: sample() };
        let value = serde_json::to_value(&message).expect("serialize");

        assert_eq!(value["type"], "snapshot");
        let snapshot = &value["snapshot"];
        assert_eq!(snapshot["serverTimeMs"], 1_000);
        assert_eq!(snapshot["userHealth"], 70);
        assert_eq!(snapshot["wave"]["currentWave"], 1);
        assert_eq!(snapshot["wave"]["state"], "spawning");
        assert_eq!(snapshot["wave"]["nextSpawnTimeMs"], 2_000);
        assert_eq!(snapshot["wave"]["waveStartTimeMs"], 500);
        assert_eq!(snapshot["wave"]["config"]["timeBetweenWaves"], 5_000);
        assert_eq!(snapshot["wave"]["config"]["baseEnemySpeed"], 10);
        assert_eq!(snapshot["grid"][0][1], 0);
        assert_eq!(snapshot["path"][1]["x"], 1);
        assert_eq!(snapshot["path"][1]["y"], 1);
        assert_eq!(snapshot["enemies"][0]["location"], 1);
        assert_eq!(snapshot["towers"][0]["location"]["y"], 0);
        assert_eq!(snapshot["towers"][0]["baseCooldownMs"], 1_000);
    }

    #[test]
    fn server_message_parses_back() {
        let message = ServerMessage::Snapshot { snapshot: sample() };
        let text = serde_json::to_string(&message).expect("serialize");
        let restored: ServerMessage = serde_json::from_str(&text).expect("deserialize");
        assert_eq!(restored, message);
    }

    #[test]
    fn client_messages_parse_and_malformed_input_is_dropped() {
        assert_eq!(
            ClientMessage::parse(r#"{"type":"start"}"#),
            Some(ClientMessage::Start)
        );
        assert_eq!(
            ClientMessage::parse(" {\"type\":\"snapshot\"}\n"),
            Some(ClientMessage::Snapshot)
        );
        assert_eq!(ClientMessage::parse("{\"type\":\"launch\"}"), None);
        assert_eq!(ClientMessage::parse("not json"), None);
        assert_eq!(ClientMessage::parse(""), None);
    }
}
