#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Wave controller that decides when waves begin and emits enemy spawn commands.
//!
//! The controller is driven by timestamps rather than tick counts, but it is
//! only consulted at tick boundaries, so spawn timing has the resolution of the
//! tick interval.

use corridor_defence_core::{Command, EnemyId, Timestamp, WaveConfig, WavePhase, WaveStatus};
use tracing::{debug, info};

/// Pure system owning the wave state machine of a single simulation.
#[derive(Debug)]
pub struct Waves {
    config: WaveConfig,
    current_wave: u32,
    phase: WavePhase,
    enemies_to_spawn: u32,
    enemies_spawned: u32,
    next_spawn_at: Timestamp,
    phase_started_at: Timestamp,
    next_enemy: u32,
}

impl Waves {
    /// Creates a controller waiting for its first wave since `created_at`.
    #[must_use]
    pub fn new(config: WaveConfig, created_at: Timestamp) -> Self {
        Self {
            config,
            current_wave: 0,
            phase: WavePhase::Waiting,
            enemies_to_spawn: 0,
            enemies_spawned: 0,
            next_spawn_at: created_at,
            phase_started_at: created_at,
            next_enemy: 0,
        }
    }

    /// Constants shaping every wave.
    #[must_use]
    pub const fn config(&self) -> &WaveConfig {
        &self.config
    }

    /// Copies the current state of the machine.
    #[must_use]
    pub const fn status(&self) -> WaveStatus {
        WaveStatus {
            current_wave: self.current_wave,
            phase: self.phase,
            enemies_to_spawn: self.enemies_to_spawn,
            enemies_spawned: self.enemies_spawned,
            next_spawn_at: self.next_spawn_at,
            phase_started_at: self.phase_started_at,
        }
    }

    /// Re-anchors the waiting timer at `now` while no wave has begun yet.
    pub fn restart_clock(&mut self, now: Timestamp) {
        if self.current_wave == 0 && self.phase == WavePhase::Waiting {
            self.phase_started_at = now;
            self.next_spawn_at = now;
        }
    }

    /// Begins the next wave, scheduling its first spawn at `now`.
    pub fn start_wave(&mut self, now: Timestamp) {
        self.current_wave = self.current_wave.saturating_add(1);
        self.enemies_to_spawn = self.config.enemies_for_wave(self.current_wave);
        self.enemies_spawned = 0;
        self.next_spawn_at = now;
        self.phase_started_at = now;
        self.phase = WavePhase::Spawning;
        info!(
            wave = self.current_wave,
            enemies = self.enemies_to_spawn,
            "wave started"
        );
    }

    /// Advances the machine by at most one transition and queues spawn commands.
    ///
    /// `live_enemies` is the number of enemies currently in the world; it only
    /// matters while the wave is active.
    pub fn handle(&mut self, now: Timestamp, live_enemies: usize, out: &mut Vec<Command>) {
        match self.phase {
            WavePhase::Waiting => {
                let waited = now.saturating_duration_since(self.phase_started_at);
                if waited >= self.config.time_between_waves {
                    self.start_wave(now);
                }
            }
            WavePhase::Spawning => {
                if now >= self.next_spawn_at && self.enemies_spawned < self.enemies_to_spawn {
                    out.push(self.spawn_enemy());
                    if self.enemies_spawned < self.enemies_to_spawn {
                        self.next_spawn_at = now.saturating_add(self.config.time_between_spawns);
                    } else {
                        self.enter_active();
                    }
                } else if self.enemies_spawned >= self.enemies_to_spawn {
                    self.enter_active();
                }
            }
            WavePhase::Active => {
                if live_enemies == 0 {
                    self.phase = WavePhase::Waiting;
                    self.phase_started_at = now;
                    info!(wave = self.current_wave, "wave cleared");
                }
            }
        }
    }

    fn spawn_enemy(&mut self) -> Command {
        let enemy = EnemyId::new(self.next_enemy);
        self.next_enemy = self.next_enemy.wrapping_add(1);
        self.enemies_spawned += 1;

        let health = self.config.enemy_health_for_wave(self.current_wave);
        let speed = self.config.enemy_speed_for_wave(self.current_wave);
        debug!(
            %enemy,
            wave = self.current_wave,
            spawned = self.enemies_spawned,
            of = self.enemies_to_spawn,
            "spawning enemy"
        );
        Command::SpawnEnemy {
            enemy,
            health,
            speed,
        }
    }

    fn enter_active(&mut self) {
        self.phase = WavePhase::Active;
        debug!(wave = self.current_wave, "all enemies of the wave spawned");
    }
}
