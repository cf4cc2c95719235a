#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Tick engine that wires the world, wave controller and tower combat together.
//!
//! A [`Simulation`] owns every piece of mutable state of one game. Hosts drive
//! it either by calling [`Simulation::tick`] directly or by sleeping until
//! [`Simulation::next_deadline`] and calling [`Simulation::pump`].

mod clock;
mod config;
mod observer;
mod schedule;
mod snapshot;

use corridor_defence_core::{
    wire::GameSnapshot, Command, Event, LayoutError, Timestamp, TowerId, WavePhase, WaveStatus,
};
use corridor_defence_system_tower_combat::TowerCombat;
use corridor_defence_system_waves::Waves;
use corridor_defence_world::{self as world, query, World};
use tracing::{debug, info};

pub use crate::clock::{Clock, ManualClock, SystemClock};
pub use crate::config::{SimulationConfig, StarterTower};
pub use crate::observer::SnapshotObserver;
use crate::schedule::{Due, Schedule};

/// Errors raised while constructing or driving a simulation.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SimulationError {
    /// The configured layout cannot host a game.
    #[error(transparent)]
    Layout(#[from] LayoutError),
    /// `start` was called on a simulation that already started or halted.
    #[error("simulation already started")]
    AlreadyStarted,
    /// The tick interval must be positive.
    #[error("tick interval must be greater than zero")]
    ZeroTickInterval,
}

/// Lifecycle of a simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    /// Constructed but not started; ticks only run when called directly.
    Idle,
    /// Ticks and the first wave are scheduled.
    Running,
    /// No further ticks will run.
    Halted(HaltReason),
}

/// Why a simulation stopped ticking.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HaltReason {
    /// Player health dropped to zero or below.
    GameOver,
    /// The host called [`Simulation::stop`].
    Stopped,
}

/// Result of a single tick invocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// The simulation advanced by one interval.
    Advanced,
    /// The player is defeated; nothing advanced.
    GameOver,
    /// The simulation was stopped; nothing advanced.
    Stopped,
}

/// Authoritative simulation of a single game.
pub struct Simulation<C = SystemClock> {
    clock: C,
    config: SimulationConfig,
    world: World,
    waves: Waves,
    combat: TowerCombat,
    schedule: Schedule,
    status: Status,
    tick_count: u64,
    commands: Vec<Command>,
    last_events: Vec<Event>,
    latest: GameSnapshot,
    observers: Vec<Box<dyn SnapshotObserver>>,
}

impl<C: Clock> Simulation<C> {
    /// Builds the world, places the starter tower and captures the first snapshot.
    pub fn new(config: SimulationConfig, clock: C) -> Result<Self, SimulationError> {
        if config.tick_interval.is_zero() {
            return Err(SimulationError::ZeroTickInterval);
        }

        let mut world = World::new(&config.layout)?;
        let mut events = Vec::new();
        world::apply(
            &mut world,
            Command::PlaceTower {
                tower: TowerId::new(0),
                cell: config.tower.cell,
                stats: config.tower.stats(),
            },
            &mut events,
        );

        let now = clock.now();
        let waves = Waves::new(config.waves, now);
        let latest = snapshot::capture(&world, &waves, now);
        info!(
            path_len = query::path(&world).len(),
            tower = %config.tower.cell,
            "simulation ready"
        );

        Ok(Self {
            clock,
            schedule: Schedule::new(config.tick_interval),
            config,
            world,
            waves,
            combat: TowerCombat::new(),
            status: Status::Idle,
            tick_count: 0,
            commands: Vec::new(),
            last_events: events,
            latest,
            observers: Vec::new(),
        })
    }

    /// Restarts the initial wave wait, schedules the first wave and the tick
    /// cadence, then publishes a snapshot.
    pub fn start(&mut self) -> Result<(), SimulationError> {
        if self.status != Status::Idle {
            return Err(SimulationError::AlreadyStarted);
        }

        let now = self.clock.now();
        self.waves.restart_clock(now);
        self.schedule.arm(now, self.config.first_wave_delay);
        self.status = Status::Running;
        info!(
            tick_interval_ms = %self.config.tick_interval.as_millis(),
            first_wave_delay_ms = %self.config.first_wave_delay.as_millis(),
            "simulation started"
        );
        self.publish(now);
        Ok(())
    }

    /// Cancels every pending tick and the first wave.
    ///
    /// Publishes a final snapshot the first time; later calls do nothing, also
    /// after the simulation halted on its own.
    pub fn stop(&mut self) {
        if matches!(self.status, Status::Halted(_)) {
            return;
        }

        self.schedule.cancel();
        self.status = Status::Halted(HaltReason::Stopped);
        info!(ticks = self.tick_count, "simulation stopped");
        self.publish(self.clock.now());
    }

    /// Advances the simulation by one tick interval.
    ///
    /// Order: wave controller, enemy movement, cooldown decay, tower fire,
    /// snapshot. A defeated player halts the simulation instead.
    pub fn tick(&mut self) -> TickOutcome {
        match self.status {
            Status::Halted(HaltReason::Stopped) => return TickOutcome::Stopped,
            Status::Halted(HaltReason::GameOver) => return TickOutcome::GameOver,
            Status::Idle | Status::Running => {}
        }

        if query::is_defeated(&self.world) {
            self.halt_for_game_over();
            return TickOutcome::GameOver;
        }

        let now = self.clock.now();
        self.last_events.clear();
        self.tick_count += 1;

        self.waves
            .handle(now, query::enemy_count(&self.world), &mut self.commands);
        self.commands.push(Command::AdvanceEnemies);
        self.commands.push(Command::Tick {
            dt: self.config.tick_interval,
        });
        self.apply_commands();

        self.combat.handle(
            &query::tower_view(&self.world),
            &query::enemy_view(&self.world),
            &mut self.commands,
        );
        self.apply_commands();

        log_events(&self.last_events);
        self.publish(now);
        TickOutcome::Advanced
    }

    /// Applies a world command outside the tick cadence.
    ///
    /// Resulting events are appended to [`Simulation::last_events`].
    pub fn apply(&mut self, command: Command) {
        world::apply(&mut self.world, command, &mut self.last_events);
    }

    /// Runs every scheduled action due at the clock's current instant.
    ///
    /// Returns the outcome of the last tick that ran, if any.
    pub fn pump(&mut self) -> Option<TickOutcome> {
        let mut outcome = None;
        while self.status == Status::Running {
            let now = self.clock.now();
            let Some(due) = self.schedule.poll(now) else {
                break;
            };
            match due {
                Due::FirstWave => self.start_first_wave(now),
                Due::Tick => outcome = Some(self.tick()),
            }
        }
        outcome
    }

    /// Instant the next scheduled action becomes due, if any is scheduled.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Timestamp> {
        self.schedule.next_deadline()
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn status(&self) -> Status {
        self.status
    }

    /// Number of ticks that advanced the simulation.
    #[must_use]
    pub const fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Events emitted by the most recent tick.
    #[must_use]
    pub fn last_events(&self) -> &[Event] {
        &self.last_events
    }

    /// Read-only access to the world for queries.
    #[must_use]
    pub const fn world(&self) -> &World {
        &self.world
    }

    /// Current state of the wave controller.
    #[must_use]
    pub const fn wave_status(&self) -> WaveStatus {
        self.waves.status()
    }

    /// Captures a fresh snapshot at the current instant without publishing it.
    #[must_use]
    pub fn snapshot(&self) -> GameSnapshot {
        snapshot::capture(&self.world, &self.waves, self.clock.now())
    }

    /// Last snapshot delivered to observers.
    #[must_use]
    pub const fn latest_snapshot(&self) -> &GameSnapshot {
        &self.latest
    }

    /// Registers an observer and hands it the latest snapshot straight away.
    pub fn subscribe<O>(&mut self, observer: O)
    where
        O: SnapshotObserver + 'static,
    {
        let mut observer: Box<dyn SnapshotObserver> = Box::new(observer);
        observer.on_snapshot(&self.latest);
        self.observers.push(observer);
    }

    fn start_first_wave(&mut self, now: Timestamp) {
        let status = self.waves.status();
        if status.current_wave == 0 && status.phase == WavePhase::Waiting {
            self.waves.start_wave(now);
        } else {
            debug!(wave = status.current_wave, "first wave already under way");
        }
    }

    fn halt_for_game_over(&mut self) {
        self.schedule.cancel();
        self.status = Status::Halted(HaltReason::GameOver);
        info!(
            ticks = self.tick_count,
            wave = self.waves.status().current_wave,
            "game over"
        );
        self.publish(self.clock.now());
    }

    fn apply_commands(&mut self) {
        for command in self.commands.drain(..) {
            world::apply(&mut self.world, command, &mut self.last_events);
        }
    }

    fn publish(&mut self, now: Timestamp) {
        self.latest = snapshot::capture(&self.world, &self.waves, now);
        for observer in &mut self.observers {
            observer.on_snapshot(&self.latest);
        }
    }
}

impl<C> std::fmt::Debug for Simulation<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("status", &self.status)
            .field("tick_count", &self.tick_count)
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}

fn log_events(events: &[Event]) {
    for event in events {
        match event {
            Event::EnemySpawned { enemy, health, .. } => {
                debug!(%enemy, health = health.get(), "enemy spawned");
            }
            Event::TowerFired { tower, enemy } => debug!(%tower, %enemy, "tower fired"),
            Event::EnemyKilled { enemy } => debug!(%enemy, "enemy killed"),
            Event::EnemyLeaked {
                enemy,
                player_health,
            } => debug!(%enemy, player_health, "enemy leaked"),
            Event::PlayerDefeated => info!("player defeated"),
            Event::TimeAdvanced { .. }
            | Event::TowerPlaced { .. }
            | Event::EnemyAdvanced { .. }
            | Event::EnemyDamaged { .. } => {}
        }
    }
}
