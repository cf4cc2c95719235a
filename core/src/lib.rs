#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Corridor Defence engine.
//!
//! This crate defines the message surface that connects the host adapter, the
//! authoritative world, and pure systems. Systems describe desired mutations
//! as [`Command`] values, the world executes those commands via its `apply`
//! entry point and broadcasts [`Event`] values describing what happened.
//! Systems read immutable views such as [`EnemyView`] and [`TowerView`] and
//! respond exclusively with new command batches. The [`wire`] module holds the
//! serialisable snapshot handed to clients.

pub mod millis;
pub mod wire;

use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Player health at the start of every simulation.
pub const STARTING_PLAYER_HEALTH: i32 = 100;

/// Health the player loses each time an enemy leaks past the end of the path.
pub const LEAK_PENALTY: i32 = 30;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Appends a new enemy at the start of the path.
    SpawnEnemy {
        /// Identifier assigned to the enemy by the caller.
        enemy: EnemyId,
        /// Health the enemy starts with.
        health: Health,
        /// Descriptive speed recorded for the enemy.
        speed: Speed,
    },
    /// Appends a new tower anchored at the provided cell.
    PlaceTower {
        /// Identifier assigned to the tower by the caller.
        tower: TowerId,
        /// Cell occupied by the tower for its whole lifetime.
        cell: CellCoord,
        /// Combat parameters of the tower.
        stats: TowerStats,
    },
    /// Ages every tower cooldown by the provided interval.
    Tick {
        /// Fixed simulation interval covered by the tick.
        dt: Duration,
    },
    /// Moves every enemy one step along the path, leaking those past its end.
    AdvanceEnemies,
    /// Requests that a tower fires at an enemy.
    FireAtEnemy {
        /// Tower that fires.
        tower: TowerId,
        /// Enemy receiving the hit.
        enemy: EnemyId,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Event {
    /// Indicates that tower cooldowns were aged by a tick.
    TimeAdvanced {
        /// Interval covered by the tick.
        dt: Duration,
    },
    /// Confirms that an enemy entered the path.
    EnemySpawned {
        /// Identifier of the new enemy.
        enemy: EnemyId,
        /// Health the enemy starts with.
        health: Health,
        /// Descriptive speed of the enemy.
        speed: Speed,
    },
    /// Confirms that a tower was placed.
    TowerPlaced {
        /// Identifier of the tower.
        tower: TowerId,
        /// Cell occupied by the tower.
        cell: CellCoord,
    },
    /// Confirms that an enemy advanced along the path.
    EnemyAdvanced {
        /// Identifier of the enemy that moved.
        enemy: EnemyId,
        /// Path index the enemy occupies after moving.
        path_index: usize,
    },
    /// Reports that an enemy walked off the end of the path.
    EnemyLeaked {
        /// Identifier of the leaked enemy.
        enemy: EnemyId,
        /// Player health remaining after the leak penalty.
        player_health: i32,
    },
    /// Reports that the player health dropped to zero or below.
    PlayerDefeated,
    /// Confirms that a tower fired and restarted its cooldown.
    TowerFired {
        /// Tower that fired.
        tower: TowerId,
        /// Enemy the tower fired at.
        enemy: EnemyId,
    },
    /// Reports that an enemy survived a hit.
    EnemyDamaged {
        /// Identifier of the damaged enemy.
        enemy: EnemyId,
        /// Health remaining after the hit.
        remaining: Health,
    },
    /// Reports that an enemy was destroyed by a hit.
    EnemyKilled {
        /// Identifier of the destroyed enemy.
        enemy: EnemyId,
    },
}

/// Location of a single grid cell.
///
/// `x` indexes the outer dimension of the grid and `y` the inner one, matching
/// the `grid[x][y]` layout used on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    x: u32,
    y: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Index along the outer grid dimension.
    #[must_use]
    pub const fn x(&self) -> u32 {
        self.x
    }

    /// Index along the inner grid dimension.
    #[must_use]
    pub const fn y(&self) -> u32 {
        self.y
    }

    /// Reports whether the two cells differ by exactly one step along one axis.
    #[must_use]
    pub fn is_adjacent_to(self, other: CellCoord) -> bool {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y) == 1
    }

    /// Reports whether a tower at `tower` with the given `range` may target this cell.
    ///
    /// Each axis is compared independently against the tower coordinate plus
    /// the range, with no lower bound. Cells far below both tower coordinates
    /// therefore count as in range. Targeting compatibility depends on this
    /// exact comparison.
    #[must_use]
    pub fn within_reach_of(self, tower: CellCoord, range: u32) -> bool {
        self.x <= tower.x.saturating_add(range) && self.y <= tower.y.saturating_add(range)
    }
}

impl fmt::Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Passability of a single grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CellState {
    /// Enemies may walk through the cell.
    Open,
    /// The cell cannot be traversed.
    Blocked,
}

impl CellState {
    /// Decodes the wire representation (`0` open, `1` blocked).
    pub fn from_code(code: u8) -> Result<Self, LayoutError> {
        match code {
            0 => Ok(Self::Open),
            1 => Ok(Self::Blocked),
            other => Err(LayoutError::UnknownCellCode { code: other }),
        }
    }

    /// Encodes the state using the wire representation.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Open => 0,
            Self::Blocked => 1,
        }
    }
}

/// Static rectangular passability grid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    width: u32,
    height: u32,
    cells: Vec<CellState>,
}

impl Grid {
    /// Builds a grid from rows indexed by `x`, each holding cells indexed by `y`.
    ///
    /// Every row must have the same, non-zero length.
    pub fn from_rows(rows: Vec<Vec<CellState>>) -> Result<Self, LayoutError> {
        let expected = rows.first().map_or(0, Vec::len);
        if expected == 0 {
            return Err(LayoutError::EmptyGrid);
        }

        for (row, cells) in rows.iter().enumerate() {
            if cells.len() != expected {
                return Err(LayoutError::RaggedGrid {
                    row,
                    expected,
                    found: cells.len(),
                });
            }
        }

        let width = u32::try_from(rows.len()).map_err(|_| LayoutError::GridTooLarge)?;
        let height = u32::try_from(expected).map_err(|_| LayoutError::GridTooLarge)?;
        Ok(Self {
            width,
            height,
            cells: rows.into_iter().flatten().collect(),
        })
    }

    /// Builds a grid from its wire representation.
    pub fn from_codes(rows: &[Vec<u8>]) -> Result<Self, LayoutError> {
        let decoded = rows
            .iter()
            .map(|row| row.iter().copied().map(CellState::from_code).collect())
            .collect::<Result<Vec<Vec<CellState>>, _>>()?;
        Self::from_rows(decoded)
    }

    /// Extent of the grid along `x`.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Extent of the grid along `y`.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Reports whether the cell lies inside the grid.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.x < self.width && cell.y < self.height
    }

    /// State of the provided cell, or `None` when it lies outside the grid.
    #[must_use]
    pub fn state(&self, cell: CellCoord) -> Option<CellState> {
        self.index(cell)
            .and_then(|index| self.cells.get(index).copied())
    }

    /// Reports whether the cell lies inside the grid and is open.
    #[must_use]
    pub fn is_open(&self, cell: CellCoord) -> bool {
        self.state(cell) == Some(CellState::Open)
    }

    /// Iterator over the grid rows in `x` order.
    pub fn rows(&self) -> impl Iterator<Item = &[CellState]> {
        self.cells.chunks(self.height as usize)
    }

    /// Copies the grid into its wire representation.
    #[must_use]
    pub fn to_codes(&self) -> Vec<Vec<u8>> {
        self.rows()
            .map(|row| row.iter().map(|state| state.code()).collect())
            .collect()
    }

    /// Dense row-major index of the cell, if it lies inside the grid.
    #[must_use]
    pub fn index(&self, cell: CellCoord) -> Option<usize> {
        if !self.contains(cell) {
            return None;
        }

        let x = usize::try_from(cell.x).ok()?;
        let y = usize::try_from(cell.y).ok()?;
        let height = usize::try_from(self.height).ok()?;
        x.checked_mul(height)?.checked_add(y)
    }
}

/// Ordered walkable route from the start cell to the end cell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Path {
    cells: Vec<CellCoord>,
}

impl Path {
    /// Creates a path from consecutive, orthogonally adjacent cells.
    pub fn new(cells: Vec<CellCoord>) -> Result<Self, LayoutError> {
        if cells.is_empty() {
            return Err(LayoutError::EmptyPath);
        }

        if let Some(index) = cells
            .windows(2)
            .position(|pair| !pair[0].is_adjacent_to(pair[1]))
        {
            return Err(LayoutError::DisjointPath { index: index + 1 });
        }

        Ok(Self { cells })
    }

    /// Number of cells on the path.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Always `false`; a path holds at least its start cell.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cell at the provided path index, if any.
    #[must_use]
    pub fn cell(&self, index: usize) -> Option<CellCoord> {
        self.cells.get(index).copied()
    }

    /// First cell of the path.
    #[must_use]
    pub fn start(&self) -> CellCoord {
        self.cells[0]
    }

    /// Last cell of the path.
    #[must_use]
    pub fn end(&self) -> CellCoord {
        self.cells[self.cells.len() - 1]
    }

    /// All cells in walking order.
    #[must_use]
    pub fn cells(&self) -> &[CellCoord] {
        &self.cells
    }
}

/// Reasons a grid layout cannot host a simulation.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// The grid has no rows or its rows hold no cells.
    #[error("grid must contain at least one cell")]
    EmptyGrid,
    /// A row length differs from the first row.
    #[error("grid row {row} holds {found} cells, expected {expected}")]
    RaggedGrid {
        /// Index of the offending row.
        row: usize,
        /// Length of the first row.
        expected: usize,
        /// Length of the offending row.
        found: usize,
    },
    /// The grid dimensions do not fit the coordinate type.
    #[error("grid dimensions exceed the supported coordinate range")]
    GridTooLarge,
    /// A wire cell code other than `0` or `1` was supplied.
    #[error("unknown cell code {code}; expected 0 (open) or 1 (blocked)")]
    UnknownCellCode {
        /// Offending code.
        code: u8,
    },
    /// The start or end cell lies outside the grid.
    #[error("cell {cell} lies outside the grid")]
    OutOfBounds {
        /// Offending cell.
        cell: CellCoord,
    },
    /// The start cell is blocked.
    #[error("start cell {cell} is blocked")]
    BlockedStart {
        /// Offending cell.
        cell: CellCoord,
    },
    /// No open route connects start and end.
    #[error("no open route connects {start} to {end}")]
    Unreachable {
        /// Start of the requested route.
        start: CellCoord,
        /// End of the requested route.
        end: CellCoord,
    },
    /// A path was built without any cells.
    #[error("path must contain at least one cell")]
    EmptyPath,
    /// Two consecutive path cells are not adjacent.
    #[error("path cell {index} is not adjacent to its predecessor")]
    DisjointPath {
        /// Index of the first cell that breaks adjacency.
        index: usize,
    },
}

/// Unique identifier assigned to an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new enemy identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for EnemyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "enemy-{}", self.0)
    }
}

/// Unique identifier assigned to a tower.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TowerId(u32);

impl TowerId {
    /// Creates a new tower identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the tower identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for TowerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tower-{}", self.0)
    }
}

/// Remaining hit points of an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Health(u32);

impl Health {
    /// Creates a health value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Numeric health value.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Health left after absorbing `damage`, floored at zero.
    #[must_use]
    pub const fn damaged_by(self, damage: Damage) -> Self {
        Self(self.0.saturating_sub(damage.get()))
    }

    /// Reports whether no hit points remain.
    #[must_use]
    pub const fn is_depleted(&self) -> bool {
        self.0 == 0
    }
}

/// Damage dealt by a single tower hit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Damage(u32);

impl Damage {
    /// Creates a damage value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Numeric damage value.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Descriptive enemy speed. Movement always advances one path index per tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Speed(u32);

impl Speed {
    /// Creates a speed value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Numeric speed value.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Fixed combat parameters of a tower.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TowerStats {
    /// Reach of the tower measured in grid cells.
    pub range: u32,
    /// Damage dealt per hit.
    pub damage: Damage,
    /// Cooldown restored after each shot.
    #[serde(rename = "base_cooldown_ms", with = "millis")]
    pub base_cooldown: Duration,
}

impl TowerStats {
    /// Creates a new set of tower parameters.
    #[must_use]
    pub const fn new(range: u32, damage: Damage, base_cooldown: Duration) -> Self {
        Self {
            range,
            damage,
            base_cooldown,
        }
    }
}

/// Wall-clock instant measured in milliseconds since the Unix epoch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Creates a timestamp from milliseconds since the Unix epoch.
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// Milliseconds since the Unix epoch.
    #[must_use]
    pub const fn as_millis(&self) -> u64 {
        self.0
    }

    /// Timestamp `delay` after this one, saturating at the representable maximum.
    #[must_use]
    pub fn saturating_add(self, delay: Duration) -> Self {
        Self(self.0.saturating_add(millis::saturating_millis(delay)))
    }

    /// Time elapsed since `earlier`, or zero when `earlier` lies in the future.
    #[must_use]
    pub const fn saturating_duration_since(self, earlier: Timestamp) -> Duration {
        Duration::from_millis(self.0.saturating_sub(earlier.0))
    }
}

/// Phase of the wave state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WavePhase {
    /// Counting down towards the next wave.
    Waiting,
    /// Spawning the enemies of the current wave.
    Spawning,
    /// Every enemy of the wave is out; waiting for the path to clear.
    Active,
}

/// Constants that shape every wave of a simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveConfig {
    /// Delay between the end of a wave and the start of the next one.
    #[serde(rename = "time_between_waves_ms", with = "millis")]
    pub time_between_waves: Duration,
    /// Delay between two spawns of the same wave.
    #[serde(rename = "time_between_spawns_ms", with = "millis")]
    pub time_between_spawns: Duration,
    /// Enemy count of a hypothetical wave zero.
    pub base_enemies_per_wave: u32,
    /// Extra enemy health per wave number.
    pub enemy_health_scaling: u32,
    /// Extra enemy speed per wave number.
    pub enemy_speed_scaling: u32,
    /// Enemy health of a hypothetical wave zero.
    pub base_enemy_health: u32,
    /// Enemy speed of a hypothetical wave zero.
    pub base_enemy_speed: u32,
}

impl WaveConfig {
    /// Number of enemies spawned by the provided wave: `base + floor(wave * 1.5)`.
    #[must_use]
    pub const fn enemies_for_wave(&self, wave: u32) -> u32 {
        let bonus = (wave as u64 * 3 / 2) as u32;
        self.base_enemies_per_wave.saturating_add(bonus)
    }

    /// Health of every enemy spawned by the provided wave.
    #[must_use]
    pub const fn enemy_health_for_wave(&self, wave: u32) -> Health {
        Health::new(
            self.base_enemy_health
                .saturating_add(wave.saturating_mul(self.enemy_health_scaling)),
        )
    }

    /// Speed of every enemy spawned by the provided wave.
    #[must_use]
    pub const fn enemy_speed_for_wave(&self, wave: u32) -> Speed {
        Speed::new(
            self.base_enemy_speed
                .saturating_add(wave.saturating_mul(self.enemy_speed_scaling)),
        )
    }
}

impl Default for WaveConfig {
    fn default() -> Self {
        Self {
            time_between_waves: Duration::from_millis(5_000),
            time_between_spawns: Duration::from_millis(1_000),
            base_enemies_per_wave: 5,
            enemy_health_scaling: 20,
            enemy_speed_scaling: 1,
            base_enemy_health: 100,
            base_enemy_speed: 10,
        }
    }
}

/// Read-only description of the wave state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WaveStatus {
    /// Number of the latest wave; zero before the first wave starts.
    pub current_wave: u32,
    /// Phase the controller is in.
    pub phase: WavePhase,
    /// Enemies the current wave spawns in total.
    pub enemies_to_spawn: u32,
    /// Enemies the current wave has spawned so far.
    pub enemies_spawned: u32,
    /// Instant of the next scheduled spawn.
    pub next_spawn_at: Timestamp,
    /// Instant the current phase began.
    pub phase_started_at: Timestamp,
}

/// Immutable representation of a single enemy used for queries.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EnemySnapshot {
    /// Unique identifier assigned to the enemy.
    pub id: EnemyId,
    /// Display name of the enemy.
    pub name: String,
    /// Index into the path; equals the path length once the enemy walked off it.
    pub path_index: usize,
    /// Path cell currently occupied, `None` once the enemy walked off the path.
    pub cell: Option<CellCoord>,
    /// Remaining health.
    pub health: Health,
    /// Descriptive speed.
    pub speed: Speed,
}

/// Read-only snapshot describing all enemies in store order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EnemyView {
    snapshots: Vec<EnemySnapshot>,
}

impl EnemyView {
    /// Creates a view that preserves the order of the provided snapshots.
    #[must_use]
    pub fn from_snapshots(snapshots: Vec<EnemySnapshot>) -> Self {
        Self { snapshots }
    }

    /// Iterator over the captured enemy snapshots in store order.
    pub fn iter(&self) -> impl Iterator<Item = &EnemySnapshot> {
        self.snapshots.iter()
    }

    /// Number of captured enemies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether no enemies were captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<EnemySnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a single tower used for queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TowerSnapshot {
    /// Identifier of the tower.
    pub id: TowerId,
    /// Cell occupied by the tower.
    pub cell: CellCoord,
    /// Combat parameters of the tower.
    pub stats: TowerStats,
    /// Time left before the tower may fire again.
    pub cooldown: Duration,
}

impl TowerSnapshot {
    /// Reports whether the tower may fire this tick.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.cooldown.is_zero()
    }
}

/// Read-only snapshot describing all towers in placement order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TowerView {
    snapshots: Vec<TowerSnapshot>,
}

impl TowerView {
    /// Creates a view that preserves the order of the provided snapshots.
    #[must_use]
    pub fn from_snapshots(snapshots: Vec<TowerSnapshot>) -> Self {
        Self { snapshots }
    }

    /// Iterator over the captured tower snapshots in placement order.
    pub fn iter(&self) -> impl Iterator<Item = &TowerSnapshot> {
        self.snapshots.iter()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<TowerSnapshot> {
        self.snapshots
    }
}
