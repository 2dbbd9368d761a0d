#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Tower Defence engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! snapshots, and respond exclusively with new command batches.

use std::{fmt, time::Duration};

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests that the next wave of the level begins.
    StartNextWave,
    /// Requests that the world emits an enemy for the running wave.
    SpawnEnemy {
        /// One-based wave number the spawn belongs to.
        wave: u32,
        /// Archetype of the enemy to create.
        kind: EnemyKind,
        /// Index into the level's spawn points.
        spawn: usize,
    },
    /// Requests that the running wave is marked complete.
    CompleteWave {
        /// One-based wave number expected to be running.
        wave: u32,
    },
    /// Requests placement of a tower on the provided cell.
    PlaceTower {
        /// Archetype of tower to construct.
        kind: TowerKind,
        /// Cell the tower occupies.
        cell: CellCoord,
    },
    /// Requests that an existing tower is upgraded by one level.
    UpgradeTower {
        /// Identifier of the tower to upgrade.
        tower: TowerId,
    },
    /// Requests that an existing tower is sold and removed.
    SellTower {
        /// Identifier of the tower to sell.
        tower: TowerId,
    },
    /// Requests that the session is paused or resumed.
    SetPaused {
        /// Whether the session should be paused.
        paused: bool,
    },
    /// Cycles the speed multiplier through x1, x2 and x4.
    CycleSpeed,
    /// Updates the enemy a tower currently tracks.
    RetargetTower {
        /// Identifier of the tower being retargeted.
        tower: TowerId,
        /// Enemy the tower should track, if any.
        target: Option<EnemyId>,
    },
    /// Requests that a tower fires a projectile at the provided enemy.
    FireProjectile {
        /// Identifier of the firing tower.
        tower: TowerId,
        /// Enemy the projectile homes in on.
        target: EnemyId,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Announces that a wave began spawning.
    WaveStarted {
        /// One-based wave number.
        wave: u32,
    },
    /// Reports that a request to start the next wave was rejected.
    WaveRejected {
        /// Specific reason the wave could not start.
        reason: WaveError,
    },
    /// Announces that every enemy of a wave was emitted and cleared.
    WaveCompleted {
        /// One-based wave number that completed.
        wave: u32,
    },
    /// Confirms that an enemy entered the level.
    EnemySpawned {
        /// Identifier assigned to the enemy.
        enemy: EnemyId,
        /// Archetype of the enemy.
        kind: EnemyKind,
        /// Spawn tile the enemy entered from.
        cell: CellCoord,
        /// Health the enemy spawned with.
        health: u32,
    },
    /// Reports that a spawn request was discarded.
    SpawnRejected {
        /// Archetype requested by the spawn.
        kind: EnemyKind,
        /// Specific reason the spawn failed.
        reason: SpawnError,
    },
    /// Reports that an enemy's health dropped to zero or below.
    EnemyDefeated {
        /// Identifier of the destroyed enemy.
        enemy: EnemyId,
        /// Coins awarded for the kill.
        reward: u32,
        /// Pixel position where the enemy died.
        position: Vec2,
    },
    /// Reports that an enemy reached the base.
    EnemyReachedBase {
        /// Identifier of the enemy that leaked through.
        enemy: EnemyId,
        /// Lives remaining after the leak.
        lives: u32,
    },
    /// Confirms that a tower was placed.
    TowerPlaced {
        /// Identifier assigned to the tower.
        tower: TowerId,
        /// Archetype of the tower.
        kind: TowerKind,
        /// Cell the tower occupies.
        cell: CellCoord,
        /// Coins debited for the placement.
        cost: u32,
    },
    /// Reports that a tower placement request was rejected.
    TowerPlacementRejected {
        /// Archetype requested for placement.
        kind: TowerKind,
        /// Cell provided in the placement request.
        cell: CellCoord,
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// Confirms that a tower was upgraded.
    TowerUpgraded {
        /// Identifier of the upgraded tower.
        tower: TowerId,
        /// Level reached after the upgrade.
        level: u32,
        /// Coins debited for the upgrade.
        cost: u32,
    },
    /// Reports that a tower upgrade request was rejected.
    TowerUpgradeRejected {
        /// Identifier of the tower targeted for upgrade.
        tower: TowerId,
        /// Specific reason the upgrade failed.
        reason: UpgradeError,
    },
    /// Confirms that a tower was sold.
    TowerSold {
        /// Identifier of the sold tower.
        tower: TowerId,
        /// Cell the tower vacated.
        cell: CellCoord,
        /// Coins credited for the sale.
        refund: u32,
    },
    /// Reports that a tower sale request was rejected.
    TowerSaleRejected {
        /// Identifier of the tower targeted for sale.
        tower: TowerId,
        /// Specific reason the sale failed.
        reason: SaleError,
    },
    /// Confirms that a tower fired a projectile.
    ProjectileFired {
        /// Identifier of the new projectile.
        projectile: ProjectileId,
        /// Tower that fired.
        tower: TowerId,
        /// Enemy the projectile homes in on.
        target: EnemyId,
    },
    /// Reports that a projectile struck a live enemy.
    ProjectileHit {
        /// Identifier of the projectile.
        projectile: ProjectileId,
        /// Enemy that took the damage.
        target: EnemyId,
        /// Damage subtracted from the enemy's health.
        damage: u32,
    },
    /// Reports that a projectile arrived after its target was gone.
    ProjectileFizzled {
        /// Identifier of the discarded projectile.
        projectile: ProjectileId,
    },
    /// Announces that the pause state changed.
    PauseChanged {
        /// Pause state after the change.
        paused: bool,
    },
    /// Announces that the speed multiplier changed.
    SpeedChanged {
        /// Multiplier after the change.
        speed: SpeedMultiplier,
    },
    /// Announces the terminal outcome of the level.
    LevelFinished {
        /// Victory or defeat.
        outcome: Outcome,
    },
}

/// Kind of a single grid tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileKind {
    /// Buildable ground.
    Empty,
    /// Road that enemies travel along.
    Road,
    /// Entry point where enemies appear.
    Spawn,
    /// The defended base that enemies try to reach.
    Base,
}

impl TileKind {
    /// Decodes the numeric tile code used by level layouts.
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Empty),
            1 => Some(Self::Road),
            2 => Some(Self::Spawn),
            3 => Some(Self::Base),
            _ => None,
        }
    }

    /// Reports whether enemies may step onto the tile while following a path.
    #[must_use]
    pub const fn is_walkable(self) -> bool {
        matches!(self, Self::Road | Self::Base)
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.column().abs_diff(other.column()) + self.row().abs_diff(other.row())
    }

    /// Returns the neighbouring cell in the provided direction, if it exists.
    ///
    /// Only underflow is checked here; callers bound the upper edge against
    /// their grid dimensions.
    #[must_use]
    pub fn step(self, direction: Direction) -> Option<CellCoord> {
        match direction {
            Direction::East => self
                .column
                .checked_add(1)
                .map(|column| CellCoord::new(column, self.row)),
            Direction::West => self
                .column
                .checked_sub(1)
                .map(|column| CellCoord::new(column, self.row)),
            Direction::South => self
                .row
                .checked_add(1)
                .map(|row| CellCoord::new(self.column, row)),
            Direction::North => self
                .row
                .checked_sub(1)
                .map(|row| CellCoord::new(self.column, row)),
        }
    }

    /// Pixel position of the cell's centre for the provided tile size.
    #[must_use]
    pub fn center(self, tile_size: f32) -> Vec2 {
        Vec2::new(
            self.column as f32 * tile_size + tile_size / 2.0,
            self.row as f32 * tile_size + tile_size / 2.0,
        )
    }
}

/// Cardinal directions on the tile grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Movement toward decreasing row indices.
    North,
    /// Movement toward increasing column indices.
    East,
    /// Movement toward increasing row indices.
    South,
    /// Movement toward decreasing column indices.
    West,
}

/// Immutable tile layout of a level.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    columns: u32,
    rows: u32,
    tiles: Vec<TileKind>,
}

impl Grid {
    /// Creates a grid from row-major tiles.
    ///
    /// Returns `None` when the tile count does not match the dimensions.
    #[must_use]
    pub fn new(columns: u32, rows: u32, tiles: Vec<TileKind>) -> Option<Self> {
        let expected = usize::try_from(u64::from(columns) * u64::from(rows)).ok()?;
        if tiles.len() != expected {
            return None;
        }
        Some(Self {
            columns,
            rows,
            tiles,
        })
    }

    /// Number of columns contained in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows contained in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Reports whether the cell lies inside the grid.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.column() < self.columns && cell.row() < self.rows
    }

    /// Kind of the tile at the provided cell, if it lies inside the grid.
    #[must_use]
    pub fn tile(&self, cell: CellCoord) -> Option<TileKind> {
        self.index(cell)
            .and_then(|index| self.tiles.get(index).copied())
    }

    /// Spawn tiles in row-major order.
    #[must_use]
    pub fn spawn_points(&self) -> Vec<CellCoord> {
        self.cells_of(TileKind::Spawn).collect()
    }

    /// The base tile; the last one in row-major order if several exist.
    #[must_use]
    pub fn base(&self) -> Option<CellCoord> {
        self.cells_of(TileKind::Base).last()
    }

    /// Iterator over every cell of the provided kind in row-major order.
    pub fn cells_of(&self, kind: TileKind) -> impl Iterator<Item = CellCoord> + '_ {
        let columns = self.columns.max(1);
        self.tiles
            .iter()
            .enumerate()
            .filter(move |(_, tile)| **tile == kind)
            .map(move |(index, _)| {
                let index = index as u32;
                CellCoord::new(index % columns, index / columns)
            })
    }

    /// Dense index of the cell in row-major order.
    #[must_use]
    pub fn index(&self, cell: CellCoord) -> Option<usize> {
        if !self.contains(cell) {
            return None;
        }
        let row = usize::try_from(cell.row()).ok()?;
        let column = usize::try_from(cell.column()).ok()?;
        let width = usize::try_from(self.columns).ok()?;
        Some(row * width + column)
    }
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

/// Unique identifier assigned to a projectile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProjectileId(u32);

impl ProjectileId {
    /// Creates a new projectile identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the projectile identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Name of an enemy archetype defined by the catalog, such as `CIRCLE`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnemyKind(String);

impl EnemyKind {
    /// Creates an archetype name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Archetype name as written in the catalog.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EnemyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Name of a tower archetype defined by the catalog, such as `BASIC`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TowerKind(String);

impl TowerKind {
    /// Creates an archetype name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Archetype name as written in the catalog.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TowerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Silhouette drawn for an enemy archetype.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    /// Round enemy.
    Circle,
    /// Three-cornered enemy.
    Triangle,
    /// Four-cornered enemy.
    Square,
}

/// Opaque RGB colour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Color {
    red: u8,
    green: u8,
    blue: u8,
}

impl Color {
    /// Pure white, used for flashes.
    pub const WHITE: Color = Color::from_rgb(0xff, 0xff, 0xff);

    /// Creates a new colour from byte RGB components.
    #[must_use]
    pub const fn from_rgb(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Parses a `#rrggbb` hex string.
    #[must_use]
    pub fn from_hex(value: &str) -> Option<Self> {
        let digits = value.strip_prefix('#')?;
        if digits.len() != 6 || !digits.is_ascii() {
            return None;
        }
        let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&digits[range], 16).ok();
        Some(Self::from_rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }

    /// Red component of the colour.
    #[must_use]
    pub const fn red(&self) -> u8 {
        self.red
    }

    /// Green component of the colour.
    #[must_use]
    pub const fn green(&self) -> u8 {
        self.green
    }

    /// Blue component of the colour.
    #[must_use]
    pub const fn blue(&self) -> u8 {
        self.blue
    }
}

/// Throughput multiplier applied to movement, decay and timers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpeedMultiplier {
    /// Normal speed.
    #[default]
    X1,
    /// Double speed.
    X2,
    /// Quadruple speed.
    X4,
}

impl SpeedMultiplier {
    /// Numeric factor of the multiplier.
    #[must_use]
    pub const fn factor(self) -> u32 {
        match self {
            Self::X1 => 1,
            Self::X2 => 2,
            Self::X4 => 4,
        }
    }

    /// Multiplier selected by the next press of the speed control.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::X1 => Self::X2,
            Self::X2 => Self::X4,
            Self::X4 => Self::X1,
        }
    }

    /// Divides an interval by the multiplier, never going below `floor`.
    #[must_use]
    pub fn scale_interval(self, interval: Duration, floor: Duration) -> Duration {
        (interval / self.factor()).max(floor)
    }

    /// Multiplier matching a numeric factor of 1, 2 or 4.
    #[must_use]
    pub const fn from_factor(factor: u32) -> Option<Self> {
        match factor {
            1 => Some(Self::X1),
            2 => Some(Self::X2),
            4 => Some(Self::X4),
            _ => None,
        }
    }
}

/// Terminal result of a level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// The final wave was cleared.
    Victory {
        /// Star rating from zero to three based on remaining lives.
        stars: u8,
    },
    /// Every life was lost.
    Defeat,
}

/// Reasons a request to start the next wave may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WaveError {
    /// The session is paused.
    Paused,
    /// The level already ended.
    LevelFinished,
    /// A wave is still running.
    InProgress,
    /// Every wave of the level was already played.
    Exhausted,
}

/// Reasons a spawn request may be discarded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpawnError {
    /// The spawn referenced a wave that is not running.
    StaleWave,
    /// The catalog does not define the requested enemy archetype.
    UnknownKind,
    /// The level defines no spawn tile.
    NoSpawnPoint,
}

/// Reasons a tower placement request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlacementError {
    /// The level already ended.
    LevelFinished,
    /// The requested cell lies outside the grid.
    OutOfBounds,
    /// The requested cell is not an empty tile.
    NotBuildable,
    /// Another tower already occupies the cell.
    Occupied,
    /// The catalog does not define the requested tower archetype.
    UnknownKind,
    /// The coin balance does not cover the tower's cost.
    InsufficientFunds,
}

/// Reasons a tower upgrade request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpgradeError {
    /// The level already ended.
    LevelFinished,
    /// No tower with the provided identifier exists.
    MissingTower,
    /// The tower already reached the level cap.
    MaxLevel,
    /// The coin balance does not cover the upgrade cost.
    InsufficientFunds,
}

/// Reasons a tower sale request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SaleError {
    /// The level already ended.
    LevelFinished,
    /// No tower with the provided identifier exists.
    MissingTower,
}

/// Combat parameters of a tower; mutated by upgrades.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TowerStats {
    /// Damage carried by each projectile.
    pub damage: u32,
    /// Targeting radius in pixels.
    pub range: u32,
    /// Time between shots at normal speed.
    pub fire_interval: Duration,
    /// Projectile travel per tick in pixels.
    pub projectile_speed: u32,
}

/// Immutable representation of a single enemy's state used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct EnemySnapshot {
    /// Unique identifier assigned to the enemy.
    pub id: EnemyId,
    /// Archetype of the enemy.
    pub kind: EnemyKind,
    /// Silhouette of the archetype.
    pub shape: Shape,
    /// Colour of the archetype.
    pub color: Color,
    /// Remaining health; zero or negative once fatally damaged.
    pub health: i32,
    /// Health the enemy spawned with.
    pub max_health: u32,
    /// Pixel position of the enemy's centre.
    pub position: Vec2,
    /// Index of the last path tile the enemy reached.
    pub path_index: usize,
}

/// Read-only snapshot describing all enemies within the level.
#[derive(Clone, Debug, Default)]
pub struct EnemyView {
    snapshots: Vec<EnemySnapshot>,
}

impl EnemyView {
    /// Creates a new enemy view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EnemySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured enemy snapshots in spawn order.
    pub fn iter(&self) -> impl Iterator<Item = &EnemySnapshot> {
        self.snapshots.iter()
    }

    /// Number of captured enemies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view contains no enemies.
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

/// Immutable representation of a single tower's state used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct TowerSnapshot {
    /// Identifier allocated to the tower by the world.
    pub id: TowerId,
    /// Archetype of the tower.
    pub kind: TowerKind,
    /// Cell occupied by the tower.
    pub cell: CellCoord,
    /// Pixel position of the tower's centre.
    pub position: Vec2,
    /// Current combat parameters.
    pub stats: TowerStats,
    /// Upgrade level, from one to the cap.
    pub level: u32,
    /// Coins invested through placement and upgrades.
    pub invested: u32,
    /// Number of projectiles fired so far.
    pub shots_fired: u32,
    /// Enemy currently tracked, if any.
    pub target: Option<EnemyId>,
    /// Simulated time left before the tower may fire again.
    pub ready_in: Duration,
}

/// Read-only snapshot describing all towers placed within the level.
#[derive(Clone, Debug, Default)]
pub struct TowerView {
    snapshots: Vec<TowerSnapshot>,
}

impl TowerView {
    /// Creates a new tower view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<TowerSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured tower snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &TowerSnapshot> {
        self.snapshots.iter()
    }

    /// Looks up a tower snapshot by identifier.
    #[must_use]
    pub fn get(&self, tower: TowerId) -> Option<&TowerSnapshot> {
        self.snapshots
            .binary_search_by_key(&tower, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<TowerSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a projectile in flight.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectileSnapshot {
    /// Identifier of the projectile.
    pub id: ProjectileId,
    /// Pixel position of the projectile.
    pub position: Vec2,
    /// Point the projectile is flying toward.
    pub aim: Vec2,
    /// Enemy the projectile homes in on.
    pub target: EnemyId,
    /// Colour of the firing tower's projectiles.
    pub color: Color,
}

/// Immutable representation of a cosmetic particle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParticleSnapshot {
    /// Pixel position of the particle.
    pub position: Vec2,
    /// Current drawing size in pixels.
    pub size: f32,
    /// Particle colour.
    pub color: Color,
    /// Fraction of lifetime remaining, from one down to zero.
    pub life: f32,
    /// Whether the particle is the bright flash at the centre of a burst.
    pub flash: bool,
}

/// Tower assignment produced by the targeting system.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TowerTarget {
    /// Tower that was evaluated.
    pub tower: TowerId,
    /// Nearest enemy within range, if any.
    pub enemy: Option<EnemyId>,
}

/// Scalar session state exposed to renderers and adapters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SessionSnapshot {
    /// Identifier of the running level.
    pub level: u32,
    /// Current coin balance.
    pub coins: u32,
    /// Lives remaining.
    pub lives: u32,
    /// One-based number of the current or next wave.
    pub wave: u32,
    /// Number of waves in the level.
    pub max_waves: u32,
    /// Whether a wave is running.
    pub wave_in_progress: bool,
    /// Whether the session is paused.
    pub paused: bool,
    /// Active speed multiplier.
    pub speed: SpeedMultiplier,
    /// Terminal outcome, once decided.
    pub outcome: Option<Outcome>,
    /// Current screen shake intensity in pixels.
    pub shake: f32,
    /// Simulated time elapsed while unpaused.
    pub clock: Duration,
}
