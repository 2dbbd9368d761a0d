#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Read-only configuration catalog for the Tower Defence engine.
//!
//! The catalog holds every static table the simulation consults: enemy and
//! tower archetypes, level layouts with their difficulty multipliers, the wave
//! composition of each level, and the global game constants. Catalogs are
//! authored as TOML documents and validated in full when loaded, so the
//! simulation can treat every archetype reference it receives as resolvable.

use std::{
    collections::{BTreeMap, BTreeSet},
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;
use tower_defence_core::{Color, EnemyKind, Grid, Shape, TileKind, TowerKind, TowerStats};

const SUPPORTED_CATALOG_VERSION: u32 = 1;
const BUILTIN_CATALOG: &str = include_str!("../data/default.toml");

/// Errors raised while loading or validating a catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// The catalog file could not be read.
    #[error("failed to read catalog at {path}")]
    Io {
        /// Location of the catalog file.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The catalog document is not valid TOML for the expected schema.
    #[error("failed to parse catalog toml contents")]
    Parse(#[from] toml::de::Error),
    /// The catalog declares a version this engine cannot read.
    #[error("unsupported catalog version {found}; expected {expected}")]
    UnsupportedVersion {
        /// Version declared by the document.
        found: u32,
        /// Version understood by the engine.
        expected: u32,
    },
    /// A colour string is not in `#rrggbb` notation.
    #[error("invalid colour `{value}` for {owner}")]
    InvalidColor {
        /// Archetype that declared the colour.
        owner: String,
        /// Offending colour string.
        value: String,
    },
    /// A level grid contains an unknown tile code.
    #[error("level {level} has unknown tile code `{code}` at row {row}")]
    UnknownTile {
        /// Level identifier.
        level: u32,
        /// Zero-based row index.
        row: usize,
        /// Offending character.
        code: char,
    },
    /// A level grid has rows of different lengths or no rows at all.
    #[error("level {level} grid is empty or ragged")]
    RaggedGrid {
        /// Level identifier.
        level: u32,
    },
    /// A level grid does not contain exactly one base tile.
    #[error("level {level} must contain exactly one base tile, found {found}")]
    BaseCount {
        /// Level identifier.
        level: u32,
        /// Number of base tiles present.
        found: usize,
    },
    /// Two levels share the same identifier.
    #[error("level {level} is defined more than once")]
    DuplicateLevel {
        /// Level identifier.
        level: u32,
    },
    /// A level declares a difficulty multiplier that is not positive.
    #[error("level {level} has non-positive difficulty {difficulty}")]
    InvalidDifficulty {
        /// Level identifier.
        level: u32,
        /// Offending multiplier.
        difficulty: f64,
    },
    /// A level declares no waves, so it could never be won.
    #[error("level {level} declares no waves")]
    NoWaves {
        /// Level identifier.
        level: u32,
    },
    /// A wave references an enemy archetype the catalog does not define.
    #[error("level {level} wave {wave} references unknown enemy `{kind}`")]
    UnknownEnemy {
        /// Level identifier.
        level: u32,
        /// One-based wave number.
        wave: usize,
        /// Undefined archetype name.
        kind: EnemyKind,
    },
    /// An archetype declares a stat that cannot drive the simulation.
    #[error("{owner} has invalid {field}")]
    InvalidStat {
        /// Archetype or section that declared the stat.
        owner: String,
        /// Name of the offending field.
        field: &'static str,
    },
}

/// Template describing the base stats of an enemy type.
#[derive(Clone, Debug, PartialEq)]
pub struct EnemyArchetype {
    /// Silhouette drawn for the enemy.
    pub shape: Shape,
    /// Health before the level's difficulty multiplier is applied.
    pub health: u32,
    /// Pixels travelled per tick at normal speed.
    pub speed: f32,
    /// Coins awarded for destroying the enemy.
    pub reward: u32,
    /// Body colour.
    pub color: Color,
}

/// Template describing the base stats of a tower type.
#[derive(Clone, Debug, PartialEq)]
pub struct TowerArchetype {
    /// Human-readable tower name.
    pub name: String,
    /// Placement cost in coins.
    pub cost: u32,
    /// Combat parameters a freshly placed tower starts with.
    pub stats: TowerStats,
    /// Body colour.
    pub color: Color,
    /// Projectile colour.
    pub projectile_color: Color,
}

/// A run of identical enemies inside a wave.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct WaveGroup {
    /// Archetype spawned by the group.
    pub kind: EnemyKind,
    /// Number of enemies in the group.
    pub count: u32,
}

/// Ordered batch of enemy groups released together.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Wave {
    groups: Vec<WaveGroup>,
}

impl Wave {
    /// Creates a wave from its ordered groups.
    #[must_use]
    pub fn new(groups: Vec<WaveGroup>) -> Self {
        Self { groups }
    }

    /// Ordered groups of the wave.
    #[must_use]
    pub fn groups(&self) -> &[WaveGroup] {
        &self.groups
    }

    /// Total number of enemies emitted by the wave.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.groups
            .iter()
            .fold(0u32, |total, group| total.saturating_add(group.count))
    }

    /// Archetype of the enemy emitted at the provided flattened index.
    #[must_use]
    pub fn kind_at(&self, index: u32) -> Option<&EnemyKind> {
        let mut start = 0u32;
        for group in &self.groups {
            let end = start.saturating_add(group.count);
            if index < end {
                return Some(&group.kind);
            }
            start = end;
        }
        None
    }
}

/// Static definition of a playable level.
#[derive(Clone, Debug, PartialEq)]
pub struct Level {
    /// Level identifier.
    pub id: u32,
    /// Display name.
    pub name: String,
    /// Short description.
    pub description: String,
    /// Multiplier applied to enemy health at spawn time.
    pub difficulty: f64,
    /// Tile layout.
    pub grid: Grid,
    /// Ordered waves of the level.
    pub waves: Vec<Wave>,
}

impl Level {
    /// Difficulty rating from one to five derived from the health multiplier.
    #[must_use]
    pub fn difficulty_rating(&self) -> u8 {
        match self.difficulty {
            d if d <= 1.05 => 1,
            d if d <= 1.1 => 2,
            d if d <= 1.15 => 3,
            d if d <= 1.2 => 4,
            _ => 5,
        }
    }

    /// Number of waves in the level.
    #[must_use]
    pub fn wave_count(&self) -> u32 {
        u32::try_from(self.waves.len()).unwrap_or(u32::MAX)
    }

    /// Wave with the provided one-based number.
    #[must_use]
    pub fn wave(&self, number: u32) -> Option<&Wave> {
        let index = usize::try_from(number.checked_sub(1)?).ok()?;
        self.waves.get(index)
    }
}

/// Global tuning values shared by every level.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Constants {
    /// Side length of a tile in pixels.
    pub tile_size: f32,
    /// Coin balance at the start of a level.
    pub starting_coins: u32,
    /// Lives at the start of a level.
    pub starting_lives: u32,
    /// Time between enemy emissions at normal speed.
    pub spawn_interval: Duration,
}

/// Validated configuration catalog.
#[derive(Clone, Debug)]
pub struct Catalog {
    constants: Constants,
    enemies: BTreeMap<EnemyKind, EnemyArchetype>,
    towers: BTreeMap<TowerKind, TowerArchetype>,
    levels: BTreeMap<u32, Level>,
}

impl Catalog {
    /// Loads the catalog bundled with the engine.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_toml_str(BUILTIN_CATALOG)
    }

    /// Loads a catalog from the TOML file at the provided path.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Parses and validates a catalog from TOML contents.
    pub fn from_toml_str(contents: &str) -> Result<Self, CatalogError> {
        let manifest: Manifest = toml::from_str(contents)?;
        if manifest.version != SUPPORTED_CATALOG_VERSION {
            return Err(CatalogError::UnsupportedVersion {
                found: manifest.version,
                expected: SUPPORTED_CATALOG_VERSION,
            });
        }

        let constants = manifest.constants.resolve()?;

        let mut enemies = BTreeMap::new();
        for (kind, raw) in manifest.enemies {
            let archetype = raw.resolve(&kind)?;
            let _ = enemies.insert(kind, archetype);
        }

        let mut towers = BTreeMap::new();
        for (kind, raw) in manifest.towers {
            let archetype = raw.resolve(&kind)?;
            let _ = towers.insert(kind, archetype);
        }

        let mut levels = BTreeMap::new();
        for raw in manifest.levels {
            let level = raw.resolve(&enemies)?;
            let id = level.id;
            if levels.insert(id, level).is_some() {
                return Err(CatalogError::DuplicateLevel { level: id });
            }
        }

        Ok(Self {
            constants,
            enemies,
            towers,
            levels,
        })
    }

    /// Global tuning values.
    #[must_use]
    pub const fn constants(&self) -> &Constants {
        &self.constants
    }

    /// Enemy archetype with the provided name.
    #[must_use]
    pub fn enemy(&self, kind: &EnemyKind) -> Option<&EnemyArchetype> {
        self.enemies.get(kind)
    }

    /// Tower archetype with the provided name.
    #[must_use]
    pub fn tower(&self, kind: &TowerKind) -> Option<&TowerArchetype> {
        self.towers.get(kind)
    }

    /// Level with the provided identifier.
    #[must_use]
    pub fn level(&self, id: u32) -> Option<&Level> {
        self.levels.get(&id)
    }

    /// Names of every tower archetype in sorted order.
    pub fn tower_kinds(&self) -> impl Iterator<Item = &TowerKind> {
        self.towers.keys()
    }

    /// Every level in identifier order.
    pub fn levels(&self) -> impl Iterator<Item = &Level> {
        self.levels.values()
    }
}

#[derive(Debug, Deserialize)]
struct Manifest {
    version: u32,
    constants: RawConstants,
    #[serde(default)]
    enemies: BTreeMap<EnemyKind, RawEnemy>,
    #[serde(default)]
    towers: BTreeMap<TowerKind, RawTower>,
    #[serde(default)]
    levels: Vec<RawLevel>,
}

#[derive(Debug, Deserialize)]
struct RawConstants {
    tile_size: f32,
    starting_coins: u32,
    starting_lives: u32,
    spawn_interval_ms: u64,
}

impl RawConstants {
    fn resolve(self) -> Result<Constants, CatalogError> {
        if !(self.tile_size > 0.0) {
            return Err(invalid_stat("constants", "tile_size"));
        }
        if self.spawn_interval_ms == 0 {
            return Err(invalid_stat("constants", "spawn_interval_ms"));
        }
        Ok(Constants {
            tile_size: self.tile_size,
            starting_coins: self.starting_coins,
            starting_lives: self.starting_lives,
            spawn_interval: Duration::from_millis(self.spawn_interval_ms),
        })
    }
}

#[derive(Debug, Deserialize)]
struct RawEnemy {
    shape: Shape,
    health: u32,
    speed: f32,
    reward: u32,
    color: String,
}

impl RawEnemy {
    fn resolve(self, kind: &EnemyKind) -> Result<EnemyArchetype, CatalogError> {
        let owner = format!("enemy {kind}");
        if self.health == 0 {
            return Err(invalid_stat(&owner, "health"));
        }
        if !(self.speed > 0.0) {
            return Err(invalid_stat(&owner, "speed"));
        }
        Ok(EnemyArchetype {
            shape: self.shape,
            health: self.health,
            speed: self.speed,
            reward: self.reward,
            color: parse_color(&owner, &self.color)?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct RawTower {
    name: String,
    cost: u32,
    damage: u32,
    range: u32,
    fire_interval_ms: u64,
    color: String,
    projectile_color: String,
    projectile_speed: u32,
}

impl RawTower {
    fn resolve(self, kind: &TowerKind) -> Result<TowerArchetype, CatalogError> {
        let owner = format!("tower {kind}");
        if self.fire_interval_ms == 0 {
            return Err(invalid_stat(&owner, "fire_interval_ms"));
        }
        if self.projectile_speed == 0 {
            return Err(invalid_stat(&owner, "projectile_speed"));
        }
        Ok(TowerArchetype {
            name: self.name,
            cost: self.cost,
            stats: TowerStats {
                damage: self.damage,
                range: self.range,
                fire_interval: Duration::from_millis(self.fire_interval_ms),
                projectile_speed: self.projectile_speed,
            },
            color: parse_color(&owner, &self.color)?,
            projectile_color: parse_color(&owner, &self.projectile_color)?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct RawLevel {
    id: u32,
    name: String,
    #[serde(default)]
    description: String,
    difficulty: f64,
    grid: Vec<String>,
    #[serde(default)]
    waves: Vec<Vec<WaveGroup>>,
}

impl RawLevel {
    fn resolve(
        self,
        enemies: &BTreeMap<EnemyKind, EnemyArchetype>,
    ) -> Result<Level, CatalogError> {
        let level = self.id;
        if !(self.difficulty > 0.0) {
            return Err(CatalogError::InvalidDifficulty {
                level,
                difficulty: self.difficulty,
            });
        }

        let grid = parse_grid(level, &self.grid)?;
        let bases = grid.cells_of(TileKind::Base).count();
        if bases != 1 {
            return Err(CatalogError::BaseCount {
                level,
                found: bases,
            });
        }

        if self.waves.is_empty() {
            return Err(CatalogError::NoWaves { level });
        }

        let known: BTreeSet<&EnemyKind> = enemies.keys().collect();
        for (index, groups) in self.waves.iter().enumerate() {
            if let Some(group) = groups.iter().find(|group| !known.contains(&group.kind)) {
                return Err(CatalogError::UnknownEnemy {
                    level,
                    wave: index + 1,
                    kind: group.kind.clone(),
                });
            }
        }

        Ok(Level {
            id: level,
            name: self.name,
            description: self.description,
            difficulty: self.difficulty,
            grid,
            waves: self.waves.into_iter().map(Wave::new).collect(),
        })
    }
}

fn parse_grid(level: u32, rows: &[String]) -> Result<Grid, CatalogError> {
    let Some(first) = rows.first() else {
        return Err(CatalogError::RaggedGrid { level });
    };
    let columns = first.chars().count();
    if columns == 0 {
        return Err(CatalogError::RaggedGrid { level });
    }

    let mut tiles = Vec::with_capacity(columns * rows.len());
    for (row, line) in rows.iter().enumerate() {
        if line.chars().count() != columns {
            return Err(CatalogError::RaggedGrid { level });
        }
        for code in line.chars() {
            let tile = code
                .to_digit(10)
                .and_then(|digit| u8::try_from(digit).ok())
                .and_then(TileKind::from_code)
                .ok_or(CatalogError::UnknownTile { level, row, code })?;
            tiles.push(tile);
        }
    }

    let columns = u32::try_from(columns).map_err(|_| CatalogError::RaggedGrid { level })?;
    let rows = u32::try_from(rows.len()).map_err(|_| CatalogError::RaggedGrid { level })?;
    Grid::new(columns, rows, tiles).ok_or(CatalogError::RaggedGrid { level })
}

fn parse_color(owner: &str, value: &str) -> Result<Color, CatalogError> {
    Color::from_hex(value).ok_or_else(|| CatalogError::InvalidColor {
        owner: owner.to_owned(),
        value: value.to_owned(),
    })
}

fn invalid_stat(owner: &str, field: &'static str) -> CatalogError {
    CatalogError::InvalidStat {
        owner: owner.to_owned(),
        field,
    }
}
