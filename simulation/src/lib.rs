#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Fixed-tick driver that owns the running level session.
//!
//! A [`Simulation`] wraps the authoritative world together with the systems
//! that feed it commands. Each call to [`Simulation::tick`] advances the world
//! by one frame and then runs targeting, combat and wave scheduling in that
//! order. Restarting or switching levels replaces the whole session, so no
//! scheduler state from a previous run can leak into the new one.

use std::{sync::Arc, time::Duration};

use log::{info, warn};
use tower_defence_catalog::Catalog;
use tower_defence_core::{
    CellCoord, Command, EnemySnapshot, Event, ParticleSnapshot, ProjectileSnapshot,
    SessionSnapshot, TowerId, TowerKind, TowerSnapshot, TowerTarget,
};
use tower_defence_system_spawning::{Config as SpawningConfig, Spawning};
use tower_defence_system_tower_combat::TowerCombat;
use tower_defence_system_tower_targeting::TowerTargeting;
use tower_defence_world::{self as world, query, World, WorldError};

const DEFAULT_FRAME: Duration = Duration::from_millis(16);
const COMPLETION_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Errors raised while starting a level session.
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    /// The world could not be built for the requested level.
    #[error("failed to start level {level}")]
    Level {
        /// Requested level identifier.
        level: u32,
        /// Underlying world construction failure.
        #[source]
        source: WorldError,
    },
}

/// Parameters shared by every session the simulation creates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionConfig {
    seed: u64,
    frame: Duration,
}

impl SessionConfig {
    /// Creates a configuration with the provided RNG seed and frame length.
    #[must_use]
    pub const fn new(seed: u64, frame: Duration) -> Self {
        Self { seed, frame }
    }

    /// Seed of the cosmetic RNG owned by each session.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Simulated time advanced by a single tick.
    #[must_use]
    pub const fn frame(&self) -> Duration {
        self.frame
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new(0, DEFAULT_FRAME)
    }
}

/// Player-facing commands accepted between ticks.
#[derive(Clone, Debug, PartialEq)]
pub enum Input {
    /// Starts the next wave of the running level.
    StartNextWave,
    /// Places a tower of the given archetype on a cell.
    PlaceTower {
        /// Tower archetype.
        kind: TowerKind,
        /// Target cell.
        cell: CellCoord,
    },
    /// Upgrades a tower by one level.
    UpgradeTower {
        /// Tower to upgrade.
        tower: TowerId,
    },
    /// Sells a tower.
    SellTower {
        /// Tower to sell.
        tower: TowerId,
    },
    /// Pauses or resumes the session.
    SetPaused {
        /// Requested pause state.
        paused: bool,
    },
    /// Cycles the speed multiplier through 1x, 2x and 4x.
    CycleSpeed,
    /// Discards the running session and starts the provided level.
    StartLevel {
        /// Level identifier from the catalog.
        level: u32,
    },
}

/// Read-only render surface captured after a tick.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    /// Generation of the session the frame was captured from.
    pub generation: u64,
    /// Scalar session state.
    pub session: SessionSnapshot,
    /// Enemies ordered by identifier.
    pub enemies: Vec<EnemySnapshot>,
    /// Towers ordered by identifier.
    pub towers: Vec<TowerSnapshot>,
    /// Projectiles in flight.
    pub projectiles: Vec<ProjectileSnapshot>,
    /// Cosmetic particles.
    pub particles: Vec<ParticleSnapshot>,
}

#[derive(Debug)]
struct Session {
    world: World,
    spawning: Spawning,
    targeting: TowerTargeting,
    combat: TowerCombat,
    spawn_count: usize,
    targets: Vec<TowerTarget>,
    commands: Vec<Command>,
    inbox: Vec<Event>,
}

impl Session {
    fn new(catalog: &Arc<Catalog>, level: u32, seed: u64) -> Result<Self, SimulationError> {
        let world = World::new(Arc::clone(catalog), level, seed)
            .map_err(|source| SimulationError::Level { level, source })?;
        let waves = catalog
            .level(level)
            .map(|definition| definition.waves.clone())
            .unwrap_or_default();
        let config = SpawningConfig::new(
            catalog.constants().spawn_interval,
            COMPLETION_POLL_INTERVAL,
        );
        let spawn_count = query::spawn_points(&world).len();

        Ok(Self {
            world,
            spawning: Spawning::new(config, waves),
            targeting: TowerTargeting::new(),
            combat: TowerCombat::new(),
            spawn_count,
            targets: Vec::new(),
            commands: Vec::new(),
            inbox: Vec::new(),
        })
    }

    fn apply(&mut self, command: Command, out: &mut Vec<Event>) {
        let mark = out.len();
        world::apply(&mut self.world, command, out);
        self.inbox.extend_from_slice(&out[mark..]);
    }

    fn flush_commands(&mut self, out: &mut Vec<Event>) {
        let mark = out.len();
        for command in self.commands.drain(..) {
            world::apply(&mut self.world, command, out);
        }
        self.inbox.extend_from_slice(&out[mark..]);
    }

    fn tick(&mut self, dt: Duration, out: &mut Vec<Event>) {
        if query::is_paused(&self.world) || query::outcome(&self.world).is_some() {
            return;
        }

        self.apply(Command::Tick { dt }, out);

        let towers = query::tower_view(&self.world);
        let enemies = query::enemy_view(&self.world);
        self.targeting.handle(&towers, &enemies, &mut self.targets);
        self.combat.handle(&towers, &self.targets, &mut self.commands);
        self.flush_commands(out);

        self.spawning.handle(
            &self.inbox,
            query::speed(&self.world),
            self.spawn_count,
            query::enemy_count(&self.world),
            &mut self.commands,
        );
        self.inbox.clear();
        self.flush_commands(out);
    }
}

/// Owns the running level session and drives it one frame at a time.
#[derive(Debug)]
pub struct Simulation {
    catalog: Arc<Catalog>,
    config: SessionConfig,
    generation: u64,
    level: u32,
    session: Session,
}

impl Simulation {
    /// Creates a simulation running the provided level.
    pub fn new(
        catalog: Arc<Catalog>,
        level: u32,
        config: SessionConfig,
    ) -> Result<Self, SimulationError> {
        let session = Session::new(&catalog, level, config.seed())?;
        info!("starting level {level}");
        Ok(Self {
            catalog,
            config,
            generation: 0,
            level,
            session,
        })
    }

    /// Generation of the running session, incremented by every level start.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Identifier of the running level.
    #[must_use]
    pub const fn level(&self) -> u32 {
        self.level
    }

    /// Catalog the sessions are built from.
    #[must_use]
    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Configuration applied to every session.
    #[must_use]
    pub const fn config(&self) -> SessionConfig {
        self.config
    }

    /// Read-only access to the running world for [`query`] functions.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.session.world
    }

    /// Replaces the running session with a fresh one for `level`.
    ///
    /// Pending spawns and completion polls of the previous session are
    /// dropped together with it. On failure the running session is kept.
    pub fn start_level(&mut self, level: u32) -> Result<(), SimulationError> {
        let session = Session::new(&self.catalog, level, self.config.seed())?;
        self.session = session;
        self.level = level;
        self.generation = self.generation.wrapping_add(1);
        info!("starting level {level} (generation {})", self.generation);
        Ok(())
    }

    /// Applies a player input between ticks, appending the resulting events.
    pub fn submit(&mut self, input: Input, out: &mut Vec<Event>) -> Result<(), SimulationError> {
        let command = match input {
            Input::StartLevel { level } => return self.start_level(level),
            Input::StartNextWave => Command::StartNextWave,
            Input::PlaceTower { kind, cell } => Command::PlaceTower { kind, cell },
            Input::UpgradeTower { tower } => Command::UpgradeTower { tower },
            Input::SellTower { tower } => Command::SellTower { tower },
            Input::SetPaused { paused } => Command::SetPaused { paused },
            Input::CycleSpeed => Command::CycleSpeed,
        };
        self.session.apply(command, out);
        Ok(())
    }

    /// Applies an input issued against a specific session generation.
    ///
    /// Inputs stamped with an older generation are discarded and `false` is
    /// returned, so a request queued before a restart cannot reach the new
    /// session.
    pub fn submit_for(
        &mut self,
        generation: u64,
        input: Input,
        out: &mut Vec<Event>,
    ) -> Result<bool, SimulationError> {
        if generation != self.generation {
            warn!(
                "discarding {input:?} issued for generation {generation}, current is {}",
                self.generation
            );
            return Ok(false);
        }
        self.submit(input, out)?;
        Ok(true)
    }

    /// Advances the session by one frame. Does nothing while paused or once
    /// the level has finished.
    pub fn tick(&mut self, out: &mut Vec<Event>) {
        self.session.tick(self.config.frame(), out);
    }

    /// Captures the render surface of the running session.
    #[must_use]
    pub fn frame(&self) -> Frame {
        let world = &self.session.world;
        Frame {
            generation: self.generation,
            session: query::session(world),
            enemies: query::enemy_view(world).into_vec(),
            towers: query::tower_view(world).into_vec(),
            projectiles: query::projectile_view(world),
            particles: query::particle_view(world),
        }
    }
}
