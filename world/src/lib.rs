#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative level session state for the Tower Defence engine.
//!
//! The world owns the grid, the precomputed paths and every live entity of
//! the running level. It only changes through [`apply`], which executes a
//! single [`Command`] and reports what happened as [`Event`] values. Read-only
//! access for systems and renderers goes through the [`query`] module.

pub mod economy;
pub mod navigation;

mod effects;
mod enemies;
mod projectiles;
mod towers;

use std::{sync::Arc, time::Duration};

use log::{debug, error, info, warn};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tower_defence_catalog::Catalog;
use tower_defence_core::{
    CellCoord, Command, EnemyId, EnemyKind, Event, Grid, Outcome, PlacementError, ProjectileId,
    SaleError, SpawnError, SpeedMultiplier, TileKind, TowerId, TowerKind, UpgradeError, WaveError,
};

use effects::{Particle, ScreenShake};
use enemies::{Enemy, Progress};
use navigation::Path;
use projectiles::{Flight, Projectile};
use towers::{TowerRegistry, TowerState};

/// Errors raised while building a level session.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// The catalog does not define the requested level.
    #[error("level {level} is not defined in the catalog")]
    UnknownLevel {
        /// Requested level identifier.
        level: u32,
    },
    /// The level grid has no base tile.
    #[error("level {level} has no base tile")]
    MissingBase {
        /// Level identifier.
        level: u32,
    },
}

/// Represents the authoritative state of one running level.
#[derive(Debug)]
pub struct World {
    catalog: Arc<Catalog>,
    level: u32,
    difficulty: f64,
    tile_size: f32,
    starting_lives: u32,
    grid: Grid,
    spawn_points: Vec<CellCoord>,
    paths: Vec<Path>,
    enemies: Vec<Enemy>,
    towers: TowerRegistry,
    projectiles: Vec<Projectile>,
    particles: Vec<Particle>,
    shake: ScreenShake,
    rng: ChaCha8Rng,
    coins: u32,
    lives: u32,
    wave: u32,
    max_waves: u32,
    wave_in_progress: bool,
    paused: bool,
    speed: SpeedMultiplier,
    outcome: Option<Outcome>,
    clock: Duration,
    next_enemy_id: u32,
    next_projectile_id: u32,
}

impl World {
    /// Creates a fresh session for the provided level.
    ///
    /// Paths from every spawn point to the base are computed once here and
    /// stay fixed for the lifetime of the session. `seed` drives the cosmetic
    /// randomness of explosion particles.
    pub fn new(catalog: Arc<Catalog>, level: u32, seed: u64) -> Result<Self, WorldError> {
        let definition = catalog
            .level(level)
            .ok_or(WorldError::UnknownLevel { level })?;
        let grid = definition.grid.clone();
        let base = grid.base().ok_or(WorldError::MissingBase { level })?;
        let spawn_points = grid.spawn_points();
        let paths: Vec<Path> = spawn_points
            .iter()
            .map(|spawn| navigation::compute_path(&grid, *spawn, base))
            .collect();
        for (spawn, path) in spawn_points.iter().zip(&paths) {
            if !path.reaches_base() {
                warn!(
                    "level {level}: path from spawn {spawn:?} stops after {} tiles without reaching the base",
                    path.len()
                );
            }
        }

        let constants = *catalog.constants();
        let difficulty = definition.difficulty;
        let max_waves = definition.wave_count();
        let towers = TowerRegistry::new(&grid);

        Ok(Self {
            level,
            difficulty,
            tile_size: constants.tile_size,
            starting_lives: constants.starting_lives,
            grid,
            spawn_points,
            paths,
            enemies: Vec::new(),
            towers,
            projectiles: Vec::new(),
            particles: Vec::new(),
            shake: ScreenShake::default(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            coins: constants.starting_coins,
            lives: constants.starting_lives,
            wave: 1,
            max_waves,
            wave_in_progress: false,
            paused: false,
            speed: SpeedMultiplier::default(),
            outcome: None,
            clock: Duration::ZERO,
            next_enemy_id: 0,
            next_projectile_id: 0,
            catalog,
        })
    }

    fn factor(&self) -> f32 {
        self.speed.factor() as f32
    }

    fn enemy(&self, enemy: EnemyId) -> Option<&Enemy> {
        self.enemies.iter().find(|candidate| candidate.id == enemy)
    }

    fn enemy_mut(&mut self, enemy: EnemyId) -> Option<&mut Enemy> {
        self.enemies.iter_mut().find(|candidate| candidate.id == enemy)
    }

    fn finish(&mut self, outcome: Outcome, out_events: &mut Vec<Event>) {
        if self.outcome.is_some() {
            return;
        }
        info!("level {} finished: {outcome:?}", self.level);
        self.outcome = Some(outcome);
        self.wave_in_progress = false;
        if !self.paused {
            self.paused = true;
            out_events.push(Event::PauseChanged { paused: true });
        }
        out_events.push(Event::LevelFinished { outcome });
    }

    fn tick(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        if self.paused || self.outcome.is_some() {
            return;
        }
        self.clock = self.clock.saturating_add(dt);
        out_events.push(Event::TimeAdvanced { dt });

        self.advance_enemies(out_events);
        if self.outcome.is_some() {
            return;
        }
        self.advance_projectiles(out_events);

        let factor = self.factor();
        self.particles.retain_mut(|particle| particle.update(factor));
        self.shake.update(factor);

        let live: Vec<EnemyId> = self
            .enemies
            .iter()
            .filter(|enemy| enemy.is_alive())
            .map(|enemy| enemy.id)
            .collect();
        for tower in self.towers.iter_mut() {
            if tower.target.is_some_and(|target| !live.contains(&target)) {
                tower.target = None;
            }
        }
    }

    /// Removes fatally damaged enemies and moves the rest along their paths.
    fn advance_enemies(&mut self, out_events: &mut Vec<Event>) {
        let factor = self.factor();
        let mut index = 0;
        while index < self.enemies.len() {
            let enemy = &mut self.enemies[index];
            if !enemy.is_alive() {
                let enemy = self.enemies.remove(index);
                self.coins = self.coins.saturating_add(enemy.reward);
                effects::explosion(&mut self.rng, enemy.position, enemy.shape, &mut self.particles);
                self.shake.trigger();
                debug!("enemy {} defeated, +{} coins", enemy.id.get(), enemy.reward);
                out_events.push(Event::EnemyDefeated {
                    enemy: enemy.id,
                    reward: enemy.reward,
                    position: enemy.position,
                });
                continue;
            }

            let progress = match self.paths.get(enemy.path) {
                Some(path) => enemy.advance(path, self.tile_size, factor),
                None => Progress::Stalled,
            };
            if progress != Progress::Arrived {
                index += 1;
                continue;
            }

            let enemy = self.enemies.remove(index);
            self.lives = self.lives.saturating_sub(1);
            debug!(
                "enemy {} reached the base, {} lives left",
                enemy.id.get(),
                self.lives
            );
            out_events.push(Event::EnemyReachedBase {
                enemy: enemy.id,
                lives: self.lives,
            });
            if self.lives == 0 {
                self.finish(Outcome::Defeat, out_events);
                return;
            }
        }
    }

    fn advance_projectiles(&mut self, out_events: &mut Vec<Event>) {
        let factor = self.factor();
        let mut projectiles = std::mem::take(&mut self.projectiles);
        projectiles.retain_mut(|projectile| {
            let target = self.enemy(projectile.target).map(|enemy| enemy.position);
            if projectile.fly(target, factor) == Flight::InFlight {
                return true;
            }

            match self.enemy_mut(projectile.target) {
                Some(enemy) if enemy.is_alive() => {
                    enemy.take_damage(projectile.damage);
                    out_events.push(Event::ProjectileHit {
                        projectile: projectile.id,
                        target: projectile.target,
                        damage: projectile.damage,
                    });
                }
                _ => out_events.push(Event::ProjectileFizzled {
                    projectile: projectile.id,
                }),
            }
            false
        });
        self.projectiles = projectiles;
    }

    fn start_next_wave(&mut self, out_events: &mut Vec<Event>) {
        let rejection = if self.outcome.is_some() {
            Some(WaveError::LevelFinished)
        } else if self.paused {
            Some(WaveError::Paused)
        } else if self.wave_in_progress {
            Some(WaveError::InProgress)
        } else if self.wave > self.max_waves {
            Some(WaveError::Exhausted)
        } else {
            None
        };

        if let Some(reason) = rejection {
            out_events.push(Event::WaveRejected { reason });
            return;
        }

        self.wave_in_progress = true;
        info!(
            "level {}: wave {}/{} started",
            self.level, self.wave, self.max_waves
        );
        out_events.push(Event::WaveStarted { wave: self.wave });
    }

    fn spawn_enemy(&mut self, wave: u32, kind: EnemyKind, spawn: usize, out: &mut Vec<Event>) {
        if self.outcome.is_some() || !self.wave_in_progress || wave != self.wave {
            warn!("discarding spawn of {kind} for stale wave {wave}");
            out.push(Event::SpawnRejected {
                kind,
                reason: SpawnError::StaleWave,
            });
            return;
        }

        let Some(archetype) = self.catalog.enemy(&kind) else {
            error!("catalog does not define enemy archetype {kind}");
            out.push(Event::SpawnRejected {
                kind,
                reason: SpawnError::UnknownKind,
            });
            return;
        };

        let Some(last) = self.spawn_points.len().checked_sub(1) else {
            out.push(Event::SpawnRejected {
                kind,
                reason: SpawnError::NoSpawnPoint,
            });
            return;
        };
        let path = spawn.min(last);
        let cell = self.spawn_points[path];

        let health = (f64::from(archetype.health) * self.difficulty)
            .round()
            .clamp(0.0, f64::from(i32::MAX)) as u32;

        let id = EnemyId::new(self.next_enemy_id);
        self.next_enemy_id = self.next_enemy_id.saturating_add(1);
        let enemy = Enemy {
            id,
            kind: kind.clone(),
            shape: archetype.shape,
            color: archetype.color,
            health: i32::try_from(health).unwrap_or(i32::MAX),
            max_health: health,
            speed: archetype.speed,
            reward: archetype.reward,
            position: cell.center(self.tile_size),
            path,
            path_index: 0,
        };
        self.enemies.push(enemy);

        debug!("spawned {kind} #{} at {cell:?} with {health} health", id.get());
        out.push(Event::EnemySpawned {
            enemy: id,
            kind,
            cell,
            health,
        });
    }

    fn complete_wave(&mut self, wave: u32, out_events: &mut Vec<Event>) {
        if self.outcome.is_some() || !self.wave_in_progress || wave != self.wave {
            warn!("ignoring completion of wave {wave} that is not running");
            return;
        }
        if !self.enemies.is_empty() {
            debug!(
                "wave {wave} cannot complete with {} enemies alive",
                self.enemies.len()
            );
            return;
        }

        self.wave_in_progress = false;
        info!("level {}: wave {wave} cleared", self.level);
        out_events.push(Event::WaveCompleted { wave });

        if wave >= self.max_waves {
            let stars = economy::star_rating(self.lives, self.starting_lives);
            self.finish(Outcome::Victory { stars }, out_events);
        } else {
            self.wave = self.wave.saturating_add(1);
        }
    }

    fn place_tower(&mut self, kind: TowerKind, cell: CellCoord, out_events: &mut Vec<Event>) {
        let rejection = |reason| Event::TowerPlacementRejected {
            kind: kind.clone(),
            cell,
            reason,
        };

        if self.outcome.is_some() {
            out_events.push(rejection(PlacementError::LevelFinished));
            return;
        }
        let Some(tile) = self.grid.tile(cell) else {
            out_events.push(rejection(PlacementError::OutOfBounds));
            return;
        };
        if tile != TileKind::Empty {
            out_events.push(rejection(PlacementError::NotBuildable));
            return;
        }
        if self.towers.occupant(cell).is_some() {
            out_events.push(rejection(PlacementError::Occupied));
            return;
        }
        let Some(archetype) = self.catalog.tower(&kind) else {
            error!("catalog does not define tower archetype {kind}");
            out_events.push(rejection(PlacementError::UnknownKind));
            return;
        };
        if self.coins < archetype.cost {
            out_events.push(rejection(PlacementError::InsufficientFunds));
            return;
        }

        let cost = archetype.cost;
        let state = TowerState {
            id: self.towers.allocate(),
            kind: kind.clone(),
            cell,
            position: cell.center(self.tile_size),
            stats: archetype.stats,
            base_cost: cost,
            level: 1,
            invested: cost,
            shots_fired: 0,
            last_fired: None,
            target: None,
            projectile_color: archetype.projectile_color,
        };
        let tower = state.id;
        self.coins -= cost;
        self.towers.insert(state);

        debug!("placed {kind} tower {} at {cell:?}", tower.get());
        out_events.push(Event::TowerPlaced {
            tower,
            kind,
            cell,
            cost,
        });
    }

    fn upgrade_tower(&mut self, tower: TowerId, out_events: &mut Vec<Event>) {
        let rejected = |reason| Event::TowerUpgradeRejected { tower, reason };

        if self.outcome.is_some() {
            out_events.push(rejected(UpgradeError::LevelFinished));
            return;
        }
        let coins = self.coins;
        let Some(state) = self.towers.get_mut(tower) else {
            out_events.push(rejected(UpgradeError::MissingTower));
            return;
        };
        if state.level >= economy::MAX_TOWER_LEVEL {
            out_events.push(rejected(UpgradeError::MaxLevel));
            return;
        }
        let cost = economy::upgrade_cost(state.base_cost, state.level);
        if coins < cost {
            out_events.push(rejected(UpgradeError::InsufficientFunds));
            return;
        }

        state.level += 1;
        state.invested = state.invested.saturating_add(cost);
        state.stats = economy::upgraded_stats(state.stats);
        let level = state.level;
        self.coins -= cost;

        debug!("tower {} upgraded to level {level} for {cost}", tower.get());
        out_events.push(Event::TowerUpgraded { tower, level, cost });
    }

    fn sell_tower(&mut self, tower: TowerId, out_events: &mut Vec<Event>) {
        if self.outcome.is_some() {
            out_events.push(Event::TowerSaleRejected {
                tower,
                reason: SaleError::LevelFinished,
            });
            return;
        }
        let Some(state) = self.towers.remove(tower) else {
            out_events.push(Event::TowerSaleRejected {
                tower,
                reason: SaleError::MissingTower,
            });
            return;
        };

        let refund = economy::sell_refund(state.invested, state.shots_fired);
        self.coins = self.coins.saturating_add(refund);
        debug!("sold tower {} for {refund}", tower.get());
        out_events.push(Event::TowerSold {
            tower,
            cell: state.cell,
            refund,
        });
    }

    fn retarget_tower(&mut self, tower: TowerId, target: Option<EnemyId>) {
        if target.is_some_and(|enemy| self.enemy(enemy).is_none()) {
            return;
        }
        if let Some(state) = self.towers.get_mut(tower) {
            state.target = target;
        }
    }

    fn fire_projectile(&mut self, tower: TowerId, target: EnemyId, out_events: &mut Vec<Event>) {
        if self.paused || self.outcome.is_some() {
            return;
        }
        let Some(enemy) = self.enemy(target).filter(|enemy| enemy.is_alive()) else {
            return;
        };
        let aim = enemy.position;
        let (clock, speed) = (self.clock, self.speed);
        let Some(state) = self.towers.get_mut(tower) else {
            return;
        };
        if state.position.distance(aim) > state.stats.range as f32 {
            return;
        }
        if state.ready_in(clock, speed) > Duration::ZERO {
            return;
        }

        state.last_fired = Some(clock);
        state.shots_fired = state.shots_fired.saturating_add(1);
        state.target = Some(target);
        let projectile = Projectile {
            id: ProjectileId::new(self.next_projectile_id),
            target,
            position: state.position,
            aim,
            damage: state.stats.damage,
            speed: state.stats.projectile_speed as f32,
            color: state.projectile_color,
        };
        self.next_projectile_id = self.next_projectile_id.saturating_add(1);

        out_events.push(Event::ProjectileFired {
            projectile: projectile.id,
            tower,
            target,
        });
        self.projectiles.push(projectile);
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => world.tick(dt, out_events),
        Command::StartNextWave => world.start_next_wave(out_events),
        Command::SpawnEnemy { wave, kind, spawn } => world.spawn_enemy(wave, kind, spawn, out_events),
        Command::CompleteWave { wave } => world.complete_wave(wave, out_events),
        Command::PlaceTower { kind, cell } => world.place_tower(kind, cell, out_events),
        Command::UpgradeTower { tower } => world.upgrade_tower(tower, out_events),
        Command::SellTower { tower } => world.sell_tower(tower, out_events),
        Command::SetPaused { paused } => {
            if world.outcome.is_none() && world.paused != paused {
                world.paused = paused;
                out_events.push(Event::PauseChanged { paused });
            }
        }
        Command::CycleSpeed => {
            world.speed = world.speed.next();
            out_events.push(Event::SpeedChanged { speed: world.speed });
        }
        Command::RetargetTower { tower, target } => world.retarget_tower(tower, target),
        Command::FireProjectile { tower, target } => {
            world.fire_projectile(tower, target, out_events)
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use tower_defence_core::{
        CellCoord, EnemyView, Grid, Outcome, ParticleSnapshot, ProjectileSnapshot,
        SessionSnapshot, SpeedMultiplier, TowerId, TowerView,
    };

    use super::{economy, navigation::Path, World};

    /// Captures a read-only view of the enemies inside the level.
    #[must_use]
    pub fn enemy_view(world: &World) -> EnemyView {
        EnemyView::from_snapshots(world.enemies.iter().map(|enemy| enemy.snapshot()).collect())
    }

    /// Captures a read-only view of the placed towers.
    #[must_use]
    pub fn tower_view(world: &World) -> TowerView {
        TowerView::from_snapshots(
            world
                .towers
                .iter()
                .map(|tower| tower.snapshot(world.clock, world.speed))
                .collect(),
        )
    }

    /// Captures the projectiles currently in flight.
    #[must_use]
    pub fn projectile_view(world: &World) -> Vec<ProjectileSnapshot> {
        world
            .projectiles
            .iter()
            .map(|projectile| projectile.snapshot())
            .collect()
    }

    /// Captures the live cosmetic particles.
    #[must_use]
    pub fn particle_view(world: &World) -> Vec<ParticleSnapshot> {
        world
            .particles
            .iter()
            .map(|particle| particle.snapshot())
            .collect()
    }

    /// Captures the scalar session state shown by the HUD.
    #[must_use]
    pub fn session(world: &World) -> SessionSnapshot {
        SessionSnapshot {
            level: world.level,
            coins: world.coins,
            lives: world.lives,
            wave: world.wave,
            max_waves: world.max_waves,
            wave_in_progress: world.wave_in_progress,
            paused: world.paused,
            speed: world.speed,
            outcome: world.outcome,
            shake: world.shake.intensity(),
            clock: world.clock,
        }
    }

    /// Provides read-only access to the level's tile layout.
    #[must_use]
    pub fn grid(world: &World) -> &Grid {
        &world.grid
    }

    /// Spawn tiles in the order used for round-robin emission.
    #[must_use]
    pub fn spawn_points(world: &World) -> &[CellCoord] {
        &world.spawn_points
    }

    /// Paths computed for each spawn point, in spawn order.
    #[must_use]
    pub fn paths(world: &World) -> &[Path] {
        &world.paths
    }

    /// Tower occupying the provided cell, if any.
    #[must_use]
    pub fn tower_at(world: &World, cell: CellCoord) -> Option<TowerId> {
        world.towers.occupant(cell)
    }

    /// Price of the tower's next upgrade, or `None` once the cap is reached.
    #[must_use]
    pub fn upgrade_cost(world: &World, tower: TowerId) -> Option<u32> {
        let state = world.towers.get(tower)?;
        (state.level < economy::MAX_TOWER_LEVEL)
            .then(|| economy::upgrade_cost(state.base_cost, state.level))
    }

    /// Coins the tower would return if sold now.
    #[must_use]
    pub fn sell_refund(world: &World, tower: TowerId) -> Option<u32> {
        let state = world.towers.get(tower)?;
        Some(economy::sell_refund(state.invested, state.shots_fired))
    }

    /// Reports whether selling the tower now returns its full investment.
    #[must_use]
    pub fn is_full_refund(world: &World, tower: TowerId) -> Option<bool> {
        world.towers.get(tower).map(|state| state.shots_fired == 0)
    }

    /// Number of enemies in the registry, including fatally damaged ones not yet removed.
    #[must_use]
    pub fn enemy_count(world: &World) -> usize {
        world.enemies.len()
    }

    /// Active speed multiplier.
    #[must_use]
    pub fn speed(world: &World) -> SpeedMultiplier {
        world.speed
    }

    /// Reports whether the session is paused.
    #[must_use]
    pub fn is_paused(world: &World) -> bool {
        world.paused
    }

    /// Terminal outcome of the level, once decided.
    #[must_use]
    pub fn outcome(world: &World) -> Option<Outcome> {
        world.outcome
    }
}
