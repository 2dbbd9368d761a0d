//! Authoritative tower state management utilities.

use std::{collections::BTreeMap, time::Duration};

use glam::Vec2;
use tower_defence_core::{
    CellCoord, Color, EnemyId, Grid, SpeedMultiplier, TowerId, TowerKind, TowerSnapshot,
    TowerStats,
};

const MIN_FIRE_INTERVAL: Duration = Duration::from_millis(50);

/// Snapshot of a tower stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct TowerState {
    /// Identifier allocated by the world for the tower.
    pub(crate) id: TowerId,
    /// Kind of tower that was constructed.
    pub(crate) kind: TowerKind,
    /// Cell occupied by the tower.
    pub(crate) cell: CellCoord,
    /// Pixel centre of the occupied cell.
    pub(crate) position: Vec2,
    pub(crate) stats: TowerStats,
    /// Placement cost of the archetype, which drives upgrade prices.
    pub(crate) base_cost: u32,
    pub(crate) level: u32,
    pub(crate) invested: u32,
    pub(crate) shots_fired: u32,
    /// Clock reading of the last shot; unset until the tower fires.
    pub(crate) last_fired: Option<Duration>,
    pub(crate) target: Option<EnemyId>,
    pub(crate) projectile_color: Color,
}

impl TowerState {
    /// Effective cooldown for the active speed multiplier.
    pub(crate) fn fire_interval(&self, speed: SpeedMultiplier) -> Duration {
        speed.scale_interval(self.stats.fire_interval, MIN_FIRE_INTERVAL)
    }

    /// Simulated time left before the tower may fire again.
    pub(crate) fn ready_in(&self, clock: Duration, speed: SpeedMultiplier) -> Duration {
        match self.last_fired {
            None => Duration::ZERO,
            Some(last) => self
                .fire_interval(speed)
                .saturating_sub(clock.saturating_sub(last)),
        }
    }

    pub(crate) fn snapshot(&self, clock: Duration, speed: SpeedMultiplier) -> TowerSnapshot {
        TowerSnapshot {
            id: self.id,
            kind: self.kind.clone(),
            cell: self.cell,
            position: self.position,
            stats: self.stats,
            level: self.level,
            invested: self.invested,
            shots_fired: self.shots_fired,
            target: self.target,
            ready_in: self.ready_in(clock, speed),
        }
    }
}

/// Registry that stores towers and manages identifier allocation.
#[derive(Debug)]
pub(crate) struct TowerRegistry {
    entries: BTreeMap<TowerId, TowerState>,
    occupancy: OccupancyGrid,
    next_tower_id: TowerId,
}

impl TowerRegistry {
    /// Creates an empty tower registry sized for the provided grid.
    pub(crate) fn new(grid: &Grid) -> Self {
        Self {
            entries: BTreeMap::new(),
            occupancy: OccupancyGrid::new(grid.columns(), grid.rows()),
            next_tower_id: TowerId::new(0),
        }
    }

    /// Reserves the next tower identifier.
    pub(crate) fn allocate(&mut self) -> TowerId {
        let id = self.next_tower_id;
        self.next_tower_id = TowerId::new(id.get().saturating_add(1));
        id
    }

    pub(crate) fn insert(&mut self, state: TowerState) {
        self.occupancy.occupy(state.id, state.cell);
        let _ = self.entries.insert(state.id, state);
    }

    pub(crate) fn remove(&mut self, tower: TowerId) -> Option<TowerState> {
        let state = self.entries.remove(&tower)?;
        self.occupancy.vacate(state.cell);
        Some(state)
    }

    pub(crate) fn get(&self, tower: TowerId) -> Option<&TowerState> {
        self.entries.get(&tower)
    }

    pub(crate) fn get_mut(&mut self, tower: TowerId) -> Option<&mut TowerState> {
        self.entries.get_mut(&tower)
    }

    /// Towers in identifier order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &TowerState> {
        self.entries.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut TowerState> {
        self.entries.values_mut()
    }

    /// Tower occupying the provided cell, if any.
    pub(crate) fn occupant(&self, cell: CellCoord) -> Option<TowerId> {
        self.occupancy.occupant(cell)
    }
}

/// Dense cell-to-tower index mirroring the registry.
#[derive(Clone, Debug)]
struct OccupancyGrid {
    columns: u32,
    rows: u32,
    cells: Vec<Option<TowerId>>,
}

impl OccupancyGrid {
    fn new(columns: u32, rows: u32) -> Self {
        let capacity_u64 = u64::from(columns) * u64::from(rows);
        let capacity = usize::try_from(capacity_u64).unwrap_or(0);
        Self {
            columns,
            rows,
            cells: vec![None; capacity],
        }
    }

    fn occupant(&self, cell: CellCoord) -> Option<TowerId> {
        self.index(cell)
            .and_then(|index| self.cells.get(index).copied().flatten())
    }

    fn occupy(&mut self, tower: TowerId, cell: CellCoord) {
        if let Some(slot) = self.index(cell).and_then(|index| self.cells.get_mut(index)) {
            *slot = Some(tower);
        }
    }

    fn vacate(&mut self, cell: CellCoord) {
        if let Some(slot) = self.index(cell).and_then(|index| self.cells.get_mut(index)) {
            *slot = None;
        }
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if cell.column() < self.columns && cell.row() < self.rows {
            let row = usize::try_from(cell.row()).ok()?;
            let column = usize::try_from(cell.column()).ok()?;
            let width = usize::try_from(self.columns).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }
}
