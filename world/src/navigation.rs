//! Path engine that derives the road each spawn point feeds into.

use tower_defence_core::{CellCoord, Direction, Grid};

/// Order in which neighbours are tried by the greedy walk.
const WALK_ORDER: [Direction; 4] = [
    Direction::East,
    Direction::West,
    Direction::South,
    Direction::North,
];

/// Ordered tiles an enemy follows from its spawn point.
///
/// A path is a simple sequence of adjacent tiles that starts on the spawn
/// tile. It is complete when its last tile is the base; an incomplete path
/// ends wherever the walk ran out of unvisited road.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Path {
    cells: Vec<CellCoord>,
    complete: bool,
}

impl Path {
    /// Tiles of the path, spawn first.
    #[must_use]
    pub fn cells(&self) -> &[CellCoord] {
        &self.cells
    }

    /// Number of tiles in the path, including the spawn tile.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Reports whether the path holds no tiles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Reports whether the walk reached the base.
    #[must_use]
    pub const fn reaches_base(&self) -> bool {
        self.complete
    }
}

/// Walks from `spawn` toward `base` using a fixed neighbour priority.
///
/// From each tile the walk steps into the first neighbour, in east, west,
/// south, north order, that lies inside the grid, is road or base, and is not
/// yet part of the path. The walk stops on the base or when no neighbour
/// qualifies. This is not a shortest-path search: level layouts are authored
/// against this exact order.
#[must_use]
pub fn compute_path(grid: &Grid, spawn: CellCoord, base: CellCoord) -> Path {
    let mut cells = vec![spawn];
    let mut current = spawn;

    while current != base {
        let next = WALK_ORDER.iter().find_map(|direction| {
            current.step(*direction).filter(|candidate| {
                grid.tile(*candidate).is_some_and(|tile| tile.is_walkable())
                    && !cells.contains(candidate)
            })
        });

        match next {
            Some(cell) => {
                cells.push(cell);
                current = cell;
            }
            None => break,
        }
    }

    Path {
        complete: current == base,
        cells,
    }
}
