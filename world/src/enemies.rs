//! Enemy state and path following.

use glam::Vec2;
use tower_defence_core::{Color, EnemyId, EnemyKind, EnemySnapshot, Shape};

use crate::navigation::Path;

/// Enemy stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct Enemy {
    pub(crate) id: EnemyId,
    pub(crate) kind: EnemyKind,
    pub(crate) shape: Shape,
    pub(crate) color: Color,
    pub(crate) health: i32,
    pub(crate) max_health: u32,
    pub(crate) speed: f32,
    pub(crate) reward: u32,
    pub(crate) position: Vec2,
    /// Index into the world's path list.
    pub(crate) path: usize,
    /// Index of the last path tile reached.
    pub(crate) path_index: usize,
}

/// Result of moving an enemy for one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Progress {
    /// Still travelling along the path.
    Moving,
    /// Standing on the base tile at the end of a complete path.
    Arrived,
    /// Stuck at the end of an incomplete path.
    Stalled,
}

impl Enemy {
    pub(crate) fn is_alive(&self) -> bool {
        self.health > 0
    }

    /// Moves the enemy toward the next tile of its path.
    ///
    /// The enemy snaps onto the next tile centre once it is closer than one
    /// step. Arrival is only reported on the tick after the last tile was
    /// reached.
    pub(crate) fn advance(&mut self, path: &Path, tile_size: f32, factor: f32) -> Progress {
        let Some(next) = path.cells().get(self.path_index + 1) else {
            return if path.reaches_base() {
                Progress::Arrived
            } else {
                Progress::Stalled
            };
        };

        let target = next.center(tile_size);
        let offset = target - self.position;
        let distance = offset.length();
        let step = self.speed * factor;
        if distance < step || distance <= f32::EPSILON {
            self.position = target;
            self.path_index += 1;
        } else {
            self.position += offset / distance * step;
        }
        Progress::Moving
    }

    pub(crate) fn take_damage(&mut self, damage: u32) {
        let damage = i32::try_from(damage).unwrap_or(i32::MAX);
        self.health = self.health.saturating_sub(damage);
    }

    pub(crate) fn snapshot(&self) -> EnemySnapshot {
        EnemySnapshot {
            id: self.id,
            kind: self.kind.clone(),
            shape: self.shape,
            color: self.color,
            health: self.health,
            max_health: self.max_health,
            position: self.position,
            path_index: self.path_index,
        }
    }
}
