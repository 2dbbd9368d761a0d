//! Homing projectiles in flight.

use glam::Vec2;
use tower_defence_core::{Color, EnemyId, ProjectileId, ProjectileSnapshot};

#[derive(Clone, Debug)]
pub(crate) struct Projectile {
    pub(crate) id: ProjectileId,
    pub(crate) target: EnemyId,
    pub(crate) position: Vec2,
    /// Last known position of the target.
    pub(crate) aim: Vec2,
    /// Damage captured when the tower fired.
    pub(crate) damage: u32,
    pub(crate) speed: f32,
    pub(crate) color: Color,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Flight {
    InFlight,
    Arrived,
}

impl Projectile {
    /// Moves one step toward the aim point.
    ///
    /// When the remaining distance is shorter than the step the projectile has
    /// arrived and does not move. Otherwise it advances and re-aims at the
    /// target's live position, if the target still exists.
    pub(crate) fn fly(&mut self, target_position: Option<Vec2>, factor: f32) -> Flight {
        let offset = self.aim - self.position;
        let distance = offset.length();
        let step = self.speed * factor;
        if distance < step || distance <= f32::EPSILON {
            return Flight::Arrived;
        }

        self.position += offset / distance * step;
        if let Some(position) = target_position {
            self.aim = position;
        }
        Flight::InFlight
    }

    pub(crate) fn snapshot(&self) -> ProjectileSnapshot {
        ProjectileSnapshot {
            id: self.id,
            position: self.position,
            aim: self.aim,
            target: self.target,
            color: self.color,
        }
    }
}
