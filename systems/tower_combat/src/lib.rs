#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that emits retargeting and firing commands from targeting data.

use tower_defence_core::{Command, TowerTarget, TowerView};

/// Tower combat system that queues commands for towers whose target changed
/// or whose cooldown elapsed.
#[derive(Debug, Default)]
pub struct TowerCombat {
    scratch: Vec<Command>,
}

impl TowerCombat {
    /// Creates a new tower combat system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits `Command::RetargetTower` for every tower whose assignment differs
    /// from its stored target, followed by `Command::FireProjectile` when the
    /// tower has a target and is ready to fire.
    pub fn handle(&mut self, towers: &TowerView, tower_targets: &[TowerTarget], out: &mut Vec<Command>) {
        if tower_targets.is_empty() {
            return;
        }

        self.scratch.clear();

        for assignment in tower_targets {
            let Some(snapshot) = towers.get(assignment.tower) else {
                continue;
            };

            if snapshot.target != assignment.enemy {
                self.scratch.push(Command::RetargetTower {
                    tower: assignment.tower,
                    target: assignment.enemy,
                });
            }

            if let Some(enemy) = assignment.enemy {
                if snapshot.ready_in.is_zero() {
                    self.scratch.push(Command::FireProjectile {
                        tower: assignment.tower,
                        target: enemy,
                    });
                }
            }
        }

        if self.scratch.is_empty() {
            return;
        }

        out.reserve(self.scratch.len());
        out.append(&mut self.scratch);
    }
}
