#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic wave scheduler responsible for emitting enemy spawn commands.
//!
//! The scheduler is a cooperative task advanced once per simulation tick. It
//! tracks the running wave through `Idle → Spawning → Draining → Complete`,
//! accumulating simulated time from `TimeAdvanced` events instead of relying on
//! wall-clock timers, so pausing simply stops feeding it and nothing is lost.

use std::time::Duration;

use log::debug;
use tower_defence_catalog::Wave;
use tower_defence_core::{Command, Event, SpeedMultiplier};

const MIN_SPAWN_INTERVAL: Duration = Duration::from_millis(10);

/// Configuration parameters required to construct the spawning system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    spawn_interval: Duration,
    poll_interval: Duration,
}

impl Config {
    /// Creates a new configuration using the provided spawn cadence and
    /// wave-completion polling period.
    #[must_use]
    pub const fn new(spawn_interval: Duration, poll_interval: Duration) -> Self {
        Self {
            spawn_interval,
            poll_interval,
        }
    }
}

/// Lifecycle of the wave currently tracked by the scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for the next wave to be started.
    Idle,
    /// Emitting the enemies of a wave.
    Spawning {
        /// One-based wave number.
        wave: u32,
        /// Enemies emitted so far.
        emitted: u32,
        /// Enemies the wave contains.
        total: u32,
    },
    /// Every enemy was emitted; waiting for the registry to empty.
    Draining {
        /// One-based wave number.
        wave: u32,
    },
    /// Completion was requested and awaits confirmation from the world.
    Complete {
        /// One-based wave number.
        wave: u32,
    },
    /// The level ended; no further commands are produced.
    Finished,
}

/// Pure system that deterministically emits spawn and completion commands.
#[derive(Debug)]
pub struct Spawning {
    config: Config,
    waves: Vec<Wave>,
    phase: Phase,
    spawn_accumulator: Duration,
    poll_accumulator: Duration,
}

impl Spawning {
    /// Creates a new spawning system for the provided wave list.
    #[must_use]
    pub fn new(config: Config, waves: Vec<Wave>) -> Self {
        Self {
            config,
            waves,
            phase: Phase::Idle,
            spawn_accumulator: Duration::ZERO,
            poll_accumulator: Duration::ZERO,
        }
    }

    /// Current scheduler phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Consumes events and world state to emit spawn and completion commands.
    ///
    /// `spawn_count` is the number of spawn points of the level; enemies are
    /// distributed across them round robin. `enemies_alive` is the number of
    /// enemies left in the world's registry and gates wave completion.
    pub fn handle(
        &mut self,
        events: &[Event],
        speed: SpeedMultiplier,
        spawn_count: usize,
        enemies_alive: usize,
        out: &mut Vec<Command>,
    ) {
        let mut elapsed = Duration::ZERO;
        for event in events {
            match event {
                Event::TimeAdvanced { dt } => elapsed = elapsed.saturating_add(*dt),
                Event::WaveStarted { wave } => self.begin(*wave),
                Event::WaveCompleted { .. } => self.phase = Phase::Idle,
                Event::LevelFinished { .. } => self.phase = Phase::Finished,
                _ => {}
            }
        }

        if elapsed.is_zero() {
            return;
        }

        match self.phase {
            Phase::Spawning { .. } => self.emit_spawns(elapsed, speed, spawn_count, out),
            Phase::Draining { wave } => self.poll_completion(wave, elapsed, enemies_alive, out),
            Phase::Idle | Phase::Complete { .. } | Phase::Finished => {}
        }
    }

    fn begin(&mut self, wave: u32) {
        let total = self.wave(wave).map_or(0, Wave::total);
        debug!("scheduling {total} enemies for wave {wave}");
        self.spawn_accumulator = Duration::ZERO;
        self.poll_accumulator = Duration::ZERO;
        self.phase = if total == 0 {
            Phase::Draining { wave }
        } else {
            Phase::Spawning {
                wave,
                emitted: 0,
                total,
            }
        };
    }

    fn emit_spawns(
        &mut self,
        elapsed: Duration,
        speed: SpeedMultiplier,
        spawn_count: usize,
        out: &mut Vec<Command>,
    ) {
        let Phase::Spawning {
            wave,
            mut emitted,
            total,
        } = self.phase
        else {
            return;
        };

        let interval = speed.scale_interval(self.config.spawn_interval, MIN_SPAWN_INTERVAL);
        self.spawn_accumulator = self.spawn_accumulator.saturating_add(elapsed);
        let lanes = spawn_count.max(1);

        while emitted < total {
            if emitted == 0 {
                // The first enemy enters as soon as the wave starts.
                self.spawn_accumulator = Duration::ZERO;
            } else if self.spawn_accumulator >= interval {
                self.spawn_accumulator -= interval;
            } else {
                break;
            }

            let Some(kind) = self.wave(wave).and_then(|entry| entry.kind_at(emitted)) else {
                break;
            };
            out.push(Command::SpawnEnemy {
                wave,
                kind: kind.clone(),
                spawn: emitted as usize % lanes,
            });
            emitted += 1;
        }

        self.phase = if emitted >= total {
            self.poll_accumulator = Duration::ZERO;
            Phase::Draining { wave }
        } else {
            Phase::Spawning {
                wave,
                emitted,
                total,
            }
        };
    }

    fn poll_completion(
        &mut self,
        wave: u32,
        elapsed: Duration,
        enemies_alive: usize,
        out: &mut Vec<Command>,
    ) {
        self.poll_accumulator = self.poll_accumulator.saturating_add(elapsed);
        if self.config.poll_interval.is_zero() {
            self.poll_accumulator = Duration::ZERO;
        } else if self.poll_accumulator >= self.config.poll_interval {
            self.poll_accumulator -= self.config.poll_interval;
        } else {
            return;
        }

        if enemies_alive == 0 {
            out.push(Command::CompleteWave { wave });
            self.phase = Phase::Complete { wave };
        }
    }

    fn wave(&self, number: u32) -> Option<&Wave> {
        let index = usize::try_from(number.checked_sub(1)?).ok()?;
        self.waves.get(index)
    }
}
