use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
    sync::Arc,
    time::Duration,
};

use tower_defence_catalog::Catalog;
use tower_defence_core::{CellCoord, Command, EnemyId, EnemyKind, Event, SpeedMultiplier};
use tower_defence_system_spawning::{Config, Phase, Spawning};
use tower_defence_world::{self as world, query, World};

const SPAWN_INTERVAL: Duration = Duration::from_millis(800);
const POLL_INTERVAL: Duration = Duration::from_millis(100);
const FRAME: Duration = Duration::from_millis(16);

fn level(id: u32) -> (World, Spawning) {
    let catalog = Arc::new(Catalog::builtin().expect("builtin catalog"));
    let waves = catalog.level(id).expect("level").waves.clone();
    let world = World::new(catalog, id, 7).expect("world");
    let spawning = Spawning::new(Config::new(SPAWN_INTERVAL, POLL_INTERVAL), waves);
    (world, spawning)
}

fn advance(dt: Duration) -> Event {
    Event::TimeAdvanced { dt }
}

#[test]
fn first_enemy_spawns_immediately_then_every_interval() {
    let (_, mut spawning) = level(1);
    let mut commands = Vec::new();

    spawning.handle(
        &[Event::WaveStarted { wave: 1 }, advance(FRAME)],
        SpeedMultiplier::X1,
        1,
        0,
        &mut commands,
    );
    assert_eq!(
        commands,
        vec![Command::SpawnEnemy {
            wave: 1,
            kind: EnemyKind::new("CIRCLE"),
            spawn: 0,
        }]
    );

    spawning.handle(
        &[advance(Duration::from_millis(799))],
        SpeedMultiplier::X1,
        1,
        1,
        &mut commands,
    );
    assert_eq!(commands.len(), 1, "no spawn before the full interval");

    spawning.handle(
        &[advance(Duration::from_millis(1))],
        SpeedMultiplier::X1,
        1,
        1,
        &mut commands,
    );
    assert_eq!(commands.len(), 2);
    assert_eq!(
        spawning.phase(),
        Phase::Spawning {
            wave: 1,
            emitted: 2,
            total: 5,
        }
    );
}

#[test]
fn large_step_emits_every_due_enemy_then_drains() {
    let (_, mut spawning) = level(1);
    let mut commands = Vec::new();

    spawning.handle(
        &[Event::WaveStarted { wave: 1 }, advance(FRAME)],
        SpeedMultiplier::X1,
        1,
        0,
        &mut commands,
    );
    spawning.handle(
        &[advance(Duration::from_secs(10))],
        SpeedMultiplier::X1,
        1,
        1,
        &mut commands,
    );

    assert_eq!(commands.len(), 5, "a wave never emits more than its total");
    assert_eq!(spawning.phase(), Phase::Draining { wave: 1 });
}

#[test]
fn doubled_speed_halves_spawn_interval() {
    let (_, mut spawning) = level(1);
    let mut commands = Vec::new();

    spawning.handle(
        &[Event::WaveStarted { wave: 1 }, advance(FRAME)],
        SpeedMultiplier::X2,
        1,
        0,
        &mut commands,
    );
    spawning.handle(
        &[advance(Duration::from_millis(400))],
        SpeedMultiplier::X2,
        1,
        1,
        &mut commands,
    );

    assert_eq!(commands.len(), 2);
}

#[test]
fn withheld_time_defers_spawns_without_losing_them() {
    let (_, mut spawning) = level(1);
    let mut commands = Vec::new();

    spawning.handle(
        &[Event::WaveStarted { wave: 1 }, advance(FRAME)],
        SpeedMultiplier::X1,
        1,
        0,
        &mut commands,
    );
    spawning.handle(
        &[advance(Duration::from_millis(500))],
        SpeedMultiplier::X1,
        1,
        1,
        &mut commands,
    );

    // A paused session forwards no elapsed time.
    for _ in 0..100 {
        spawning.handle(&[], SpeedMultiplier::X1, 1, 1, &mut commands);
    }
    assert_eq!(commands.len(), 1);

    spawning.handle(
        &[advance(Duration::from_millis(300))],
        SpeedMultiplier::X1,
        1,
        1,
        &mut commands,
    );
    assert_eq!(commands.len(), 2, "deferred spawn resumes where it stopped");
}

#[test]
fn completion_is_polled_until_registry_is_empty() {
    let (_, mut spawning) = level(1);
    let mut commands = Vec::new();

    spawning.handle(
        &[Event::WaveStarted { wave: 1 }, advance(FRAME)],
        SpeedMultiplier::X1,
        1,
        0,
        &mut commands,
    );
    spawning.handle(
        &[advance(Duration::from_secs(4))],
        SpeedMultiplier::X1,
        1,
        5,
        &mut commands,
    );
    assert_eq!(spawning.phase(), Phase::Draining { wave: 1 });
    commands.clear();

    spawning.handle(&[advance(POLL_INTERVAL)], SpeedMultiplier::X1, 1, 2, &mut commands);
    assert!(commands.is_empty(), "enemies still alive");

    spawning.handle(
        &[advance(Duration::from_millis(50))],
        SpeedMultiplier::X1,
        1,
        0,
        &mut commands,
    );
    assert!(commands.is_empty(), "poll period not yet elapsed");

    spawning.handle(
        &[advance(Duration::from_millis(50))],
        SpeedMultiplier::X4,
        1,
        0,
        &mut commands,
    );
    assert_eq!(commands, vec![Command::CompleteWave { wave: 1 }]);
    assert_eq!(spawning.phase(), Phase::Complete { wave: 1 });

    spawning.handle(
        &[Event::WaveCompleted { wave: 1 }, advance(Duration::from_secs(1))],
        SpeedMultiplier::X1,
        1,
        0,
        &mut commands,
    );
    assert_eq!(commands.len(), 1, "idle scheduler stays silent");
    assert_eq!(spawning.phase(), Phase::Idle);
}

#[test]
fn enemies_alternate_between_spawn_points() {
    let (mut world, mut spawning) = level(4);
    let spawn_points = query::spawn_points(&world).to_vec();
    assert_eq!(spawn_points.len(), 2);

    let mut events = Vec::new();
    world::apply(&mut world, Command::StartNextWave, &mut events);
    events.push(advance(FRAME));

    let mut commands = Vec::new();
    spawning.handle(
        &events,
        SpeedMultiplier::X1,
        spawn_points.len(),
        0,
        &mut commands,
    );
    spawning.handle(
        &[advance(SPAWN_INTERVAL * 3)],
        SpeedMultiplier::X1,
        spawn_points.len(),
        1,
        &mut commands,
    );

    let lanes: Vec<usize> = commands
        .iter()
        .map(|command| match command {
            Command::SpawnEnemy { spawn, .. } => *spawn,
            other => panic!("unexpected command emitted: {other:?}"),
        })
        .collect();
    assert_eq!(lanes, vec![0, 1, 0, 1]);

    let mut spawned = Vec::new();
    for command in commands {
        world::apply(&mut world, command, &mut spawned);
    }
    let cells: Vec<CellCoord> = spawned
        .iter()
        .filter_map(|event| match event {
            Event::EnemySpawned { cell, .. } => Some(*cell),
            _ => None,
        })
        .collect();
    assert_eq!(
        cells,
        vec![
            spawn_points[0],
            spawn_points[1],
            spawn_points[0],
            spawn_points[1],
        ]
    );
}

#[test]
fn undefended_wave_replays_deterministically() {
    let first = replay();
    let second = replay();

    assert_eq!(first, second, "replay diverged between runs");
    assert_eq!(first.fingerprint(), second.fingerprint());

    let spawned = first
        .records
        .iter()
        .filter(|record| matches!(record, Record::Spawned { .. }))
        .count();
    let leaked = first
        .records
        .iter()
        .filter(|record| matches!(record, Record::Leaked { .. }))
        .count();
    assert_eq!(spawned, 15);
    assert_eq!(leaked, 15);
    assert_eq!(first.records.last(), Some(&Record::Completed { wave: 1 }));
    assert_eq!(first.lives, 5);
}

fn replay() -> Replay {
    let (mut world, mut spawning) = level(4);
    let spawn_count = query::spawn_points(&world).len();
    let mut pending = Vec::new();
    world::apply(&mut world, Command::StartNextWave, &mut pending);

    let mut records = Vec::new();
    let mut commands = Vec::new();
    for _ in 0..5_000 {
        world::apply(&mut world, Command::Tick { dt: FRAME }, &mut pending);
        spawning.handle(
            &pending,
            query::speed(&world),
            spawn_count,
            query::enemy_count(&world),
            &mut commands,
        );
        records.extend(pending.drain(..).filter_map(Record::from_event));

        for command in commands.drain(..) {
            world::apply(&mut world, command, &mut pending);
        }

        if records
            .iter()
            .any(|record| matches!(record, Record::Completed { .. }))
        {
            break;
        }
    }
    records.extend(pending.drain(..).filter_map(Record::from_event));

    Replay {
        records,
        lives: query::session(&world).lives,
    }
}

#[derive(Debug, PartialEq, Eq, Hash)]
struct Replay {
    records: Vec<Record>,
    lives: u32,
}

impl Replay {
    fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum Record {
    Spawned { enemy: EnemyId, cell: CellCoord },
    Leaked { enemy: EnemyId, lives: u32 },
    Completed { wave: u32 },
}

impl Record {
    fn from_event(event: Event) -> Option<Self> {
        match event {
            Event::EnemySpawned { enemy, cell, .. } => Some(Self::Spawned { enemy, cell }),
            Event::EnemyReachedBase { enemy, lives } => Some(Self::Leaked { enemy, lives }),
            Event::WaveCompleted { wave } => Some(Self::Completed { wave }),
            _ => None,
        }
    }
}
