use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
    sync::Arc,
};

use tower_defence_catalog::Catalog;
use tower_defence_core::{
    CellCoord, EnemyId, Event, Outcome, SpeedMultiplier, TowerId, TowerKind, WaveError,
};
use tower_defence_simulation::{Input, SessionConfig, Simulation};
use tower_defence_world::query;

// Five towers surround the first corner of level 1, where the road turns
// from the top row down toward the base.
const CORNER_BATTERY: [(u32, u32); 5] = [(8, 4), (10, 4), (8, 6), (10, 6), (10, 5)];

fn level_one() -> Simulation {
    let catalog = Arc::new(Catalog::builtin().expect("builtin catalog"));
    Simulation::new(catalog, 1, SessionConfig::default()).expect("simulation")
}

fn submit(simulation: &mut Simulation, input: Input, events: &mut Vec<Event>) {
    simulation.submit(input, events).expect("submit");
}

fn run_until_wave_completes(simulation: &mut Simulation, events: &mut Vec<Event>) {
    for _ in 0..5_000 {
        simulation.tick(events);
        if events
            .iter()
            .any(|event| matches!(event, Event::WaveCompleted { .. }))
        {
            return;
        }
    }
    panic!("wave did not complete");
}

fn spawned(events: &[Event]) -> Vec<EnemyId> {
    events
        .iter()
        .filter_map(|event| match event {
            Event::EnemySpawned { enemy, .. } => Some(*enemy),
            _ => None,
        })
        .collect()
}

fn corner_battery() -> (Simulation, Vec<Event>) {
    let mut simulation = level_one();
    let mut events = Vec::new();
    for (column, row) in CORNER_BATTERY {
        submit(
            &mut simulation,
            Input::PlaceTower {
                kind: TowerKind::new("BASIC"),
                cell: CellCoord::new(column, row),
            },
            &mut events,
        );
    }
    (simulation, events)
}

fn defended_first_wave() -> (Simulation, Vec<Event>) {
    let (mut simulation, mut events) = corner_battery();
    submit(&mut simulation, Input::StartNextWave, &mut events);
    run_until_wave_completes(&mut simulation, &mut events);
    (simulation, events)
}

#[test]
fn defended_first_wave_rewards_every_kill() {
    let (mut simulation, mut events) = corner_battery();
    let coins_before = simulation.frame().session.coins;
    assert_eq!(coins_before, 0, "five basic towers spend the starting coins");

    submit(&mut simulation, Input::StartNextWave, &mut events);
    run_until_wave_completes(&mut simulation, &mut events);

    let placed = events
        .iter()
        .filter(|event| matches!(event, Event::TowerPlaced { .. }))
        .count();
    assert_eq!(placed, 5);

    let defeated: Vec<u32> = events
        .iter()
        .filter_map(|event| match event {
            Event::EnemyDefeated { reward, .. } => Some(*reward),
            _ => None,
        })
        .collect();
    assert_eq!(defeated, vec![10; 5]);
    assert!(!events
        .iter()
        .any(|event| matches!(event, Event::EnemyReachedBase { .. })));

    let health: Vec<u32> = events
        .iter()
        .filter_map(|event| match event {
            Event::EnemySpawned { health, .. } => Some(*health),
            _ => None,
        })
        .collect();
    assert_eq!(health, vec![53; 5], "circle health scaled by difficulty 1.05");

    let session = simulation.frame().session;
    assert_eq!(
        session.coins - coins_before,
        50,
        "five kills at 10 coins each"
    );
    assert_eq!(session.lives, 20);
    assert_eq!(session.wave, 2);
    assert!(!session.wave_in_progress);
    assert_eq!(session.outcome, None);
    assert!(simulation.frame().enemies.is_empty());
}

#[test]
fn scripted_session_replays_identically() {
    let (first_simulation, first) = defended_first_wave();
    let (second_simulation, second) = defended_first_wave();

    assert_eq!(first, second, "replay diverged between runs");
    assert_eq!(fingerprint(&first), fingerprint(&second));
    assert_eq!(first_simulation.frame(), second_simulation.frame());
}

#[test]
fn pausing_mid_wave_defers_spawns_without_loss() {
    let mut reference = level_one();
    let mut expected = Vec::new();
    submit(&mut reference, Input::StartNextWave, &mut expected);
    run_until_wave_completes(&mut reference, &mut expected);

    let mut paused = level_one();
    let mut events = Vec::new();
    submit(&mut paused, Input::StartNextWave, &mut events);
    for _ in 0..60 {
        paused.tick(&mut events);
    }
    assert_eq!(spawned(&events).len(), 2);

    submit(&mut paused, Input::SetPaused { paused: true }, &mut events);
    let mark = events.len();
    for _ in 0..500 {
        paused.tick(&mut events);
    }
    assert_eq!(events.len(), mark, "paused ticks must not produce events");
    assert_eq!(
        submit_and_collect(&mut paused, Input::StartNextWave),
        vec![Event::WaveRejected {
            reason: WaveError::Paused
        }]
    );

    submit(&mut paused, Input::SetPaused { paused: false }, &mut events);
    run_until_wave_completes(&mut paused, &mut events);

    events.retain(|event| !matches!(event, Event::PauseChanged { .. }));
    assert_eq!(events, expected);
    assert_eq!(
        spawned(&events),
        (0..5).map(EnemyId::new).collect::<Vec<_>>()
    );
    assert_eq!(paused.frame().session.lives, 15);
}

#[test]
fn restarting_level_cancels_pending_spawns() {
    let mut simulation = level_one();
    let mut events = Vec::new();
    submit(&mut simulation, Input::StartNextWave, &mut events);
    for _ in 0..60 {
        simulation.tick(&mut events);
    }
    assert_eq!(spawned(&events).len(), 2);
    assert_eq!(simulation.generation(), 0);

    submit(&mut simulation, Input::StartLevel { level: 1 }, &mut events);
    assert_eq!(simulation.generation(), 1);

    events.clear();
    for _ in 0..2_000 {
        simulation.tick(&mut events);
    }
    assert!(spawned(&events).is_empty(), "old schedule leaked into new session");
    assert!(events.iter().all(|event| matches!(
        event,
        Event::TimeAdvanced { .. }
    )));

    let frame = simulation.frame();
    assert_eq!(frame.generation, 1);
    assert!(frame.enemies.is_empty());
    assert_eq!(frame.session.coins, 100);
    assert_eq!(frame.session.lives, 20);
    assert_eq!(frame.session.wave, 1);
    assert!(!frame.session.wave_in_progress);
}

#[test]
fn defeat_is_signalled_once_and_freezes_the_session() {
    let contents = r##"
version = 1

[constants]
tile_size = 40.0
starting_coins = 100
starting_lives = 2
spawn_interval_ms = 800

[enemies.CIRCLE]
shape = "circle"
health = 50
speed = 1.0
reward = 10
color = "#00ff00"

[[levels]]
id = 1
name = "Short road"
difficulty = 1.0
grid = ["2113"]
waves = [[{ kind = "CIRCLE", count = 3 }]]
"##;
    let catalog = Arc::new(Catalog::from_toml_str(contents).expect("catalog"));
    let mut simulation =
        Simulation::new(catalog, 1, SessionConfig::default()).expect("simulation");
    let mut events = Vec::new();
    submit(&mut simulation, Input::StartNextWave, &mut events);
    for _ in 0..1_000 {
        simulation.tick(&mut events);
    }

    let leaks: Vec<u32> = events
        .iter()
        .filter_map(|event| match event {
            Event::EnemyReachedBase { lives, .. } => Some(*lives),
            _ => None,
        })
        .collect();
    assert_eq!(leaks, vec![1, 0]);

    let finished: Vec<&Event> = events
        .iter()
        .filter(|event| matches!(event, Event::LevelFinished { .. }))
        .collect();
    assert_eq!(
        finished,
        vec![&Event::LevelFinished {
            outcome: Outcome::Defeat
        }]
    );
    assert_eq!(
        events.last(),
        Some(&Event::LevelFinished {
            outcome: Outcome::Defeat
        }),
        "nothing happens after the outcome"
    );

    assert_eq!(
        submit_and_collect(&mut simulation, Input::StartNextWave),
        vec![Event::WaveRejected {
            reason: WaveError::LevelFinished
        }]
    );
    assert!(submit_and_collect(&mut simulation, Input::SetPaused { paused: false }).is_empty());

    let session = simulation.frame().session;
    assert_eq!(session.lives, 0);
    assert!(session.paused);
    assert_eq!(session.outcome, Some(Outcome::Defeat));
}

#[test]
fn upgrade_then_sell_refunds_investment() {
    let mut simulation = level_one();
    let mut events = Vec::new();
    submit(
        &mut simulation,
        Input::PlaceTower {
            kind: TowerKind::new("BASIC"),
            cell: CellCoord::new(0, 0),
        },
        &mut events,
    );
    let tower = TowerId::new(0);
    assert_eq!(query::upgrade_cost(simulation.world(), tower), Some(15));

    assert_eq!(
        submit_and_collect(&mut simulation, Input::UpgradeTower { tower }),
        vec![Event::TowerUpgraded {
            tower,
            level: 2,
            cost: 15,
        }]
    );
    let frame = simulation.frame();
    assert_eq!(frame.session.coins, 65);
    assert_eq!(frame.towers[0].stats.damage, 19);
    assert_eq!(frame.towers[0].invested, 35);

    assert_eq!(
        submit_and_collect(&mut simulation, Input::SellTower { tower }),
        vec![Event::TowerSold {
            tower,
            cell: CellCoord::new(0, 0),
            refund: 35,
        }]
    );
    assert_eq!(simulation.frame().session.coins, 100);
    assert!(simulation.frame().towers.is_empty());
}

#[test]
fn doubled_speed_halves_the_spawn_cadence() {
    let mut simulation = level_one();
    assert_eq!(
        submit_and_collect(&mut simulation, Input::CycleSpeed),
        vec![Event::SpeedChanged {
            speed: SpeedMultiplier::X2
        }]
    );

    let mut events = Vec::new();
    submit(&mut simulation, Input::StartNextWave, &mut events);
    for _ in 0..25 {
        simulation.tick(&mut events);
    }
    assert_eq!(spawned(&events).len(), 1);

    simulation.tick(&mut events);
    assert_eq!(spawned(&events).len(), 2, "second spawn after 400ms");
}

fn submit_and_collect(simulation: &mut Simulation, input: Input) -> Vec<Event> {
    let mut events = Vec::new();
    submit(simulation, input, &mut events);
    events
}

fn fingerprint(events: &[Event]) -> u64 {
    let mut hasher = DefaultHasher::new();
    for event in events {
        format!("{event:?}").hash(&mut hasher);
    }
    hasher.finish()
}
