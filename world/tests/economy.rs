use std::sync::Arc;

use proptest::prelude::*;
use tower_defence_catalog::Catalog;
use tower_defence_core::{CellCoord, Command, Event, TowerId, TowerKind, UpgradeError};
use tower_defence_world::{apply, economy::MAX_TOWER_LEVEL, query, World};

const RICH: &str = r##"
version = 1

[constants]
tile_size = 40.0
starting_coins = 100000
starting_lives = 20
spawn_interval_ms = 800

[enemies.CIRCLE]
shape = "circle"
health = 50
speed = 1.0
reward = 10
color = "#00ff00"

[towers.BASIC]
name = "Basic"
cost = 20
damage = 15
range = 81
fire_interval_ms = 1000
color = "#0000ff"
projectile_color = "#0000ff"
projectile_speed = 5

[towers.SNIPER]
name = "Sniper"
cost = 50
damage = 50
range = 200
fire_interval_ms = 2000
color = "#ff00ff"
projectile_color = "#ff00ff"
projectile_speed = 10

[[levels]]
id = 1
name = "Field"
difficulty = 1.0
grid = ["0000", "2113", "0000"]
waves = [[{ kind = "CIRCLE", count = 1 }]]
"##;

fn rich_world() -> World {
    let catalog = Catalog::from_toml_str(RICH).expect("catalog");
    World::new(Arc::new(catalog), 1, 0).expect("world")
}

fn place(world: &mut World, kind: &str, cell: CellCoord) -> TowerId {
    let mut events = Vec::new();
    apply(
        world,
        Command::PlaceTower {
            kind: TowerKind::new(kind),
            cell,
        },
        &mut events,
    );
    match events.as_slice() {
        [Event::TowerPlaced { tower, .. }] => *tower,
        other => panic!("placement failed: {other:?}"),
    }
}

#[test]
fn upgrading_a_basic_tower_once_matches_table() {
    let mut world = rich_world();
    let tower = place(&mut world, "BASIC", CellCoord::new(0, 0));
    let before = query::session(&world).coins;

    let mut events = Vec::new();
    apply(&mut world, Command::UpgradeTower { tower }, &mut events);

    assert_eq!(
        events,
        vec![Event::TowerUpgraded {
            tower,
            level: 2,
            cost: 15
        }]
    );
    let snapshot = query::tower_view(&world).get(tower).cloned().expect("tower");
    assert_eq!(snapshot.stats.damage, 19);
    assert_eq!(query::session(&world).coins, before - 15);
}

#[test]
fn upgrade_at_cap_is_rejected_without_changes() {
    let mut world = rich_world();
    let tower = place(&mut world, "SNIPER", CellCoord::new(1, 0));
    let mut events = Vec::new();
    for _ in 1..MAX_TOWER_LEVEL {
        apply(&mut world, Command::UpgradeTower { tower }, &mut events);
    }
    let capped = query::tower_view(&world).get(tower).cloned().expect("tower");
    assert_eq!(capped.level, MAX_TOWER_LEVEL);
    assert_eq!(query::upgrade_cost(&world, tower), None);
    let coins = query::session(&world).coins;

    events.clear();
    apply(&mut world, Command::UpgradeTower { tower }, &mut events);
    assert_eq!(
        events,
        vec![Event::TowerUpgradeRejected {
            tower,
            reason: UpgradeError::MaxLevel
        }]
    );
    let after = query::tower_view(&world).get(tower).cloned().expect("tower");
    assert_eq!(after, capped);
    assert_eq!(query::session(&world).coins, coins);
}

#[test]
fn insufficient_funds_leave_tower_untouched() {
    let catalog = Catalog::from_toml_str(&RICH.replace("100000", "60")).expect("catalog");
    let mut world = World::new(Arc::new(catalog), 1, 0).expect("world");
    let tower = place(&mut world, "SNIPER", CellCoord::new(2, 2));

    let mut events = Vec::new();
    apply(&mut world, Command::UpgradeTower { tower }, &mut events);
    assert_eq!(
        events,
        vec![Event::TowerUpgradeRejected {
            tower,
            reason: UpgradeError::InsufficientFunds
        }]
    );
    assert_eq!(query::session(&world).coins, 10);
}

#[derive(Clone, Debug)]
enum Action {
    Upgrade,
    Sell,
}

fn action() -> impl Strategy<Value = Action> {
    prop_oneof![4 => Just(Action::Upgrade), 1 => Just(Action::Sell)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn tower_level_stays_within_bounds(
        sniper in any::<bool>(),
        actions in prop::collection::vec(action(), 0..40),
    ) {
        let mut world = rich_world();
        let kind = if sniper { "SNIPER" } else { "BASIC" };
        let mut tower = place(&mut world, kind, CellCoord::new(0, 0));
        let mut invested = query::tower_view(&world).get(tower).map(|t| t.invested).unwrap_or(0);

        for action in actions {
            let coins = query::session(&world).coins;
            let mut events = Vec::new();
            match action {
                Action::Upgrade => {
                    apply(&mut world, Command::UpgradeTower { tower }, &mut events);
                    match events.as_slice() {
                        [Event::TowerUpgraded { cost, .. }] => {
                            invested += cost;
                            prop_assert_eq!(query::session(&world).coins, coins - cost);
                        }
                        [Event::TowerUpgradeRejected { reason: UpgradeError::MaxLevel, .. }] => {
                            prop_assert_eq!(query::session(&world).coins, coins);
                        }
                        other => prop_assert!(false, "unexpected events {:?}", other),
                    }
                }
                Action::Sell => {
                    apply(&mut world, Command::SellTower { tower }, &mut events);
                    // Towers that never fired refund everything.
                    prop_assert_eq!(
                        events,
                        vec![Event::TowerSold { tower, cell: CellCoord::new(0, 0), refund: invested }]
                    );
                    prop_assert_eq!(query::session(&world).coins, coins + invested);
                    tower = place(&mut world, kind, CellCoord::new(0, 0));
                    invested = query::tower_view(&world).get(tower).map(|t| t.invested).unwrap_or(0);
                }
            }

            let snapshot = query::tower_view(&world).get(tower).cloned().expect("tower present");
            prop_assert!((1..=MAX_TOWER_LEVEL).contains(&snapshot.level));
            prop_assert_eq!(snapshot.invested, invested);
        }
    }
}
