//! Coin arithmetic for tower placement, upgrades, sales and star ratings.

use std::time::Duration;

use tower_defence_core::TowerStats;

/// Highest level a tower can be upgraded to.
pub const MAX_TOWER_LEVEL: u32 = 10;

const UPGRADE_COST_FACTOR: f64 = 0.75;
const DAMAGE_GROWTH: f64 = 1.25;
const RANGE_GROWTH: f64 = 1.1;
const FIRE_INTERVAL_DECAY: f64 = 0.9;
const PROJECTILE_SPEED_GROWTH: f64 = 1.1;
const MIN_UPGRADED_FIRE_INTERVAL: Duration = Duration::from_millis(100);

/// Coins charged to raise a tower from `level` to `level + 1`.
///
/// The price is `round(base_cost * 0.75 * level)`.
#[must_use]
pub fn upgrade_cost(base_cost: u32, level: u32) -> u32 {
    round_to_u32(f64::from(base_cost) * UPGRADE_COST_FACTOR * f64::from(level))
}

/// Coins returned when selling a tower.
///
/// A tower that never fired refunds everything invested in it; otherwise
/// half of the investment is returned, rounded down.
#[must_use]
pub const fn sell_refund(invested: u32, shots_fired: u32) -> u32 {
    if shots_fired == 0 {
        invested
    } else {
        invested / 2
    }
}

/// Stats of a tower after one upgrade step.
#[must_use]
pub fn upgraded_stats(stats: TowerStats) -> TowerStats {
    let interval_ms = stats.fire_interval.as_secs_f64() * 1000.0 * FIRE_INTERVAL_DECAY;
    let fire_interval =
        Duration::from_millis(u64::from(round_to_u32(interval_ms))).max(MIN_UPGRADED_FIRE_INTERVAL);

    TowerStats {
        damage: round_to_u32(f64::from(stats.damage) * DAMAGE_GROWTH),
        range: round_to_u32(f64::from(stats.range) * RANGE_GROWTH),
        fire_interval,
        projectile_speed: round_to_u32(f64::from(stats.projectile_speed) * PROJECTILE_SPEED_GROWTH),
    }
}

/// Star rating awarded on victory for the lives that survived.
#[must_use]
pub fn star_rating(lives: u32, starting_lives: u32) -> u8 {
    if lives == 0 || starting_lives == 0 {
        return 0;
    }
    let ratio = f64::from(lives) / f64::from(starting_lives);
    if ratio >= 0.75 {
        3
    } else if ratio >= 0.5 {
        2
    } else {
        1
    }
}

fn round_to_u32(value: f64) -> u32 {
    let rounded = value.round();
    if rounded <= 0.0 {
        0
    } else if rounded >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        rounded as u32
    }
}
