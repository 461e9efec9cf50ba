//! Artifact forging: which buff a category grants, how strong it is, and
//! when a streak earns one.

use chrono::{DateTime, Utc};
use rand::Rng;

use crate::constants::{buffs, streak};
use crate::model::{new_id, Artifact, BuffType, HabitCategory};

/// Fixed category → buff mapping.
pub fn buff_for_category(category: HabitCategory) -> BuffType {
    match category {
        HabitCategory::Physical => BuffType::DecayReduction,
        HabitCategory::Mental => BuffType::CapacityBoost,
        HabitCategory::Social => BuffType::StreakProtection,
        HabitCategory::Creative => BuffType::EnergyMultiplier,
    }
}

/// Magnitude of a single artifact's buff.
pub fn buff_value(buff: BuffType) -> f64 {
    match buff {
        BuffType::DecayReduction => buffs::DECAY_REDUCTION,
        BuffType::CapacityBoost => buffs::CAPACITY_BOOST,
        BuffType::StreakProtection => buffs::STREAK_PROTECTION,
        BuffType::EnergyMultiplier => buffs::ENERGY_MULTIPLIER,
    }
}

/// Category whose artifacts carry `buff`.
pub fn category_for_buff(buff: BuffType) -> HabitCategory {
    match buff {
        BuffType::DecayReduction => HabitCategory::Physical,
        BuffType::CapacityBoost => HabitCategory::Mental,
        BuffType::StreakProtection => HabitCategory::Social,
        BuffType::EnergyMultiplier => HabitCategory::Creative,
    }
}

/// True at streaks 7, 14, 21, ...
pub fn is_streak_milestone(streak: u32) -> bool {
    streak > 0 && streak % streak::MILESTONE_INTERVAL == 0
}

/// Artifact earned by a streak milestone in `category`.
pub fn milestone_artifact(category: HabitCategory, now: DateTime<Utc>, rng: &mut impl Rng) -> Artifact {
    let name = format!("{} CORE", category.label().to_uppercase());
    forge(name, buff_for_category(category), now, rng)
}

/// Artifact assembled from collected fragments; category drawn at random.
pub fn fragment_artifact(now: DateTime<Utc>, rng: &mut impl Rng) -> Artifact {
    let category = HabitCategory::ALL[rng.gen_range(0..HabitCategory::ALL.len())];
    let name = format!("{} RELIC", category.label().to_uppercase());
    forge(name, buff_for_category(category), now, rng)
}

/// Artifact granted by a quantum flux event; buff type drawn uniformly.
pub fn quantum_artifact(now: DateTime<Utc>, rng: &mut impl Rng) -> Artifact {
    let buff = BuffType::ALL[rng.gen_range(0..BuffType::ALL.len())];
    forge("QUANTUM SHARD".to_string(), buff, now, rng)
}

/// Artifact carrying a specific buff, e.g. a quest reward.
pub fn reward_artifact(buff: BuffType, now: DateTime<Utc>, rng: &mut impl Rng) -> Artifact {
    let category = category_for_buff(buff);
    let name = format!("{} COMMENDATION", category.label().to_uppercase());
    forge(name, buff, now, rng)
}

fn forge(name: String, buff: BuffType, now: DateTime<Utc>, rng: &mut impl Rng) -> Artifact {
    Artifact {
        id: new_id(rng),
        name,
        svg_data: String::new(),
        buff_type: buff,
        buff_value: buff_value(buff),
        category: category_for_buff(buff),
        unlocked_at: now,
    }
}
