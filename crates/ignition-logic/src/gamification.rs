//! Reactor economy math: energy gain, decay integration, capacity, shields
//! and streak breaks. All pure.

use chrono::{DateTime, Utc};

use crate::clock::hours_between;
use crate::constants::{energy, streak};
use crate::model::{Artifact, BuffType, Habit, HabitFrequency, ReactorState};

/// Streak multiplier: +0.1 per streak day, capped at 3x.
pub fn streak_multiplier(streak: u32) -> f64 {
    (1.0 + streak as f64 * streak::MULTIPLIER_STEP).min(streak::MAX_MULTIPLIER)
}

/// Sum of all buffs of one type. Buffs stack additively.
pub fn buff_total(artifacts: &[Artifact], buff: BuffType) -> f64 {
    artifacts
        .iter()
        .filter(|a| a.buff_type == buff)
        .map(|a| a.buff_value)
        .sum()
}

/// Energy lost per hour after decay_reduction buffs (capped at 80% off).
pub fn effective_decay_per_hour(artifacts: &[Artifact]) -> f64 {
    let reduction = buff_total(artifacts, BuffType::DecayReduction).clamp(0.0, energy::MAX_DECAY_REDUCTION);
    energy::BASE_DECAY_PER_HOUR * (1.0 - reduction)
}

/// Reactor capacity: base plus all capacity_boost buffs.
pub fn max_capacity(artifacts: &[Artifact]) -> f64 {
    energy::BASE_MAX_CAPACITY + buff_total(artifacts, BuffType::CapacityBoost)
}

/// Result of a completion: energy produced and the streak after it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyGain {
    pub energy: f64,
    pub new_streak: u32,
}

/// Energy produced by completing `habit`.
///
/// `10 × streak multiplier × (1 + energy_multiplier buffs) × overdrive`,
/// where the multiplier counts the completion being made: a habit on a
/// 6-day streak earns at the 7-day rate. The streak always advances by
/// one, whatever the habit frequency.
pub fn energy_gain(habit: &Habit, artifacts: &[Artifact], is_overdrive: bool) -> EnergyGain {
    let new_streak = habit.current_streak.saturating_add(1);
    let buffs = buff_total(artifacts, BuffType::EnergyMultiplier);
    let overdrive = if is_overdrive {
        energy::OVERDRIVE_MULTIPLIER
    } else {
        1.0
    };
    EnergyGain {
        energy: energy::ENERGY_PER_HABIT
            * streak_multiplier(new_streak)
            * (1.0 + buffs)
            * overdrive,
        new_streak,
    }
}

/// Outcome of integrating decay from the reactor's anchor up to `now`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecayOutcome {
    pub energy: f64,
    pub stability: f64,
    pub energy_lost: f64,
    /// New decay anchor; always the tick time.
    pub last_decay_update: DateTime<Utc>,
}

/// Integrate decay since `reactor.last_decay_update` with buffs from `artifacts`.
pub fn decay_tick(reactor: &ReactorState, artifacts: &[Artifact], now: DateTime<Utc>) -> DecayOutcome {
    decay_tick_at_rate(
        reactor,
        effective_decay_per_hour(artifacts),
        max_capacity(artifacts),
        now,
    )
}

/// Integrate decay at an explicit hourly rate.
///
/// Hibernation freezes energy; a decay pause excludes the paused part of
/// the interval. The anchor moves to `now` in every case, so ticking twice
/// in a row never subtracts the same hours twice and a long gap between
/// ticks decays exactly as much as continuous ticking would.
pub fn decay_tick_at_rate(
    reactor: &ReactorState,
    rate_per_hour: f64,
    max_capacity: f64,
    now: DateTime<Utc>,
) -> DecayOutcome {
    let current = reactor.current_energy.clamp(0.0, max_capacity.max(0.0));
    let stability = |e: f64| {
        if max_capacity > 0.0 {
            (e / max_capacity).clamp(0.0, 1.0)
        } else {
            0.0
        }
    };

    if reactor.is_hibernating {
        return DecayOutcome {
            energy: current,
            stability: stability(current),
            energy_lost: 0.0,
            last_decay_update: now,
        };
    }

    let start = match reactor.decay_paused_until {
        Some(paused) if paused > reactor.last_decay_update => paused,
        _ => reactor.last_decay_update,
    };
    let hours = hours_between(start, now).max(0.0);
    let energy = (current - hours * rate_per_hour.max(0.0)).max(0.0);

    DecayOutcome {
        energy,
        stability: stability(energy),
        energy_lost: current - energy,
        last_decay_update: now,
    }
}

/// Grace window for a frequency before the streak breaks.
pub fn grace_hours(frequency: HabitFrequency) -> f64 {
    match frequency {
        HabitFrequency::Daily => streak::DAILY_GRACE_HOURS,
        HabitFrequency::Weekly => streak::WEEKLY_GRACE_HOURS,
    }
}

/// Whether the habit's streak is broken at `now`: more than 48 hours since
/// the last completion for daily habits, more than 336 for weekly ones.
/// Habits never completed have no streak to break.
pub fn should_break_streak(habit: &Habit, now: DateTime<Utc>) -> bool {
    should_break_streak_within(habit, grace_hours(habit.frequency), now)
}

/// [`should_break_streak`] with the grace window stretched by
/// streak_protection buffs (at most +50%).
pub fn should_break_streak_protected(habit: &Habit, artifacts: &[Artifact], now: DateTime<Utc>) -> bool {
    let extension = buff_total(artifacts, BuffType::StreakProtection).clamp(0.0, streak::MAX_PROTECTION_EXTENSION);
    should_break_streak_within(habit, grace_hours(habit.frequency) * (1.0 + extension), now)
}

fn should_break_streak_within(habit: &Habit, grace: f64, now: DateTime<Utc>) -> bool {
    match habit.last_completed {
        Some(last) if habit.current_streak > 0 => hours_between(last, now) > grace,
        _ => false,
    }
}

/// Shield rings: how many of the 3/7/14 streak milestones the best
/// current streak has reached.
pub fn shield_level(habits: &[Habit]) -> u32 {
    let best = habits.iter().map(|h| h.current_streak).max().unwrap_or(0);
    streak::SHIELD_MILESTONES
        .iter()
        .filter(|&&m| best >= m)
        .count() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::HabitCategory;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn habit(streak: u32) -> Habit {
        let mut h = Habit::new(
            "h".into(),
            "Stretch",
            HabitCategory::Physical,
            HabitFrequency::Daily,
            t0(),
        );
        h.current_streak = streak;
        h
    }

    fn artifact(buff_type: BuffType, buff_value: f64) -> Artifact {
        Artifact {
            id: format!("{:?}-{}", buff_type, buff_value),
            name: "Test".into(),
            svg_data: String::new(),
            buff_type,
            buff_value,
            category: HabitCategory::Physical,
            unlocked_at: t0(),
        }
    }

    #[test]
    fn test_streak_multiplier_caps_at_three() {
        assert!((streak_multiplier(0) - 1.0).abs() < 1e-9);
        assert!((streak_multiplier(6) - 1.6).abs() < 1e-9);
        assert!((streak_multiplier(20) - 3.0).abs() < 1e-9);
        assert!((streak_multiplier(45) - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_energy_gain_at_streak_six() {
        // 10 × min(1 + 0.7, 3)
        let gain = energy_gain(&habit(6), &[], false);
        assert!((gain.energy - 17.0).abs() < 1e-9);
        assert_eq!(gain.new_streak, 7);
    }

    #[test]
    fn test_energy_gain_caps_with_long_streak() {
        let gain = energy_gain(&habit(40), &[], false);
        assert!((gain.energy - 30.0).abs() < 1e-9);
        assert_eq!(gain.new_streak, 41);
    }

    #[test]
    fn test_energy_gain_buffs_and_overdrive() {
        let artifacts = vec![
            artifact(BuffType::EnergyMultiplier, 0.1),
            artifact(BuffType::EnergyMultiplier, 0.1),
        ];
        let gain = energy_gain(&habit(0), &artifacts, true);
        // 10 × 1.1 × 1.2 × 2
        assert!((gain.energy - 26.4).abs() < 1e-9);
    }

    #[test]
    fn test_decay_reduction_is_summed_and_capped() {
        let two = vec![
            artifact(BuffType::DecayReduction, 0.1),
            artifact(BuffType::DecayReduction, 0.05),
        ];
        assert!((effective_decay_per_hour(&two) - 5.0 * 0.85).abs() < 1e-9);

        let many: Vec<_> = (0..12).map(|_| artifact(BuffType::DecayReduction, 0.1)).collect();
        assert!((effective_decay_per_hour(&many) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_max_capacity_adds_flat_boosts() {
        let artifacts = vec![
            artifact(BuffType::CapacityBoost, 50.0),
            artifact(BuffType::CapacityBoost, 50.0),
            artifact(BuffType::EnergyMultiplier, 0.1),
        ];
        assert!((max_capacity(&artifacts) - 1100.0).abs() < 1e-9);
    }

    #[test]
    fn test_decay_after_hours_closed() {
        let reactor = ReactorState {
            current_energy: 500.0,
            ..ReactorState::new(t0())
        };
        let outcome = decay_tick(&reactor, &[], t0() + Duration::hours(10));
        assert!((outcome.energy - 450.0).abs() < 1e-9);
        assert!((outcome.energy_lost - 50.0).abs() < 1e-9);
        assert!((outcome.stability - 0.45).abs() < 1e-9);
        assert_eq!(outcome.last_decay_update, t0() + Duration::hours(10));
    }

    #[test]
    fn test_decay_twice_does_not_double_subtract() {
        let now = t0() + Duration::hours(2);
        let mut reactor = ReactorState {
            current_energy: 500.0,
            ..ReactorState::new(t0())
        };
        let first = decay_tick(&reactor, &[], now);
        reactor.current_energy = first.energy;
        reactor.last_decay_update = first.last_decay_update;
        let second = decay_tick(&reactor, &[], now);
        assert!((first.energy - 490.0).abs() < 1e-9);
        assert!((second.energy - first.energy).abs() < 1e-9);
        assert_eq!(second.energy_lost, 0.0);
    }

    #[test]
    fn test_decay_is_additive_across_ticks() {
        let mut reactor = ReactorState {
            current_energy: 800.0,
            ..ReactorState::new(t0())
        };
        for hour in 1..=6 {
            let outcome = decay_tick(&reactor, &[], t0() + Duration::hours(hour));
            reactor.current_energy = outcome.energy;
            reactor.last_decay_update = outcome.last_decay_update;
        }
        let closed = decay_tick(
            &ReactorState {
                current_energy: 800.0,
                ..ReactorState::new(t0())
            },
            &[],
            t0() + Duration::hours(6),
        );
        assert!((reactor.current_energy - closed.energy).abs() < 1e-9);
    }

    #[test]
    fn test_decay_floors_at_zero() {
        let reactor = ReactorState {
            current_energy: 20.0,
            ..ReactorState::new(t0())
        };
        let outcome = decay_tick(&reactor, &[], t0() + Duration::hours(100));
        assert_eq!(outcome.energy, 0.0);
        assert_eq!(outcome.stability, 0.0);
    }

    #[test]
    fn test_hibernation_freezes_energy_but_moves_anchor() {
        let reactor = ReactorState {
            current_energy: 300.0,
            is_hibernating: true,
            ..ReactorState::new(t0())
        };
        let later = t0() + Duration::hours(24);
        let outcome = decay_tick(&reactor, &[], later);
        assert_eq!(outcome.energy, 300.0);
        assert_eq!(outcome.energy_lost, 0.0);
        assert_eq!(outcome.last_decay_update, later);
    }

    #[test]
    fn test_decay_pause_excludes_paused_hours() {
        let reactor = ReactorState {
            current_energy: 500.0,
            decay_paused_until: Some(t0() + Duration::hours(12)),
            ..ReactorState::new(t0())
        };
        let during = decay_tick(&reactor, &[], t0() + Duration::hours(5));
        assert_eq!(during.energy, 500.0);

        let after = decay_tick(&reactor, &[], t0() + Duration::hours(14));
        assert!((after.energy - 490.0).abs() < 1e-9);
    }

    #[test]
    fn test_streak_break_windows() {
        let mut daily = habit(5);
        daily.last_completed = Some(t0());
        assert!(!should_break_streak(&daily, t0() + Duration::hours(48)));
        assert!(should_break_streak(&daily, t0() + Duration::hours(49)));

        let mut weekly = habit(2);
        weekly.frequency = HabitFrequency::Weekly;
        weekly.last_completed = Some(t0());
        assert!(!should_break_streak(&weekly, t0() + Duration::hours(300)));
        assert!(should_break_streak(&weekly, t0() + Duration::hours(337)));
    }

    #[test]
    fn test_never_completed_never_breaks() {
        assert!(!should_break_streak(&habit(0), t0() + Duration::days(30)));
    }

    #[test]
    fn test_streak_protection_extends_grace() {
        let mut daily = habit(5);
        daily.last_completed = Some(t0());
        let shields = vec![artifact(BuffType::StreakProtection, 0.1)];
        let at = t0() + Duration::hours(50);
        assert!(should_break_streak(&daily, at));
        assert!(!should_break_streak_protected(&daily, &shields, at));

        // extension is capped at +50%
        let lots: Vec<_> = (0..20).map(|_| artifact(BuffType::StreakProtection, 0.1)).collect();
        assert!(should_break_streak_protected(&daily, &lots, t0() + Duration::hours(73)));
    }

    #[test]
    fn test_shield_level_milestones() {
        assert_eq!(shield_level(&[]), 0);
        assert_eq!(shield_level(&[habit(2)]), 0);
        assert_eq!(shield_level(&[habit(3)]), 1);
        assert_eq!(shield_level(&[habit(1), habit(7)]), 2);
        assert_eq!(shield_level(&[habit(30)]), 3);
    }
}
