//! Edge-case detectors: idle awakening, overdrive burnout, flux patterns.

use chrono::{DateTime, Duration, FixedOffset, Utc};

use crate::clock::{calendar_day, hours_between};
use crate::constants::edge;
use crate::model::Habit;

/// Latest completion across all habits.
pub fn last_completion(habits: &[Habit]) -> Option<DateTime<Utc>> {
    habits.iter().filter_map(|h| h.last_completed).max()
}

/// Whether the player has gone quiet for `idle_hours`.
///
/// Activity is the latest completion, or habit creation for habits never
/// completed, so a brand-new habit does not count as idle. No habits, no
/// idleness.
pub fn is_idle(habits: &[Habit], now: DateTime<Utc>, idle_hours: f64) -> bool {
    match habits.iter().map(Habit::last_activity).max() {
        Some(latest) => hours_between(latest, now) >= idle_hours,
        None => false,
    }
}

/// Overdrive without any activity for six hours risks burnout.
pub fn burnout_risk(last_activity: Option<DateTime<Utc>>, is_overdrive: bool, now: DateTime<Utc>) -> bool {
    match last_activity {
        Some(last) if is_overdrive => hours_between(last, now) >= edge::BURNOUT_HOURS,
        _ => false,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FluxReport {
    pub has_flux: bool,
    /// Variance of daily counts divided by their mean.
    pub variance: f64,
}

/// Distinct habits completed on each of the last fourteen calendar days,
/// oldest first, today last.
pub fn daily_habit_counts(habits: &[Habit], now: DateTime<Utc>, offset: FixedOffset) -> Vec<u32> {
    let today = calendar_day(now, offset);
    (0..edge::ANALYSIS_WINDOW_DAYS as i64)
        .rev()
        .map(|back| {
            let day = today - Duration::days(back);
            habits
                .iter()
                .filter(|h| {
                    h.completion_history
                        .iter()
                        .any(|ts| calendar_day(*ts, offset) == day)
                })
                .count() as u32
        })
        .collect()
}

/// Detect an on/off completion rhythm (e.g. three days on, two off).
pub fn detect_flux(habits: &[Habit], now: DateTime<Utc>, offset: FixedOffset) -> FluxReport {
    let counts = daily_habit_counts(habits, now, offset);
    let n = counts.len() as f64;
    let mean = counts.iter().map(|&c| c as f64).sum::<f64>() / n;
    let variance = counts
        .iter()
        .map(|&c| (c as f64 - mean).powi(2))
        .sum::<f64>()
        / n;
    let normalized = variance / if mean > 0.0 { mean } else { 1.0 };
    FluxReport {
        has_flux: normalized > edge::FLUX_VARIANCE_THRESHOLD,
        variance: normalized,
    }
}

/// Flux days decay 20% slower.
pub fn apply_flux_stabilizer(decay_per_hour: f64, has_flux: bool) -> f64 {
    if has_flux {
        decay_per_hour * edge::FLUX_DECAY_FACTOR
    } else {
        decay_per_hour
    }
}

/// Bonus for a completion that breaks a flux pattern.
pub fn flux_bonus_energy(has_flux: bool, breaks_pattern: bool) -> f64 {
    if has_flux && breaks_pattern {
        edge::FLUX_BONUS_ENERGY
    } else {
        0.0
    }
}
