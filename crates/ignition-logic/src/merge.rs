//! Local/remote habit reconciliation.
//!
//! Habits on both sides get the union of their completion histories
//! (deduplicated at millisecond precision, the resolution of the remote
//! ISO timestamps) and the larger of the two streaks. The streak is not
//! recomputed from the merged history. Remote-only habits are appended
//! with their history sorted; local-only habits are kept as they are.
//! Artifacts are never merged.
//!
//! Identity fields (name, category, frequency, creation time) of a habit
//! present on both sides come from the local copy, the authoritative one.
//! Only the history, streak and last completion are merged symmetrically,
//! so a rename on the remote side does not propagate.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Utc};

use crate::model::Habit;

/// Union of two histories, ascending, one entry per millisecond.
pub fn merge_histories(a: &[DateTime<Utc>], b: &[DateTime<Utc>]) -> Vec<DateTime<Utc>> {
    let mut by_millis: BTreeMap<i64, DateTime<Utc>> = BTreeMap::new();
    for ts in a.iter().chain(b.iter()) {
        by_millis.entry(ts.timestamp_millis()).or_insert(*ts);
    }
    by_millis.into_values().collect()
}

/// Merge one habit present on both sides. Identity fields come from `local`.
pub fn merge_habit(local: &Habit, remote: &Habit) -> Habit {
    let completion_history = merge_histories(&local.completion_history, &remote.completion_history);
    Habit {
        current_streak: local.current_streak.max(remote.current_streak),
        last_completed: completion_history
            .last()
            .copied()
            .max(local.last_completed.max(remote.last_completed)),
        completion_history,
        ..local.clone()
    }
}

/// Merge a remote habit list into the local one. Local order first, then
/// remote-only habits in remote order.
pub fn merge_habits(local: &[Habit], remote: &[Habit]) -> Vec<Habit> {
    let remote_by_id: HashMap<&str, &Habit> = remote.iter().map(|h| (h.id.as_str(), h)).collect();

    let mut merged: Vec<Habit> = local
        .iter()
        .map(|l| match remote_by_id.get(l.id.as_str()) {
            Some(r) => merge_habit(l, r),
            None => l.clone(),
        })
        .collect();

    let local_ids: HashSet<&str> = local.iter().map(|h| h.id.as_str()).collect();
    merged.extend(
        remote
            .iter()
            .filter(|r| !local_ids.contains(r.id.as_str()))
            .map(|r| {
                let mut habit = r.clone();
                habit.completion_history.sort();
                habit
            }),
    );
    merged
}
