//! Slump oracle - advisory trend analysis over the last fourteen days of
//! completions. Read-only; never touches domain state.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::edge::ANALYSIS_WINDOW_DAYS;
use crate::model::Habit;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Improving,
    Stable,
    Declining,
    Critical,
}

impl Trend {
    /// Fixed confidence reported for each classification.
    pub fn confidence(self) -> f64 {
        match self {
            Trend::Critical => 0.9,
            Trend::Improving => 0.8,
            Trend::Declining => 0.75,
            Trend::Stable => 0.7,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OracleAnalysis {
    pub trend: Trend,
    pub message: String,
    pub suggested_action: String,
    pub confidence: f64,
    /// Change of the last 7-day average against the 7 days before, in percent.
    pub trend_percent: f64,
}

/// Completions per 24-hour bucket, oldest first. The last bucket ends at `now`.
pub fn daily_completion_counts(habits: &[Habit], now: DateTime<Utc>) -> [u32; ANALYSIS_WINDOW_DAYS] {
    let mut counts = [0u32; ANALYSIS_WINDOW_DAYS];
    let window_start = now - Duration::days(ANALYSIS_WINDOW_DAYS as i64);
    for ts in habits.iter().flat_map(|h| h.completion_history.iter()) {
        if *ts < window_start || *ts >= now {
            continue;
        }
        let bucket = ((*ts - window_start).num_milliseconds() / Duration::days(1).num_milliseconds()) as usize;
        if let Some(slot) = counts.get_mut(bucket) {
            *slot += 1;
        }
    }
    counts
}

fn average(values: &[u32]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().map(|&v| v as f64).sum::<f64>() / values.len() as f64
}

/// Classify the completion trend. `None` when there are no habits.
///
/// Critical needs both a collapsed last three days (under half the prior
/// week's average) and a week-over-week drop beyond 30%.
pub fn analyze(habits: &[Habit], now: DateTime<Utc>) -> Option<OracleAnalysis> {
    if habits.is_empty() {
        return None;
    }

    let counts = daily_completion_counts(habits, now);
    let (previous, recent) = counts.split_at(ANALYSIS_WINDOW_DAYS / 2);
    let previous_avg = average(previous);
    let recent_avg = average(recent);
    let last_three_avg = average(&counts[ANALYSIS_WINDOW_DAYS - 3..]);

    let trend_percent = if previous_avg > 0.0 {
        (recent_avg - previous_avg) / previous_avg * 100.0
    } else {
        0.0
    };
    let consecutive_low = last_three_avg < previous_avg * 0.5;

    let (trend, message, suggested_action) = if consecutive_low && trend_percent < -30.0 {
        (
            Trend::Critical,
            "Critical slump detected: activity down three days running".to_string(),
            "Complete one easy habit today to break the pattern".to_string(),
        )
    } else if trend_percent < -20.0 {
        (
            Trend::Declining,
            format!("Declining trend: activity down {:.0}%", trend_percent.abs()),
            "Focus on your highest-streak habit to keep momentum".to_string(),
        )
    } else if trend_percent > 20.0 {
        (
            Trend::Improving,
            format!("Improving trend: activity up {:.0}%", trend_percent),
            "Great momentum. Consider adding a new habit".to_string(),
        )
    } else {
        (
            Trend::Stable,
            "Stable pattern: consistent activity".to_string(),
            "Maintain current routine".to_string(),
        )
    };

    Some(OracleAnalysis {
        trend,
        message,
        suggested_action,
        confidence: trend.confidence(),
        trend_percent,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{HabitCategory, HabitFrequency};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 15, 20, 0, 0).unwrap()
    }

    /// One habit with `per_day[i]` completions in bucket `i` (oldest first).
    fn habit_with(per_day: [u32; 14]) -> Habit {
        let start = now() - Duration::days(14);
        let mut habit = Habit::new(
            "h".into(),
            "Journal",
            HabitCategory::Creative,
            HabitFrequency::Daily,
            start,
        );
        for (day, &count) in per_day.iter().enumerate() {
            for n in 0..count {
                habit
                    .completion_history
                    .push(start + Duration::days(day as i64) + Duration::hours(1 + n as i64));
            }
        }
        habit
    }

    #[test]
    fn test_no_habits_no_analysis() {
        assert!(analyze(&[], now()).is_none());
    }

    #[test]
    fn test_buckets() {
        let habit = habit_with([1, 0, 2, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 3]);
        let counts = daily_completion_counts(&[habit], now());
        assert_eq!(counts[0], 1);
        assert_eq!(counts[2], 2);
        assert_eq!(counts[13], 3);
        assert_eq!(counts.iter().sum::<u32>(), 6);
    }

    #[test]
    fn test_stable() {
        let analysis = analyze(&[habit_with([2; 14])], now()).unwrap();
        assert_eq!(analysis.trend, Trend::Stable);
        assert_eq!(analysis.confidence, 0.7);
    }

    #[test]
    fn test_improving() {
        let analysis = analyze(
            &[habit_with([1, 1, 1, 1, 1, 1, 1, 2, 2, 2, 2, 2, 2, 2])],
            now(),
        )
        .unwrap();
        assert_eq!(analysis.trend, Trend::Improving);
        assert!((analysis.trend_percent - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_declining_without_collapse() {
        // recent week averages about 1.4 against 2.0, last three days still at 2
        let analysis = analyze(
            &[habit_with([2, 2, 2, 2, 2, 2, 2, 1, 1, 1, 1, 2, 2, 2])],
            now(),
        )
        .unwrap();
        assert!(analysis.trend_percent < -20.0);
        assert_eq!(analysis.trend, Trend::Declining);
    }

    #[test]
    fn test_critical_slump() {
        let analysis = analyze(
            &[habit_with([3, 3, 3, 3, 3, 3, 3, 2, 2, 1, 1, 0, 0, 0])],
            now(),
        )
        .unwrap();
        assert_eq!(analysis.trend, Trend::Critical);
        assert_eq!(analysis.confidence, 0.9);
    }

    #[test]
    fn test_empty_prior_week_reads_stable() {
        let analysis = analyze(
            &[habit_with([0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 1, 1, 1])],
            now(),
        )
        .unwrap();
        assert_eq!(analysis.trend, Trend::Stable);
        assert_eq!(analysis.trend_percent, 0.0);
    }

    #[test]
    fn test_analysis_does_not_mutate() {
        let habits = vec![habit_with([1; 14])];
        let before = habits.clone();
        let _ = analyze(&habits, now());
        assert_eq!(habits, before);
    }
}
