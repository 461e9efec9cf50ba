//! Time helpers. Nothing here reads the wall clock.

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};

/// Fractional hours from `from` to `to`. Negative when `to` is earlier.
pub fn hours_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_milliseconds() as f64 / 3_600_000.0
}

/// Fixed offset for calendar-day questions, falling back to UTC when the
/// minute count is out of range.
pub fn day_offset(utc_offset_minutes: i32) -> FixedOffset {
    FixedOffset::east_opt(utc_offset_minutes.saturating_mul(60)).unwrap_or_else(|| Utc.fix())
}

/// Calendar day of `ts` as seen in `offset`.
pub fn calendar_day(ts: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    ts.with_timezone(&offset).date_naive()
}

/// Whether two instants fall on the same calendar day in `offset`.
pub fn same_day(a: DateTime<Utc>, b: DateTime<Utc>, offset: FixedOffset) -> bool {
    calendar_day(a, offset) == calendar_day(b, offset)
}
