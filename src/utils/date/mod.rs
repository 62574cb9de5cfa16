// Date helpers shared by the session and rendering layers

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};

/// Monday of the week containing the date.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// Half-open interval overlap, for placing events into day columns.
pub fn overlaps_range(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    range_start: DateTime<Utc>,
    range_end: DateTime<Utc>,
) -> bool {
    start < range_end && end > range_start
}
