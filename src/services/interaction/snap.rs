use chrono::{DateTime, Duration, Utc};

/// Round an instant to the nearest multiple of the scheduling step.
/// Halfway points round up.
pub fn snap_to_step(instant: DateTime<Utc>, step: Duration) -> DateTime<Utc> {
    let step_ms = step.num_milliseconds().max(1);
    let ms = instant.timestamp_millis();
    let snapped = (ms + step_ms / 2).div_euclid(step_ms) * step_ms;
    DateTime::from_timestamp_millis(snapped).unwrap_or(instant)
}

/// True when the instant sits exactly on the step grid.
pub fn is_on_step(instant: DateTime<Utc>, step: Duration) -> bool {
    let step_ms = step.num_milliseconds().max(1);
    instant.timestamp_millis().rem_euclid(step_ms) == 0
}

/// Order two drag endpoints into a snapped range of at least one step.
pub fn snapped_range(
    origin: DateTime<Utc>,
    current: DateTime<Utc>,
    step: Duration,
) -> (DateTime<Utc>, DateTime<Utc>) {
    let low = snap_to_step(origin.min(current), step);
    let high = snap_to_step(origin.max(current), step);
    if high - low < step {
        (low, low + step)
    } else {
        (low, high)
    }
}
