//! Zone-aware conversion between absolute instants and wall-clock time.
//!
//! Every event is stored as an absolute UTC instant; everything a user sees
//! or types is wall-clock time in a display zone. This module owns that
//! boundary, including the awkward cases around daylight-saving transitions.

use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;

use crate::models::settings::GridSettings;

/// Wall-clock components in the clock's display zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WallClock {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
}

impl WallClock {
    pub fn from_naive(naive: NaiveDateTime) -> Self {
        Self {
            year: naive.year(),
            month: naive.month(),
            day: naive.day(),
            hour: naive.hour(),
            minute: naive.minute(),
            second: naive.second(),
        }
    }

    /// Rebuild the naive datetime. Returns `None` for field combinations
    /// that name no real calendar date (e.g. February 30th).
    pub fn to_naive(&self) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)
            .and_then(|d| d.and_hms_opt(self.hour, self.minute, self.second))
    }

    pub fn date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)
    }
}

/// The display zone, resolved once at construction time.
///
/// An unrecognized zone id degrades to the machine's local zone instead of
/// becoming an error the caller has to thread through every conversion.
#[derive(Debug, Clone, Copy)]
enum ZoneHandle {
    Named(Tz),
    LocalFallback,
}

impl ZoneHandle {
    fn wall_of(&self, instant: DateTime<Utc>) -> NaiveDateTime {
        match self {
            Self::Named(tz) => instant.with_timezone(tz).naive_local(),
            Self::LocalFallback => instant.with_timezone(&Local).naive_local(),
        }
    }
}

/// Converts between UTC instants and wall-clock time in one display zone.
pub struct TimeZoneClock {
    zone: ZoneHandle,
    zone_label: String,
}

impl TimeZoneClock {
    /// Create a clock for the given IANA zone id, or the machine's local
    /// zone when `zone_id` is `None` or unrecognized.
    pub fn new(zone_id: Option<&str>) -> Self {
        match zone_id {
            Some(id) => match id.parse::<Tz>() {
                Ok(tz) => Self {
                    zone: ZoneHandle::Named(tz),
                    zone_label: id.to_string(),
                },
                Err(_) => {
                    log::warn!("Unknown time zone id '{}', falling back to system local zone", id);
                    Self {
                        zone: ZoneHandle::LocalFallback,
                        zone_label: "local".to_string(),
                    }
                }
            },
            None => Self {
                zone: ZoneHandle::LocalFallback,
                zone_label: "local".to_string(),
            },
        }
    }

    pub fn from_settings(settings: &GridSettings) -> Self {
        Self::new(settings.time_zone.as_deref())
    }

    pub fn zone_label(&self) -> &str {
        &self.zone_label
    }

    /// Wall-clock components of an instant in the display zone.
    pub fn to_zoned(&self, instant: DateTime<Utc>) -> WallClock {
        WallClock::from_naive(self.zone.wall_of(instant))
    }

    /// Instant whose wall clock in the display zone reads `local`.
    ///
    /// Works by guess and correction: start from the local fields read as
    /// UTC, then shift by however far the guess's actual wall clock landed
    /// from the requested one. Three rounds cover every real offset change,
    /// including half-hour zones. A time skipped by a spring-forward
    /// transition settles on the instant shifted past the gap.
    pub fn from_zoned(&self, local: NaiveDateTime) -> DateTime<Utc> {
        let mut guess = Utc.from_utc_datetime(&local);
        for _ in 0..3 {
            let have = self.zone.wall_of(guess);
            let delta = local - have;
            if delta == Duration::zero() {
                break;
            }
            guess += delta;
        }
        guess
    }

    /// Calendar date an instant falls on in the display zone.
    pub fn date_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        self.zone.wall_of(instant).date()
    }

    /// Start of `date` and start of the following day, as instants.
    ///
    /// The pair brackets everything that displays on `date`, and stays
    /// correct on days that are 23 or 25 hours long.
    pub fn day_bounds(&self, date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
        let start = self.from_zoned(date.and_hms_opt(0, 0, 0).unwrap_or_default());
        let next = date.succ_opt().unwrap_or(date);
        let end = self.from_zoned(next.and_hms_opt(0, 0, 0).unwrap_or_default());
        (start, end)
    }

    /// Format an instant as a zero-padded minute-precision string,
    /// `YYYY-MM-DD HH:MM`.
    pub fn format_wall(&self, instant: DateTime<Utc>) -> String {
        let wall = self.to_zoned(instant);
        format!(
            "{:04}-{:02}-{:02} {:02}:{:02}",
            wall.year, wall.month, wall.day, wall.hour, wall.minute
        )
    }

    /// Parse a human-entered wall-clock string into an instant. Accepts
    /// `YYYY-MM-DD HH:MM`, the `T`-separated variant, and trailing seconds
    /// (truncated to the minute). Returns `None` for anything else.
    pub fn parse_wall(&self, input: &str) -> Option<DateTime<Utc>> {
        const FORMATS: [&str; 4] = [
            "%Y-%m-%d %H:%M:%S",
            "%Y-%m-%d %H:%M",
            "%Y-%m-%dT%H:%M:%S",
            "%Y-%m-%dT%H:%M",
        ];
        let trimmed = input.trim();
        let naive = FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())?;
        let truncated = naive.with_second(0)?.with_nanosecond(0)?;
        Some(self.from_zoned(truncated))
    }
}
