use chrono::NaiveDate;

use crate::models::recurrence::{Frequency, RecurrenceSpec, WeekdayToken};

/// Parse a recurrence-rule string into a structured spec.
///
/// Parsing is lenient: unknown keys, out-of-range values, and unrecognized
/// BYDAY tokens are dropped silently, and fields that do not apply to the
/// parsed frequency are discarded so the result is always in canonical form.
/// A missing or unrecognized FREQ is the one unrecoverable case and yields
/// `None`.
pub fn parse_rule(rule: &str) -> Option<RecurrenceSpec> {
    let body = rule.trim();
    let body = body.strip_prefix("RRULE:").unwrap_or(body);

    let mut frequency = None;
    let mut interval = 1u32;
    let mut by_day = Vec::new();
    let mut by_month_day = None;
    let mut by_month = None;
    let mut until = None;
    let mut count = None;

    for part in body.split(';') {
        let Some((key, value)) = part.split_once('=') else {
            continue;
        };
        let value = value.trim();
        match key.trim().to_ascii_uppercase().as_str() {
            "FREQ" => {
                frequency = Frequency::from_rule_token(&value.to_ascii_uppercase());
            }
            "INTERVAL" => {
                if let Ok(v) = value.parse::<u32>() {
                    interval = v.max(1);
                }
            }
            "BYDAY" => {
                for code in value.split(',') {
                    if let Some(day) =
                        WeekdayToken::from_rule_code(&code.trim().to_ascii_uppercase())
                    {
                        by_day.push(day);
                    }
                }
            }
            "BYMONTHDAY" => {
                if let Ok(v) = value.parse::<u32>() {
                    if (1..=31).contains(&v) {
                        by_month_day = Some(v);
                    }
                }
            }
            "BYMONTH" => {
                if let Ok(v) = value.parse::<u32>() {
                    if (1..=12).contains(&v) {
                        by_month = Some(v);
                    }
                }
            }
            "UNTIL" => {
                until = parse_until_date(value);
            }
            "COUNT" => {
                if let Ok(v) = value.parse::<u32>() {
                    if v > 0 {
                        count = Some(v);
                    }
                }
            }
            _ => {}
        }
    }

    let frequency = frequency?;
    let spec = RecurrenceSpec {
        frequency,
        interval,
        by_day: match frequency {
            Frequency::Weekly => by_day,
            _ => Vec::new(),
        },
        by_month_day: match frequency {
            Frequency::Monthly | Frequency::Yearly => by_month_day,
            _ => None,
        },
        by_month: match frequency {
            Frequency::Yearly => by_month,
            _ => None,
        },
        until,
        count,
    };
    Some(spec.normalize())
}

/// Serialize a spec back to a rule string.
///
/// Emits FREQ always, INTERVAL only above 1, BYDAY only for weekly rules,
/// BYMONTHDAY for monthly and yearly, BYMONTH for yearly, and a COUNT or an
/// end-of-day UTC UNTIL stamp. Parsing the output of this function yields
/// the input spec back.
pub fn serialize_rule(spec: &RecurrenceSpec) -> String {
    let mut parts = vec![format!("FREQ={}", spec.frequency.to_rule_token())];

    if spec.interval > 1 {
        parts.push(format!("INTERVAL={}", spec.interval));
    }

    if spec.frequency == Frequency::Weekly && !spec.by_day.is_empty() {
        let days: Vec<&str> = spec.by_day.iter().map(|d| d.to_rule_code()).collect();
        parts.push(format!("BYDAY={}", days.join(",")));
    }

    if matches!(spec.frequency, Frequency::Monthly | Frequency::Yearly) {
        if let Some(day) = spec.by_month_day {
            parts.push(format!("BYMONTHDAY={}", day));
        }
    }

    if spec.frequency == Frequency::Yearly {
        if let Some(month) = spec.by_month {
            parts.push(format!("BYMONTH={}", month));
        }
    }

    if let Some(count) = spec.count {
        parts.push(format!("COUNT={}", count));
    } else if let Some(until) = spec.until {
        parts.push(format!("UNTIL={}", until.format("%Y%m%dT235959Z")));
    }

    parts.join(";")
}

/// Extract the calendar date from an UNTIL value. Accepts a bare `YYYYMMDD`
/// as well as the timestamped `YYYYMMDDTHHMMSSZ` form; the time-of-day part
/// is ignored.
pub(super) fn parse_until_date(value: &str) -> Option<NaiveDate> {
    if value.len() < 8 {
        return None;
    }

    let year = value.get(0..4)?.parse::<i32>().ok()?;
    let month = value.get(4..6)?.parse::<u32>().ok()?;
    let day = value.get(6..8)?.parse::<u32>().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}
