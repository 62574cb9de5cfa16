use chrono::{Datelike, NaiveDate};

use crate::models::recurrence::{Frequency, RecurrenceSpec, WeekdayToken};

/// Render a rule as a short human sentence, e.g. "Every 2 weeks on Mon, Wed"
/// or "Every month on day 31 until Apr 1".
///
/// `anchor` is the date of the occurrence being described; it fills in the
/// weekday or month-day when the rule itself does not pin one down. With no
/// spec at all the result depends on `part_of_series`: a bare member of a
/// series reads "Part of a recurring series", anything else "Does not
/// repeat".
pub fn describe_rule(
    spec: Option<&RecurrenceSpec>,
    anchor: NaiveDate,
    part_of_series: bool,
) -> String {
    let Some(spec) = spec else {
        return if part_of_series {
            "Part of a recurring series".to_string()
        } else {
            "Does not repeat".to_string()
        };
    };

    let mut sentence = cadence_phrase(spec);

    match spec.frequency {
        Frequency::Daily => {}
        Frequency::Weekly => {
            let days = if spec.by_day.is_empty() {
                vec![WeekdayToken::from_chrono(anchor.weekday())]
            } else {
                spec.by_day.clone()
            };
            let labels: Vec<&str> = days.iter().map(|d| d.short_label()).collect();
            sentence.push_str(&format!(" on {}", labels.join(", ")));
        }
        Frequency::Monthly => {
            let day = spec.by_month_day.unwrap_or_else(|| anchor.day());
            sentence.push_str(&format!(" on day {}", day));
        }
        Frequency::Yearly => {
            let month = spec.by_month.unwrap_or_else(|| anchor.month());
            let day = spec.by_month_day.unwrap_or_else(|| anchor.day());
            let date = NaiveDate::from_ymd_opt(2000, month, day).unwrap_or(anchor);
            sentence.push_str(&format!(" on {}", date.format("%b %-d")));
        }
    }

    if let Some(count) = spec.count {
        sentence.push_str(&format!(" ({} times)", count));
    } else if let Some(until) = spec.until {
        sentence.push_str(&format!(" until {}", until.format("%b %-d")));
    }

    sentence
}

fn cadence_phrase(spec: &RecurrenceSpec) -> String {
    let unit = match spec.frequency {
        Frequency::Daily => ("day", "days"),
        Frequency::Weekly => ("week", "weeks"),
        Frequency::Monthly => ("month", "months"),
        Frequency::Yearly => ("year", "years"),
    };
    if spec.interval > 1 {
        format!("Every {} {}", spec.interval, unit.1)
    } else {
        format!("Every {}", unit.0)
    }
}
