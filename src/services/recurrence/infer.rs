use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};

use crate::models::recurrence::{Frequency, RecurrenceSpec, WeekdayToken};

use super::parser::serialize_rule;

/// Infer a plausible recurrence rule from the occurrence dates of a series
/// that has no stored rule.
///
/// Day gaps between consecutive occurrences are tallied and the most common
/// gap classifies the cadence: 1 day reads as daily, 6 to 8 days as weekly
/// (honest about sync jitter around day boundaries), 27 to 31 days as
/// monthly. Ties between gap counts go to the smaller gap. A series that
/// hits several weekdays per week never shows a 7-day consecutive gap, so
/// when no band matches, occurrences one weekday-cycle apart are checked
/// for an exact 7-day spacing instead. Anything else yields `None` rather
/// than a fabricated cadence.
pub fn infer_rule(dates: &[NaiveDate]) -> Option<String> {
    let mut dates = dates.to_vec();
    dates.sort();
    dates.dedup();
    if dates.len() < 2 {
        return None;
    }

    let gaps: Vec<i64> = dates
        .windows(2)
        .map(|pair| (pair[1] - pair[0]).num_days())
        .collect();

    let spec = match dominant_gap(&gaps) {
        1 => Some(RecurrenceSpec::new(Frequency::Daily)),
        6..=8 => Some(RecurrenceSpec {
            by_day: observed_weekdays(&dates),
            ..RecurrenceSpec::new(Frequency::Weekly)
        }),
        27..=31 => Some(RecurrenceSpec {
            by_month_day: Some(dates[0].day()),
            ..RecurrenceSpec::new(Frequency::Monthly)
        }),
        _ => weekly_cycle(&dates, &gaps),
    };

    spec.map(|s| serialize_rule(&s.normalize()))
}

/// The most frequent gap, smaller gap winning a tie.
fn dominant_gap(gaps: &[i64]) -> i64 {
    let mut counts: HashMap<i64, usize> = HashMap::new();
    for &gap in gaps {
        *counts.entry(gap).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .max_by(|(gap_a, count_a), (gap_b, count_b)| {
            count_a.cmp(count_b).then(gap_b.cmp(gap_a))
        })
        .map(|(gap, _)| gap)
        .unwrap_or(0)
}

/// Detect a weekly series spanning several weekdays: every gap stays inside
/// one week and occurrences one full weekday-cycle apart sit exactly 7 days
/// from each other.
fn weekly_cycle(dates: &[NaiveDate], gaps: &[i64]) -> Option<RecurrenceSpec> {
    let weekdays = observed_weekdays(dates);
    let cycle = weekdays.len();
    if cycle < 2 || dates.len() <= cycle {
        return None;
    }
    if !gaps.iter().all(|&g| (1..=6).contains(&g)) {
        return None;
    }
    let period_holds = (0..dates.len() - cycle)
        .all(|i| (dates[i + cycle] - dates[i]).num_days() == 7);
    if !period_holds {
        return None;
    }
    Some(RecurrenceSpec {
        by_day: weekdays,
        ..RecurrenceSpec::new(Frequency::Weekly)
    })
}

fn observed_weekdays(dates: &[NaiveDate]) -> Vec<WeekdayToken> {
    let mut days: Vec<WeekdayToken> = dates
        .iter()
        .map(|d| WeekdayToken::from_chrono(d.weekday()))
        .collect();
    days.sort();
    days.dedup();
    days
}
