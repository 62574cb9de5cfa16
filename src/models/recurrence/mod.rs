// Recurrence module
// Structured form of a recurrence-rule string

use chrono::NaiveDate;

/// Rule frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    pub fn to_rule_token(&self) -> &'static str {
        match self {
            Self::Daily => "DAILY",
            Self::Weekly => "WEEKLY",
            Self::Monthly => "MONTHLY",
            Self::Yearly => "YEARLY",
        }
    }

    pub fn from_rule_token(token: &str) -> Option<Self> {
        match token {
            "DAILY" => Some(Self::Daily),
            "WEEKLY" => Some(Self::Weekly),
            "MONTHLY" => Some(Self::Monthly),
            "YEARLY" => Some(Self::Yearly),
            _ => None,
        }
    }
}

/// Weekday token as it appears in a rule's BYDAY list.
///
/// Ordering is canonical Monday first, so a sorted token list is the
/// canonical form regardless of the order the rule string used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WeekdayToken {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl WeekdayToken {
    pub fn to_rule_code(&self) -> &'static str {
        match self {
            Self::Monday => "MO",
            Self::Tuesday => "TU",
            Self::Wednesday => "WE",
            Self::Thursday => "TH",
            Self::Friday => "FR",
            Self::Saturday => "SA",
            Self::Sunday => "SU",
        }
    }

    pub fn from_rule_code(code: &str) -> Option<Self> {
        match code {
            "MO" => Some(Self::Monday),
            "TU" => Some(Self::Tuesday),
            "WE" => Some(Self::Wednesday),
            "TH" => Some(Self::Thursday),
            "FR" => Some(Self::Friday),
            "SA" => Some(Self::Saturday),
            "SU" => Some(Self::Sunday),
            _ => None,
        }
    }

    pub fn short_label(&self) -> &'static str {
        match self {
            Self::Monday => "Mon",
            Self::Tuesday => "Tue",
            Self::Wednesday => "Wed",
            Self::Thursday => "Thu",
            Self::Friday => "Fri",
            Self::Saturday => "Sat",
            Self::Sunday => "Sun",
        }
    }

    pub fn from_chrono(weekday: chrono::Weekday) -> Self {
        match weekday {
            chrono::Weekday::Mon => Self::Monday,
            chrono::Weekday::Tue => Self::Tuesday,
            chrono::Weekday::Wed => Self::Wednesday,
            chrono::Weekday::Thu => Self::Thursday,
            chrono::Weekday::Fri => Self::Friday,
            chrono::Weekday::Sat => Self::Saturday,
            chrono::Weekday::Sun => Self::Sunday,
        }
    }

    pub fn all() -> [Self; 7] {
        [
            Self::Monday,
            Self::Tuesday,
            Self::Wednesday,
            Self::Thursday,
            Self::Friday,
            Self::Saturday,
            Self::Sunday,
        ]
    }
}

/// Structured decomposition of a recurrence rule.
///
/// A spec carries at most one of `until` (inclusive calendar-date bound) and
/// `count`; `normalize` enforces that along with canonical day ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurrenceSpec {
    pub frequency: Frequency,
    pub interval: u32,
    pub by_day: Vec<WeekdayToken>,
    pub by_month_day: Option<u32>,
    pub by_month: Option<u32>,
    pub until: Option<NaiveDate>,
    pub count: Option<u32>,
}

impl RecurrenceSpec {
    pub fn new(frequency: Frequency) -> Self {
        Self {
            frequency,
            interval: 1,
            by_day: Vec::new(),
            by_month_day: None,
            by_month: None,
            until: None,
            count: None,
        }
    }

    /// Bring the spec to its canonical form: interval at least 1, BYDAY
    /// sorted Monday-first without duplicates, and at most one of
    /// `until`/`count` (count wins when both slipped through parsing).
    pub fn normalize(mut self) -> Self {
        if self.interval < 1 {
            self.interval = 1;
        }
        self.by_day.sort();
        self.by_day.dedup();
        if self.count.is_some() {
            self.until = None;
        }
        self
    }
}
