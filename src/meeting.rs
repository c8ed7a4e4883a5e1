//! Public meeting dates: recurring ordinal-weekday rules and curated date lists.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Months scanned by [`next_occurrence`] before giving up.
pub const MAX_SCAN_MONTHS: u32 = 60;

/// Explicit meeting lists are capped at the handful of upcoming dates a clerk publishes.
pub const MAX_KNOWN_MEETINGS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MeetingError {
    #[error("malformed meeting rule: {0}")]
    MalformedRule(String),
    #[error("no meeting found after {after} within {horizon_months} months")]
    NoOccurrenceFound { after: NaiveDate, horizon_months: u32 },
    #[error("at most {max} known meeting dates are accepted (got {got})")]
    TooManyMeetingDates { max: usize, got: usize },
}

/// Which occurrence of the weekday within a month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeetingOrdinal {
    /// 1-based: `Nth(2)` is the second occurrence.
    Nth(u8),
    Last,
}

impl MeetingOrdinal {
    fn validate(self) -> Result<(), MeetingError> {
        match self {
            MeetingOrdinal::Nth(0) => Err(MeetingError::MalformedRule(
                "ordinal occurrences start at 1".to_string(),
            )),
            MeetingOrdinal::Nth(n) if n > 5 => Err(MeetingError::MalformedRule(format!(
                "no month has a {n}th occurrence of a weekday"
            ))),
            _ => Ok(()),
        }
    }

    fn select(self, occurrences: &[NaiveDate]) -> Option<NaiveDate> {
        match self {
            MeetingOrdinal::Nth(n) => occurrences.get(usize::from(n).checked_sub(1)?).copied(),
            MeetingOrdinal::Last => occurrences.last().copied(),
        }
    }
}

impl fmt::Display for MeetingOrdinal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeetingOrdinal::Nth(1) => write!(f, "1st"),
            MeetingOrdinal::Nth(2) => write!(f, "2nd"),
            MeetingOrdinal::Nth(3) => write!(f, "3rd"),
            MeetingOrdinal::Nth(n) => write!(f, "{n}th"),
            MeetingOrdinal::Last => write!(f, "last"),
        }
    }
}

/// A meeting held on selected occurrences of one weekday each month,
/// e.g. the 2nd and 4th Monday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawMeetingRule", into = "RawMeetingRule")]
pub struct RecurringMeetingRule {
    weekday: Weekday,
    ordinals: BTreeSet<MeetingOrdinal>,
}

#[derive(Serialize, Deserialize)]
struct RawMeetingRule {
    weekday: Weekday,
    ordinals: Vec<MeetingOrdinal>,
}

impl TryFrom<RawMeetingRule> for RecurringMeetingRule {
    type Error = MeetingError;

    fn try_from(raw: RawMeetingRule) -> Result<Self, Self::Error> {
        Self::new(raw.weekday, raw.ordinals)
    }
}

impl From<RecurringMeetingRule> for RawMeetingRule {
    fn from(rule: RecurringMeetingRule) -> Self {
        Self {
            weekday: rule.weekday,
            ordinals: rule.ordinals.into_iter().collect(),
        }
    }
}

impl RecurringMeetingRule {
    pub fn new<I>(weekday: Weekday, ordinals: I) -> Result<Self, MeetingError>
    where
        I: IntoIterator<Item = MeetingOrdinal>,
    {
        let ordinals: BTreeSet<MeetingOrdinal> = ordinals.into_iter().collect();
        if ordinals.is_empty() {
            return Err(MeetingError::MalformedRule(
                "rule selects no occurrences".to_string(),
            ));
        }
        for ordinal in &ordinals {
            ordinal.validate()?;
        }
        Ok(Self { weekday, ordinals })
    }

    /// Shorthand for 1-based ordinals, e.g. `nth(Weekday::Mon, [2, 4])`.
    pub fn nth<I>(weekday: Weekday, ordinals: I) -> Result<Self, MeetingError>
    where
        I: IntoIterator<Item = u8>,
    {
        Self::new(weekday, ordinals.into_iter().map(MeetingOrdinal::Nth))
    }

    pub fn weekday(&self) -> Weekday {
        self.weekday
    }

    pub fn ordinals(&self) -> impl Iterator<Item = MeetingOrdinal> + '_ {
        self.ordinals.iter().copied()
    }

    /// Matching dates within one month, ascending and without duplicates.
    pub fn occurrences_in_month(&self, year: i32, month: u32) -> Vec<NaiveDate> {
        let all = weekdays_in_month(year, month, self.weekday);
        let picked: BTreeSet<NaiveDate> = self
            .ordinals
            .iter()
            .filter_map(|ordinal| ordinal.select(&all))
            .collect();
        picked.into_iter().collect()
    }

    /// Every matching date on or after the first day of `from`'s month, ascending.
    /// The sequence is unbounded; call again to restart it.
    pub fn occurrences_from(&self, from: NaiveDate) -> MeetingOccurrences<'_> {
        MeetingOccurrences {
            rule: self,
            year: from.year(),
            month: from.month(),
            months_left: None,
            pending: Vec::new(),
        }
    }
}

impl fmt::Display for RecurringMeetingRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ordinals = self
            .ordinals
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" and ");
        write!(f, "{} {} of each month", ordinals, self.weekday)
    }
}

/// Lazy month-by-month walk over a rule's matching dates.
#[derive(Debug, Clone)]
pub struct MeetingOccurrences<'a> {
    rule: &'a RecurringMeetingRule,
    year: i32,
    month: u32,
    months_left: Option<u32>,
    // Current month's dates in reverse so `pop` yields ascending order.
    pending: Vec<NaiveDate>,
}

impl MeetingOccurrences<'_> {
    /// Stop after `months` calendar months, counting the starting month.
    pub fn within_months(mut self, months: u32) -> Self {
        self.months_left = Some(months);
        self
    }

    fn advance_month(&mut self) {
        if self.month == 12 {
            self.month = 1;
            self.year += 1;
        } else {
            self.month += 1;
        }
    }

    /// Pull the next month's dates into `pending`; false once the date range runs out.
    fn fill(&mut self) -> bool {
        if self.months_left == Some(0)
            || NaiveDate::from_ymd_opt(self.year, self.month, 1).is_none()
        {
            return false;
        }
        if let Some(left) = self.months_left.as_mut() {
            *left -= 1;
        }
        let mut dates = self.rule.occurrences_in_month(self.year, self.month);
        dates.reverse();
        self.pending = dates;
        self.advance_month();
        true
    }
}

impl Iterator for MeetingOccurrences<'_> {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        loop {
            if let Some(date) = self.pending.pop() {
                return Some(date);
            }
            if !self.fill() {
                return None;
            }
        }
    }
}

/// The earliest date strictly after `after` that matches `rule`, looking at most
/// [`MAX_SCAN_MONTHS`] months ahead.
pub fn next_occurrence(
    after: NaiveDate,
    rule: &RecurringMeetingRule,
) -> Result<NaiveDate, MeetingError> {
    rule.occurrences_from(after)
        .within_months(MAX_SCAN_MONTHS)
        .find(|date| *date > after)
        .ok_or(MeetingError::NoOccurrenceFound {
            after,
            horizon_months: MAX_SCAN_MONTHS,
        })
}

/// All dates of `weekday` in the month, ascending.
pub fn weekdays_in_month(year: i32, month: u32, weekday: Weekday) -> Vec<NaiveDate> {
    (1..=5)
        .map_while(|n| NaiveDate::from_weekday_of_month_opt(year, month, weekday, n))
        .collect()
}

/// A curated list of upcoming meeting dates, kept sorted and unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<NaiveDate>", into = "Vec<NaiveDate>")]
pub struct KnownMeetingDates {
    dates: Vec<NaiveDate>,
}

impl KnownMeetingDates {
    pub fn new<I>(dates: I) -> Result<Self, MeetingError>
    where
        I: IntoIterator<Item = NaiveDate>,
    {
        let mut dates: Vec<NaiveDate> = dates.into_iter().collect();
        dates.sort();
        dates.dedup();
        if dates.len() > MAX_KNOWN_MEETINGS {
            return Err(MeetingError::TooManyMeetingDates {
                max: MAX_KNOWN_MEETINGS,
                got: dates.len(),
            });
        }
        Ok(Self { dates })
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Earliest listed date strictly after `after`; `None` once the list is exhausted.
    pub fn first_after(&self, after: NaiveDate) -> Option<NaiveDate> {
        self.dates.iter().copied().find(|date| *date > after)
    }
}

impl TryFrom<Vec<NaiveDate>> for KnownMeetingDates {
    type Error = MeetingError;

    fn try_from(dates: Vec<NaiveDate>) -> Result<Self, Self::Error> {
        Self::new(dates)
    }
}

impl From<KnownMeetingDates> for Vec<NaiveDate> {
    fn from(known: KnownMeetingDates) -> Self {
        known.dates
    }
}

/// Where the approval meeting date comes from.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MeetingSource {
    /// No meeting data; the approval date is left for manual entry.
    #[default]
    None,
    RuleBased { rule: RecurringMeetingRule },
    ExplicitDates { dates: KnownMeetingDates },
}

/// Outcome of looking for a meeting after a given date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeetingLookup {
    Found(NaiveDate),
    NotFound,
    NoSource,
}

impl MeetingSource {
    pub fn lookup_after(&self, after: NaiveDate) -> MeetingLookup {
        match self {
            MeetingSource::None => MeetingLookup::NoSource,
            MeetingSource::RuleBased { rule } => match next_occurrence(after, rule) {
                Ok(date) => MeetingLookup::Found(date),
                Err(err) => {
                    log::warn!("{err}");
                    MeetingLookup::NotFound
                }
            },
            MeetingSource::ExplicitDates { dates } => match dates.first_after(after) {
                Some(date) => MeetingLookup::Found(date),
                None => {
                    log::warn!("no listed meeting falls after {after}");
                    MeetingLookup::NotFound
                }
            },
        }
    }
}
