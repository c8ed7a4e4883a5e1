use bdays::HolidayCalendar;
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::ops::RangeInclusive;

/// Raised by a [`HolidayProvider`] when it has no holiday rules for a year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("holiday calendar unavailable for year {year}")]
pub struct CalendarUnavailable {
    pub year: i32,
}

pub type HolidayResult = Result<HashSet<NaiveDate>, CalendarUnavailable>;

/// Source of public holidays, one year at a time.
///
/// Implementations must be deterministic for a given year. Weekday rules are not
/// the provider's concern; see [`crate::WorkCalendar`].
pub trait HolidayProvider: Send + Sync {
    fn holidays_for_year(&self, year: i32) -> HolidayResult;
}

impl<P: HolidayProvider + ?Sized> HolidayProvider for &P {
    fn holidays_for_year(&self, year: i32) -> HolidayResult {
        (**self).holidays_for_year(year)
    }
}

impl<P: HolidayProvider + ?Sized> HolidayProvider for Box<P> {
    fn holidays_for_year(&self, year: i32) -> HolidayResult {
        (**self).holidays_for_year(year)
    }
}

/// Weekend-only calendars.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHolidays;

impl HolidayProvider for NoHolidays {
    fn holidays_for_year(&self, _year: i32) -> HolidayResult {
        Ok(HashSet::new())
    }
}

/// US federal holidays computed from their statutory rules, including the
/// Friday/Monday observed days for fixed-date holidays on a weekend.
#[derive(Debug, Clone, Copy, Default)]
pub struct UsFederalHolidays;

impl UsFederalHolidays {
    pub const SUPPORTED_YEARS: RangeInclusive<i32> = 1971..=2099;

    fn fixed(holidays: &mut HashSet<NaiveDate>, year: i32, month: u32, day: u32) {
        let Some(date) = NaiveDate::from_ymd_opt(year, month, day) else {
            return;
        };
        holidays.insert(date);
        match date.weekday() {
            Weekday::Sat => {
                let observed = date - Duration::days(1);
                // New Year's Day on a Saturday is observed on Dec 31 of the prior year.
                if observed.year() == year {
                    holidays.insert(observed);
                }
            }
            Weekday::Sun => {
                holidays.insert(date + Duration::days(1));
            }
            _ => {}
        }
    }
}

impl HolidayProvider for UsFederalHolidays {
    fn holidays_for_year(&self, year: i32) -> HolidayResult {
        if !Self::SUPPORTED_YEARS.contains(&year) {
            return Err(CalendarUnavailable { year });
        }

        let mut holidays = HashSet::new();

        // New Year's Day
        Self::fixed(&mut holidays, year, 1, 1);
        // Next year's New Year's Day observed on Dec 31
        if let Some(next) = NaiveDate::from_ymd_opt(year + 1, 1, 1) {
            if next.weekday() == Weekday::Sat {
                holidays.insert(next - Duration::days(1));
            }
        }

        // Martin Luther King Jr. Day (3rd Monday in January)
        if year >= 1986 {
            holidays.extend(nth_weekday(year, 1, Weekday::Mon, 3));
        }

        // Washington's Birthday (3rd Monday in February)
        holidays.extend(nth_weekday(year, 2, Weekday::Mon, 3));

        // Memorial Day (last Monday in May)
        holidays.extend(last_weekday(year, 5, Weekday::Mon));

        // Juneteenth
        if year >= 2021 {
            Self::fixed(&mut holidays, year, 6, 19);
        }

        // Independence Day
        Self::fixed(&mut holidays, year, 7, 4);

        // Labor Day (1st Monday in September)
        holidays.extend(nth_weekday(year, 9, Weekday::Mon, 1));

        // Columbus Day (2nd Monday in October)
        holidays.extend(nth_weekday(year, 10, Weekday::Mon, 2));

        // Veterans Day
        Self::fixed(&mut holidays, year, 11, 11);

        // Thanksgiving (4th Thursday in November)
        holidays.extend(nth_weekday(year, 11, Weekday::Thu, 4));

        // Christmas
        Self::fixed(&mut holidays, year, 12, 25);

        Ok(holidays)
    }
}

/// US settlement holidays as published by the `bdays` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct SettlementHolidays;

impl HolidayProvider for SettlementHolidays {
    fn holidays_for_year(&self, year: i32) -> HolidayResult {
        let start = NaiveDate::from_ymd_opt(year, 1, 1).ok_or(CalendarUnavailable { year })?;
        let calendar = bdays::calendars::us::USSettlement;
        Ok(start
            .iter_days()
            .take_while(|date| date.year() == year)
            .filter(|date| calendar.is_holiday(*date))
            .collect())
    }
}

/// An explicit holiday list, authoritative for a fixed range of years.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HolidayTable {
    years: RangeInclusive<i32>,
    dates: HashSet<NaiveDate>,
}

impl HolidayTable {
    pub fn new<I>(years: RangeInclusive<i32>, dates: I) -> Self
    where
        I: IntoIterator<Item = NaiveDate>,
    {
        Self {
            years,
            dates: dates.into_iter().collect(),
        }
    }
}

impl HolidayProvider for HolidayTable {
    fn holidays_for_year(&self, year: i32) -> HolidayResult {
        if !self.years.contains(&year) {
            return Err(CalendarUnavailable { year });
        }
        Ok(self
            .dates
            .iter()
            .copied()
            .filter(|date| date.year() == year)
            .collect())
    }
}

/// Caches a provider's answer per year so repeated and concurrent schedule
/// computations only look each year up once.
#[derive(Debug, Default)]
pub struct MemoizedHolidays<P> {
    inner: P,
    cache: Mutex<HashMap<i32, HolidayResult>>,
}

impl<P: HolidayProvider> MemoizedHolidays<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn cached_years(&self) -> usize {
        self.cache.lock().len()
    }
}

impl<P: HolidayProvider> HolidayProvider for MemoizedHolidays<P> {
    fn holidays_for_year(&self, year: i32) -> HolidayResult {
        if let Some(hit) = self.cache.lock().get(&year) {
            return hit.clone();
        }
        let result = self.inner.holidays_for_year(year);
        self.cache.lock().insert(year, result.clone());
        result
    }
}

/// Find the nth (1-based) occurrence of a weekday in a month.
pub(crate) fn nth_weekday(year: i32, month: u32, weekday: Weekday, n: u8) -> Option<NaiveDate> {
    NaiveDate::from_weekday_of_month_opt(year, month, weekday, n)
}

/// Find the last occurrence of a weekday in a month.
pub(crate) fn last_weekday(year: i32, month: u32, weekday: Weekday) -> Option<NaiveDate> {
    let first_of_next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    let mut date = first_of_next - Duration::days(1);
    while date.weekday() != weekday {
        date = date - Duration::days(1);
    }
    Some(date)
}
