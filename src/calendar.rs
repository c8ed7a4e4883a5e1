use crate::holidays::HolidayProvider;
use chrono::{Datelike, NaiveDate, Weekday};
use std::collections::{BTreeSet, HashSet};
use std::ops::RangeInclusive;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CalendarError {
    #[error("work calendar requires at least one working day")]
    NoWorkingDays,
}

/// Working weekdays plus the public holidays of every year loaded so far.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkCalendar {
    holidays: HashSet<NaiveDate>,
    non_working_days: HashSet<Weekday>,
    loaded_years: BTreeSet<i32>,
    unavailable_years: BTreeSet<i32>,
}

impl Default for WorkCalendar {
    fn default() -> Self {
        Self {
            holidays: HashSet::new(),
            non_working_days: Self::DEFAULT_NON_WORKING_DAYS.into_iter().collect(),
            loaded_years: BTreeSet::new(),
            unavailable_years: BTreeSet::new(),
        }
    }
}

impl WorkCalendar {
    const ALL_WEEKDAYS: [Weekday; 7] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ];

    /// Town offices work a four-day week; Friday is closed along with the weekend.
    pub const DEFAULT_WORKING_DAYS: [Weekday; 4] =
        [Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu];

    const DEFAULT_NON_WORKING_DAYS: [Weekday; 3] = [Weekday::Fri, Weekday::Sat, Weekday::Sun];

    /// Default work week with holidays from `provider` for every year in `years`.
    pub fn for_years<P>(provider: &P, years: RangeInclusive<i32>) -> Self
    where
        P: HolidayProvider + ?Sized,
    {
        let mut calendar = Self::default();
        calendar.load_years(provider, years);
        calendar
    }

    /// Replace the working weekdays (e.g. Mon-Fri for a five-day week).
    pub fn set_working_days<I>(&mut self, days: I) -> Result<(), CalendarError>
    where
        I: IntoIterator<Item = Weekday>,
    {
        let working: HashSet<Weekday> = days.into_iter().collect();
        if working.is_empty() {
            return Err(CalendarError::NoWorkingDays);
        }
        self.non_working_days = Self::ALL_WEEKDAYS
            .into_iter()
            .filter(|day| !working.contains(day))
            .collect();
        Ok(())
    }

    /// Load holidays for each year in the range that is not loaded yet.
    pub fn load_years<P>(&mut self, provider: &P, years: RangeInclusive<i32>)
    where
        P: HolidayProvider + ?Sized,
    {
        for year in years {
            self.ensure_year(provider, year);
        }
    }

    /// Load one year's holidays unless already loaded. A year the provider cannot
    /// answer for is remembered as unavailable and contributes no holidays, leaving
    /// only the weekday rule in force. Returns whether holidays are known for `year`.
    pub fn ensure_year<P>(&mut self, provider: &P, year: i32) -> bool
    where
        P: HolidayProvider + ?Sized,
    {
        if !self.loaded_years.insert(year) {
            return !self.unavailable_years.contains(&year);
        }
        match provider.holidays_for_year(year) {
            Ok(holidays) => {
                log::debug!("loaded {} holidays for {year}", holidays.len());
                self.holidays.extend(holidays);
                true
            }
            Err(err) => {
                log::warn!("{err}; falling back to weekday-only skipping");
                self.unavailable_years.insert(year);
                false
            }
        }
    }

    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holidays.contains(&date)
    }

    pub fn is_working_weekday(&self, weekday: Weekday) -> bool {
        !self.non_working_days.contains(&weekday)
    }

    /// True when `date` falls on a working weekday and is not a holiday.
    pub fn is_available(&self, date: NaiveDate) -> bool {
        self.is_working_weekday(date.weekday()) && !self.is_holiday(date)
    }

    pub fn loaded_years(&self) -> impl Iterator<Item = i32> + '_ {
        self.loaded_years.iter().copied()
    }

    /// Years whose holidays could not be obtained, in ascending order.
    pub fn unavailable_years(&self) -> Vec<i32> {
        self.unavailable_years.iter().copied().collect()
    }
}
