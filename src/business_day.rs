//! Working-day arithmetic over a [`WorkCalendar`].

use crate::calendar::WorkCalendar;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A date landed on by [`next_working_day`], and whether it had to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingDay {
    pub date: NaiveDate,
    pub adjusted: bool,
}

/// Stepping forward from `from` ran past the last representable date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("no working day is representable after {from}")]
pub struct DateOutOfRange {
    pub from: NaiveDate,
}

pub fn is_working_day(date: NaiveDate, calendar: &WorkCalendar) -> bool {
    calendar.is_available(date)
}

/// Return `date` when it is a working day, otherwise the first working day after it.
pub fn next_working_day(
    date: NaiveDate,
    calendar: &WorkCalendar,
) -> Result<WorkingDay, DateOutOfRange> {
    let mut current = date;
    let mut adjusted = false;
    while !is_working_day(current, calendar) {
        current = current.succ_opt().ok_or(DateOutOfRange { from: date })?;
        adjusted = true;
    }
    if adjusted {
        log::debug!("{date} is not a working day; moved to {current}");
    }
    Ok(WorkingDay {
        date: current,
        adjusted,
    })
}

/// Count forward `n` working days from `start`, returning the day the count is reached.
///
/// `start` itself is never counted and never normalized, so `n == 0` hands back
/// `start` even when it is not a working day.
pub fn add_working_days(
    start: NaiveDate,
    n: u32,
    calendar: &WorkCalendar,
) -> Result<NaiveDate, DateOutOfRange> {
    let mut current = start;
    let mut count = 0;

    while count < n {
        current = current.succ_opt().ok_or(DateOutOfRange { from: start })?;
        if is_working_day(current, calendar) {
            count += 1;
        }
    }
    Ok(current)
}
