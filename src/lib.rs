pub mod business_day;
pub mod calendar;
pub mod config;
pub mod holidays;
#[cfg(feature = "http_api")]
pub mod http_api;
pub mod meeting;
pub mod milestone;
pub mod plan;
pub mod planner;
pub mod schedule;

pub use business_day::{WorkingDay, add_working_days, is_working_day, next_working_day};
pub use calendar::{CalendarError, WorkCalendar};
pub use config::{ConfigError, HolidaySource, PlannerConfig, load_config, save_config};
pub use holidays::{
    CalendarUnavailable, HolidayProvider, HolidayTable, MemoizedHolidays, NoHolidays,
    SettlementHolidays, UsFederalHolidays,
};
pub use meeting::{
    KnownMeetingDates, MeetingError, MeetingOrdinal, MeetingSource, RecurringMeetingRule,
    next_occurrence,
};
pub use milestone::{MilestoneRule, MilestoneSpec};
pub use plan::{PlanVariant, ProposalWindow};
pub use planner::{AnchorPolicy, PlanError, Planner};
pub use schedule::{MilestoneDate, MilestoneResult, Schedule};
