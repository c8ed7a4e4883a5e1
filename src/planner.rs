use crate::business_day::{DateOutOfRange, WorkingDay, add_working_days, next_working_day};
use crate::calendar::{CalendarError, WorkCalendar};
use crate::holidays::HolidayProvider;
use crate::meeting::{MeetingLookup, MeetingSource};
use crate::milestone::{MilestoneRule, MilestoneSpec};
use crate::plan::PlanVariant;
use crate::schedule::{MilestoneDate, MilestoneResult, Schedule};
use chrono::{Datelike, NaiveDate, TimeDelta, Weekday};
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::fmt;

/// What to do with a posting date that is not a working day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorPolicy {
    /// Refuse the posting date.
    #[default]
    Reject,
    /// Move the posting date to the next working day and count offsets from there.
    Normalize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorRejection {
    Holiday,
    NonWorkingWeekday(Weekday),
}

impl fmt::Display for AnchorRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnchorRejection::Holiday => write!(f, "it is a holiday"),
            AnchorRejection::NonWorkingWeekday(day) => write!(f, "{day} is not a working day"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    #[error("posting date {date} cannot anchor the schedule: {reason}")]
    InvalidAnchor {
        date: NaiveDate,
        reason: AnchorRejection,
    },
    #[error("milestone '{referenced_by}' refers to unknown milestone '{milestone}'")]
    UnknownMilestone {
        milestone: String,
        referenced_by: String,
    },
    #[error("milestone '{0}' is defined more than once")]
    DuplicateMilestone(String),
    #[error("milestones {0:?} depend on each other in a cycle")]
    DependencyCycle(Vec<String>),
    #[error("milestone '{milestone}' is offset {days} days; at most {max} are allowed")]
    OffsetOutOfRange {
        milestone: String,
        days: i64,
        max: i64,
    },
    #[error(transparent)]
    DateOutOfRange(#[from] DateOutOfRange),
    #[error(transparent)]
    Calendar(#[from] CalendarError),
}

pub type PlanResult<T> = Result<T, PlanError>;

/// Largest offset, in calendar or working days, a milestone may carry.
pub const MAX_OFFSET_DAYS: i64 = 3650;

/// Turns a posting date into a [`Schedule`].
///
/// A planner holds only configuration; every call to [`Planner::plan`] builds its own
/// calendar, so one planner can serve many computations at once.
#[derive(Debug, Clone, PartialEq)]
pub struct Planner {
    milestones: Vec<MilestoneSpec>,
    meetings: MeetingSource,
    anchor_policy: AnchorPolicy,
    working_days: Vec<Weekday>,
}

impl Default for Planner {
    fn default() -> Self {
        Self::new(PlanVariant::default())
    }
}

impl Planner {
    pub fn new(variant: PlanVariant) -> Self {
        Self {
            // Canonical plans list every milestone after the one it is measured from.
            milestones: variant.milestones(),
            meetings: MeetingSource::None,
            anchor_policy: AnchorPolicy::default(),
            working_days: WorkCalendar::DEFAULT_WORKING_DAYS.to_vec(),
        }
    }

    /// A planner for a custom milestone list, reordered so every milestone follows
    /// the one it depends on.
    pub fn with_milestones(milestones: Vec<MilestoneSpec>) -> PlanResult<Self> {
        for spec in &milestones {
            check_offset(spec)?;
        }
        let milestones = dependency_order(milestones)?;
        Ok(Self {
            milestones,
            ..Self::new(PlanVariant::default())
        })
    }

    pub fn meetings(mut self, meetings: MeetingSource) -> Self {
        self.meetings = meetings;
        self
    }

    pub fn anchor_policy(mut self, policy: AnchorPolicy) -> Self {
        self.anchor_policy = policy;
        self
    }

    pub fn working_days<I>(mut self, days: I) -> PlanResult<Self>
    where
        I: IntoIterator<Item = Weekday>,
    {
        let mut days: Vec<Weekday> = days.into_iter().collect();
        if days.is_empty() {
            return Err(CalendarError::NoWorkingDays.into());
        }
        days.sort_by_key(|wd| wd.num_days_from_monday());
        days.dedup();
        self.working_days = days;
        Ok(self)
    }

    pub fn plan<P>(&self, posting_date: NaiveDate, provider: &P) -> PlanResult<Schedule>
    where
        P: HolidayProvider + ?Sized,
    {
        let mut calendar = WorkCalendar::default();
        calendar.set_working_days(self.working_days.iter().copied())?;
        let mut ctx = PlanContext { calendar, provider };
        ctx.cover(posting_date, posting_date);

        let landing = ctx.next_working_day(posting_date)?;
        let anchor = if landing.adjusted {
            match self.anchor_policy {
                AnchorPolicy::Reject => {
                    let reason = if ctx.calendar.is_holiday(posting_date) {
                        AnchorRejection::Holiday
                    } else {
                        AnchorRejection::NonWorkingWeekday(posting_date.weekday())
                    };
                    return Err(PlanError::InvalidAnchor {
                        date: posting_date,
                        reason,
                    });
                }
                AnchorPolicy::Normalize => {
                    log::info!("posting date {posting_date} moved to {}", landing.date);
                    landing.date
                }
            }
        } else {
            posting_date
        };

        let mut resolved: HashMap<&str, MilestoneDate> = HashMap::new();
        let mut milestones = Vec::with_capacity(self.milestones.len());
        for spec in &self.milestones {
            let (date, was_adjusted) = match &spec.rule {
                MilestoneRule::CalendarDays { days } => {
                    let raw = TimeDelta::try_days(*days)
                        .and_then(|delta| anchor.checked_add_signed(delta))
                        .ok_or(DateOutOfRange { from: anchor })?;
                    let landed = ctx.next_working_day(raw)?;
                    let moved_anchor = landing.adjusted && raw == anchor;
                    (
                        MilestoneDate::Resolved(landed.date),
                        landed.adjusted || moved_anchor,
                    )
                }
                MilestoneRule::WorkingDays { days } => {
                    let raw = ctx.add_working_days(anchor, *days)?;
                    let landed = ctx.next_working_day(raw)?;
                    let moved_anchor = landing.adjusted && raw == anchor;
                    (
                        MilestoneDate::Resolved(landed.date),
                        landed.adjusted || moved_anchor,
                    )
                }
                MilestoneRule::AfterMilestone {
                    milestone,
                    working_days,
                } => match resolved.get(milestone.as_str()).and_then(|d| d.resolved()) {
                    Some(base) => {
                        let raw = ctx.add_working_days(base, *working_days)?;
                        let landed = ctx.next_working_day(raw)?;
                        (MilestoneDate::Resolved(landed.date), landed.adjusted)
                    }
                    None => (MilestoneDate::Unresolved, false),
                },
                MilestoneRule::NextMeeting { after } => {
                    match resolved.get(after.as_str()).and_then(|d| d.resolved()) {
                        Some(base) => ctx.meeting_after(&self.meetings, base)?,
                        None => (MilestoneDate::Unresolved, false),
                    }
                }
            };
            log::debug!("{}: {date} (adjusted: {was_adjusted})", spec.name);
            resolved.insert(spec.name.as_str(), date);
            milestones.push(MilestoneResult {
                name: spec.name.clone(),
                date,
                was_adjusted,
            });
        }

        let schedule = Schedule {
            anchor,
            milestones,
            unavailable_holiday_years: ctx.calendar.unavailable_years(),
        };
        log::info!("planned schedule ({})", schedule.to_cli_summary());
        Ok(schedule)
    }

    /// Plan independent schedules for several posting dates in parallel.
    pub fn plan_many<P>(&self, posting_dates: &[NaiveDate], provider: &P) -> Vec<PlanResult<Schedule>>
    where
        P: HolidayProvider + ?Sized,
    {
        posting_dates
            .par_iter()
            .map(|date| self.plan(*date, provider))
            .collect()
    }
}

/// Per-computation state: the calendar grows a year at a time as dates reach
/// years it has not loaded yet.
struct PlanContext<'p, P: ?Sized> {
    calendar: WorkCalendar,
    provider: &'p P,
}

impl<P: HolidayProvider + ?Sized> PlanContext<'_, P> {
    /// Load every year from `from` through `to` (plus the following year, which an
    /// adjustment may spill into). Returns whether anything new was loaded.
    fn cover(&mut self, from: NaiveDate, to: NaiveDate) -> bool {
        let before = self.calendar.loaded_years().count();
        self.calendar
            .load_years(self.provider, from.year()..=to.year() + 1);
        self.calendar.loaded_years().count() != before
    }

    fn next_working_day(&mut self, date: NaiveDate) -> Result<WorkingDay, DateOutOfRange> {
        loop {
            let landed = next_working_day(date, &self.calendar)?;
            if !self.cover(date, landed.date) {
                return Ok(landed);
            }
        }
    }

    fn add_working_days(&mut self, start: NaiveDate, n: u32) -> Result<NaiveDate, DateOutOfRange> {
        loop {
            let date = add_working_days(start, n, &self.calendar)?;
            if !self.cover(start, date) {
                return Ok(date);
            }
        }
    }

    fn meeting_after(
        &mut self,
        meetings: &MeetingSource,
        after: NaiveDate,
    ) -> Result<(MilestoneDate, bool), DateOutOfRange> {
        Ok(match meetings.lookup_after(after) {
            MeetingLookup::Found(meeting) => {
                let landed = self.next_working_day(meeting)?;
                (MilestoneDate::Resolved(landed.date), landed.adjusted)
            }
            MeetingLookup::NotFound => (MilestoneDate::Unresolved, false),
            MeetingLookup::NoSource => (MilestoneDate::PendingManualEntry, false),
        })
    }
}

fn check_offset(spec: &MilestoneSpec) -> PlanResult<()> {
    let days = match &spec.rule {
        MilestoneRule::CalendarDays { days } => *days,
        MilestoneRule::WorkingDays { days } => i64::from(*days),
        MilestoneRule::AfterMilestone { working_days, .. } => i64::from(*working_days),
        MilestoneRule::NextMeeting { .. } => 0,
    };
    if !(-MAX_OFFSET_DAYS..=MAX_OFFSET_DAYS).contains(&days) {
        return Err(PlanError::OffsetOutOfRange {
            milestone: spec.name.clone(),
            days,
            max: MAX_OFFSET_DAYS,
        });
    }
    Ok(())
}

/// Order milestones so each comes after the milestone it is measured from,
/// keeping the declared order wherever dependencies allow.
pub fn dependency_order(milestones: Vec<MilestoneSpec>) -> PlanResult<Vec<MilestoneSpec>> {
    let mut graph: DiGraph<usize, ()> = DiGraph::new();
    let mut name_to_index: HashMap<&str, NodeIndex> = HashMap::new();

    for (idx, spec) in milestones.iter().enumerate() {
        let node = graph.add_node(idx);
        if name_to_index.insert(spec.name.as_str(), node).is_some() {
            return Err(PlanError::DuplicateMilestone(spec.name.clone()));
        }
    }

    // Edges: dependency -> dependent
    for spec in &milestones {
        if let Some(dep) = spec.rule.depends_on() {
            let Some(&from) = name_to_index.get(dep) else {
                return Err(PlanError::UnknownMilestone {
                    milestone: dep.to_string(),
                    referenced_by: spec.name.clone(),
                });
            };
            graph.add_edge(from, name_to_index[spec.name.as_str()], ());
        }
    }

    let mut in_degree: Vec<usize> = graph
        .node_indices()
        .map(|node| graph.neighbors_directed(node, Direction::Incoming).count())
        .collect();
    let mut ready: BinaryHeap<Reverse<usize>> = in_degree
        .iter()
        .enumerate()
        .filter(|(_, degree)| **degree == 0)
        .map(|(idx, _)| Reverse(idx))
        .collect();

    let mut order = Vec::with_capacity(milestones.len());
    while let Some(Reverse(idx)) = ready.pop() {
        order.push(idx);
        for next in graph.neighbors_directed(NodeIndex::new(idx), Direction::Outgoing) {
            let next_idx = graph[next];
            in_degree[next_idx] -= 1;
            if in_degree[next_idx] == 0 {
                ready.push(Reverse(next_idx));
            }
        }
    }

    if order.len() != milestones.len() {
        let stuck = in_degree
            .iter()
            .enumerate()
            .filter(|(_, degree)| **degree > 0)
            .map(|(idx, _)| milestones[idx].name.clone())
            .collect();
        return Err(PlanError::DependencyCycle(stuck));
    }

    let mut slots: Vec<Option<MilestoneSpec>> = milestones.into_iter().map(Some).collect();
    Ok(order
        .into_iter()
        .filter_map(|idx| slots[idx].take())
        .collect())
}
