use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A milestone's date, or why there is none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "date", rename_all = "snake_case")]
pub enum MilestoneDate {
    Resolved(NaiveDate),
    /// A lookup ran and found nothing; the date must be verified by hand.
    Unresolved,
    /// No source was configured; the date is to be entered by hand.
    PendingManualEntry,
}

impl MilestoneDate {
    pub fn resolved(&self) -> Option<NaiveDate> {
        match self {
            MilestoneDate::Resolved(date) => Some(*date),
            MilestoneDate::Unresolved | MilestoneDate::PendingManualEntry => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, MilestoneDate::Resolved(_))
    }
}

impl fmt::Display for MilestoneDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MilestoneDate::Resolved(date) => write!(f, "{}", date.format("%B %d, %Y")),
            MilestoneDate::Unresolved => write!(f, "Manually verify"),
            MilestoneDate::PendingManualEntry => write!(f, "To be entered"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneResult {
    pub name: String,
    pub date: MilestoneDate,
    /// True when the raw date fell on a non-working day and moved forward.
    pub was_adjusted: bool,
}

/// The resolved timeline, in dependency order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub anchor: NaiveDate,
    pub milestones: Vec<MilestoneResult>,
    /// Years computed with weekday-only skipping because holidays were unavailable.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unavailable_holiday_years: Vec<i32>,
}

impl Schedule {
    pub fn get(&self, name: &str) -> Option<&MilestoneResult> {
        self.milestones.iter().find(|m| m.name == name)
    }

    pub fn date_of(&self, name: &str) -> Option<NaiveDate> {
        self.get(name).and_then(|m| m.date.resolved())
    }

    pub fn iter(&self) -> impl Iterator<Item = &MilestoneResult> {
        self.milestones.iter()
    }

    pub fn len(&self) -> usize {
        self.milestones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.milestones.is_empty()
    }

    /// True when every milestone has a concrete date.
    pub fn is_fully_resolved(&self) -> bool {
        self.milestones.iter().all(|m| m.date.is_resolved())
    }

    pub fn adjusted_count(&self) -> usize {
        self.milestones.iter().filter(|m| m.was_adjusted).count()
    }

    pub fn latest_resolved(&self) -> Option<NaiveDate> {
        self.milestones
            .iter()
            .filter_map(|m| m.date.resolved())
            .max()
    }

    /// One-line summary for logs and the CLI.
    pub fn to_cli_summary(&self) -> String {
        let mut parts = Vec::new();
        parts.push(format!("posted={}", self.anchor));
        parts.push(format!("milestones={}", self.milestones.len()));
        let adjusted = self.adjusted_count();
        if adjusted > 0 {
            parts.push(format!("adjusted={adjusted}"));
        }
        if let Some(date) = self.latest_resolved() {
            parts.push(format!("last={date}"));
        }
        let open = self
            .milestones
            .iter()
            .filter(|m| !m.date.is_resolved())
            .count();
        if open > 0 {
            parts.push(format!("open={open}"));
        }
        if !self.unavailable_holiday_years.is_empty() {
            let years = self
                .unavailable_holiday_years
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(",");
            parts.push(format!("no_holidays={years}"));
        }
        parts.join(", ")
    }
}

impl<'a> IntoIterator for &'a Schedule {
    type Item = &'a MilestoneResult;
    type IntoIter = std::slice::Iter<'a, MilestoneResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.milestones.iter()
    }
}
