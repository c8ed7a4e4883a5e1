use serde::{Deserialize, Serialize};

/// How a milestone's raw (unadjusted) date is derived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MilestoneRule {
    /// Anchor plus a number of calendar days.
    CalendarDays { days: i64 },
    /// The n-th working day after the anchor.
    WorkingDays { days: u32 },
    /// The n-th working day after another milestone's resolved date.
    AfterMilestone { milestone: String, working_days: u32 },
    /// The next public meeting strictly after another milestone's resolved date.
    NextMeeting { after: String },
}

impl MilestoneRule {
    /// Name of the milestone this rule is measured from, if any.
    pub fn depends_on(&self) -> Option<&str> {
        match self {
            MilestoneRule::CalendarDays { .. } | MilestoneRule::WorkingDays { .. } => None,
            MilestoneRule::AfterMilestone { milestone, .. } => Some(milestone.as_str()),
            MilestoneRule::NextMeeting { after } => Some(after.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneSpec {
    pub name: String,
    pub rule: MilestoneRule,
}

impl MilestoneSpec {
    pub fn new(name: impl Into<String>, rule: MilestoneRule) -> Self {
        Self {
            name: name.into(),
            rule,
        }
    }

    pub fn calendar_days(name: impl Into<String>, days: i64) -> Self {
        Self::new(name, MilestoneRule::CalendarDays { days })
    }

    pub fn working_days(name: impl Into<String>, days: u32) -> Self {
        Self::new(name, MilestoneRule::WorkingDays { days })
    }

    pub fn after(name: impl Into<String>, milestone: impl Into<String>, working_days: u32) -> Self {
        Self::new(
            name,
            MilestoneRule::AfterMilestone {
                milestone: milestone.into(),
                working_days,
            },
        )
    }

    pub fn next_meeting(name: impl Into<String>, after: impl Into<String>) -> Self {
        Self::new(
            name,
            MilestoneRule::NextMeeting {
                after: after.into(),
            },
        )
    }
}
