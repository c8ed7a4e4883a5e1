//! The canonical RFP milestone plans.

use crate::milestone::MilestoneSpec;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const RFP_POSTED: &str = "RFP Posted on Town Website";
pub const QUESTIONS_DUE: &str = "Questions Due to the Town";
pub const RESPONSES_POSTED: &str = "Responses to Questions Posted";
pub const PROPOSALS_DUE: &str = "Proposal Packages Due to the Town";
pub const PROPOSALS_OPENED: &str = "Proposal Packages Opened and Evaluated";
pub const AWARD_NOTICE: &str = "Notice to Award Contract Posted on Town Website";
pub const CONTRACT_NEGOTIATED: &str = "Contract Negotiated with the Town";
pub const COUNCIL_APPROVAL: &str = "Town Council Approval of Contract";

/// Working days between posting and proposals due in the parametrized plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum ProposalWindow {
    Short,
    Standard,
}

impl ProposalWindow {
    pub fn working_days(self) -> u32 {
        match self {
            ProposalWindow::Short => 8,
            ProposalWindow::Standard => 16,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("proposal window must be 8 or 16 working days (got {0})")]
pub struct InvalidProposalWindow(pub u32);

impl TryFrom<u32> for ProposalWindow {
    type Error = InvalidProposalWindow;

    fn try_from(days: u32) -> Result<Self, Self::Error> {
        match days {
            8 => Ok(ProposalWindow::Short),
            16 => Ok(ProposalWindow::Standard),
            other => Err(InvalidProposalWindow(other)),
        }
    }
}

impl From<ProposalWindow> for u32 {
    fn from(window: ProposalWindow) -> Self {
        window.working_days()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlanVariant {
    /// Calendar-day offsets from posting, spanning 23 days.
    #[default]
    Fixed,
    /// Working-day offsets keyed off the proposal window.
    Parametrized { window: ProposalWindow },
}

impl PlanVariant {
    pub const FIXED_OFFSETS: [(&'static str, i64); 7] = [
        (RFP_POSTED, 0),
        (QUESTIONS_DUE, 7),
        (RESPONSES_POSTED, 9),
        (PROPOSALS_DUE, 16),
        (PROPOSALS_OPENED, 16),
        (AWARD_NOTICE, 20),
        (CONTRACT_NEGOTIATED, 23),
    ];

    pub fn parametrized(window: ProposalWindow) -> Self {
        PlanVariant::Parametrized { window }
    }

    /// Milestone rules for this plan, ending with council approval at the next
    /// meeting after negotiation.
    pub fn milestones(self) -> Vec<MilestoneSpec> {
        let mut specs = match self {
            PlanVariant::Fixed => Self::FIXED_OFFSETS
                .iter()
                .map(|(name, days)| MilestoneSpec::calendar_days(*name, *days))
                .collect::<Vec<_>>(),
            PlanVariant::Parametrized { window } => vec![
                MilestoneSpec::working_days(RFP_POSTED, 0),
                MilestoneSpec::working_days(QUESTIONS_DUE, 4),
                MilestoneSpec::working_days(RESPONSES_POSTED, 6),
                MilestoneSpec::working_days(PROPOSALS_DUE, window.working_days()),
                MilestoneSpec::after(PROPOSALS_OPENED, PROPOSALS_DUE, 0),
                MilestoneSpec::after(AWARD_NOTICE, PROPOSALS_DUE, 2),
                MilestoneSpec::after(CONTRACT_NEGOTIATED, PROPOSALS_DUE, 5),
            ],
        };
        specs.push(MilestoneSpec::next_meeting(
            COUNCIL_APPROVAL,
            CONTRACT_NEGOTIATED,
        ));
        specs
    }
}

impl fmt::Display for PlanVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanVariant::Fixed => write!(f, "fixed 23-day plan"),
            PlanVariant::Parametrized { window } => {
                write!(f, "{}-working-day plan", window.working_days())
            }
        }
    }
}
