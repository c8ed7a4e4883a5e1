use crate::calendar::WorkCalendar;
use crate::holidays::{HolidayProvider, HolidayTable, NoHolidays, SettlementHolidays, UsFederalHolidays};
use crate::meeting::MeetingSource;
use crate::milestone::MilestoneSpec;
use crate::plan::PlanVariant;
use crate::planner::{AnchorPolicy, PlanError, Planner};
use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid configuration: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Plan(#[from] PlanError),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Which holiday rules the calendar uses.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HolidaySource {
    #[default]
    UsFederal,
    Settlement,
    /// Weekday rule only.
    None,
    Table {
        first_year: i32,
        last_year: i32,
        dates: Vec<NaiveDate>,
    },
}

impl HolidaySource {
    pub fn provider(&self) -> Box<dyn HolidayProvider> {
        match self {
            HolidaySource::UsFederal => Box::new(UsFederalHolidays),
            HolidaySource::Settlement => Box::new(SettlementHolidays),
            HolidaySource::None => Box::new(NoHolidays),
            HolidaySource::Table {
                first_year,
                last_year,
                dates,
            } => Box::new(HolidayTable::new(
                *first_year..=*last_year,
                dates.iter().copied(),
            )),
        }
    }
}

fn default_working_days() -> Vec<Weekday> {
    WorkCalendar::DEFAULT_WORKING_DAYS.to_vec()
}

/// Everything a schedule computation needs besides the posting date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannerConfig {
    #[serde(default)]
    pub plan: PlanVariant,
    /// Replaces the plan's milestones when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub milestones: Option<Vec<MilestoneSpec>>,
    #[serde(default)]
    pub meetings: MeetingSource,
    #[serde(default)]
    pub anchor_policy: AnchorPolicy,
    #[serde(default)]
    pub holidays: HolidaySource,
    #[serde(default = "default_working_days")]
    pub working_days: Vec<Weekday>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            plan: PlanVariant::default(),
            milestones: None,
            meetings: MeetingSource::default(),
            anchor_policy: AnchorPolicy::default(),
            holidays: HolidaySource::default(),
            working_days: default_working_days(),
        }
    }
}

impl PlannerConfig {
    pub fn planner(&self) -> Result<Planner, PlanError> {
        let planner = match &self.milestones {
            Some(specs) => Planner::with_milestones(specs.clone())?,
            None => Planner::new(self.plan),
        };
        planner
            .meetings(self.meetings.clone())
            .anchor_policy(self.anchor_policy)
            .working_days(self.working_days.iter().copied())
    }

    pub fn holiday_provider(&self) -> Box<dyn HolidayProvider> {
        self.holidays.provider()
    }

    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.planner()?;
        Ok(config)
    }

    pub fn to_json(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Read and validate a configuration file.
pub fn load_config<P: AsRef<Path>>(path: P) -> ConfigResult<PlannerConfig> {
    let file = File::open(path)?;
    let config: PlannerConfig = serde_json::from_reader(file)?;
    config.planner()?;
    Ok(config)
}

pub fn save_config<P: AsRef<Path>>(config: &PlannerConfig, path: P) -> ConfigResult<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, config)?;
    Ok(())
}
