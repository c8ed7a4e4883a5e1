use chrono::{NaiveDate, Weekday};
use rfp_schedule::plan::{COUNCIL_APPROVAL, QUESTIONS_DUE};
use rfp_schedule::{
    AnchorPolicy, ConfigError, HolidaySource, MeetingSource, MilestoneDate, PlanError,
    PlanVariant, PlannerConfig, ProposalWindow, load_config, save_config,
};
use std::io::Write;
use tempfile::NamedTempFile;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

#[test]
fn empty_config_uses_defaults() {
    let config = PlannerConfig::from_json("{}").unwrap();
    assert_eq!(config, PlannerConfig::default());
    assert_eq!(config.plan, PlanVariant::Fixed);
    assert_eq!(config.anchor_policy, AnchorPolicy::Reject);
    assert_eq!(config.holidays, HolidaySource::UsFederal);
    assert_eq!(config.meetings, MeetingSource::None);
    assert_eq!(
        config.working_days,
        vec![Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu]
    );
}

#[test]
fn full_config_drives_the_planner() {
    let json = r#"{
        "plan": { "kind": "parametrized", "window": 16 },
        "meetings": {
            "kind": "rule_based",
            "rule": { "weekday": "Mon", "ordinals": [{ "nth": 2 }, { "nth": 4 }] }
        },
        "anchor_policy": "normalize",
        "holidays": { "kind": "table", "first_year": 2025, "last_year": 2026, "dates": ["2025-03-10"] }
    }"#;
    let config = PlannerConfig::from_json(json).unwrap();
    assert_eq!(
        config.plan,
        PlanVariant::parametrized(ProposalWindow::Standard)
    );

    let planner = config.planner().unwrap();
    let schedule = planner
        .plan(d(2025, 3, 3), config.holiday_provider().as_ref())
        .unwrap();
    // Tue 4, Wed 5, Thu 6, (Mon 10 is a holiday), Tue 11
    assert_eq!(schedule.date_of(QUESTIONS_DUE), Some(d(2025, 3, 11)));
    assert!(matches!(
        schedule.get(COUNCIL_APPROVAL).unwrap().date,
        MilestoneDate::Resolved(_)
    ));
}

#[test]
fn invalid_window_and_rules_are_rejected() {
    let bad_window = r#"{ "plan": { "kind": "parametrized", "window": 10 } }"#;
    assert!(matches!(
        PlannerConfig::from_json(bad_window),
        Err(ConfigError::Json(_))
    ));

    let bad_rule = r#"{ "meetings": { "kind": "rule_based",
        "rule": { "weekday": "Mon", "ordinals": [{ "nth": 0 }] } } }"#;
    assert!(matches!(
        PlannerConfig::from_json(bad_rule),
        Err(ConfigError::Json(_))
    ));

    let no_days = r#"{ "working_days": [] }"#;
    assert!(matches!(
        PlannerConfig::from_json(no_days),
        Err(ConfigError::Plan(PlanError::Calendar(_)))
    ));

    let far_future = r#"{ "milestones": [
        { "name": "Posted", "rule": { "kind": "working_days", "days": 0 } },
        { "name": "Late", "rule": { "kind": "calendar_days", "days": 999999999999 } }
    ] }"#;
    assert!(matches!(
        PlannerConfig::from_json(far_future),
        Err(ConfigError::Plan(PlanError::OffsetOutOfRange { .. }))
    ));

    let dangling = r#"{ "milestones": [
        { "name": "Approval", "rule": { "kind": "next_meeting", "after": "Nowhere" } }
    ] }"#;
    assert!(matches!(
        PlannerConfig::from_json(dangling),
        Err(ConfigError::Plan(PlanError::UnknownMilestone { .. }))
    ));
}

#[test]
fn config_round_trips_through_a_file() {
    let mut config = PlannerConfig::default();
    config.plan = PlanVariant::parametrized(ProposalWindow::Short);
    config.holidays = HolidaySource::Settlement;
    config.meetings = MeetingSource::ExplicitDates {
        dates: rfp_schedule::KnownMeetingDates::new([d(2025, 4, 14), d(2025, 4, 28)]).unwrap(),
    };

    let file = NamedTempFile::new().unwrap();
    save_config(&config, file.path()).unwrap();
    let loaded = load_config(file.path()).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn loading_reports_io_and_parse_errors() {
    assert!(matches!(
        load_config("/nonexistent/rfp-schedule.json"),
        Err(ConfigError::Io(_))
    ));

    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{{ not json").unwrap();
    assert!(matches!(load_config(file.path()), Err(ConfigError::Json(_))));
}
