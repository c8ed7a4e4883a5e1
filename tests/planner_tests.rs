use chrono::{Duration, NaiveDate, Weekday};
use proptest::prelude::*;
use rfp_schedule::plan::{
    AWARD_NOTICE, CONTRACT_NEGOTIATED, COUNCIL_APPROVAL, PROPOSALS_DUE, PROPOSALS_OPENED,
    QUESTIONS_DUE, RESPONSES_POSTED, RFP_POSTED,
};
use rfp_schedule::planner::{AnchorRejection, MAX_OFFSET_DAYS};
use rfp_schedule::{
    AnchorPolicy, HolidayTable, KnownMeetingDates, MeetingSource, MemoizedHolidays, MilestoneDate,
    MilestoneSpec, NoHolidays, PlanError, PlanVariant, Planner, ProposalWindow,
    RecurringMeetingRule, UsFederalHolidays,
};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn council_rule() -> MeetingSource {
    MeetingSource::RuleBased {
        rule: RecurringMeetingRule::nth(Weekday::Mon, [2, 4]).unwrap(),
    }
}

#[test]
fn fixed_plan_on_a_quiet_monday() {
    let schedule = Planner::new(PlanVariant::Fixed)
        .plan(d(2025, 3, 3), &NoHolidays)
        .unwrap();

    let expected = [
        (RFP_POSTED, d(2025, 3, 3), false),
        (QUESTIONS_DUE, d(2025, 3, 10), false),
        (RESPONSES_POSTED, d(2025, 3, 12), false),
        (PROPOSALS_DUE, d(2025, 3, 19), false),
        (PROPOSALS_OPENED, d(2025, 3, 19), false),
        // +20 is Sunday the 23rd
        (AWARD_NOTICE, d(2025, 3, 24), true),
        (CONTRACT_NEGOTIATED, d(2025, 3, 26), false),
    ];
    for (name, date, adjusted) in expected {
        let milestone = schedule.get(name).unwrap();
        assert_eq!(milestone.date, MilestoneDate::Resolved(date), "{name}");
        assert_eq!(milestone.was_adjusted, adjusted, "{name}");
    }

    let approval = schedule.get(COUNCIL_APPROVAL).unwrap();
    assert_eq!(approval.date, MilestoneDate::PendingManualEntry);
    assert!(!approval.was_adjusted);
    assert_eq!(schedule.len(), 8);
    assert!(!schedule.is_fully_resolved());
}

#[test]
fn fixed_plan_compounds_holidays_and_finds_council_meeting() {
    let planner = Planner::new(PlanVariant::Fixed).meetings(council_rule());
    let schedule = planner.plan(d(2025, 11, 4), &UsFederalHolidays).unwrap();

    // +7 lands on Veterans Day, +23 on Thanksgiving.
    assert_eq!(schedule.date_of(QUESTIONS_DUE), Some(d(2025, 11, 12)));
    assert!(schedule.get(QUESTIONS_DUE).unwrap().was_adjusted);
    assert_eq!(schedule.date_of(CONTRACT_NEGOTIATED), Some(d(2025, 12, 1)));
    assert!(schedule.get(CONTRACT_NEGOTIATED).unwrap().was_adjusted);

    // 2nd Monday of December 2025
    let approval = schedule.get(COUNCIL_APPROVAL).unwrap();
    assert_eq!(approval.date, MilestoneDate::Resolved(d(2025, 12, 8)));
    assert!(!approval.was_adjusted);
    assert!(schedule.is_fully_resolved());
}

#[test]
fn council_meeting_on_a_holiday_moves_forward() {
    let planner = Planner::new(PlanVariant::Fixed).meetings(MeetingSource::RuleBased {
        rule: RecurringMeetingRule::nth(Weekday::Mon, [2]).unwrap(),
    });
    let schedule = planner.plan(d(2025, 9, 15), &UsFederalHolidays).unwrap();

    assert_eq!(schedule.date_of(CONTRACT_NEGOTIATED), Some(d(2025, 10, 8)));
    // The 2nd Monday of October 2025 is Columbus Day.
    let approval = schedule.get(COUNCIL_APPROVAL).unwrap();
    assert_eq!(approval.date, MilestoneDate::Resolved(d(2025, 10, 14)));
    assert!(approval.was_adjusted);
}

#[test]
fn eight_day_window_counts_working_days_around_a_holiday() {
    let planner = Planner::new(PlanVariant::parametrized(ProposalWindow::Short));
    let schedule = planner.plan(d(2025, 1, 13), &UsFederalHolidays).unwrap();

    // Mon-Thu only, skipping MLK Day on the 20th.
    assert_eq!(schedule.date_of(RFP_POSTED), Some(d(2025, 1, 13)));
    assert_eq!(schedule.date_of(QUESTIONS_DUE), Some(d(2025, 1, 21)));
    assert_eq!(schedule.date_of(RESPONSES_POSTED), Some(d(2025, 1, 23)));
    assert_eq!(schedule.date_of(PROPOSALS_DUE), Some(d(2025, 1, 28)));
    assert_eq!(schedule.date_of(PROPOSALS_OPENED), Some(d(2025, 1, 28)));
    assert_eq!(schedule.date_of(AWARD_NOTICE), Some(d(2025, 1, 30)));
    assert_eq!(schedule.date_of(CONTRACT_NEGOTIATED), Some(d(2025, 2, 5)));
    assert_eq!(schedule.adjusted_count(), 0);
}

#[test]
fn eight_day_window_crosses_into_the_new_year() {
    let planner = Planner::new(PlanVariant::parametrized(ProposalWindow::Short));
    let schedule = planner.plan(d(2025, 12, 22), &UsFederalHolidays).unwrap();
    // Christmas and New Year's Day are both Thursdays.
    assert_eq!(schedule.date_of(PROPOSALS_DUE), Some(d(2026, 1, 7)));
}

#[test]
fn sixteen_day_window_crosses_into_the_new_year() {
    let planner = Planner::new(PlanVariant::parametrized(ProposalWindow::Standard));
    let schedule = planner.plan(d(2025, 12, 22), &UsFederalHolidays).unwrap();
    // Eight more Mon-Thu days after Jan 7, with MLK Day on the 19th.
    assert_eq!(schedule.date_of(PROPOSALS_DUE), Some(d(2026, 1, 22)));
}

#[test]
fn posting_at_the_end_of_the_calendar_is_an_error() {
    let planner = Planner::new(PlanVariant::Fixed).anchor_policy(AnchorPolicy::Normalize);
    let result = planner.plan(NaiveDate::MAX - Duration::days(10), &NoHolidays);
    assert!(matches!(result, Err(PlanError::DateOutOfRange(_))));
}

#[test]
fn oversized_offsets_are_rejected() {
    let specs = vec![
        MilestoneSpec::working_days(RFP_POSTED, 0),
        MilestoneSpec::calendar_days("Late", 999_999_999_999),
    ];
    assert_eq!(
        Planner::with_milestones(specs),
        Err(PlanError::OffsetOutOfRange {
            milestone: "Late".into(),
            days: 999_999_999_999,
            max: MAX_OFFSET_DAYS,
        })
    );

    let specs = vec![
        MilestoneSpec::working_days(RFP_POSTED, 0),
        MilestoneSpec::after("Due", RFP_POSTED, u32::MAX),
    ];
    assert!(matches!(
        Planner::with_milestones(specs),
        Err(PlanError::OffsetOutOfRange { .. })
    ));

    let specs = vec![
        MilestoneSpec::working_days(RFP_POSTED, 0),
        MilestoneSpec::calendar_days("Year out", -3650),
    ];
    assert!(Planner::with_milestones(specs).is_ok());
}

#[test]
fn exhausted_meeting_list_leaves_other_milestones_resolved() {
    let planner = Planner::new(PlanVariant::Fixed).meetings(MeetingSource::ExplicitDates {
        dates: KnownMeetingDates::new([d(2025, 3, 10), d(2025, 3, 24)]).unwrap(),
    });
    let schedule = planner.plan(d(2025, 3, 3), &NoHolidays).unwrap();

    assert_eq!(
        schedule.get(COUNCIL_APPROVAL).unwrap().date,
        MilestoneDate::Unresolved
    );
    let resolved = schedule.iter().filter(|m| m.date.is_resolved()).count();
    assert_eq!(resolved, 7);
}

#[test]
fn explicit_meeting_after_negotiation_is_used() {
    let planner = Planner::new(PlanVariant::Fixed).meetings(MeetingSource::ExplicitDates {
        dates: KnownMeetingDates::new([d(2025, 3, 24), d(2025, 4, 4), d(2025, 4, 14)]).unwrap(),
    });
    let schedule = planner.plan(d(2025, 3, 3), &NoHolidays).unwrap();
    // April 4th is a Friday, so the meeting is recorded on Monday the 7th.
    let approval = schedule.get(COUNCIL_APPROVAL).unwrap();
    assert_eq!(approval.date, MilestoneDate::Resolved(d(2025, 4, 7)));
    assert!(approval.was_adjusted);
}

#[test]
fn reject_policy_refuses_non_working_posting_dates() {
    let planner = Planner::new(PlanVariant::Fixed);
    assert_eq!(
        planner.plan(d(2025, 1, 10), &UsFederalHolidays),
        Err(PlanError::InvalidAnchor {
            date: d(2025, 1, 10),
            reason: AnchorRejection::NonWorkingWeekday(Weekday::Fri),
        })
    );
    assert_eq!(
        planner.plan(d(2025, 1, 20), &UsFederalHolidays),
        Err(PlanError::InvalidAnchor {
            date: d(2025, 1, 20),
            reason: AnchorRejection::Holiday,
        })
    );
}

#[test]
fn normalize_policy_counts_from_the_next_working_day() {
    let planner = Planner::new(PlanVariant::Fixed).anchor_policy(AnchorPolicy::Normalize);
    let schedule = planner.plan(d(2025, 1, 10), &UsFederalHolidays).unwrap();

    assert_eq!(schedule.anchor, d(2025, 1, 13));
    let posted = schedule.get(RFP_POSTED).unwrap();
    assert_eq!(posted.date, MilestoneDate::Resolved(d(2025, 1, 13)));
    assert!(posted.was_adjusted);
    // +7 from the normalized anchor is MLK Day, which rolls to Tuesday.
    assert_eq!(schedule.date_of(QUESTIONS_DUE), Some(d(2025, 1, 21)));
}

#[test]
fn missing_holiday_years_degrade_to_weekday_rule() {
    let table = HolidayTable::new(2025..=2025, [d(2025, 3, 10)]);
    let schedule = Planner::new(PlanVariant::Fixed)
        .plan(d(2025, 3, 3), &table)
        .unwrap();
    assert_eq!(schedule.date_of(QUESTIONS_DUE), Some(d(2025, 3, 11)));
    assert_eq!(schedule.unavailable_holiday_years, vec![2026]);

    let schedule = Planner::new(PlanVariant::Fixed)
        .plan(d(2150, 6, 3), &UsFederalHolidays)
        .unwrap();
    assert_eq!(schedule.unavailable_holiday_years, vec![2150, 2151]);
    assert_eq!(schedule.date_of(RFP_POSTED), Some(d(2150, 6, 3)));
}

#[test]
fn five_day_week_keeps_fridays() {
    let planner = Planner::new(PlanVariant::Fixed)
        .working_days([
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
        ])
        .unwrap();
    // Anchor Friday 2025-03-07: +7 is the next Friday.
    let schedule = planner.plan(d(2025, 3, 7), &NoHolidays).unwrap();
    assert_eq!(schedule.date_of(QUESTIONS_DUE), Some(d(2025, 3, 14)));
    assert!(!schedule.get(QUESTIONS_DUE).unwrap().was_adjusted);
}

#[test]
fn custom_milestones_resolve_in_dependency_order() {
    let planner = Planner::with_milestones(vec![
        MilestoneSpec::next_meeting("Approval", "Negotiated"),
        MilestoneSpec::after("Negotiated", "Due", 3),
        MilestoneSpec::working_days("Posted", 0),
        MilestoneSpec::working_days("Due", 4),
    ])
    .unwrap()
    .meetings(council_rule());

    let schedule = planner.plan(d(2025, 3, 3), &NoHolidays).unwrap();
    let names: Vec<&str> = schedule.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["Posted", "Due", "Negotiated", "Approval"]);
    // Due: Mon 3/10; Negotiated: Tue 3/11, Wed 3/12, Thu 3/13; Approval: 4th Monday.
    assert_eq!(schedule.date_of("Due"), Some(d(2025, 3, 10)));
    assert_eq!(schedule.date_of("Negotiated"), Some(d(2025, 3, 13)));
    assert_eq!(schedule.date_of("Approval"), Some(d(2025, 3, 24)));
}

#[test]
fn batch_planning_matches_individual_runs() {
    let planner = Planner::new(PlanVariant::parametrized(ProposalWindow::Standard))
        .meetings(council_rule());
    let holidays = MemoizedHolidays::new(UsFederalHolidays);
    let anchors: Vec<NaiveDate> = (0..30).map(|n| d(2025, 1, 6) + Duration::days(n)).collect();

    let batch = planner.plan_many(&anchors, &holidays);
    assert_eq!(batch.len(), anchors.len());
    for (anchor, result) in anchors.iter().zip(batch) {
        assert_eq!(result, planner.plan(*anchor, &UsFederalHolidays));
    }
    assert!(holidays.cached_years() >= 2);
}

proptest! {
    #[test]
    fn fixed_plan_dates_never_go_backwards(offset in 0i64..20000) {
        let anchor = d(1975, 1, 1) + Duration::days(offset);
        let planner = Planner::new(PlanVariant::Fixed)
            .anchor_policy(AnchorPolicy::Normalize)
            .meetings(council_rule());
        let schedule = planner.plan(anchor, &UsFederalHolidays).unwrap();

        let dates: Vec<NaiveDate> = schedule.iter().filter_map(|m| m.date.resolved()).collect();
        prop_assert_eq!(dates.len(), schedule.len());
        for pair in dates.windows(2) {
            prop_assert!(pair[0] <= pair[1]);
        }
        let negotiated = schedule.date_of(CONTRACT_NEGOTIATED).unwrap();
        let approval = schedule.date_of(COUNCIL_APPROVAL).unwrap();
        prop_assert!(approval > negotiated);
    }
}
