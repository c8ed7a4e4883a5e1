use chrono::{NaiveDate, Weekday};
use rfp_schedule::{
    AnchorPolicy, HolidaySource, KnownMeetingDates, MeetingOrdinal, MeetingSource,
    MemoizedHolidays, PlanVariant, PlannerConfig, ProposalWindow, RecurringMeetingRule, Schedule,
    load_config, save_config,
};
use std::io::{self, Write};

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

fn parse_date_list(s: &str) -> Result<Vec<NaiveDate>, String> {
    s.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| parse_date(p).ok_or_else(|| format!("Invalid date '{p}' (YYYY-MM-DD)")))
        .collect()
}

fn parse_ordinals(s: &str) -> Result<Vec<MeetingOrdinal>, String> {
    s.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| {
            if p.eq_ignore_ascii_case("last") {
                Ok(MeetingOrdinal::Last)
            } else {
                p.parse::<u8>()
                    .map(MeetingOrdinal::Nth)
                    .map_err(|_| format!("Invalid ordinal '{p}' (1-5 or last)"))
            }
        })
        .collect()
}

fn note_for(adjusted: bool) -> &'static str {
    if adjusted {
        "Adjusted for holidays and non-working days"
    } else {
        ""
    }
}

fn render_schedule_table(schedule: &Schedule) -> String {
    let headers = ["Event", "Date", "Note"];
    let rows: Vec<[String; 3]> = schedule
        .iter()
        .map(|m| {
            [
                m.name.clone(),
                m.date.to_string(),
                note_for(m.was_adjusted).to_string(),
            ]
        })
        .collect();

    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in &rows {
        for (ci, cell) in row.iter().enumerate() {
            widths[ci] = widths[ci].max(cell.len());
        }
    }

    let mut sep = String::from("+");
    for w in &widths {
        sep.push_str(&"-".repeat(*w + 2));
        sep.push('+');
    }

    let render_row = |cells: &[&str]| {
        let mut line = String::from("|");
        for (ci, cell) in cells.iter().enumerate() {
            line.push(' ');
            line.push_str(cell);
            line.push_str(&" ".repeat(widths[ci] - cell.len()));
            line.push_str(" |");
        }
        line
    };

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');
    out.push_str(&render_row(&headers[..]));
    out.push('\n');
    out.push_str(&sep);
    out.push('\n');
    for row in &rows {
        let cells: Vec<&str> = row.iter().map(String::as_str).collect();
        out.push_str(&render_row(&cells));
        out.push('\n');
    }
    out.push_str(&sep);
    out.push('\n');
    out
}

fn print_help() {
    println!(
        "Commands:\n  help                               Show this help\n  post <YYYY-MM-DD>                  Set the RFP posted date and compute\n  plan fixed|8|16                    Choose the 23-day plan or an 8/16 working-day window\n  meetings none                      Leave council approval for manual entry\n  meetings rule <weekday> <ordinals> Recurring meeting, e.g. 'meetings rule mon 2,4'\n  meetings dates <csv>               Known meeting dates (up to 4, YYYY-MM-DD)\n  policy reject|normalize            Reject or roll forward non-working posted dates\n  holidays us|settlement|none        Choose the holiday calendar\n  config show                        Show the current configuration as JSON\n  config load <json_path>            Load configuration from a JSON file\n  config save <json_path>            Save configuration to a JSON file\n  compute                            Recompute the schedule\n  show                               Show the last computed schedule\n  quit|exit                          Exit"
    );
}

fn compute(config: &PlannerConfig, posted: Option<NaiveDate>) -> Option<Schedule> {
    let Some(posted) = posted else {
        println!("Set the posted date first: post <YYYY-MM-DD>");
        return None;
    };
    let planner = match config.planner() {
        Ok(planner) => planner,
        Err(e) => {
            println!("Configuration error: {}", e);
            return None;
        }
    };
    let holidays = MemoizedHolidays::new(config.holiday_provider());
    match planner.plan(posted, &holidays) {
        Ok(schedule) => {
            println!("Schedule generated ({})", schedule.to_cli_summary());
            println!("{}", render_schedule_table(&schedule));
            if !schedule.is_fully_resolved() {
                println!("Some dates could not be determined; verify them manually.");
            }
            Some(schedule)
        }
        Err(e) => {
            println!("Error: {}", e);
            None
        }
    }
}

fn main() {
    env_logger::init();

    let mut config = PlannerConfig::default();
    let mut posted: Option<NaiveDate> = None;
    let mut last: Option<Schedule> = None;

    println!("RFP Schedule Generator (CLI) - type 'help' for commands\n");

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        line.clear();
        match stdin.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let mut parts = input.split_whitespace();
        let cmd = parts.next().unwrap_or("");

        match cmd {
            "help" => print_help(),
            "quit" | "exit" => break,
            "post" => match parts.next().map(parse_date) {
                Some(Some(date)) => {
                    posted = Some(date);
                    last = compute(&config, posted);
                }
                Some(None) => println!("Invalid date (YYYY-MM-DD)"),
                None => println!("Usage: post <YYYY-MM-DD>"),
            },
            "plan" => {
                let variant = match parts.next() {
                    Some("fixed") => Some(PlanVariant::Fixed),
                    Some(days) => match days.parse::<u32>().map(ProposalWindow::try_from) {
                        Ok(Ok(window)) => Some(PlanVariant::parametrized(window)),
                        Ok(Err(e)) => {
                            println!("{}", e);
                            None
                        }
                        Err(_) => {
                            println!("Usage: plan fixed|8|16");
                            None
                        }
                    },
                    None => {
                        println!("Usage: plan fixed|8|16");
                        None
                    }
                };
                if let Some(variant) = variant {
                    config.plan = variant;
                    config.milestones = None;
                    println!("Plan set to {}.", variant);
                }
            }
            "meetings" => match parts.next() {
                Some("none") => {
                    config.meetings = MeetingSource::None;
                    println!("Council approval left for manual entry.");
                }
                Some("rule") => {
                    let weekday = parts.next().map(str::parse::<Weekday>);
                    let ordinals = parts.next().map(parse_ordinals);
                    match (weekday, ordinals) {
                        (Some(Ok(weekday)), Some(Ok(ordinals))) => {
                            match RecurringMeetingRule::new(weekday, ordinals) {
                                Ok(rule) => {
                                    println!("Meetings on the {}.", rule);
                                    config.meetings = MeetingSource::RuleBased { rule };
                                }
                                Err(e) => println!("Error: {}", e),
                            }
                        }
                        (Some(Err(_)), _) => println!("Invalid weekday"),
                        (_, Some(Err(e))) => println!("{}", e),
                        _ => println!("Usage: meetings rule <weekday> <ordinals_csv>"),
                    }
                }
                Some("dates") => match parts.next().map(parse_date_list) {
                    Some(Ok(dates)) => match KnownMeetingDates::new(dates) {
                        Ok(dates) => {
                            println!("{} known meeting date(s) set.", dates.dates().len());
                            config.meetings = MeetingSource::ExplicitDates { dates };
                        }
                        Err(e) => println!("Error: {}", e),
                    },
                    Some(Err(e)) => println!("{}", e),
                    None => println!("Usage: meetings dates <csv>"),
                },
                _ => println!("Usage: meetings none|rule <weekday> <ordinals>|dates <csv>"),
            },
            "policy" => match parts.next() {
                Some("reject") => {
                    config.anchor_policy = AnchorPolicy::Reject;
                    println!("Posted dates on non-working days will be rejected.");
                }
                Some("normalize") => {
                    config.anchor_policy = AnchorPolicy::Normalize;
                    println!("Posted dates on non-working days will roll forward.");
                }
                _ => println!("Usage: policy reject|normalize"),
            },
            "holidays" => match parts.next() {
                Some("us") => {
                    config.holidays = HolidaySource::UsFederal;
                    println!("Using US federal holidays.");
                }
                Some("settlement") => {
                    config.holidays = HolidaySource::Settlement;
                    println!("Using US settlement holidays.");
                }
                Some("none") => {
                    config.holidays = HolidaySource::None;
                    println!("Holidays disabled; only the work week applies.");
                }
                _ => println!("Usage: holidays us|settlement|none"),
            },
            "config" => match parts.next() {
                Some("show") | None => match config.to_json() {
                    Ok(json) => println!("{}", json),
                    Err(e) => println!("Error serializing configuration: {}", e),
                },
                Some("load") => match parts.next() {
                    Some(path) => match load_config(path) {
                        Ok(loaded) => {
                            config = loaded;
                            println!("Configuration loaded from {}.", path);
                        }
                        Err(e) => println!("Error loading configuration: {}", e),
                    },
                    None => println!("Usage: config load <json_path>"),
                },
                Some("save") => match parts.next() {
                    Some(path) => match save_config(&config, path) {
                        Ok(_) => println!("Configuration saved to {}.", path),
                        Err(e) => println!("Error saving configuration: {}", e),
                    },
                    None => println!("Usage: config save <json_path>"),
                },
                Some(other) => {
                    println!("Unknown config command '{}'.", other);
                    println!("Usage: config show|load <json_path>|save <json_path>");
                }
            },
            "compute" => last = compute(&config, posted),
            "show" => match &last {
                Some(schedule) => println!("{}", render_schedule_table(schedule)),
                None => println!("No schedule computed yet."),
            },
            _ => println!("Unknown command. Type 'help'."),
        }
    }
}
