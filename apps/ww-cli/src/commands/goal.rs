// goal.rs — Goal subcommands: toggle, monthly, deadline, one-off.

use chrono::{Local, NaiveDate};
use clap::Subcommand;
use ww_calendar::{current_week, WeekId};
use ww_goal::{CascadeKind, GoalSession, MilestoneSource, SeriesRequest, WeekStore};

use super::CliSession;

#[derive(Subcommand)]
pub enum GoalCommands {
    /// Flip a goal's completion, cascading to related weeks.
    Toggle {
        /// Goal instance ID.
        id: String,
        /// Week holding the goal; defaults to the current week.
        #[arg(long)]
        week: Option<WeekId>,
    },
    /// Create a monthly goal covering 4 weeks per month.
    Monthly {
        /// Goal title.
        title: String,
        /// Number of months to cover.
        #[arg(long)]
        months: u32,
        /// First week; defaults to the current week.
        #[arg(long)]
        start_week: Option<WeekId>,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Create a goal that repeats weekly until a due date.
    Deadline {
        /// Goal title.
        title: String,
        /// Due date (YYYY-MM-DD).
        #[arg(long)]
        due: NaiveDate,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Add a standalone goal to one week.
    OneOff {
        /// Goal title.
        title: String,
        /// Target week; defaults to the current week.
        #[arg(long)]
        week: Option<WeekId>,
        #[arg(long, default_value = "")]
        description: String,
    },
}

pub fn execute(cmd: &GoalCommands, session: &mut CliSession) -> anyhow::Result<()> {
    match cmd {
        GoalCommands::Toggle { id, week } => {
            toggle(session, id, week.unwrap_or_else(current_week))
        }
        GoalCommands::Monthly {
            title,
            months,
            start_week,
            description,
        } => {
            let mut request =
                SeriesRequest::monthly(title.as_str(), *months, start_week.unwrap_or_else(current_week));
            request.description = description.clone();
            create_series(session, request)
        }
        GoalCommands::Deadline {
            title,
            due,
            description,
        } => {
            let mut request = SeriesRequest::deadline(title.as_str(), *due, Local::now().date_naive());
            request.description = description.clone();
            create_series(session, request)
        }
        GoalCommands::OneOff {
            title,
            week,
            description,
        } => one_off(session, title, description, week.unwrap_or_else(current_week)),
    }
}

fn toggle<S: WeekStore, M: MilestoneSource>(
    session: &mut GoalSession<S, M>,
    id: &str,
    week: WeekId,
) -> anyhow::Result<()> {
    let outcome = session.toggle_goal_completion(id, week)?;
    let state = if outcome.completed { "complete" } else { "incomplete" };
    match outcome.cascade {
        CascadeKind::Single => println!("{} in {} marked {}.", outcome.goal_id, week, state),
        CascadeKind::Monthly { month } => println!(
            "{} marked {} for {} ({} week(s) updated).",
            outcome.goal_id,
            state,
            month,
            outcome.weeks_written.len()
        ),
        CascadeKind::DeadlinePrune => println!(
            "{} marked {}; {} later instance(s) removed.",
            outcome.goal_id,
            state,
            outcome.pruned_ids.len()
        ),
    }
    Ok(())
}

fn create_series<S: WeekStore, M: MilestoneSource>(
    session: &mut GoalSession<S, M>,
    request: SeriesRequest,
) -> anyhow::Result<()> {
    let title = request.title.clone();
    let goals = session.create_monthly_or_deadline_instances(request)?;
    match (goals.first(), goals.last()) {
        (Some(first), Some(last)) => println!(
            "Created \"{}\": {} instance(s), {} to {}.",
            title,
            goals.len(),
            first.week,
            last.week
        ),
        _ => println!("Created \"{}\": no new instances.", title),
    }
    Ok(())
}

fn one_off<S: WeekStore, M: MilestoneSource>(
    session: &mut GoalSession<S, M>,
    title: &str,
    description: &str,
    week: WeekId,
) -> anyhow::Result<()> {
    let goal = session.create_one_off(week, title, description)?;
    println!("Added {} to {}.", goal.id, week);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support;
    use tempfile::TempDir;

    #[test]
    fn monthly_goal_toggle_completes_the_month() {
        let dir = TempDir::new().unwrap();
        let mut session = test_support::session(&dir);
        let start: WeekId = "2025-W10".parse().unwrap();

        create_series(&mut session, SeriesRequest::monthly("Budget", 1, start)).unwrap();
        let id = session.load_week_goals_if_needed(start).unwrap()[0].id.clone();
        toggle(&mut session, &id, start).unwrap();

        let w13 = session.load_week_goals_if_needed(start.offset(3)).unwrap();
        assert!(w13[0].completed);

        let events = std::fs::read_to_string(dir.path().join("events.jsonl")).unwrap();
        assert!(events.contains("series_created"));
        assert!(events.contains("completion_toggled"));
    }

    #[test]
    fn one_off_rejects_blank_titles() {
        let dir = TempDir::new().unwrap();
        let mut session = test_support::session(&dir);
        let week: WeekId = "2025-W10".parse().unwrap();
        assert!(one_off(&mut session, " ", "", week).is_err());
        one_off(&mut session, "Call the bank", "", week).unwrap();
        assert_eq!(session.load_week_goals_if_needed(week).unwrap().len(), 1);
    }
}
