// week.rs — Week subcommands: show, kpis, bulk.

use clap::Subcommand;
use ww_calendar::{current_week, WeekId};
use ww_goal::{GoalSession, MilestoneSource, WeekStore};

use super::{truncate, CliSession};

#[derive(Subcommand)]
pub enum WeekCommands {
    /// List the goals of a week, materializing it on first visit.
    Show {
        /// ISO week (e.g., "2025-W10"); defaults to the current week.
        #[arg(long)]
        week: Option<WeekId>,
    },
    /// Show completion figures for a week.
    Kpis {
        /// ISO week; defaults to the current week.
        #[arg(long)]
        week: Option<WeekId>,
    },
    /// Materialize every week of an ISO year from the current templates.
    Bulk {
        /// ISO year (e.g., 2025).
        #[arg(long)]
        year: i32,
    },
}

pub fn execute(cmd: &WeekCommands, session: &mut CliSession) -> anyhow::Result<()> {
    match cmd {
        WeekCommands::Show { week } => show_week(session, week.unwrap_or_else(current_week)),
        WeekCommands::Kpis { week } => show_kpis(session, week.unwrap_or_else(current_week)),
        WeekCommands::Bulk { year } => bulk(session, *year),
    }
}

fn show_week<S: WeekStore, M: MilestoneSource>(
    session: &mut GoalSession<S, M>,
    week: WeekId,
) -> anyhow::Result<()> {
    let range = week.range();
    let goals = session.load_week_goals_if_needed(week)?;

    println!("Week {} ({} – {})", week, range.start, range.end);
    if goals.is_empty() {
        println!("No goals this week.");
        return Ok(());
    }

    println!("{:<48} {:<30} {:<10} {:<4}", "ID", "TITLE", "KIND", "DONE");
    println!("{}", "-".repeat(95));
    for g in goals {
        println!(
            "{:<48} {:<30} {:<10} {:<4}",
            truncate(&g.id, 48),
            truncate(&g.title, 28),
            g.kind.label(),
            if g.completed { "x" } else { "" },
        );
    }
    println!("\n{} goal(s) total.", goals.len());
    Ok(())
}

fn show_kpis<S: WeekStore, M: MilestoneSource>(
    session: &mut GoalSession<S, M>,
    week: WeekId,
) -> anyhow::Result<()> {
    let kpis = session.week_kpis(week)?;
    println!("Week:        {}", week);
    println!("Goals:       {}", kpis.active_goals);
    println!("Completed:   {}", kpis.completed_goals);
    println!("Progress:    {}%", kpis.percent_completed);
    println!("Weeks used:  {} in {}", kpis.total_weeks_with_goals, week.year());
    Ok(())
}

fn bulk<S: WeekStore, M: MilestoneSource>(
    session: &mut GoalSession<S, M>,
    year: i32,
) -> anyhow::Result<()> {
    let report = session.bulk_instantiate(year)?;
    println!(
        "{}: {} week(s) created, {} already present, {} goal instance(s).",
        report.year, report.weeks_created, report.weeks_skipped, report.instances_created
    );
    Ok(())
}
