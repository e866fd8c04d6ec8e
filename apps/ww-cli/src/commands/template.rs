// template.rs — Template subcommands: add, list, disable, enable.

use chrono::{Local, NaiveDate};
use clap::{Subcommand, ValueEnum};
use ww_goal::{DurationType, GoalSession, GoalTemplate, MilestoneSource, Recurrence, WeekStore};

use super::{truncate, CliSession};

/// How long a template keeps producing instances.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum DurationArg {
    Unlimited,
    Weeks,
    Milestone,
}

#[derive(Subcommand)]
pub enum TemplateCommands {
    /// Register a recurring goal template.
    Add {
        /// Template title.
        title: String,
        /// Monthly recurrence; expands `--months` months of weeks immediately.
        #[arg(long, requires = "months")]
        monthly: bool,
        /// Months to cover, for `--monthly`.
        #[arg(long)]
        months: Option<u32>,
        #[arg(long, value_enum, default_value_t = DurationArg::Unlimited)]
        duration: DurationArg,
        /// Number of weeks, for `--duration weeks`.
        #[arg(long)]
        weeks: Option<u32>,
        /// Milestone ID, for `--duration milestone`.
        #[arg(long)]
        milestone: Option<String>,
        /// First day the template applies (YYYY-MM-DD); defaults to today.
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// List the user's templates.
    List,
    /// Stop a template from producing new instances.
    Disable {
        /// Template ID.
        id: String,
    },
    /// Re-enable a disabled template.
    Enable {
        /// Template ID.
        id: String,
    },
}

pub fn execute(cmd: &TemplateCommands, session: &mut CliSession) -> anyhow::Result<()> {
    match cmd {
        TemplateCommands::Add {
            title,
            monthly,
            months,
            duration,
            weeks,
            milestone,
            start,
            description,
        } => {
            let recurrence = if *monthly {
                Recurrence::Monthly
            } else {
                Recurrence::Weekly
            };
            let start = start.unwrap_or_else(|| Local::now().date_naive());
            let mut template =
                build_template(title, recurrence, start, *duration, *weeks, milestone.as_deref())?;
            if let Some(n) = months {
                template = template.for_months(*n);
            }
            template.description = description.clone();
            add_template(session, template)
        }
        TemplateCommands::List => list_templates(session),
        TemplateCommands::Disable { id } => set_active(session, id, false),
        TemplateCommands::Enable { id } => set_active(session, id, true),
    }
}

fn build_template(
    title: &str,
    recurrence: Recurrence,
    start: NaiveDate,
    duration: DurationArg,
    weeks: Option<u32>,
    milestone: Option<&str>,
) -> anyhow::Result<GoalTemplate> {
    let template = GoalTemplate::new(title, recurrence, start);
    match duration {
        DurationArg::Unlimited => Ok(template),
        DurationArg::Weeks => match weeks {
            Some(n) => Ok(template.for_weeks(n)),
            None => anyhow::bail!("--duration weeks requires --weeks N"),
        },
        DurationArg::Milestone => match milestone {
            Some(id) => Ok(template.until_milestone(id)),
            None => anyhow::bail!("--duration milestone requires --milestone ID"),
        },
    }
}

fn add_template<S: WeekStore, M: MilestoneSource>(
    session: &mut GoalSession<S, M>,
    template: GoalTemplate,
) -> anyhow::Result<()> {
    let t = session.create_weekly_template(template)?;
    match t.recurrence {
        Recurrence::Weekly => {
            println!("Created template {} ({}), starting {}.", t.id, t.title, t.start_week())
        }
        Recurrence::Monthly => println!(
            "Created monthly goal {} ({}): {} month(s) from {}.",
            t.id,
            t.title,
            t.target_months.unwrap_or_default(),
            t.start_week()
        ),
    }
    Ok(())
}

fn list_templates<S: WeekStore, M: MilestoneSource>(
    session: &GoalSession<S, M>,
) -> anyhow::Result<()> {
    let templates = session.templates()?;
    if templates.is_empty() {
        println!("No templates found.");
        return Ok(());
    }

    println!(
        "{:<38} {:<30} {:<10} {:<14} {:<6}",
        "ID", "TITLE", "RECURS", "DURATION", "ACTIVE"
    );
    println!("{}", "-".repeat(102));
    for t in &templates {
        let duration = match (t.duration_type, t.duration_weeks, t.milestone_id.as_deref()) {
            (DurationType::Weeks, Some(n), _) => format!("{} weeks", n),
            (DurationType::Milestone, _, Some(id)) => format!("until {}", truncate(id, 8)),
            (other, _, _) => other.to_string(),
        };
        println!(
            "{:<38} {:<30} {:<10} {:<14} {:<6}",
            t.id,
            truncate(&t.title, 28),
            t.recurrence.to_string(),
            duration,
            if t.active { "yes" } else { "no" },
        );
    }
    println!("\n{} template(s) total.", templates.len());
    Ok(())
}

fn set_active<S: WeekStore, M: MilestoneSource>(
    session: &mut GoalSession<S, M>,
    id: &str,
    active: bool,
) -> anyhow::Result<()> {
    let t = session.set_template_active(id, active)?;
    println!(
        "Template {} {}.",
        t.id,
        if t.active { "enabled" } else { "disabled" }
    );
    Ok(())
}
