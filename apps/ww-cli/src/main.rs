//! # ww-cli
//!
//! Command-line interface for Weekwise goals.
//!
//! - `ww week show/kpis/bulk` — inspect and pre-materialize weeks
//! - `ww goal toggle/monthly/deadline/one-off` — create goals and track completion
//! - `ww template add/list/disable/enable` — manage recurring templates

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use ww_goal::config::{WeekwiseConfig, DEFAULT_CONFIG_PATH};

/// Weekwise — weekly goals with recurring templates.
#[derive(Parser)]
#[command(name = "ww", version, about)]
struct Cli {
    /// Path to the config file.
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Operate on this user instead of the configured one.
    #[arg(long)]
    user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show and materialize weeks.
    Week {
        #[command(subcommand)]
        command: commands::week::WeekCommands,
    },
    /// Create goals and toggle their completion.
    Goal {
        #[command(subcommand)]
        command: commands::goal::GoalCommands,
    },
    /// Manage recurring goal templates.
    Template {
        #[command(subcommand)]
        command: commands::template::TemplateCommands,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("ww_goal=info".parse()?)
                .add_directive("ww_cli=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let cli = Cli::parse();
    let mut config = WeekwiseConfig::load_or_default(&cli.config)?;
    if let Some(user) = cli.user {
        config.user_id = user;
    }
    tracing::debug!(
        "using data dir {} for user {}",
        config.data_dir.display(),
        config.user_id
    );

    let mut session = commands::open_session(&config)?;
    match &cli.command {
        Commands::Week { command } => commands::week::execute(command, &mut session),
        Commands::Goal { command } => commands::goal::execute(command, &mut session),
        Commands::Template { command } => commands::template::execute(command, &mut session),
    }
}
