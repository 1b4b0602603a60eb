pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "querymcp",
    about = "querymcp operator CLI",
    long_about = "Operate the querymcp dispatch service: readiness, migrations, config inspection, smoke validation and ad-hoc requests.",
    after_help = "Examples:\n  querymcp doctor --json\n  querymcp config\n  querymcp smoke\n  querymcp ask \"show margin by region\" --dialect mysql"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Run startup preflight checks and return structured status output")]
    Start,
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Run end-to-end readiness checks with per-check timing details")]
    Smoke,
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Validate config, handler registry, and DB connectivity checks")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Turn a free-text question into a request and send it to a running server")]
    Ask {
        #[arg(help = "Free-text question, e.g. \"show margin by region\"")]
        text: String,
        #[arg(long, default_value = "druid", help = "SQL dialect for query requests")]
        dialect: String,
        #[arg(long, help = "Endpoint to post to (defaults to the configured server address)")]
        endpoint: Option<String>,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Start => commands::start::run(),
        Command::Migrate => commands::migrate::run(),
        Command::Smoke => commands::smoke::run(),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
        Command::Ask { text, dialect, endpoint } => {
            commands::ask::run(&text, &dialect, endpoint.as_deref())
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
