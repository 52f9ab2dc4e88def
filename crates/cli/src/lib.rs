pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

use commands::related::RelatedArgs;
use commands::search::SearchArgs;

#[derive(Debug, Parser)]
#[command(
    name = "foodie",
    about = "Foodie catalog operator CLI",
    long_about = "Operate the Foodie catalog: migrations, seed data, product search, related-item recommendations and readiness checks.",
    after_help = "Examples:\n  foodie seed\n  foodie search --category Burgers --dietary vegetarian\n  foodie related garden-burger --limit 4\n  foodie doctor --json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Apply migrations, then load and verify the deterministic seed catalog")]
    Seed,
    #[command(about = "Search the catalog by category, dietary tags, price and text")]
    Search(SearchArgs),
    #[command(about = "Recommend items related to a catalog product")]
    Related(RelatedArgs),
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Validate config, DB connectivity and catalog readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Search(args) => commands::search::run(args),
        Command::Related(args) => commands::related::run(args),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => commands::doctor::run(json),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
