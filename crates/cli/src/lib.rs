pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

use commands::estimate::EstimateArgs;
use commands::probability::ProbabilityArgs;
use commands::reliability::ReliabilityArgs;

#[derive(Debug, Parser)]
#[command(
    name = "markwise",
    about = "Markwise operator CLI",
    long_about = "Operate the markwise estimators: migrations, demo fixtures, readiness checks, and markup/probability/reliability estimates.",
    after_help = "Examples:\n  markwise doctor --json\n  markwise estimate --customer 10042 --product 4711 --quantity 12\n  markwise probability --customer 10042 --product 4711 --markup 22.5"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the deterministic demo offer dataset and verify its contract")]
    Seed,
    #[command(about = "Suggest a markup with probability, factors, and reliability")]
    Estimate(EstimateArgs),
    #[command(about = "Score the acceptance probability of an explicit markup proposal")]
    Probability(ProbabilityArgs),
    #[command(about = "Score how much confidence an estimate for a pair deserves")]
    Reliability(ReliabilityArgs),
    #[command(about = "Validate config and DB connectivity checks")]
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
        Command::Estimate(args) => commands::estimate::run(args),
        Command::Probability(args) => commands::probability::run(args),
        Command::Reliability(args) => commands::reliability::run(args),
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
