pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use pickwise_core::scoring::DEFAULT_TOP_N;

#[derive(Debug, Parser)]
#[command(
    name = "pickwise",
    about = "Pickwise operator CLI",
    long_about = "Inspect configuration, prepare the catalog database, and run catalog extraction \
                  and recommendation scoring from the command line.",
    after_help = "Examples:\n  pickwise doctor --json\n  pickwise seed\n  pickwise extract catalog.pdf --json\n  pickwise recommend --behavior behavior.json --top-n 5"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, database connectivity, schema, and LLM readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the demo catalog through the extraction pipeline (idempotent)")]
    Seed,
    #[command(about = "Extract and normalize products from a PDF or text catalog without storing them")]
    Extract {
        #[arg(help = "Path to a PDF or plain-text catalog")]
        file: PathBuf,
        #[arg(long, help = "Emit the normalized products as JSON")]
        json: bool,
    },
    #[command(about = "Rank the stored catalog against a behavior profile")]
    Recommend {
        #[arg(long, help = "Path to a JSON behavior profile")]
        behavior: PathBuf,
        #[arg(long, default_value_t = DEFAULT_TOP_N, help = "Number of products to return")]
        top_n: usize,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => commands::doctor::run(json),
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Extract { file, json } => commands::extract::run(&file, json),
        Command::Recommend { behavior, top_n } => commands::recommend::run(&behavior, top_n),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
