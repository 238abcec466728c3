mod commands;
mod input;
mod output;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::amortization::{PaymentArgs, ScheduleArgs};
use commands::comps::CompsArgs;
use commands::evaluation::EvaluateArgs;

/// Rental property deal evaluation
#[derive(Parser)]
#[command(
    name = "reval",
    version,
    about = "Rental property deal evaluation",
    long_about = "Evaluate fix-and-refinance rental deals with decimal precision: \
                  refinance debt service, cash flow, equity capture, return on equity \
                  capture, cash-on-cash return, loan amortisation, and comparable sales."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a deal: cash flow, equity capture and returns
    Evaluate(EvaluateArgs),
    /// Monthly payment on a fixed-rate loan
    Payment(PaymentArgs),
    /// Month-by-month amortisation schedule
    Schedule(ScheduleArgs),
    /// Filter comparable sales and derive an after-repair value
    Comps(CompsArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Evaluate(args) => commands::evaluation::run_evaluate(args),
        Commands::Payment(args) => commands::amortization::run_payment(args),
        Commands::Schedule(args) => commands::amortization::run_schedule(args),
        Commands::Comps(args) => commands::comps::run_comps(args),
        Commands::Version => {
            println!("reval {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            tracing::debug!(error = %e, "command failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
