use clap::Parser;
use colored::Colorize;
use pginspect::{run, InspectConfig, DEFAULT_DATABASE_URL, DEFAULT_TABLES};
use std::io::{self, BufWriter, IsTerminal};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "pginspect")]
#[command(version, about = "Print RLS policies, indexes and triggers of Postgres tables as JSON lines")]
struct Cli {
    /// Connection string of the database to inspect. Only taken from this
    /// flag; `DATABASE_URL` is not read.
    #[arg(long, default_value = DEFAULT_DATABASE_URL)]
    database_url: String,

    /// Table to inspect (repeatable)
    #[arg(long = "table", value_name = "NAME", default_values_t = DEFAULT_TABLES.map(String::from))]
    tables: Vec<String>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // stdout carries the report
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if !io::stderr().is_terminal() {
        colored::control::set_override(false);
    }

    let config = InspectConfig::new(cli.database_url).with_tables(cli.tables);
    info!(tables = ?config.tables, "starting introspection");

    let stdout = io::stdout();
    match run(&config, BufWriter::new(stdout.lock())).await {
        Ok(report) => {
            info!(rows = report.total_rows(), "done");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "introspection failed");
            eprintln!("{} {}", "error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
