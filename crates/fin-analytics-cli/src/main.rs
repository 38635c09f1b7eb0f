mod commands;
mod config;
mod input;
mod output;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use serde::Deserialize;
use std::path::PathBuf;
use std::process;

use commands::list::ListArgs;
use commands::run::RunArgs;
use config::CliConfig;

/// Financial analysis reports from the command line
#[derive(Parser)]
#[command(
    name = "fina",
    version,
    about = "Financial analysis reports from the command line",
    long_about = "Runs any analysis in the catalogue (fraud detection, ratios, cash flow, \
                  performance, portfolio risk and quantitative models) on JSON or YAML \
                  input and renders the report in English or Arabic."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (overrides the config file)
    #[arg(long, global = true)]
    output: Option<OutputFormat>,

    /// Report language: en or ar (overrides the config file)
    #[arg(long, global = true)]
    lang: Option<String>,

    /// YAML file supplying default language, output format and options
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log library events to stderr (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// List the analyses compiled into this build
    List(ListArgs),
    /// Run an analysis by name
    Run(RunArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, Copy, Default, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_logging(verbose: u8) {
    let fallback = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = if verbose > 0 {
        tracing_subscriber::EnvFilter::new(fallback)
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(fallback))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let settings = match CliConfig::load(cli.config.as_deref())
        .and_then(|cfg| cfg.resolve(cli.output, cli.lang.as_deref()))
    {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    };

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::List(args) => commands::list::run_list(args, &settings),
        Commands::Run(args) => commands::run::run_analysis(args, &settings),
        Commands::Version => {
            println!("fina {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&settings.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
