mod commands;
mod config;
mod engine;
mod evaluator;
mod executor;
mod interp;
mod stdio;

#[cfg(test)]
mod engine_tests;

use anyhow::Result;
use bytebash_common::config::{EngineKind, HarnessConfig};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{debug, error};

#[derive(Parser)]
#[command(name = "bytebash")]
#[command(about = "ByteBash - Run a program against input/expected-output test cases", long_about = None)]
struct Cli {
    /// Harness config file (defaults to config/bytebash.json when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true, default_value = "false")]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the built-in example problems
    Examples,

    /// Run a program against its test cases
    Run {
        /// Built-in example name (case-insensitive substring is enough)
        #[arg(short, long, conflicts_with_all = ["source", "cases"], required_unless_present = "source")]
        example: Option<String>,

        /// Python source file
        #[arg(short, long, requires = "cases")]
        source: Option<PathBuf>,

        /// JSON file: [{"input": "...", "expected_output": "..."}]
        #[arg(short, long, requires = "source")]
        cases: Option<PathBuf>,

        /// Executor: interpreter or process
        #[arg(long)]
        engine: Option<EngineKind>,

        /// Captured output limit in bytes
        #[arg(long)]
        max_output_bytes: Option<usize>,

        /// Python binary used by the process engine
        #[arg(long)]
        python: Option<String>,

        /// Print the run summary as JSON
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Compare one expected/actual output pair
    Check {
        #[arg(long)]
        expected: String,

        #[arg(long)]
        actual: String,
    },
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if json {
        builder.json().init();
    } else {
        builder.with_line_number(true).init();
    }
}

fn harness_config(
    path: Option<&std::path::Path>,
    engine: Option<EngineKind>,
    max_output_bytes: Option<usize>,
    python: Option<String>,
) -> Result<HarnessConfig> {
    let mut config = config::apply_env_overrides(config::load_or_default(path)?)?;
    if let Some(engine) = engine {
        config.engine = engine;
    }
    if let Some(limit) = max_output_bytes {
        anyhow::ensure!(limit > 0, "--max-output-bytes must be greater than zero");
        config.max_output_bytes = limit;
    }
    if let Some(python) = python {
        config.python_command = python;
    }
    debug!(?config, "harness configuration");
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match cli.command {
        Commands::Examples => commands::list_examples()?,
        Commands::Run {
            example,
            source,
            cases,
            engine,
            max_output_bytes,
            python,
            json,
        } => {
            let config = harness_config(cli.config.as_deref(), engine, max_output_bytes, python)?;
            let result = match (example, source, cases) {
                (Some(name), _, _) => commands::run_example(&name, &config, json),
                (None, Some(source), Some(cases)) => commands::run_files(&source, &cases, &config, json),
                _ => Err(anyhow::anyhow!("Pass --example, or both --source and --cases")),
            };
            if let Err(e) = result {
                error!("{:#}", e);
                return Err(e);
            }
        }
        Commands::Check { expected, actual } => {
            if !commands::check(&expected, &actual)? {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
