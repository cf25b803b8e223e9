//! Symreg CLI - Command-line interface for evolving expressions that fit a dataset.

// Allow print in the CLI binary
#![allow(clippy::print_stdout, clippy::print_stderr)]
// Allow unwrap in tests (test code is not production)
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod cli;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

/// Symreg - Symbolic regression by genetic programming
#[derive(Parser, Debug)]
#[command(name = "symreg")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Evolve an expression that fits a dataset
    Evolve {
        /// Dataset file (two header lines, then `input output` pairs)
        #[arg(required = true)]
        dataset: std::path::PathBuf,

        /// JSON configuration file (default: built-in configuration)
        #[arg(short, long)]
        config: Option<std::path::PathBuf>,

        /// Population size (default: 1000)
        #[arg(short, long)]
        population: Option<usize>,

        /// Generation cap (default: 1000)
        #[arg(short, long)]
        generations: Option<usize>,

        /// Random seed (default: 42)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Maximum tree depth after crossover and mutation (default: 8)
        #[arg(long)]
        max_depth: Option<usize>,

        /// Maximum tree depth of the initial population (default: 4)
        #[arg(long)]
        max_init_depth: Option<usize>,

        /// Acceptance threshold on total absolute error (default: 0.001)
        #[arg(short, long)]
        threshold: Option<f64>,

        /// Maximum dataset rows to read (default: 20)
        #[arg(long)]
        rows: Option<usize>,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: cli::OutputFormat,

        /// Write the result as JSON to this file
        #[arg(short, long)]
        output: Option<std::path::PathBuf>,

        /// Write the best tree as Graphviz DOT to this file
        #[arg(long)]
        dot: Option<std::path::PathBuf>,

        /// Show progress bar
        #[arg(long)]
        progress: bool,
    },

    /// Check that a dataset file can be loaded
    Validate {
        /// Dataset file to validate
        #[arg(required = true)]
        dataset: std::path::PathBuf,

        /// Maximum dataset rows to read (default: 20)
        #[arg(long)]
        rows: Option<usize>,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let result = match args.command {
        Commands::Evolve {
            dataset,
            config,
            population,
            generations,
            seed,
            max_depth,
            max_init_depth,
            threshold,
            rows,
            format,
            output,
            dot,
            progress,
        } => {
            let overrides = cli::evolve::Overrides {
                population,
                generations,
                seed,
                max_depth,
                max_init_depth,
                threshold,
            };
            cli::evolve::execute(dataset, config, overrides, rows, format, output, dot, progress)
        }

        Commands::Validate { dataset, rows } => cli::validate::execute(dataset, rows),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_evolve_flags() {
        let args = Args::try_parse_from([
            "symreg", "evolve", "data.txt", "-p", "200", "-g", "50", "--format", "json",
        ])
        .unwrap();
        match args.command {
            Commands::Evolve {
                population,
                generations,
                format,
                ..
            } => {
                assert_eq!(population, Some(200));
                assert_eq!(generations, Some(50));
                assert_eq!(format, cli::OutputFormat::Json);
            }
            Commands::Validate { .. } => panic!("expected evolve"),
        }
    }
}
