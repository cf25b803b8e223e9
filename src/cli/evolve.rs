//! CLI command for running symbolic regression.

#![allow(clippy::needless_pass_by_value)]

use super::output::{JsonRunResult, format_text};
use super::{CliError, OutputFormat};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};
use symreg::dataset::{DEFAULT_MAX_ROWS, Dataset};
use symreg::gp::{
    EvolutionConfig, EvolutionObserver, EvolutionStats, GenerationStats, LogObserver, Program,
    evolve,
};

/// Flags that override fields of the loaded configuration.
#[derive(Debug, Default)]
pub(crate) struct Overrides {
    pub(crate) population: Option<usize>,
    pub(crate) generations: Option<usize>,
    pub(crate) seed: Option<u64>,
    pub(crate) max_depth: Option<usize>,
    pub(crate) max_init_depth: Option<usize>,
    pub(crate) threshold: Option<f64>,
}

impl Overrides {
    fn apply(&self, config: &mut EvolutionConfig) {
        if let Some(population) = self.population {
            config.population_size = population;
        }
        if let Some(generations) = self.generations {
            config.generation_cap = generations;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(max_depth) = self.max_depth {
            config.max_depth = max_depth;
        }
        if let Some(max_init_depth) = self.max_init_depth {
            config.max_init_depth = max_init_depth;
        }
        if let Some(threshold) = self.threshold {
            config.acceptance_threshold = threshold;
        }
    }
}

/// Progress bar advanced on every reported generation.
struct ProgressObserver {
    bar: ProgressBar,
}

impl ProgressObserver {
    fn new(generation_cap: usize) -> Self {
        let bar = ProgressBar::new(generation_cap as u64);
        if let Ok(style) = ProgressStyle::default_bar().template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} gens {msg}",
        ) {
            bar.set_style(style.progress_chars("#>-"));
        }
        Self { bar }
    }
}

impl EvolutionObserver for ProgressObserver {
    fn on_generation(&mut self, stats: &GenerationStats) {
        self.bar.set_position(stats.generation as u64 + 1);
        self.bar
            .set_message(format!("best={:.6}", stats.best_fitness));
    }

    fn on_finish(&mut self, _best: &Program, stats: &EvolutionStats) {
        self.bar.set_position(stats.generations_run as u64);
        self.bar.finish_with_message(if stats.solved { "solved" } else { "done" });
    }
}

/// Load the run configuration: JSON file first, then flag overrides.
fn load_config(path: Option<&Path>, overrides: &Overrides) -> Result<EvolutionConfig, CliError> {
    let mut config = match path {
        Some(path) => {
            let text = fs::read_to_string(path).map_err(|e| {
                CliError::new(format!("Failed to read {}: {e}", path.display()))
            })?;
            serde_json::from_str(&text)?
        }
        None => EvolutionConfig::default(),
    };
    overrides.apply(&mut config);
    Ok(config)
}

/// Execute the evolve command.
///
/// # Errors
///
/// Returns an error if the dataset or configuration cannot be loaded, the
/// configuration is invalid, or an output file cannot be written.
#[allow(clippy::too_many_arguments)]
pub(crate) fn execute(
    dataset: PathBuf,
    config: Option<PathBuf>,
    overrides: Overrides,
    rows: Option<usize>,
    format: OutputFormat,
    output: Option<PathBuf>,
    dot: Option<PathBuf>,
    progress: bool,
) -> Result<(), CliError> {
    let data = Dataset::load(&dataset, rows.unwrap_or(DEFAULT_MAX_ROWS)).map_err(|e| {
        CliError::new(format!("Failed to load {}: {e}", dataset.display()))
    })?;
    let config = load_config(config.as_deref(), &overrides)?;
    config
        .validate()
        .map_err(|e| CliError::new(format!("Invalid configuration: {e}")))?;

    if format == OutputFormat::Text {
        println!("Starting evolution:");
        println!("  Dataset: {} ({} rows)", dataset.display(), data.len());
        println!("  Population: {}", config.population_size);
        println!("  Generation cap: {}", config.generation_cap);
        println!("  Max depth: {} (initial {})", config.max_depth, config.max_init_depth);
        println!("  Seed: {}", config.seed);
        println!();
    }

    let (best, stats) = if progress {
        let mut observer = ProgressObserver::new(config.generation_cap);
        evolve(&config, &data, &mut observer)?
    } else {
        evolve(&config, &data, &mut LogObserver)?
    };

    let result = JsonRunResult::from_run(&best, &stats, &data);
    match format {
        OutputFormat::Text => print!("{}", format_text(&best, &stats, &data)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
    }

    if let Some(path) = output {
        fs::write(&path, serde_json::to_string_pretty(&result)?)?;
        log::info!("wrote result to {}", path.display());
    }
    if let Some(path) = dot {
        fs::write(&path, best.root.to_dot())?;
        log::info!("wrote tree to {}", path.display());
    }

    Ok(())
}
