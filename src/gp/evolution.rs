//! Main evolution loop for genetic programming.
//!
//! This module orchestrates the evolutionary process: initialization,
//! fitness evaluation, best-ever tracking, termination and breeding.
//!
//! ```text
//! Initialize → Evaluate → Terminate? ─yes→ Report
//!                 ↑           │no
//!                 └─ Breed ←──┘
//! ```
//!
//! The loop stops after the generation in which the best-ever fitness
//! drops below the acceptance threshold, or once `generation_cap`
//! generations have been evaluated, whichever comes first.

// Evolution uses intentional casts for statistics
#![allow(clippy::cast_precision_loss)]

use crate::dataset::Dataset;
use crate::error::{ConfigError, EvolutionError};
use crate::gp::fitness::{ACCEPTANCE_THRESHOLD, FitnessEvaluator};
use crate::gp::node::{ConstructionConfig, NodeSet};
use crate::gp::operators::OperatorConfig;
use crate::gp::population::{OperatorCounts, Population};
use crate::gp::program::Program;
use crate::gp::selection::{SelectionConfig, SelectionMethod, SelectionStats};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Configuration for the evolution process.
///
/// Everything is fixed for the duration of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionConfig {
    /// Population size.
    pub population_size: usize,
    /// Maximum depth of trees in the initial population.
    pub max_init_depth: usize,
    /// Maximum depth of any tree produced by crossover or mutation.
    pub max_depth: usize,
    /// Maximum number of generations to evaluate.
    pub generation_cap: usize,
    /// Fitness below which a program counts as a solution.
    pub acceptance_threshold: f64,
    /// RNG seed for reproducibility.
    pub seed: u64,
    /// Report progress every N generations.
    pub report_interval: usize,
    /// Operator probabilities.
    pub operators: OperatorConfig,
    /// Selection configuration.
    pub selection: SelectionConfig,
    /// Random tree construction settings.
    pub construction: ConstructionConfig,
    /// Primitives trees are built from.
    pub node_set: NodeSet,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            population_size: 1000,
            max_init_depth: 4,
            max_depth: 8,
            generation_cap: 1000,
            acceptance_threshold: ACCEPTANCE_THRESHOLD,
            seed: 42,
            report_interval: 25,
            operators: OperatorConfig::default(),
            selection: SelectionConfig::default(),
            construction: ConstructionConfig::default(),
            node_set: NodeSet::default(),
        }
    }
}

impl EvolutionConfig {
    /// Reject configurations the engine cannot run with.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.node_set.validate()?;
        self.operators.validate()?;
        if self.population_size == 0 {
            return Err(ConfigError::EmptyPopulation);
        }
        if self.max_init_depth > self.max_depth {
            return Err(ConfigError::InitDepthExceedsMax {
                init: self.max_init_depth,
                max: self.max_depth,
            });
        }
        if let SelectionMethod::Tournament { size: 0 } = self.selection.method {
            return Err(ConfigError::ZeroTournamentSize);
        }
        if self.selection.elite_count >= self.population_size {
            return Err(ConfigError::TooManyElites {
                elites: self.selection.elite_count,
                population: self.population_size,
            });
        }
        if !self.acceptance_threshold.is_finite() || self.acceptance_threshold < 0.0 {
            return Err(ConfigError::InvalidThreshold(self.acceptance_threshold));
        }
        if self.generation_cap == 0 {
            return Err(ConfigError::ZeroGenerationCap);
        }
        if self.report_interval == 0 {
            return Err(ConfigError::ZeroReportInterval);
        }
        if self.construction.max_attempts == 0 {
            return Err(ConfigError::ZeroAttempts("construction"));
        }
        Ok(())
    }
}

/// Statistics for a single generation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationStats {
    /// Generation number.
    pub generation: usize,
    /// Best fitness seen so far, this generation included.
    pub best_fitness: f64,
    /// Best fitness within this generation.
    pub generation_best: f64,
    /// Mean fitness over programs with usable fitness.
    pub mean_fitness: f64,
    /// Programs whose evaluation was not finite.
    pub unusable: usize,
    /// Mean number of nodes per program.
    pub mean_size: f64,
    /// Operators that produced this generation (all zero for generation 0).
    pub operators: OperatorCounts,
}

/// Overall statistics from an evolution run.
#[derive(Debug, Clone, PartialEq)]
pub struct EvolutionStats {
    /// Statistics per generation.
    pub generations: Vec<GenerationStats>,
    /// Best fitness achieved.
    pub best_fitness: f64,
    /// Generation where best fitness was achieved.
    pub best_generation: usize,
    /// Number of generations evaluated.
    pub generations_run: usize,
    /// Whether the best fitness met the acceptance threshold.
    pub solved: bool,
    /// Total time in seconds.
    pub elapsed_seconds: f64,
}

/// Receives progress while a run is going.
pub trait EvolutionObserver {
    /// Called for every generation whose index is a multiple of the
    /// configured report interval.
    fn on_generation(&mut self, stats: &GenerationStats);

    /// Called once when the loop ends.
    fn on_finish(&mut self, _best: &Program, _stats: &EvolutionStats) {}
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl EvolutionObserver for NullObserver {
    fn on_generation(&mut self, _stats: &GenerationStats) {}
}

/// Observer that writes progress through the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl EvolutionObserver for LogObserver {
    fn on_generation(&mut self, stats: &GenerationStats) {
        log::info!(
            "Evolving gen {:>5}: best={:.6} gen_best={:.6} mean={:.4} size={:.1}",
            stats.generation,
            stats.best_fitness,
            stats.generation_best,
            stats.mean_fitness,
            stats.mean_size
        );
    }

    fn on_finish(&mut self, best: &Program, stats: &EvolutionStats) {
        log::info!(
            "After {} generations the best program had a fitness of {}: {}",
            stats.generations_run,
            stats.best_fitness,
            best.root
        );
    }
}

/// Run the evolution process.
///
/// Returns the best program seen in any generation together with the run
/// statistics. Given the same configuration and dataset the result is
/// reproducible.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the initial
/// population cannot be constructed.
pub fn evolve(
    config: &EvolutionConfig,
    dataset: &Dataset,
    observer: &mut dyn EvolutionObserver,
) -> Result<(Program, EvolutionStats), EvolutionError> {
    config.validate()?;
    let start_time = Instant::now();

    let evaluator = FitnessEvaluator::new(dataset, config.acceptance_threshold);
    let mut rng = SmallRng::seed_from_u64(config.seed);

    // Initialize population
    let mut population = Population::random(
        &mut rng,
        config.population_size,
        &config.node_set,
        config.max_init_depth,
        &config.construction,
    )?;
    population.evaluate(&evaluator);

    let mut best = population
        .best()
        .cloned()
        .ok_or(ConfigError::EmptyPopulation)?;
    let mut best_generation = 0;
    let mut operators = OperatorCounts::default();
    let mut gen_stats = Vec::new();

    loop {
        let generation = population.generation();

        if let Some(candidate) = population.best() {
            if candidate.is_better_than(&best) {
                best = candidate.clone();
                best_generation = generation;
            }
        }

        let fitness = population.fitness();
        let summary = SelectionStats::from_fitness(&fitness);
        let stats = GenerationStats {
            generation,
            best_fitness: best.fitness_or_worst(),
            generation_best: summary.best_fitness,
            mean_fitness: summary.mean_fitness,
            unusable: summary.unusable,
            mean_size: population.mean_size(),
            operators,
        };
        gen_stats.push(stats);

        if generation % config.report_interval == 0 {
            observer.on_generation(&stats);
        }

        let solved = evaluator.is_solved(best.fitness_or_worst());
        if solved || generation + 1 >= config.generation_cap {
            break;
        }

        let (next, counts) = population.breed(config, &mut rng);
        population = next;
        operators = counts;
        population.evaluate(&evaluator);
    }

    let stats = EvolutionStats {
        generations_run: gen_stats.len(),
        generations: gen_stats,
        best_fitness: best.fitness_or_worst(),
        best_generation,
        solved: evaluator.is_solved(best.fitness_or_worst()),
        elapsed_seconds: start_time.elapsed().as_secs_f64(),
    };
    if stats.solved {
        log::info!("solution found in generation {best_generation}");
    } else {
        log::info!("generation cap of {} reached", config.generation_cap);
    }
    observer.on_finish(&best, &stats);

    Ok((best, stats))
}
