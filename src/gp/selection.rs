//! Selection operators for genetic programming.
//!
//! Fitness here is an error, so lower is better. Both schemes are
//! stochastic and monotone: a fitter individual is never less likely to be
//! picked than a worse one.

// Selection uses intentional casts for statistics
#![allow(clippy::cast_precision_loss)]

use rand::Rng;
use serde::{Deserialize, Serialize};

/// How parents are drawn from the evaluated population.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionMethod {
    /// Best of `size` uniformly drawn individuals.
    Tournament {
        /// Number of individuals competing in each tournament.
        size: usize,
    },
    /// Roulette wheel with weight `1 / (1 + fitness)`.
    FitnessProportionate,
}

/// Configuration for selection operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Parent selection scheme.
    pub method: SelectionMethod,
    /// Number of best individuals copied unchanged into the next generation.
    pub elite_count: usize,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            method: SelectionMethod::Tournament { size: 5 },
            elite_count: 1,
        }
    }
}

/// Parent selector prepared for one generation's fitness values.
#[derive(Debug)]
pub struct Selector<'a> {
    fitness: &'a [f64],
    method: SelectionMethod,
    // Running weight totals, only used by the roulette wheel.
    cumulative: Vec<f64>,
}

impl<'a> Selector<'a> {
    /// Prepare selection over `fitness` (one value per individual).
    #[must_use]
    pub fn new(fitness: &'a [f64], method: SelectionMethod) -> Self {
        let cumulative = match method {
            SelectionMethod::FitnessProportionate => fitness
                .iter()
                .scan(0.0, |acc, &f| {
                    *acc += weight(f);
                    Some(*acc)
                })
                .collect(),
            SelectionMethod::Tournament { .. } => Vec::new(),
        };
        Self {
            fitness,
            method,
            cumulative,
        }
    }

    /// Draw the index of one parent.
    pub fn select<R: Rng>(&self, rng: &mut R) -> usize {
        match self.method {
            SelectionMethod::Tournament { size } => tournament_select(self.fitness, size, rng),
            SelectionMethod::FitnessProportionate => self.roulette_select(rng),
        }
    }

    fn roulette_select<R: Rng>(&self, rng: &mut R) -> usize {
        let pop_size = self.fitness.len();
        if pop_size == 0 {
            return 0;
        }
        let total = self.cumulative.last().copied().unwrap_or(0.0);
        if !(total > 0.0 && total.is_finite()) {
            return rng.gen_range(0..pop_size);
        }
        let spin = rng.gen_range(0.0..total);
        self.cumulative
            .partition_point(|&c| c <= spin)
            .min(pop_size - 1)
    }
}

/// Roulette weight: decreasing in fitness, always positive for finite input.
fn weight(fitness: f64) -> f64 {
    if fitness.is_nan() {
        0.0
    } else {
        1.0 / (1.0 + fitness.max(0.0))
    }
}

/// Select the indices of the `count` lowest-error individuals.
#[must_use]
pub fn select_elite(fitness: &[f64], count: usize) -> Vec<usize> {
    let mut indexed: Vec<(usize, f64)> = fitness.iter().copied().enumerate().collect();
    // Stable sort keeps the earlier individual first on ties.
    indexed.sort_by(|a, b| a.1.total_cmp(&b.1));
    indexed.into_iter().take(count).map(|(i, _)| i).collect()
}

/// Tournament selection: randomly select k individuals and return the best.
fn tournament_select<R: Rng>(fitness: &[f64], k: usize, rng: &mut R) -> usize {
    let pop_size = fitness.len();
    if pop_size == 0 {
        return 0;
    }

    let k = k.min(pop_size).max(1);
    let mut best_idx = rng.gen_range(0..pop_size);
    let mut best_fitness = fitness[best_idx];

    for _ in 1..k {
        let idx = rng.gen_range(0..pop_size);
        if fitness[idx] < best_fitness {
            best_idx = idx;
            best_fitness = fitness[idx];
        }
    }

    best_idx
}

/// Summary of a generation's fitness values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionStats {
    /// Mean fitness over individuals with finite fitness.
    pub mean_fitness: f64,
    /// Lowest fitness in the population.
    pub best_fitness: f64,
    /// Highest fitness in the population.
    pub worst_fitness: f64,
    /// Individuals whose fitness is the unusable sentinel.
    pub unusable: usize,
}

impl SelectionStats {
    /// Calculate statistics from fitness values.
    #[must_use]
    pub fn from_fitness(fitness: &[f64]) -> Self {
        let best = fitness.iter().copied().fold(f64::INFINITY, f64::min);
        let worst = fitness.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        let usable: Vec<f64> = fitness
            .iter()
            .copied()
            .filter(|f| *f < crate::gp::fitness::UNUSABLE_FITNESS)
            .collect();
        let mean = if usable.is_empty() {
            0.0
        } else {
            usable.iter().sum::<f64>() / usable.len() as f64
        };

        Self {
            mean_fitness: mean,
            best_fitness: if fitness.is_empty() { 0.0 } else { best },
            worst_fitness: if fitness.is_empty() { 0.0 } else { worst },
            unusable: fitness.len() - usable.len(),
        }
    }
}
