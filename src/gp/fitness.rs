//! Fitness evaluation.
//!
//! Fitness is the sum of absolute errors over the dataset, so lower is
//! better and 0 means solved. Programs whose error blows up to an infinity
//! or NaN get [`UNUSABLE_FITNESS`] and simply rank last.

use crate::dataset::Dataset;
use crate::gp::node::Node;
use crate::gp::program::Program;
use rayon::prelude::*;

/// Total error below which a program counts as solved.
pub const ACCEPTANCE_THRESHOLD: f64 = 0.001;

/// Fitness of a program whose error is not finite.
pub const UNUSABLE_FITNESS: f64 = f64::MAX;

/// Scores programs against a dataset.
///
/// Holds only shared references, so one evaluator can score many programs
/// from several threads at once.
#[derive(Debug, Clone, Copy)]
pub struct FitnessEvaluator<'a> {
    dataset: &'a Dataset,
    threshold: f64,
}

impl<'a> FitnessEvaluator<'a> {
    /// Create an evaluator with the given acceptance threshold.
    #[must_use]
    pub fn new(dataset: &'a Dataset, threshold: f64) -> Self {
        Self { dataset, threshold }
    }

    /// The dataset programs are scored against.
    #[must_use]
    pub fn dataset(&self) -> &'a Dataset {
        self.dataset
    }

    /// Sum of `|predicted - expected|` over every row.
    ///
    /// Returns [`UNUSABLE_FITNESS`] as soon as the running total stops being
    /// finite, and exactly 0 when the total is below the threshold.
    #[must_use]
    pub fn fitness(&self, tree: &Node) -> f64 {
        let mut total = 0.0;
        for (x, expected) in self.dataset.rows() {
            total += (tree.evaluate(x) - expected).abs();
            if !total.is_finite() {
                return UNUSABLE_FITNESS;
            }
        }
        if total < self.threshold { 0.0 } else { total }
    }

    /// Whether a fitness value meets the acceptance threshold.
    ///
    /// A fitness of 0 is always a solution, even with a zero threshold.
    #[must_use]
    pub fn is_solved(&self, fitness: f64) -> bool {
        fitness < self.threshold || fitness <= 0.0
    }

    /// Fill in the fitness of every program that has none yet, in parallel.
    ///
    /// Each result is stored on its own program, so the outcome does not
    /// depend on the order in which workers finish.
    pub fn evaluate_population(&self, programs: &mut [Program]) {
        programs
            .par_iter_mut()
            .filter(|program| program.fitness.is_none())
            .for_each(|program| program.fitness = Some(self.fitness(&program.root)));
    }
}
