//! Individuals: a program tree plus its cached fitness.

use crate::gp::node::Node;
use serde::{Deserialize, Serialize};

/// One candidate solution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    /// Root of the expression tree.
    pub root: Node,
    /// Fitness, filled in once the program has been evaluated.
    pub fitness: Option<f64>,
    /// Generation in which the program was created.
    pub generation: usize,
}

impl Program {
    /// Wrap a tree created in `generation`. Fitness starts unknown.
    #[must_use]
    pub fn new(root: Node, generation: usize) -> Self {
        Self {
            root,
            fitness: None,
            generation,
        }
    }

    /// Fitness, treating an unevaluated program as the worst possible.
    #[must_use]
    pub fn fitness_or_worst(&self) -> f64 {
        self.fitness.unwrap_or(f64::MAX)
    }

    /// Evaluate the program with `X` bound to `x`.
    #[must_use]
    pub fn evaluate(&self, x: f64) -> f64 {
        self.root.evaluate(x)
    }

    /// Depth of the program tree.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.root.depth()
    }

    /// Number of nodes in the program tree.
    #[must_use]
    pub fn size(&self) -> usize {
        self.root.size()
    }

    /// Whether `self` should replace `other` as the best program seen.
    ///
    /// Strictly lower fitness wins; on a tie the earlier generation is kept.
    #[must_use]
    pub fn is_better_than(&self, other: &Self) -> bool {
        let (a, b) = (self.fitness_or_worst(), other.fitness_or_worst());
        a < b || (a.total_cmp(&b).is_eq() && self.generation < other.generation)
    }
}
