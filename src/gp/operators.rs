//! Genetic operators: reproduction, subtree mutation and subtree crossover.
//!
//! Operators never touch their parents; they work on clones. Mutation and
//! crossover return `None` when no depth-respecting result was found within
//! the attempt bound, and the caller reproduces the parent(s) instead.

use crate::error::ConfigError;
use crate::gp::node::{Node, NodeSet};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Operator probabilities and retry bounds.
///
/// The three probabilities are relative weights: they are divided by their
/// sum before an operator is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperatorConfig {
    /// Weight of subtree crossover.
    pub crossover_prob: f64,
    /// Weight of subtree mutation.
    pub mutation_prob: f64,
    /// Weight of verbatim reproduction.
    pub reproduction_prob: f64,
    /// Point selections tried before an operator gives up.
    pub max_attempts: usize,
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            crossover_prob: 0.9,
            mutation_prob: 0.35,
            reproduction_prob: 0.2,
            max_attempts: 16,
        }
    }
}

impl OperatorConfig {
    /// Check every probability lies in `[0, 1]` and at least one is positive.
    ///
    /// # Errors
    ///
    /// Returns the first offending setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("crossover", self.crossover_prob),
            ("mutation", self.mutation_prob),
            ("reproduction", self.reproduction_prob),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidProbability { name, value });
            }
        }
        if self.crossover_prob + self.mutation_prob + self.reproduction_prob <= 0.0 {
            return Err(ConfigError::NoOperators);
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::ZeroAttempts("operator"));
        }
        Ok(())
    }

    /// Draw which operator produces the next offspring.
    ///
    /// A uniform draw in `[0, 1)` picks crossover below the normalised
    /// crossover share, mutation below crossover + mutation, and
    /// reproduction otherwise.
    pub fn choose<R: Rng>(&self, rng: &mut R) -> Operation {
        let total = self.crossover_prob + self.mutation_prob + self.reproduction_prob;
        let draw: f64 = rng.gen_range(0.0..1.0);
        if draw < self.crossover_prob / total {
            Operation::Crossover
        } else if draw < (self.crossover_prob + self.mutation_prob) / total {
            Operation::Mutation
        } else {
            Operation::Reproduction
        }
    }
}

/// The operator that created an offspring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Subtree exchange between two parents.
    Crossover,
    /// Subtree replacement with a fresh random subtree.
    Mutation,
    /// Verbatim copy.
    Reproduction,
}

/// Copy a parent unchanged.
#[must_use]
pub fn reproduce(parent: &Node) -> Node {
    parent.clone()
}

/// Replace a random subtree of a copy of `parent` with a new random one.
///
/// Only nodes above the depth limit are eligible, and the new subtree is
/// grown within the depth left at that point. Returns `None` when no node
/// is eligible or every attempt broke the depth bound.
pub fn mutate<R: Rng>(
    parent: &Node,
    node_set: &NodeSet,
    max_depth: usize,
    max_attempts: usize,
    rng: &mut R,
) -> Option<Node> {
    let eligible: Vec<_> = parent
        .points()
        .into_iter()
        .filter(|p| p.depth < max_depth)
        .collect();
    if eligible.is_empty() {
        return None;
    }

    for _ in 0..max_attempts {
        let point = eligible[rng.gen_range(0..eligible.len())];
        let Some(subtree) = Node::grow(rng, node_set, max_depth - point.depth) else {
            continue;
        };
        let mut child = parent.clone();
        child.replace_subtree(point.index, subtree)?;
        if child.is_well_formed() && child.depth() <= max_depth {
            return Some(child);
        }
    }
    None
}

/// Swap a random subtree of a copy of `a` with a random subtree of a copy
/// of `b`.
///
/// Point pairs whose swap would push either child past `max_depth` are
/// redrawn, up to `max_attempts` times. Returns `None` if no pair fits.
pub fn crossover<R: Rng>(
    a: &Node,
    b: &Node,
    max_depth: usize,
    max_attempts: usize,
    rng: &mut R,
) -> Option<(Node, Node)> {
    for _ in 0..max_attempts {
        let pa = a.random_point(rng);
        let pb = b.random_point(rng);
        let sub_a = a.subtree(pa.index)?;
        let sub_b = b.subtree(pb.index)?;
        if pa.depth + sub_b.depth() > max_depth || pb.depth + sub_a.depth() > max_depth {
            continue;
        }

        let mut child_a = a.clone();
        let mut child_b = b.clone();
        let taken = child_a.replace_subtree(pa.index, sub_b.clone())?;
        child_b.replace_subtree(pb.index, taken)?;

        if child_a.depth() <= max_depth && child_b.depth() <= max_depth {
            return Some((child_a, child_b));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gp::node::{ConstructionConfig, Function};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn random_tree(rng: &mut SmallRng, depth: usize) -> Node {
        Node::random(rng, &NodeSet::default(), depth, &ConstructionConfig::default()).unwrap()
    }

    #[test]
    fn test_choose_follows_normalised_weights() {
        let mut rng = SmallRng::seed_from_u64(42);
        let config = OperatorConfig::default();
        let mut counts = [0usize; 3];
        for _ in 0..10_000 {
            match config.choose(&mut rng) {
                Operation::Crossover => counts[0] += 1,
                Operation::Mutation => counts[1] += 1,
                Operation::Reproduction => counts[2] += 1,
            }
        }
        // Expected shares: 0.62, 0.24, 0.14.
        assert!((5800..6600).contains(&counts[0]), "{counts:?}");
        assert!((2000..2800).contains(&counts[1]), "{counts:?}");
        assert!((1000..1800).contains(&counts[2]), "{counts:?}");
    }

    #[test]
    fn test_only_crossover() {
        let mut rng = SmallRng::seed_from_u64(1);
        let config = OperatorConfig {
            crossover_prob: 1.0,
            mutation_prob: 0.0,
            reproduction_prob: 0.0,
            ..Default::default()
        };
        for _ in 0..100 {
            assert_eq!(config.choose(&mut rng), Operation::Crossover);
        }
    }

    #[test]
    fn test_validate_rejects_percentages() {
        let config = OperatorConfig {
            mutation_prob: 35.0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidProbability {
                name: "mutation",
                value: 35.0
            })
        );
        let none = OperatorConfig {
            crossover_prob: 0.0,
            mutation_prob: 0.0,
            reproduction_prob: 0.0,
            ..Default::default()
        };
        assert_eq!(none.validate(), Err(ConfigError::NoOperators));
    }

    #[test]
    fn test_mutation_respects_depth() {
        let mut rng = SmallRng::seed_from_u64(7);
        let set = NodeSet::default();
        for _ in 0..200 {
            let parent = random_tree(&mut rng, 4);
            let before = parent.clone();
            if let Some(child) = mutate(&parent, &set, 6, 16, &mut rng) {
                assert!(child.depth() <= 6);
                assert!(child.is_well_formed());
            }
            assert_eq!(parent, before);
        }
    }

    #[test]
    fn test_mutation_of_lone_terminal_at_depth_zero_fails() {
        let mut rng = SmallRng::seed_from_u64(3);
        let set = NodeSet::default();
        assert_eq!(mutate(&Node::Var, &set, 0, 16, &mut rng), None);
        assert!(mutate(&Node::Var, &set, 1, 16, &mut rng).is_some());
    }

    #[test]
    fn test_crossover_respects_depth() {
        let mut rng = SmallRng::seed_from_u64(11);
        for _ in 0..200 {
            let a = random_tree(&mut rng, 4);
            let b = random_tree(&mut rng, 4);
            if let Some((ca, cb)) = crossover(&a, &b, 5, 16, &mut rng) {
                assert!(ca.depth() <= 5 && cb.depth() <= 5);
                assert!(ca.is_well_formed() && cb.is_well_formed());
                // Nodes are exchanged, not created or lost.
                assert_eq!(ca.size() + cb.size(), a.size() + b.size());
            }
        }
    }

    #[test]
    fn test_crossover_gives_up_when_nothing_fits() {
        let mut rng = SmallRng::seed_from_u64(5);
        let deep = Node::call(
            Function::Add,
            Node::call(Function::Add, Node::Var, Node::Var),
            Node::Var,
        );
        let wide = Node::call(Function::Multiply, Node::Var, deep.clone());
        // No swap brings both children within depth 1.
        assert_eq!(crossover(&deep, &wide, 1, 8, &mut rng), None);
    }

    #[test]
    fn test_reproduce_is_a_copy() {
        let tree = Node::call(Function::Pow, Node::Var, Node::Const(2.0));
        assert_eq!(reproduce(&tree), tree);
    }
}
