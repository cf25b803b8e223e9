//! The working population of one generation.
//!
//! Each generation lives in its own `Vec<Program>`. Breeding builds the
//! next vector from scratch and the previous one is dropped as a whole at
//! the generation boundary.

use crate::error::ConstructionError;
use crate::gp::evolution::EvolutionConfig;
use crate::gp::fitness::FitnessEvaluator;
use crate::gp::node::{ConstructionConfig, Node, NodeSet};
use crate::gp::operators::{Operation, crossover, mutate, reproduce};
use crate::gp::program::Program;
use crate::gp::selection::{Selector, select_elite};
use rand::Rng;

/// How many offspring each operator produced during one breeding step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OperatorCounts {
    /// Offspring from successful crossovers.
    pub crossover: usize,
    /// Offspring from successful mutations.
    pub mutation: usize,
    /// Offspring copied verbatim, fallbacks and elites included.
    pub reproduction: usize,
    /// Crossovers or mutations that fell back to reproduction.
    pub fallbacks: usize,
}

/// A fixed-size generation of programs.
#[derive(Debug, Clone)]
pub struct Population {
    programs: Vec<Program>,
    generation: usize,
}

impl Population {
    /// Build a random generation-0 population.
    ///
    /// # Errors
    ///
    /// Returns an error if any tree cannot be constructed within the
    /// construction attempt bound.
    pub fn random<R: Rng>(
        rng: &mut R,
        size: usize,
        node_set: &NodeSet,
        max_init_depth: usize,
        construction: &ConstructionConfig,
    ) -> Result<Self, ConstructionError> {
        let programs = (0..size)
            .map(|_| {
                Node::random(rng, node_set, max_init_depth, construction)
                    .map(|root| Program::new(root, 0))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            programs,
            generation: 0,
        })
    }

    /// Wrap existing programs as the population of `generation`.
    #[must_use]
    pub fn from_programs(programs: Vec<Program>, generation: usize) -> Self {
        Self {
            programs,
            generation,
        }
    }

    /// Number of programs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.programs.len()
    }

    /// Whether the population holds no programs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }

    /// Generation index of this population.
    #[must_use]
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// The programs, in population order.
    #[must_use]
    pub fn programs(&self) -> &[Program] {
        &self.programs
    }

    /// Score every program not yet scored.
    pub fn evaluate(&mut self, evaluator: &FitnessEvaluator<'_>) {
        evaluator.evaluate_population(&mut self.programs);
    }

    /// Fitness per program; unevaluated programs count as worst.
    #[must_use]
    pub fn fitness(&self) -> Vec<f64> {
        self.programs.iter().map(Program::fitness_or_worst).collect()
    }

    /// The lowest-fitness program, the earliest one on ties.
    #[must_use]
    pub fn best(&self) -> Option<&Program> {
        self.programs
            .iter()
            .reduce(|best, p| if p.is_better_than(best) { p } else { best })
    }

    /// Mean number of nodes per program.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn mean_size(&self) -> f64 {
        if self.programs.is_empty() {
            return 0.0;
        }
        self.programs.iter().map(Program::size).sum::<usize>() as f64 / self.programs.len() as f64
    }

    /// Produce the next generation from this evaluated one.
    ///
    /// Elites are carried over first, then operators are drawn per offspring
    /// until the population is back to `config.population_size`. A crossover
    /// or mutation that finds no valid point reproduces its parent(s).
    pub fn breed<R: Rng>(&self, config: &EvolutionConfig, rng: &mut R) -> (Self, OperatorCounts) {
        let size = config.population_size;
        let next_generation = self.generation + 1;
        let fitness = self.fitness();
        let selector = Selector::new(&fitness, config.selection.method);
        let max_depth = config.max_depth;
        let attempts = config.operators.max_attempts;

        let mut counts = OperatorCounts::default();
        let mut next = Vec::with_capacity(size);

        for idx in select_elite(&fitness, config.selection.elite_count.min(size)) {
            next.push(self.programs[idx].clone());
            counts.reproduction += 1;
        }

        let copy_of = |parent: &Program| Program {
            root: reproduce(&parent.root),
            fitness: parent.fitness,
            generation: next_generation,
        };

        while next.len() < size {
            match config.operators.choose(rng) {
                Operation::Crossover => {
                    let a = &self.programs[selector.select(rng)];
                    let b = &self.programs[selector.select(rng)];
                    let children = match crossover(&a.root, &b.root, max_depth, attempts, rng) {
                        Some((ca, cb)) => {
                            counts.crossover += 2;
                            [
                                Program::new(ca, next_generation),
                                Program::new(cb, next_generation),
                            ]
                        }
                        None => {
                            log::trace!("crossover found no valid swap, reproducing parents");
                            counts.fallbacks += 1;
                            counts.reproduction += 2;
                            [copy_of(a), copy_of(b)]
                        }
                    };
                    for child in children {
                        if next.len() < size {
                            next.push(child);
                        }
                    }
                }
                Operation::Mutation => {
                    let parent = &self.programs[selector.select(rng)];
                    match mutate(&parent.root, &config.node_set, max_depth, attempts, rng) {
                        Some(child) => {
                            counts.mutation += 1;
                            next.push(Program::new(child, next_generation));
                        }
                        None => {
                            log::trace!("mutation found no valid point, reproducing parent");
                            counts.fallbacks += 1;
                            counts.reproduction += 1;
                            next.push(copy_of(parent));
                        }
                    }
                }
                Operation::Reproduction => {
                    counts.reproduction += 1;
                    next.push(copy_of(&self.programs[selector.select(rng)]));
                }
            }
        }

        (Self::from_programs(next, next_generation), counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;
    use crate::gp::fitness::ACCEPTANCE_THRESHOLD;
    use crate::gp::node::Function;
    use crate::gp::operators::OperatorConfig;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn small_config() -> EvolutionConfig {
        EvolutionConfig {
            population_size: 40,
            ..Default::default()
        }
    }

    fn evaluated(config: &EvolutionConfig, data: &Dataset, rng: &mut SmallRng) -> Population {
        let mut pop = Population::random(
            rng,
            config.population_size,
            &config.node_set,
            config.max_init_depth,
            &config.construction,
        )
        .unwrap();
        pop.evaluate(&FitnessEvaluator::new(data, ACCEPTANCE_THRESHOLD));
        pop
    }

    #[test]
    fn test_random_population() {
        let mut rng = SmallRng::seed_from_u64(42);
        let config = small_config();
        let data = Dataset::from_pairs(&[(1.0, 3.0), (2.0, 5.0)]).unwrap();
        let pop = evaluated(&config, &data, &mut rng);

        assert_eq!(pop.len(), 40);
        assert_eq!(pop.generation(), 0);
        assert!(pop.programs().iter().all(|p| p.depth() <= config.max_init_depth));
        assert!(pop.programs().iter().all(|p| p.fitness.is_some()));
    }

    #[test]
    fn test_breed_keeps_size_and_depth() {
        let mut rng = SmallRng::seed_from_u64(7);
        let config = small_config();
        let data = Dataset::from_pairs(&[(1.0, 3.0), (2.0, 5.0), (3.0, 7.0)]).unwrap();
        let evaluator = FitnessEvaluator::new(&data, ACCEPTANCE_THRESHOLD);
        let mut pop = evaluated(&config, &data, &mut rng);

        for generation in 1..=10 {
            let (next, counts) = pop.breed(&config, &mut rng);
            assert_eq!(next.len(), config.population_size);
            assert_eq!(next.generation(), generation);
            assert!(counts.crossover + counts.mutation + counts.reproduction >= next.len());
            assert!(next.programs().iter().all(|p| p.depth() <= config.max_depth));
            assert!(next.programs().iter().all(|p| p.root.is_well_formed()));
            pop = next;
            pop.evaluate(&evaluator);
        }
    }

    #[test]
    fn test_elite_survives_breeding() {
        let mut rng = SmallRng::seed_from_u64(9);
        let config = small_config();
        let data = Dataset::from_pairs(&[(1.0, 3.0), (2.0, 5.0)]).unwrap();
        let pop = evaluated(&config, &data, &mut rng);
        let best = pop.best().unwrap().clone();

        let (next, _) = pop.breed(&config, &mut rng);
        assert_eq!(next.programs()[0], best);
    }

    #[test]
    fn test_breed_falls_back_to_reproduction() {
        let mut rng = SmallRng::seed_from_u64(3);
        let config = EvolutionConfig {
            population_size: 10,
            max_init_depth: 0,
            max_depth: 0,
            operators: OperatorConfig {
                crossover_prob: 0.0,
                mutation_prob: 1.0,
                reproduction_prob: 0.0,
                ..Default::default()
            },
            ..Default::default()
        };
        let data = Dataset::from_pairs(&[(1.0, 3.0)]).unwrap();
        let pop = evaluated(&config, &data, &mut rng);

        let (next, counts) = pop.breed(&config, &mut rng);
        assert_eq!(next.len(), 10);
        assert_eq!(counts.mutation, 0);
        assert_eq!(counts.fallbacks, 9);
        assert!(next.programs().iter().all(|p| p.root.is_terminal()));
    }

    #[test]
    fn test_breed_falls_back_when_crossover_cannot_fit() {
        let mut rng = SmallRng::seed_from_u64(5);
        // Full depth-2 trees: every swap leaves one child deeper than 1.
        let sum = Node::call(Function::Add, Node::Var, Node::Var);
        let tree = Node::call(Function::Multiply, sum.clone(), sum);
        let programs = (0..10)
            .map(|i| Program {
                root: tree.clone(),
                fitness: Some(f64::from(i)),
                generation: 0,
            })
            .collect();
        let pop = Population::from_programs(programs, 0);
        let config = EvolutionConfig {
            population_size: 10,
            max_init_depth: 1,
            max_depth: 1,
            operators: OperatorConfig {
                crossover_prob: 1.0,
                mutation_prob: 0.0,
                reproduction_prob: 0.0,
                ..Default::default()
            },
            ..Default::default()
        };

        let (next, counts) = pop.breed(&config, &mut rng);
        assert_eq!(next.len(), 10);
        assert_eq!(counts.crossover, 0);
        assert!(counts.fallbacks > 0);
        assert!(next.programs().iter().all(|p| p.root.is_well_formed()));
        assert!(next.programs().iter().all(|p| p.root == tree));
        // Copies keep their parent's fitness.
        assert!(next.programs().iter().all(|p| p.fitness.is_some()));
    }

    #[test]
    fn test_best_prefers_earliest_on_tie() {
        let mut a = Program::new(Node::Var, 0);
        a.fitness = Some(1.0);
        let mut b = Program::new(Node::Const(1.0), 0);
        b.fitness = Some(1.0);
        let pop = Population::from_programs(vec![a.clone(), b], 0);
        assert_eq!(pop.best(), Some(&a));
    }
}
