//! Genetic programming engine for symbolic regression.
//!
//! Programs are expression trees over a single input variable `X`. A
//! population of random trees is scored against a dataset and bred
//! generation after generation until one fits the data or the generation
//! cap is reached.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │         Evolution Loop              │
//! ├─────────────────────────────────────┤
//! │  Selection │ Crossover │ Mutation   │
//! ├─────────────────────────────────────┤
//! │    Fitness Evaluation (rayon)       │
//! ├─────────────────────────────────────┤
//! │    Expression Trees (Node)          │
//! └─────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use symreg::dataset::Dataset;
//! use symreg::gp::{EvolutionConfig, LogObserver, evolve};
//!
//! let data = Dataset::from_pairs(&[(1.0, 3.0), (2.0, 5.0), (3.0, 7.0)])?;
//! let (best, stats) = evolve(&EvolutionConfig::default(), &data, &mut LogObserver)?;
//! println!("{} (fitness {})", best.root, stats.best_fitness);
//! ```

mod evolution;
mod fitness;
mod node;
mod operators;
mod population;
mod program;
mod selection;

pub use evolution::{
    EvolutionConfig, EvolutionObserver, EvolutionStats, GenerationStats, LogObserver,
    NullObserver, evolve,
};
pub use fitness::{ACCEPTANCE_THRESHOLD, FitnessEvaluator, UNUSABLE_FITNESS};
pub use node::{
    ConstructionConfig, Function, InitMethod, Node, NodeSet, Point, Primitive, VARIABLE_NAME,
};
pub use operators::{Operation, OperatorConfig, crossover, mutate, reproduce};
pub use population::{OperatorCounts, Population};
pub use program::Program;
pub use selection::{SelectionConfig, SelectionMethod, SelectionStats, Selector, select_elite};
