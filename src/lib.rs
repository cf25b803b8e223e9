// Allow unwrap and unreadable literals in tests (test code is not production)
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::unreadable_literal))]
//! Symreg: symbolic regression by tree-based genetic programming.
//!
//! Given sample pairs `(x, y)`, the engine searches for an arithmetic
//! expression in `X` whose outputs match the samples:
//! - Expression trees over `+ - * / ^`, `X` and integer constants
//! - Sum-of-absolute-error fitness, evaluated in parallel
//! - Seeded runs that are reproducible end to end
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │        CLI (evolve / validate)      │
//! ├─────────────────────────────────────┤
//! │         GP Engine (gp)              │
//! ├─────────────────────────────────────┤
//! │    Dataset Loading (dataset)        │
//! └─────────────────────────────────────┘
//! ```

pub mod dataset;
pub mod error;
pub mod gp;

pub use dataset::Dataset;
pub use error::{ConfigError, ConstructionError, DatasetError, EvolutionError};

// Re-export the engine entry points at crate root for convenience
pub use gp::{EvolutionConfig, EvolutionStats, Node, Program, evolve};
