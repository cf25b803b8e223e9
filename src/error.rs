//! Error types for the symbolic regression engine.
//!
//! Only configuration-time problems are fatal. Per-individual anomalies
//! (non-finite evaluations, failed operator applications) never surface
//! here; they are absorbed by the fitness sentinel and the reproduction
//! fallback.

use std::fmt;

/// Invalid engine configuration, detected before any population exists.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The node set has no primitives at all.
    EmptyNodeSet,
    /// The node set has no terminal, so no tree can ever be closed off.
    NoTerminals,
    /// The population must hold at least one program.
    EmptyPopulation,
    /// The initial depth may not exceed the global depth bound.
    InitDepthExceedsMax {
        /// Configured maximum initial depth.
        init: usize,
        /// Configured global maximum depth.
        max: usize,
    },
    /// An operator probability is non-finite or outside `[0, 1]`.
    InvalidProbability {
        /// Which probability is wrong.
        name: &'static str,
        /// The rejected value.
        value: f64,
    },
    /// Crossover, mutation and reproduction are all zero.
    NoOperators,
    /// Tournament selection needs at least one competitor.
    ZeroTournamentSize,
    /// Elites would fill the whole population.
    TooManyElites {
        /// Configured elite count.
        elites: usize,
        /// Configured population size.
        population: usize,
    },
    /// A constant terminal has an unusable range.
    InvalidConstantRange {
        /// Lower bound.
        min: f64,
        /// Upper bound.
        max: f64,
    },
    /// The acceptance threshold is negative or non-finite.
    InvalidThreshold(f64),
    /// The generation cap must allow at least one generation.
    ZeroGenerationCap,
    /// Progress reports need a positive interval.
    ZeroReportInterval,
    /// A retry bound is zero, so no attempt would ever be made.
    ZeroAttempts(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyNodeSet => write!(f, "node set is empty"),
            Self::NoTerminals => write!(f, "node set contains no terminal"),
            Self::EmptyPopulation => write!(f, "population size must be positive"),
            Self::InitDepthExceedsMax { init, max } => {
                write!(f, "max initial depth {init} exceeds max depth {max}")
            }
            Self::InvalidProbability { name, value } => {
                write!(f, "{name} probability {value} is outside [0, 1]")
            }
            Self::NoOperators => write!(f, "all operator probabilities are zero"),
            Self::ZeroTournamentSize => write!(f, "tournament size must be positive"),
            Self::TooManyElites { elites, population } => {
                write!(f, "elite count {elites} must be below population size {population}")
            }
            Self::InvalidConstantRange { min, max } => {
                write!(f, "invalid constant range [{min}, {max}]")
            }
            Self::InvalidThreshold(t) => write!(f, "invalid acceptance threshold {t}"),
            Self::ZeroGenerationCap => write!(f, "generation cap must be positive"),
            Self::ZeroReportInterval => write!(f, "report interval must be positive"),
            Self::ZeroAttempts(what) => write!(f, "{what} attempt bound must be positive"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Random tree construction could not produce a well-formed tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstructionError {
    /// Every attempt was discarded; the constraints are unsatisfiable.
    Exhausted {
        /// Number of attempts made.
        attempts: usize,
        /// Depth bound the trees had to respect.
        max_depth: usize,
    },
}

impl fmt::Display for ConstructionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exhausted { attempts, max_depth } => write!(
                f,
                "no well-formed tree of depth <= {max_depth} after {attempts} attempts"
            ),
        }
    }
}

impl std::error::Error for ConstructionError {}

/// Error while loading a dataset.
#[derive(Debug)]
pub enum DatasetError {
    /// Reading the source failed.
    Io(std::io::Error),
    /// A token could not be parsed as a number.
    Parse {
        /// 1-based line number in the source.
        line: usize,
        /// The offending token.
        token: String,
    },
    /// Inputs and outputs differ in length.
    LengthMismatch {
        /// Number of inputs.
        inputs: usize,
        /// Number of outputs.
        outputs: usize,
    },
    /// The source contained no rows.
    Empty,
}

impl fmt::Display for DatasetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Parse { line, token } => write!(f, "line {line}: cannot parse {token:?}"),
            Self::LengthMismatch { inputs, outputs } => {
                write!(f, "{inputs} inputs but {outputs} outputs")
            }
            Self::Empty => write!(f, "dataset has no rows"),
        }
    }
}

impl std::error::Error for DatasetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for DatasetError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

/// Error during an evolution run.
#[derive(Debug, Clone, PartialEq)]
pub enum EvolutionError {
    /// The configuration was rejected.
    Config(ConfigError),
    /// The initial population could not be built.
    Construction(ConstructionError),
}

impl fmt::Display for EvolutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "configuration error: {e}"),
            Self::Construction(e) => write!(f, "construction error: {e}"),
        }
    }
}

impl std::error::Error for EvolutionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Construction(e) => Some(e),
        }
    }
}

impl From<ConfigError> for EvolutionError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<ConstructionError> for EvolutionError {
    fn from(e: ConstructionError) -> Self {
        Self::Construction(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let e = ConfigError::InvalidProbability {
            name: "mutation",
            value: 35.0,
        };
        assert_eq!(e.to_string(), "mutation probability 35 is outside [0, 1]");
    }

    #[test]
    fn test_evolution_error_wraps_source() {
        use std::error::Error;
        let e = EvolutionError::from(ConstructionError::Exhausted {
            attempts: 3,
            max_depth: 2,
        });
        assert!(e.source().is_some());
        assert!(e.to_string().contains("3 attempts"));
    }
}
