//! Output formatting utilities for CLI.

use serde::Serialize;
use std::fmt::Write as _;
use symreg::gp::{EvolutionStats, Program};
use symreg::Dataset;

/// JSON-serializable evolution result.
#[derive(Debug, Serialize)]
pub(super) struct JsonRunResult {
    /// Best program as an infix expression.
    pub(super) expression: String,
    /// Fitness of the best program.
    pub(super) fitness: f64,
    /// Generation in which the best program was first seen.
    pub(super) generation: usize,
    /// Tree depth of the best program.
    pub(super) depth: usize,
    /// Node count of the best program.
    pub(super) size: usize,
    /// Whether the acceptance threshold was met.
    pub(super) solved: bool,
    /// Generations evaluated.
    pub(super) generations_run: usize,
    /// Wall-clock time of the run.
    pub(super) elapsed_seconds: f64,
    /// Per-row comparison against the dataset.
    pub(super) predictions: Vec<JsonPrediction>,
}

/// JSON-serializable prediction for one dataset row.
#[derive(Debug, Serialize)]
pub(super) struct JsonPrediction {
    /// Input value.
    pub(super) input: f64,
    /// Expected output.
    pub(super) expected: f64,
    /// Program output. Non-finite values serialize as null.
    pub(super) predicted: Option<f64>,
}

impl JsonRunResult {
    /// Create from the best program and the run statistics.
    pub(super) fn from_run(best: &Program, stats: &EvolutionStats, dataset: &Dataset) -> Self {
        Self {
            expression: best.root.to_string(),
            fitness: stats.best_fitness,
            generation: stats.best_generation,
            depth: best.depth(),
            size: best.size(),
            solved: stats.solved,
            generations_run: stats.generations_run,
            elapsed_seconds: stats.elapsed_seconds,
            predictions: dataset
                .rows()
                .map(|(input, expected)| {
                    let predicted = best.evaluate(input);
                    JsonPrediction {
                        input,
                        expected,
                        predicted: predicted.is_finite().then_some(predicted),
                    }
                })
                .collect(),
        }
    }
}

/// Format a finished run as human-readable text.
pub(super) fn format_text(best: &Program, stats: &EvolutionStats, dataset: &Dataset) -> String {
    let mut output = String::new();

    let outcome = if stats.solved {
        "solution found"
    } else {
        "generation cap reached"
    };
    let _ = writeln!(
        output,
        "Evolution complete ({outcome}, {} generations)",
        stats.generations_run
    );
    let _ = writeln!(output, "  Best program: {}", best.root);
    let _ = writeln!(output, "  Fitness: {}", stats.best_fitness);
    let _ = writeln!(output, "  Found in generation: {}", stats.best_generation);
    let _ = writeln!(output, "  Depth: {}  Size: {}", best.depth(), best.size());
    let _ = writeln!(output, "  Elapsed time: {:.1}s\n", stats.elapsed_seconds);

    output.push_str("  input        expected     predicted\n");
    for (input, expected) in dataset.rows() {
        let _ = writeln!(
            output,
            "  {input:<12} {expected:<12} {}",
            best.evaluate(input)
        );
    }

    output
}
