//! Dataset validation command implementation.

use super::CliError;
use std::path::PathBuf;
use symreg::dataset::{DEFAULT_MAX_ROWS, Dataset, HEADER_LINES};

/// Execute the validate command.
///
/// # Errors
///
/// Returns an error if the dataset cannot be read or parsed.
#[allow(clippy::needless_pass_by_value)]
pub(crate) fn execute(dataset: PathBuf, rows: Option<usize>) -> Result<(), CliError> {
    let max_rows = rows.unwrap_or(DEFAULT_MAX_ROWS);
    println!("Validating: {}", dataset.display());
    println!();

    let data = match Dataset::load(&dataset, max_rows) {
        Ok(data) => {
            print_check("Parse", true);
            data
        }
        Err(e) => {
            print_check("Parse", false);
            return Err(CliError::new(format!("Invalid dataset: {e}")));
        }
    };

    let finite = data.rows().all(|(x, y)| x.is_finite() && y.is_finite());
    print_check("All values finite", finite);

    println!();
    println!("Summary:");
    println!("  Header lines skipped: {HEADER_LINES}");
    println!("  Rows used:            {} (max {max_rows})", data.len());
    if let (Some(min), Some(max)) = (
        data.inputs().iter().copied().reduce(f64::min),
        data.inputs().iter().copied().reduce(f64::max),
    ) {
        println!("  Input range:          [{min}, {max}]");
    }

    if !finite {
        return Err(CliError::new("Dataset contains non-finite values"));
    }

    println!();
    println!("Validation successful!");

    Ok(())
}

fn print_check(name: &str, ok: bool) {
    let status = if ok { "OK" } else { "FAILED" };
    let symbol = if ok { "✓" } else { "✗" };
    println!("  {symbol} {name}: {status}");
}
