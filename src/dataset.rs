//! Input/output samples the search is fitted against.
//!
//! The text format is two free-form header lines followed by whitespace
//! separated `input output` pairs, e.g.
//!
//! ```text
//! f(x) = 2x + 1
//! x y
//! 1 3
//! 2 5
//! 3 7
//! ```

use crate::error::DatasetError;
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Number of rows read from a source by default.
pub const DEFAULT_MAX_ROWS: usize = 20;

/// Header lines skipped before the data starts.
pub const HEADER_LINES: usize = 2;

/// Paired input and expected output values. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    inputs: Vec<f64>,
    outputs: Vec<f64>,
}

impl Dataset {
    /// Build a dataset from two equal-length sequences.
    ///
    /// # Errors
    ///
    /// Returns an error if the lengths differ or there are no rows.
    pub fn new(inputs: Vec<f64>, outputs: Vec<f64>) -> Result<Self, DatasetError> {
        if inputs.len() != outputs.len() {
            return Err(DatasetError::LengthMismatch {
                inputs: inputs.len(),
                outputs: outputs.len(),
            });
        }
        if inputs.is_empty() {
            return Err(DatasetError::Empty);
        }
        Ok(Self { inputs, outputs })
    }

    /// Build a dataset from `(input, output)` pairs.
    ///
    /// # Errors
    ///
    /// Returns an error if `pairs` is empty.
    pub fn from_pairs(pairs: &[(f64, f64)]) -> Result<Self, DatasetError> {
        let (inputs, outputs) = pairs.iter().copied().unzip();
        Self::new(inputs, outputs)
    }

    /// Parse a dataset from text, keeping at most `max_rows` rows.
    ///
    /// Anything after the first `max_rows` complete pairs is ignored.
    ///
    /// # Errors
    ///
    /// Returns an error on I/O failure, an unparsable number, an unpaired
    /// trailing value, or when no rows were found.
    pub fn parse<R: BufRead>(reader: R, max_rows: usize) -> Result<Self, DatasetError> {
        let wanted = max_rows.saturating_mul(2);
        let mut values = Vec::with_capacity(wanted);

        'lines: for (idx, line) in reader.lines().enumerate().skip(HEADER_LINES) {
            let line = line?;
            for token in line.split_whitespace() {
                if values.len() == wanted {
                    break 'lines;
                }
                let value = token.parse::<f64>().map_err(|_| DatasetError::Parse {
                    line: idx + 1,
                    token: token.to_string(),
                })?;
                values.push(value);
            }
        }

        if values.len() % 2 != 0 {
            return Err(DatasetError::LengthMismatch {
                inputs: values.len().div_ceil(2),
                outputs: values.len() / 2,
            });
        }

        let (inputs, outputs) = values.chunks_exact(2).map(|pair| (pair[0], pair[1])).unzip();
        Self::new(inputs, outputs)
    }

    /// Load a dataset file, keeping at most `max_rows` rows.
    ///
    /// # Errors
    ///
    /// See [`Dataset::parse`]; also fails if the file cannot be opened.
    pub fn load(path: &Path, max_rows: usize) -> Result<Self, DatasetError> {
        let file = fs::File::open(path)?;
        Self::parse(BufReader::new(file), max_rows)
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    /// Always false for a constructed dataset.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    /// Input values.
    #[must_use]
    pub fn inputs(&self) -> &[f64] {
        &self.inputs
    }

    /// Expected output values.
    #[must_use]
    pub fn outputs(&self) -> &[f64] {
        &self.outputs
    }

    /// `(input, expected)` rows in order.
    pub fn rows(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.inputs.iter().copied().zip(self.outputs.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const SAMPLE: &str = "f(x) = 2x + 1\nx y\n1 3\n2 5\n3 7\n";

    #[test]
    fn test_parse_skips_header() {
        let data = Dataset::parse(Cursor::new(SAMPLE), DEFAULT_MAX_ROWS).unwrap();
        assert_eq!(data.len(), 3);
        assert_eq!(data.rows().collect::<Vec<_>>(), vec![(1.0, 3.0), (2.0, 5.0), (3.0, 7.0)]);
    }

    #[test]
    fn test_parse_caps_rows() {
        let data = Dataset::parse(Cursor::new(SAMPLE), 2).unwrap();
        assert_eq!(data.inputs(), &[1.0, 2.0]);
    }

    #[test]
    fn test_pairs_may_span_lines() {
        let text = "h\nh\n1 3 2\n5\n";
        let data = Dataset::parse(Cursor::new(text), 10).unwrap();
        assert_eq!(data.outputs(), &[3.0, 5.0]);
    }

    #[test]
    fn test_parse_errors() {
        let bad = Dataset::parse(Cursor::new("h\nh\n1 abc\n"), 10).unwrap_err();
        assert!(matches!(bad, DatasetError::Parse { line: 3, ref token } if token == "abc"));

        let odd = Dataset::parse(Cursor::new("h\nh\n1 2 3\n"), 10).unwrap_err();
        assert!(matches!(odd, DatasetError::LengthMismatch { inputs: 2, outputs: 1 }));

        let empty = Dataset::parse(Cursor::new("h\nh\n"), 10).unwrap_err();
        assert!(matches!(empty, DatasetError::Empty));
    }

    #[test]
    fn test_new_rejects_mismatch() {
        let err = Dataset::new(vec![1.0, 2.0], vec![1.0]).unwrap_err();
        assert!(matches!(err, DatasetError::LengthMismatch { inputs: 2, outputs: 1 }));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.txt");
        std::fs::write(&path, SAMPLE).unwrap();
        let data = Dataset::load(&path, DEFAULT_MAX_ROWS).unwrap();
        assert_eq!(data.len(), 3);

        let missing = Dataset::load(&dir.path().join("nope.txt"), 20).unwrap_err();
        assert!(matches!(missing, DatasetError::Io(_)));
    }
}
