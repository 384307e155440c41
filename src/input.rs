use anyhow::{bail, Context, Result};
use thiserror::Error;

use std::{
    io::{BufRead, Write},
    num::IntErrorKind,
};

use crate::products::{Row, PRODUCT_COUNT};

/// Why a line of sales data was rejected.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ValidationError {
    #[error("{token:?} is not a whole number")]
    NotAnInteger { token: String },
    #[error("{token:?} is out of range ({} to {})", i32::MIN, i32::MAX)]
    OutOfRange { token: String },
    #[error("Exactly {} values are required, you provided {count}", PRODUCT_COUNT)]
    WrongCount { count: usize },
}

/// How many lines of input to read before giving up.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum RetryPolicy {
    /// Keep asking until valid data arrives.
    #[default]
    Unbounded,
    /// Give up after this many rejected lines.
    MaxAttempts(usize),
}

impl RetryPolicy {
    fn allows(self, attempt: usize) -> bool {
        match self {
            Self::Unbounded => true,
            Self::MaxAttempts(max) => attempt <= max,
        }
    }
}

/// Checks that `tokens` are exactly [`PRODUCT_COUNT`] integers, each fitting
/// in an `i32`, and returns them.
///
/// Every token is checked for being an integer before the count is checked,
/// so `1,x` is reported as a bad token rather than a short line. Whitespace
/// around each token is ignored.
///
/// # Errors
///
/// Returns a [`ValidationError`] naming the first problem found.
///
/// # Examples
///
/// ```
/// use restock::input::{validate, ValidationError};
///
/// assert_eq!(validate(&["1", "2", "3", "4", "5", "6"]), Ok([1, 2, 3, 4, 5, 6]));
/// assert_eq!(validate(&["1", "2"]), Err(ValidationError::WrongCount { count: 2 }));
/// ```
pub fn validate<S: AsRef<str>>(tokens: &[S]) -> Result<Row, ValidationError> {
    let values = tokens
        .iter()
        .map(|t| {
            let t = t.as_ref().trim();
            t.parse::<i32>().map_err(|e| match e.kind() {
                IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => {
                    ValidationError::OutOfRange {
                        token: t.to_string(),
                    }
                }
                _ => ValidationError::NotAnInteger {
                    token: t.to_string(),
                },
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    let count = values.len();
    values
        .try_into()
        .map_err(|_| ValidationError::WrongCount { count })
}

/// Prompts on `output` for a line of sales figures and reads it from `input`,
/// repeating until the line is valid or `policy` runs out.
///
/// # Errors
///
/// Returns an error if reading or writing the console fails, if `input` ends
/// before a valid line is read, or if `policy` allows no more attempts.
pub fn collect_sales(
    input: &mut impl BufRead,
    output: &mut impl Write,
    policy: RetryPolicy,
) -> Result<Row> {
    let mut attempt = 1;
    loop {
        if !policy.allows(attempt) {
            bail!("no valid sales data after {} attempts", attempt - 1);
        }
        writeln!(output, "---Please enter sales data from the last market.---")?;
        writeln!(output, "--Data should be six numbers, separated by commas--")?;
        writeln!(output, "------------Example: 10,20,30,40,50,60-------------\n")?;
        writeln!(output, "Enter your data here:")?;
        output.flush()?;

        let mut line = String::new();
        let read = input.read_line(&mut line).context("reading sales data")?;
        if read == 0 {
            bail!("input closed before valid sales data was entered");
        }
        let tokens: Vec<&str> = line.trim_end_matches(['\r', '\n']).split(',').collect();
        match validate(&tokens) {
            Ok(row) => {
                writeln!(output, "\n\nData accepted.\n")?;
                log::debug!("accepted sales data {row:?} on attempt {attempt}");
                return Ok(row);
            }
            Err(e) => {
                writeln!(output, "Invalid data: {e}, please try again.\n")?;
                log::debug!("rejected {line:?}: {e}");
            }
        }
        attempt += 1;
    }
}
