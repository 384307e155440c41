use anyhow::{bail, ensure, Result};

use std::{fmt::Display, str::FromStr};

/// The number of products on sale. Every row in every worksheet has exactly
/// this many values.
pub const PRODUCT_COUNT: usize = 6;

/// One value per product, in the same order as [`Products`].
pub type Row = [i32; PRODUCT_COUNT];

/// The ordered list of product names that rows are aligned to.
///
/// Column `i` of every worksheet holds figures for product `i`. The header
/// row of each worksheet must name the same products in the same order; see
/// [`Products::check_header`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Products([String; PRODUCT_COUNT]);

impl Default for Products {
    fn default() -> Self {
        Self(["bacon", "chicken", "ham", "salmon", "tuna", "turkey"].map(String::from))
    }
}

impl Products {
    /// Creates a product list from `names`.
    ///
    /// # Errors
    ///
    /// Returns an error unless there are exactly [`PRODUCT_COUNT`] names, all
    /// non-empty.
    pub fn new<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        let names: Vec<String> = names.iter().map(|n| n.as_ref().trim().to_string()).collect();
        ensure!(
            names.iter().all(|n| !n.is_empty()),
            "product names must not be empty"
        );
        let count = names.len();
        match names.try_into() {
            Ok(names) => Ok(Self(names)),
            Err(_) => bail!("exactly {PRODUCT_COUNT} products are required, got {count}"),
        }
    }

    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.0
    }

    /// Checks that `header` names the same products, in the same order.
    ///
    /// Comparison ignores surrounding whitespace and case.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first mismatch.
    pub fn check_header(&self, header: &[String]) -> Result<()> {
        ensure!(
            header.len() == PRODUCT_COUNT,
            "header has {} columns, expected {PRODUCT_COUNT} ({self})",
            header.len()
        );
        for (col, (want, got)) in self.0.iter().zip(header).enumerate() {
            ensure!(
                want.eq_ignore_ascii_case(got.trim()),
                "column {} is {got:?}, expected {want:?}",
                col + 1
            );
        }
        Ok(())
    }
}

impl FromStr for Products {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::new(&s.split(',').collect::<Vec<_>>())
    }
}

impl Display for Products {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.join(", "))
    }
}
