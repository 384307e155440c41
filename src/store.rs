//! The worksheets the tool reads and writes, and the [`Store`] trait that
//! backends implement.
use anyhow::{ensure, Context, Result};

use std::{collections::BTreeMap, fmt::Display};

use crate::products::Row;

/// One of the three worksheets in the spreadsheet.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Worksheet {
    Sales,
    Surplus,
    Stock,
}

impl Worksheet {
    pub const ALL: [Worksheet; 3] = [Self::Sales, Self::Surplus, Self::Stock];

    /// The worksheet's name in the spreadsheet.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Sales => "sales",
            Self::Surplus => "surplus",
            Self::Stock => "stock",
        }
    }
}

impl Display for Worksheet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Somewhere the worksheets live.
///
/// Cell values are returned as the strings the backend holds; callers parse
/// them. The first row of each worksheet is its header.
pub trait Store {
    /// Appends `row` after the last row of `sheet`.
    ///
    /// # Errors
    ///
    /// Returns any error from the backend.
    fn append_row(&mut self, sheet: Worksheet, row: &Row) -> Result<()>;

    /// Returns every row of `sheet`, header first.
    ///
    /// # Errors
    ///
    /// Returns any error from the backend.
    fn all_values(&self, sheet: Worksheet) -> Result<Vec<Vec<String>>>;

    /// Returns column `col` (numbered from 1) of `sheet`, header first.
    ///
    /// Trailing empty cells are not included.
    ///
    /// # Errors
    ///
    /// Returns an error if `col` is zero, or any error from the backend.
    fn col_values(&self, sheet: Worksheet, col: usize) -> Result<Vec<String>> {
        ensure!(col > 0, "columns are numbered from 1");
        let mut column: Vec<String> = self
            .all_values(sheet)?
            .into_iter()
            .map(|row| row.into_iter().nth(col - 1).unwrap_or_default())
            .collect();
        while column.last().is_some_and(String::is_empty) {
            column.pop();
        }
        Ok(column)
    }

    /// Returns the header row of `sheet`, or an empty row if the sheet is
    /// empty.
    ///
    /// # Errors
    ///
    /// Returns any error from the backend.
    fn header(&self, sheet: Worksheet) -> Result<Vec<String>> {
        Ok(self.all_values(sheet)?.into_iter().next().unwrap_or_default())
    }
}

impl<S: Store + ?Sized> Store for Box<S> {
    fn append_row(&mut self, sheet: Worksheet, row: &Row) -> Result<()> {
        (**self).append_row(sheet, row)
    }

    fn all_values(&self, sheet: Worksheet) -> Result<Vec<Vec<String>>> {
        (**self).all_values(sheet)
    }

    fn col_values(&self, sheet: Worksheet, col: usize) -> Result<Vec<String>> {
        (**self).col_values(sheet, col)
    }

    fn header(&self, sheet: Worksheet) -> Result<Vec<String>> {
        (**self).header(sheet)
    }
}

/// A [`Store`] that keeps worksheets in memory.
///
/// # Examples
///
/// ```
/// use restock::{MemoryStore, Store, Worksheet};
///
/// let mut store = MemoryStore::with_header(&["a", "b", "c", "d", "e", "f"]);
/// store.append_row(Worksheet::Stock, &[1, 2, 3, 4, 5, 6]).unwrap();
/// assert_eq!(store.all_values(Worksheet::Stock).unwrap().len(), 2);
/// assert_eq!(store.col_values(Worksheet::Stock, 2).unwrap(), ["b", "2"]);
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    sheets: BTreeMap<Worksheet, Vec<Vec<String>>>,
}

impl MemoryStore {
    /// Creates a store whose worksheets each contain only `header`.
    #[must_use]
    pub fn with_header(header: &[&str]) -> Self {
        let header: Vec<String> = header.iter().map(ToString::to_string).collect();
        Self {
            sheets: Worksheet::ALL
                .into_iter()
                .map(|sheet| (sheet, vec![header.clone()]))
                .collect(),
        }
    }

    /// Appends a row of raw cell values to `sheet`, creating it if needed.
    pub fn push_cells(&mut self, sheet: Worksheet, cells: &[&str]) {
        self.sheets
            .entry(sheet)
            .or_default()
            .push(cells.iter().map(ToString::to_string).collect());
    }

    /// Returns the number of rows in `sheet`, including the header.
    #[must_use]
    pub fn len(&self, sheet: Worksheet) -> usize {
        self.sheets.get(&sheet).map_or(0, Vec::len)
    }
}

impl Store for MemoryStore {
    fn append_row(&mut self, sheet: Worksheet, row: &Row) -> Result<()> {
        self.sheets
            .get_mut(&sheet)
            .with_context(|| format!("no such worksheet: {sheet}"))?
            .push(row.iter().map(ToString::to_string).collect());
        Ok(())
    }

    fn all_values(&self, sheet: Worksheet) -> Result<Vec<Vec<String>>> {
        self.sheets
            .get(&sheet)
            .cloned()
            .with_context(|| format!("no such worksheet: {sheet}"))
    }
}
