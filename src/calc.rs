//! Surplus and restocking arithmetic.
use anyhow::{anyhow, ensure, Context, Result};

use crate::{
    products::{Row, PRODUCT_COUNT},
    store::{Store, Worksheet},
};

/// How many past market days the restocking figure is averaged over.
pub const HISTORY_LEN: usize = 5;

/// How much stock to prepare above average demand, as a multiplier.
pub const STOCK_BUFFER: f64 = 1.1;

/// Parses a row of cells read from `sheet` into a [`Row`].
///
/// # Errors
///
/// Returns an error if there are not exactly [`PRODUCT_COUNT`] cells, or any
/// cell is not an integer.
pub fn parse_row(sheet: Worksheet, cells: &[String]) -> Result<Row> {
    ensure!(
        cells.len() == PRODUCT_COUNT,
        "last {sheet} row has {} values, expected {PRODUCT_COUNT}: {cells:?}",
        cells.len()
    );
    let mut row = Row::default();
    for (value, cell) in row.iter_mut().zip(cells) {
        *value = parse_cell(cell).with_context(|| format!("reading {sheet} row {cells:?}"))?;
    }
    Ok(row)
}

fn parse_cell(cell: &str) -> Result<i32> {
    cell.trim()
        .parse()
        .map_err(|_| anyhow!("{cell:?} is not a whole number"))
}

/// Works out the surplus for each product, from the most recent row of the
/// `stock` worksheet and the day's `sales`.
///
/// Surplus is stock minus sales: positive figures are waste, negative figures
/// are what staff had to make up.
///
/// # Errors
///
/// Returns an error if the store cannot be read, the `stock` worksheet has no
/// data rows, or its last row is not a valid [`Row`].
pub fn calculate_surplus(store: &impl Store, sales: &Row) -> Result<Row> {
    let stock = store
        .all_values(Worksheet::Stock)
        .context("reading stock worksheet")?;
    let last = match stock.as_slice() {
        [_header, .., last] => last,
        _ => return Err(anyhow!("stock worksheet has no data rows")),
    };
    let stock = parse_row(Worksheet::Stock, last)?;
    surplus(&stock, sales)
}

/// Subtracts `sales` from `stock`, product by product.
///
/// # Errors
///
/// Returns an error naming the column if a difference does not fit in an
/// `i32`.
///
/// # Examples
///
/// ```
/// use restock::calc::surplus;
///
/// assert_eq!(
///     surplus(&[40, 17, 27, 23, 10, 8], &[10, 20, 30, 40, 50, 60]).unwrap(),
///     [30, -3, -3, -17, -40, -52]
/// );
/// assert!(surplus(&[1; 6], &[i32::MIN; 6]).is_err());
/// ```
pub fn surplus(stock: &Row, sales: &Row) -> Result<Row> {
    let mut row = Row::default();
    for (col, value) in row.iter_mut().enumerate() {
        *value = stock[col].checked_sub(sales[col]).with_context(|| {
            format!(
                "surplus for column {} is out of range: {} - {}",
                col + 1,
                stock[col],
                sales[col]
            )
        })?;
    }
    Ok(row)
}

/// Reads the last [`HISTORY_LEN`] entries of each product's column in the
/// `sales` worksheet, oldest first.
///
/// The header cell is never included. If there are fewer entries than
/// [`HISTORY_LEN`], all of them are returned.
///
/// # Errors
///
/// Returns any error from reading the store.
pub fn last_entries(store: &impl Store) -> Result<Vec<Vec<String>>> {
    (1..=PRODUCT_COUNT)
        .map(|col| -> Result<Vec<String>> {
            let column = store
                .col_values(Worksheet::Sales, col)
                .with_context(|| format!("reading sales column {col}"))?;
            let data = column.get(1..).unwrap_or_default();
            Ok(data[data.len().saturating_sub(HISTORY_LEN)..].to_vec())
        })
        .collect()
}

/// Works out the next stock level for each product from its sales
/// `history`: the average sales plus 10%, rounded to the nearest whole
/// number (halves round to even).
///
/// Each history is averaged over however many entries it has.
///
/// # Errors
///
/// Returns an error if there are not [`PRODUCT_COUNT`] histories, any history
/// is empty, or any value is not an integer.
pub fn calculate_stock<S: AsRef<str>>(history: &[Vec<S>]) -> Result<Row> {
    ensure!(
        history.len() == PRODUCT_COUNT,
        "sales history has {} columns, expected {PRODUCT_COUNT}",
        history.len()
    );
    let mut stock = Row::default();
    for (col, (level, column)) in stock.iter_mut().zip(history).enumerate() {
        let values = column
            .iter()
            .map(|v| parse_cell(v.as_ref()))
            .collect::<Result<Vec<_>>>()
            .with_context(|| format!("reading sales history for column {}", col + 1))?;
        *level = stock_level(&values)
            .with_context(|| format!("working out stock for column {}", col + 1))?;
    }
    Ok(stock)
}

/// Returns the buffered stock level for one product's sales.
///
/// # Errors
///
/// Returns an error if there are no sales figures, or the level does not fit
/// in an `i32`.
///
/// # Examples
///
/// ```
/// use restock::calc::stock_level;
///
/// assert_eq!(stock_level(&[10, 12, 14, 11, 13]).unwrap(), 13);
/// assert!(stock_level(&[]).is_err());
/// ```
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn stock_level(sales: &[i32]) -> Result<i32> {
    ensure!(!sales.is_empty(), "no sales history");
    let total: i64 = sales.iter().copied().map(i64::from).sum();
    let average = total as f64 / sales.len() as f64;
    let level = (average * STOCK_BUFFER).round_ties_even();
    ensure!(
        (f64::from(i32::MIN)..=f64::from(i32::MAX)).contains(&level),
        "stock level {level} is out of range"
    );
    Ok(level as i32)
}

#[cfg(test)]
mod tests {
    use crate::store::MemoryStore;

    use super::*;

    const HEADER: [&str; 6] = ["bacon", "chicken", "ham", "salmon", "tuna", "turkey"];

    #[test]
    fn surplus_fn_subtracts_sales_from_stock() {
        assert_eq!(
            surplus(&[40, 17, 27, 23, 10, 8], &[10, 20, 30, 40, 50, 60]).unwrap(),
            [30, -3, -3, -17, -40, -52]
        );
    }

    #[test]
    fn surplus_fn_reports_overflow_instead_of_panicking() {
        let err = surplus(&[40, 17, 27, 23, 10, 8], &[i32::MIN, 1, 1, 1, 1, 1]).unwrap_err();
        assert!(err.to_string().contains("column 1"), "{err}");
        assert!(surplus(&[i32::MIN; 6], &[1; 6]).is_err());
    }

    #[test]
    fn stock_level_fn_rejects_level_too_large_for_i32() {
        let err = stock_level(&[i32::MAX; 5]).unwrap_err();
        assert!(err.to_string().contains("out of range"), "{err}");
    }

    #[test]
    fn calculate_surplus_fn_uses_last_stock_row() {
        let mut store = MemoryStore::with_header(&HEADER);
        store.push_cells(Worksheet::Stock, &["1", "1", "1", "1", "1", "1"]);
        store.push_cells(Worksheet::Stock, &["40", "17", "27", "23", "10", "8"]);
        let surplus = calculate_surplus(&store, &[10, 20, 30, 40, 50, 60]).unwrap();
        assert_eq!(surplus, [30, -3, -3, -17, -40, -52]);
    }

    #[test]
    fn calculate_surplus_fn_fails_without_stock_rows() {
        let store = MemoryStore::with_header(&HEADER);
        let err = calculate_surplus(&store, &[0; 6]).unwrap_err();
        assert!(err.to_string().contains("no data rows"), "{err}");
    }

    #[test]
    fn calculate_surplus_fn_rejects_short_stock_row() {
        let mut store = MemoryStore::with_header(&HEADER);
        store.push_cells(Worksheet::Stock, &["40", "17", "27"]);
        let err = calculate_surplus(&store, &[0; 6]).unwrap_err();
        assert!(err.to_string().contains("has 3 values"), "{err}");
    }

    #[test]
    fn calculate_surplus_fn_rejects_non_numeric_stock() {
        let mut store = MemoryStore::with_header(&HEADER);
        store.push_cells(Worksheet::Stock, &["40", "17", "lots", "23", "10", "8"]);
        assert!(calculate_surplus(&store, &[0; 6]).is_err());
    }

    #[test]
    fn last_entries_fn_returns_last_five_oldest_first() {
        let mut store = MemoryStore::with_header(&HEADER);
        for day in 1..=7 {
            store.append_row(Worksheet::Sales, &[day; 6]).unwrap();
        }
        let history = last_entries(&store).unwrap();
        assert_eq!(history.len(), 6);
        for column in history {
            assert_eq!(column, ["3", "4", "5", "6", "7"]);
        }
    }

    #[test]
    fn last_entries_fn_returns_short_history_without_header() {
        let mut store = MemoryStore::with_header(&HEADER);
        store.append_row(Worksheet::Sales, &[1, 2, 3, 4, 5, 6]).unwrap();
        store.append_row(Worksheet::Sales, &[7, 8, 9, 10, 11, 12]).unwrap();
        let history = last_entries(&store).unwrap();
        assert_eq!(history[0], ["1", "7"]);
        assert_eq!(history[5], ["6", "12"]);
    }

    #[test]
    fn last_entries_fn_returns_empty_columns_for_header_only_sheet() {
        let store = MemoryStore::with_header(&HEADER);
        assert!(last_entries(&store).unwrap().iter().all(Vec::is_empty));
    }

    #[test]
    fn stock_level_fn_adds_ten_percent_to_average() {
        assert_eq!(stock_level(&[10, 12, 14, 11, 13]).unwrap(), 13);
        assert_eq!(stock_level(&[20, 20, 20, 20, 20]).unwrap(), 22);
        assert_eq!(stock_level(&[0, 0, 0, 0, 0]).unwrap(), 0);
    }

    #[test]
    fn stock_level_fn_averages_short_history() {
        assert_eq!(stock_level(&[10]).unwrap(), 11);
        assert_eq!(stock_level(&[10, 20]).unwrap(), 16);
    }

    #[test]
    fn stock_level_fn_rounds_halves_to_even() {
        // 15 * 1.1 == 16.5
        assert_eq!(stock_level(&[15]).unwrap(), 16);
        // 5 * 1.1 == 5.5
        assert_eq!(stock_level(&[5]).unwrap(), 6);
    }

    #[test]
    fn calculate_stock_fn_is_deterministic() {
        let history: Vec<Vec<&str>> = vec![
            vec!["10", "12", "14", "11", "13"],
            vec!["1", "2", "3", "4", "5"],
            vec!["5"],
            vec!["0", "0"],
            vec!["100", "90", "80", "70", "60"],
            vec!["7", "7", "7", "7", "8"],
        ];
        let first = calculate_stock(&history).unwrap();
        assert_eq!(first, [13, 3, 6, 0, 88, 8]);
        assert_eq!(calculate_stock(&history).unwrap(), first);
    }

    #[test]
    fn calculate_stock_fn_fails_for_empty_history() {
        let mut history = vec![vec!["1"]; 6];
        history[4].clear();
        let err = calculate_stock(&history).unwrap_err();
        assert!(err.to_string().contains("column 5"), "{err}");
    }

    #[test]
    fn calculate_stock_fn_fails_for_wrong_column_count() {
        assert!(calculate_stock(&[vec!["1"]]).is_err());
    }
}
