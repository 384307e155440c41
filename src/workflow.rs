use anyhow::{Context, Result};

use std::io::{BufRead, Write};

use crate::{
    calc::{calculate_stock, calculate_surplus, last_entries},
    input::{collect_sales, RetryPolicy},
    products::{Products, Row},
    store::{Store, Worksheet},
};

/// The three rows written by one run.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Outcome {
    pub sales: Row,
    pub surplus: Row,
    pub stock: Row,
}

/// Checks that every worksheet's header names `products` in order.
///
/// # Errors
///
/// Returns an error naming the first worksheet whose header does not match,
/// or any error from reading the store.
pub fn check_headers(store: &impl Store, products: &Products) -> Result<()> {
    for sheet in Worksheet::ALL {
        let header = store
            .header(sheet)
            .with_context(|| format!("reading {sheet} header"))?;
        products
            .check_header(&header)
            .with_context(|| format!("{sheet} worksheet does not match products {products}"))?;
    }
    Ok(())
}

/// Appends `row` to `sheet`, reporting progress on `output`.
///
/// # Errors
///
/// Returns any error from the store or from writing `output`.
pub fn update_worksheet(
    store: &mut impl Store,
    output: &mut impl Write,
    row: &Row,
    sheet: Worksheet,
) -> Result<()> {
    writeln!(output, "Updating {sheet} worksheet...\n")?;
    store
        .append_row(sheet, row)
        .with_context(|| format!("updating {sheet} worksheet"))?;
    writeln!(output, "The {sheet} worksheet has been updated successfully.\n")?;
    Ok(())
}

/// Runs the whole job: reads the day's sales from `input`, records them,
/// then works out and records the surplus and the next stock levels.
///
/// Nothing is written until the worksheet headers have been checked against
/// `products`. After that, a failure at any step ends the run, leaving the
/// rows already written in place.
///
/// # Errors
///
/// Returns an error if the headers do not match, no valid sales data is
/// entered, or any store operation fails.
pub fn run(
    store: &mut impl Store,
    products: &Products,
    input: &mut impl BufRead,
    output: &mut impl Write,
    policy: RetryPolicy,
) -> Result<Outcome> {
    check_headers(&*store, products)?;

    let sales = collect_sales(input, output, policy)?;
    log::info!("sales: {sales:?}");
    update_worksheet(store, output, &sales, Worksheet::Sales)?;

    writeln!(output, "Calculating surplus data...\n")?;
    let surplus = calculate_surplus(&*store, &sales)?;
    log::info!("surplus: {surplus:?}");
    update_worksheet(store, output, &surplus, Worksheet::Surplus)?;

    let history = last_entries(&*store)?;
    log::debug!("sales history: {history:?}");
    writeln!(output, "Calculating stocking data...\n")?;
    let stock = calculate_stock(&history)?;
    log::info!("stock: {stock:?}");
    update_worksheet(store, output, &stock, Worksheet::Stock)?;

    writeln!(output, "Thank you, see you tomorrow!\n")?;
    Ok(Outcome {
        sales,
        surplus,
        stock,
    })
}

#[cfg(test)]
mod tests {
    use crate::store::MemoryStore;

    use super::*;

    const HEADER: [&str; 6] = ["bacon", "chicken", "ham", "salmon", "tuna", "turkey"];

    fn shop() -> MemoryStore {
        let mut store = MemoryStore::with_header(&HEADER);
        for row in [
            [12, 15, 11, 10, 9, 20],
            [8, 10, 14, 13, 11, 16],
            [10, 12, 9, 15, 10, 18],
            [11, 14, 12, 9, 12, 19],
            [9, 13, 10, 11, 8, 17],
        ] {
            store.append_row(Worksheet::Sales, &row).unwrap();
        }
        store.append_row(Worksheet::Stock, &[12, 14, 13, 13, 11, 20]).unwrap();
        store
    }

    fn run_with(store: &mut MemoryStore, script: &str) -> (Result<Outcome>, String) {
        let mut output = Vec::new();
        let result = run(
            store,
            &Products::default(),
            &mut script.as_bytes(),
            &mut output,
            RetryPolicy::MaxAttempts(3),
        );
        (result, String::from_utf8(output).unwrap())
    }

    #[test]
    fn run_fn_appends_one_row_to_each_worksheet() {
        let mut store = shop();
        let (result, output) = run_with(&mut store, "5,8,12,4,6,9\n");
        let outcome = result.unwrap();
        assert_eq!(store.len(Worksheet::Sales), 7);
        assert_eq!(store.len(Worksheet::Surplus), 2);
        assert_eq!(store.len(Worksheet::Stock), 3);

        assert_eq!(outcome.sales, [5, 8, 12, 4, 6, 9]);
        assert_eq!(outcome.surplus, [7, 6, 1, 9, 5, 11]);
        // last five sales, including today's:
        // ham 14,9,12,10,12 -> 11.4 * 1.1 = 12.54
        assert_eq!(outcome.stock, [9, 13, 13, 11, 10, 17]);

        let last = |sheet| store.all_values(sheet).unwrap().pop().unwrap();
        assert_eq!(last(Worksheet::Sales), ["5", "8", "12", "4", "6", "9"]);
        assert_eq!(last(Worksheet::Surplus), ["7", "6", "1", "9", "5", "11"]);
        assert_eq!(last(Worksheet::Stock), ["9", "13", "13", "11", "10", "17"]);
        assert!(output.ends_with("Thank you, see you tomorrow!\n\n"), "{output}");
    }

    #[test]
    fn run_fn_reprompts_until_data_is_valid() {
        let mut store = shop();
        let (result, output) = run_with(&mut store, "1,2,3\n5,8,12,4,6,9\n");
        assert!(result.is_ok());
        assert!(output.contains("you provided 3"));
        assert_eq!(store.len(Worksheet::Sales), 7);
    }

    #[test]
    fn run_fn_writes_nothing_when_input_runs_out() {
        let mut store = shop();
        let (result, _) = run_with(&mut store, "oops\n");
        assert!(result.is_err());
        assert_eq!(store.len(Worksheet::Sales), 6);
        assert_eq!(store.len(Worksheet::Surplus), 1);
    }

    #[test]
    fn run_fn_checks_headers_before_writing() {
        let mut store = MemoryStore::with_header(&["a", "b", "c", "d", "e", "f"]);
        let (result, output) = run_with(&mut store, "5,8,12,4,6,9\n");
        let err = result.unwrap_err();
        assert!(format!("{err:#}").contains("column 1"), "{err:#}");
        assert!(output.is_empty());
        assert_eq!(store.len(Worksheet::Sales), 1);
    }

    #[test]
    fn run_fn_stops_after_sales_when_there_is_no_stock() {
        let mut store = MemoryStore::with_header(&HEADER);
        let (result, _) = run_with(&mut store, "5,8,12,4,6,9\n");
        assert!(result.is_err());
        assert_eq!(store.len(Worksheet::Sales), 2);
        assert_eq!(store.len(Worksheet::Surplus), 1);
        assert_eq!(store.len(Worksheet::Stock), 1);
    }

    #[test]
    fn run_fn_fails_cleanly_when_surplus_overflows() {
        let mut store = MemoryStore::with_header(&HEADER);
        store.append_row(Worksheet::Stock, &[40, 17, 27, 23, 10, 8]).unwrap();
        let (result, _) = run_with(&mut store, "-2147483648,1,1,1,1,1\n");
        let err = result.unwrap_err();
        assert!(format!("{err:#}").contains("out of range"), "{err:#}");
        assert_eq!(store.len(Worksheet::Sales), 2);
        assert_eq!(store.len(Worksheet::Surplus), 1);
    }

    #[test]
    fn run_fn_averages_short_history() {
        let mut store = MemoryStore::with_header(&HEADER);
        store.append_row(Worksheet::Stock, &[10; 6]).unwrap();
        let (result, _) = run_with(&mut store, "10,20,30,40,50,60\n");
        let outcome = result.unwrap();
        assert_eq!(outcome.surplus, [0, -10, -20, -30, -40, -50]);
        assert_eq!(outcome.stock, [11, 22, 33, 44, 55, 66]);
    }
}
