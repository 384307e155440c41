use anyhow::{ensure, Context, Result};

use std::{
    fs::{File, OpenOptions},
    io::{Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};

use crate::{
    products::Row,
    store::{Store, Worksheet},
};

/// A [`Store`] that keeps each worksheet in a CSV file in one directory.
///
/// The files are named after the worksheets: `sales.csv`, `surplus.csv` and
/// `stock.csv`. Each begins with a header line, just like the spreadsheet.
#[derive(Debug)]
pub struct CsvStore {
    dir: PathBuf,
}

impl CsvStore {
    /// Opens the worksheets in `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the three worksheet files is missing.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let store = Self {
            dir: dir.as_ref().to_path_buf(),
        };
        for sheet in Worksheet::ALL {
            let path = store.path(sheet);
            ensure!(path.is_file(), "missing worksheet file {}", path.display());
        }
        Ok(store)
    }

    #[must_use]
    pub fn path(&self, sheet: Worksheet) -> PathBuf {
        self.dir.join(format!("{sheet}.csv"))
    }
}

/// Writes a newline at the end of `file` unless it is empty or already ends
/// with one, so that appended records start on their own line.
fn terminate_last_line(file: &mut File) -> Result<()> {
    if file.seek(SeekFrom::End(0))? == 0 {
        return Ok(());
    }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8];
    file.read_exact(&mut last)?;
    if last[0] != b'\n' {
        file.write_all(b"\n")?;
    }
    Ok(())
}

impl Store for CsvStore {
    fn append_row(&mut self, sheet: Worksheet, row: &Row) -> Result<()> {
        let path = self.path(sheet);
        log::debug!("appending {row:?} to {}", path.display());
        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("opening {}", path.display()))?;
        terminate_last_line(&mut file).with_context(|| format!("{}", path.display()))?;
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        wtr.serialize(row)
            .with_context(|| format!("writing {}", path.display()))?;
        wtr.flush()?;
        Ok(())
    }

    fn all_values(&self, sheet: Worksheet) -> Result<Vec<Vec<String>>> {
        let path = self.path(sheet);
        log::debug!("reading {}", path.display());
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&path)
            .with_context(|| format!("opening {}", path.display()))?;
        let mut rows = Vec::new();
        for result in rdr.records() {
            let record = result.with_context(|| format!("{}", path.display()))?;
            rows.push(record.iter().map(ToString::to_string).collect());
        }
        Ok(rows)
    }
}
