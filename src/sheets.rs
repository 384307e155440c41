//! A [`Store`] backed by a Google spreadsheet, using the Sheets v4 values API.
use anyhow::{anyhow, bail, ensure, Context, Result};
use regex::Regex;
use reqwest::{
    blocking::{Client, RequestBuilder},
    Url,
};
use serde::{Deserialize, Serialize};

use crate::{
    products::Row,
    store::{Store, Worksheet},
};

pub const DEFAULT_API_BASE: &str = "https://sheets.googleapis.com/v4";

/// A connection to one Google spreadsheet.
///
/// Every call blocks until the API answers. Requests are authorised with a
/// bearer access token that the caller has already obtained.
pub struct SheetsClient {
    http: Client,
    base: Url,
    spreadsheet_id: String,
    token: String,
    updated_range: Regex,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

#[derive(Debug, Serialize)]
struct AppendBody<'a> {
    values: [&'a Row; 1],
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppendResponse {
    updates: Updates,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Updates {
    updated_range: String,
}

#[derive(Clone, Copy, Debug)]
enum Dimension {
    Rows,
    Columns,
}

impl Dimension {
    fn as_str(self) -> &'static str {
        match self {
            Self::Rows => "ROWS",
            Self::Columns => "COLUMNS",
        }
    }
}

impl SheetsClient {
    /// Creates a client for the spreadsheet `spreadsheet_id`, talking to the
    /// API at `api_base` (normally [`DEFAULT_API_BASE`]).
    ///
    /// # Errors
    ///
    /// Returns an error if `api_base` is not a valid base URL, or the HTTP
    /// client cannot be built.
    pub fn new(api_base: &str, spreadsheet_id: &str, token: &str) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("building HTTP client")?;
        Self::with_client(http, api_base, spreadsheet_id, token)
    }

    /// Like [`SheetsClient::new`], but sends requests with `http`, for callers
    /// that need their own proxy or timeout settings.
    ///
    /// # Errors
    ///
    /// Returns an error if `api_base` is not a valid base URL.
    pub fn with_client(
        http: Client,
        api_base: &str,
        spreadsheet_id: &str,
        token: &str,
    ) -> Result<Self> {
        let base = Url::parse(api_base).with_context(|| format!("bad API base URL {api_base:?}"))?;
        if base.cannot_be_a_base() {
            bail!("bad API base URL {api_base:?}: cannot be a base");
        }
        Ok(Self {
            http,
            base,
            spreadsheet_id: spreadsheet_id.to_string(),
            token: token.to_string(),
            updated_range: Regex::new(r"^'?[^!]*?'?!\$?[A-Z]+\$?(\d+)(?::\$?[A-Z]+\$?\d+)?$")?,
        })
    }

    /// Returns the URL for `range` of this spreadsheet's values, with `suffix`
    /// (such as `:append`) attached to the range.
    fn values_url(&self, range: &str, suffix: &str) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| anyhow!("{} cannot be a base URL", self.base))?
            .pop_if_empty()
            .extend(["spreadsheets", &self.spreadsheet_id, "values"])
            .push(&format!("{range}{suffix}"));
        Ok(url)
    }

    fn send(&self, request: RequestBuilder, what: &str) -> Result<reqwest::blocking::Response> {
        let response = request
            .bearer_auth(&self.token)
            .send()
            .with_context(|| format!("{what}: request failed"))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            bail!("{what}: {status}: {}", body.trim());
        }
        Ok(response)
    }

    fn get_values(&self, range: &str, dimension: Dimension) -> Result<Vec<Vec<String>>> {
        let url = self.values_url(range, "")?;
        log::debug!("GET {url} ({})", dimension.as_str());
        let request = self
            .http
            .get(url)
            .query(&[("majorDimension", dimension.as_str())]);
        let what = format!("reading {range}");
        let values: ValueRange = self
            .send(request, &what)?
            .json()
            .with_context(|| format!("{what}: malformed response"))?;
        Ok(values.values)
    }

    /// Returns the row number in an `updatedRange` such as `sales!A7:F7`.
    fn updated_row(&self, range: &str) -> Option<u32> {
        self.updated_range
            .captures(range)
            .and_then(|c| c[1].parse().ok())
    }
}

impl Store for SheetsClient {
    fn append_row(&mut self, sheet: Worksheet, row: &Row) -> Result<()> {
        let url = self.values_url(&format!("{sheet}!A1"), ":append")?;
        log::debug!("POST {url} {row:?}");
        let request = self
            .http
            .post(url)
            .query(&[
                ("valueInputOption", "USER_ENTERED"),
                ("insertDataOption", "INSERT_ROWS"),
            ])
            .json(&AppendBody { values: [row] });
        let what = format!("appending to {sheet}");
        let response: AppendResponse = self
            .send(request, &what)?
            .json()
            .with_context(|| format!("{what}: malformed response"))?;
        match self.updated_row(&response.updates.updated_range) {
            Some(n) => log::info!("wrote {sheet} row {n}"),
            None => log::info!("wrote {sheet} range {}", response.updates.updated_range),
        }
        Ok(())
    }

    fn all_values(&self, sheet: Worksheet) -> Result<Vec<Vec<String>>> {
        self.get_values(sheet.name(), Dimension::Rows)
    }

    fn col_values(&self, sheet: Worksheet, col: usize) -> Result<Vec<String>> {
        ensure!(col > 0, "columns are numbered from 1");
        let letter = column_letter(col);
        let columns = self.get_values(&format!("{sheet}!{letter}:{letter}"), Dimension::Columns)?;
        Ok(columns.into_iter().next().unwrap_or_default())
    }

    fn header(&self, sheet: Worksheet) -> Result<Vec<String>> {
        let rows = self.get_values(&format!("{sheet}!1:1"), Dimension::Rows)?;
        Ok(rows.into_iter().next().unwrap_or_default())
    }
}

/// Returns the A1-notation letters for column `col`, numbered from 1.
///
/// # Panics
///
/// If `col` is zero.
fn column_letter(col: usize) -> String {
    assert!(col > 0, "columns are numbered from 1");
    let mut n = col;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + u8::try_from(rem).unwrap_or_default());
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}
