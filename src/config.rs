use anyhow::{bail, Result};
use clap::{ArgAction, Parser};

use std::path::PathBuf;

use crate::{input::RetryPolicy, products::Products, sheets::DEFAULT_API_BASE};

/// Records the last market's sales and works out surplus and restocking
/// figures.
#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Args {
    /// ID of the Google spreadsheet holding the worksheets
    #[arg(long, env = "RESTOCK_SPREADSHEET_ID", conflicts_with = "local")]
    pub spreadsheet_id: Option<String>,

    /// OAuth access token for the Sheets API
    #[arg(long, env = "RESTOCK_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// Base URL of the Sheets API
    #[arg(long, env = "RESTOCK_API_BASE", default_value = DEFAULT_API_BASE)]
    pub api_base: String,

    /// Use the CSV worksheets in this directory instead of a spreadsheet
    #[arg(long, value_name = "DIR")]
    pub local: Option<PathBuf>,

    /// The six product names, in column order
    #[arg(long, default_value = "bacon,chicken,ham,salmon,tuna,turkey")]
    pub products: Products,

    /// Give up after this many invalid lines of input
    #[arg(long, value_name = "N")]
    pub max_attempts: Option<usize>,

    /// Show more detail (-v for info, -vv for debug)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

/// Where the worksheets are kept.
#[derive(Debug, Eq, PartialEq)]
pub enum Backend {
    Sheets {
        api_base: String,
        spreadsheet_id: String,
        token: String,
    },
    Local(PathBuf),
}

/// Settings for one run, checked for consistency.
#[derive(Debug)]
pub struct Config {
    pub backend: Backend,
    pub products: Products,
    pub policy: RetryPolicy,
    pub verbose: u8,
}

impl Config {
    /// Builds a `Config` from command-line `args`.
    ///
    /// # Errors
    ///
    /// Returns an error if no backend was chosen, or a spreadsheet was given
    /// without an access token.
    pub fn from_args(args: Args) -> Result<Self> {
        let backend = match (args.local, args.spreadsheet_id, args.access_token) {
            (Some(dir), None, _) => Backend::Local(dir),
            (None, Some(spreadsheet_id), Some(token)) => Backend::Sheets {
                api_base: args.api_base,
                spreadsheet_id,
                token,
            },
            (None, Some(_), None) => {
                bail!("an access token is required (--access-token or RESTOCK_ACCESS_TOKEN)")
            }
            (None, None, _) => {
                bail!("no worksheets given: use --spreadsheet-id or --local")
            }
            (Some(_), Some(_), _) => bail!("--local and --spreadsheet-id cannot be used together"),
        };
        let policy = match args.max_attempts {
            Some(n) => RetryPolicy::MaxAttempts(n),
            None => RetryPolicy::Unbounded,
        };
        Ok(Self {
            backend,
            products: args.products,
            policy,
            verbose: args.verbose,
        })
    }

    /// The default log filter for this verbosity.
    #[must_use]
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}
