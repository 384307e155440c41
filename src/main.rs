use anyhow::Result;
use clap::Parser;
use restock::{
    config::{Args, Backend, Config},
    csv_store::CsvStore,
    sheets::SheetsClient,
    Store,
};

use std::io;

fn main() -> Result<()> {
    let config = Config::from_args(Args::parse())?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.log_level()))
        .init();

    let mut store: Box<dyn Store> = match &config.backend {
        Backend::Sheets {
            api_base,
            spreadsheet_id,
            token,
        } => Box::new(SheetsClient::new(api_base, spreadsheet_id, token)?),
        Backend::Local(dir) => Box::new(CsvStore::open(dir)?),
    };

    println!("\nWelcome to the market day stock analysis\n");
    let outcome = restock::run(
        &mut store,
        &config.products,
        &mut io::stdin().lock(),
        &mut io::stdout(),
        config.policy,
    )?;
    log::info!("{outcome:?}");
    Ok(())
}
