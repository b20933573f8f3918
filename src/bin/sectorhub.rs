use sectorhub::config::Config;
use sectorhub::services::data_service::DataService;
use sectorhub::Result;

use clap::{App, Arg, ArgMatches, SubCommand};
use env_logger::Env;
use log::{error, info, warn};

const API_KEY_ENV: &str = "ALPHAVANTAGE_API_KEY";

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // 未设置 RUST_LOG 时默认 info
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let max_page_arg = Arg::with_name("max-page")
        .short('m')
        .long("max-page")
        .value_name("MAX_PAGE")
        .help("Screener page to stop at, pages [1, MAX_PAGE) are scraped (20 symbols per page)")
        .takes_value(true)
        .default_value("11");

    let api_key_arg = Arg::with_name("api-key")
        .short('k')
        .long("api-key")
        .value_name("API_KEY")
        .help("Price API key, falls back to the ALPHAVANTAGE_API_KEY environment variable")
        .takes_value(true);

    let app = App::new("SectorHub")
        .version(env!("CARGO_PKG_VERSION"))
        .about("US equity sector performance: screener scraping, daily prices and sector analysis")
        .arg(
            Arg::with_name("data-dir")
                .short('d')
                .long("data-dir")
                .value_name("DIR")
                .help("Directory for the CSV and chart outputs")
                .takes_value(true)
                .global(true)
                .default_value("data"),
        )
        .arg(
            Arg::with_name("overwrite")
                .short('o')
                .long("overwrite")
                .help("Create or update the output files")
                .takes_value(false)
                .global(true),
        )
        .subcommand(
            SubCommand::with_name("scrape")
                .about("Scrape the screener and profile pages into symbols.csv")
                .arg(max_page_arg.clone()),
        )
        .subcommand(
            SubCommand::with_name("prices")
                .about("Fetch daily prices for the symbols saved by a previous scrape")
                .arg(api_key_arg.clone()),
        )
        .subcommand(SubCommand::with_name("analyze").about("Analyze sector performance from saved files"))
        .subcommand(
            SubCommand::with_name("run")
                .about("Scrape, fetch prices and analyze in one go")
                .arg(max_page_arg)
                .arg(api_key_arg),
        );

    let matches = app.get_matches();

    if let Err(e) = run(&matches).await {
        error!("{}", e);
        if e.is_fatal() {
            error!("Ending the program. Check the message above and rerun.");
        }
        std::process::exit(1);
    }
}

async fn run(matches: &ArgMatches) -> Result<()> {
    let (command, sub_matches) = match matches.subcommand() {
        Some(subcommand) => subcommand,
        None => {
            info!("No command specified. Use --help for usage information.");
            return Ok(());
        }
    };

    let config = build_config(command, sub_matches)?;
    info!(
        "Using data directory {} (overwrite: {})",
        config.data_dir, config.overwrite
    );
    let mut service = DataService::new(config)?;

    match command {
        "scrape" => {
            let result = service.scrape_symbols().await?;
            info!("Scraped {} symbols in {} sectors", result.records.len(), result.sector_index.len());
        }
        "prices" => {
            let prices = service.refresh_prices().await?;
            info!("Fetched {} price rows", prices.len());
        }
        "analyze" => {
            service.analyze_stored()?;
        }
        "run" => {
            service.run_pipeline().await?;
        }
        other => warn!("Unknown command: {}", other),
    }

    Ok(())
}

fn build_config(command: &str, matches: &ArgMatches) -> Result<Config> {
    let mut config = Config::new()
        .with_data_dir(matches.value_of("data-dir").unwrap_or("data"))
        .with_overwrite(matches.is_present("overwrite"));

    if matches!(command, "scrape" | "run") {
        let max_page = matches.value_of("max-page").unwrap_or("11").parse::<u32>()?;
        config = config.with_max_page(max_page);
    }

    if matches!(command, "prices" | "run") {
        let api_key = matches
            .value_of("api-key")
            .map(str::to_string)
            .or_else(|| std::env::var(API_KEY_ENV).ok());
        match api_key {
            Some(key) => config = config.with_api_key(&key),
            None => warn!(
                "No price API key given (--api-key or {}), requests will likely be rejected",
                API_KEY_ENV
            ),
        }
    }

    Ok(config)
}
