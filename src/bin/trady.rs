use trady::config::Config;
use trady::models::market::{OutputSize, TickerInfo};
use trady::range_filter::{axis_label, filter_series, marker_label, Range, SeriesSummary};
use trady::resource::{Resource, ResourceStream};
use trady::services::AggregationService;
use trady::store::WatchlistStore;

use anyhow::{bail, Context};
use clap::{App, Arg, ArgMatches, SubCommand};
use log::{error, info};
use std::path::Path;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logger
    env_logger::init();

    let symbol_arg = || {
        Arg::with_name("symbol")
            .short('s')
            .long("symbol")
            .value_name("SYMBOL")
            .help("Ticker symbol, e.g. IBM")
            .required(true)
            .takes_value(true)
    };
    let range_arg = || {
        Arg::with_name("range")
            .short('r')
            .long("range")
            .value_name("RANGE")
            .help("Chart range (1D, 1W, 1M, 6M, 1Y)")
            .takes_value(true)
            .default_value("1D")
    };
    let id_arg = || {
        Arg::with_name("id")
            .long("id")
            .value_name("WATCHLIST_ID")
            .help("Watchlist id")
            .required(true)
            .takes_value(true)
    };

    let app = App::new("Trady")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Stock movers, price history and watchlists")
        .arg(
            Arg::with_name("full")
                .long("full")
                .help("Request the full daily history instead of the compact one")
                .takes_value(false),
        )
        .subcommand(
            SubCommand::with_name("movers")
                .about("Show top gainers and losers")
                .arg(
                    Arg::with_name("limit")
                        .short('l')
                        .long("limit")
                        .value_name("LIMIT")
                        .help("Number of tickers to show per list")
                        .takes_value(true)
                        .default_value("4"),
                ),
        )
        .subcommand(
            SubCommand::with_name("series")
                .about("Show the closing prices for a range")
                .arg(symbol_arg())
                .arg(range_arg()),
        )
        .subcommand(
            SubCommand::with_name("overview")
                .about("Show company fundamentals")
                .arg(symbol_arg()),
        )
        .subcommand(
            SubCommand::with_name("search")
                .about("Search symbols by keywords")
                .arg(
                    Arg::with_name("keywords")
                        .short('k')
                        .long("keywords")
                        .value_name("KEYWORDS")
                        .required(true)
                        .takes_value(true),
                ),
        )
        .subcommand(
            SubCommand::with_name("product")
                .about("Load price history, fundamentals and logo together")
                .arg(symbol_arg())
                .arg(range_arg()),
        )
        .subcommand(
            SubCommand::with_name("watchlist")
                .about("Manage local watchlists")
                .subcommand(SubCommand::with_name("list").about("List watchlists"))
                .subcommand(
                    SubCommand::with_name("create")
                        .about("Create a watchlist")
                        .arg(
                            Arg::with_name("name")
                                .short('n')
                                .long("name")
                                .value_name("NAME")
                                .required(true)
                                .takes_value(true),
                        ),
                )
                .subcommand(SubCommand::with_name("delete").about("Delete a watchlist").arg(id_arg()))
                .subcommand(SubCommand::with_name("items").about("List symbols in a watchlist").arg(id_arg()))
                .subcommand(
                    SubCommand::with_name("add")
                        .about("Add a symbol to a watchlist")
                        .arg(id_arg())
                        .arg(symbol_arg()),
                )
                .subcommand(
                    SubCommand::with_name("remove")
                        .about("Remove a symbol from a watchlist")
                        .arg(id_arg())
                        .arg(symbol_arg()),
                )
                .subcommand(SubCommand::with_name("symbols").about("List every symbol across watchlists")),
        );

    let matches = app.get_matches();

    let mut config = Config::from_env();
    if matches.is_present("full") {
        config = config.with_output_size(OutputSize::Full);
    }

    match matches.subcommand() {
        Some(("watchlist", sub)) => run_watchlist(&config, sub),
        Some((command, sub)) => {
            if config.market_data_api_key.is_empty() {
                bail!("TRADY_ALPHA_VANTAGE_API_KEY is not set");
            }
            let service = AggregationService::from_config(config.clone())?;
            run_market(&service, &config.market_data_api_key, command, sub).await
        }
        None => {
            info!("No command specified. Use --help for usage information.");
            Ok(())
        }
    }
}

async fn run_market(service: &AggregationService, api_key: &str, command: &str, matches: &ArgMatches) -> anyhow::Result<()> {
    match command {
        "movers" => {
            let limit = matches.value_of("limit").unwrap_or("4").parse::<usize>().unwrap_or(4);
            if let Some(movers) = render("Top movers", service.fetch_top_movers(api_key)).await {
                let (gainers, losers) = movers.preview(limit);
                info!("Top gainers ({} total)", movers.gainers.len());
                gainers.iter().for_each(print_ticker);
                info!("Top losers ({} total)", movers.losers.len());
                losers.iter().for_each(print_ticker);
            }
        }
        "series" => {
            let symbol = matches.value_of("symbol").context("missing symbol")?;
            let range: Range = matches.value_of("range").unwrap_or("1D").parse()?;
            if let Some(series) = render("Daily series", service.fetch_daily_series(symbol, api_key)).await {
                print_series(&series, range);
            }
        }
        "overview" => {
            let symbol = matches.value_of("symbol").context("missing symbol")?;
            if let Some(overview) = render("Overview", service.fetch_company_overview(symbol, api_key)).await {
                info!("{} ({}) - {}", overview.name, overview.symbol, overview.exchange.as_deref().unwrap_or("-"));
                info!("Sector: {} / {}", overview.sector, overview.industry);
                info!(
                    "Market cap: {}  P/E: {}  Beta: {}",
                    overview.market_cap.as_deref().unwrap_or("-"),
                    overview.pe_ratio.as_deref().unwrap_or("-"),
                    overview.beta.as_deref().unwrap_or("-")
                );
                info!(
                    "52W range: {} - {}",
                    overview.week52_low.as_deref().unwrap_or("-"),
                    overview.week52_high.as_deref().unwrap_or("-")
                );
            }
        }
        "search" => {
            let keywords = matches.value_of("keywords").context("missing keywords")?;
            if let Some(found) = render("Search", service.search_symbols(keywords, api_key)).await {
                for m in found {
                    info!("{:<12} {:<40} {:<10} {}", m.symbol, m.name, m.region, m.currency);
                }
            }
        }
        "product" => {
            let symbol = matches.value_of("symbol").context("missing symbol")?;
            let range: Range = matches.value_of("range").unwrap_or("1D").parse()?;
            let snapshot = service.load_product(symbol, api_key).settle().await;
            info!("Logo: {}", snapshot.logo.as_deref().unwrap_or("(none)"));
            match snapshot.overview {
                Resource::Success(overview) => info!("{} - {}", overview.name, overview.sector),
                Resource::Error(message) => error!("Overview: {}", message),
                Resource::Loading => {}
            }
            match snapshot.series {
                Resource::Success(series) => print_series(&series, range),
                Resource::Error(message) => error!("Daily series: {}", message),
                Resource::Loading => {}
            }
        }
        other => bail!("Unknown command: {}", other),
    }
    Ok(())
}

fn run_watchlist(config: &Config, matches: &ArgMatches) -> anyhow::Result<()> {
    let store = WatchlistStore::open(Path::new(&config.db_path))?;
    let watchlist_id = |m: &ArgMatches| -> anyhow::Result<i64> {
        Ok(m.value_of("id").context("missing id")?.parse::<i64>()?)
    };

    match matches.subcommand() {
        Some(("list", _)) | None => {
            for w in store.watchlists()? {
                info!("{:>4}  {}", w.id, w.name);
            }
        }
        Some(("create", sub)) => {
            let name = sub.value_of("name").unwrap_or_default().trim();
            if name.is_empty() {
                bail!("Watchlist name must not be empty");
            }
            let id = store.create_watchlist(name)?;
            info!("Created watchlist {} with id {}", name, id);
        }
        Some(("delete", sub)) => {
            let id = watchlist_id(sub)?;
            let watchlist = store
                .watchlists()?
                .into_iter()
                .find(|w| w.id == id)
                .with_context(|| format!("Watchlist {} not found", id))?;
            store.delete_watchlist(&watchlist)?;
            info!("Deleted watchlist {}", watchlist.name);
        }
        Some(("items", sub)) => {
            for item in store.items(watchlist_id(sub)?)? {
                info!("{:>4}  {}", item.id, item.symbol);
            }
        }
        Some(("add", sub)) => {
            let symbol = sub.value_of("symbol").context("missing symbol")?.to_uppercase();
            let id = store.add_item(watchlist_id(sub)?, &symbol)?;
            info!("Added {} (item {})", symbol, id);
        }
        Some(("remove", sub)) => {
            let symbol = sub.value_of("symbol").context("missing symbol")?.to_uppercase();
            let removed = store.remove_item_by_symbol(watchlist_id(sub)?, &symbol)?;
            info!("Removed {} entries of {}", removed, symbol);
        }
        Some(("symbols", _)) => {
            for symbol in store.unique_symbols()? {
                info!("{}", symbol);
            }
        }
        Some((other, _)) => bail!("Unknown watchlist command: {}", other),
    }
    Ok(())
}

// 三种状态：加载中、错误信息、内容
async fn render<T: Send + 'static>(label: &str, mut stream: ResourceStream<T>) -> Option<T> {
    while let Some(state) = stream.next().await {
        match state {
            Resource::Loading => info!("{}: loading...", label),
            Resource::Success(value) => return Some(value),
            Resource::Error(message) => {
                error!("{}: {}", label, message);
                return None;
            }
        }
    }
    None
}

fn print_ticker(t: &TickerInfo) {
    info!(
        "{:<8} {:<32} {:>10} {:>10} {:>10}",
        t.symbol,
        t.company_name,
        t.price,
        t.change_amount,
        t.change_percent
    );
}

fn print_series(series: &trady::DailySeries, range: Range) {
    let points = filter_series(series, range);
    if points.is_empty() {
        info!("No data for range {}", range);
        return;
    }
    let summary = SeriesSummary::from_points(&points);
    let as_of = points.last().map(|p| marker_label(&p.date, range)).unwrap_or_default();
    info!(
        "Current: {:.2} ({})  Change ({}): {:+.2}%",
        summary.current_price, as_of, range, summary.percent_change
    );
    for p in &points {
        info!("{:<10} {:>10.2}", axis_label(&p.date, range), p.close);
    }
}
