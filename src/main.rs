//! CLI entry point: parse arguments, fetch quotes, rank, print.

use clap::Parser;
use log::error;
use std::time::{SystemTime, UNIX_EPOCH};

use gambit::engine::{self, EngineConfig};
use gambit::formula::Formula;
use gambit::pairs::{Currency, MID_MARKET_DESCRIPTION, NG_PAIRS};
use gambit::quote::Quote;
use gambit::report;
use gambit::yahoo::{YahooClient, DEFAULT_FETCH_CONCURRENCY};
use gambit::{GambitError, Result};

/// Find the dual-listed security with the best realized USD/CAD conversion
/// rate using Norbert's Gambit.
#[derive(Parser, Debug)]
#[command(name = "gambit")]
struct Args {
    /// Source currency to convert from
    #[arg(value_enum, ignore_case = true)]
    src_cur: Currency,

    /// Amount of source currency to convert
    src_amount: f64,

    /// Maximum quote age to accept, in seconds
    #[arg(long, default_value_t = 60)]
    max_lag: u64,

    /// Commission for purchasing the source-currency security: a number or
    /// an expression over src_ask, dst_bid, shares, src_amount_convert and
    /// dst_amount (e.g. "max(4.95, shares*0.01)")
    #[arg(short = 'S', long, default_value = "6.95")]
    src_commission: String,

    /// Commission for selling the destination-currency security (same grammar)
    #[arg(short = 'D', long, default_value = "6.95")]
    dst_commission: String,

    /// Show longer results with full calculations (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Print a raw TSV survey of every fetched quote instead of the report
    #[arg(long)]
    dump: bool,

    /// Maximum pair fetches in flight
    #[arg(long, default_value_t = DEFAULT_FETCH_CONCURRENCY)]
    concurrency: usize,
}

#[tokio::main]
async fn main() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let args = Args::parse();
    let code = match run(&args).await {
        Ok(()) => 0,
        // A stale mid-market rate invalidates every loss figure; report it
        // like a usage error, distinct from I/O failures.
        Err(e @ GambitError::StaleQuote { .. }) => {
            error!("{}", e);
            2
        }
        Err(e) => {
            error!("{}", e);
            1
        }
    };
    std::process::exit(code);
}

async fn run(args: &Args) -> Result<()> {
    // Both schedules are validated before any network I/O.
    let src_commission = Formula::parse(&args.src_commission)?;
    let dst_commission = Formula::parse(&args.dst_commission)?;
    let max_lag = args.max_lag as f64;

    if !args.dump {
        report::print_banner(
            args.src_cur,
            args.src_amount,
            src_commission.source(),
            dst_commission.source(),
        );
    }

    let client = YahooClient::connect().await?;
    let fetched = client.fetch_pairs(NG_PAIRS, args.concurrency).await;
    let mid = client.mid_market().await?;
    let now = epoch_now();

    if args.dump {
        let mut rows: Vec<(&str, &Quote)> = Vec::new();
        for (pair, quotes) in &fetched {
            rows.push((pair.description, &quotes.usd));
            rows.push((pair.description, &quotes.cad));
        }
        rows.push((MID_MARKET_DESCRIPTION, &mid));
        report::print_quotes_tsv(&rows, now);
        return Ok(());
    }

    let mid_rate = engine::mid_market_rate(&mid, args.src_cur, max_lag, now)?;
    report::print_mid_market(args.src_cur, &mid, mid_rate, now);

    let cfg = EngineConfig {
        src_cur: args.src_cur,
        src_amount: args.src_amount,
        max_lag,
        src_commission,
        dst_commission,
    };
    let recs = engine::rank(&fetched, mid_rate, &cfg, now);
    report::print_recommendations(&recs, args.src_cur, args.src_amount, mid_rate, args.verbose);
    Ok(())
}

fn epoch_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default()
}
