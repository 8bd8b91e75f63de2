//! Human-readable output: the ranked report and the raw TSV quote dump.

use chrono::{DateTime, FixedOffset};

use crate::engine::Recommendation;
use crate::pairs::Currency;
use crate::quote::Quote;

pub fn print_banner(src_cur: Currency, src_amount: f64, src_formula: &str, dst_formula: &str) {
    println!(
        "Finding optimal securities to convert {} {:.2} to {} using Norbert's Gambit.",
        src_cur,
        src_amount,
        src_cur.other()
    );
    println!("- Commission function for purchasing source-currency security:   {}", src_formula);
    println!("- Commission function for selling destination-currency security: {}", dst_formula);
}

pub fn print_mid_market(src_cur: Currency, mid: &Quote, mid_rate: f64, now: f64) {
    println!(
        "\nLondon mid-market exchange rate for {} -> {} is {:.4} (as of {}, LAG: {:.0} sec)\n",
        src_cur,
        src_cur.other(),
        mid_rate,
        quote_local_time(mid),
        mid.lag(now)
    );
}

pub fn print_recommendations(
    recs: &[Recommendation],
    src_cur: Currency,
    src_amount: f64,
    mid_rate: f64,
    verbosity: u8,
) {
    let dst_cur = src_cur.other();
    println!("Best options:\n");
    for (i, rec) in recs.iter().enumerate() {
        if verbosity < 2 {
            println!(
                "{:>2}. Buy {} x {} at {} {:.3}, sell {} at {} {:.3}",
                i + 1,
                rec.shares,
                rec.src_symbol,
                src_cur,
                rec.src_ask,
                rec.dst_symbol,
                dst_cur,
                rec.dst_bid
            );
            println!(
                "    Effective rate of {:.4}, losing {} {:.4}",
                rec.effective_rate, dst_cur, rec.loss_vs_mid_market
            );
            if verbosity > 0 {
                println!(
                    "    Commissions: {} {:.2} (buy) and {} {:.2} (sell)",
                    src_cur, rec.src_commission, dst_cur, rec.dst_commission
                );
                println!("    LAG: {:.0} sec", rec.src_lag.max(rec.dst_lag));
            }
        } else {
            if i > 0 {
                println!("\n==========================\n");
            }
            let (src_ask, dst_bid) = (rec.src_ask, rec.dst_bid);
            println!(
                "Converting {} {:.2} to {} using {} ({} {}, {} {})\n",
                src_cur,
                src_amount,
                dst_cur,
                rec.description,
                src_cur,
                rec.src_symbol,
                dst_cur,
                rec.dst_symbol
            );
            println!(
                "1. Buy {} shares of {} in {} at ask of {:.3}, plus {:.2} commission",
                rec.shares, rec.src_symbol, src_cur, src_ask, rec.src_commission
            );
            println!(
                "   (= {} x {:.3} + {:.2} = {:.2})",
                rec.shares, src_ask, rec.src_commission, rec.src_amount_net
            );
            println!(
                "2. Sell {} shares of {} in {} at bid of {:.3}, less {:.2} commission",
                rec.shares, rec.dst_symbol, dst_cur, dst_bid, rec.dst_commission
            );
            println!(
                "   (= {} x {:.3} - {:.2} = {:.2})\n",
                rec.shares, dst_bid, rec.dst_commission, rec.dst_amount_net
            );
            println!("You start with:   {} {:.2}", src_cur, rec.src_amount_net);
            println!("You end with:     {} {:.2}", dst_cur, rec.dst_amount_net);
            println!("               (+ {} {:.2} leftover)\n", src_cur, rec.src_leftover);
            println!("Your effective conversion rate: {:.4}", rec.effective_rate);
            println!("Mid-market conversion rate:     {:.4}", mid_rate);
            println!("Compared to MM rate, you lose:  {} {:.4}", dst_cur, rec.loss_vs_mid_market);
            println!("LAG: buy {:.0} sec, sell {:.0} sec", rec.src_lag, rec.dst_lag);
        }
    }
    if recs.is_empty() {
        println!("(no feasible pairs; see warnings above for why each was excluded)");
    }
}

/// One tab-separated row per fetched leg, in fetch order. Unknown fields
/// print as empty cells.
pub fn print_quotes_tsv(rows: &[(&str, &Quote)], now: f64) {
    for (description, q) in rows {
        println!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{:.0}",
            q.symbol,
            description,
            cell(q.bid_size),
            cell(q.bid),
            cell(q.ask),
            cell(q.ask_size),
            cell(q.last_price),
            cell(q.change),
            cell(q.change_percent),
            q.lag(now)
        );
    }
}

fn cell(v: Option<f64>) -> String {
    v.map(|x| x.to_string()).unwrap_or_default()
}

/// Quote timestamp rendered in the market's own timezone.
fn quote_local_time(q: &Quote) -> String {
    let offset = FixedOffset::east_opt((q.tz_offset_ms / 1000) as i32);
    match (DateTime::from_timestamp(q.timestamp, 0), offset) {
        (Some(t), Some(tz)) => t.with_timezone(&tz).format("%H:%M:%S").to_string(),
        _ => format!("epoch {}", q.timestamp),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_formats_unknown_as_empty() {
        assert_eq!(cell(None), "");
        assert_eq!(cell(Some(1.5)), "1.5");
    }

    #[test]
    fn test_quote_local_time_applies_market_offset() {
        let q = Quote {
            symbol: "TD.TO".to_string(),
            currency: Currency::Cad,
            bid: None,
            ask: None,
            bid_size: None,
            ask_size: None,
            last_price: None,
            day_low: None,
            day_high: None,
            change: None,
            change_percent: None,
            timestamp: 1700000000, // 2023-11-14 22:13:20 UTC
            tz_offset_ms: -18000000,
            tz_name: "America/Toronto".to_string(),
            market_state: None,
        };
        assert_eq!(quote_local_time(&q), "17:13:20");
    }
}
