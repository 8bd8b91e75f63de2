//! Conversion ranking engine.
//!
//! Pure function of the quotes and parameters it receives: no session, no
//! globals, no clock reads (`now` is captured once by the caller). Pair
//! failures degrade to exclusions; only the mid-market reference escalates
//! to the run level, because every loss figure is measured against it.

use std::cmp::Ordering;

use log::warn;
use serde::Serialize;

use crate::error::{GambitError, Result};
use crate::formula::{Formula, TradeVars};
use crate::pairs::{Currency, SecurityPair};
use crate::quote::{PairQuotes, Quote};

/// Run parameters shared by every pair evaluation.
pub struct EngineConfig {
    pub src_cur: Currency,
    pub src_amount: f64,
    /// Maximum acceptable quote age in seconds.
    pub max_lag: f64,
    pub src_commission: Formula,
    pub dst_commission: Formula,
}

/// One ranked conversion candidate. Transient; produced and consumed in a
/// single run.
#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub description: String,
    pub src_symbol: String,
    pub dst_symbol: String,
    /// Ask of the leg bought with source currency.
    pub src_ask: f64,
    /// Bid of the leg sold into the destination currency.
    pub dst_bid: f64,
    /// Whole shares purchasable with the source amount.
    pub shares: u64,
    /// Source currency that cannot buy another whole share.
    pub src_leftover: f64,
    pub src_amount_convert: f64,
    pub dst_amount: f64,
    pub src_commission: f64,
    pub dst_commission: f64,
    pub src_amount_net: f64,
    pub dst_amount_net: f64,
    pub effective_rate: f64,
    /// Rate with no commission or round-lot loss, for comparison.
    pub theoretical_rate: f64,
    pub src_lag: f64,
    pub dst_lag: f64,
    /// Destination-currency amount given up versus converting the same net
    /// source at the mid-market rate.
    pub loss_vs_mid_market: f64,
}

/// Converts the mid-market quote into a source→destination rate, gating on
/// freshness first. The cross rate is always quoted CAD-per-USD, so a CAD
/// source inverts it. Errors here are fatal to the run.
pub fn mid_market_rate(mid: &Quote, src_cur: Currency, max_lag: f64, now: f64) -> Result<f64> {
    let lag = mid.lag(now);
    if lag > max_lag {
        return Err(GambitError::StaleQuote {
            symbol: mid.symbol.clone(),
            lag,
            max_lag,
        });
    }
    let last = mid.last_price.ok_or_else(|| GambitError::FieldUnavailable {
        symbol: mid.symbol.clone(),
        field: "last_price",
    })?;
    Ok(match src_cur {
        Currency::Usd => last,
        Currency::Cad => 1.0 / last,
    })
}

/// Evaluates one pair: round-lot sizing, commissions, net amounts, rates,
/// per-leg lag, freshness gate. Errors are pair-scoped.
pub fn evaluate_pair(
    pair: &SecurityPair,
    quotes: &PairQuotes,
    cfg: &EngineConfig,
    mid_rate: f64,
    now: f64,
) -> Result<Recommendation> {
    let src = quotes.src(cfg.src_cur);
    let dst = quotes.dst(cfg.src_cur);

    let src_ask = src.ask.ok_or_else(|| GambitError::FieldUnavailable {
        symbol: src.symbol.clone(),
        field: "ask",
    })?;
    let dst_bid = dst.bid.ok_or_else(|| GambitError::FieldUnavailable {
        symbol: dst.symbol.clone(),
        field: "bid",
    })?;

    // divmod-style lot sizing: shares = floor(amount/ask), 0 <= leftover < ask.
    let shares = cfg.src_amount.div_euclid(src_ask);
    let src_leftover = cfg.src_amount.rem_euclid(src_ask);
    if shares < 1.0 {
        return Err(GambitError::InsufficientAmount {
            description: pair.description.to_string(),
            ask: src_ask,
        });
    }

    let src_amount_convert = cfg.src_amount - src_leftover;
    let dst_amount = shares * dst_bid;

    let trade = TradeVars {
        src_ask,
        dst_bid,
        shares,
        src_amount_convert,
        dst_amount,
    };
    let src_commission = cfg.src_commission.eval(&trade);
    let dst_commission = cfg.dst_commission.eval(&trade);

    // Buying costs commission on top; selling loses commission off the top.
    let src_amount_net = src_amount_convert + src_commission;
    let dst_amount_net = dst_amount - dst_commission;

    let effective_rate = dst_amount_net / src_amount_net;
    let theoretical_rate = dst_bid / src_ask;

    let src_lag = src.lag(now);
    let dst_lag = dst.lag(now);
    if src_lag.max(dst_lag) > cfg.max_lag {
        let (symbol, lag) = if src_lag >= dst_lag {
            (src.symbol.clone(), src_lag)
        } else {
            (dst.symbol.clone(), dst_lag)
        };
        return Err(GambitError::StaleQuote {
            symbol,
            lag,
            max_lag: cfg.max_lag,
        });
    }

    Ok(Recommendation {
        description: pair.description.to_string(),
        src_symbol: src.symbol.clone(),
        dst_symbol: dst.symbol.clone(),
        src_ask,
        dst_bid,
        shares: shares as u64,
        src_leftover,
        src_amount_convert,
        dst_amount,
        src_commission,
        dst_commission,
        src_amount_net,
        dst_amount_net,
        effective_rate,
        theoretical_rate,
        src_lag,
        dst_lag,
        loss_vs_mid_market: src_amount_net * mid_rate - dst_amount_net,
    })
}

/// Ranks all feasible, fresh pairs by effective rate, best first. Pair
/// failures are logged and excluded; registry order breaks ties (stable
/// sort, no secondary key).
pub fn rank(
    fetched: &[(&SecurityPair, PairQuotes)],
    mid_rate: f64,
    cfg: &EngineConfig,
    now: f64,
) -> Vec<Recommendation> {
    let mut recs = Vec::new();
    for (pair, quotes) in fetched {
        match evaluate_pair(pair, quotes, cfg, mid_rate, now) {
            Ok(rec) if rec.effective_rate.is_finite() && rec.src_amount_net > 0.0 => {
                recs.push(rec);
            }
            Ok(rec) => warn!(
                "excluding {}: infeasible result (net source {}, effective rate {})",
                rec.description, rec.src_amount_net, rec.effective_rate
            ),
            Err(e) => warn!("excluding {}: {}", pair.description, e),
        }
    }
    recs.sort_by(|a, b| {
        b.effective_rate
            .partial_cmp(&a.effective_rate)
            .unwrap_or(Ordering::Equal)
    });
    recs
}
