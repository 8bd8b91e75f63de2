//! Quote record and validation of the quote-summary payload.
//!
//! The envelope shape (`quoteSummary.result` with exactly one entry) is the
//! upstream contract; breaking it fails the quote. Identity fields must
//! match what was requested, with one documented exception: the API reports
//! the USD/CAD cross rate under `CAD=X` when `USDCAD=X` is requested. The
//! reason is undocumented upstream; the exception stays a single named
//! constant rather than a generalized alias rule.

use serde::Serialize;
use serde_json::Value;

use crate::error::{GambitError, Result};
use crate::navigator::{nav_f64, nav_i64, nav_str};
use crate::pairs::{Currency, MID_MARKET_SYMBOL};

/// What the API actually calls `USDCAD=X` in its `quoteType.symbol` field.
pub const MID_MARKET_REPORTED_AS: &str = "CAD=X";

/// A snapshot quote for one symbol in one settlement currency.
///
/// Identity fields (`symbol`, `currency`, `timestamp`, timezone) are always
/// present; everything else is individually optional because the venue
/// populates them inconsistently. Never mutated after construction.
#[derive(Debug, Clone, Serialize)]
pub struct Quote {
    pub symbol: String,
    pub currency: Currency,
    pub bid: Option<f64>,
    pub ask: Option<f64>,
    pub bid_size: Option<f64>,
    pub ask_size: Option<f64>,
    pub last_price: Option<f64>,
    pub day_low: Option<f64>,
    pub day_high: Option<f64>,
    pub change: Option<f64>,
    pub change_percent: Option<f64>,
    /// Epoch seconds of the quote, as reported by the venue.
    pub timestamp: i64,
    pub tz_offset_ms: i64,
    pub tz_name: String,
    pub market_state: Option<String>,
}

impl Quote {
    /// Seconds elapsed between `now` (epoch seconds) and the quote time.
    pub fn lag(&self, now: f64) -> f64 {
        now - self.timestamp as f64
    }

    /// Builds a quote from `quoteSummary.result[0]`, enforcing the identity
    /// invariants and degrading optional anomalies field-by-field.
    pub fn from_summary(
        result: &Value,
        description: &str,
        symbol: &str,
        currency: Currency,
    ) -> Result<Quote> {
        let ctx = format!("{} ({} side of {})", symbol, currency, description);

        let want_currency = currency.to_string();
        let got_currency = nav_str(result, &["summaryDetail", "currency"], &ctx);
        if got_currency != Some(want_currency.as_str()) {
            return Err(GambitError::Consistency {
                symbol: symbol.to_string(),
                field: "currency",
                got: got_currency.unwrap_or("unknown").to_string(),
                want: want_currency,
            });
        }

        let got_symbol = nav_str(result, &["quoteType", "symbol"], &ctx);
        let symbol_ok = got_symbol == Some(symbol)
            || (symbol == MID_MARKET_SYMBOL && got_symbol == Some(MID_MARKET_REPORTED_AS));
        if !symbol_ok {
            return Err(GambitError::Consistency {
                symbol: symbol.to_string(),
                field: "symbol",
                got: got_symbol.unwrap_or("unknown").to_string(),
                want: symbol.to_string(),
            });
        }

        let tz_offset_ms = nav_i64(result, &["quoteType", "gmtOffSetMilliseconds"], &ctx)
            .ok_or_else(|| schema(symbol, "missing quoteType.gmtOffSetMilliseconds"))?;
        let tz_name = nav_str(result, &["quoteType", "timeZoneFullName"], &ctx)
            .ok_or_else(|| schema(symbol, "missing quoteType.timeZoneFullName"))?
            .to_string();
        let timestamp = nav_i64(result, &["price", "regularMarketTime"], &ctx)
            .ok_or_else(|| schema(symbol, "missing price.regularMarketTime"))?;

        // Bid/ask sizes are reported as a flat 0 for TSX symbols, which is a
        // placeholder rather than an empty book; treat 0 as unknown.
        Ok(Quote {
            symbol: symbol.to_string(),
            currency,
            bid: nav_f64(result, &["summaryDetail", "bid"], &[], &ctx),
            ask: nav_f64(result, &["summaryDetail", "ask"], &[], &ctx),
            bid_size: nav_f64(result, &["summaryDetail", "bidSize"], &[0.0], &ctx),
            ask_size: nav_f64(result, &["summaryDetail", "askSize"], &[0.0], &ctx),
            last_price: nav_f64(result, &["price", "regularMarketPrice"], &[], &ctx),
            day_low: nav_f64(result, &["price", "regularMarketDayLow"], &[], &ctx),
            day_high: nav_f64(result, &["price", "regularMarketDayHigh"], &[], &ctx),
            change: nav_f64(result, &["price", "regularMarketChange"], &[], &ctx),
            change_percent: nav_f64(result, &["price", "regularMarketChangePercent"], &[], &ctx),
            timestamp,
            tz_offset_ms,
            tz_name,
            market_state: nav_str(result, &["price", "marketState"], &ctx).map(str::to_string),
        })
    }
}

/// Unwraps the top-level envelope down to `quoteSummary.result[0]`.
pub fn unwrap_envelope<'a>(body: &'a Value, symbol: &str) -> Result<&'a Value> {
    if let Some(err) = body.get("error") {
        if !err.is_null() {
            return Err(schema(symbol, &format!("upstream error: {}", err)));
        }
    }
    let results = body
        .get("quoteSummary")
        .ok_or_else(|| schema(symbol, "no quoteSummary in response"))?
        .get("result")
        .and_then(Value::as_array)
        .ok_or_else(|| schema(symbol, "quoteSummary.result is missing or not an array"))?;
    if results.len() != 1 {
        return Err(schema(
            symbol,
            &format!("quoteSummary.result has length {} rather than 1", results.len()),
        ));
    }
    Ok(&results[0])
}

fn schema(symbol: &str, detail: &str) -> GambitError {
    GambitError::Schema {
        symbol: symbol.to_string(),
        detail: detail.to_string(),
    }
}

/// Both legs of one registry pair. A pair only exists in the ranking set
/// once both legs resolved; there is no half-populated state.
#[derive(Debug, Clone, Serialize)]
pub struct PairQuotes {
    pub usd: Quote,
    pub cad: Quote,
}

impl PairQuotes {
    pub fn leg(&self, currency: Currency) -> &Quote {
        match currency {
            Currency::Usd => &self.usd,
            Currency::Cad => &self.cad,
        }
    }

    /// The leg bought with the source currency.
    pub fn src(&self, src_cur: Currency) -> &Quote {
        self.leg(src_cur)
    }

    /// The leg sold into the destination currency.
    pub fn dst(&self, src_cur: Currency) -> &Quote {
        self.leg(src_cur.other())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn summary(symbol: &str, currency: &str) -> Value {
        json!({
            "summaryDetail": {
                "currency": currency,
                "bid": 100.0,
                "ask": 100.5,
                "bidSize": 1200,
                "askSize": 900,
            },
            "quoteType": {
                "symbol": symbol,
                "gmtOffSetMilliseconds": -18000000,
                "timeZoneFullName": "America/Toronto",
            },
            "price": {
                "regularMarketPrice": 100.2,
                "regularMarketDayLow": 99.0,
                "regularMarketDayHigh": 101.0,
                "regularMarketChange": 0.2,
                "regularMarketChangePercent": 0.002,
                "regularMarketTime": 1700000000,
                "marketState": "REGULAR",
            },
        })
    }

    #[test]
    fn test_from_summary_full_payload() {
        let v = summary("TD.TO", "CAD");
        let q = Quote::from_summary(&v, "TD (Canadian bank)", "TD.TO", Currency::Cad).unwrap();
        assert_eq!(q.symbol, "TD.TO");
        assert_eq!(q.bid, Some(100.0));
        assert_eq!(q.ask, Some(100.5));
        assert_eq!(q.bid_size, Some(1200.0));
        assert_eq!(q.timestamp, 1700000000);
        assert_eq!(q.tz_name, "America/Toronto");
        assert_eq!(q.market_state.as_deref(), Some("REGULAR"));
    }

    #[test]
    fn test_missing_optional_field_degrades_to_unknown() {
        let mut v = summary("TD.TO", "CAD");
        v["summaryDetail"].as_object_mut().unwrap().remove("bid");
        v["summaryDetail"]["askSize"] = json!(0);
        let q = Quote::from_summary(&v, "TD (Canadian bank)", "TD.TO", Currency::Cad).unwrap();
        assert_eq!(q.bid, None);
        assert_eq!(q.ask_size, None);
        // The rest of the quote is untouched.
        assert_eq!(q.ask, Some(100.5));
    }

    #[test]
    fn test_currency_mismatch_is_rejected() {
        let v = summary("TD.TO", "USD");
        let err = Quote::from_summary(&v, "TD (Canadian bank)", "TD.TO", Currency::Cad).unwrap_err();
        match err {
            GambitError::Consistency { field: "currency", got, want, .. } => {
                assert_eq!(got, "USD");
                assert_eq!(want, "CAD");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_symbol_mismatch_is_rejected() {
        let v = summary("TD", "CAD");
        let err = Quote::from_summary(&v, "TD (Canadian bank)", "TD.TO", Currency::Cad).unwrap_err();
        assert!(matches!(err, GambitError::Consistency { field: "symbol", .. }));
    }

    #[test]
    fn test_mid_market_alias_is_accepted() {
        let v = summary("CAD=X", "CAD");
        let q = Quote::from_summary(&v, "USD/CAD mid-market rate", "USDCAD=X", Currency::Cad).unwrap();
        assert_eq!(q.symbol, "USDCAD=X");
    }

    #[test]
    fn test_alias_does_not_generalize() {
        // Only USDCAD=X gets the CAD=X alias; any other request does not.
        let v = summary("CAD=X", "USD");
        let err = Quote::from_summary(&v, "USD/CAD mid-market rate", "CADUSD=X", Currency::Usd).unwrap_err();
        assert!(matches!(err, GambitError::Consistency { field: "symbol", .. }));
    }

    #[test]
    fn test_missing_timestamp_is_schema_error() {
        let mut v = summary("TD.TO", "CAD");
        v["price"].as_object_mut().unwrap().remove("regularMarketTime");
        let err = Quote::from_summary(&v, "TD (Canadian bank)", "TD.TO", Currency::Cad).unwrap_err();
        assert!(matches!(err, GambitError::Schema { .. }));
    }

    #[test]
    fn test_unwrap_envelope_single_result() {
        let body = json!({"quoteSummary": {"result": [summary("TD", "USD")], "error": null}});
        assert!(unwrap_envelope(&body, "TD").is_ok());
    }

    #[test]
    fn test_unwrap_envelope_upstream_error() {
        let body = json!({"error": {"code": "Unauthorized", "description": "Invalid Crumb"}});
        let err = unwrap_envelope(&body, "TD").unwrap_err();
        assert!(matches!(err, GambitError::Schema { .. }));
    }

    #[test]
    fn test_unwrap_envelope_wrong_result_length() {
        for results in [json!([]), json!([1, 2])] {
            let body = json!({"quoteSummary": {"result": results}});
            let err = unwrap_envelope(&body, "TD").unwrap_err();
            assert!(matches!(err, GambitError::Schema { .. }));
        }
    }

    #[test]
    fn test_unwrap_envelope_missing_summary() {
        let body = json!({"finance": {}});
        assert!(unwrap_envelope(&body, "TD").is_err());
    }

    #[test]
    fn test_pair_quotes_leg_selection() {
        let usd = Quote::from_summary(&summary("TD", "USD"), "TD", "TD", Currency::Usd).unwrap();
        let cad = Quote::from_summary(&summary("TD.TO", "CAD"), "TD", "TD.TO", Currency::Cad).unwrap();
        let pq = PairQuotes { usd, cad };
        assert_eq!(pq.src(Currency::Usd).symbol, "TD");
        assert_eq!(pq.dst(Currency::Usd).symbol, "TD.TO");
        assert_eq!(pq.src(Currency::Cad).symbol, "TD.TO");
        assert_eq!(pq.dst(Currency::Cad).symbol, "TD");
    }

    #[test]
    fn test_lag() {
        let q = Quote::from_summary(&summary("TD", "USD"), "TD", "TD", Currency::Usd).unwrap();
        assert_eq!(q.lag(1700000059.0), 59.0);
    }
}
