//! Yahoo Finance quote-summary client.
//!
//! Initialization is two-phase: build the HTTP session, then acquire the
//! anti-forgery crumb bound to that session's cookies. The crumb is fetched
//! exactly once per process; if the endpoint refuses, the run fails fast
//! rather than retrying or re-fetching lazily inside quote requests.

use futures_util::stream::{self, StreamExt};
use log::{info, warn};
use serde_json::Value;
use std::time::Duration;

use crate::error::{GambitError, Result};
use crate::pairs::{Currency, SecurityPair, MID_MARKET_DESCRIPTION, MID_MARKET_SYMBOL};
use crate::quote::{unwrap_envelope, PairQuotes, Quote};

const QUERY_BASE_URL: &str = "https://query1.finance.yahoo.com";

/// Summary modules requested per quote. More exist (financialData,
/// earnings, esgScores, ...) but these three carry everything we read.
const QUOTE_MODULES: &str = "quoteType,summaryDetail,price";

/// The crumb endpoint rejects non-browser user agents.
const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:129.0) Gecko/20100101 Firefox/129.0";

const HTTP_TIMEOUT_SECS: u64 = 10;

/// Default bound on in-flight pair fetches.
pub const DEFAULT_FETCH_CONCURRENCY: usize = 4;

/// Session-bound quote client. The session and crumb are read-only after
/// `connect`, so concurrent fetches can share one client freely.
pub struct YahooClient {
    http: reqwest::Client,
    crumb: String,
}

impl YahooClient {
    /// Builds the session and obtains the crumb. Fatal on failure.
    pub async fn connect() -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .cookie_store(true)
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()?;

        let crumb = http
            .get(format!("{}/v1/test/getcrumb", QUERY_BASE_URL))
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        let crumb = crumb.trim().to_string();
        if crumb.is_empty() {
            return Err(GambitError::Crumb("crumb endpoint returned an empty body".into()));
        }
        info!("got anti-forgery crumb: {:?}", crumb);

        Ok(Self { http, crumb })
    }

    /// Fetches and validates one quote for `symbol` in `currency`.
    pub async fn quote(
        &self,
        description: &str,
        symbol: &str,
        currency: Currency,
    ) -> Result<Quote> {
        let url = format!("{}/v10/finance/quoteSummary/{}", QUERY_BASE_URL, symbol);
        let body: Value = self
            .http
            .get(url)
            .query(&[
                ("formatted", "false"),
                ("modules", QUOTE_MODULES),
                ("lang", "en-US"),
                ("region", "US"),
                ("crumb", self.crumb.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let result = unwrap_envelope(&body, symbol)?;
        let quote = Quote::from_summary(result, description, symbol, currency)?;
        info!("got quote for {} ({} side of {})", symbol, currency, description);
        Ok(quote)
    }

    /// Fetches both legs of one pair. Either leg failing fails the pair;
    /// there is no half-populated result.
    pub async fn fetch_pair(&self, pair: &SecurityPair) -> Result<PairQuotes> {
        let usd = self.quote(pair.description, pair.usd_symbol, Currency::Usd).await?;
        let cad = self.quote(pair.description, pair.cad_symbol, Currency::Cad).await?;
        Ok(PairQuotes { usd, cad })
    }

    /// Fetches all valid registry pairs with at most `concurrency` pairs in
    /// flight. Broken pairs are logged and dropped; the survivors come back
    /// in registry order.
    pub async fn fetch_pairs<'a>(
        &self,
        pairs: &'a [SecurityPair],
        concurrency: usize,
    ) -> Vec<(&'a SecurityPair, PairQuotes)> {
        let fetched: Vec<Option<(&SecurityPair, PairQuotes)>> =
            stream::iter(pairs.iter().filter(|p| p.is_valid()))
                .map(|pair| async move {
                    match self.fetch_pair(pair).await {
                        Ok(quotes) => Some((pair, quotes)),
                        Err(e) => {
                            warn!("excluding {}: {}", pair.description, e);
                            None
                        }
                    }
                })
                .buffered(concurrency.max(1))
                .collect()
                .await;
        fetched.into_iter().flatten().collect()
    }

    /// The CAD-per-USD cross rate used as the loss baseline.
    pub async fn mid_market(&self) -> Result<Quote> {
        self.quote(MID_MARKET_DESCRIPTION, MID_MARKET_SYMBOL, Currency::Cad).await
    }
}
