//! Error taxonomy for the conversion scanner.
//!
//! Scope matters more than kind here: `Transport`, `Crumb` and `Formula`
//! abort the whole run, `Schema`/`Consistency` kill a single quote,
//! `InsufficientAmount`/`StaleQuote`/`FieldUnavailable` exclude a single
//! pair from the ranking. Callers enforce the scope; the variants just
//! carry enough context to say what broke.

use thiserror::Error;

/// Unified error type for quote acquisition and ranking.
#[derive(Error, Debug)]
pub enum GambitError {
    /// HTTP-level failure (connect, timeout, non-success status).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The crumb endpoint answered but returned nothing usable.
    #[error("could not obtain anti-forgery crumb: {0}")]
    Crumb(String),

    /// The top-level JSON envelope violates the upstream contract.
    #[error("broken quote envelope for {symbol}: {detail}")]
    Schema { symbol: String, detail: String },

    /// The API reported a different identity than the one requested.
    #[error("{symbol}: reported {field} is {got} rather than expected {want}")]
    Consistency {
        symbol: String,
        field: &'static str,
        got: String,
        want: String,
    },

    /// A field the computation cannot proceed without came back unknown.
    #[error("{symbol}: required field {field} is unavailable")]
    FieldUnavailable {
        symbol: String,
        field: &'static str,
    },

    /// The source amount does not cover even one share at the current ask.
    #[error("{description}: amount buys fewer than one share at ask {ask}")]
    InsufficientAmount { description: String, ask: f64 },

    /// Quote older than the configured maximum lag.
    #[error("{symbol}: quote is {lag:.0} sec old (max {max_lag:.0} sec)")]
    StaleQuote {
        symbol: String,
        lag: f64,
        max_lag: f64,
    },

    /// Commission formula failed validation (unknown name, bad syntax, ...).
    #[error("invalid commission formula: {0}")]
    Formula(String),
}

/// Crate-wide `Result` alias with `GambitError` as the default error.
pub type Result<T, E = GambitError> = std::result::Result<T, E>;
