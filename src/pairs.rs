//! Registry of interlisted USD/CAD securities usable for Norbert's Gambit.
//!
//! Mostly taken from the "Best stocks for Norbert's Gambit" thread:
//! https://www.canadianmoneyforum.com/threads/dual-listed-etfs-tsx-nyse.135364/post-1972456
//!
//! A pair only works when both listings share a CUSIP, i.e. they are the
//! same underlying asset settled in two currencies. Tickers known to break
//! that assumption live in `DIFFERENT_CUSIP_TICKERS` and are never queried.

use clap::ValueEnum;
use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

/// One of the two settlement currencies a dual listing trades in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ValueEnum)]
#[clap(rename_all = "UPPER")]
pub enum Currency {
    Usd,
    Cad,
}

impl Currency {
    /// The opposite side of the conversion.
    pub fn other(self) -> Currency {
        match self {
            Currency::Usd => Currency::Cad,
            Currency::Cad => Currency::Usd,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Currency::Usd => write!(f, "USD"),
            Currency::Cad => write!(f, "CAD"),
        }
    }
}

/// A dual-listed security: same CUSIP on a US and a Canadian exchange.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SecurityPair {
    pub description: &'static str,
    pub cusip: &'static str,
    pub usd_symbol: &'static str,
    pub cad_symbol: &'static str,
}

impl SecurityPair {
    /// Ticker for the requested settlement currency.
    pub fn symbol(&self, currency: Currency) -> &'static str {
        match currency {
            Currency::Usd => self.usd_symbol,
            Currency::Cad => self.cad_symbol,
        }
    }

    /// False when either leg is on the known different-CUSIP list.
    pub fn is_valid(&self) -> bool {
        !DIFFERENT_CUSIP_TICKERS.contains(self.usd_symbol)
            && !DIFFERENT_CUSIP_TICKERS.contains(self.cad_symbol)
    }
}

/// Ordered pair registry. Registry order is the tie-break order of the
/// final ranking, so keep it stable.
pub const NG_PAIRS: &[SecurityPair] = &[
    //                                       CUSIP         US$ symbol    CA$ symbol
    pair("Horizons U.S. Dollar Currency ETF", "379948102", "DLR-U.TO", "DLR.TO"),
    pair("TD (Canadian bank)", "891160509", "TD", "TD.TO"),
    pair("BMO (Canadian bank)", "063671101", "BMO", "BMO.TO"),
    pair("CIBC (Canadian bank)", "136069101", "CM", "CM.TO"),
    pair("ScotiaBank (Canadian bank)", "064149107", "BNS", "BNS.TO"),
    pair("RBC (Canadian bank)", "780087102", "RY", "RY.TO"),
    pair("Canadian National Railway", "136375102", "CNI", "CNR.TO"),
    pair("Enbridge (oil/energy)", "29250N105", "ENB", "ENB.TO"),
    pair("Suncor (oil/energy)", "867224107", "SU", "SU.TO"),
    pair("MFC (insurance/investment)", "56501R106", "MFC", "MFC.TO"),
    pair("Horizons S&P 500 ETF", "37964P100", "HXS-U.TO", "HXS.TO"),
    pair("Horizons TSX60 ETF", "37963M108", "HXT-U.TO", "HXT.TO"),
    pair("Horizons Global Dev Index ETF", "37963V108", "HXDM-U.TO", "HXDM.TO"),
    pair("Thompson Reuters", "884903709", "TRI", "TRI.TO"),
];

const fn pair(
    description: &'static str,
    cusip: &'static str,
    usd_symbol: &'static str,
    cad_symbol: &'static str,
) -> SecurityPair {
    SecurityPair {
        description,
        cusip,
        usd_symbol,
        cad_symbol,
    }
}

/// Tickers that look interlisted but carry different CUSIPs per side, so a
/// buy/sell round trip would not move the same underlying asset.
/// Taken from https://www.finiki.org/wiki/Norbert%27s_gambit#ETFs_with_different_CUSIPs
pub static DIFFERENT_CUSIP_TICKERS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    HashSet::from([
        "ZSP.U", "ZSP", //
        "XEF.U", "XEF", //
        "XUS.U", "XUS", //
        "XUU.U", "XUU",
    ])
});

/// The USD/CAD cross rate used as the loss baseline. Always quoted as
/// CAD per USD regardless of conversion direction.
pub const MID_MARKET_SYMBOL: &str = "USDCAD=X";
pub const MID_MARKET_DESCRIPTION: &str = "USD/CAD mid-market rate";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_pairs_are_valid() {
        // Nothing in the curated registry may hit the exclusion list.
        for p in NG_PAIRS {
            assert!(p.is_valid(), "{} has an excluded ticker", p.description);
        }
    }

    #[test]
    fn test_excluded_ticker_invalidates_pair() {
        let bad = SecurityPair {
            description: "BMO S&P 500 Index ETF",
            cusip: "05573M103",
            usd_symbol: "ZSP.U",
            cad_symbol: "ZSP",
        };
        assert!(!bad.is_valid());
    }

    #[test]
    fn test_symbol_selection() {
        let p = &NG_PAIRS[1];
        assert_eq!(p.symbol(Currency::Usd), "TD");
        assert_eq!(p.symbol(Currency::Cad), "TD.TO");
    }

    #[test]
    fn test_currency_other() {
        assert_eq!(Currency::Usd.other(), Currency::Cad);
        assert_eq!(Currency::Cad.other(), Currency::Usd);
    }

    #[test]
    fn test_currency_display() {
        assert_eq!(Currency::Usd.to_string(), "USD");
        assert_eq!(Currency::Cad.to_string(), "CAD");
    }
}
