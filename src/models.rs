//! Core data models for the whale watcher

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Maximum transactions kept per tracked symbol
pub const MAX_TRANSACTIONS_PER_SYMBOL: usize = 3;

//
// ================= Symbol =================
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Symbol {
    Btc,
    Eth,
    Sol,
}

impl Symbol {
    /// Tracked symbols in report order
    pub const ALL: [Symbol; 3] = [Symbol::Btc, Symbol::Eth, Symbol::Sol];

    pub fn ticker(&self) -> &'static str {
        match self {
            Symbol::Btc => "BTC",
            Symbol::Eth => "ETH",
            Symbol::Sol => "SOL",
        }
    }

    /// Asset id used by the spot price feed
    pub fn price_feed_id(&self) -> &'static str {
        match self {
            Symbol::Btc => "bitcoin",
            Symbol::Eth => "ethereum",
            Symbol::Sol => "solana",
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.ticker())
    }
}

impl FromStr for Symbol {
    type Err = String;

    /// Feed tickers arrive lowercase ("btc"); match without case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Symbol::ALL
            .into_iter()
            .find(|symbol| symbol.ticker().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("untracked symbol: {}", s))
    }
}

//
// ================= Transactions =================
//

#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub hash: String,
    pub symbol: Symbol,
    pub amount: f64,
    pub from_address: String,
    pub to_address: String,
    /// Unix seconds
    pub timestamp: i64,
}

impl Transaction {
    /// Synthetic row standing in for a symbol with no feed data
    pub fn placeholder(symbol: Symbol) -> Self {
        Self {
            hash: "Error".to_string(),
            symbol,
            amount: 0.0,
            from_address: "N/A".to_string(),
            to_address: "N/A".to_string(),
            timestamp: 0,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.hash == "Error" && self.timestamp == 0
    }
}

/// Per-symbol transaction listing. Every tracked symbol holds 1..=3 rows
/// once built through [`TopTransactions::from_batches`].
#[derive(Debug, Clone, PartialEq)]
pub struct TopTransactions {
    by_symbol: BTreeMap<Symbol, Vec<Transaction>>,
}

impl TopTransactions {
    /// Fill any empty symbol with a placeholder row and cap the rest.
    pub fn from_batches(mut by_symbol: BTreeMap<Symbol, Vec<Transaction>>) -> Self {
        for symbol in Symbol::ALL {
            let rows = by_symbol.entry(symbol).or_default();
            rows.truncate(MAX_TRANSACTIONS_PER_SYMBOL);
            if rows.is_empty() {
                rows.push(Transaction::placeholder(symbol));
            }
        }

        Self { by_symbol }
    }

    pub fn get(&self, symbol: Symbol) -> &[Transaction] {
        self.by_symbol
            .get(&symbol)
            .map(|rows| rows.as_slice())
            .unwrap_or_default()
    }

    /// First row for a symbol (always present after construction)
    pub fn first(&self, symbol: Symbol) -> Option<&Transaction> {
        self.get(symbol).first()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Symbol, &Vec<Transaction>)> {
        self.by_symbol.iter()
    }
}

//
// ================= Prices =================
//

/// Spot prices in USD. All-zero means the feed was unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PriceSnapshot {
    pub btc: f64,
    pub eth: f64,
    pub sol: f64,
}

impl PriceSnapshot {
    pub fn unavailable() -> Self {
        Self::default()
    }

    pub fn is_unavailable(&self) -> bool {
        *self == Self::unavailable()
    }

    pub fn get(&self, symbol: Symbol) -> f64 {
        match symbol {
            Symbol::Btc => self.btc,
            Symbol::Eth => self.eth,
            Symbol::Sol => self.sol,
        }
    }
}
