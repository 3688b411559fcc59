//! Whale Alert large-transaction feed

use crate::error::WatcherError;
use crate::models::{Symbol, TopTransactions, Transaction, MAX_TRANSACTIONS_PER_SYMBOL};
use crate::retry::RetryPolicy;
use crate::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::{info, warn};

pub const WHALE_ALERT_URL: &str = "https://api.whale-alert.io/v1/transactions";
/// Minimum transfer value, in USD as the feed reports it
pub const MIN_TRANSACTION_VALUE: u64 = 1_000_000;
pub const TRANSACTION_BATCH_LIMIT: u32 = 20;

/// Raw feed record
#[derive(Debug, Clone, Deserialize)]
pub struct FeedTransaction {
    pub symbol: String,
    pub amount: f64,
    pub hash: String,
    pub from: FeedParty,
    pub to: FeedParty,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedParty {
    pub address: String,
}

#[derive(Debug, Deserialize)]
struct FeedResponse {
    // Whale Alert omits the array entirely when nothing matched
    #[serde(default)]
    transactions: Vec<FeedTransaction>,
}

#[async_trait]
pub trait TransactionFeed: Send + Sync {
    async fn fetch(&self, min_value: u64, limit: u32) -> Result<Vec<FeedTransaction>>;
}

pub struct WhaleAlertFeed {
    client: Client,
    api_key: String,
    url: String,
}

impl WhaleAlertFeed {
    pub fn new(client: Client, api_key: String) -> Self {
        Self {
            client,
            api_key,
            url: WHALE_ALERT_URL.to_string(),
        }
    }
}

#[async_trait]
impl TransactionFeed for WhaleAlertFeed {
    async fn fetch(&self, min_value: u64, limit: u32) -> Result<Vec<FeedTransaction>> {
        let query = [
            ("api_key", self.api_key.clone()),
            ("min_value", min_value.to_string()),
            ("limit", limit.to_string()),
        ];

        let response: FeedResponse = super::get_json(&self.client, &self.url, &query).await?;
        Ok(response.transactions)
    }
}

/// Keep the first three rows per tracked symbol, in feed order.
fn bucket_by_symbol(batch: Vec<FeedTransaction>) -> BTreeMap<Symbol, Vec<Transaction>> {
    let mut by_symbol: BTreeMap<Symbol, Vec<Transaction>> =
        Symbol::ALL.into_iter().map(|s| (s, Vec::new())).collect();

    for raw in batch {
        let Ok(symbol) = raw.symbol.parse::<Symbol>() else {
            continue;
        };

        let rows = by_symbol.entry(symbol).or_default();
        if rows.len() >= MAX_TRANSACTIONS_PER_SYMBOL {
            continue;
        }

        rows.push(Transaction {
            hash: raw.hash,
            symbol,
            amount: raw.amount,
            from_address: raw.from.address,
            to_address: raw.to.address,
            timestamp: raw.timestamp,
        });
    }

    by_symbol
}

pub struct TransactionFeedClient {
    feed: Box<dyn TransactionFeed>,
    retry: RetryPolicy,
}

impl TransactionFeedClient {
    pub fn new(feed: Box<dyn TransactionFeed>, retry: RetryPolicy) -> Self {
        Self { feed, retry }
    }

    /// Top whale transactions per symbol. Never empty for any symbol.
    pub async fn fetch_top_transactions(&self) -> TopTransactions {
        let feed = self.feed.as_ref();

        let batches = self
            .retry
            .run("Whale Alert", || async move {
                let batch = feed
                    .fetch(MIN_TRANSACTION_VALUE, TRANSACTION_BATCH_LIMIT)
                    .await?;
                Ok::<_, WatcherError>(bucket_by_symbol(batch))
            })
            .await;

        let by_symbol = match batches {
            Ok(by_symbol) => {
                info!("Whale transactions fetched successfully");
                by_symbol
            }
            Err(exhausted) => {
                warn!(
                    attempts = exhausted.attempts,
                    "Whale Alert unavailable, using placeholder rows"
                );
                BTreeMap::new()
            }
        };

        TopTransactions::from_batches(by_symbol)
    }
}
