//! CoinGecko spot price feed

use crate::error::WatcherError;
use crate::models::{PriceSnapshot, Symbol};
use crate::retry::RetryPolicy;
use crate::Result;
use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashMap;
use tracing::{info, warn};

pub const COINGECKO_PRICE_URL: &str = "https://api.coingecko.com/api/v3/simple/price";
pub const QUOTE_CURRENCY: &str = "usd";

/// asset id -> quote currency -> price
pub type PriceTable = HashMap<String, HashMap<String, f64>>;

#[async_trait]
pub trait PriceFeed: Send + Sync {
    async fn fetch(&self, ids: &[&str], vs_currency: &str) -> Result<PriceTable>;
}

pub struct CoinGeckoFeed {
    client: Client,
    url: String,
}

impl CoinGeckoFeed {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            url: COINGECKO_PRICE_URL.to_string(),
        }
    }
}

#[async_trait]
impl PriceFeed for CoinGeckoFeed {
    async fn fetch(&self, ids: &[&str], vs_currency: &str) -> Result<PriceTable> {
        let query = [("ids", ids.join(",")), ("vs_currencies", vs_currency.to_string())];
        super::get_json(&self.client, &self.url, &query).await
    }
}

fn price_for(table: &PriceTable, symbol: Symbol) -> Result<f64> {
    table
        .get(symbol.price_feed_id())
        .and_then(|quotes| quotes.get(QUOTE_CURRENCY))
        .copied()
        .ok_or_else(|| {
            WatcherError::parse(format!(
                "missing {} price for {}",
                QUOTE_CURRENCY,
                symbol.price_feed_id()
            ))
        })
}

fn snapshot_from(table: &PriceTable) -> Result<PriceSnapshot> {
    Ok(PriceSnapshot {
        btc: price_for(table, Symbol::Btc)?,
        eth: price_for(table, Symbol::Eth)?,
        sol: price_for(table, Symbol::Sol)?,
    })
}

pub struct PriceFeedClient {
    feed: Box<dyn PriceFeed>,
    retry: RetryPolicy,
}

impl PriceFeedClient {
    pub fn new(feed: Box<dyn PriceFeed>, retry: RetryPolicy) -> Self {
        Self { feed, retry }
    }

    /// Current spot prices, or all zeros when the feed stays down.
    pub async fn fetch_prices(&self) -> PriceSnapshot {
        let feed = self.feed.as_ref();
        let ids = Symbol::ALL.map(|symbol| symbol.price_feed_id());
        let ids = &ids;

        let snapshot = self
            .retry
            .run("CoinGecko", || async move {
                let table = feed.fetch(ids, QUOTE_CURRENCY).await?;
                snapshot_from(&table)
            })
            .await;

        match snapshot {
            Ok(prices) => {
                info!("Crypto prices fetched successfully");
                prices
            }
            Err(exhausted) => {
                warn!(attempts = exhausted.attempts, "CoinGecko unavailable, reporting zero prices");
                PriceSnapshot::unavailable()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    struct StubPrices {
        table: Option<PriceTable>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl PriceFeed for StubPrices {
        async fn fetch(&self, ids: &[&str], vs_currency: &str) -> Result<PriceTable> {
            assert_eq!(ids, ["bitcoin", "ethereum", "solana"]);
            assert_eq!(vs_currency, "usd");
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.table
                .clone()
                .ok_or_else(|| WatcherError::api(503, "Service Unavailable"))
        }
    }

    fn table(json: &str) -> PriceTable {
        serde_json::from_str(json).unwrap()
    }

    fn client(table: Option<PriceTable>) -> (PriceFeedClient, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let feed = StubPrices {
            table,
            calls: calls.clone(),
        };
        (
            PriceFeedClient::new(Box::new(feed), RetryPolicy::new(3, Duration::from_secs(5))),
            calls,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_prices_pass_through_unmodified() {
        let (client, _) = client(Some(table(
            r#"{"bitcoin":{"usd":65000},"ethereum":{"usd":3500.25},"solana":{"usd":150.123}}"#,
        )));

        let prices = client.fetch_prices().await;

        assert_eq!(
            prices,
            PriceSnapshot {
                btc: 65000.0,
                eth: 3500.25,
                sol: 150.123,
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_total_failure_returns_zeroes() {
        let (client, calls) = client(None);

        let prices = client.fetch_prices().await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(prices.is_unavailable());
        assert_eq!(prices, PriceSnapshot { btc: 0.0, eth: 0.0, sol: 0.0 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_asset_is_retried_then_zeroed() {
        let (client, calls) = client(Some(table(
            r#"{"bitcoin":{"usd":65000},"ethereum":{"usd":3500}}"#,
        )));

        let prices = client.fetch_prices().await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(prices.is_unavailable());
    }
}
