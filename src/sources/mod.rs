//! Upstream data sources
//!
//! Every source is a transport trait doing one raw request, wrapped by a
//! client that adds retry and degrades to a sentinel on failure.

use crate::error::WatcherError;
use crate::Result;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

pub mod prices;
pub mod search;
pub mod transactions;

pub use prices::{CoinGeckoFeed, PriceFeed, PriceFeedClient};
pub use search::{ContextSearchClient, SearchBackend, TavilySearch};
pub use transactions::{TransactionFeed, TransactionFeedClient, WhaleAlertFeed};

/// Build the shared connection-pooled HTTP client
pub fn build_http_client(timeout: Duration) -> Result<Client> {
    let client = Client::builder()
        .pool_idle_timeout(Duration::from_secs(90))
        .pool_max_idle_per_host(8)
        .timeout(timeout)
        .user_agent(concat!("whale-watcher/", env!("CARGO_PKG_VERSION")))
        .build()?;

    Ok(client)
}

/// GET `url` with query parameters and decode the JSON body.
pub(crate) async fn get_json<T, Q>(client: &Client, url: &str, query: &Q) -> Result<T>
where
    T: DeserializeOwned,
    Q: Serialize + ?Sized,
{
    let response = client.get(url).query(query).send().await?;
    decode(response).await
}

/// POST a JSON body to `url` and decode the JSON response.
pub(crate) async fn post_json<T, B>(client: &Client, url: &str, body: &B) -> Result<T>
where
    T: DeserializeOwned,
    B: Serialize + ?Sized,
{
    let response = client
        .post(url)
        .header("Content-Type", "application/json")
        .json(body)
        .send()
        .await?;
    decode(response).await
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        return Err(WatcherError::api(status.as_u16(), text));
    }

    serde_json::from_str(&text).map_err(WatcherError::from)
}
