//! Tavily search for per-symbol context text

use crate::error::WatcherError;
use crate::models::Symbol;
use crate::retry::{Label, RetryPolicy};
use crate::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::info;

pub const TAVILY_SEARCH_URL: &str = "https://api.tavily.com/search";

pub const NO_CONTEXT_FOUND: &str = "No additional context found.";
pub const CONTEXT_FETCH_ERROR: &str = "Error fetching context from Tavily.";

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SearchRequest {
    pub query: String,
    pub max_results: u32,
    pub search_depth: String,
}

impl SearchRequest {
    pub fn whale_activity(symbol: Symbol) -> Self {
        Self {
            query: format!("Recent {} whale activity", symbol),
            max_results: 1,
            search_depth: "basic".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResult {
    pub content: String,
}

#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse>;
}

pub struct TavilySearch {
    client: Client,
    api_key: String,
    url: String,
}

impl TavilySearch {
    pub fn new(client: Client, api_key: String) -> Self {
        Self {
            client,
            api_key,
            url: TAVILY_SEARCH_URL.to_string(),
        }
    }
}

#[derive(Serialize)]
struct TavilyBody<'a> {
    api_key: &'a str,
    #[serde(flatten)]
    request: &'a SearchRequest,
}

#[async_trait]
impl SearchBackend for TavilySearch {
    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse> {
        let body = TavilyBody {
            api_key: &self.api_key,
            request,
        };
        super::post_json(&self.client, &self.url, &body).await
    }
}

pub struct ContextSearchClient {
    backend: Box<dyn SearchBackend>,
    retry: RetryPolicy,
}

impl ContextSearchClient {
    pub fn new(backend: Box<dyn SearchBackend>, retry: RetryPolicy) -> Self {
        Self { backend, retry }
    }

    /// Context text for `symbol`; an empty result and a failed search read differently.
    pub async fn fetch_context(&self, symbol: Symbol) -> String {
        let backend = self.backend.as_ref();
        let request = &SearchRequest::whale_activity(symbol);

        self.retry
            .run_or_else(
                Label::new("Tavily").for_subject(symbol.ticker()),
                || async move {
                    let response = backend.search(request).await?;
                    info!("Tavily search for {} successful", symbol);
                    Ok::<_, WatcherError>(response
                        .results
                        .into_iter()
                        .next()
                        .map(|result| result.content)
                        .unwrap_or_else(|| NO_CONTEXT_FOUND.to_string()))
                },
                |_| CONTEXT_FETCH_ERROR.to_string(),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    enum Reply {
        Results(Vec<&'static str>),
        Fail,
    }

    struct StubSearch {
        reply: Reply,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl SearchBackend for StubSearch {
        async fn search(&self, request: &SearchRequest) -> Result<SearchResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert_eq!(request.max_results, 1);
            assert_eq!(request.search_depth, "basic");

            match &self.reply {
                Reply::Results(contents) => Ok(SearchResponse {
                    results: contents
                        .iter()
                        .map(|content| SearchResult {
                            content: content.to_string(),
                        })
                        .collect(),
                }),
                Reply::Fail => Err(WatcherError::api(401, "Unauthorized")),
            }
        }
    }

    fn client(reply: Reply) -> (ContextSearchClient, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let backend = StubSearch {
            reply,
            calls: calls.clone(),
        };
        (
            ContextSearchClient::new(Box::new(backend), RetryPolicy::new(3, Duration::from_secs(5))),
            calls,
        )
    }

    #[test]
    fn test_query_template() {
        let request = SearchRequest::whale_activity(Symbol::Eth);
        assert_eq!(request.query, "Recent ETH whale activity");
    }

    #[test]
    fn test_search_response_ignores_extra_fields() {
        let body = r#"{
            "query": "Recent BTC whale activity",
            "results": [{"title": "Whales", "url": "https://example.com", "content": "A whale moved", "score": 0.9}]
        }"#;

        let parsed: SearchResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.results[0].content, "A whale moved");
    }

    #[test]
    fn test_tavily_body_carries_key_and_request() {
        let request = SearchRequest::whale_activity(Symbol::Sol);
        let body = TavilyBody {
            api_key: "tvly-test",
            request: &request,
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["api_key"], "tvly-test");
        assert_eq!(json["query"], "Recent SOL whale activity");
        assert_eq!(json["max_results"], 1);
        assert_eq!(json["search_depth"], "basic");
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_result_content_returned() {
        let (client, _) = client(Reply::Results(vec!["Whales bought BTC", "second"]));
        assert_eq!(client.fetch_context(Symbol::Btc).await, "Whales bought BTC");
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_results_are_not_an_error() {
        let (client, calls) = client(Reply::Results(vec![]));

        assert_eq!(client.fetch_context(Symbol::Eth).await, NO_CONTEXT_FOUND);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_give_fixed_error() {
        let (client, calls) = client(Reply::Fail);

        assert_eq!(
            client.fetch_context(Symbol::Sol).await,
            "Error fetching context from Tavily."
        );
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
