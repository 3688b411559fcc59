use whale_watcher::{
    completion::{CompletionClient, FireworksBackend},
    compliance::MockCompliance,
    output::FileReportSink,
    report::ReportAssembler,
    sources::{
        build_http_client, CoinGeckoFeed, ContextSearchClient, PriceFeedClient, TavilySearch,
        TransactionFeedClient, WhaleAlertFeed,
    },
    telemetry::init_tracing,
    config::fallback_log_path,
    Config,
};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Config must be complete before any network activity
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            if init_tracing(&fallback_log_path(|key| std::env::var(key).ok())).is_ok() {
                error!("{}", e);
            }
            std::process::exit(1);
        }
    };

    init_tracing(&config.log_path)?;

    info!(
        output = %config.output_path.display(),
        retry_attempts = config.retry_attempts,
        "Whale watcher starting"
    );

    let http = build_http_client(config.request_timeout)?;
    let retry = config.retry_policy();

    // Create components
    let transactions = TransactionFeedClient::new(
        Box::new(WhaleAlertFeed::new(http.clone(), config.whale_alert_api_key.clone())),
        retry,
    );
    let prices = PriceFeedClient::new(Box::new(CoinGeckoFeed::new(http.clone())), retry);
    let completion = CompletionClient::new(
        Box::new(FireworksBackend::new(
            http.clone(),
            config.dobby_api_key.clone(),
            config.dobby_api_url.clone(),
        )),
        config.cache_ttl,
        retry,
    );
    let search = ContextSearchClient::new(
        Box::new(TavilySearch::new(http, config.tavily_api_key.clone())),
        retry,
    );

    let assembler = ReportAssembler::new(
        transactions,
        prices,
        Box::new(MockCompliance),
        completion,
        search,
    );

    let sink = FileReportSink::new(&config.output_path);
    assembler.run(&sink).await?;

    Ok(())
}
