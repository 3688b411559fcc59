//! Report assembler - runs the fixed pipeline
//!
//! TRANSACTIONS → PRICES → COMPLIANCE → DEEP SEARCH → DOBBY → CONTEXT (per symbol) → RENDER

use crate::completion::CompletionClient;
use crate::compliance::{legal_status, ComplianceChecker};
use crate::models::{PriceSnapshot, Symbol, TopTransactions};
use crate::output::ReportSink;
use crate::sources::{ContextSearchClient, PriceFeedClient, TransactionFeedClient};
use crate::Result;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;

pub const REPORT_TITLE: &str = "AI Quantum Whale Wallet Watcher";

pub const REPORT_QUERY: &str = "Which are the biggest whale addresses for BTC, ETH, and SOL moving now, including the size of the wallets and last transaction times?";

pub const DEEP_SEARCH_QUERY: &str = "Bitcoin whale transaction compliance";

pub const SUMMARY_PROMPT: &str = "Summarize: Found whale transactions for BTC, ETH, SOL.";

/// Illustrative summary lines; fixed text, not derived from live data
const WHALE_ACTION_SUMMARY: [&str; 3] = [
    "- BTC: Major whale moved 500 BTC, signaling market confidence.",
    "- ETH: Whale shifted 1000 ETH, likely for DeFi activity.",
    "- SOL: SOL whale transferred 5000 SOL, hinting at NFT market surge.",
];

/// Everything gathered for one report run, already normalized
#[derive(Debug, Clone)]
pub struct WhaleReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub transactions: TopTransactions,
    pub prices: PriceSnapshot,
    pub flagged: bool,
    pub compliance_result: String,
    pub dobby_response: String,
    pub contexts: BTreeMap<Symbol, String>,
}

impl WhaleReport {
    pub fn render(&self) -> String {
        let mut out = String::new();

        // ── Header ──
        out.push_str(&format!("{}\n\n", REPORT_TITLE));
        out.push_str(&format!("Input: {}\n\n", REPORT_QUERY));

        out.push_str("Dobby Whale Action Summary:\n");
        for line in WHALE_ACTION_SUMMARY {
            out.push_str(line);
            out.push('\n');
        }
        out.push('\n');

        // ── Per-symbol transactions ──
        out.push_str("Top Whale Transactions by Asset:\n");
        for symbol in Symbol::ALL {
            out.push_str(&format!("{} Whales:\n", symbol));

            for tx in self.transactions.get(symbol) {
                out.push_str(&format!(
                    "- Tx ID: {}\n  Amount: {} {}\n  From: {}\n  To: {}\n  Time: {}\n",
                    tx.hash, tx.amount, symbol, tx.from_address, tx.to_address, tx.timestamp
                ));
            }

            let context = self
                .contexts
                .get(&symbol)
                .map(String::as_str)
                .unwrap_or_default();
            out.push_str(&format!("  Context: {}\n\n", context));
        }

        // ── Prices ──
        out.push_str("Current Prices:\n");
        for symbol in Symbol::ALL {
            out.push_str(&format!("- {}: ${}\n", symbol, self.prices.get(symbol)));
        }
        out.push('\n');

        // ── Compliance + Dobby ──
        out.push_str(&format!("Legal Status: {}\n", legal_status(self.flagged)));
        out.push_str(&format!("Compliance Check: {}\n\n", self.compliance_result));
        out.push_str(&format!("Dobby Response:\n{}\n", self.dobby_response));

        out
    }
}

pub struct ReportAssembler {
    transactions: TransactionFeedClient,
    prices: PriceFeedClient,
    compliance: Box<dyn ComplianceChecker>,
    completion: CompletionClient,
    search: ContextSearchClient,
}

impl ReportAssembler {
    pub fn new(
        transactions: TransactionFeedClient,
        prices: PriceFeedClient,
        compliance: Box<dyn ComplianceChecker>,
        completion: CompletionClient,
        search: ContextSearchClient,
    ) -> Self {
        Self {
            transactions,
            prices,
            compliance,
            completion,
            search,
        }
    }

    /// Gather every section in order. Never fails: degraded sources show up
    /// as sentinel values in the report.
    pub async fn generate(&self) -> WhaleReport {
        let run_id = Uuid::new_v4();
        self.generate_inner(run_id)
            .instrument(info_span!("report", %run_id))
            .await
    }

    async fn generate_inner(&self, run_id: Uuid) -> WhaleReport {
        let start = Instant::now();
        info!("Report generation started");

        let transactions = self.transactions.fetch_top_transactions().await;
        let prices = self.prices.fetch_prices().await;

        // first BTC row always exists, possibly the placeholder
        let watched_address = transactions
            .first(Symbol::Btc)
            .map(|tx| tx.to_address.clone())
            .unwrap_or_else(|| "N/A".to_string());
        let flagged = self.compliance.check_compliance(&watched_address);
        let compliance_result = self.compliance.deep_search(DEEP_SEARCH_QUERY);

        let dobby_response = self.completion.complete(SUMMARY_PROMPT).await;

        let mut contexts = BTreeMap::new();
        for symbol in Symbol::ALL {
            let context = self.search.fetch_context(symbol).await;
            debug!(%symbol, "Context collected");
            contexts.insert(symbol, context);
        }

        info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            prices_available = !prices.is_unavailable(),
            "Report data collected"
        );

        WhaleReport {
            run_id,
            generated_at: Utc::now(),
            transactions,
            prices,
            flagged,
            compliance_result,
            dobby_response,
            contexts,
        }
    }

    /// Generate, print to stdout and append to `sink`.
    pub async fn run(&self, sink: &dyn ReportSink) -> Result<WhaleReport> {
        let report = self.generate().await;
        let rendered = report.render();

        println!("{}", rendered);
        sink.append(&rendered)?;

        info!(
            run_id = %report.run_id,
            generated_at = %report.generated_at.to_rfc3339(),
            "Output generated and saved"
        );
        Ok(report)
    }
}
