//! Compliance checks for whale wallets
//!
//! Only a mock implementation exists today. It always reports clean and
//! must not be mistaken for a sanctions screen.

use tracing::info;

pub const NO_SANCTIONS_FOUND: &str = "No sanctions found.";

/// Trait for wallet compliance screening
pub trait ComplianceChecker: Send + Sync {
    /// `true` when the address is flagged
    fn check_compliance(&self, address: &str) -> bool;

    /// Free-text sanctions lookup
    fn deep_search(&self, query: &str) -> String;
}

/// Mock checker: never flags, never finds sanctions
pub struct MockCompliance;

impl ComplianceChecker for MockCompliance {
    fn check_compliance(&self, address: &str) -> bool {
        info!("Compliance check for {}: Clean", address);
        false
    }

    fn deep_search(&self, query: &str) -> String {
        info!("Deep search for {}: No sanctions found", query);
        NO_SANCTIONS_FOUND.to_string()
    }
}

/// Report wording for a compliance verdict
pub fn legal_status(flagged: bool) -> &'static str {
    if flagged {
        "Flagged"
    } else {
        "Clean"
    }
}
