pub mod in_memory;

use crate::core::errors::LedgerError;
use crate::core::models::{AppLog, UserId};
use async_trait::async_trait;

/// Audit trail of ledger actions.
#[async_trait]
pub trait LoggingService: Send + Sync {
    async fn log_action(
        &self,
        action: &str,
        details: serde_json::Value,
        user_id: Option<UserId>,
    ) -> Result<(), LedgerError>;
    async fn get_logs(&self) -> Result<Vec<AppLog>, LedgerError>;
}
