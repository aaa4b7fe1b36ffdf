use crate::core::errors::LedgerError;
use crate::core::models::{AppLog, UserId};
use crate::infrastructure::logging::LoggingService;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone, Default)]
pub struct InMemoryLogging {
    logs: Arc<tokio::sync::Mutex<Vec<AppLog>>>,
}

impl InMemoryLogging {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LoggingService for InMemoryLogging {
    async fn log_action(
        &self,
        action: &str,
        details: serde_json::Value,
        user_id: Option<UserId>,
    ) -> Result<(), LedgerError> {
        let mut logs = self.logs.lock().await;
        logs.push(AppLog {
            id: Uuid::new_v4().to_string(),
            action: action.to_string(),
            user_id,
            details,
            timestamp: Utc::now(),
        });
        Ok(())
    }

    async fn get_logs(&self) -> Result<Vec<AppLog>, LedgerError> {
        Ok(self.logs.lock().await.clone())
    }
}
