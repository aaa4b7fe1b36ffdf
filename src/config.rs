use dotenv::dotenv;
use once_cell::sync::Lazy;
use std::env;

use crate::core::balance::BalancePolicy;
use crate::core::errors::LedgerError;
use crate::core::services::LedgerSettings;

pub struct Config {
    pub port: u16,
    pub log_level: String,
    pub jwt_secret: String,
    /// Raw `LEDGER_BALANCE_POLICY`; checked by [`Config::ledger_settings`].
    pub balance_policy: Option<String>,
    pub settlement_retry_limit: u32,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("log_level", &self.log_level)
            .field("jwt_secret", &"<redacted>")
            .field("balance_policy", &self.balance_policy)
            .field("settlement_retry_limit", &self.settlement_retry_limit)
            .finish()
    }
}

impl Config {
    fn from_env() -> Self {
        dotenv().ok();

        Self {
            port: env::var("PORT").ok().and_then(|v| v.parse().ok()).unwrap_or(3000),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            jwt_secret: env::var("JWT_SECRET").unwrap_or_else(|_| "secret".to_string()),
            balance_policy: env::var("LEDGER_BALANCE_POLICY").ok(),
            settlement_retry_limit: env::var("LEDGER_SETTLEMENT_RETRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(3),
        }
    }

    /// Fails on an unrecognized balance policy rather than silently running
    /// the ledger under the default one.
    pub fn ledger_settings(&self) -> Result<LedgerSettings, LedgerError> {
        let balance_policy = match &self.balance_policy {
            Some(value) => value.parse::<BalancePolicy>()?,
            None => BalancePolicy::default(),
        };
        Ok(LedgerSettings {
            balance_policy,
            settlement_retry_limit: self.settlement_retry_limit,
        })
    }
}

pub static CONFIG: Lazy<Config> = Lazy::new(Config::from_env);
