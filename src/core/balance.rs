//! Balance derivation.
//!
//! Balances are never stored per user. A user's balance is the snapshot
//! recorded for their side of the most recently settled transaction that
//! touches them, or zero if there is none.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::core::errors::LedgerError;
use crate::core::models::{Transaction, TransactionId, TransactionStatus, UserId};
use crate::infrastructure::storage::Storage;

/// Which terminal statuses count as "settled" when looking for a user's
/// latest balance snapshot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalancePolicy {
    /// Only approved transactions carry balance snapshots.
    #[default]
    ApprovedOnly,
    /// Approved and rejected transactions both count. A rejection newer than
    /// the last approval resolves to a zero balance, matching ledgers
    /// written before the two were told apart.
    AnyTerminal,
}

impl BalancePolicy {
    pub fn includes(self, status: TransactionStatus) -> bool {
        match self {
            BalancePolicy::ApprovedOnly => status.is_approved(),
            BalancePolicy::AnyTerminal => status.is_terminal(),
        }
    }
}

impl FromStr for BalancePolicy {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "approved_only" => Ok(BalancePolicy::ApprovedOnly),
            "any_terminal" => Ok(BalancePolicy::AnyTerminal),
            other => Err(LedgerError::InternalServerError(format!("Unknown balance policy: {}", other))),
        }
    }
}

/// A user's current balance together with the transaction it was read from.
#[derive(Clone, Debug, PartialEq)]
pub struct SettledBalance {
    pub snapshot: Option<Transaction>,
    pub balance: i64,
}

impl SettledBalance {
    pub fn snapshot_id(&self) -> Option<TransactionId> {
        self.snapshot.as_ref().map(|t| t.id)
    }
}

pub struct BalanceResolver<'a, S: Storage> {
    storage: &'a S,
    policy: BalancePolicy,
}

impl<'a, S: Storage> BalanceResolver<'a, S> {
    pub fn new(storage: &'a S, policy: BalancePolicy) -> Self {
        BalanceResolver { storage, policy }
    }

    pub async fn last_settled_balance(&self, user_id: UserId) -> Result<SettledBalance, LedgerError> {
        let snapshot = self
            .storage
            .last_settled_transaction_for_user(user_id, self.policy)
            .await?;
        let balance = snapshot.as_ref().map(|t| t.balance_for(user_id)).unwrap_or(0);
        Ok(SettledBalance { snapshot, balance })
    }
}
