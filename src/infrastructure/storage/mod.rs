use crate::core::balance::BalancePolicy;
use crate::core::errors::LedgerError;
use crate::core::models::{Transaction, TransactionId, UserId};
use async_trait::async_trait;

/// Precondition checked atomically by [`Storage::settle_transaction`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SettlementGuard {
    /// The stored transaction must still be pending.
    StillPending,
    /// The stored transaction must still be pending, and each party's last
    /// settled transaction (under `policy`) must still be the one the new
    /// balances were computed from.
    Chain {
        from_previous: Option<TransactionId>,
        to_previous: Option<TransactionId>,
        policy: BalancePolicy,
    },
}

#[async_trait]
pub trait Storage: Send + Sync {
    /// Persists a new transaction and returns its assigned id. Fails with
    /// `MultiplierOutOfRange` without persisting when the multiplier is
    /// outside [1, 3].
    async fn insert_transaction(&self, transaction: Transaction) -> Result<TransactionId, LedgerError>;
    async fn load_transaction(&self, transaction_id: TransactionId) -> Result<Transaction, LedgerError>;
    /// Every transaction touching `user_id`, ordered by confirmation date
    /// (unconfirmed first), then initiation date.
    async fn list_transactions_for_user(&self, user_id: UserId) -> Result<Vec<Transaction>, LedgerError>;
    /// The most recently confirmed transaction touching `user_id` whose
    /// status counts as settled under `policy`.
    async fn last_settled_transaction_for_user(
        &self,
        user_id: UserId,
        policy: BalancePolicy,
    ) -> Result<Option<Transaction>, LedgerError>;
    /// Rewrites a pending transaction in place. Fails with `InvalidState` when
    /// the stored row or the replacement is terminal.
    async fn update_transaction(&self, transaction: Transaction) -> Result<TransactionId, LedgerError>;
    /// Writes a terminal transaction if `guard` still holds, as one atomic
    /// step. Fails with `InvalidState` if it is no longer pending and with
    /// `Conflict` if a party's last settled transaction changed.
    async fn settle_transaction(
        &self,
        transaction: Transaction,
        guard: SettlementGuard,
    ) -> Result<TransactionId, LedgerError>;
    /// Distinct ids of everyone on a transaction touching `user_id`,
    /// including `user_id` itself, ascending.
    async fn list_transaction_partners(&self, user_id: UserId) -> Result<Vec<UserId>, LedgerError>;
}

pub mod in_memory;
