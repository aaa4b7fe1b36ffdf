use crate::core::balance::BalancePolicy;
use crate::core::errors::LedgerError;
use crate::core::models::transaction::{validate_amounts, validate_multiplier};
use crate::core::models::{Transaction, TransactionId, UserId};
use crate::infrastructure::storage::{SettlementGuard, Storage};
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

#[derive(Clone)]
pub struct InMemoryStorage {
    transactions: Arc<RwLock<HashMap<TransactionId, Transaction>>>,
    next_id: Arc<AtomicU64>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        InMemoryStorage {
            transactions: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

fn latest_settled(
    transactions: &HashMap<TransactionId, Transaction>,
    user_id: UserId,
    policy: BalancePolicy,
) -> Option<&Transaction> {
    transactions
        .values()
        .filter(|t| t.involves(user_id) && policy.includes(t.status) && t.confirmed_date.is_some())
        .max_by_key(|t| (t.confirmed_date, t.id))
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn insert_transaction(&self, mut transaction: Transaction) -> Result<TransactionId, LedgerError> {
        validate_multiplier(transaction.multiplier)?;
        validate_amounts(transaction.seconds, transaction.multiplier, transaction.tx_fee)?;
        let id = TransactionId(self.next_id.fetch_add(1, Ordering::SeqCst));
        transaction.id = id;
        let mut transactions = self.transactions.write().await;
        transactions.insert(id, transaction);
        Ok(id)
    }

    async fn load_transaction(&self, transaction_id: TransactionId) -> Result<Transaction, LedgerError> {
        let transactions = self.transactions.read().await;
        transactions
            .get(&transaction_id)
            .cloned()
            .ok_or(LedgerError::TransactionNotFound(transaction_id))
    }

    async fn list_transactions_for_user(&self, user_id: UserId) -> Result<Vec<Transaction>, LedgerError> {
        let transactions = self.transactions.read().await;
        let mut listed: Vec<Transaction> = transactions
            .values()
            .filter(|t| t.involves(user_id))
            .cloned()
            .collect();
        listed.sort_by_key(|t| (t.confirmed_date, t.initiated_date, t.id));
        Ok(listed)
    }

    async fn last_settled_transaction_for_user(
        &self,
        user_id: UserId,
        policy: BalancePolicy,
    ) -> Result<Option<Transaction>, LedgerError> {
        let transactions = self.transactions.read().await;
        Ok(latest_settled(&transactions, user_id, policy).cloned())
    }

    async fn update_transaction(&self, transaction: Transaction) -> Result<TransactionId, LedgerError> {
        validate_multiplier(transaction.multiplier)?;
        validate_amounts(transaction.seconds, transaction.multiplier, transaction.tx_fee)?;
        let mut transactions = self.transactions.write().await;
        let stored = transactions
            .get_mut(&transaction.id)
            .ok_or(LedgerError::TransactionNotFound(transaction.id))?;
        // terminal rows are part of a balance chain; only settle_transaction moves into one
        if stored.status.is_terminal() || transaction.status.is_terminal() {
            return Err(LedgerError::InvalidState {
                id: stored.id,
                status: if stored.status.is_terminal() {
                    stored.status
                } else {
                    transaction.status
                },
            });
        }
        *stored = transaction;
        Ok(stored.id)
    }

    async fn settle_transaction(
        &self,
        transaction: Transaction,
        guard: SettlementGuard,
    ) -> Result<TransactionId, LedgerError> {
        let mut transactions = self.transactions.write().await;
        let current = transactions
            .get(&transaction.id)
            .ok_or(LedgerError::TransactionNotFound(transaction.id))?;
        if !current.status.is_pending() {
            return Err(LedgerError::InvalidState {
                id: current.id,
                status: current.status,
            });
        }

        if let SettlementGuard::Chain {
            from_previous,
            to_previous,
            policy,
        } = guard
        {
            let from_now = latest_settled(&transactions, current.from_user_id, policy).map(|t| t.id);
            let to_now = latest_settled(&transactions, current.to_user_id, policy).map(|t| t.id);
            if from_now != from_previous || to_now != to_previous {
                return Err(LedgerError::Conflict(transaction.id));
            }
        }

        let id = transaction.id;
        transactions.insert(id, transaction);
        Ok(id)
    }

    async fn list_transaction_partners(&self, user_id: UserId) -> Result<Vec<UserId>, LedgerError> {
        let transactions = self.transactions.read().await;
        let partners: BTreeSet<UserId> = transactions
            .values()
            .filter(|t| t.involves(user_id))
            .flat_map(|t| [t.from_user_id, t.to_user_id])
            .collect();
        Ok(partners.into_iter().collect())
    }
}
