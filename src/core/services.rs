use crate::constants::{TRANSACTION_ACCEPTED, TRANSACTION_OFFERED, TRANSACTION_REJECTED, TRANSACTION_REQUESTED};
use crate::core::balance::{BalancePolicy, BalanceResolver};
use crate::core::errors::LedgerError;
use crate::core::models::{AppLog, PendingStatus, Transaction, TransactionId, TransactionProposal, UserId};
use crate::core::state_machine::{self, Decision};
use crate::core::validator::TransactionValidator;
use crate::infrastructure::directory::UserDirectory;
use crate::infrastructure::logging::LoggingService;
use crate::infrastructure::storage::{SettlementGuard, Storage};
use chrono::Utc;
use futures::future::try_join_all;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

/// Runtime knobs for [`LedgerService`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LedgerSettings {
    pub balance_policy: BalancePolicy,
    /// Attempts made to settle a transaction before a concurrent
    /// settlement conflict is reported to the caller.
    pub settlement_retry_limit: u32,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        LedgerSettings {
            balance_policy: BalancePolicy::default(),
            settlement_retry_limit: 3,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, ToSchema, Clone, PartialEq, Eq)]
pub struct PartnerBalance {
    pub user_id: UserId,
    pub balance: i64,
}

pub struct LedgerService<L: LoggingService, S: Storage, D: UserDirectory> {
    storage: S,
    directory: D,
    logging: L,
    settings: LedgerSettings,
}

impl<L: LoggingService, S: Storage, D: UserDirectory> LedgerService<L, S, D> {
    pub fn new(storage: S, directory: D, logging: L, settings: LedgerSettings) -> Self {
        info!(
            "Initializing LedgerService (balance policy {:?}, {} settlement attempts)",
            settings.balance_policy, settings.settlement_retry_limit
        );
        LedgerService {
            storage,
            directory,
            logging,
            settings,
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn directory(&self) -> &D {
        &self.directory
    }

    pub fn settings(&self) -> LedgerSettings {
        self.settings
    }

    fn balances(&self) -> BalanceResolver<'_, S> {
        BalanceResolver::new(&self.storage, self.settings.balance_policy)
    }

    /// Validates `proposal` on behalf of `acting_user_id` and persists it in
    /// its pending state.
    pub async fn propose_transaction(
        &self,
        proposal: TransactionProposal,
        acting_user_id: UserId,
    ) -> Result<Transaction, LedgerError> {
        info!("User {} proposing transaction as {}", acting_user_id, proposal.status);
        let mut transaction = TransactionValidator::new(&self.directory)
            .validate(proposal, acting_user_id, Utc::now())
            .await?;
        transaction.id = self.storage.insert_transaction(transaction.clone()).await?;

        let action = match transaction.status.pending() {
            Some(PendingStatus::Requested) => TRANSACTION_REQUESTED,
            _ => TRANSACTION_OFFERED,
        };
        self.audit(
            action,
            json!({
                "transaction_id": transaction.id,
                "from_user_id": transaction.from_user_id,
                "to_user_id": transaction.to_user_id,
                "seconds": transaction.seconds,
                "multiplier": transaction.multiplier,
                "tx_fee": transaction.tx_fee,
            }),
            acting_user_id,
        )
        .await;
        debug!("Transaction created with ID: {}", transaction.id);
        Ok(transaction)
    }

    pub async fn accept_transaction(
        &self,
        transaction_id: TransactionId,
        acting_user_id: UserId,
    ) -> Result<Transaction, LedgerError> {
        info!("User {} accepting transaction {}", acting_user_id, transaction_id);
        let settled = self.settle_with_retry(transaction_id, acting_user_id, Decision::Accept).await?;
        self.audit(
            TRANSACTION_ACCEPTED,
            json!({
                "transaction_id": settled.id,
                "status": settled.status,
                "from_user_balance": settled.from_user_balance,
                "to_user_balance": settled.to_user_balance,
            }),
            acting_user_id,
        )
        .await;
        Ok(settled)
    }

    pub async fn reject_transaction(
        &self,
        transaction_id: TransactionId,
        acting_user_id: UserId,
    ) -> Result<Transaction, LedgerError> {
        info!("User {} rejecting transaction {}", acting_user_id, transaction_id);
        let rejected = self.settle_with_retry(transaction_id, acting_user_id, Decision::Reject).await?;
        self.audit(
            TRANSACTION_REJECTED,
            json!({ "transaction_id": rejected.id, "status": rejected.status }),
            acting_user_id,
        )
        .await;
        Ok(rejected)
    }

    /// Audits a change that is already committed. Failures are logged, not
    /// returned to the caller.
    async fn audit(&self, action: &str, details: serde_json::Value, acting_user_id: UserId) {
        if let Err(e) = self.logging.log_action(action, details, Some(acting_user_id)).await {
            warn!("Failed to audit {} by user {}: {}", action, acting_user_id, e);
        }
    }

    async fn settle_with_retry(
        &self,
        transaction_id: TransactionId,
        acting_user_id: UserId,
        decision: Decision,
    ) -> Result<Transaction, LedgerError> {
        let max_attempts = self.settings.settlement_retry_limit.max(1);
        let mut attempt = 1;
        loop {
            match self.settle_once(transaction_id, acting_user_id, decision).await {
                Err(LedgerError::Conflict(id)) if attempt < max_attempts => {
                    warn!(
                        "Settlement of transaction {} raced a concurrent settlement (attempt {}/{}), retrying",
                        id, attempt, max_attempts
                    );
                    attempt += 1;
                }
                outcome => return outcome,
            }
        }
    }

    /// One read-decide-write pass. Every attempt reloads the transaction, so a
    /// retry that finds it already terminal fails with `InvalidState`.
    async fn settle_once(
        &self,
        transaction_id: TransactionId,
        acting_user_id: UserId,
        decision: Decision,
    ) -> Result<Transaction, LedgerError> {
        let transaction = self.storage.load_transaction(transaction_id).await?;
        let pending = state_machine::authorize(&transaction, acting_user_id, decision)?;
        let now = Utc::now();

        let (settled, guard) = match decision {
            Decision::Accept => {
                let balances = self.balances();
                let from_last = balances.last_settled_balance(transaction.from_user_id).await?;
                let to_last = balances.last_settled_balance(transaction.to_user_id).await?;
                let guard = SettlementGuard::Chain {
                    from_previous: from_last.snapshot_id(),
                    to_previous: to_last.snapshot_id(),
                    policy: self.settings.balance_policy,
                };
                (
                    state_machine::accept(transaction, pending, &from_last, &to_last, now)?,
                    guard,
                )
            }
            Decision::Reject => (state_machine::reject(transaction, pending, now), SettlementGuard::StillPending),
        };

        self.storage.settle_transaction(settled.clone(), guard).await?;
        debug!("Transaction {} settled as {}", settled.id, settled.status);
        Ok(settled)
    }

    /// Loads a transaction for one of its two parties.
    pub async fn get_transaction(
        &self,
        transaction_id: TransactionId,
        acting_user_id: UserId,
    ) -> Result<Transaction, LedgerError> {
        let transaction = self.storage.load_transaction(transaction_id).await?;
        if !transaction.involves(acting_user_id) {
            return Err(LedgerError::forbidden(
                acting_user_id,
                &format!("view transaction {}", transaction_id),
            ));
        }
        Ok(transaction)
    }

    pub async fn list_transactions(&self, acting_user_id: UserId) -> Result<Vec<Transaction>, LedgerError> {
        self.storage.list_transactions_for_user(acting_user_id).await
    }

    /// Current balance of `user_id` under the configured balance policy.
    pub async fn balance(&self, user_id: UserId) -> Result<i64, LedgerError> {
        Ok(self.balances().last_settled_balance(user_id).await?.balance)
    }

    /// Everyone `acting_user_id` has traded with (themselves included) and
    /// each one's current balance.
    pub async fn transaction_partners(&self, acting_user_id: UserId) -> Result<Vec<PartnerBalance>, LedgerError> {
        let partners = self.storage.list_transaction_partners(acting_user_id).await?;
        try_join_all(partners.into_iter().map(|user_id| async move {
            let balance = self.balance(user_id).await?;
            Ok::<_, LedgerError>(PartnerBalance { user_id, balance })
        }))
        .await
    }

    pub async fn get_app_logs(&self) -> Result<Vec<AppLog>, LedgerError> {
        self.logging.get_logs().await
    }
}
