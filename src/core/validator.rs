use chrono::{DateTime, Utc};

use crate::core::errors::LedgerError;
use crate::core::fee::validate_fee;
use crate::core::models::transaction::{validate_amounts, validate_multiplier};
use crate::core::models::{PendingStatus, Transaction, TransactionId, TransactionProposal, UserId};
use crate::infrastructure::directory::UserDirectory;

/// Turns an inbound proposal into a pending transaction ready for insertion.
pub struct TransactionValidator<'a, D: UserDirectory> {
    directory: &'a D,
}

impl<'a, D: UserDirectory> TransactionValidator<'a, D> {
    pub fn new(directory: &'a D) -> Self {
        TransactionValidator { directory }
    }

    pub async fn validate(
        &self,
        proposal: TransactionProposal,
        acting_user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<Transaction, LedgerError> {
        let kind = proposal
            .status
            .pending()
            .ok_or(LedgerError::InvalidProposalStatus(proposal.status))?;

        // The initiator names the counterparty either by id or by email, and
        // may only ever put themselves on their own side of the exchange.
        let (from_user_id, to_user_id) = match kind {
            PendingStatus::Offered => {
                let to = match proposal.to_user_id {
                    Some(id) => id,
                    None => self.resolve_email(proposal.email.as_deref()).await?,
                };
                let from = proposal
                    .from_user_id
                    .filter(|id| *id == acting_user_id)
                    .ok_or_else(|| LedgerError::forbidden(acting_user_id, "offer time on behalf of another user"))?;
                (from, to)
            }
            PendingStatus::Requested => {
                let from = match proposal.from_user_id {
                    Some(id) => id,
                    None => self.resolve_email(proposal.email.as_deref()).await?,
                };
                let to = proposal
                    .to_user_id
                    .filter(|id| *id == acting_user_id)
                    .ok_or_else(|| LedgerError::forbidden(acting_user_id, "request time on behalf of another user"))?;
                (from, to)
            }
        };

        if from_user_id == to_user_id {
            return Err(LedgerError::SelfTransfer);
        }
        validate_fee(proposal.seconds, proposal.multiplier, proposal.tx_fee)?;
        validate_multiplier(proposal.multiplier)?;
        validate_amounts(proposal.seconds, proposal.multiplier, proposal.tx_fee)?;

        Ok(Transaction {
            id: TransactionId::default(),
            initiated_date: now,
            confirmed_date: None,
            from_user_id,
            to_user_id,
            seconds: proposal.seconds,
            multiplier: proposal.multiplier,
            tx_fee: proposal.tx_fee,
            description: proposal.description,
            location: proposal.location,
            to_previous_tid: None,
            from_previous_tid: None,
            status: proposal.status,
            from_user_balance: 0,
            to_user_balance: 0,
        })
    }

    async fn resolve_email(&self, email: Option<&str>) -> Result<UserId, LedgerError> {
        let email = email
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .ok_or(LedgerError::MissingCounterparty)?;
        self.directory
            .find_user_by_email(email)
            .await?
            .ok_or_else(|| LedgerError::CounterpartyNotFound(email.to_string()))
    }
}
