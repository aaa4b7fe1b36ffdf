use serde::Serialize;
use thiserror::Error;

use crate::core::models::{TransactionId, TransactionStatus, UserId};

/// Coarse classification used by callers (e.g. the HTTP layer) to decide how
/// to report a [`LedgerError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Authorization,
    Unauthenticated,
    NotFound,
    InvalidState,
    Conflict,
    Internal,
}

#[derive(Error, Debug, Clone, PartialEq, Serialize)]
pub enum LedgerError {
    /// Provider and recipient are the same user
    #[error("Cannot exchange time with yourself")]
    SelfTransfer,

    /// Supplied fee is below the fee floor for the transfer
    #[error("Fee {supplied} is below the required minimum of {required}")]
    FeeBelowMinimum { supplied: u64, required: u64 },

    /// Multiplier outside the closed range [1, 3]
    #[error("Multiplier {0} is outside the allowed range 1 to 3")]
    MultiplierOutOfRange(f64),

    /// Fee does not fit a signed balance
    #[error("Fee {0} exceeds the largest representable amount")]
    FeeTooLarge(u64),

    /// `seconds * multiplier` does not fit a signed balance
    #[error("Transfer of {seconds} seconds at multiplier {multiplier} exceeds the largest representable amount")]
    ValueTooLarge { seconds: u64, multiplier: f64 },

    /// Settling would push a party's balance outside the representable range
    #[error("Settling transaction {0} would overflow a balance")]
    BalanceOverflow(TransactionId),

    /// No user is registered under the counterparty email
    #[error("No user registered with email {0}")]
    CounterpartyNotFound(String),

    /// Neither a counterparty id nor an email was supplied
    #[error("Transaction counterparty is missing")]
    MissingCounterparty,

    /// Proposals must start out offered or requested
    #[error("Cannot propose a transaction as {0}")]
    InvalidProposalStatus(TransactionStatus),

    #[error("Unknown transaction status code {0}")]
    UnknownStatusCode(u8),

    /// Acting user is not the party allowed to perform the action
    #[error("User {user_id} may not {action}")]
    Forbidden { user_id: UserId, action: String },

    /// Missing or invalid credentials
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Transaction {0} not found")]
    TransactionNotFound(TransactionId),

    #[error("User {0} not found")]
    UserNotFound(String),

    #[error("Email {0} already registered")]
    EmailAlreadyRegistered(String),

    /// Transaction already reached a terminal state
    #[error("Transaction {id} is already {status}")]
    InvalidState { id: TransactionId, status: TransactionStatus },

    /// A party's balance moved between reading it and settling; re-read and retry
    #[error("Transaction {0} conflicts with a concurrent settlement")]
    Conflict(TransactionId),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Logging error: {0}")]
    LoggingError(String),

    #[error("Internal server error: {0}")]
    InternalServerError(String),
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::SelfTransfer
            | LedgerError::FeeBelowMinimum { .. }
            | LedgerError::MultiplierOutOfRange(_)
            | LedgerError::FeeTooLarge(_)
            | LedgerError::ValueTooLarge { .. }
            | LedgerError::CounterpartyNotFound(_)
            | LedgerError::MissingCounterparty
            | LedgerError::InvalidProposalStatus(_)
            | LedgerError::UnknownStatusCode(_)
            | LedgerError::EmailAlreadyRegistered(_) => ErrorKind::Validation,
            LedgerError::Forbidden { .. } => ErrorKind::Authorization,
            LedgerError::Unauthorized(_) => ErrorKind::Unauthenticated,
            LedgerError::TransactionNotFound(_) | LedgerError::UserNotFound(_) => ErrorKind::NotFound,
            LedgerError::InvalidState { .. } | LedgerError::BalanceOverflow(_) => ErrorKind::InvalidState,
            LedgerError::Conflict(_) => ErrorKind::Conflict,
            LedgerError::StorageError(_) | LedgerError::LoggingError(_) | LedgerError::InternalServerError(_) => {
                ErrorKind::Internal
            }
        }
    }

    pub(crate) fn forbidden(user_id: UserId, action: &str) -> Self {
        LedgerError::Forbidden {
            user_id,
            action: action.to_string(),
        }
    }
}
