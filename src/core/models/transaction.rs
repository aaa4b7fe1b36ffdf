use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::status::TransactionStatus;
use super::user::UserId;
use crate::core::errors::LedgerError;

pub const MIN_MULTIPLIER: f64 = 1.0;
pub const MAX_MULTIPLIER: f64 = 3.0;

/// Storage-assigned transaction id. The default (0) marks a transaction
/// that has not been persisted yet.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct TransactionId(pub u64);

impl TransactionId {
    pub fn is_assigned(self) -> bool {
        self.0 != 0
    }
}

impl std::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An exchange of time from `from_user_id` (the provider) to `to_user_id`
/// (the recipient).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Transaction {
    pub id: TransactionId,
    #[serde(with = "chrono::serde::ts_seconds")]
    #[schema(value_type = i64, example = 1717245296)]
    pub initiated_date: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_seconds_option")]
    #[schema(value_type = Option<i64>)]
    pub confirmed_date: Option<DateTime<Utc>>,
    pub from_user_id: UserId,
    pub to_user_id: UserId,
    pub seconds: u64,
    pub multiplier: f64,
    pub tx_fee: u64,
    pub description: String,
    pub location: String,
    pub to_previous_tid: Option<TransactionId>,
    pub from_previous_tid: Option<TransactionId>,
    #[schema(value_type = u8, example = 1)]
    pub status: TransactionStatus,
    pub from_user_balance: i64,
    pub to_user_balance: i64,
}

impl Transaction {
    /// The balance snapshot recorded for `user_id`'s side of this transaction.
    pub fn balance_for(&self, user_id: UserId) -> i64 {
        if user_id == self.from_user_id {
            self.from_user_balance
        } else {
            self.to_user_balance
        }
    }

    pub fn involves(&self, user_id: UserId) -> bool {
        self.from_user_id == user_id || self.to_user_id == user_id
    }

    /// Time moved by this transaction once the rate multiplier is applied,
    /// truncated to whole seconds. `None` when it does not fit a balance.
    pub fn value(&self) -> Option<i64> {
        scaled_value(self.seconds, self.multiplier)
    }
}

/// An inbound proposal, before counterparty resolution and authorization.
///
/// A missing counterparty id is resolved from `email` through the user
/// directory.
#[derive(Clone, Debug)]
pub struct TransactionProposal {
    pub from_user_id: Option<UserId>,
    pub to_user_id: Option<UserId>,
    pub email: Option<String>,
    pub seconds: u64,
    pub multiplier: f64,
    pub tx_fee: u64,
    pub description: String,
    pub location: String,
    pub status: TransactionStatus,
}

impl TransactionProposal {
    pub fn offer(from: UserId, to: UserId, seconds: u64, multiplier: f64, tx_fee: u64) -> Self {
        TransactionProposal {
            from_user_id: Some(from),
            to_user_id: Some(to),
            email: None,
            seconds,
            multiplier,
            tx_fee,
            description: String::new(),
            location: String::new(),
            status: TransactionStatus::OFFERED,
        }
    }

    pub fn request(from: UserId, to: UserId, seconds: u64, multiplier: f64, tx_fee: u64) -> Self {
        TransactionProposal {
            status: TransactionStatus::REQUESTED,
            ..Self::offer(from, to, seconds, multiplier, tx_fee)
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

pub fn validate_multiplier(multiplier: f64) -> Result<(), LedgerError> {
    if !(MIN_MULTIPLIER..=MAX_MULTIPLIER).contains(&multiplier) {
        return Err(LedgerError::MultiplierOutOfRange(multiplier));
    }
    Ok(())
}

fn scaled_value(seconds: u64, multiplier: f64) -> Option<i64> {
    let value = (seconds as f64 * multiplier).trunc();
    // i64::MAX as f64 rounds up to 2^63, which is already out of range
    (value.is_finite() && value >= 0.0 && value < i64::MAX as f64).then_some(value as i64)
}

/// Rejects fees and transfers whose debit `value + fee` cannot be
/// represented as a signed balance.
pub fn validate_amounts(seconds: u64, multiplier: f64, tx_fee: u64) -> Result<(), LedgerError> {
    let fee = i64::try_from(tx_fee).map_err(|_| LedgerError::FeeTooLarge(tx_fee))?;
    let value = scaled_value(seconds, multiplier).ok_or(LedgerError::ValueTooLarge { seconds, multiplier })?;
    value.checked_add(fee).ok_or(LedgerError::FeeTooLarge(tx_fee))?;
    Ok(())
}
