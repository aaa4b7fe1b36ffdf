//! Offer/request lifecycle transitions.
//!
//! ```text
//!   Offered   --accept (recipient)--> OfferApproved
//!   Offered   --reject (recipient)--> OfferRejected
//!   Requested --accept (provider)---> RequestApproved
//!   Requested --reject (provider)---> RequestRejected
//! ```
//!
//! The functions here are pure; loading, balance lookup and the atomic write
//! are orchestrated by `LedgerService`.

use chrono::{DateTime, TimeDelta, Utc};

use crate::core::balance::SettledBalance;
use crate::core::errors::LedgerError;
use crate::core::models::{PendingStatus, Transaction, UserId};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Reject,
}

impl Decision {
    fn verb(self) -> &'static str {
        match self {
            Decision::Accept => "accept",
            Decision::Reject => "reject",
        }
    }
}

/// Checks that `transaction` is still pending and that `acting_user_id` is
/// the counterparty entitled to decide it: the recipient of an offer or the
/// provider of a request.
pub fn authorize(
    transaction: &Transaction,
    acting_user_id: UserId,
    decision: Decision,
) -> Result<PendingStatus, LedgerError> {
    let pending = transaction.status.pending().ok_or(LedgerError::InvalidState {
        id: transaction.id,
        status: transaction.status,
    })?;
    let (decider, what) = match pending {
        PendingStatus::Offered => (transaction.to_user_id, "an offer"),
        PendingStatus::Requested => (transaction.from_user_id, "a request"),
    };
    if decider != acting_user_id {
        return Err(LedgerError::forbidden(
            acting_user_id,
            &format!("{} {} on transaction {}", decision.verb(), what, transaction.id),
        ));
    }
    Ok(pending)
}

/// Applies settlement arithmetic on top of both parties' last balances.
///
/// The initiator always pays the fee: an offering provider pays it on top of
/// what they give, a requesting recipient pays it out of what they receive.
/// A balance that would leave the `i64` range fails with `BalanceOverflow`.
pub fn accept(
    mut transaction: Transaction,
    pending: PendingStatus,
    from_last: &SettledBalance,
    to_last: &SettledBalance,
    now: DateTime<Utc>,
) -> Result<Transaction, LedgerError> {
    let id = transaction.id;
    let overflow = || LedgerError::BalanceOverflow(id);
    let value = transaction.value().ok_or_else(overflow)?;
    let fee = i64::try_from(transaction.tx_fee).map_err(|_| overflow())?;
    let (from_balance, to_balance) = match pending {
        PendingStatus::Offered => (
            value.checked_add(fee).and_then(|debit| from_last.balance.checked_sub(debit)),
            to_last.balance.checked_add(value),
        ),
        PendingStatus::Requested => (
            from_last.balance.checked_sub(value),
            value.checked_sub(fee).and_then(|credit| to_last.balance.checked_add(credit)),
        ),
    };
    transaction.from_user_balance = from_balance.ok_or_else(overflow)?;
    transaction.to_user_balance = to_balance.ok_or_else(overflow)?;
    transaction.from_previous_tid = from_last.snapshot_id();
    transaction.to_previous_tid = to_last.snapshot_id();
    transaction.status = pending.approved().into();
    transaction.confirmed_date = Some(settlement_date(now, from_last, to_last));
    Ok(transaction)
}

/// A settlement is always dated strictly after the snapshots it extends, so
/// ordering by confirmation date walks the balance chain.
fn settlement_date(now: DateTime<Utc>, from_last: &SettledBalance, to_last: &SettledBalance) -> DateTime<Utc> {
    let latest_snapshot = [from_last, to_last]
        .iter()
        .filter_map(|last| last.snapshot.as_ref()?.confirmed_date)
        .max();
    match latest_snapshot {
        Some(previous) if previous >= now => previous + TimeDelta::nanoseconds(1),
        _ => now,
    }
}

/// Marks the transaction rejected. Balance snapshots are left as they were.
pub fn reject(mut transaction: Transaction, pending: PendingStatus, now: DateTime<Utc>) -> Transaction {
    transaction.status = pending.rejected().into();
    transaction.confirmed_date = Some(now);
    transaction
}
