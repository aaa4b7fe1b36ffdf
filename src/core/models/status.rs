use serde::{Deserialize, Serialize};

use crate::core::errors::LedgerError;

/// States a transaction may be created in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PendingStatus {
    Offered,
    Requested,
}

/// States reached by accepting or rejecting a pending transaction. No
/// transition leaves a terminal state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TerminalStatus {
    OfferApproved,
    RequestApproved,
    OfferRejected,
    RequestRejected,
}

/// Lifecycle status of a transaction.
///
/// Stored and sent over the wire as an integer code (1 = offered through
/// 6 = request rejected). Code 0 has no variant, so an unknown status can
/// never be persisted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum TransactionStatus {
    Pending(PendingStatus),
    Terminal(TerminalStatus),
}

impl PendingStatus {
    pub fn approved(self) -> TerminalStatus {
        match self {
            PendingStatus::Offered => TerminalStatus::OfferApproved,
            PendingStatus::Requested => TerminalStatus::RequestApproved,
        }
    }

    pub fn rejected(self) -> TerminalStatus {
        match self {
            PendingStatus::Offered => TerminalStatus::OfferRejected,
            PendingStatus::Requested => TerminalStatus::RequestRejected,
        }
    }
}

impl TransactionStatus {
    pub const OFFERED: TransactionStatus = TransactionStatus::Pending(PendingStatus::Offered);
    pub const REQUESTED: TransactionStatus = TransactionStatus::Pending(PendingStatus::Requested);
    pub const OFFER_APPROVED: TransactionStatus = TransactionStatus::Terminal(TerminalStatus::OfferApproved);
    pub const REQUEST_APPROVED: TransactionStatus = TransactionStatus::Terminal(TerminalStatus::RequestApproved);
    pub const OFFER_REJECTED: TransactionStatus = TransactionStatus::Terminal(TerminalStatus::OfferRejected);
    pub const REQUEST_REJECTED: TransactionStatus = TransactionStatus::Terminal(TerminalStatus::RequestRejected);

    pub fn code(self) -> u8 {
        match self {
            TransactionStatus::Pending(PendingStatus::Offered) => 1,
            TransactionStatus::Pending(PendingStatus::Requested) => 2,
            TransactionStatus::Terminal(TerminalStatus::OfferApproved) => 3,
            TransactionStatus::Terminal(TerminalStatus::RequestApproved) => 4,
            TransactionStatus::Terminal(TerminalStatus::OfferRejected) => 5,
            TransactionStatus::Terminal(TerminalStatus::RequestRejected) => 6,
        }
    }

    pub fn from_code(code: u8) -> Result<Self, LedgerError> {
        match code {
            1 => Ok(Self::OFFERED),
            2 => Ok(Self::REQUESTED),
            3 => Ok(Self::OFFER_APPROVED),
            4 => Ok(Self::REQUEST_APPROVED),
            5 => Ok(Self::OFFER_REJECTED),
            6 => Ok(Self::REQUEST_REJECTED),
            other => Err(LedgerError::UnknownStatusCode(other)),
        }
    }

    pub fn pending(self) -> Option<PendingStatus> {
        match self {
            TransactionStatus::Pending(p) => Some(p),
            TransactionStatus::Terminal(_) => None,
        }
    }

    pub fn is_pending(self) -> bool {
        matches!(self, TransactionStatus::Pending(_))
    }

    /// True once the transaction has passed through settlement, whether it
    /// was approved or rejected.
    pub fn is_terminal(self) -> bool {
        matches!(self, TransactionStatus::Terminal(_))
    }

    pub fn is_approved(self) -> bool {
        matches!(
            self,
            TransactionStatus::Terminal(TerminalStatus::OfferApproved | TerminalStatus::RequestApproved)
        )
    }

    pub fn is_rejected(self) -> bool {
        matches!(
            self,
            TransactionStatus::Terminal(TerminalStatus::OfferRejected | TerminalStatus::RequestRejected)
        )
    }
}

impl From<PendingStatus> for TransactionStatus {
    fn from(status: PendingStatus) -> Self {
        TransactionStatus::Pending(status)
    }
}

impl From<TerminalStatus> for TransactionStatus {
    fn from(status: TerminalStatus) -> Self {
        TransactionStatus::Terminal(status)
    }
}

impl From<TransactionStatus> for u8 {
    fn from(status: TransactionStatus) -> Self {
        status.code()
    }
}

impl TryFrom<u8> for TransactionStatus {
    type Error = LedgerError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        TransactionStatus::from_code(code)
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TransactionStatus::Pending(PendingStatus::Offered) => "offered",
            TransactionStatus::Pending(PendingStatus::Requested) => "requested",
            TransactionStatus::Terminal(TerminalStatus::OfferApproved) => "offer approved",
            TransactionStatus::Terminal(TerminalStatus::RequestApproved) => "request approved",
            TransactionStatus::Terminal(TerminalStatus::OfferRejected) => "offer rejected",
            TransactionStatus::Terminal(TerminalStatus::RequestRejected) => "request rejected",
        };
        write!(f, "{}", s)
    }
}
