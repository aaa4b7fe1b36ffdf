// Audit log actions
pub const TRANSACTION_OFFERED: &str = "TRANSACTION_OFFERED";
pub const TRANSACTION_REQUESTED: &str = "TRANSACTION_REQUESTED";
pub const TRANSACTION_ACCEPTED: &str = "TRANSACTION_ACCEPTED";
pub const TRANSACTION_REJECTED: &str = "TRANSACTION_REJECTED";
