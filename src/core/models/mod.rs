pub mod audit;
pub mod status;
pub mod transaction;
pub mod user;

pub use audit::AppLog;
pub use status::{PendingStatus, TerminalStatus, TransactionStatus};
pub use transaction::{Transaction, TransactionId, TransactionProposal};
pub use user::{User, UserId, UserPermissions};
