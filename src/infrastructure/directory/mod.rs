use crate::core::errors::LedgerError;
use crate::core::models::{User, UserId};
use async_trait::async_trait;

/// Lookup of registered users. Registration itself lives outside the ledger;
/// `insert_user` exists so deployments and tests can seed the directory.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn insert_user(&self, user: User) -> Result<UserId, LedgerError>;
    async fn get_user(&self, user_id: UserId) -> Result<Option<User>, LedgerError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserId>, LedgerError>;
}

pub mod in_memory;
