use crate::core::errors::LedgerError;
use crate::core::models::{User, UserId};
use crate::infrastructure::directory::UserDirectory;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Clone, Default)]
pub struct InMemoryDirectory {
    users: Arc<RwLock<HashMap<UserId, User>>>,
    users_by_email: Arc<RwLock<HashMap<String, UserId>>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserDirectory for InMemoryDirectory {
    async fn insert_user(&self, mut user: User) -> Result<UserId, LedgerError> {
        let mut users_by_email = self.users_by_email.write().await;
        if users_by_email.contains_key(&user.email) {
            return Err(LedgerError::EmailAlreadyRegistered(user.email));
        }
        let mut users = self.users.write().await;
        if user.id.0 == 0 || users.contains_key(&user.id) {
            user.id = UserId(users.keys().map(|id| id.0).max().unwrap_or(0) + 1);
        }
        users_by_email.insert(user.email.clone(), user.id);
        let id = user.id;
        users.insert(id, user);
        Ok(id)
    }

    async fn get_user(&self, user_id: UserId) -> Result<Option<User>, LedgerError> {
        let users = self.users.read().await;
        Ok(users.get(&user_id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserId>, LedgerError> {
        let users_by_email = self.users_by_email.read().await;
        Ok(users_by_email.get(email).copied())
    }
}
