mod balance_tests;
mod settlement_tests;

use crate::core::models::{Transaction, TransactionId, TransactionProposal, User, UserId};
use crate::core::services::{LedgerService, LedgerSettings};
use crate::infrastructure::directory::UserDirectory;
use crate::infrastructure::directory::in_memory::InMemoryDirectory;
use crate::infrastructure::logging::in_memory::InMemoryLogging;
use crate::infrastructure::storage::Storage;
use crate::infrastructure::storage::in_memory::InMemoryStorage;

pub type TestService = LedgerService<InMemoryLogging, InMemoryStorage, InMemoryDirectory>;

pub fn create_test_service() -> TestService {
    create_test_service_with(LedgerSettings::default())
}

pub fn create_test_service_with(settings: LedgerSettings) -> TestService {
    let storage = InMemoryStorage::new();
    let directory = InMemoryDirectory::new();
    let logging = InMemoryLogging::new();
    LedgerService::new(storage, directory, logging, settings)
}

pub async fn register(service: &TestService, email: &str) -> UserId {
    service
        .directory()
        .insert_user(User::new(email, "Test", "User"))
        .await
        .unwrap()
}

/// Offers an hour of `from`'s time to `to` and has `to` accept it.
pub async fn settle_hour(service: &TestService, from: UserId, to: UserId) -> Transaction {
    let offered = service
        .propose_transaction(TransactionProposal::offer(from, to, 3600, 1.0, 1), from)
        .await
        .unwrap();
    service.accept_transaction(offered.id, to).await.unwrap()
}

pub async fn stored_transaction(service: &TestService, id: TransactionId) -> Transaction {
    service.storage().load_transaction(id).await.unwrap()
}
