use crate::constants::{TRANSACTION_ACCEPTED, TRANSACTION_REJECTED};
use crate::core::errors::{ErrorKind, LedgerError};
use crate::core::models::{AppLog, TransactionId, TransactionProposal, TransactionStatus, User, UserId};
use crate::core::services::{LedgerService, LedgerSettings};
use crate::infrastructure::directory::UserDirectory;
use crate::infrastructure::directory::in_memory::InMemoryDirectory;
use crate::infrastructure::logging::LoggingService;
use crate::infrastructure::storage::Storage;
use crate::infrastructure::storage::in_memory::InMemoryStorage;
use crate::tests::{create_test_service, register, settle_hour, stored_transaction};
use async_trait::async_trait;
use chrono::Duration;

/// Audit sink that is always down.
struct UnavailableAudit;

#[async_trait]
impl LoggingService for UnavailableAudit {
    async fn log_action(
        &self,
        _action: &str,
        _details: serde_json::Value,
        _user_id: Option<UserId>,
    ) -> Result<(), LedgerError> {
        Err(LedgerError::LoggingError("audit sink unavailable".to_string()))
    }

    async fn get_logs(&self) -> Result<Vec<AppLog>, LedgerError> {
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn test_accept_offer_charges_fee_to_provider() {
    let _ = env_logger::try_init();
    let service = create_test_service();
    let alice = register(&service, "alice@example.com").await;
    let bob = register(&service, "bob@example.com").await;

    let offered = service
        .propose_transaction(TransactionProposal::offer(alice, bob, 3600, 1.0, 1), alice)
        .await
        .unwrap();
    let settled = service.accept_transaction(offered.id, bob).await.unwrap();

    assert_eq!(settled.status, TransactionStatus::OFFER_APPROVED);
    assert_eq!(settled.from_user_balance, -3601);
    assert_eq!(settled.to_user_balance, 3600);
    assert!(settled.confirmed_date.is_some());
    assert_eq!(settled.from_previous_tid, None);
    assert_eq!(settled.to_previous_tid, None);

    let stored = stored_transaction(&service, offered.id).await;
    assert_eq!(stored, settled);
    assert_eq!(service.balance(alice).await.unwrap(), -3601);
    assert_eq!(service.balance(bob).await.unwrap(), 3600);
}

#[tokio::test]
async fn test_accept_request_charges_fee_to_recipient() {
    let service = create_test_service();
    let alice = register(&service, "alice@example.com").await;
    let bob = register(&service, "bob@example.com").await;

    let requested = service
        .propose_transaction(TransactionProposal::request(alice, bob, 3600, 1.0, 1), bob)
        .await
        .unwrap();
    let settled = service.accept_transaction(requested.id, alice).await.unwrap();

    assert_eq!(settled.status, TransactionStatus::REQUEST_APPROVED);
    assert_eq!(settled.from_user_balance, -3600);
    assert_eq!(settled.to_user_balance, 3599);
}

#[tokio::test]
async fn test_only_counterparty_may_decide() {
    let service = create_test_service();
    let alice = register(&service, "alice@example.com").await;
    let bob = register(&service, "bob@example.com").await;
    let carol = register(&service, "carol@example.com").await;

    let offered = service
        .propose_transaction(TransactionProposal::offer(alice, bob, 3600, 1.0, 1), alice)
        .await
        .unwrap();
    for actor in [alice, carol] {
        assert!(matches!(
            service.accept_transaction(offered.id, actor).await,
            Err(LedgerError::Forbidden { .. })
        ));
        assert!(matches!(
            service.reject_transaction(offered.id, actor).await,
            Err(LedgerError::Forbidden { .. })
        ));
    }

    let requested = service
        .propose_transaction(TransactionProposal::request(alice, bob, 3600, 1.0, 1), bob)
        .await
        .unwrap();
    for actor in [bob, carol] {
        assert!(matches!(
            service.accept_transaction(requested.id, actor).await,
            Err(LedgerError::Forbidden { .. })
        ));
    }

    let untouched = stored_transaction(&service, offered.id).await;
    assert_eq!(untouched.status, TransactionStatus::OFFERED);
}

#[tokio::test]
async fn test_reject_leaves_balances_alone() {
    let service = create_test_service();
    let alice = register(&service, "alice@example.com").await;
    let bob = register(&service, "bob@example.com").await;

    let offered = service
        .propose_transaction(TransactionProposal::offer(alice, bob, 3600, 1.0, 1), alice)
        .await
        .unwrap();
    let rejected = service.reject_transaction(offered.id, bob).await.unwrap();

    assert_eq!(rejected.status, TransactionStatus::OFFER_REJECTED);
    assert_eq!((rejected.from_user_balance, rejected.to_user_balance), (0, 0));
    assert!(rejected.confirmed_date.is_some());
    assert_eq!(service.balance(alice).await.unwrap(), 0);
    assert_eq!(service.balance(bob).await.unwrap(), 0);

    let requested = service
        .propose_transaction(TransactionProposal::request(alice, bob, 60, 1.0, 1), bob)
        .await
        .unwrap();
    let rejected = service.reject_transaction(requested.id, alice).await.unwrap();
    assert_eq!(rejected.status, TransactionStatus::REQUEST_REJECTED);
}

#[tokio::test]
async fn test_terminal_transactions_are_final() {
    let service = create_test_service();
    let alice = register(&service, "alice@example.com").await;
    let bob = register(&service, "bob@example.com").await;

    let accepted = service
        .propose_transaction(TransactionProposal::offer(alice, bob, 3600, 1.0, 1), alice)
        .await
        .unwrap();
    service.accept_transaction(accepted.id, bob).await.unwrap();
    assert_eq!(
        service.accept_transaction(accepted.id, bob).await.unwrap_err(),
        LedgerError::InvalidState {
            id: accepted.id,
            status: TransactionStatus::OFFER_APPROVED
        }
    );
    assert!(matches!(
        service.reject_transaction(accepted.id, bob).await,
        Err(LedgerError::InvalidState { .. })
    ));
    // the second accept must not have been applied again
    assert_eq!(service.balance(bob).await.unwrap(), 3600);

    let rejected = service
        .propose_transaction(TransactionProposal::offer(alice, bob, 3600, 1.0, 1), alice)
        .await
        .unwrap();
    service.reject_transaction(rejected.id, bob).await.unwrap();
    assert!(matches!(
        service.accept_transaction(rejected.id, bob).await,
        Err(LedgerError::InvalidState { .. })
    ));
}

#[tokio::test]
async fn test_invalid_state_reported_before_authorization() {
    let service = create_test_service();
    let alice = register(&service, "alice@example.com").await;
    let bob = register(&service, "bob@example.com").await;
    let carol = register(&service, "carol@example.com").await;

    let offered = service
        .propose_transaction(TransactionProposal::offer(alice, bob, 3600, 1.0, 1), alice)
        .await
        .unwrap();
    service.reject_transaction(offered.id, bob).await.unwrap();
    assert!(matches!(
        service.accept_transaction(offered.id, carol).await,
        Err(LedgerError::InvalidState { .. })
    ));
}

#[tokio::test]
async fn test_unknown_transaction() {
    let service = create_test_service();
    let alice = register(&service, "alice@example.com").await;

    assert_eq!(
        service.accept_transaction(TransactionId(99), alice).await.unwrap_err(),
        LedgerError::TransactionNotFound(TransactionId(99))
    );
    assert_eq!(
        service.reject_transaction(TransactionId(99), alice).await.unwrap_err(),
        LedgerError::TransactionNotFound(TransactionId(99))
    );
}

#[tokio::test]
async fn test_transaction_visible_to_parties_only() {
    let service = create_test_service();
    let alice = register(&service, "alice@example.com").await;
    let bob = register(&service, "bob@example.com").await;
    let carol = register(&service, "carol@example.com").await;

    let offered = service
        .propose_transaction(TransactionProposal::offer(alice, bob, 3600, 1.0, 1), alice)
        .await
        .unwrap();
    assert_eq!(service.get_transaction(offered.id, alice).await.unwrap(), offered);
    assert_eq!(service.get_transaction(offered.id, bob).await.unwrap(), offered);
    assert!(matches!(
        service.get_transaction(offered.id, carol).await,
        Err(LedgerError::Forbidden { .. })
    ));
}

#[tokio::test]
async fn test_decisions_are_audited() {
    let service = create_test_service();
    let alice = register(&service, "alice@example.com").await;
    let bob = register(&service, "bob@example.com").await;

    let first = service
        .propose_transaction(TransactionProposal::offer(alice, bob, 3600, 1.0, 1), alice)
        .await
        .unwrap();
    let second = service
        .propose_transaction(TransactionProposal::offer(alice, bob, 3600, 1.0, 1), alice)
        .await
        .unwrap();
    service.accept_transaction(first.id, bob).await.unwrap();
    service.reject_transaction(second.id, bob).await.unwrap();
    // failed attempts are not audited
    let _ = service.accept_transaction(first.id, bob).await;

    let logs = service.get_app_logs().await.unwrap();
    let actions: Vec<&str> = logs.iter().map(|l| l.action.as_str()).collect();
    assert_eq!(actions.len(), 4);
    assert_eq!(actions[2], TRANSACTION_ACCEPTED);
    assert_eq!(actions[3], TRANSACTION_REJECTED);
    assert_eq!(logs[2].user_id, Some(bob));
    assert_eq!(logs[2].details["transaction_id"], first.id.0);
}


#[tokio::test]
async fn test_settlement_survives_audit_failure() {
    let _ = env_logger::try_init();
    let service = LedgerService::new(
        InMemoryStorage::new(),
        InMemoryDirectory::new(),
        UnavailableAudit,
        LedgerSettings::default(),
    );
    let alice = service
        .directory()
        .insert_user(User::new("alice@example.com", "Alice", "Doe"))
        .await
        .unwrap();
    let bob = service
        .directory()
        .insert_user(User::new("bob@example.com", "Bob", "Doe"))
        .await
        .unwrap();

    let offered = service
        .propose_transaction(TransactionProposal::offer(alice, bob, 3600, 1.0, 1), alice)
        .await
        .unwrap();
    let accepted = service.accept_transaction(offered.id, bob).await.unwrap();
    assert_eq!(accepted.status, TransactionStatus::OFFER_APPROVED);
    assert_eq!(
        service.storage().load_transaction(offered.id).await.unwrap().status,
        TransactionStatus::OFFER_APPROVED
    );
    assert_eq!(service.balance(alice).await.unwrap(), -3601);

    let requested = service
        .propose_transaction(TransactionProposal::request(alice, bob, 600, 1.0, 1), bob)
        .await
        .unwrap();
    let rejected = service.reject_transaction(requested.id, alice).await.unwrap();
    assert_eq!(rejected.status, TransactionStatus::REQUEST_REJECTED);
    assert_eq!(
        service.storage().load_transaction(requested.id).await.unwrap().status,
        TransactionStatus::REQUEST_REJECTED
    );
}

#[tokio::test]
async fn test_accept_that_would_overflow_a_balance_fails_cleanly() {
    let service = create_test_service();
    let alice = register(&service, "alice@example.com").await;
    let bob = register(&service, "bob@example.com").await;

    let mut deep_debt = settle_hour(&service, alice, bob).await;
    deep_debt.from_user_balance = i64::MIN + 100;
    deep_debt.confirmed_date = deep_debt.confirmed_date.map(|d| d + Duration::seconds(1));
    service.storage().insert_transaction(deep_debt).await.unwrap();
    assert_eq!(service.balance(alice).await.unwrap(), i64::MIN + 100);

    let offered = service
        .propose_transaction(TransactionProposal::offer(alice, bob, 3600, 1.0, 1), alice)
        .await
        .unwrap();
    let err = service.accept_transaction(offered.id, bob).await.unwrap_err();
    assert_eq!(err, LedgerError::BalanceOverflow(offered.id));
    assert_eq!(err.kind(), ErrorKind::InvalidState);

    assert_eq!(
        stored_transaction(&service, offered.id).await.status,
        TransactionStatus::OFFERED
    );
    assert_eq!(service.balance(alice).await.unwrap(), i64::MIN + 100);
}
