use crate::core::balance::BalancePolicy;
use crate::core::models::TransactionProposal;
use crate::core::services::{LedgerSettings, PartnerBalance};
use crate::tests::{create_test_service, create_test_service_with, register, settle_hour};

#[tokio::test]
async fn test_new_user_has_zero_balance() {
    let service = create_test_service();
    let alice = register(&service, "alice@example.com").await;
    assert_eq!(service.balance(alice).await.unwrap(), 0);
}

#[tokio::test]
async fn test_balances_chain_across_transactions() {
    let _ = env_logger::try_init();
    let service = create_test_service();
    let alice = register(&service, "alice@example.com").await;
    let bob = register(&service, "bob@example.com").await;
    let carol = register(&service, "carol@example.com").await;

    let first = settle_hour(&service, alice, bob).await;

    let offered = service
        .propose_transaction(TransactionProposal::offer(bob, carol, 1800, 1.0, 1), bob)
        .await
        .unwrap();
    let second = service.accept_transaction(offered.id, carol).await.unwrap();

    assert_eq!(second.from_previous_tid, Some(first.id));
    assert_eq!(second.to_previous_tid, None);
    assert_eq!(second.from_user_balance, 3600 - 1801);
    assert_eq!(second.to_user_balance, 1800);

    assert_eq!(service.balance(alice).await.unwrap(), -3601);
    assert_eq!(service.balance(bob).await.unwrap(), 1799);
    assert_eq!(service.balance(carol).await.unwrap(), 1800);
}

#[tokio::test]
async fn test_multiplier_scales_settled_value() {
    let service = create_test_service();
    let alice = register(&service, "alice@example.com").await;
    let bob = register(&service, "bob@example.com").await;

    let requested = service
        .propose_transaction(TransactionProposal::request(alice, bob, 1000, 1.5, 1), bob)
        .await
        .unwrap();
    let settled = service.accept_transaction(requested.id, alice).await.unwrap();
    assert_eq!(settled.from_user_balance, -1500);
    assert_eq!(settled.to_user_balance, 1499);
}

#[tokio::test]
async fn test_rejection_does_not_mask_balance_by_default() {
    let service = create_test_service();
    let alice = register(&service, "alice@example.com").await;
    let bob = register(&service, "bob@example.com").await;

    settle_hour(&service, alice, bob).await;
    let offered = service
        .propose_transaction(TransactionProposal::offer(alice, bob, 60, 1.0, 1), alice)
        .await
        .unwrap();
    service.reject_transaction(offered.id, bob).await.unwrap();

    assert_eq!(service.balance(alice).await.unwrap(), -3601);
    assert_eq!(service.balance(bob).await.unwrap(), 3600);

    // the next settlement still builds on the approved snapshot
    let next = settle_hour(&service, alice, bob).await;
    assert_eq!(next.from_user_balance, -7202);
    assert_eq!(next.to_user_balance, 7200);
}

#[tokio::test]
async fn test_any_terminal_policy_counts_rejections() {
    let service = create_test_service_with(LedgerSettings {
        balance_policy: BalancePolicy::AnyTerminal,
        ..LedgerSettings::default()
    });
    let alice = register(&service, "alice@example.com").await;
    let bob = register(&service, "bob@example.com").await;

    let approved = settle_hour(&service, alice, bob).await;
    let offered = service
        .propose_transaction(TransactionProposal::offer(alice, bob, 60, 1.0, 1), alice)
        .await
        .unwrap();
    let rejected = service.reject_transaction(offered.id, bob).await.unwrap();

    assert_eq!(service.balance(alice).await.unwrap(), 0);
    assert_eq!(service.balance(bob).await.unwrap(), 0);

    let next = settle_hour(&service, alice, bob).await;
    assert_eq!(next.from_previous_tid, Some(rejected.id));
    assert_ne!(next.from_previous_tid, Some(approved.id));
    assert_eq!(next.from_user_balance, -3601);
}

#[tokio::test]
async fn test_pending_transactions_do_not_move_balances() {
    let service = create_test_service();
    let alice = register(&service, "alice@example.com").await;
    let bob = register(&service, "bob@example.com").await;

    service
        .propose_transaction(TransactionProposal::offer(alice, bob, 3600, 1.0, 1), alice)
        .await
        .unwrap();
    assert_eq!(service.balance(alice).await.unwrap(), 0);
    assert_eq!(service.balance(bob).await.unwrap(), 0);
}

#[tokio::test]
async fn test_transaction_partners_with_balances() {
    let service = create_test_service();
    let alice = register(&service, "alice@example.com").await;
    let bob = register(&service, "bob@example.com").await;
    let carol = register(&service, "carol@example.com").await;
    let dave = register(&service, "dave@example.com").await;

    settle_hour(&service, alice, bob).await;
    service
        .propose_transaction(TransactionProposal::request(carol, alice, 600, 1.0, 1), alice)
        .await
        .unwrap();
    settle_hour(&service, dave, bob).await;

    let partners = service.transaction_partners(alice).await.unwrap();
    assert_eq!(
        partners,
        vec![
            PartnerBalance {
                user_id: alice,
                balance: -3601
            },
            PartnerBalance {
                user_id: bob,
                balance: 7200
            },
            PartnerBalance {
                user_id: carol,
                balance: 0
            },
        ]
    );
}
