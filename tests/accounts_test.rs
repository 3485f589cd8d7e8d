mod common;

use std::collections::HashSet;
use std::time::{Duration, Instant};

use anyhow::Result;
use common::{Backend, db_config, funded_account, sqlite_service, test_ledger};
use ledgerd::application::LedgerService;
use ledgerd::domain::{Cents, FIRST_ACCOUNT_NUMBER, LedgerError};
use rstest::rstest;

#[rstest]
#[case::sqlite(Backend::Sqlite)]
#[case::memory(Backend::Memory)]
#[tokio::test]
async fn test_create_account_starts_empty(#[case] backend: Backend) -> Result<()> {
    let ledger = test_ledger(backend).await?;
    let service = &ledger.service;

    let ada = service.create_account("Ada", "Lovelace").await?;
    assert_eq!(ada.id, 1);
    assert_eq!(ada.first_name, "Ada");
    assert_eq!(ada.last_name, "Lovelace");
    assert_eq!(ada.balance, 0);
    assert_eq!(ada.account_number, FIRST_ACCOUNT_NUMBER);

    let fetched = service.get_account(ada.id).await?;
    assert_eq!(fetched, ada);

    Ok(())
}

#[rstest]
#[case::sqlite(Backend::Sqlite)]
#[case::memory(Backend::Memory)]
#[tokio::test]
async fn test_ids_and_numbers_are_unique(#[case] backend: Backend) -> Result<()> {
    let ledger = test_ledger(backend).await?;
    let service = &ledger.service;

    let mut ids = HashSet::new();
    let mut numbers = HashSet::new();
    for i in 0..10 {
        let account = service
            .create_account(&format!("First{i}"), &format!("Last{i}"))
            .await?;
        assert!(ids.insert(account.id), "duplicate id {}", account.id);
        assert!(
            numbers.insert(account.account_number),
            "duplicate number {}",
            account.account_number
        );
        assert_ne!(account.id, account.account_number);
    }

    Ok(())
}

#[rstest]
#[case::sqlite(Backend::Sqlite)]
#[case::memory(Backend::Memory)]
#[tokio::test]
async fn test_create_account_validates_names(#[case] backend: Backend) -> Result<()> {
    let ledger = test_ledger(backend).await?;
    let service = &ledger.service;

    let err = service.create_account("", "Lovelace").await.unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)));

    let err = service.create_account("Ada", "  ").await.unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)));

    // Nothing was persisted and no number was consumed
    assert!(service.list_accounts().await?.is_empty());
    let ada = service.create_account("Ada", "Lovelace").await?;
    assert_eq!(ada.account_number, FIRST_ACCOUNT_NUMBER);

    Ok(())
}

#[rstest]
#[case::sqlite(Backend::Sqlite)]
#[case::memory(Backend::Memory)]
#[tokio::test]
async fn test_list_accounts_in_insertion_order(#[case] backend: Backend) -> Result<()> {
    let ledger = test_ledger(backend).await?;
    let service = &ledger.service;

    assert!(service.list_accounts().await?.is_empty());

    let ada = service.create_account("Ada", "Lovelace").await?;
    let grace = service.create_account("Grace", "Hopper").await?;
    let alan = service.create_account("Alan", "Turing").await?;

    // Mutating balances must not reorder the listing
    service.adjust_balance(grace.account_number, 10).await?;

    let first = service.list_accounts().await?;
    let second = service.list_accounts().await?;
    let ids: Vec<_> = first.iter().map(|a| a.id).collect();
    assert_eq!(ids, vec![ada.id, grace.id, alan.id]);
    assert_eq!(first, second);

    Ok(())
}

#[rstest]
#[case::sqlite(Backend::Sqlite)]
#[case::memory(Backend::Memory)]
#[tokio::test]
async fn test_delete_account_is_terminal(#[case] backend: Backend) -> Result<()> {
    let ledger = test_ledger(backend).await?;
    let service = &ledger.service;

    let ada = funded_account(service, "Ada", "Lovelace", 100).await?;
    let grace = funded_account(service, "Grace", "Hopper", 100).await?;

    service.delete_account(ada.id).await?;

    let err = service.get_account(ada.id).await.unwrap_err();
    assert!(matches!(err, LedgerError::AccountNotFound(id) if id == ada.id));

    let err = service.delete_account(ada.id).await.unwrap_err();
    assert!(err.is_not_found());

    // The number is gone too: no transfers or adjustments against it
    let err = service
        .transfer(grace.account_number, ada.account_number, 1)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    let err = service
        .adjust_balance(ada.account_number, 5)
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    let remaining = service.list_accounts().await?;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, grace.id);

    Ok(())
}

#[rstest]
#[case::sqlite(Backend::Sqlite)]
#[case::memory(Backend::Memory)]
#[tokio::test]
async fn test_unknown_id_is_not_found(#[case] backend: Backend) -> Result<()> {
    let ledger = test_ledger(backend).await?;

    let err = ledger.service.get_account(42).await.unwrap_err();
    assert!(matches!(err, LedgerError::AccountNotFound(42)));

    let err = ledger.service.delete_account(42).await.unwrap_err();
    assert!(matches!(err, LedgerError::AccountNotFound(42)));

    Ok(())
}

#[rstest]
#[case::sqlite(Backend::Sqlite)]
#[case::memory(Backend::Memory)]
#[tokio::test]
async fn test_adjust_balance(#[case] backend: Backend) -> Result<()> {
    let ledger = test_ledger(backend).await?;
    let service = &ledger.service;

    let ada = service.create_account("Ada", "Lovelace").await?;

    let credited = service.adjust_balance(ada.account_number, 1000).await?;
    assert_eq!(credited.balance, 1000);

    let debited = service.adjust_balance(ada.account_number, -400).await?;
    assert_eq!(debited.balance, 600);

    let err = service
        .adjust_balance(ada.account_number, -601)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerError::InsufficientFunds { balance: 600, required: 601, .. }
    ));

    let err = service.adjust_balance(ada.account_number, 0).await.unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)));

    let err = service.adjust_balance(999_999, 10).await.unwrap_err();
    assert!(matches!(err, LedgerError::AccountNumberNotFound(999_999)));

    assert_eq!(service.get_account(ada.id).await?.balance, 600);

    Ok(())
}

#[rstest]
#[case::sqlite(Backend::Sqlite)]
#[case::memory(Backend::Memory)]
#[tokio::test]
async fn test_extreme_adjustments_fail_cleanly(#[case] backend: Backend) -> Result<()> {
    let ledger = test_ledger(backend).await?;
    let service = &ledger.service;

    let ada = funded_account(service, "Ada", "Lovelace", 10).await?;

    let err = service
        .adjust_balance(ada.account_number, Cents::MIN)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerError::InsufficientFunds { balance: 10, required: Cents::MAX, .. }
    ));

    let err = service
        .adjust_balance(ada.account_number, Cents::MAX)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Validation(ref msg) if msg == "balance overflow"));
    assert_eq!(service.get_account(ada.id).await?.balance, 10);

    // Exactly reaching the ceiling is fine; one more cent is not
    let grace = service.create_account("Grace", "Hopper").await?;
    let full = service.adjust_balance(grace.account_number, Cents::MAX).await?;
    assert_eq!(full.balance, Cents::MAX);
    let err = service
        .adjust_balance(grace.account_number, 1)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)));
    assert_eq!(service.get_account(grace.id).await?.balance, Cents::MAX);

    Ok(())
}

#[tokio::test]
async fn test_closed_store_fails_fast() -> Result<()> {
    let (service, _temp_dir) = sqlite_service().await?;
    let ada = funded_account(&service, "Ada", "Lovelace", 100).await?;
    let grace = service.create_account("Grace", "Hopper").await?;
    service.close().await;

    let started = Instant::now();
    let err = service.get_account(ada.id).await.unwrap_err();
    assert!(matches!(err, LedgerError::StoreUnavailable(_)));
    let err = service.list_accounts().await.unwrap_err();
    assert!(matches!(err, LedgerError::StoreUnavailable(_)));
    let err = service
        .adjust_balance(ada.account_number, 5)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::StoreUnavailable(_)));
    let err = service
        .transfer(ada.account_number, grace.account_number, 5)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::StoreUnavailable(_)));
    let err = service.health().await.unwrap_err();
    assert!(matches!(err, LedgerError::StoreUnavailable(_)));
    assert!(started.elapsed() < Duration::from_secs(2));

    Ok(())
}

#[tokio::test]
async fn test_sqlite_data_survives_reopen() -> Result<()> {
    let (service, temp_dir) = sqlite_service().await?;

    let ada = funded_account(&service, "Ada", "Lovelace", 250).await?;
    service.close().await;

    let reopened = LedgerService::init(&db_config(&temp_dir)).await?;
    let fetched = reopened.get_account(ada.id).await?;
    assert_eq!(fetched.balance, 250);
    assert_eq!(fetched.account_number, ada.account_number);
    assert_eq!(fetched.created_at, ada.created_at);

    // Numbering continues from where it stopped
    let grace = reopened.create_account("Grace", "Hopper").await?;
    assert_eq!(grace.account_number, ada.account_number + 1);

    Ok(())
}
