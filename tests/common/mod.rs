// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use ledgerd::application::LedgerService;
use ledgerd::domain::{Account, Cents};
use ledgerd::storage::DatabaseConfig;
use tempfile::TempDir;

/// Which store a test runs against.
#[derive(Debug, Clone, Copy)]
pub enum Backend {
    Sqlite,
    Memory,
}

/// A service plus whatever must outlive it (the temp dir holding the database).
pub struct TestLedger {
    pub service: LedgerService,
    pub dir: Option<TempDir>,
}

/// Helper to create a test service with a temporary database
pub async fn sqlite_service() -> Result<(LedgerService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let service = LedgerService::init(&db_config(&temp_dir)).await?;
    Ok((service, temp_dir))
}

/// Database settings pointing into `dir`.
pub fn db_config(dir: &TempDir) -> DatabaseConfig {
    let db_path = dir.path().join("test.db");
    DatabaseConfig::new(db_path.to_str().unwrap())
}

pub async fn test_ledger(backend: Backend) -> Result<TestLedger> {
    Ok(match backend {
        Backend::Sqlite => {
            let (service, dir) = sqlite_service().await?;
            TestLedger {
                service,
                dir: Some(dir),
            }
        }
        Backend::Memory => TestLedger {
            service: LedgerService::in_memory(),
            dir: None,
        },
    })
}

/// Open an account and credit it with `amount`.
pub async fn funded_account(
    service: &LedgerService,
    first_name: &str,
    last_name: &str,
    amount: Cents,
) -> Result<Account> {
    let account = service.create_account(first_name, last_name).await?;
    if amount == 0 {
        return Ok(account);
    }
    Ok(service.adjust_balance(account.account_number, amount).await?)
}

pub async fn balance_of(service: &LedgerService, account: &Account) -> Result<Cents> {
    Ok(service.get_account(account.id).await?.balance)
}
