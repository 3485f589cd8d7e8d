use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use crate::domain::{
    Account, AccountId, AccountNumber, Cents, LedgerError, LedgerResult, TransferResult,
};
use crate::storage::{AccountStore, DatabaseConfig, MemoryStore, SqliteStore};

use super::TransferEngine;

/// Application service providing high-level operations for the ledger.
/// This is the interface the HTTP handlers and the CLI both talk to.
#[derive(Clone)]
pub struct LedgerService {
    store: Arc<dyn AccountStore>,
    engine: TransferEngine,
}

impl LedgerService {
    /// Create a new ledger service over the given store.
    pub fn new(store: Arc<dyn AccountStore>) -> Self {
        let engine = TransferEngine::new(store.clone());
        Self { store, engine }
    }

    /// Open the SQLite database and create the schema if needed.
    pub async fn init(config: &DatabaseConfig) -> Result<Self> {
        let store = SqliteStore::init(config).await?;
        Ok(Self::new(Arc::new(store)))
    }

    /// A service backed by process memory. Nothing survives a restart.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    // ========================
    // Account operations
    // ========================

    pub async fn create_account(&self, first_name: &str, last_name: &str) -> LedgerResult<Account> {
        let account = self.store.create_account(first_name, last_name).await?;
        info!(id = account.id, number = account.account_number, "Account opened");
        Ok(account)
    }

    pub async fn get_account(&self, id: AccountId) -> LedgerResult<Account> {
        self.store.get_account_by_id(id).await
    }

    pub async fn list_accounts(&self) -> LedgerResult<Vec<Account>> {
        self.store.get_accounts().await
    }

    pub async fn delete_account(&self, id: AccountId) -> LedgerResult<()> {
        self.store.delete_account(id).await?;
        info!(id, "Account deleted");
        Ok(())
    }

    /// Administrative credit (positive) or debit (negative).
    pub async fn adjust_balance(
        &self,
        number: AccountNumber,
        delta: Cents,
    ) -> LedgerResult<Account> {
        if delta == 0 {
            return Err(LedgerError::Validation("delta must not be zero".to_string()));
        }
        let account = self.store.apply_balance_delta(number, delta).await?;
        info!(number, delta, balance = account.balance, "Balance adjusted");
        Ok(account)
    }

    // ========================
    // Transfer operations
    // ========================

    pub async fn transfer(
        &self,
        source: AccountNumber,
        dest: AccountNumber,
        amount: Cents,
    ) -> LedgerResult<TransferResult> {
        self.engine.transfer(source, dest, amount).await
    }

    // ========================
    // Lifecycle
    // ========================

    pub async fn health(&self) -> LedgerResult<()> {
        self.store.ping().await
    }

    /// Release the store. The service must not be used afterwards.
    pub async fn close(&self) {
        self.store.close().await;
    }
}
