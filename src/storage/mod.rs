mod memory;
mod sqlite;

pub use memory::*;
pub use sqlite::*;

use async_trait::async_trait;

use crate::domain::{Account, AccountId, AccountNumber, Cents, LedgerResult, NewAccount};

/// SQL migration for the accounts schema
pub const MIGRATION_001_ACCOUNTS: &str = include_str!("migrations/001_accounts.sql");

/// Storage capability for account records.
///
/// Every mutation is atomic: concurrent callers on the same account are
/// serialized and readers never see a half-applied change.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Persist a validated account, assigning its id and account number.
    async fn insert_account(&self, new: NewAccount) -> LedgerResult<Account>;

    /// Validate the names and open a new account with a zero balance.
    async fn create_account(&self, first_name: &str, last_name: &str) -> LedgerResult<Account> {
        let new = NewAccount::new(first_name, last_name)?;
        self.insert_account(new).await
    }

    async fn get_account_by_id(&self, id: AccountId) -> LedgerResult<Account>;

    async fn get_account_by_number(&self, number: AccountNumber) -> LedgerResult<Account>;

    /// All accounts in insertion order.
    async fn get_accounts(&self) -> LedgerResult<Vec<Account>>;

    async fn delete_account(&self, id: AccountId) -> LedgerResult<()>;

    /// Add `delta` (possibly negative) to a balance. Balances never go below zero.
    async fn apply_balance_delta(
        &self,
        number: AccountNumber,
        delta: Cents,
    ) -> LedgerResult<Account>;

    /// Debit `source` and credit `dest` by `amount` as one unit.
    ///
    /// Returns both accounts after the commit, source first.
    async fn move_funds(
        &self,
        source: AccountNumber,
        dest: AccountNumber,
        amount: Cents,
    ) -> LedgerResult<(Account, Account)>;

    /// Cheap liveness probe.
    async fn ping(&self) -> LedgerResult<()> {
        Ok(())
    }

    /// Release backing resources. Called once at shutdown.
    async fn close(&self) {}
}
