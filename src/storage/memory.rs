use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::domain::{
    Account, AccountId, AccountNumber, Cents, FIRST_ACCOUNT_NUMBER, LedgerError, LedgerResult,
    NewAccount, lock_order,
};

use super::AccountStore;

type Slot = Arc<Mutex<Account>>;

#[derive(Default)]
struct Table {
    /// Account records keyed by number. Iteration order is the lock order.
    by_number: BTreeMap<AccountNumber, Slot>,
    /// Id index. Ids grow monotonically, so key order is insertion order.
    by_id: BTreeMap<AccountId, AccountNumber>,
    last_id: AccountId,
    last_number: AccountNumber,
}

/// Account store held in process memory.
///
/// The table lock guards membership: creating and deleting accounts take it
/// exclusively, everything else shares it. Balances are guarded per account,
/// and multi-account operations lock in ascending account-number order.
pub struct MemoryStore {
    table: RwLock<Table>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            table: RwLock::new(Table {
                last_number: FIRST_ACCOUNT_NUMBER - 1,
                ..Default::default()
            }),
        }
    }
}

impl Table {
    fn slot(&self, number: AccountNumber) -> LedgerResult<&Slot> {
        self.by_number
            .get(&number)
            .ok_or(LedgerError::AccountNumberNotFound(number))
    }

    fn slot_by_id(&self, id: AccountId) -> LedgerResult<&Slot> {
        self.by_id
            .get(&id)
            .and_then(|number| self.by_number.get(number))
            .ok_or(LedgerError::AccountNotFound(id))
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn insert_account(&self, new: NewAccount) -> LedgerResult<Account> {
        let mut table = self.table.write().await;
        table.last_id += 1;
        table.last_number += 1;

        let account = new.into_account(table.last_id, table.last_number);
        table.by_id.insert(account.id, account.account_number);
        table
            .by_number
            .insert(account.account_number, Arc::new(Mutex::new(account.clone())));

        debug!(id = account.id, number = account.account_number, "Account created");
        Ok(account)
    }

    async fn get_account_by_id(&self, id: AccountId) -> LedgerResult<Account> {
        let table = self.table.read().await;
        let account = table.slot_by_id(id)?.lock().await;
        Ok(account.clone())
    }

    async fn get_account_by_number(&self, number: AccountNumber) -> LedgerResult<Account> {
        let table = self.table.read().await;
        let account = table.slot(number)?.lock().await;
        Ok(account.clone())
    }

    async fn get_accounts(&self) -> LedgerResult<Vec<Account>> {
        let table = self.table.read().await;

        // Hold every account lock at once so the listing is one consistent snapshot.
        let mut guards = Vec::with_capacity(table.by_number.len());
        for slot in table.by_number.values() {
            guards.push(slot.lock().await);
        }

        let mut accounts: Vec<Account> = guards.iter().map(|guard| (**guard).clone()).collect();
        accounts.sort_by_key(|account| account.id);
        Ok(accounts)
    }

    async fn delete_account(&self, id: AccountId) -> LedgerResult<()> {
        let mut table = self.table.write().await;
        let number = table
            .by_id
            .remove(&id)
            .ok_or(LedgerError::AccountNotFound(id))?;
        table.by_number.remove(&number);
        Ok(())
    }

    async fn apply_balance_delta(
        &self,
        number: AccountNumber,
        delta: Cents,
    ) -> LedgerResult<Account> {
        let table = self.table.read().await;
        let mut account = table.slot(number)?.lock().await;
        account.balance = account.balance_after(delta)?;
        Ok(account.clone())
    }

    async fn move_funds(
        &self,
        source: AccountNumber,
        dest: AccountNumber,
        amount: Cents,
    ) -> LedgerResult<(Account, Account)> {
        if source == dest {
            return Err(LedgerError::SameAccount(source));
        }
        if amount <= 0 {
            return Err(LedgerError::Validation("amount must be positive".to_string()));
        }

        let table = self.table.read().await;
        let (first, second) = lock_order(source, dest);
        let first_slot = table.slot(first)?;
        let second_slot = table.slot(second)?;

        let mut first_guard = first_slot.lock().await;
        let mut second_guard = second_slot.lock().await;
        let (src, dst) = if first == source {
            (&mut *first_guard, &mut *second_guard)
        } else {
            (&mut *second_guard, &mut *first_guard)
        };

        // Compute both balances before writing either one.
        let src_balance = src.balance_after(-amount)?;
        let dst_balance = dst.balance_after(amount)?;
        src.balance = src_balance;
        dst.balance = dst_balance;

        Ok((src.clone(), dst.clone()))
    }
}
