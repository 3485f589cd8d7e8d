use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteConnection, SqliteJournalMode, SqlitePool, SqlitePoolOptions,
    SqliteRow,
};
use tracing::{debug, error, instrument};

use crate::domain::{
    Account, AccountId, AccountNumber, Cents, LedgerError, LedgerResult, NewAccount, lock_order,
    next_balance,
};

use super::{AccountStore, MIGRATION_001_ACCOUNTS};

const ACCOUNT_COLUMNS: &str = "id, first_name, last_name, number, balance, created_at";

/// Connection settings for the SQLite-backed store.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Database file path. Created if missing.
    pub path: String,
    /// Maximum number of pooled connections.
    pub max_connections: u32,
    /// How long a request may wait for a free connection.
    pub acquire_timeout: Duration,
    /// How long a statement may wait on a locked database.
    pub busy_timeout: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "ledger.db".to_string(),
            max_connections: 8,
            acquire_timeout: Duration::from_secs(3),
            busy_timeout: Duration::from_secs(5),
        }
    }
}

impl DatabaseConfig {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }
}

/// Account store persisted in SQLite.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Create a store over an existing connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (or create) the database described by `config`.
    #[instrument(skip_all, fields(path = %config.path))]
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        debug!(max_conn = config.max_connections, "Creating connection pool");

        let options = SqliteConnectOptions::new()
            .filename(&config.path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(config.busy_timeout);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect_with(options)
            .await
            .context("Failed to connect to database")?;

        Ok(Self::new(pool))
    }

    /// Create the schema if it does not exist yet.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_ACCOUNTS)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;

        debug!("Migrations completed");
        Ok(())
    }

    /// Initialize a database (connect + migrate).
    pub async fn init(config: &DatabaseConfig) -> Result<Self> {
        let store = Self::connect(config).await?;
        store.migrate().await?;
        Ok(store)
    }

    /// Conditionally add `delta` to one balance inside the caller's transaction.
    async fn apply_delta(
        conn: &mut SqliteConnection,
        number: AccountNumber,
        delta: Cents,
    ) -> LedgerResult<Account> {
        // Largest starting balance that can take `delta` without leaving i64.
        let ceiling = Cents::MAX.saturating_sub(delta.max(0));

        let row = sqlx::query(&format!(
            "UPDATE accounts SET balance = balance + ? \
             WHERE number = ? AND balance + ? >= 0 AND balance <= ? \
             RETURNING {ACCOUNT_COLUMNS}"
        ))
        .bind(delta)
        .bind(number)
        .bind(delta)
        .bind(ceiling)
        .fetch_optional(&mut *conn)
        .await
        .map_err(unavailable("Failed to update balance"))?;

        if let Some(row) = row {
            return Self::row_to_account(&row);
        }

        // Nothing matched: either the account is gone or the guard rejected it.
        let balance: Option<Cents> =
            sqlx::query_scalar("SELECT balance FROM accounts WHERE number = ?")
                .bind(number)
                .fetch_optional(&mut *conn)
                .await
                .map_err(unavailable("Failed to fetch balance"))?;

        let Some(balance) = balance else {
            return Err(LedgerError::AccountNumberNotFound(number));
        };
        next_balance(number, balance, delta)?;
        error!(number, balance, delta, "Balance guard rejected a valid update");
        Err(LedgerError::StoreUnavailable(format!(
            "balance update for account {number} was not applied"
        )))
    }

    fn row_to_account(row: &SqliteRow) -> LedgerResult<Account> {
        let decode = || unavailable("Failed to decode account row");
        let created_at_str: String = row.try_get("created_at").map_err(decode())?;

        Ok(Account {
            id: row.try_get("id").map_err(decode())?,
            first_name: row.try_get("first_name").map_err(decode())?,
            last_name: row.try_get("last_name").map_err(decode())?,
            account_number: row.try_get("number").map_err(decode())?,
            balance: row.try_get("balance").map_err(decode())?,
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .map_err(|e| {
                    error!(error = %e, value = %created_at_str, "Invalid created_at timestamp");
                    LedgerError::StoreUnavailable(format!("invalid created_at timestamp: {e}"))
                })?
                .with_timezone(&Utc),
        })
    }
}

/// Log a driver error and reduce it to `StoreUnavailable`.
fn unavailable(context: &'static str) -> impl FnOnce(sqlx::Error) -> LedgerError {
    move |err| {
        error!(error = %err, "{}", context);
        LedgerError::StoreUnavailable(format!("{context}: {err}"))
    }
}

#[async_trait]
impl AccountStore for SqliteStore {
    #[instrument(skip(self, new))]
    async fn insert_account(&self, new: NewAccount) -> LedgerResult<Account> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(unavailable("Failed to begin transaction"))?;

        // Draw the number and insert in one transaction so numbers are never skipped.
        let number: AccountNumber = sqlx::query_scalar(
            r#"
            UPDATE sequence_counter
            SET value = value + 1
            WHERE name = 'account_number'
            RETURNING value
            "#,
        )
        .fetch_one(&mut *tx)
        .await
        .map_err(unavailable("Failed to get next account number"))?;

        let id: AccountId = sqlx::query_scalar(
            r#"
            INSERT INTO accounts (first_name, last_name, number, balance, created_at)
            VALUES (?, ?, ?, 0, ?)
            RETURNING id
            "#,
        )
        .bind(&new.first_name)
        .bind(&new.last_name)
        .bind(number)
        .bind(new.created_at.to_rfc3339())
        .fetch_one(&mut *tx)
        .await
        .map_err(unavailable("Failed to save account"))?;

        tx.commit()
            .await
            .map_err(unavailable("Failed to commit account"))?;

        debug!(id, number, "Account created");
        Ok(new.into_account(id, number))
    }

    #[instrument(skip(self))]
    async fn get_account_by_id(&self, id: AccountId) -> LedgerResult<Account> {
        let row = sqlx::query(&format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(unavailable("Failed to fetch account"))?;

        match row {
            Some(row) => Self::row_to_account(&row),
            None => Err(LedgerError::AccountNotFound(id)),
        }
    }

    #[instrument(skip(self))]
    async fn get_account_by_number(&self, number: AccountNumber) -> LedgerResult<Account> {
        let row = sqlx::query(&format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE number = ?"))
            .bind(number)
            .fetch_optional(&self.pool)
            .await
            .map_err(unavailable("Failed to fetch account by number"))?;

        match row {
            Some(row) => Self::row_to_account(&row),
            None => Err(LedgerError::AccountNumberNotFound(number)),
        }
    }

    #[instrument(skip(self))]
    async fn get_accounts(&self) -> LedgerResult<Vec<Account>> {
        let rows = sqlx::query(&format!("SELECT {ACCOUNT_COLUMNS} FROM accounts ORDER BY id"))
            .fetch_all(&self.pool)
            .await
            .map_err(unavailable("Failed to list accounts"))?;

        rows.iter().map(Self::row_to_account).collect()
    }

    #[instrument(skip(self))]
    async fn delete_account(&self, id: AccountId) -> LedgerResult<()> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(unavailable("Failed to delete account"))?;

        if result.rows_affected() == 0 {
            return Err(LedgerError::AccountNotFound(id));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn apply_balance_delta(
        &self,
        number: AccountNumber,
        delta: Cents,
    ) -> LedgerResult<Account> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(unavailable("Failed to begin transaction"))?;

        let account = Self::apply_delta(&mut tx, number, delta).await?;

        tx.commit()
            .await
            .map_err(unavailable("Failed to commit balance update"))?;
        Ok(account)
    }

    #[instrument(skip(self))]
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

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(unavailable("Failed to begin transaction"))?;

        // Any early return drops `tx`, which rolls both updates back.
        let (first, second) = lock_order(source, dest);
        let delta_for = |number| if number == source { -amount } else { amount };

        let first_account = Self::apply_delta(&mut tx, first, delta_for(first)).await?;
        let second_account = Self::apply_delta(&mut tx, second, delta_for(second)).await?;

        tx.commit()
            .await
            .map_err(unavailable("Failed to commit transfer"))?;

        if first == source {
            Ok((first_account, second_account))
        } else {
            Ok((second_account, first_account))
        }
    }

    async fn ping(&self) -> LedgerResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(unavailable("Health check failed"))?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
        debug!("Connection pool closed");
    }
}
