use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::LedgerError;

/// Balances are integer minor units (cents) to avoid floating-point drift.
pub type Cents = i64;

/// Internal primary key assigned by the store.
pub type AccountId = i64;

/// External handle used to address accounts in transfers.
pub type AccountNumber = i64;

/// First account number handed out by a fresh store.
pub const FIRST_ACCOUNT_NUMBER: AccountNumber = 100_001;

/// Longest accepted first or last name, in characters.
pub const MAX_NAME_LEN: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: AccountId,
    pub first_name: String,
    pub last_name: String,
    pub account_number: AccountNumber,
    pub balance: Cents,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Balance after applying `delta`, or the reason it can't be applied.
    pub fn balance_after(&self, delta: Cents) -> Result<Cents, LedgerError> {
        next_balance(self.account_number, self.balance, delta)
    }
}

/// `balance + delta`, rejecting overflow and results below zero.
pub fn next_balance(
    account_number: AccountNumber,
    balance: Cents,
    delta: Cents,
) -> Result<Cents, LedgerError> {
    let next = balance
        .checked_add(delta)
        .ok_or_else(|| LedgerError::Validation("balance overflow".to_string()))?;

    if next < 0 {
        return Err(LedgerError::InsufficientFunds {
            account_number,
            balance,
            required: delta.saturating_neg(),
        });
    }
    Ok(next)
}

/// A validated request to open an account. Names are trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
}

impl NewAccount {
    pub fn new(first_name: &str, last_name: &str) -> Result<Self, LedgerError> {
        Ok(Self {
            first_name: validate_name("first name", first_name)?,
            last_name: validate_name("last name", last_name)?,
            created_at: Utc::now(),
        })
    }

    /// Attach store-assigned identity to produce the persisted record.
    pub fn into_account(self, id: AccountId, account_number: AccountNumber) -> Account {
        Account {
            id,
            first_name: self.first_name,
            last_name: self.last_name,
            account_number,
            balance: 0,
            created_at: self.created_at,
        }
    }
}

fn validate_name(field: &str, value: &str) -> Result<String, LedgerError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(LedgerError::Validation(format!("{field} must not be empty")));
    }
    if value.chars().count() > MAX_NAME_LEN {
        return Err(LedgerError::Validation(format!(
            "{field} must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(value.to_string())
}
