use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Account, AccountNumber, Cents};

pub type TransferId = Uuid;

/// Body of a transfer request. The source account comes from the caller context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub to_account: AccountNumber,
    pub amount: Cents,
}

/// Receipt for a committed transfer. Receipts are returned, not stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferResult {
    pub id: TransferId,
    /// Debited account
    pub source: AccountNumber,
    /// Credited account
    pub dest: AccountNumber,
    pub amount: Cents,
    pub source_balance: Cents,
    pub dest_balance: Cents,
    pub completed_at: DateTime<Utc>,
}

impl TransferResult {
    /// Build a receipt from the post-commit state of both accounts.
    pub fn new(source: &Account, dest: &Account, amount: Cents) -> Self {
        Self {
            id: Uuid::new_v4(),
            source: source.account_number,
            dest: dest.account_number,
            amount,
            source_balance: source.balance,
            dest_balance: dest.balance,
            completed_at: Utc::now(),
        }
    }
}

/// Order a pair of account numbers for lock acquisition.
///
/// Every two-account mutation locks the lower number first, so two transfers
/// moving funds in opposite directions between the same pair cannot deadlock.
pub fn lock_order(a: AccountNumber, b: AccountNumber) -> (AccountNumber, AccountNumber) {
    if a <= b { (a, b) } else { (b, a) }
}
