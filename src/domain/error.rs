use thiserror::Error;

use super::{AccountId, AccountNumber, Cents};

/// Failures produced by the account store and the transfer engine.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Malformed or out-of-range input. The caller can fix the request.
    #[error("{0}")]
    Validation(String),

    #[error("account {0} not found")]
    AccountNotFound(AccountId),

    #[error("account number {0} not found")]
    AccountNumberNotFound(AccountNumber),

    #[error("cannot transfer to the same account")]
    SameAccount(AccountNumber),

    #[error("insufficient funds")]
    InsufficientFunds {
        account_number: AccountNumber,
        balance: Cents,
        required: Cents,
    },

    /// Infrastructure fault. The message is for logs, never for clients.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
}

impl LedgerError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            LedgerError::AccountNotFound(_) | LedgerError::AccountNumberNotFound(_)
        )
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;
