use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::domain::{AccountNumber, Cents, LedgerError, LedgerResult, TransferResult};
use crate::storage::AccountStore;

/// Validates and executes balance movements between two accounts.
#[derive(Clone)]
pub struct TransferEngine {
    store: Arc<dyn AccountStore>,
}

impl TransferEngine {
    pub fn new(store: Arc<dyn AccountStore>) -> Self {
        Self { store }
    }

    /// Move `amount` from `source` to `dest`.
    ///
    /// Both balances change in one atomic step or not at all. Failures are
    /// returned as-is and never retried.
    #[instrument(skip(self))]
    pub async fn transfer(
        &self,
        source: AccountNumber,
        dest: AccountNumber,
        amount: Cents,
    ) -> LedgerResult<TransferResult> {
        if source == dest {
            return Err(LedgerError::SameAccount(source));
        }
        if amount <= 0 {
            return Err(LedgerError::Validation("amount must be positive".to_string()));
        }

        let (from, to) = match self.store.move_funds(source, dest, amount).await {
            Ok(accounts) => accounts,
            Err(err) => {
                debug!(error = %err, "Transfer rejected");
                return Err(err);
            }
        };

        let result = TransferResult::new(&from, &to, amount);
        info!(transfer_id = %result.id, "Transfer committed");
        Ok(result)
    }
}
