//! Conservation audit for a staged batch.
//!
//! Invariant checked before every commit:
//! ```text
//! ∀ account touched: balance_after == balance_before + Σ(credits) - Σ(debits)
//! ```
//!
//! Credits and debits come from the batch [`Journal`], balances from the
//! ledger. A mismatch means the ledger created or destroyed value behind the
//! engine's back, and the batch must not commit.

use std::collections::HashMap;

use batchsend_types::{Address, Amount, BatchSendError, Result};

use crate::journal::Journal;

/// Pre-batch balance snapshot of every account a batch may touch.
#[derive(Debug, Clone)]
pub struct ConservationAudit {
    before: HashMap<Address, Amount>,
}

impl ConservationAudit {
    /// Snapshot `balance_of` for each account (duplicates are collapsed).
    pub fn snapshot(
        accounts: impl IntoIterator<Item = Address>,
        balance_of: impl Fn(&Address) -> Amount,
    ) -> Self {
        let mut before = HashMap::new();
        for account in accounts {
            before
                .entry(account)
                .or_insert_with(|| balance_of(&account));
        }
        Self { before }
    }

    /// Number of distinct accounts in the snapshot.
    #[must_use]
    pub fn tracked(&self) -> usize {
        self.before.len()
    }

    /// Verify current balances against the snapshot plus journal deltas.
    ///
    /// # Errors
    /// [`BatchSendError::SupplyInvariantViolation`] naming the first account
    /// whose balance disagrees, or that the journal touched outside the
    /// snapshot.
    pub fn verify(&self, journal: &Journal, balance_of: impl Fn(&Address) -> Amount) -> Result<()> {
        let mut credits: HashMap<Address, Amount> = HashMap::new();
        let mut debits: HashMap<Address, Amount> = HashMap::new();
        for movement in journal.movements() {
            for (side, account) in [(&mut debits, movement.from), (&mut credits, movement.to)] {
                let slot = side.entry(account).or_insert(0);
                *slot = slot
                    .checked_add(movement.amount)
                    .ok_or(BatchSendError::SupplyInvariantViolation { account })?;
            }
        }

        if let Some(account) = credits
            .keys()
            .chain(debits.keys())
            .find(|account| !self.before.contains_key(account))
        {
            return Err(self.violation(*account));
        }

        for (account, before) in &self.before {
            let credited = credits.get(account).copied().unwrap_or(0);
            let debited = debits.get(account).copied().unwrap_or(0);
            let expected = before
                .checked_add(credited)
                .and_then(|v| v.checked_sub(debited));
            let actual = balance_of(account);
            if expected != Some(actual) {
                tracing::error!(
                    account = %account,
                    before,
                    credited,
                    debited,
                    actual,
                    "Conservation audit failed"
                );
                return Err(self.violation(*account));
            }
        }
        Ok(())
    }

    fn violation(&self, account: Address) -> BatchSendError {
        tracing::error!(account = %account, tracked = self.tracked(), "Supply invariant violated");
        BatchSendError::SupplyInvariantViolation { account }
    }
}
