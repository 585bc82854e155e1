//! Balance book shared by the in-memory ledgers.
//!
//! Tracks one [`Amount`] per account key. Every mutation is atomic: either
//! the full operation succeeds or the book is unchanged.

use std::{collections::HashMap, hash::Hash};

use batchsend_types::{Address, Amount, AssetId, LedgerError};

/// A balance key that identifies an account for error reporting.
pub trait AccountKey: Clone + Eq + Hash {
    fn account(&self) -> Address;
}

impl AccountKey for Address {
    fn account(&self) -> Address {
        *self
    }
}

impl AccountKey for (AssetId, Address) {
    fn account(&self) -> Address {
        self.1
    }
}

/// Per-key balances with checked arithmetic.
#[derive(Debug, Clone)]
pub struct BalanceBook<K> {
    balances: HashMap<K, Amount>,
}

impl<K: AccountKey> BalanceBook<K> {
    /// Create an empty book.
    #[must_use]
    pub fn new() -> Self {
        Self {
            balances: HashMap::new(),
        }
    }

    /// Balance for a key (zero if never touched).
    #[must_use]
    pub fn balance(&self, key: &K) -> Amount {
        self.balances.get(key).copied().unwrap_or(0)
    }

    /// Increase a balance.
    ///
    /// # Errors
    /// Returns `BalanceOverflow` if the balance would exceed [`Amount::MAX`].
    pub fn credit(&mut self, key: &K, amount: Amount) -> Result<(), LedgerError> {
        let updated = self
            .balance(key)
            .checked_add(amount)
            .ok_or(LedgerError::BalanceOverflow {
                account: key.account(),
            })?;
        self.balances.insert(key.clone(), updated);
        Ok(())
    }

    /// Decrease a balance.
    ///
    /// # Errors
    /// Returns `InsufficientBalance` if the balance is below `amount`.
    pub fn debit(&mut self, key: &K, amount: Amount) -> Result<(), LedgerError> {
        let available = self.balance(key);
        let updated = available
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientBalance {
                account: key.account(),
                needed: amount,
                available,
            })?;
        self.balances.insert(key.clone(), updated);
        Ok(())
    }

    /// Move `amount` from one key to another. Both sides are checked before
    /// either is written.
    ///
    /// # Errors
    /// - `InsufficientBalance` if `from` holds less than `amount`
    /// - `BalanceOverflow` if crediting `to` would overflow
    pub fn move_balance(&mut self, from: &K, to: &K, amount: Amount) -> Result<(), LedgerError> {
        let available = self.balance(from);
        let from_after = available
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientBalance {
                account: from.account(),
                needed: amount,
                available,
            })?;
        if from == to {
            return Ok(());
        }
        let to_after = self
            .balance(to)
            .checked_add(amount)
            .ok_or(LedgerError::BalanceOverflow {
                account: to.account(),
            })?;
        self.balances.insert(from.clone(), from_after);
        self.balances.insert(to.clone(), to_after);
        Ok(())
    }

    /// Sum of all balances whose key matches `filter`, or `None` if the sum
    /// overflows.
    #[must_use]
    pub fn total_where(&self, filter: impl Fn(&K) -> bool) -> Option<Amount> {
        self.balances
            .iter()
            .filter(|(key, _)| filter(key))
            .try_fold(0u128, |acc, (_, amount)| acc.checked_add(*amount))
    }

    /// Number of keys ever touched.
    #[must_use]
    pub fn len(&self) -> usize {
        self.balances.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }
}

impl<K: AccountKey> Default for BalanceBook<K> {
    fn default() -> Self {
        Self::new()
    }
}
