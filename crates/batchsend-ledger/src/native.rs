//! Native value-unit custody.

use std::collections::HashSet;

use batchsend_types::{Address, Amount, LedgerError};

use crate::book::BalanceBook;

/// Custody of the chain-native value unit.
///
/// `transfer` is the only primitive the engine uses to move value;
/// `revert_transfer` undoes a transfer previously applied by `transfer` and
/// must not consult acceptance rules of either party.
pub trait NativeLedger {
    /// Current balance of `account`.
    fn balance_of(&self, account: &Address) -> Amount;

    /// Move `amount` from `from` to `to`.
    ///
    /// # Errors
    /// Any [`LedgerError`]; on error the ledger must be unchanged.
    fn transfer(&mut self, from: &Address, to: &Address, amount: Amount) -> Result<(), LedgerError>;

    /// Undo a transfer of `amount` from `from` to `to`.
    ///
    /// # Errors
    /// `NothingToRevert` if `to` no longer holds `amount`.
    fn revert_transfer(
        &mut self,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), LedgerError>;
}

/// Hash-map backed [`NativeLedger`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryNativeLedger {
    balances: BalanceBook<Address>,
    /// Accounts that refuse incoming value.
    rejecting: HashSet<Address>,
}

impl InMemoryNativeLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create value out of thin air for `account` (genesis / faucet).
    ///
    /// # Errors
    /// `BalanceOverflow` if the balance would overflow.
    pub fn deposit(&mut self, account: &Address, amount: Amount) -> Result<(), LedgerError> {
        self.balances.credit(account, amount)
    }

    /// Destroy `amount` of `account`'s balance.
    ///
    /// # Errors
    /// `InsufficientBalance` if the account holds less than `amount`.
    pub fn withdraw(&mut self, account: &Address, amount: Amount) -> Result<(), LedgerError> {
        self.balances.debit(account, amount)
    }

    /// Make `account` refuse every incoming transfer.
    pub fn reject_incoming(&mut self, account: Address) {
        self.rejecting.insert(account);
    }

    /// Undo [`Self::reject_incoming`].
    pub fn accept_incoming(&mut self, account: &Address) {
        self.rejecting.remove(account);
    }

    /// Sum of every account's balance.
    #[must_use]
    pub fn total_supply(&self) -> Amount {
        self.balances.total_where(|_| true).unwrap_or(Amount::MAX)
    }
}

impl NativeLedger for InMemoryNativeLedger {
    fn balance_of(&self, account: &Address) -> Amount {
        self.balances.balance(account)
    }

    fn transfer(&mut self, from: &Address, to: &Address, amount: Amount) -> Result<(), LedgerError> {
        if self.rejecting.contains(to) {
            tracing::debug!(to = %to, amount, "Native transfer refused by recipient");
            return Err(LedgerError::RecipientRejected { account: *to });
        }
        self.balances.move_balance(from, to, amount)
    }

    fn revert_transfer(
        &mut self,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        self.balances
            .move_balance(to, from, amount)
            .map_err(|_| LedgerError::NothingToRevert { account: *to })
    }
}
