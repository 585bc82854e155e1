//! Token-style balances with allowances.
//!
//! An allowance of [`Amount::MAX`] is treated as unlimited and is never
//! decremented by `transfer_from`.

use std::collections::{HashMap, HashSet};

use batchsend_types::{Address, Amount, AssetId, LedgerError};

use crate::book::BalanceBook;

/// Token-style accounting: balances plus owner → spender allowances.
pub trait TokenLedger {
    /// Balance of `account` in `asset`.
    fn balance_of(&self, asset: &AssetId, account: &Address) -> Amount;

    /// How much `spender` may still pull from `owner`.
    fn allowance(&self, asset: &AssetId, owner: &Address, spender: &Address) -> Amount;

    /// `spender` moves `amount` of `from`'s balance to `to`, consuming
    /// allowance.
    ///
    /// # Errors
    /// Any [`LedgerError`]; on error the ledger must be unchanged.
    fn transfer_from(
        &mut self,
        asset: &AssetId,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), LedgerError>;

    /// Undo a `transfer_from`, restoring both balances and the allowance.
    ///
    /// # Errors
    /// `NothingToRevert` if `to` no longer holds `amount`.
    fn revert_transfer_from(
        &mut self,
        asset: &AssetId,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), LedgerError>;
}

type AllowanceKey = (AssetId, Address, Address);

/// Hash-map backed [`TokenLedger`] holding any number of assets.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTokenLedger {
    balances: BalanceBook<(AssetId, Address)>,
    allowances: HashMap<AllowanceKey, Amount>,
    /// (asset, account) pairs that refuse incoming transfers.
    rejecting: HashSet<(AssetId, Address)>,
}

impl InMemoryTokenLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue new `asset` units to `account`.
    ///
    /// # Errors
    /// `BalanceOverflow` if the balance would overflow.
    pub fn mint(&mut self, asset: &AssetId, account: &Address, amount: Amount) -> Result<(), LedgerError> {
        self.balances.credit(&(*asset, *account), amount)
    }

    /// Set `spender`'s allowance over `owner`'s `asset` balance.
    pub fn approve(&mut self, asset: &AssetId, owner: &Address, spender: &Address, amount: Amount) {
        self.allowances.insert((*asset, *owner, *spender), amount);
    }

    /// Owner-initiated transfer (no allowance involved).
    ///
    /// # Errors
    /// `RecipientRejected`, `InsufficientBalance` or `BalanceOverflow`.
    pub fn transfer(
        &mut self,
        asset: &AssetId,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        self.check_accepts(asset, to)?;
        self.balances
            .move_balance(&(*asset, *from), &(*asset, *to), amount)
    }

    /// Make `account` refuse incoming `asset` transfers.
    pub fn reject_incoming(&mut self, asset: AssetId, account: Address) {
        self.rejecting.insert((asset, account));
    }

    /// Sum of every account's `asset` balance.
    #[must_use]
    pub fn total_supply(&self, asset: &AssetId) -> Amount {
        self.balances
            .total_where(|(a, _)| a == asset)
            .unwrap_or(Amount::MAX)
    }

    fn check_accepts(&self, asset: &AssetId, to: &Address) -> Result<(), LedgerError> {
        if self.rejecting.contains(&(*asset, *to)) {
            tracing::debug!(asset = %asset, to = %to, "Token transfer refused by recipient");
            return Err(LedgerError::RecipientRejected { account: *to });
        }
        Ok(())
    }
}

impl TokenLedger for InMemoryTokenLedger {
    fn balance_of(&self, asset: &AssetId, account: &Address) -> Amount {
        self.balances.balance(&(*asset, *account))
    }

    fn allowance(&self, asset: &AssetId, owner: &Address, spender: &Address) -> Amount {
        self.allowances
            .get(&(*asset, *owner, *spender))
            .copied()
            .unwrap_or(0)
    }

    fn transfer_from(
        &mut self,
        asset: &AssetId,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        let available = self.allowance(asset, from, spender);
        if available < amount {
            return Err(LedgerError::InsufficientAllowance {
                needed: amount,
                available,
            });
        }
        self.transfer(asset, from, to, amount)?;
        if available != Amount::MAX {
            self.allowances
                .insert((*asset, *from, *spender), available - amount);
        }
        Ok(())
    }

    fn revert_transfer_from(
        &mut self,
        asset: &AssetId,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        let remaining = self.allowance(asset, from, spender);
        let restored = if remaining == Amount::MAX {
            remaining
        } else {
            remaining
                .checked_add(amount)
                .ok_or(LedgerError::NothingToRevert { account: *from })?
        };
        self.balances
            .move_balance(&(*asset, *to), &(*asset, *from), amount)
            .map_err(|_| LedgerError::NothingToRevert { account: *to })?;
        self.allowances.insert((*asset, *from, *spender), restored);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usdc() -> AssetId {
        AssetId::new(Address::from_label("usdc"))
    }

    #[test]
    fn transfer_from_consumes_allowance() {
        let mut ledger = InMemoryTokenLedger::new();
        let (owner, spender, to) = (Address::random(), Address::random(), Address::random());
        ledger.mint(&usdc(), &owner, 100).unwrap();
        ledger.approve(&usdc(), &owner, &spender, 60);

        ledger.transfer_from(&usdc(), &spender, &owner, &to, 40).unwrap();
        assert_eq!(ledger.balance_of(&usdc(), &owner), 60);
        assert_eq!(ledger.balance_of(&usdc(), &to), 40);
        assert_eq!(ledger.allowance(&usdc(), &owner, &spender), 20);
        assert_eq!(ledger.total_supply(&usdc()), 100);
    }

    #[test]
    fn transfer_from_over_allowance_fails() {
        let mut ledger = InMemoryTokenLedger::new();
        let (owner, spender, to) = (Address::random(), Address::random(), Address::random());
        ledger.mint(&usdc(), &owner, 100).unwrap();
        ledger.approve(&usdc(), &owner, &spender, 10);

        let err = ledger
            .transfer_from(&usdc(), &spender, &owner, &to, 11)
            .unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientAllowance {
                needed: 11,
                available: 10
            }
        );
        assert_eq!(ledger.balance_of(&usdc(), &owner), 100);
        assert_eq!(ledger.allowance(&usdc(), &owner, &spender), 10);
    }

    #[test]
    fn unlimited_allowance_is_not_decremented() {
        let mut ledger = InMemoryTokenLedger::new();
        let (owner, spender, to) = (Address::random(), Address::random(), Address::random());
        ledger.mint(&usdc(), &owner, 100).unwrap();
        ledger.approve(&usdc(), &owner, &spender, Amount::MAX);

        ledger.transfer_from(&usdc(), &spender, &owner, &to, 30).unwrap();
        assert_eq!(ledger.allowance(&usdc(), &owner, &spender), Amount::MAX);
        ledger
            .revert_transfer_from(&usdc(), &spender, &owner, &to, 30)
            .unwrap();
        assert_eq!(ledger.allowance(&usdc(), &owner, &spender), Amount::MAX);
        assert_eq!(ledger.balance_of(&usdc(), &owner), 100);
    }

    #[test]
    fn revert_restores_balance_and_allowance() {
        let mut ledger = InMemoryTokenLedger::new();
        let (owner, spender, to) = (Address::random(), Address::random(), Address::random());
        ledger.mint(&usdc(), &owner, 100).unwrap();
        ledger.approve(&usdc(), &owner, &spender, 50);
        ledger.transfer_from(&usdc(), &spender, &owner, &to, 50).unwrap();

        ledger
            .revert_transfer_from(&usdc(), &spender, &owner, &to, 50)
            .unwrap();
        assert_eq!(ledger.balance_of(&usdc(), &owner), 100);
        assert_eq!(ledger.balance_of(&usdc(), &to), 0);
        assert_eq!(ledger.allowance(&usdc(), &owner, &spender), 50);
    }

    #[test]
    fn rejecting_recipient_is_per_asset() {
        let mut ledger = InMemoryTokenLedger::new();
        let dai = AssetId::new(Address::from_label("dai"));
        let (owner, to) = (Address::random(), Address::random());
        ledger.mint(&usdc(), &owner, 10).unwrap();
        ledger.mint(&dai, &owner, 10).unwrap();
        ledger.reject_incoming(usdc(), to);

        let err = ledger.transfer(&usdc(), &owner, &to, 1).unwrap_err();
        assert_eq!(err, LedgerError::RecipientRejected { account: to });
        ledger.transfer(&dai, &owner, &to, 1).unwrap();
        assert_eq!(ledger.balance_of(&dai, &to), 1);
    }

    #[test]
    fn assets_are_independent() {
        let mut ledger = InMemoryTokenLedger::new();
        let dai = AssetId::new(Address::from_label("dai"));
        let owner = Address::random();
        ledger.mint(&usdc(), &owner, 5).unwrap();
        ledger.mint(&dai, &owner, 50).unwrap();
        assert_eq!(ledger.total_supply(&usdc()), 5);
        assert_eq!(ledger.total_supply(&dai), 50);
    }
}
