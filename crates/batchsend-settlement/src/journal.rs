//! Staged-commit journal for one batch.
//!
//! Each ledger leg the engine applies is recorded here. On success the
//! journal is committed (dropped). On failure every recorded leg is undone
//! through the ledger's revert primitive, newest first, so the ledger ends
//! exactly where it started.

use batchsend_types::{Address, Amount, BatchSendError, LedgerError, Result, TransferLeg};

/// One value movement applied to a ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Movement {
    pub from: Address,
    pub to: Address,
    pub amount: Amount,
}

impl Movement {
    #[must_use]
    pub const fn new(from: Address, to: Address, amount: Amount) -> Self {
        Self { from, to, amount }
    }
}

/// Ordered record of applied legs.
#[derive(Debug, Default)]
pub struct Journal {
    legs: Vec<(TransferLeg, Movement)>,
}

impl Journal {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            legs: Vec::with_capacity(capacity),
        }
    }

    /// Run `op` for `movement` and record it if the ledger accepted it.
    ///
    /// # Errors
    /// [`BatchSendError::TransferFailed`] tagged with `leg`; nothing is
    /// recorded in that case.
    pub fn apply(
        &mut self,
        leg: TransferLeg,
        movement: Movement,
        op: impl FnOnce(&Movement) -> std::result::Result<(), LedgerError>,
    ) -> Result<()> {
        op(&movement).map_err(|source| BatchSendError::TransferFailed { leg, source })?;
        tracing::debug!(
            leg = %leg,
            from = %movement.from,
            to = %movement.to,
            amount = movement.amount,
            "Leg applied"
        );
        self.legs.push((leg, movement));
        Ok(())
    }

    /// Applied movements, oldest first.
    pub fn movements(&self) -> impl Iterator<Item = &Movement> {
        self.legs.iter().map(|(_, movement)| movement)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.legs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.legs.is_empty()
    }

    /// Keep every applied leg. Returns how many legs were committed.
    pub fn commit(self) -> usize {
        self.legs.len()
    }

    /// Undo every applied leg, newest first.
    ///
    /// A failing undo does not stop the remaining ones; the first failure is
    /// reported as [`BatchSendError::RollbackFailed`].
    ///
    /// # Errors
    /// `RollbackFailed` if the ledger refused any undo.
    pub fn rollback(
        self,
        mut undo: impl FnMut(&Movement) -> std::result::Result<(), LedgerError>,
    ) -> Result<usize> {
        let mut first_failure = None;
        let count = self.legs.len();
        for (leg, movement) in self.legs.into_iter().rev() {
            if let Err(source) = undo(&movement) {
                tracing::error!(
                    leg = %leg,
                    from = %movement.from,
                    to = %movement.to,
                    amount = movement.amount,
                    error = %source,
                    "Rollback of leg failed"
                );
                if first_failure.is_none() {
                    first_failure = Some(BatchSendError::RollbackFailed { leg, source });
                }
            }
        }
        match first_failure {
            Some(err) => Err(err),
            None => Ok(count),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movement(amount: Amount) -> Movement {
        Movement::new(Address::repeat_byte(1), Address::repeat_byte(2), amount)
    }

    #[test]
    fn apply_records_accepted_legs() {
        let mut journal = Journal::new();
        journal
            .apply(TransferLeg::Funding, movement(10), |_| Ok(()))
            .unwrap();
        journal
            .apply(TransferLeg::Recipient(0), movement(4), |_| Ok(()))
            .unwrap();
        assert_eq!(journal.len(), 2);
        let amounts: Vec<Amount> = journal.movements().map(|m| m.amount).collect();
        assert_eq!(amounts, vec![10, 4]);
        assert_eq!(journal.commit(), 2);
    }

    #[test]
    fn apply_failure_is_tagged_and_not_recorded() {
        let mut journal = Journal::new();
        let err = journal
            .apply(TransferLeg::Recipient(7), movement(1), |m| {
                Err(LedgerError::RecipientRejected { account: m.to })
            })
            .unwrap_err();
        assert!(matches!(
            err,
            BatchSendError::TransferFailed {
                leg: TransferLeg::Recipient(7),
                ..
            }
        ));
        assert!(journal.is_empty());
    }

    #[test]
    fn rollback_runs_newest_first() {
        let mut journal = Journal::with_capacity(3);
        for amount in [1, 2, 3] {
            journal
                .apply(TransferLeg::Recipient(0), movement(amount), |_| Ok(()))
                .unwrap();
        }
        let mut undone = Vec::new();
        let count = journal
            .rollback(|m| {
                undone.push(m.amount);
                Ok(())
            })
            .unwrap();
        assert_eq!(count, 3);
        assert_eq!(undone, vec![3, 2, 1]);
    }

    #[test]
    fn rollback_continues_past_failure_and_reports_first() {
        let mut journal = Journal::new();
        journal
            .apply(TransferLeg::Funding, movement(1), |_| Ok(()))
            .unwrap();
        journal
            .apply(TransferLeg::Recipient(0), movement(2), |_| Ok(()))
            .unwrap();
        journal
            .apply(TransferLeg::Refund, movement(3), |_| Ok(()))
            .unwrap();

        let mut undone = Vec::new();
        let err = journal
            .rollback(|m| {
                undone.push(m.amount);
                if m.amount == 2 {
                    Err(LedgerError::NothingToRevert { account: m.to })
                } else {
                    Ok(())
                }
            })
            .unwrap_err();
        assert_eq!(undone, vec![3, 2, 1]);
        assert!(matches!(
            err,
            BatchSendError::RollbackFailed {
                leg: TransferLeg::Recipient(0),
                ..
            }
        ));
    }
}
