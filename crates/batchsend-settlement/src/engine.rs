//! Batch settlement engine.
//!
//! Settles a batch of (recipient, amount) pairs as one unit:
//! 1. Validate the request
//! 2. Compute the total (checked)
//! 3. Check funding: attached value (native) or allowance + balance (token)
//! 4. Stage every leg into a [`Journal`], in index order
//! 5. Audit balance deltas (when enabled)
//! 6. Commit and emit a record, or roll every staged leg back
//!
//! If any step fails, the ledger ends exactly where it started.

use batchsend_ledger::{NativeLedger, TokenLedger};
use batchsend_types::{
    Address, Amount, AssetId, BatchDigest, BatchSendError, CallContext, EngineConfig, EngineEvent,
    LedgerError, Result, SettledAsset, SettlementRecord, TransferLeg,
};
use chrono::Utc;

use crate::access::{AccessControl, Ownable};
use crate::conservation::ConservationAudit;
use crate::events::EventLog;
use crate::journal::{Journal, Movement};
use crate::validation::{BatchValidator, batch_total, uniform_total};

/// Per-recipient amounts of a batch.
#[derive(Debug, Clone, Copy)]
enum Amounts<'a> {
    /// `amounts[i]` goes to `recipients[i]`; lengths already validated.
    Each(&'a [Amount]),
    /// Every recipient receives the same amount.
    Uniform(Amount),
}

impl Amounts<'_> {
    fn at(self, index: usize) -> Amount {
        match self {
            Self::Each(amounts) => amounts[index],
            Self::Uniform(amount) => amount,
        }
    }
}

/// Atomic batch distribution of native value and token-style assets.
///
/// The engine holds no balances of its own beyond its custody account on the
/// native ledger. Ledgers are passed into each call; `&mut self` keeps one
/// batch in flight at a time.
#[derive(Debug)]
pub struct BatchSettlementEngine<A = Ownable> {
    /// Custody account on the native ledger; spender identity on token ledgers.
    address: Address,
    /// Authorization for privileged calls.
    access: A,
    validator: BatchValidator,
    config: EngineConfig,
    events: EventLog,
    /// Nonce assigned to the next settled batch.
    next_nonce: u64,
}

impl<A: AccessControl> BatchSettlementEngine<A> {
    /// Create an engine with custody account `address`.
    ///
    /// # Errors
    /// Returns `Configuration` if the config is invalid or `address` is zero.
    pub fn new(address: Address, access: A, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        if address.is_zero() {
            return Err(BatchSendError::Configuration(
                "engine address must not be zero".to_string(),
            ));
        }
        tracing::info!(
            engine = %address,
            max_recipients = ?config.max_recipients,
            verify_conservation = config.verify_conservation,
            "Settlement engine ready"
        );
        Ok(Self {
            address,
            access,
            validator: BatchValidator::from_config(&config),
            config,
            events: EventLog::new(),
            next_nonce: 0,
        })
    }

    #[must_use]
    pub fn address(&self) -> Address {
        self.address
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn access(&self) -> &A {
        &self.access
    }

    /// Mutable access to the authorization capability (e.g. to hand over
    /// ownership through its own protocol).
    pub fn access_mut(&mut self) -> &mut A {
        &mut self.access
    }

    /// Event log holding every event not yet drained.
    #[must_use]
    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Take all pending events.
    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        self.events.drain()
    }

    /// Number of batches settled so far.
    #[must_use]
    pub fn batches_settled(&self) -> u64 {
        self.next_nonce
    }

    /// Native value currently held in engine custody.
    #[must_use]
    pub fn stranded_value<L: NativeLedger>(&self, ledger: &L) -> Amount {
        ledger.balance_of(&self.address)
    }

    /// Run request validation alone. Pure: no ledger is touched.
    ///
    /// # Errors
    /// The first failing validation check.
    pub fn validate(&self, recipients: &[Address], amounts: &[Amount]) -> Result<()> {
        self.validator.validate(recipients, amounts)
    }

    // =================================================================
    // Native path
    // =================================================================

    /// Send `amounts[i]` of native value to `recipients[i]`, funded by
    /// `ctx.value`. Surplus value is refunded to `ctx.caller`.
    ///
    /// # Errors
    /// - validation errors (1xx)
    /// - `ArithmeticOverflow` if the total overflows
    /// - `InsufficientValueSent` if `ctx.value` is below the total
    /// - `TransferFailed` / `SupplyInvariantViolation` / `RollbackFailed`
    pub fn batch_send_native<L: NativeLedger>(
        &mut self,
        ledger: &mut L,
        ctx: CallContext,
        recipients: &[Address],
        amounts: &[Amount],
    ) -> Result<SettlementRecord> {
        let total = self
            .validator
            .validate(recipients, amounts)
            .and_then(|()| batch_total(amounts))
            .map_err(|err| rejected(&ctx.caller, &SettledAsset::Native, err))?;
        self.settle_native(ledger, ctx, recipients, Amounts::Each(amounts), total)
    }

    /// Send `amount_each` of native value to every recipient.
    ///
    /// # Errors
    /// As [`Self::batch_send_native`].
    pub fn batch_send_native_uniform<L: NativeLedger>(
        &mut self,
        ledger: &mut L,
        ctx: CallContext,
        recipients: &[Address],
        amount_each: Amount,
    ) -> Result<SettlementRecord> {
        let total = self
            .validator
            .validate_uniform(recipients, amount_each)
            .and_then(|()| uniform_total(amount_each, recipients.len()))
            .map_err(|err| rejected(&ctx.caller, &SettledAsset::Native, err))?;
        self.settle_native(ledger, ctx, recipients, Amounts::Uniform(amount_each), total)
    }

    fn settle_native<L: NativeLedger>(
        &mut self,
        ledger: &mut L,
        ctx: CallContext,
        recipients: &[Address],
        amounts: Amounts<'_>,
        total: Amount,
    ) -> Result<SettlementRecord> {
        self.ensure_nonce_available()
            .map_err(|err| rejected(&ctx.caller, &SettledAsset::Native, err))?;
        let Some(surplus) = ctx.value.checked_sub(total) else {
            return Err(rejected(
                &ctx.caller,
                &SettledAsset::Native,
                BatchSendError::InsufficientValueSent {
                    required: total,
                    supplied: ctx.value,
                },
            ));
        };

        let engine = self.address;
        let audit = self.config.verify_conservation.then(|| {
            ConservationAudit::snapshot(
                [ctx.caller, engine]
                    .into_iter()
                    .chain(recipients.iter().copied()),
                |account| ledger.balance_of(account),
            )
        });

        let mut journal = Journal::with_capacity(recipients.len() + 2);
        let staged = stage_native(engine, ledger, &mut journal, ctx, recipients, amounts, surplus)
            .and_then(|()| run_audit(audit.as_ref(), &journal, |account| ledger.balance_of(account)));

        if let Err(err) = staged {
            return Err(abort(&ctx.caller, &SettledAsset::Native, journal, err, |m| {
                ledger.revert_transfer(&m.from, &m.to, m.amount)
            }));
        }

        journal.commit();
        Ok(self.record(ctx.caller, SettledAsset::Native, recipients, amounts, total, surplus))
    }

    // =================================================================
    // Token path
    // =================================================================

    /// Pull `amounts[i]` of `asset` from `caller` to `recipients[i]` using
    /// the allowance `caller` granted to the engine.
    ///
    /// # Errors
    /// - validation errors (1xx)
    /// - `ArithmeticOverflow` if the total overflows
    /// - `InsufficientAllowance`, then `InsufficientTokenBalance`
    /// - `TransferFailed` / `SupplyInvariantViolation` / `RollbackFailed`
    pub fn batch_send_asset<T: TokenLedger>(
        &mut self,
        ledger: &mut T,
        caller: Address,
        asset: AssetId,
        recipients: &[Address],
        amounts: &[Amount],
    ) -> Result<SettlementRecord> {
        let total = self
            .validator
            .validate(recipients, amounts)
            .and_then(|()| batch_total(amounts))
            .map_err(|err| rejected(&caller, &SettledAsset::Token(asset), err))?;
        self.settle_asset(ledger, caller, asset, recipients, Amounts::Each(amounts), total)
    }

    /// Pull `amount_each` of `asset` from `caller` to every recipient.
    ///
    /// # Errors
    /// As [`Self::batch_send_asset`].
    pub fn batch_send_asset_uniform<T: TokenLedger>(
        &mut self,
        ledger: &mut T,
        caller: Address,
        asset: AssetId,
        recipients: &[Address],
        amount_each: Amount,
    ) -> Result<SettlementRecord> {
        let total = self
            .validator
            .validate_uniform(recipients, amount_each)
            .and_then(|()| uniform_total(amount_each, recipients.len()))
            .map_err(|err| rejected(&caller, &SettledAsset::Token(asset), err))?;
        self.settle_asset(ledger, caller, asset, recipients, Amounts::Uniform(amount_each), total)
    }

    fn settle_asset<T: TokenLedger>(
        &mut self,
        ledger: &mut T,
        caller: Address,
        asset: AssetId,
        recipients: &[Address],
        amounts: Amounts<'_>,
        total: Amount,
    ) -> Result<SettlementRecord> {
        let settled = SettledAsset::Token(asset);
        let spender = self.address;
        self.ensure_nonce_available()
            .map_err(|err| rejected(&caller, &settled, err))?;

        let allowance = ledger.allowance(&asset, &caller, &spender);
        if allowance < total {
            return Err(rejected(
                &caller,
                &settled,
                BatchSendError::InsufficientAllowance {
                    required: total,
                    allowance,
                },
            ));
        }
        let balance = ledger.balance_of(&asset, &caller);
        if balance < total {
            return Err(rejected(
                &caller,
                &settled,
                BatchSendError::InsufficientTokenBalance {
                    required: total,
                    balance,
                },
            ));
        }

        let audit = self.config.verify_conservation.then(|| {
            ConservationAudit::snapshot(
                std::iter::once(caller).chain(recipients.iter().copied()),
                |account| ledger.balance_of(&asset, account),
            )
        });

        let mut journal = Journal::with_capacity(recipients.len());
        let staged = recipients
            .iter()
            .enumerate()
            .try_for_each(|(index, recipient)| {
                journal.apply(
                    TransferLeg::Recipient(index),
                    Movement::new(caller, *recipient, amounts.at(index)),
                    |m| ledger.transfer_from(&asset, &spender, &m.from, &m.to, m.amount),
                )
            })
            .and_then(|()| {
                run_audit(audit.as_ref(), &journal, |account| {
                    ledger.balance_of(&asset, account)
                })
            });

        if let Err(err) = staged {
            return Err(abort(&caller, &settled, journal, err, |m| {
                ledger.revert_transfer_from(&asset, &spender, &m.from, &m.to, m.amount)
            }));
        }

        journal.commit();
        Ok(self.record(caller, settled, recipients, amounts, total, 0))
    }

    // =================================================================
    // Recovery
    // =================================================================

    /// Sweep all native value held in engine custody to the owner.
    ///
    /// A zero custody balance is a successful no-op transfer of zero.
    ///
    /// # Errors
    /// - `Unauthorized` if `caller` is not the owner
    /// - `TransferFailed` if the ledger refuses the sweep
    pub fn recover_stranded_value<L: NativeLedger>(
        &mut self,
        ledger: &mut L,
        caller: Address,
    ) -> Result<Amount> {
        if !self.access.is_owner(&caller) {
            tracing::warn!(caller = %caller, "Unauthorized recovery attempt");
            return Err(BatchSendError::Unauthorized { caller });
        }

        let amount = ledger.balance_of(&self.address);
        ledger
            .transfer(&self.address, &caller, amount)
            .map_err(|source| BatchSendError::TransferFailed {
                leg: TransferLeg::Recovery,
                source,
            })?;

        self.events.emit(EngineEvent::StrandedValueRecovered {
            owner: caller,
            amount,
        });
        tracing::info!(
            owner = %caller,
            amount,
            value = %self.describe(&SettledAsset::Native, amount),
            "Stranded value recovered"
        );
        Ok(amount)
    }

    /// Fail closed once the nonce space is exhausted, before any leg runs.
    fn ensure_nonce_available(&self) -> Result<()> {
        self.next_nonce
            .checked_add(1)
            .map(|_| ())
            .ok_or(BatchSendError::ArithmeticOverflow)
    }

    /// Native value in configured units and symbol; token amounts in base
    /// units.
    fn describe(&self, asset: &SettledAsset, amount: Amount) -> String {
        match asset {
            SettledAsset::Native => self
                .config
                .format_native(amount)
                .unwrap_or_else(|_| amount.to_string()),
            SettledAsset::Token(_) => amount.to_string(),
        }
    }

    /// Assign the next nonce and emit the record for a committed batch.
    fn record(
        &mut self,
        initiator: Address,
        asset: SettledAsset,
        recipients: &[Address],
        amounts: Amounts<'_>,
        total: Amount,
        refunded: Amount,
    ) -> SettlementRecord {
        // Checked by `ensure_nonce_available` before staging.
        let nonce = self.next_nonce;
        self.next_nonce = nonce.saturating_add(1);

        let digest = BatchDigest::compute(
            nonce,
            &initiator,
            &asset,
            recipients
                .iter()
                .enumerate()
                .map(|(index, recipient)| (*recipient, amounts.at(index))),
        );
        let record = SettlementRecord {
            nonce,
            digest,
            initiator,
            asset,
            total_amount: total,
            recipient_count: recipients.len(),
            refunded,
            settled_at: Utc::now(),
        };
        self.events.emit(record.to_event());

        tracing::info!(
            nonce,
            digest = %digest,
            initiator = %initiator,
            asset = %asset,
            total,
            value = %self.describe(&asset, total),
            recipients = recipients.len(),
            refunded,
            "Batch settled"
        );
        record
    }
}

/// Funding, recipient, and refund legs of a native batch, in that order.
fn stage_native<L: NativeLedger>(
    engine: Address,
    ledger: &mut L,
    journal: &mut Journal,
    ctx: CallContext,
    recipients: &[Address],
    amounts: Amounts<'_>,
    surplus: Amount,
) -> Result<()> {
    journal.apply(
        TransferLeg::Funding,
        Movement::new(ctx.caller, engine, ctx.value),
        |m| ledger.transfer(&m.from, &m.to, m.amount),
    )?;
    for (index, recipient) in recipients.iter().enumerate() {
        journal.apply(
            TransferLeg::Recipient(index),
            Movement::new(engine, *recipient, amounts.at(index)),
            |m| ledger.transfer(&m.from, &m.to, m.amount),
        )?;
    }
    if surplus > 0 {
        journal.apply(
            TransferLeg::Refund,
            Movement::new(engine, ctx.caller, surplus),
            |m| ledger.transfer(&m.from, &m.to, m.amount),
        )?;
    }
    Ok(())
}

fn run_audit(
    audit: Option<&ConservationAudit>,
    journal: &Journal,
    balance_of: impl Fn(&Address) -> Amount,
) -> Result<()> {
    audit.map_or(Ok(()), |audit| audit.verify(journal, balance_of))
}

/// Log a batch rejected before any leg was staged.
fn rejected(caller: &Address, asset: &SettledAsset, err: BatchSendError) -> BatchSendError {
    tracing::warn!(caller = %caller, asset = %asset, error = %err, "Batch rejected");
    err
}

/// Roll back every staged leg and pick the error to surface. A failed
/// rollback outranks the original failure.
fn abort(
    caller: &Address,
    asset: &SettledAsset,
    journal: Journal,
    err: BatchSendError,
    undo: impl FnMut(&Movement) -> std::result::Result<(), LedgerError>,
) -> BatchSendError {
    let staged = journal.len();
    match journal.rollback(undo) {
        Ok(undone) => {
            tracing::warn!(
                caller = %caller,
                asset = %asset,
                undone,
                error = %err,
                "Batch aborted, staged legs rolled back"
            );
            err
        }
        Err(rollback_err) => {
            tracing::error!(
                caller = %caller,
                asset = %asset,
                staged,
                error = %err,
                rollback_error = %rollback_err,
                "Batch aborted, rollback incomplete"
            );
            rollback_err
        }
    }
}
