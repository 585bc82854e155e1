//! Batch request validation. Runs before any ledger call.
//!
//! Checks run in a fixed order and the first failure wins:
//! 1. recipient and amount counts match
//! 2. the batch is non-empty
//! 3. the batch is within the recipient cap, when one is configured
//! 4. no recipient is the zero address
//! 5. no amount is zero
//!
//! Validation is pure: it reads its inputs and nothing else.

use batchsend_types::{Address, Amount, BatchSendError, EngineConfig, Result};

/// Stateless validator for batch requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchValidator {
    /// `None` accepts batches of any size.
    max_recipients: Option<usize>,
}

impl BatchValidator {
    #[must_use]
    pub fn new(max_recipients: Option<usize>) -> Self {
        Self { max_recipients }
    }

    #[must_use]
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.max_recipients)
    }

    #[must_use]
    pub fn max_recipients(&self) -> Option<usize> {
        self.max_recipients
    }

    /// Validate a positional (recipient, amount) batch.
    ///
    /// # Errors
    /// The first failing check, see the module docs.
    pub fn validate(&self, recipients: &[Address], amounts: &[Amount]) -> Result<()> {
        if recipients.len() != amounts.len() {
            return Err(BatchSendError::ArraysLengthMismatch {
                recipients: recipients.len(),
                amounts: amounts.len(),
            });
        }
        self.check_recipients(recipients)?;
        if amounts.contains(&0) {
            return Err(BatchSendError::AmountMustBeGreaterThanZero);
        }
        Ok(())
    }

    /// Validate a batch where every recipient receives `amount_each`.
    ///
    /// # Errors
    /// The first failing check, see the module docs.
    pub fn validate_uniform(&self, recipients: &[Address], amount_each: Amount) -> Result<()> {
        self.check_recipients(recipients)?;
        if amount_each == 0 {
            return Err(BatchSendError::AmountMustBeGreaterThanZero);
        }
        Ok(())
    }

    fn check_recipients(&self, recipients: &[Address]) -> Result<()> {
        if recipients.is_empty() {
            return Err(BatchSendError::EmptyArrays);
        }
        if let Some(max) = self.max_recipients.filter(|max| recipients.len() > *max) {
            return Err(BatchSendError::TooManyRecipients {
                count: recipients.len(),
                max,
            });
        }
        if recipients.iter().any(Address::is_zero) {
            return Err(BatchSendError::InvalidRecipientAddress);
        }
        Ok(())
    }
}

impl Default for BatchValidator {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

/// Sum of `amounts`, failing closed on overflow.
///
/// # Errors
/// [`BatchSendError::ArithmeticOverflow`].
pub fn batch_total(amounts: &[Amount]) -> Result<Amount> {
    amounts
        .iter()
        .try_fold(0u128, |acc, amount| acc.checked_add(*amount))
        .ok_or(BatchSendError::ArithmeticOverflow)
}

/// `amount_each * count`, failing closed on overflow.
///
/// # Errors
/// [`BatchSendError::ArithmeticOverflow`].
pub fn uniform_total(amount_each: Amount, count: usize) -> Result<Amount> {
    Amount::try_from(count)
        .ok()
        .and_then(|count| amount_each.checked_mul(count))
        .ok_or(BatchSendError::ArithmeticOverflow)
}
