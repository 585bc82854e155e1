//! Error types for the BatchSend settlement engine.
//!
//! All errors use the `BS_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Batch validation errors
//! - 2xx: Funding errors (supplied value, allowance, balance, arithmetic)
//! - 3xx: Execution errors (ledger legs, rollback, conservation)
//! - 8xx: Authorization errors
//! - 9xx: General / configuration errors
//!
//! Every error is a rejection: when an engine operation returns one, no
//! value has moved.

use std::fmt;

use thiserror::Error;

use crate::{Address, Amount};

/// Which ledger mutation of an operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferLeg {
    /// Attached native value moving from the caller into engine custody.
    Funding,
    /// The transfer to `recipients[i]`.
    Recipient(usize),
    /// Surplus native value returning to the caller.
    Refund,
    /// Stranded custody moving to the owner.
    Recovery,
}

impl fmt::Display for TransferLeg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Funding => write!(f, "funding"),
            Self::Recipient(index) => write!(f, "recipient[{index}]"),
            Self::Refund => write!(f, "refund"),
            Self::Recovery => write!(f, "recovery"),
        }
    }
}

/// Failures reported by a ledger collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// The debited account holds less than the transfer amount.
    #[error("insufficient balance in {account}: need {needed}, have {available}")]
    InsufficientBalance {
        account: Address,
        needed: Amount,
        available: Amount,
    },

    /// The spender's allowance is below the transfer amount.
    #[error("insufficient allowance: need {needed}, have {available}")]
    InsufficientAllowance { needed: Amount, available: Amount },

    /// The receiving account refuses incoming value.
    #[error("recipient {account} rejected the transfer")]
    RecipientRejected { account: Address },

    /// Crediting the account would overflow its balance.
    #[error("balance overflow for {account}")]
    BalanceOverflow { account: Address },

    /// A revert was requested for a transfer the ledger cannot undo.
    #[error("nothing to revert for {account}")]
    NothingToRevert { account: Address },
}

/// Central error enum for all BatchSend operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BatchSendError {
    // =================================================================
    // Validation Errors (1xx)
    // =================================================================
    /// Recipient and amount sequences have different lengths.
    #[error("BS_ERR_100: Arrays length mismatch: {recipients} recipients, {amounts} amounts")]
    ArraysLengthMismatch { recipients: usize, amounts: usize },

    /// The batch has zero entries.
    #[error("BS_ERR_101: Empty arrays")]
    EmptyArrays,

    /// The batch exceeds the recipient cap. Only raised when a cap is
    /// configured; engines are uncapped by default.
    #[error("BS_ERR_102: Too many recipients: {count} exceeds maximum {max}")]
    TooManyRecipients { count: usize, max: usize },

    /// A recipient is the null (zero) address.
    #[error("BS_ERR_103: Invalid recipient address")]
    InvalidRecipientAddress,

    /// An amount is zero.
    #[error("BS_ERR_104: Amount must be greater than zero")]
    AmountMustBeGreaterThanZero,

    // =================================================================
    // Funding Errors (2xx)
    // =================================================================
    /// Native value attached to the call is below the batch total.
    #[error("BS_ERR_200: Insufficient value sent: need {required}, supplied {supplied}")]
    InsufficientValueSent { required: Amount, supplied: Amount },

    /// The caller's allowance to the engine is below the batch total.
    #[error("BS_ERR_201: Insufficient allowance: need {required}, allowance {allowance}")]
    InsufficientAllowance { required: Amount, allowance: Amount },

    /// The caller's token balance is below the batch total.
    #[error("BS_ERR_202: Insufficient token balance: need {required}, balance {balance}")]
    InsufficientTokenBalance { required: Amount, balance: Amount },

    /// Computing the batch total overflowed the amount type.
    #[error("BS_ERR_203: Arithmetic overflow")]
    ArithmeticOverflow,

    // =================================================================
    // Execution Errors (3xx)
    // =================================================================
    /// The ledger rejected one leg of the operation.
    #[error("BS_ERR_300: Transfer failed at {leg}: {source}")]
    TransferFailed {
        leg: TransferLeg,
        #[source]
        source: LedgerError,
    },

    /// The ledger refused to undo an applied leg. Critical: the ledger
    /// collaborator is inconsistent.
    #[error("BS_ERR_301: Rollback failed at {leg}: {source}")]
    RollbackFailed {
        leg: TransferLeg,
        #[source]
        source: LedgerError,
    },

    /// Balance deltas observed on the ledger disagree with the staged legs.
    #[error("BS_ERR_302: Supply invariant violation at {account}")]
    SupplyInvariantViolation { account: Address },

    // =================================================================
    // Authorization Errors (8xx)
    // =================================================================
    /// The caller is not the owner.
    #[error("BS_ERR_800: Unauthorized: {caller} is not the owner")]
    Unauthorized { caller: Address },

    /// Ownership cannot be handed to the null address.
    #[error("BS_ERR_801: Invalid owner address")]
    InvalidOwner,

    // =================================================================
    // General (9xx)
    // =================================================================
    /// Configuration error (invalid config file, out-of-range fields).
    #[error("BS_ERR_900: Configuration error: {0}")]
    Configuration(String),
}

impl BatchSendError {
    /// Whether this error came from request validation (1xx) rather than
    /// funding, execution, or authorization.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::ArraysLengthMismatch { .. }
                | Self::EmptyArrays
                | Self::TooManyRecipients { .. }
                | Self::InvalidRecipientAddress
                | Self::AmountMustBeGreaterThanZero
        )
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, BatchSendError>;

impl From<serde_json::Error> for BatchSendError {
    fn from(err: serde_json::Error) -> Self {
        Self::Configuration(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_contains_prefix() {
        let err = BatchSendError::EmptyArrays;
        let msg = format!("{err}");
        assert!(msg.starts_with("BS_ERR_101"), "Got: {msg}");
    }

    #[test]
    fn insufficient_value_display() {
        let err = BatchSendError::InsufficientValueSent {
            required: 200,
            supplied: 100,
        };
        let msg = format!("{err}");
        assert!(msg.contains("BS_ERR_200"));
        assert!(msg.contains("200"));
        assert!(msg.contains("100"));
    }

    #[test]
    fn transfer_failed_names_leg_and_source() {
        let err = BatchSendError::TransferFailed {
            leg: TransferLeg::Recipient(3),
            source: LedgerError::RecipientRejected {
                account: Address::repeat_byte(7),
            },
        };
        let msg = format!("{err}");
        assert!(msg.contains("BS_ERR_300"));
        assert!(msg.contains("recipient[3]"));
        assert!(msg.contains("rejected"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn validation_classification() {
        assert!(BatchSendError::EmptyArrays.is_validation());
        assert!(BatchSendError::InvalidRecipientAddress.is_validation());
        assert!(!BatchSendError::ArithmeticOverflow.is_validation());
        assert!(
            !BatchSendError::Unauthorized {
                caller: Address::ZERO
            }
            .is_validation()
        );
    }

    #[test]
    fn all_errors_have_bs_err_prefix() {
        let errors: Vec<Box<dyn std::error::Error>> = vec![
            Box::new(BatchSendError::ArraysLengthMismatch {
                recipients: 2,
                amounts: 1,
            }),
            Box::new(BatchSendError::AmountMustBeGreaterThanZero),
            Box::new(BatchSendError::ArithmeticOverflow),
            Box::new(BatchSendError::SupplyInvariantViolation {
                account: Address::ZERO,
            }),
            Box::new(BatchSendError::InvalidOwner),
            Box::new(BatchSendError::Configuration("test".into())),
        ];
        for err in errors {
            let msg = format!("{err}");
            assert!(
                msg.starts_with("BS_ERR_"),
                "Error missing BS_ERR_ prefix: {msg}"
            );
        }
    }
}
