//! Settlement records and emitted events.
//!
//! A [`SettlementRecord`] is produced exactly once per successful batch and
//! never mutated afterwards. The engine does not persist it; observers read
//! the corresponding [`EngineEvent`] from the engine's event log.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{Address, Amount, AssetId, constants};

/// What a batch moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettledAsset {
    /// The native value unit, funded by value attached to the call.
    Native,
    /// A token-style asset, pulled through an allowance.
    Token(AssetId),
}

impl fmt::Display for SettledAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native => write!(f, "native"),
            Self::Token(asset) => write!(f, "{asset}"),
        }
    }
}

/// SHA-256 digest identifying one batch request.
///
/// Covers the batch nonce, the initiator, the settled asset and every
/// (recipient, amount) pair in order, so two records with the same digest
/// describe the same request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BatchDigest(pub [u8; 32]);

impl BatchDigest {
    #[must_use]
    pub fn compute(
        nonce: u64,
        initiator: &Address,
        asset: &SettledAsset,
        legs: impl IntoIterator<Item = (Address, Amount)>,
    ) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(constants::BATCH_DIGEST_DOMAIN);
        hasher.update(nonce.to_le_bytes());
        hasher.update(initiator.as_bytes());
        match asset {
            SettledAsset::Native => hasher.update([0u8]),
            SettledAsset::Token(id) => {
                hasher.update([1u8]);
                hasher.update(id.address().as_bytes());
            }
        }
        for (recipient, amount) in legs {
            hasher.update(recipient.as_bytes());
            hasher.update(amount.to_le_bytes());
        }
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&hasher.finalize());
        Self(bytes)
    }

    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for BatchDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0[..8]))
    }
}

/// The aggregate effect of one successful batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementRecord {
    /// Per-engine sequence number of the batch (starts at 0).
    pub nonce: u64,
    /// Digest of the settled request.
    pub digest: BatchDigest,
    /// The caller that funded the batch.
    pub initiator: Address,
    /// What was moved.
    pub asset: SettledAsset,
    /// Sum of all recipient amounts.
    pub total_amount: Amount,
    /// Number of recipient legs (duplicates counted individually).
    pub recipient_count: usize,
    /// Surplus native value returned to the initiator. Always zero for tokens.
    pub refunded: Amount,
    /// When the batch committed.
    pub settled_at: DateTime<Utc>,
}

impl SettlementRecord {
    /// The observable event for this record.
    #[must_use]
    pub fn to_event(&self) -> EngineEvent {
        match self.asset {
            SettledAsset::Native => EngineEvent::BatchEthSent {
                initiator: self.initiator,
                total_amount: self.total_amount,
                recipient_count: self.recipient_count,
            },
            SettledAsset::Token(asset) => EngineEvent::BatchTokenSent {
                initiator: self.initiator,
                asset,
                total_amount: self.total_amount,
                recipient_count: self.recipient_count,
            },
        }
    }
}

/// Log records emitted by the engine for external observers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineEvent {
    /// A native batch settled.
    BatchEthSent {
        initiator: Address,
        total_amount: Amount,
        recipient_count: usize,
    },
    /// A token batch settled.
    BatchTokenSent {
        initiator: Address,
        asset: AssetId,
        total_amount: Amount,
        recipient_count: usize,
    },
    /// The owner swept the engine's stranded native custody.
    StrandedValueRecovered { owner: Address, amount: Amount },
}

impl EngineEvent {
    /// Stable event name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::BatchEthSent { .. } => "BatchEthSent",
            Self::BatchTokenSent { .. } => "BatchTokenSent",
            Self::StrandedValueRecovered { .. } => "StrandedValueRecovered",
        }
    }
}

impl fmt::Display for EngineEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BatchEthSent {
                initiator,
                total_amount,
                recipient_count,
            } => write!(f, "BatchEthSent({initiator}, {total_amount}, {recipient_count})"),
            Self::BatchTokenSent {
                initiator,
                asset,
                total_amount,
                recipient_count,
            } => write!(
                f,
                "BatchTokenSent({initiator}, {asset}, {total_amount}, {recipient_count})"
            ),
            Self::StrandedValueRecovered { owner, amount } => {
                write!(f, "StrandedValueRecovered({owner}, {amount})")
            }
        }
    }
}
