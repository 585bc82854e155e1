//! # batchsend-types
//!
//! Shared types, errors, and configuration for the **BatchSend** settlement
//! engine.
//!
//! This crate is the leaf dependency of the workspace; every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`Address`], [`AssetId`]
//! - **Amounts**: [`Amount`] and decimal unit conversion ([`parse_units`], [`format_units`])
//! - **Call context**: [`CallContext`]
//! - **Settlement output**: [`SettlementRecord`], [`SettledAsset`], [`EngineEvent`], [`BatchDigest`]
//! - **Configuration**: [`EngineConfig`]
//! - **Errors**: [`BatchSendError`] with `BS_ERR_` prefix codes, [`LedgerError`]
//! - **Constants**: system-wide limits and defaults

pub mod address;
pub mod config;
pub mod constants;
pub mod context;
pub mod error;
pub mod record;
pub mod units;

// Re-export all primary types at crate root for ergonomic imports:
//   use batchsend_types::{Address, Amount, BatchSendError, ...};

pub use address::*;
pub use config::*;
pub use context::*;
pub use error::*;
pub use record::*;
pub use units::*;

// Constants are accessed via `batchsend_types::constants::FOO`
// (not re-exported to avoid name collisions).
