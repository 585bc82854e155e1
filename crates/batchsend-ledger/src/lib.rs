//! # batchsend-ledger
//!
//! The **Ledger** collaborator that the settlement engine drives.
//!
//! ## Architecture
//!
//! The engine never owns balances. It talks to a ledger through one of two
//! traits:
//! 1. [`NativeLedger`]: custody of the chain-native value unit
//! 2. [`TokenLedger`]: token-style balances with owner → spender allowances
//!
//! Both traits expose a `revert_*` primitive next to each mutating call so
//! the engine can undo a partially applied batch in reverse order.
//!
//! [`InMemoryNativeLedger`] and [`InMemoryTokenLedger`] are complete
//! reference implementations backed by a [`BalanceBook`]; they can be told
//! to refuse incoming value for an account, which models a recipient that
//! cannot accept a transfer.

pub mod book;
pub mod native;
pub mod token;

pub use book::{AccountKey, BalanceBook};
pub use native::{InMemoryNativeLedger, NativeLedger};
pub use token::{InMemoryTokenLedger, TokenLedger};
