//! # batchsend-settlement
//!
//! The **BatchSettlementEngine**: settles many transfers of one value unit
//! as a single all-or-nothing operation.
//!
//! ## Architecture
//!
//! Every batch runs the same pipeline:
//! 1. Validate the request (lengths, emptiness, cap, null recipients, zero amounts)
//! 2. Compute the total with checked arithmetic
//! 3. Check funding (attached value, or allowance and balance)
//! 4. Stage each ledger leg into a [`Journal`], in index order
//! 5. Audit balance deltas against the journal ([`ConservationAudit`])
//! 6. Commit and emit a [`SettlementRecord`](batchsend_types::SettlementRecord),
//!    or undo every staged leg in reverse order
//!
//! ## Paths
//!
//! - **Native**: funded by value attached to the call; surplus is refunded
//! - **Token**: pulled from the caller through a pre-approved allowance
//! - **Recovery**: the owner sweeps value stranded in engine custody

pub mod access;
pub mod conservation;
pub mod engine;
pub mod events;
pub mod journal;
pub mod validation;

pub use access::{AccessControl, Ownable};
pub use conservation::ConservationAudit;
pub use engine::BatchSettlementEngine;
pub use events::EventLog;
pub use journal::{Journal, Movement};
pub use validation::{BatchValidator, batch_total, uniform_total};
