//! Invocation context for engine calls.

use serde::{Deserialize, Serialize};

use crate::{Address, Amount};

/// Who is calling, and how much native value rides along with the call.
///
/// Native batches are funded from `value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallContext {
    pub caller: Address,
    pub value: Amount,
}

impl CallContext {
    #[must_use]
    pub const fn new(caller: Address, value: Amount) -> Self {
        Self { caller, value }
    }
}
