//! System-wide constants for the BatchSend engine.

/// Decimal places of the native value unit (wei per ether).
pub const NATIVE_DECIMALS: u32 = 18;

/// Default symbol of the native value unit.
pub const DEFAULT_NATIVE_SYMBOL: &str = "ETH";

/// Largest decimal count whose scale factor still fits in a `u128`.
pub const MAX_DECIMALS: u32 = 38;

/// Domain separator mixed into every [`crate::BatchDigest`].
pub const BATCH_DIGEST_DOMAIN: &[u8] = b"batchsend:batch:v1:";
