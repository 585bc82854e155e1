//! Engine configuration.

use serde::{Deserialize, Serialize};

use crate::{Amount, BatchSendError, Result, UnitsError, constants, format_units, parse_units};

/// Tunables for a settlement engine instance.
///
/// Every field has a default, so a partial JSON document is enough:
/// `{"max_recipients": 200}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Maximum number of recipients accepted in one batch. `None` (the
    /// default) accepts batches of any size.
    pub max_recipients: Option<usize>,
    /// Audit ledger balance deltas against the staged legs before commit.
    pub verify_conservation: bool,
    /// Display symbol of the native value unit.
    pub native_symbol: String,
    /// Decimal places of the native value unit.
    pub native_decimals: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_recipients: None,
            verify_conservation: true,
            native_symbol: constants::DEFAULT_NATIVE_SYMBOL.to_string(),
            native_decimals: constants::NATIVE_DECIMALS,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON configuration document.
    ///
    /// # Errors
    /// Returns [`BatchSendError::Configuration`] for malformed JSON, unknown
    /// fields, or out-of-range values.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check field ranges.
    ///
    /// # Errors
    /// Returns [`BatchSendError::Configuration`] naming the offending field.
    pub fn validate(&self) -> Result<()> {
        if self.max_recipients == Some(0) {
            return Err(BatchSendError::Configuration(
                "max_recipients must be > 0".to_string(),
            ));
        }
        if self.native_decimals > constants::MAX_DECIMALS {
            return Err(BatchSendError::Configuration(format!(
                "native_decimals must be <= {}",
                constants::MAX_DECIMALS
            )));
        }
        if self.native_symbol.trim().is_empty() {
            return Err(BatchSendError::Configuration(
                "native_symbol must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Parse a human amount of the native unit (`"1.5"`) into base units
    /// using [`Self::native_decimals`].
    ///
    /// [`Self::native_decimals`]: EngineConfig::native_decimals
    ///
    /// # Errors
    /// See [`parse_units`].
    pub fn parse_native(&self, text: &str) -> std::result::Result<Amount, UnitsError> {
        parse_units(text, self.native_decimals)
    }

    /// Render native base units with the configured symbol, e.g. `"1.5 ETH"`.
    ///
    /// # Errors
    /// See [`format_units`].
    pub fn format_native(&self, amount: Amount) -> std::result::Result<String, UnitsError> {
        format_units(amount, self.native_decimals)
            .map(|value| format!("{value} {}", self.native_symbol))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.max_recipients, None);
        assert!(cfg.verify_conservation);
        assert_eq!(cfg.native_symbol, "ETH");
        assert_eq!(cfg.native_decimals, 18);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg = EngineConfig::from_json(r#"{"max_recipients": 200}"#).unwrap();
        assert_eq!(cfg.max_recipients, Some(200));
        assert!(cfg.verify_conservation);
        assert_eq!(cfg.native_symbol, "ETH");
    }

    #[test]
    fn null_cap_means_unbounded() {
        let cfg = EngineConfig::from_json(r#"{"max_recipients": null}"#).unwrap();
        assert_eq!(cfg.max_recipients, None);
    }

    #[test]
    fn native_units_follow_config() {
        let cfg = EngineConfig {
            native_symbol: "SOL".to_string(),
            native_decimals: 9,
            ..EngineConfig::default()
        };
        assert_eq!(cfg.parse_native("1.5").unwrap(), 1_500_000_000);
        assert_eq!(cfg.format_native(2_250_000_000).unwrap(), "2.25 SOL");
        assert!(cfg.parse_native("0.0000000001").is_err());

        let eth = EngineConfig::default();
        assert_eq!(eth.parse_native("1").unwrap(), 1_000_000_000_000_000_000);
        assert_eq!(eth.format_native(500_000_000_000_000_000).unwrap(), "0.5 ETH");
    }

    #[test]
    fn rejects_zero_cap() {
        let err = EngineConfig::from_json(r#"{"max_recipients": 0}"#).unwrap_err();
        assert!(matches!(err, BatchSendError::Configuration(ref m) if m.contains("max_recipients")));
    }

    #[test]
    fn rejects_unknown_fields_and_bad_json() {
        let err = EngineConfig::from_json(r#"{"max_recipents": 10}"#).unwrap_err();
        assert!(matches!(err, BatchSendError::Configuration(_)));
        let err = EngineConfig::from_json("not json").unwrap_err();
        assert!(matches!(err, BatchSendError::Configuration(_)));
    }

    #[test]
    fn rejects_excess_decimals() {
        let cfg = EngineConfig {
            native_decimals: 39,
            ..EngineConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn serde_roundtrip() {
        let cfg = EngineConfig {
            max_recipients: Some(42),
            verify_conservation: false,
            native_symbol: "MATIC".to_string(),
            native_decimals: 18,
        };
        let json = serde_json::to_string(&cfg).unwrap();
        assert_eq!(EngineConfig::from_json(&json).unwrap(), cfg);
    }
}
