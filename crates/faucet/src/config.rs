//! Faucet configuration

use crate::error::{FaucetError, FaucetResult};
use drip_common::types::to_base_units;
use drip_common::Amount;
use serde::{Deserialize, Serialize};

/// Token and dispenser parameters. Amounts are in whole tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FaucetConfig {
    /// Token name
    pub token_name: String,

    /// Token symbol
    pub token_symbol: String,

    /// Hard cap on total issued supply
    pub max_supply_tokens: u64,

    /// Amount minted per successful claim
    pub faucet_amount_tokens: u64,

    /// Minimum time between two claims by the same account (seconds)
    pub cooldown_secs: u64,

    /// Lifetime cap per account
    pub max_claim_tokens: u64,

    /// Database path
    pub db_path: String,

    /// Enable metrics
    pub metrics_enabled: bool,
}

impl Default for FaucetConfig {
    fn default() -> Self {
        Self {
            token_name: "Drip Token".to_string(),
            token_symbol: "DRIP".to_string(),
            max_supply_tokens: 1_000_000,
            faucet_amount_tokens: 10,
            cooldown_secs: 86_400, // 24 hours
            max_claim_tokens: 100,
            db_path: "./drip_data".to_string(),
            metrics_enabled: true,
        }
    }
}

impl FaucetConfig {
    /// Apply `DRIP_*` environment overrides on top of `self`
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(name) = std::env::var("DRIP_TOKEN_NAME") {
            self.token_name = name;
        }

        if let Ok(symbol) = std::env::var("DRIP_TOKEN_SYMBOL") {
            self.token_symbol = symbol;
        }

        if let Ok(max_supply) = std::env::var("DRIP_MAX_SUPPLY") {
            self.max_supply_tokens = max_supply.parse().unwrap_or(self.max_supply_tokens);
        }

        if let Ok(amount) = std::env::var("DRIP_FAUCET_AMOUNT") {
            self.faucet_amount_tokens = amount.parse().unwrap_or(self.faucet_amount_tokens);
        }

        if let Ok(cooldown) = std::env::var("DRIP_COOLDOWN_SECS") {
            self.cooldown_secs = cooldown.parse().unwrap_or(self.cooldown_secs);
        }

        if let Ok(max_claim) = std::env::var("DRIP_MAX_CLAIM_AMOUNT") {
            self.max_claim_tokens = max_claim.parse().unwrap_or(self.max_claim_tokens);
        }

        if let Ok(db_path) = std::env::var("DRIP_DB_PATH") {
            self.db_path = db_path;
        }

        if let Ok(enabled) = std::env::var("DRIP_METRICS_ENABLED") {
            self.metrics_enabled = enabled.to_lowercase() == "true";
        }

        self
    }

    /// Reject parameter sets under which the faucet could never dispense
    pub fn validate(&self) -> FaucetResult<()> {
        if self.faucet_amount_tokens == 0 {
            return Err(FaucetError::Config("faucet amount must be non-zero".to_string()));
        }
        if self.max_claim_tokens < self.faucet_amount_tokens {
            return Err(FaucetError::Config(format!(
                "lifetime cap {} is below the per-claim amount {}",
                self.max_claim_tokens, self.faucet_amount_tokens
            )));
        }
        if self.max_supply_tokens == 0 {
            return Err(FaucetError::Config("max supply must be non-zero".to_string()));
        }
        if self.token_symbol.is_empty() {
            return Err(FaucetError::Config("token symbol must not be empty".to_string()));
        }
        Ok(())
    }

    /// Per-claim amount in base units
    pub fn faucet_amount(&self) -> Amount {
        base_units(self.faucet_amount_tokens)
    }

    /// Lifetime cap in base units
    pub fn max_claim_amount(&self) -> Amount {
        base_units(self.max_claim_tokens)
    }

    /// Supply cap in base units
    pub fn max_supply(&self) -> Amount {
        base_units(self.max_supply_tokens)
    }
}

// u64 whole tokens always fit in u128 base units
fn base_units(whole: u64) -> Amount {
    to_base_units(whole).unwrap_or(Amount::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use drip_common::types::UNIT;

    #[test]
    fn test_defaults() {
        let config = FaucetConfig::default();
        assert_eq!(config.faucet_amount(), 10 * UNIT);
        assert_eq!(config.max_claim_amount(), 100 * UNIT);
        assert_eq!(config.max_supply(), 1_000_000 * UNIT);
        assert_eq!(config.cooldown_secs, 86_400);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_unusable_parameters() {
        let zero = FaucetConfig { faucet_amount_tokens: 0, ..Default::default() };
        assert!(matches!(zero.validate(), Err(FaucetError::Config(_))));

        let cap_below_claim = FaucetConfig { max_claim_tokens: 5, ..Default::default() };
        assert!(cap_below_claim.validate().is_err());

        let no_supply = FaucetConfig { max_supply_tokens: 0, ..Default::default() };
        assert!(no_supply.validate().is_err());

        // Supply may run out before every account reaches its cap
        let small_supply = FaucetConfig { max_supply_tokens: 15, ..Default::default() };
        assert!(small_supply.validate().is_ok());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: FaucetConfig = serde_json::from_str(r#"{"cooldown_secs": 60}"#).unwrap();
        assert_eq!(config.cooldown_secs, 60);
        assert_eq!(config.faucet_amount_tokens, 10);
    }
}
