use anyhow::Result;
use drip_common::utils::config::load_config;
use drip_common::utils::logging::LoggingConfig;
use drip_faucet::FaucetConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DripConfig {
    #[serde(default)]
    pub faucet: FaucetConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// File (if given), then `DRIP_*` environment, then command-line overrides
pub fn load_drip_config(path: Option<&Path>, db_override: Option<PathBuf>, debug: bool) -> Result<DripConfig> {
    let mut config: DripConfig = match path {
        Some(path) => load_config(path)?,
        None => DripConfig::default(),
    };

    config.faucet = config.faucet.with_env_overrides();

    if let Some(db) = db_override {
        config.faucet.db_path = db.to_string_lossy().to_string();
    }

    if debug {
        config.logging.level = "debug".to_string();
    }

    config.faucet.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_file_sections_and_overrides() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[faucet]\ntoken_symbol = \"TST\"\ncooldown_secs = 60\n\n[logging]\nformat = \"json\""
        )
        .unwrap();

        let config = load_drip_config(Some(file.path()), Some(PathBuf::from("/tmp/drip-db")), true).unwrap();

        assert_eq!(config.faucet.token_symbol, "TST");
        assert_eq!(config.faucet.cooldown_secs, 60);
        assert_eq!(config.faucet.faucet_amount_tokens, 10);
        assert_eq!(config.faucet.db_path, "/tmp/drip-db");
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_invalid_faucet_section_rejected() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[faucet]\nfaucet_amount_tokens = 0").unwrap();

        assert!(load_drip_config(Some(file.path()), None, false).is_err());
    }
}
