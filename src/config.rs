//! Runtime configuration.
//!
//! Loaded from an optional JSON file; every section falls back to its
//! defaults. Key material for card numbers has no usable default and must
//! come from the file or from the environment:
//! ```json
//! {
//!   "logging": { "level": "info", "json": false },
//!   "encryption": { "passphrase": "...", "salt": "...", "time_cost": 3 },
//!   "cards": { "opening_balance": { "random": { "min": "0.00", "max": "50000.00" } } },
//!   "page_size": 20
//! }
//! ```

use crate::application::balance::OpeningBalance;
use crate::domain::page::DEFAULT_PAGE_SIZE;
use crate::error::{BankError, Result};
use crate::infrastructure::encryption::{CardCipher, KdfParams};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

pub const ENV_PASSPHRASE: &str = "BANKCARDS_CARD_PASSPHRASE";
pub const ENV_SALT: &str = "BANKCARDS_CARD_SALT";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub encryption: EncryptionConfig,
    pub cards: CardsConfig,
    pub page_size: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            encryption: EncryptionConfig::default(),
            cards: CardsConfig::default(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence.
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EncryptionConfig {
    pub passphrase: String,
    pub salt: String,
    #[serde(flatten)]
    pub kdf: KdfParams,
}

impl fmt::Debug for EncryptionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptionConfig")
            .field("passphrase", &"<redacted>")
            .field("salt", &"<redacted>")
            .field("kdf", &self.kdf)
            .finish()
    }
}

impl EncryptionConfig {
    /// Derives the card number cipher. Slow; call once at startup.
    pub fn build_cipher(&self) -> Result<CardCipher> {
        CardCipher::derive(&self.passphrase, &self.salt, self.kdf)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CardsConfig {
    pub opening_balance: OpeningBalance,
}

impl AppConfig {
    /// Reads the config file (if any), applies environment overrides and validates.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            BankError::Config(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| BankError::Config(e.to_string()))
    }

    /// Replaces key material with values found through `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(passphrase) = lookup(ENV_PASSPHRASE).filter(|v| !v.is_empty()) {
            self.encryption.passphrase = passphrase;
        }
        if let Some(salt) = lookup(ENV_SALT).filter(|v| !v.is_empty()) {
            self.encryption.salt = salt;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.encryption.passphrase.is_empty() {
            return Err(BankError::Config(format!(
                "Card number passphrase is missing; set encryption.passphrase or {}",
                ENV_PASSPHRASE
            )));
        }
        if self.encryption.salt.is_empty() {
            return Err(BankError::Config(format!(
                "Card number salt is missing; set encryption.salt or {}",
                ENV_SALT
            )));
        }
        if self.page_size == 0 {
            return Err(BankError::Config("page_size must be positive".to_string()));
        }
        self.cards.opening_balance.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::money::Balance;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_json("{}").unwrap();
        assert_eq!(config.page_size, 20);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.encryption.kdf, KdfParams::default());
        assert_eq!(config.cards.opening_balance, OpeningBalance::default());
        assert!(matches!(config.validate(), Err(BankError::Config(_))));
    }

    #[test]
    fn test_full_document() {
        let config = AppConfig::from_json(
            r#"{
                "logging": { "level": "debug", "json": true },
                "encryption": { "passphrase": "p", "salt": "salty-salt", "time_cost": 1, "memory_cost": 64, "parallelism": 1 },
                "cards": { "opening_balance": { "fixed": "1000.00" } },
                "page_size": 5
            }"#,
        )
        .unwrap();
        config.validate().unwrap();
        assert!(config.logging.json);
        assert_eq!(config.encryption.kdf.memory_cost, 64);
        assert_eq!(
            config.cards.opening_balance,
            OpeningBalance::Fixed(Balance::new(dec!(1000)).unwrap())
        );
    }

    #[test]
    fn test_env_overrides_key_material() {
        let env: HashMap<&str, &str> = [(ENV_PASSPHRASE, "from-env"), (ENV_SALT, "salt-from-env")].into();
        let mut config = AppConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.encryption.passphrase, "from-env");
        assert_eq!(config.encryption.salt, "salt-from-env");
        config.validate().unwrap();
    }

    #[test]
    fn test_undrawable_opening_range_fails_validation() {
        let config = AppConfig::from_json(
            r#"{
                "encryption": { "passphrase": "p", "salt": "salty-salt" },
                "cards": { "opening_balance": { "random": { "min": "0", "max": "79228162514264337593543950335" } } }
            }"#,
        )
        .unwrap();
        assert!(matches!(config.validate(), Err(BankError::Config(_))));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let mut config = AppConfig::default();
        config.encryption.passphrase = "hunter2".into();
        assert!(!format!("{:?}", config).contains("hunter2"));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(AppConfig::from_json("{"), Err(BankError::Config(_))));
    }
}
