//! Deployment parameters for ledgers and controllers
//!
//! Everything has a default matching the production TrueVND deployment, so a
//! JSON document only needs to carry the fields it overrides.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::{Amount, BlockHeight};

/// One day of 15 second blocks
pub const DEFAULT_MINT_DELAY: BlockHeight = 24 * 60 * 60 / 15;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub fee_numerator: Amount,
    pub fee_denominator: Amount,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            name: "TrueVND".to_string(),
            symbol: "TVND".to_string(),
            decimals: 18,
            fee_numerator: 1,
            fee_denominator: 2000,
        }
    }
}

impl LedgerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.fee_denominator == 0 {
            bail!("fee_denominator must be non-zero");
        }
        if self.fee_numerator > self.fee_denominator {
            bail!(
                "fee {}/{} exceeds the transferred amount",
                self.fee_numerator,
                self.fee_denominator
            );
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Heights a non-owner must wait between requesting and finalizing a mint
    pub mint_delay: BlockHeight,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            mint_delay: DEFAULT_MINT_DELAY,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    pub ledger: LedgerConfig,
    pub controller: ControllerConfig,
    pub initial_height: BlockHeight,
}

impl HostConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: HostConfig =
            serde_json::from_str(json).context("Failed to parse host configuration")?;
        config.ledger.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file {}", path.display()))?;
        Self::from_json_str(&raw).with_context(|| format!("Invalid configuration in {}", path.display()))
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize host configuration")
    }
}
