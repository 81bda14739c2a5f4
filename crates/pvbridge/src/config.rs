// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Bridge configuration.
//!
//! Supports both programmatic and file-based configuration.
//!
//! ```toml
//! write_timeout_ms = 2000
//!
//! [legacy]
//! string_slot_width = 40
//! ```

use crate::error::{Error, Result};
use crate::legacy::{DEFAULT_STRING_SLOT_WIDTH, ENUM_SLOT_WIDTH};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Legacy-protocol layout constants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyConfig {
    /// Fixed width of one string element (bytes).
    #[serde(default = "default_string_slot_width")]
    pub string_slot_width: usize,

    /// Width of one enumerated-choice element (bytes). Must be 2.
    #[serde(default = "default_enum_slot_width")]
    pub enum_slot_width: usize,
}

fn default_string_slot_width() -> usize {
    DEFAULT_STRING_SLOT_WIDTH
}

fn default_enum_slot_width() -> usize {
    ENUM_SLOT_WIDTH
}

impl Default for LegacyConfig {
    fn default() -> Self {
        Self {
            string_slot_width: DEFAULT_STRING_SLOT_WIDTH,
            enum_slot_width: ENUM_SLOT_WIDTH,
        }
    }
}

/// Process variable bridge configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Default bound on a single write (milliseconds).
    #[serde(default = "default_timeout_ms")]
    pub write_timeout_ms: u64,

    /// Bound of `ProcessVariable::wait_for_connection` (milliseconds).
    #[serde(default = "default_timeout_ms")]
    pub connect_timeout_ms: u64,

    #[serde(default)]
    pub legacy: LegacyConfig,
}

fn default_timeout_ms() -> u64 {
    5000
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            write_timeout_ms: 5000,
            connect_timeout_ms: 5000,
            legacy: LegacyConfig::default(),
        }
    }
}

impl BridgeConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.legacy.string_slot_width == 0 {
            return Err(Error::Config("string_slot_width must be positive".into()));
        }
        if self.legacy.enum_slot_width != ENUM_SLOT_WIDTH {
            return Err(Error::Config(format!(
                "enum_slot_width must be {} (got {})",
                ENUM_SLOT_WIDTH, self.legacy.enum_slot_width
            )));
        }
        if self.write_timeout_ms == 0 {
            return Err(Error::Config("write_timeout_ms must be positive".into()));
        }
        Ok(())
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}
