//! Governance configuration parsing.
//!
//! One TOML document defines the static inputs the engine consumes:
//! per-gate rule sets, routing rules, and tool policy profiles. All
//! three are authored out of band and read-only at evaluation time.
//!
//! ```toml
//! [[gates]]
//! id = "unit-test-gate"
//! bound_phases = ["EXEC"]
//!
//! [[gates.rules]]
//! name = "tests_executed"
//! weight = 50.0
//! required = true
//!
//! [[routing]]
//! keywords = ["schema migration", "database"]
//! specialist = "DBA"
//!
//! [[profiles]]
//! role = "EXEC"
//! allowed = ["file_write", "shell_command"]
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::gate::GateDefinition;
use crate::policy::{RoutingRule, ToolPolicyProfile};

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// The TOML is invalid or does not match the schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Static configuration for one engine instance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GovernanceConfig {
    /// Gate definitions (id, bound phases, weighted rules).
    #[serde(default)]
    pub gates: Vec<GateDefinition>,

    /// Routing rules, scanned in order for the first-match advisory.
    #[serde(default)]
    pub routing: Vec<RoutingRule>,

    /// Tool policy profiles, one per restricted role.
    #[serde(default)]
    pub profiles: Vec<ToolPolicyProfile>,
}

impl GovernanceConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::from_toml(&content)?)
    }

    /// Parses configuration from a TOML string.
    ///
    /// Structural validation of the gate definitions (positive weights,
    /// unique ids) happens when the engine builds its gate registry;
    /// this parse only enforces the schema.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}
