// RDB - Remote Debugger
// Copyright (C) 2024 Zhuo Zhang and Wuqi Zhang
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Configuration for the RDB client
//!
//! Stored as TOML in `~/.rdb.toml` and read once per run.

use eyre::{Context, Result};
use rdb_common::FilterLevel;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, path::PathBuf, time::Duration};
use tracing::{debug, info};

use crate::AttachPolicy;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Session settings pushed to the debuggee
    pub debugger: DebuggerConfig,
    /// Attach retry policy
    pub attach: AttachConfig,
    /// Variable tree filters
    pub variables: VariablesConfig,
}

/// Session settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebuggerConfig {
    /// Stop on unhandled exceptions
    pub trap_exceptions: bool,
    /// Inspected frame follows the running thread
    pub synchronicity: bool,
    /// Follow the child process on fork
    pub fork_mode: bool,
    /// Decide the fork mode automatically
    pub auto_fork: bool,
    /// Encoding of values sent back by the debuggee
    pub encoding: String,
    /// Escape characters the encoding cannot represent
    pub escaping: bool,
    /// Host to look for debuggees on
    pub default_host: String,
    /// Password for the channel; empty keeps the session default
    pub default_password: String,
    /// The debuggee runs on another host
    pub remote: bool,
    /// Module whose internal stops are resumed automatically
    pub debugger_module: String,
}

impl Default for DebuggerConfig {
    fn default() -> Self {
        Self {
            trap_exceptions: true,
            synchronicity: true,
            fork_mode: false,
            auto_fork: true,
            encoding: "auto".to_string(),
            escaping: true,
            default_host: "localhost".to_string(),
            default_password: String::new(),
            remote: false,
            debugger_module: crate::coordinator::DEFAULT_DEBUGGER_MODULE.to_string(),
        }
    }
}

/// Attach retry policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttachConfig {
    /// Attempts before giving up
    pub max_attempts: u32,
    /// Wait before each attempt, in milliseconds
    pub backoff_ms: u64,
}

impl Default for AttachConfig {
    fn default() -> Self {
        Self { max_attempts: 5, backoff_ms: 1000 }
    }
}

impl AttachConfig {
    /// Retry policy for the coordinator
    pub fn policy(&self) -> AttachPolicy {
        AttachPolicy {
            max_attempts: self.max_attempts,
            backoff: Duration::from_millis(self.backoff_ms),
        }
    }
}

/// Filters of the three variable trees
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VariablesConfig {
    /// Local variables
    pub locals: TreeFilterConfig,
    /// Global variables
    pub globals: TreeFilterConfig,
    /// Exception information
    pub exceptions: TreeFilterConfig,
}

/// Filter of one variable tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeFilterConfig {
    /// Regex matched at the start of each child name; empty shows everything
    pub filter_expr: String,
    /// Verbosity requested from the debuggee
    pub filter_level: FilterLevel,
}

impl Config {
    /// Get the config file path (~/.rdb.toml)
    pub fn config_path() -> Result<PathBuf> {
        let home =
            dirs::home_dir().ok_or_else(|| eyre::eyre!("Unable to determine home directory"))?;
        Ok(home.join(".rdb.toml"))
    }

    /// Load configuration from file, creating default if it doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            info!("Config file not found, creating default at {:?}", config_path);
            let default_config = Self::default();
            default_config.save_to_path(&config_path)?;
            return Ok(default_config);
        }

        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific file
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path:?}"))?;

        let config: Self =
            toml::from_str(&content).with_context(|| "Failed to parse config file as TOML")?;

        debug!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to ~/.rdb.toml
    pub fn save(&self) -> Result<()> {
        self.save_to_path(Self::config_path()?)
    }

    /// Save configuration to a specific file
    pub fn save_to_path(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content =
            toml::to_string_pretty(self).with_context(|| "Failed to serialize config to TOML")?;

        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {path:?}"))?;

        debug!("Saved configuration to {:?}", path);
        Ok(())
    }
}
