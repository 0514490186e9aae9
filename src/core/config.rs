/*
 * Copyright 2025 Vijaykumar Singh
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::error::ConfigError;
use super::types::{ReadConsistencyLevel, WriteConsistencyLevel};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub keyspace: KeyspaceConfig,
    pub consistency: ConsistencyConfig,
    pub paging: PagingConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct KeyspaceConfig {
    pub name: String,
    pub replication_strategy: String,
    pub replication_factor: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct ConsistencyConfig {
    pub read: ReadConsistencyLevel,
    pub write: WriteConsistencyLevel,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PagingConfig {
    /// Page size used when an index has to be scanned to filter entries
    pub scan_page_size: usize,
    /// Paged intersection reads `size * factor` entries from the base index per round
    pub intersect_overfetch_factor: usize,
    /// Upper bound on paged intersection rounds; unbounded when absent
    pub max_intersect_rounds: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub with_target: bool,
}

impl Default for KeyspaceConfig {
    fn default() -> Self {
        Self {
            name: "wideindex".to_string(),
            replication_strategy: "SimpleStrategy".to_string(),
            replication_factor: 1,
        }
    }
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            scan_page_size: 10_000,
            intersect_overfetch_factor: 2,
            max_intersect_rounds: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            with_target: true,
        }
    }
}

impl Config {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.keyspace.name.trim().is_empty() {
            return Err(invalid("keyspace.name", &self.keyspace.name));
        }
        if self.keyspace.replication_factor == 0 {
            return Err(invalid("keyspace.replication_factor", &0));
        }
        self.paging.validate()
    }
}

impl PagingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scan_page_size == 0 {
            return Err(invalid("paging.scan_page_size", &self.scan_page_size));
        }
        if self.intersect_overfetch_factor == 0 {
            return Err(invalid(
                "paging.intersect_overfetch_factor",
                &self.intersect_overfetch_factor,
            ));
        }
        if self.max_intersect_rounds == Some(0) {
            return Err(invalid("paging.max_intersect_rounds", &0));
        }
        Ok(())
    }
}

fn invalid(field: &str, value: &dyn std::fmt::Display) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
    }
}
