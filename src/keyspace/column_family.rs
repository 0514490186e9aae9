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

//! Keyspace and column family schema.

use std::fmt;
use std::marker::PhantomData;

use super::data_type::{ColumnType, DataType};
use super::value::Value;
use crate::core::config::KeyspaceConfig;

/// Keyspace to create when it does not exist yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyspaceDefinition {
    pub name: String,
    pub replication_strategy: String,
    pub replication_factor: u32,
}

impl KeyspaceDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            replication_strategy: "SimpleStrategy".to_string(),
            replication_factor: 1,
        }
    }

    pub fn with_replication(mut self, strategy: impl Into<String>, factor: u32) -> Self {
        self.replication_strategy = strategy.into();
        self.replication_factor = factor;
        self
    }
}

impl From<&KeyspaceConfig> for KeyspaceDefinition {
    fn from(config: &KeyspaceConfig) -> Self {
        Self::new(config.name.clone())
            .with_replication(config.replication_strategy.clone(), config.replication_factor)
    }
}

/// Native secondary index over one column of a column family.
#[derive(Debug, Clone, PartialEq)]
pub struct SecondaryIndexDefinition {
    pub column_name: Value,
    pub validator: DataType,
}

impl SecondaryIndexDefinition {
    /// Index name derived from the column name with whitespace removed.
    pub fn index_name(&self) -> String {
        self.column_name
            .to_string()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect()
    }
}

/// Untyped column family schema, as handed to drivers.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnFamilyDefinition {
    pub name: String,
    pub key_type: DataType,
    pub comparator: DataType,
    pub default_validator: DataType,
    pub secondary_indexes: Vec<SecondaryIndexDefinition>,
    pub comment: Option<String>,
}

impl ColumnFamilyDefinition {
    pub fn secondary_index(&self, column_name: &Value) -> Option<&SecondaryIndexDefinition> {
        self.secondary_indexes
            .iter()
            .find(|index| &index.column_name == column_name)
    }
}

/// Column family whose row keys are `K` and column names are `C`.
///
/// Values are not bound to a Rust type: each read supplies the value [`DataType`] per
/// column name, falling back to the default validator on the driver side.
pub struct ColumnFamily<K, C> {
    definition: ColumnFamilyDefinition,
    _marker: PhantomData<fn() -> (K, C)>,
}

impl<K: ColumnType, C: ColumnType> ColumnFamily<K, C> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            definition: ColumnFamilyDefinition {
                name: name.into(),
                key_type: K::data_type(),
                comparator: C::data_type(),
                default_validator: DataType::BYTE_ARRAY,
                secondary_indexes: Vec::new(),
                comment: None,
            },
            _marker: PhantomData,
        }
    }

    pub fn with_default_validator(mut self, validator: DataType) -> Self {
        self.definition.default_validator = validator;
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.definition.comment = Some(comment.into());
        self
    }

    /// Declares a native secondary index on the column named `column`.
    pub fn with_secondary_index(mut self, column: &C, validator: DataType) -> Self {
        if let Some(column_name) = column.to_value() {
            self.definition.secondary_indexes.push(SecondaryIndexDefinition {
                column_name,
                validator,
            });
        }
        self
    }
}

impl<K, C> ColumnFamily<K, C> {
    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn definition(&self) -> &ColumnFamilyDefinition {
        &self.definition
    }

    pub fn comment(&self) -> Option<&str> {
        self.definition.comment.as_deref()
    }
}

impl<K, C> Clone for ColumnFamily<K, C> {
    fn clone(&self) -> Self {
        Self {
            definition: self.definition.clone(),
            _marker: PhantomData,
        }
    }
}

impl<K, C> fmt::Debug for ColumnFamily<K, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnFamily")
            .field("definition", &self.definition)
            .finish()
    }
}

/// Owner of one or more column families, created together at bootstrap.
pub trait ColumnFamilyHandler {
    fn column_families(&self) -> Vec<ColumnFamilyDefinition>;
}
