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

//! Byte-level contract with the underlying wide-column store.
//!
//! Everything above this trait works with typed keys, names and values; everything below
//! it sees encoded bytes plus the column family schema needed to order them.

use async_trait::async_trait;

use crate::core::{ReadConsistencyLevel, Result, WriteConsistencyLevel};
use crate::keyspace::{class_for, ColumnFamilyDefinition, KeyspaceDefinition};

/// Encoded column. An empty value is how the store represents "no value".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawColumn {
    pub name: Vec<u8>,
    pub value: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    pub key: Vec<u8>,
    pub columns: Vec<RawColumn>,
}

/// Single write against a column family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    PutColumn {
        family: String,
        row_key: Vec<u8>,
        column: RawColumn,
    },
    DeleteColumn {
        family: String,
        row_key: Vec<u8>,
        name: Vec<u8>,
    },
    DeleteRow {
        family: String,
        row_key: Vec<u8>,
    },
}

impl Mutation {
    pub fn family(&self) -> &str {
        match self {
            Mutation::PutColumn { family, .. }
            | Mutation::DeleteColumn { family, .. }
            | Mutation::DeleteRow { family, .. } => family,
        }
    }
}

/// Column slice of a single row.
///
/// Bounds are inclusive and follow the scan direction: when `reversed` is set, `start` is
/// the high bound and `end` the low one. `None` leaves that side open.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SliceRange {
    pub start: Option<Vec<u8>>,
    pub end: Option<Vec<u8>>,
    pub reversed: bool,
    pub limit: Option<usize>,
}

impl SliceRange {
    pub fn all() -> Self {
        Self::default()
    }
}

/// Lookup through a native secondary index: rows whose `column_name` column holds any of
/// `values`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexExpression {
    pub column_name: Vec<u8>,
    pub values: Vec<Vec<u8>>,
}

/// Native class names of a column family, as reported by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnFamilyDescription {
    pub name: String,
    pub key_validation_class: String,
    pub comparator_class: String,
    pub default_validation_class: String,
    pub comment: Option<String>,
    /// Index name and validation class per native secondary index
    pub indexes: Vec<(String, String)>,
}

impl ColumnFamilyDescription {
    pub fn from_definition(definition: &ColumnFamilyDefinition) -> Result<Self> {
        let mut indexes = Vec::with_capacity(definition.secondary_indexes.len());
        for index in &definition.secondary_indexes {
            indexes.push((index.index_name(), class_for(&index.validator)?));
        }
        Ok(Self {
            name: definition.name.clone(),
            key_validation_class: class_for(&definition.key_type)?,
            comparator_class: class_for(&definition.comparator)?,
            default_validation_class: class_for(&definition.default_validator)?,
            comment: definition.comment.clone(),
            indexes,
        })
    }
}

/// Wide-column store driver.
///
/// Implementations own connection handling. Faults reaching the store surface as
/// `PersistenceError`; unknown keyspaces and families as `SchemaError`.
#[async_trait]
pub trait WideColumnDriver: Send + Sync {
    async fn keyspace_exists(&self, keyspace: &str) -> Result<bool>;

    /// No-op when the keyspace exists.
    async fn create_keyspace(&self, keyspace: &KeyspaceDefinition) -> Result<()>;

    /// No-op when the keyspace does not exist.
    async fn drop_keyspace(&self, keyspace: &str) -> Result<()>;

    async fn column_family_exists(&self, keyspace: &str, family: &str) -> Result<bool>;

    /// No-op when the column family exists.
    async fn create_column_family(
        &self,
        keyspace: &str,
        definition: &ColumnFamilyDefinition,
    ) -> Result<()>;

    /// No-op when the column family does not exist.
    async fn drop_column_family(&self, keyspace: &str, family: &str) -> Result<()>;

    async fn truncate_column_family(&self, keyspace: &str, family: &str) -> Result<()>;

    async fn describe_column_family(
        &self,
        keyspace: &str,
        family: &str,
    ) -> Result<Option<ColumnFamilyDefinition>>;

    /// Applies every mutation or none.
    async fn apply(
        &self,
        keyspace: &str,
        mutations: Vec<Mutation>,
        consistency: WriteConsistencyLevel,
    ) -> Result<()>;

    /// Columns of one row within `range`, in scan order. Empty when the row is absent.
    async fn get_slice(
        &self,
        keyspace: &str,
        family: &str,
        row_key: &[u8],
        range: &SliceRange,
        consistency: ReadConsistencyLevel,
    ) -> Result<Vec<RawColumn>>;

    async fn count_slice(
        &self,
        keyspace: &str,
        family: &str,
        row_key: &[u8],
        range: &SliceRange,
        consistency: ReadConsistencyLevel,
    ) -> Result<usize>;

    /// Existing columns among `names`, in comparator order.
    async fn get_columns(
        &self,
        keyspace: &str,
        family: &str,
        row_key: &[u8],
        names: &[Vec<u8>],
        consistency: ReadConsistencyLevel,
    ) -> Result<Vec<RawColumn>>;

    /// Existing rows among `row_keys`, in no particular order.
    async fn multi_get(
        &self,
        keyspace: &str,
        family: &str,
        row_keys: &[Vec<u8>],
        consistency: ReadConsistencyLevel,
    ) -> Result<Vec<RawRow>>;

    async fn scan_rows(
        &self,
        keyspace: &str,
        family: &str,
        consistency: ReadConsistencyLevel,
    ) -> Result<Vec<RawRow>>;

    async fn search_index(
        &self,
        keyspace: &str,
        family: &str,
        expression: &IndexExpression,
        consistency: ReadConsistencyLevel,
    ) -> Result<Vec<RawRow>>;
}
