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

//! In-memory wide-column store.
//!
//! Reference implementation of [`WideColumnDriver`] for tests, benchmarks and the demo.
//! Column names are kept sorted by their decoded comparator value, so range reads see the
//! same order the real store would produce. No durability.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::driver::{IndexExpression, Mutation, RawColumn, RawRow, SliceRange, WideColumnDriver};
use crate::core::{ReadConsistencyLevel, Result, SchemaError, WriteConsistencyLevel};
use crate::keyspace::{serializer_for, ColumnFamilyDefinition, KeyspaceDefinition, Value};

/// Sort key of a column: its decoded name.
type NameKey = Option<Value>;

type StoredRow = BTreeMap<NameKey, RawColumn>;

#[derive(Debug)]
struct KeyspaceState {
    definition: KeyspaceDefinition,
    families: HashMap<String, FamilyState>,
}

#[derive(Debug)]
struct FamilyState {
    definition: ColumnFamilyDefinition,
    rows: BTreeMap<Vec<u8>, StoredRow>,
}

impl FamilyState {
    fn name_key(&self, name: &[u8]) -> Result<NameKey> {
        serializer_for(&self.definition.comparator).decode(name)
    }

    fn put(&mut self, row_key: Vec<u8>, column: RawColumn) -> Result<()> {
        let key = self.name_key(&column.name)?;
        self.rows.entry(row_key).or_default().insert(key, column);
        Ok(())
    }

    fn delete_column(&mut self, row_key: &[u8], name: &[u8]) -> Result<()> {
        let key = self.name_key(name)?;
        if let Some(row) = self.rows.get_mut(row_key) {
            row.remove(&key);
            if row.is_empty() {
                self.rows.remove(row_key);
            }
        }
        Ok(())
    }

    fn slice(&self, row_key: &[u8], range: &SliceRange) -> Result<Vec<RawColumn>> {
        let row = match self.rows.get(row_key) {
            Some(row) => row,
            None => return Ok(Vec::new()),
        };

        let start = range.start.as_deref().map(|b| self.name_key(b)).transpose()?;
        let end = range.end.as_deref().map(|b| self.name_key(b)).transpose()?;
        let (low, high) = if range.reversed {
            (end, start)
        } else {
            (start, end)
        };
        if let (Some(low), Some(high)) = (&low, &high) {
            if low > high {
                return Ok(Vec::new());
            }
        }

        let bounds = (
            low.map_or(Bound::Unbounded, Bound::Included),
            high.map_or(Bound::Unbounded, Bound::Included),
        );
        let limit = range.limit.unwrap_or(usize::MAX);
        let columns = row.range(bounds).map(|(_, column)| column.clone());
        let columns: Vec<RawColumn> = if range.reversed {
            columns.rev().take(limit).collect()
        } else {
            columns.take(limit).collect()
        };
        Ok(columns)
    }

    fn raw_row(key: &[u8], row: &StoredRow) -> RawRow {
        RawRow {
            key: key.to_vec(),
            columns: row.values().cloned().collect(),
        }
    }
}

/// Shared handle to an in-memory store. Clones see the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    keyspaces: Arc<RwLock<HashMap<String, KeyspaceState>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn keyspace<'a>(
    keyspaces: &'a HashMap<String, KeyspaceState>,
    name: &str,
) -> Result<&'a KeyspaceState> {
    keyspaces
        .get(name)
        .ok_or_else(|| SchemaError::UnknownKeyspace(name.to_string()).into())
}

fn family<'a>(
    keyspaces: &'a HashMap<String, KeyspaceState>,
    keyspace_name: &str,
    name: &str,
) -> Result<&'a FamilyState> {
    keyspace(keyspaces, keyspace_name)?
        .families
        .get(name)
        .ok_or_else(|| SchemaError::UnknownColumnFamily(name.to_string()).into())
}

fn family_mut<'a>(
    keyspaces: &'a mut HashMap<String, KeyspaceState>,
    keyspace_name: &str,
    name: &str,
) -> Result<&'a mut FamilyState> {
    keyspaces
        .get_mut(keyspace_name)
        .ok_or_else(|| SchemaError::UnknownKeyspace(keyspace_name.to_string()))?
        .families
        .get_mut(name)
        .ok_or_else(|| SchemaError::UnknownColumnFamily(name.to_string()).into())
}

#[async_trait]
impl WideColumnDriver for MemoryStore {
    async fn keyspace_exists(&self, keyspace: &str) -> Result<bool> {
        Ok(self.keyspaces.read().await.contains_key(keyspace))
    }

    async fn create_keyspace(&self, keyspace: &KeyspaceDefinition) -> Result<()> {
        let mut keyspaces = self.keyspaces.write().await;
        if !keyspaces.contains_key(&keyspace.name) {
            info!(
                "Creating keyspace {} ({}, replication factor {})",
                keyspace.name, keyspace.replication_strategy, keyspace.replication_factor
            );
            keyspaces.insert(
                keyspace.name.clone(),
                KeyspaceState {
                    definition: keyspace.clone(),
                    families: HashMap::new(),
                },
            );
        }
        Ok(())
    }

    async fn drop_keyspace(&self, keyspace: &str) -> Result<()> {
        if self.keyspaces.write().await.remove(keyspace).is_some() {
            info!("Dropped keyspace {}", keyspace);
        }
        Ok(())
    }

    async fn column_family_exists(&self, keyspace: &str, family: &str) -> Result<bool> {
        let keyspaces = self.keyspaces.read().await;
        Ok(keyspaces
            .get(keyspace)
            .map_or(false, |state| state.families.contains_key(family)))
    }

    async fn create_column_family(
        &self,
        keyspace: &str,
        definition: &ColumnFamilyDefinition,
    ) -> Result<()> {
        let mut keyspaces = self.keyspaces.write().await;
        let state = keyspaces
            .get_mut(keyspace)
            .ok_or_else(|| SchemaError::UnknownKeyspace(keyspace.to_string()))?;
        if !state.families.contains_key(&definition.name) {
            info!("Creating column family {}.{}", state.definition.name, definition.name);
            state.families.insert(
                definition.name.clone(),
                FamilyState {
                    definition: definition.clone(),
                    rows: BTreeMap::new(),
                },
            );
        }
        Ok(())
    }

    async fn drop_column_family(&self, keyspace: &str, family: &str) -> Result<()> {
        let mut keyspaces = self.keyspaces.write().await;
        if let Some(state) = keyspaces.get_mut(keyspace) {
            if state.families.remove(family).is_some() {
                info!("Dropped column family {}.{}", keyspace, family);
            }
        }
        Ok(())
    }

    async fn truncate_column_family(&self, keyspace: &str, family: &str) -> Result<()> {
        let mut keyspaces = self.keyspaces.write().await;
        family_mut(&mut keyspaces, keyspace, family)?.rows.clear();
        debug!("Truncated column family {}.{}", keyspace, family);
        Ok(())
    }

    async fn describe_column_family(
        &self,
        keyspace: &str,
        family: &str,
    ) -> Result<Option<ColumnFamilyDefinition>> {
        let keyspaces = self.keyspaces.read().await;
        Ok(keyspaces
            .get(keyspace)
            .and_then(|state| state.families.get(family))
            .map(|state| state.definition.clone()))
    }

    async fn apply(
        &self,
        keyspace: &str,
        mutations: Vec<Mutation>,
        consistency: WriteConsistencyLevel,
    ) -> Result<()> {
        let mut keyspaces = self.keyspaces.write().await;

        // Validate the whole batch before touching any row.
        for mutation in &mutations {
            let state = family(&keyspaces, keyspace, mutation.family())?;
            match mutation {
                Mutation::PutColumn { column, .. } => {
                    state.name_key(&column.name)?;
                }
                Mutation::DeleteColumn { name, .. } => {
                    state.name_key(name)?;
                }
                Mutation::DeleteRow { .. } => {}
            }
        }

        debug!(
            "Applying {} mutations to keyspace {} at {}",
            mutations.len(),
            keyspace,
            consistency
        );
        for mutation in mutations {
            match mutation {
                Mutation::PutColumn {
                    family,
                    row_key,
                    column,
                } => family_mut(&mut keyspaces, keyspace, &family)?.put(row_key, column)?,
                Mutation::DeleteColumn {
                    family,
                    row_key,
                    name,
                } => family_mut(&mut keyspaces, keyspace, &family)?.delete_column(&row_key, &name)?,
                Mutation::DeleteRow { family, row_key } => {
                    family_mut(&mut keyspaces, keyspace, &family)?.rows.remove(&row_key);
                }
            }
        }
        Ok(())
    }

    async fn get_slice(
        &self,
        keyspace: &str,
        family_name: &str,
        row_key: &[u8],
        range: &SliceRange,
        _consistency: ReadConsistencyLevel,
    ) -> Result<Vec<RawColumn>> {
        let keyspaces = self.keyspaces.read().await;
        family(&keyspaces, keyspace, family_name)?.slice(row_key, range)
    }

    async fn count_slice(
        &self,
        keyspace: &str,
        family_name: &str,
        row_key: &[u8],
        range: &SliceRange,
        _consistency: ReadConsistencyLevel,
    ) -> Result<usize> {
        let keyspaces = self.keyspaces.read().await;
        Ok(family(&keyspaces, keyspace, family_name)?
            .slice(row_key, range)?
            .len())
    }

    async fn get_columns(
        &self,
        keyspace: &str,
        family_name: &str,
        row_key: &[u8],
        names: &[Vec<u8>],
        _consistency: ReadConsistencyLevel,
    ) -> Result<Vec<RawColumn>> {
        let keyspaces = self.keyspaces.read().await;
        let state = family(&keyspaces, keyspace, family_name)?;
        let row = match state.rows.get(row_key) {
            Some(row) => row,
            None => return Ok(Vec::new()),
        };

        let mut found = BTreeMap::new();
        for name in names {
            let key = state.name_key(name)?;
            if let Some(column) = row.get(&key) {
                found.insert(key, column.clone());
            }
        }
        Ok(found.into_values().collect())
    }

    async fn multi_get(
        &self,
        keyspace: &str,
        family_name: &str,
        row_keys: &[Vec<u8>],
        _consistency: ReadConsistencyLevel,
    ) -> Result<Vec<RawRow>> {
        let keyspaces = self.keyspaces.read().await;
        let state = family(&keyspaces, keyspace, family_name)?;
        let mut rows: BTreeMap<&[u8], RawRow> = BTreeMap::new();
        for key in row_keys {
            if let Some(row) = state.rows.get(key) {
                rows.entry(key.as_slice())
                    .or_insert_with(|| FamilyState::raw_row(key, row));
            }
        }
        Ok(rows.into_values().collect())
    }

    async fn scan_rows(
        &self,
        keyspace: &str,
        family_name: &str,
        _consistency: ReadConsistencyLevel,
    ) -> Result<Vec<RawRow>> {
        let keyspaces = self.keyspaces.read().await;
        let state = family(&keyspaces, keyspace, family_name)?;
        Ok(state
            .rows
            .iter()
            .map(|(key, row)| FamilyState::raw_row(key, row))
            .collect())
    }

    async fn search_index(
        &self,
        keyspace: &str,
        family_name: &str,
        expression: &IndexExpression,
        _consistency: ReadConsistencyLevel,
    ) -> Result<Vec<RawRow>> {
        let keyspaces = self.keyspaces.read().await;
        let state = family(&keyspaces, keyspace, family_name)?;

        let column_key = state.name_key(&expression.column_name)?;
        let index = column_key
            .as_ref()
            .and_then(|name| state.definition.secondary_index(name))
            .ok_or_else(|| SchemaError::MissingNativeIndex {
                family: family_name.to_string(),
                column: column_key
                    .as_ref()
                    .map_or_else(|| "null".to_string(), ToString::to_string),
            })?;

        let validator = serializer_for(&index.validator);
        let mut wanted = Vec::with_capacity(expression.values.len());
        for value in &expression.values {
            wanted.push(validator.decode(value)?);
        }

        let mut rows = Vec::new();
        for (key, row) in &state.rows {
            if let Some(column) = row.get(&column_key) {
                if wanted.contains(&validator.decode(&column.value)?) {
                    rows.push(FamilyState::raw_row(key, row));
                }
            }
        }
        debug!(
            "Native index {} matched {} rows in {}",
            index.index_name(),
            rows.len(),
            family_name
        );
        Ok(rows)
    }
}
