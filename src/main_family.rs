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

//! Main (data) column family of an entity, next to which the custom indexes live.

use tracing::debug;

use crate::client::Client;
use crate::column::{ColumnValueTypeProvider, Row};
use crate::core::{Result, WideIndexError};
use crate::keyspace::{ColumnFamily, ColumnFamilyDefinition, ColumnFamilyHandler, ColumnType};

/// Column family holding one row per entity, with the value types of its columns.
pub struct MainColumnFamily<K, C> {
    family: ColumnFamily<K, C>,
    types: Box<dyn ColumnValueTypeProvider<C>>,
}

impl<K, C> MainColumnFamily<K, C>
where
    K: ColumnType + PartialEq,
    C: ColumnType + PartialEq,
{
    pub fn new(
        family: ColumnFamily<K, C>,
        types: impl ColumnValueTypeProvider<C> + 'static,
    ) -> Result<Self> {
        if family.name().is_empty() {
            return Err(WideIndexError::invalid_argument(
                "main column family name cannot be empty",
            ));
        }
        Ok(Self {
            family,
            types: Box::new(types),
        })
    }

    pub fn family(&self) -> &ColumnFamily<K, C> {
        &self.family
    }

    pub fn types(&self) -> &dyn ColumnValueTypeProvider<C> {
        self.types.as_ref()
    }

    /// Writes the row's columns and removes its deleted ones.
    pub async fn insert(&self, row: &Row<K, C>, client: &Client) -> Result<()> {
        client.insert_row(row, &self.family).await
    }

    pub async fn delete(&self, row_key: &K, client: &Client) -> Result<()> {
        client.delete_row(row_key, &self.family).await
    }

    pub async fn delete_all(&self, row_keys: &[K], client: &Client) -> Result<()> {
        if row_keys.is_empty() {
            return Ok(());
        }
        client.delete_rows(row_keys, &self.family).await
    }

    pub async fn read(&self, row_key: &K, client: &Client) -> Result<Option<Row<K, C>>> {
        client.read_row(row_key, &self.family, self.types()).await
    }

    /// Rows in the order of `row_keys`, skipping missing ones.
    pub async fn read_all(&self, row_keys: &[K], client: &Client) -> Result<Vec<Row<K, C>>> {
        if row_keys.is_empty() {
            return Ok(Vec::new());
        }
        client.read_rows(row_keys, &self.family, self.types()).await
    }

    pub async fn exists(&self, row_key: &K, client: &Client) -> Result<bool> {
        client.exists(row_key, &self.family).await
    }

    /// Number of rows. Scans the whole family; keep an
    /// [`AllRowsSecondaryIndex`](crate::index::AllRowsSecondaryIndex) when this is frequent.
    pub async fn count(&self, client: &Client) -> Result<usize> {
        let rows = client.read_all_rows(&self.family, self.types()).await?;
        let count = rows.iter().filter(|row| !row.is_empty()).count();
        debug!("Counted {} rows in {}", count, self.family.name());
        Ok(count)
    }
}

impl<K, C> ColumnFamilyHandler for MainColumnFamily<K, C> {
    fn column_families(&self) -> Vec<ColumnFamilyDefinition> {
        vec![self.family.definition().clone()]
    }
}
