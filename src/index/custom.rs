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

//! Custom secondary indexes.
//!
//! A custom index is an ordinary column family maintained by the application: the row key
//! is the indexed value (or a shard of it), column names are index entries (typically the
//! main row key, or a composite ordering key ending with it) and column values optionally
//! carry denormalized data so frequent queries do not need to touch the main table.

use async_trait::async_trait;
use tracing::debug;

use crate::client::Client;
use crate::column::{Column, SameTypeProvider};
use crate::core::Result;
use crate::keyspace::{ColumnFamily, ColumnFamilyDefinition, ColumnFamilyHandler, ColumnType};
use crate::paging::{MarkPage, MarkPageRequest};

/// Custom secondary index keyed by `K`, with entries `C` and denormalized data `D`.
///
/// Use `()` as `D` when the index keeps no denormalized data.
#[async_trait]
pub trait CustomSecondaryIndex<K, C, D>: Send + Sync
where
    K: ColumnType,
    C: ColumnType + Ord,
    D: ColumnType,
{
    /// Adds `entry` under `index_key`. Inserting an existing entry overwrites its data.
    async fn insert(
        &self,
        entry: &C,
        denormalized: Option<&D>,
        index_key: &K,
        client: &Client,
    ) -> Result<()>;

    async fn delete(&self, entry: &C, index_key: &K, client: &Client) -> Result<()>;

    /// Removes every entry under `index_key`.
    async fn delete_row(&self, index_key: &K, client: &Client) -> Result<()>;

    /// Removes every entry of the index.
    async fn clear(&self, client: &Client) -> Result<()>;

    async fn count(&self, index_key: &K, client: &Client) -> Result<usize>;

    /// Every entry under `index_key`, in entry order.
    async fn read(&self, index_key: &K, client: &Client) -> Result<Vec<Column<C, D>>>;

    async fn read_page(
        &self,
        index_key: &K,
        request: &MarkPageRequest<C>,
        client: &Client,
    ) -> Result<MarkPage<Column<C, D>>> {
        self.read_page_until(index_key, request, None, client).await
    }

    /// Page bounded by `end`: the high bound for NEXT requests, the low one for PREVIOUS.
    async fn read_page_until(
        &self,
        index_key: &K,
        request: &MarkPageRequest<C>,
        end: Option<&C>,
        client: &Client,
    ) -> Result<MarkPage<Column<C, D>>>;

    /// The subset of `entries` present under `index_key`.
    async fn read_entries(
        &self,
        entries: &[C],
        index_key: &K,
        client: &Client,
    ) -> Result<Vec<Column<C, D>>>;
}

/// [`CustomSecondaryIndex`] over a single column family.
pub struct GenericCustomSecondaryIndex<K, C, D> {
    family: ColumnFamily<K, C>,
    types: SameTypeProvider,
    _denormalized: std::marker::PhantomData<fn() -> D>,
}

impl<K, C, D> std::fmt::Debug for GenericCustomSecondaryIndex<K, C, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenericCustomSecondaryIndex")
            .field("family", &self.family.name())
            .field("denormalized", &self.types.0)
            .finish()
    }
}

impl<K, C, D> GenericCustomSecondaryIndex<K, C, D>
where
    K: ColumnType,
    C: ColumnType + Ord,
    D: ColumnType,
{
    /// The family's default validator is replaced by the denormalized data type.
    pub fn new(family: ColumnFamily<K, C>) -> Self {
        let family = family.with_default_validator(D::data_type());
        Self {
            family,
            types: SameTypeProvider(D::data_type()),
            _denormalized: std::marker::PhantomData,
        }
    }

    pub fn family(&self) -> &ColumnFamily<K, C> {
        &self.family
    }

    /// Value type provider for raw reads of the index family.
    pub fn denormalized_type_provider(&self) -> &SameTypeProvider {
        &self.types
    }

    /// Entries between `start` and `end`, both inclusive and open when `None`.
    pub async fn read_range(
        &self,
        index_key: &K,
        start: Option<&C>,
        end: Option<&C>,
        client: &Client,
    ) -> Result<Vec<Column<C, D>>> {
        let row = client
            .read_column_range(index_key, start, end, false, None, &self.family, &self.types)
            .await?;
        convert(row.into_columns())
    }

    pub async fn count_range(
        &self,
        index_key: &K,
        start: Option<&C>,
        end: Option<&C>,
        client: &Client,
    ) -> Result<usize> {
        client
            .count_column_range(index_key, start, end, false, &self.family)
            .await
    }
}

fn convert<C, D: ColumnType>(columns: Vec<Column<C>>) -> Result<Vec<Column<C, D>>> {
    columns.into_iter().map(Column::typed::<D>).collect()
}

impl<K, C, D> ColumnFamilyHandler for GenericCustomSecondaryIndex<K, C, D> {
    fn column_families(&self) -> Vec<ColumnFamilyDefinition> {
        vec![self.family.definition().clone()]
    }
}

#[async_trait]
impl<K, C, D> CustomSecondaryIndex<K, C, D> for GenericCustomSecondaryIndex<K, C, D>
where
    K: ColumnType,
    C: ColumnType + Ord,
    D: ColumnType,
{
    async fn insert(
        &self,
        entry: &C,
        denormalized: Option<&D>,
        index_key: &K,
        client: &Client,
    ) -> Result<()> {
        let column =
            Column::with_optional_value(entry.clone(), denormalized.and_then(ColumnType::to_value));
        client.insert(&column, index_key, &self.family).await
    }

    async fn delete(&self, entry: &C, index_key: &K, client: &Client) -> Result<()> {
        client.delete_column(entry, index_key, &self.family).await
    }

    async fn delete_row(&self, index_key: &K, client: &Client) -> Result<()> {
        client.delete_row(index_key, &self.family).await
    }

    async fn clear(&self, client: &Client) -> Result<()> {
        debug!("Clearing custom index {}", self.family.name());
        client.truncate_column_family(&self.family).await
    }

    async fn count(&self, index_key: &K, client: &Client) -> Result<usize> {
        client.count_columns(index_key, &self.family).await
    }

    async fn read(&self, index_key: &K, client: &Client) -> Result<Vec<Column<C, D>>> {
        match client.read_row(index_key, &self.family, &self.types).await? {
            Some(row) => convert(row.into_columns()),
            None => Ok(Vec::new()),
        }
    }

    async fn read_page_until(
        &self,
        index_key: &K,
        request: &MarkPageRequest<C>,
        end: Option<&C>,
        client: &Client,
    ) -> Result<MarkPage<Column<C, D>>> {
        let page = client
            .read_page(index_key, request, end, &self.family, &self.types)
            .await?;
        page.try_map(Column::typed::<D>)
    }

    async fn read_entries(
        &self,
        entries: &[C],
        index_key: &K,
        client: &Client,
    ) -> Result<Vec<Column<C, D>>> {
        if entries.is_empty() {
            return Ok(Vec::new());
        }
        match client
            .read_columns(entries, index_key, &self.family, &self.types)
            .await?
        {
            Some(row) => convert(row.into_columns()),
            None => Ok(Vec::new()),
        }
    }
}
