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

//! Typed client facade over a [`WideColumnDriver`].
//!
//! The client carries the execution context: keyspace, consistency levels and, for
//! batch-scoped clients, the batch buffer. It is cheap to clone and shared freely.

pub mod batch;
pub mod driver;
pub mod memory;
pub mod search;

use std::sync::Arc;
use tracing::{debug, info};

use crate::column::{Column, ColumnValueTypeProvider, Row};
use crate::core::{
    Config, ReadConsistencyLevel, Result, WideIndexError, WriteConsistencyLevel,
};
use crate::keyspace::{
    encode_value, from_bytes, serializer_for, to_bytes, ColumnFamily, ColumnFamilyHandler,
    ColumnType, DataType, KeyspaceDefinition,
};
use crate::paging::{assemble_page, fetch_size, MarkPage, MarkPageRequest};

pub use batch::Batch;
use batch::BatchBuffer;
pub use driver::{
    ColumnFamilyDescription, IndexExpression, Mutation, RawColumn, RawRow, SliceRange,
    WideColumnDriver,
};
pub use memory::MemoryStore;
pub use search::{EqualityCondition, SetCondition, SetMode};

#[derive(Clone)]
pub struct Client {
    driver: Arc<dyn WideColumnDriver>,
    keyspace: KeyspaceDefinition,
    read_consistency: ReadConsistencyLevel,
    write_consistency: WriteConsistencyLevel,
    batch: Option<Arc<BatchBuffer>>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("keyspace", &self.keyspace.name)
            .field("read_consistency", &self.read_consistency)
            .field("write_consistency", &self.write_consistency)
            .field("batch", &self.batch.is_some())
            .finish()
    }
}

impl Client {
    pub fn new(driver: Arc<dyn WideColumnDriver>, keyspace: KeyspaceDefinition) -> Self {
        Self {
            driver,
            keyspace,
            read_consistency: ReadConsistencyLevel::default(),
            write_consistency: WriteConsistencyLevel::default(),
            batch: None,
        }
    }

    pub fn from_config(driver: Arc<dyn WideColumnDriver>, config: &Config) -> Self {
        Self::new(driver, KeyspaceDefinition::from(&config.keyspace))
            .with_consistency(config.consistency.read, config.consistency.write)
    }

    pub fn with_consistency(
        mut self,
        read: ReadConsistencyLevel,
        write: WriteConsistencyLevel,
    ) -> Self {
        self.read_consistency = read;
        self.write_consistency = write;
        self
    }

    pub fn keyspace(&self) -> &KeyspaceDefinition {
        &self.keyspace
    }

    pub fn read_consistency(&self) -> ReadConsistencyLevel {
        self.read_consistency
    }

    pub fn write_consistency(&self) -> WriteConsistencyLevel {
        self.write_consistency
    }

    /// Whether writes through this client are buffered in a batch.
    pub fn is_batch(&self) -> bool {
        self.batch.is_some()
    }

    /// Starts a batch. From a batch-scoped client the batch is nested in the current one.
    pub fn prepare_batch(&self) -> Batch {
        let (buffer, nested) = match &self.batch {
            Some(buffer) => (Arc::clone(buffer), true),
            None => (Arc::new(BatchBuffer::default()), false),
        };
        let client = Client {
            batch: Some(Arc::clone(&buffer)),
            ..self.clone()
        };
        Batch::new(client, buffer, nested)
    }

    async fn write(&self, mutations: Vec<Mutation>) -> Result<()> {
        if mutations.is_empty() {
            return Ok(());
        }
        match &self.batch {
            Some(buffer) => {
                buffer.push(mutations);
                Ok(())
            }
            None => self.apply_now(mutations).await,
        }
    }

    pub(crate) async fn apply_now(&self, mutations: Vec<Mutation>) -> Result<()> {
        self.driver
            .apply(&self.keyspace.name, mutations, self.write_consistency)
            .await
    }

    // Schema

    pub async fn keyspace_exists(&self) -> Result<bool> {
        self.driver.keyspace_exists(&self.keyspace.name).await
    }

    pub async fn create_keyspace(&self) -> Result<()> {
        self.driver.create_keyspace(&self.keyspace).await
    }

    pub async fn drop_keyspace(&self) -> Result<()> {
        self.driver.drop_keyspace(&self.keyspace.name).await
    }

    pub async fn column_family_exists<K, C>(&self, family: &ColumnFamily<K, C>) -> Result<bool> {
        self.driver
            .column_family_exists(&self.keyspace.name, family.name())
            .await
    }

    pub async fn create_column_family<K, C>(&self, family: &ColumnFamily<K, C>) -> Result<()> {
        self.driver
            .create_column_family(&self.keyspace.name, family.definition())
            .await
    }

    /// Creates every column family of `handler` that does not exist yet.
    pub async fn create_column_families(&self, handler: &dyn ColumnFamilyHandler) -> Result<()> {
        for definition in handler.column_families() {
            info!("Ensuring column family {} exists", definition.name);
            self.driver
                .create_column_family(&self.keyspace.name, &definition)
                .await?;
        }
        Ok(())
    }

    pub async fn drop_column_family<K, C>(&self, family: &ColumnFamily<K, C>) -> Result<()> {
        self.driver
            .drop_column_family(&self.keyspace.name, family.name())
            .await
    }

    pub async fn truncate_column_family<K, C>(&self, family: &ColumnFamily<K, C>) -> Result<()> {
        self.driver
            .truncate_column_family(&self.keyspace.name, family.name())
            .await
    }

    pub async fn describe_column_family<K, C>(
        &self,
        family: &ColumnFamily<K, C>,
    ) -> Result<Option<ColumnFamilyDescription>> {
        self.driver
            .describe_column_family(&self.keyspace.name, family.name())
            .await?
            .map(|definition| ColumnFamilyDescription::from_definition(&definition))
            .transpose()
    }

    // Writes

    pub async fn insert<K: ColumnType, C: ColumnType>(
        &self,
        column: &Column<C>,
        row_key: &K,
        family: &ColumnFamily<K, C>,
    ) -> Result<()> {
        let mutation = put_column(family.name(), to_bytes(row_key)?, column)?;
        self.write(vec![mutation]).await
    }

    /// Writes the row's columns and deletes its deleted columns in one mutation.
    pub async fn insert_row<K: ColumnType, C: ColumnType + PartialEq>(
        &self,
        row: &Row<K, C>,
        family: &ColumnFamily<K, C>,
    ) -> Result<()> {
        self.insert_rows(std::slice::from_ref(row), family).await
    }

    pub async fn insert_rows<K: ColumnType, C: ColumnType + PartialEq>(
        &self,
        rows: &[Row<K, C>],
        family: &ColumnFamily<K, C>,
    ) -> Result<()> {
        let mut mutations = Vec::new();
        for row in rows {
            let row_key = to_bytes(row.key())?;
            for name in row.deleted_columns() {
                mutations.push(Mutation::DeleteColumn {
                    family: family.name().to_string(),
                    row_key: row_key.clone(),
                    name: to_bytes(name)?,
                });
            }
            for column in row.columns() {
                mutations.push(put_column(family.name(), row_key.clone(), column)?);
            }
        }
        self.write(mutations).await
    }

    pub async fn delete_column<K: ColumnType, C: ColumnType>(
        &self,
        name: &C,
        row_key: &K,
        family: &ColumnFamily<K, C>,
    ) -> Result<()> {
        self.delete_columns(std::slice::from_ref(name), row_key, family)
            .await
    }

    pub async fn delete_columns<K: ColumnType, C: ColumnType>(
        &self,
        names: &[C],
        row_key: &K,
        family: &ColumnFamily<K, C>,
    ) -> Result<()> {
        let row_key = to_bytes(row_key)?;
        let mut mutations = Vec::with_capacity(names.len());
        for name in names {
            mutations.push(Mutation::DeleteColumn {
                family: family.name().to_string(),
                row_key: row_key.clone(),
                name: to_bytes(name)?,
            });
        }
        self.write(mutations).await
    }

    pub async fn delete_row<K: ColumnType, C>(
        &self,
        row_key: &K,
        family: &ColumnFamily<K, C>,
    ) -> Result<()> {
        self.delete_rows(std::slice::from_ref(row_key), family).await
    }

    pub async fn delete_rows<K: ColumnType, C>(
        &self,
        row_keys: &[K],
        family: &ColumnFamily<K, C>,
    ) -> Result<()> {
        let mut mutations = Vec::with_capacity(row_keys.len());
        for row_key in row_keys {
            mutations.push(Mutation::DeleteRow {
                family: family.name().to_string(),
                row_key: to_bytes(row_key)?,
            });
        }
        self.write(mutations).await
    }

    // Reads

    pub async fn exists<K: ColumnType, C>(
        &self,
        row_key: &K,
        family: &ColumnFamily<K, C>,
    ) -> Result<bool> {
        let range = SliceRange {
            limit: Some(1),
            ..SliceRange::default()
        };
        let count = self
            .driver
            .count_slice(
                &self.keyspace.name,
                family.name(),
                &to_bytes(row_key)?,
                &range,
                self.read_consistency,
            )
            .await?;
        Ok(count > 0)
    }

    pub async fn read_column<K: ColumnType, C: ColumnType>(
        &self,
        name: &C,
        row_key: &K,
        family: &ColumnFamily<K, C>,
        value_type: &DataType,
    ) -> Result<Option<Column<C>>> {
        let raw = self
            .driver
            .get_columns(
                &self.keyspace.name,
                family.name(),
                &to_bytes(row_key)?,
                &[to_bytes(name)?],
                self.read_consistency,
            )
            .await?;
        match raw.into_iter().next() {
            Some(raw) => Ok(Some(decode_column_as(raw, value_type)?)),
            None => Ok(None),
        }
    }

    pub async fn read_row<K: ColumnType, C: ColumnType + PartialEq>(
        &self,
        row_key: &K,
        family: &ColumnFamily<K, C>,
        types: &dyn ColumnValueTypeProvider<C>,
    ) -> Result<Option<Row<K, C>>> {
        let raw = self
            .driver
            .get_slice(
                &self.keyspace.name,
                family.name(),
                &to_bytes(row_key)?,
                &SliceRange::all(),
                self.read_consistency,
            )
            .await?;
        if raw.is_empty() {
            return Ok(None);
        }
        let columns = decode_columns(raw, types)?;
        Ok(Some(Row::with_columns(row_key.clone(), columns)))
    }

    /// Rows in the order of `row_keys`; missing rows are omitted.
    pub async fn read_rows<K: ColumnType + PartialEq, C: ColumnType + PartialEq>(
        &self,
        row_keys: &[K],
        family: &ColumnFamily<K, C>,
        types: &dyn ColumnValueTypeProvider<C>,
    ) -> Result<Vec<Row<K, C>>> {
        let encoded = row_keys.iter().map(to_bytes).collect::<Result<Vec<_>>>()?;
        let raw_rows = self
            .driver
            .multi_get(
                &self.keyspace.name,
                family.name(),
                &encoded,
                self.read_consistency,
            )
            .await?;

        let mut rows = Vec::with_capacity(raw_rows.len());
        for (row_key, bytes) in row_keys.iter().zip(&encoded) {
            if rows.iter().any(|row: &Row<K, C>| row.key() == row_key) {
                continue;
            }
            if let Some(raw) = raw_rows.iter().find(|raw| &raw.key == bytes) {
                if raw.columns.is_empty() {
                    continue;
                }
                let columns = decode_columns(raw.columns.clone(), types)?;
                rows.push(Row::with_columns(row_key.clone(), columns));
            }
        }
        Ok(rows)
    }

    /// Existing columns among `names`; `None` when none of them exists.
    pub async fn read_columns<K: ColumnType, C: ColumnType + PartialEq>(
        &self,
        names: &[C],
        row_key: &K,
        family: &ColumnFamily<K, C>,
        types: &dyn ColumnValueTypeProvider<C>,
    ) -> Result<Option<Row<K, C>>> {
        let encoded = names.iter().map(to_bytes).collect::<Result<Vec<_>>>()?;
        let raw = self
            .driver
            .get_columns(
                &self.keyspace.name,
                family.name(),
                &to_bytes(row_key)?,
                &encoded,
                self.read_consistency,
            )
            .await?;
        if raw.is_empty() {
            return Ok(None);
        }
        let columns = decode_columns(raw, types)?;
        Ok(Some(Row::with_columns(row_key.clone(), columns)))
    }

    pub async fn read_all_rows<K: ColumnType, C: ColumnType + PartialEq>(
        &self,
        family: &ColumnFamily<K, C>,
        types: &dyn ColumnValueTypeProvider<C>,
    ) -> Result<Vec<Row<K, C>>> {
        let raw_rows = self
            .driver
            .scan_rows(&self.keyspace.name, family.name(), self.read_consistency)
            .await?;
        let mut rows = Vec::with_capacity(raw_rows.len());
        for raw in raw_rows {
            let key = from_bytes::<K>(&raw.key)?;
            rows.push(Row::with_columns(key, decode_columns(raw.columns, types)?));
        }
        Ok(rows)
    }

    pub async fn count_columns<K: ColumnType, C>(
        &self,
        row_key: &K,
        family: &ColumnFamily<K, C>,
    ) -> Result<usize> {
        self.driver
            .count_slice(
                &self.keyspace.name,
                family.name(),
                &to_bytes(row_key)?,
                &SliceRange::all(),
                self.read_consistency,
            )
            .await
    }

    /// Columns between `start` and `end` (inclusive, open when `None`).
    ///
    /// Ascending unless `reverse`; in a reverse read `start` is the high bound. Bounds
    /// inverted for the direction are rejected.
    #[allow(clippy::too_many_arguments)]
    pub async fn read_column_range<K: ColumnType, C: ColumnType + Ord>(
        &self,
        row_key: &K,
        start: Option<&C>,
        end: Option<&C>,
        reverse: bool,
        limit: Option<usize>,
        family: &ColumnFamily<K, C>,
        types: &dyn ColumnValueTypeProvider<C>,
    ) -> Result<Row<K, C>> {
        let range = slice_range(start, end, reverse, limit)?;
        let raw = self
            .driver
            .get_slice(
                &self.keyspace.name,
                family.name(),
                &to_bytes(row_key)?,
                &range,
                self.read_consistency,
            )
            .await?;
        let columns = decode_columns(raw, types)?;
        Ok(Row::with_columns(row_key.clone(), columns))
    }

    pub async fn count_column_range<K: ColumnType, C: ColumnType + Ord>(
        &self,
        row_key: &K,
        start: Option<&C>,
        end: Option<&C>,
        reverse: bool,
        family: &ColumnFamily<K, C>,
    ) -> Result<usize> {
        let range = slice_range(start, end, reverse, None)?;
        self.driver
            .count_slice(
                &self.keyspace.name,
                family.name(),
                &to_bytes(row_key)?,
                &range,
                self.read_consistency,
            )
            .await
    }

    /// Page of columns after (or before) the request's mark, bounded by `end`.
    ///
    /// For a PREVIOUS request `end` is the low bound. The page is in ascending order and
    /// its request carries the mark column when it still exists.
    pub async fn read_page<K: ColumnType, C: ColumnType + Ord>(
        &self,
        row_key: &K,
        request: &MarkPageRequest<C>,
        end: Option<&C>,
        family: &ColumnFamily<K, C>,
        types: &dyn ColumnValueTypeProvider<C>,
    ) -> Result<MarkPage<Column<C>>> {
        let marker = |name: &C| Column::marker(name.clone());

        if let (Some(mark), Some(end)) = (request.mark(), end) {
            if mark == end {
                return Ok(MarkPage::new(request.convert(marker), Vec::new()));
            }
        }

        let range = SliceRange {
            start: request.mark().map(to_bytes).transpose()?,
            end: end.map(to_bytes).transpose()?,
            reversed: request.navigation().is_reverse(),
            limit: Some(fetch_size(request)),
        };
        let raw = self
            .driver
            .get_slice(
                &self.keyspace.name,
                family.name(),
                &to_bytes(row_key)?,
                &range,
                self.read_consistency,
            )
            .await?;
        let fetched = decode_columns(raw, types)?;
        let (found, data) = assemble_page(request, fetched, |column| {
            Some(column.name()) == request.mark()
        });
        debug!(
            "Read page of {} columns from {} ({:?}, mark found: {})",
            data.len(),
            family.name(),
            request.navigation(),
            found.is_some()
        );

        let mut found = found;
        let reference = request.convert(|name| found.take().unwrap_or_else(|| marker(name)));
        Ok(MarkPage::new(reference, data))
    }

    /// Rows whose indexed column equals the condition's value, through a native index.
    pub async fn search_with_index<K: ColumnType, C: ColumnType + PartialEq, V: ColumnType>(
        &self,
        condition: &EqualityCondition<C, V>,
        family: &ColumnFamily<K, C>,
        types: &dyn ColumnValueTypeProvider<C>,
    ) -> Result<Vec<Row<K, C>>> {
        self.search(condition.expression()?, family, types).await
    }

    pub async fn search_with_set<K: ColumnType, C: ColumnType + PartialEq, V: ColumnType>(
        &self,
        condition: &SetCondition<C, V>,
        family: &ColumnFamily<K, C>,
        types: &dyn ColumnValueTypeProvider<C>,
    ) -> Result<Vec<Row<K, C>>> {
        self.search(condition.expression()?, family, types).await
    }

    async fn search<K: ColumnType, C: ColumnType + PartialEq>(
        &self,
        expression: IndexExpression,
        family: &ColumnFamily<K, C>,
        types: &dyn ColumnValueTypeProvider<C>,
    ) -> Result<Vec<Row<K, C>>> {
        if expression.values.is_empty() {
            return Ok(Vec::new());
        }
        let raw_rows = self
            .driver
            .search_index(
                &self.keyspace.name,
                family.name(),
                &expression,
                self.read_consistency,
            )
            .await?;
        let mut rows = Vec::with_capacity(raw_rows.len());
        for raw in raw_rows {
            let key = from_bytes::<K>(&raw.key)?;
            rows.push(Row::with_columns(key, decode_columns(raw.columns, types)?));
        }
        Ok(rows)
    }
}

fn put_column<C: ColumnType>(family: &str, row_key: Vec<u8>, column: &Column<C>) -> Result<Mutation> {
    let value = match column.value_opt() {
        Some(value) => encode_value(value)?,
        None => Vec::new(),
    };
    Ok(Mutation::PutColumn {
        family: family.to_string(),
        row_key,
        column: RawColumn {
            name: to_bytes(column.name())?,
            value,
        },
    })
}

fn slice_range<C: ColumnType + Ord>(
    start: Option<&C>,
    end: Option<&C>,
    reverse: bool,
    limit: Option<usize>,
) -> Result<SliceRange> {
    if let (Some(start), Some(end)) = (start, end) {
        let inverted = if reverse { start < end } else { start > end };
        if inverted {
            return Err(WideIndexError::invalid_argument(format!(
                "range start {:?} and end {:?} are inverted for a {} read",
                start,
                end,
                if reverse { "reverse" } else { "forward" }
            )));
        }
    }
    Ok(SliceRange {
        start: start.map(to_bytes).transpose()?,
        end: end.map(to_bytes).transpose()?,
        reversed: reverse,
        limit,
    })
}

/// Empty values are markers for fixed-width types and empty values for strings and bytes.
fn decode_column_as<C: ColumnType>(raw: RawColumn, value_type: &DataType) -> Result<Column<C>> {
    let name = from_bytes::<C>(&raw.name)?;
    let value = serializer_for(value_type).decode(&raw.value)?;
    Ok(Column::with_optional_value(name, value))
}

fn decode_columns<C: ColumnType>(
    raw: Vec<RawColumn>,
    types: &dyn ColumnValueTypeProvider<C>,
) -> Result<Vec<Column<C>>> {
    raw.into_iter()
        .map(|raw| {
            let name = from_bytes::<C>(&raw.name)?;
            let value = serializer_for(&types.value_type(&name)).decode(&raw.value)?;
            Ok(Column::with_optional_value(name, value))
        })
        .collect()
}
