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

//! Log of indexed values, used to retract stale entries from custom indexes.

use tracing::debug;
use uuid::Uuid;

use crate::client::Client;
use crate::column::{Column, SameTypeProvider};
use crate::core::Result;
use crate::keyspace::{
    composite_components, ColumnFamily, ColumnFamilyDefinition, ColumnFamilyHandler, ColumnType,
    CompositeType, DataType, Value, STRING_RANGE_END, STRING_RANGE_START,
};

const COMMENT: &str = "Column family to keep previous values of indexes";

/// Column name in the log: the indexed column of the main table plus a token making each
/// logged value unique.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IndexEntry {
    indexed_column_name: String,
    discrimination_value: String,
}

impl IndexEntry {
    pub fn new(indexed_column_name: impl Into<String>, discrimination_value: impl Into<String>) -> Self {
        Self {
            indexed_column_name: indexed_column_name.into(),
            discrimination_value: discrimination_value.into(),
        }
    }

    pub fn indexed_column_name(&self) -> &str {
        &self.indexed_column_name
    }

    pub fn discrimination_value(&self) -> &str {
        &self.discrimination_value
    }
}

impl ColumnType for IndexEntry {
    fn data_type() -> DataType {
        DataType::Composite(CompositeType::new(vec![
            DataType::STRING_UTF8,
            DataType::STRING_UTF8,
        ]))
    }

    fn to_value(&self) -> Option<Value> {
        Some(Value::Composite(vec![
            Some(Value::Text(self.indexed_column_name.clone())),
            Some(Value::Text(self.discrimination_value.clone())),
        ]))
    }

    fn from_value(value: Option<Value>) -> Result<Self> {
        let mut components = composite_components(value, 2)?.into_iter();
        let indexed_column_name = String::from_value(components.next().flatten())?;
        let discrimination_value = String::from_value(components.next().flatten())?;
        Ok(Self {
            indexed_column_name,
            discrimination_value,
        })
    }
}

/// Maintains the log of indexed values of a main column family keyed by `K`.
///
/// Reads through custom indexes are plain range reads; updates are harder because the
/// previous indexed value has to be retracted before the new one is written, and reading
/// it from the main table races with concurrent updates. The log keeps every value written
/// to the indexes, one column per write, so no previous value is ever lost:
///
/// ```text
/// users_index_entries {
///     "user-1": {
///         ("location", <uuid 1>): "Lisbon",
///         ("location", <uuid 2>): "Porto",
///         ("status", <uuid 3>): "Active",
///     }
/// }
/// ```
///
/// Updating an indexed attribute of a main row:
///
/// 1. Read every logged value of the attribute with [`get_indexed_values`].
/// 2. Delete those values from every index family that indexes the attribute.
/// 3. Delete them from the log with [`delete_indexed_values`].
/// 4. Log the new value with [`add_indexed_value`].
/// 5. Insert the new value into the index families.
/// 6. Update the main row.
///
/// No locking is needed as long as every step stays idempotent: a failed update can be
/// replayed until it completes, and concurrent updates of the same attribute each retract
/// whatever the other logged. Indexes are eventually consistent; while an update is in
/// flight a query may see the old value, the new one, or both. Filter on read when that
/// matters.
///
/// [`get_indexed_values`]: IndexEntryHandler::get_indexed_values
/// [`delete_indexed_values`]: IndexEntryHandler::delete_indexed_values
/// [`add_indexed_value`]: IndexEntryHandler::add_indexed_value
pub struct IndexEntryHandler<K> {
    family: ColumnFamily<K, IndexEntry>,
}

impl<K: ColumnType> IndexEntryHandler<K> {
    pub fn new(family_name: impl Into<String>) -> Self {
        Self {
            family: ColumnFamily::new(family_name).with_comment(COMMENT),
        }
    }

    pub fn family(&self) -> &ColumnFamily<K, IndexEntry> {
        &self.family
    }

    /// Logs `column` for `row_key` under a fresh discrimination token, never overwriting a
    /// previously logged value.
    pub async fn add_indexed_value(
        &self,
        row_key: &K,
        column: &Column<String>,
        client: &Client,
    ) -> Result<()> {
        let entry = IndexEntry::new(column.name().clone(), Uuid::new_v4().to_string());
        debug!(
            "Logging indexed value of {} under {}",
            entry.indexed_column_name, entry.discrimination_value
        );
        let logged = column.clone().map_name(|_| entry);
        client.insert(&logged, row_key, &self.family).await
    }

    /// Every logged value of `indexed_column_name`, decoded as `D`.
    pub async fn get_indexed_values<D: ColumnType>(
        &self,
        row_key: &K,
        indexed_column_name: &str,
        client: &Client,
    ) -> Result<Vec<Column<IndexEntry, D>>> {
        let start = IndexEntry::new(indexed_column_name, STRING_RANGE_START);
        let end = IndexEntry::new(indexed_column_name, STRING_RANGE_END);
        let types = SameTypeProvider(D::data_type());
        let row = client
            .read_column_range(row_key, Some(&start), Some(&end), false, None, &self.family, &types)
            .await?;
        row.into_columns()
            .into_iter()
            .map(Column::typed::<D>)
            .collect()
    }

    pub async fn delete_indexed_values<D>(
        &self,
        row_key: &K,
        indexed_values: &[Column<IndexEntry, D>],
        client: &Client,
    ) -> Result<()> {
        let names: Vec<IndexEntry> = indexed_values
            .iter()
            .map(|column| column.name().clone())
            .collect();
        client.delete_columns(&names, row_key, &self.family).await
    }
}

impl<K> ColumnFamilyHandler for IndexEntryHandler<K> {
    fn column_families(&self) -> Vec<ColumnFamilyDefinition> {
        vec![self.family.definition().clone()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MemoryStore;
    use crate::keyspace::KeyspaceDefinition;
    use std::sync::Arc;

    async fn setup() -> (Client, IndexEntryHandler<String>) {
        let client = Client::new(Arc::new(MemoryStore::new()), KeyspaceDefinition::new("test"));
        client.create_keyspace().await.unwrap();
        let handler = IndexEntryHandler::new("users_index_entries");
        client.create_column_families(&handler).await.unwrap();
        (client, handler)
    }

    fn text(name: &str, value: &str) -> Column<String> {
        Column::new(name.to_string(), Value::Text(value.to_string()))
    }

    #[tokio::test]
    async fn test_values_are_never_overwritten() {
        let (client, handler) = setup().await;
        let user = "user-1".to_string();
        handler.add_indexed_value(&user, &text("location", "Lisbon"), &client).await.unwrap();
        handler.add_indexed_value(&user, &text("location", "Lisbon"), &client).await.unwrap();
        handler.add_indexed_value(&user, &text("status", "Active"), &client).await.unwrap();

        let locations = handler
            .get_indexed_values::<String>(&user, "location", &client)
            .await
            .unwrap();
        assert_eq!(locations.len(), 2);
        assert_ne!(locations[0].name(), locations[1].name());
        for location in &locations {
            assert_eq!(location.name().indexed_column_name(), "location");
            assert_eq!(location.value().unwrap(), "Lisbon");
        }

        let statuses = handler
            .get_indexed_values::<String>(&user, "status", &client)
            .await
            .unwrap();
        assert_eq!(statuses.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_indexed_values() {
        let (client, handler) = setup().await;
        let user = "user-1".to_string();
        handler.add_indexed_value(&user, &text("location", "Lisbon"), &client).await.unwrap();
        handler.add_indexed_value(&user, &text("status", "Active"), &client).await.unwrap();

        let old = handler
            .get_indexed_values::<String>(&user, "location", &client)
            .await
            .unwrap();
        handler.delete_indexed_values(&user, &old, &client).await.unwrap();

        assert!(handler
            .get_indexed_values::<String>(&user, "location", &client)
            .await
            .unwrap()
            .is_empty());
        assert_eq!(
            handler
                .get_indexed_values::<String>(&user, "status", &client)
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn test_family_definition() {
        let handler: IndexEntryHandler<String> = IndexEntryHandler::new("entries");
        let definition = &handler.column_families()[0];
        assert_eq!(definition.comment.as_deref(), Some(COMMENT));
        assert_eq!(definition.comparator, IndexEntry::data_type());
    }

    #[test]
    fn test_entries_sort_by_column_then_token() {
        let a = IndexEntry::new("location", "b");
        let b = IndexEntry::new("location", "c");
        let c = IndexEntry::new("status", "a");
        assert!(a < b && b < c);
        let round_trip = IndexEntry::from_value(a.to_value()).unwrap();
        assert_eq!(round_trip, a);
    }
}
