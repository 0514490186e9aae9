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

//! Index of every row of a main column family, for counting and paging over all rows.

use super::custom::{CustomSecondaryIndex, GenericCustomSecondaryIndex};
use crate::client::Client;
use crate::column::Column;
use crate::core::Result;
use crate::keyspace::{ColumnFamily, ColumnFamilyDefinition, ColumnFamilyHandler, ColumnType};
use crate::paging::{MarkPage, MarkPageRequest};

const ROW_KEY: &str = "rows";

const COMMENT: &str = "Secondary index column family to keep all rows in a main column family as columns for counting and pagination";

// A single row bounds the index to the store's per-row column limit.
// TODO: shard the row with HashShardStrategy once main tables may outgrow it.
pub struct AllRowsSecondaryIndex<C, D> {
    delegate: GenericCustomSecondaryIndex<String, C, D>,
}

impl<C, D> AllRowsSecondaryIndex<C, D>
where
    C: ColumnType + Ord,
    D: ColumnType,
{
    pub fn new(family_name: impl Into<String>) -> Self {
        let family = ColumnFamily::new(family_name).with_comment(COMMENT);
        Self {
            delegate: GenericCustomSecondaryIndex::new(family),
        }
    }

    pub fn family(&self) -> &ColumnFamily<String, C> {
        self.delegate.family()
    }

    pub async fn insert(&self, entry: &C, denormalized: Option<&D>, client: &Client) -> Result<()> {
        self.delegate
            .insert(entry, denormalized, &ROW_KEY.to_string(), client)
            .await
    }

    pub async fn delete(&self, entry: &C, client: &Client) -> Result<()> {
        self.delegate.delete(entry, &ROW_KEY.to_string(), client).await
    }

    pub async fn clear(&self, client: &Client) -> Result<()> {
        self.delegate.delete_row(&ROW_KEY.to_string(), client).await
    }

    pub async fn count(&self, client: &Client) -> Result<usize> {
        self.delegate.count(&ROW_KEY.to_string(), client).await
    }

    pub async fn read(&self, client: &Client) -> Result<Vec<Column<C, D>>> {
        self.delegate.read(&ROW_KEY.to_string(), client).await
    }

    pub async fn read_page(
        &self,
        request: &MarkPageRequest<C>,
        client: &Client,
    ) -> Result<MarkPage<Column<C, D>>> {
        self.read_page_until(request, None, client).await
    }

    pub async fn read_page_until(
        &self,
        request: &MarkPageRequest<C>,
        end: Option<&C>,
        client: &Client,
    ) -> Result<MarkPage<Column<C, D>>> {
        self.delegate
            .read_page_until(&ROW_KEY.to_string(), request, end, client)
            .await
    }

    pub async fn read_entries(&self, entries: &[C], client: &Client) -> Result<Vec<Column<C, D>>> {
        self.delegate
            .read_entries(entries, &ROW_KEY.to_string(), client)
            .await
    }
}

impl<C, D> ColumnFamilyHandler for AllRowsSecondaryIndex<C, D> {
    fn column_families(&self) -> Vec<ColumnFamilyDefinition> {
        self.delegate.column_families()
    }
}
