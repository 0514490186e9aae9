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

use async_trait::async_trait;
use tracing::debug;

use super::custom::{CustomSecondaryIndex, GenericCustomSecondaryIndex};
use crate::client::Client;
use crate::column::Column;
use crate::core::Result;
use crate::keyspace::{
    ColumnFamily, ColumnFamilyDefinition, ColumnFamilyHandler, ColumnType, EnumConstant,
};
use crate::paging::{MarkPage, MarkPageRequest};

const COMMENT: &str = "Custom secondary index column family that uses enumerations as indexed values";

/// Index keyed by the constants of an enumeration; one row per constant, named after it.
pub struct EnumSecondaryIndex<E, C, D> {
    delegate: GenericCustomSecondaryIndex<String, C, D>,
    _constants: std::marker::PhantomData<fn() -> E>,
}

impl<E, C, D> EnumSecondaryIndex<E, C, D>
where
    E: EnumConstant,
    C: ColumnType + Ord,
    D: ColumnType,
{
    pub fn new(family_name: impl Into<String>) -> Self {
        let family = ColumnFamily::new(family_name).with_comment(COMMENT);
        Self {
            delegate: GenericCustomSecondaryIndex::new(family),
            _constants: std::marker::PhantomData,
        }
    }

    pub fn family(&self) -> &ColumnFamily<String, C> {
        self.delegate.family()
    }
}

fn row_key<E: EnumConstant>(constant: &E) -> String {
    constant.name().to_string()
}

impl<E, C, D> ColumnFamilyHandler for EnumSecondaryIndex<E, C, D> {
    fn column_families(&self) -> Vec<ColumnFamilyDefinition> {
        self.delegate.column_families()
    }
}

#[async_trait]
impl<E, C, D> CustomSecondaryIndex<E, C, D> for EnumSecondaryIndex<E, C, D>
where
    E: EnumConstant,
    C: ColumnType + Ord,
    D: ColumnType,
{
    async fn insert(
        &self,
        entry: &C,
        denormalized: Option<&D>,
        index_key: &E,
        client: &Client,
    ) -> Result<()> {
        self.delegate
            .insert(entry, denormalized, &row_key(index_key), client)
            .await
    }

    async fn delete(&self, entry: &C, index_key: &E, client: &Client) -> Result<()> {
        self.delegate.delete(entry, &row_key(index_key), client).await
    }

    async fn delete_row(&self, index_key: &E, client: &Client) -> Result<()> {
        self.delegate.delete_row(&row_key(index_key), client).await
    }

    /// Deletes the row of every constant.
    async fn clear(&self, client: &Client) -> Result<()> {
        debug!(
            "Clearing {} rows of enum index {}",
            E::constants().len(),
            self.delegate.family().name()
        );
        for constant in E::constants() {
            self.delete_row(constant, client).await?;
        }
        Ok(())
    }

    async fn count(&self, index_key: &E, client: &Client) -> Result<usize> {
        self.delegate.count(&row_key(index_key), client).await
    }

    async fn read(&self, index_key: &E, client: &Client) -> Result<Vec<Column<C, D>>> {
        self.delegate.read(&row_key(index_key), client).await
    }

    async fn read_page_until(
        &self,
        index_key: &E,
        request: &MarkPageRequest<C>,
        end: Option<&C>,
        client: &Client,
    ) -> Result<MarkPage<Column<C, D>>> {
        self.delegate
            .read_page_until(&row_key(index_key), request, end, client)
            .await
    }

    async fn read_entries(
        &self,
        entries: &[C],
        index_key: &E,
        client: &Client,
    ) -> Result<Vec<Column<C, D>>> {
        self.delegate
            .read_entries(entries, &row_key(index_key), client)
            .await
    }
}
