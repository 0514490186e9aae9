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

//! Combining several custom index queries.
//!
//! Each query is wrapped in a [`SecondaryIndexReader`] bound to its index key; the
//! integrator then computes the intersection (AND) or union (OR) of their entries. All
//! readers must share the same entry type and sort order.

use async_trait::async_trait;
use futures::future::try_join_all;
use std::collections::BTreeSet;
use tracing::{debug, warn};

use super::all_rows::AllRowsSecondaryIndex;
use super::custom::CustomSecondaryIndex;
use super::string_index::{StringIndexEntry, StringQuery, StringSecondaryIndex};
use crate::client::Client;
use crate::core::{PagingConfig, Result, SchemaError};
use crate::keyspace::{ColumnType, DataType};
use crate::paging::{MarkPage, MarkPageRequest, Navigation};

/// One index query as seen by the integrator: entry names only, no denormalized data.
#[async_trait]
pub trait SecondaryIndexReader<C>: Send + Sync {
    /// Sort order of the entries.
    fn comparator(&self) -> DataType;

    async fn count(&self) -> Result<usize>;

    async fn read(&self) -> Result<Vec<C>>;

    /// The subset of `entries` matched by this query.
    async fn read_entries(&self, entries: &[C]) -> Result<Vec<C>>;

    async fn read_page(&self, request: &MarkPageRequest<C>, end: Option<&C>) -> Result<MarkPage<C>>;
}

/// Reader over one key of a [`CustomSecondaryIndex`].
pub struct CustomIndexReader<'a, K, C, D>
where
    K: ColumnType,
    C: ColumnType + Ord,
    D: ColumnType,
{
    index: &'a dyn CustomSecondaryIndex<K, C, D>,
    index_key: K,
    client: &'a Client,
}

impl<'a, K, C, D> CustomIndexReader<'a, K, C, D>
where
    K: ColumnType,
    C: ColumnType + Ord,
    D: ColumnType,
{
    pub fn new(index: &'a dyn CustomSecondaryIndex<K, C, D>, index_key: K, client: &'a Client) -> Self {
        Self {
            index,
            index_key,
            client,
        }
    }
}

#[async_trait]
impl<'a, K, C, D> SecondaryIndexReader<C> for CustomIndexReader<'a, K, C, D>
where
    K: ColumnType,
    C: ColumnType + Ord,
    D: ColumnType,
{
    fn comparator(&self) -> DataType {
        C::data_type()
    }

    async fn count(&self) -> Result<usize> {
        self.index.count(&self.index_key, self.client).await
    }

    async fn read(&self) -> Result<Vec<C>> {
        let columns = self.index.read(&self.index_key, self.client).await?;
        Ok(columns.into_iter().map(|column| column.into_name()).collect())
    }

    async fn read_entries(&self, entries: &[C]) -> Result<Vec<C>> {
        let columns = self
            .index
            .read_entries(entries, &self.index_key, self.client)
            .await?;
        Ok(columns.into_iter().map(|column| column.into_name()).collect())
    }

    async fn read_page(&self, request: &MarkPageRequest<C>, end: Option<&C>) -> Result<MarkPage<C>> {
        let page = self
            .index
            .read_page_until(&self.index_key, request, end, self.client)
            .await?;
        Ok(page.map(|column| column.into_name()))
    }
}

/// Reader over one query of a [`StringSecondaryIndex`].
pub struct StringIndexReader<'a, I, C, D> {
    index: &'a StringSecondaryIndex<I, C, D>,
    query: StringQuery,
    client: &'a Client,
}

impl<'a, I, C, D> StringIndexReader<'a, I, C, D> {
    pub fn new(index: &'a StringSecondaryIndex<I, C, D>, query: StringQuery, client: &'a Client) -> Self {
        Self {
            index,
            query,
            client,
        }
    }
}

#[async_trait]
impl<'a, I, C, D> SecondaryIndexReader<C> for StringIndexReader<'a, I, C, D>
where
    I: Send + Sync + 'static,
    C: StringIndexEntry<I>,
    D: ColumnType,
{
    fn comparator(&self) -> DataType {
        C::data_type()
    }

    async fn count(&self) -> Result<usize> {
        self.index.count_matching(&self.query, self.client).await
    }

    async fn read(&self) -> Result<Vec<C>> {
        let columns = self.index.read_matching(&self.query, self.client).await?;
        Ok(columns.into_iter().map(|column| column.into_name()).collect())
    }

    async fn read_entries(&self, entries: &[C]) -> Result<Vec<C>> {
        let columns = self
            .index
            .read_matching_entries(&self.query, entries, self.client)
            .await?;
        Ok(columns.into_iter().map(|column| column.into_name()).collect())
    }

    async fn read_page(&self, request: &MarkPageRequest<C>, end: Option<&C>) -> Result<MarkPage<C>> {
        let page = self
            .index
            .read_matching_page(&self.query, request, end, self.client)
            .await?;
        Ok(page.map(|column| column.into_name()))
    }
}

/// Reader over an [`AllRowsSecondaryIndex`]; matches every row.
pub struct AllRowsIndexReader<'a, C, D> {
    index: &'a AllRowsSecondaryIndex<C, D>,
    client: &'a Client,
}

impl<'a, C, D> AllRowsIndexReader<'a, C, D> {
    pub fn new(index: &'a AllRowsSecondaryIndex<C, D>, client: &'a Client) -> Self {
        Self { index, client }
    }
}

#[async_trait]
impl<'a, C, D> SecondaryIndexReader<C> for AllRowsIndexReader<'a, C, D>
where
    C: ColumnType + Ord,
    D: ColumnType,
{
    fn comparator(&self) -> DataType {
        C::data_type()
    }

    async fn count(&self) -> Result<usize> {
        self.index.count(self.client).await
    }

    async fn read(&self) -> Result<Vec<C>> {
        let columns = self.index.read(self.client).await?;
        Ok(columns.into_iter().map(|column| column.into_name()).collect())
    }

    async fn read_entries(&self, entries: &[C]) -> Result<Vec<C>> {
        let columns = self.index.read_entries(entries, self.client).await?;
        Ok(columns.into_iter().map(|column| column.into_name()).collect())
    }

    async fn read_page(&self, request: &MarkPageRequest<C>, end: Option<&C>) -> Result<MarkPage<C>> {
        let page = self.index.read_page_until(request, end, self.client).await?;
        Ok(page.map(|column| column.into_name()))
    }
}

/// Intersection and union of index queries.
#[derive(Debug, Clone, Default)]
pub struct SecondaryIndexIntegrator {
    paging: PagingConfig,
}

impl SecondaryIndexIntegrator {
    pub fn new(paging: PagingConfig) -> Self {
        Self { paging }
    }

    /// Entries matched by every reader, ascending.
    ///
    /// The reader with the fewest entries is read in full; the others are only probed for
    /// those entries.
    pub async fn intersect<C: Ord + Clone + Send + Sync>(
        &self,
        readers: &[&dyn SecondaryIndexReader<C>],
    ) -> Result<Vec<C>> {
        check_comparators(readers)?;
        let base = match smallest(readers).await? {
            Some(base) => base,
            None => return Ok(Vec::new()),
        };
        let candidates = readers[base].read().await?;
        let mut result = apply_intersection(readers, base, candidates).await?;
        result.sort();
        result.dedup();
        Ok(result)
    }

    /// One page of the intersection.
    ///
    /// The base reader is paged with pages larger than requested, since intersecting
    /// shrinks them, until the page is full or the base reader is exhausted. With
    /// `max_intersect_rounds` set, a page holding at least one entry may come back short;
    /// paging on from it resumes the scan. The returned page is ascending and carries
    /// `request` as its request.
    pub async fn intersect_page<C: Ord + Clone + Send + Sync>(
        &self,
        readers: &[&dyn SecondaryIndexReader<C>],
        request: &MarkPageRequest<C>,
    ) -> Result<MarkPage<C>> {
        check_comparators(readers)?;
        let base = match smallest(readers).await? {
            Some(base) => base,
            None => return Ok(MarkPage::new(request.clone(), Vec::new())),
        };

        let size = request.size();
        let navigation = request.navigation();
        let factor = self.paging.intersect_overfetch_factor.max(1);
        let mut base_request = Some(request.with_size(size.saturating_mul(factor)));
        let mut result: Vec<C> = Vec::new();
        let mut rounds = 0usize;

        while let Some(current) = base_request.take() {
            if result.len() >= size {
                break;
            }
            // An empty page has no mark to continue from, so the cap only cuts a page short.
            if let Some(max_rounds) = self.paging.max_intersect_rounds {
                if rounds >= max_rounds && !result.is_empty() {
                    warn!(
                        "Paged intersection stopped after {} rounds with {} of {} entries",
                        rounds,
                        result.len(),
                        size
                    );
                    break;
                }
            }
            rounds += 1;

            let page = readers[base].read_page(&current, None).await?;
            if page.is_empty() {
                break;
            }
            base_request = match navigation {
                Navigation::Next => page.next_page_request(),
                Navigation::Previous => page.previous_page_request(),
            };
            let matched = apply_intersection(readers, base, page.into_data()).await?;
            match navigation {
                Navigation::Next => result.extend(matched),
                Navigation::Previous => {
                    let mut earlier = matched;
                    earlier.append(&mut result);
                    result = earlier;
                }
            }
        }

        if result.len() > size {
            match navigation {
                Navigation::Next => result.truncate(size),
                Navigation::Previous => {
                    result.drain(..result.len() - size);
                }
            }
        }
        debug!(
            "Paged intersection of {} indexes returned {} entries in {} rounds",
            readers.len(),
            result.len(),
            rounds
        );
        Ok(MarkPage::new(request.clone(), result))
    }

    /// Entries matched by any reader, ascending and without duplicates.
    pub async fn merge<C: Ord + Clone + Send + Sync>(
        &self,
        readers: &[&dyn SecondaryIndexReader<C>],
    ) -> Result<Vec<C>> {
        check_comparators(readers)?;
        let mut merged = BTreeSet::new();
        for reader in readers {
            merged.extend(reader.read().await?);
        }
        Ok(merged.into_iter().collect())
    }
}

fn check_comparators<C>(readers: &[&dyn SecondaryIndexReader<C>]) -> Result<()> {
    let mut comparators = readers.iter().map(|reader| reader.comparator());
    if let Some(expected) = comparators.next() {
        for found in comparators {
            if found != expected {
                return Err(SchemaError::IncompatibleIndexes {
                    expected: expected.to_string(),
                    found: found.to_string(),
                }
                .into());
            }
        }
    }
    Ok(())
}

/// Position of the reader with the fewest entries; `None` when there are no readers or any
/// of them is empty, in which case the intersection is empty.
async fn smallest<C>(readers: &[&dyn SecondaryIndexReader<C>]) -> Result<Option<usize>> {
    let counts = try_join_all(readers.iter().map(|reader| reader.count())).await?;
    if counts.contains(&0) {
        return Ok(None);
    }
    Ok(counts
        .iter()
        .enumerate()
        .min_by_key(|(_, count)| **count)
        .map(|(position, _)| position))
}

/// Keeps the candidates matched by every reader but the base, in candidate order.
async fn apply_intersection<C: Ord + Clone + Send + Sync>(
    readers: &[&dyn SecondaryIndexReader<C>],
    base: usize,
    mut candidates: Vec<C>,
) -> Result<Vec<C>> {
    for (position, reader) in readers.iter().enumerate() {
        if candidates.is_empty() {
            break;
        }
        if position == base {
            continue;
        }
        let matched: BTreeSet<C> = reader.read_entries(&candidates).await?.into_iter().collect();
        candidates.retain(|candidate| matched.contains(candidate));
    }
    Ok(candidates)
}
