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

//! Secondary index over string values supporting exact, prefix and suffix queries.
//!
//! Every entry is written twice: once under the shard of its string and once, with the
//! string reversed, under the shard of the reversed string. Suffix queries become prefix
//! queries over the reversed rows.

use tracing::debug;

use super::custom::{CustomSecondaryIndex, GenericCustomSecondaryIndex};
use super::shard::{ShardStrategy, StringShardStrategy};
use crate::client::Client;
use crate::column::Column;
use crate::core::{Result, WideIndexError};
use crate::keyspace::{
    ColumnFamily, ColumnFamilyDefinition, ColumnFamilyHandler, ColumnType, RangeLimit,
    STRING_RANGE_END,
};
use crate::paging::{MarkPage, MarkPageRequest, Navigation};

pub const DEFAULT_SCAN_PAGE_SIZE: usize = 10_000;

const COMMENT: &str = "Custom secondary index column family that uses strings as indexed values.";

/// Column name of a string index: an indexed string plus the key of the indexed row.
///
/// Entries must sort by indexed string first, so all entries of one string are contiguous.
pub trait StringIndexEntry<I>: ColumnType + Ord {
    fn row_key(&self) -> &I;

    fn indexed_string_value(&self) -> &str;
}

impl<I: ColumnType + Ord> StringIndexEntry<I> for (String, I) {
    fn row_key(&self) -> &I {
        &self.1
    }

    fn indexed_string_value(&self) -> &str {
        &self.0
    }
}

/// Builds entries used as range bounds.
pub trait StringIndexEntryFactory<I, C>: Send + Sync {
    fn create(&self, indexed_string_value: &str, row_key: &I) -> C;
}

impl<I, C, F> StringIndexEntryFactory<I, C> for F
where
    F: Fn(&str, &I) -> C + Send + Sync,
{
    fn create(&self, indexed_string_value: &str, row_key: &I) -> C {
        self(indexed_string_value, row_key)
    }
}

/// Copies an entry replacing its indexed string.
pub trait IndexEntryMutator<C>: Send + Sync {
    fn mutate(&self, entry: &C, indexed_string_value: &str) -> C;
}

impl<C, F> IndexEntryMutator<C> for F
where
    F: Fn(&C, &str) -> C + Send + Sync,
{
    fn mutate(&self, entry: &C, indexed_string_value: &str) -> C {
        self(entry, indexed_string_value)
    }
}

fn reverse(value: &str) -> String {
    value.chars().rev().collect()
}

/// Match performed by a string index query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StringQuery {
    Equals(String),
    StartsWith(String),
    EndsWith(String),
}

/// Row and entry bounds of one query.
#[derive(Clone)]
struct Bounds<C> {
    row_key: String,
    start: C,
    end: C,
}

pub struct StringSecondaryIndex<I, C, D> {
    delegate: GenericCustomSecondaryIndex<String, C, D>,
    range_limit: RangeLimit<I>,
    factory: Box<dyn StringIndexEntryFactory<I, C>>,
    mutator: Box<dyn IndexEntryMutator<C>>,
    shard_strategy: StringShardStrategy,
    reversed_shard_strategy: StringShardStrategy,
    scan_page_size: usize,
}

impl<I, D> StringSecondaryIndex<I, (String, I), D>
where
    I: ColumnType + Ord,
    D: ColumnType,
{
    /// Index whose entries are `(indexed string, row key)` pairs.
    pub fn with_pairs(family_name: impl Into<String>, range_limit: RangeLimit<I>) -> Self {
        Self::new(
            family_name,
            range_limit,
            |value: &str, row_key: &I| (value.to_string(), row_key.clone()),
            |entry: &(String, I), value: &str| (value.to_string(), entry.1.clone()),
        )
    }
}

impl<I, C, D> StringSecondaryIndex<I, C, D>
where
    I: Send + Sync + 'static,
    C: StringIndexEntry<I>,
    D: ColumnType,
{
    pub fn new(
        family_name: impl Into<String>,
        range_limit: RangeLimit<I>,
        factory: impl StringIndexEntryFactory<I, C> + 'static,
        mutator: impl IndexEntryMutator<C> + 'static,
    ) -> Self {
        let family = ColumnFamily::new(family_name).with_comment(COMMENT);
        Self {
            delegate: GenericCustomSecondaryIndex::new(family),
            range_limit,
            factory: Box::new(factory),
            mutator: Box::new(mutator),
            shard_strategy: StringShardStrategy::new("strings"),
            reversed_shard_strategy: StringShardStrategy::new("reversed_strings"),
            scan_page_size: DEFAULT_SCAN_PAGE_SIZE,
        }
    }

    /// Page size used when scanning a value's entries to filter them.
    pub fn with_scan_page_size(mut self, scan_page_size: usize) -> Self {
        self.scan_page_size = scan_page_size.max(1);
        self
    }

    pub fn family(&self) -> &ColumnFamily<String, C> {
        self.delegate.family()
    }

    pub async fn insert(&self, entry: &C, denormalized: Option<&D>, client: &Client) -> Result<()> {
        let (row_key, reversed_entry, reversed_row_key) = self.locate(entry)?;
        self.delegate
            .insert(entry, denormalized, &row_key, client)
            .await?;
        self.delegate
            .insert(&reversed_entry, denormalized, &reversed_row_key, client)
            .await
    }

    pub async fn delete(&self, entry: &C, client: &Client) -> Result<()> {
        let (row_key, reversed_entry, reversed_row_key) = self.locate(entry)?;
        self.delegate.delete(entry, &row_key, client).await?;
        self.delegate
            .delete(&reversed_entry, &reversed_row_key, client)
            .await
    }

    pub async fn clear(&self, client: &Client) -> Result<()> {
        self.delegate.clear(client).await
    }

    pub async fn count(&self, value: &str, client: &Client) -> Result<usize> {
        self.count_in(self.exact(value)?, client).await
    }

    pub async fn read(&self, value: &str, client: &Client) -> Result<Vec<Column<C, D>>> {
        self.read_in(self.exact(value)?, client).await
    }

    /// Page of the entries indexing exactly `value`.
    pub async fn read_page(
        &self,
        value: &str,
        request: &MarkPageRequest<C>,
        client: &Client,
    ) -> Result<MarkPage<Column<C, D>>> {
        let query = StringQuery::Equals(value.to_string());
        self.read_matching_page(&query, request, None, client).await
    }

    /// The subset of `entries` indexing exactly `value`.
    pub async fn read_entries(
        &self,
        value: &str,
        entries: &[C],
        client: &Client,
    ) -> Result<Vec<Column<C, D>>> {
        self.entries_in(self.exact(value)?, entries, client).await
    }

    pub async fn count_starts_with(&self, prefix: &str, client: &Client) -> Result<usize> {
        self.count_in(self.prefixed(prefix, false)?, client).await
    }

    pub async fn read_starts_with(&self, prefix: &str, client: &Client) -> Result<Vec<Column<C, D>>> {
        self.read_in(self.prefixed(prefix, false)?, client).await
    }

    pub async fn read_starts_with_page(
        &self,
        prefix: &str,
        request: &MarkPageRequest<C>,
        client: &Client,
    ) -> Result<MarkPage<Column<C, D>>> {
        let query = StringQuery::StartsWith(prefix.to_string());
        self.read_matching_page(&query, request, None, client).await
    }

    pub async fn read_starts_with_entries(
        &self,
        prefix: &str,
        entries: &[C],
        client: &Client,
    ) -> Result<Vec<Column<C, D>>> {
        self.entries_in(self.prefixed(prefix, false)?, entries, client)
            .await
    }

    pub async fn count_ends_with(&self, suffix: &str, client: &Client) -> Result<usize> {
        self.count_in(self.prefixed(&reverse(suffix), true)?, client)
            .await
    }

    pub async fn read_ends_with(&self, suffix: &str, client: &Client) -> Result<Vec<Column<C, D>>> {
        let reversed = self
            .read_in(self.prefixed(&reverse(suffix), true)?, client)
            .await?;
        Ok(self.restore_all(reversed))
    }

    /// Marks and returned entries carry the original, not reversed, strings.
    pub async fn read_ends_with_page(
        &self,
        suffix: &str,
        request: &MarkPageRequest<C>,
        client: &Client,
    ) -> Result<MarkPage<Column<C, D>>> {
        let query = StringQuery::EndsWith(suffix.to_string());
        self.read_matching_page(&query, request, None, client).await
    }

    pub async fn read_ends_with_entries(
        &self,
        suffix: &str,
        entries: &[C],
        client: &Client,
    ) -> Result<Vec<Column<C, D>>> {
        let reversed_entries: Vec<C> = entries.iter().map(|entry| self.reversed(entry)).collect();
        let found = self
            .entries_in(self.prefixed(&reverse(suffix), true)?, &reversed_entries, client)
            .await?;
        Ok(self.restore_all(found))
    }

    pub async fn count_matching(&self, query: &StringQuery, client: &Client) -> Result<usize> {
        match query {
            StringQuery::Equals(value) => self.count(value, client).await,
            StringQuery::StartsWith(prefix) => self.count_starts_with(prefix, client).await,
            StringQuery::EndsWith(suffix) => self.count_ends_with(suffix, client).await,
        }
    }

    pub async fn read_matching(
        &self,
        query: &StringQuery,
        client: &Client,
    ) -> Result<Vec<Column<C, D>>> {
        match query {
            StringQuery::Equals(value) => self.read(value, client).await,
            StringQuery::StartsWith(prefix) => self.read_starts_with(prefix, client).await,
            StringQuery::EndsWith(suffix) => self.read_ends_with(suffix, client).await,
        }
    }

    pub async fn read_matching_entries(
        &self,
        query: &StringQuery,
        entries: &[C],
        client: &Client,
    ) -> Result<Vec<Column<C, D>>> {
        match query {
            StringQuery::Equals(value) => self.read_entries(value, entries, client).await,
            StringQuery::StartsWith(prefix) => {
                self.read_starts_with_entries(prefix, entries, client).await
            }
            StringQuery::EndsWith(suffix) => {
                self.read_ends_with_entries(suffix, entries, client).await
            }
        }
    }

    /// Page of the entries matching `query`, optionally bounded by `end`.
    ///
    /// A mark not matching the query is rejected. Suffix queries iterate in the order of the
    /// reversed strings; `end` is interpreted in that order too.
    pub async fn read_matching_page(
        &self,
        query: &StringQuery,
        request: &MarkPageRequest<C>,
        end: Option<&C>,
        client: &Client,
    ) -> Result<MarkPage<Column<C, D>>> {
        if let Some(mark) = request.mark() {
            let indexed = mark.indexed_string_value();
            let matches = match query {
                StringQuery::Equals(value) => indexed == value,
                StringQuery::StartsWith(prefix) => indexed.starts_with(prefix.as_str()),
                StringQuery::EndsWith(suffix) => indexed.ends_with(suffix.as_str()),
            };
            if !matches {
                return Err(WideIndexError::invalid_argument(format!(
                    "page mark indexes {:?}, which does not match {:?}",
                    indexed, query
                )));
            }
        }
        match query {
            StringQuery::Equals(value) => {
                self.page_in(self.exact(value)?, request, end, client).await
            }
            StringQuery::StartsWith(prefix) => {
                self.page_in(self.prefixed(prefix, false)?, request, end, client)
                    .await
            }
            StringQuery::EndsWith(suffix) => {
                let reversed_request = request.convert(|mark| self.reversed(mark));
                let reversed_end = end.map(|end| self.reversed(end));
                let page = self
                    .page_in(
                        self.prefixed(&reverse(suffix), true)?,
                        &reversed_request,
                        reversed_end.as_ref(),
                        client,
                    )
                    .await?;
                Ok(page.map(|column| column.map_name(|entry| self.reversed(&entry))))
            }
        }
    }

    fn locate(&self, entry: &C) -> Result<(String, C, String)> {
        let value = entry.indexed_string_value();
        let reversed_value = reverse(value);
        let row_key = self.shard_strategy.shard(value)?;
        let reversed_row_key = self.reversed_shard_strategy.shard(reversed_value.as_str())?;
        Ok((
            row_key,
            self.mutator.mutate(entry, &reversed_value),
            reversed_row_key,
        ))
    }

    fn reversed(&self, entry: &C) -> C {
        self.mutator
            .mutate(entry, &reverse(entry.indexed_string_value()))
    }

    fn restore_all(&self, columns: Vec<Column<C, D>>) -> Vec<Column<C, D>> {
        columns
            .into_iter()
            .map(|column| column.map_name(|entry| self.reversed(&entry)))
            .collect()
    }

    fn exact(&self, value: &str) -> Result<Bounds<C>> {
        Ok(Bounds {
            row_key: self.shard_strategy.shard(value)?,
            start: self.factory.create(value, self.range_limit.start()),
            end: self.factory.create(value, self.range_limit.end()),
        })
    }

    /// Bounds of every string starting with `prefix`, in the normal or the reversed rows.
    fn prefixed(&self, prefix: &str, reversed: bool) -> Result<Bounds<C>> {
        let strategy = if reversed {
            &self.reversed_shard_strategy
        } else {
            &self.shard_strategy
        };
        let upper = format!("{}{}", prefix, STRING_RANGE_END);
        Ok(Bounds {
            row_key: strategy.shard(prefix)?,
            start: self.factory.create(prefix, self.range_limit.start()),
            end: self.factory.create(&upper, self.range_limit.end()),
        })
    }

    async fn count_in(&self, bounds: Bounds<C>, client: &Client) -> Result<usize> {
        self.delegate
            .count_range(&bounds.row_key, Some(&bounds.start), Some(&bounds.end), client)
            .await
    }

    async fn read_in(&self, bounds: Bounds<C>, client: &Client) -> Result<Vec<Column<C, D>>> {
        self.delegate
            .read_range(&bounds.row_key, Some(&bounds.start), Some(&bounds.end), client)
            .await
    }

    /// Pages inside `bounds`, narrowed by `limit` when given. Without a mark, NEXT starts at
    /// the low bound and PREVIOUS at the high one.
    async fn page_in(
        &self,
        bounds: Bounds<C>,
        request: &MarkPageRequest<C>,
        limit: Option<&C>,
        client: &Client,
    ) -> Result<MarkPage<Column<C, D>>> {
        let Bounds {
            row_key,
            start,
            end,
        } = bounds;
        let (from, until) = match (request.navigation(), limit) {
            (Navigation::Next, Some(limit)) => (start, end.min(limit.clone())),
            (Navigation::Next, None) => (start, end),
            (Navigation::Previous, Some(limit)) => (end, start.max(limit.clone())),
            (Navigation::Previous, None) => (end, start),
        };
        let bounded = match request.mark() {
            Some(mark) => MarkPageRequest::new(Some(mark.clone()), request.navigation(), request.size())?,
            None => MarkPageRequest::new(Some(from), request.navigation(), request.size())?,
        };
        let page = self
            .delegate
            .read_page_until(&row_key, &bounded, Some(&until), client)
            .await?;
        if request.mark().is_some() {
            return Ok(page);
        }
        let reference = request.convert(|entry| Column::marker(entry.clone()));
        Ok(MarkPage::new(reference, page.into_data()))
    }

    /// Scans `bounds` page by page keeping the entries listed in `entries`.
    async fn entries_in(
        &self,
        bounds: Bounds<C>,
        entries: &[C],
        client: &Client,
    ) -> Result<Vec<Column<C, D>>> {
        if entries.is_empty() {
            return Ok(Vec::new());
        }
        let mut request = MarkPageRequest::first(self.scan_page_size)?;
        let mut found = Vec::new();
        let mut pages = 0usize;
        loop {
            let page = self
                .page_in(bounds.clone(), &request, None, client)
                .await?;
            pages += 1;
            let next = match page.next_request_by_name() {
                Some(next) => next,
                None => break,
            };
            found.extend(
                page.into_data()
                    .into_iter()
                    .filter(|column| entries.contains(column.name())),
            );
            request = next;
        }
        debug!(
            "Filtered {} of {} requested entries in row {} over {} pages",
            found.len(),
            entries.len(),
            bounds.row_key,
            pages
        );
        Ok(found)
    }
}

impl<I, C, D> ColumnFamilyHandler for StringSecondaryIndex<I, C, D> {
    fn column_families(&self) -> Vec<ColumnFamilyDefinition> {
        self.delegate.column_families()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MemoryStore;
    use crate::keyspace::KeyspaceDefinition;
    use std::sync::Arc;

    type NameIndex = StringSecondaryIndex<i64, (String, i64), ()>;

    async fn setup() -> (Client, NameIndex) {
        let client = Client::new(Arc::new(MemoryStore::new()), KeyspaceDefinition::new("test"));
        client.create_keyspace().await.unwrap();
        let index = NameIndex::with_pairs("users_by_name", RangeLimit::long()).with_scan_page_size(2);
        client.create_column_families(&index).await.unwrap();

        let names = [
            (1, "Hello"),
            (2, "Hello"),
            (3, "Help"),
            (4, "World"),
            (5, "Yellow"),
            (6, "hello"),
            (7, "Hello"),
        ];
        for (id, name) in names {
            index
                .insert(&(name.to_string(), id), None, &client)
                .await
                .unwrap();
        }
        (client, index)
    }

    fn ids<D>(columns: &[Column<(String, i64), D>]) -> Vec<i64> {
        columns.iter().map(|column| column.name().1).collect()
    }

    #[tokio::test]
    async fn test_exact_match() {
        let (client, index) = setup().await;
        assert_eq!(index.count("Hello", &client).await.unwrap(), 3);
        assert_eq!(ids(&index.read("Hello", &client).await.unwrap()), vec![1, 2, 7]);
        assert_eq!(ids(&index.read("hello", &client).await.unwrap()), vec![6]);
        assert!(index.read("Hell", &client).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_starts_with() {
        let (client, index) = setup().await;
        assert_eq!(index.count_starts_with("Hel", &client).await.unwrap(), 4);
        let found = index.read_starts_with("Hel", &client).await.unwrap();
        let names: Vec<&str> = found.iter().map(|c| c.name().0.as_str()).collect();
        assert_eq!(names, vec!["Hello", "Hello", "Hello", "Help"]);
    }

    #[tokio::test]
    async fn test_ends_with_restores_names() {
        let (client, index) = setup().await;
        assert_eq!(index.count_ends_with("llo", &client).await.unwrap(), 4);
        let found = index.read_ends_with("llo", &client).await.unwrap();
        let mut names: Vec<String> = found.iter().map(|c| c.name().0.clone()).collect();
        names.sort();
        assert_eq!(names, vec!["Hello", "Hello", "Hello", "hello"]);

        let yellow = index.read_ends_with("ow", &client).await.unwrap();
        let names: Vec<&str> = yellow.iter().map(|c| c.name().0.as_str()).collect();
        assert_eq!(names, vec!["Yellow"]);
    }

    #[tokio::test]
    async fn test_integer_row_keys_at_the_limits() {
        let client = Client::new(Arc::new(MemoryStore::new()), KeyspaceDefinition::new("test"));
        client.create_keyspace().await.unwrap();
        let index: StringSecondaryIndex<i32, (String, i32), ()> =
            StringSecondaryIndex::with_pairs("codes_by_name", RangeLimit::integer());
        client.create_column_families(&index).await.unwrap();
        for id in [i32::MIN, 0, i32::MAX] {
            index.insert(&("Tag".to_string(), id), None, &client).await.unwrap();
        }

        let found = index.read("Tag", &client).await.unwrap();
        let ids: Vec<i32> = found.iter().map(|column| column.name().1).collect();
        assert_eq!(ids, vec![i32::MIN, 0, i32::MAX]);
        assert_eq!(index.count_starts_with("Ta", &client).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_delete_removes_both_rows() {
        let (client, index) = setup().await;
        index.delete(&("Help".to_string(), 3), &client).await.unwrap();
        assert_eq!(index.count_starts_with("Hel", &client).await.unwrap(), 3);
        assert_eq!(index.count_ends_with("elp", &client).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_paging_exact_match() {
        let (client, index) = setup().await;
        let first = index
            .read_page("Hello", &MarkPageRequest::first(2).unwrap(), &client)
            .await
            .unwrap();
        assert_eq!(ids(first.data()), vec![1, 2]);
        assert!(first.request().mark().is_none());

        let next = first.next_request_by_name().unwrap();
        let second = index.read_page("Hello", &next, &client).await.unwrap();
        assert_eq!(ids(second.data()), vec![7]);

        let last = MarkPageRequest::new(None, Navigation::Previous, 2).unwrap();
        let page = index.read_page("Hello", &last, &client).await.unwrap();
        assert_eq!(ids(page.data()), vec![2, 7]);
    }

    #[tokio::test]
    async fn test_page_mark_must_match_query() {
        let (client, index) = setup().await;
        let request =
            MarkPageRequest::new(Some(("World".to_string(), 4)), Navigation::Next, 2).unwrap();
        let error = index.read_page("Hello", &request, &client).await.unwrap_err();
        assert!(matches!(error, WideIndexError::InvalidArgument(_)));

        let error = index
            .read_starts_with_page("Hel", &request, &client)
            .await
            .unwrap_err();
        assert!(matches!(error, WideIndexError::InvalidArgument(_)));

        let error = index
            .read_ends_with_page("llo", &request, &client)
            .await
            .unwrap_err();
        assert!(matches!(error, WideIndexError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_ends_with_paging_walks_every_entry() {
        let (client, index) = setup().await;
        let mut request = MarkPageRequest::first(1).unwrap();
        let mut seen = Vec::new();
        loop {
            let page = index
                .read_ends_with_page("llo", &request, &client)
                .await
                .unwrap();
            if page.is_empty() {
                break;
            }
            for column in page.data() {
                assert!(column.name().0.ends_with("llo"));
                seen.push(column.name().1);
            }
            request = page.next_request_by_name().unwrap();
        }
        seen.sort();
        assert_eq!(seen, vec![1, 2, 6, 7]);
    }

    #[tokio::test]
    async fn test_entry_filters_scan_every_page() {
        let (client, index) = setup().await;
        let wanted = vec![
            ("Hello".to_string(), 7),
            ("Hello".to_string(), 9),
            ("Help".to_string(), 3),
        ];
        assert_eq!(ids(&index.read_entries("Hello", &wanted, &client).await.unwrap()), vec![7]);
        assert_eq!(
            ids(&index.read_starts_with_entries("He", &wanted, &client).await.unwrap()),
            vec![7, 3]
        );
        let by_suffix = index
            .read_ends_with_entries("lp", &wanted, &client)
            .await
            .unwrap();
        assert_eq!(by_suffix.len(), 1);
        assert_eq!(by_suffix[0].name(), &("Help".to_string(), 3));
    }

    #[tokio::test]
    async fn test_empty_value_rejected() {
        let (client, index) = setup().await;
        let error = index.count("", &client).await.unwrap_err();
        assert!(matches!(error, WideIndexError::InvalidArgument(_)));
    }

    #[test]
    fn test_family_comment() {
        let index = NameIndex::with_pairs("idx", RangeLimit::long());
        assert_eq!(index.family().comment(), Some(COMMENT));
    }
}
