//! Mark-based paging over custom index rows

use super::common::*;
use anyhow::Result;
use proptest::prelude::*;
use std::collections::BTreeSet;
use wideindex::index::{CustomSecondaryIndex, GenericCustomSecondaryIndex};
use wideindex::keyspace::ColumnFamily;
use wideindex::{Client, MarkPageRequest, Navigation};

type Index = GenericCustomSecondaryIndex<String, i64, ()>;

const ROW: &str = "row";

async fn index_with(client: &Client, entries: &BTreeSet<i64>) -> Result<Index> {
    let index = GenericCustomSecondaryIndex::new(ColumnFamily::new("paged"));
    client.create_column_families(&index).await?;
    for entry in entries {
        index.insert(entry, None, &ROW.to_string(), client).await?;
    }
    Ok(index)
}

async fn walk(
    index: &Index,
    client: &Client,
    navigation: Navigation,
    size: usize,
) -> Result<Vec<i64>> {
    let mut seen: Vec<i64> = Vec::new();
    let mut request = Some(MarkPageRequest::new(None, navigation, size)?);
    while let Some(current) = request.take() {
        let page = index.read_page(&ROW.to_string(), &current, client).await?;
        if page.is_empty() {
            break;
        }
        let names: Vec<i64> = page.data().iter().map(|column| *column.name()).collect();
        assert!(names.len() <= size);
        assert!(names.windows(2).all(|pair| pair[0] < pair[1]));
        match navigation {
            Navigation::Next => {
                seen.extend(names);
                request = page.next_request_by_name();
            }
            Navigation::Previous => {
                let mut earlier = names;
                earlier.append(&mut seen);
                seen = earlier;
                request = page.previous_request_by_name();
            }
        }
    }
    Ok(seen)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_paging_visits_every_entry_once(
        entries in prop::collection::btree_set(-1_000i64..1_000, 0..40),
        size in 1usize..8,
    ) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let (forward, backward) = runtime.block_on(async {
            let client = new_client().await;
            let index = index_with(&client, &entries).await.unwrap();
            let forward = walk(&index, &client, Navigation::Next, size).await.unwrap();
            let backward = walk(&index, &client, Navigation::Previous, size).await.unwrap();
            (forward, backward)
        });
        let expected: Vec<i64> = entries.into_iter().collect();
        prop_assert_eq!(&forward, &expected);
        prop_assert_eq!(&backward, &expected);
    }
}

#[cfg(test)]
mod paging_tests {
    use super::*;

    #[tokio::test]
    async fn test_deleted_mark_resumes_where_it_would_sort() -> Result<()> {
        let client = new_client().await;
        let entries: BTreeSet<i64> = (1..=10).collect();
        let index = index_with(&client, &entries).await?;
        let row = ROW.to_string();

        let first = index
            .read_page(&row, &MarkPageRequest::first(4)?, &client)
            .await?;
        let request = first.next_request_by_name().expect("first page is full");
        assert_eq!(request.mark(), Some(&4));

        index.delete(&4, &row, &client).await?;
        let second = index.read_page(&row, &request, &client).await?;
        let names: Vec<i64> = second.data().iter().map(|column| *column.name()).collect();
        assert_eq!(names, vec![5, 6, 7, 8]);

        let back = MarkPageRequest::new(Some(4), Navigation::Previous, 2)?;
        let page = index.read_page(&row, &back, &client).await?;
        let names: Vec<i64> = page.data().iter().map(|column| *column.name()).collect();
        assert_eq!(names, vec![2, 3]);
        Ok(())
    }

    #[tokio::test]
    async fn test_page_bounded_by_end() -> Result<()> {
        let client = new_client().await;
        let entries: BTreeSet<i64> = (1..=10).collect();
        let index = index_with(&client, &entries).await?;
        let row = ROW.to_string();

        let page = index
            .read_page_until(&row, &MarkPageRequest::new(Some(2), Navigation::Next, 5)?, Some(&4), &client)
            .await?;
        let names: Vec<i64> = page.data().iter().map(|column| *column.name()).collect();
        assert_eq!(names, vec![3, 4]);

        let page = index
            .read_page_until(&row, &MarkPageRequest::new(Some(9), Navigation::Previous, 5)?, Some(&7), &client)
            .await?;
        let names: Vec<i64> = page.data().iter().map(|column| *column.name()).collect();
        assert_eq!(names, vec![7, 8]);
        Ok(())
    }

    #[test]
    fn test_zero_page_size_rejected() {
        assert!(MarkPageRequest::<i64>::first(0).is_err());
        assert!(MarkPageRequest::new(Some(1i64), Navigation::Previous, 0).is_err());
    }
}
