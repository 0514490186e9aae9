//! Intersections and unions of index queries over real index families

use super::common::*;
use anyhow::Result;
use wideindex::core::PagingConfig;
use wideindex::index::{
    AllRowsIndexReader, AllRowsSecondaryIndex, CustomIndexReader, CustomSecondaryIndex,
    EnumSecondaryIndex, GenericCustomSecondaryIndex, SecondaryIndexIntegrator,
    SecondaryIndexReader, StringIndexReader, StringQuery, StringSecondaryIndex,
};
use wideindex::keyspace::{ColumnFamily, RangeLimit};
use wideindex::{Client, MarkPageRequest, Navigation};

const USERS: i64 = 30;
const NAMES: [&str; 5] = ["Ana", "Andreia", "Eva", "Ariana", "Rui"];

struct Indexes {
    by_city: GenericCustomSecondaryIndex<String, i64, ()>,
    by_status: EnumSecondaryIndex<Status, i64, ()>,
    by_name: StringSecondaryIndex<i64, (String, i64), ()>,
    all: AllRowsSecondaryIndex<i64, ()>,
}

fn name_of(id: i64) -> &'static str {
    NAMES[(id % 5) as usize]
}

async fn populate(client: &Client) -> Result<Indexes> {
    let indexes = Indexes {
        by_city: GenericCustomSecondaryIndex::new(ColumnFamily::new("users_by_city")),
        by_status: EnumSecondaryIndex::new("users_by_status"),
        by_name: StringSecondaryIndex::with_pairs("users_by_name", RangeLimit::long())
            .with_scan_page_size(4),
        all: AllRowsSecondaryIndex::new("all_users"),
    };
    client.create_column_families(&indexes.by_city).await?;
    client.create_column_families(&indexes.by_status).await?;
    client.create_column_families(&indexes.by_name).await?;
    client.create_column_families(&indexes.all).await?;

    for id in 1..=USERS {
        indexes
            .by_city
            .insert(&id, None, &city_of(id).to_string(), client)
            .await?;
        indexes.by_status.insert(&id, None, &status_of(id), client).await?;
        indexes
            .by_name
            .insert(&(name_of(id).to_string(), id), None, client)
            .await?;
        indexes.all.insert(&id, None, client).await?;
    }
    Ok(indexes)
}

fn expected(filter: impl Fn(i64) -> bool) -> Vec<i64> {
    (1..=USERS).filter(|id| filter(*id)).collect()
}

#[cfg(test)]
mod integrator_tests {
    use super::*;

    #[tokio::test]
    async fn test_intersect_city_and_status() -> Result<()> {
        let client = new_client().await;
        let indexes = populate(&client).await?;

        let lisbon = CustomIndexReader::new(&indexes.by_city, "Lisbon".to_string(), &client);
        let active = CustomIndexReader::new(&indexes.by_status, Status::Active, &client);
        let everyone = AllRowsIndexReader::new(&indexes.all, &client);
        let readers: [&dyn SecondaryIndexReader<i64>; 3] = [&lisbon, &active, &everyone];

        let integrator = SecondaryIndexIntegrator::default();
        let result = integrator.intersect(&readers).await?;
        assert_eq!(
            result,
            expected(|id| city_of(id) == "Lisbon" && status_of(id) == Status::Active)
        );
        assert!(!result.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_merge_statuses() -> Result<()> {
        let client = new_client().await;
        let indexes = populate(&client).await?;

        let active = CustomIndexReader::new(&indexes.by_status, Status::Active, &client);
        let closed = CustomIndexReader::new(&indexes.by_status, Status::Closed, &client);
        let readers: [&dyn SecondaryIndexReader<i64>; 2] = [&active, &closed];

        let merged = SecondaryIndexIntegrator::default().merge(&readers).await?;
        assert_eq!(merged, expected(|id| status_of(id) != Status::Suspended));
        Ok(())
    }

    #[tokio::test]
    async fn test_intersection_with_empty_query_is_empty() -> Result<()> {
        let client = new_client().await;
        let indexes = populate(&client).await?;

        let nowhere = CustomIndexReader::new(&indexes.by_city, "Nowhere".to_string(), &client);
        let everyone = AllRowsIndexReader::new(&indexes.all, &client);
        let readers: [&dyn SecondaryIndexReader<i64>; 2] = [&everyone, &nowhere];
        let integrator = SecondaryIndexIntegrator::default();

        assert!(integrator.intersect(&readers).await?.is_empty());
        let page = integrator
            .intersect_page(&readers, &MarkPageRequest::first(5)?)
            .await?;
        assert!(page.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_intersect_pages_forward_and_back() -> Result<()> {
        let client = new_client().await;
        let indexes = populate(&client).await?;

        let porto = CustomIndexReader::new(&indexes.by_city, "Porto".to_string(), &client);
        let suspended_or_active = CustomIndexReader::new(&indexes.by_status, Status::Active, &client);
        let readers: [&dyn SecondaryIndexReader<i64>; 2] = [&porto, &suspended_or_active];
        let all = expected(|id| city_of(id) == "Porto" && status_of(id) == Status::Active);

        let integrator = SecondaryIndexIntegrator::new(PagingConfig {
            intersect_overfetch_factor: 1,
            ..PagingConfig::default()
        });

        let mut forward = Vec::new();
        let mut request = Some(MarkPageRequest::first(2)?);
        while let Some(current) = request.take() {
            let page = integrator.intersect_page(&readers, &current).await?;
            if page.is_empty() {
                break;
            }
            assert!(page.len() <= 2);
            forward.extend_from_slice(page.data());
            request = page.next_page_request();
        }
        assert_eq!(forward, all);

        let mut backward: Vec<i64> = Vec::new();
        let mut request = Some(MarkPageRequest::new(None, Navigation::Previous, 2)?);
        while let Some(current) = request.take() {
            let page = integrator.intersect_page(&readers, &current).await?;
            if page.is_empty() {
                break;
            }
            let mut data = page.data().to_vec();
            data.append(&mut backward);
            backward = data;
            request = page.previous_page_request();
        }
        assert_eq!(backward, all);
        Ok(())
    }

    #[tokio::test]
    async fn test_string_queries_intersect() -> Result<()> {
        let client = new_client().await;
        let indexes = populate(&client).await?;

        let starts_with_a =
            StringIndexReader::new(&indexes.by_name, StringQuery::StartsWith("A".to_string()), &client);
        let ends_with_a =
            StringIndexReader::new(&indexes.by_name, StringQuery::EndsWith("a".to_string()), &client);
        let readers: [&dyn SecondaryIndexReader<(String, i64)>; 2] = [&starts_with_a, &ends_with_a];

        let integrator = SecondaryIndexIntegrator::default();
        let result = integrator.intersect(&readers).await?;
        let mut expected: Vec<(String, i64)> = (1..=USERS)
            .map(|id| (name_of(id).to_string(), id))
            .filter(|(name, _)| name.starts_with('A') && name.ends_with('a'))
            .collect();
        expected.sort();
        assert_eq!(result, expected);

        let mut paged = Vec::new();
        let mut request = Some(MarkPageRequest::first(3)?);
        while let Some(current) = request.take() {
            let page = integrator.intersect_page(&readers, &current).await?;
            if page.is_empty() {
                break;
            }
            paged.extend_from_slice(page.data());
            request = page.next_page_request();
        }
        assert_eq!(paged, expected);
        Ok(())
    }
}
