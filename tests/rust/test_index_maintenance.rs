//! Index maintenance through the indexed value log

use super::common::*;
use anyhow::Result;
use wideindex::column::SameTypeProvider;
use wideindex::index::{
    AllRowsSecondaryIndex, CustomSecondaryIndex, EnumSecondaryIndex, GenericCustomSecondaryIndex,
    IndexEntryHandler,
};
use wideindex::keyspace::{ColumnFamily, DataType, EnumConstant, Value};
use wideindex::{Client, Column, MainColumnFamily, Row};

struct Users {
    main: MainColumnFamily<i64, String>,
    by_city: GenericCustomSecondaryIndex<String, i64, ()>,
    all: AllRowsSecondaryIndex<i64, ()>,
    log: IndexEntryHandler<i64>,
}

impl Users {
    async fn create(client: &Client) -> Result<Self> {
        let users = Self {
            main: MainColumnFamily::new(
                ColumnFamily::new("users"),
                SameTypeProvider(DataType::STRING_UTF8),
            )?,
            by_city: GenericCustomSecondaryIndex::new(ColumnFamily::new("users_by_city")),
            all: AllRowsSecondaryIndex::new("all_users"),
            log: IndexEntryHandler::new("users_indexed_values"),
        };
        client.create_column_families(&users.main).await?;
        client.create_column_families(&users.by_city).await?;
        client.create_column_families(&users.all).await?;
        client.create_column_families(&users.log).await?;
        Ok(users)
    }

    /// Retracts every logged city of `id`, returning how many were retracted.
    async fn retract_city(&self, id: i64, client: &Client) -> Result<usize> {
        let previous = self
            .log
            .get_indexed_values::<String>(&id, "city", client)
            .await?;
        for value in &previous {
            self.by_city.delete(&id, value.value()?, client).await?;
        }
        self.log.delete_indexed_values(&id, &previous, client).await?;
        Ok(previous.len())
    }

    async fn write_city(&self, id: i64, city: &str, client: &Client) -> Result<()> {
        let column = Column::new("city".to_string(), Value::Text(city.to_string()));
        self.log.add_indexed_value(&id, &column, client).await?;
        self.by_city.insert(&id, None, &city.to_string(), client).await?;
        self.all.insert(&id, None, client).await?;
        let mut row = Row::new(id);
        row.set_column(column);
        self.main.insert(&row, client).await?;
        Ok(())
    }

    async fn set_city(&self, id: i64, city: &str, client: &Client) -> Result<()> {
        self.retract_city(id, client).await?;
        self.write_city(id, city, client).await
    }

    async fn city_count(&self, city: &str, client: &Client) -> Result<usize> {
        Ok(self.by_city.count(&city.to_string(), client).await?)
    }
}

#[cfg(test)]
mod maintenance_tests {
    use super::*;

    #[tokio::test]
    async fn test_update_retracts_previous_value() -> Result<()> {
        let client = new_client().await;
        let users = Users::create(&client).await?;

        for id in 1..=6 {
            users.set_city(id, city_of(id), &client).await?;
        }
        let lisbon_before = users.city_count("Lisbon", &client).await?;

        users.set_city(4, "Porto", &client).await?;
        assert_eq!(users.city_count("Lisbon", &client).await?, lisbon_before - 1);
        assert!(users
            .by_city
            .read_entries(&[4], &"Porto".to_string(), &client)
            .await?
            .len()
            == 1);

        let logged = users
            .log
            .get_indexed_values::<String>(&4, "city", &client)
            .await?;
        assert_eq!(logged.len(), 1);
        assert_eq!(logged[0].value()?, "Porto");
        assert_eq!(users.all.count(&client).await?, 6);
        Ok(())
    }

    #[tokio::test]
    async fn test_replaying_an_update_is_harmless() -> Result<()> {
        let client = new_client().await;
        let users = Users::create(&client).await?;
        users.set_city(1, "Lisbon", &client).await?;

        users.set_city(1, "Faro", &client).await?;
        users.set_city(1, "Faro", &client).await?;

        assert_eq!(users.city_count("Lisbon", &client).await?, 0);
        assert_eq!(users.city_count("Faro", &client).await?, 1);
        let logged = users
            .log
            .get_indexed_values::<String>(&1, "city", &client)
            .await?;
        assert_eq!(logged.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_interleaved_updates_converge_on_next_update() -> Result<()> {
        let client = new_client().await;
        let users = Users::create(&client).await?;
        users.set_city(7, "Lisbon", &client).await?;

        // Both writers retract before either writes: the index briefly holds both cities.
        users.retract_city(7, &client).await?;
        users.retract_city(7, &client).await?;
        users.write_city(7, "Porto", &client).await?;
        users.write_city(7, "Faro", &client).await?;
        assert_eq!(users.city_count("Porto", &client).await?, 1);
        assert_eq!(users.city_count("Faro", &client).await?, 1);

        assert_eq!(users.retract_city(7, &client).await?, 2);
        users.write_city(7, "Lisbon", &client).await?;
        assert_eq!(users.city_count("Porto", &client).await?, 0);
        assert_eq!(users.city_count("Faro", &client).await?, 0);
        assert_eq!(users.city_count("Lisbon", &client).await?, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_batched_update_applies_atomically() -> Result<()> {
        let client = new_client().await;
        let users = Users::create(&client).await?;
        users.set_city(2, "Lisbon", &client).await?;

        let batch = client.prepare_batch();
        users.set_city(2, "Porto", batch.client()).await?;
        assert!(!batch.is_empty());
        // Nothing is visible until the batch executes.
        assert_eq!(users.city_count("Lisbon", &client).await?, 1);
        assert_eq!(users.city_count("Porto", &client).await?, 0);

        batch.execute().await?;
        assert_eq!(users.city_count("Lisbon", &client).await?, 0);
        assert_eq!(users.city_count("Porto", &client).await?, 1);

        let row = users.main.read(&2, &client).await?.expect("user row exists");
        let city = row.column(&"city".to_string()).expect("city column exists");
        assert_eq!(city.value()?, &Value::Text("Porto".to_string()));
        Ok(())
    }

    #[tokio::test]
    async fn test_clear_and_delete_row() -> Result<()> {
        let client = new_client().await;
        let users = Users::create(&client).await?;
        for id in 1..=4 {
            users.set_city(id, "Lisbon", &client).await?;
        }

        users
            .by_city
            .delete_row(&"Lisbon".to_string(), &client)
            .await?;
        assert_eq!(users.city_count("Lisbon", &client).await?, 0);

        users.all.clear(&client).await?;
        assert_eq!(users.all.count(&client).await?, 0);
        assert_eq!(users.main.count(&client).await?, 4);

        users.main.delete_all(&[1, 2, 3, 4], &client).await?;
        assert!(!users.main.exists(&1, &client).await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_status_update_moves_entry_between_constants() -> Result<()> {
        let client = new_client().await;
        let by_status: EnumSecondaryIndex<Status, i64, ()> = EnumSecondaryIndex::new("users_by_status");
        let log: IndexEntryHandler<i64> = IndexEntryHandler::new("users_status_log");
        client.create_column_families(&by_status).await?;
        client.create_column_families(&log).await?;

        let status_column =
            |status: Status| Column::new("status".to_string(), Value::Text(status.name().to_string()));
        log.add_indexed_value(&1, &status_column(Status::Active), &client).await?;
        by_status.insert(&1, None, &Status::Active, &client).await?;

        let previous = log.get_indexed_values::<String>(&1, "status", &client).await?;
        for value in &previous {
            let old = Status::constants()
                .iter()
                .find(|status| status.name() == value.value().map(String::as_str).unwrap_or(""))
                .copied()
                .expect("logged status is a known constant");
            by_status.delete(&1, &old, &client).await?;
        }
        log.delete_indexed_values(&1, &previous, &client).await?;
        log.add_indexed_value(&1, &status_column(Status::Suspended), &client).await?;
        by_status.insert(&1, None, &Status::Suspended, &client).await?;

        let active = by_status.read(&Status::Active, &client).await?;
        let suspended = by_status.read(&Status::Suspended, &client).await?;
        assert!(active.is_empty());
        assert_eq!(suspended.len(), 1);
        assert_eq!(*suspended[0].name(), 1);
        Ok(())
    }
}
