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

//! wideindex demo - indexes a small user table in memory and queries it

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use wideindex::column::SameTypeProvider;
use wideindex::index::{
    AllRowsSecondaryIndex, CustomIndexReader, CustomSecondaryIndex, EnumSecondaryIndex,
    GenericCustomSecondaryIndex, IndexEntryHandler, SecondaryIndexIntegrator,
    SecondaryIndexReader, StringSecondaryIndex,
};
use wideindex::keyspace::{ColumnFamily, DataType, EnumConstant, RangeLimit, Value};
use wideindex::{Client, Column, Config, MainColumnFamily, MarkPageRequest, MemoryStore, Row};

const CITIES: [&str; 4] = ["Lisbon", "Porto", "Braga", "Faro"];
const NAMES: [&str; 6] = ["Ana", "Anabela", "Eva", "Helena", "Rui", "Ruben"];

#[derive(Parser)]
#[command(name = "wideindex-demo")]
#[command(about = "Custom secondary indexes over an in-memory wide-column store")]
struct Args {
    /// TOML configuration file; defaults apply when absent
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(short, long, default_value_t = 24)]
    users: i64,

    #[arg(short, long, default_value_t = 5)]
    page_size: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Active,
    Suspended,
}

impl EnumConstant for Status {
    const TYPE_NAME: &'static str = "Status";

    fn constants() -> &'static [Self] {
        &[Status::Active, Status::Suspended]
    }

    fn name(&self) -> &'static str {
        match self {
            Status::Active => "Active",
            Status::Suspended => "Suspended",
        }
    }
}

struct UserTables {
    users: MainColumnFamily<i64, String>,
    by_city: GenericCustomSecondaryIndex<String, i64, String>,
    by_name: StringSecondaryIndex<i64, (String, i64), ()>,
    by_status: EnumSecondaryIndex<Status, i64, ()>,
    all_users: AllRowsSecondaryIndex<i64, ()>,
    indexed_values: IndexEntryHandler<i64>,
}

impl UserTables {
    fn new(config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            users: MainColumnFamily::new(
                ColumnFamily::new("users"),
                SameTypeProvider(DataType::STRING_UTF8),
            )?,
            by_city: GenericCustomSecondaryIndex::new(ColumnFamily::new("users_by_city")),
            by_name: StringSecondaryIndex::with_pairs("users_by_name", RangeLimit::long())
                .with_scan_page_size(config.paging.scan_page_size),
            by_status: EnumSecondaryIndex::new("users_by_status"),
            all_users: AllRowsSecondaryIndex::new("all_users"),
            indexed_values: IndexEntryHandler::new("users_indexed_values"),
        })
    }

    async fn create(&self, client: &Client) -> anyhow::Result<()> {
        client.create_keyspace().await?;
        client.create_column_families(&self.users).await?;
        client.create_column_families(&self.by_city).await?;
        client.create_column_families(&self.by_name).await?;
        client.create_column_families(&self.by_status).await?;
        client.create_column_families(&self.all_users).await?;
        client.create_column_families(&self.indexed_values).await?;
        Ok(())
    }

    async fn insert(
        &self,
        id: i64,
        name: &str,
        city: &str,
        status: Status,
        client: &Client,
    ) -> anyhow::Result<()> {
        let city_column = Column::new("city".to_string(), Value::Text(city.to_string()));
        self.indexed_values
            .add_indexed_value(&id, &city_column, client)
            .await?;
        self.by_city
            .insert(&id, Some(&name.to_string()), &city.to_string(), client)
            .await?;
        self.by_name
            .insert(&(name.to_string(), id), None, client)
            .await?;
        self.by_status.insert(&id, None, &status, client).await?;
        self.all_users.insert(&id, None, client).await?;

        let mut row = Row::new(id);
        row.set_column(Column::new("name".to_string(), Value::Text(name.to_string())));
        row.set_column(city_column);
        row.set_column(Column::new(
            "status".to_string(),
            Value::Text(status.name().to_string()),
        ));
        self.users.insert(&row, client).await?;
        Ok(())
    }

    /// Moves a user to another city, retracting every previously indexed city first.
    async fn relocate(&self, id: i64, city: &str, client: &Client) -> anyhow::Result<()> {
        let previous = self
            .indexed_values
            .get_indexed_values::<String>(&id, "city", client)
            .await?;
        for value in &previous {
            self.by_city.delete(&id, value.value()?, client).await?;
        }
        self.indexed_values
            .delete_indexed_values(&id, &previous, client)
            .await?;

        let city_column = Column::new("city".to_string(), Value::Text(city.to_string()));
        self.indexed_values
            .add_indexed_value(&id, &city_column, client)
            .await?;
        let row = self
            .users
            .read(&id, client)
            .await?
            .with_context(|| format!("user {} does not exist", id))?;
        let name = match row.column(&"name".to_string()).map(|column| column.value()) {
            Some(Ok(Value::Text(name))) => Some(name.clone()),
            _ => None,
        };
        self.by_city
            .insert(&id, name.as_ref(), &city.to_string(), client)
            .await?;

        let mut update = Row::new(id);
        update.set_column(city_column);
        self.users.insert(&update, client).await?;
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = match &args.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => Config::default(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(config.logging.with_target)
        .init();

    let client = Client::from_config(Arc::new(MemoryStore::new()), &config);
    let tables = UserTables::new(&config)?;
    tables.create(&client).await?;

    for id in 1..=args.users {
        let index = id as usize;
        let name = NAMES[index % NAMES.len()];
        let city = CITIES[index % CITIES.len()];
        let status = if id % 3 == 0 {
            Status::Suspended
        } else {
            Status::Active
        };
        tables.insert(id, name, city, status, &client).await?;
    }
    info!("Indexed {} users", tables.all_users.count(&client).await?);

    let lisbon = "Lisbon".to_string();
    info!(
        "Users in Lisbon: {}",
        tables.by_city.count(&lisbon, &client).await?
    );
    tables.relocate(4, "Porto", &client).await?;
    info!(
        "Users in Lisbon after relocating user 4: {}",
        tables.by_city.count(&lisbon, &client).await?
    );

    let ana: Vec<i64> = tables
        .by_name
        .read_starts_with("Ana", &client)
        .await?
        .into_iter()
        .map(|column| column.into_name().1)
        .collect();
    info!("Users whose name starts with Ana: {:?}", ana);
    info!(
        "Users whose name ends with en: {}",
        tables.by_name.count_ends_with("en", &client).await?
    );

    let porto = "Porto".to_string();
    let in_porto = CustomIndexReader::new(&tables.by_city, porto, &client);
    let active = CustomIndexReader::new(&tables.by_status, Status::Active, &client);
    let readers: [&dyn SecondaryIndexReader<i64>; 2] = [&in_porto, &active];
    let integrator = SecondaryIndexIntegrator::new(config.paging.clone());
    info!(
        "Active users in Porto: {:?}",
        integrator.intersect(&readers).await?
    );

    let mut request = Some(MarkPageRequest::first(args.page_size)?);
    while let Some(current) = request.take() {
        let page = integrator.intersect_page(&readers, &current).await?;
        if page.is_empty() {
            break;
        }
        info!("Page of active users in Porto: {:?}", page.data());
        request = page.next_page_request();
    }

    let mut request = Some(MarkPageRequest::first(args.page_size)?);
    while let Some(current) = request.take() {
        let page = tables.all_users.read_page(&current, &client).await?;
        if page.is_empty() {
            break;
        }
        let ids: Vec<i64> = page.data().iter().map(|column| *column.name()).collect();
        info!("Page of all users: {:?}", ids);
        request = page.next_request_by_name();
    }

    let total = tables.users.count(&client).await?;
    info!("Main table holds {} users", total);
    Ok(())
}
