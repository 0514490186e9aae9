//! Common utilities for integration tests

use std::sync::{Arc, Once};
use uuid::Uuid;

use wideindex::keyspace::{EnumConstant, KeyspaceDefinition};
use wideindex::{Client, MemoryStore};

static INIT: Once = Once::new();

/// Initialize test logging once; `RUST_LOG` controls the level.
pub fn init_test_env() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Generate unique keyspace name for testing
pub fn generate_test_keyspace_name() -> String {
    format!("test_keyspace_{}", Uuid::new_v4().simple())
}

/// Client over a fresh in-memory store with its keyspace created.
pub async fn new_client() -> Client {
    init_test_env();
    let client = Client::new(
        Arc::new(MemoryStore::new()),
        KeyspaceDefinition::new(generate_test_keyspace_name()),
    );
    client
        .create_keyspace()
        .await
        .expect("in-memory keyspace creation cannot fail");
    client
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Active,
    Suspended,
    Closed,
}

impl EnumConstant for Status {
    const TYPE_NAME: &'static str = "Status";

    fn constants() -> &'static [Self] {
        &[Status::Active, Status::Suspended, Status::Closed]
    }

    fn name(&self) -> &'static str {
        match self {
            Status::Active => "Active",
            Status::Suspended => "Suspended",
            Status::Closed => "Closed",
        }
    }
}

/// Status of the user with the given id in the shared fixture.
pub fn status_of(id: i64) -> Status {
    match id % 3 {
        0 => Status::Suspended,
        1 => Status::Active,
        _ => Status::Closed,
    }
}

pub const CITIES: [&str; 3] = ["Lisbon", "Porto", "Faro"];

pub fn city_of(id: i64) -> &'static str {
    CITIES[(id % 4 % 3) as usize]
}
