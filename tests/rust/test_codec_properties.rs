//! Codec round trips and composite ordering properties

use super::common::*;
use proptest::prelude::*;
use std::collections::BTreeSet;
use wideindex::index::{CustomSecondaryIndex, GenericCustomSecondaryIndex};
use wideindex::keyspace::{from_bytes, to_bytes, ColumnFamily};

type Entry = (String, i64);

fn word() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 _-]{0,16}"
}

// An empty optional component is written the same way as an absent one.
fn non_empty_word() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 _-]{1,16}"
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_scalars_round_trip(long in any::<i64>(), text in any::<String>(), bytes in prop::collection::vec(any::<u8>(), 0..32)) {
        prop_assert_eq!(from_bytes::<i64>(&to_bytes(&long).unwrap()).unwrap(), long);
        prop_assert_eq!(from_bytes::<String>(&to_bytes(&text).unwrap()).unwrap(), text);
        prop_assert_eq!(from_bytes::<Vec<u8>>(&to_bytes(&bytes).unwrap()).unwrap(), bytes);
    }

    #[test]
    fn prop_composites_round_trip_with_absent_components(
        name in word(),
        age in prop::option::of(any::<i64>()),
        city in prop::option::of(non_empty_word()),
    ) {
        let value = (name, age, city);
        let bytes = to_bytes(&value).unwrap();
        let decoded: (String, Option<i64>, Option<String>) = from_bytes(&bytes).unwrap();
        prop_assert_eq!(decoded, value);
    }

    #[test]
    fn prop_composite_range_reads_follow_component_order(
        entries in prop::collection::btree_set((prop::sample::select(vec!["a", "ab", "b"]), -50i64..50), 0..30),
        prefix in prop::sample::select(vec!["a", "ab", "b"]),
    ) {
        let entries: BTreeSet<Entry> = entries
            .into_iter()
            .map(|(text, number)| (text.to_string(), number))
            .collect();
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let read = runtime.block_on(async {
            let client = new_client().await;
            let index: GenericCustomSecondaryIndex<String, Entry, ()> =
                GenericCustomSecondaryIndex::new(ColumnFamily::new("composite"));
            client.create_column_families(&index).await.unwrap();
            let row = "row".to_string();
            for entry in &entries {
                index.insert(entry, None, &row, &client).await.unwrap();
            }
            let start = (prefix.to_string(), i64::MIN);
            let end = (prefix.to_string(), i64::MAX);
            index
                .read_range(&row, Some(&start), Some(&end), &client)
                .await
                .unwrap()
                .into_iter()
                .map(|column| column.into_name())
                .collect::<Vec<Entry>>()
        });
        let expected: Vec<Entry> = entries
            .into_iter()
            .filter(|(text, _)| text == prefix)
            .collect();
        prop_assert_eq!(read, expected);
    }
}
