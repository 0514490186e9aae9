//! Shard strategy determinism and configuration

use chrono::{DateTime, Datelike, Duration, FixedOffset, TimeZone, Timelike, Utc};
use proptest::prelude::*;
use wideindex::index::{
    HashShardStrategy, ShardSize, ShardStrategy, StringShardStrategy, TimeShardStrategy,
};

fn timestamp() -> impl Strategy<Value = DateTime<Utc>> {
    (0i64..4_000_000_000).prop_map(|seconds| Utc.timestamp_opt(seconds, 0).unwrap())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_hash_shards_are_stable_and_bounded(value in any::<i64>(), partitions in 2u32..64) {
        let strategy = HashShardStrategy::new("users", partitions).unwrap();
        let shard = strategy.shard(&value).unwrap();
        prop_assert_eq!(&shard, &strategy.shard(&value).unwrap());

        let partition: u32 = shard.trim_start_matches("users_").parse().unwrap();
        prop_assert!(partition < partitions);
    }

    #[test]
    fn prop_string_shard_is_first_character(value in "[a-zA-Z0-9][a-zA-Z0-9 ]{0,12}") {
        let strategy = StringShardStrategy::without_prefix();
        let expected = value.chars().next().unwrap().to_lowercase().to_string();
        prop_assert_eq!(ShardStrategy::<str>::shard(&strategy, value.as_str()).unwrap(), expected);
    }

    #[test]
    fn prop_same_hour_same_hourly_shard(time in timestamp(), hours in -12i32..=14) {
        let offset = FixedOffset::east_opt(hours * 3600).unwrap();
        let strategy = TimeShardStrategy::new(ShardSize::Hourly, offset);
        let local = time.with_timezone(&offset);
        let start_of_hour = time
            - Duration::minutes(i64::from(local.minute()))
            - Duration::seconds(i64::from(local.second()));
        prop_assert_eq!(
            strategy.shard(&time).unwrap(),
            strategy.shard(&start_of_hour).unwrap()
        );
        prop_assert_ne!(
            strategy.shard(&time).unwrap(),
            strategy.shard(&(start_of_hour + Duration::hours(1))).unwrap()
        );
    }

    #[test]
    fn prop_weekly_shards_span_seven_days(time in timestamp()) {
        let strategy = TimeShardStrategy::new(ShardSize::Weekly, FixedOffset::east_opt(0).unwrap());
        let shard = strategy.shard(&time).unwrap();
        let same_week = (0..7)
            .map(|days| time - Duration::days(days))
            .filter(|day| strategy.shard(day).unwrap() == shard)
            .count();
        let expected = time.weekday().num_days_from_sunday() as usize + 1;
        prop_assert_eq!(same_week, expected);
        prop_assert!(shard.ends_with('w'));
    }
}

#[test]
fn test_shard_size_configuration_names() {
    assert_eq!(serde_json::to_string(&ShardSize::Weekly).unwrap(), "\"weekly\"");
    let size: ShardSize = serde_json::from_str("\"secondly\"").unwrap();
    assert_eq!(size, ShardSize::Secondly);

    #[derive(serde::Deserialize)]
    struct Sharding {
        size: ShardSize,
    }
    let sharding: Sharding = toml::from_str("size = \"monthly\"").unwrap();
    assert_eq!(sharding.size, ShardSize::Monthly);
}

#[test]
fn test_single_partition_rejected() {
    let error = HashShardStrategy::new("users", 1).unwrap_err();
    assert!(error.is_fatal());
}
