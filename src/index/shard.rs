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

//! Row sharding for index column families.
//!
//! A single index row holding every entry of a popular value becomes a hot spot and may
//! outgrow a node. Shard strategies spread entries over several row keys derived from the
//! indexed value. They are pure functions: the same value always lands in the same shard.

use chrono::{DateTime, Datelike, Duration, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{Result, SchemaError, WideIndexError};
use crate::keyspace::{to_bytes, ColumnType};

const SPECIAL_CHARACTER_SHARD: &str = "special";

/// Maps a value to the row key of its shard.
pub trait ShardStrategy<V: ?Sized>: Send + Sync {
    fn shard(&self, value: &V) -> Result<String>;
}

fn prefixed(prefix: &str, shard: impl std::fmt::Display) -> String {
    if prefix.is_empty() {
        shard.to_string()
    } else {
        format!("{}_{}", prefix, shard)
    }
}

/// Spreads values uniformly over a fixed number of partitions.
///
/// Uses CRC-32 of the encoded value, which is stable across processes and releases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashShardStrategy {
    prefix: String,
    partitions: u32,
}

impl HashShardStrategy {
    pub fn new(prefix: impl Into<String>, partitions: u32) -> Result<Self> {
        if partitions <= 1 {
            return Err(SchemaError::InvalidPartitionCount(partitions).into());
        }
        Ok(Self {
            prefix: prefix.into(),
            partitions,
        })
    }

    pub fn partitions(&self) -> u32 {
        self.partitions
    }
}

impl<V: ColumnType> ShardStrategy<V> for HashShardStrategy {
    fn shard(&self, value: &V) -> Result<String> {
        let partition = crc32fast::hash(&to_bytes(value)?) % self.partitions;
        Ok(prefixed(&self.prefix, partition))
    }
}

/// Shards strings by their first character.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringShardStrategy {
    prefix: String,
}

impl StringShardStrategy {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn without_prefix() -> Self {
        Self::default()
    }
}

impl ShardStrategy<str> for StringShardStrategy {
    fn shard(&self, value: &str) -> Result<String> {
        let first = value
            .chars()
            .next()
            .ok_or_else(|| WideIndexError::invalid_argument("cannot shard an empty string"))?;
        if first.is_alphanumeric() {
            let lower: String = first.to_lowercase().collect();
            Ok(prefixed(&self.prefix, lower))
        } else {
            Ok(prefixed(&self.prefix, SPECIAL_CHARACTER_SHARD))
        }
    }
}

impl ShardStrategy<String> for StringShardStrategy {
    fn shard(&self, value: &String) -> Result<String> {
        ShardStrategy::<str>::shard(self, value.as_str())
    }
}

/// Time bucket of a [`TimeShardStrategy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShardSize {
    /// `yyyyMMddHHmmss`
    Secondly,
    /// `yyyyMMddHHmm`
    Minutely,
    /// `yyyyMMddHH`
    Hourly,
    /// `yyyyMMdd`
    Daily,
    /// `yyyyMMdd` of the Sunday starting the week, followed by `w`
    Weekly,
    /// `yyyyMM`
    Monthly,
    /// `yyyy`
    Yearly,
}

impl ShardSize {
    fn suffix(self, time: &DateTime<FixedOffset>) -> String {
        match self {
            ShardSize::Secondly => time.format("%Y%m%d%H%M%S").to_string(),
            ShardSize::Minutely => time.format("%Y%m%d%H%M").to_string(),
            ShardSize::Hourly => time.format("%Y%m%d%H").to_string(),
            ShardSize::Daily => time.format("%Y%m%d").to_string(),
            ShardSize::Weekly => {
                let days_into_week = i64::from(time.weekday().num_days_from_sunday());
                let week_start = time.date_naive() - Duration::days(days_into_week);
                format!("{}w", week_start.format("%Y%m%d"))
            }
            ShardSize::Monthly => time.format("%Y%m").to_string(),
            ShardSize::Yearly => time.format("%Y").to_string(),
        }
    }
}

/// Buckets timestamps, rendered in a fixed UTC offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeShardStrategy {
    prefix: String,
    size: ShardSize,
    offset: FixedOffset,
}

impl TimeShardStrategy {
    pub fn new(size: ShardSize, offset: FixedOffset) -> Self {
        Self::with_prefix("", size, offset)
    }

    pub fn with_prefix(prefix: impl Into<String>, size: ShardSize, offset: FixedOffset) -> Self {
        Self {
            prefix: prefix.into(),
            size,
            offset,
        }
    }
}

impl ShardStrategy<DateTime<Utc>> for TimeShardStrategy {
    fn shard(&self, value: &DateTime<Utc>) -> Result<String> {
        let local = value.with_timezone(&self.offset);
        Ok(prefixed(&self.prefix, self.size.suffix(&local)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    fn plus_hours(hours: i32) -> FixedOffset {
        FixedOffset::east_opt(hours * 3600).unwrap()
    }

    #[test]
    fn test_string_shards() {
        let strategy = StringShardStrategy::new("my_prefix");
        assert_eq!(strategy.shard("Hello World").unwrap(), "my_prefix_h");
        assert_eq!(strategy.shard("916").unwrap(), "my_prefix_9");
        for special in ["_", " ", "~", "  ", "\n"] {
            assert_eq!(strategy.shard(special).unwrap(), "my_prefix_special");
        }

        assert_eq!(StringShardStrategy::without_prefix().shard("Hello World").unwrap(), "h");
        assert_eq!(StringShardStrategy::new("").shard("Hello World").unwrap(), "h");
    }

    #[test]
    fn test_string_shard_rejects_empty() {
        let error = StringShardStrategy::without_prefix().shard("").unwrap_err();
        assert!(matches!(error, WideIndexError::InvalidArgument(_)));
    }

    #[test]
    fn test_hash_shards_are_stable_and_bounded() {
        let strategy = HashShardStrategy::new("users", 8).unwrap();
        for value in 0i64..200 {
            let shard = strategy.shard(&value).unwrap();
            assert_eq!(shard, strategy.shard(&value).unwrap());
            let partition: u32 = shard.trim_start_matches("users_").parse().unwrap();
            assert!(partition < 8);
        }

        let bare = HashShardStrategy::new("", 4).unwrap();
        assert!(bare.shard(&"abc".to_string()).unwrap().parse::<u32>().is_ok());
    }

    #[test]
    fn test_hash_requires_several_partitions() {
        for partitions in [0, 1] {
            let error = HashShardStrategy::new("p", partitions).unwrap_err();
            assert!(error.is_fatal());
        }
    }

    #[test]
    fn test_time_shards() {
        let time = utc(2013, 1, 11, 9, 30, 59);
        let shard = |size, offset| TimeShardStrategy::new(size, offset).shard(&time).unwrap();

        assert_eq!(shard(ShardSize::Secondly, plus_hours(0)), "20130111093059");
        assert_eq!(shard(ShardSize::Secondly, plus_hours(2)), "20130111113059");
        assert_eq!(shard(ShardSize::Minutely, plus_hours(0)), "201301110930");
        assert_eq!(shard(ShardSize::Hourly, plus_hours(0)), "2013011109");
        assert_eq!(shard(ShardSize::Yearly, plus_hours(0)), "2013");

        let prefixed = TimeShardStrategy::with_prefix("my_prefix", ShardSize::Secondly, plus_hours(0));
        assert_eq!(prefixed.shard(&time).unwrap(), "my_prefix_20130111093059");
    }

    #[test]
    fn test_time_shards_use_24_hour_clock() {
        let time = utc(2013, 1, 11, 21, 5, 0);
        let strategy = TimeShardStrategy::new(ShardSize::Hourly, plus_hours(0));
        assert_eq!(strategy.shard(&time).unwrap(), "2013011121");
    }

    #[test]
    fn test_daily_and_weekly_shards_cross_midnight() {
        let daily = TimeShardStrategy::new(ShardSize::Daily, plus_hours(0));
        let daily_shifted = TimeShardStrategy::new(ShardSize::Daily, plus_hours(2));
        let late = utc(2013, 1, 11, 23, 30, 59);
        assert_eq!(daily.shard(&late).unwrap(), "20130111");
        assert_eq!(daily_shifted.shard(&late).unwrap(), "20130112");

        let weekly = TimeShardStrategy::new(ShardSize::Weekly, plus_hours(0));
        let weekly_shifted = TimeShardStrategy::new(ShardSize::Weekly, plus_hours(2));
        let saturday_night = utc(2013, 1, 12, 23, 30, 59);
        assert_eq!(weekly.shard(&saturday_night).unwrap(), "20130106w");
        assert_eq!(weekly_shifted.shard(&saturday_night).unwrap(), "20130113w");
    }

    #[test]
    fn test_monthly_shard() {
        let strategy = TimeShardStrategy::new(ShardSize::Monthly, plus_hours(0));
        assert_eq!(strategy.shard(&utc(2013, 1, 31, 23, 0, 0)).unwrap(), "201301");
    }
}
