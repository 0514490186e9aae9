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

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of replicas that must acknowledge a write before it is reported successful.
///
/// A quorum is `(replication_factor / 2) + 1`, so with a replication factor of 3 a quorum
/// write tolerates one replica down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WriteConsistencyLevel {
    /// Succeeds once a hinted handoff is written, even if every replica is down.
    Any,
    /// Commit log and memtable of at least one replica.
    #[default]
    One,
    Quorum,
    /// Quorum within the coordinator's data center.
    LocalQuorum,
    /// Quorum in every data center.
    EachQuorum,
    All,
}

/// Number of replicas that must answer a read before data is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReadConsistencyLevel {
    #[default]
    One,
    Quorum,
    LocalQuorum,
    EachQuorum,
    All,
}

impl fmt::Display for WriteConsistencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Any => "ANY",
            Self::One => "ONE",
            Self::Quorum => "QUORUM",
            Self::LocalQuorum => "LOCAL_QUORUM",
            Self::EachQuorum => "EACH_QUORUM",
            Self::All => "ALL",
        };
        f.write_str(name)
    }
}

impl fmt::Display for ReadConsistencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::One => "ONE",
            Self::Quorum => "QUORUM",
            Self::LocalQuorum => "LOCAL_QUORUM",
            Self::EachQuorum => "EACH_QUORUM",
            Self::All => "ALL",
        };
        f.write_str(name)
    }
}
