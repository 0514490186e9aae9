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

//! # wideindex
//!
//! Secondary indexing and paging over a wide-column store.
//!
//! ## Layers
//!
//! - **keyspace**: data types, their byte codec, column family definitions
//! - **client**: typed facade over a byte-level [`client::WideColumnDriver`], with an
//!   in-memory driver and batch-scoped clients
//! - **paging**: mark-based page requests and pages
//! - **index**: custom secondary indexes (generic, string, enum, all-rows), shard
//!   strategies, the index entry log and the integrator combining index queries
//! - **main_family**: the main table an index set belongs to
//!
//! Every operation takes the [`client::Client`] to run against; there is no global
//! context.

pub mod client;
pub mod column;
pub mod core;
pub mod index;
pub mod keyspace;
pub mod main_family;
pub mod paging;

pub use crate::core::{Config, Result, WideIndexError};
pub use client::{Client, MemoryStore};
pub use column::{Column, Row};
pub use main_family::MainColumnFamily;
pub use paging::{MarkPage, MarkPageRequest, Navigation};
