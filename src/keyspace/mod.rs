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

//! Schema layer: data types, their byte codec, column families and range limits.

pub mod codec;
pub mod column_family;
pub mod data_type;
pub mod range_limit;
pub mod value;

pub use codec::{class_for, encode_value, from_bytes, serializer_for, to_bytes, Serializer};
pub use column_family::{
    ColumnFamily, ColumnFamilyDefinition, ColumnFamilyHandler, KeyspaceDefinition,
    SecondaryIndexDefinition,
};
pub use data_type::{
    composite_components, BasicType, ColumnType, CompositeType, DataType, EnumConstant, EnumType,
};
pub use range_limit::{RangeLimit, STRING_RANGE_END, STRING_RANGE_START};
pub use value::{Decimal, Value};
