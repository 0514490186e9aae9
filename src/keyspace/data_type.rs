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

//! DataType catalogue and the binding between Rust types and it.
//!
//! A [`DataType`] is what the store knows about a row key, a column name or a column
//! value. [`ColumnType`] maps a Rust type onto a `DataType` and converts instances to and
//! from the dynamic [`Value`] representation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::value::{Decimal, Value};
use crate::core::{CodecError, Result, SchemaError, WideIndexError};

/// Fixed catalogue of scalar types supported by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BasicType {
    Void,
    Boolean,
    Byte,
    ByteArray,
    StringAscii,
    StringUtf8,
    Integer,
    Long,
    Uuid,
    TimeUuid,
    Date,
    Float,
    Double,
    Decimal,
    BigInteger,
    Char,
    Short,
    CounterColumn,
}

impl BasicType {
    pub const ALL: [BasicType; 18] = [
        BasicType::Void,
        BasicType::Boolean,
        BasicType::Byte,
        BasicType::ByteArray,
        BasicType::StringAscii,
        BasicType::StringUtf8,
        BasicType::Integer,
        BasicType::Long,
        BasicType::Uuid,
        BasicType::TimeUuid,
        BasicType::Date,
        BasicType::Float,
        BasicType::Double,
        BasicType::Decimal,
        BasicType::BigInteger,
        BasicType::Char,
        BasicType::Short,
        BasicType::CounterColumn,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            BasicType::Void => "VOID",
            BasicType::Boolean => "BOOLEAN",
            BasicType::Byte => "BYTE",
            BasicType::ByteArray => "BYTE_ARRAY",
            BasicType::StringAscii => "STRING_ASCII",
            BasicType::StringUtf8 => "STRING_UTF8",
            BasicType::Integer => "INTEGER",
            BasicType::Long => "LONG",
            BasicType::Uuid => "UUID",
            BasicType::TimeUuid => "TIME_UUID",
            BasicType::Date => "DATE",
            BasicType::Float => "FLOAT",
            BasicType::Double => "DOUBLE",
            BasicType::Decimal => "DECIMAL",
            BasicType::BigInteger => "BIG_INTEGER",
            BasicType::Char => "CHAR",
            BasicType::Short => "SHORT",
            BasicType::CounterColumn => "COUNTER_COLUMN",
        }
    }
}

impl fmt::Display for BasicType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Closed enumeration stored as the name of its constants.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumType {
    name: String,
    constants: Vec<String>,
}

impl EnumType {
    pub fn new(name: impl Into<String>, constants: Vec<String>) -> Self {
        Self {
            name: name.into(),
            constants,
        }
    }

    pub fn of<E: EnumConstant>() -> Self {
        Self::new(
            E::TYPE_NAME,
            E::constants().iter().map(|c| c.name().to_string()).collect(),
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn constants(&self) -> &[String] {
        &self.constants
    }

    /// Linear scan by constant name.
    pub fn constant(&self, code: &str) -> Option<&str> {
        self.constants
            .iter()
            .find(|constant| constant.as_str() == code)
            .map(String::as_str)
    }
}

/// Ordered list of component types encoded as one sortable unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompositeType {
    components: Vec<DataType>,
}

impl CompositeType {
    pub fn new(components: Vec<DataType>) -> Self {
        Self { components }
    }

    pub fn components(&self) -> &[DataType] {
        &self.components
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DataType {
    Basic(BasicType),
    Enum(EnumType),
    Composite(CompositeType),
}

impl DataType {
    pub const VOID: DataType = DataType::Basic(BasicType::Void);
    pub const BYTE_ARRAY: DataType = DataType::Basic(BasicType::ByteArray);
    pub const STRING_UTF8: DataType = DataType::Basic(BasicType::StringUtf8);

    pub fn of<T: ColumnType>() -> Self {
        T::data_type()
    }
}

impl From<BasicType> for DataType {
    fn from(basic: BasicType) -> Self {
        DataType::Basic(basic)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Basic(basic) => write!(f, "{}", basic),
            DataType::Enum(enum_type) => write!(f, "ENUM({})", enum_type.name),
            DataType::Composite(composite) => {
                f.write_str("COMPOSITE(")?;
                for (position, component) in composite.components.iter().enumerate() {
                    if position > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", component)?;
                }
                f.write_str(")")
            }
        }
    }
}

/// A Rust type usable as a row key, column name or column value.
///
/// For column names the `Ord` implementation of the type must agree with the order of
/// its [`Value`] form; composite names compare component by component.
pub trait ColumnType: Clone + Send + Sync + fmt::Debug + 'static {
    fn data_type() -> DataType;

    /// `None` is the absent value.
    fn to_value(&self) -> Option<Value>;

    fn from_value(value: Option<Value>) -> Result<Self>;
}

/// Closed enumeration usable through [`ColumnType`].
pub trait EnumConstant: Copy + Eq + Send + Sync + fmt::Debug + 'static {
    const TYPE_NAME: &'static str;

    fn constants() -> &'static [Self];

    fn name(&self) -> &'static str;

    fn from_name(name: &str) -> Option<Self> {
        Self::constants()
            .iter()
            .copied()
            .find(|constant| constant.name() == name)
    }
}

pub(crate) fn required(value: Option<Value>, expected: &str) -> Result<Value> {
    value.ok_or_else(|| CodecError::MissingValue(expected.to_string()).into())
}

pub(crate) fn mismatch(expected: &str, found: &Value) -> WideIndexError {
    CodecError::TypeMismatch {
        expected: expected.to_string(),
        found: found.kind().to_string(),
    }
    .into()
}

/// Extracts exactly `expected` components from a composite value.
pub fn composite_components(value: Option<Value>, expected: usize) -> Result<Vec<Option<Value>>> {
    match required(value, "composite")? {
        Value::Composite(components) if components.len() == expected => Ok(components),
        Value::Composite(components) => Err(SchemaError::IncompatibleComposite(format!(
            "expected {} components, found {}",
            expected,
            components.len()
        ))
        .into()),
        other => Err(mismatch("composite", &other)),
    }
}

macro_rules! scalar_column_type {
    ($rust:ty, $basic:expr, $variant:ident) => {
        impl ColumnType for $rust {
            fn data_type() -> DataType {
                DataType::Basic($basic)
            }

            fn to_value(&self) -> Option<Value> {
                Some(Value::$variant(self.clone()))
            }

            fn from_value(value: Option<Value>) -> Result<Self> {
                match required(value, stringify!($rust))? {
                    Value::$variant(v) => Ok(v),
                    other => Err(mismatch(stringify!($rust), &other)),
                }
            }
        }
    };
}

// Variable-width types read an absent value as the empty value; inside a composite an empty
// component and a missing one share the same bytes.
macro_rules! variable_column_type {
    ($rust:ty, $basic:expr, $variant:ident) => {
        impl ColumnType for $rust {
            fn data_type() -> DataType {
                DataType::Basic($basic)
            }

            fn to_value(&self) -> Option<Value> {
                Some(Value::$variant(self.clone()))
            }

            fn from_value(value: Option<Value>) -> Result<Self> {
                match value {
                    None => Ok(<$rust>::new()),
                    Some(Value::$variant(v)) => Ok(v),
                    Some(other) => Err(mismatch(stringify!($rust), &other)),
                }
            }
        }
    };
}

variable_column_type!(Vec<u8>, BasicType::ByteArray, Bytes);
variable_column_type!(String, BasicType::StringUtf8, Text);

scalar_column_type!(bool, BasicType::Boolean, Boolean);
scalar_column_type!(i8, BasicType::Byte, Byte);
scalar_column_type!(i32, BasicType::Integer, Integer);
scalar_column_type!(i64, BasicType::Long, Long);
scalar_column_type!(Uuid, BasicType::Uuid, Uuid);
scalar_column_type!(DateTime<Utc>, BasicType::Date, Date);
scalar_column_type!(f64, BasicType::Double, Double);
scalar_column_type!(Decimal, BasicType::Decimal, Decimal);
scalar_column_type!(i128, BasicType::BigInteger, BigInteger);
scalar_column_type!(char, BasicType::Char, Char);
scalar_column_type!(i16, BasicType::Short, Short);

impl ColumnType for f32 {
    fn data_type() -> DataType {
        DataType::Basic(BasicType::Float)
    }

    fn to_value(&self) -> Option<Value> {
        Some(Value::Float(*self))
    }

    fn from_value(value: Option<Value>) -> Result<Self> {
        match required(value, "f32")? {
            Value::Float(v) => Ok(v),
            Value::Double(v) => Ok(v as f32),
            other => Err(mismatch("f32", &other)),
        }
    }
}

/// Valueless columns.
impl ColumnType for () {
    fn data_type() -> DataType {
        DataType::VOID
    }

    fn to_value(&self) -> Option<Value> {
        None
    }

    fn from_value(_value: Option<Value>) -> Result<Self> {
        Ok(())
    }
}

impl<T: ColumnType> ColumnType for Option<T> {
    fn data_type() -> DataType {
        T::data_type()
    }

    fn to_value(&self) -> Option<Value> {
        self.as_ref().and_then(ColumnType::to_value)
    }

    fn from_value(value: Option<Value>) -> Result<Self> {
        match value {
            None => Ok(None),
            value => T::from_value(value).map(Some),
        }
    }
}

impl<E: EnumConstant> ColumnType for E {
    fn data_type() -> DataType {
        DataType::Enum(EnumType::of::<E>())
    }

    fn to_value(&self) -> Option<Value> {
        Some(Value::Enum(self.name().to_string()))
    }

    fn from_value(value: Option<Value>) -> Result<Self> {
        match required(value, E::TYPE_NAME)? {
            Value::Enum(code) | Value::Text(code) => E::from_name(&code).ok_or_else(|| {
                CodecError::TypeMismatch {
                    expected: E::TYPE_NAME.to_string(),
                    found: code,
                }
                .into()
            }),
            other => Err(mismatch(E::TYPE_NAME, &other)),
        }
    }
}

macro_rules! composite_column_type {
    ($($name:ident : $index:tt),+) => {
        impl<$($name: ColumnType),+> ColumnType for ($($name,)+) {
            fn data_type() -> DataType {
                DataType::Composite(CompositeType::new(vec![$($name::data_type()),+]))
            }

            fn to_value(&self) -> Option<Value> {
                Some(Value::Composite(vec![$(self.$index.to_value()),+]))
            }

            fn from_value(value: Option<Value>) -> Result<Self> {
                let expected = [$(stringify!($name)),+].len();
                let mut components = composite_components(value, expected)?.into_iter();
                Ok(($($name::from_value(components.next().flatten())?,)+))
            }
        }
    };
}

composite_column_type!(A: 0, B: 1);
composite_column_type!(A: 0, B: 1, C: 2);
composite_column_type!(A: 0, B: 1, C: 2, D: 3);
