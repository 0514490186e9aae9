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

//! Byte codec and native class registry.
//!
//! Encodings follow the store's native marshalling: fixed-width big-endian numbers,
//! UTF-8 strings, epoch milliseconds for dates and two's complement varints. Floats are
//! always written as doubles. Composites are written as
//! `<u16 length><component bytes><0x00>` per component.

use chrono::{TimeZone, Utc};
use uuid::Uuid;

use super::data_type::{mismatch, BasicType, ColumnType, CompositeType, DataType, EnumType};
use super::value::{Decimal, Value};
use crate::core::{CodecError, Result, SchemaError};

const END_OF_COMPONENT: u8 = 0;

/// Native comparator/validator class of a data type.
pub fn class_for(data_type: &DataType) -> Result<String> {
    match data_type {
        DataType::Basic(basic) => Ok(basic_class(*basic).to_string()),
        DataType::Enum(_) => Ok("UTF8Type".to_string()),
        DataType::Composite(composite) => {
            let mut classes = Vec::with_capacity(composite.components().len());
            for component in composite.components() {
                if let DataType::Composite(_) = component {
                    return Err(SchemaError::NestedComposite(component.to_string()).into());
                }
                classes.push(class_for(component)?);
            }
            Ok(format!("CompositeType({})", classes.join(",")))
        }
    }
}

fn basic_class(basic: BasicType) -> &'static str {
    match basic {
        BasicType::Void | BasicType::Byte => "ByteType",
        BasicType::ByteArray => "BytesType",
        BasicType::StringAscii => "AsciiType",
        BasicType::StringUtf8 => "UTF8Type",
        BasicType::Integer | BasicType::BigInteger => "IntegerType",
        BasicType::Long => "LongType",
        BasicType::Uuid => "UUIDType",
        BasicType::TimeUuid => "TimeUUIDType",
        BasicType::Date => "DateType",
        BasicType::Boolean => "BooleanType",
        BasicType::Float | BasicType::Double => "DoubleType",
        BasicType::Decimal => "DecimalType",
        BasicType::Char => "CharType",
        BasicType::Short => "ShortType",
        BasicType::CounterColumn => "CounterColumnType",
    }
}

pub fn serializer_for(data_type: &DataType) -> Serializer<'_> {
    Serializer { data_type }
}

/// Encode/decode pair bound to one data type.
#[derive(Debug, Clone, Copy)]
pub struct Serializer<'a> {
    data_type: &'a DataType,
}

impl Serializer<'_> {
    pub fn data_type(&self) -> &DataType {
        self.data_type
    }

    /// Absent values encode to an empty buffer.
    pub fn encode(&self, value: Option<&Value>) -> Result<Vec<u8>> {
        match value {
            None => Ok(Vec::new()),
            Some(value) => encode(self.data_type, value),
        }
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<Option<Value>> {
        decode(self.data_type, bytes)
    }
}

/// Encodes a typed value with the data type of its Rust type.
pub fn to_bytes<T: ColumnType>(value: &T) -> Result<Vec<u8>> {
    serializer_for(&T::data_type()).encode(value.to_value().as_ref())
}

pub fn from_bytes<T: ColumnType>(bytes: &[u8]) -> Result<T> {
    T::from_value(decode(&T::data_type(), bytes)?)
}

/// Encodes a dynamic value with the data type its variant stands for.
///
/// Enum constants are written as their name, like UTF-8 strings.
pub fn encode_value(value: &Value) -> Result<Vec<u8>> {
    encode(&natural_type(value), value)
}

fn natural_type(value: &Value) -> DataType {
    let basic = match value {
        Value::Boolean(_) => BasicType::Boolean,
        Value::Byte(_) => BasicType::Byte,
        Value::Bytes(_) => BasicType::ByteArray,
        Value::Text(_) | Value::Enum(_) => BasicType::StringUtf8,
        Value::Integer(_) => BasicType::Integer,
        Value::Long(_) => BasicType::Long,
        Value::Uuid(_) => BasicType::Uuid,
        Value::Date(_) => BasicType::Date,
        Value::Float(_) => BasicType::Float,
        Value::Double(_) => BasicType::Double,
        Value::Decimal(_) => BasicType::Decimal,
        Value::BigInteger(_) => BasicType::BigInteger,
        Value::Char(_) => BasicType::Char,
        Value::Short(_) => BasicType::Short,
        Value::Composite(components) => {
            return DataType::Composite(CompositeType::new(
                components
                    .iter()
                    .map(|component| component.as_ref().map_or(DataType::VOID, natural_type))
                    .collect(),
            ))
        }
    };
    DataType::Basic(basic)
}

fn encode(data_type: &DataType, value: &Value) -> Result<Vec<u8>> {
    match data_type {
        DataType::Basic(basic) => encode_basic(*basic, value),
        DataType::Enum(enum_type) => encode_enum(enum_type, value),
        DataType::Composite(composite) => encode_composite(composite, value),
    }
}

fn encode_basic(basic: BasicType, value: &Value) -> Result<Vec<u8>> {
    let bytes = match (basic, value) {
        (BasicType::Void, _) => Vec::new(),
        (BasicType::Boolean, Value::Boolean(v)) => vec![u8::from(*v)],
        (BasicType::Byte, Value::Byte(v)) => v.to_be_bytes().to_vec(),
        (BasicType::ByteArray, Value::Bytes(v)) => v.clone(),
        (BasicType::StringAscii, Value::Text(v)) => {
            if !v.is_ascii() {
                return Err(CodecError::TypeMismatch {
                    expected: "ascii string".to_string(),
                    found: "non-ascii string".to_string(),
                }
                .into());
            }
            v.as_bytes().to_vec()
        }
        (BasicType::StringUtf8, Value::Text(v) | Value::Enum(v)) => v.as_bytes().to_vec(),
        (BasicType::Integer, Value::Integer(v)) => v.to_be_bytes().to_vec(),
        (BasicType::Long | BasicType::CounterColumn, Value::Long(v)) => v.to_be_bytes().to_vec(),
        (BasicType::Uuid | BasicType::TimeUuid, Value::Uuid(v)) => v.as_bytes().to_vec(),
        (BasicType::Date, Value::Date(v)) => v.timestamp_millis().to_be_bytes().to_vec(),
        (BasicType::Float | BasicType::Double, Value::Float(v)) => {
            f64::from(*v).to_be_bytes().to_vec()
        }
        (BasicType::Float | BasicType::Double, Value::Double(v)) => v.to_be_bytes().to_vec(),
        (BasicType::Decimal, Value::Decimal(v)) => {
            let mut bytes = v.scale().to_be_bytes().to_vec();
            bytes.extend(encode_varint(v.unscaled()));
            bytes
        }
        (BasicType::BigInteger, Value::BigInteger(v)) => encode_varint(*v),
        (BasicType::Char, Value::Char(v)) => v.to_string().into_bytes(),
        (BasicType::Short, Value::Short(v)) => v.to_be_bytes().to_vec(),
        (basic, value) => return Err(mismatch(basic.name(), value)),
    };
    Ok(bytes)
}

fn encode_enum(enum_type: &EnumType, value: &Value) -> Result<Vec<u8>> {
    let code = value
        .as_str()
        .ok_or_else(|| mismatch(enum_type.name(), value))?;
    match enum_type.constant(code) {
        Some(constant) => Ok(constant.as_bytes().to_vec()),
        None => Err(CodecError::TypeMismatch {
            expected: enum_type.name().to_string(),
            found: code.to_string(),
        }
        .into()),
    }
}

fn encode_composite(composite: &CompositeType, value: &Value) -> Result<Vec<u8>> {
    let components = match value {
        Value::Composite(components) => components,
        other => return Err(mismatch("composite", other)),
    };
    if components.len() != composite.components().len() {
        return Err(SchemaError::IncompatibleComposite(format!(
            "expected {} components, found {}",
            composite.components().len(),
            components.len()
        ))
        .into());
    }

    let mut buffer = Vec::with_capacity(components.len() * 16);
    for (component_type, component) in composite.components().iter().zip(components) {
        if let DataType::Composite(_) = component_type {
            return Err(SchemaError::NestedComposite(component_type.to_string()).into());
        }
        let bytes = serializer_for(component_type).encode(component.as_ref())?;
        let length =
            u16::try_from(bytes.len()).map_err(|_| CodecError::ComponentTooLarge(bytes.len()))?;
        buffer.extend_from_slice(&length.to_be_bytes());
        buffer.extend_from_slice(&bytes);
        buffer.push(END_OF_COMPONENT);
    }
    Ok(buffer)
}

fn decode(data_type: &DataType, bytes: &[u8]) -> Result<Option<Value>> {
    match data_type {
        DataType::Basic(basic) => decode_basic(*basic, bytes),
        DataType::Enum(enum_type) => decode_enum(enum_type, bytes),
        DataType::Composite(composite) => decode_composite(composite, bytes),
    }
}

fn decode_basic(basic: BasicType, bytes: &[u8]) -> Result<Option<Value>> {
    let value = match basic {
        BasicType::Void => return Ok(None),
        BasicType::ByteArray => Value::Bytes(bytes.to_vec()),
        BasicType::StringAscii | BasicType::StringUtf8 => Value::Text(utf8(bytes)?),
        _ if bytes.is_empty() => return Ok(None),
        BasicType::Boolean => Value::Boolean(fixed::<1>(basic, bytes)?[0] != 0),
        BasicType::Byte => Value::Byte(i8::from_be_bytes(fixed(basic, bytes)?)),
        BasicType::Integer => Value::Integer(i32::from_be_bytes(fixed(basic, bytes)?)),
        BasicType::Long | BasicType::CounterColumn => {
            Value::Long(i64::from_be_bytes(fixed(basic, bytes)?))
        }
        BasicType::Uuid | BasicType::TimeUuid => {
            Value::Uuid(Uuid::from_bytes(fixed(basic, bytes)?))
        }
        BasicType::Date => {
            let millis = i64::from_be_bytes(fixed(basic, bytes)?);
            let date = Utc.timestamp_millis_opt(millis).single().ok_or_else(|| {
                CodecError::TypeMismatch {
                    expected: "date".to_string(),
                    found: format!("out of range timestamp {}", millis),
                }
            })?;
            Value::Date(date)
        }
        BasicType::Float => Value::Float(f64::from_be_bytes(fixed(basic, bytes)?) as f32),
        BasicType::Double => Value::Double(f64::from_be_bytes(fixed(basic, bytes)?)),
        BasicType::Decimal => {
            if bytes.len() < 5 {
                return Err(CodecError::Truncated(basic.name().to_string()).into());
            }
            let (scale, unscaled) = bytes.split_at(4);
            let scale = i32::from_be_bytes(fixed(basic, scale)?);
            Value::Decimal(Decimal::new(decode_varint(basic, unscaled)?, scale))
        }
        BasicType::BigInteger => Value::BigInteger(decode_varint(basic, bytes)?),
        BasicType::Char => {
            let text = utf8(bytes)?;
            let mut chars = text.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Value::Char(c),
                _ => {
                    return Err(CodecError::InvalidLength {
                        data_type: basic.name().to_string(),
                        expected: 1,
                        actual: text.chars().count(),
                    }
                    .into())
                }
            }
        }
        BasicType::Short => Value::Short(i16::from_be_bytes(fixed(basic, bytes)?)),
    };
    Ok(Some(value))
}

fn decode_enum(enum_type: &EnumType, bytes: &[u8]) -> Result<Option<Value>> {
    if bytes.is_empty() {
        return Ok(None);
    }
    let code = utf8(bytes)?;
    match enum_type.constant(&code) {
        Some(constant) => Ok(Some(Value::Enum(constant.to_string()))),
        None => {
            tracing::warn!(
                "Unknown constant {:?} for enum {}, treating the value as absent",
                code,
                enum_type.name()
            );
            Ok(None)
        }
    }
}

fn decode_composite(composite: &CompositeType, bytes: &[u8]) -> Result<Option<Value>> {
    if bytes.is_empty() {
        return Ok(None);
    }

    let expected = composite.components().len();
    let mut components = Vec::with_capacity(expected);
    let mut cursor = bytes;
    while !cursor.is_empty() {
        let position = components.len();
        let component_type = composite.components().get(position).ok_or_else(|| {
            SchemaError::IncompatibleComposite(format!(
                "expected {} components, found more",
                expected
            ))
        })?;

        if cursor.len() < 2 {
            return Err(CodecError::Truncated(format!("composite component {}", position)).into());
        }
        let length = usize::from(u16::from_be_bytes([cursor[0], cursor[1]]));
        cursor = &cursor[2..];
        if cursor.len() < length + 1 {
            return Err(CodecError::Truncated(format!("composite component {}", position)).into());
        }
        let (chunk, rest) = cursor.split_at(length);
        if rest[0] != END_OF_COMPONENT {
            return Err(SchemaError::IncompatibleComposite(format!(
                "component {} terminated by {:#04x}",
                position, rest[0]
            ))
            .into());
        }
        cursor = &rest[1..];

        let component = if chunk.is_empty() {
            None
        } else {
            decode(component_type, chunk)?
        };
        components.push(component);
    }

    if components.len() != expected {
        return Err(SchemaError::IncompatibleComposite(format!(
            "expected {} components, found {}",
            expected,
            components.len()
        ))
        .into());
    }
    Ok(Some(Value::Composite(components)))
}

fn fixed<const N: usize>(basic: BasicType, bytes: &[u8]) -> Result<[u8; N]> {
    bytes.try_into().map_err(|_| {
        CodecError::InvalidLength {
            data_type: basic.name().to_string(),
            expected: N,
            actual: bytes.len(),
        }
        .into()
    })
}

fn utf8(bytes: &[u8]) -> Result<String> {
    String::from_utf8(bytes.to_vec()).map_err(|e| CodecError::InvalidUtf8(e.to_string()).into())
}

/// Minimal big-endian two's complement.
fn encode_varint(value: i128) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let mut start = 0;
    while start < bytes.len() - 1 {
        let redundant = (bytes[start] == 0x00 && bytes[start + 1] & 0x80 == 0)
            || (bytes[start] == 0xff && bytes[start + 1] & 0x80 != 0);
        if !redundant {
            break;
        }
        start += 1;
    }
    bytes[start..].to_vec()
}

fn decode_varint(basic: BasicType, bytes: &[u8]) -> Result<i128> {
    if bytes.is_empty() || bytes.len() > 16 {
        return Err(CodecError::InvalidLength {
            data_type: basic.name().to_string(),
            expected: 16,
            actual: bytes.len(),
        }
        .into());
    }
    let fill = if bytes[0] & 0x80 != 0 { 0xff } else { 0x00 };
    let mut buffer = [fill; 16];
    buffer[16 - bytes.len()..].copy_from_slice(bytes);
    Ok(i128::from_be_bytes(buffer))
}
