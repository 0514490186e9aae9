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

//! Decoded column values.
//!
//! [`Value`] is the tagged union every column name and column value passes through on its
//! way to and from bytes. Its ordering mirrors the comparator of the corresponding native
//! type, which is what lets the in-memory store keep rows sorted the way the real store
//! would.

use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub enum Value {
    Boolean(bool),
    Byte(i8),
    Bytes(Vec<u8>),
    Text(String),
    Integer(i32),
    Long(i64),
    Uuid(Uuid),
    Date(DateTime<Utc>),
    Float(f32),
    Double(f64),
    Decimal(Decimal),
    BigInteger(i128),
    Char(char),
    Short(i16),
    /// Constant name of an enumeration
    Enum(String),
    /// Components in declared order; `None` is an absent component
    Composite(Vec<Option<Value>>),
}

impl Value {
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Boolean(_) => "boolean",
            Value::Byte(_) => "byte",
            Value::Bytes(_) => "byte array",
            Value::Text(_) => "string",
            Value::Integer(_) => "integer",
            Value::Long(_) => "long",
            Value::Uuid(_) => "uuid",
            Value::Date(_) => "date",
            Value::Float(_) => "float",
            Value::Double(_) => "double",
            Value::Decimal(_) => "decimal",
            Value::BigInteger(_) => "big integer",
            Value::Char(_) => "char",
            Value::Short(_) => "short",
            Value::Enum(_) => "enum",
            Value::Composite(_) => "composite",
        }
    }

    /// Text of string and enum values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(text) | Value::Enum(text) => Some(text),
            _ => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Boolean(_) => 0,
            Value::Byte(_) => 1,
            Value::Bytes(_) => 2,
            Value::Text(_) => 3,
            Value::Integer(_) => 4,
            Value::Long(_) => 5,
            Value::Uuid(_) => 6,
            Value::Date(_) => 7,
            Value::Float(_) => 8,
            Value::Double(_) => 9,
            Value::Decimal(_) => 10,
            Value::BigInteger(_) => 11,
            Value::Char(_) => 12,
            Value::Short(_) => 13,
            Value::Enum(_) => 14,
            Value::Composite(_) => 15,
        }
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
            (Value::Byte(a), Value::Byte(b)) => a.cmp(b),
            (Value::Bytes(a), Value::Bytes(b)) => a.cmp(b),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (Value::Integer(a), Value::Integer(b)) => a.cmp(b),
            (Value::Long(a), Value::Long(b)) => a.cmp(b),
            (Value::Uuid(a), Value::Uuid(b)) => a.cmp(b),
            (Value::Date(a), Value::Date(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => a.total_cmp(b),
            (Value::Double(a), Value::Double(b)) => a.total_cmp(b),
            (Value::Decimal(a), Value::Decimal(b)) => a.cmp(b),
            (Value::BigInteger(a), Value::BigInteger(b)) => a.cmp(b),
            (Value::Char(a), Value::Char(b)) => a.cmp(b),
            (Value::Short(a), Value::Short(b)) => a.cmp(b),
            (Value::Enum(a), Value::Enum(b)) => a.cmp(b),
            (Value::Composite(a), Value::Composite(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Boolean(v) => write!(f, "{}", v),
            Value::Byte(v) => write!(f, "{}", v),
            Value::Bytes(bytes) => {
                for byte in bytes {
                    write!(f, "{:02x}", byte)?;
                }
                Ok(())
            }
            Value::Text(v) | Value::Enum(v) => f.write_str(v),
            Value::Integer(v) => write!(f, "{}", v),
            Value::Long(v) => write!(f, "{}", v),
            Value::Uuid(v) => write!(f, "{}", v),
            Value::Date(v) => write!(f, "{}", v.to_rfc3339()),
            Value::Float(v) => write!(f, "{}", v),
            Value::Double(v) => write!(f, "{}", v),
            Value::Decimal(v) => write!(f, "{}", v),
            Value::BigInteger(v) => write!(f, "{}", v),
            Value::Char(v) => write!(f, "{}", v),
            Value::Short(v) => write!(f, "{}", v),
            Value::Composite(components) => {
                f.write_str("(")?;
                for (position, component) in components.iter().enumerate() {
                    if position > 0 {
                        f.write_str(", ")?;
                    }
                    match component {
                        Some(value) => write!(f, "{}", value)?,
                        None => f.write_str("null")?,
                    }
                }
                f.write_str(")")
            }
        }
    }
}

/// Arbitrary precision decimal limited to a 128-bit unscaled value.
///
/// The numeric value is `unscaled * 10^-scale`. Equality is numeric: `1.0 == 1.00`.
#[derive(Debug, Clone, Copy)]
pub struct Decimal {
    unscaled: i128,
    scale: i32,
}

impl Decimal {
    pub fn new(unscaled: i128, scale: i32) -> Self {
        Self { unscaled, scale }
    }

    pub fn unscaled(&self) -> i128 {
        self.unscaled
    }

    pub fn scale(&self) -> i32 {
        self.scale
    }

    pub fn to_f64(&self) -> f64 {
        self.unscaled as f64 / 10f64.powi(self.scale)
    }

    fn rescaled(&self, scale: i32) -> Option<i128> {
        let exponent = u32::try_from(i64::from(scale) - i64::from(self.scale)).ok()?;
        10i128.checked_pow(exponent)?.checked_mul(self.unscaled)
    }
}

impl Ord for Decimal {
    fn cmp(&self, other: &Self) -> Ordering {
        let scale = self.scale.max(other.scale);
        match (self.rescaled(scale), other.rescaled(scale)) {
            (Some(a), Some(b)) => a.cmp(&b),
            _ => self.to_f64().total_cmp(&other.to_f64()),
        }
    }
}

impl PartialOrd for Decimal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Decimal {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Decimal {}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.scale <= 0 {
            write!(f, "{}", self.unscaled)?;
            for _ in 0..self.scale.unsigned_abs() {
                f.write_str("0")?;
            }
            return Ok(());
        }

        let digits = self.unscaled.unsigned_abs().to_string();
        let scale = self.scale as usize;
        let sign = if self.unscaled < 0 { "-" } else { "" };
        if digits.len() > scale {
            let (integer, fraction) = digits.split_at(digits.len() - scale);
            write!(f, "{}{}.{}", sign, integer, fraction)
        } else {
            write!(f, "{}0.{}{}", sign, "0".repeat(scale - digits.len()), digits)
        }
    }
}
