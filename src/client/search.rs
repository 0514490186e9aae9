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

//! Conditions resolved through native secondary indexes.

use super::driver::IndexExpression;
use crate::core::{Result, SchemaError};
use crate::keyspace::{serializer_for, to_bytes, ColumnType, DataType, Value};

/// Rows whose `column_name` column equals `value`.
#[derive(Debug, Clone, PartialEq)]
pub struct EqualityCondition<C, V> {
    column_name: C,
    value: V,
}

impl<C: ColumnType, V: ColumnType> EqualityCondition<C, V> {
    pub fn new(column_name: C, value: V) -> Self {
        Self { column_name, value }
    }

    pub fn column_name(&self) -> &C {
        &self.column_name
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    pub(crate) fn expression(&self) -> Result<IndexExpression> {
        Ok(IndexExpression {
            column_name: to_bytes(&self.column_name)?,
            values: vec![to_bytes(&self.value)?],
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetMode {
    In,
    NotIn,
}

/// Rows whose `column_name` column is (or is not) one of `values`.
#[derive(Debug, Clone, PartialEq)]
pub struct SetCondition<C, V> {
    column_name: C,
    values: Vec<V>,
    mode: SetMode,
}

impl<C: ColumnType, V: ColumnType> SetCondition<C, V> {
    pub fn new(column_name: C, values: Vec<V>, mode: SetMode) -> Self {
        Self {
            column_name,
            values,
            mode,
        }
    }

    pub fn column_name(&self) -> &C {
        &self.column_name
    }

    pub fn values(&self) -> &[V] {
        &self.values
    }

    pub fn mode(&self) -> SetMode {
        self.mode
    }

    /// `NotIn` is only answerable over an enumerable domain, where it becomes `In` over
    /// the remaining constants.
    pub(crate) fn expression(&self) -> Result<IndexExpression> {
        let column_name = to_bytes(&self.column_name)?;
        let values = match self.mode {
            SetMode::In => self.values.iter().map(to_bytes).collect::<Result<Vec<_>>>()?,
            SetMode::NotIn => {
                let data_type = V::data_type();
                let enum_type = match &data_type {
                    DataType::Enum(enum_type) => enum_type,
                    other => return Err(SchemaError::NotEnumerable(other.to_string()).into()),
                };
                let excluded: Vec<Option<Value>> =
                    self.values.iter().map(ColumnType::to_value).collect();
                let serializer = serializer_for(&data_type);
                let mut values = Vec::new();
                for constant in enum_type.constants() {
                    let value = Some(Value::Enum(constant.clone()));
                    if !excluded.contains(&value) {
                        values.push(serializer.encode(value.as_ref())?);
                    }
                }
                values
            }
        };
        Ok(IndexExpression {
            column_name,
            values,
        })
    }
}
