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

//! Columns and rows as seen by callers of the client.

use crate::core::{CodecError, Result};
use crate::keyspace::{ColumnType, DataType, Value};

/// A named, optionally valued cell.
///
/// A column without value (a marker) is still a column: it exists in the row and is
/// returned by reads. Absence of the column itself is expressed with `Option<Column>`.
#[derive(Debug, Clone, PartialEq)]
pub struct Column<C, D = Value> {
    name: C,
    value: Option<D>,
}

impl<C, D> Column<C, D> {
    pub fn new(name: C, value: D) -> Self {
        Self {
            name,
            value: Some(value),
        }
    }

    pub fn marker(name: C) -> Self {
        Self { name, value: None }
    }

    pub fn with_optional_value(name: C, value: Option<D>) -> Self {
        Self { name, value }
    }

    pub fn name(&self) -> &C {
        &self.name
    }

    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }

    pub fn value(&self) -> Result<&D> {
        self.value
            .as_ref()
            .ok_or_else(|| CodecError::MissingValue("column value".to_string()).into())
    }

    pub fn value_opt(&self) -> Option<&D> {
        self.value.as_ref()
    }

    pub fn into_name(self) -> C {
        self.name
    }

    pub fn into_parts(self) -> (C, Option<D>) {
        (self.name, self.value)
    }

    pub fn map_name<N>(self, f: impl FnOnce(C) -> N) -> Column<N, D> {
        Column {
            name: f(self.name),
            value: self.value,
        }
    }
}

impl<C> Column<C, Value> {
    /// Converts the decoded value into `D`.
    pub fn typed<D: ColumnType>(self) -> Result<Column<C, D>> {
        let value = match self.value {
            None => None,
            value => Some(D::from_value(value)?),
        };
        Ok(Column {
            name: self.name,
            value,
        })
    }
}

impl<C, D: ColumnType> Column<C, D> {
    pub fn into_dynamic(self) -> Column<C, Value> {
        Column {
            name: self.name,
            value: self.value.and_then(|value| value.to_value()),
        }
    }
}

/// Row read from or written to a column family.
///
/// Columns set on the row and names marked for deletion are written in a single mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct Row<K, C> {
    key: K,
    columns: Vec<Column<C>>,
    deleted_columns: Vec<C>,
}

impl<K, C> Row<K, C> {
    pub fn new(key: K) -> Self {
        Self {
            key,
            columns: Vec::new(),
            deleted_columns: Vec::new(),
        }
    }

    pub(crate) fn with_columns(key: K, columns: Vec<Column<C>>) -> Self {
        Self {
            key,
            columns,
            deleted_columns: Vec::new(),
        }
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn columns(&self) -> &[Column<C>] {
        &self.columns
    }

    pub fn into_columns(self) -> Vec<Column<C>> {
        self.columns
    }

    pub fn deleted_columns(&self) -> &[C] {
        &self.deleted_columns
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl<K, C: PartialEq> Row<K, C> {
    pub fn column(&self, name: &C) -> Option<&Column<C>> {
        self.columns.iter().find(|column| column.name() == name)
    }

    /// Replaces a column with the same name and cancels a pending deletion of it.
    pub fn set_column(&mut self, column: Column<C>) {
        self.deleted_columns.retain(|name| name != column.name());
        match self.columns.iter_mut().find(|c| c.name() == column.name()) {
            Some(existing) => *existing = column,
            None => self.columns.push(column),
        }
    }

    pub fn delete_column(&mut self, name: C) {
        self.columns.retain(|column| column.name() != &name);
        if !self.deleted_columns.contains(&name) {
            self.deleted_columns.push(name);
        }
    }
}

/// Value type of each column, by column name.
pub trait ColumnValueTypeProvider<C>: Send + Sync {
    fn value_type(&self, name: &C) -> DataType;
}

/// Every column of the family holds values of the same type.
#[derive(Debug, Clone)]
pub struct SameTypeProvider(pub DataType);

impl<C> ColumnValueTypeProvider<C> for SameTypeProvider {
    fn value_type(&self, _name: &C) -> DataType {
        self.0.clone()
    }
}

impl<C, F> ColumnValueTypeProvider<C> for F
where
    F: Fn(&C) -> DataType + Send + Sync,
{
    fn value_type(&self, name: &C) -> DataType {
        self(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyspace::BasicType;

    #[test]
    fn test_marker_column() {
        let column: Column<String> = Column::marker("flag".to_string());
        assert!(!column.has_value());
        assert!(column.value().is_err());
        assert_eq!(column.value_opt(), None);
    }

    #[test]
    fn test_typed_conversion() {
        let column = Column::new("age".to_string(), Value::Integer(42));
        let typed = column.typed::<i32>().unwrap();
        assert_eq!(typed.value().unwrap(), &42);
        assert_eq!(typed.into_dynamic().value_opt(), Some(&Value::Integer(42)));

        let wrong = Column::new("age".to_string(), Value::Text("x".into()));
        assert!(wrong.typed::<i32>().is_err());
    }

    #[test]
    fn test_row_set_and_delete() {
        let mut row: Row<String, String> = Row::new("user-1".to_string());
        row.set_column(Column::new("name".into(), Value::Text("Ana".into())));
        row.set_column(Column::new("name".into(), Value::Text("Eva".into())));
        row.delete_column("email".into());
        assert_eq!(row.columns().len(), 1);
        assert_eq!(
            row.column(&"name".to_string()).and_then(Column::value_opt),
            Some(&Value::Text("Eva".into()))
        );
        assert_eq!(row.deleted_columns(), ["email".to_string()]);

        row.set_column(Column::marker("email".into()));
        assert!(row.deleted_columns().is_empty());

        row.delete_column("name".into());
        assert!(row.column(&"name".to_string()).is_none());
    }

    #[test]
    fn test_value_type_providers() {
        let same = SameTypeProvider(DataType::Basic(BasicType::Long));
        assert_eq!(ColumnValueTypeProvider::<String>::value_type(&same, &"a".into()), DataType::Basic(BasicType::Long));

        let by_name = |name: &String| {
            if name == "age" {
                DataType::Basic(BasicType::Integer)
            } else {
                DataType::STRING_UTF8
            }
        };
        assert_eq!(by_name.value_type(&"age".to_string()), DataType::Basic(BasicType::Integer));
        assert_eq!(by_name.value_type(&"name".to_string()), DataType::STRING_UTF8);
    }
}
