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

//! Error taxonomy.
//!
//! Absence of a row or a column is never an error: reads return `Option` or an empty
//! collection. Everything else surfaces as a [`WideIndexError`].

use thiserror::Error;

pub type Result<T> = std::result::Result<T, WideIndexError>;

#[derive(Error, Debug)]
pub enum WideIndexError {
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl WideIndexError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Schema errors indicate an incompatible type definition or a programming error.
    /// Retrying the same call can never succeed.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Schema(_) | Self::Config(_))
    }
}

/// Faults reaching or talking to the underlying store. Never retried by this crate.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Driver error: {0}")]
    Driver(#[from] anyhow::Error),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Unknown keyspace: {0}")]
    UnknownKeyspace(String),

    #[error("Unknown column family: {0}")]
    UnknownColumnFamily(String),

    #[error("No native secondary index on column {column} of column family {family}")]
    MissingNativeIndex { family: String, column: String },

    #[error("Incompatible composite definition: {0}")]
    IncompatibleComposite(String),

    #[error("Composite components must be basic or enum types, found {0}")]
    NestedComposite(String),

    #[error("Type {0} is not enumerable")]
    NotEnumerable(String),

    #[error("Indexes with different sort criteria cannot be integrated: expected {expected}, found {found}")]
    IncompatibleIndexes { expected: String, found: String },

    #[error("Invalid partition count {0}: must be greater than one")]
    InvalidPartitionCount(u32),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Invalid length for {data_type}: expected {expected} bytes, found {actual}")]
    InvalidLength {
        data_type: String,
        expected: usize,
        actual: usize,
    },

    #[error("Truncated buffer while decoding {0}")]
    Truncated(String),

    #[error("Invalid UTF-8 data: {0}")]
    InvalidUtf8(String),

    #[error("Cannot encode {found} as {expected}")]
    TypeMismatch { expected: String, found: String },

    #[error("Missing value for {0}")]
    MissingValue(String),

    #[error("Composite component too large: {0} bytes")]
    ComponentTooLarge(usize),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration value: {field} = {value}")]
    InvalidValue { field: String, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_errors_are_fatal() {
        let error: WideIndexError = SchemaError::InvalidPartitionCount(1).into();
        assert!(error.is_fatal());

        let error = WideIndexError::invalid_argument("size must be positive");
        assert!(!error.is_fatal());
        assert_eq!(error.to_string(), "Invalid argument: size must be positive");
    }

    #[test]
    fn test_driver_errors_wrap_cause() {
        let error: WideIndexError =
            PersistenceError::from(anyhow::anyhow!("connection refused")).into();
        assert!(matches!(error, WideIndexError::Persistence(PersistenceError::Driver(_))));
        assert!(error.to_string().contains("connection refused"));
    }
}
