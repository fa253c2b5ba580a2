use std::{fmt::Display, path::Path, str::FromStr};

use thiserror::Error;

use crate::types::types::{StorageType, Values};

/// The classic-family container variants a dataset can be created in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    Classic,
    Offset64,
}

impl Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Format::Classic => write!(f, "NETCDF3_CLASSIC"),
            Format::Offset64 => write!(f, "NETCDF3_64BIT"),
        }
    }
}

impl FromStr for Format {
    type Err = BackendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "NETCDF3_CLASSIC" => Ok(Format::Classic),
            "NETCDF3_64BIT" | "NETCDF3_64BIT_OFFSET" => Ok(Format::Offset64),
            _ => Err(BackendError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// Who an attribute is attached to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeOwner {
    Global,
    Variable(String),
}

impl Display for AttributeOwner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttributeOwner::Global => write!(f, ""),
            AttributeOwner::Variable(name) => write!(f, "{}", name),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BackendError {
    #[error("cannot create dataset {path:?}: {reason}")]
    Create { path: String, reason: String },
    #[error("unsupported format {0:?}")]
    UnsupportedFormat(String),
    #[error("dataset is closed")]
    Closed,
    #[error("dimension {0:?} already exists")]
    DimensionExists(String),
    #[error("dimension {0:?} not found")]
    DimensionNotFound(String),
    #[error("an unlimited dimension already exists")]
    UnlimitedExists,
    #[error("variable {0:?} already exists")]
    VariableExists(String),
    #[error("variable {0:?} not found")]
    VariableNotFound(String),
    #[error("{variable:?} stores {expected} values, received {received}")]
    DataType {
        variable: String,
        expected: StorageType,
        received: StorageType,
    },
    #[error("variable {0:?} has too many elements to address")]
    VariableTooLarge(String),
    #[error("{variable:?} holds {capacity} values, received {received}")]
    DataOverflow {
        variable: String,
        capacity: usize,
        received: usize,
    },
}

/// Creates datasets. One `create` call happens per parse.
pub trait Backend {
    type Dataset: Dataset;

    fn create(&self, path: &Path, format: Format) -> Result<Self::Dataset, BackendError>;
}

/// An open dataset receiving structural operations and data.
pub trait Dataset {
    /// `None` declares the unlimited dimension.
    fn create_dimension(&mut self, name: &str, length: Option<usize>) -> Result<(), BackendError>;

    fn create_variable(
        &mut self,
        name: &str,
        storage_type: StorageType,
        dimensions: &[String],
    ) -> Result<(), BackendError>;

    fn set_attribute(
        &mut self,
        owner: &AttributeOwner,
        name: &str,
        value: Values,
    ) -> Result<(), BackendError>;

    /// Writes `values` in row-major order from the start of the variable. Positions
    /// past the end of `values` keep the backend's fill.
    fn write_variable_data(&mut self, name: &str, values: Values) -> Result<(), BackendError>;

    fn close(&mut self) -> Result<(), BackendError>;
}
