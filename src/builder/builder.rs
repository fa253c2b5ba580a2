use std::{collections::HashMap, path::PathBuf};

use tracing::{debug, info, warn};

use crate::{
    backend::{AttributeOwner, Backend, BackendError, Dataset, Format},
    errors::errors::ErrorImpl,
    types::types::{
        default_fill_value, Constant, Datum, StorageType, Values, FILL_STRING,
        FILL_VALUE_ATTRIBUTE,
    },
};

/// The right-hand side of a dimension declaration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DimensionLength {
    /// A numeric length as written. Must be a positive integer.
    Fixed(f64),
    Unlimited,
}

#[derive(Debug, Clone)]
struct DeclaredDimension {
    /// `None` for the unlimited dimension.
    length: Option<usize>,
}

#[derive(Debug, Clone)]
struct DeclaredVariable {
    storage_type: StorageType,
    dimensions: Vec<String>,
    fill_value: Option<Values>,
}

/// Applies recognised declarations to a dataset as the parse proceeds.
///
/// The builder validates each declaration against what has been declared so far
/// before forwarding it to the backend, so the backend only ever sees a consistent
/// sequence of operations.
pub struct Builder<B: Backend> {
    backend: B,
    path: PathBuf,
    format: Format,
    dataset: Option<B::Dataset>,
    current_variable: Option<String>,
    dimension_count: usize,
    unlimited_dimension: Option<String>,
    pending_type: Option<StorageType>,
    dimension_lookup: HashMap<String, DeclaredDimension>,
    variable_lookup: HashMap<String, DeclaredVariable>,
}

impl<B: Backend> Builder<B> {
    pub fn new(backend: B, path: PathBuf, format: Format) -> Self {
        Builder {
            backend,
            path,
            format,
            dataset: None,
            current_variable: None,
            dimension_count: 0,
            unlimited_dimension: None,
            pending_type: None,
            dimension_lookup: HashMap::new(),
            variable_lookup: HashMap::new(),
        }
    }

    pub fn dataset(&self) -> Option<&B::Dataset> {
        self.dataset.as_ref()
    }

    pub fn current_variable(&self) -> Option<&str> {
        self.current_variable.as_deref()
    }

    pub fn dimension_count(&self) -> usize {
        self.dimension_count
    }

    pub fn unlimited_dimension(&self) -> Option<&str> {
        self.unlimited_dimension.as_deref()
    }

    fn dataset_mut(&mut self) -> Result<&mut B::Dataset, ErrorImpl> {
        self.dataset
            .as_mut()
            .ok_or(ErrorImpl::Backend(BackendError::Closed))
    }

    pub fn begin_dataset(&mut self, name: &str) -> Result<(), ErrorImpl> {
        let dataset = self.backend.create(&self.path, self.format)?;
        self.dataset = Some(dataset);

        info!(
            "Initialised netCDF file {} for dataset {} ({})",
            self.path.display(),
            name,
            self.format
        );
        Ok(())
    }

    pub fn declare_dimension(
        &mut self,
        name: &str,
        length: DimensionLength,
    ) -> Result<(), ErrorImpl> {
        if self.dimension_lookup.contains_key(name) {
            return Err(ErrorImpl::DimensionAlreadyDeclared {
                dimension: name.to_string(),
            });
        }

        let length = match length {
            DimensionLength::Unlimited => {
                if self.unlimited_dimension.is_some() {
                    return Err(ErrorImpl::MultipleUnlimitedDimensions {
                        dimension: name.to_string(),
                    });
                }
                None
            }
            DimensionLength::Fixed(value) => {
                if !value.is_finite()
                    || value.fract() != 0.0
                    || value < 1.0
                    || value > u32::MAX as f64
                {
                    return Err(ErrorImpl::InvalidDimensionLength {
                        dimension: name.to_string(),
                        length: value.to_string(),
                    });
                }
                Some(value as usize)
            }
        };

        self.dataset_mut()?.create_dimension(name, length)?;

        self.dimension_lookup
            .insert(name.to_string(), DeclaredDimension { length });
        self.dimension_count += 1;
        if length.is_none() {
            self.unlimited_dimension = Some(name.to_string());
        }

        match length {
            Some(length) => info!("Created dimension {} with length {}", name, length),
            None => info!("Created dimension {} with length UNLIMITED", name),
        }
        Ok(())
    }

    /// Sets the type for the variables declared on the current line.
    pub fn set_storage_type(&mut self, storage_type: StorageType) {
        self.pending_type = Some(storage_type);
    }

    pub fn declare_variable(
        &mut self,
        name: &str,
        dimensions: Vec<String>,
    ) -> Result<(), ErrorImpl> {
        let storage_type = self.pending_type.ok_or_else(|| ErrorImpl::UnknownType {
            type_: String::new(),
        })?;

        if self.variable_lookup.contains_key(name) {
            return Err(ErrorImpl::VariableAlreadyDeclared {
                variable: name.to_string(),
            });
        }

        for (index, dimension) in dimensions.iter().enumerate() {
            if !self.dimension_lookup.contains_key(dimension) {
                return Err(ErrorImpl::DimensionNotDeclared {
                    dimension: dimension.clone(),
                });
            }
            if index > 0 && self.unlimited_dimension.as_ref() == Some(dimension) {
                return Err(ErrorImpl::UnlimitedDimensionNotFirst {
                    variable: name.to_string(),
                    dimension: dimension.clone(),
                });
            }
        }

        if self.fixed_size(&dimensions).is_none() {
            return Err(ErrorImpl::VariableTooLarge {
                variable: name.to_string(),
            });
        }

        self.dataset_mut()?
            .create_variable(name, storage_type, &dimensions)?;

        info!(
            "Created variable {} with data type {} and dimensions {:?}",
            name, storage_type, dimensions
        );

        self.variable_lookup.insert(
            name.to_string(),
            DeclaredVariable {
                storage_type,
                dimensions,
                fill_value: None,
            },
        );
        self.current_variable = Some(name.to_string());
        Ok(())
    }

    pub fn set_attribute(
        &mut self,
        owner: AttributeOwner,
        name: &str,
        constants: &[Constant],
    ) -> Result<(), ErrorImpl> {
        let values = Values::from_constants(constants)?;

        if let AttributeOwner::Variable(variable_name) = &owner {
            let variable = self.variable_lookup.get_mut(variable_name).ok_or_else(|| {
                ErrorImpl::VariableNotDeclared {
                    variable: variable_name.clone(),
                }
            })?;

            if name == FILL_VALUE_ATTRIBUTE {
                if values.len() != 1 || values.storage_type() != variable.storage_type {
                    return Err(ErrorImpl::FillValueMismatch {
                        variable: variable_name.clone(),
                        expected: variable.storage_type.name().to_string(),
                    });
                }
                variable.fill_value = Some(values.clone());
            }

            self.current_variable = Some(variable_name.clone());
        }

        debug!("Attribute {}:{} = {}", owner, name, values);
        self.dataset_mut()?.set_attribute(&owner, name, values)?;

        match owner {
            AttributeOwner::Global => info!("Created global attribute {}", name),
            AttributeOwner::Variable(variable) => {
                info!("Created var attribute {} for variable {}", name, variable)
            }
        }
        Ok(())
    }

    pub fn write_data(&mut self, name: &str, data: &[Datum]) -> Result<(), ErrorImpl> {
        let variable = self
            .variable_lookup
            .get(name)
            .cloned()
            .ok_or_else(|| ErrorImpl::VariableNotDeclared {
                variable: name.to_string(),
            })?;
        self.current_variable = Some(name.to_string());

        let values = match variable.storage_type {
            StorageType::Char => self.char_values(&variable, data)?,
            _ => numeric_values(&variable, data)?,
        };

        if !self.is_record(&variable) {
            let capacity = self
                .fixed_size(&variable.dimensions)
                .ok_or_else(|| ErrorImpl::VariableTooLarge {
                    variable: name.to_string(),
                })?;
            if values.len() > capacity {
                return Err(ErrorImpl::TooManyValues {
                    variable: name.to_string(),
                    expected: capacity,
                    received: values.len(),
                });
            }
        }

        self.dataset_mut()?.write_variable_data(name, values)?;

        info!("Set data values for variable {}", name);
        Ok(())
    }

    /// Closes the dataset and hands it back. Returns `None` once already closed.
    pub fn end_dataset(&mut self) -> Result<Option<B::Dataset>, ErrorImpl> {
        let Some(mut dataset) = self.dataset.take() else {
            return Ok(None);
        };

        dataset.close()?;
        info!("Closed netCDF file {}", self.path.display());
        Ok(Some(dataset))
    }

    /// Closes and drops any open dataset after a failed parse.
    pub fn abort(&mut self) {
        if let Some(mut dataset) = self.dataset.take() {
            match dataset.close() {
                Ok(()) => debug!("Closed netCDF file {} after error", self.path.display()),
                Err(error) => warn!("Failed to close {}: {}", self.path.display(), error),
            }
        }
    }

    fn is_record(&self, variable: &DeclaredVariable) -> bool {
        match (variable.dimensions.first(), &self.unlimited_dimension) {
            (Some(first), Some(unlimited)) => first == unlimited,
            _ => false,
        }
    }

    /// Product of the fixed dimension lengths, skipping the unlimited one. `None`
    /// when it overflows.
    fn fixed_size(&self, dimensions: &[String]) -> Option<usize> {
        dimensions
            .iter()
            .filter_map(|dimension| self.dimension_lookup.get(dimension))
            .filter_map(|dimension| dimension.length)
            .try_fold(1usize, |size, length| size.checked_mul(length))
    }

    /// Flattens a char data list. Each string is padded with NULs to a whole number
    /// of rows of the last dimension; scalars and unlimited rows are not padded.
    fn char_values(
        &self,
        variable: &DeclaredVariable,
        data: &[Datum],
    ) -> Result<Values, ErrorImpl> {
        let row = variable
            .dimensions
            .last()
            .and_then(|dimension| self.dimension_lookup.get(dimension))
            .and_then(|dimension| dimension.length);

        let mut bytes = Vec::new();
        for datum in data {
            match datum {
                Datum::Fill => bytes.extend_from_slice(FILL_STRING.as_bytes()),
                Datum::Const(Constant::Text(text)) => {
                    bytes.extend_from_slice(text.as_bytes());
                    if let Some(row) = row {
                        let padded = text.len().div_ceil(row).max(1) * row;
                        bytes.resize(bytes.len() + padded - text.len(), 0);
                    }
                }
                Datum::Const(constant) => {
                    let mut single = Values::with_type(StorageType::Char);
                    single.push_constant(constant)?;
                    if let Values::Char(single) = single {
                        bytes.extend(single);
                    }
                }
            }
        }

        Ok(Values::Char(bytes))
    }
}

fn numeric_values(variable: &DeclaredVariable, data: &[Datum]) -> Result<Values, ErrorImpl> {
    let fill = variable
        .fill_value
        .clone()
        .unwrap_or_else(|| default_fill_value(variable.storage_type));

    let mut values = Values::with_type(variable.storage_type);
    for datum in data {
        match datum {
            Datum::Fill => values.push_first_of(&fill)?,
            Datum::Const(constant) => values.push_constant(constant)?,
        }
    }

    Ok(values)
}
