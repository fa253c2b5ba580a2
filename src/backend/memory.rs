use std::{
    fmt::Display,
    path::{Path, PathBuf},
};

use crate::types::types::{default_fill_value, StorageType, Values, FILL_VALUE_ATTRIBUTE};

use super::backend::{AttributeOwner, Backend, BackendError, Dataset, Format};

/// A backend that keeps datasets in memory. Reads honour netCDF fill semantics: any
/// position never written reads back as the variable's `_FillValue`, or the type's
/// default fill.
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryBackend;

impl Backend for MemoryBackend {
    type Dataset = MemoryDataset;

    fn create(&self, path: &Path, format: Format) -> Result<MemoryDataset, BackendError> {
        if path.as_os_str().is_empty() {
            return Err(BackendError::Create {
                path: String::new(),
                reason: String::from("empty path"),
            });
        }

        Ok(MemoryDataset {
            path: path.to_path_buf(),
            format,
            dimensions: vec![],
            variables: vec![],
            attributes: vec![],
            open: true,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub value: Values,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dimension {
    name: String,
    length: usize,
    unlimited: bool,
}

impl Dimension {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The current length. For the unlimited dimension this is the number of records
    /// written so far.
    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn is_unlimited(&self) -> bool {
        self.unlimited
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    name: String,
    storage_type: StorageType,
    dimensions: Vec<String>,
    attributes: Vec<Attribute>,
    written: Values,
}

impl Variable {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn storage_type(&self) -> StorageType {
        self.storage_type
    }

    pub fn dimensions(&self) -> &[String] {
        &self.dimensions
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&Values> {
        find_attribute(&self.attributes, name)
    }

    /// The effective fill value: `_FillValue` when it has the variable's type,
    /// otherwise the type default.
    pub fn fill_value(&self) -> Values {
        match self.attribute(FILL_VALUE_ATTRIBUTE) {
            Some(fill) if fill.storage_type() == self.storage_type && !fill.is_empty() => {
                fill.clone()
            }
            _ => default_fill_value(self.storage_type),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemoryDataset {
    path: PathBuf,
    format: Format,
    dimensions: Vec<Dimension>,
    variables: Vec<Variable>,
    attributes: Vec<Attribute>,
    open: bool,
}

impl MemoryDataset {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    pub fn dimension(&self, name: &str) -> Option<&Dimension> {
        self.dimensions.iter().find(|dimension| dimension.name == name)
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.iter().find(|variable| variable.name == name)
    }

    pub fn global_attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn global_attribute(&self, name: &str) -> Option<&Values> {
        find_attribute(&self.attributes, name)
    }

    /// The current shape of a variable, with the unlimited dimension at its current
    /// record count. Scalars have an empty shape.
    pub fn shape(&self, name: &str) -> Result<Vec<usize>, BackendError> {
        let variable = self
            .variable(name)
            .ok_or_else(|| BackendError::VariableNotFound(name.to_string()))?;

        variable
            .dimensions
            .iter()
            .map(|dimension| {
                self.dimension(dimension)
                    .map(Dimension::len)
                    .ok_or_else(|| BackendError::DimensionNotFound(dimension.clone()))
            })
            .collect()
    }

    /// Reads back the whole variable in row-major order. Unwritten positions hold the
    /// effective fill value.
    pub fn read(&self, name: &str) -> Result<Values, BackendError> {
        let size = self
            .shape(name)?
            .iter()
            .try_fold(1usize, |size, length| size.checked_mul(*length))
            .ok_or_else(|| BackendError::VariableTooLarge(name.to_string()))?;
        let variable = self
            .variable(name)
            .ok_or_else(|| BackendError::VariableNotFound(name.to_string()))?;

        let mut data = variable.written.clone();
        data.resize(size.max(data.len()), &variable.fill_value());
        Ok(data)
    }

    fn ensure_open(&self) -> Result<(), BackendError> {
        if self.open {
            Ok(())
        } else {
            Err(BackendError::Closed)
        }
    }

    fn unlimited(&self) -> Option<&Dimension> {
        self.dimensions.iter().find(|dimension| dimension.unlimited)
    }

    /// Number of values in one record of `variable`, or in the whole variable when it
    /// does not use the unlimited dimension.
    fn record_size(&self, variable: &Variable) -> Result<(bool, usize), BackendError> {
        let is_record = match (variable.dimensions.first(), self.unlimited()) {
            (Some(first), Some(unlimited)) => *first == unlimited.name,
            _ => false,
        };

        let skip = if is_record { 1 } else { 0 };
        let size = self.element_count(&variable.name, &variable.dimensions[skip..])?;

        Ok((is_record, size))
    }

    fn element_count(&self, name: &str, dimensions: &[String]) -> Result<usize, BackendError> {
        let mut size: usize = 1;
        for dimension in dimensions {
            let length = self
                .dimension(dimension)
                .ok_or_else(|| BackendError::DimensionNotFound(dimension.clone()))?
                .length;
            size = size
                .checked_mul(length)
                .ok_or_else(|| BackendError::VariableTooLarge(name.to_string()))?;
        }

        Ok(size)
    }
}

fn find_attribute<'a>(attributes: &'a [Attribute], name: &str) -> Option<&'a Values> {
    attributes
        .iter()
        .find(|attribute| attribute.name == name)
        .map(|attribute| &attribute.value)
}

fn upsert_attribute(attributes: &mut Vec<Attribute>, name: &str, value: Values) {
    match attributes.iter_mut().find(|attribute| attribute.name == name) {
        Some(attribute) => attribute.value = value,
        None => attributes.push(Attribute {
            name: name.to_string(),
            value,
        }),
    }
}

impl Dataset for MemoryDataset {
    fn create_dimension(&mut self, name: &str, length: Option<usize>) -> Result<(), BackendError> {
        self.ensure_open()?;
        if self.dimension(name).is_some() {
            return Err(BackendError::DimensionExists(name.to_string()));
        }
        if length.is_none() && self.unlimited().is_some() {
            return Err(BackendError::UnlimitedExists);
        }

        self.dimensions.push(Dimension {
            name: name.to_string(),
            length: length.unwrap_or(0),
            unlimited: length.is_none(),
        });
        Ok(())
    }

    fn create_variable(
        &mut self,
        name: &str,
        storage_type: StorageType,
        dimensions: &[String],
    ) -> Result<(), BackendError> {
        self.ensure_open()?;
        if self.variable(name).is_some() {
            return Err(BackendError::VariableExists(name.to_string()));
        }
        if let Some(missing) = dimensions.iter().find(|d| self.dimension(d).is_none()) {
            return Err(BackendError::DimensionNotFound(missing.clone()));
        }
        let fixed: Vec<String> = dimensions
            .iter()
            .filter(|d| self.dimension(d).is_some_and(|d| !d.unlimited))
            .cloned()
            .collect();
        self.element_count(name, &fixed)?;

        self.variables.push(Variable {
            name: name.to_string(),
            storage_type,
            dimensions: dimensions.to_vec(),
            attributes: vec![],
            written: Values::with_type(storage_type),
        });
        Ok(())
    }

    fn set_attribute(
        &mut self,
        owner: &AttributeOwner,
        name: &str,
        value: Values,
    ) -> Result<(), BackendError> {
        self.ensure_open()?;
        match owner {
            AttributeOwner::Global => upsert_attribute(&mut self.attributes, name, value),
            AttributeOwner::Variable(variable) => {
                let variable = self
                    .variables
                    .iter_mut()
                    .find(|v| v.name == *variable)
                    .ok_or_else(|| BackendError::VariableNotFound(variable.clone()))?;
                upsert_attribute(&mut variable.attributes, name, value);
            }
        }
        Ok(())
    }

    fn write_variable_data(&mut self, name: &str, values: Values) -> Result<(), BackendError> {
        self.ensure_open()?;
        let index = self
            .variables
            .iter()
            .position(|variable| variable.name == name)
            .ok_or_else(|| BackendError::VariableNotFound(name.to_string()))?;

        let variable = &self.variables[index];
        if values.storage_type() != variable.storage_type {
            return Err(BackendError::DataType {
                variable: name.to_string(),
                expected: variable.storage_type,
                received: values.storage_type(),
            });
        }

        let (is_record, record_size) = self.record_size(variable)?;
        if is_record {
            let records = if record_size == 0 {
                0
            } else {
                values.len().div_ceil(record_size)
            };
            if let Some(unlimited) = self.dimensions.iter_mut().find(|d| d.unlimited) {
                unlimited.length = unlimited.length.max(records);
            }
        } else if values.len() > record_size {
            return Err(BackendError::DataOverflow {
                variable: name.to_string(),
                capacity: record_size,
                received: values.len(),
            });
        }

        let variable = &mut self.variables[index];
        let fill = variable.fill_value();
        variable
            .written
            .overwrite_prefix(&values, &fill)
            .map_err(|_| BackendError::DataType {
                variable: name.to_string(),
                expected: variable.storage_type,
                received: values.storage_type(),
            })
    }

    fn close(&mut self) -> Result<(), BackendError> {
        self.ensure_open()?;
        self.open = false;
        Ok(())
    }
}

impl Display for MemoryDataset {
    /// Renders the dataset header in CDL, the way `ncdump -h` does.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = self
            .path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();

        writeln!(f, "netcdf {} {{", name)?;
        if !self.dimensions.is_empty() {
            writeln!(f, "dimensions:")?;
            for dimension in &self.dimensions {
                if dimension.unlimited {
                    writeln!(
                        f,
                        "\t{} = UNLIMITED ; // ({} currently)",
                        dimension.name, dimension.length
                    )?;
                } else {
                    writeln!(f, "\t{} = {} ;", dimension.name, dimension.length)?;
                }
            }
        }

        if !self.variables.is_empty() {
            writeln!(f, "variables:")?;
            for variable in &self.variables {
                if variable.dimensions.is_empty() {
                    writeln!(f, "\t{} {} ;", variable.storage_type, variable.name)?;
                } else {
                    writeln!(
                        f,
                        "\t{} {}({}) ;",
                        variable.storage_type,
                        variable.name,
                        variable.dimensions.join(", ")
                    )?;
                }
                for attribute in &variable.attributes {
                    writeln!(
                        f,
                        "\t\t{}:{} = {} ;",
                        variable.name, attribute.name, attribute.value
                    )?;
                }
            }
        }

        if !self.attributes.is_empty() {
            writeln!(f, "\n// global attributes:")?;
            for attribute in &self.attributes {
                writeln!(f, "\t\t:{} = {} ;", attribute.name, attribute.value)?;
            }
        }

        write!(f, "}}")
    }
}
