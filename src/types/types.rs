use std::fmt::Display;

use crate::errors::errors::ErrorImpl;

// Default fill values for netCDF-3 data types, as defined in netcdf.h
pub const NC_FILL_BYTE: i8 = -127;
pub const NC_FILL_CHAR: u8 = 0;
pub const NC_FILL_SHORT: i16 = -32767;
pub const NC_FILL_INT: i32 = -2147483647;
pub const NC_FILL_FLOAT: f32 = 9.969_209_968_386_869e36_f64 as f32;
pub const NC_FILL_DOUBLE: f64 = 9.969_209_968_386_869e36;

/// The literal marker used in a data list to request the fill value.
pub const FILL_STRING: &str = "_";

/// The name of the attribute that overrides a variable's default fill value.
pub const FILL_VALUE_ATTRIBUTE: &str = "_FillValue";

pub const XDR_INT_MIN: i64 = i32::MIN as i64;
pub const XDR_INT_MAX: i64 = i32::MAX as i64;

/// The six netCDF-3 storage types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageType {
    Byte,
    Char,
    Short,
    Int,
    Float,
    Double,
}

impl StorageType {
    pub fn name(&self) -> &'static str {
        match self {
            StorageType::Byte => "byte",
            StorageType::Char => "char",
            StorageType::Short => "short",
            StorageType::Int => "int",
            StorageType::Float => "float",
            StorageType::Double => "double",
        }
    }

    /// Inclusive range of an integral type, `None` for floating point types.
    pub fn range(&self) -> Option<(i64, i64)> {
        match self {
            StorageType::Byte => Some((i8::MIN as i64, i8::MAX as i64)),
            StorageType::Char => Some((0, u8::MAX as i64)),
            StorageType::Short => Some((i16::MIN as i64, i16::MAX as i64)),
            StorageType::Int => Some((XDR_INT_MIN, XDR_INT_MAX)),
            StorageType::Float | StorageType::Double => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        !matches!(self, StorageType::Char)
    }

    fn rank(&self) -> u8 {
        match self {
            StorageType::Byte | StorageType::Char => 0,
            StorageType::Short => 1,
            StorageType::Int => 2,
            StorageType::Float => 3,
            StorageType::Double => 4,
        }
    }

    /// The wider of two numeric types: byte < short < int < float < double.
    pub fn promote(self, other: StorageType) -> StorageType {
        if other.rank() > self.rank() {
            other
        } else {
            self
        }
    }
}

impl Display for StorageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Maps a CDL type keyword to its storage type.
pub fn storage_type_of(keyword: &str) -> Result<StorageType, ErrorImpl> {
    match keyword.to_ascii_lowercase().as_str() {
        "byte" => Ok(StorageType::Byte),
        "char" => Ok(StorageType::Char),
        "short" => Ok(StorageType::Short),
        "int" | "integer" | "long" => Ok(StorageType::Int),
        "float" | "real" => Ok(StorageType::Float),
        "double" => Ok(StorageType::Double),
        _ => Err(ErrorImpl::UnknownType {
            type_: keyword.to_string(),
        }),
    }
}

/// Returns the standard netCDF fill value for a storage type as a single-element array.
pub fn default_fill_value(storage_type: StorageType) -> Values {
    match storage_type {
        StorageType::Byte => Values::Byte(vec![NC_FILL_BYTE]),
        StorageType::Char => Values::Char(vec![NC_FILL_CHAR]),
        StorageType::Short => Values::Short(vec![NC_FILL_SHORT]),
        StorageType::Int => Values::Int(vec![NC_FILL_INT]),
        StorageType::Float => Values::Float(vec![NC_FILL_FLOAT]),
        StorageType::Double => Values::Double(vec![NC_FILL_DOUBLE]),
    }
}

/// Fails if an integral value does not fit `storage_type`. Floating point types are
/// not checked beyond parse-ability.
pub fn validate_range(storage_type: StorageType, value: i64) -> Result<(), ErrorImpl> {
    match storage_type.range() {
        Some((min, max)) if value < min || value > max => Err(ErrorImpl::NumberOutOfRange {
            token: value.to_string(),
            type_: storage_type.name().to_string(),
            min,
            max,
        }),
        _ => Ok(()),
    }
}

/// A typed constant produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Byte(i8),
    Short(i16),
    Int(i32),
    Float(f32),
    Double(f64),
    Text(String),
}

impl Constant {
    pub fn storage_type(&self) -> StorageType {
        match self {
            Constant::Byte(_) => StorageType::Byte,
            Constant::Short(_) => StorageType::Short,
            Constant::Int(_) => StorageType::Int,
            Constant::Float(_) => StorageType::Float,
            Constant::Double(_) => StorageType::Double,
            Constant::Text(_) => StorageType::Char,
        }
    }

    fn integral(&self) -> Option<i64> {
        match self {
            Constant::Byte(value) => Some(*value as i64),
            Constant::Short(value) => Some(*value as i64),
            Constant::Int(value) => Some(*value as i64),
            _ => None,
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Constant::Float(value) => Some(*value as f64),
            Constant::Double(value) => Some(*value),
            _ => self.integral().map(|value| value as f64),
        }
    }

    /// Converts a numeric constant to an integer that fits `target`, truncating
    /// floating point sources.
    fn to_integral(&self, target: StorageType) -> Result<i64, ErrorImpl> {
        let value = match self.integral() {
            Some(value) => value,
            None => {
                let value = self.as_f64().ok_or_else(|| self.mismatch(target))?.trunc();
                if !value.is_finite() || value < i64::MIN as f64 || value > i64::MAX as f64 {
                    return Err(ErrorImpl::NumberOutOfRange {
                        token: self.to_string(),
                        type_: target.name().to_string(),
                        min: target.range().map_or(0, |range| range.0),
                        max: target.range().map_or(0, |range| range.1),
                    });
                }
                value as i64
            }
        };

        validate_range(target, value)?;
        Ok(value)
    }

    fn mismatch(&self, target: StorageType) -> ErrorImpl {
        ErrorImpl::TypeMatchError {
            expected: target.name().to_string(),
            received: self.storage_type().name().to_string(),
        }
    }
}

impl Display for Constant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Constant::Byte(value) => write!(f, "{}b", value),
            Constant::Short(value) => write!(f, "{}s", value),
            Constant::Int(value) => write!(f, "{}", value),
            Constant::Float(value) => write!(f, "{:?}f", value),
            Constant::Double(value) => write!(f, "{:?}", value),
            Constant::Text(value) => write!(f, "{:?}", value),
        }
    }
}

/// One item of a data-section value list.
#[derive(Debug, Clone, PartialEq)]
pub enum Datum {
    Const(Constant),
    /// The `_` marker.
    Fill,
}

/// A homogeneous array of values of one storage type. Used for attribute values
/// and for variable data.
#[derive(Debug, Clone, PartialEq)]
pub enum Values {
    Byte(Vec<i8>),
    Char(Vec<u8>),
    Short(Vec<i16>),
    Int(Vec<i32>),
    Float(Vec<f32>),
    Double(Vec<f64>),
}

impl Values {
    pub fn with_type(storage_type: StorageType) -> Self {
        match storage_type {
            StorageType::Byte => Values::Byte(vec![]),
            StorageType::Char => Values::Char(vec![]),
            StorageType::Short => Values::Short(vec![]),
            StorageType::Int => Values::Int(vec![]),
            StorageType::Float => Values::Float(vec![]),
            StorageType::Double => Values::Double(vec![]),
        }
    }

    /// `len` copies of the first element of `fill`.
    pub fn filled(fill: &Values, len: usize) -> Self {
        match fill {
            Values::Byte(v) => Values::Byte(vec![v.first().copied().unwrap_or(NC_FILL_BYTE); len]),
            Values::Char(v) => Values::Char(vec![v.first().copied().unwrap_or(NC_FILL_CHAR); len]),
            Values::Short(v) => {
                Values::Short(vec![v.first().copied().unwrap_or(NC_FILL_SHORT); len])
            }
            Values::Int(v) => Values::Int(vec![v.first().copied().unwrap_or(NC_FILL_INT); len]),
            Values::Float(v) => {
                Values::Float(vec![v.first().copied().unwrap_or(NC_FILL_FLOAT); len])
            }
            Values::Double(v) => {
                Values::Double(vec![v.first().copied().unwrap_or(NC_FILL_DOUBLE); len])
            }
        }
    }

    pub fn storage_type(&self) -> StorageType {
        match self {
            Values::Byte(_) => StorageType::Byte,
            Values::Char(_) => StorageType::Char,
            Values::Short(_) => StorageType::Short,
            Values::Int(_) => StorageType::Int,
            Values::Float(_) => StorageType::Float,
            Values::Double(_) => StorageType::Double,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Values::Byte(v) => v.len(),
            Values::Char(v) => v.len(),
            Values::Short(v) => v.len(),
            Values::Int(v) => v.len(),
            Values::Float(v) => v.len(),
            Values::Double(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Converts `constant` to this array's type and appends it.
    pub fn push_constant(&mut self, constant: &Constant) -> Result<(), ErrorImpl> {
        let target = self.storage_type();
        if let Constant::Text(_) = constant {
            return Err(constant.mismatch(target));
        }

        match self {
            Values::Byte(v) => v.push(constant.to_integral(target)? as i8),
            Values::Short(v) => v.push(constant.to_integral(target)? as i16),
            Values::Int(v) => v.push(constant.to_integral(target)? as i32),
            Values::Char(v) => match constant {
                Constant::Byte(value) => v.push(*value as u8),
                Constant::Short(_) | Constant::Int(_) => {
                    v.push(constant.to_integral(target)? as u8)
                }
                _ => return Err(constant.mismatch(target)),
            },
            Values::Float(v) => match constant.as_f64() {
                Some(value) => v.push(value as f32),
                None => return Err(constant.mismatch(target)),
            },
            Values::Double(v) => match constant.as_f64() {
                Some(value) => v.push(value),
                None => return Err(constant.mismatch(target)),
            },
        }

        Ok(())
    }

    /// Appends the first element of `other`, which must be of the same type.
    pub fn push_first_of(&mut self, other: &Values) -> Result<(), ErrorImpl> {
        match (self, other) {
            (Values::Byte(v), Values::Byte(o)) => v.extend(o.first()),
            (Values::Char(v), Values::Char(o)) => v.extend(o.first()),
            (Values::Short(v), Values::Short(o)) => v.extend(o.first()),
            (Values::Int(v), Values::Int(o)) => v.extend(o.first()),
            (Values::Float(v), Values::Float(o)) => v.extend(o.first()),
            (Values::Double(v), Values::Double(o)) => v.extend(o.first()),
            (this, other) => {
                return Err(ErrorImpl::TypeMatchError {
                    expected: this.storage_type().name().to_string(),
                    received: other.storage_type().name().to_string(),
                })
            }
        }

        Ok(())
    }

    /// Overwrites the leading elements with `source`, growing the array if needed.
    /// Any newly created positions take the value of `fill`.
    pub fn overwrite_prefix(&mut self, source: &Values, fill: &Values) -> Result<(), ErrorImpl> {
        if source.storage_type() != self.storage_type() {
            return Err(ErrorImpl::TypeMatchError {
                expected: self.storage_type().name().to_string(),
                received: source.storage_type().name().to_string(),
            });
        }

        if source.len() > self.len() {
            self.resize(source.len(), fill);
        }

        match (self, source) {
            (Values::Byte(v), Values::Byte(s)) => v[..s.len()].copy_from_slice(s),
            (Values::Char(v), Values::Char(s)) => v[..s.len()].copy_from_slice(s),
            (Values::Short(v), Values::Short(s)) => v[..s.len()].copy_from_slice(s),
            (Values::Int(v), Values::Int(s)) => v[..s.len()].copy_from_slice(s),
            (Values::Float(v), Values::Float(s)) => v[..s.len()].copy_from_slice(s),
            (Values::Double(v), Values::Double(s)) => v[..s.len()].copy_from_slice(s),
            _ => unreachable!("storage types checked above"),
        }

        Ok(())
    }

    /// Resizes to `len`, padding with the first element of `fill` (or the type's default
    /// fill if `fill` has a different type).
    pub fn resize(&mut self, len: usize, fill: &Values) {
        let fill = if fill.storage_type() == self.storage_type() {
            fill.clone()
        } else {
            default_fill_value(self.storage_type())
        };

        match (self, Values::filled(&fill, 1)) {
            (Values::Byte(v), Values::Byte(f)) => v.resize(len, f[0]),
            (Values::Char(v), Values::Char(f)) => v.resize(len, f[0]),
            (Values::Short(v), Values::Short(f)) => v.resize(len, f[0]),
            (Values::Int(v), Values::Int(f)) => v.resize(len, f[0]),
            (Values::Float(v), Values::Float(f)) => v.resize(len, f[0]),
            (Values::Double(v), Values::Double(f)) => v.resize(len, f[0]),
            _ => unreachable!("fill coerced to the array's type"),
        }
    }

    /// Builds an attribute value from a list of constants. Text constants are
    /// concatenated into a char array; numeric constants are promoted to the widest
    /// type present.
    pub fn from_constants(constants: &[Constant]) -> Result<Values, ErrorImpl> {
        let mut storage_type: Option<StorageType> = None;
        for constant in constants {
            let next = constant.storage_type();
            storage_type = Some(match storage_type {
                None => next,
                Some(current) if current == next => current,
                Some(current) if current.is_numeric() && next.is_numeric() => {
                    current.promote(next)
                }
                Some(current) => {
                    return Err(ErrorImpl::TypeMatchError {
                        expected: current.name().to_string(),
                        received: next.name().to_string(),
                    })
                }
            });
        }

        let mut values = Values::with_type(storage_type.unwrap_or(StorageType::Char));
        for constant in constants {
            match (&mut values, constant) {
                (Values::Char(v), Constant::Text(text)) => v.extend_from_slice(text.as_bytes()),
                (values, constant) => values.push_constant(constant)?,
            }
        }

        Ok(values)
    }

    /// The char data as text, with trailing NUL padding removed.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Values::Char(v) => {
                let end = v.iter().rposition(|c| *c != NC_FILL_CHAR).map_or(0, |i| i + 1);
                Some(String::from_utf8_lossy(&v[..end]).into_owned())
            }
            _ => None,
        }
    }
}

impl Display for Values {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn join<T>(
            f: &mut std::fmt::Formatter<'_>,
            values: &[T],
            render: impl Fn(&T) -> String,
        ) -> std::fmt::Result {
            let rendered: Vec<String> = values.iter().map(render).collect();
            write!(f, "{}", rendered.join(", "))
        }

        match self {
            Values::Char(_) => write!(f, "{:?}", self.as_text().unwrap_or_default()),
            Values::Byte(v) => join(f, v, |x| format!("{}b", x)),
            Values::Short(v) => join(f, v, |x| format!("{}s", x)),
            Values::Int(v) => join(f, v, |x| x.to_string()),
            Values::Float(v) => join(f, v, |x| format!("{:?}f", x)),
            Values::Double(v) => join(f, v, |x| format!("{:?}", x)),
        }
    }
}
