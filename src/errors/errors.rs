use std::fmt::Display;

use thiserror::Error;

use crate::{backend::BackendError, Position};

/// The two severities a CDL source can fail with, plus failures reported by the
/// dataset backend itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed grammar: unexpected or unrecognised tokens, missing constructs.
    Syntax,
    /// Well-formed grammar carrying semantically invalid content.
    Content,
    /// The backend refused an operation.
    Backend,
}

#[derive(Debug, Clone)]
pub struct Error {
    internal_error: ErrorImpl,
    position: Position,
}

impl Error {
    pub fn new(error_impl: ErrorImpl, position: Position) -> Self {
        Error {
            internal_error: error_impl,
            position,
        }
    }

    pub fn get_position(&self) -> &Position {
        &self.position
    }

    pub fn get_error(&self) -> &ErrorImpl {
        &self.internal_error
    }

    pub fn kind(&self) -> ErrorKind {
        self.internal_error.kind()
    }

    pub fn get_error_name(&self) -> &str {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. } => "UnrecognisedToken",
            ErrorImpl::UnexpectedToken { .. } => "UnexpectedToken",
            ErrorImpl::UnexpectedTokenDetailed { .. } => "UnexpectedTokenDetailed",
            ErrorImpl::MissingDatasetName => "MissingDatasetName",
            ErrorImpl::UnterminatedString => "UnterminatedString",
            ErrorImpl::NumberParseError { .. } => "NumberParseError",
            ErrorImpl::NumberOutOfRange { .. } => "NumberOutOfRange",
            ErrorImpl::DimensionAlreadyDeclared { .. } => "DimensionAlreadyDeclared",
            ErrorImpl::DimensionNotDeclared { .. } => "DimensionNotDeclared",
            ErrorImpl::MultipleUnlimitedDimensions { .. } => "MultipleUnlimitedDimensions",
            ErrorImpl::InvalidDimensionLength { .. } => "InvalidDimensionLength",
            ErrorImpl::UnlimitedDimensionNotFirst { .. } => "UnlimitedDimensionNotFirst",
            ErrorImpl::VariableAlreadyDeclared { .. } => "VariableAlreadyDeclared",
            ErrorImpl::VariableNotDeclared { .. } => "VariableNotDeclared",
            ErrorImpl::UnknownType { .. } => "UnknownType",
            ErrorImpl::TypeMatchError { .. } => "TypeMatchError",
            ErrorImpl::FillValueMismatch { .. } => "FillValueMismatch",
            ErrorImpl::TooManyValues { .. } => "TooManyValues",
            ErrorImpl::VariableTooLarge { .. } => "VariableTooLarge",
            ErrorImpl::Backend(_) => "BackendError",
        }
    }

    pub fn get_tip(&self) -> ErrorTip {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. } => ErrorTip::None,
            ErrorImpl::UnexpectedToken { token, kind } => ErrorTip::Suggestion(format!(
                "Unexpected token: {} `{}`, did you miss a semicolon?",
                kind, token
            )),
            ErrorImpl::UnexpectedTokenDetailed { token, message } => {
                ErrorTip::Suggestion(format!("Unexpected token: `{}`, {}", token, message))
            }
            ErrorImpl::MissingDatasetName => ErrorTip::Suggestion(String::from(
                "A netCDF name is required, e.g. `netcdf example {`",
            )),
            ErrorImpl::UnterminatedString => {
                ErrorTip::Suggestion(String::from("Add the closing `\"` to the string"))
            }
            ErrorImpl::NumberParseError { token } => {
                ErrorTip::Suggestion(format!("Invalid numeric constant: `{}`", token))
            }
            ErrorImpl::NumberOutOfRange {
                token,
                type_,
                min,
                max,
            } => ErrorTip::Suggestion(format!(
                "{} constant `{}` is outside valid range ({} -> {})",
                type_, token, min, max
            )),
            ErrorImpl::DimensionAlreadyDeclared { dimension } => {
                ErrorTip::Suggestion(format!("Dimension `{}` already declared", dimension))
            }
            ErrorImpl::DimensionNotDeclared { dimension } => {
                ErrorTip::Suggestion(format!("Dimension `{}` not declared", dimension))
            }
            ErrorImpl::MultipleUnlimitedDimensions { dimension } => ErrorTip::Suggestion(format!(
                "Only one UNLIMITED dimension is allowed, `{}` is the second",
                dimension
            )),
            ErrorImpl::InvalidDimensionLength { dimension, length } => {
                ErrorTip::Suggestion(format!(
                    "Length of dimension `{}` must be a positive integer, found `{}`",
                    dimension, length
                ))
            }
            ErrorImpl::UnlimitedDimensionNotFirst {
                variable,
                dimension,
            } => ErrorTip::Suggestion(format!(
                "Move the unlimited dimension `{}` to the front of `{}`'s shape",
                dimension, variable
            )),
            ErrorImpl::VariableAlreadyDeclared { variable } => {
                ErrorTip::Suggestion(format!("Variable `{}` already declared", variable))
            }
            ErrorImpl::VariableNotDeclared { variable } => {
                ErrorTip::Suggestion(format!("Variable `{}` not declared", variable))
            }
            ErrorImpl::UnknownType { type_ } => {
                ErrorTip::Suggestion(format!("Unknown type `{}` found", type_))
            }
            ErrorImpl::TypeMatchError { expected, received } => ErrorTip::Suggestion(format!(
                "Expected type `{}`, received `{}`",
                expected, received
            )),
            ErrorImpl::FillValueMismatch { variable, expected } => ErrorTip::Suggestion(format!(
                "`{}:_FillValue` must be a single {} value",
                variable, expected
            )),
            ErrorImpl::TooManyValues {
                variable,
                expected,
                received,
            } => ErrorTip::Suggestion(format!(
                "Variable `{}` holds {} values, received {}",
                variable, expected, received
            )),
            ErrorImpl::VariableTooLarge { variable } => ErrorTip::Suggestion(format!(
                "The dimensions of `{}` multiply to more elements than can be addressed",
                variable
            )),
            ErrorImpl::Backend(_) => ErrorTip::None,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (line {}): {}",
            self.get_error_name(),
            self.position.line,
            self.internal_error
        )
    }
}

impl std::error::Error for Error {}

pub enum ErrorTip {
    None,
    Suggestion(String),
}

impl Display for ErrorTip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorTip::None => write!(f, ""),
            ErrorTip::Suggestion(suggestion) => write!(f, "{}", suggestion),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ErrorImpl {
    #[error("illegal character: {token:?}")]
    UnrecognisedToken { token: String },
    #[error("syntax error at token {kind}, value {token:?}")]
    UnexpectedToken { token: String, kind: String },
    #[error("syntax error at token {token:?}: {message}")]
    UnexpectedTokenDetailed { token: String, message: String },
    #[error("a netCDF name is required")]
    MissingDatasetName,
    #[error("unterminated string constant")]
    UnterminatedString,
    #[error("bad numeric constant: {token:?}")]
    NumberParseError { token: String },
    #[error("{type_} constant is outside valid range ({min} -> {max}): {token}")]
    NumberOutOfRange {
        token: String,
        type_: String,
        min: i64,
        max: i64,
    },
    #[error("duplicate declaration for dimension {dimension:?}")]
    DimensionAlreadyDeclared { dimension: String },
    #[error("dimension {dimension:?} not declared")]
    DimensionNotDeclared { dimension: String },
    #[error("only one UNLIMITED dimension is allowed, found second {dimension:?}")]
    MultipleUnlimitedDimensions { dimension: String },
    #[error("length of dimension {dimension:?} must be positive, found {length}")]
    InvalidDimensionLength { dimension: String, length: String },
    #[error("unlimited dimension {dimension:?} must be the first dimension of {variable:?}")]
    UnlimitedDimensionNotFirst { variable: String, dimension: String },
    #[error("duplicate declaration of variable {variable:?}")]
    VariableAlreadyDeclared { variable: String },
    #[error("variable {variable:?} not declared")]
    VariableNotDeclared { variable: String },
    #[error("unrecognised data type {type_:?}")]
    UnknownType { type_: String },
    #[error("types do not match: expected {expected}, received {received}")]
    TypeMatchError { expected: String, received: String },
    #[error("_FillValue of {variable:?} must be a single {expected} value")]
    FillValueMismatch { variable: String, expected: String },
    #[error("too many values for {variable:?}: expected at most {expected}, received {received}")]
    TooManyValues {
        variable: String,
        expected: usize,
        received: usize,
    },
    #[error("variable {variable:?} has too many elements to address")]
    VariableTooLarge { variable: String },
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),
}

impl ErrorImpl {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ErrorImpl::UnrecognisedToken { .. }
            | ErrorImpl::UnexpectedToken { .. }
            | ErrorImpl::UnexpectedTokenDetailed { .. }
            | ErrorImpl::MissingDatasetName
            | ErrorImpl::UnterminatedString => ErrorKind::Syntax,
            ErrorImpl::Backend(_) => ErrorKind::Backend,
            _ => ErrorKind::Content,
        }
    }
}
