//! Storage types and constant support.
//!
//! This module defines the netCDF-3 type system used by the front end:
//!
//! - Type keyword to storage type mapping
//! - Default fill values for each storage type
//! - Numeric range validation and promotion rules
//! - Typed constants and homogeneous value arrays

pub mod types;
