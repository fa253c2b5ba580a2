//! Dataset construction.
//!
//! The builder keeps track of what a CDL file has declared so far, validates
//! each new declaration against it and forwards the result to a backend
//! dataset.

pub mod builder;

#[cfg(test)]
mod tests;
