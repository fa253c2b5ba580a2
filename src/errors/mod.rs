//! Error types and error handling for the CDL front end.
//!
//! This module defines the error types used throughout a parse. It includes:
//!
//! - Error structures with source position information
//! - Syntax, content and backend error variants
//! - Error formatting and display functionality
//! - Helpful error messages and suggestions

pub mod errors;
