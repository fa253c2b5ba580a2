//! Lexical analysis for CDL.
//!
//! Converts CDL source text into a vector of tokens using an ordered table of
//! anchored regex patterns. Numeric and string constants are decoded into typed
//! literals here, so the parser only sees finished values.

pub mod lexer;
pub mod tokens;
