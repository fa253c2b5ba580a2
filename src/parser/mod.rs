//! Parser for the CDL grammar.
//!
//! Consumes the token vector produced by the lexer and drives a
//! [`Builder`](crate::builder::builder::Builder) as each declaration is
//! recognised. There is no intermediate syntax tree: a dataset is built in a
//! single pass and any grammar error aborts it.

pub mod decl;
pub mod lookups;
pub mod parser;
