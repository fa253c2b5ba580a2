//! The dataset backend the front end writes into.
//!
//! The parser never touches a container format directly. It drives a
//! [`Backend`] capability that creates a [`Dataset`] and then receives
//! dimension, variable, attribute and data requests. [`MemoryBackend`] keeps
//! everything in memory and is what the CLI and the tests run against.

pub mod backend;
pub mod memory;

pub use backend::{AttributeOwner, Backend, BackendError, Dataset, Format};
pub use memory::{MemoryBackend, MemoryDataset};
