//! Common types and utilities shared by the package layer, the form engine
//! and the storage backends.

// Submodule declarations
pub mod error;
pub mod xml;

// Re-exports for convenience
pub use error::{Error, Result};
