//! Unified error types for seafform.
//!
//! This module provides a unified error type that encompasses errors from the
//! ODS package layer, the form engine and the storage backends.

// Submodule declarations
pub mod conversions;
pub mod types;

// Re-exports
pub use types::{Error, Result};
