//! Shared utilities and error types for the Ollie compiler
//!
//! This crate provides common functionality used across all compiler components:
//! - Error types and handling utilities
//! - Diagnostic message collection

pub mod error;
pub mod diagnostics;

pub use error::*;
pub use diagnostics::*;
