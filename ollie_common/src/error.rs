//! Error handling utilities for the Ollie compiler

use thiserror::Error;

/// The main error type for the Ollie compiler
#[derive(Error, Debug, Clone)]
pub enum OllieError {
    #[error("Type error: {message}")]
    TypeError { message: String },

    #[error("IR error: {message}")]
    IrError { message: String },

    #[error("Code generation error: {message}")]
    CodegenError { message: String },

    #[error("I/O error: {message}")]
    IoError { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// A structural violation inside the IR layer. These always indicate a
    /// bug in an earlier phase; the driver reports the message and aborts.
    #[error("Internal compiler error: {message}")]
    InternalError { message: String },
}

/// Result type alias for Ollie compiler operations
pub type OllieResult<T> = Result<T, OllieError>;

impl OllieError {
    pub fn type_error(message: impl Into<String>) -> Self {
        Self::TypeError { message: message.into() }
    }

    pub fn ir_error(message: impl Into<String>) -> Self {
        Self::IrError { message: message.into() }
    }

    pub fn codegen_error(message: impl Into<String>) -> Self {
        Self::CodegenError { message: message.into() }
    }

    pub fn io_error(message: impl Into<String>) -> Self {
        Self::IoError { message: message.into() }
    }

    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError { message: message.into() }
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::InternalError { message: message.into() }
    }

    /// Whether this error indicates a compiler bug rather than bad input
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::InternalError { .. })
    }
}
