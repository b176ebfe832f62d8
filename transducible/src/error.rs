//! Error types for transduction.
//!
//! Every failure surfaces as a [`TransductionError`] carrying a
//! [`TransductionErrorCode`]. Codes fall into the phases in which they can
//! occur: declaration, call shape, schema algebra, executor contract and
//! output checking.
//!
//! # Example
//! ```rust,ignore
//! use transducible::{TransductionError, TransductionErrorCode};
//!
//! let error = TransductionError::invalid_call("expected one positional argument");
//! assert_eq!(error.code, TransductionErrorCode::InvalidCall);
//! ```

use atype::SchemaError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Fatal error reported when a single-item transduction produces nothing.
pub const NO_STATE_OUTPUT: &str =
    "Transduction returned no state output. This is a framework issue.";

/// Error codes for transduction failures.
///
/// Serialized as SCREAMING_SNAKE_CASE (e.g. `InvalidCall` becomes
/// `"INVALID_CALL"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum TransductionErrorCode {
    // Declaration-time errors
    /// The declared signature cannot be turned into a transducer
    Declaration,
    /// The transducer configuration is invalid
    Config,

    // Call-time errors
    /// The call did not match an accepted input shape
    InvalidCall,
    /// A record did not conform to its schema
    Validation,
    /// Two schemas could not be merged
    SchemaConflict,
    /// A composition operand is not supported
    UnsupportedOperand,
    /// A returned value is not an instance of the target schema
    OutputType,

    // Executor errors
    /// The executor broke its result-count contract
    ExecutorContract,
    /// The executor reported a failure
    Executor,
    /// The call exceeded its timeout
    Timeout,
    /// The call was cancelled
    Cancelled,

    /// JSON serialization/deserialization failed
    Serialization,
    /// An unexpected internal error occurred
    Internal,
}

impl TransductionErrorCode {
    /// Returns the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Declaration => "DECLARATION",
            Self::Config => "CONFIG",
            Self::InvalidCall => "INVALID_CALL",
            Self::Validation => "VALIDATION",
            Self::SchemaConflict => "SCHEMA_CONFLICT",
            Self::UnsupportedOperand => "UNSUPPORTED_OPERAND",
            Self::OutputType => "OUTPUT_TYPE",
            Self::ExecutorContract => "EXECUTOR_CONTRACT",
            Self::Executor => "EXECUTOR",
            Self::Timeout => "TIMEOUT",
            Self::Cancelled => "CANCELLED",
            Self::Serialization => "SERIALIZATION",
            Self::Internal => "INTERNAL",
        }
    }

    /// Returns true if the error is raised while declaring a transducer.
    pub fn is_declaration_error(&self) -> bool {
        matches!(self, Self::Declaration | Self::Config)
    }

    /// Returns true if the error is raised before any executor call.
    pub fn is_call_error(&self) -> bool {
        matches!(self, Self::InvalidCall | Self::Validation)
    }

    /// Returns true if the error originates in or around the executor.
    pub fn is_executor_error(&self) -> bool {
        matches!(
            self,
            Self::ExecutorContract | Self::Executor | Self::Timeout | Self::Cancelled
        )
    }
}

impl fmt::Display for TransductionErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Transduction error with a typed code and message.
#[derive(Debug, Clone, Serialize, Deserialize, Error)]
#[error("[{code}] {message}")]
pub struct TransductionError {
    /// Error code
    pub code: TransductionErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Optional structured details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// Optional underlying cause
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
}

impl TransductionError {
    /// Create a new error with code and message.
    pub fn new(code: TransductionErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            cause: None,
        }
    }

    /// Add details to the error.
    pub fn with_details(mut self, details: impl Serialize) -> Self {
        self.details = serde_json::to_value(details).ok();
        self
    }

    /// Add a cause string for debugging.
    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    // Convenience constructors

    /// Create a DECLARATION error.
    pub fn declaration(message: impl Into<String>) -> Self {
        Self::new(TransductionErrorCode::Declaration, message)
    }

    /// Create a CONFIG error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(TransductionErrorCode::Config, message)
    }

    /// Create an INVALID_CALL error.
    pub fn invalid_call(message: impl Into<String>) -> Self {
        Self::new(TransductionErrorCode::InvalidCall, message)
    }

    /// Create a VALIDATION error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(TransductionErrorCode::Validation, message)
    }

    /// Create an UNSUPPORTED_OPERAND error.
    pub fn unsupported_operand(operand: impl fmt::Debug) -> Self {
        Self::new(
            TransductionErrorCode::UnsupportedOperand,
            format!("Unsupported operand for compose: {operand:?}"),
        )
    }

    /// Create an OUTPUT_TYPE error.
    pub fn output_type(message: impl Into<String>) -> Self {
        Self::new(TransductionErrorCode::OutputType, message)
    }

    /// Create an EXECUTOR_CONTRACT error.
    pub fn executor_contract(message: impl Into<String>) -> Self {
        Self::new(TransductionErrorCode::ExecutorContract, message)
    }

    /// Create the fatal "no state output" error.
    pub fn no_state_output() -> Self {
        Self::executor_contract(NO_STATE_OUTPUT)
    }

    /// Create an EXECUTOR error.
    pub fn executor(message: impl Into<String>) -> Self {
        Self::new(TransductionErrorCode::Executor, message)
    }

    /// Create a TIMEOUT error.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(TransductionErrorCode::Timeout, message)
    }

    /// Create a CANCELLED error.
    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(TransductionErrorCode::Cancelled, message)
    }

    /// Create a SERIALIZATION error.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(TransductionErrorCode::Serialization, message)
    }

    /// Create an INTERNAL error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(TransductionErrorCode::Internal, message)
    }
}

impl From<SchemaError> for TransductionError {
    fn from(err: SchemaError) -> Self {
        let code = match &err {
            SchemaError::FieldConflict { .. } => TransductionErrorCode::SchemaConflict,
            SchemaError::Serialization(_) => TransductionErrorCode::Serialization,
            _ => TransductionErrorCode::Validation,
        };
        Self::new(code, err.to_string())
    }
}

impl From<serde_json::Error> for TransductionError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}

/// Result alias for transduction operations.
pub type TransductionResult<T> = Result<T, TransductionError>;
