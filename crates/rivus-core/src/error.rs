//! Error types for the RIVUS state layer

use thiserror::Error;

/// Core RIVUS errors
#[derive(Error, Debug)]
pub enum RivusError {
    // Mutation errors
    #[error("invalid operation: {0}")]
    InvalidOperation(&'static str),

    // Typing errors
    #[error("type constraint violated: {0}")]
    TypeConstraint(String),

    // Serialization errors
    #[error("this instance is not serializable")]
    NotSerializable,

    // Schema errors
    #[error("`{0}` is a reserved field name")]
    ReservedField(String),

    // Union errors
    #[error("unrecognized union variant: {0}")]
    UnknownVariant(String),
}

/// Result type for RIVUS operations
pub type RivusResult<T> = Result<T, RivusError>;
