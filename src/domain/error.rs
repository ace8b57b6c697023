//! Domain-level errors (no external dependencies)

use rust_decimal::Decimal;
use thiserror::Error;

/// Domain errors represent allocation rule violations.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("node not found: {0}")]
    NodeNotFound(String),

    #[error("cannot distribute onto children of {0}: children sum to zero")]
    EmptyDistributionBase(String),

    #[error("variance undefined for {0}: baseline is zero")]
    DivisionByZero(String),

    #[error("arithmetic overflow while recalculating {0}")]
    ArithmeticOverflow(String),

    #[error("duplicate node id: {0}")]
    DuplicateId(String),

    #[error("node id must not be empty")]
    EmptyId,

    #[error("leaf node has no value: {0}")]
    MissingValue(String),

    #[error("declared total {declared} of {id} does not match children sum {computed}")]
    InconsistentTotal {
        id: String,
        declared: Decimal,
        computed: Decimal,
    },
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
