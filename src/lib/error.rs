//! Error types for container construction.

use thiserror::Error;

/// Result type alias using ContainerError.
pub type Result<T> = std::result::Result<T, ContainerError>;

/// Errors raised while building a container.
///
/// Lookups and deletes never fail: an absent key is reported through
/// `Option`/`bool`. Only invalid configuration is an error.
#[derive(Debug, Error, PartialEq)]
pub enum ContainerError {
    /// Promotion probability outside the open unit interval.
    #[error("Skip list probability must be in (0, 1), got {0}")]
    InvalidProbability(f64),

    /// A skip list needs at least one level.
    #[error("Skip list max level must be at least 1")]
    ZeroMaxLevel,

    /// A hash table needs at least one bucket.
    #[error("Hash table initial capacity must be at least 1")]
    ZeroCapacity,

    /// Load factor outside (0, 1].
    #[error("Hash table load factor must be in (0, 1], got {0}")]
    InvalidLoadFactor(f64),

    /// Name that matches no container kind.
    #[error("Unknown container kind: {0}")]
    UnknownKind(String),
}
