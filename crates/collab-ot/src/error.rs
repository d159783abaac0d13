//! Error types for the OT engine.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, OtError>;

/// Errors the OT engine can raise.
///
/// Malformed operations (negative-equivalent positions, length overflow) are
/// documented as undefined behavior for callers to avoid; this type covers
/// the failures that are defined: out-of-range application and a client
/// claiming a revision the server hasn't reached.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum OtError {
    #[error("operation position {position} is out of bounds for text of length {length}")]
    PositionOutOfBounds { position: usize, length: usize },

    #[error("client claimed revision {claimed}, but server is only at {current}")]
    RevisionAhead { claimed: u64, current: u64 },
}
