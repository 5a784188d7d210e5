use thiserror::Error;

/// Validation failures. Any of these skips the tick: it is recorded in the
/// skipped-ticks interval and the pipeline advances without touching the
/// last-processed-tick.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid signature")]
    InvalidSignature,

    #[error("quorum not reached or a quorum vote failed verification")]
    InvalidQuorum,

    #[error("tick body digest does not match the quorum digest")]
    TickDigestMismatch,

    #[error("count mismatch: {got} items against {expected} expected")]
    CountMismatch { got: usize, expected: usize },

    #[error("transaction {0} is not part of the tick")]
    UnknownTransaction(String),
}
