//! archive-validator - the validation pipeline
//!
//! Turns a tick number into a set of persisted, verified artifacts:
//!
//! ```text
//! fetch quorum votes -> resolve computors -> validate quorum
//!   -> fetch tick body -> validate tick
//!   -> fetch transactions -> validate transactions -> classify
//!   -> one atomic batch (tick + transactions + status + secondary indexes)
//!   -> advance last-processed-tick and interval bookkeeping
//! ```
//!
//! Each arrow is a hard precondition for the next. Fetch failures retry the
//! tick; validation failures skip it (recorded as a skipped interval)
//! without touching the last-processed-tick; a failed commit is fatal.

pub mod archiver;
pub mod assets;
pub mod computors;
pub mod error;
pub mod indexer;
pub mod migrations;
pub mod quorum;
pub mod qutil;
pub mod qx;
pub mod status;
pub mod tick;
pub mod tx;

pub use archiver::{Archiver, ProcessError};
pub use assets::ClassifiedTransaction;
pub use error::ValidationError;
pub use indexer::ValidatedTick;
