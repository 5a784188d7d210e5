//! archive-api - the read-only query façade
//!
//! [`ArchiveService`] exposes one operation per indexed record kind over the
//! store (plus the identity-info pass-through to the node), independent of
//! any transport. [`gateway`] serves it as JSON over HTTP, one POST route
//! per operation, grpc-gateway style.

pub mod gateway;
pub mod service;

pub use service::{ArchiveService, ArchiveStatus, ServiceError};
