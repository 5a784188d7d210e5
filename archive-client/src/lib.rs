//! archive-client - external collaborators of the pipeline
//!
//! Two adapters live here: the TCP client that speaks the ledger's
//! request/response protocol against a source node, and the verifier that
//! dispatches Schnorr signature checks to an out-of-process helper.

pub mod client;
pub mod verifier;

pub use client::NodeClient;
pub use verifier::CommandVerifier;
