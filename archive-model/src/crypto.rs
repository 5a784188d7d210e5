//! Centralized cryptographic operations for the archive.
//!
//! All K12 hashing goes through this module. Signature verification (FourQ
//! Schnorr over 32-byte digests) is an external helper hidden behind the
//! [`SignatureVerifier`] trait: the daemon wires an out-of-process verifier,
//! tests substitute deterministic stubs.

use crate::types::{Digest, PubKey, Signature};
use async_trait::async_trait;
use thiserror::Error;
use tiny_keccak::{Hasher, KangarooTwelve};

/// Compute the 32-byte KangarooTwelve hash of arbitrary bytes.
///
/// This is the ledger's only digest function: transaction ids, tick body
/// digests, quorum vote digests and identity checksums all derive from it.
pub fn k12(data: &[u8]) -> Digest {
    let mut hasher = KangarooTwelve::new(b"");
    hasher.update(data);
    let mut out = [0u8; 32];
    hasher.finalize(&mut out);
    Digest(out)
}

#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("signature verification failed")]
    Invalid,

    #[error("verification helper failed: {0}")]
    Helper(String),
}

/// Schnorr signature verification over a 32-byte digest.
///
/// Verification is a suspension point: the production implementation
/// dispatches each check to an out-of-process helper.
#[async_trait]
pub trait SignatureVerifier: Send + Sync {
    async fn verify(
        &self,
        public_key: &PubKey,
        digest: &Digest,
        signature: &Signature,
    ) -> Result<(), SignatureError>;
}
