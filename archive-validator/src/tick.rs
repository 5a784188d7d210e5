//! Tick body verification against the quorum-agreed digest.

use crate::error::ValidationError;
use archive_model::{Computors, QuorumTickVote, SignatureVerifier, TickData};

/// The body's digest (excluding its trailing signature) must equal the tick
/// digest fixed by the quorum, and the body must be signed by the computor
/// whose slot it carries.
pub async fn validate(
    verifier: &dyn SignatureVerifier,
    tick_data: &TickData,
    vote: &QuorumTickVote,
    computors: &Computors,
) -> Result<(), ValidationError> {
    let digest = tick_data.unsigned_digest();
    if digest != vote.tx_digest {
        return Err(ValidationError::TickDigestMismatch);
    }
    let key = computors
        .key_at(tick_data.computor_index as usize)
        .ok_or(ValidationError::InvalidSignature)?;
    verifier
        .verify(key, &digest, &tick_data.signature)
        .await
        .map_err(|_| ValidationError::InvalidSignature)
}
