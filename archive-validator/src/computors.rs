//! Computor list verification.

use crate::error::ValidationError;
use archive_model::{arbitrator_public_key, Computors, SignatureVerifier, NUMBER_OF_COMPUTORS};

/// Check the arbitrator's signature over the concatenated public keys.
pub async fn validate(
    verifier: &dyn SignatureVerifier,
    computors: &Computors,
) -> Result<(), ValidationError> {
    if computors.public_keys.len() != NUMBER_OF_COMPUTORS {
        return Err(ValidationError::CountMismatch {
            got: computors.public_keys.len(),
            expected: NUMBER_OF_COMPUTORS,
        });
    }
    let digest = computors.keys_digest();
    verifier
        .verify(&arbitrator_public_key(), &digest, &computors.signature)
        .await
        .map_err(|_| ValidationError::InvalidSignature)
}
