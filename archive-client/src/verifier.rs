//! Out-of-process signature verification.
//!
//! The ledger signs with FourQ Schnorr; the check is delegated to a helper
//! binary invoked per verification with hex-encoded arguments. Exit code 0
//! means the signature verifies, 1 means it does not, anything else is a
//! helper failure.

use archive_model::{Digest, PubKey, Signature, SignatureError, SignatureVerifier};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::process::Command;

pub struct CommandVerifier {
    program: PathBuf,
}

impl CommandVerifier {
    pub fn new(program: impl Into<PathBuf>) -> CommandVerifier {
        CommandVerifier {
            program: program.into(),
        }
    }
}

#[async_trait]
impl SignatureVerifier for CommandVerifier {
    async fn verify(
        &self,
        public_key: &PubKey,
        digest: &Digest,
        signature: &Signature,
    ) -> Result<(), SignatureError> {
        let status = Command::new(&self.program)
            .arg("verify")
            .arg(public_key.to_hex())
            .arg(digest.to_hex())
            .arg(hex::encode(signature.0))
            .status()
            .await
            .map_err(|e| SignatureError::Helper(e.to_string()))?;
        match status.code() {
            Some(0) => Ok(()),
            Some(1) => Err(SignatureError::Invalid),
            other => Err(SignatureError::Helper(format!(
                "helper exited with {other:?}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn accepting_helper() {
        let verifier = CommandVerifier::new("/bin/true");
        assert!(verifier
            .verify(&PubKey::ZERO, &Digest::ZERO, &Signature::ZERO)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn rejecting_helper() {
        let verifier = CommandVerifier::new("/bin/false");
        assert!(matches!(
            verifier
                .verify(&PubKey::ZERO, &Digest::ZERO, &Signature::ZERO)
                .await,
            Err(SignatureError::Invalid)
        ));
    }

    #[tokio::test]
    async fn missing_helper_is_a_helper_error() {
        let verifier = CommandVerifier::new("/nonexistent/helper");
        assert!(matches!(
            verifier
                .verify(&PubKey::ZERO, &Digest::ZERO, &Signature::ZERO)
                .await,
            Err(SignatureError::Helper(_))
        ));
    }
}
