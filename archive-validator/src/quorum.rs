//! Quorum verification: a tick is final once ⅔+1 computors attested to
//! byte-identical digests and every vote in that group carries a valid
//! signature.

use crate::error::ValidationError;
use archive_model::{
    Computors, QuorumTickVote, SignatureVerifier, VoteDigests, QUORUM_THRESHOLD,
};
use std::collections::HashMap;

/// Validate the votes for one tick against the epoch's computor list and
/// return a representative of the dominant digest group.
pub async fn validate(
    verifier: &dyn SignatureVerifier,
    votes: &[QuorumTickVote],
    computors: &Computors,
) -> Result<QuorumTickVote, ValidationError> {
    if votes.len() < QUORUM_THRESHOLD {
        tracing::debug!(votes = votes.len(), "quorum shortfall");
        return Err(ValidationError::InvalidQuorum);
    }

    let mut groups: HashMap<VoteDigests, Vec<&QuorumTickVote>> = HashMap::new();
    for vote in votes {
        groups.entry(vote.digests()).or_default().push(vote);
    }
    let dominant = groups
        .into_values()
        .find(|group| group.len() >= QUORUM_THRESHOLD)
        .ok_or(ValidationError::InvalidQuorum)?;

    for vote in &dominant {
        let key = computors
            .key_at(vote.computor_index as usize)
            .ok_or(ValidationError::InvalidQuorum)?;
        let digest = vote.unsigned_digest();
        verifier
            .verify(key, &digest, &vote.signature)
            .await
            .map_err(|_| ValidationError::InvalidQuorum)?;
    }

    tracing::debug!(
        tick = dominant[0].tick,
        aligned = dominant.len(),
        "quorum validated"
    );
    Ok(dominant[0].clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tx::tests_support::{RecordingVerifier, RejectAll};
    use archive_model::{Digest, PubKey, Signature, NUMBER_OF_COMPUTORS};

    fn computors() -> Computors {
        let public_keys = (0..NUMBER_OF_COMPUTORS)
            .map(|i| {
                let mut key = [0u8; 32];
                key[0] = (i & 0xff) as u8;
                key[1] = (i >> 8) as u8;
                PubKey(key)
            })
            .collect();
        Computors {
            epoch: 130,
            public_keys,
            signature: Signature([1; 64]),
        }
    }

    fn votes(count: usize, tx_digest: Digest) -> Vec<QuorumTickVote> {
        (0..count)
            .map(|i| QuorumTickVote {
                computor_index: i as u16,
                epoch: 130,
                tick: 500,
                tx_digest,
                ..QuorumTickVote::default()
            })
            .collect()
    }

    #[tokio::test]
    async fn exactly_the_threshold_passes() {
        let verifier = RecordingVerifier::default();
        let vote = validate(&verifier, &votes(QUORUM_THRESHOLD, Digest([7; 32])), &computors())
            .await
            .unwrap();
        assert_eq!(vote.tx_digest, Digest([7; 32]));
        // Every vote in the dominant group was signature-checked.
        assert_eq!(verifier.calls().len(), QUORUM_THRESHOLD);
    }

    #[tokio::test]
    async fn one_vote_short_is_rejected() {
        // Two thirds exactly, without the +1.
        let result = validate(
            &RecordingVerifier::default(),
            &votes(QUORUM_THRESHOLD - 1, Digest([7; 32])),
            &computors(),
        )
        .await;
        assert_eq!(result.unwrap_err(), ValidationError::InvalidQuorum);
    }

    #[tokio::test]
    async fn split_digests_without_dominant_group_are_rejected() {
        let mut all = votes(300, Digest([1; 32]));
        let mut other = votes(300, Digest([2; 32]));
        for (i, vote) in other.iter_mut().enumerate() {
            vote.computor_index = (300 + i) as u16;
        }
        all.append(&mut other);
        let result = validate(&RecordingVerifier::default(), &all, &computors()).await;
        assert_eq!(result.unwrap_err(), ValidationError::InvalidQuorum);
    }

    #[tokio::test]
    async fn signature_failure_inside_the_group_is_invalid_quorum() {
        let result = validate(&RejectAll, &votes(460, Digest([7; 32])), &computors()).await;
        assert_eq!(result.unwrap_err(), ValidationError::InvalidQuorum);
    }

    #[tokio::test]
    async fn out_of_range_slot_is_invalid_quorum() {
        let mut group = votes(QUORUM_THRESHOLD, Digest([7; 32]));
        group[0].computor_index = NUMBER_OF_COMPUTORS as u16;
        let result = validate(&RecordingVerifier::default(), &group, &computors()).await;
        assert_eq!(result.unwrap_err(), ValidationError::InvalidQuorum);
    }
}
