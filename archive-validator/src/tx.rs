//! Transaction verification against a validated tick body.

use crate::error::ValidationError;
use archive_model::{Digest, SignatureVerifier, TickData, Transaction};
use std::collections::HashSet;

/// Check every transaction the node returned against the tick body: the set
/// of non-zero digests in the body must be covered exactly, and each
/// transaction must carry a valid signature from its source key over its
/// digest-without-signature.
pub async fn validate(
    verifier: &dyn SignatureVerifier,
    transactions: Vec<Transaction>,
    tick_data: &TickData,
) -> Result<Vec<Transaction>, ValidationError> {
    let digests: HashSet<Digest> = tick_data.non_zero_digests().into_iter().collect();
    // An empty body with stray transactions is not an error; there is simply
    // nothing to verify or keep.
    if digests.is_empty() {
        return Ok(Vec::new());
    }
    if transactions.len() != digests.len() {
        return Err(ValidationError::CountMismatch {
            got: transactions.len(),
            expected: digests.len(),
        });
    }

    for tx in &transactions {
        let unsigned = tx.unsigned_digest();
        if !digests.contains(&unsigned) {
            return Err(ValidationError::UnknownTransaction(tx.id().into()));
        }
        verifier
            .verify(&tx.source_public_key, &unsigned, &tx.signature)
            .await
            .map_err(|_| ValidationError::InvalidSignature)?;
    }

    Ok(transactions)
}

/// Reorder validated transactions into tick body order. Intra-tick index
/// order is defined as the order of appearance in the body's digest list.
pub fn in_body_order(transactions: Vec<Transaction>, tick_data: &TickData) -> Vec<Transaction> {
    let mut by_digest: Vec<(Digest, Transaction)> = transactions
        .into_iter()
        .map(|tx| (tx.unsigned_digest(), tx))
        .collect();
    let mut ordered = Vec::with_capacity(by_digest.len());
    for digest in tick_data.non_zero_digests() {
        if let Some(pos) = by_digest.iter().position(|(d, _)| *d == digest) {
            ordered.push(by_digest.swap_remove(pos).1);
        }
    }
    ordered
}


#[cfg(test)]
mod tests {
    use super::tests_support::{RecordingVerifier, RejectAll};
    use super::*;
    use archive_model::{PubKey, Signature};

    fn tx(seed: u8) -> Transaction {
        Transaction {
            source_public_key: PubKey([seed; 32]),
            destination_public_key: PubKey([seed.wrapping_add(1); 32]),
            amount: seed as i64,
            tick: 400,
            input_type: 0,
            input_size: 0,
            input: vec![],
            signature: Signature([seed; 64]),
        }
    }

    fn body_for(txs: &[Transaction]) -> TickData {
        TickData::with_digests(
            130,
            400,
            0,
            txs.iter().map(|t| t.unsigned_digest()).collect(),
        )
    }

    #[tokio::test]
    async fn accepts_matching_set_and_signs_over_unsigned_digests() {
        let txs = vec![tx(1), tx(2), tx(3)];
        let body = body_for(&txs);
        let verifier = RecordingVerifier::default();
        let valid = validate(&verifier, txs.clone(), &body).await.unwrap();
        assert_eq!(valid, txs);
        let calls = verifier.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0].0, txs[0].source_public_key);
        assert_eq!(calls[0].1, txs[0].unsigned_digest());
    }

    #[tokio::test]
    async fn count_mismatch_when_node_returns_too_few() {
        let txs = vec![tx(1), tx(2), tx(3), tx(4), tx(5)];
        let body = body_for(&txs);
        let result = validate(&RecordingVerifier::default(), txs[..4].to_vec(), &body).await;
        assert_eq!(
            result.unwrap_err(),
            ValidationError::CountMismatch {
                got: 4,
                expected: 5
            }
        );
    }

    #[tokio::test]
    async fn foreign_transaction_is_unknown() {
        let txs = vec![tx(1), tx(2)];
        let body = body_for(&txs);
        let mut swapped = txs.clone();
        swapped[1] = tx(9);
        let result = validate(&RecordingVerifier::default(), swapped.clone(), &body).await;
        assert_eq!(
            result.unwrap_err(),
            ValidationError::UnknownTransaction(swapped[1].id().into())
        );
    }

    #[tokio::test]
    async fn signature_failure_propagates() {
        let txs = vec![tx(1)];
        let body = body_for(&txs);
        let result = validate(&RejectAll, txs, &body).await;
        assert_eq!(result.unwrap_err(), ValidationError::InvalidSignature);
    }

    #[tokio::test]
    async fn empty_body_yields_no_transactions() {
        let body = TickData::with_digests(130, 400, 0, vec![]);
        let valid = validate(&RecordingVerifier::default(), vec![tx(1)], &body)
            .await
            .unwrap();
        assert!(valid.is_empty());
    }

    #[test]
    fn reorders_into_body_order() {
        let txs = vec![tx(1), tx(2), tx(3)];
        let body = body_for(&txs);
        let shuffled = vec![txs[2].clone(), txs[0].clone(), txs[1].clone()];
        assert_eq!(in_body_order(shuffled, &body), txs);
    }
}
