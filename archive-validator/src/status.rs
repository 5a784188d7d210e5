//! Consistency check for fetched execution outcomes.

use crate::error::ValidationError;
use archive_model::{TickTxStatus, Transaction};
use std::collections::HashSet;

/// The status set the node returned must cover exactly the validated
/// transactions: same count, and every status id is one of theirs.
pub fn validate(status: &TickTxStatus, transactions: &[Transaction]) -> Result<(), ValidationError> {
    if status.statuses.len() != transactions.len() {
        return Err(ValidationError::CountMismatch {
            got: status.statuses.len(),
            expected: transactions.len(),
        });
    }
    let ids: HashSet<String> = transactions.iter().map(|tx| tx.id().into()).collect();
    for entry in &status.statuses {
        if !ids.contains(entry.tx_id.as_str()) {
            return Err(ValidationError::UnknownTransaction(
                entry.tx_id.clone().into(),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use archive_model::{PubKey, Signature, TxExecutionStatus};

    fn tx(seed: u8) -> Transaction {
        Transaction {
            source_public_key: PubKey([seed; 32]),
            destination_public_key: PubKey([seed + 1; 32]),
            amount: 1,
            tick: 5,
            input_type: 0,
            input_size: 0,
            input: vec![],
            signature: Signature([seed; 64]),
        }
    }

    fn status_for(txs: &[Transaction]) -> TickTxStatus {
        TickTxStatus {
            current_tick_of_node: 10,
            tick: 5,
            statuses: txs
                .iter()
                .map(|t| TxExecutionStatus {
                    tx_id: t.id(),
                    money_flew: true,
                })
                .collect(),
        }
    }

    #[test]
    fn matching_status_set_passes() {
        let txs = vec![tx(1), tx(2)];
        assert!(validate(&status_for(&txs), &txs).is_ok());
    }

    #[test]
    fn count_mismatch_is_rejected() {
        let txs = vec![tx(1), tx(2)];
        let status = status_for(&txs[..1]);
        assert_eq!(
            validate(&status, &txs).unwrap_err(),
            ValidationError::CountMismatch {
                got: 1,
                expected: 2
            }
        );
    }

    #[test]
    fn foreign_status_id_is_rejected() {
        let txs = vec![tx(1)];
        let mut status = status_for(&txs);
        status.statuses[0].tx_id = tx(9).id();
        assert!(matches!(
            validate(&status, &txs).unwrap_err(),
            ValidationError::UnknownTransaction(_)
        ));
    }
}
