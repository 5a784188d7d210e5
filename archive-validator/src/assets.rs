//! Asset-transaction classification.
//!
//! Partitions transactions by `(destination, inputType)` into the shapes the
//! per-asset index understands and decomposes each into the participants and
//! currency tuple that feed it. The decoder is strict: a payload that fails
//! to decode demotes the transaction to unclassified with a warning, never
//! an error.

use crate::qutil::{SendManyPayload, SEND_MANY_INPUT_TYPE};
use crate::qx::{TransferAssetOwnershipInput, TRANSFER_SHARE_INPUT_TYPE};
use archive_model::{
    Identity, Transaction, NATIVE_ASSET_ISSUER, NATIVE_ASSET_NAME, QUTIL_ADDRESS, QX_ADDRESS,
};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifiedTransaction {
    /// Plain transfer of the native currency. Fully served by the
    /// per-identity transfer index; contributes nothing to the per-asset
    /// index.
    Native,
    /// Batch transfer through the utility contract.
    SendMany {
        transfers: Vec<(Identity, i64)>,
        total_amount: i64,
    },
    /// Asset ownership transfer through the exchange contract.
    AssetTransfer {
        issuer: Identity,
        new_owner: Identity,
        asset_name: String,
        units: i64,
    },
    /// Everything else. Still persisted as a raw transaction (and, with a
    /// positive amount, under the transfer index) but invisible to the
    /// per-asset index.
    Unclassified,
}

/// Participants and currency of one classified transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetParticipants {
    pub tx_id: String,
    /// Deduplicated, in order of first appearance.
    pub identities: Vec<String>,
    pub asset_issuer: String,
    pub asset_name: String,
}

impl AssetParticipants {
    /// Concatenation of issuer and name, the per-asset index key component.
    pub fn asset_id(&self) -> String {
        format!("{}{}", self.asset_issuer, self.asset_name)
    }
}

pub fn classify(tx: &Transaction) -> ClassifiedTransaction {
    if tx.input_type == 0 {
        return ClassifiedTransaction::Native;
    }
    let dest = Identity::from_pubkey(tx.destination_public_key.as_bytes(), false);
    if dest.as_str() == QUTIL_ADDRESS && tx.input_type == SEND_MANY_INPUT_TYPE {
        return match SendManyPayload::unmarshal(&tx.input) {
            Ok(payload) => ClassifiedTransaction::SendMany {
                transfers: payload
                    .transfers()
                    .into_iter()
                    .map(|(key, amount)| (Identity::from_pubkey(key.as_bytes(), false), amount))
                    .collect(),
                total_amount: payload.total_amount(),
            },
            Err(e) => {
                tracing::warn!(tx_id = %tx.id(), error = %e, "unreadable send-many payload");
                ClassifiedTransaction::Unclassified
            }
        };
    }
    if dest.as_str() == QX_ADDRESS && tx.input_type == TRANSFER_SHARE_INPUT_TYPE {
        return match TransferAssetOwnershipInput::unmarshal(&tx.input) {
            Ok(input) => ClassifiedTransaction::AssetTransfer {
                issuer: input.issuer_identity(),
                new_owner: input.new_owner_identity(),
                asset_name: input.asset_name_string(),
                units: input.number_of_units,
            },
            Err(e) => {
                tracing::warn!(tx_id = %tx.id(), error = %e, "unreadable asset-transfer payload");
                ClassifiedTransaction::Unclassified
            }
        };
    }
    ClassifiedTransaction::Unclassified
}

/// Decompose a contract-classified transaction into its participants and
/// currency. Native transfers and unclassified transactions contribute
/// nothing here.
pub fn participants(tx: &Transaction) -> Option<AssetParticipants> {
    let source = Identity::from_pubkey(tx.source_public_key.as_bytes(), false);
    match classify(tx) {
        ClassifiedTransaction::Native | ClassifiedTransaction::Unclassified => None,
        ClassifiedTransaction::SendMany { transfers, .. } => {
            let mut identities: Vec<String> = vec![source.into()];
            identities.extend(transfers.into_iter().map(|(dest, _)| String::from(dest)));
            Some(AssetParticipants {
                tx_id: tx.id().into(),
                identities: dedup(identities),
                asset_issuer: NATIVE_ASSET_ISSUER.into(),
                asset_name: NATIVE_ASSET_NAME.into(),
            })
        }
        ClassifiedTransaction::AssetTransfer {
            issuer,
            new_owner,
            asset_name,
            ..
        } => Some(AssetParticipants {
            tx_id: tx.id().into(),
            identities: dedup([source.into(), new_owner.into()]),
            asset_issuer: issuer.into(),
            asset_name,
        }),
    }
}

/// Group classified transactions as `identity → asset id → tx ids`, with tx
/// ids in the order the transactions were given (tick body order).
pub fn group_by_identity_and_asset(
    transactions: &[Transaction],
) -> BTreeMap<String, BTreeMap<String, Vec<String>>> {
    let mut grouped: BTreeMap<String, BTreeMap<String, Vec<String>>> = BTreeMap::new();
    for tx in transactions {
        let Some(info) = participants(tx) else {
            continue;
        };
        let asset_id = info.asset_id();
        for identity in &info.identities {
            grouped
                .entry(identity.clone())
                .or_default()
                .entry(asset_id.clone())
                .or_default()
                .push(info.tx_id.clone());
        }
    }
    grouped
}

fn dedup(identities: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    identities
        .into_iter()
        .filter(|id| seen.insert(id.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qutil::SEND_MANY_MAX_TRANSFERS;
    use archive_model::{PubKey, Signature};

    fn base_tx(input_type: u16, dest: PubKey, input: Vec<u8>) -> Transaction {
        Transaction {
            source_public_key: PubKey([1; 32]),
            destination_public_key: dest,
            amount: 10,
            tick: 1000,
            input_type,
            input_size: input.len() as u16,
            input,
            signature: Signature([4; 64]),
        }
    }

    fn contract_key(address: &str) -> PubKey {
        Identity::parse(address).unwrap().to_pubkey().unwrap()
    }

    fn send_many_input(pairs: &[(u8, i64)]) -> Vec<u8> {
        let mut keys = vec![[0u8; 32]; SEND_MANY_MAX_TRANSFERS];
        let mut amounts = vec![0i64; SEND_MANY_MAX_TRANSFERS];
        for (slot, (seed, amount)) in pairs.iter().enumerate() {
            keys[slot] = [*seed; 32];
            amounts[slot] = *amount;
        }
        let mut out = Vec::new();
        for key in &keys {
            out.extend_from_slice(key);
        }
        for amount in &amounts {
            out.extend_from_slice(&amount.to_le_bytes());
        }
        out
    }

    #[test]
    fn native_transfer_stays_out_of_the_asset_index() {
        let tx = base_tx(0, PubKey([2; 32]), vec![]);
        assert_eq!(classify(&tx), ClassifiedTransaction::Native);
        assert!(participants(&tx).is_none());
        assert!(group_by_identity_and_asset(&[tx]).is_empty());
    }

    #[test]
    fn send_many_dedups_repeated_participants() {
        // The source also shows up as one of the destinations.
        let tx = base_tx(
            SEND_MANY_INPUT_TYPE,
            contract_key(QUTIL_ADDRESS),
            send_many_input(&[(1, 100), (7, 200)]),
        );
        let info = participants(&tx).unwrap();
        assert_eq!(
            info.identities,
            vec![
                String::from(Identity::from_pubkey(&[1; 32], false)),
                String::from(Identity::from_pubkey(&[7; 32], false)),
            ]
        );
    }

    #[test]
    fn send_many_collects_all_destinations() {
        let tx = base_tx(
            SEND_MANY_INPUT_TYPE,
            contract_key(QUTIL_ADDRESS),
            send_many_input(&[(7, 100), (8, 200)]),
        );
        match classify(&tx) {
            ClassifiedTransaction::SendMany {
                transfers,
                total_amount,
            } => {
                assert_eq!(transfers.len(), 2);
                assert_eq!(total_amount, 300);
            }
            other => panic!("unexpected classification: {other:?}"),
        }
        let info = participants(&tx).unwrap();
        // source + two destinations, native currency
        assert_eq!(info.identities.len(), 3);
        assert_eq!(info.asset_issuer, "0");
    }

    #[test]
    fn asset_transfer_uses_payload_currency() {
        let issuer = PubKey([9; 32]);
        let new_owner = PubKey([8; 32]);
        let mut input = Vec::new();
        input.extend_from_slice(&issuer.0);
        input.extend_from_slice(&new_owner.0);
        input.extend_from_slice(&u64::from_le_bytes(*b"QFT\0\0\0\0\0").to_le_bytes());
        input.extend_from_slice(&77i64.to_le_bytes());
        let tx = base_tx(TRANSFER_SHARE_INPUT_TYPE, contract_key(QX_ADDRESS), input);

        let info = participants(&tx).unwrap();
        assert_eq!(info.asset_name, "QFT");
        assert_eq!(
            info.asset_issuer,
            String::from(Identity::from_pubkey(issuer.as_bytes(), false))
        );
        assert_eq!(
            info.identities,
            vec![
                String::from(Identity::from_pubkey(&[1; 32], false)),
                String::from(Identity::from_pubkey(new_owner.as_bytes(), false)),
            ]
        );
    }

    #[test]
    fn wrong_contract_or_type_is_unclassified() {
        // Right input type, arbitrary destination.
        let tx = base_tx(TRANSFER_SHARE_INPUT_TYPE, PubKey([3; 32]), vec![0; 80]);
        assert_eq!(classify(&tx), ClassifiedTransaction::Unclassified);
        assert!(participants(&tx).is_none());
        // Right destination, unknown input type.
        let tx = base_tx(9, contract_key(QX_ADDRESS), vec![]);
        assert_eq!(classify(&tx), ClassifiedTransaction::Unclassified);
    }

    #[test]
    fn undecodable_payload_demotes_to_unclassified() {
        let tx = base_tx(
            TRANSFER_SHARE_INPUT_TYPE,
            contract_key(QX_ADDRESS),
            vec![1, 2, 3],
        );
        assert_eq!(classify(&tx), ClassifiedTransaction::Unclassified);
    }

    #[test]
    fn grouping_spans_participants_and_keeps_order() {
        let a = base_tx(
            SEND_MANY_INPUT_TYPE,
            contract_key(QUTIL_ADDRESS),
            send_many_input(&[(2, 100)]),
        );
        let mut b = base_tx(
            SEND_MANY_INPUT_TYPE,
            contract_key(QUTIL_ADDRESS),
            send_many_input(&[(3, 50)]),
        );
        b.amount = 20;
        let grouped = group_by_identity_and_asset(&[a.clone(), b.clone()]);
        let source = String::from(Identity::from_pubkey(&[1; 32], false));
        // The shared source holds both transactions, in input order.
        assert_eq!(
            grouped[&source]["00"],
            vec![String::from(a.id()), String::from(b.id())]
        );
        let dest_a = String::from(Identity::from_pubkey(&[2; 32], false));
        assert_eq!(grouped[&dest_a]["00"], vec![String::from(a.id())]);
    }
}
