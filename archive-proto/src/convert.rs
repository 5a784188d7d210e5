//! Wire model ↔ record conversion helpers.
//!
//! Standalone functions rather than `From` impls: conversions are fallible in
//! one direction only and several need context (identity re-encoding, hex
//! decoding) that reads better spelled out.

use crate::records;
use archive_model::{
    Computors, Identity, IdentityError, Signature, TickData, TickTxStatus, Transaction,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("invalid identity in record: {0}")]
    Identity(#[from] IdentityError),

    #[error("invalid hex in record: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("invalid record: {0}")]
    Invalid(String),
}

/// Model → record (infallible: every field is derivable).
pub fn tick_data_to_record(td: &TickData) -> records::TickData {
    records::TickData {
        computor_index: td.computor_index as u32,
        epoch: td.epoch as u32,
        tick_number: td.tick,
        timestamp: td.timestamp_ms(),
        transaction_ids: td
            .non_zero_digests()
            .iter()
            .map(|d| Identity::from_pubkey(d.as_bytes(), true).into())
            .collect(),
        contract_fees: td
            .contract_fees
            .iter()
            .copied()
            .filter(|fee| *fee != 0)
            .collect(),
        time_lock: td.timelock.to_vec(),
        signature_hex: hex::encode(td.signature.0),
    }
}

/// Model → record (infallible).
pub fn transaction_to_record(tx: &Transaction) -> records::Transaction {
    records::Transaction {
        source_id: Identity::from_pubkey(tx.source_public_key.as_bytes(), false).into(),
        dest_id: Identity::from_pubkey(tx.destination_public_key.as_bytes(), false).into(),
        amount: tx.amount,
        tick_number: tx.tick,
        input_type: tx.input_type as u32,
        input_size: tx.input_size as u32,
        input_hex: hex::encode(&tx.input),
        signature_hex: hex::encode(tx.signature.0),
        tx_id: tx.id().into(),
    }
}

/// Record → model (fallible: identity and hex fields are re-parsed).
pub fn record_to_transaction(record: &records::Transaction) -> Result<Transaction, ConvertError> {
    let source_public_key = Identity::parse(&record.source_id)?.to_pubkey()?;
    let destination_public_key = Identity::parse(&record.dest_id)?.to_pubkey()?;
    let input = hex::decode(&record.input_hex)?;
    let signature_bytes = hex::decode(&record.signature_hex)?;
    let signature = Signature::try_from(signature_bytes.as_slice())
        .map_err(|_| ConvertError::Invalid("signature must be exactly 64 bytes".into()))?;
    Ok(Transaction {
        source_public_key,
        destination_public_key,
        amount: record.amount,
        tick: record.tick_number,
        input_type: record.input_type as u16,
        input_size: record.input_size as u16,
        input,
        signature,
    })
}

/// Model → record (infallible).
pub fn computors_to_record(comps: &Computors) -> records::Computors {
    records::Computors {
        epoch: comps.epoch as u32,
        identities: comps
            .public_keys
            .iter()
            .map(|key| Identity::from_pubkey(key.as_bytes(), false).into())
            .collect(),
        signature_hex: hex::encode(comps.signature.0),
    }
}

/// Record → model (fallible).
pub fn record_to_computors(record: &records::Computors) -> Result<Computors, ConvertError> {
    let public_keys = record
        .identities
        .iter()
        .map(|id| Ok(Identity::parse(id)?.to_pubkey()?))
        .collect::<Result<Vec<_>, ConvertError>>()?;
    let signature_bytes = hex::decode(&record.signature_hex)?;
    let signature = Signature::try_from(signature_bytes.as_slice())
        .map_err(|_| ConvertError::Invalid("signature must be exactly 64 bytes".into()))?;
    Ok(Computors {
        epoch: record.epoch as u16,
        public_keys,
        signature,
    })
}

/// Execution outcomes → the per-tick aggregated record.
pub fn tick_status_to_record(status: &TickTxStatus) -> records::TickTransactionsStatus {
    records::TickTransactionsStatus {
        current_tick_of_node: status.current_tick_of_node,
        tick_number: status.tick,
        transactions: status
            .statuses
            .iter()
            .map(|s| records::TransactionStatus {
                tx_id: s.tx_id.clone().into(),
                money_flew: s.money_flew,
            })
            .collect(),
    }
}
