//! The per-tick indexer.
//!
//! Writes every record derived from a validated tick in one atomic, durable
//! batch: the tick body, the transactions and their statuses, the
//! per-identity transfer index, the per-identity-per-asset index, the digest
//! chains, and the processed-tick bookkeeping. External observers either see
//! all of a tick's records or none of them, and a tick counts as processed
//! only once the commit is durable.

use crate::assets;
use archive_model::{k12, Digest, TickData, TickTxStatus, Transaction};
use archive_proto::{self as proto, convert, ConvertError};
use archive_store::{ArchiveStore, StoreError};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("record conversion failed: {0}")]
    Convert(#[from] ConvertError),
}

/// Everything the validators established about one tick.
#[derive(Debug, Clone)]
pub struct ValidatedTick {
    pub epoch: u32,
    pub tick: u32,
    /// From the tick body, or from the dominant quorum vote for an empty
    /// tick.
    pub timestamp_ms: u64,
    /// The quorum-agreed tick digest; all-zero for an empty tick.
    pub tick_digest: Digest,
    /// Absent when the quorum agreed the tick carries no transactions.
    pub tick_data: Option<TickData>,
    /// Validated transactions in tick body order.
    pub transactions: Vec<Transaction>,
    pub statuses: TickTxStatus,
}

impl ValidatedTick {
    pub fn empty(epoch: u32, tick: u32, timestamp_ms: u64) -> ValidatedTick {
        ValidatedTick {
            epoch,
            tick,
            timestamp_ms,
            tick_digest: Digest::ZERO,
            tick_data: None,
            transactions: Vec::new(),
            statuses: TickTxStatus::default(),
        }
    }
}

/// Index one validated tick. On success the tick is durably processed; on
/// any error nothing is visible and the tick will be retried.
pub fn index_tick(store: &ArchiveStore, validated: &ValidatedTick) -> Result<(), IndexError> {
    let mut batch = store.batch();

    // Tick body. Empty ticks persist a body with an empty digest list so the
    // record itself proves the tick was seen.
    let tick_record = match &validated.tick_data {
        Some(tick_data) => convert::tick_data_to_record(tick_data),
        None => proto::TickData {
            epoch: validated.epoch,
            tick_number: validated.tick,
            timestamp: validated.timestamp_ms,
            ..Default::default()
        },
    };
    batch.set_tick_data(&tick_record);

    // Transactions and their statuses.
    let money_flew: BTreeMap<String, bool> = validated
        .statuses
        .statuses
        .iter()
        .map(|s| (s.tx_id.clone().into(), s.money_flew))
        .collect();
    let mut tx_records = Vec::with_capacity(validated.transactions.len());
    let mut aggregated = proto::TickTransactionsStatus {
        current_tick_of_node: validated.statuses.current_tick_of_node,
        tick_number: validated.tick,
        transactions: Vec::with_capacity(validated.transactions.len()),
    };
    for tx in &validated.transactions {
        let record = convert::transaction_to_record(tx);
        batch.set_transaction(&record)?;
        let status = proto::TransactionStatus {
            tx_id: record.tx_id.clone(),
            money_flew: money_flew.get(&record.tx_id).copied().unwrap_or(false),
        };
        batch.set_transaction_status(&status)?;
        aggregated.transactions.push(status);
        tx_records.push(record);
    }
    if !validated.transactions.is_empty() {
        batch.set_tick_transactions_status(&aggregated);
    }

    // Per-identity transfer index: one record per identity touched by a
    // funds-moving transaction, holding all such transactions of the tick.
    let mut transfers: BTreeMap<String, Vec<proto::Transaction>> = BTreeMap::new();
    for record in &tx_records {
        if record.amount <= 0 {
            continue;
        }
        for identity in [&record.source_id, &record.dest_id] {
            let entry = transfers.entry(identity.clone()).or_default();
            if entry.last() != Some(record) {
                entry.push(record.clone());
            }
        }
    }
    for (identity, txs) in &transfers {
        batch.set_transfer_transactions(
            identity,
            validated.tick,
            &proto::TransferTransactionsPerTick {
                tick_number: validated.tick,
                identity: identity.clone(),
                transactions: txs.clone(),
            },
        );
    }

    // Per-identity-per-asset index.
    let grouped = assets::group_by_identity_and_asset(&validated.transactions);
    for (identity, per_asset) in &grouped {
        for (asset_id, tx_ids) in per_asset {
            batch.set_asset_transactions(
                identity,
                asset_id,
                validated.tick,
                &proto::AssetTransactionsPerTick {
                    transactions: tx_ids.clone(),
                },
            );
        }
    }

    // Digest chains.
    let prev_chain = previous_digest(store.get_chain_digest(validated.tick.wrapping_sub(1)))?;
    let chain = chain_link(&prev_chain, &validated.tick_digest);
    batch.set_chain_digest(validated.tick, &chain);
    let prev_store = previous_digest(store.get_store_digest(validated.tick.wrapping_sub(1)))?;
    let store_link = chain_link(&prev_store, &k12(&prost_bytes(&tick_record)));
    batch.set_store_digest(validated.tick, &store_link);

    // Bookkeeping: last processed tick, per-epoch intervals, empty counter.
    let last = match store.get_last_processed_tick() {
        Ok(last) => Some(last),
        Err(StoreError::NotFound) => None,
        Err(e) => return Err(e.into()),
    };
    let mut intervals = store.get_processed_tick_intervals_per_epoch(validated.epoch)?;
    let contiguous = last
        .map(|l| l.epoch == validated.epoch && l.tick_number + 1 == validated.tick)
        .unwrap_or(false);
    match intervals.intervals.last_mut() {
        Some(interval) if contiguous => interval.last_processed_tick = validated.tick,
        _ => intervals.intervals.push(proto::ProcessedTickInterval {
            initial_processed_tick: validated.tick,
            last_processed_tick: validated.tick,
        }),
    }
    batch.set_processed_tick_intervals(&intervals);
    batch.set_last_processed_tick(&proto::ProcessedTick {
        tick_number: validated.tick,
        epoch: validated.epoch,
    });

    if tick_record.transaction_ids.is_empty() {
        let count = match store.get_empty_ticks_for_epoch(validated.epoch) {
            Ok(count) => count,
            Err(StoreError::NotFound) => 0,
            Err(e) => return Err(e.into()),
        };
        batch.set_empty_ticks_for_epoch(validated.epoch, count + 1);
    }

    let records = batch.len();
    store.commit(batch, true)?;
    tracing::debug!(
        tick = validated.tick,
        epoch = validated.epoch,
        transactions = validated.transactions.len(),
        records,
        "tick indexed"
    );
    Ok(())
}

fn previous_digest(read: Result<Digest, StoreError>) -> Result<Digest, IndexError> {
    match read {
        Ok(digest) => Ok(digest),
        Err(StoreError::NotFound) => Ok(Digest::ZERO),
        Err(e) => Err(e.into()),
    }
}

fn chain_link(previous: &Digest, current: &Digest) -> Digest {
    let mut bytes = Vec::with_capacity(Digest::LEN * 2);
    bytes.extend_from_slice(previous.as_bytes());
    bytes.extend_from_slice(current.as_bytes());
    k12(&bytes)
}

fn prost_bytes(record: &proto::TickData) -> Vec<u8> {
    use prost::Message;
    record.encode_to_vec()
}
