//! The redb-backed store façade.
//!
//! One database, one `&[u8] → &[u8]` table, multiplexed by the one-byte key
//! prefixes in [`crate::keys`]. Single writer (the pipeline), many readers
//! (the query façade); redb's MVCC gives readers a consistent snapshot while
//! a batch commits.

use crate::error::StoreError;
use crate::keys;
use archive_model::Digest;
use archive_proto as proto;
use prost::Message;
use redb::{Database, Durability, ReadableTable, TableDefinition};
use std::collections::BTreeMap;
use std::path::Path;

const TABLE: TableDefinition<&[u8], &[u8]> = TableDefinition::new("archive");

/// Database file name inside the data directory.
const DB_FILE: &str = "archive.redb";

pub struct ArchiveStore {
    db: Database,
}

impl ArchiveStore {
    /// Open or create the archive database inside `data_dir`.
    pub fn open(data_dir: impl AsRef<Path>) -> Result<ArchiveStore, StoreError> {
        std::fs::create_dir_all(data_dir.as_ref())?;
        let db = Database::create(data_dir.as_ref().join(DB_FILE))?;
        let txn = db.begin_write()?;
        {
            let _ = txn.open_table(TABLE)?;
        }
        txn.commit()?;
        Ok(ArchiveStore { db })
    }

    // ---------------------------------------------------------------------
    // Raw access
    // ---------------------------------------------------------------------

    fn get_raw(&self, key: &[u8]) -> Result<Vec<u8>, StoreError> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(TABLE)?;
        match table.get(key)? {
            Some(value) => Ok(value.value().to_vec()),
            None => Err(StoreError::NotFound),
        }
    }

    fn get_message<M: Message + Default>(&self, key: &[u8]) -> Result<M, StoreError> {
        let value = self.get_raw(key)?;
        Ok(M::decode(value.as_slice())?)
    }

    fn put_raw(&self, key: &[u8], value: &[u8], sync: bool) -> Result<(), StoreError> {
        let mut batch = ArchiveBatch::default();
        batch.put(key.to_vec(), value.to_vec());
        self.commit(batch, sync)
    }

    /// Forward scan over `[lo, hi)`; the visitor returns `false` to stop.
    pub(crate) fn scan_range(
        &self,
        lo: &[u8],
        hi: &[u8],
        mut visit: impl FnMut(&[u8], &[u8]) -> Result<bool, StoreError>,
    ) -> Result<(), StoreError> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(TABLE)?;
        for entry in table.range(lo..hi)? {
            let (key, value) = entry?;
            if !visit(key.value(), value.value())? {
                break;
            }
        }
        Ok(())
    }

    /// Reverse scan over `[lo, hi)`, highest key first.
    pub(crate) fn scan_range_rev(
        &self,
        lo: &[u8],
        hi: &[u8],
        mut visit: impl FnMut(&[u8], &[u8]) -> Result<bool, StoreError>,
    ) -> Result<(), StoreError> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(TABLE)?;
        for entry in table.range(lo..hi)?.rev() {
            let (key, value) = entry?;
            if !visit(key.value(), value.value())? {
                break;
            }
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Batches
    // ---------------------------------------------------------------------

    pub fn batch(&self) -> ArchiveBatch {
        ArchiveBatch::default()
    }

    /// Apply a batch in one atomic transaction. With `sync` the commit is
    /// durable before returning.
    pub fn commit(&self, batch: ArchiveBatch, sync: bool) -> Result<(), StoreError> {
        let mut txn = self.db.begin_write()?;
        txn.set_durability(if sync {
            Durability::Immediate
        } else {
            Durability::Eventual
        });
        {
            let mut table = txn.open_table(TABLE)?;
            for (key, value) in &batch.puts {
                table.insert(key.as_slice(), value.as_slice())?;
            }
            for key in &batch.deletes {
                table.remove(key.as_slice())?;
            }
        }
        txn.commit()?;
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Typed read accessors
    // ---------------------------------------------------------------------

    pub fn get_tick_data(&self, tick: u32) -> Result<proto::TickData, StoreError> {
        self.get_message(&keys::tick_data_key(tick))
    }

    pub fn get_quorum_tick_data(&self, tick: u32) -> Result<proto::QuorumTickData, StoreError> {
        self.get_message(&keys::quorum_data_key(tick))
    }

    pub fn get_computors(&self, epoch: u32) -> Result<proto::Computors, StoreError> {
        self.get_message(&keys::computors_key(epoch))
    }

    pub fn get_transaction(&self, tx_id: &str) -> Result<proto::Transaction, StoreError> {
        self.get_message(&keys::tick_tx_key(tx_id)?)
    }

    pub fn get_transaction_status(
        &self,
        tx_id: &str,
    ) -> Result<proto::TransactionStatus, StoreError> {
        self.get_message(&keys::tx_status_key(tx_id)?)
    }

    pub fn get_tick_transactions_status(
        &self,
        tick: u32,
    ) -> Result<proto::TickTransactionsStatus, StoreError> {
        self.get_message(&keys::tick_tx_status_key(tick))
    }

    /// All transactions of a tick, in tick body order.
    pub fn get_tick_transactions(&self, tick: u32) -> Result<Vec<proto::Transaction>, StoreError> {
        let tick_data = self.get_tick_data(tick)?;
        let mut txs = Vec::with_capacity(tick_data.transaction_ids.len());
        for tx_id in &tick_data.transaction_ids {
            txs.push(self.get_transaction(tx_id)?);
        }
        Ok(txs)
    }

    /// Transactions of a tick that moved funds (`amount > 0`).
    pub fn get_tick_transfer_transactions(
        &self,
        tick: u32,
    ) -> Result<Vec<proto::Transaction>, StoreError> {
        Ok(self
            .get_tick_transactions(tick)?
            .into_iter()
            .filter(|tx| tx.amount > 0)
            .collect())
    }

    /// The last fully indexed tick. Reads both the framed record and the
    /// legacy 8-byte little-endian format, resolving the epoch for the
    /// latter through the per-epoch table.
    pub fn get_last_processed_tick(&self) -> Result<proto::ProcessedTick, StoreError> {
        let value = self.get_raw(&keys::last_processed_tick_key())?;
        if value.len() == 8 {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(&value);
            let tick_number = u64::from_le_bytes(raw) as u32;
            let per_epoch = self.get_last_processed_ticks_per_epoch()?;
            let epoch = per_epoch
                .iter()
                .find(|(_, tick)| **tick == tick_number)
                .map(|(epoch, _)| *epoch)
                .unwrap_or(0);
            return Ok(proto::ProcessedTick { tick_number, epoch });
        }
        Ok(proto::ProcessedTick::decode(value.as_slice())?)
    }

    pub fn get_last_processed_ticks_per_epoch(&self) -> Result<BTreeMap<u32, u32>, StoreError> {
        let (lo, hi) = keys::prefix_range(keys::LAST_PROCESSED_TICK_PER_EPOCH);
        let mut out = BTreeMap::new();
        self.scan_range(&lo, &hi, |key, value| {
            if key.len() != 5 || value.len() < 4 {
                return Err(StoreError::Corrupt(
                    "malformed last-processed-tick-per-epoch entry".into(),
                ));
            }
            let epoch = u32::from_be_bytes([key[1], key[2], key[3], key[4]]);
            let tick = u32::from_le_bytes([value[0], value[1], value[2], value[3]]);
            out.insert(epoch, tick);
            Ok(true)
        })?;
        Ok(out)
    }

    pub fn get_skipped_ticks(&self) -> Result<proto::SkippedTicksIntervalList, StoreError> {
        self.get_message(&keys::skipped_ticks_interval_key())
    }

    /// Record a run of skipped ticks, coalescing with the previous run when
    /// adjacent.
    pub fn append_skipped_ticks_interval(
        &self,
        start_tick: u32,
        end_tick: u32,
    ) -> Result<(), StoreError> {
        let mut list = match self.get_skipped_ticks() {
            Ok(list) => list,
            Err(StoreError::NotFound) => proto::SkippedTicksIntervalList::default(),
            Err(e) => return Err(e),
        };
        match list.skipped_ticks.last_mut() {
            Some(last) if last.end_tick + 1 == start_tick => last.end_tick = end_tick,
            _ => list.skipped_ticks.push(proto::SkippedTicksInterval {
                start_tick,
                end_tick,
            }),
        }
        self.put_raw(
            &keys::skipped_ticks_interval_key(),
            &list.encode_to_vec(),
            true,
        )
    }

    /// Intervals for one epoch; absent records read as an empty set.
    pub fn get_processed_tick_intervals_per_epoch(
        &self,
        epoch: u32,
    ) -> Result<proto::ProcessedTickIntervalsPerEpoch, StoreError> {
        match self.get_message(&keys::processed_tick_intervals_key(epoch)) {
            Ok(ptie) => Ok(ptie),
            Err(StoreError::NotFound) => Ok(proto::ProcessedTickIntervalsPerEpoch {
                epoch,
                intervals: Vec::new(),
            }),
            Err(e) => Err(e),
        }
    }

    /// Every epoch's intervals, ascending by epoch.
    pub fn get_processed_tick_intervals(
        &self,
    ) -> Result<Vec<proto::ProcessedTickIntervalsPerEpoch>, StoreError> {
        let (lo, hi) = keys::prefix_range(keys::PROCESSED_TICK_INTERVALS);
        let mut out = Vec::new();
        self.scan_range(&lo, &hi, |_, value| {
            out.push(proto::ProcessedTickIntervalsPerEpoch::decode(value)?);
            Ok(true)
        })?;
        Ok(out)
    }

    /// Per-tick transfer records for one identity over `[start_tick, end_tick]`.
    pub fn get_transfer_transactions(
        &self,
        identity: &str,
        start_tick: u32,
        end_tick: u32,
    ) -> Result<Vec<proto::TransferTransactionsPerTick>, StoreError> {
        let (lo, hi) = keys::transfer_txs_range(identity, start_tick, end_tick);
        let mut out = Vec::new();
        self.scan_range(&lo, &hi, |_, value| {
            out.push(proto::TransferTransactionsPerTick::decode(value)?);
            Ok(true)
        })?;
        Ok(out)
    }

    pub fn get_empty_ticks_for_epoch(&self, epoch: u32) -> Result<u32, StoreError> {
        let value = self.get_raw(&keys::empty_ticks_per_epoch_key(epoch))?;
        if value.len() < 4 {
            return Err(StoreError::Corrupt("malformed empty-tick counter".into()));
        }
        Ok(u32::from_le_bytes([value[0], value[1], value[2], value[3]]))
    }

    pub fn get_empty_ticks_for_epochs(
        &self,
        epochs: &[u32],
    ) -> Result<BTreeMap<u32, u32>, StoreError> {
        let mut out = BTreeMap::new();
        for &epoch in epochs {
            let count = match self.get_empty_ticks_for_epoch(epoch) {
                Ok(count) => count,
                Err(StoreError::NotFound) => 0,
                Err(e) => return Err(e),
            };
            out.insert(epoch, count);
        }
        Ok(out)
    }

    pub fn get_chain_digest(&self, tick: u32) -> Result<Digest, StoreError> {
        digest_from_value(self.get_raw(&keys::chain_digest_key(tick))?)
    }

    pub fn get_store_digest(&self, tick: u32) -> Result<Digest, StoreError> {
        digest_from_value(self.get_raw(&keys::store_digest_key(tick))?)
    }

    pub fn get_migration_version(&self) -> Result<u32, StoreError> {
        let value = self.get_raw(&keys::migration_version_key())?;
        if value.len() < 4 {
            return Err(StoreError::Corrupt("malformed migration version".into()));
        }
        Ok(u32::from_le_bytes([value[0], value[1], value[2], value[3]]))
    }

    pub fn set_migration_version(&self, version: u32) -> Result<(), StoreError> {
        self.put_raw(
            &keys::migration_version_key(),
            &version.to_le_bytes(),
            true,
        )
    }

    /// The lowest tick with a persisted body: a single forward seek.
    pub fn find_first_tick(&self) -> Result<u32, StoreError> {
        let (lo, hi) = keys::prefix_range(keys::TICK_DATA);
        let mut first = None;
        self.scan_range(&lo, &hi, |key, _| {
            first = Some(keys::tick_from_key_suffix(key)?);
            Ok(false)
        })?;
        first.ok_or(StoreError::NotFound)
    }

    // ---------------------------------------------------------------------
    // Maintenance
    // ---------------------------------------------------------------------

    pub fn count_keys_with_prefix(&self, prefix: u8) -> Result<u64, StoreError> {
        let (lo, hi) = keys::prefix_range(prefix);
        let mut count = 0u64;
        self.scan_range(&lo, &hi, |_, _| {
            count += 1;
            Ok(true)
        })?;
        Ok(count)
    }

    /// Delete every key under a prefix; returns the number removed.
    pub fn clear_prefix(&self, prefix: u8) -> Result<u64, StoreError> {
        let (lo, hi) = keys::prefix_range(prefix);
        let txn = self.db.begin_write()?;
        let removed;
        {
            let mut table = txn.open_table(TABLE)?;
            let doomed: Vec<Vec<u8>> = {
                let mut found = Vec::new();
                for entry in table.range(lo.as_slice()..hi.as_slice())? {
                    let (key, _) = entry?;
                    found.push(key.value().to_vec());
                }
                found
            };
            removed = doomed.len() as u64;
            for key in doomed {
                table.remove(key.as_slice())?;
            }
        }
        txn.commit()?;
        if removed > 0 {
            tracing::debug!(prefix, removed, "cleared key prefix");
        }
        Ok(removed)
    }
}

fn digest_from_value(value: Vec<u8>) -> Result<Digest, StoreError> {
    Digest::try_from(value.as_slice())
        .map_err(|_| StoreError::Corrupt(format!("digest value has {} bytes", value.len())))
}

/// Accumulates writes; applied atomically by [`ArchiveStore::commit`].
#[derive(Default)]
pub struct ArchiveBatch {
    puts: Vec<(Vec<u8>, Vec<u8>)>,
    deletes: Vec<Vec<u8>>,
}

impl ArchiveBatch {
    pub fn put(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.puts.push((key, value));
    }

    pub fn delete(&mut self, key: Vec<u8>) {
        self.deletes.push(key);
    }

    pub fn len(&self) -> usize {
        self.puts.len() + self.deletes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.puts.is_empty() && self.deletes.is_empty()
    }

    fn put_message<M: Message>(&mut self, key: Vec<u8>, message: &M) {
        self.put(key, message.encode_to_vec());
    }

    pub fn set_tick_data(&mut self, tick_data: &proto::TickData) {
        self.put_message(keys::tick_data_key(tick_data.tick_number), tick_data);
    }

    pub fn set_computors(&mut self, epoch: u32, computors: &proto::Computors) {
        self.put_message(keys::computors_key(epoch), computors);
    }

    pub fn set_transaction(&mut self, tx: &proto::Transaction) -> Result<(), StoreError> {
        let key = keys::tick_tx_key(&tx.tx_id)?;
        self.put_message(key, tx);
        Ok(())
    }

    pub fn set_transaction_status(
        &mut self,
        status: &proto::TransactionStatus,
    ) -> Result<(), StoreError> {
        let key = keys::tx_status_key(&status.tx_id)?;
        self.put_message(key, status);
        Ok(())
    }

    pub fn set_tick_transactions_status(&mut self, status: &proto::TickTransactionsStatus) {
        self.put_message(keys::tick_tx_status_key(status.tick_number), status);
    }

    pub fn set_transfer_transactions(
        &mut self,
        identity: &str,
        tick: u32,
        record: &proto::TransferTransactionsPerTick,
    ) {
        self.put_message(keys::transfer_txs_key(identity, tick), record);
    }

    pub fn set_asset_transactions(
        &mut self,
        identity: &str,
        asset_id: &str,
        tick: u32,
        record: &proto::AssetTransactionsPerTick,
    ) {
        self.put_message(keys::asset_txs_key(identity, asset_id, tick), record);
    }

    /// Writes both the framed global record and the little-endian per-epoch
    /// value. The legacy 8-byte global format is read-compatible but never
    /// written.
    pub fn set_last_processed_tick(&mut self, lpt: &proto::ProcessedTick) {
        self.put_message(keys::last_processed_tick_key(), lpt);
        self.put(
            keys::last_processed_tick_per_epoch_key(lpt.epoch),
            lpt.tick_number.to_le_bytes().to_vec(),
        );
    }

    pub fn set_processed_tick_intervals(
        &mut self,
        ptie: &proto::ProcessedTickIntervalsPerEpoch,
    ) {
        self.put_message(keys::processed_tick_intervals_key(ptie.epoch), ptie);
    }

    pub fn set_empty_ticks_for_epoch(&mut self, epoch: u32, count: u32) {
        self.put(
            keys::empty_ticks_per_epoch_key(epoch),
            count.to_le_bytes().to_vec(),
        );
    }

    pub fn set_chain_digest(&mut self, tick: u32, digest: &Digest) {
        self.put(keys::chain_digest_key(tick), digest.as_bytes().to_vec());
    }

    pub fn set_store_digest(&mut self, tick: u32, digest: &Digest) {
        self.put(keys::store_digest_key(tick), digest.as_bytes().to_vec());
    }
}
