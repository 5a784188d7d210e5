//! Key codec for the single ordered keyspace.
//!
//! Every key starts with a one-byte prefix identifying the record kind.
//! Integers embedded in keys are big-endian so that lexicographic order is
//! numeric order; counter values are little-endian for compactness.

use crate::error::StoreError;
use archive_model::Identity;

pub const TICK_DATA: u8 = 0x00;
/// Retired; cleared by the startup cleanup migration.
pub const QUORUM_DATA: u8 = 0x01;
pub const COMPUTOR_LIST: u8 = 0x02;
pub const TICK_TX: u8 = 0x03;
pub const LAST_PROCESSED_TICK: u8 = 0x04;
pub const LAST_PROCESSED_TICK_PER_EPOCH: u8 = 0x05;
pub const SKIPPED_TICKS_INTERVAL: u8 = 0x06;
pub const IDENTITY_TRANSFER_TXS: u8 = 0x07;
pub const CHAIN_DIGEST: u8 = 0x08;
pub const PROCESSED_TICK_INTERVALS: u8 = 0x09;
pub const TICK_TX_STATUS: u8 = 0x0a;
pub const TX_STATUS: u8 = 0x0b;
pub const STORE_DIGEST: u8 = 0x0c;
pub const EMPTY_TICKS_PER_EPOCH: u8 = 0x0d;
pub const QX_IDENTITY_ASSET_TRANSFERS: u8 = 0x0e;
pub const DB_MIGRATION_VERSION: u8 = 0x0f;

fn tick_key(prefix: u8, tick: u32) -> Vec<u8> {
    let mut key = Vec::with_capacity(9);
    key.push(prefix);
    key.extend_from_slice(&(tick as u64).to_be_bytes());
    key
}

fn epoch_key(prefix: u8, epoch: u32) -> Vec<u8> {
    let mut key = Vec::with_capacity(5);
    key.push(prefix);
    key.extend_from_slice(&epoch.to_be_bytes());
    key
}

pub fn tick_data_key(tick: u32) -> Vec<u8> {
    tick_key(TICK_DATA, tick)
}

pub fn quorum_data_key(tick: u32) -> Vec<u8> {
    tick_key(QUORUM_DATA, tick)
}

pub fn computors_key(epoch: u32) -> Vec<u8> {
    epoch_key(COMPUTOR_LIST, epoch)
}

/// Transactions are keyed by their raw 32-byte digest, recovered from the
/// 60-character lowercase transaction id.
pub fn tick_tx_key(tx_id: &str) -> Result<Vec<u8>, StoreError> {
    digest_key(TICK_TX, tx_id)
}

pub fn tx_status_key(tx_id: &str) -> Result<Vec<u8>, StoreError> {
    digest_key(TX_STATUS, tx_id)
}

fn digest_key(prefix: u8, tx_id: &str) -> Result<Vec<u8>, StoreError> {
    let digest = Identity::parse(tx_id)
        .and_then(|id| id.to_pubkey())
        .map_err(|e| StoreError::InvalidKey(format!("transaction id {tx_id:?}: {e}")))?;
    let mut key = Vec::with_capacity(1 + 32);
    key.push(prefix);
    key.extend_from_slice(digest.as_bytes());
    Ok(key)
}

pub fn tick_tx_status_key(tick: u32) -> Vec<u8> {
    tick_key(TICK_TX_STATUS, tick)
}

pub fn last_processed_tick_key() -> Vec<u8> {
    vec![LAST_PROCESSED_TICK]
}

pub fn last_processed_tick_per_epoch_key(epoch: u32) -> Vec<u8> {
    epoch_key(LAST_PROCESSED_TICK_PER_EPOCH, epoch)
}

pub fn skipped_ticks_interval_key() -> Vec<u8> {
    vec![SKIPPED_TICKS_INTERVAL]
}

pub fn transfer_txs_key(identity: &str, tick: u32) -> Vec<u8> {
    let mut key = Vec::with_capacity(1 + identity.len() + 8);
    key.push(IDENTITY_TRANSFER_TXS);
    key.extend_from_slice(identity.as_bytes());
    key.extend_from_slice(&(tick as u64).to_be_bytes());
    key
}

/// Half-open key range covering `[start_tick, end_tick]` for one identity.
pub fn transfer_txs_range(identity: &str, start_tick: u32, end_tick: u32) -> (Vec<u8>, Vec<u8>) {
    let mut lo = Vec::with_capacity(1 + identity.len() + 8);
    lo.push(IDENTITY_TRANSFER_TXS);
    lo.extend_from_slice(identity.as_bytes());
    let mut hi = lo.clone();
    lo.extend_from_slice(&(start_tick as u64).to_be_bytes());
    hi.extend_from_slice(&(end_tick as u64 + 1).to_be_bytes());
    (lo, hi)
}

pub fn chain_digest_key(tick: u32) -> Vec<u8> {
    tick_key(CHAIN_DIGEST, tick)
}

pub fn store_digest_key(tick: u32) -> Vec<u8> {
    tick_key(STORE_DIGEST, tick)
}

pub fn processed_tick_intervals_key(epoch: u32) -> Vec<u8> {
    epoch_key(PROCESSED_TICK_INTERVALS, epoch)
}

pub fn empty_ticks_per_epoch_key(epoch: u32) -> Vec<u8> {
    epoch_key(EMPTY_TICKS_PER_EPOCH, epoch)
}

pub fn asset_txs_key(identity: &str, asset_id: &str, tick: u32) -> Vec<u8> {
    let mut key = asset_txs_base(identity, asset_id);
    key.extend_from_slice(&(tick as u64).to_be_bytes());
    key
}

/// Half-open key range covering ticks `[0, end_tick]` of one
/// (identity, asset) bucket.
pub fn asset_txs_range(identity: &str, asset_id: &str, end_tick: u32) -> (Vec<u8>, Vec<u8>) {
    let mut lo = asset_txs_base(identity, asset_id);
    let mut hi = lo.clone();
    lo.extend_from_slice(&0u64.to_be_bytes());
    hi.extend_from_slice(&(end_tick as u64 + 1).to_be_bytes());
    (lo, hi)
}

fn asset_txs_base(identity: &str, asset_id: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(1 + identity.len() + asset_id.len() + 8);
    key.push(QX_IDENTITY_ASSET_TRANSFERS);
    key.extend_from_slice(identity.as_bytes());
    key.extend_from_slice(asset_id.as_bytes());
    key
}

pub fn migration_version_key() -> Vec<u8> {
    vec![DB_MIGRATION_VERSION]
}

/// Half-open range covering every key under a prefix.
pub fn prefix_range(prefix: u8) -> (Vec<u8>, Vec<u8>) {
    debug_assert!(prefix < u8::MAX);
    (vec![prefix], vec![prefix + 1])
}

/// Tick number from the trailing eight big-endian bytes of a key.
pub fn tick_from_key_suffix(key: &[u8]) -> Result<u32, StoreError> {
    if key.len() < 8 {
        return Err(StoreError::Corrupt(format!(
            "key too short to carry a tick number: {} bytes",
            key.len()
        )));
    }
    let mut tail = [0u8; 8];
    tail.copy_from_slice(&key[key.len() - 8..]);
    Ok(u64::from_be_bytes(tail) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_keys_sort_numerically() {
        let a = tick_data_key(255);
        let b = tick_data_key(256);
        let c = tick_data_key(65536);
        assert!(a < b && b < c);
        assert_eq!(tick_from_key_suffix(&c).unwrap(), 65536);
    }

    #[test]
    fn prefixes_are_distinct() {
        let mut all = vec![
            TICK_DATA,
            QUORUM_DATA,
            COMPUTOR_LIST,
            TICK_TX,
            LAST_PROCESSED_TICK,
            LAST_PROCESSED_TICK_PER_EPOCH,
            SKIPPED_TICKS_INTERVAL,
            IDENTITY_TRANSFER_TXS,
            CHAIN_DIGEST,
            PROCESSED_TICK_INTERVALS,
            TICK_TX_STATUS,
            TX_STATUS,
            STORE_DIGEST,
            EMPTY_TICKS_PER_EPOCH,
            QX_IDENTITY_ASSET_TRANSFERS,
            DB_MIGRATION_VERSION,
        ];
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), 16);
    }

    #[test]
    fn transfer_range_is_inclusive_of_end_tick() {
        let (lo, hi) = transfer_txs_range("IDENT", 10, 20);
        assert_eq!(lo, transfer_txs_key("IDENT", 10));
        assert!(transfer_txs_key("IDENT", 20) < hi);
        assert!(transfer_txs_key("IDENT", 21) >= hi);
    }

    #[test]
    fn asset_range_upper_bound_survives_max_tick() {
        // end_tick + 1 is computed in u64; u32::MAX must not wrap.
        let (_, hi) = asset_txs_range("IDENT", "ASSET", u32::MAX);
        assert!(asset_txs_key("IDENT", "ASSET", u32::MAX) < hi);
    }

    #[test]
    fn tx_keys_reject_malformed_ids() {
        assert!(tick_tx_key("not-an-id").is_err());
    }
}
