//! Reverse-paginated reads over the asset-transaction index.

use crate::error::StoreError;
use crate::keys;
use crate::store::ArchiveStore;
use archive_proto as proto;
use prost::Message;

/// Default page size when the caller passes `limit == 0`.
const DEFAULT_PAGE_SIZE: u32 = 1000;

/// One asset transaction, joined with its execution outcome and the
/// timestamp of its tick.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetTransactionRecord {
    pub transaction: proto::Transaction,
    pub money_flew: bool,
    pub timestamp: u64,
}

/// A page of asset transactions in descending tick order, plus the cursor to
/// resume at.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetTransactionsPage {
    pub transactions: Vec<AssetTransactionRecord>,
    /// Tick to resume at on the next call.
    pub next_end_tick: u32,
    /// Index of the next unread entry inside `next_end_tick`; zero when that
    /// tick was exhausted.
    pub next_index: u32,
    pub last_processed_tick: u32,
}

impl ArchiveStore {
    /// Read up to `limit` asset transactions for `(identity, asset_id)` in
    /// descending tick order, starting at `end_tick` (0 means the last
    /// processed tick) and skipping `start_index` entries inside the first
    /// tick. Entries within one tick are served newest-first.
    pub fn get_identity_asset_transactions(
        &self,
        identity: &str,
        asset_id: &str,
        end_tick: u32,
        start_index: u32,
        limit: u32,
        include_failed: bool,
    ) -> Result<AssetTransactionsPage, StoreError> {
        let last_processed = self.get_last_processed_tick()?;
        let end_tick = if end_tick == 0 {
            last_processed.tick_number
        } else {
            end_tick
        };
        let limit = if limit == 0 { DEFAULT_PAGE_SIZE } else { limit };

        let (lo, hi) = keys::asset_txs_range(identity, asset_id, end_tick);

        let mut transactions: Vec<AssetTransactionRecord> = Vec::new();
        let mut first_tick = true;
        let mut next_end_tick = 0u32;
        let mut next_index = 0u32;

        self.scan_range_rev(&lo, &hi, |key, value| {
            let tick = keys::tick_from_key_suffix(key)?;
            let per_tick = proto::AssetTransactionsPerTick::decode(value)?;
            next_end_tick = tick;

            // The list is stored in tick body order; reverse it so iteration
            // within the tick is newest-first.
            let mut tx_ids = per_tick.transactions;
            tx_ids.reverse();

            let start = if first_tick { start_index as usize } else { 0 };
            if first_tick && start >= tx_ids.len() {
                first_tick = false;
                return Ok(true);
            }
            first_tick = false;

            let tick_data = self.get_tick_data(tick)?;
            for (index, tx_id) in tx_ids.iter().enumerate().skip(start) {
                let status = self.get_transaction_status(tx_id)?;
                if !include_failed && !status.money_flew {
                    continue;
                }
                let transaction = self.get_transaction(tx_id)?;
                transactions.push(AssetTransactionRecord {
                    transaction,
                    money_flew: status.money_flew,
                    timestamp: tick_data.timestamp,
                });
                if transactions.len() as u32 >= limit {
                    if index + 1 < tx_ids.len() {
                        next_index = (index + 1) as u32;
                    } else {
                        // The tick happens to be exhausted exactly at the
                        // limit: resume below it, never re-serve it.
                        next_index = 0;
                        next_end_tick = tick.saturating_sub(1);
                    }
                    return Ok(false);
                }
            }

            // Tick fully consumed; resume below it.
            next_index = 0;
            next_end_tick = next_end_tick.saturating_sub(1);
            Ok(true)
        })?;

        Ok(AssetTransactionsPage {
            transactions,
            next_end_tick,
            next_index,
            last_processed_tick: last_processed.tick_number,
        })
    }
}
