//! Startup schema migrations.
//!
//! An always-on cleanup step drops retired prefixes, then the numbered
//! migrations run from the persisted version upward. Each migration is
//! idempotent with respect to its observable effect and the version record
//! only advances after success.

use crate::assets;
use archive_model::Transaction;
use archive_proto::{self as proto, convert, ConvertError};
use archive_store::{keys, ArchiveStore, StoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("stored transaction could not be converted: {0}")]
    Convert(#[from] ConvertError),
}

type Migration = fn(&ArchiveStore) -> Result<(), MigrationError>;

/// Ordered list; version numbers are the 1-based positions. Append only.
const MIGRATIONS: &[(&str, Migration)] = &[(
    "rebuild per-identity-per-asset transaction index",
    rebuild_asset_transactions,
)];

pub fn run(store: &ArchiveStore) -> Result<(), MigrationError> {
    cleanup(store)?;

    let current = match store.get_migration_version() {
        Ok(version) => version,
        Err(StoreError::NotFound) => 0,
        Err(e) => return Err(e.into()),
    };

    for (index, (name, migration)) in MIGRATIONS.iter().enumerate() {
        let version = index as u32 + 1;
        if version <= current {
            continue;
        }
        tracing::info!(version, name, "running migration");
        migration(store)?;
        store.set_migration_version(version)?;
        tracing::info!(version, "migration complete");
    }
    Ok(())
}

/// Runs on every startup: quorum votes are no longer kept, drop whatever an
/// older build left behind.
fn cleanup(store: &ArchiveStore) -> Result<(), MigrationError> {
    let removed = store.clear_prefix(keys::QUORUM_DATA)?;
    if removed > 0 {
        tracing::info!(removed, "dropped retired quorum data");
    }
    Ok(())
}

/// Re-derive the asset index from the stored transactions: clear it, then
/// re-classify every transaction of every processed tick and reissue the
/// writes the indexer would have produced.
fn rebuild_asset_transactions(store: &ArchiveStore) -> Result<(), MigrationError> {
    store.clear_prefix(keys::QX_IDENTITY_ASSET_TRANSFERS)?;

    let last = match store.get_last_processed_tick() {
        Ok(last) => last,
        Err(StoreError::NotFound) => return Ok(()),
        Err(e) => return Err(e.into()),
    };
    let first = match store.find_first_tick() {
        Ok(first) => first,
        Err(StoreError::NotFound) => return Ok(()),
        Err(e) => return Err(e.into()),
    };

    let mut rebuilt = 0u64;
    for tick in first..=last.tick_number {
        let records = match store.get_tick_transactions(tick) {
            Ok(records) => records,
            Err(StoreError::NotFound) => continue,
            Err(e) => return Err(e.into()),
        };
        if records.is_empty() {
            continue;
        }
        let transactions = records
            .iter()
            .map(convert::record_to_transaction)
            .collect::<Result<Vec<Transaction>, _>>()?;
        let grouped = assets::group_by_identity_and_asset(&transactions);
        if grouped.is_empty() {
            continue;
        }
        let mut batch = store.batch();
        for (identity, per_asset) in &grouped {
            for (asset_id, tx_ids) in per_asset {
                batch.set_asset_transactions(
                    identity,
                    asset_id,
                    tick,
                    &proto::AssetTransactionsPerTick {
                        transactions: tx_ids.clone(),
                    },
                );
            }
        }
        store.commit(batch, false)?;
        rebuilt += 1;
        if rebuilt % 100_000 == 0 {
            tracing::info!(rebuilt, tick, "asset index rebuild in progress");
        }
    }

    // The durable version write that follows fences the eventual-durability
    // batches above.
    let count = store.count_keys_with_prefix(keys::QX_IDENTITY_ASSET_TRANSFERS)?;
    tracing::info!(ticks = rebuilt, keys = count, "asset index rebuilt");
    Ok(())
}
