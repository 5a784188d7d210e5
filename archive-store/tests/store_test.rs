//! Persistence tests against a real database in a temp directory.

use archive_model::{Digest, Identity};
use archive_proto as proto;
use archive_store::{keys, ArchiveStore, StoreError};

fn open_store() -> (tempfile::TempDir, ArchiveStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = ArchiveStore::open(dir.path()).unwrap();
    (dir, store)
}

/// Deterministic 60-char lowercase transaction id.
fn tx_id(n: u8) -> String {
    Identity::from_pubkey(&[n; 32], true).into()
}

fn identity(n: u8) -> String {
    Identity::from_pubkey(&[n; 32], false).into()
}

fn store_tx(store: &ArchiveStore, id: &str, tick: u32, money_flew: bool) {
    let mut batch = store.batch();
    batch
        .set_transaction(&proto::Transaction {
            tx_id: id.to_owned(),
            tick_number: tick,
            amount: 10,
            ..Default::default()
        })
        .unwrap();
    batch
        .set_transaction_status(&proto::TransactionStatus {
            tx_id: id.to_owned(),
            money_flew,
        })
        .unwrap();
    store.commit(batch, true).unwrap();
}

#[test]
fn missing_records_are_not_found() {
    let (_dir, store) = open_store();
    assert!(matches!(store.get_tick_data(1), Err(StoreError::NotFound)));
    assert!(matches!(
        store.get_last_processed_tick(),
        Err(StoreError::NotFound)
    ));
    assert!(matches!(store.find_first_tick(), Err(StoreError::NotFound)));
}

#[test]
fn tick_data_round_trip() {
    let (_dir, store) = open_store();
    let record = proto::TickData {
        epoch: 130,
        tick_number: 15_000_000,
        timestamp: 1_700_000_000_000,
        transaction_ids: vec![tx_id(1)],
        ..Default::default()
    };
    let mut batch = store.batch();
    batch.set_tick_data(&record);
    store.commit(batch, true).unwrap();
    assert_eq!(store.get_tick_data(15_000_000).unwrap(), record);
}

#[test]
fn batch_is_atomic_and_visible_at_once() {
    let (_dir, store) = open_store();
    let id = tx_id(9);
    let mut batch = store.batch();
    batch.set_tick_data(&proto::TickData {
        tick_number: 7,
        epoch: 1,
        transaction_ids: vec![id.clone()],
        ..Default::default()
    });
    batch
        .set_transaction(&proto::Transaction {
            tx_id: id.clone(),
            tick_number: 7,
            amount: 5,
            ..Default::default()
        })
        .unwrap();
    batch.set_last_processed_tick(&proto::ProcessedTick {
        tick_number: 7,
        epoch: 1,
    });
    // Nothing visible before commit.
    assert!(store.get_tick_data(7).is_err());
    store.commit(batch, true).unwrap();
    assert_eq!(store.get_tick_transactions(7).unwrap().len(), 1);
    assert_eq!(store.get_last_processed_tick().unwrap().tick_number, 7);
    assert_eq!(
        store.get_last_processed_ticks_per_epoch().unwrap()[&1],
        7
    );
}

#[test]
fn legacy_last_processed_tick_format_is_readable() {
    let (_dir, store) = open_store();
    // Per-epoch entry written the modern way.
    let mut batch = store.batch();
    batch.set_last_processed_tick(&proto::ProcessedTick {
        tick_number: 123,
        epoch: 55,
    });
    store.commit(batch, true).unwrap();

    // Overwrite the global record with the pre-upgrade 8-byte format.
    let mut batch = store.batch();
    batch.put(keys::last_processed_tick_key(), 123u64.to_le_bytes().to_vec());
    store.commit(batch, true).unwrap();

    let lpt = store.get_last_processed_tick().unwrap();
    assert_eq!(lpt.tick_number, 123);
    assert_eq!(lpt.epoch, 55, "epoch resolved via the per-epoch table");
}

#[test]
fn transfer_transactions_range_scan_is_bounded() {
    let (_dir, store) = open_store();
    let ident = identity(3);
    for tick in [10u32, 20, 30, 40] {
        let mut batch = store.batch();
        batch.set_transfer_transactions(
            &ident,
            tick,
            &proto::TransferTransactionsPerTick {
                tick_number: tick,
                identity: ident.clone(),
                transactions: vec![],
            },
        );
        store.commit(batch, true).unwrap();
    }
    let hits = store.get_transfer_transactions(&ident, 20, 30).unwrap();
    assert_eq!(
        hits.iter().map(|h| h.tick_number).collect::<Vec<_>>(),
        vec![20, 30]
    );
    // A different identity sees nothing.
    assert!(store
        .get_transfer_transactions(&identity(4), 0, 100)
        .unwrap()
        .is_empty());
}

#[test]
fn empty_tick_counter_and_migration_version_are_le_values() {
    let (_dir, store) = open_store();
    let mut batch = store.batch();
    batch.set_empty_ticks_for_epoch(130, 42);
    store.commit(batch, true).unwrap();
    assert_eq!(store.get_empty_ticks_for_epoch(130).unwrap(), 42);
    assert_eq!(
        store.get_empty_ticks_for_epochs(&[129, 130]).unwrap()[&129],
        0
    );

    assert!(store.get_migration_version().is_err());
    store.set_migration_version(1).unwrap();
    assert_eq!(store.get_migration_version().unwrap(), 1);
}

#[test]
fn prefix_maintenance_counts_and_clears() {
    let (_dir, store) = open_store();
    for tick in 0..5u32 {
        let mut batch = store.batch();
        batch.put(keys::quorum_data_key(tick), vec![1, 2, 3]);
        store.commit(batch, true).unwrap();
    }
    let mut batch = store.batch();
    batch.set_tick_data(&proto::TickData {
        tick_number: 1,
        ..Default::default()
    });
    store.commit(batch, true).unwrap();

    assert_eq!(store.count_keys_with_prefix(keys::QUORUM_DATA).unwrap(), 5);
    assert_eq!(store.clear_prefix(keys::QUORUM_DATA).unwrap(), 5);
    assert_eq!(store.count_keys_with_prefix(keys::QUORUM_DATA).unwrap(), 0);
    // Neighboring prefixes untouched.
    assert!(store.get_tick_data(1).is_ok());
    assert_eq!(store.find_first_tick().unwrap(), 1);
}

#[test]
fn chain_digests_round_trip() {
    let (_dir, store) = open_store();
    let digest = Digest([7; 32]);
    let mut batch = store.batch();
    batch.set_chain_digest(42, &digest);
    batch.set_store_digest(42, &digest);
    store.commit(batch, true).unwrap();
    assert_eq!(store.get_chain_digest(42).unwrap(), digest);
    assert_eq!(store.get_store_digest(42).unwrap(), digest);
}

#[test]
fn skipped_intervals_coalesce_adjacent_runs() {
    let (_dir, store) = open_store();
    store.append_skipped_ticks_interval(10, 10).unwrap();
    store.append_skipped_ticks_interval(11, 11).unwrap();
    store.append_skipped_ticks_interval(20, 25).unwrap();
    let list = store.get_skipped_ticks().unwrap();
    assert_eq!(
        list.skipped_ticks,
        vec![
            proto::SkippedTicksInterval {
                start_tick: 10,
                end_tick: 11
            },
            proto::SkippedTicksInterval {
                start_tick: 20,
                end_tick: 25
            },
        ]
    );
}

#[test]
fn corrupt_record_is_reported() {
    let (_dir, store) = open_store();
    let mut batch = store.batch();
    // Field 3 (tick_number, varint) with a truncated value.
    batch.put(keys::tick_data_key(9), vec![0x18]);
    store.commit(batch, true).unwrap();
    assert!(matches!(
        store.get_tick_data(9),
        Err(StoreError::Decode(_))
    ));
}

// ---------------------------------------------------------------------------
// Reverse-paginated asset reader
// ---------------------------------------------------------------------------

fn seed_asset_bucket(
    store: &ArchiveStore,
    ident: &str,
    asset: &str,
    tick: u32,
    ids: &[String],
    last_processed: u32,
) {
    let mut batch = store.batch();
    batch.set_tick_data(&proto::TickData {
        tick_number: tick,
        epoch: 1,
        timestamp: 1_000 + tick as u64,
        transaction_ids: ids.to_vec(),
        ..Default::default()
    });
    batch.set_asset_transactions(
        ident,
        asset,
        tick,
        &proto::AssetTransactionsPerTick {
            transactions: ids.to_vec(),
        },
    );
    batch.set_last_processed_tick(&proto::ProcessedTick {
        tick_number: last_processed,
        epoch: 1,
    });
    store.commit(batch, true).unwrap();
}

#[test]
fn asset_reader_pages_exactly_once_in_descending_order() {
    let (_dir, store) = open_store();
    let ident = identity(1);
    let asset = format!("{}CFB", identity(2));
    let tick = 100u32;
    let ids: Vec<String> = (1..=5).map(tx_id).collect();
    for id in &ids {
        store_tx(&store, id, tick, true);
    }
    seed_asset_bucket(&store, &ident, &asset, tick, &ids, tick);

    // Page 1: two newest entries (stored order reversed).
    let page = store
        .get_identity_asset_transactions(&ident, &asset, 0, 0, 2, true)
        .unwrap();
    assert_eq!(page.transactions.len(), 2);
    assert_eq!(page.transactions[0].transaction.tx_id, ids[4]);
    assert_eq!(page.transactions[1].transaction.tx_id, ids[3]);
    assert_eq!((page.next_end_tick, page.next_index), (tick, 2));
    assert_eq!(page.last_processed_tick, tick);

    // Page 2 resumes inside the tick.
    let page = store
        .get_identity_asset_transactions(&ident, &asset, page.next_end_tick, page.next_index, 2, true)
        .unwrap();
    assert_eq!(page.transactions.len(), 2);
    assert_eq!(page.transactions[0].transaction.tx_id, ids[2]);
    assert_eq!(page.transactions[1].transaction.tx_id, ids[1]);
    assert_eq!((page.next_end_tick, page.next_index), (tick, 4));

    // Page 3 drains the tick and moves the cursor below it.
    let page = store
        .get_identity_asset_transactions(&ident, &asset, page.next_end_tick, page.next_index, 2, true)
        .unwrap();
    assert_eq!(page.transactions.len(), 1);
    assert_eq!(page.transactions[0].transaction.tx_id, ids[0]);
    assert_eq!((page.next_end_tick, page.next_index), (tick - 1, 0));
}

#[test]
fn asset_reader_never_reserves_a_tick_drained_at_the_limit() {
    let (_dir, store) = open_store();
    let ident = identity(1);
    let asset = format!("{}CFB", identity(2));
    let ids: Vec<String> = (1..=2).map(tx_id).collect();
    for id in &ids {
        store_tx(&store, id, 50, true);
    }
    seed_asset_bucket(&store, &ident, &asset, 50, &ids, 50);

    // Limit hits exactly at the last entry of the tick.
    let page = store
        .get_identity_asset_transactions(&ident, &asset, 0, 0, 2, true)
        .unwrap();
    assert_eq!(page.transactions.len(), 2);
    assert_eq!((page.next_end_tick, page.next_index), (49, 0));

    let page = store
        .get_identity_asset_transactions(&ident, &asset, page.next_end_tick, page.next_index, 2, true)
        .unwrap();
    assert!(page.transactions.is_empty());
}

#[test]
fn asset_reader_filters_failed_transactions() {
    let (_dir, store) = open_store();
    let ident = identity(1);
    let asset = format!("{}CFB", identity(2));
    let ids: Vec<String> = (1..=3).map(tx_id).collect();
    store_tx(&store, &ids[0], 60, true);
    store_tx(&store, &ids[1], 60, false);
    store_tx(&store, &ids[2], 60, true);
    seed_asset_bucket(&store, &ident, &asset, 60, &ids, 60);

    let page = store
        .get_identity_asset_transactions(&ident, &asset, 0, 0, 10, false)
        .unwrap();
    assert_eq!(
        page.transactions
            .iter()
            .map(|t| t.transaction.tx_id.clone())
            .collect::<Vec<_>>(),
        vec![ids[2].clone(), ids[0].clone()]
    );
    assert!(page.transactions.iter().all(|t| t.money_flew));

    let page = store
        .get_identity_asset_transactions(&ident, &asset, 0, 0, 10, true)
        .unwrap();
    assert_eq!(page.transactions.len(), 3);
}

#[test]
fn asset_reader_spans_multiple_ticks_descending() {
    let (_dir, store) = open_store();
    let ident = identity(1);
    let asset = format!("{}QFT", identity(2));
    let older = vec![tx_id(1)];
    let newer = vec![tx_id(2)];
    store_tx(&store, &older[0], 10, true);
    store_tx(&store, &newer[0], 20, true);
    seed_asset_bucket(&store, &ident, &asset, 10, &older, 10);
    seed_asset_bucket(&store, &ident, &asset, 20, &newer, 20);

    let page = store
        .get_identity_asset_transactions(&ident, &asset, 0, 0, 10, true)
        .unwrap();
    assert_eq!(
        page.transactions
            .iter()
            .map(|t| t.transaction.tick_number)
            .collect::<Vec<_>>(),
        vec![20, 10]
    );
    assert_eq!(page.transactions[0].timestamp, 1_020);
    // endTick bound excludes newer ticks.
    let page = store
        .get_identity_asset_transactions(&ident, &asset, 15, 0, 10, true)
        .unwrap();
    assert_eq!(page.transactions.len(), 1);
    assert_eq!(page.transactions[0].transaction.tick_number, 10);
}
