//! Transport-independent query service.

use archive_model::{Identity, NodeSource, SourceError};
use archive_proto as proto;
use archive_store::{ArchiveStore, AssetTransactionsPage, StoreError};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("not found")]
    NotFound,

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> ServiceError {
        match e {
            StoreError::NotFound => ServiceError::NotFound,
            StoreError::InvalidKey(message) => ServiceError::InvalidArgument(message),
            other => ServiceError::Internal(other.to_string()),
        }
    }
}

impl From<SourceError> for ServiceError {
    fn from(e: SourceError) -> ServiceError {
        match e {
            SourceError::NoData => ServiceError::NotFound,
            other => ServiceError::Internal(other.to_string()),
        }
    }
}

/// Aggregated archive health for the status operation.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveStatus {
    pub last_processed_tick: proto::ProcessedTick,
    pub last_processed_ticks_per_epoch: std::collections::BTreeMap<u32, u32>,
    pub skipped_ticks: Vec<proto::SkippedTicksInterval>,
    pub processed_tick_intervals_per_epoch: Vec<proto::ProcessedTickIntervalsPerEpoch>,
    pub empty_ticks_per_epoch: std::collections::BTreeMap<u32, u32>,
}

pub struct ArchiveService {
    store: Arc<ArchiveStore>,
    source: Arc<dyn NodeSource>,
}

impl ArchiveService {
    pub fn new(store: Arc<ArchiveStore>, source: Arc<dyn NodeSource>) -> ArchiveService {
        ArchiveService { store, source }
    }

    pub fn tick_data(&self, tick: u32) -> Result<proto::TickData, ServiceError> {
        Ok(self.store.get_tick_data(tick)?)
    }

    pub fn tick_transactions(&self, tick: u32) -> Result<Vec<proto::Transaction>, ServiceError> {
        Ok(self.store.get_tick_transactions(tick)?)
    }

    pub fn tick_transfer_transactions(
        &self,
        tick: u32,
    ) -> Result<Vec<proto::Transaction>, ServiceError> {
        Ok(self.store.get_tick_transfer_transactions(tick)?)
    }

    pub fn transaction(&self, tx_id: &str) -> Result<proto::Transaction, ServiceError> {
        Ok(self.store.get_transaction(tx_id)?)
    }

    pub fn transaction_status(&self, tx_id: &str) -> Result<proto::TransactionStatus, ServiceError> {
        Ok(self.store.get_transaction_status(tx_id)?)
    }

    pub fn tick_transactions_status(
        &self,
        tick: u32,
    ) -> Result<proto::TickTransactionsStatus, ServiceError> {
        Ok(self.store.get_tick_transactions_status(tick)?)
    }

    pub fn quorum_tick_data(&self, tick: u32) -> Result<proto::QuorumTickData, ServiceError> {
        Ok(self.store.get_quorum_tick_data(tick)?)
    }

    pub fn computors(&self, epoch: u32) -> Result<proto::Computors, ServiceError> {
        Ok(self.store.get_computors(epoch)?)
    }

    pub fn last_processed_tick(&self) -> Result<proto::ProcessedTick, ServiceError> {
        Ok(self.store.get_last_processed_tick()?)
    }

    pub fn processed_tick_intervals(
        &self,
    ) -> Result<Vec<proto::ProcessedTickIntervalsPerEpoch>, ServiceError> {
        Ok(self.store.get_processed_tick_intervals()?)
    }

    /// Live pass-through to the source node.
    pub async fn identity_info(
        &self,
        identity: &str,
    ) -> Result<archive_model::IdentityInfo, ServiceError> {
        let identity = Identity::parse(identity)
            .map_err(|e| ServiceError::InvalidArgument(e.to_string()))?;
        Ok(self.source.identity_info(&identity).await?)
    }

    pub fn transfer_transactions(
        &self,
        identity: &str,
        start_tick: u32,
        end_tick: u32,
    ) -> Result<Vec<proto::TransferTransactionsPerTick>, ServiceError> {
        Identity::parse(identity).map_err(|e| ServiceError::InvalidArgument(e.to_string()))?;
        if start_tick > end_tick {
            return Err(ServiceError::InvalidArgument(format!(
                "start tick {start_tick} is after end tick {end_tick}"
            )));
        }
        Ok(self
            .store
            .get_transfer_transactions(identity, start_tick, end_tick)?)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn asset_transactions(
        &self,
        identity: &str,
        asset_issuer: &str,
        asset_name: &str,
        end_tick: u32,
        start_index: u32,
        limit: u32,
        include_failed: bool,
    ) -> Result<AssetTransactionsPage, ServiceError> {
        Identity::parse(identity).map_err(|e| ServiceError::InvalidArgument(e.to_string()))?;
        if asset_issuer.is_empty() || asset_name.is_empty() {
            return Err(ServiceError::InvalidArgument(
                "asset issuer and name must not be empty".into(),
            ));
        }
        let asset_id = format!("{asset_issuer}{asset_name}");
        Ok(self.store.get_identity_asset_transactions(
            identity,
            &asset_id,
            end_tick,
            start_index,
            limit,
            include_failed,
        )?)
    }

    pub fn status(&self) -> Result<ArchiveStatus, ServiceError> {
        let last_processed_tick = self.store.get_last_processed_tick()?;
        let last_processed_ticks_per_epoch = self.store.get_last_processed_ticks_per_epoch()?;
        let skipped_ticks = match self.store.get_skipped_ticks() {
            Ok(list) => list.skipped_ticks,
            Err(StoreError::NotFound) => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        let processed_tick_intervals_per_epoch = self.store.get_processed_tick_intervals()?;
        let epochs: Vec<u32> = last_processed_ticks_per_epoch.keys().copied().collect();
        let empty_ticks_per_epoch = self.store.get_empty_ticks_for_epochs(&epochs)?;
        Ok(ArchiveStatus {
            last_processed_tick,
            last_processed_ticks_per_epoch,
            skipped_ticks,
            processed_tick_intervals_per_epoch,
            empty_ticks_per_epoch,
        })
    }
}
