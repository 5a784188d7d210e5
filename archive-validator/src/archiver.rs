//! The archiver loop: one cooperative task, one tick at a time.

use crate::error::ValidationError;
use crate::indexer::{self, IndexError, ValidatedTick};
use crate::{computors, quorum, status, tick, tx};
use archive_model::{Computors, NodeSource, SignatureVerifier, SourceError};
use archive_proto::convert;
use archive_store::{ArchiveStore, StoreError};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;

#[derive(Debug, Error)]
pub enum ProcessError {
    /// Transient; the tick is retried and no skipped-tick record is written.
    #[error("fetch failed: {0}")]
    Fetch(#[from] SourceError),

    /// The tick is skipped and recorded; the last-processed-tick stands.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Fatal; the process exits so that supervision restarts it.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Fatal; indexing is all-or-nothing.
    #[error(transparent)]
    Index(#[from] IndexError),
}

pub struct Archiver {
    store: Arc<ArchiveStore>,
    source: Arc<dyn NodeSource>,
    verifier: Arc<dyn SignatureVerifier>,
    /// Computor list cache for the epoch currently being processed.
    computors: Option<(u32, Computors)>,
    /// Next tick to attempt, carried across validation skips.
    cursor: Option<u32>,
    poll_interval: Duration,
    stage_timeout: Duration,
}

impl Archiver {
    pub fn new(
        store: Arc<ArchiveStore>,
        source: Arc<dyn NodeSource>,
        verifier: Arc<dyn SignatureVerifier>,
    ) -> Archiver {
        Archiver {
            store,
            source,
            verifier,
            computors: None,
            cursor: None,
            poll_interval: Duration::from_secs(1),
            stage_timeout: Duration::from_secs(5),
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Archiver {
        self.poll_interval = interval;
        self
    }

    pub fn with_stage_timeout(mut self, stage_timeout: Duration) -> Archiver {
        self.stage_timeout = stage_timeout;
        self
    }

    /// Run until a fatal store failure. Fetch errors back off and retry;
    /// validation errors record the skipped tick and move on.
    pub async fn run(&mut self) -> Result<(), ProcessError> {
        loop {
            let info = match self.deadline(self.source.tick_info()).await {
                Ok(info) => info,
                Err(e) => {
                    tracing::warn!(error = %e, "tick info fetch failed");
                    tokio::time::sleep(self.poll_interval).await;
                    continue;
                }
            };

            let mut next = self.next_tick()?.unwrap_or(info.initial_tick);

            // The stream jumped (new epoch): everything in between was never
            // produced and is recorded as one skipped run.
            if next < info.initial_tick {
                self.store
                    .append_skipped_ticks_interval(next, info.initial_tick - 1)?;
                tracing::info!(
                    from = next,
                    to = info.initial_tick - 1,
                    "ticks skipped by the network"
                );
                next = info.initial_tick;
                self.cursor = Some(next);
            }

            if next >= info.tick {
                // Caught up; wait for the network to move.
                tokio::time::sleep(self.poll_interval).await;
                continue;
            }

            match self.process_tick(next).await {
                Ok(()) => {
                    self.cursor = Some(next + 1);
                }
                Err(ProcessError::Fetch(e)) => {
                    tracing::warn!(tick = next, error = %e, "fetch failed, will retry");
                    tokio::time::sleep(self.poll_interval).await;
                }
                Err(ProcessError::Validation(e)) => {
                    tracing::warn!(tick = next, error = %e, "validation failed, skipping tick");
                    self.store.append_skipped_ticks_interval(next, next)?;
                    self.cursor = Some(next + 1);
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Validate and index a single tick.
    pub async fn process_tick(&mut self, tick_number: u32) -> Result<(), ProcessError> {
        // Replays are no-ops: an indexed tick is already durable and all
        // writes are deterministic functions of its inputs.
        match self.store.get_tick_data(tick_number) {
            Ok(_) => {
                tracing::debug!(tick = tick_number, "already indexed");
                return Ok(());
            }
            Err(StoreError::NotFound) => {}
            Err(e) => return Err(e.into()),
        }

        let votes = self.deadline(self.source.quorum_votes(tick_number)).await?;
        if votes.is_empty() {
            return Err(SourceError::NoData.into());
        }
        let epoch = votes[0].epoch as u32;

        let comps = self.computors_for_epoch(epoch).await?;
        let vote = quorum::validate(&*self.verifier, &votes, &comps).await?;

        if vote.tx_digest.is_zero() {
            // The quorum fixed an empty transaction set; there is no body to
            // fetch and nothing further to verify.
            let validated = ValidatedTick::empty(epoch, tick_number, vote.timestamp_ms());
            indexer::index_tick(&self.store, &validated)?;
            tracing::info!(tick = tick_number, epoch, "empty tick indexed");
            return Ok(());
        }

        // Fetch fan-out: the three stages join before validation and the
        // first failure cancels its siblings.
        let source = Arc::clone(&self.source);
        let stage = self.stage_timeout;
        let (tick_data, transactions, tick_status) = tokio::try_join!(
            with_deadline(stage, source.tick_data(tick_number)),
            with_deadline(stage, source.tick_transactions(tick_number)),
            with_deadline(stage, source.tick_transactions_status(tick_number)),
        )?;

        tick::validate(&*self.verifier, &tick_data, &vote, &comps).await?;
        let valid = tx::validate(&*self.verifier, transactions, &tick_data).await?;
        let valid = tx::in_body_order(valid, &tick_data);
        status::validate(&tick_status, &valid)?;

        let validated = ValidatedTick {
            epoch,
            tick: tick_number,
            timestamp_ms: tick_data.timestamp_ms(),
            tick_digest: vote.tx_digest,
            tick_data: Some(tick_data),
            transactions: valid,
            statuses: tick_status,
        };
        indexer::index_tick(&self.store, &validated)?;
        tracing::info!(
            tick = tick_number,
            epoch,
            transactions = validated.transactions.len(),
            "tick indexed"
        );
        Ok(())
    }

    /// The tick after the furthest point reached so far, be that an indexed
    /// tick or a skipped one.
    fn next_tick(&self) -> Result<Option<u32>, ProcessError> {
        let last = match self.store.get_last_processed_tick() {
            Ok(last) => Some(last.tick_number + 1),
            Err(StoreError::NotFound) => None,
            Err(e) => return Err(e.into()),
        };
        Ok(match (last, self.cursor) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        })
    }

    async fn computors_for_epoch(&mut self, epoch: u32) -> Result<Computors, ProcessError> {
        if let Some((cached_epoch, comps)) = &self.computors {
            if *cached_epoch == epoch {
                return Ok(comps.clone());
            }
        }

        match self.store.get_computors(epoch) {
            Ok(record) => {
                let comps = convert::record_to_computors(&record)
                    .map_err(|e| StoreError::Corrupt(e.to_string()))?;
                self.computors = Some((epoch, comps.clone()));
                return Ok(comps);
            }
            Err(StoreError::NotFound) => {}
            Err(e) => return Err(e.into()),
        }

        // First sighting of the epoch: fetch, verify against the arbitrator,
        // persist for every later tick of the epoch.
        let comps = self.deadline(self.source.computors()).await?;
        if comps.epoch as u32 != epoch {
            return Err(SourceError::Protocol(format!(
                "node is at epoch {}, needed {epoch}",
                comps.epoch
            ))
            .into());
        }
        computors::validate(&*self.verifier, &comps).await?;
        let mut batch = self.store.batch();
        batch.set_computors(epoch, &convert::computors_to_record(&comps));
        self.store.commit(batch, true)?;
        tracing::info!(epoch, "computor list verified and stored");
        self.computors = Some((epoch, comps.clone()));
        Ok(comps)
    }

    async fn deadline<T>(
        &self,
        fut: impl Future<Output = Result<T, SourceError>>,
    ) -> Result<T, SourceError> {
        with_deadline(self.stage_timeout, fut).await
    }
}

async fn with_deadline<T>(
    limit: Duration,
    fut: impl Future<Output = Result<T, SourceError>>,
) -> Result<T, SourceError> {
    timeout(limit, fut).await.map_err(|_| SourceError::Timeout)?
}
