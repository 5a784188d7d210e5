//! The source-node seam.
//!
//! The archive consumes a node through this trait only; the TCP client lives
//! in its own crate and tests substitute in-memory sources.

use crate::computors::Computors;
use crate::identity::Identity;
use crate::quorum::QuorumTickVote;
use crate::tick::TickData;
use crate::transaction::Transaction;
use async_trait::async_trait;
use thiserror::Error;

/// Where the network currently stands, as reported by the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickInfo {
    pub tick_duration: u16,
    pub epoch: u16,
    pub tick: u32,
    pub aligned_votes: u16,
    pub misaligned_votes: u16,
    /// First tick of the current epoch.
    pub initial_tick: u32,
}

/// Live balance record for one identity; passed through by the query façade,
/// never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityInfo {
    pub identity: Identity,
    pub incoming_amount: i64,
    pub outgoing_amount: i64,
    pub number_of_incoming_transfers: u32,
    pub number_of_outgoing_transfers: u32,
    pub latest_incoming_transfer_tick: u32,
    pub latest_outgoing_transfer_tick: u32,
    /// Tick the record was read at.
    pub tick: u32,
}

impl IdentityInfo {
    pub fn balance(&self) -> i64 {
        self.incoming_amount - self.outgoing_amount
    }
}

/// Execution outcome of a single transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxExecutionStatus {
    pub tx_id: Identity,
    pub money_flew: bool,
}

/// Execution outcomes for every transaction of one tick.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TickTxStatus {
    pub current_tick_of_node: u32,
    pub tick: u32,
    pub statuses: Vec<TxExecutionStatus>,
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("i/o error talking to the source node: {0}")]
    Io(#[from] std::io::Error),

    #[error("source node timed out")]
    Timeout,

    #[error("malformed response from source node: {0}")]
    Protocol(String),

    #[error("source node returned no data")]
    NoData,
}

/// The node protocol the archive consumes. Every call is a suspension point
/// and may fail transiently; fetch failures are retried by the pipeline and
/// never produce skipped-tick records.
#[async_trait]
pub trait NodeSource: Send + Sync {
    async fn tick_info(&self) -> Result<TickInfo, SourceError>;

    /// The computor list for the node's current epoch.
    async fn computors(&self) -> Result<Computors, SourceError>;

    async fn quorum_votes(&self, tick: u32) -> Result<Vec<QuorumTickVote>, SourceError>;

    async fn tick_data(&self, tick: u32) -> Result<TickData, SourceError>;

    async fn tick_transactions(&self, tick: u32) -> Result<Vec<Transaction>, SourceError>;

    async fn tick_transactions_status(&self, tick: u32) -> Result<TickTxStatus, SourceError>;

    async fn identity_info(&self, identity: &Identity) -> Result<IdentityInfo, SourceError>;
}
