//! TCP client for the source-node protocol.
//!
//! Requests and responses travel in 8-byte-headed packets: a 24-bit
//! little-endian total size, a one-byte message type, and a 4-byte random
//! request tag the node echoes back. A response sequence ends with an
//! `END_RESPONSE` packet. Each call opens a fresh connection; the pipeline
//! retries fetch failures, so there is no session state worth keeping.

use archive_model::bytes::ByteReader;
use archive_model::{
    Computors, Identity, IdentityInfo, NodeSource, QuorumTickVote, SourceError, TickData,
    TickInfo, TickTxStatus, Transaction, TxExecutionStatus, NUMBER_OF_COMPUTORS,
};
use async_trait::async_trait;
use rand::Rng;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

// Message types of the node protocol.
const BROADCAST_COMPUTORS: u8 = 2;
const BROADCAST_TICK: u8 = 3;
const BROADCAST_FUTURE_TICK_DATA: u8 = 8;
const REQUEST_COMPUTORS: u8 = 11;
const REQUEST_QUORUM_TICK: u8 = 14;
const REQUEST_TICK_DATA: u8 = 16;
const BROADCAST_TRANSACTION: u8 = 24;
const REQUEST_CURRENT_TICK_INFO: u8 = 27;
const RESPOND_CURRENT_TICK_INFO: u8 = 28;
const REQUEST_TICK_TRANSACTIONS: u8 = 29;
const REQUEST_ENTITY: u8 = 31;
const RESPOND_ENTITY: u8 = 32;
const END_RESPONSE: u8 = 35;
const REQUEST_TX_STATUS: u8 = 201;
const RESPOND_TX_STATUS: u8 = 202;

const HEADER_LEN: usize = 8;
const MAX_PACKET_LEN: usize = 16 * 1024 * 1024;

/// Vote request flags: one bit per computor, all zero to request every vote.
const VOTE_FLAGS_LEN: usize = (NUMBER_OF_COMPUTORS + 7) / 8;

/// Transaction request flags: one bit per tick slot, all zero for all.
const TX_FLAGS_LEN: usize = 1024 / 8;

pub struct NodeClient {
    host: String,
    port: u16,
    timeout: Duration,
}

impl NodeClient {
    pub fn new(host: impl Into<String>, port: u16) -> NodeClient {
        NodeClient {
            host: host.into(),
            port,
            timeout: Duration::from_secs(5),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> NodeClient {
        self.timeout = timeout;
        self
    }

    /// Send one request and collect the payloads of every `collect` packet
    /// until `END_RESPONSE` (or, with `single`, until the first hit).
    async fn exchange(
        &self,
        request_type: u8,
        payload: &[u8],
        collect: u8,
        single: bool,
    ) -> Result<Vec<Vec<u8>>, SourceError> {
        let addr = format!("{}:{}", self.host, self.port);
        let mut stream = timeout(self.timeout, TcpStream::connect(&addr))
            .await
            .map_err(|_| SourceError::Timeout)??;

        let tag: u32 = rand::thread_rng().gen();
        let request = encode_packet(request_type, tag, payload);
        timeout(self.timeout, stream.write_all(&request))
            .await
            .map_err(|_| SourceError::Timeout)??;

        let mut collected = Vec::new();
        loop {
            let (packet_type, packet) = match self.read_packet(&mut stream).await {
                Ok(p) => p,
                // The node closes the stream instead of ending some
                // responses explicitly.
                Err(SourceError::Io(e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof && !collected.is_empty() =>
                {
                    break;
                }
                Err(e) => return Err(e),
            };
            if packet_type == END_RESPONSE {
                break;
            }
            if packet_type == collect {
                collected.push(packet);
                if single {
                    break;
                }
            }
            // Unrelated broadcast traffic is ignored.
        }
        Ok(collected)
    }

    async fn read_packet(&self, stream: &mut TcpStream) -> Result<(u8, Vec<u8>), SourceError> {
        let mut header = [0u8; HEADER_LEN];
        timeout(self.timeout, stream.read_exact(&mut header))
            .await
            .map_err(|_| SourceError::Timeout)??;
        let size =
            header[0] as usize | (header[1] as usize) << 8 | (header[2] as usize) << 16;
        if !(HEADER_LEN..=MAX_PACKET_LEN).contains(&size) {
            return Err(SourceError::Protocol(format!("bad packet size {size}")));
        }
        let mut payload = vec![0u8; size - HEADER_LEN];
        timeout(self.timeout, stream.read_exact(&mut payload))
            .await
            .map_err(|_| SourceError::Timeout)??;
        Ok((header[3], payload))
    }
}

fn encode_packet(packet_type: u8, tag: u32, payload: &[u8]) -> Vec<u8> {
    let size = HEADER_LEN + payload.len();
    let mut out = Vec::with_capacity(size);
    out.push((size & 0xff) as u8);
    out.push((size >> 8 & 0xff) as u8);
    out.push((size >> 16 & 0xff) as u8);
    out.push(packet_type);
    out.extend_from_slice(&tag.to_le_bytes());
    out.extend_from_slice(payload);
    out
}

#[async_trait]
impl NodeSource for NodeClient {
    async fn tick_info(&self) -> Result<TickInfo, SourceError> {
        let packets = self
            .exchange(REQUEST_CURRENT_TICK_INFO, &[], RESPOND_CURRENT_TICK_INFO, true)
            .await?;
        let payload = packets.first().ok_or(SourceError::NoData)?;
        let mut r = ByteReader::new(payload);
        let info = TickInfo {
            tick_duration: r.u16_le().map_err(protocol)?,
            epoch: r.u16_le().map_err(protocol)?,
            tick: r.u32_le().map_err(protocol)?,
            aligned_votes: r.u16_le().map_err(protocol)?,
            misaligned_votes: r.u16_le().map_err(protocol)?,
            initial_tick: r.u32_le().map_err(protocol)?,
        };
        Ok(info)
    }

    async fn computors(&self) -> Result<Computors, SourceError> {
        let packets = self
            .exchange(REQUEST_COMPUTORS, &[], BROADCAST_COMPUTORS, true)
            .await?;
        let payload = packets.first().ok_or(SourceError::NoData)?;
        Computors::unmarshal(payload).map_err(protocol)
    }

    async fn quorum_votes(&self, tick: u32) -> Result<Vec<QuorumTickVote>, SourceError> {
        let mut request = Vec::with_capacity(4 + VOTE_FLAGS_LEN);
        request.extend_from_slice(&tick.to_le_bytes());
        request.extend_from_slice(&[0u8; VOTE_FLAGS_LEN]);
        let packets = self
            .exchange(REQUEST_QUORUM_TICK, &request, BROADCAST_TICK, false)
            .await?;
        let mut votes = Vec::with_capacity(packets.len());
        for payload in &packets {
            votes.push(QuorumTickVote::unmarshal(payload).map_err(protocol)?);
        }
        Ok(votes)
    }

    async fn tick_data(&self, tick: u32) -> Result<TickData, SourceError> {
        let packets = self
            .exchange(
                REQUEST_TICK_DATA,
                &tick.to_le_bytes(),
                BROADCAST_FUTURE_TICK_DATA,
                true,
            )
            .await?;
        let payload = packets.first().ok_or(SourceError::NoData)?;
        TickData::unmarshal(payload).map_err(protocol)
    }

    async fn tick_transactions(&self, tick: u32) -> Result<Vec<Transaction>, SourceError> {
        let mut request = Vec::with_capacity(4 + TX_FLAGS_LEN);
        request.extend_from_slice(&tick.to_le_bytes());
        request.extend_from_slice(&[0u8; TX_FLAGS_LEN]);
        let packets = self
            .exchange(REQUEST_TICK_TRANSACTIONS, &request, BROADCAST_TRANSACTION, false)
            .await?;
        let mut txs = Vec::with_capacity(packets.len());
        for payload in &packets {
            txs.push(Transaction::unmarshal(payload).map_err(protocol)?);
        }
        Ok(txs)
    }

    async fn tick_transactions_status(&self, tick: u32) -> Result<TickTxStatus, SourceError> {
        let packets = self
            .exchange(REQUEST_TX_STATUS, &tick.to_le_bytes(), RESPOND_TX_STATUS, true)
            .await?;
        let payload = packets.first().ok_or(SourceError::NoData)?;
        let mut r = ByteReader::new(payload);
        let current_tick_of_node = r.u32_le().map_err(protocol)?;
        let status_tick = r.u32_le().map_err(protocol)?;
        let tx_count = r.u32_le().map_err(protocol)? as usize;
        let flags: [u8; TX_FLAGS_LEN] = r.array().map_err(protocol)?;
        let mut statuses = Vec::with_capacity(tx_count);
        for index in 0..tx_count {
            let digest: [u8; 32] = r.array().map_err(protocol)?;
            statuses.push(TxExecutionStatus {
                tx_id: Identity::from_pubkey(&digest, true),
                money_flew: flags[index / 8] & 1 << (index % 8) != 0,
            });
        }
        Ok(TickTxStatus {
            current_tick_of_node,
            tick: status_tick,
            statuses,
        })
    }

    async fn identity_info(&self, identity: &Identity) -> Result<IdentityInfo, SourceError> {
        let pubkey = identity
            .to_pubkey()
            .map_err(|e| SourceError::Protocol(e.to_string()))?;
        let packets = self
            .exchange(REQUEST_ENTITY, pubkey.as_bytes(), RESPOND_ENTITY, true)
            .await?;
        let payload = packets.first().ok_or(SourceError::NoData)?;
        let mut r = ByteReader::new(payload);
        let _public_key: [u8; 32] = r.array().map_err(protocol)?;
        let incoming_amount = r.i64_le().map_err(protocol)?;
        let outgoing_amount = r.i64_le().map_err(protocol)?;
        let number_of_incoming_transfers = r.u32_le().map_err(protocol)?;
        let number_of_outgoing_transfers = r.u32_le().map_err(protocol)?;
        let latest_incoming_transfer_tick = r.u32_le().map_err(protocol)?;
        let latest_outgoing_transfer_tick = r.u32_le().map_err(protocol)?;
        let tick = r.u32_le().map_err(protocol)?;
        Ok(IdentityInfo {
            identity: identity.clone(),
            incoming_amount,
            outgoing_amount,
            number_of_incoming_transfers,
            number_of_outgoing_transfers,
            latest_incoming_transfer_tick,
            latest_outgoing_transfer_tick,
            tick,
        })
    }
}

fn protocol(e: impl std::fmt::Display) -> SourceError {
    SourceError::Protocol(e.to_string())
}
