//! Quorum votes: one signed attestation per computor per tick.

use crate::bytes::{ByteReader, WireError};
use crate::crypto::k12;
use crate::tick::timestamp_millis;
use crate::types::{Digest, Signature};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuorumTickVote {
    pub computor_index: u16,
    pub epoch: u16,
    pub tick: u32,
    pub millisecond: u16,
    pub second: u8,
    pub minute: u8,
    pub hour: u8,
    pub day: u8,
    pub month: u8,
    pub year: u8,
    pub prev_resource_testing_digest: u64,
    pub salted_resource_testing_digest: u64,
    pub timelock: Digest,
    pub prev_spectrum_digest: Digest,
    pub prev_universe_digest: Digest,
    pub prev_computer_digest: Digest,
    pub salted_spectrum_digest: Digest,
    pub salted_universe_digest: Digest,
    pub salted_computer_digest: Digest,
    pub tx_digest: Digest,
    pub expected_next_tick_tx_digest: Digest,
    pub signature: Signature,
}

/// The digest tuple votes are grouped by: a tick is final once ⅔+1 of the
/// computors produced byte-identical values for every field here.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VoteDigests {
    pub tx_digest: Digest,
    pub prev_resource_testing_digest: u64,
    pub prev_spectrum_digest: Digest,
    pub prev_universe_digest: Digest,
    pub prev_computer_digest: Digest,
    pub timelock: Digest,
    pub expected_next_tick_tx_digest: Digest,
    pub salted_resource_testing_digest: u64,
    pub salted_spectrum_digest: Digest,
    pub salted_universe_digest: Digest,
    pub salted_computer_digest: Digest,
}

impl QuorumTickVote {
    pub fn marshal(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(16 + 16 + 9 * Digest::LEN + Signature::LEN);
        out.extend_from_slice(&self.computor_index.to_le_bytes());
        out.extend_from_slice(&self.epoch.to_le_bytes());
        out.extend_from_slice(&self.tick.to_le_bytes());
        out.extend_from_slice(&self.millisecond.to_le_bytes());
        out.push(self.second);
        out.push(self.minute);
        out.push(self.hour);
        out.push(self.day);
        out.push(self.month);
        out.push(self.year);
        out.extend_from_slice(&self.prev_resource_testing_digest.to_le_bytes());
        out.extend_from_slice(&self.salted_resource_testing_digest.to_le_bytes());
        out.extend_from_slice(&self.timelock.0);
        out.extend_from_slice(&self.prev_spectrum_digest.0);
        out.extend_from_slice(&self.prev_universe_digest.0);
        out.extend_from_slice(&self.prev_computer_digest.0);
        out.extend_from_slice(&self.salted_spectrum_digest.0);
        out.extend_from_slice(&self.salted_universe_digest.0);
        out.extend_from_slice(&self.salted_computer_digest.0);
        out.extend_from_slice(&self.tx_digest.0);
        out.extend_from_slice(&self.expected_next_tick_tx_digest.0);
        out.extend_from_slice(&self.signature.0);
        out
    }

    pub fn unmarshal(data: &[u8]) -> Result<QuorumTickVote, WireError> {
        let mut r = ByteReader::new(data);
        let vote = QuorumTickVote {
            computor_index: r.u16_le()?,
            epoch: r.u16_le()?,
            tick: r.u32_le()?,
            millisecond: r.u16_le()?,
            second: r.u8()?,
            minute: r.u8()?,
            hour: r.u8()?,
            day: r.u8()?,
            month: r.u8()?,
            year: r.u8()?,
            prev_resource_testing_digest: r.u64_le()?,
            salted_resource_testing_digest: r.u64_le()?,
            timelock: Digest(r.array()?),
            prev_spectrum_digest: Digest(r.array()?),
            prev_universe_digest: Digest(r.array()?),
            prev_computer_digest: Digest(r.array()?),
            salted_spectrum_digest: Digest(r.array()?),
            salted_universe_digest: Digest(r.array()?),
            salted_computer_digest: Digest(r.array()?),
            tx_digest: Digest(r.array()?),
            expected_next_tick_tx_digest: Digest(r.array()?),
            signature: Signature(r.array()?),
        };
        r.finish()?;
        Ok(vote)
    }

    /// K12 of the vote minus the trailing signature; the message the
    /// computor signed.
    pub fn unsigned_digest(&self) -> Digest {
        let bytes = self.marshal();
        k12(&bytes[..bytes.len() - Signature::LEN])
    }

    pub fn digests(&self) -> VoteDigests {
        VoteDigests {
            tx_digest: self.tx_digest,
            prev_resource_testing_digest: self.prev_resource_testing_digest,
            prev_spectrum_digest: self.prev_spectrum_digest,
            prev_universe_digest: self.prev_universe_digest,
            prev_computer_digest: self.prev_computer_digest,
            timelock: self.timelock,
            expected_next_tick_tx_digest: self.expected_next_tick_tx_digest,
            salted_resource_testing_digest: self.salted_resource_testing_digest,
            salted_spectrum_digest: self.salted_spectrum_digest,
            salted_universe_digest: self.salted_universe_digest,
            salted_computer_digest: self.salted_computer_digest,
        }
    }

    pub fn timestamp_ms(&self) -> u64 {
        timestamp_millis(
            self.year,
            self.month,
            self.day,
            self.hour,
            self.minute,
            self.second,
            self.millisecond,
        )
    }
}

impl Default for QuorumTickVote {
    fn default() -> Self {
        QuorumTickVote {
            computor_index: 0,
            epoch: 0,
            tick: 0,
            millisecond: 0,
            second: 0,
            minute: 0,
            hour: 0,
            day: 1,
            month: 1,
            year: 22,
            prev_resource_testing_digest: 0,
            salted_resource_testing_digest: 0,
            timelock: Digest::ZERO,
            prev_spectrum_digest: Digest::ZERO,
            prev_universe_digest: Digest::ZERO,
            prev_computer_digest: Digest::ZERO,
            salted_spectrum_digest: Digest::ZERO,
            salted_universe_digest: Digest::ZERO,
            salted_computer_digest: Digest::ZERO,
            tx_digest: Digest::ZERO,
            expected_next_tick_tx_digest: Digest::ZERO,
            signature: Signature::ZERO,
        }
    }
}
