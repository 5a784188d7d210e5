//! Tick bodies: the ordered transaction digest list for a finalized round.

use crate::bytes::{ByteReader, WireError};
use crate::crypto::k12;
use crate::types::{Digest, Signature};
use crate::MAX_TRANSACTIONS_PER_TICK;
use chrono::{TimeZone, Utc};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickData {
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
    pub timelock: [u8; 32],
    /// Always `MAX_TRANSACTIONS_PER_TICK` wide on the wire; all-zero entries
    /// denote empty slots.
    pub transaction_digests: Vec<Digest>,
    pub contract_fees: Vec<i64>,
    pub signature: Signature,
}

impl TickData {
    /// Build a body from a short digest list, padding the fixed-width arrays.
    pub fn with_digests(
        epoch: u16,
        tick: u32,
        computor_index: u16,
        digests: Vec<Digest>,
    ) -> TickData {
        let mut transaction_digests = digests;
        transaction_digests.resize(MAX_TRANSACTIONS_PER_TICK, Digest::ZERO);
        TickData {
            computor_index,
            epoch,
            tick,
            millisecond: 0,
            second: 0,
            minute: 0,
            hour: 0,
            day: 1,
            month: 1,
            year: 22,
            timelock: [0; 32],
            transaction_digests,
            contract_fees: vec![0; MAX_TRANSACTIONS_PER_TICK],
            signature: Signature::ZERO,
        }
    }

    pub fn marshal(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(
            16 + 32 + MAX_TRANSACTIONS_PER_TICK * (Digest::LEN + 8) + Signature::LEN,
        );
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
        out.extend_from_slice(&self.timelock);
        for digest in &self.transaction_digests {
            out.extend_from_slice(&digest.0);
        }
        for fee in &self.contract_fees {
            out.extend_from_slice(&fee.to_le_bytes());
        }
        out.extend_from_slice(&self.signature.0);
        out
    }

    pub fn unmarshal(data: &[u8]) -> Result<TickData, WireError> {
        let mut r = ByteReader::new(data);
        let computor_index = r.u16_le()?;
        let epoch = r.u16_le()?;
        let tick = r.u32_le()?;
        let millisecond = r.u16_le()?;
        let second = r.u8()?;
        let minute = r.u8()?;
        let hour = r.u8()?;
        let day = r.u8()?;
        let month = r.u8()?;
        let year = r.u8()?;
        let timelock = r.array()?;
        let mut transaction_digests = Vec::with_capacity(MAX_TRANSACTIONS_PER_TICK);
        for _ in 0..MAX_TRANSACTIONS_PER_TICK {
            transaction_digests.push(Digest(r.array()?));
        }
        let mut contract_fees = Vec::with_capacity(MAX_TRANSACTIONS_PER_TICK);
        for _ in 0..MAX_TRANSACTIONS_PER_TICK {
            contract_fees.push(r.i64_le()?);
        }
        let signature = Signature(r.array()?);
        r.finish()?;
        Ok(TickData {
            computor_index,
            epoch,
            tick,
            millisecond,
            second,
            minute,
            hour,
            day,
            month,
            year,
            timelock,
            transaction_digests,
            contract_fees,
            signature,
        })
    }

    /// K12 of the body minus the trailing signature. Must equal the tick
    /// digest the quorum agreed on.
    pub fn unsigned_digest(&self) -> Digest {
        let bytes = self.marshal();
        k12(&bytes[..bytes.len() - Signature::LEN])
    }

    /// The listed digests with empty slots removed, in slot order.
    pub fn non_zero_digests(&self) -> Vec<Digest> {
        self.transaction_digests
            .iter()
            .filter(|d| !d.is_zero())
            .copied()
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.transaction_digests.iter().all(|d| d.is_zero())
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

/// Unix milliseconds from the ledger's packed date fields (years since 2000).
/// Out-of-range dates collapse to zero rather than failing the record.
pub fn timestamp_millis(
    year: u8,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
    second: u8,
    millisecond: u16,
) -> u64 {
    match Utc
        .with_ymd_and_hms(
            2000 + year as i32,
            month as u32,
            day as u32,
            hour as u32,
            minute as u32,
            second as u32,
        )
        .single()
    {
        Some(t) => t.timestamp_millis() as u64 + millisecond as u64,
        None => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_round_trip() {
        let mut td = TickData::with_digests(130, 15_000_000, 42, vec![Digest([3; 32])]);
        td.millisecond = 500;
        td.second = 30;
        td.hour = 12;
        td.day = 15;
        td.month = 6;
        td.year = 24;
        assert_eq!(TickData::unmarshal(&td.marshal()).unwrap(), td);
    }

    #[test]
    fn non_zero_digests_keep_slot_order() {
        let a = Digest([1; 32]);
        let b = Digest([2; 32]);
        let mut td = TickData::with_digests(1, 1, 0, vec![a]);
        td.transaction_digests[5] = b;
        assert_eq!(td.non_zero_digests(), vec![a, b]);
        assert!(!td.is_empty());
        assert!(TickData::with_digests(1, 1, 0, vec![]).is_empty());
    }

    #[test]
    fn unsigned_digest_excludes_signature() {
        let mut td = TickData::with_digests(1, 2, 0, vec![]);
        let before = td.unsigned_digest();
        td.signature = Signature([9; 64]);
        assert_eq!(td.unsigned_digest(), before);
    }

    #[test]
    fn timestamp_from_date_fields() {
        // 2022-01-01 00:00:00.000 UTC
        assert_eq!(timestamp_millis(22, 1, 1, 0, 0, 0, 0), 1_640_995_200_000);
        // Garbage dates degrade to zero instead of panicking.
        assert_eq!(timestamp_millis(22, 13, 1, 0, 0, 0, 0), 0);
    }
}
