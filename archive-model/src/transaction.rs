//! Ledger transactions as returned by a source node.

use crate::bytes::{ByteReader, WireError};
use crate::crypto::k12;
use crate::identity::Identity;
use crate::types::{Digest, PubKey, Signature};

/// Fixed part of the wire layout before the variable-length input.
const HEADER_LEN: usize = 32 + 32 + 8 + 4 + 2 + 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub source_public_key: PubKey,
    pub destination_public_key: PubKey,
    pub amount: i64,
    pub tick: u32,
    pub input_type: u16,
    pub input_size: u16,
    pub input: Vec<u8>,
    pub signature: Signature,
}

impl Transaction {
    /// Deterministic wire form: header, input, trailing signature.
    pub fn marshal(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + self.input.len() + Signature::LEN);
        out.extend_from_slice(&self.source_public_key.0);
        out.extend_from_slice(&self.destination_public_key.0);
        out.extend_from_slice(&self.amount.to_le_bytes());
        out.extend_from_slice(&self.tick.to_le_bytes());
        out.extend_from_slice(&self.input_type.to_le_bytes());
        out.extend_from_slice(&self.input_size.to_le_bytes());
        out.extend_from_slice(&self.input);
        out.extend_from_slice(&self.signature.0);
        out
    }

    pub fn unmarshal(data: &[u8]) -> Result<Transaction, WireError> {
        let mut r = ByteReader::new(data);
        let source_public_key = PubKey(r.array()?);
        let destination_public_key = PubKey(r.array()?);
        let amount = r.i64_le()?;
        let tick = r.u32_le()?;
        let input_type = r.u16_le()?;
        let input_size = r.u16_le()?;
        let input = r.take(input_size as usize)?.to_vec();
        let signature = Signature(r.array()?);
        r.finish()?;
        Ok(Transaction {
            source_public_key,
            destination_public_key,
            amount,
            tick,
            input_type,
            input_size,
            input,
            signature,
        })
    }

    /// K12 of the full wire form; the transaction id is its text encoding.
    pub fn digest(&self) -> Digest {
        k12(&self.marshal())
    }

    /// K12 of the wire form minus the trailing signature. This is the digest
    /// listed in the tick body and the message the source key signed.
    pub fn unsigned_digest(&self) -> Digest {
        let bytes = self.marshal();
        k12(&bytes[..bytes.len() - Signature::LEN])
    }

    /// The 60-character lowercase transaction id.
    pub fn id(&self) -> Identity {
        Identity::from_pubkey(self.digest().as_bytes(), true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Transaction {
        Transaction {
            source_public_key: PubKey([1; 32]),
            destination_public_key: PubKey([2; 32]),
            amount: 100,
            tick: 7_000_000,
            input_type: 0,
            input_size: 3,
            input: vec![9, 9, 9],
            signature: Signature([5; 64]),
        }
    }

    #[test]
    fn wire_round_trip() {
        let tx = sample();
        assert_eq!(Transaction::unmarshal(&tx.marshal()).unwrap(), tx);
    }

    #[test]
    fn rejects_trailing_garbage() {
        let mut bytes = sample().marshal();
        bytes.push(0);
        assert!(matches!(
            Transaction::unmarshal(&bytes),
            Err(WireError::Trailing(1))
        ));
    }

    #[test]
    fn unsigned_digest_ignores_signature() {
        let mut tx = sample();
        let before = tx.unsigned_digest();
        tx.signature = Signature([7; 64]);
        assert_eq!(tx.unsigned_digest(), before);
        assert_ne!(tx.digest(), before);
    }

    #[test]
    fn id_is_lowercase_text() {
        let id = sample().id();
        assert!(id.as_str().chars().all(|c| c.is_ascii_lowercase()));
        assert_eq!(id.as_str().len(), 60);
    }
}
