//! The computor list: the signer set in force for one epoch.

use crate::bytes::{ByteReader, WireError};
use crate::crypto::k12;
use crate::types::{Digest, PubKey, Signature};
use crate::NUMBER_OF_COMPUTORS;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Computors {
    pub epoch: u16,
    /// Exactly `NUMBER_OF_COMPUTORS` keys, in slot order.
    pub public_keys: Vec<PubKey>,
    /// Arbitrator signature over the concatenated keys.
    pub signature: Signature,
}

impl Computors {
    pub fn marshal(&self) -> Vec<u8> {
        let mut out =
            Vec::with_capacity(2 + NUMBER_OF_COMPUTORS * PubKey::LEN + Signature::LEN);
        out.extend_from_slice(&self.epoch.to_le_bytes());
        for key in &self.public_keys {
            out.extend_from_slice(&key.0);
        }
        out.extend_from_slice(&self.signature.0);
        out
    }

    pub fn unmarshal(data: &[u8]) -> Result<Computors, WireError> {
        let mut r = ByteReader::new(data);
        let epoch = r.u16_le()?;
        let mut public_keys = Vec::with_capacity(NUMBER_OF_COMPUTORS);
        for _ in 0..NUMBER_OF_COMPUTORS {
            public_keys.push(PubKey(r.array()?));
        }
        let signature = Signature(r.array()?);
        r.finish()?;
        Ok(Computors {
            epoch,
            public_keys,
            signature,
        })
    }

    /// K12 over the concatenated public keys; the message the arbitrator
    /// signed.
    pub fn keys_digest(&self) -> Digest {
        let mut bytes = Vec::with_capacity(NUMBER_OF_COMPUTORS * PubKey::LEN);
        for key in &self.public_keys {
            bytes.extend_from_slice(&key.0);
        }
        k12(&bytes)
    }

    pub fn key_at(&self, slot: usize) -> Option<&PubKey> {
        self.public_keys.get(slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Computors {
        let public_keys = (0..NUMBER_OF_COMPUTORS)
            .map(|i| {
                let mut key = [0u8; 32];
                key[0] = (i & 0xff) as u8;
                key[1] = (i >> 8) as u8;
                PubKey(key)
            })
            .collect();
        Computors {
            epoch: 130,
            public_keys,
            signature: Signature([3; 64]),
        }
    }

    #[test]
    fn wire_round_trip() {
        let comps = sample();
        assert_eq!(Computors::unmarshal(&comps.marshal()).unwrap(), comps);
    }

    #[test]
    fn keys_digest_covers_keys_only() {
        let mut comps = sample();
        let before = comps.keys_digest();
        comps.signature = Signature([9; 64]);
        comps.epoch = 131;
        assert_eq!(comps.keys_digest(), before);
        comps.public_keys[0] = PubKey([0xff; 32]);
        assert_ne!(comps.keys_digest(), before);
    }

    #[test]
    fn key_at_bounds() {
        let comps = sample();
        assert!(comps.key_at(NUMBER_OF_COMPUTORS - 1).is_some());
        assert!(comps.key_at(NUMBER_OF_COMPUTORS).is_none());
    }
}
