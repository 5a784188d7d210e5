//! The 60-character canonical textual encoding of a 32-byte public key.
//!
//! Four little-endian quadwords of the key are spelled out as fourteen
//! base-26 letters each, followed by four checksum letters derived from the
//! K12 hash of the key. Account identities use the uppercase alphabet,
//! transaction ids the lowercase one.

use crate::crypto::k12;
use crate::types::PubKey;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Length of the textual form.
pub const IDENTITY_LEN: usize = 60;

const CHECKSUM_MASK: u32 = 0x3ffff;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("identity must be {IDENTITY_LEN} characters, got {0}")]
    Length(usize),

    #[error("identity contains a character outside its alphabet")]
    Alphabet,
}

/// A validated identity string.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identity(String);

impl Identity {
    /// Encode a public key (or a transaction digest) into its textual form.
    pub fn from_pubkey(key: &[u8; 32], lowercase: bool) -> Identity {
        let base = if lowercase { b'a' } else { b'A' };
        let mut out = [0u8; IDENTITY_LEN];
        for (i, chunk) in key.chunks_exact(8).enumerate() {
            let mut fragment = u64::from_le_bytes([
                chunk[0], chunk[1], chunk[2], chunk[3], chunk[4], chunk[5], chunk[6], chunk[7],
            ]);
            for slot in out[i * 14..(i + 1) * 14].iter_mut() {
                *slot = base + (fragment % 26) as u8;
                fragment /= 26;
            }
        }

        let digest = k12(key);
        let mut checksum =
            u32::from_le_bytes([digest.0[0], digest.0[1], digest.0[2], 0]) & CHECKSUM_MASK;
        for slot in out[56..].iter_mut() {
            *slot = base + (checksum % 26) as u8;
            checksum /= 26;
        }

        Identity(out.iter().map(|b| *b as char).collect())
    }

    /// Validate an arbitrary string as an identity.
    pub fn parse(s: &str) -> Result<Identity, IdentityError> {
        let bytes = s.as_bytes();
        if bytes.len() != IDENTITY_LEN {
            return Err(IdentityError::Length(bytes.len()));
        }
        let base = match bytes[0] {
            b'a'..=b'z' => b'a',
            b'A'..=b'Z' => b'A',
            _ => return Err(IdentityError::Alphabet),
        };
        if !bytes.iter().all(|b| (base..base + 26).contains(b)) {
            return Err(IdentityError::Alphabet);
        }
        Ok(Identity(s.to_owned()))
    }

    /// Decode the textual form back into the 32-byte public key.
    ///
    /// The checksum letters are not re-verified; they are display material
    /// and carry no key bits.
    pub fn to_pubkey(&self) -> Result<PubKey, IdentityError> {
        let bytes = self.0.as_bytes();
        let base = match bytes[0] {
            b'a'..=b'z' => b'a',
            _ => b'A',
        };
        let mut key = [0u8; 32];
        for i in 0..4 {
            let mut fragment = 0u64;
            for j in (0..14).rev() {
                let b = bytes[i * 14 + j];
                if !(base..base + 26).contains(&b) {
                    return Err(IdentityError::Alphabet);
                }
                fragment = fragment * 26 + (b - base) as u64;
            }
            key[i * 8..(i + 1) * 8].copy_from_slice(&fragment.to_le_bytes());
        }
        Ok(PubKey(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Identity {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Identity::parse(s)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity({})", self.0)
    }
}

impl From<Identity> for String {
    fn from(id: Identity) -> String {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Issuer of the CFB asset; pubkey taken from a mainnet exchange payload.
    const CFB_ISSUER: &str = "CFBMEMZOIDEXQAUXYYSZIURADQLAPWPMNJXQSNVQZAHYVOPYUKKJBJUCTVJL";
    const CFB_ISSUER_KEY: &str =
        "0830bb63bf7d5e164ac8cbd38680630ff7670a1ebf39f7210b40bcdca253d05f";

    #[test]
    fn decodes_known_identity() {
        let id = Identity::parse(CFB_ISSUER).unwrap();
        assert_eq!(id.to_pubkey().unwrap().to_hex(), CFB_ISSUER_KEY);
    }

    #[test]
    fn encodes_known_identity() {
        let key = PubKey::from_hex(CFB_ISSUER_KEY).unwrap();
        assert_eq!(Identity::from_pubkey(key.as_bytes(), false).as_str(), CFB_ISSUER);
    }

    #[test]
    fn round_trips_arbitrary_keys() {
        let mut key = [0u8; 32];
        for (i, b) in key.iter_mut().enumerate() {
            *b = (i * 7 + 3) as u8;
        }
        let id = Identity::from_pubkey(&key, false);
        assert_eq!(id.to_pubkey().unwrap().0, key);

        let lower = Identity::from_pubkey(&key, true);
        assert!(lower.as_str().chars().all(|c| c.is_ascii_lowercase()));
        assert_eq!(lower.to_pubkey().unwrap().0, key);
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(
            Identity::parse("SHORT").unwrap_err(),
            IdentityError::Length(5)
        );
        let mixed = format!("a{}", &CFB_ISSUER[1..]);
        assert_eq!(Identity::parse(&mixed).unwrap_err(), IdentityError::Alphabet);
        let digit = format!("1{}", &CFB_ISSUER[1..]);
        assert_eq!(Identity::parse(&digit).unwrap_err(), IdentityError::Alphabet);
    }
}
