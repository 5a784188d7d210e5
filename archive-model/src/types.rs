//! Fixed-size byte newtypes
//!
//! Semantic wrappers for the byte arrays that flow through the archive,
//! replacing raw `[u8; N]` at every seam.

use std::fmt;

macro_rules! bytes_newtype {
    ($name:ident, $len:expr, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(transparent)]
        pub struct $name(pub [u8; $len]);

        impl $name {
            /// Width in bytes.
            pub const LEN: usize = $len;

            /// The all-zero value, used as a sentinel throughout the ledger.
            pub const ZERO: Self = Self([0u8; $len]);

            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            pub fn is_zero(&self) -> bool {
                self.0.iter().all(|b| *b == 0)
            }

            pub fn to_hex(&self) -> String {
                hex::encode(self.0)
            }

            pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
                let bytes = hex::decode(s)?;
                let arr: [u8; $len] = bytes
                    .try_into()
                    .map_err(|_| hex::FromHexError::InvalidStringLength)?;
                Ok(Self(arr))
            }
        }

        // Arrays longer than 32 bytes have no derived Default in std.
        impl Default for $name {
            fn default() -> Self {
                Self::ZERO
            }
        }

        impl From<[u8; $len]> for $name {
            fn from(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }
        }

        impl From<$name> for [u8; $len] {
            fn from(value: $name) -> [u8; $len] {
                value.0
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl TryFrom<&[u8]> for $name {
            type Error = std::array::TryFromSliceError;

            fn try_from(slice: &[u8]) -> Result<Self, Self::Error> {
                Ok(Self(<[u8; $len]>::try_from(slice)?))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                for byte in &self.0 {
                    write!(f, "{:02x}", byte)?;
                }
                Ok(())
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self)
            }
        }
    };
}

bytes_newtype!(Digest, 32, "32-byte K12 digest.");
bytes_newtype!(PubKey, 32, "32-byte public key.");
bytes_newtype!(Signature, 64, "64-byte detached Schnorr signature.");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_and_nonzero() {
        assert!(Digest::ZERO.is_zero());
        let mut d = Digest::ZERO;
        d.0[31] = 1;
        assert!(!d.is_zero());
    }

    #[test]
    fn hex_round_trip() {
        let d = Digest([0xab; 32]);
        assert_eq!(Digest::from_hex(&d.to_hex()).unwrap(), d);
        assert!(Digest::from_hex("abcd").is_err());
    }

    #[test]
    fn try_from_slice_checks_length() {
        let ok: Result<Signature, _> = Signature::try_from(&[0u8; 64][..]);
        assert!(ok.is_ok());
        let short: Result<Signature, _> = Signature::try_from(&[0u8; 63][..]);
        assert!(short.is_err());
    }
}
