//! Exchange-contract payloads.
//!
//! The only input shape the archive decodes from the exchange contract is
//! the asset ownership-and-possession transfer (`inputType == 2`).

use archive_model::bytes::{ByteReader, WireError};
use archive_model::{Identity, PubKey};

/// Input type selecting an asset ownership transfer on the exchange contract.
pub const TRANSFER_SHARE_INPUT_TYPE: u16 = 2;

/// Wire width of the transfer input.
pub const TRANSFER_INPUT_LEN: usize = 32 + 32 + 8 + 8;

/// `issuer ‖ newOwnerAndPossessor ‖ assetName ‖ numberOfUnits`, all
/// little-endian.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferAssetOwnershipInput {
    pub issuer: PubKey,
    pub new_owner_and_possessor: PubKey,
    pub asset_name: u64,
    pub number_of_units: i64,
}

impl TransferAssetOwnershipInput {
    pub fn unmarshal(data: &[u8]) -> Result<TransferAssetOwnershipInput, WireError> {
        let mut r = ByteReader::new(data);
        let input = TransferAssetOwnershipInput {
            issuer: PubKey(r.array()?),
            new_owner_and_possessor: PubKey(r.array()?),
            asset_name: r.u64_le()?,
            number_of_units: r.i64_le()?,
        };
        r.finish()?;
        Ok(input)
    }

    /// The asset name as text: the u64 holds UTF-8 bytes, little-endian,
    /// padded with trailing zeros.
    pub fn asset_name_string(&self) -> String {
        let bytes = self.asset_name.to_le_bytes();
        let end = bytes.iter().rposition(|b| *b != 0).map_or(0, |i| i + 1);
        String::from_utf8_lossy(&bytes[..end]).into_owned()
    }

    pub fn issuer_identity(&self) -> Identity {
        Identity::from_pubkey(self.issuer.as_bytes(), false)
    }

    pub fn new_owner_identity(&self) -> Identity {
        Identity::from_pubkey(self.new_owner_and_possessor.as_bytes(), false)
    }
}
