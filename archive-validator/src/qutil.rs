//! Utility-contract payloads: the send-many batch transfer.

use archive_model::bytes::{ByteReader, WireError};
use archive_model::PubKey;

/// Input type selecting a send-many transfer on the utility contract.
pub const SEND_MANY_INPUT_TYPE: u16 = 1;

/// Fixed number of destination slots.
pub const SEND_MANY_MAX_TRANSFERS: usize = 25;

/// Wire width: 25 destination keys followed by 25 amounts.
pub const SEND_MANY_INPUT_LEN: usize = SEND_MANY_MAX_TRANSFERS * (32 + 8);

/// Fixed-width destination and amount arrays; unused slots are zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendManyPayload {
    pub destinations: Vec<PubKey>,
    pub amounts: Vec<i64>,
}

impl SendManyPayload {
    pub fn unmarshal(data: &[u8]) -> Result<SendManyPayload, WireError> {
        let mut r = ByteReader::new(data);
        let mut destinations = Vec::with_capacity(SEND_MANY_MAX_TRANSFERS);
        for _ in 0..SEND_MANY_MAX_TRANSFERS {
            destinations.push(PubKey(r.array()?));
        }
        let mut amounts = Vec::with_capacity(SEND_MANY_MAX_TRANSFERS);
        for _ in 0..SEND_MANY_MAX_TRANSFERS {
            amounts.push(r.i64_le()?);
        }
        r.finish()?;
        Ok(SendManyPayload {
            destinations,
            amounts,
        })
    }

    /// The populated `(destination, amount)` pairs, in slot order.
    pub fn transfers(&self) -> Vec<(PubKey, i64)> {
        self.destinations
            .iter()
            .zip(&self.amounts)
            .filter(|(dest, amount)| !dest.is_zero() && **amount > 0)
            .map(|(dest, amount)| (*dest, *amount))
            .collect()
    }

    pub fn total_amount(&self) -> i64 {
        self.amounts.iter().sum()
    }
}
