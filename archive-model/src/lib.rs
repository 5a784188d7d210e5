//! archive-model - core types for the tick archive
//!
//! The bottom crate of the workspace: strong byte-array types, K12 hashing,
//! the identity text codec, and the ledger wire structures (tick body,
//! transaction, quorum vote, computor list) together with their fixed-layout
//! binary codecs. Everything above (store, validators, client, API) is
//! expressed in terms of these types.

pub mod bytes;
pub mod computors;
pub mod crypto;
pub mod identity;
pub mod quorum;
pub mod source;
pub mod tick;
pub mod transaction;
pub mod types;

pub use bytes::WireError;
pub use computors::Computors;
pub use crypto::{k12, SignatureError, SignatureVerifier};
pub use identity::{Identity, IdentityError};
pub use quorum::{QuorumTickVote, VoteDigests};
pub use source::{IdentityInfo, NodeSource, SourceError, TickInfo, TickTxStatus, TxExecutionStatus};
pub use tick::TickData;
pub use transaction::Transaction;
pub use types::{Digest, PubKey, Signature};

use once_cell::sync::Lazy;

/// Number of consensus participants per epoch.
pub const NUMBER_OF_COMPUTORS: usize = 676;

/// Votes required for a tick to be final: strictly more than two thirds.
pub const QUORUM_THRESHOLD: usize = NUMBER_OF_COMPUTORS * 2 / 3 + 1;

/// Fixed width of the transaction digest array in a tick body.
pub const MAX_TRANSACTIONS_PER_TICK: usize = 1024;

/// Identity of the arbitrator, the fixed signer that authorizes a computor
/// list for an epoch.
pub const ARBITRATOR_IDENTITY: &str =
    "AFZPUAIYVPNUYGJRQVLUKOPPVLHAZQTGLYAAUUNBXFTVTAMSBKQBLEIEPCVJ";

/// Identity of the exchange contract (asset ownership transfers).
pub const QX_ADDRESS: &str = "BAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAARMID";

/// Identity of the utility contract (send-many batch transfers).
pub const QUTIL_ADDRESS: &str = "EAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAVWRF";

/// Issuer component of the native currency's asset id.
pub const NATIVE_ASSET_ISSUER: &str = "0";

/// Name component of the native currency's asset id.
pub const NATIVE_ASSET_NAME: &str = "0";

/// Default TCP port of a source node.
pub const NODE_PORT: u16 = 21841;

static ARBITRATOR_PUBKEY: Lazy<PubKey> = Lazy::new(|| {
    Identity::parse(ARBITRATOR_IDENTITY)
        .and_then(|id| id.to_pubkey())
        .expect("arbitrator identity constant is valid")
});

/// Public key of the arbitrator.
pub fn arbitrator_public_key() -> PubKey {
    *ARBITRATOR_PUBKEY
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quorum_threshold_is_two_thirds_plus_one() {
        assert_eq!(QUORUM_THRESHOLD, 451);
    }

    #[test]
    fn arbitrator_pubkey_resolves() {
        let pk = arbitrator_public_key();
        assert!(!pk.is_zero());
        // The text form round-trips back to the same key.
        let id = Identity::parse(ARBITRATOR_IDENTITY).unwrap();
        assert_eq!(id.to_pubkey().unwrap(), pk);
    }
}
