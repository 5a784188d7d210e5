//! Record message definitions.
//!
//! Field names and numbering follow the archive's stable storage schema; tags
//! must never be reused or renumbered once a record kind has shipped.

/// A verified tick body, keyed by tick number.
#[derive(Clone, PartialEq, ::prost::Message, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TickData {
    #[prost(uint32, tag = "1")]
    pub computor_index: u32,
    #[prost(uint32, tag = "2")]
    pub epoch: u32,
    #[prost(uint32, tag = "3")]
    pub tick_number: u32,
    #[prost(uint64, tag = "4")]
    pub timestamp: u64,
    /// Transaction ids in tick slot order; empty for an empty tick.
    #[prost(string, repeated, tag = "5")]
    pub transaction_ids: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
    #[prost(int64, repeated, tag = "6")]
    pub contract_fees: ::prost::alloc::vec::Vec<i64>,
    #[prost(bytes = "vec", tag = "7")]
    #[serde(with = "crate::records::serde_hex")]
    pub time_lock: ::prost::alloc::vec::Vec<u8>,
    #[prost(string, tag = "8")]
    pub signature_hex: ::prost::alloc::string::String,
}

/// A verified transaction, keyed by its raw digest.
#[derive(Clone, PartialEq, ::prost::Message, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Transaction {
    #[prost(string, tag = "1")]
    pub source_id: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub dest_id: ::prost::alloc::string::String,
    #[prost(int64, tag = "3")]
    pub amount: i64,
    #[prost(uint32, tag = "4")]
    pub tick_number: u32,
    #[prost(uint32, tag = "5")]
    pub input_type: u32,
    #[prost(uint32, tag = "6")]
    pub input_size: u32,
    #[prost(string, tag = "7")]
    pub input_hex: ::prost::alloc::string::String,
    #[prost(string, tag = "8")]
    pub signature_hex: ::prost::alloc::string::String,
    #[prost(string, tag = "9")]
    pub tx_id: ::prost::alloc::string::String,
}

/// Execution outcome of one transaction, keyed by its raw digest.
#[derive(Clone, PartialEq, ::prost::Message, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransactionStatus {
    #[prost(string, tag = "1")]
    pub tx_id: ::prost::alloc::string::String,
    #[prost(bool, tag = "2")]
    pub money_flew: bool,
}

/// Aggregated execution outcomes for a tick.
#[derive(Clone, PartialEq, ::prost::Message, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TickTransactionsStatus {
    #[prost(uint32, tag = "1")]
    pub current_tick_of_node: u32,
    #[prost(uint32, tag = "2")]
    pub tick_number: u32,
    #[prost(message, repeated, tag = "3")]
    pub transactions: ::prost::alloc::vec::Vec<TransactionStatus>,
}

/// The computor list for an epoch, keyed by epoch.
#[derive(Clone, PartialEq, ::prost::Message, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Computors {
    #[prost(uint32, tag = "1")]
    pub epoch: u32,
    #[prost(string, repeated, tag = "2")]
    pub identities: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
    #[prost(string, tag = "3")]
    pub signature_hex: ::prost::alloc::string::String,
}

/// Legacy quorum record kind; retired, dropped by the cleanup migration.
#[derive(Clone, PartialEq, ::prost::Message, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QuorumTickData {
    #[prost(uint32, tag = "1")]
    pub epoch: u32,
    #[prost(uint32, tag = "2")]
    pub tick_number: u32,
    #[prost(string, tag = "3")]
    pub tx_digest_hex: ::prost::alloc::string::String,
    #[prost(uint32, tag = "4")]
    pub number_of_votes: u32,
}

/// The highest fully indexed tick, plus its epoch.
#[derive(Clone, Copy, PartialEq, Eq, ::prost::Message, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProcessedTick {
    #[prost(uint32, tag = "1")]
    pub tick_number: u32,
    #[prost(uint32, tag = "2")]
    pub epoch: u32,
}

/// A contiguous run of processed ticks within one epoch.
#[derive(Clone, Copy, PartialEq, Eq, ::prost::Message, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProcessedTickInterval {
    #[prost(uint32, tag = "1")]
    pub initial_processed_tick: u32,
    #[prost(uint32, tag = "2")]
    pub last_processed_tick: u32,
}

#[derive(Clone, PartialEq, ::prost::Message, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProcessedTickIntervalsPerEpoch {
    #[prost(uint32, tag = "1")]
    pub epoch: u32,
    #[prost(message, repeated, tag = "2")]
    pub intervals: ::prost::alloc::vec::Vec<ProcessedTickInterval>,
}

/// A run of ticks the pipeline skipped after validation failures.
#[derive(Clone, Copy, PartialEq, Eq, ::prost::Message, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SkippedTicksInterval {
    #[prost(uint32, tag = "1")]
    pub start_tick: u32,
    #[prost(uint32, tag = "2")]
    pub end_tick: u32,
}

#[derive(Clone, PartialEq, ::prost::Message, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SkippedTicksIntervalList {
    #[prost(message, repeated, tag = "1")]
    pub skipped_ticks: ::prost::alloc::vec::Vec<SkippedTicksInterval>,
}

/// All transfer transactions touching one identity in one tick.
#[derive(Clone, PartialEq, ::prost::Message, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransferTransactionsPerTick {
    #[prost(uint32, tag = "1")]
    pub tick_number: u32,
    #[prost(string, tag = "2")]
    pub identity: ::prost::alloc::string::String,
    #[prost(message, repeated, tag = "3")]
    pub transactions: ::prost::alloc::vec::Vec<Transaction>,
}

/// Asset-transaction ids for one (identity, asset, tick) bucket, in tick
/// body order.
#[derive(Clone, PartialEq, ::prost::Message, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AssetTransactionsPerTick {
    #[prost(string, repeated, tag = "1")]
    pub transactions: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
}

/// Hex-string serde for bytes fields exposed through the JSON gateway.
pub(crate) mod serde_hex {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(&s).map_err(serde::de::Error::custom)
    }
}
