//! archive-store - ordered key-value persistence
//!
//! A thin façade over a single redb table. Every record lives under a
//! one-byte prefix (see [`keys`]); multibyte integers in keys are big-endian
//! so lexicographic order matches numeric order, and every read pattern the
//! query façade needs reduces to a point get or a bounded range scan.
//!
//! Writes for one tick go through [`ArchiveBatch`] and land in a single
//! atomic, durable redb transaction: readers either see all of a tick's
//! records or none of them.

pub mod error;
pub mod keys;
pub mod reader;
pub mod store;

pub use error::StoreError;
pub use reader::{AssetTransactionRecord, AssetTransactionsPage};
pub use store::{ArchiveBatch, ArchiveStore};
