//! archive-proto - persisted record messages
//!
//! Every value in the store is one of these messages in its protobuf wire
//! form. The structs carry prost derives directly (no build-time codegen, so
//! the workspace builds without `protoc`) plus serde derives for the JSON
//! gateway.

pub mod convert;
pub mod records;

pub use convert::ConvertError;
pub use records::*;
