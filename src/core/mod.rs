//! # Core Codec Components
//!
//! The wire format and the machinery that reads and writes it.
//!
//! ## Components
//! - **VLQ**: continuation-bit integers, behind a pluggable [`vlq::VlqCodec`]
//! - **Framing**: length-prefixed, self-delimiting byte blocks
//! - **Registry**: kind/tag table selecting each variant's payload codec
//! - **Engine**: recursive `ser`/`des` over nested values
//! - **Codec**: `tokio_util` adapter for byte streams
//!
//! ## Wire Format
//! ```text
//! [VLQ(len(tag))] [tag] [VLQ(len(payload))] [payload]
//! ```
//!
//! ## Security
//! - Frame lengths are checked against the remaining buffer before slicing
//! - Nesting depth and input size are bounded on encode and decode

pub mod codec;
pub mod engine;
pub mod framing;
pub mod hexfloat;
pub mod registry;
pub mod value;
pub(crate) mod variants;
pub mod vlq;
