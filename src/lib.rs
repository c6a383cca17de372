//! # blobwire
//!
//! Self-describing binary codec for a closed set of nested value variants.
//!
//! Every value is written as an *encoded unit*: a length-prefixed tag naming
//! the variant, followed by a length-prefixed payload. Lengths are
//! variable-length quantities (VLQ, big-endian base-128), so units are
//! self-delimiting and containers simply concatenate the units of their
//! elements.
//!
//! ```
//! use blobwire::{des, ser, Value};
//!
//! let encoded = ser(&Value::Int(5)).unwrap();
//! assert_eq!(encoded, b"\x03int\x01\x05");
//!
//! let value = Value::from(vec![Value::from("a"), Value::Bool(true)]);
//! assert_eq!(des(&ser(&value).unwrap()).unwrap(), value);
//! ```
//!
//! ## Layout
//! - [`core::vlq`] and [`core::framing`]: length primitives
//! - [`core::value`]: the [`Value`] tree
//! - [`core::registry`]: tag ↔ variant bindings
//! - [`core::engine`]: [`Codec`], the recursive encoder/decoder
//! - [`core::codec`]: [`ValueCodec`] for `tokio_util` framed streams
//! - [`config`]: TOML/env configuration
//! - [`utils`]: logging setup and metrics

pub mod config;
pub mod core;
pub mod error;
pub mod utils;

pub use crate::config::{CodecConfig, LimitsConfig, LoggingConfig, RegistryKind};
pub use crate::core::codec::ValueCodec;
pub use crate::core::engine::{des, ser, Codec, CodecBuilder, Limits, UnitExtent};
pub use crate::core::framing::{depascalify, pascalify, peel};
pub use crate::core::registry::{Registry, RegistryBuilder};
pub use crate::core::value::{Float64, Value, ValueKind};
pub use crate::core::vlq::{Vlq, VlqCodec};
pub use crate::error::{CodecError, ErrorKind, Result};
