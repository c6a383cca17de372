//! # Stream Codec
//!
//! [`ValueCodec`] plugs the engine into `tokio_util::codec`, one encoded unit
//! per item. Units are self-delimiting, so no extra framing is added on the
//! wire; the decoder waits until both length prefixes and the full payload are
//! buffered.
//!
//! ## Security
//! - Units declaring more than `max_input_size` bytes are rejected before the
//!   payload is buffered
//! - Buffer space is reserved from the declared length, never from guesses

use crate::core::engine::{Codec, UnitExtent};
use crate::core::value::Value;
use crate::error::{CodecError, Result};
use crate::utils::metrics::Metrics;
use bytes::{BufMut, BytesMut};
use std::sync::Arc;
use tokio_util::codec::{Decoder, Encoder};
use tracing::{debug, warn};

#[derive(Debug, Clone, Default)]
pub struct ValueCodec {
    codec: Codec,
    metrics: Option<Arc<Metrics>>,
}

impl ValueCodec {
    pub fn new(codec: Codec) -> Self {
        Self {
            codec,
            metrics: None,
        }
    }

    /// Record traffic and failures into `metrics`.
    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn codec(&self) -> &Codec {
        &self.codec
    }

    fn reject_oversized(&self, size: usize) -> Result<()> {
        let limit = self.codec.limits().max_input_size;
        if size > limit {
            warn!(size, limit, "stream unit exceeds size limit");
            if let Some(metrics) = &self.metrics {
                metrics.decode_error();
            }
            return Err(CodecError::InputTooLarge { size, limit });
        }
        Ok(())
    }
}

impl Decoder for ValueCodec {
    type Item = Value;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        let extent = self.codec.unit_extent(src).inspect_err(|_| {
            if let Some(metrics) = &self.metrics {
                metrics.decode_error();
            }
        })?;

        match extent {
            UnitExtent::Incomplete { at_least } => {
                self.reject_oversized(at_least)?;
                src.reserve(at_least.saturating_sub(src.len()));
                Ok(None)
            }
            UnitExtent::Complete(len) => {
                self.reject_oversized(len)?;
                let unit = src.split_to(len).freeze();
                match self.codec.des(&unit) {
                    Ok(value) => {
                        if let Some(metrics) = &self.metrics {
                            metrics.value_decoded(len as u64);
                        }
                        Ok(Some(value))
                    }
                    Err(e) => {
                        debug!(error = %e, len, "dropping undecodable unit");
                        if let Some(metrics) = &self.metrics {
                            metrics.decode_error();
                        }
                        Err(e)
                    }
                }
            }
        }
    }
}

impl Encoder<Value> for ValueCodec {
    type Error = CodecError;

    fn encode(&mut self, item: Value, dst: &mut BytesMut) -> Result<()> {
        let encoded = self.codec.ser(&item).inspect_err(|_| {
            if let Some(metrics) = &self.metrics {
                metrics.encode_error();
            }
        })?;
        dst.reserve(encoded.len());
        dst.put_slice(&encoded);
        if let Some(metrics) = &self.metrics {
            metrics.value_encoded(encoded.len() as u64);
        }
        Ok(())
    }
}
