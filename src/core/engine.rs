//! # Recursive Engine
//!
//! Every value is written as one *encoded unit*:
//!
//! ```text
//! Frame(tag) ++ Frame(payload)
//! ```
//!
//! Containers carry their elements as a run of framed encoded units, so
//! encoding and decoding recurse through [`EncodeCtx`] and [`DecodeCtx`]. The
//! recursion is bounded by [`Limits::max_depth`] on both sides.
//!
//! [`Codec::des`] stops after the payload frame of the leading unit. Trailing
//! bytes are left to the caller; [`Codec::des_prefix`] reports how far it read.

use crate::config::{CodecConfig, RegistryKind, MAX_INPUT_SIZE, MAX_NESTING_DEPTH};
use crate::core::framing;
use crate::core::registry::Registry;
use crate::core::value::{Value, ValueKind};
use crate::core::vlq::{Vlq, VlqCodec};
use crate::error::{constants, CodecError, Result};
use once_cell::sync::Lazy;
use std::str;
use std::sync::Arc;
use tracing::{debug, trace, warn};

static DEFAULT_CODEC: Lazy<Codec> = Lazy::new(Codec::new);

/// Serialize `value` with the built-in registry and default limits.
pub fn ser(value: &Value) -> Result<Vec<u8>> {
    DEFAULT_CODEC.ser(value)
}

/// Deserialize the leading encoded unit of `blob` with the built-in registry
/// and default limits.
pub fn des(blob: &[u8]) -> Result<Value> {
    DEFAULT_CODEC.des(blob)
}

/// Bounds applied to every encode and decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Deepest container nesting accepted; scalars sit at depth 0.
    pub max_depth: usize,
    /// Largest buffer `des` accepts and `ser` produces.
    pub max_input_size: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_depth: MAX_NESTING_DEPTH,
            max_input_size: MAX_INPUT_SIZE,
        }
    }
}

/// How much of a buffer the leading encoded unit needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitExtent {
    /// The unit occupies exactly this many leading bytes.
    Complete(usize),
    /// More bytes are needed; the unit is at least this long.
    Incomplete { at_least: usize },
}

/// Encoder/decoder bound to a registry, a VLQ implementation and limits.
///
/// Cheap to clone and safe to share between threads.
#[derive(Debug, Clone)]
pub struct Codec {
    registry: Arc<Registry>,
    vlq: Arc<dyn VlqCodec>,
    limits: Limits,
}

impl Default for Codec {
    fn default() -> Self {
        Self::new()
    }
}

impl Codec {
    pub fn new() -> Self {
        Self {
            registry: Registry::builtin(),
            vlq: Arc::new(Vlq),
            limits: Limits::default(),
        }
    }

    pub fn builder() -> CodecBuilder {
        CodecBuilder::default()
    }

    /// Build a codec from validated configuration.
    pub fn from_config(config: &CodecConfig) -> Result<Self> {
        config.validate_strict()?;
        let registry = match config.registry {
            RegistryKind::Builtin => Registry::builtin(),
            RegistryKind::Legacy => Registry::legacy(),
        };
        Ok(Self::builder()
            .registry(registry)
            .limits(Limits {
                max_depth: config.limits.max_depth,
                max_input_size: config.limits.max_input_size,
            })
            .build())
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    pub fn vlq(&self) -> &dyn VlqCodec {
        self.vlq.as_ref()
    }

    /// Serialize `value` into one encoded unit.
    pub fn ser(&self, value: &Value) -> Result<Vec<u8>> {
        let encoded = self.encode_unit(value, 0).inspect_err(|e| match e {
            CodecError::DepthLimitExceeded { .. } => warn!(error = %e, "encode rejected"),
            _ => debug!(error = %e, kind = %value.kind(), "encode failed"),
        })?;
        if encoded.len() > self.limits.max_input_size {
            warn!(
                size = encoded.len(),
                limit = self.limits.max_input_size,
                "encoded value exceeds size limit"
            );
            return Err(CodecError::InputTooLarge {
                size: encoded.len(),
                limit: self.limits.max_input_size,
            });
        }
        trace!(kind = %value.kind(), len = encoded.len(), "encoded value");
        Ok(encoded)
    }

    /// Deserialize the leading encoded unit of `blob`, ignoring anything after it.
    pub fn des(&self, blob: &[u8]) -> Result<Value> {
        self.des_prefix(blob).map(|(value, _)| value)
    }

    /// Deserialize the leading encoded unit and report how many bytes it used.
    pub fn des_prefix(&self, blob: &[u8]) -> Result<(Value, usize)> {
        self.check_input_size(blob.len())?;
        let decoded = self.decode_unit(blob, 0, 0).inspect_err(|e| match e {
            CodecError::DepthLimitExceeded { .. } => warn!(error = %e, "decode rejected"),
            _ => debug!(error = %e, offset = ?e.offset(), "decode failed"),
        })?;
        trace!(kind = %decoded.0.kind(), consumed = decoded.1, "decoded value");
        Ok(decoded)
    }

    /// Deserialize a concatenation of encoded units.
    pub fn des_all(&self, blob: &[u8]) -> Result<Vec<Value>> {
        self.check_input_size(blob.len())?;
        let mut values = Vec::new();
        let mut pos = 0;
        while pos < blob.len() {
            let (value, used) = self
                .decode_unit(&blob[pos..], pos, 0)
                .inspect_err(|e| debug!(error = %e, offset = ?e.offset(), "decode failed"))?;
            values.push(value);
            pos += used;
        }
        Ok(values)
    }

    /// Length of the leading encoded unit, or `None` if `blob` ends before it does.
    pub fn encoded_len(&self, blob: &[u8]) -> Result<Option<usize>> {
        Ok(match self.unit_extent(blob)? {
            UnitExtent::Complete(len) => Some(len),
            UnitExtent::Incomplete { .. } => None,
        })
    }

    /// Determine how many bytes the leading encoded unit spans, reading only
    /// its two length prefixes.
    pub fn unit_extent(&self, blob: &[u8]) -> Result<UnitExtent> {
        let vlq = self.vlq();
        let Some(tag_len) = framing::declared_frame_len(vlq, blob)? else {
            return Ok(UnitExtent::Incomplete {
                at_least: blob.len() + 1,
            });
        };
        // The payload prefix is at least one byte.
        if tag_len >= blob.len() {
            return Ok(UnitExtent::Incomplete {
                at_least: tag_len + 1,
            });
        }
        let Some(payload_len) =
            framing::declared_frame_len(vlq, &blob[tag_len..]).map_err(|e| e.at(tag_len))?
        else {
            return Ok(UnitExtent::Incomplete {
                at_least: blob.len() + 1,
            });
        };
        let total = tag_len
            .checked_add(payload_len)
            .ok_or_else(|| CodecError::malformed(tag_len, constants::ERR_FRAME_OVERRUN))?;
        if total > blob.len() {
            Ok(UnitExtent::Incomplete { at_least: total })
        } else {
            Ok(UnitExtent::Complete(total))
        }
    }

    fn check_input_size(&self, size: usize) -> Result<()> {
        if size > self.limits.max_input_size {
            warn!(size, limit = self.limits.max_input_size, "input exceeds size limit");
            return Err(CodecError::InputTooLarge {
                size,
                limit: self.limits.max_input_size,
            });
        }
        Ok(())
    }

    pub(crate) fn encode_unit(&self, value: &Value, depth: usize) -> Result<Vec<u8>> {
        let entry = self.registry.for_kind(value.kind())?;
        let ctx = EncodeCtx { codec: self, depth };
        let payload = (entry.serialize)(value, &ctx)?;
        Ok(self.frame_unit(&entry.tag, &payload))
    }

    fn frame_unit(&self, tag: &str, payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(tag.len() + payload.len() + 2);
        framing::write_frame(self.vlq(), tag.as_bytes(), &mut out);
        framing::write_frame(self.vlq(), payload, &mut out);
        out
    }

    /// Decode the unit at the start of `blob`, which sits at absolute offset
    /// `base`. Returns the value and the bytes consumed.
    pub(crate) fn decode_unit(
        &self,
        blob: &[u8],
        base: usize,
        depth: usize,
    ) -> Result<(Value, usize)> {
        let unit = self.open_unit(blob, base)?;
        let entry = self
            .registry
            .for_tag(unit.tag)
            .ok_or_else(|| CodecError::UnknownTag {
                tag: unit.tag.to_owned(),
                offset: base,
            })?;
        let ctx = DecodeCtx {
            codec: self,
            depth,
            offset: unit.payload_offset,
        };
        let value = (entry.deserialize)(unit.payload, &ctx)?;
        Ok((value, unit.consumed))
    }

    /// Split an encoded unit into its tag and payload without decoding the payload.
    pub(crate) fn open_unit<'a>(&self, blob: &'a [u8], base: usize) -> Result<OpenUnit<'a>> {
        let vlq = self.vlq();
        let (tag_bytes, rest) = framing::peel_with(vlq, blob).map_err(|e| e.at(base))?;
        let tag_offset = base + (blob.len() - rest.len() - tag_bytes.len());
        let tag = str::from_utf8(tag_bytes).map_err(|source| CodecError::TextDecode {
            offset: tag_offset + source.valid_up_to(),
            source,
        })?;

        let rest_offset = base + (blob.len() - rest.len());
        let (payload, tail) = framing::peel_with(vlq, rest).map_err(|e| e.at(rest_offset))?;
        Ok(OpenUnit {
            tag,
            payload,
            payload_offset: rest_offset + (rest.len() - tail.len() - payload.len()),
            consumed: blob.len() - tail.len(),
        })
    }
}

pub(crate) struct OpenUnit<'a> {
    pub tag: &'a str,
    pub payload: &'a [u8],
    pub payload_offset: usize,
    pub consumed: usize,
}

/// Builder for [`Codec`].
#[derive(Debug, Default)]
pub struct CodecBuilder {
    registry: Option<Arc<Registry>>,
    vlq: Option<Arc<dyn VlqCodec>>,
    limits: Limits,
}

impl CodecBuilder {
    pub fn registry(mut self, registry: Arc<Registry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Use a different VLQ implementation for all length prefixes and integers.
    pub fn vlq(mut self, vlq: Arc<dyn VlqCodec>) -> Self {
        self.vlq = Some(vlq);
        self
    }

    pub fn limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.limits.max_depth = max_depth;
        self
    }

    pub fn max_input_size(mut self, max_input_size: usize) -> Self {
        self.limits.max_input_size = max_input_size;
        self
    }

    pub fn build(self) -> Codec {
        Codec {
            registry: self.registry.unwrap_or_else(Registry::builtin),
            vlq: self.vlq.unwrap_or_else(|| Arc::new(Vlq)),
            limits: self.limits,
        }
    }
}

/// State handed to a variant serializer.
pub struct EncodeCtx<'c> {
    codec: &'c Codec,
    depth: usize,
}

impl EncodeCtx<'_> {
    pub fn vlq(&self) -> &dyn VlqCodec {
        self.codec.vlq()
    }

    /// Encode `items` as a run of framed encoded units, one nesting level down.
    pub fn elements<'v, I>(&self, items: I) -> Result<Vec<u8>>
    where
        I: IntoIterator<Item = &'v Value>,
    {
        let depth = self.child_depth()?;
        let mut out = Vec::new();
        for item in items {
            let unit = self.codec.encode_unit(item, depth)?;
            framing::write_frame(self.vlq(), &unit, &mut out);
        }
        Ok(out)
    }

    /// Frame `payload` as an encoded unit under the tag registered for `kind`.
    pub fn unit_with_kind(&self, kind: ValueKind, payload: &[u8]) -> Result<Vec<u8>> {
        let tag = self.codec.registry().tag(kind)?;
        Ok(self.codec.frame_unit(tag, payload))
    }

    pub(crate) fn child_depth(&self) -> Result<usize> {
        let depth = self.depth + 1;
        if depth > self.codec.limits.max_depth {
            return Err(CodecError::DepthLimitExceeded {
                limit: self.codec.limits.max_depth,
            });
        }
        Ok(depth)
    }
}

/// State handed to a variant deserializer.
pub struct DecodeCtx<'c> {
    codec: &'c Codec,
    depth: usize,
    offset: usize,
}

impl DecodeCtx<'_> {
    /// Absolute offset of the payload being decoded.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn vlq(&self) -> &dyn VlqCodec {
        self.codec.vlq()
    }

    pub fn registry(&self) -> &Registry {
        self.codec.registry()
    }

    /// Decode a run of framed encoded units, one nesting level down.
    pub fn elements(&self, payload: &[u8]) -> Result<Vec<Value>> {
        self.elements_at(payload, self.offset)
    }

    /// As [`DecodeCtx::elements`] for a run starting at absolute offset `base`.
    pub fn elements_at(&self, payload: &[u8], base: usize) -> Result<Vec<Value>> {
        let depth = self.child_depth()?;
        let mut values = Vec::new();
        for element in self.units(payload, base) {
            let (offset, unit) = element?;
            let (value, _) = self.codec.decode_unit(unit, offset, depth)?;
            values.push(value);
        }
        Ok(values)
    }

    /// Iterate the framed units of a container payload as `(offset, unit)`.
    pub(crate) fn units<'a>(&self, payload: &'a [u8], base: usize) -> Units<'a, '_> {
        Units {
            vlq: self.vlq(),
            rest: payload,
            offset: base,
        }
    }

    pub(crate) fn child_depth(&self) -> Result<usize> {
        let depth = self.depth + 1;
        if depth > self.codec.limits.max_depth {
            return Err(CodecError::DepthLimitExceeded {
                limit: self.codec.limits.max_depth,
            });
        }
        Ok(depth)
    }

    pub(crate) fn open_unit<'a>(&self, unit: &'a [u8], base: usize) -> Result<OpenUnit<'a>> {
        self.codec.open_unit(unit, base)
    }
}

/// Framed units of a container payload.
pub(crate) struct Units<'a, 'v> {
    vlq: &'v dyn VlqCodec,
    rest: &'a [u8],
    offset: usize,
}

impl<'a> Iterator for Units<'a, '_> {
    type Item = Result<(usize, &'a [u8])>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.rest.is_empty() {
            return None;
        }
        match framing::peel_with(self.vlq, self.rest) {
            Ok((unit, tail)) => {
                let unit_offset = self.offset + (self.rest.len() - tail.len() - unit.len());
                self.offset += self.rest.len() - tail.len();
                self.rest = tail;
                Some(Ok((unit_offset, unit)))
            }
            Err(e) => {
                let e = e.at(self.offset);
                self.rest = &[];
                Some(Err(e))
            }
        }
    }
}
