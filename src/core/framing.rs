//! # Pascal-Style Framing
//!
//! A frame is `VLQ(len(payload)) ++ payload`. Frames are self-delimiting, so
//! any number of them can be concatenated and split apart again without
//! separators:
//!
//! ```text
//! peel(pascalify(P) ++ X) == (P, X)
//! ```
//!
//! The `*_with` variants take the [`VlqCodec`] to use; the plain functions use
//! the built-in [`Vlq`].

use crate::core::vlq::{Vlq, VlqCodec};
use crate::error::{constants, CodecError, Result};

/// Frame `payload` behind its length.
pub fn pascalify(payload: &[u8]) -> Vec<u8> {
    pascalify_with(&Vlq, payload)
}

/// Read the leading length and return it with everything after the prefix.
pub fn depascalify(blob: &[u8]) -> Result<(usize, &[u8])> {
    depascalify_with(&Vlq, blob)
}

/// Split the leading frame's payload from whatever follows it.
pub fn peel(blob: &[u8]) -> Result<(&[u8], &[u8])> {
    peel_with(&Vlq, blob)
}

pub fn pascalify_with(vlq: &dyn VlqCodec, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + crate::core::vlq::MAX_VLQ_LEN);
    write_frame(vlq, payload, &mut out);
    out
}

/// Append a frame to `out`.
pub fn write_frame(vlq: &dyn VlqCodec, payload: &[u8], out: &mut Vec<u8>) {
    vlq.encode_into(payload.len() as u64, out);
    out.extend_from_slice(payload);
}

pub fn depascalify_with<'a>(vlq: &dyn VlqCodec, blob: &'a [u8]) -> Result<(usize, &'a [u8])> {
    let (length, used) = vlq.decode(blob)?;
    // A length that does not fit in usize can never be satisfied by a buffer.
    let length = usize::try_from(length)
        .map_err(|_| CodecError::malformed(0, constants::ERR_FRAME_OVERRUN))?;
    Ok((length, &blob[used..]))
}

pub fn peel_with<'a>(vlq: &dyn VlqCodec, blob: &'a [u8]) -> Result<(&'a [u8], &'a [u8])> {
    let (length, remainder) = depascalify_with(vlq, blob)?;
    if length > remainder.len() {
        return Err(CodecError::malformed(0, constants::ERR_FRAME_OVERRUN));
    }
    Ok(remainder.split_at(length))
}

/// Total size (prefix plus payload) the leading frame declares, whether or
/// not the payload is present yet.
///
/// Returns `Ok(None)` while the length prefix itself is still incomplete.
pub fn declared_frame_len(vlq: &dyn VlqCodec, blob: &[u8]) -> Result<Option<usize>> {
    let used = match vlq.skip(blob) {
        Ok(used) => used,
        Err(_) if blob.len() < crate::core::vlq::MAX_VLQ_LEN => return Ok(None),
        Err(e) => return Err(e),
    };
    let (length, _) = depascalify_with(vlq, blob)?;
    used.checked_add(length)
        .map(Some)
        .ok_or_else(|| CodecError::malformed(0, constants::ERR_FRAME_OVERRUN))
}

/// Total size of the leading frame, or `Ok(None)` if `blob` ends before it does.
pub fn frame_len(vlq: &dyn VlqCodec, blob: &[u8]) -> Result<Option<usize>> {
    Ok(declared_frame_len(vlq, blob)?.filter(|&total| total <= blob.len()))
}
