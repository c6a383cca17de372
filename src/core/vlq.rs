//! # Variable-Length Quantities
//!
//! Non-negative integers as big-endian base-128 groups. Every byte except the
//! last carries the continuation bit (0x80).
//!
//! ```text
//! 0       -> 00
//! 127     -> 7F
//! 128     -> 81 00
//! 246537  -> 8F 86 09
//! ```
//!
//! The codec has no sign concept; signed variants carry the sign separately.
//! Framing depends on the [`VlqCodec`] trait rather than on [`Vlq`] directly so
//! that an alternate implementation of the same wire format can be injected.

use crate::error::{constants, CodecError, Result};
use std::fmt::Debug;

const CONTINUATION: u8 = 0b1000_0000;
const GROUP_MASK: u8 = 0b0111_1111;

/// Longest encoding of a `u64` (ceil(64 / 7)).
pub const MAX_VLQ_LEN: usize = 10;

/// Strategy for reading and writing VLQ length prefixes.
///
/// Implementations must agree bit-for-bit with [`Vlq`]; the trait exists to
/// swap in faster or instrumented backends, not to change the wire format.
pub trait VlqCodec: Debug + Send + Sync {
    /// Append the encoding of `n` to `out`.
    fn encode_into(&self, n: u64, out: &mut Vec<u8>);

    /// Decode the leading VLQ of `input`, returning the value and the number
    /// of bytes it occupied.
    fn decode(&self, input: &[u8]) -> Result<(u64, usize)>;

    /// Number of bytes occupied by the leading VLQ, without materializing it.
    fn skip(&self, input: &[u8]) -> Result<usize>;

    /// Encode `n` into a fresh buffer.
    fn encode(&self, n: u64) -> Vec<u8> {
        let mut out = Vec::with_capacity(encoded_len(n));
        self.encode_into(n, &mut out);
        out
    }
}

/// Built-in bytewise implementation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Vlq;

impl VlqCodec for Vlq {
    fn encode_into(&self, n: u64, out: &mut Vec<u8>) {
        let len = encoded_len(n);
        for i in (0..len).rev() {
            let group = ((n >> (7 * i)) as u8) & GROUP_MASK;
            if i == 0 {
                out.push(group);
            } else {
                out.push(group | CONTINUATION);
            }
        }
    }

    fn decode(&self, input: &[u8]) -> Result<(u64, usize)> {
        if input.is_empty() {
            return Err(CodecError::malformed(0, constants::ERR_EMPTY_VLQ));
        }

        let mut n: u64 = 0;
        for (i, &byte) in input.iter().enumerate() {
            if n > (u64::MAX >> 7) {
                return Err(CodecError::malformed(0, constants::ERR_VLQ_OVERFLOW));
            }
            n = (n << 7) | u64::from(byte & GROUP_MASK);
            if byte & CONTINUATION == 0 {
                return Ok((n, i + 1));
            }
        }

        Err(CodecError::malformed(0, constants::ERR_TRUNCATED_VLQ))
    }

    fn skip(&self, input: &[u8]) -> Result<usize> {
        if input.is_empty() {
            return Err(CodecError::malformed(0, constants::ERR_EMPTY_VLQ));
        }
        input
            .iter()
            .position(|byte| byte & CONTINUATION == 0)
            .map(|i| i + 1)
            .ok_or_else(|| CodecError::malformed(0, constants::ERR_TRUNCATED_VLQ))
    }
}

/// Number of bytes [`Vlq`] needs for `n`.
#[inline]
pub fn encoded_len(n: u64) -> usize {
    let bits = 64 - n.leading_zeros() as usize;
    bits.div_ceil(7).max(1)
}

/// Encode with the built-in codec.
pub fn encode(n: u64) -> Vec<u8> {
    Vlq.encode(n)
}

/// Decode with the built-in codec.
pub fn decode(input: &[u8]) -> Result<(u64, usize)> {
    Vlq.decode(input)
}

/// Skip with the built-in codec, returning everything after the VLQ.
pub fn skip(input: &[u8]) -> Result<&[u8]> {
    let used = Vlq.skip(input)?;
    Ok(&input[used..])
}
