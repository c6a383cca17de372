//! Per-variant payload codecs.
//!
//! | Kind       | Payload                                                  |
//! |------------|----------------------------------------------------------|
//! | bytes      | raw bytes                                                |
//! | str        | UTF-8                                                    |
//! | bool       | `FF` true, `00` false                                    |
//! | int        | VLQ                                                      |
//! | sint       | bool sign byte (true = non-negative), then VLQ magnitude |
//! | float      | ASCII hexadecimal literal                                |
//! | complex    | float payload, `20`, float payload                       |
//! | list/tuple | framed encoded units, in order                           |
//! | set        | framed encoded units, in `Value` order                   |
//! | dict       | one framed `bytes` unit per entry, holding the list      |
//! |            | payload of `[key, value]`                                |

use crate::core::engine::{DecodeCtx, EncodeCtx};
use crate::core::hexfloat;
use crate::core::registry::{DeserializeFn, SerializeFn};
use crate::core::value::{Float64, Value, ValueKind};
use crate::core::vlq::VlqCodec;
use crate::error::{constants, CodecError, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::str;

const TRUE_BYTE: u8 = 0xFF;
const FALSE_BYTE: u8 = 0x00;
const COMPLEX_SEPARATOR: u8 = b' ';

pub(crate) fn serializer(kind: ValueKind) -> SerializeFn {
    match kind {
        ValueKind::Bytes => ser_bytes,
        ValueKind::Text => ser_text,
        ValueKind::Bool => ser_bool,
        ValueKind::Int => ser_int,
        ValueKind::SignedInt => ser_signed_int,
        ValueKind::Float => ser_float,
        ValueKind::Complex => ser_complex,
        ValueKind::Sequence | ValueKind::Tuple => ser_sequence,
        ValueKind::Set | ValueKind::FrozenSet => ser_set,
        ValueKind::Mapping => ser_mapping,
    }
}

pub(crate) fn deserializer(kind: ValueKind) -> DeserializeFn {
    match kind {
        ValueKind::Bytes => des_bytes,
        ValueKind::Text => des_text,
        ValueKind::Bool => des_bool,
        ValueKind::Int => des_int,
        ValueKind::SignedInt => des_signed_int,
        ValueKind::Float => des_float,
        ValueKind::Complex => des_complex,
        ValueKind::Sequence => des_sequence,
        ValueKind::Tuple => des_tuple,
        ValueKind::Set => des_set,
        ValueKind::FrozenSet => des_frozen_set,
        ValueKind::Mapping => des_mapping,
    }
}

fn mismatch(value: &Value) -> CodecError {
    CodecError::UnknownVariant(value.kind())
}

fn ser_bytes(value: &Value, _: &EncodeCtx<'_>) -> Result<Vec<u8>> {
    match value {
        Value::Bytes(bytes) => Ok(bytes.clone()),
        other => Err(mismatch(other)),
    }
}

fn des_bytes(payload: &[u8], _: &DecodeCtx<'_>) -> Result<Value> {
    Ok(Value::Bytes(payload.to_vec()))
}

fn ser_text(value: &Value, _: &EncodeCtx<'_>) -> Result<Vec<u8>> {
    match value {
        Value::Text(text) => Ok(text.as_bytes().to_vec()),
        other => Err(mismatch(other)),
    }
}

fn des_text(payload: &[u8], ctx: &DecodeCtx<'_>) -> Result<Value> {
    decode_utf8(payload, ctx.offset()).map(|text| Value::Text(text.to_owned()))
}

fn decode_utf8(payload: &[u8], offset: usize) -> Result<&str> {
    str::from_utf8(payload).map_err(|source| CodecError::TextDecode {
        offset: offset + source.valid_up_to(),
        source,
    })
}

fn ser_bool(value: &Value, _: &EncodeCtx<'_>) -> Result<Vec<u8>> {
    match value {
        Value::Bool(flag) => Ok(vec![bool_byte(*flag)]),
        other => Err(mismatch(other)),
    }
}

fn des_bool(payload: &[u8], ctx: &DecodeCtx<'_>) -> Result<Value> {
    match payload {
        [byte] => bool_from_byte(*byte, ctx.offset()).map(Value::Bool),
        _ => Err(CodecError::malformed(ctx.offset(), constants::ERR_BOOL_WIDTH)),
    }
}

fn bool_byte(flag: bool) -> u8 {
    if flag {
        TRUE_BYTE
    } else {
        FALSE_BYTE
    }
}

fn bool_from_byte(byte: u8, offset: usize) -> Result<bool> {
    match byte {
        TRUE_BYTE => Ok(true),
        FALSE_BYTE => Ok(false),
        _ => Err(CodecError::malformed(offset, constants::ERR_BOOL_VALUE)),
    }
}

fn ser_int(value: &Value, ctx: &EncodeCtx<'_>) -> Result<Vec<u8>> {
    match value {
        Value::Int(n) => Ok(ctx.vlq().encode(*n)),
        other => Err(mismatch(other)),
    }
}

fn des_int(payload: &[u8], ctx: &DecodeCtx<'_>) -> Result<Value> {
    read_exact_vlq(ctx.vlq(), payload, ctx.offset()).map(Value::Int)
}

/// Decode a VLQ that must span the whole of `payload`.
fn read_exact_vlq(vlq: &dyn VlqCodec, payload: &[u8], offset: usize) -> Result<u64> {
    let (n, used) = vlq.decode(payload).map_err(|e| e.at(offset))?;
    if used != payload.len() {
        return Err(CodecError::malformed(
            offset + used,
            constants::ERR_TRAILING_BYTES,
        ));
    }
    Ok(n)
}

fn ser_signed_int(value: &Value, ctx: &EncodeCtx<'_>) -> Result<Vec<u8>> {
    match value {
        Value::SignedInt(n) => {
            let mut out = vec![bool_byte(*n >= 0)];
            ctx.vlq().encode_into(n.unsigned_abs(), &mut out);
            Ok(out)
        }
        other => Err(mismatch(other)),
    }
}

fn des_signed_int(payload: &[u8], ctx: &DecodeCtx<'_>) -> Result<Value> {
    let offset = ctx.offset();
    let Some((&sign, magnitude)) = payload.split_first() else {
        return Err(CodecError::malformed(offset, constants::ERR_EMPTY_VLQ));
    };
    let non_negative = bool_from_byte(sign, offset)?;
    let magnitude = i128::from(read_exact_vlq(ctx.vlq(), magnitude, offset + 1)?);
    let signed = if non_negative { magnitude } else { -magnitude };
    i64::try_from(signed)
        .map(Value::SignedInt)
        .map_err(|_| CodecError::malformed(offset + 1, constants::ERR_INT_RANGE))
}

fn ser_float(value: &Value, _: &EncodeCtx<'_>) -> Result<Vec<u8>> {
    match value {
        Value::Float(f) => Ok(hexfloat::format(f.get()).into_bytes()),
        other => Err(mismatch(other)),
    }
}

fn des_float(payload: &[u8], ctx: &DecodeCtx<'_>) -> Result<Value> {
    parse_float(payload, ctx.offset()).map(Value::Float)
}

fn parse_float(payload: &[u8], offset: usize) -> Result<Float64> {
    let invalid = || CodecError::InvalidFloat {
        offset,
        literal: String::from_utf8_lossy(payload).into_owned(),
    };
    let literal = str::from_utf8(payload).map_err(|_| invalid())?;
    hexfloat::parse(literal).map(Float64).ok_or_else(invalid)
}

fn ser_complex(value: &Value, _: &EncodeCtx<'_>) -> Result<Vec<u8>> {
    match value {
        Value::Complex { re, im } => {
            let mut out = hexfloat::format(re.get()).into_bytes();
            out.push(COMPLEX_SEPARATOR);
            out.extend_from_slice(hexfloat::format(im.get()).as_bytes());
            Ok(out)
        }
        other => Err(mismatch(other)),
    }
}

fn des_complex(payload: &[u8], ctx: &DecodeCtx<'_>) -> Result<Value> {
    let offset = ctx.offset();
    let split = payload
        .iter()
        .position(|&b| b == COMPLEX_SEPARATOR)
        .ok_or_else(|| CodecError::malformed(offset, constants::ERR_COMPLEX_SEPARATOR))?;
    let re = parse_float(&payload[..split], offset)?;
    let im = parse_float(&payload[split + 1..], offset + split + 1)?;
    Ok(Value::Complex { re, im })
}

fn ser_sequence(value: &Value, ctx: &EncodeCtx<'_>) -> Result<Vec<u8>> {
    match value {
        Value::Sequence(items) | Value::Tuple(items) => ctx.elements(items),
        other => Err(mismatch(other)),
    }
}

fn des_sequence(payload: &[u8], ctx: &DecodeCtx<'_>) -> Result<Value> {
    ctx.elements(payload).map(Value::Sequence)
}

fn des_tuple(payload: &[u8], ctx: &DecodeCtx<'_>) -> Result<Value> {
    ctx.elements(payload).map(Value::Tuple)
}

fn ser_set(value: &Value, ctx: &EncodeCtx<'_>) -> Result<Vec<u8>> {
    match value {
        // BTreeSet iterates in `Value` order, so equal sets encode identically.
        Value::Set(items) | Value::FrozenSet(items) => ctx.elements(items),
        other => Err(mismatch(other)),
    }
}

fn des_set(payload: &[u8], ctx: &DecodeCtx<'_>) -> Result<Value> {
    set_items(payload, ctx).map(Value::Set)
}

fn des_frozen_set(payload: &[u8], ctx: &DecodeCtx<'_>) -> Result<Value> {
    set_items(payload, ctx).map(Value::FrozenSet)
}

fn set_items(payload: &[u8], ctx: &DecodeCtx<'_>) -> Result<BTreeSet<Value>> {
    ctx.elements(payload).map(|items| items.into_iter().collect())
}

fn ser_mapping(value: &Value, ctx: &EncodeCtx<'_>) -> Result<Vec<u8>> {
    let Value::Mapping(entries) = value else {
        return Err(mismatch(value));
    };
    ctx.child_depth()?;
    let mut out = Vec::new();
    for (key, val) in entries {
        let pair = ctx.elements([key, val])?;
        let unit = ctx
            .unit_with_kind(ValueKind::Bytes, &pair)
            .map_err(|_| CodecError::UnknownVariant(ValueKind::Mapping))?;
        crate::core::framing::write_frame(ctx.vlq(), &unit, &mut out);
    }
    Ok(out)
}

/// Entries are normally `bytes` units wrapping a two-element list payload.
/// A `list` or `tuple` unit holding the pair directly is accepted too.
fn des_mapping(payload: &[u8], ctx: &DecodeCtx<'_>) -> Result<Value> {
    ctx.child_depth()?;
    let registry = ctx.registry();
    let pair_tags = [ValueKind::Bytes, ValueKind::Sequence, ValueKind::Tuple]
        .map(|kind| registry.tag(kind).ok());
    let mut entries = BTreeMap::new();

    for element in ctx.units(payload, ctx.offset()) {
        let (offset, unit) = element?;
        let opened = ctx.open_unit(unit, offset)?;
        if !pair_tags.contains(&Some(opened.tag)) {
            return Err(CodecError::malformed(offset, constants::ERR_MAPPING_ENTRY));
        }
        let [key, val]: [Value; 2] = ctx
            .elements_at(opened.payload, opened.payload_offset)?
            .try_into()
            .map_err(|_| CodecError::malformed(offset, constants::ERR_MAPPING_ENTRY))?;
        entries.insert(key, val);
    }
    Ok(Value::Mapping(entries))
}
