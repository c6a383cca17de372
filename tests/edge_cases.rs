#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
//! Edge-case tests: truncation, hostile lengths, limits and error reporting.

use blobwire::config::MAX_SAFE_DEPTH;
use blobwire::error::constants;
use blobwire::{
    des, ser, Codec, CodecConfig, CodecError, ErrorKind, Registry, UnitExtent, Value, ValueKind,
};

fn nested(depth: usize) -> Value {
    let mut value = Value::Int(0);
    for _ in 0..depth {
        value = Value::Sequence(vec![value]);
    }
    value
}

// ============================================================================
// TRUNCATION
// ============================================================================

#[test]
fn test_every_truncation_is_rejected() {
    let value = Value::mapping([
        (Value::from("k"), Value::Sequence(vec![Value::Int(300), Value::Bool(false)])),
        (Value::Int(1), Value::float(-2.5)),
    ]);
    let encoded = ser(&value).unwrap();

    for cut in 0..encoded.len() {
        let result = des(&encoded[..cut]);
        assert!(result.is_err(), "prefix of {cut} bytes decoded: {result:?}");
        assert_eq!(result.unwrap_err().kind(), ErrorKind::MalformedInput);
    }
    assert_eq!(des(&encoded).unwrap(), value);
}

#[test]
fn test_empty_input() {
    let err = des(&[]).unwrap_err();
    assert!(matches!(
        err,
        CodecError::MalformedInput {
            offset: 0,
            reason: constants::ERR_EMPTY_VLQ
        }
    ));
}

#[test]
fn test_overlong_length_prefix() {
    // A tag length far beyond anything in the buffer.
    let blob = [0xFF, 0xFF, 0xFF, 0x7F, b'x'];
    assert_eq!(des(&blob).unwrap_err().kind(), ErrorKind::MalformedInput);
}

#[test]
fn test_vlq_overflow_in_int_payload() {
    let mut blob = b"\x03int\x0B".to_vec();
    blob.extend_from_slice(&[0xFF; 10]);
    blob.push(0x7F);
    assert!(matches!(
        des(&blob),
        Err(CodecError::MalformedInput {
            reason: constants::ERR_VLQ_OVERFLOW,
            ..
        })
    ));
}

#[test]
fn test_int_trailing_payload_bytes() {
    let err = des(b"\x03int\x02\x05\x00").unwrap_err();
    assert!(matches!(
        err,
        CodecError::MalformedInput {
            offset: 6,
            reason: constants::ERR_TRAILING_BYTES
        }
    ));
}

// ============================================================================
// UNKNOWN TAGS AND VARIANTS
// ============================================================================

#[test]
fn test_unknown_tag() {
    let err = des(b"\x05bogus\x00").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownTag);
    match err {
        CodecError::UnknownTag { tag, offset } => {
            assert_eq!(tag, "bogus");
            assert_eq!(offset, 0);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_unknown_tag_nested_reports_unit_offset() {
    // list payload starts at 6; the element frame prefix is one byte.
    let blob = b"\x04list\x08\x07\x05bogus\x00";
    match des(blob).unwrap_err() {
        CodecError::UnknownTag { offset, .. } => assert_eq!(offset, 7),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_unregistered_variant_on_encode() {
    let registry = Registry::builder()
        .register(ValueKind::Sequence)
        .build()
        .unwrap();
    let codec = Codec::builder().registry(registry.into()).build();

    let err = codec
        .ser(&Value::Sequence(vec![Value::from("x")]))
        .unwrap_err();
    assert!(matches!(err, CodecError::UnknownVariant(ValueKind::Text)));
    assert_eq!(err.kind(), ErrorKind::UnknownVariant);
}

#[test]
fn test_mapping_without_bytes_tag_reports_mapping() {
    let registry = Registry::builder()
        .register(ValueKind::Mapping)
        .register(ValueKind::Int)
        .build()
        .unwrap();
    let codec = Codec::builder().registry(registry.into()).build();

    let err = codec
        .ser(&Value::mapping([(Value::Int(1), Value::Int(2))]))
        .unwrap_err();
    assert!(matches!(err, CodecError::UnknownVariant(ValueKind::Mapping)));

    // An empty mapping writes no entries and needs no wrapper tag.
    assert_eq!(codec.ser(&Value::mapping([])).unwrap(), b"\x04dict\x00");
}

#[test]
fn test_invalid_utf8_text() {
    let err = des(b"\x03str\x02\xC3\x28").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TextDecodeError);
    assert_eq!(err.offset(), Some(5));
}

#[test]
fn test_invalid_float_literal() {
    let err = des(b"\x05float\x03xyz").unwrap_err();
    assert!(matches!(err, CodecError::InvalidFloat { offset: 7, .. }));
}

#[test]
fn test_overflowing_float_literal() {
    let literal = b"0x1.fffffffffffff8p+1023";
    let mut blob = b"\x05float".to_vec();
    blob.push(literal.len() as u8);
    blob.extend_from_slice(literal);
    let err = des(&blob).unwrap_err();
    assert!(matches!(err, CodecError::InvalidFloat { offset: 7, .. }));

    // The explicit spelling still decodes.
    assert_eq!(des(b"\x05float\x03inf").unwrap(), Value::float(f64::INFINITY));
}

#[test]
fn test_complex_without_separator() {
    let err = des(b"\x07complex\x03inf").unwrap_err();
    assert!(matches!(
        err,
        CodecError::MalformedInput {
            reason: constants::ERR_COMPLEX_SEPARATOR,
            ..
        }
    ));
}

#[test]
fn test_mapping_entry_wrong_arity() {
    // bytes-wrapped entry holding a single element
    let blob = b"\x04dict\x0F\x0E\x05bytes\x07\x06\x03int\x01\x01";
    assert!(matches!(
        des(blob),
        Err(CodecError::MalformedInput {
            reason: constants::ERR_MAPPING_ENTRY,
            ..
        })
    ));
}

// ============================================================================
// SPECIAL VALUES
// ============================================================================

#[test]
fn test_float_special_values() {
    for f in [f64::INFINITY, f64::NEG_INFINITY, 0.0, -0.0, f64::MIN_POSITIVE, 5e-324] {
        let decoded = des(&ser(&Value::float(f)).unwrap()).unwrap();
        match decoded {
            Value::Float(got) => assert_eq!(got.get().to_bits(), f.to_bits()),
            other => panic!("unexpected value: {other:?}"),
        }
    }

    match des(&ser(&Value::float(f64::NAN)).unwrap()).unwrap() {
        Value::Float(got) => assert!(got.get().is_nan()),
        other => panic!("unexpected value: {other:?}"),
    }
}

#[test]
fn test_signed_int_extremes() {
    for n in [i64::MIN, i64::MIN + 1, -1, 0, 1, i64::MAX] {
        assert_eq!(
            des(&ser(&Value::SignedInt(n)).unwrap()).unwrap(),
            Value::SignedInt(n)
        );
    }
}

#[test]
fn test_signed_int_out_of_range() {
    // magnitude 2^63 with a non-negative sign does not fit in i64
    let mut payload = vec![0xFF];
    payload.extend(blobwire::core::vlq::encode(1 << 63));
    let mut blob = b"\x04sint".to_vec();
    blob.push(payload.len() as u8);
    blob.extend(payload);
    assert!(matches!(
        des(&blob),
        Err(CodecError::MalformedInput {
            reason: constants::ERR_INT_RANGE,
            ..
        })
    ));
}

#[test]
fn test_large_bytes_payload() {
    let big = Value::Bytes(vec![0xAB; 1024 * 1024]);
    let encoded = ser(&big).unwrap();
    assert_eq!(des(&encoded).unwrap(), big);
}

// ============================================================================
// LIMITS
// ============================================================================

#[test]
fn test_depth_limit_boundary() {
    let codec = Codec::builder().max_depth(8).build();
    let at_limit = nested(8);
    let encoded = codec.ser(&at_limit).unwrap();
    assert_eq!(codec.des(&encoded).unwrap(), at_limit);

    assert!(matches!(
        codec.ser(&nested(9)),
        Err(CodecError::DepthLimitExceeded { limit: 8 })
    ));

    // Deeper input produced by a more permissive peer
    let deep = Codec::new().ser(&nested(9)).unwrap();
    assert!(matches!(
        codec.des(&deep),
        Err(CodecError::DepthLimitExceeded { limit: 8 })
    ));
}

#[test]
fn test_default_depth_limit_stops_hostile_nesting() {
    let hostile = Codec::builder()
        .max_depth(200)
        .build()
        .ser(&nested(200))
        .unwrap();
    let err = des(&hostile).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Limit);
}

#[test]
fn test_deepest_accepted_config_fits_small_stack() {
    let config = CodecConfig::default_with_overrides(|c| c.limits.max_depth = MAX_SAFE_DEPTH);
    let codec = Codec::from_config(&config).unwrap();

    // 2 MiB matches the default stack of tokio workers and test threads.
    let worker = std::thread::Builder::new()
        .stack_size(2 << 20)
        .spawn(move || {
            let deepest = nested(MAX_SAFE_DEPTH);
            let encoded = codec.ser(&deepest).unwrap();
            assert_eq!(codec.des(&encoded).unwrap(), deepest);

            let too_deep = Codec::builder()
                .max_depth(MAX_SAFE_DEPTH + 1)
                .build()
                .ser(&nested(MAX_SAFE_DEPTH + 1))
                .unwrap();
            assert!(matches!(
                codec.des(&too_deep),
                Err(CodecError::DepthLimitExceeded { limit }) if limit == MAX_SAFE_DEPTH
            ));
        })
        .unwrap();
    worker.join().unwrap();

    let beyond = CodecConfig::default_with_overrides(|c| c.limits.max_depth = MAX_SAFE_DEPTH + 1);
    assert!(Codec::from_config(&beyond).is_err());
}

#[test]
fn test_input_size_limit() {
    let codec = Codec::builder().max_input_size(32).build();
    let small = codec.ser(&Value::from("fits")).unwrap();
    assert!(codec.des(&small).is_ok());

    let err = codec.ser(&Value::Bytes(vec![0; 64])).unwrap_err();
    assert!(matches!(err, CodecError::InputTooLarge { limit: 32, .. }));

    let big = Codec::new().ser(&Value::Bytes(vec![0; 64])).unwrap();
    assert!(matches!(
        codec.des(&big),
        Err(CodecError::InputTooLarge { limit: 32, .. })
    ));
}

// ============================================================================
// PREFIX DECODING
// ============================================================================

#[test]
fn test_des_all_concatenated_units() {
    let values = vec![Value::Int(1), Value::from("two"), Value::Bool(true)];
    let mut blob = Vec::new();
    for value in &values {
        blob.extend(ser(value).unwrap());
    }
    assert_eq!(Codec::new().des_all(&blob).unwrap(), values);
}

#[test]
fn test_des_all_reports_absolute_offset() {
    let mut blob = ser(&Value::Int(1)).unwrap();
    let second_start = blob.len();
    blob.extend_from_slice(b"\x05bogus\x00");
    match Codec::new().des_all(&blob).unwrap_err() {
        CodecError::UnknownTag { offset, .. } => assert_eq!(offset, second_start),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_unit_extent_progression() {
    let codec = Codec::new();
    let encoded = codec.ser(&Value::from("hello")).unwrap();
    assert_eq!(
        codec.unit_extent(&encoded).unwrap(),
        UnitExtent::Complete(encoded.len())
    );
    assert!(matches!(
        codec.unit_extent(&[]).unwrap(),
        UnitExtent::Incomplete { at_least: 1 }
    ));
    assert_eq!(codec.encoded_len(&encoded[..encoded.len() - 1]).unwrap(), None);
}
