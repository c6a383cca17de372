//! Property-based tests using proptest
//!
//! These check codec invariants over randomly generated values and inputs.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use blobwire::core::{framing, vlq};
use blobwire::{des, ser, Codec, Value};
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

fn finite_or_infinite() -> impl Strategy<Value = f64> {
    any::<f64>().prop_filter("NaN decodes to the canonical NaN", |f| !f.is_nan())
}

fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        prop::collection::vec(any::<u8>(), 0..64).prop_map(Value::Bytes),
        ".{0,32}".prop_map(Value::Text),
        any::<bool>().prop_map(Value::Bool),
        any::<u64>().prop_map(Value::Int),
        any::<i64>().prop_map(Value::SignedInt),
        finite_or_infinite().prop_map(Value::float),
        (finite_or_infinite(), finite_or_infinite()).prop_map(|(re, im)| Value::complex(re, im)),
    ]
}

fn value() -> impl Strategy<Value = Value> {
    scalar().prop_recursive(4, 64, 8, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..8).prop_map(Value::Sequence),
            prop::collection::vec(inner.clone(), 0..8).prop_map(Value::Tuple),
            prop::collection::btree_set(inner.clone(), 0..8).prop_map(Value::Set),
            prop::collection::btree_set(inner.clone(), 0..8).prop_map(Value::FrozenSet),
            prop::collection::btree_map(inner.clone(), inner, 0..8).prop_map(Value::Mapping),
        ]
    })
}

// Property: VLQ decode inverts encode and reports the exact length
proptest! {
    #[test]
    fn prop_vlq_roundtrip(n in any::<u64>()) {
        let encoded = vlq::encode(n);
        prop_assert_eq!(encoded.len(), vlq::encoded_len(n));
        prop_assert_eq!(vlq::decode(&encoded).unwrap(), (n, encoded.len()));
    }
}

// Property: decoding ignores whatever follows the VLQ
proptest! {
    #[test]
    fn prop_vlq_ignores_suffix(n in any::<u64>(), suffix in prop::collection::vec(any::<u8>(), 0..16)) {
        let mut encoded = vlq::encode(n);
        let len = encoded.len();
        encoded.extend_from_slice(&suffix);
        prop_assert_eq!(vlq::decode(&encoded).unwrap(), (n, len));
        prop_assert_eq!(vlq::skip(&encoded).unwrap(), &suffix[..]);
    }
}

// Property: frames concatenate and peel apart again
proptest! {
    #[test]
    fn prop_frames_compose(
        payloads in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..300), 0..6)
    ) {
        let mut blob = Vec::new();
        for payload in &payloads {
            blob.extend(framing::pascalify(payload));
        }

        let mut rest = blob.as_slice();
        for payload in &payloads {
            let (peeled, tail) = framing::peel(rest).unwrap();
            prop_assert_eq!(peeled, payload.as_slice());
            rest = tail;
        }
        prop_assert!(rest.is_empty());
    }
}

// Property: any value survives encode then decode
proptest! {
    #[test]
    fn prop_value_roundtrip(value in value()) {
        let encoded = ser(&value).expect("encode");
        let decoded = des(&encoded).expect("decode");
        prop_assert_eq!(decoded, value);
    }
}

// Property: the codec reports exactly the bytes a unit occupies
proptest! {
    #[test]
    fn prop_des_prefix_consumes_exact_unit(
        value in value(),
        trailing in prop::collection::vec(any::<u8>(), 0..16)
    ) {
        let codec = Codec::new();
        let mut blob = codec.ser(&value).unwrap();
        let unit_len = blob.len();
        blob.extend_from_slice(&trailing);

        let (decoded, consumed) = codec.des_prefix(&blob).unwrap();
        prop_assert_eq!(consumed, unit_len);
        prop_assert_eq!(codec.encoded_len(&blob).unwrap(), Some(unit_len));
        prop_assert_eq!(decoded, value);
    }
}

// Property: equal sets and mappings encode identically whatever the build order
proptest! {
    #[test]
    fn prop_unordered_containers_deterministic(items in prop::collection::vec(any::<u64>(), 0..32)) {
        let forward: BTreeSet<Value> = items.iter().copied().map(Value::Int).collect();
        let backward: BTreeSet<Value> = items.iter().rev().copied().map(Value::Int).collect();
        prop_assert_eq!(ser(&Value::Set(forward)).unwrap(), ser(&Value::Set(backward)).unwrap());

        let forward: BTreeMap<Value, Value> = items
            .iter()
            .map(|&n| (Value::Int(n), Value::Bool(n % 2 == 0)))
            .collect();
        let backward: BTreeMap<Value, Value> = items
            .iter()
            .rev()
            .map(|&n| (Value::Int(n), Value::Bool(n % 2 == 0)))
            .collect();
        prop_assert_eq!(
            ser(&Value::Mapping(forward)).unwrap(),
            ser(&Value::Mapping(backward)).unwrap()
        );
    }
}

// Property: arbitrary input never panics the decoder
proptest! {
    #[test]
    fn prop_des_never_panics(data in prop::collection::vec(any::<u8>(), 0..512)) {
        let _ = des(&data);
        let _ = Codec::new().des_all(&data);
        let _ = Codec::new().unit_extent(&data);
    }
}

// Property: single-byte corruption is either rejected or decodes to some value
proptest! {
    #[test]
    fn prop_corruption_does_not_panic(value in value(), index in any::<prop::sample::Index>(), byte in any::<u8>()) {
        let mut encoded = ser(&value).unwrap();
        let at = index.index(encoded.len());
        encoded[at] = byte;
        let _ = des(&encoded);
    }
}
