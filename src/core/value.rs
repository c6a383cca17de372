//! The closed set of values the codec understands.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::hash::{Hash, Hasher};

/// An `f64` compared and hashed by its bit pattern.
///
/// Values live inside sets and as mapping keys, so floats need a total order.
/// Two floats are equal exactly when their bits are, which makes `NaN` equal to
/// itself and keeps `0.0` and `-0.0` apart.
#[derive(Debug, Clone, Copy)]
pub struct Float64(pub f64);

impl Float64 {
    pub fn get(self) -> f64 {
        self.0
    }
}

impl PartialEq for Float64 {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for Float64 {}

impl PartialOrd for Float64 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Float64 {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Hash for Float64 {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl From<f64> for Float64 {
    fn from(value: f64) -> Self {
        Float64(value)
    }
}

/// A decoded or to-be-encoded value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Value {
    /// Raw bytes.
    Bytes(Vec<u8>),
    /// UTF-8 text.
    Text(String),
    Bool(bool),
    /// Non-negative integer, encoded as a bare VLQ.
    Int(u64),
    /// Signed integer, encoded as a sign byte followed by the magnitude.
    SignedInt(i64),
    Float(Float64),
    Complex { re: Float64, im: Float64 },
    /// Ordered, growable sequence.
    Sequence(Vec<Value>),
    /// Ordered, fixed-arity sequence.
    Tuple(Vec<Value>),
    Set(BTreeSet<Value>),
    FrozenSet(BTreeSet<Value>),
    Mapping(BTreeMap<Value, Value>),
}

/// Runtime kind of a [`Value`], used to select its serializer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ValueKind {
    Bytes,
    Text,
    Bool,
    Int,
    SignedInt,
    Float,
    Complex,
    Sequence,
    Tuple,
    Set,
    FrozenSet,
    Mapping,
}

impl ValueKind {
    pub const ALL: [ValueKind; 12] = [
        ValueKind::Bytes,
        ValueKind::Text,
        ValueKind::Bool,
        ValueKind::Int,
        ValueKind::SignedInt,
        ValueKind::Float,
        ValueKind::Complex,
        ValueKind::Sequence,
        ValueKind::Tuple,
        ValueKind::Set,
        ValueKind::FrozenSet,
        ValueKind::Mapping,
    ];

    /// Dense index, used by the registry's kind table.
    #[inline]
    pub(crate) fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Bytes => "bytes",
            ValueKind::Text => "text",
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::SignedInt => "signed_int",
            ValueKind::Float => "float",
            ValueKind::Complex => "complex",
            ValueKind::Sequence => "sequence",
            ValueKind::Tuple => "tuple",
            ValueKind::Set => "set",
            ValueKind::FrozenSet => "frozen_set",
            ValueKind::Mapping => "mapping",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Bytes(_) => ValueKind::Bytes,
            Value::Text(_) => ValueKind::Text,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::SignedInt(_) => ValueKind::SignedInt,
            Value::Float(_) => ValueKind::Float,
            Value::Complex { .. } => ValueKind::Complex,
            Value::Sequence(_) => ValueKind::Sequence,
            Value::Tuple(_) => ValueKind::Tuple,
            Value::Set(_) => ValueKind::Set,
            Value::FrozenSet(_) => ValueKind::FrozenSet,
            Value::Mapping(_) => ValueKind::Mapping,
        }
    }

    pub fn float(value: f64) -> Self {
        Value::Float(Float64(value))
    }

    pub fn complex(re: f64, im: f64) -> Self {
        Value::Complex {
            re: Float64(re),
            im: Float64(im),
        }
    }

    pub fn set<I: IntoIterator<Item = Value>>(items: I) -> Self {
        Value::Set(items.into_iter().collect())
    }

    pub fn frozen_set<I: IntoIterator<Item = Value>>(items: I) -> Self {
        Value::FrozenSet(items.into_iter().collect())
    }

    pub fn mapping<I: IntoIterator<Item = (Value, Value)>>(entries: I) -> Self {
        Value::Mapping(entries.into_iter().collect())
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Elements of a Sequence or Tuple.
    pub fn as_slice(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(items) | Value::Tuple(items) => Some(items),
            _ => None,
        }
    }

    /// Nesting depth: 0 for scalars, 1 + deepest child for containers.
    pub fn depth(&self) -> usize {
        let children = match self {
            Value::Sequence(items) | Value::Tuple(items) => {
                items.iter().map(Value::depth).max().unwrap_or(0)
            }
            Value::Set(items) | Value::FrozenSet(items) => {
                items.iter().map(Value::depth).max().unwrap_or(0)
            }
            Value::Mapping(entries) => entries
                .iter()
                .map(|(k, v)| k.depth().max(v.depth()))
                .max()
                .unwrap_or(0),
            _ => return 0,
        };
        children + 1
    }
}

impl From<&[u8]> for Value {
    fn from(value: &[u8]) -> Self {
        Value::Bytes(value.to_vec())
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Bytes(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Value::Int(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::SignedInt(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::float(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::Sequence(value)
    }
}

impl From<BTreeMap<Value, Value>> for Value {
    fn from(value: BTreeMap<Value, Value>) -> Self {
        Value::Mapping(value)
    }
}
