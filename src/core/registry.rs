//! # Variant Registry
//!
//! Read-only table binding each [`ValueKind`] to its wire tag and payload
//! codec. Encoding looks entries up by kind, decoding by tag name.
//!
//! The built-in tables are constructed once and shared; custom tables come
//! from [`RegistryBuilder`] and are immutable once built.

use crate::core::engine::{DecodeCtx, EncodeCtx};
use crate::core::value::{Value, ValueKind};
use crate::core::variants;
use crate::error::{CodecError, Result};
use once_cell::sync::Lazy;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub type SerializeFn = fn(&Value, &EncodeCtx<'_>) -> Result<Vec<u8>>;
pub type DeserializeFn = fn(&[u8], &DecodeCtx<'_>) -> Result<Value>;

static BUILTIN: Lazy<Arc<Registry>> = Lazy::new(|| {
    let mut builder = Registry::builder();
    for kind in ValueKind::ALL {
        builder = builder.register(kind);
    }
    Arc::new(builder.finish())
});

static LEGACY: Lazy<Arc<Registry>> = Lazy::new(|| {
    let mut builder = Registry::builder();
    for kind in LEGACY_KINDS {
        builder = builder.register(kind);
    }
    Arc::new(builder.finish())
});

/// Kinds understood by the nine-tag legacy wire.
const LEGACY_KINDS: [ValueKind; 9] = [
    ValueKind::Bytes,
    ValueKind::Text,
    ValueKind::Int,
    ValueKind::Bool,
    ValueKind::Sequence,
    ValueKind::Tuple,
    ValueKind::Set,
    ValueKind::FrozenSet,
    ValueKind::Mapping,
];

/// Tag a kind is registered under unless renamed.
pub fn default_tag(kind: ValueKind) -> &'static str {
    match kind {
        ValueKind::Bytes => "bytes",
        ValueKind::Text => "str",
        ValueKind::Bool => "bool",
        ValueKind::Int => "int",
        ValueKind::SignedInt => "sint",
        ValueKind::Float => "float",
        ValueKind::Complex => "complex",
        ValueKind::Sequence => "list",
        ValueKind::Tuple => "tuple",
        ValueKind::Set => "set",
        ValueKind::FrozenSet => "frozenset",
        ValueKind::Mapping => "dict",
    }
}

/// One registered variant.
#[derive(Clone)]
pub struct Entry {
    pub kind: ValueKind,
    pub tag: Cow<'static, str>,
    pub serialize: SerializeFn,
    pub deserialize: DeserializeFn,
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("kind", &self.kind)
            .field("tag", &self.tag)
            .finish()
    }
}

#[derive(Debug)]
pub struct Registry {
    entries: Vec<Entry>,
    by_kind: [Option<usize>; ValueKind::ALL.len()],
    by_tag: HashMap<Cow<'static, str>, usize>,
}

impl Registry {
    /// All variants under their default tags.
    pub fn builtin() -> Arc<Registry> {
        Arc::clone(&BUILTIN)
    }

    /// The nine-tag wire: no floats, complex numbers or signed integers.
    pub fn legacy() -> Arc<Registry> {
        Arc::clone(&LEGACY)
    }

    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Look up the entry used to serialize values of `kind`.
    pub fn for_kind(&self, kind: ValueKind) -> Result<&Entry> {
        self.by_kind[kind.index()]
            .map(|i| &self.entries[i])
            .ok_or(CodecError::UnknownVariant(kind))
    }

    /// Look up the entry used to deserialize payloads tagged `tag`.
    pub fn for_tag(&self, tag: &str) -> Option<&Entry> {
        self.by_tag.get(tag).map(|&i| &self.entries[i])
    }

    /// Tag values of `kind` are written under.
    pub fn tag(&self, kind: ValueKind) -> Result<&str> {
        self.for_kind(kind).map(|entry| entry.tag.as_ref())
    }

    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Builds a [`Registry`]. Registering a kind twice keeps the last tag.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    tags: Vec<(ValueKind, Cow<'static, str>)>,
}

impl RegistryBuilder {
    /// Register `kind` under its default tag.
    pub fn register(self, kind: ValueKind) -> Self {
        self.register_as(kind, default_tag(kind))
    }

    /// Register `kind` under a custom tag.
    pub fn register_as(mut self, kind: ValueKind, tag: impl Into<Cow<'static, str>>) -> Self {
        let tag = tag.into();
        self.tags.retain(|(k, _)| *k != kind);
        self.tags.push((kind, tag));
        self
    }

    /// Build the registry, rejecting empty or shared tags.
    pub fn build(self) -> Result<Registry> {
        let mut seen: HashMap<&str, ValueKind> = HashMap::new();
        for (kind, tag) in &self.tags {
            if tag.is_empty() {
                return Err(CodecError::ConfigError(format!(
                    "Empty tag for variant '{kind}'"
                )));
            }
            if let Some(other) = seen.insert(tag.as_ref(), *kind) {
                return Err(CodecError::ConfigError(format!(
                    "Tag '{tag}' registered for both '{other}' and '{kind}'"
                )));
            }
        }
        Ok(self.finish())
    }

    fn finish(self) -> Registry {
        let mut registry = Registry {
            entries: Vec::with_capacity(self.tags.len()),
            by_kind: [None; ValueKind::ALL.len()],
            by_tag: HashMap::with_capacity(self.tags.len()),
        };
        for (kind, tag) in self.tags {
            let index = registry.entries.len();
            registry.by_kind[kind.index()] = Some(index);
            registry.by_tag.insert(tag.clone(), index);
            registry.entries.push(Entry {
                kind,
                tag,
                serialize: variants::serializer(kind),
                deserialize: variants::deserializer(kind),
            });
        }
        registry
    }
}
