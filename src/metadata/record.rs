use std::collections::HashMap;

use super::{MetaKey, MetaValue};
use crate::error::NodeError;
use crate::extent::translator::TranslatorHandle;
use crate::extent::Region;

/// Typed key/value bag attached to a port.
///
/// Typed getters return `Ok(None)` for an unset key and an error for a
/// kind mismatch; `require_*` getters additionally turn "unset" into
/// [`NodeError::MissingMetadata`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataRecord {
    entries: HashMap<MetaKey, MetaValue>,
}

macro_rules! typed_getter {
    ($get:ident, $require:ident, $variant:ident, $ty:ty, $expected:literal) => {
        pub fn $get(&self, key: MetaKey) -> Result<Option<$ty>, NodeError> {
            match self.entries.get(&key) {
                None => Ok(None),
                Some(MetaValue::$variant(v)) => Ok(Some(v.clone())),
                Some(other) => Err(NodeError::ValueKind {
                    key,
                    expected: $expected,
                    found: other.kind_name(),
                }),
            }
        }

        pub fn $require(&self, key: MetaKey) -> Result<$ty, NodeError> {
            self.$get(key)?.ok_or(NodeError::MissingMetadata(key))
        }
    };
}

impl MetadataRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has(&self, key: MetaKey) -> bool {
        self.entries.contains_key(&key)
    }

    pub fn get(&self, key: MetaKey) -> Option<&MetaValue> {
        self.entries.get(&key)
    }

    pub fn set(&mut self, key: MetaKey, value: impl Into<MetaValue>) {
        self.entries.insert(key, value.into());
    }

    pub fn remove(&mut self, key: MetaKey) -> Option<MetaValue> {
        self.entries.remove(&key)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy `key` from `other`, replacing any current value. No-op when
    /// `other` has the key unset.
    pub fn forward(&mut self, other: &MetadataRecord, key: MetaKey) {
        if let Some(v) = other.entries.get(&key) {
            self.entries.insert(key, v.clone());
        }
    }

    typed_getter!(integer, require_integer, Integer, i64, "Integer");
    typed_getter!(integer_vec, require_integer_vec, IntegerVec, Vec<i64>, "IntegerVec");
    typed_getter!(double, require_double, Double, f64, "Double");
    typed_getter!(double_vec, require_double_vec, DoubleVec, Vec<f64>, "DoubleVec");
    typed_getter!(boolean, require_boolean, Boolean, bool, "Boolean");
    typed_getter!(region, require_region, Region, Region, "Region");
    typed_getter!(translator, require_translator, Translator, TranslatorHandle, "Translator");

    /// `Boolean` keys read as plain flags: unset counts as `false`.
    pub fn flag(&self, key: MetaKey) -> bool {
        matches!(self.entries.get(&key), Some(MetaValue::Boolean(true)))
    }
}
