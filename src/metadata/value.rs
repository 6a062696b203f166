use std::fmt;
use std::sync::Arc;

use crate::extent::translator::TranslatorHandle;
use crate::extent::Region;

/// Tagged union of metadata values.
///
/// `Translator` carries a shared strategy object and compares by identity;
/// everything else compares by value.
#[derive(Clone)]
pub enum MetaValue {
    Integer(i64),
    IntegerVec(Vec<i64>),
    Double(f64),
    DoubleVec(Vec<f64>),
    Boolean(bool),
    Region(Region),
    Translator(TranslatorHandle),
}

impl MetaValue {
    pub fn kind_name(&self) -> &'static str {
        match self {
            MetaValue::Integer(_) => "Integer",
            MetaValue::IntegerVec(_) => "IntegerVec",
            MetaValue::Double(_) => "Double",
            MetaValue::DoubleVec(_) => "DoubleVec",
            MetaValue::Boolean(_) => "Boolean",
            MetaValue::Region(_) => "Region",
            MetaValue::Translator(_) => "Translator",
        }
    }
}

impl fmt::Debug for MetaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetaValue::Integer(v) => write!(f, "Integer({v})"),
            MetaValue::IntegerVec(v) => write!(f, "IntegerVec({v:?})"),
            MetaValue::Double(v) => write!(f, "Double({v})"),
            MetaValue::DoubleVec(v) => write!(f, "DoubleVec({v:?})"),
            MetaValue::Boolean(v) => write!(f, "Boolean({v})"),
            MetaValue::Region(v) => write!(f, "Region({v:?})"),
            MetaValue::Translator(_) => f.write_str("Translator(..)"),
        }
    }
}

impl PartialEq for MetaValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (MetaValue::Integer(a), MetaValue::Integer(b)) => a == b,
            (MetaValue::IntegerVec(a), MetaValue::IntegerVec(b)) => a == b,
            (MetaValue::Double(a), MetaValue::Double(b)) => a == b,
            (MetaValue::DoubleVec(a), MetaValue::DoubleVec(b)) => a == b,
            (MetaValue::Boolean(a), MetaValue::Boolean(b)) => a == b,
            (MetaValue::Region(a), MetaValue::Region(b)) => a == b,
            (MetaValue::Translator(a), MetaValue::Translator(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<i64> for MetaValue {
    fn from(v: i64) -> Self {
        MetaValue::Integer(v)
    }
}

impl From<f64> for MetaValue {
    fn from(v: f64) -> Self {
        MetaValue::Double(v)
    }
}

impl From<bool> for MetaValue {
    fn from(v: bool) -> Self {
        MetaValue::Boolean(v)
    }
}

impl From<Vec<f64>> for MetaValue {
    fn from(v: Vec<f64>) -> Self {
        MetaValue::DoubleVec(v)
    }
}

impl From<Vec<i64>> for MetaValue {
    fn from(v: Vec<i64>) -> Self {
        MetaValue::IntegerVec(v)
    }
}

impl From<Region> for MetaValue {
    fn from(v: Region) -> Self {
        MetaValue::Region(v)
    }
}

impl From<TranslatorHandle> for MetaValue {
    fn from(v: TranslatorHandle) -> Self {
        MetaValue::Translator(v)
    }
}
