//! Dataset payloads moved between ports.
//!
//! A dataset is either a *leaf* — a structured grid ([`StructuredData`]) or
//! a table ([`TableData`]) — or a *composite* container ([`CompositeData`])
//! aggregating leaves in a flat or leveled layout. Consumers receive
//! datasets as `Arc<Dataset>` read-only views; mutating a received input in
//! place is disallowed because the producing port may keep the reference
//! cached for sibling consumers and later requests.

pub mod composite;
pub mod structured;
pub mod table;

use serde::{Deserialize, Serialize};

pub use composite::{CompositeData, LeafPath, LeafRef};
pub use structured::StructuredData;
pub use table::TableData;

/// Dataset kind tags used by port declarations and wiring validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DatasetKind {
    Structured,
    Table,
    Composite,
    /// Wildcard used only in port declarations; no dataset has this kind.
    Any,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Dataset {
    Structured(StructuredData),
    Table(TableData),
    Composite(CompositeData),
}

impl Dataset {
    pub fn kind(&self) -> DatasetKind {
        match self {
            Dataset::Structured(_) => DatasetKind::Structured,
            Dataset::Table(_) => DatasetKind::Table,
            Dataset::Composite(_) => DatasetKind::Composite,
        }
    }

    pub fn as_structured(&self) -> Option<&StructuredData> {
        match self {
            Dataset::Structured(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&TableData> {
        match self {
            Dataset::Table(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_composite(&self) -> Option<&CompositeData> {
        match self {
            Dataset::Composite(d) => Some(d),
            _ => None,
        }
    }
}

impl From<StructuredData> for Dataset {
    fn from(d: StructuredData) -> Self {
        Dataset::Structured(d)
    }
}

impl From<TableData> for Dataset {
    fn from(d: TableData) -> Self {
        Dataset::Table(d)
    }
}

impl From<CompositeData> for Dataset {
    fn from(d: CompositeData) -> Self {
        Dataset::Composite(d)
    }
}
