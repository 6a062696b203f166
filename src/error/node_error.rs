use thiserror::Error;

use crate::data::DatasetKind;
use crate::metadata::MetaKey;

/// Node-level errors, raised inside the three node callbacks.
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("Required metadata key not set: {0}")]
    MissingMetadata(MetaKey),
    #[error("Metadata key {key} holds {found}, expected {expected}")]
    ValueKind {
        key: MetaKey,
        expected: &'static str,
        found: &'static str,
    },
    #[error("No dataset supplied on input port {port}")]
    MissingInput { port: usize },
    #[error("Input port {port} received {found:?}, expected {expected:?}")]
    InputKind {
        port: usize,
        expected: DatasetKind,
        found: DatasetKind,
    },
    #[error("Invalid region: {0}")]
    InvalidRegion(String),
    #[error("Computation failed: {0}")]
    Compute(String),
}
