//! Typed key/value metadata records exchanged between ports.
//!
//! The record is the wire format of the negotiation protocol. Keys form a
//! closed vocabulary ([`MetaKey`]); values are a tagged union
//! ([`MetaValue`]). Looking a key up with the wrong expected kind is an
//! error at the access boundary, never a silent zero — absence of a key
//! means "unset".
//!
//! Two record populations exist at runtime:
//! - *capability* records, cached per output port on node state and kept
//!   until the owning node is marked modified (`WholeRegion`, `TimeValues`,
//!   `TimeRange`, `RegionTranslator`);
//! - *request* records, created fresh for every update and discarded when
//!   it completes (`UpdateRegion`, `UpdatePiece`, `UpdateNumPieces`,
//!   `UpdateGhostLevels`, `UpdateTimeValue`, `ExactRegion`,
//!   `ContinueExecuting`).

pub mod key;
pub mod record;
pub mod value;

pub use key::MetaKey;
pub use record::MetadataRecord;
pub use value::MetaValue;
