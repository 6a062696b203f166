//! Built-in node set.
//!
//! Small processors exercising every corner of the protocol: sources that
//! declare capabilities, spatially decomposing filters that negotiate
//! dilated input regions, multi-pass nodes driving the continuation loop,
//! and a composite-aware probe. Domain-heavy algorithms (real geometry and
//! image processing) live outside this crate and consume the same
//! contract.

pub mod merge;
pub mod source;
pub mod time;
pub mod transform;

pub use merge::LeafProbe;
pub use source::{CompositeSource, RampSource};
pub use time::TimeSeriesCollector;
pub use transform::{BoxSmooth, PassThrough, SeparableSmooth};
