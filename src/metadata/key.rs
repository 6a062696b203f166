use std::fmt;

use serde::{Deserialize, Serialize};

/// Closed vocabulary of metadata keys.
///
/// New keys are added here, never invented ad hoc at runtime; unknown keys
/// are unrepresentable by construction. The documented meaning of each key
/// is stable across versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetaKey {
    /// Full index-space extent a port can produce (`Region` value).
    WholeRegion,
    /// Discrete time values the producer can supply (`DoubleVec`).
    TimeValues,
    /// `[min, max]` of `TimeValues` (`DoubleVec` of length 2).
    TimeRange,
    /// Piece-to-extent strategy for the port (`Translator`).
    RegionTranslator,
    /// Region assigned to a port for the current request (`Region`).
    UpdateRegion,
    /// Piece index of the current streamed request (`Integer`).
    UpdatePiece,
    /// Piece count of the current streamed request (`Integer`).
    UpdateNumPieces,
    /// Ghost levels of the current streamed request (`Integer`).
    UpdateGhostLevels,
    /// Time value the current request targets (`Double`).
    UpdateTimeValue,
    /// Crop the returned output to the requested region (`Boolean`).
    ExactRegion,
    /// Ask the executive for another negotiation/computation pass
    /// (`Boolean`).
    ContinueExecuting,
}

impl MetaKey {
    pub fn name(&self) -> &'static str {
        match self {
            MetaKey::WholeRegion => "WHOLE_REGION",
            MetaKey::TimeValues => "TIME_VALUES",
            MetaKey::TimeRange => "TIME_RANGE",
            MetaKey::RegionTranslator => "REGION_TRANSLATOR",
            MetaKey::UpdateRegion => "UPDATE_REGION",
            MetaKey::UpdatePiece => "UPDATE_PIECE",
            MetaKey::UpdateNumPieces => "UPDATE_NUM_PIECES",
            MetaKey::UpdateGhostLevels => "UPDATE_GHOST_LEVELS",
            MetaKey::UpdateTimeValue => "UPDATE_TIME_VALUE",
            MetaKey::ExactRegion => "EXACT_REGION",
            MetaKey::ContinueExecuting => "CONTINUE_EXECUTING",
        }
    }

    /// Capability keys persist on node state between requests; the rest
    /// are request-scoped.
    pub fn is_capability(&self) -> bool {
        matches!(
            self,
            MetaKey::WholeRegion
                | MetaKey::TimeValues
                | MetaKey::TimeRange
                | MetaKey::RegionTranslator
        )
    }
}

impl fmt::Display for MetaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
