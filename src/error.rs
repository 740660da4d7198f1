//! Error types for skirt setup operations.
//!
//! Stepping never fails; only configuration checks and bone binding do.

use crate::skeleton::BoneId;
use thiserror::Error;

/// Errors that can occur while setting up a skirt simulation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkirtError {
    /// The configuration has no rings to build particles from.
    #[error("skirt needs at least one ring")]
    NoRings,
    /// Fewer segments than the topology supports.
    #[error("skirt needs at least 4 segments (got {segments})")]
    TooFewSegments { segments: usize },
    /// A bone id was not found in the skeleton.
    #[error("bone {0} does not exist in the skeleton")]
    UnknownBone(BoneId),
    /// An operation needed the particle grid before `initialize` ran.
    #[error("skirt simulation is not initialized")]
    NotInitialized,
}
