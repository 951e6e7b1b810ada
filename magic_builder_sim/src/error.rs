// Error types for the builder.
//
// Only whole-build failures are errors. Per-cell failures (an occupied cell,
// a placement the grid refuses) never abort a build; they degrade to
// `BuildEventKind::PlacementRejected` events and counters in `BuildStats`
// (see `event.rs`).
//
// See also: `scheduler.rs` and `workshop.rs` which return `BuildError`,
// `config.rs` which returns `ConfigError`.

use crate::types::{GridCoord, StructureKind};

/// Why a build could not be started.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    /// The scheduler for this kind is not idle. Its state is left untouched.
    #[error("a {kind:?} build is already in progress")]
    AlreadyInProgress { kind: StructureKind },

    /// The requested footprint intersects a build that is still running.
    #[error("{kind:?} footprint overlaps an in-flight build at {coord}")]
    Overlap {
        kind: StructureKind,
        coord: GridCoord,
    },

    /// The config carries no `StructureSpec` for this kind.
    #[error("no structure spec configured for {0:?}")]
    UnknownStructure(StructureKind),
}

/// Why a `BuilderConfig` could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
