// Commands a host sends to the workshop.
//
// The item-use adapter (or a test) never touches schedulers directly: it
// constructs a `BuildCommand` stamped with the workshop tick it applies at,
// and `Workshop::step` or `Workshop::apply` executes it. Current actions:
// - `StartBuild` - plan a structure at an anchor and arm its scheduler.
// - `CancelBuild` - drop the in-flight build of a kind.
//
// See also: `workshop.rs` which dispatches these.

use crate::types::{GridCoord, Orientation, StructureKind};
use serde::{Deserialize, Serialize};

/// An action targeting a specific workshop tick.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildCommand {
    pub tick: u64,
    pub action: BuildAction,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildAction {
    /// `orientation` is the user's facing at trigger time; it is frozen into
    /// the plan.
    StartBuild {
        kind: StructureKind,
        anchor: GridCoord,
        orientation: Orientation,
    },
    CancelBuild {
        kind: StructureKind,
    },
}

impl BuildCommand {
    pub fn start(
        tick: u64,
        kind: StructureKind,
        anchor: GridCoord,
        orientation: Orientation,
    ) -> Self {
        Self {
            tick,
            action: BuildAction::StartBuild {
                kind,
                anchor,
                orientation,
            },
        }
    }

    pub fn cancel(tick: u64, kind: StructureKind) -> Self {
        Self {
            tick,
            action: BuildAction::CancelBuild { kind },
        }
    }
}
