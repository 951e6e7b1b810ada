// Build events and per-build statistics.
//
// The scheduler reports what it did as `BuildEvent`s rather than logging
// alone: hosts show them in a message log, and tests assert on them. Each
// event carries the scheduler's tick counter (ticks since the build
// started) and the structure kind it belongs to.
//
// `PlacementOutcome` classifies a single cell edit; `BuildStats` tallies
// outcomes over a whole build and is reported in `BuildCompleted`.
//
// See also: `scheduler.rs` which emits row and phase events,
// `furniture.rs` which emits furniture events, `workshop.rs` which merges
// the streams of all schedulers.

use crate::scheduler::BuildPhase;
use crate::types::{FurnitureKind, GridCoord, Operation, StructureKind};
use serde::{Deserialize, Serialize};

/// Result of one read-then-act cell edit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlacementOutcome {
    Placed,
    /// A clear found the cell already empty. Nothing to do.
    AlreadyClear,
    /// A placement found the cell (or a footprint tile) already filled.
    /// Skipped without calling the mutator.
    Occupied,
    /// The mutator returned `false`.
    Rejected,
    /// The grid disagrees with the planner about bounds.
    OutOfBounds,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildStats {
    pub placed: u32,
    pub already_clear: u32,
    pub occupied: u32,
    pub rejected: u32,
    pub out_of_bounds: u32,
}

impl BuildStats {
    pub fn record(&mut self, outcome: PlacementOutcome) {
        match outcome {
            PlacementOutcome::Placed => self.placed += 1,
            PlacementOutcome::AlreadyClear => self.already_clear += 1,
            PlacementOutcome::Occupied => self.occupied += 1,
            PlacementOutcome::Rejected => self.rejected += 1,
            PlacementOutcome::OutOfBounds => self.out_of_bounds += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.placed + self.already_clear + self.occupied + self.rejected + self.out_of_bounds
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildEvent {
    pub tick: u64,
    pub structure: StructureKind,
    pub kind: BuildEventKind,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildEventKind {
    BuildStarted {
        anchor: GridCoord,
        rows: usize,
    },
    PhaseChanged {
        from: BuildPhase,
        to: BuildPhase,
    },
    /// One row applied. `y` is the row's world y.
    RowProcessed {
        y: i32,
        placed: u32,
        rejected: u32,
    },
    /// The grid refused an edit. The cell is skipped, not retried.
    PlacementRejected {
        coord: GridCoord,
        operation: Operation,
    },
    FurniturePlaced {
        origin: GridCoord,
        furniture: FurnitureKind,
    },
    /// A furniture footprint was out of bounds or not clear.
    FurnitureSkipped {
        origin: GridCoord,
        furniture: FurnitureKind,
    },
    BuildCompleted {
        stats: BuildStats,
    },
    BuildCancelled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_tally_every_outcome() {
        let mut stats = BuildStats::default();
        stats.record(PlacementOutcome::Placed);
        stats.record(PlacementOutcome::Placed);
        stats.record(PlacementOutcome::AlreadyClear);
        stats.record(PlacementOutcome::Occupied);
        stats.record(PlacementOutcome::Rejected);
        stats.record(PlacementOutcome::OutOfBounds);
        assert_eq!(stats.placed, 2);
        assert_eq!(stats.already_clear, 1);
        assert_eq!(stats.occupied, 1);
        assert_eq!(stats.total(), 6);
    }

    #[test]
    fn events_serialize() {
        let event = BuildEvent {
            tick: 12,
            structure: StructureKind::Jail,
            kind: BuildEventKind::RowProcessed {
                y: 198,
                placed: 6,
                rejected: 0,
            },
        };
        let json = serde_json::to_string(&event).unwrap();
        let restored: BuildEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, restored);
    }
}
