// Build scheduler: the phased state machine that spreads one build over
// many host ticks.
//
// Lifecycle: `Idle -> Digging -> Furnishing -> AwaitingSettle -> Done ->
// Idle`.
//
// - `start` arms the scheduler with a plan. It is rejected with
//   `AlreadyInProgress` unless idle, and has no grid side effects.
// - Every `tick` increments the build's tick counter. While digging, only
//   every `cadence_ticks`-th tick acts: it applies the current row (bottom
//   to top) with clears before placements and advances the cursor. Only
//   rows with row-stage cells are visited. After the top one the build moves
//   to `Furnishing`; a plan with no such rows starts there.
// - `Furnishing` lasts one tick: doors, platform fills, and furniture.
// - `AwaitingSettle` waits `settle_ticks` ticks with no grid effects. On
//   the last one the build enters `Done`, places light sources, reports
//   `BuildCompleted`, and resets to `Idle` within the same tick.
//
// The machine itself is the pure function `advance`, taking a `BuildState`
// by value and returning the next state plus the events produced.
// `BuildScheduler` is a thin owner around it. From `start` back to idle
// takes at most `BuilderConfig::tick_budget(rows)` ticks, `rows` being the
// job's action-row count.
//
// Every write goes through `apply_guarded` (fresh read, then act). Cells the
// grid refuses are skipped and reported as `PlacementRejected`; nothing is
// retried and nothing aborts the build.
//
// See also: `row_index.rs` for row order, `furniture.rs` for the two
// furnishing steps, `workshop.rs` which runs one scheduler per kind.

use crate::config::BuilderConfig;
use crate::error::BuildError;
use crate::event::{BuildEvent, BuildEventKind, BuildStats, PlacementOutcome};
use crate::furniture::FurnitureStage;
use crate::geometry::BuildPlan;
use crate::grid::{GridService, apply_guarded};
use crate::row_index::{RowCells, RowIndex, RowSlice};
use crate::types::{GridCoord, Stage, StructureKind};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildPhase {
    #[default]
    Idle,
    Digging,
    Furnishing,
    AwaitingSettle,
    Done,
}

/// The plan being executed and what it has done so far.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildJob {
    pub plan: BuildPlan,
    pub rows: RowIndex,
    /// Positions in `rows` that get an action tick, in order.
    pub action_rows: Vec<usize>,
    pub stats: BuildStats,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildState {
    pub phase: BuildPhase,
    /// Next entry of `BuildJob::action_rows` to apply.
    pub cursor: usize,
    /// Ticks since `start`.
    pub ticks: u64,
    pub settle_elapsed: u32,
    pub job: Option<BuildJob>,
}

impl BuildState {
    /// A freshly armed state for `plan`.
    pub fn armed(plan: BuildPlan) -> Self {
        let rows = RowIndex::build(&plan);
        let action_rows = rows.action_rows(&plan);
        let phase = if action_rows.is_empty() {
            BuildPhase::Furnishing
        } else {
            BuildPhase::Digging
        };
        Self {
            phase,
            cursor: 0,
            ticks: 0,
            settle_elapsed: 0,
            job: Some(BuildJob {
                plan,
                rows,
                action_rows,
                stats: BuildStats::default(),
            }),
        }
    }

    pub fn is_idle(&self) -> bool {
        self.phase == BuildPhase::Idle
    }
}

/// Output of one `advance` step.
#[derive(Clone, Debug)]
pub struct Advance {
    pub state: BuildState,
    pub events: Vec<BuildEvent>,
}

// ---------------------------------------------------------------------------
// Pure core
// ---------------------------------------------------------------------------

/// Advance `state` by one tick. Idle states come back unchanged.
pub fn advance<G: GridService + ?Sized>(
    mut state: BuildState,
    grid: &mut G,
    config: &BuilderConfig,
) -> Advance {
    let mut events = Vec::new();
    let Some(mut job) = state.job.take() else {
        return Advance {
            state: BuildState::default(),
            events,
        };
    };
    if state.phase == BuildPhase::Idle {
        return Advance {
            state: BuildState::default(),
            events,
        };
    }

    state.ticks += 1;
    let tick = state.ticks;
    let structure = job.plan.kind;
    let mut emit = |kind: BuildEventKind| {
        events.push(BuildEvent {
            tick,
            structure,
            kind,
        })
    };
    let mut finished = false;

    match state.phase {
        BuildPhase::Idle => {}
        BuildPhase::Digging => {
            if tick % u64::from(config.cadence_ticks.max(1)) == 0 {
                let row = job
                    .action_rows
                    .get(state.cursor)
                    .and_then(|&i| job.rows.get(i));
                if let Some(row) = row {
                    apply_row(&job.plan, row, grid, &mut job.stats, &mut emit);
                }
                state.cursor += 1;
                if state.cursor >= job.action_rows.len() {
                    change_phase(&mut state, BuildPhase::Furnishing, structure, &mut emit);
                }
            }
        }
        BuildPhase::Furnishing => {
            FurnitureStage::furnish(&job.plan, grid, &mut job.stats, &mut emit);
            change_phase(&mut state, BuildPhase::AwaitingSettle, structure, &mut emit);
            finished = config.settle_ticks == 0;
        }
        BuildPhase::AwaitingSettle => {
            state.settle_elapsed += 1;
            finished = state.settle_elapsed >= config.settle_ticks;
        }
        BuildPhase::Done => finished = true,
    }

    if finished {
        if state.phase != BuildPhase::Done {
            change_phase(&mut state, BuildPhase::Done, structure, &mut emit);
        }
        FurnitureStage::light(&job.plan, grid, &mut job.stats, &mut emit);
        tracing::info!(
            ?structure,
            anchor = %job.plan.anchor,
            ticks = tick,
            placed = job.stats.placed,
            rejected = job.stats.rejected,
            "build completed"
        );
        emit(BuildEventKind::BuildCompleted { stats: job.stats });
        return Advance {
            state: BuildState::default(),
            events,
        };
    }

    state.job = Some(job);
    Advance { state, events }
}

fn change_phase(
    state: &mut BuildState,
    to: BuildPhase,
    structure: StructureKind,
    emit: &mut impl FnMut(BuildEventKind),
) {
    let from = state.phase;
    state.phase = to;
    tracing::debug!(?structure, ?from, ?to, tick = state.ticks, "phase changed");
    emit(BuildEventKind::PhaseChanged { from, to });
}

/// Apply the row-stage sets that touch `row`, clears before placements.
fn apply_row<G: GridService + ?Sized>(
    plan: &BuildPlan,
    row: &RowSlice,
    grid: &mut G,
    stats: &mut BuildStats,
    emit: &mut impl FnMut(BuildEventKind),
) {
    let mut work: Vec<&RowCells> = row
        .cells
        .iter()
        .filter(|rc| plan.cell_sets[rc.set].role.stage() == Stage::Rows)
        .collect();
    // Stable: ties keep set order.
    work.sort_by_key(|rc| plan.cell_sets[rc.set].operation.row_order());

    let (mut placed, mut rejected) = (0, 0);
    for rc in work {
        let operation = plan.cell_sets[rc.set].operation;
        for &x in &rc.columns {
            let coord = GridCoord::new(x, row.y);
            let outcome = apply_guarded(grid, coord, operation);
            stats.record(outcome);
            tracing::trace!(%coord, ?operation, ?outcome, "cell");
            match outcome {
                PlacementOutcome::Placed => placed += 1,
                PlacementOutcome::Rejected => {
                    rejected += 1;
                    emit(BuildEventKind::PlacementRejected { coord, operation });
                }
                PlacementOutcome::AlreadyClear
                | PlacementOutcome::Occupied
                | PlacementOutcome::OutOfBounds => {}
            }
        }
    }
    tracing::debug!(kind = ?plan.kind, y = row.y, placed, rejected, "row processed");
    emit(BuildEventKind::RowProcessed {
        y: row.y,
        placed,
        rejected,
    });
}

// ---------------------------------------------------------------------------
// Owner
// ---------------------------------------------------------------------------

/// Runs one build at a time.
#[derive(Clone, Debug, Default)]
pub struct BuildScheduler {
    state: BuildState,
}

impl BuildScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &BuildState {
        &self.state
    }

    pub fn phase(&self) -> BuildPhase {
        self.state.phase
    }

    pub fn is_idle(&self) -> bool {
        self.state.is_idle()
    }

    pub fn plan(&self) -> Option<&BuildPlan> {
        self.state.job.as_ref().map(|j| &j.plan)
    }

    /// Arm with `plan`. Returns the `BuildStarted` event.
    pub fn start(&mut self, plan: BuildPlan) -> Result<BuildEvent, BuildError> {
        if !self.state.is_idle() {
            return Err(BuildError::AlreadyInProgress { kind: plan.kind });
        }
        let (structure, anchor) = (plan.kind, plan.anchor);
        self.state = BuildState::armed(plan);
        let rows = self.state.job.as_ref().map_or(0, |j| j.action_rows.len());
        tracing::info!(?structure, %anchor, rows, "build started");
        Ok(BuildEvent {
            tick: 0,
            structure,
            kind: BuildEventKind::BuildStarted { anchor, rows },
        })
    }

    pub fn tick<G: GridService + ?Sized>(
        &mut self,
        grid: &mut G,
        config: &BuilderConfig,
    ) -> Vec<BuildEvent> {
        let Advance { state, events } = advance(std::mem::take(&mut self.state), grid, config);
        self.state = state;
        events
    }

    /// Drop the active build, leaving already-applied cells in place.
    /// Returns `false` when idle.
    pub fn cancel(&mut self) -> bool {
        if self.state.is_idle() {
            return false;
        }
        if let Some(job) = &self.state.job {
            tracing::info!(
                kind = ?job.plan.kind,
                ticks = self.state.ticks,
                phase = ?self.state.phase,
                "build cancelled"
            );
        }
        self.state = BuildState::default();
        true
    }
}
