// Workshop: one scheduler per structure kind, plus the footprint
// reservations that keep concurrent builds apart.
//
// Builds of different kinds run side by side, each on its own
// `BuildScheduler`; a second build of the same kind is rejected until the
// first is back to idle. When `reserve_footprints` is set, every in-flight
// build reserves its whole footprint (digs, frames, and furniture extents)
// and a start that would touch a reserved cell fails with `Overlap`.
// Reservations are released on completion and on cancel.
//
// The workshop keeps its own tick counter (`current_tick`), advanced by
// `tick` or `step`. Events from schedulers keep their build-relative tick;
// start and cancel events carry tick 0 and the scheduler's tick
// respectively.
//
// See also: `scheduler.rs` for the per-build state machine, `command.rs` for
// `BuildCommand`, `config.rs` for the shared config.
//
// **Critical constraint: determinism.** Schedulers live in a `BTreeMap` and
// tick in kind order. The reservation index is a hash map but is only ever
// looked up by key, never iterated.

use crate::command::{BuildAction, BuildCommand};
use crate::config::BuilderConfig;
use crate::error::BuildError;
use crate::event::{BuildEvent, BuildEventKind};
use crate::geometry::GeometryPlanner;
use crate::grid::GridService;
use crate::scheduler::BuildScheduler;
use crate::types::{GridCoord, Orientation, StructureKind};
use rustc_hash::FxHashMap;
use std::collections::{BTreeMap, BTreeSet};

/// Output of `Workshop::step`.
#[derive(Clone, Debug, Default)]
pub struct StepResult {
    pub events: Vec<BuildEvent>,
    /// Commands that could not be applied, with the reason.
    pub rejected: Vec<(BuildCommand, BuildError)>,
}

#[derive(Clone, Debug)]
pub struct Workshop {
    config: BuilderConfig,
    planner: GeometryPlanner,
    schedulers: BTreeMap<StructureKind, BuildScheduler>,
    reservations: FxHashMap<GridCoord, StructureKind>,
    current_tick: u64,
}

impl Default for Workshop {
    fn default() -> Self {
        Self::new(BuilderConfig::default())
    }
}

impl Workshop {
    pub fn new(config: BuilderConfig) -> Self {
        let planner = config.planner();
        Self {
            config,
            planner,
            schedulers: BTreeMap::new(),
            reservations: FxHashMap::default(),
            current_tick: 0,
        }
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    pub fn planner(&self) -> &GeometryPlanner {
        &self.planner
    }

    pub fn current_tick(&self) -> u64 {
        self.current_tick
    }

    pub fn scheduler(&self, kind: StructureKind) -> Option<&BuildScheduler> {
        self.schedulers.get(&kind)
    }

    pub fn is_busy(&self, kind: StructureKind) -> bool {
        self.schedulers.get(&kind).is_some_and(|s| !s.is_idle())
    }

    /// True when no build of any kind is running.
    pub fn is_idle(&self) -> bool {
        self.schedulers.values().all(|s| s.is_idle())
    }

    pub fn reserved_by(&self, coord: GridCoord) -> Option<StructureKind> {
        self.reservations.get(&coord).copied()
    }

    pub fn reserved_cell_count(&self) -> usize {
        self.reservations.len()
    }

    /// Plan and arm a build. The plan is clamped to the grid's bounds.
    pub fn start_build<G: GridService + ?Sized>(
        &mut self,
        kind: StructureKind,
        anchor: GridCoord,
        orientation: Orientation,
        grid: &G,
    ) -> Result<BuildEvent, BuildError> {
        if self.is_busy(kind) {
            tracing::debug!(?kind, "start rejected: already in progress");
            return Err(BuildError::AlreadyInProgress { kind });
        }
        let plan = self
            .planner
            .plan_in(kind, anchor, orientation, grid.bounds())?;
        let footprint = if self.config.reserve_footprints {
            let footprint = plan.footprint();
            if let Some(&coord) = footprint.iter().find(|c| self.reservations.contains_key(c)) {
                tracing::debug!(?kind, %coord, "start rejected: overlap");
                return Err(BuildError::Overlap { kind, coord });
            }
            footprint
        } else {
            BTreeSet::new()
        };
        let event = self.schedulers.entry(kind).or_default().start(plan)?;
        for coord in footprint {
            self.reservations.insert(coord, kind);
        }
        Ok(event)
    }

    /// Cancel the build of `kind`. `None` when nothing was running.
    pub fn cancel_build(&mut self, kind: StructureKind) -> Option<BuildEvent> {
        let sched = self.schedulers.get_mut(&kind)?;
        let tick = sched.state().ticks;
        if !sched.cancel() {
            return None;
        }
        self.release(kind);
        Some(BuildEvent {
            tick,
            structure: kind,
            kind: BuildEventKind::BuildCancelled,
        })
    }

    fn release(&mut self, kind: StructureKind) {
        self.reservations.retain(|_, owner| *owner != kind);
    }

    /// Execute one command now.
    pub fn apply<G: GridService + ?Sized>(
        &mut self,
        command: &BuildCommand,
        grid: &G,
    ) -> Result<Option<BuildEvent>, BuildError> {
        match command.action {
            BuildAction::StartBuild {
                kind,
                anchor,
                orientation,
            } => self.start_build(kind, anchor, orientation, grid).map(Some),
            BuildAction::CancelBuild { kind } => Ok(self.cancel_build(kind)),
        }
    }

    /// Advance every scheduler by one tick, in kind order.
    pub fn tick<G: GridService + ?Sized>(&mut self, grid: &mut G) -> Vec<BuildEvent> {
        self.current_tick += 1;
        let mut events = Vec::new();
        let mut finished = Vec::new();
        for (kind, sched) in &mut self.schedulers {
            if sched.is_idle() {
                continue;
            }
            let produced = sched.tick(grid, &self.config);
            if produced
                .iter()
                .any(|e| matches!(e.kind, BuildEventKind::BuildCompleted { .. }))
            {
                finished.push(*kind);
            }
            events.extend(produced);
        }
        for kind in finished {
            self.release(kind);
        }
        events
    }

    /// Apply `commands` (sorted by tick) and tick until `target_tick`.
    /// Commands stamped at or before the current tick apply before that
    /// tick's scheduler pass. Commands stamped exactly at `target_tick` are
    /// applied before returning and first run on the next call's pass;
    /// commands past `target_tick` are ignored.
    pub fn step<G: GridService + ?Sized>(
        &mut self,
        commands: &[BuildCommand],
        target_tick: u64,
        grid: &mut G,
    ) -> StepResult {
        let mut result = StepResult::default();
        let mut next = 0;
        loop {
            let due = self.current_tick.min(target_tick);
            while let Some(cmd) = commands.get(next).filter(|c| c.tick <= due) {
                next += 1;
                match self.apply(cmd, &*grid) {
                    Ok(Some(event)) => result.events.push(event),
                    Ok(None) => {}
                    Err(err) => result.rejected.push((cmd.clone(), err)),
                }
            }
            if self.current_tick >= target_tick {
                break;
            }
            result.events.extend(self.tick(grid));
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::TileWorld;
    use crate::types::WorldBounds;

    fn setup() -> (Workshop, TileWorld) {
        let config = BuilderConfig {
            world: WorldBounds::new(400, 300, 10),
            ..BuilderConfig::default()
        };
        let world = TileWorld::new(config.world);
        (Workshop::new(config), world)
    }

    #[test]
    fn same_kind_twice_is_already_in_progress() {
        let (mut shop, world) = setup();
        shop.start_build(StructureKind::Jail, GridCoord::new(100, 200), Orientation::Right, &world)
            .unwrap();
        let reserved = shop.reserved_cell_count();
        let err = shop
            .start_build(StructureKind::Jail, GridCoord::new(300, 200), Orientation::Right, &world)
            .unwrap_err();
        assert_eq!(
            err,
            BuildError::AlreadyInProgress {
                kind: StructureKind::Jail
            }
        );
        assert_eq!(shop.reserved_cell_count(), reserved);
    }

    #[test]
    fn different_kinds_run_concurrently_when_disjoint() {
        let (mut shop, mut world) = setup();
        shop.start_build(StructureKind::Jail, GridCoord::new(100, 200), Orientation::Right, &world)
            .unwrap();
        shop.start_build(StructureKind::Cage, GridCoord::new(200, 200), Orientation::Left, &world)
            .unwrap();
        let mut completed = Vec::new();
        for _ in 0..100 {
            for e in shop.tick(&mut world) {
                if let BuildEventKind::BuildCompleted { .. } = e.kind {
                    completed.push(e.structure);
                }
            }
        }
        assert_eq!(completed, vec![StructureKind::Cage, StructureKind::Jail]);
        assert!(shop.is_idle());
        assert_eq!(shop.reserved_cell_count(), 0);
    }

    #[test]
    fn overlapping_start_is_rejected() {
        let (mut shop, world) = setup();
        shop.start_build(StructureKind::Jail, GridCoord::new(100, 200), Orientation::Right, &world)
            .unwrap();
        let err = shop
            .start_build(StructureKind::Cage, GridCoord::new(103, 200), Orientation::Right, &world)
            .unwrap_err();
        // Lowest overlapping cell in (y, x) order.
        assert_eq!(
            err,
            BuildError::Overlap {
                kind: StructureKind::Cage,
                coord: GridCoord::new(100, 197),
            }
        );
        assert!(!shop.is_busy(StructureKind::Cage));
    }

    #[test]
    fn overlap_allowed_when_reservations_disabled() {
        let config = BuilderConfig {
            world: WorldBounds::new(400, 300, 10),
            reserve_footprints: false,
            ..BuilderConfig::default()
        };
        let world = TileWorld::new(config.world);
        let mut shop = Workshop::new(config);
        shop.start_build(StructureKind::Jail, GridCoord::new(100, 200), Orientation::Right, &world)
            .unwrap();
        assert!(shop
            .start_build(StructureKind::Cage, GridCoord::new(103, 200), Orientation::Right, &world)
            .is_ok());
        assert_eq!(shop.reserved_cell_count(), 0);
    }

    #[test]
    fn cancel_releases_reservation() {
        let (mut shop, mut world) = setup();
        shop.start_build(StructureKind::Jail, GridCoord::new(100, 200), Orientation::Right, &world)
            .unwrap();
        assert_eq!(shop.reserved_by(GridCoord::new(100, 195)), Some(StructureKind::Jail));
        for _ in 0..7 {
            shop.tick(&mut world);
        }
        let event = shop.cancel_build(StructureKind::Jail).unwrap();
        assert_eq!(event.kind, BuildEventKind::BuildCancelled);
        assert_eq!(event.tick, 7);
        assert_eq!(shop.reserved_cell_count(), 0);
        assert!(shop.cancel_build(StructureKind::Jail).is_none());
        assert!(shop.cancel_build(StructureKind::Cage).is_none());
    }

    #[test]
    fn step_applies_commands_at_their_tick() {
        let (mut shop, mut world) = setup();
        let cage = |tick, x| {
            let anchor = GridCoord::new(x, 100);
            BuildCommand::start(tick, StructureKind::Cage, anchor, Orientation::Right)
        };
        let commands = vec![
            cage(0, 50),
            cage(2, 80),
            BuildCommand::cancel(3, StructureKind::Cage),
        ];
        let result = shop.step(&commands, 10, &mut world);
        assert_eq!(shop.current_tick(), 10);
        assert_eq!(result.rejected.len(), 1);
        assert!(matches!(
            result.rejected[0].1,
            BuildError::AlreadyInProgress { .. }
        ));
        assert!(result
            .events
            .iter()
            .any(|e| e.kind == BuildEventKind::BuildCancelled));
        assert!(shop.is_idle());
    }

    #[test]
    fn step_applies_a_command_stamped_at_the_target_tick() {
        let (mut shop, mut world) = setup();
        let commands = [BuildCommand::start(
            5,
            StructureKind::Cage,
            GridCoord::new(50, 100),
            Orientation::Right,
        )];
        let result = shop.step(&commands, 5, &mut world);
        assert_eq!(shop.current_tick(), 5);
        assert!(result.rejected.is_empty());
        assert!(matches!(
            result.events.as_slice(),
            [BuildEvent {
                kind: BuildEventKind::BuildStarted { .. },
                ..
            }]
        ));
        assert!(shop.is_busy(StructureKind::Cage));

        let result = shop.step(&[], 100, &mut world);
        assert!(result
            .events
            .iter()
            .any(|e| matches!(e.kind, BuildEventKind::BuildCompleted { .. })));
        assert!(shop.is_idle());
    }

    #[test]
    fn plans_clamp_to_the_grid_bounds() {
        let (mut shop, world) = setup();
        // Anchor near the right margin: part of the house is dropped.
        shop.start_build(
            StructureKind::SmallHouse,
            GridCoord::new(392, 200),
            Orientation::Right,
            &world,
        )
        .unwrap();
        let plan = shop.scheduler(StructureKind::SmallHouse).unwrap().plan().unwrap();
        assert!(plan.footprint().iter().all(|c| c.x < 390));
    }
}
