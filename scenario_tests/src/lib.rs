// Test-only harness for end-to-end build scenarios.
//
// `RecordingGrid` wraps a real `TileWorld` and records every mutator call
// the builder makes, stamped with the harness tick, so scenarios can check
// ordering (clears before fills, rows bottom to top, lights last). It can
// also be told to refuse foreground placement at chosen coordinates, to
// model a host that rejects tiles.
//
// `run_to_idle` and `run_workshop_to_idle` drive a scheduler or workshop
// until everything is idle, with a hard cap so a stuck build fails the test
// instead of hanging it.
//
// See also: `tests/` for the scenarios.

use std::collections::BTreeSet;

use magic_builder_sim::config::BuilderConfig;
use magic_builder_sim::event::BuildEvent;
use magic_builder_sim::grid::{GridService, TileWorld};
use magic_builder_sim::scheduler::BuildScheduler;
use magic_builder_sim::types::{
    Foreground, FurnitureKind, GridCoord, Orientation, TileMaterial, WallMaterial, WorldBounds,
};
use magic_builder_sim::workshop::Workshop;

/// Tick cap for the run helpers.
pub const MAX_TICKS: u64 = 10_000;

/// A 400x300 world with a 10-tile margin: room for several structures.
pub fn test_config() -> BuilderConfig {
    BuilderConfig {
        world: WorldBounds::new(400, 300, 10),
        ..BuilderConfig::default()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GridCall {
    ClearForeground(GridCoord),
    ClearBackground(GridCoord),
    PlaceBackground(GridCoord, WallMaterial),
    PlaceForeground(GridCoord, TileMaterial),
    PlaceFurniture(GridCoord, FurnitureKind, Orientation),
    RefreshAdjacency(GridCoord),
}

impl GridCall {
    pub fn coord(&self) -> GridCoord {
        match *self {
            GridCall::ClearForeground(c)
            | GridCall::ClearBackground(c)
            | GridCall::PlaceBackground(c, _)
            | GridCall::PlaceForeground(c, _)
            | GridCall::PlaceFurniture(c, _, _)
            | GridCall::RefreshAdjacency(c) => c,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Recorded {
    pub tick: u64,
    pub call: GridCall,
    pub ok: bool,
}

/// A `TileWorld` that logs mutator calls.
pub struct RecordingGrid {
    pub world: TileWorld,
    pub calls: Vec<Recorded>,
    /// Stamped onto each recorded call; advanced by the run helpers.
    pub tick: u64,
    /// `place_foreground` always fails here.
    pub refuse_foreground: BTreeSet<GridCoord>,
}

impl RecordingGrid {
    pub fn new(bounds: WorldBounds) -> Self {
        Self {
            world: TileWorld::new(bounds),
            calls: Vec::new(),
            tick: 0,
            refuse_foreground: BTreeSet::new(),
        }
    }

    fn record(&mut self, call: GridCall, ok: bool) -> bool {
        self.calls.push(Recorded {
            tick: self.tick,
            call,
            ok,
        });
        ok
    }

    /// Successful edits only, refreshes excluded.
    pub fn edits(&self) -> impl Iterator<Item = &Recorded> {
        self.calls
            .iter()
            .filter(|r| r.ok && !matches!(r.call, GridCall::RefreshAdjacency(_)))
    }

    /// Ticks at which a furniture piece of `kind` was placed.
    pub fn furniture_ticks(&self, kind: FurnitureKind) -> Vec<u64> {
        self.edits()
            .filter(|r| matches!(r.call, GridCall::PlaceFurniture(_, k, _) if k == kind))
            .map(|r| r.tick)
            .collect()
    }
}

impl GridService for RecordingGrid {
    fn bounds(&self) -> WorldBounds {
        self.world.bounds()
    }

    fn foreground_at(&self, coord: GridCoord) -> Option<Foreground> {
        self.world.foreground_at(coord)
    }

    fn background_at(&self, coord: GridCoord) -> Option<WallMaterial> {
        self.world.background_at(coord)
    }

    fn clear_foreground(&mut self, coord: GridCoord) -> bool {
        let ok = self.world.clear_foreground(coord);
        self.record(GridCall::ClearForeground(coord), ok)
    }

    fn clear_background(&mut self, coord: GridCoord) -> bool {
        let ok = self.world.clear_background(coord);
        self.record(GridCall::ClearBackground(coord), ok)
    }

    fn place_background(&mut self, coord: GridCoord, material: WallMaterial) -> bool {
        let ok = self.world.place_background(coord, material);
        self.record(GridCall::PlaceBackground(coord, material), ok)
    }

    fn place_foreground(&mut self, coord: GridCoord, material: TileMaterial) -> bool {
        let refused = self.refuse_foreground.contains(&coord);
        let ok = !refused && self.world.place_foreground(coord, material);
        self.record(GridCall::PlaceForeground(coord, material), ok)
    }

    fn place_furniture(
        &mut self,
        origin: GridCoord,
        kind: FurnitureKind,
        facing: Orientation,
    ) -> bool {
        let ok = self.world.place_furniture(origin, kind, facing);
        self.record(GridCall::PlaceFurniture(origin, kind, facing), ok)
    }

    fn refresh_adjacency(&mut self, coord: GridCoord) {
        self.world.refresh_adjacency(coord);
        self.record(GridCall::RefreshAdjacency(coord), true);
    }
}

/// What a run produced.
#[derive(Debug, Default)]
pub struct RunOutcome {
    /// Ticks taken to get back to idle.
    pub ticks: u64,
    pub events: Vec<BuildEvent>,
}

/// Tick `sched` until idle.
pub fn run_to_idle(
    sched: &mut BuildScheduler,
    grid: &mut RecordingGrid,
    config: &BuilderConfig,
) -> RunOutcome {
    let mut out = RunOutcome::default();
    while !sched.is_idle() {
        assert!(out.ticks < MAX_TICKS, "build did not finish");
        out.ticks += 1;
        grid.tick = out.ticks;
        out.events.extend(sched.tick(grid, config));
    }
    out
}

/// Tick `shop` until every scheduler is idle.
pub fn run_workshop_to_idle(shop: &mut Workshop, grid: &mut RecordingGrid) -> RunOutcome {
    let mut out = RunOutcome::default();
    while !shop.is_idle() {
        assert!(out.ticks < MAX_TICKS, "workshop did not finish");
        out.ticks += 1;
        grid.tick = out.ticks;
        out.events.extend(shop.tick(grid));
    }
    out
}
