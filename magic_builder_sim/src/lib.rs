// magic_builder_sim: incremental tile-structure builder.
//
// Plans small structures (cages, jail cells, houses) as named sets of grid
// cells and applies them to a live tile grid a row at a time, spread over
// many host ticks so a build never stalls the host's frame. The grid itself
// is external and reached only through the `GridService` trait; `TileWorld`
// is an in-memory implementation for tests and headless use.
//
// Module overview:
// - `types.rs`:      GridCoord, WorldBounds, Orientation, materials, Operation, CellRole.
// - `geometry.rs`:   StructureSpec (bands + furniture slots) and GeometryPlanner -> BuildPlan.
// - `structures.rs`: Preset specs for each StructureKind.
// - `row_index.rs`:  Plan cells grouped by row, bottom to top.
// - `grid.rs`:       GridService trait, guarded read-then-act edits, TileWorld.
// - `scheduler.rs`:  BuildState + pure `advance`; BuildScheduler owner.
// - `furniture.rs`:  FurnitureStage: doors, platform fills, furniture, then lights.
// - `workshop.rs`:   One scheduler per kind, footprint reservations, command stepping.
// - `command.rs`:    BuildCommand / BuildAction.
// - `event.rs`:      BuildEvent, PlacementOutcome, BuildStats.
// - `preview.rs`:    Hover state and outline for the placement overlay.
// - `config.rs`:     BuilderConfig: timing, bounds, structure table, JSON loading.
// - `error.rs`:      BuildError, ConfigError.
//
// **Critical constraint: determinism.** Same config, same commands, same
// grid contents -> same edits in the same order. Ordered collections
// (`BTreeMap`/`BTreeSet`) wherever iteration order reaches the grid. The
// library logs through `tracing` and never installs a subscriber.

pub mod command;
pub mod config;
pub mod error;
pub mod event;
pub mod furniture;
pub mod geometry;
pub mod grid;
pub mod preview;
pub mod row_index;
pub mod scheduler;
pub mod structures;
pub mod types;
pub mod workshop;
