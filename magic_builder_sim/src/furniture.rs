// Furnishing: the two non-row steps of a build.
//
// Step one (`FurnitureStage::furnish`) runs once, right after the last row:
// doors first so their holes are filled before anything leans on the
// walls, then the platform fills that close deliberate frame gaps, then
// primary furniture standing on those floors. Step two
// (`FurnitureStage::light`) runs after the settle delay and places torches
// and candles, which the host only accepts once the frame around them has
// settled.
//
// Nothing here reads live state to decide *what* to place: the sets come
// from the plan. Each placement still goes through `apply_guarded`, so a
// footprint that is out of bounds or no longer clear is skipped.
//
// See also: `scheduler.rs` which calls both steps, `grid.rs` for
// `apply_guarded`, `structures.rs` for the furniture layout tables.

use crate::event::{BuildEventKind, BuildStats, PlacementOutcome};
use crate::geometry::{BuildPlan, CellSet};
use crate::grid::{GridService, apply_guarded};
use crate::types::{CellRole, Operation, Stage};

pub struct FurnitureStage;

impl FurnitureStage {
    /// Doors, platform fills, and primary furniture, in that order.
    pub fn furnish<G: GridService + ?Sized>(
        plan: &BuildPlan,
        grid: &mut G,
        stats: &mut BuildStats,
        emit: &mut impl FnMut(BuildEventKind),
    ) {
        let mut sets: Vec<&CellSet> = plan
            .cell_sets
            .iter()
            .filter(|s| s.role.stage() == Stage::Furnishing)
            .collect();
        // Stable: sets of the same role keep plan order.
        sets.sort_by_key(|s| s.role.furnishing_order());
        for set in sets {
            apply_set(set, grid, stats, emit);
        }
    }

    /// Light sources.
    pub fn light<G: GridService + ?Sized>(
        plan: &BuildPlan,
        grid: &mut G,
        stats: &mut BuildStats,
        emit: &mut impl FnMut(BuildEventKind),
    ) {
        for set in plan.sets_with_role(CellRole::Light) {
            apply_set(set, grid, stats, emit);
        }
    }
}

fn apply_set<G: GridService + ?Sized>(
    set: &CellSet,
    grid: &mut G,
    stats: &mut BuildStats,
    emit: &mut impl FnMut(BuildEventKind),
) {
    for &coord in &set.cells {
        let outcome = apply_guarded(grid, coord, set.operation);
        stats.record(outcome);
        tracing::trace!(set = %set.name, %coord, ?outcome, "furnishing");
        match (set.operation, outcome) {
            (Operation::PlaceFurniture(furniture, _), PlacementOutcome::Placed) => {
                emit(BuildEventKind::FurniturePlaced {
                    origin: coord,
                    furniture,
                });
            }
            (Operation::PlaceFurniture(furniture, _), PlacementOutcome::Occupied)
            | (Operation::PlaceFurniture(furniture, _), PlacementOutcome::OutOfBounds) => {
                emit(BuildEventKind::FurnitureSkipped {
                    origin: coord,
                    furniture,
                });
            }
            (operation, PlacementOutcome::Rejected) => {
                emit(BuildEventKind::PlacementRejected { coord, operation });
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BuilderConfig;
    use crate::grid::TileWorld;
    use crate::types::{
        Foreground, FurnitureKind, GridCoord, Orientation, StructureKind, TileMaterial,
        WorldBounds,
    };

    fn world() -> TileWorld {
        TileWorld::new(WorldBounds::new(200, 200, 10))
    }

    fn plan(kind: StructureKind) -> BuildPlan {
        BuilderConfig::default()
            .planner()
            .plan(kind, GridCoord::new(100, 150), Orientation::Right)
            .unwrap()
    }

    /// Lay the plan's frame and walls directly so furniture has support.
    fn raise_frame(plan: &BuildPlan, world: &mut TileWorld) {
        for set in &plan.cell_sets {
            if set.role.stage() != Stage::Rows {
                continue;
            }
            for &c in &set.cells {
                apply_guarded(world, c, set.operation);
            }
        }
    }

    #[test]
    fn furnish_places_doors_before_furniture() {
        let plan = plan(StructureKind::MediumHouse);
        let mut w = world();
        raise_frame(&plan, &mut w);
        let mut stats = BuildStats::default();
        let mut events = Vec::new();
        FurnitureStage::furnish(&plan, &mut w, &mut stats, &mut |e| events.push(e));

        let placed: Vec<FurnitureKind> = events
            .iter()
            .filter_map(|e| match e {
                BuildEventKind::FurniturePlaced { furniture, .. } => Some(*furniture),
                _ => None,
            })
            .collect();
        assert_eq!(&placed[..3], &[FurnitureKind::Door; 3]);
        assert!(placed.contains(&FurnitureKind::Bed));
        assert!(!placed.contains(&FurnitureKind::Candle));
        // Stairwell platforms went in.
        assert_eq!(
            w.foreground_at(GridCoord::new(96, 144)),
            Some(Foreground::Tile(TileMaterial::Platform))
        );
    }

    #[test]
    fn light_places_only_light_sources() {
        let plan = plan(StructureKind::Jail);
        let mut w = world();
        raise_frame(&plan, &mut w);
        let mut stats = BuildStats::default();
        let mut events = Vec::new();
        FurnitureStage::light(&plan, &mut w, &mut stats, &mut |e| events.push(e));
        assert_eq!(
            events,
            vec![BuildEventKind::FurniturePlaced {
                origin: GridCoord::new(101, 143),
                furniture: FurnitureKind::Torch,
            }]
        );
        assert_eq!(stats.placed, 1);
    }

    #[test]
    fn blocked_footprint_is_skipped() {
        let plan = plan(StructureKind::Jail);
        let mut w = world();
        raise_frame(&plan, &mut w);
        // Upper tile of the chair at (100, 145).
        w.set_foreground(GridCoord::new(100, 144), Some(Foreground::Unbreakable));
        let mut stats = BuildStats::default();
        let mut events = Vec::new();
        FurnitureStage::furnish(&plan, &mut w, &mut stats, &mut |e| events.push(e));
        assert!(events.contains(&BuildEventKind::FurnitureSkipped {
            origin: GridCoord::new(100, 145),
            furniture: FurnitureKind::Chair,
        }));
        assert!(events.contains(&BuildEventKind::FurniturePlaced {
            origin: GridCoord::new(98, 145),
            furniture: FurnitureKind::Workbench,
        }));
        assert_eq!(stats.occupied, 1);
    }
}
