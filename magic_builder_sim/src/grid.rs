// The tile grid the builder edits, and an in-memory implementation of it.
//
// `GridService` is the seam between the builder and the host: occupancy
// reads, the four clear/place primitives, furniture placement, and the
// adjacency refresh the host runs after an edit so neighbouring tiles pick
// their frames. Every mutator reports success as a `bool` and must be a
// silent no-op (returning `false`) when it cannot act; the builder turns
// `false` into a skipped cell, never an abort.
//
// The builder assumes a single-threaded host: a read followed by a write in
// the same tick sees no interleaved mutation. Other systems may still edit
// the grid between ticks, which is why every write is preceded by a fresh
// read and nothing about grid contents is cached across ticks.
//
// `TileWorld` is a dense grid implementing the trait, used by tests, the
// benchmark, and hosts without a grid of their own. It stores foreground and
// background layers as a flat `Vec` indexed `x + y * width`. Out-of-range
// reads return empty; out-of-range writes fail. Multi-tile furniture is
// tracked by origin so clearing any of its tiles removes the whole object.
//
// See also: `scheduler.rs` and `furniture.rs` which drive the mutators,
// `types.rs` for `Foreground` and `FurnitureKind::footprint`.

use crate::event::PlacementOutcome;
use crate::types::{
    Foreground, FurnitureKind, GridCoord, Operation, Orientation, TileMaterial, WallMaterial,
    WorldBounds,
};
use std::collections::BTreeMap;

/// Grid primitives consumed by the builder.
pub trait GridService {
    fn bounds(&self) -> WorldBounds;

    fn is_within_world_bounds(&self, coord: GridCoord) -> bool {
        self.bounds().contains(coord)
    }

    /// `None` when the foreground layer is empty (or out of range).
    fn foreground_at(&self, coord: GridCoord) -> Option<Foreground>;

    fn background_at(&self, coord: GridCoord) -> Option<WallMaterial>;

    fn clear_foreground(&mut self, coord: GridCoord) -> bool;

    fn clear_background(&mut self, coord: GridCoord) -> bool;

    fn place_background(&mut self, coord: GridCoord, material: WallMaterial) -> bool;

    fn place_foreground(&mut self, coord: GridCoord, material: TileMaterial) -> bool;

    /// Place a multi-tile object with its origin tile at `origin`.
    fn place_furniture(
        &mut self,
        origin: GridCoord,
        kind: FurnitureKind,
        facing: Orientation,
    ) -> bool;

    fn refresh_adjacency(&mut self, coord: GridCoord);
}

/// Apply one operation to one cell with a fresh occupancy read first.
///
/// Clears only act on occupied cells and placements only on empty ones. A
/// clear of an empty cell is `AlreadyClear`, a placement onto a filled one
/// is `Occupied`; neither calls the mutator. A successful edit refreshes
/// adjacency at the cell.
pub fn apply_guarded<G: GridService + ?Sized>(
    grid: &mut G,
    coord: GridCoord,
    operation: Operation,
) -> PlacementOutcome {
    if !grid.is_within_world_bounds(coord) {
        return PlacementOutcome::OutOfBounds;
    }
    let ok = match operation {
        Operation::ClearForeground => {
            if grid.foreground_at(coord).is_none() {
                return PlacementOutcome::AlreadyClear;
            }
            grid.clear_foreground(coord)
        }
        Operation::ClearBackground => {
            if grid.background_at(coord).is_none() {
                return PlacementOutcome::AlreadyClear;
            }
            grid.clear_background(coord)
        }
        Operation::PlaceBackground(material) => {
            if grid.background_at(coord).is_some() {
                return PlacementOutcome::Occupied;
            }
            grid.place_background(coord, material)
        }
        Operation::PlaceForeground(material) => {
            if grid.foreground_at(coord).is_some() {
                return PlacementOutcome::Occupied;
            }
            grid.place_foreground(coord, material)
        }
        Operation::PlaceFurniture(kind, facing) => {
            let footprint = kind.footprint(coord, facing);
            if !footprint.iter().all(|c| grid.is_within_world_bounds(*c)) {
                return PlacementOutcome::OutOfBounds;
            }
            if footprint.iter().any(|c| grid.foreground_at(*c).is_some()) {
                return PlacementOutcome::Occupied;
            }
            grid.place_furniture(coord, kind, facing)
        }
    };
    if ok {
        grid.refresh_adjacency(coord);
        PlacementOutcome::Placed
    } else {
        PlacementOutcome::Rejected
    }
}

// ---------------------------------------------------------------------------
// TileWorld
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Cell {
    fg: Option<Foreground>,
    bg: Option<WallMaterial>,
}

/// Dense in-memory tile grid.
#[derive(Clone, Debug, Default)]
pub struct TileWorld {
    cells: Vec<Cell>,
    bounds: WorldBounds,
    /// Origin and facing of every placed object, keyed by each covered tile.
    objects: BTreeMap<GridCoord, (GridCoord, FurnitureKind, Orientation)>,
    adjacency_refreshes: u64,
}

impl TileWorld {
    /// An empty world.
    pub fn new(bounds: WorldBounds) -> Self {
        let total = bounds.width.max(0) as usize * bounds.height.max(0) as usize;
        Self {
            cells: vec![Cell::default(); total],
            bounds,
            objects: BTreeMap::new(),
            adjacency_refreshes: 0,
        }
    }

    /// Raw storage range: the whole `width x height` area, margin included.
    fn index(&self, coord: GridCoord) -> Option<usize> {
        if coord.x >= 0
            && coord.y >= 0
            && coord.x < self.bounds.width
            && coord.y < self.bounds.height
        {
            Some(coord.x as usize + coord.y as usize * self.bounds.width as usize)
        } else {
            None
        }
    }

    /// Write a foreground tile directly, ignoring occupancy. For seeding
    /// terrain in tests and hosts.
    pub fn set_foreground(&mut self, coord: GridCoord, fg: Option<Foreground>) {
        if let Some(i) = self.index(coord) {
            self.cells[i].fg = fg;
        }
    }

    pub fn set_background(&mut self, coord: GridCoord, bg: Option<WallMaterial>) {
        if let Some(i) = self.index(coord) {
            self.cells[i].bg = bg;
        }
    }

    /// Fill the inclusive rectangle with a foreground tile.
    pub fn fill_foreground(&mut self, from: GridCoord, to: GridCoord, fg: Foreground) {
        for y in from.y.min(to.y)..=from.y.max(to.y) {
            for x in from.x.min(to.x)..=from.x.max(to.x) {
                self.set_foreground(GridCoord::new(x, y), Some(fg));
            }
        }
    }

    /// Origin, kind, and facing of the object covering `coord`.
    pub fn object_at(&self, coord: GridCoord) -> Option<(GridCoord, FurnitureKind, Orientation)> {
        self.objects.get(&coord).copied()
    }

    /// Every placed object, by origin.
    pub fn objects(&self) -> Vec<(GridCoord, FurnitureKind, Orientation)> {
        let mut seen: BTreeMap<GridCoord, (FurnitureKind, Orientation)> = BTreeMap::new();
        for &(origin, kind, facing) in self.objects.values() {
            seen.insert(origin, (kind, facing));
        }
        seen.into_iter().map(|(o, (k, f))| (o, k, f)).collect()
    }

    pub fn adjacency_refreshes(&self) -> u64 {
        self.adjacency_refreshes
    }

    /// Count of foreground tiles of `material`.
    pub fn count_foreground(&self, material: TileMaterial) -> usize {
        self.cells
            .iter()
            .filter(|c| c.fg == Some(Foreground::Tile(material)))
            .count()
    }

    fn remove_object(&mut self, coord: GridCoord) {
        if let Some((origin, kind, facing)) = self.objects.get(&coord).copied() {
            for tile in kind.footprint(origin, facing) {
                self.objects.remove(&tile);
                self.set_foreground(tile, None);
            }
        } else {
            self.set_foreground(coord, None);
        }
    }

    /// Light sources hang on a wall or lean on an adjacent foreground tile.
    fn light_is_anchored(&self, coord: GridCoord) -> bool {
        self.background_at(coord).is_some()
            || coord
                .neighbors()
                .iter()
                .any(|n| self.foreground_at(*n).is_some())
    }

    /// Other objects need something under every bottom tile.
    fn is_supported(&self, origin: GridCoord, kind: FurnitureKind, facing: Orientation) -> bool {
        let (width, _) = kind.footprint_size();
        (0..width).all(|i| {
            let below = GridCoord::new(origin.x + i * facing.sign(), origin.y + 1);
            self.foreground_at(below).is_some()
        })
    }
}

impl GridService for TileWorld {
    fn bounds(&self) -> WorldBounds {
        self.bounds
    }

    fn foreground_at(&self, coord: GridCoord) -> Option<Foreground> {
        self.index(coord).and_then(|i| self.cells[i].fg)
    }

    fn background_at(&self, coord: GridCoord) -> Option<WallMaterial> {
        self.index(coord).and_then(|i| self.cells[i].bg)
    }

    fn clear_foreground(&mut self, coord: GridCoord) -> bool {
        match self.foreground_at(coord) {
            None | Some(Foreground::Unbreakable) => false,
            Some(Foreground::Object(_)) => {
                self.remove_object(coord);
                true
            }
            Some(Foreground::Tile(_)) => {
                self.set_foreground(coord, None);
                true
            }
        }
    }

    fn clear_background(&mut self, coord: GridCoord) -> bool {
        if self.background_at(coord).is_none() {
            return false;
        }
        self.set_background(coord, None);
        true
    }

    fn place_background(&mut self, coord: GridCoord, material: WallMaterial) -> bool {
        match self.index(coord) {
            Some(i) if self.cells[i].bg.is_none() => {
                self.cells[i].bg = Some(material);
                true
            }
            _ => false,
        }
    }

    fn place_foreground(&mut self, coord: GridCoord, material: TileMaterial) -> bool {
        match self.index(coord) {
            Some(i) if self.cells[i].fg.is_none() => {
                self.cells[i].fg = Some(Foreground::Tile(material));
                true
            }
            _ => false,
        }
    }

    fn place_furniture(
        &mut self,
        origin: GridCoord,
        kind: FurnitureKind,
        facing: Orientation,
    ) -> bool {
        let footprint = kind.footprint(origin, facing);
        let free = footprint
            .iter()
            .all(|c| self.index(*c).is_some() && self.foreground_at(*c).is_none());
        if !free {
            return false;
        }
        let anchored = if kind.is_light_source() {
            self.light_is_anchored(origin)
        } else {
            self.is_supported(origin, kind, facing)
        };
        if !anchored {
            return false;
        }
        for tile in footprint {
            self.set_foreground(tile, Some(Foreground::Object(kind)));
            self.objects.insert(tile, (origin, kind, facing));
        }
        true
    }

    fn refresh_adjacency(&mut self, _coord: GridCoord) {
        self.adjacency_refreshes += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> TileWorld {
        TileWorld::new(WorldBounds::new(64, 64, 4))
    }

    #[test]
    fn out_of_range_reads_are_empty_and_writes_fail() {
        let mut w = world();
        let outside = GridCoord::new(-1, 10);
        assert_eq!(w.foreground_at(outside), None);
        assert!(!w.place_foreground(outside, TileMaterial::Stone));
        assert!(!w.place_background(GridCoord::new(64, 0), WallMaterial::Wood));
    }

    #[test]
    fn margin_is_outside_world_bounds_but_stored() {
        let mut w = world();
        let edge = GridCoord::new(2, 2);
        assert!(!w.is_within_world_bounds(edge));
        assert!(w.place_foreground(edge, TileMaterial::Stone));
    }

    #[test]
    fn placement_fails_on_occupied_cells() {
        let mut w = world();
        let c = GridCoord::new(10, 10);
        assert!(w.place_foreground(c, TileMaterial::Stone));
        assert!(!w.place_foreground(c, TileMaterial::WoodBlock));
        assert_eq!(w.foreground_at(c), Some(Foreground::Tile(TileMaterial::Stone)));
        assert!(w.place_background(c, WallMaterial::Wood));
        assert!(!w.place_background(c, WallMaterial::Stone));
    }

    #[test]
    fn unbreakable_tiles_survive_clearing() {
        let mut w = world();
        let c = GridCoord::new(10, 10);
        w.set_foreground(c, Some(Foreground::Unbreakable));
        assert!(!w.clear_foreground(c));
        assert_eq!(w.foreground_at(c), Some(Foreground::Unbreakable));
    }

    #[test]
    fn clearing_any_tile_removes_the_whole_object() {
        let mut w = world();
        let origin = GridCoord::new(20, 30);
        w.fill_foreground(
            GridCoord::new(15, 31),
            GridCoord::new(25, 31),
            Foreground::Tile(TileMaterial::Stone),
        );
        assert!(w.place_furniture(origin, FurnitureKind::Table, Orientation::Left));
        assert_eq!(w.object_at(GridCoord::new(18, 29)).map(|o| o.0), Some(origin));
        assert!(w.clear_foreground(GridCoord::new(18, 29)));
        assert!(w.objects().is_empty());
        assert_eq!(w.foreground_at(origin), None);
    }

    #[test]
    fn furniture_needs_support_and_free_space() {
        let mut w = world();
        let origin = GridCoord::new(20, 30);
        assert!(!w.place_furniture(origin, FurnitureKind::Chair, Orientation::Right));
        w.set_foreground(GridCoord::new(20, 31), Some(Foreground::Tile(TileMaterial::Platform)));
        w.set_foreground(GridCoord::new(20, 29), Some(Foreground::Tile(TileMaterial::Stone)));
        // Chair is 1x2; its upper tile is blocked.
        assert!(!w.place_furniture(origin, FurnitureKind::Chair, Orientation::Right));
        w.set_foreground(GridCoord::new(20, 29), None);
        assert!(w.place_furniture(origin, FurnitureKind::Chair, Orientation::Right));
    }

    #[test]
    fn light_sources_need_a_wall_or_a_neighbour() {
        let mut w = world();
        let spot = GridCoord::new(30, 30);
        assert!(!w.place_furniture(spot, FurnitureKind::Torch, Orientation::Right));
        w.set_background(spot, Some(WallMaterial::Wood));
        assert!(w.place_furniture(spot, FurnitureKind::Torch, Orientation::Right));

        let other = GridCoord::new(40, 30);
        w.set_foreground(GridCoord::new(41, 30), Some(Foreground::Tile(TileMaterial::Stone)));
        assert!(w.place_furniture(other, FurnitureKind::Candle, Orientation::Left));
    }

    #[test]
    fn guarded_clear_skips_empty_cells() {
        let mut w = world();
        let c = GridCoord::new(10, 10);
        assert_eq!(
            apply_guarded(&mut w, c, Operation::ClearForeground),
            PlacementOutcome::AlreadyClear
        );
        assert_eq!(
            apply_guarded(&mut w, c, Operation::ClearBackground),
            PlacementOutcome::AlreadyClear
        );
        w.set_foreground(c, Some(Foreground::Tile(TileMaterial::Stone)));
        assert_eq!(
            apply_guarded(&mut w, c, Operation::ClearForeground),
            PlacementOutcome::Placed
        );
        assert_eq!(w.adjacency_refreshes(), 1);
    }

    #[test]
    fn guarded_placement_reports_rejection() {
        let mut w = world();
        let c = GridCoord::new(10, 10);
        // Nothing under the chair: the grid refuses.
        let op = Operation::PlaceFurniture(FurnitureKind::Chair, Orientation::Right);
        assert_eq!(apply_guarded(&mut w, c, op), PlacementOutcome::Rejected);
        assert_eq!(w.adjacency_refreshes(), 0);
    }

    #[test]
    fn guarded_furniture_checks_whole_footprint_bounds() {
        let mut w = world();
        // Bookcase is 4 tall: from y = 6 it reaches y = 3, inside the margin.
        let op = Operation::PlaceFurniture(FurnitureKind::Bookcase, Orientation::Right);
        assert_eq!(
            apply_guarded(&mut w, GridCoord::new(20, 6), op),
            PlacementOutcome::OutOfBounds
        );
    }

    #[test]
    fn adjacency_refreshes_are_counted() {
        let mut w = world();
        w.refresh_adjacency(GridCoord::new(1, 1));
        w.refresh_adjacency(GridCoord::new(1, 2));
        assert_eq!(w.adjacency_refreshes(), 2);
    }
}
