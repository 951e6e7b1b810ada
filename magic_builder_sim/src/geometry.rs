// Geometry planner: structure kind + anchor + orientation -> named cell sets.
//
// Every structure is described as data (`StructureSpec`): a list of `Band`s
// plus a furniture layout table. A band covers a run of levels above the
// anchor row with a shape (`Rect` or `Taper`), a fill (`Solid` or an
// edge-only `Outline`), and optional exclusions that punch holes (doors,
// stairwells, floor gaps). Bands sharing a name merge into one `CellSet`.
//
// Planning is a pure function. The spec is always written for
// `Orientation::Right`; a `Left` plan is produced by one mirror transform at
// the end (`dx -> -dx` about the anchor column, furniture facing flipped).
// Out-of-bounds coordinates are dropped at a single clamp point after
// mirroring, so nothing downstream ever sees them.
//
// See also: `structures.rs` for the preset specs, `row_index.rs` which
// groups a plan's cells by row, `preview.rs` which derives an outline from
// the same plan.
//
// **Critical constraint: determinism.** Cell sets are `BTreeSet`s and the set
// list keeps band order, so identical inputs give identical plans.

use crate::error::BuildError;
use crate::types::{
    CellRole, FurnitureKind, GridCoord, Operation, Orientation, Stage, StructureKind,
    WorldBounds,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// ---------------------------------------------------------------------------
// Spec data model
// ---------------------------------------------------------------------------

/// A run of levels above the anchor row: `bottom .. bottom + height`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Levels {
    pub bottom: i32,
    pub height: i32,
}

impl Levels {
    pub const fn new(bottom: i32, height: i32) -> Self {
        Self { bottom, height }
    }

    /// Inclusive range `first..=last`.
    pub const fn span(first: i32, last: i32) -> Self {
        Self::new(first, last - first + 1)
    }

    pub const fn single(level: i32) -> Self {
        Self::new(level, 1)
    }
}

/// Horizontal extent of a band, as column offsets from the anchor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Shape {
    /// Constant width starting at column offset `left`.
    Rect { left: i32, width: i32 },
    /// Narrows by one column on each side per row:
    /// `width(row) = base_width - 2 * row`, starting at `left + row`. Rows
    /// whose width would be `<= 0` end the band.
    Taper { left: i32, base_width: i32 },
}

/// Which cells of the band's shape are kept.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Fill {
    Solid,
    /// Only cells within `thickness` of a flagged edge.
    Outline {
        left: bool,
        right: bool,
        top: bool,
        bottom: bool,
        thickness: i32,
    },
}

impl Fill {
    /// All four edges.
    pub const fn ring() -> Self {
        Self::Outline {
            left: true,
            right: true,
            top: true,
            bottom: true,
            thickness: 1,
        }
    }

    /// Open-topped U.
    pub const fn cup() -> Self {
        Self::Outline {
            left: true,
            right: true,
            top: false,
            bottom: true,
            thickness: 1,
        }
    }

    /// Side walls plus a ceiling; the floor comes from elsewhere.
    pub const fn cap() -> Self {
        Self::Outline {
            left: true,
            right: true,
            top: true,
            bottom: false,
            thickness: 1,
        }
    }

    pub const fn sides(thickness: i32) -> Self {
        Self::Outline {
            left: true,
            right: true,
            top: false,
            bottom: false,
            thickness,
        }
    }

    /// `row`/`col` index the shape's own rows and columns.
    fn keeps(self, row: i32, rows: i32, col: i32, cols: i32) -> bool {
        match self {
            Fill::Solid => true,
            Fill::Outline {
                left,
                right,
                top,
                bottom,
                thickness,
            } => {
                (left && col < thickness)
                    || (right && col >= cols - thickness)
                    || (bottom && row < thickness)
                    || (top && row >= rows - thickness)
            }
        }
    }
}

/// Columns an exclusion applies to (inclusive).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Columns {
    /// Column offsets from the anchor.
    Absolute { from: i32, to: i32 },
    /// Column indices from the start of the band's row.
    Relative { from: i32, to: i32 },
}

/// A hole in a band: cells on `first_level..=last_level` within `columns`
/// are never emitted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exclusion {
    pub first_level: i32,
    pub last_level: i32,
    pub columns: Columns,
}

impl Exclusion {
    pub const fn at(first_level: i32, last_level: i32, from: i32, to: i32) -> Self {
        Self {
            first_level,
            last_level,
            columns: Columns::Absolute { from, to },
        }
    }

    fn covers(&self, level: i32, dx: i32, col: i32) -> bool {
        if level < self.first_level || level > self.last_level {
            return false;
        }
        match self.columns {
            Columns::Absolute { from, to } => (from..=to).contains(&dx),
            Columns::Relative { from, to } => (from..=to).contains(&col),
        }
    }
}

/// One geometric primitive contributing cells to the set named `set`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Band {
    pub set: String,
    pub role: CellRole,
    pub operation: Operation,
    pub levels: Levels,
    pub shape: Shape,
    pub fill: Fill,
    #[serde(default)]
    pub exclusions: Vec<Exclusion>,
}

impl Band {
    pub fn new(
        set: &str,
        role: CellRole,
        operation: Operation,
        levels: Levels,
        shape: Shape,
    ) -> Self {
        Self {
            set: set.to_string(),
            role,
            operation,
            levels,
            shape,
            fill: Fill::Solid,
            exclusions: Vec::new(),
        }
    }

    pub fn fill(mut self, fill: Fill) -> Self {
        self.fill = fill;
        self
    }

    pub fn excluding(mut self, exclusion: Exclusion) -> Self {
        self.exclusions.push(exclusion);
        self
    }

    /// `(level, first column offset, width)` for each row the band covers.
    fn rows(&self) -> Vec<(i32, i32, i32)> {
        let mut rows = Vec::new();
        for row in 0..self.levels.height {
            let level = self.levels.bottom + row;
            match self.shape {
                Shape::Rect { left, width } => rows.push((level, left, width)),
                Shape::Taper { left, base_width } => {
                    let width = base_width - 2 * row;
                    if width <= 0 {
                        break;
                    }
                    rows.push((level, left + row, width));
                }
            }
        }
        rows
    }

    /// Canonical (`Right`) cells as `(dx, level)` pairs.
    fn offsets(&self) -> Vec<(i32, i32)> {
        let rows = self.rows();
        let row_count = rows.len() as i32;
        let mut out = Vec::new();
        for (row, &(level, start, width)) in rows.iter().enumerate() {
            for col in 0..width {
                let dx = start + col;
                if self.exclusions.iter().any(|e| e.covers(level, dx, col)) {
                    continue;
                }
                if self.fill.keeps(row as i32, row_count, col, width) {
                    out.push((dx, level));
                }
            }
        }
        out
    }
}

/// One entry of a structure's furniture layout table. The offset is the
/// furniture's origin tile (see `FurnitureKind::footprint`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FurnitureSlot {
    pub set: String,
    pub role: CellRole,
    pub kind: FurnitureKind,
    pub dx: i32,
    pub level: i32,
    pub facing: Orientation,
}

impl FurnitureSlot {
    pub fn new(
        set: &str,
        role: CellRole,
        kind: FurnitureKind,
        dx: i32,
        level: i32,
        facing: Orientation,
    ) -> Self {
        Self {
            set: set.to_string(),
            role,
            kind,
            dx,
            level,
            facing,
        }
    }
}

/// Data description of one structure kind, written for `Orientation::Right`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureSpec {
    /// Nominal footprint width in columns.
    pub width: i32,
    /// Nominal footprint height in rows.
    pub height: i32,
    pub bands: Vec<Band>,
    #[serde(default)]
    pub furniture: Vec<FurnitureSlot>,
}

impl StructureSpec {
    /// Structural checks used by config loading.
    pub fn validate(&self) -> Result<(), String> {
        if self.width <= 0 || self.height <= 0 {
            return Err(format!(
                "structure size must be positive, got {}x{}",
                self.width, self.height
            ));
        }
        let mut seen: BTreeMap<&str, (CellRole, Operation)> = BTreeMap::new();
        for band in &self.bands {
            if band.role.stage() != Stage::Rows && band.role != CellRole::PlatformFill {
                return Err(format!("band '{}' has furniture role {:?}", band.set, band.role));
            }
            if matches!(band.operation, Operation::PlaceFurniture(..)) {
                return Err(format!("band '{}' places furniture", band.set));
            }
            if band.levels.height <= 0 {
                return Err(format!("band '{}' has no levels", band.set));
            }
            check_merge(&mut seen, &band.set, band.role, band.operation)?;
        }
        for slot in &self.furniture {
            if slot.role.stage() == Stage::Rows {
                return Err(format!("furniture '{}' has row role {:?}", slot.set, slot.role));
            }
            check_merge(
                &mut seen,
                &slot.set,
                slot.role,
                Operation::PlaceFurniture(slot.kind, slot.facing),
            )?;
        }
        Ok(())
    }
}

fn check_merge<'a>(
    seen: &mut BTreeMap<&'a str, (CellRole, Operation)>,
    set: &'a str,
    role: CellRole,
    operation: Operation,
) -> Result<(), String> {
    match seen.get(set) {
        Some(&existing) if existing != (role, operation) => Err(format!(
            "set '{set}' mixes {:?}/{:?} with {role:?}/{operation:?}",
            existing.0, existing.1
        )),
        Some(_) => Ok(()),
        None => {
            seen.insert(set, (role, operation));
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// Plan output
// ---------------------------------------------------------------------------

/// A named group of coordinates that all receive the same operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellSet {
    pub name: String,
    pub role: CellRole,
    pub operation: Operation,
    pub cells: BTreeSet<GridCoord>,
}

/// Everything needed to execute one build. Orientation is captured here and
/// never re-read from any live source.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildPlan {
    pub kind: StructureKind,
    pub anchor: GridCoord,
    pub orientation: Orientation,
    pub cell_sets: Vec<CellSet>,
}

impl BuildPlan {
    pub fn set(&self, name: &str) -> Option<&CellSet> {
        self.cell_sets.iter().find(|s| s.name == name)
    }

    pub fn sets_with_role(&self, role: CellRole) -> impl Iterator<Item = &CellSet> {
        self.cell_sets.iter().filter(move |s| s.role == role)
    }

    /// Union of the cells of every set with `role`.
    pub fn cells_for_role(&self, role: CellRole) -> BTreeSet<GridCoord> {
        self.sets_with_role(role)
            .flat_map(|s| s.cells.iter().copied())
            .collect()
    }

    /// Every coordinate the plan touches, including furniture footprints.
    pub fn footprint(&self) -> BTreeSet<GridCoord> {
        let mut cells = BTreeSet::new();
        for set in &self.cell_sets {
            match set.operation {
                Operation::PlaceFurniture(kind, facing) => {
                    for origin in &set.cells {
                        cells.extend(kind.footprint(*origin, facing));
                    }
                }
                _ => cells.extend(set.cells.iter().copied()),
            }
        }
        cells
    }

    pub fn cell_count(&self) -> usize {
        self.cell_sets.iter().map(|s| s.cells.len()).sum()
    }
}

// ---------------------------------------------------------------------------
// Planner
// ---------------------------------------------------------------------------

/// Turns `StructureSpec`s into `BuildPlan`s for concrete anchors.
#[derive(Clone, Debug)]
pub struct GeometryPlanner {
    specs: BTreeMap<StructureKind, StructureSpec>,
    bounds: WorldBounds,
}

impl GeometryPlanner {
    pub fn new(specs: BTreeMap<StructureKind, StructureSpec>, bounds: WorldBounds) -> Self {
        Self { specs, bounds }
    }

    pub fn bounds(&self) -> WorldBounds {
        self.bounds
    }

    pub fn spec(&self, kind: StructureKind) -> Option<&StructureSpec> {
        self.specs.get(&kind)
    }

    /// Compute the full plan, clamped to the planner's bounds. Fails only
    /// when `kind` has no spec.
    pub fn plan(
        &self,
        kind: StructureKind,
        anchor: GridCoord,
        orientation: Orientation,
    ) -> Result<BuildPlan, BuildError> {
        self.plan_in(kind, anchor, orientation, self.bounds)
    }

    /// As `plan`, clamped to `bounds` instead (usually the live grid's).
    pub fn plan_in(
        &self,
        kind: StructureKind,
        anchor: GridCoord,
        orientation: Orientation,
        bounds: WorldBounds,
    ) -> Result<BuildPlan, BuildError> {
        let spec = self
            .specs
            .get(&kind)
            .ok_or(BuildError::UnknownStructure(kind))?;

        // Canonical pass: merge by name, keep first-seen order.
        let mut sets: Vec<CellSet> = Vec::new();
        let mut index: BTreeMap<String, usize> = BTreeMap::new();
        let mut add = |name: &str, role, operation, coords: Vec<GridCoord>| {
            let slot = match index.get(name) {
                Some(&i) => i,
                None => {
                    index.insert(name.to_string(), sets.len());
                    sets.push(CellSet {
                        name: name.to_string(),
                        role,
                        operation,
                        cells: BTreeSet::new(),
                    });
                    sets.len() - 1
                }
            };
            sets[slot].cells.extend(coords);
        };

        for band in &spec.bands {
            let coords = band
                .offsets()
                .into_iter()
                .filter_map(|(dx, level)| anchor.checked_up_by(dx, level))
                .collect();
            add(&band.set, band.role, band.operation, coords);
        }
        for slot in &spec.furniture {
            add(
                &slot.set,
                slot.role,
                Operation::PlaceFurniture(slot.kind, slot.facing),
                anchor.checked_up_by(slot.dx, slot.level).into_iter().collect(),
            );
        }

        // Mirror, then clamp. A coordinate past the i32 range is off the
        // world anyway and is dropped with the rest.
        for set in &mut sets {
            if orientation == Orientation::Left {
                set.operation = set.operation.mirrored();
                set.cells = set
                    .cells
                    .iter()
                    .filter_map(|c| c.checked_mirrored_about(anchor.x))
                    .collect();
            }
            set.cells.retain(|c| bounds.contains(*c));
        }

        Ok(BuildPlan {
            kind,
            anchor,
            orientation,
            cell_sets: sets,
        })
    }
}
