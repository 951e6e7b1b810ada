// Core types shared across the builder.
//
// Defines grid coordinates (`GridCoord`), world bounds, orientation, the
// structure kinds the mod can build, tile/wall/furniture materials, and the
// `Operation` / `CellRole` vocabulary that every `CellSet` is tagged with.
// All types derive `Serialize` and `Deserialize` so structure specs and
// configs can be loaded from JSON.
//
// Coordinate convention: `x` is the column, `y` is the row, and `y` grows
// downward (the host's tile convention). A structure's anchor is its
// bottom-centre tile; "level" N means the row N tiles above the anchor row,
// i.e. `y = anchor.y - N`.
//
// **Critical constraint: determinism.** `GridCoord` is totally ordered so it
// can key `BTreeSet`/`BTreeMap`. Never iterate a hash container when the
// order reaches the grid.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

// ---------------------------------------------------------------------------
// Spatial types
// ---------------------------------------------------------------------------

/// A tile position in world units.
///
/// Ordering is row-major (`y` first, then `x`) so that sorted sets of
/// coordinates read naturally row by row.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct GridCoord {
    pub y: i32,
    pub x: i32,
}

impl GridCoord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Offset by `dx` columns and `levels` rows *upward*.
    pub const fn up_by(self, dx: i32, levels: i32) -> Self {
        Self::new(self.x + dx, self.y - levels)
    }

    /// As `up_by`, or `None` if the result leaves the `i32` range.
    pub const fn checked_up_by(self, dx: i32, levels: i32) -> Option<Self> {
        match (self.x.checked_add(dx), self.y.checked_sub(levels)) {
            (Some(x), Some(y)) => Some(Self::new(x, y)),
            _ => None,
        }
    }

    /// Reflect about the column `axis_x`.
    pub const fn mirrored_about(self, axis_x: i32) -> Self {
        Self::new(2 * axis_x - self.x, self.y)
    }

    /// As `mirrored_about`, or `None` if the reflection leaves the `i32`
    /// range. Computed wide, so an axis near the limits still works when
    /// the result fits.
    pub fn checked_mirrored_about(self, axis_x: i32) -> Option<Self> {
        let x = 2 * i64::from(axis_x) - i64::from(self.x);
        i32::try_from(x).ok().map(|x| Self::new(x, self.y))
    }

    /// The four edge-adjacent neighbours.
    pub fn neighbors(self) -> [GridCoord; 4] {
        [
            Self::new(self.x + 1, self.y),
            Self::new(self.x - 1, self.y),
            Self::new(self.x, self.y + 1),
            Self::new(self.x, self.y - 1),
        ]
    }
}

impl fmt::Display for GridCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Playable extent of the world. A coordinate is inside when it is at least
/// `margin` tiles away from every edge.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldBounds {
    pub width: i32,
    pub height: i32,
    pub margin: i32,
}

impl WorldBounds {
    pub const fn new(width: i32, height: i32, margin: i32) -> Self {
        Self {
            width,
            height,
            margin,
        }
    }

    pub fn contains(&self, coord: GridCoord) -> bool {
        coord.x >= self.margin
            && coord.y >= self.margin
            && coord.x < self.width - self.margin
            && coord.y < self.height - self.margin
    }
}

/// Which way a structure (or a piece of furniture) faces.
///
/// `Right` is the canonical layout every `StructureSpec` is written in;
/// `Left` is its mirror image about the anchor column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Orientation {
    Right,
    Left,
}

impl Orientation {
    pub const BOTH: [Orientation; 2] = [Orientation::Right, Orientation::Left];

    /// +1 for `Right`, -1 for `Left`.
    pub const fn sign(self) -> i32 {
        match self {
            Self::Right => 1,
            Self::Left => -1,
        }
    }

    pub const fn mirrored(self) -> Self {
        match self {
            Self::Right => Self::Left,
            Self::Left => Self::Right,
        }
    }
}

// ---------------------------------------------------------------------------
// Structure kinds and materials
// ---------------------------------------------------------------------------

/// The structures the builder knows how to raise. Geometry for each lives
/// as data in a `StructureSpec` (see `structures.rs`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StructureKind {
    /// 6x4 open-topped U of platforms.
    Cage,
    /// 6x10 two-tier cell: platform U under a wooden ring.
    Jail,
    /// 18x15 single-room house with a tapered roof clearing.
    SmallHouse,
    /// 18x21 two-storey house with stairwells and a stone roof.
    MediumHouse,
}

impl StructureKind {
    pub const ALL: [StructureKind; 4] = [
        StructureKind::Cage,
        StructureKind::Jail,
        StructureKind::SmallHouse,
        StructureKind::MediumHouse,
    ];
}

/// Foreground (solid or semi-solid) tile materials.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TileMaterial {
    Platform,
    WoodBlock,
    Stone,
    GrayBrick,
}

/// Background wall materials.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WallMaterial {
    Wood,
    Stone,
    IronBrick,
    Glass,
    LivingWood,
}

/// Multi-tile placeable objects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FurnitureKind {
    Door,
    Workbench,
    Chair,
    Table,
    Bookcase,
    Bed,
    Dresser,
    Book,
    Torch,
    Candle,
}

impl FurnitureKind {
    /// (width, height) in tiles.
    pub const fn footprint_size(self) -> (i32, i32) {
        match self {
            Self::Door => (1, 3),
            Self::Workbench => (2, 1),
            Self::Chair => (1, 2),
            Self::Table => (3, 2),
            Self::Bookcase => (3, 4),
            Self::Bed => (4, 2),
            Self::Dresser => (3, 2),
            Self::Book | Self::Torch | Self::Candle => (1, 1),
        }
    }

    /// Light sources are placed last, after the adjacency frame settles.
    pub const fn is_light_source(self) -> bool {
        matches!(self, Self::Torch | Self::Candle)
    }

    /// Tiles covered by this object when its origin tile is `origin`.
    ///
    /// The origin is the bottom tile nearest the facing side's opposite
    /// edge: the footprint extends `width` columns in the facing direction
    /// and `height` rows upward. Mirroring the origin about any column and
    /// flipping the facing therefore mirrors the whole footprint.
    pub fn footprint(self, origin: GridCoord, facing: Orientation) -> SmallVec<[GridCoord; 16]> {
        let (width, height) = self.footprint_size();
        let mut cells = SmallVec::new();
        for level in 0..height {
            for i in 0..width {
                if let Some(c) = origin.checked_up_by(i * facing.sign(), level) {
                    cells.push(c);
                }
            }
        }
        cells
    }
}

/// What currently occupies a foreground cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Foreground {
    Tile(TileMaterial),
    Object(FurnitureKind),
    /// A tile no tool can break (chests, dungeon bricks).
    Unbreakable,
}

// ---------------------------------------------------------------------------
// Operations and roles
// ---------------------------------------------------------------------------

/// The single grid edit applied to every coordinate of a `CellSet`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    ClearForeground,
    ClearBackground,
    PlaceBackground(WallMaterial),
    PlaceForeground(TileMaterial),
    PlaceFurniture(FurnitureKind, Orientation),
}

impl Operation {
    /// Position of this operation class within a row. Clears come before
    /// any placement so a cell is emptied before it is refilled in the same
    /// row.
    pub const fn row_order(self) -> u8 {
        match self {
            Self::ClearForeground => 0,
            Self::ClearBackground => 1,
            Self::PlaceBackground(_) => 2,
            Self::PlaceForeground(_) => 3,
            Self::PlaceFurniture(..) => 4,
        }
    }

    /// The same operation as seen in the mirrored layout.
    pub const fn mirrored(self) -> Self {
        match self {
            Self::PlaceFurniture(kind, facing) => Self::PlaceFurniture(kind, facing.mirrored()),
            other => other,
        }
    }
}

/// What part of the structure a `CellSet` builds. The role decides which
/// stage of the build applies the set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CellRole {
    /// Foreground clearing of the whole footprint.
    Dig,
    /// Background clearing.
    WallClear,
    /// Background placement.
    WallPlace,
    /// Foreground frame tiles (floors, walls, roofs), one set per tier.
    Frame,
    Door,
    /// Platforms that fill gaps deliberately left in a frame.
    PlatformFill,
    /// Primary furniture (seating, storage, beds, tables).
    Furniture,
    /// Torches and candles.
    Light,
}

/// When during a build a role is applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Stage {
    /// Row by row, bottom to top.
    Rows,
    /// Once, right after the last row.
    Furnishing,
    /// Once, after the settle delay.
    Lighting,
}

impl CellRole {
    pub const fn stage(self) -> Stage {
        match self {
            Self::Dig | Self::WallClear | Self::WallPlace | Self::Frame => Stage::Rows,
            Self::Door | Self::PlatformFill | Self::Furniture => Stage::Furnishing,
            Self::Light => Stage::Lighting,
        }
    }

    /// Order of the furnishing-stage roles.
    pub const fn furnishing_order(self) -> u8 {
        match self {
            Self::Door => 0,
            Self::PlatformFill => 1,
            Self::Furniture => 2,
            _ => 3,
        }
    }
}
