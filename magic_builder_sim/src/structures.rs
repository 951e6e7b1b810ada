// Preset structure specs.
//
// One constructor per `StructureKind`, each returning the canonical
// (`Orientation::Right`) `StructureSpec`. `presets()` collects them into the
// table `BuilderConfig::default()` ships with; a JSON config may replace any
// entry.
//
// Offsets are column offsets from the anchor (the bottom-centre tile) and
// levels above the anchor row. Even widths put the anchor in the right half:
// an 18-wide footprint spans `dx = -9..=8`.
//
// See also: `geometry.rs` for how bands and furniture slots become cell
// sets, `config.rs` which owns the table.

use crate::geometry::{Band, Exclusion, Fill, FurnitureSlot, Levels, Shape, StructureSpec};
use crate::types::{
    CellRole, FurnitureKind, Operation, Orientation, StructureKind, TileMaterial, WallMaterial,
};
use std::collections::BTreeMap;

use crate::types::CellRole::{Dig, Frame, Furniture, Light, PlatformFill, WallClear, WallPlace};
use crate::types::Orientation::{Left, Right};

/// The default spec for every kind.
pub fn presets() -> BTreeMap<StructureKind, StructureSpec> {
    StructureKind::ALL
        .iter()
        .map(|&kind| (kind, preset(kind)))
        .collect()
}

pub fn preset(kind: StructureKind) -> StructureSpec {
    match kind {
        StructureKind::Cage => cage(),
        StructureKind::Jail => jail(),
        StructureKind::SmallHouse => small_house(),
        StructureKind::MediumHouse => medium_house(),
    }
}

fn rect(left: i32, width: i32) -> Shape {
    Shape::Rect { left, width }
}

fn taper(left: i32, base_width: i32) -> Shape {
    Shape::Taper { left, base_width }
}

fn dig(levels: Levels, shape: Shape) -> Band {
    Band::new("dig", Dig, Operation::ClearForeground, levels, shape)
}

fn wall_clear(levels: Levels, shape: Shape) -> Band {
    Band::new("wall_clear", WallClear, Operation::ClearBackground, levels, shape)
}

fn wall(set: &str, material: WallMaterial, levels: Levels, shape: Shape) -> Band {
    Band::new(set, WallPlace, Operation::PlaceBackground(material), levels, shape)
}

fn frame(set: &str, material: TileMaterial, levels: Levels, shape: Shape) -> Band {
    Band::new(set, Frame, Operation::PlaceForeground(material), levels, shape)
}

fn platform_fill(left: i32, width: i32, level: i32) -> Band {
    Band::new(
        "platform_fill",
        PlatformFill,
        Operation::PlaceForeground(TileMaterial::Platform),
        Levels::single(level),
        rect(left, width),
    )
}

fn slot(
    set: &str,
    role: CellRole,
    kind: FurnitureKind,
    dx: i32,
    level: i32,
    facing: Orientation,
) -> FurnitureSlot {
    FurnitureSlot::new(set, role, kind, dx, level, facing)
}

/// 6x4 open-topped U of platforms.
pub fn cage() -> StructureSpec {
    let levels = Levels::new(0, 4);
    StructureSpec {
        width: 6,
        height: 4,
        bands: vec![
            dig(levels, rect(-3, 6)),
            frame("frame", TileMaterial::Platform, levels, rect(-3, 6)).fill(Fill::cup()),
        ],
        furniture: Vec::new(),
    }
}

/// 6x10 cell: a platform U at the bottom, a wooden ring above it with a
/// wood back wall, a workbench and chair on the ring floor, and a torch.
pub fn jail() -> StructureSpec {
    StructureSpec {
        width: 6,
        height: 10,
        bands: vec![
            dig(Levels::new(0, 10), rect(-3, 6)),
            wall_clear(Levels::span(1, 8), rect(-2, 4)),
            wall("wall", WallMaterial::Wood, Levels::span(1, 8), rect(-2, 4)),
            frame("frame_lower", TileMaterial::Platform, Levels::new(0, 4), rect(-3, 6))
                .fill(Fill::cup()),
            frame("frame_upper", TileMaterial::WoodBlock, Levels::new(4, 6), rect(-3, 6))
                .fill(Fill::ring()),
        ],
        furniture: vec![
            slot("workbench", Furniture, FurnitureKind::Workbench, -2, 5, Right),
            slot("chair", Furniture, FurnitureKind::Chair, 0, 5, Left),
            slot("torch", Light, FurnitureKind::Torch, 1, 7, Right),
        ],
    }
}

/// 18x15 single room: gray-brick base with two platform gaps in its floor,
/// stone ring above, iron-brick back wall, tapered clearing on top.
pub fn small_house() -> StructureSpec {
    let base = Levels::new(0, 6);
    let upper = Levels::new(6, 9);
    StructureSpec {
        width: 18,
        height: 15,
        bands: vec![
            dig(base, rect(-9, 18)),
            dig(upper, taper(-9, 18)),
            wall_clear(base, rect(-9, 18)),
            wall_clear(upper, taper(-9, 18)),
            wall("wall", WallMaterial::IronBrick, base, rect(-7, 14)),
            wall("wall", WallMaterial::IronBrick, upper, taper(-7, 14)),
            frame("frame_lower", TileMaterial::GrayBrick, base, rect(-9, 18))
                .fill(Fill::cup())
                .excluding(Exclusion::at(0, 0, -1, -1))
                .excluding(Exclusion::at(0, 0, 1, 1)),
            frame("frame_upper", TileMaterial::Stone, upper, rect(-9, 18)).fill(Fill::ring()),
            platform_fill(-1, 1, 0),
            platform_fill(1, 1, 0),
        ],
        furniture: vec![
            slot("workbench", Furniture, FurnitureKind::Workbench, 0, 1, Right),
            slot("chair", Furniture, FurnitureKind::Chair, -1, 1, Right),
            slot("torch", Light, FurnitureKind::Torch, 0, 3, Right),
        ],
    }
}

/// Background bands for one storey whose floor sits on `floor`: wood
/// panelling over the interior with 2-wide glass windows at `windows`
/// (column offsets) framed in living wood above and below.
fn storey_walls(floor: i32, left: i32, width: i32, windows: &[i32]) -> Vec<Band> {
    let interior = Levels::span(floor + 1, floor + 5);
    let glass = floor + 3;
    let mut panelling = wall("wall_wood", WallMaterial::Wood, interior, rect(left, width));
    let mut bands = vec![wall(
        "wall_stone",
        WallMaterial::Stone,
        Levels::single(floor),
        rect(left, width),
    )];
    for &w in windows {
        panelling = panelling.excluding(Exclusion::at(glass - 1, glass + 1, w, w + 1));
        bands.push(wall(
            "wall_glass",
            WallMaterial::Glass,
            Levels::single(glass),
            rect(w, 2),
        ));
        for level in [glass - 1, glass + 1] {
            bands.push(wall(
                "wall_trim",
                WallMaterial::LivingWood,
                Levels::single(level),
                rect(w, 2),
            ));
        }
    }
    bands.insert(0, panelling);
    bands
}

/// 18x21 two-storey house. The ground floor is 16 wide with doors on both
/// sides; the upper storey is 12 wide, aligned to the left wall, with its
/// door on the inner side. Platform stairwells link the floors and the attic
/// under a 2-thick stone roof.
pub fn medium_house() -> StructureSpec {
    let base = Levels::span(0, 13);
    let attic = Levels::span(14, 20);
    let mut bands = vec![
        dig(base, rect(-9, 18)),
        dig(attic, taper(-8, 16)),
        wall_clear(base, rect(-9, 18)),
        wall_clear(attic, taper(-8, 16)),
    ];
    bands.extend(storey_walls(0, -7, 14, &[-5, 2]));
    bands.extend(storey_walls(6, -7, 10, &[-5, 0]));
    bands.push(wall("wall_stone", WallMaterial::Stone, Levels::span(12, 16), taper(-7, 10)));
    bands.extend([
        frame("floor", TileMaterial::GrayBrick, Levels::single(0), rect(-9, 18)),
        frame("frame", TileMaterial::WoodBlock, Levels::span(1, 6), rect(-8, 16))
            .fill(Fill::cap())
            .excluding(Exclusion::at(1, 3, -8, -8))
            .excluding(Exclusion::at(1, 3, 7, 7))
            .excluding(Exclusion::at(6, 6, -4, -1)),
        frame("frame", TileMaterial::WoodBlock, Levels::span(7, 12), rect(-8, 12))
            .fill(Fill::cap())
            .excluding(Exclusion::at(7, 9, 3, 3))
            .excluding(Exclusion::at(12, 12, -4, -1)),
        frame("roof", TileMaterial::Stone, Levels::span(13, 18), taper(-8, 12))
            .fill(Fill::sides(2)),
        platform_fill(-4, 4, 6),
        platform_fill(-4, 4, 12),
    ]);
    StructureSpec {
        width: 18,
        height: 21,
        bands,
        furniture: vec![
            slot("door_west", CellRole::Door, FurnitureKind::Door, -8, 1, Right),
            slot("door_east", CellRole::Door, FurnitureKind::Door, 7, 1, Left),
            slot("door_upper", CellRole::Door, FurnitureKind::Door, 3, 7, Left),
            slot("bookcase", Furniture, FurnitureKind::Bookcase, -7, 1, Right),
            slot("chair_west", Furniture, FurnitureKind::Chair, -2, 1, Right),
            slot("table", Furniture, FurnitureKind::Table, -1, 1, Right),
            slot("chair_east", Furniture, FurnitureKind::Chair, 2, 1, Left),
            slot("bed", Furniture, FurnitureKind::Bed, -7, 7, Right),
            slot("dresser", Furniture, FurnitureKind::Dresser, 0, 7, Right),
            slot("book", Furniture, FurnitureKind::Book, 1, 9, Right),
            slot("candle_table", Light, FurnitureKind::Candle, 0, 3, Right),
            slot("candle_bed", Light, FurnitureKind::Candle, -6, 9, Right),
        ],
    }
}
