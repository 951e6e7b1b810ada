// Read-only data for the host's placement overlay.
//
// While the user hovers with a build item, the host records the candidate
// anchor, kind, and facing here. The overlay renderer asks for the outline
// of the structure's dig region, computed through the same
// `GeometryPlanner` the build uses, so the preview always matches what will
// be built. Nothing here touches the grid.
//
// See also: `geometry.rs` for planning, `workshop.rs` which starts the build
// once the user commits.

use crate::geometry::{BuildPlan, GeometryPlanner};
use crate::types::{CellRole, GridCoord, Orientation, StructureKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoveredBuild {
    pub kind: StructureKind,
    pub anchor: GridCoord,
    pub orientation: Orientation,
}

#[derive(Clone, Debug, Default)]
pub struct Preview {
    hovered: Option<HoveredBuild>,
}

impl Preview {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hover(&mut self, kind: StructureKind, anchor: GridCoord, orientation: Orientation) {
        self.hovered = Some(HoveredBuild {
            kind,
            anchor,
            orientation,
        });
    }

    pub fn clear(&mut self) {
        self.hovered = None;
    }

    pub fn hovered(&self) -> Option<HoveredBuild> {
        self.hovered
    }

    pub fn current_anchor_and_kind(&self) -> Option<(GridCoord, StructureKind)> {
        self.hovered.map(|h| (h.anchor, h.kind))
    }

    /// The full plan for the hovered build, for overlays that draw layers.
    pub fn plan(&self, planner: &GeometryPlanner) -> Option<BuildPlan> {
        let h = self.hovered?;
        planner.plan(h.kind, h.anchor, h.orientation).ok()
    }

    /// Boundary cells of the dig region: those with at least one
    /// edge-adjacent neighbour outside it.
    pub fn outline(&self, planner: &GeometryPlanner) -> Option<BTreeSet<GridCoord>> {
        let dig = self.plan(planner)?.cells_for_role(CellRole::Dig);
        Some(
            dig.iter()
                .copied()
                .filter(|c| c.neighbors().iter().any(|n| !dig.contains(n)))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BuilderConfig;

    #[test]
    fn empty_preview_has_nothing_to_draw() {
        let planner = BuilderConfig::default().planner();
        let preview = Preview::new();
        assert!(preview.current_anchor_and_kind().is_none());
        assert!(preview.outline(&planner).is_none());
    }

    #[test]
    fn jail_outline_is_the_rectangle_border() {
        let planner = BuilderConfig::default().planner();
        let mut preview = Preview::new();
        preview.hover(StructureKind::Jail, GridCoord::new(100, 200), Orientation::Right);
        assert_eq!(
            preview.current_anchor_and_kind(),
            Some((GridCoord::new(100, 200), StructureKind::Jail))
        );
        let outline = preview.outline(&planner).unwrap();
        // 6x10 border: 2 * 6 + 2 * 8.
        assert_eq!(outline.len(), 28);
        assert!(outline.contains(&GridCoord::new(97, 191)));
        assert!(!outline.contains(&GridCoord::new(99, 195)));
    }

    #[test]
    fn outline_follows_the_taper() {
        let planner = BuilderConfig::default().planner();
        let mut preview = Preview::new();
        preview.hover(StructureKind::SmallHouse, GridCoord::new(500, 500), Orientation::Left);
        let outline = preview.outline(&planner).unwrap();
        let plan = preview.plan(&planner).unwrap();
        let dig = plan.cells_for_role(CellRole::Dig);
        assert!(outline.is_subset(&dig));
        // The apex row (2 wide) is entirely boundary.
        let top = dig.iter().map(|c| c.y).min().unwrap();
        assert!(dig.iter().filter(|c| c.y == top).all(|c| outline.contains(c)));
    }

    #[test]
    fn clear_forgets_the_hover() {
        let mut preview = Preview::new();
        preview.hover(StructureKind::Cage, GridCoord::new(10, 10), Orientation::Left);
        preview.clear();
        assert!(preview.hovered().is_none());
    }
}
