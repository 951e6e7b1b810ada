// Row index: a build plan's cells grouped by row, bottom to top.
//
// The scheduler applies one row per action tick. `RowIndex::build` collects
// the distinct rows touched by any cell set, sorts them descending (y grows
// downward, so the largest y is the bottom row), and records for each row
// which columns of which set fall on it. Every set is indexed, including
// furnishing and lighting sets, so the union over rows equals the union over
// sets. The scheduler walks only `action_rows`, the rows holding row-stage
// cells, so a row touched by nothing but a furniture origin never costs a
// cadence of its own.
//
// See also: `geometry.rs` for `BuildPlan`, `scheduler.rs` which walks the
// index with a cursor.

use crate::geometry::BuildPlan;
use crate::types::Stage;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeMap;

/// The columns of one cell set that lie on a given row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowCells {
    /// Index into `BuildPlan::cell_sets`.
    pub set: usize,
    /// Ascending.
    pub columns: SmallVec<[i32; 16]>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowSlice {
    pub y: i32,
    /// Ordered by set index.
    pub cells: Vec<RowCells>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowIndex {
    rows: Vec<RowSlice>,
}

impl RowIndex {
    pub fn build(plan: &BuildPlan) -> Self {
        let mut by_row: BTreeMap<i32, Vec<RowCells>> = BTreeMap::new();
        for (set_index, set) in plan.cell_sets.iter().enumerate() {
            // BTreeSet order is (y, x), so each row's columns arrive sorted
            // and contiguous.
            for cell in &set.cells {
                let row = by_row.entry(cell.y).or_default();
                match row.last_mut() {
                    Some(last) if last.set == set_index => last.columns.push(cell.x),
                    _ => row.push(RowCells {
                        set: set_index,
                        columns: SmallVec::from_slice(&[cell.x]),
                    }),
                }
            }
        }
        let rows = by_row
            .into_iter()
            .rev()
            .map(|(y, cells)| RowSlice { y, cells })
            .collect();
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, cursor: usize) -> Option<&RowSlice> {
        self.rows.get(cursor)
    }

    pub fn rows(&self) -> &[RowSlice] {
        &self.rows
    }

    /// Row y values in processing order.
    pub fn ys(&self) -> impl Iterator<Item = i32> + '_ {
        self.rows.iter().map(|r| r.y)
    }

    /// Positions in `rows()` of the rows with at least one row-stage cell,
    /// in processing order. `plan` must be the plan this index was built
    /// from.
    pub fn action_rows(&self, plan: &BuildPlan) -> Vec<usize> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, row)| {
                row.cells.iter().any(|rc| {
                    plan
                        .cell_sets
                        .get(rc.set)
                        .is_some_and(|set| set.role.stage() == Stage::Rows)
                })
            })
            .map(|(i, _)| i)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BuilderConfig;
    use crate::geometry::CellSet;
    use crate::types::{
        CellRole, FurnitureKind, GridCoord, Operation, Orientation, StructureKind,
    };
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    fn plan(kind: StructureKind, orientation: Orientation) -> BuildPlan {
        BuilderConfig::default()
            .planner()
            .plan(kind, GridCoord::new(1000, 800), orientation)
            .unwrap()
    }

    #[test]
    fn jail_rows_run_bottom_to_top() {
        let index = RowIndex::build(&plan(StructureKind::Jail, Orientation::Right));
        let ys: Vec<_> = index.ys().collect();
        assert_eq!(ys, (791..=800).rev().collect::<Vec<_>>());
    }

    #[test]
    fn union_over_rows_equals_union_over_sets() {
        for kind in StructureKind::ALL {
            for orientation in Orientation::BOTH {
                let plan = plan(kind, orientation);
                let index = RowIndex::build(&plan);

                let mut from_rows: Vec<(usize, GridCoord)> = Vec::new();
                for row in index.rows() {
                    for rc in &row.cells {
                        for &x in &rc.columns {
                            from_rows.push((rc.set, GridCoord::new(x, row.y)));
                        }
                    }
                }
                let expected: usize = plan.cell_count();
                assert_eq!(from_rows.len(), expected, "{kind:?} has duplicates or gaps");

                let unique: BTreeSet<_> = from_rows.into_iter().collect();
                let from_sets: BTreeSet<_> = plan
                    .cell_sets
                    .iter()
                    .enumerate()
                    .flat_map(|(i, s)| s.cells.iter().map(move |c| (i, *c)))
                    .collect();
                assert_eq!(unique, from_sets);
            }
        }
    }

    #[test]
    fn columns_are_sorted_within_a_row() {
        let index = RowIndex::build(&plan(StructureKind::MediumHouse, Orientation::Left));
        for row in index.rows() {
            for rc in &row.cells {
                assert!(rc.columns.windows(2).all(|w| w[0] < w[1]));
            }
            assert!(row.cells.windows(2).all(|w| w[0].set < w[1].set));
        }
    }

    #[test]
    fn building_twice_gives_the_same_index() {
        for kind in StructureKind::ALL {
            for orientation in Orientation::BOTH {
                let p = plan(kind, orientation);
                let first = RowIndex::build(&p);
                assert_eq!(first, RowIndex::build(&p.clone()), "{kind:?} {orientation:?}");
                // A fresh plan from the same inputs indexes identically too.
                let replanned = RowIndex::build(&plan(kind, orientation));
                assert_eq!(
                    first.ys().collect::<Vec<_>>(),
                    replanned.ys().collect::<Vec<_>>()
                );
                assert_eq!(first, replanned);
            }
        }
    }

    proptest! {
        #[test]
        fn index_is_deterministic_over_anchors(
            k in prop::sample::select(StructureKind::ALL.to_vec()),
            left in any::<bool>(),
            x in 0i32..8400,
            y in 0i32..2400,
        ) {
            let o = if left { Orientation::Left } else { Orientation::Right };
            let planner = BuilderConfig::default().planner();
            let a = planner.plan(k, GridCoord::new(x, y), o).unwrap();
            let b = planner.plan(k, GridCoord::new(x, y), o).unwrap();
            prop_assert_eq!(RowIndex::build(&a), RowIndex::build(&b));
            prop_assert_eq!(RowIndex::build(&a), RowIndex::build(&a.clone()));
        }
    }

    #[test]
    fn preset_rows_all_carry_row_work() {
        for kind in StructureKind::ALL {
            let plan = plan(kind, Orientation::Right);
            let index = RowIndex::build(&plan);
            assert_eq!(index.action_rows(&plan), (0..index.len()).collect::<Vec<_>>());
        }
    }

    #[test]
    fn furniture_only_row_is_indexed_but_not_an_action_row() {
        let mut plan = plan(StructureKind::Cage, Orientation::Right);
        // Cage rows are 797..=800; hang a lamp well above them.
        plan.cell_sets.push(CellSet {
            name: "lamp".to_string(),
            role: CellRole::Light,
            operation: Operation::PlaceFurniture(FurnitureKind::Torch, Orientation::Right),
            cells: [GridCoord::new(1000, 790)].into_iter().collect(),
        });
        let index = RowIndex::build(&plan);
        assert_eq!(index.len(), 5);
        assert_eq!(index.ys().last(), Some(790));
        assert_eq!(index.action_rows(&plan), vec![0, 1, 2, 3]);
    }

    #[test]
    fn empty_plan_has_no_rows() {
        let mut plan = plan(StructureKind::Cage, Orientation::Right);
        for set in &mut plan.cell_sets {
            set.cells.clear();
        }
        let index = RowIndex::build(&plan);
        assert!(index.is_empty());
        assert!(index.get(0).is_none());
    }
}
