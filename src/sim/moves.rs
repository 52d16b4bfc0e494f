//! Move engine: traversal order, slide/merge resolution, move availability
//!
//! Cells farthest along the movement vector are processed first, so a single
//! pass cascades every slide and merge without revisiting a tile.

use serde::{Deserialize, Serialize};

use super::grid::{Cell, Grid, Tile};

/// Movement direction, indexed 0..=3 as up, right, down, left
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Right,
    Down,
    Left,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
    ];

    /// Map an input index (0-3) to a direction
    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    pub fn index(self) -> u8 {
        self as u8
    }

    /// Unit vector in board coordinates (y grows downward)
    pub fn vector(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Right => (1, 0),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
        }
    }
}

/// Per-axis iteration order for one move
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Traversal {
    pub xs: Vec<usize>,
    pub ys: Vec<usize>,
}

/// Build the traversal so cells nearest the target edge come first
pub fn traversal(size: usize, direction: Direction) -> Traversal {
    let (dx, dy) = direction.vector();
    let mut xs: Vec<usize> = (0..size).collect();
    let mut ys: Vec<usize> = (0..size).collect();
    if dx == 1 {
        xs.reverse();
    }
    if dy == 1 {
        ys.reverse();
    }
    Traversal { xs, ys }
}

/// Slide from `cell` along `vector` while the way is clear.
///
/// Returns the last empty cell reached and the first blocking cell beyond it
/// (`None` when the board edge was hit).
pub fn find_farthest(grid: &Grid, cell: Cell, vector: (i32, i32)) -> (Cell, Option<Cell>) {
    let mut farthest = cell;
    loop {
        match farthest.step(vector, grid.size()) {
            Some(next) if !grid.is_occupied(next) => farthest = next,
            next => return (farthest, next),
        }
    }
}

/// A merge produced during a move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Merge {
    pub cell: Cell,
    pub value: u32,
}

/// Result of resolving one move on the grid
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlideOutcome {
    pub moved: bool,
    /// Sum of merge results this move
    pub score: u32,
    pub merges: Vec<Merge>,
}

/// Save positions and clear merge provenance before a move
fn prepare_tiles(grid: &mut Grid) {
    for tile in grid.tiles_mut() {
        tile.merged_from = None;
        tile.just_spawned = false;
        tile.save_position();
    }
}

/// Some tile has an empty or equal-valued neighbour along `direction`
pub fn can_move(grid: &Grid, direction: Direction) -> bool {
    let vector = direction.vector();
    grid.tiles().any(|tile| {
        tile.pos
            .step(vector, grid.size())
            .is_some_and(|next| grid.get(next).is_none_or(|other| other.value == tile.value))
    })
}

/// Resolve a move in place. Does not spawn; that is the state machine's job.
///
/// A blocked move leaves the grid untouched, animation flags included.
pub fn slide(grid: &mut Grid, direction: Direction) -> SlideOutcome {
    let vector = direction.vector();
    let order = traversal(grid.size(), direction);
    let mut outcome = SlideOutcome::default();

    if !can_move(grid, direction) {
        return outcome;
    }
    prepare_tiles(grid);

    for &x in &order.xs {
        for &y in &order.ys {
            let cell = Cell::new(x, y);
            let Some(value) = grid.get(cell).map(|t| t.value) else {
                continue;
            };

            let (farthest, next) = find_farthest(grid, cell, vector);
            let mergeable = next.filter(|n| {
                grid.get(*n)
                    .is_some_and(|t| t.value == value && t.merged_from.is_none())
            });

            if let Some(target_cell) = mergeable {
                let (Some(mut moving), Some(target)) = (grid.remove(cell), grid.remove(target_cell))
                else {
                    continue;
                };
                moving.pos = target_cell;

                let id = grid.next_tile_id();
                let mut merged = Tile::new(id, value * 2, target_cell);
                merged.merged_from = Some(Box::new([moving, target]));
                grid.insert(merged);

                outcome.score += value * 2;
                outcome.merges.push(Merge {
                    cell: target_cell,
                    value: value * 2,
                });
                outcome.moved = true;
            } else if farthest != cell {
                grid.relocate(cell, farthest);
                outcome.moved = true;
            }
        }
    }

    outcome
}

/// Any two orthogonally adjacent tiles share a value
pub fn tile_matches_available(grid: &Grid) -> bool {
    grid.cells().any(|cell| {
        let Some(value) = grid.get(cell).map(|t| t.value) else {
            return false;
        };
        Direction::ALL.iter().any(|d| {
            cell.step(d.vector(), grid.size())
                .and_then(|n| grid.get(n))
                .is_some_and(|other| other.value == value)
        })
    })
}

/// A move can still change the board
pub fn moves_available(grid: &Grid) -> bool {
    grid.tile_count() < grid.size() * grid.size() || tile_matches_available(grid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn grid_with(tiles: &[((usize, usize), u32)]) -> Grid {
        let mut grid = Grid::new(4);
        for &((x, y), v) in tiles {
            grid.spawn(v, Cell::new(x, y));
        }
        grid.clear_transient();
        grid
    }

    fn value_at(grid: &Grid, x: usize, y: usize) -> Option<u32> {
        grid.get(Cell::new(x, y)).map(|t| t.value)
    }

    #[test]
    fn test_direction_indices() {
        assert_eq!(Direction::from_index(0), Some(Direction::Up));
        assert_eq!(Direction::from_index(3), Some(Direction::Left));
        assert_eq!(Direction::from_index(4), None);
        assert_eq!(Direction::Right.vector(), (1, 0));
    }

    #[test]
    fn test_traversal_reverses_toward_target() {
        let t = traversal(4, Direction::Right);
        assert_eq!(t.xs, vec![3, 2, 1, 0]);
        assert_eq!(t.ys, vec![0, 1, 2, 3]);

        let t = traversal(4, Direction::Down);
        assert_eq!(t.xs, vec![0, 1, 2, 3]);
        assert_eq!(t.ys, vec![3, 2, 1, 0]);
    }

    #[test]
    fn test_find_farthest() {
        let grid = grid_with(&[((3, 0), 2), ((0, 0), 4)]);
        let (farthest, next) = find_farthest(&grid, Cell::new(3, 0), (-1, 0));
        assert_eq!(farthest, Cell::new(1, 0));
        assert_eq!(next, Some(Cell::new(0, 0)));

        let (farthest, next) = find_farthest(&grid, Cell::new(0, 0), (-1, 0));
        assert_eq!(farthest, Cell::new(0, 0));
        assert_eq!(next, None);
    }

    #[test]
    fn test_far_apart_pair_merges_left() {
        let mut grid = grid_with(&[((0, 0), 2), ((3, 0), 2)]);
        let out = slide(&mut grid, Direction::Left);

        assert!(out.moved);
        assert_eq!(out.score, 4);
        assert_eq!(value_at(&grid, 0, 0), Some(4));
        assert_eq!(grid.tile_count(), 1);

        let merged = grid.get(Cell::new(0, 0)).and_then(|t| t.merged_from.as_ref());
        let sources = merged.map(|m| (m[0].previous, m[1].previous));
        assert_eq!(sources, Some((Some(Cell::new(3, 0)), Some(Cell::new(0, 0)))));
    }

    #[test]
    fn test_no_triple_merge() {
        let mut grid = grid_with(&[((0, 0), 2), ((1, 0), 2), ((2, 0), 4)]);
        let out = slide(&mut grid, Direction::Left);

        assert_eq!(value_at(&grid, 0, 0), Some(4));
        assert_eq!(value_at(&grid, 1, 0), Some(4));
        assert_eq!(out.merges.len(), 1);
    }

    #[test]
    fn test_four_in_row_makes_two_pairs() {
        let mut grid = grid_with(&[((0, 1), 2), ((1, 1), 2), ((2, 1), 2), ((3, 1), 2)]);
        let out = slide(&mut grid, Direction::Right);

        assert_eq!(value_at(&grid, 3, 1), Some(4));
        assert_eq!(value_at(&grid, 2, 1), Some(4));
        assert_eq!(grid.tile_count(), 2);
        assert_eq!(out.score, 8);
    }

    #[test]
    fn test_blocked_move_reports_not_moved() {
        let mut grid = grid_with(&[((0, 0), 2), ((0, 1), 4)]);
        let before = grid.values();
        let out = slide(&mut grid, Direction::Left);
        assert!(!out.moved);
        assert_eq!(grid.values(), before);
    }

    #[test]
    fn test_blocked_move_keeps_tile_flags() {
        let mut grid = grid_with(&[((0, 0), 2), ((0, 1), 4)]);
        assert!(slide(&mut grid, Direction::Down).moved);
        grid.spawn(2, Cell::new(1, 3));
        let previous = grid.get(Cell::new(0, 3)).and_then(|t| t.previous);
        assert_eq!(previous, Some(Cell::new(0, 1)));

        let out = slide(&mut grid, Direction::Left);
        assert!(!out.moved);
        assert!(grid.get(Cell::new(1, 3)).is_some_and(|t| t.just_spawned));
        assert_eq!(grid.get(Cell::new(0, 3)).and_then(|t| t.previous), previous);
        assert!(!can_move(&grid, Direction::Left));
        assert!(can_move(&grid, Direction::Right));
    }

    #[test]
    fn test_moves_available() {
        let stuck = Grid::from_values(
            4,
            &[
                Some(2), Some(4), Some(2), Some(4),
                Some(4), Some(2), Some(4), Some(2),
                Some(2), Some(4), Some(2), Some(4),
                Some(4), Some(2), Some(4), Some(2),
            ],
        );
        assert!(!moves_available(&stuck));

        let open = grid_with(&[((0, 0), 2)]);
        assert!(moves_available(&open));
    }

    fn arb_values() -> impl Strategy<Value = Vec<Option<u32>>> {
        prop::collection::vec(prop::option::weighted(0.6, (1u32..=10).prop_map(|e| 1 << e)), 16)
    }

    proptest! {
        #[test]
        fn prop_no_op_move_leaves_grid_unchanged(values in arb_values(), dir in 0u8..4) {
            let mut grid = Grid::from_values(4, &values);
            let direction = Direction::from_index(dir).unwrap();
            let out = slide(&mut grid, direction);
            prop_assert_eq!(out.moved, can_move(&Grid::from_values(4, &values), direction));
            if !out.moved {
                prop_assert_eq!(grid.values(), values);
                prop_assert_eq!(out.score, 0);
            }
        }

        #[test]
        fn prop_slide_conserves_mass(values in arb_values(), dir in 0u8..4) {
            let mut grid = Grid::from_values(4, &values);
            let before = grid.total();
            let out = slide(&mut grid, Direction::from_index(dir).unwrap());
            prop_assert_eq!(grid.total(), before);
            let merged: u32 = out.merges.iter().map(|m| m.value).sum();
            prop_assert_eq!(merged, out.score);
        }

        #[test]
        fn prop_positions_stay_consistent(values in arb_values(), dir in 0u8..4) {
            let mut grid = Grid::from_values(4, &values);
            let count = grid.tile_count();
            let out = slide(&mut grid, Direction::from_index(dir).unwrap());
            prop_assert!(grid.positions_consistent());
            prop_assert_eq!(grid.tile_count(), count - out.merges.len());
        }

        #[test]
        fn prop_merged_tiles_consume_equal_pair(values in arb_values(), dir in 0u8..4) {
            let mut grid = Grid::from_values(4, &values);
            slide(&mut grid, Direction::from_index(dir).unwrap());
            for tile in grid.tiles() {
                if let Some(sources) = &tile.merged_from {
                    prop_assert_eq!(sources[0].value, sources[1].value);
                    prop_assert_eq!(sources[0].value * 2, tile.value);
                    prop_assert!(sources[0].merged_from.is_none());
                    prop_assert!(sources[1].merged_from.is_none());
                }
            }
        }
    }
}
