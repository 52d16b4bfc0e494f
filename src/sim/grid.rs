//! Board model: cells, tiles and the N×N grid
//!
//! A tile reachable through `grid.get(cell)` always carries `tile.pos == cell`.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Integer board coordinate, `0 <= x, y < size`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub x: usize,
    pub y: usize,
}

impl Cell {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Manhattan distance between two cells
    pub fn manhattan(self, other: Cell) -> usize {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Step by a unit vector, returning `None` when leaving a `size`-wide board
    pub fn step(self, (dx, dy): (i32, i32), size: usize) -> Option<Cell> {
        let x = self.x as i64 + dx as i64;
        let y = self.y as i64 + dy as i64;
        let limit = size as i64;
        if (0..limit).contains(&x) && (0..limit).contains(&y) {
            Some(Cell::new(x as usize, y as usize))
        } else {
            None
        }
    }
}

/// A numbered piece on the board
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    /// Stable identity, preserved across slides and swaps
    pub id: u32,
    /// Power of two, >= 2
    pub value: u32,
    pub pos: Cell,
    /// Position before the last move (drives slide animation)
    pub previous: Option<Cell>,
    /// Snapshots of the two tiles consumed to produce this one (one frame only)
    pub merged_from: Option<Box<[Tile; 2]>>,
    pub just_spawned: bool,
}

impl Tile {
    pub fn new(id: u32, value: u32, pos: Cell) -> Self {
        Self {
            id,
            value,
            pos,
            previous: None,
            merged_from: None,
            just_spawned: false,
        }
    }

    /// Remember the current position as the animation origin
    pub fn save_position(&mut self) {
        self.previous = Some(self.pos);
    }

    /// Drop per-frame animation flags
    pub fn clear_transient(&mut self) {
        self.previous = None;
        self.merged_from = None;
        self.just_spawned = false;
    }
}

/// Fixed-size square board
#[derive(Debug, Clone)]
pub struct Grid {
    size: usize,
    cells: Vec<Option<Tile>>,
    next_id: u32,
}

impl Grid {
    /// Create an empty board
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![None; size * size],
            next_id: 1,
        }
    }

    /// Rebuild a board from per-cell values, indexed `x * size + y`
    pub fn from_values(size: usize, values: &[Option<u32>]) -> Self {
        let mut grid = Self::new(size);
        for (idx, value) in values.iter().enumerate().take(size * size) {
            if let Some(value) = *value {
                let cell = Cell::new(idx / size, idx % size);
                grid.spawn(value, cell);
            }
        }
        grid.clear_transient();
        grid
    }

    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    fn index(&self, cell: Cell) -> usize {
        cell.x * self.size + cell.y
    }

    /// True if the cell lies on the board
    pub fn contains(&self, cell: Cell) -> bool {
        cell.x < self.size && cell.y < self.size
    }

    pub fn get(&self, cell: Cell) -> Option<&Tile> {
        if !self.contains(cell) {
            return None;
        }
        self.cells[self.index(cell)].as_ref()
    }

    pub fn get_mut(&mut self, cell: Cell) -> Option<&mut Tile> {
        if !self.contains(cell) {
            return None;
        }
        let idx = self.index(cell);
        self.cells[idx].as_mut()
    }

    pub fn is_occupied(&self, cell: Cell) -> bool {
        self.get(cell).is_some()
    }

    /// Place a tile at its own position
    pub fn insert(&mut self, tile: Tile) {
        debug_assert!(self.contains(tile.pos), "tile outside the board");
        debug_assert!(!self.is_occupied(tile.pos), "cell already occupied");
        let idx = self.index(tile.pos);
        self.cells[idx] = Some(tile);
    }

    /// Take the tile out of a cell
    pub fn remove(&mut self, cell: Cell) -> Option<Tile> {
        if !self.contains(cell) {
            return None;
        }
        let idx = self.index(cell);
        self.cells[idx].take()
    }

    /// Move the tile at `from` to the empty cell `to`
    pub fn relocate(&mut self, from: Cell, to: Cell) {
        if from == to {
            return;
        }
        if let Some(mut tile) = self.remove(from) {
            tile.pos = to;
            self.insert(tile);
        }
    }

    /// Exchange the positions of two tiles, keeping their identities
    pub fn swap(&mut self, a: Cell, b: Cell) -> bool {
        if a == b || !self.is_occupied(a) || !self.is_occupied(b) {
            return false;
        }
        let (Some(mut ta), Some(mut tb)) = (self.remove(a), self.remove(b)) else {
            return false;
        };
        ta.previous = Some(a);
        tb.previous = Some(b);
        ta.pos = b;
        tb.pos = a;
        self.insert(ta);
        self.insert(tb);
        true
    }

    /// Allocate a fresh tile identity
    pub fn next_tile_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Create a new tile flagged as just spawned
    pub fn spawn(&mut self, value: u32, cell: Cell) -> u32 {
        let id = self.next_tile_id();
        let mut tile = Tile::new(id, value, cell);
        tile.just_spawned = true;
        self.insert(tile);
        id
    }

    /// All empty cells in x-major order
    pub fn empty_cells(&self) -> Vec<Cell> {
        self.cells()
            .filter(|cell| !self.is_occupied(*cell))
            .collect()
    }

    /// Uniformly random empty cell
    pub fn random_empty_cell<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Cell> {
        let empty = self.empty_cells();
        if empty.is_empty() {
            None
        } else {
            Some(empty[rng.random_range(0..empty.len())])
        }
    }

    /// Every coordinate on the board, x-major
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        let size = self.size;
        (0..size).flat_map(move |x| (0..size).map(move |y| Cell::new(x, y)))
    }

    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.cells.iter().flatten()
    }

    pub fn tiles_mut(&mut self) -> impl Iterator<Item = &mut Tile> {
        self.cells.iter_mut().flatten()
    }

    /// Per-cell values, indexed `x * size + y`
    pub fn values(&self) -> Vec<Option<u32>> {
        self.cells.iter().map(|c| c.as_ref().map(|t| t.value)).collect()
    }

    pub fn tile_count(&self) -> usize {
        self.tiles().count()
    }

    /// Sum of all tile values
    pub fn total(&self) -> u64 {
        self.tiles().map(|t| t.value as u64).sum()
    }

    pub fn max_value(&self) -> u32 {
        self.tiles().map(|t| t.value).max().unwrap_or(0)
    }

    /// Reset animation flags on every tile
    pub fn clear_transient(&mut self) {
        for tile in self.tiles_mut() {
            tile.clear_transient();
        }
    }

    /// Check that every stored tile knows its own cell
    pub fn positions_consistent(&self) -> bool {
        self.cells().all(|cell| self.get(cell).is_none_or(|t| t.pos == cell))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_cell_step_bounds() {
        let c = Cell::new(0, 3);
        assert_eq!(c.step((1, 0), 4), Some(Cell::new(1, 3)));
        assert_eq!(c.step((-1, 0), 4), None);
        assert_eq!(c.step((0, 1), 4), None);
        assert_eq!(c.step((0, -1), 4), Some(Cell::new(0, 2)));
    }

    #[test]
    fn test_manhattan() {
        assert_eq!(Cell::new(0, 0).manhattan(Cell::new(3, 2)), 5);
        assert_eq!(Cell::new(2, 1).manhattan(Cell::new(2, 1)), 0);
    }

    #[test]
    fn test_from_values_roundtrip_positions() {
        let mut values = vec![None; 16];
        values[0] = Some(2);
        values[5] = Some(8);
        values[15] = Some(1024);
        let grid = Grid::from_values(4, &values);

        assert_eq!(grid.values(), values);
        assert_eq!(grid.get(Cell::new(1, 1)).map(|t| t.value), Some(8));
        assert!(grid.positions_consistent());
        assert!(grid.tiles().all(|t| !t.just_spawned));
    }

    #[test]
    fn test_swap_preserves_identity() {
        let mut grid = Grid::new(4);
        let a = grid.spawn(2, Cell::new(0, 0));
        let b = grid.spawn(16, Cell::new(3, 3));

        assert!(grid.swap(Cell::new(0, 0), Cell::new(3, 3)));
        assert_eq!(grid.get(Cell::new(3, 3)).map(|t| (t.id, t.value)), Some((a, 2)));
        assert_eq!(grid.get(Cell::new(0, 0)).map(|t| (t.id, t.value)), Some((b, 16)));
        assert!(grid.positions_consistent());
    }

    #[test]
    fn test_swap_rejects_empty_or_same() {
        let mut grid = Grid::new(4);
        grid.spawn(2, Cell::new(0, 0));
        assert!(!grid.swap(Cell::new(0, 0), Cell::new(0, 0)));
        assert!(!grid.swap(Cell::new(0, 0), Cell::new(1, 0)));
        assert_eq!(grid.tile_count(), 1);
    }

    #[test]
    fn test_random_empty_cell_only_empty() {
        let mut grid = Grid::new(4);
        for cell in grid.cells().collect::<Vec<_>>() {
            if cell != Cell::new(2, 1) {
                grid.spawn(2, cell);
            }
        }
        let mut rng = Pcg32::seed_from_u64(7);
        assert_eq!(grid.random_empty_cell(&mut rng), Some(Cell::new(2, 1)));

        grid.spawn(2, Cell::new(2, 1));
        assert_eq!(grid.random_empty_cell(&mut rng), None);
    }
}
