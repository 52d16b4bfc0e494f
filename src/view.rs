//! Render adapter contract
//!
//! The app hands the grid and a small metadata bundle to a `BoardView` after
//! every state change. Views own presentation only; they never mutate state.

use std::fmt::Write;

use glam::Vec2;

use crate::fx::{Overlay, OverlayId, Region};
use crate::sim::{Budgets, Cell, ExchangeStage, GamePhase, Grid, Mode, RemoveStage, Tile};

/// Everything besides the tiles a view needs to draw a frame
#[derive(Debug, Clone, PartialEq)]
pub struct RenderMeta {
    pub score: u64,
    pub best: u64,
    pub phase: GamePhase,
    pub budgets: Budgets,
    pub mode: Mode,
    pub can_undo: bool,
    /// Tiles should animate from `previous` / `merged_from`
    pub animate: bool,
}

/// Pixel geometry of the board
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoardLayout {
    /// Top-left corner of the board in viewport pixels
    pub origin: Vec2,
    pub cell_size: f32,
    pub gap: f32,
    pub size: usize,
}

impl Default for BoardLayout {
    fn default() -> Self {
        Self {
            origin: Vec2::ZERO,
            cell_size: 106.0,
            gap: 15.0,
            size: crate::consts::GRID_SIZE,
        }
    }
}

impl BoardLayout {
    /// Side length of the whole board
    pub fn extent(&self) -> f32 {
        self.size as f32 * (self.cell_size + self.gap) + self.gap
    }

    /// Center of a cell; `x` is the column, `y` the row
    pub fn cell_center(&self, cell: Cell) -> Vec2 {
        let step = self.cell_size + self.gap;
        self.origin
            + Vec2::new(
                self.gap + cell.x as f32 * step + self.cell_size * 0.5,
                self.gap + cell.y as f32 * step + self.cell_size * 0.5,
            )
    }

    /// Cell under a viewport point, if it lands on a cell rather than a gap
    pub fn cell_at(&self, point: Vec2) -> Option<Cell> {
        let local = point - self.origin - Vec2::splat(self.gap);
        if local.x < 0.0 || local.y < 0.0 {
            return None;
        }
        let step = self.cell_size + self.gap;
        let (x, y) = ((local.x / step) as usize, (local.y / step) as usize);
        let inside = local.x - x as f32 * step <= self.cell_size && local.y - y as f32 * step <= self.cell_size;
        (inside && x < self.size && y < self.size).then(|| Cell::new(x, y))
    }

    /// The whole board as an effect region
    pub fn region(&self) -> Region {
        let extent = Vec2::splat(self.extent());
        Region {
            center: self.origin + extent * 0.5,
            size: extent,
        }
    }
}

/// Presentation surface for the board and effect overlays
pub trait BoardView {
    fn render(&mut self, grid: &Grid, meta: &RenderMeta);

    /// Materialize an overlay element
    fn spawn_overlay(&mut self, id: OverlayId, overlay: &Overlay);

    /// Remove an overlay whose animation finished
    fn remove_overlay(&mut self, id: OverlayId);

    fn layout(&self) -> BoardLayout;
}

/// View without a display: keeps the last frame and logs boards at debug level
#[derive(Debug, Clone, Default)]
pub struct HeadlessView {
    pub layout: BoardLayout,
    pub renders: usize,
    pub last_meta: Option<RenderMeta>,
    pub last_values: Vec<Option<u32>>,
    pub overlays: Vec<(OverlayId, Overlay)>,
}

impl HeadlessView {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BoardView for HeadlessView {
    fn render(&mut self, grid: &Grid, meta: &RenderMeta) {
        self.renders += 1;
        self.last_values = grid.values();
        self.last_meta = Some(meta.clone());
        log::debug!("score {}\n{}", meta.score, board_text(grid));
    }

    fn spawn_overlay(&mut self, id: OverlayId, overlay: &Overlay) {
        self.overlays.push((id, *overlay));
    }

    fn remove_overlay(&mut self, id: OverlayId) {
        self.overlays.retain(|(o, _)| *o != id);
    }

    fn layout(&self) -> BoardLayout {
        self.layout
    }
}

/// CSS classes for a tile element.
///
/// Positions are 1-based `tile-position-{column}-{row}`. Animation classes are
/// only added when `meta.animate` is set so a plain redraw never replays them.
pub fn tile_classes(tile: &Tile, meta: &RenderMeta) -> String {
    let mut classes = format!(
        "tile tile-{} tile-position-{}-{}",
        tile.value,
        tile.pos.x + 1,
        tile.pos.y + 1
    );
    if tile.value > crate::consts::WIN_VALUE {
        classes.push_str(" tile-super");
    }
    if meta.animate {
        if tile.just_spawned {
            classes.push_str(" tile-new");
        } else if tile.merged_from.is_some() {
            classes.push_str(" tile-merged");
        }
    }
    match meta.mode {
        Mode::Exchange(ExchangeStage::Selected(cell)) if cell == tile.pos => {
            classes.push_str(" tile-selected");
        }
        Mode::Exchange(ExchangeStage::Dwell { first, second, .. }) if first == tile.pos || second == tile.pos => {
            classes.push_str(" tile-selected tile-swapping");
        }
        Mode::Remove(RemoveStage::Pending { cell, .. }) if cell == tile.pos => {
            classes.push_str(" tile-doomed");
        }
        _ => {}
    }
    classes
}

/// Class for the board container reflecting the active mode
pub fn mode_class(mode: Mode) -> &'static str {
    match mode {
        Mode::Normal => "",
        Mode::Exchange(_) => "mode-exchange",
        Mode::Remove(_) => "mode-remove",
    }
}

/// Plain-text board, one row per line
pub fn board_text(grid: &Grid) -> String {
    let mut out = String::new();
    for y in 0..grid.size() {
        for x in 0..grid.size() {
            match grid.get(Cell::new(x, y)) {
                Some(tile) => {
                    let _ = write!(out, "{:>6}", tile.value);
                }
                None => out.push_str("     ."),
            }
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_center_and_hit_test_agree() {
        let layout = BoardLayout {
            origin: Vec2::new(20.0, 40.0),
            ..BoardLayout::default()
        };
        for x in 0..4 {
            for y in 0..4 {
                let cell = Cell::new(x, y);
                assert_eq!(layout.cell_at(layout.cell_center(cell)), Some(cell));
            }
        }
    }

    #[test]
    fn test_gaps_and_outside_miss() {
        let layout = BoardLayout::default();
        assert_eq!(layout.cell_at(Vec2::new(5.0, 5.0)), None);
        assert_eq!(layout.cell_at(Vec2::new(-10.0, 50.0)), None);
        assert_eq!(layout.cell_at(Vec2::splat(layout.extent() + 1.0)), None);
        // Gap between column 0 and 1
        assert_eq!(layout.cell_at(Vec2::new(15.0 + 106.0 + 5.0, 50.0)), None);
    }

    #[test]
    fn test_region_covers_board() {
        let layout = BoardLayout::default();
        let region = layout.region();
        assert_eq!(region.size, Vec2::splat(layout.extent()));
        assert_eq!(region.center, Vec2::splat(layout.extent() / 2.0));
    }

    fn meta(mode: Mode, animate: bool) -> RenderMeta {
        RenderMeta {
            score: 0,
            best: 0,
            phase: GamePhase::Playing,
            budgets: Budgets::default(),
            mode,
            can_undo: false,
            animate,
        }
    }

    #[test]
    fn test_tile_classes() {
        let mut tile = Tile::new(1, 8, Cell::new(2, 0));
        tile.just_spawned = true;
        assert_eq!(tile_classes(&tile, &meta(Mode::Normal, false)), "tile tile-8 tile-position-3-1");
        assert_eq!(
            tile_classes(&tile, &meta(Mode::Normal, true)),
            "tile tile-8 tile-position-3-1 tile-new"
        );

        let pending = Mode::Remove(RemoveStage::Pending {
            cell: Cell::new(2, 0),
            commit_at: 0.0,
        });
        assert!(tile_classes(&tile, &meta(pending, false)).ends_with("tile-doomed"));

        let selected = Mode::Exchange(ExchangeStage::Selected(Cell::new(0, 0)));
        assert!(!tile_classes(&tile, &meta(selected, false)).contains("tile-selected"));

        let big = Tile::new(2, 4096, Cell::new(0, 0));
        assert!(tile_classes(&big, &meta(Mode::Normal, false)).contains("tile-super"));
    }

    #[test]
    fn test_board_text() {
        let mut values = vec![None; 16];
        values[0] = Some(2);
        values[4] = Some(2048);
        let grid = Grid::from_values(4, &values);
        let text = board_text(&grid);
        let first = text.lines().next().unwrap_or_default();
        assert_eq!(first, "     2  2048     .     .");
    }
}
