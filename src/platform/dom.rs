//! Browser board view
//!
//! Tiles are absolutely positioned divs rebuilt on every render; CSS classes
//! drive their animations. Effect overlays are short-lived divs in a fixed
//! full-viewport layer, except screen shake which is a class on the board.

use std::collections::HashMap;

use glam::Vec2;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement};

use crate::fx::{Overlay, OverlayId, OverlayKind};
use crate::sim::{GamePhase, Grid};
use crate::view::{BoardLayout, BoardView, RenderMeta, mode_class, tile_classes};

/// Side of the reference board the CSS is authored for
const REFERENCE_EXTENT: f32 = 499.0;

enum LiveOverlay {
    Element(Element),
    /// Shake: a class toggled on the board container
    BoardClass(&'static str),
}

pub struct DomBoardView {
    document: Document,
    board: Element,
    tiles: Element,
    fx_layer: Element,
    overlays: HashMap<OverlayId, LiveOverlay>,
    layout: BoardLayout,
}

impl DomBoardView {
    /// Bind to `#board`, `#tile-container` and `#fx-layer`.
    ///
    /// None if the page lacks any of them.
    pub fn new() -> Option<Self> {
        let document = web_sys::window()?.document()?;
        let board = document.get_element_by_id("board")?;
        let tiles = document.get_element_by_id("tile-container")?;
        let fx_layer = document.get_element_by_id("fx-layer")?;
        let mut view = Self {
            document,
            board,
            tiles,
            fx_layer,
            overlays: HashMap::new(),
            layout: BoardLayout::default(),
        };
        view.measure();
        Some(view)
    }

    /// Re-read the board's on-screen geometry (call on resize and scroll)
    pub fn measure(&mut self) {
        let rect = self.board.get_bounding_client_rect();
        let scale = rect.width() as f32 / REFERENCE_EXTENT;
        let defaults = BoardLayout::default();
        self.layout = BoardLayout {
            origin: Vec2::new(rect.left() as f32, rect.top() as f32),
            cell_size: defaults.cell_size * scale,
            gap: defaults.gap * scale,
            size: defaults.size,
        };
    }

    fn set_text(&self, id: &str, text: &str) {
        if let Some(el) = self.document.get_element_by_id(id) {
            el.set_text_content(Some(text));
        }
    }

    fn set_class(&self, id: &str, class: &str) {
        if let Some(el) = self.document.get_element_by_id(id) {
            let _ = el.set_attribute("class", class);
        }
    }

    fn create_div(&self, class: &str) -> Option<HtmlElement> {
        let el = self.document.create_element("div").ok()?;
        let _ = el.set_attribute("class", class);
        el.dyn_into::<HtmlElement>().ok()
    }

    fn render_tiles(&self, grid: &Grid, meta: &RenderMeta) {
        self.tiles.set_inner_html("");
        for tile in grid.tiles() {
            let Some(el) = self.create_div(&tile_classes(tile, meta)) else {
                continue;
            };
            // Slide in from the previous cell; CSS transitions --dx/--dy to zero
            if let Some(from) = tile.previous.filter(|_| meta.animate) {
                let style = el.style();
                let _ = style.set_property("--dx", &(from.x as i32 - tile.pos.x as i32).to_string());
                let _ = style.set_property("--dy", &(from.y as i32 - tile.pos.y as i32).to_string());
            }
            if let Some(inner) = self.create_div("tile-inner") {
                inner.set_text_content(Some(&tile.value.to_string()));
                let _ = el.append_child(&inner);
            }
            let _ = self.tiles.append_child(&el);
        }
    }

    fn render_status(&self, meta: &RenderMeta) {
        self.set_text("score", &meta.score.to_string());
        self.set_text("best", &meta.best.to_string());
        self.set_text("undo-count", &meta.budgets.undo.to_string());
        self.set_text("exchange-count", &meta.budgets.exchange.to_string());
        self.set_text("remove-count", &meta.budgets.remove.to_string());

        self.set_class("undo-btn", if meta.can_undo { "btn" } else { "btn disabled" });
        let exchange_active = matches!(meta.mode, crate::sim::Mode::Exchange(_));
        let remove_active = matches!(meta.mode, crate::sim::Mode::Remove(_));
        self.set_class("exchange-btn", if exchange_active { "btn active" } else { "btn" });
        self.set_class("remove-btn", if remove_active { "btn active" } else { "btn" });

        let active = mode_class(meta.mode);
        let classes = self.board.class_list();
        for class in ["mode-exchange", "mode-remove"] {
            let _ = classes.toggle_with_force(class, class == active);
        }

        let (class, text) = match meta.phase {
            GamePhase::Playing => ("game-message hidden", ""),
            GamePhase::Won => ("game-message game-won", "You win!"),
            GamePhase::Over => ("game-message game-over", "Game over!"),
        };
        self.set_class("game-message", class);
        self.set_text("game-message-text", text);
    }
}

impl BoardView for DomBoardView {
    fn render(&mut self, grid: &Grid, meta: &RenderMeta) {
        self.render_tiles(grid, meta);
        self.render_status(meta);
    }

    fn spawn_overlay(&mut self, id: OverlayId, overlay: &Overlay) {
        let class = overlay.kind.css_class();
        if let OverlayKind::Shake { .. } = overlay.kind {
            let _ = self.board.class_list().add_1(class);
            self.overlays.insert(id, LiveOverlay::BoardClass(class));
            return;
        }

        let Some(el) = self.create_div(&format!("fx {class}")) else {
            log::warn!("Failed to create overlay element");
            return;
        };
        let style = el.style();
        if let Some(diameter) = overlay.kind.diameter() {
            let corner = overlay.anchor - Vec2::splat(diameter * 0.5);
            let _ = style.set_property("left", &format!("{:.1}px", corner.x));
            let _ = style.set_property("top", &format!("{:.1}px", corner.y));
            let _ = style.set_property("width", &format!("{diameter:.1}px"));
            let _ = style.set_property("height", &format!("{diameter:.1}px"));
        }
        let _ = style.set_property("--fx-color", &overlay.css_color());
        let _ = style.set_property("animation-duration", &format!("{:.0}ms", overlay.duration_ms));
        let _ = self.fx_layer.append_child(&el);
        self.overlays.insert(id, LiveOverlay::Element(el.into()));
    }

    fn remove_overlay(&mut self, id: OverlayId) {
        match self.overlays.remove(&id) {
            Some(LiveOverlay::Element(el)) => el.remove(),
            Some(LiveOverlay::BoardClass(class)) => {
                // Another shake may still be running
                let still_shaking = self
                    .overlays
                    .values()
                    .any(|o| matches!(o, LiveOverlay::BoardClass(c) if *c == class));
                if !still_shaking {
                    let _ = self.board.class_list().remove_1(class);
                }
            }
            None => {}
        }
    }

    fn layout(&self) -> BoardLayout {
        self.layout
    }
}
