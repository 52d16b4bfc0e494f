//! Nova 2048 entry point
//!
//! On the web this wires DOM events, WebAudio and the particle canvas to the
//! `App`. Natively it plays a headless demo game and logs the result.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec2;
    use wasm_bindgen::prelude::*;
    use web_sys::{HtmlCanvasElement, KeyboardEvent, MouseEvent, TouchEvent};

    use nova_2048::App;
    use nova_2048::audio::WebAudioBackend;
    use nova_2048::persistence::{Storage, open_storage};
    use nova_2048::platform::{Command, DomBoardView, SwipeTracker, decode_key};
    use nova_2048::renderer::{ParticleCanvas, particle_vertices};
    use nova_2048::sim::GameInput;

    type WebApp = App<DomBoardView, WebAudioBackend, Box<dyn Storage>>;

    /// Game instance shared by every callback
    struct Game {
        app: WebApp,
        canvas: Option<ParticleCanvas>,
        canvas_el: HtmlCanvasElement,
        swipe: SwipeTracker,
        /// An animation frame is queued
        looping: bool,
    }

    impl Game {
        fn command(&mut self, command: Command) -> bool {
            match command {
                Command::Game(input) => self.app.handle(input, now()),
                Command::ToggleMute => {
                    let muted = self.app.toggle_mute();
                    log::info!("Muted: {}", muted);
                    false
                }
            }
        }

        fn frame(&mut self, time: f64) -> bool {
            let running = self.app.frame(time);
            self.draw_particles();
            running
        }

        fn draw_particles(&mut self) {
            let Some(canvas) = &mut self.canvas else {
                return;
            };
            let dpr = web_sys::window().map(|w| w.device_pixel_ratio()).unwrap_or(1.0) as f32;
            let mut vertices = particle_vertices(self.app.fx().particles());
            for v in &mut vertices {
                v.position[0] *= dpr;
                v.position[1] *= dpr;
            }
            if let Err(e) = canvas.render(&vertices) {
                log::warn!("Particle render failed: {:?}", e);
            }
        }

        /// Match the canvas backing store and board geometry to the viewport
        fn resize(&mut self) {
            let Some(window) = web_sys::window() else {
                return;
            };
            let (width, height) = sync_canvas_size(&window, &self.canvas_el);
            if let Some(canvas) = &mut self.canvas {
                canvas.resize(width, height);
            }
            self.app.view_mut().measure();
            self.app.set_viewport(viewport_size(&window));
        }
    }

    /// Clock shared with requestAnimationFrame timestamps
    fn now() -> f64 {
        web_sys::window()
            .and_then(|w| w.performance())
            .map(|p| p.now())
            .unwrap_or_else(js_sys::Date::now)
    }

    fn viewport_size(window: &web_sys::Window) -> Vec2 {
        let dim = |v: Result<JsValue, JsValue>| v.ok().and_then(|v| v.as_f64()).unwrap_or(0.0) as f32;
        Vec2::new(dim(window.inner_width()), dim(window.inner_height()))
    }

    /// Returns the new backing size in device pixels
    fn sync_canvas_size(window: &web_sys::Window, canvas: &HtmlCanvasElement) -> (u32, u32) {
        let dpr = window.device_pixel_ratio();
        let width = (canvas.client_width() as f64 * dpr) as u32;
        let height = (canvas.client_height() as f64 * dpr) as u32;
        canvas.set_width(width);
        canvas.set_height(height);
        (width, height)
    }

    async fn init_particle_canvas(canvas: &HtmlCanvasElement, width: u32, height: u32) -> Option<ParticleCanvas> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU,
            ..Default::default()
        });

        let surface = instance
            .create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()))
            .map_err(|e| log::warn!("Failed to create surface: {:?}", e))
            .ok()?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::LowPower,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| log::warn!("No graphics adapter: {:?}", e))
            .ok()?;

        log::info!("Using adapter: {:?}", adapter.get_info().name);
        ParticleCanvas::new(surface, &adapter, width, height).await
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            web_sys::console::warn_1(&"Logger already initialized".into());
        }

        log::info!("Nova 2048 starting...");

        let Some(window) = web_sys::window() else {
            log::error!("No window");
            return;
        };
        let Some(document) = window.document() else {
            log::error!("No document");
            return;
        };

        let Some(canvas_el) = document
            .get_element_by_id("fx-canvas")
            .and_then(|el| el.dyn_into::<HtmlCanvasElement>().ok())
        else {
            log::error!("No #fx-canvas element");
            return;
        };
        let Some(view) = DomBoardView::new() else {
            log::error!("Board elements missing from page");
            return;
        };

        let (width, height) = sync_canvas_size(&window, &canvas_el);
        let canvas = init_particle_canvas(&canvas_el, width, height).await;
        if canvas.is_none() {
            log::warn!("Particle canvas unavailable - overlays only");
        }

        let seed = js_sys::Date::now() as u64;
        let mut app = App::new(view, WebAudioBackend::new(), open_storage(), seed);
        app.set_viewport(viewport_size(&window));
        log::info!("Game initialized with seed: {}", seed);

        let game = Rc::new(RefCell::new(Game {
            app,
            canvas,
            canvas_el,
            swipe: SwipeTracker::default(),
            looping: false,
        }));

        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        setup_keyboard(game.clone());
        setup_board_input(game.clone());
        setup_buttons(game.clone());
        setup_resize(game.clone());
        setup_lifecycle(game);

        log::info!("Nova 2048 running!");
    }

    /// Run a command and start the frame loop if it asked for one
    fn dispatch(game: &Rc<RefCell<Game>>, command: Command) {
        let wake = game.borrow_mut().command(command);
        if wake {
            ensure_frame_loop(game.clone());
        }
    }

    fn setup_keyboard(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
            if event.ctrl_key() || event.meta_key() || event.alt_key() {
                return;
            }
            if let Some(command) = decode_key(&event.key()) {
                event.prevent_default();
                dispatch(&game, command);
            }
        });
        let _ = window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_board_input(game: Rc<RefCell<Game>>) {
        let Some(board) = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id("board"))
        else {
            return;
        };

        // Touch start
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                let touches = event.touches();
                let mut g = game.borrow_mut();
                match touches.get(0) {
                    Some(touch) if touches.length() == 1 => {
                        g.swipe.begin(Vec2::new(touch.client_x() as f32, touch.client_y() as f32));
                    }
                    _ => g.swipe.cancel(),
                }
            });
            let _ = board.add_event_listener_with_callback("touchstart", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch move: keep the page from scrolling under a swipe
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
            });
            let _ = board.add_event_listener_with_callback("touchmove", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch end
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                let Some(touch) = event.changed_touches().get(0) else {
                    return;
                };
                let end = Vec2::new(touch.client_x() as f32, touch.client_y() as f32);
                let direction = game.borrow_mut().swipe.end(end);
                if let Some(direction) = direction {
                    dispatch(&game, Command::Game(GameInput::Move(direction)));
                }
            });
            let _ = board.add_event_listener_with_callback("touchend", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Click: tile selection in exchange/remove modes
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let point = Vec2::new(event.client_x() as f32, event.client_y() as f32);
                let cell = {
                    let mut g = game.borrow_mut();
                    g.app.view_mut().measure();
                    g.app.view().layout().cell_at(point)
                };
                if let Some(cell) = cell {
                    dispatch(&game, Command::Game(GameInput::TileClick(cell)));
                }
            });
            let _ = board.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_buttons(game: Rc<RefCell<Game>>) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };

        let buttons = [
            ("restart-btn", Command::Game(GameInput::Restart)),
            ("retry-btn", Command::Game(GameInput::Restart)),
            ("undo-btn", Command::Game(GameInput::Undo)),
            ("exchange-btn", Command::Game(GameInput::ExchangeToggle)),
            ("remove-btn", Command::Game(GameInput::RemoveToggle)),
            ("keep-playing-btn", Command::Game(GameInput::KeepPlaying)),
            ("mute-btn", Command::ToggleMute),
        ];
        for (id, command) in buttons {
            let Some(btn) = document.get_element_by_id(id) else {
                continue;
            };
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                event.stop_propagation();
                dispatch(&game, command);
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_resize(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            game.borrow_mut().resize();
        });
        let _ = window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    /// Release the audio loop and effects when the page goes away
    fn setup_lifecycle(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            game.borrow_mut().app.shutdown();
            log::info!("Shut down");
        });
        let _ = window.add_event_listener_with_callback("pagehide", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    /// Queue a frame unless one is already pending
    fn ensure_frame_loop(game: Rc<RefCell<Game>>) {
        {
            let mut g = game.borrow_mut();
            if g.looping {
                return;
            }
            g.looping = true;
        }
        request_animation_frame(game);
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    /// Runs while effects are alive or a commit is pending, then parks
    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        let running = {
            let mut g = game.borrow_mut();
            let running = g.frame(time);
            g.looping = running;
            running
        };

        if running {
            request_animation_frame(game);
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Nova 2048 (native) starting...");
    log::info!("The full game runs in the browser - playing a headless demo");

    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(2048);
    demo::play(seed);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;

    use nova_2048::App;
    use nova_2048::audio::SilentBackend;
    use nova_2048::persistence::MemoryStorage;
    use nova_2048::sim::{Direction, GameInput};
    use nova_2048::view::{HeadlessView, board_text};

    const MAX_TURNS: usize = 5000;
    const FRAME_MS: f64 = 16.0;

    /// Play random moves until the game ends
    pub fn play(seed: u64) {
        let mut app = App::new(HeadlessView::new(), Some(SilentBackend::new()), MemoryStorage::new(), seed);
        let mut rng = Pcg32::seed_from_u64(seed);
        let mut now = 0.0;

        for _ in 0..MAX_TURNS {
            if app.state().over {
                break;
            }
            let direction = Direction::ALL[rng.random_range(0..Direction::ALL.len())];
            app.handle(GameInput::Move(direction), now);
            if app.state().won && !app.state().keep_playing {
                app.handle(GameInput::KeepPlaying, now);
            }
            // Let effects run out so the particle pool stays bounded
            while app.frame(now) {
                now += FRAME_MS;
            }
            now += FRAME_MS;
        }

        let state = app.state();
        log::info!(
            "Finished after {} turns: score {}, largest tile {}",
            state.turns,
            state.score,
            state.grid.max_value()
        );
        println!("{}", board_text(&state.grid));
        println!("Score: {}  Best: {}  Turns: {}", state.score, app.best(), state.turns);
    }
}
