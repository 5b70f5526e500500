use std::sync::Arc;

use glam::Vec2;
use instant::Instant;
use winit::application::ApplicationHandler;
use winit::event::{ElementState, TouchPhase, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowAttributes, WindowId, WindowLevel};

use crate::cat::animation::{build_rig, Part};
use crate::cat::input::{PageInput, PointerEvent, Rect, TouchPoints};
use crate::cat::CatWidget;
use crate::config::Config;
use crate::debug::timer::FramePhase;
use crate::debug::{CatReadout, DebugOverlay};
use crate::error::AppError;
use crate::render::instance::PartInstance;
use crate::render::pipeline::MAX_INSTANCES;
use crate::render::GpuState;

#[cfg(windows)]
use crate::platform;

/// Top-level application state.
struct App {
    config: Config,
    window: Option<Arc<Window>>,
    gpu: Option<GpuState>,
    debug: Option<DebugOverlay>,

    /// Page-wide pointer hub the cat subscribes to.
    page: PageInput,
    touches: TouchPoints,
    cat: CatWidget,

    /// Last polled global cursor, logical pixels.
    #[cfg_attr(not(windows), allow(dead_code))]
    last_cursor: Option<Vec2>,
    f12_down: bool,

    start: Instant,
    last_frame_time: Option<Instant>,

    // Reused every frame.
    parts: Vec<Part>,
    instances: Vec<PartInstance>,

    /// Set when setup fails inside the event loop; returned from `run`.
    error: Option<AppError>,
}

impl App {
    fn new(config: Config) -> Self {
        let rng = match config.seed {
            Some(seed) => {
                log::info!("Jump variance seeded with {seed}");
                fastrand::Rng::with_seed(seed)
            }
            None => fastrand::Rng::new(),
        };
        let cat = CatWidget::new(Rect::from_size(0.0, 0.0), config.cat.clone(), rng);

        Self {
            config,
            window: None,
            gpu: None,
            debug: None,
            page: PageInput::new(),
            touches: TouchPoints::new(),
            cat,
            last_cursor: None,
            f12_down: false,
            start: Instant::now(),
            last_frame_time: None,
            parts: Vec::with_capacity(MAX_INSTANCES),
            instances: Vec::with_capacity(MAX_INSTANCES),
            error: None,
        }
    }

    fn scale_factor(&self) -> f64 {
        self.window.as_ref().map_or(1.0, |w| w.scale_factor())
    }

    /// Logical size of the window; the cat tracks over the whole of it.
    fn logical_bounds(window: &Window) -> Rect {
        let size = window.inner_size().to_logical::<f32>(window.scale_factor());
        Rect::from_size(size.width, size.height)
    }

    fn create_window(&mut self, event_loop: &ActiveEventLoop) -> Result<(), AppError> {
        // Cover the primary monitor.
        let monitor = event_loop
            .primary_monitor()
            .or_else(|| event_loop.available_monitors().next())
            .ok_or(AppError::NoMonitor)?;
        let screen_size = monitor.size();

        // Start hidden so DWM doesn't cache stale frame state before the
        // overlay styles take effect.
        let mut attrs = WindowAttributes::default()
            .with_title(self.config.window.title.clone())
            .with_decorations(false)
            .with_visible(false)
            .with_inner_size(screen_size)
            .with_position(winit::dpi::PhysicalPosition::new(0, 0));
        if self.config.window.always_on_top {
            attrs = attrs.with_window_level(WindowLevel::AlwaysOnTop);
        }
        // On Windows transparency comes from DxgiFromVisual + premultiplied
        // alpha; with_transparent would add WS_EX_LAYERED.
        #[cfg(not(windows))]
        {
            attrs = attrs.with_transparent(true);
        }

        let window = Arc::new(event_loop.create_window(attrs)?);

        #[cfg(windows)]
        platform::win32::setup_overlay(&window, self.config.window.click_through);

        let size = window.inner_size();
        log::info!(
            "Overlay window created: {}x{} on {:?}",
            size.width,
            size.height,
            monitor.name().unwrap_or_default()
        );

        let gpu = GpuState::new(window.clone())?;
        log::info!("wgpu + cat pipeline initialized");

        self.debug = Some(DebugOverlay::new(&window, &gpu, self.config.debug.overlay));

        self.cat.set_bounds(Self::logical_bounds(&window));
        self.cat.on_attach(&mut self.page);
        log::debug!("{} pointer listener(s) on the page", self.page.listener_count());

        window.set_visible(true);
        self.gpu = Some(gpu);
        self.window = Some(window);
        Ok(())
    }

    fn dispatch(&mut self, event: PointerEvent) {
        self.page.dispatch(&event);
    }

    /// A click-through window never sees the mouse, so follow the global cursor.
    #[cfg(windows)]
    fn poll_global_input(&mut self) {
        if !self.config.window.click_through {
            return;
        }
        let Some(window) = &self.window else {
            return;
        };
        self.f12_down = platform::win32::is_f12_down();
        let origin = window
            .inner_position()
            .map(|p| Vec2::new(p.x as f32, p.y as f32))
            .unwrap_or(Vec2::ZERO);
        let polled = platform::cursor_to_client(
            platform::win32::get_mouse_pos(),
            origin,
            window.scale_factor() as f32,
            self.last_cursor,
        );
        if let Some(client) = polled {
            self.last_cursor = Some(client);
            self.dispatch(PointerEvent::Move { client });
        }
    }

    #[cfg(not(windows))]
    fn poll_global_input(&mut self) {}

    fn redraw(&mut self) {
        if let Some(debug) = &mut self.debug {
            debug.phase_timers.begin();
        }
        self.poll_global_input();
        if let Some(debug) = &mut self.debug {
            debug.phase_timers.end(FramePhase::Input);
        }

        let now = Instant::now();
        let dt = self
            .last_frame_time
            .map(|last| now.duration_since(last).as_secs_f64());
        self.last_frame_time = Some(now);
        let now_ms = now.duration_since(self.start).as_secs_f64() * 1000.0;

        let (Some(window), Some(gpu), Some(debug)) =
            (self.window.clone(), self.gpu.as_mut(), self.debug.as_mut())
        else {
            return;
        };

        if let Some(dt) = dt {
            debug.record_frame(dt);
        }

        if debug.poll_toggle(self.f12_down) {
            log::info!("Debug overlay {}", if debug.visible { "shown" } else { "hidden" });
        }
        if debug.present_mode_changed {
            debug.present_mode_changed = false;
            gpu.set_present_mode(debug.selected_present_mode());
        }

        debug.phase_timers.begin();
        if !debug.paused {
            let tick = self.cat.frame(now_ms);
            log::trace!("frame {:.0}ms: {:?}", now_ms, tick);
        }
        debug.phase_timers.end(FramePhase::Evaluate);

        debug.phase_timers.begin();
        build_rig(self.cat.visual(), now_ms, self.cat.bounds(), &mut self.parts);
        self.instances.clear();
        self.instances
            .extend(self.parts.iter().map(PartInstance::from_part));
        debug.phase_timers.end(FramePhase::Rig);

        debug.phase_timers.begin();
        let view = self.cat.bounds();
        let view_size = [view.min.x + view.size.x, view.min.y + view.size.y];
        gpu.update_frame(&self.instances, view_size, (now_ms / 1000.0) as f32);
        debug.phase_timers.end(FramePhase::Upload);

        debug.cat = Some(CatReadout {
            pointer: self.cat.pointer(),
            visual: *self.cat.visual(),
            stats: self.cat.stats(),
            input_events: self.cat.input_events(),
            now_ms,
            attached: self.cat.is_attached(),
        });

        debug.phase_timers.begin();
        let Some(mut frame) = gpu.begin_frame() else {
            return;
        };
        gpu.draw_cat(&mut frame.encoder, &frame.view);

        let mut extra = Vec::new();
        let mut freed = None;
        if debug.visible {
            let (w, h) = (gpu.surface_config.width, gpu.surface_config.height);
            let (primitives, textures, screen) = debug.run_frame(&window, w, h);
            extra = debug.prepare_egui(
                &gpu.device,
                &gpu.queue,
                &mut frame.encoder,
                &primitives,
                &textures,
                &screen,
            );
            {
                let mut pass = GpuState::begin_egui_pass(&mut frame.encoder, &frame.view);
                debug.render_egui(&mut pass, &primitives, &screen);
            }
            freed = Some(textures);
        }
        gpu.finish_frame(frame.encoder, frame.output, extra);
        if let Some(textures) = freed {
            debug.free_textures(&textures);
        }
        debug.phase_timers.end(FramePhase::Render);
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.create_window(event_loop) {
            self.error = Some(e);
            event_loop.exit();
            return;
        }
        // Continuous animation loop.
        event_loop.set_control_flow(ControlFlow::Poll);
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        // A click-through window can't receive keyboard events.
        #[cfg(windows)]
        if platform::win32::is_escape_pressed() {
            log::info!("ESC pressed, exiting");
            event_loop.exit();
            return;
        }

        if self.cat.is_animating() {
            if let Some(w) = &self.window {
                w.request_redraw();
            }
        } else {
            event_loop.set_control_flow(ControlFlow::Wait);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let (Some(window), Some(debug)) = (&self.window, &mut self.debug) {
            debug.on_window_event(window, &event);
        }

        let scale = self.scale_factor();
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, exiting");
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(new_size.width, new_size.height);
                }
                if let Some(window) = &self.window {
                    self.cat.set_bounds(Self::logical_bounds(window));
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                let p = position.to_logical::<f32>(scale);
                self.dispatch(PointerEvent::Move {
                    client: Vec2::new(p.x, p.y),
                });
            }
            WindowEvent::Touch(touch) => {
                let p = touch.location.to_logical::<f32>(scale);
                let pos = Vec2::new(p.x, p.y);
                match touch.phase {
                    TouchPhase::Started => self.touches.start(touch.id, pos),
                    TouchPhase::Moved => {
                        let event = self.touches.moved(touch.id, pos);
                        self.dispatch(event);
                    }
                    TouchPhase::Ended | TouchPhase::Cancelled => {
                        self.touches.end(touch.id);
                        if self.touches.is_empty() {
                            log::trace!("All touches lifted");
                        }
                    }
                }
            }
            WindowEvent::KeyboardInput { event, .. } => match event.physical_key {
                PhysicalKey::Code(KeyCode::Escape) if event.state == ElementState::Pressed => {
                    log::info!("ESC pressed, exiting");
                    event_loop.exit();
                }
                PhysicalKey::Code(KeyCode::F12) => {
                    self.f12_down = event.state == ElementState::Pressed;
                }
                _ => {}
            },
            WindowEvent::RedrawRequested => self.redraw(),
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.cat.on_detach(&mut self.page);
        let stats = self.cat.stats();
        log::info!(
            "Shutting down after {} evaluations, {} jumps ({} cancelled)",
            stats.evaluations,
            stats.jumps,
            stats.cancelled_jumps,
        );
    }
}

/// Entry point: create event loop and run.
pub fn run(config: Config) -> Result<(), AppError> {
    let event_loop = EventLoop::new()?;
    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;
    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
