pub mod ring;
pub mod timer;

use glam::Vec2;
use winit::window::Window;

use self::ring::RingBuffer;
use self::timer::{FramePhase, PhaseTimers, PHASE_COUNT};
use crate::cat::controller::TickStats;
use crate::cat::pose::VisualState;
use crate::render::GpuState;

/// Number of frame times to keep in the histogram.
const FRAME_HISTORY_LEN: usize = 300;

/// Live cat state copied in by the app each frame.
#[derive(Debug, Clone, Copy)]
pub struct CatReadout {
    pub pointer: Option<Vec2>,
    pub visual: VisualState,
    pub stats: TickStats,
    pub input_events: u64,
    pub now_ms: f64,
    pub attached: bool,
}

/// Debug overlay powered by egui.
pub struct DebugOverlay {
    pub egui_ctx: egui::Context,
    pub egui_state: egui_winit::State,
    pub egui_renderer: egui_wgpu::Renderer,

    pub visible: bool,
    f12_was_down: bool,

    /// Rolling window of frame times (seconds).
    pub frame_times: RingBuffer<f64>,

    pub fps: f64,
    pub frame_time_avg: f64,
    pub frame_time_min: f64,
    pub frame_time_max: f64,

    pub phase_timers: PhaseTimers,

    /// UI controls.
    pub paused: bool,
    pub present_mode_index: usize,
    pub present_mode_changed: bool,

    pub cat: Option<CatReadout>,

    frame_count: u64,
    log_timer: f64,
    log_frame_count: u32,
    log_frame_sum: f64,
    log_frame_min: f64,
    log_frame_max: f64,
}

const PRESENT_MODES: [wgpu::PresentMode; 3] = [
    wgpu::PresentMode::Fifo,
    wgpu::PresentMode::Mailbox,
    wgpu::PresentMode::Immediate,
];

const PRESENT_MODE_LABELS: [&str; 3] = ["Fifo (vsync)", "Mailbox", "Immediate"];

impl DebugOverlay {
    pub fn new(window: &Window, gpu: &GpuState, visible: bool) -> Self {
        let egui_ctx = egui::Context::default();

        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            window,
            Some(window.scale_factor() as f32),
            None,
            Some(gpu.device.limits().max_texture_dimension_2d as usize),
        );

        let egui_renderer = egui_wgpu::Renderer::new(
            &gpu.device,
            gpu.surface_config.format,
            egui_wgpu::RendererOptions {
                depth_stencil_format: None,
                msaa_samples: 1,
                dithering: true,
                predictable_texture_filtering: false,
            },
        );

        Self {
            egui_ctx,
            egui_state,
            egui_renderer,
            visible,
            f12_was_down: false,
            frame_times: RingBuffer::new(FRAME_HISTORY_LEN),
            fps: 0.0,
            frame_time_avg: 0.0,
            frame_time_min: 0.0,
            frame_time_max: 0.0,
            phase_timers: PhaseTimers::new(),
            paused: false,
            present_mode_index: 0,
            present_mode_changed: false,
            cat: None,
            frame_count: 0,
            log_timer: 0.0,
            log_frame_count: 0,
            log_frame_sum: 0.0,
            log_frame_min: f64::MAX,
            log_frame_max: 0.0,
        }
    }

    /// Record a frame time, update rolling stats, and periodically log.
    pub fn record_frame(&mut self, dt: f64) {
        self.frame_count += 1;
        self.frame_times.push(dt);

        let len = self.frame_times.len();
        if !self.frame_times.is_empty() {
            let mut sum = 0.0;
            let mut min = f64::MAX;
            let mut max = 0.0f64;
            for &t in self.frame_times.iter() {
                sum += t;
                min = min.min(t);
                max = max.max(t);
            }
            self.frame_time_avg = sum / len as f64;
            self.frame_time_min = min;
            self.frame_time_max = max;
            self.fps = if self.frame_time_avg > 0.0 { 1.0 / self.frame_time_avg } else { 0.0 };
        }

        // Periodic log (every 5s).
        self.log_frame_count += 1;
        self.log_frame_sum += dt;
        self.log_frame_min = self.log_frame_min.min(dt);
        self.log_frame_max = self.log_frame_max.max(dt);
        self.log_timer += dt;

        if self.log_timer >= 5.0 {
            let avg_ms = (self.log_frame_sum / self.log_frame_count as f64) * 1000.0;
            let fps = self.log_frame_count as f64 / self.log_timer;
            log::info!(
                "FPS: {:.0} | avg: {:.2}ms | min: {:.2}ms | max: {:.2}ms | total frames: {}",
                fps,
                avg_ms,
                self.log_frame_min * 1000.0,
                self.log_frame_max * 1000.0,
                self.frame_count,
            );
            self.log_timer = 0.0;
            self.log_frame_count = 0;
            self.log_frame_sum = 0.0;
            self.log_frame_min = f64::MAX;
            self.log_frame_max = 0.0;
        }
    }

    /// Handle F12 toggle. Returns true if visibility changed.
    pub fn poll_toggle(&mut self, f12_down: bool) -> bool {
        // Edge-detect: trigger on press, not hold.
        if f12_down && !self.f12_was_down {
            self.f12_was_down = true;
            self.visible = !self.visible;
            return true;
        }
        if !f12_down {
            self.f12_was_down = false;
        }
        false
    }

    /// Forward a winit event to egui. Returns true if egui consumed it.
    pub fn on_window_event(
        &mut self,
        window: &Window,
        event: &winit::event::WindowEvent,
    ) -> bool {
        if !self.visible {
            return false;
        }
        self.egui_state.on_window_event(window, event).consumed
    }

    pub fn selected_present_mode(&self) -> wgpu::PresentMode {
        PRESENT_MODES[self.present_mode_index]
    }

    /// Run the egui frame and produce paint output.
    pub fn run_frame(
        &mut self,
        window: &Window,
        screen_w: u32,
        screen_h: u32,
    ) -> (
        Vec<egui::epaint::ClippedPrimitive>,
        egui::TexturesDelta,
        egui_wgpu::ScreenDescriptor,
    ) {
        let raw_input = self.egui_state.take_egui_input(window);

        let ui_state = UiSnapshot {
            visible: self.visible,
            fps: self.fps,
            frame_time_avg: self.frame_time_avg,
            frame_time_min: self.frame_time_min,
            frame_time_max: self.frame_time_max,
            frame_times: self.frame_times.iter().copied().collect(),
            phase_durations: self.phase_timers.durations_us,
            phase_total_us: self.phase_timers.total_us(),
            cat: self.cat,
        };

        let mut paused = self.paused;
        let mut present_mode_index = self.present_mode_index;

        let ctx = self.egui_ctx.clone();
        let full_output = ctx.run(raw_input, |ctx| {
            draw_ui(ctx, &ui_state, &mut paused, &mut present_mode_index);
        });

        if paused != self.paused {
            log::info!("Animation {}", if paused { "paused" } else { "resumed" });
        }
        self.paused = paused;
        if present_mode_index != self.present_mode_index {
            self.present_mode_changed = true;
        }
        self.present_mode_index = present_mode_index;

        self.egui_state
            .handle_platform_output(window, full_output.platform_output);

        let pixels_per_point = full_output.pixels_per_point;
        let clipped_primitives = self.egui_ctx.tessellate(full_output.shapes, pixels_per_point);

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [screen_w, screen_h],
            pixels_per_point,
        };

        (clipped_primitives, full_output.textures_delta, screen_descriptor)
    }

    /// Upload egui textures and buffers. Call before the egui render pass.
    pub fn prepare_egui(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        primitives: &[egui::epaint::ClippedPrimitive],
        textures_delta: &egui::TexturesDelta,
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
    ) -> Vec<wgpu::CommandBuffer> {
        for (id, image_delta) in &textures_delta.set {
            self.egui_renderer
                .update_texture(device, queue, *id, image_delta);
        }

        self.egui_renderer
            .update_buffers(device, queue, encoder, primitives, screen_descriptor)
    }

    pub fn render_egui(
        &self,
        render_pass: &mut wgpu::RenderPass<'static>,
        primitives: &[egui::epaint::ClippedPrimitive],
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
    ) {
        self.egui_renderer
            .render(render_pass, primitives, screen_descriptor);
    }

    /// Free textures after present.
    pub fn free_textures(&mut self, textures_delta: &egui::TexturesDelta) {
        for &id in &textures_delta.free {
            self.egui_renderer.free_texture(&id);
        }
    }
}

// ---------------------------------------------------------------------------
// UI snapshot + free-function draw (avoids borrow conflicts with egui_ctx)
// ---------------------------------------------------------------------------

struct UiSnapshot {
    visible: bool,
    fps: f64,
    frame_time_avg: f64,
    frame_time_min: f64,
    frame_time_max: f64,
    frame_times: Vec<f64>,
    phase_durations: [f64; PHASE_COUNT],
    phase_total_us: f64,
    cat: Option<CatReadout>,
}

fn draw_ui(
    ctx: &egui::Context,
    s: &UiSnapshot,
    paused: &mut bool,
    present_mode_index: &mut usize,
) {
    if !s.visible {
        return;
    }

    let panel_frame = egui::Frame::NONE
        .fill(egui::Color32::from_rgba_unmultiplied(20, 20, 20, 220))
        .corner_radius(6.0)
        .inner_margin(10.0);

    egui::Window::new("Debug")
        .default_pos([10.0, 10.0])
        .default_width(320.0)
        .resizable(true)
        .frame(panel_frame)
        .show(ctx, |ui| {
            ui.style_mut().visuals.override_text_color = Some(egui::Color32::from_gray(220));

            ui.heading("Performance");
            ui.label(format!("FPS: {:.1}", s.fps));
            ui.label(format!(
                "Frame: {:.2}ms avg | {:.2} min | {:.2} max",
                s.frame_time_avg * 1000.0,
                s.frame_time_min * 1000.0,
                s.frame_time_max * 1000.0,
            ));
            ui.add_space(4.0);

            ui.heading("Frame Time History");
            frame_histogram(ui, &s.frame_times);
            ui.add_space(4.0);

            ui.heading("Phase Timers");
            phase_bars(ui, &s.phase_durations, s.phase_total_us);
            ui.add_space(4.0);

            ui.heading("Cat");
            match &s.cat {
                Some(cat) => cat_section(ui, cat),
                None => {
                    ui.label("no cat");
                }
            }
            ui.add_space(4.0);

            ui.heading("Controls");
            ui.checkbox(paused, "Pause Animation");
            ui.horizontal(|ui| {
                ui.label("Present:");
                egui::ComboBox::from_id_salt("present_mode")
                    .selected_text(PRESENT_MODE_LABELS[*present_mode_index])
                    .show_ui(ui, |ui| {
                        for (i, label) in PRESENT_MODE_LABELS.iter().enumerate() {
                            ui.selectable_value(present_mode_index, i, *label);
                        }
                    });
            });
            ui.label("F12: Toggle | ESC: Quit");
        });
}

fn frame_histogram(ui: &mut egui::Ui, frame_times: &[f64]) {
    if frame_times.is_empty() {
        return;
    }
    let max_time = frame_times.iter().copied().fold(0.0f64, f64::max).max(0.020);

    let (response, painter) = ui.allocate_painter(egui::vec2(300.0, 60.0), egui::Sense::hover());
    let rect = response.rect;

    let bar_width = rect.width() / frame_times.len() as f32;
    let target_y = rect.bottom() - (0.01667 / max_time as f32) * rect.height();

    for (i, &t) in frame_times.iter().enumerate() {
        let h = (t / max_time) as f32 * rect.height();
        let x = rect.left() + i as f32 * bar_width;
        let color = if t > 0.01667 {
            egui::Color32::from_rgb(255, 100, 80)
        } else {
            egui::Color32::from_rgb(80, 200, 120)
        };
        painter.rect_filled(
            egui::Rect::from_min_max(
                egui::pos2(x, rect.bottom() - h),
                egui::pos2(x + bar_width - 1.0, rect.bottom()),
            ),
            0.0,
            color,
        );
    }

    // 16.67ms target line
    painter.line_segment(
        [egui::pos2(rect.left(), target_y), egui::pos2(rect.right(), target_y)],
        egui::Stroke::new(1.0, egui::Color32::from_rgb(255, 255, 100)),
    );
}

fn phase_bars(ui: &mut egui::Ui, durations: &[f64; PHASE_COUNT], total_us: f64) {
    let total = total_us.max(1.0);
    let max_us = durations.iter().copied().fold(0.0f64, f64::max).max(1.0);

    for phase in FramePhase::ALL {
        let us = durations[phase as usize];
        let pct = us / total * 100.0;
        let bar_frac = (us / max_us) as f32;

        ui.horizontal(|ui| {
            ui.label(egui::RichText::new(format!("{:<10}", phase.label())).monospace());
            ui.label(egui::RichText::new(format!("{:>5.0}us ({:>2.0}%)", us, pct)).monospace());

            let (response, painter) =
                ui.allocate_painter(egui::vec2(80.0, 12.0), egui::Sense::hover());
            let r = response.rect;
            painter.rect_filled(
                egui::Rect::from_min_max(
                    r.left_top(),
                    egui::pos2(r.left() + r.width() * bar_frac, r.bottom()),
                ),
                2.0,
                egui::Color32::from_rgb(100, 180, 255),
            );
        });
    }
    ui.label(
        egui::RichText::new(format!("Total: {:.0}us ({:.2}ms)", total, total / 1000.0)).monospace(),
    );
}

fn cat_section(ui: &mut egui::Ui, cat: &CatReadout) {
    let v = &cat.visual;
    match cat.pointer {
        Some(p) => ui.label(format!("Pointer: ({:.0}, {:.0})", p.x, p.y)),
        None => ui.label("Pointer: none yet"),
    };
    ui.label(format!("Cat x: {:.1}", v.cat_x));
    ui.label(format!(
        "Facing: {} | {:?} | {}",
        v.facing.map_or("-".to_string(), |f| format!("{f:?}")),
        v.stance,
        if v.walking { "walking" } else { "still" },
    ));
    ui.label(format!("Head: {:?}", v.head));
    match (v.jump_height_vh(), v.jump_duration_s(), v.jump) {
        (Some(height), Some(duration), Some(jump)) => ui.label(format!(
            "Jump: {:.1}vh over {:.3}s, {:.0}ms left",
            height,
            duration,
            jump.remaining_ms(cat.now_ms),
        )),
        _ => ui.label("Jump: grounded"),
    };
    ui.label(format!(
        "Evals: {} | Throttled: {} | Idle: {}",
        cat.stats.evaluations, cat.stats.throttled, cat.stats.idle_frames,
    ));
    ui.label(format!(
        "Jumps: {} | Cancelled: {} | Input events: {}",
        cat.stats.jumps, cat.stats.cancelled_jumps, cat.input_events,
    ));
    if !cat.attached {
        ui.colored_label(egui::Color32::from_rgb(255, 180, 80), "detached");
    }
}
