//! Wrist Pop -- main loop and application entry point.
//!
//! Architecture: winit drives the event loop via `ApplicationHandler`. Frames are
//! paced at a fixed target rate (see `TimeState`) with `ControlFlow::WaitUntil`,
//! and each `RedrawRequested` runs exactly one game frame:
//!
//!   1. `begin_frame()` -- measure wall-clock delta, schedule the next deadline
//!   2. Config hot reload and key handling at the frame boundary
//!   3. Feed the cursor to the pose source, read the pose mailbox once
//!   4. `GameSession::run_frame` records the frame into a `DrawList`
//!   5. egui replays the list on its background layer and composites the overlay
//!
//! Poses arrive asynchronously from the pose source through a single-slot mailbox.
//! The frame never waits for them; it reuses the last delivery until a new one lands.

mod ball;
mod collision;
mod config;
mod pose_source;
mod random;
mod replay;
mod rules;
mod session;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use glam::Vec2;
use winit::application::ApplicationHandler;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use config::{
    load_config_from_path, load_config_or_default, ConfigWatcher, GameConfig, PoseSourceConfig,
};
use pose_source::{PointerPoseSource, PoseSink, PoseSource};
use replay::ReplayPoseSource;
use session::{FrameContext, FrameReport, GameSession};
use wp_core::draw::DrawList;
use wp_core::input::{InputState, Key};
use wp_core::mailbox::PoseMailbox;
use wp_core::time::TimeState;
use wp_core::video::VideoSource;
use wp_devtools::{DebugOverlay, OverlayStats};
use wp_platform::window::PlatformConfig;
use wp_render::{EguiCanvas, GpuContext, StillImageSource, TestPatternSource};

const CONFIG_PATH: &str = "assets/config/game.json";
const TARGET_FPS: f64 = 30.0;
const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.047,
    g: 0.047,
    b: 0.063,
    a: 1.0,
};

/// All mutable application state. Constructed lazily in
/// `ApplicationHandler::resumed` once the window and GPU surface exist.
struct GameState {
    window: Arc<Window>,
    gpu: GpuContext,
    time: TimeState,
    input: InputState,
    debug_overlay: DebugOverlay,
    canvas: EguiCanvas,
    draw_list: DrawList,

    // --- Hot-reloadable config --------------------------------------------------
    config_path: PathBuf,
    config_watcher: ConfigWatcher,
    config: GameConfig,

    // --- External collaborators -------------------------------------------------
    video: Box<dyn VideoSource>,
    pose_source: Box<dyn PoseSource>,
    mailbox: PoseMailbox,

    session: GameSession,
    last_report: FrameReport,
}

impl GameState {
    fn new(window: Arc<Window>, config_path: PathBuf, config: GameConfig) -> Result<Self, String> {
        let gpu = GpuContext::new(window.clone())?;
        let debug_overlay = DebugOverlay::new(&gpu.device, gpu.surface_format, &window);
        let canvas_size = (config.canvas.width, config.canvas.height);

        let video = build_video_source(&config);
        let mailbox = PoseMailbox::new();
        let pose_source = start_pose_source(&config, video.as_ref(), &mailbox)?;
        let session = GameSession::new(
            config.session_settings(),
            pose_source.skeleton_connections(),
            canvas_size.0 as f32,
            build_rng(config.seed),
        );

        Ok(Self {
            window,
            gpu,
            time: TimeState::new(TARGET_FPS),
            input: InputState::new(),
            debug_overlay,
            canvas: EguiCanvas::new(canvas_size),
            draw_list: DrawList::new(),
            config_watcher: ConfigWatcher::new(config_path.clone()),
            config_path,
            config,
            video,
            pose_source,
            mailbox,
            session,
            last_report: FrameReport::default(),
        })
    }

    /// Rules, threshold and FPS display apply to the running session. Canvas,
    /// backdrop and pose source are bound at startup.
    fn reload_config(&mut self, reason: &str) {
        let new_config = match load_config_from_path(&self.config_path) {
            Ok(config) => config,
            Err(err) => {
                log::error!("Config reload failed ({}): {}", reason, err);
                return;
            }
        };
        if new_config.canvas != self.config.canvas
            || new_config.backdrop != self.config.backdrop
            || new_config.pose_source != self.config.pose_source
            || new_config.pose_model != self.config.pose_model
        {
            log::warn!("Canvas, backdrop and pose settings take effect on next launch.");
        }
        self.session.apply_settings(new_config.session_settings());
        log::info!(
            "Config reloaded ({}): {} mode, threshold {}",
            reason,
            new_config.mode,
            new_config.confidence_threshold
        );
        self.config = new_config;
    }

    /// Cursor position in canvas pixels, `None` when it is off the canvas.
    fn pointer_in_canvas(&self) -> Option<Vec2> {
        let pixels = self.input.mouse_position?;
        let point = self.debug_overlay.pixels_to_points(&self.window, pixels);
        self.canvas
            .transform(self.debug_overlay.screen_rect())
            .to_canvas(point)
    }

    fn overlay_stats(&self) -> OverlayStats {
        OverlayStats {
            mode_label: self.session.settings().mode.label().to_string(),
            pose_source_label: self.pose_source.name().to_string(),
            model_label: self.session.model_state().label().to_string(),
            live_balls: self.session.balls().len() as u32,
            score: self.session.score().value(),
            pose_count: self.last_report.pose_count as u32,
            stale_frames: self.session.stale_frames(),
            collision_checks: self.last_report.collision_checks,
            paused: self.session.is_paused(),
        }
    }
}

struct App {
    config_path: PathBuf,
    state: Option<GameState>,
}

impl App {
    fn new(config_path: PathBuf) -> Self {
        Self {
            config_path,
            state: None,
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        let config = load_config_or_default(&self.config_path);
        let platform = PlatformConfig {
            width: config.canvas.width,
            height: config.canvas.height,
            ..PlatformConfig::default()
        };
        let result = wp_platform::window::create_window(event_loop, &platform)
            .and_then(|window| GameState::new(window, self.config_path.clone(), config));
        match result {
            Ok(state) => self.state = Some(state),
            Err(err) => {
                log::error!("Startup failed: {}", err);
                event_loop.exit();
            }
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(state) = &self.state {
            if state.time.frame_due(Instant::now()) {
                state.window.request_redraw();
            }
            event_loop.set_control_flow(ControlFlow::WaitUntil(state.time.next_deadline()));
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let state = match self.state.as_mut() {
            Some(s) => s,
            None => return,
        };

        let egui_consumed = state
            .debug_overlay
            .handle_window_event(&state.window, &event);

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, exiting.");
                event_loop.exit();
            }

            WindowEvent::Resized(physical_size) => {
                let w = physical_size.width;
                let h = physical_size.height;
                if w > 0 && h > 0 {
                    state.gpu.resize(w, h);
                    log::info!("Resized to {}x{}", w, h);
                }
            }

            WindowEvent::KeyboardInput { event, .. } if !egui_consumed => {
                if let PhysicalKey::Code(key_code) = event.physical_key {
                    if let Some(game_key) = map_key(key_code) {
                        match event.state {
                            ElementState::Pressed => state.input.key_down(game_key),
                            ElementState::Released => state.input.key_up(game_key),
                        }
                    }
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                state.input.mouse_position = Some((position.x, position.y));
            }

            WindowEvent::CursorLeft { .. } => {
                state.input.mouse_left_window();
            }

            WindowEvent::RedrawRequested => {
                if state.gpu.size.0 == 0 || state.gpu.size.1 == 0 {
                    return;
                }

                state.time.begin_frame();

                // Frame boundary: config reload and key actions.
                if state.config_watcher.should_reload() {
                    state.reload_config("file watcher");
                }
                if state.input.is_just_pressed(Key::Escape) {
                    event_loop.exit();
                    return;
                }
                if state.input.is_just_pressed(Key::F3) {
                    state.debug_overlay.toggle();
                }
                if state.input.is_just_pressed(Key::F2) {
                    state.config.show_fps = !state.config.show_fps;
                    state.session.apply_settings(state.config.session_settings());
                    log::info!(
                        "FPS display: {}",
                        if state.config.show_fps { "ON" } else { "OFF" }
                    );
                }
                if state.input.is_just_pressed(Key::R) {
                    state.session.restart();
                }
                if state.input.is_just_pressed(Key::P) {
                    state.session.toggle_pause();
                }
                if state.input.is_just_pressed(Key::Space) {
                    state.session.request_step();
                }

                let pointer = state.pointer_in_canvas();
                state.pose_source.update_pointer(pointer);
                state.video.poll();

                let frame_ctx = FrameContext::new(
                    state.config.canvas.width as f32,
                    state.config.canvas.height as f32,
                    state.time.real_dt * 1000.0,
                    state.time.smoothed_fps as f32,
                );
                let mailbox = state.mailbox.read();
                state.draw_list.clear();
                state.last_report = state.session.run_frame(
                    &frame_ctx,
                    &mailbox,
                    state.video.frame(),
                    &mut state.draw_list,
                );

                let Some((output, view)) = state.gpu.begin_frame() else {
                    state.input.end_frame();
                    return;
                };

                let stats = state.overlay_stats();
                let canvas = &mut state.canvas;
                let draw_list = &state.draw_list;
                let video_frame = state.video.frame();
                let (egui_primitives, egui_textures_delta, overlay_actions) =
                    state.debug_overlay.prepare(&state.window, &state.time, &stats, |ctx| {
                        canvas.paint(ctx, draw_list, video_frame)
                    });

                if overlay_actions.toggle_pause {
                    state.session.toggle_pause();
                }
                if overlay_actions.single_step {
                    state.session.request_step();
                }
                if overlay_actions.restart {
                    state.session.restart();
                }

                let screen_descriptor = egui_wgpu::ScreenDescriptor {
                    size_in_pixels: [state.gpu.size.0, state.gpu.size.1],
                    pixels_per_point: state.window.scale_factor() as f32,
                };

                let mut encoder =
                    state
                        .gpu
                        .device
                        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                            label: Some("Render Encoder"),
                        });

                {
                    let _clear_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                        label: Some("Clear Pass"),
                        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                            view: &view,
                            resolve_target: None,
                            ops: wgpu::Operations {
                                load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                                store: wgpu::StoreOp::Store,
                            },
                        })],
                        depth_stencil_attachment: None,
                        ..Default::default()
                    });
                }

                state.debug_overlay.upload(
                    &state.gpu.device,
                    &state.gpu.queue,
                    &mut encoder,
                    &egui_primitives,
                    &egui_textures_delta,
                    &screen_descriptor,
                );

                {
                    let mut egui_pass = encoder
                        .begin_render_pass(&wgpu::RenderPassDescriptor {
                            label: Some("egui Render Pass"),
                            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                                view: &view,
                                resolve_target: None,
                                ops: wgpu::Operations {
                                    load: wgpu::LoadOp::Load,
                                    store: wgpu::StoreOp::Store,
                                },
                            })],
                            depth_stencil_attachment: None,
                            ..Default::default()
                        })
                        .forget_lifetime();

                    state
                        .debug_overlay
                        .paint(&mut egui_pass, &egui_primitives, &screen_descriptor);
                }

                state.debug_overlay.cleanup(&egui_textures_delta);

                state.gpu.queue.submit(std::iter::once(encoder.finish()));
                output.present();

                state.input.end_frame();
            }

            _ => {}
        }
    }
}

/// Backdrop PNG stretched to the canvas, or the test pattern when none is
/// configured or it fails to load.
fn build_video_source(config: &GameConfig) -> Box<dyn VideoSource> {
    let (width, height) = (config.canvas.width, config.canvas.height);
    if let Some(path) = &config.backdrop {
        match StillImageSource::load_at_size(Path::new(path), width, height) {
            Ok(source) => return Box::new(source),
            Err(err) => log::warn!("{}. Using test pattern.", err),
        }
    }
    Box::new(TestPatternSource::new(width, height))
}

/// Build and start the configured pose source. A replay that cannot be loaded
/// falls back to the pointer source.
fn start_pose_source(
    config: &GameConfig,
    video: &dyn VideoSource,
    mailbox: &PoseMailbox,
) -> Result<Box<dyn PoseSource>, String> {
    let mut source: Box<dyn PoseSource> = match &config.pose_source {
        PoseSourceConfig::Replay { path } => match ReplayPoseSource::load(Path::new(path)) {
            Ok(replay) => Box::new(replay),
            Err(err) => {
                log::warn!("{}. Falling back to pointer pose source.", err);
                Box::new(PointerPoseSource::new())
            }
        },
        PoseSourceConfig::Pointer => Box::new(PointerPoseSource::new()),
    };
    let sink = PoseSink::new(mailbox.clone(), config.pose_model.clone());
    source
        .start(video, sink)
        .map_err(|e| format!("Failed to start pose source '{}': {e}", source.name()))?;
    log::info!("Pose source '{}' started", source.name());
    Ok(source)
}

fn build_rng(seed: Option<u64>) -> fastrand::Rng {
    match seed {
        Some(seed) => {
            log::info!("Using fixed RNG seed {}", seed);
            fastrand::Rng::with_seed(seed)
        }
        None => fastrand::Rng::new(),
    }
}

fn map_key(key_code: KeyCode) -> Option<Key> {
    match key_code {
        KeyCode::Escape => Some(Key::Escape),
        KeyCode::Space => Some(Key::Space),
        KeyCode::F2 => Some(Key::F2),
        KeyCode::F3 => Some(Key::F3),
        KeyCode::KeyP => Some(Key::P),
        KeyCode::KeyR => Some(Key::R),
        _ => None,
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Wrist Pop starting...");

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(err) => {
            log::error!("Failed to create event loop: {}", err);
            std::process::exit(1);
        }
    };
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App::new(PathBuf::from(CONFIG_PATH));
    if let Err(err) = event_loop.run_app(&mut app) {
        log::error!("Event loop error: {}", err);
        std::process::exit(1);
    }
}
