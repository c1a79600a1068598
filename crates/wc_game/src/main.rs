//! WhyChem -- main loop and application entry point.
//!
//! winit drives the event loop via `ApplicationHandler`. Everything happens in
//! `RedrawRequested` on a fixed timestep (see `FrameClock`):
//!
//!   1. `begin_frame()` -- measure wall-clock delta, feed the accumulator
//!   2. `while should_step()` -- advance the current screen by one game frame
//!      and hand the queued sounds to the audio manager
//!   3. Build the sprite mesh and text for whatever screen is showing
//!   4. One render pass, back to front: tiles and coins, level text, player,
//!      HUD text with the fade overlay, debug overlay
//!
//! Key presses are forwarded as they arrive; held-key auto-repeat is dropped.

mod audio;
mod collision;
mod config;
mod controller;
mod entity;
mod events;
mod level;
mod parallax;
mod physics;
mod render;
#[cfg(test)]
mod replay;
mod screens;
mod session;

use std::rc::Rc;
use std::sync::Arc;

use winit::application::ApplicationHandler;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use audio::AudioManager;
use config::{config_path, load_game_config, GameConfig};
use entity::SpriteEntity;
use events::FrameEvent;
use level::{check_levels, DirLevelSource, LevelSource};
use render::{build_game_mesh, build_screen_mesh, FrameMesh, SpriteRenderer};
use screens::ScreenFlow;
use wc_core::input::Key;
use wc_core::time::FrameClock;
use wc_overlay::{DebugOverlay, OverlayStats, TextItem, TextLayer};
use wc_render::gpu_context::clear_color;
use wc_render::{Camera2D, GpuContext};

/// All state that needs a window. Constructed lazily in `resumed`.
struct GameState {
    window: Arc<Window>,
    gpu: GpuContext,
    clock: FrameClock,
    flow: ScreenFlow,
    sprites: SpriteRenderer,
    world_text: TextLayer,
    hud_text: TextLayer,
    debug_overlay: DebugOverlay,
    audio: Option<AudioManager>,
    /// View-space camera for the static screens.
    screen_camera: Camera2D,
}

/// What one frame draws, gathered before touching the GPU.
struct FrameContent {
    mesh: FrameMesh,
    camera: Camera2D,
    world_items: Vec<TextItem>,
    hud_items: Vec<TextItem>,
    fade_alpha: Option<u8>,
}

impl GameState {
    fn new(window: Arc<Window>, config: &GameConfig, levels: Rc<dyn LevelSource>) -> Self {
        let gpu = GpuContext::new(window.clone())
            .unwrap_or_else(|err| panic!("Failed to initialise GPU: {err}"));
        let screen_camera = Camera2D::new(config.window.width, config.window.height);
        let sprites = SpriteRenderer::new(&gpu.device, &gpu.queue, gpu.surface_format, &screen_camera);

        let fonts = config.font_sources();
        let mut world_text = TextLayer::new(&gpu.device, gpu.surface_format, "world_text");
        let mut hud_text = TextLayer::new(&gpu.device, gpu.surface_format, "hud_text");
        let loaded = world_text.load_fonts(&fonts);
        hud_text.load_fonts(&fonts);
        log::info!("Loaded {loaded} of {} configured fonts", fonts.len());

        let debug_overlay = DebugOverlay::new(&gpu.device, gpu.surface_format, &window);
        let audio = AudioManager::new(&config.sounds);

        Self {
            window,
            gpu,
            clock: FrameClock::new(),
            flow: ScreenFlow::new(config, levels),
            sprites,
            world_text,
            hud_text,
            debug_overlay,
            audio,
            screen_camera,
        }
    }

    fn key_event(&mut self, event_loop: &ActiveEventLoop, key: Key, state: ElementState) {
        match (key, state) {
            (Key::Escape, ElementState::Pressed) => {
                log::info!("Escape pressed, exiting.");
                event_loop.exit();
            }
            (Key::F3, ElementState::Pressed) => self.debug_overlay.toggle(),
            (Key::Escape | Key::F3, ElementState::Released) => {}
            (_, ElementState::Pressed) => self.flow.key_down(key),
            (_, ElementState::Released) => self.flow.key_up(key),
        }
    }

    fn dispatch(&mut self, events: &[FrameEvent]) {
        for event in events {
            match event {
                FrameEvent::LevelComplete { level } => log::info!("Level {level} complete"),
                FrameEvent::GameComplete { score } => log::info!("Game complete, score {score}"),
                _ => log::debug!("Frame event: {event:?}"),
            }
            if let Some(audio) = self.audio.as_mut() {
                audio.handle(event);
            }
        }
    }

    fn simulate(&mut self) {
        self.clock.begin_frame();
        let dt = self.clock.fixed_dt as f32;
        while self.clock.should_step() {
            let events = self.flow.update(dt);
            self.dispatch(&events);
        }
    }

    fn frame_content(&self) -> FrameContent {
        let fade_alpha = self.flow.fade_alpha();
        if let Some(session) = self.flow.session() {
            return FrameContent {
                mesh: build_game_mesh(session),
                camera: session.camera().clone(),
                world_items: session.world_text_in_view(),
                hud_items: session.hud_text(),
                fade_alpha,
            };
        }
        let (mesh, hud_items) = match self.flow.layout() {
            Some(layout) => (build_screen_mesh(&layout), layout.text),
            None => (FrameMesh::empty(), Vec::new()),
        };
        FrameContent {
            mesh,
            camera: self.screen_camera.clone(),
            world_items: Vec::new(),
            hud_items,
            fade_alpha,
        }
    }

    fn overlay_stats(&self) -> OverlayStats {
        let mut stats = OverlayStats {
            screen: format!("{:?}", self.flow.kind()),
            level: 0,
            controller_state: String::new(),
            player_position: [0.0; 2],
            player_velocity: [0.0; 2],
            pose: String::new(),
            on_ladder: false,
            can_jump: false,
            contacts: String::new(),
            parallax: String::new(),
            score: 0,
            coins_left: 0,
            draw_calls: self.sprites.draw_call_count() as u32,
            sprite_count: self.sprites.sprite_count() as u32,
        };
        if let Some(session) = self.flow.session() {
            let player = session.player();
            let controller = session.controller();
            stats.level = controller.level();
            stats.controller_state = controller.state().label().to_string();
            stats.player_position = player.position().to_array();
            stats.player_velocity = player.velocity.to_array();
            stats.pose = player.pose().label().to_string();
            stats.on_ladder = player.on_ladder;
            stats.can_jump = player.can_jump;
            stats.contacts = session
                .last_move()
                .map(|step| step.contact_label())
                .unwrap_or_default();
            let parallax = session.parallax();
            let ids: Vec<&str> = parallax
                .layers()
                .iter()
                .filter(|layer| !layer.frozen)
                .map(|layer| layer.layer_id.as_str())
                .collect();
            stats.parallax = format!("[{}] at x={:.1}", ids.join(", "), parallax.prev_camera_x());
            stats.score = controller.score();
            stats.coins_left = session.scene().coins.len();
        }
        stats
    }

    fn render(&mut self) {
        let content = self.frame_content();
        self.sprites
            .upload(&self.gpu.device, &self.gpu.queue, &content.mesh, &content.camera);

        let Some((output, view)) = self.gpu.begin_frame() else {
            return;
        };

        let size = self.gpu.size;
        let pixels_per_point = self.window.scale_factor() as f32;
        let world_text = self
            .world_text
            .prepare(size, pixels_per_point, &content.world_items, None);
        let hud_text = self
            .hud_text
            .prepare(size, pixels_per_point, &content.hud_items, content.fade_alpha);
        let stats = self.overlay_stats();
        let (overlay_primitives, overlay_textures) =
            self.debug_overlay.prepare(&self.window, &self.clock, &stats);
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [size.0, size.1],
            pixels_per_point,
        };

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        self.world_text
            .upload(&self.gpu.device, &self.gpu.queue, &mut encoder, &world_text);
        self.hud_text
            .upload(&self.gpu.device, &self.gpu.queue, &mut encoder, &hud_text);
        self.debug_overlay.upload(
            &self.gpu.device,
            &self.gpu.queue,
            &mut encoder,
            &overlay_primitives,
            &overlay_textures,
            &screen_descriptor,
        );

        {
            let clear_color = clear_color(content.mesh.clear_color);
            let mut render_pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Frame Render Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(clear_color),
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();

            self.sprites.draw(&mut render_pass, content.mesh.behind.clone());
            self.world_text.paint(&mut render_pass, &world_text);
            self.sprites.draw(&mut render_pass, content.mesh.player.clone());
            self.hud_text.paint(&mut render_pass, &hud_text);
            self.debug_overlay
                .paint(&mut render_pass, &overlay_primitives, &screen_descriptor);
        }

        self.world_text.cleanup(&world_text);
        self.hud_text.cleanup(&hud_text);
        self.debug_overlay.cleanup(&overlay_textures);

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
    }
}

struct App {
    config: GameConfig,
    levels: Rc<dyn LevelSource>,
    state: Option<GameState>,
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        let window = wc_platform::window::create_window(event_loop, &self.config.window)
            .unwrap_or_else(|err| panic!("{err}"));
        self.state = Some(GameState::new(window, &self.config, self.levels.clone()));
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = &self.state {
            state.window.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(state) = self.state.as_mut() else {
            return;
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

            WindowEvent::KeyboardInput { event, .. } if !egui_consumed && !event.repeat => {
                if let PhysicalKey::Code(key_code) = event.physical_key {
                    if let Some(key) = map_key(key_code) {
                        state.key_event(event_loop, key, event.state);
                    }
                }
            }

            WindowEvent::RedrawRequested => {
                if state.gpu.size.0 == 0 || state.gpu.size.1 == 0 {
                    return;
                }
                state.simulate();
                state.render();
            }

            _ => {}
        }
    }
}

fn map_key(key_code: KeyCode) -> Option<Key> {
    match key_code {
        KeyCode::ArrowLeft => Some(Key::Left),
        KeyCode::ArrowRight => Some(Key::Right),
        KeyCode::ArrowUp => Some(Key::Up),
        KeyCode::ArrowDown => Some(Key::Down),
        KeyCode::Escape => Some(Key::Escape),
        KeyCode::Space => Some(Key::Space),
        KeyCode::F3 => Some(Key::F3),
        KeyCode::KeyW => Some(Key::W),
        KeyCode::KeyA => Some(Key::A),
        KeyCode::KeyS => Some(Key::S),
        KeyCode::KeyD => Some(Key::D),
        _ => None,
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("WhyChem starting...");

    let path = config_path();
    let config = load_game_config(&path)
        .unwrap_or_else(|err| panic!("Failed to load config '{}': {err}", path.display()));

    let levels = DirLevelSource::new(config.levels_dir.clone());
    if let Err(err) = check_levels(&levels, config.max_level) {
        panic!(
            "Failed to load levels from '{}': {err}",
            config.levels_dir.display()
        );
    }

    let event_loop = EventLoop::new().expect("Failed to create event loop");
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App {
        config,
        levels: Rc::new(levels),
        state: None,
    };
    event_loop.run_app(&mut app).expect("Event loop error");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrows_and_wasd_map_to_movement_keys() {
        assert_eq!(map_key(KeyCode::ArrowLeft), Some(Key::Left));
        assert_eq!(map_key(KeyCode::KeyD), Some(Key::D));
        assert_eq!(map_key(KeyCode::Space), Some(Key::Space));
        assert_eq!(map_key(KeyCode::KeyQ), None);
    }
}
