//! F3 debug window drawn with egui over the finished frame.
//!
//! `egui_wgpu::Renderer::render()` wants a `RenderPass<'static>` while
//! `begin_render_pass` borrows the encoder, so drawing is split in four:
//!
//!   1. `prepare()` runs the UI and tessellates
//!   2. `upload()`  pushes textures and buffers (needs the encoder)
//!   3. `paint()`   renders into a pass created with `forget_lifetime()`
//!   4. `cleanup()` frees textures egui dropped
//!
//! Window events always reach egui so the window can be dragged while shown.

use wc_core::time::FrameClock;
use winit::window::Window;

#[derive(Debug, Clone, Default)]
pub struct OverlayStats {
    pub screen: String,
    pub level: u32,
    pub controller_state: String,
    pub player_position: [f32; 2],
    pub player_velocity: [f32; 2],
    pub pose: String,
    pub on_ladder: bool,
    pub can_jump: bool,
    /// Sides the last physics step was blocked on.
    pub contacts: String,
    /// Scrolling background layers and the camera x they last moved for.
    pub parallax: String,
    pub score: u32,
    pub coins_left: usize,
    pub draw_calls: u32,
    pub sprite_count: u32,
}

pub struct DebugOverlay {
    pub egui_ctx: egui::Context,
    pub egui_winit_state: egui_winit::State,
    pub egui_renderer: egui_wgpu::Renderer,
    pub visible: bool,
}

impl DebugOverlay {
    pub fn new(device: &wgpu::Device, surface_format: wgpu::TextureFormat, window: &Window) -> Self {
        let egui_ctx = egui::Context::default();
        let egui_winit_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui_ctx.viewport_id(),
            window,
            None,
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(device, surface_format, None, 1, false);

        Self {
            egui_ctx,
            egui_winit_state,
            egui_renderer,
            visible: false,
        }
    }

    pub fn handle_window_event(&mut self, window: &Window, event: &winit::event::WindowEvent) -> bool {
        self.egui_winit_state.on_window_event(window, event).consumed
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
        log::info!("Debug overlay: {}", if self.visible { "ON" } else { "OFF" });
    }

    pub fn prepare(
        &mut self,
        window: &Window,
        clock: &FrameClock,
        stats: &OverlayStats,
    ) -> (Vec<egui::ClippedPrimitive>, egui::TexturesDelta) {
        let raw_input = self.egui_winit_state.take_egui_input(window);
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            if !self.visible {
                return;
            }
            egui::Window::new("Debug")
                .default_pos([10.0, 40.0])
                .show(ctx, |ui| {
                    ui.label(format!("FPS: {:.1}", clock.smoothed_fps));
                    ui.label(format!("Frame time: {:.2} ms", clock.smoothed_frame_time_ms));
                    ui.label(format!("Steps this frame: {}", clock.steps_this_frame));
                    ui.label(format!("Total steps: {}", clock.total_steps));

                    ui.separator();
                    ui.label(format!("Screen: {}", stats.screen));
                    ui.label(format!("Level: {} ({})", stats.level, stats.controller_state));
                    ui.label(format!(
                        "Player: ({:.1}, {:.1}) v=({:.1}, {:.1})",
                        stats.player_position[0],
                        stats.player_position[1],
                        stats.player_velocity[0],
                        stats.player_velocity[1]
                    ));
                    ui.label(format!(
                        "Pose: {}  ladder={} can_jump={}",
                        stats.pose, stats.on_ladder, stats.can_jump
                    ));
                    ui.label(format!("Contacts: {}", stats.contacts));
                    ui.label(format!("Parallax: {}", stats.parallax));
                    ui.label(format!("Score: {}  coins left: {}", stats.score, stats.coins_left));

                    ui.separator();
                    ui.label(format!("Draw calls: {}", stats.draw_calls));
                    ui.label(format!("Sprites: {}", stats.sprite_count));
                });
        });

        self.egui_winit_state
            .handle_platform_output(window, full_output.platform_output);

        let primitives = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        (primitives, full_output.textures_delta)
    }

    pub fn upload(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        primitives: &[egui::ClippedPrimitive],
        textures_delta: &egui::TexturesDelta,
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
    ) {
        for (id, image_delta) in &textures_delta.set {
            self.egui_renderer.update_texture(device, queue, *id, image_delta);
        }
        self.egui_renderer
            .update_buffers(device, queue, encoder, primitives, screen_descriptor);
    }

    pub fn paint(
        &self,
        render_pass: &mut wgpu::RenderPass<'static>,
        primitives: &[egui::ClippedPrimitive],
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
    ) {
        self.egui_renderer.render(render_pass, primitives, screen_descriptor);
    }

    pub fn cleanup(&mut self, textures_delta: &egui::TexturesDelta) {
        for id in &textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }
}
