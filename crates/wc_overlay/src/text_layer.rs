//! Styled text drawn with egui on top of (or between) sprite passes.
//!
//! Callers describe text in view units with the origin at the bottom-left and y
//! pointing up, the same convention the camera uses. Each `TextLayer` owns its
//! own egui context and renderer so several layers can be interleaved with
//! sprite passes in one frame (world text under the player, HUD above it).
//!
//! Phases mirror the debug overlay: `prepare` (layout + tessellate), `upload`
//! (textures and buffers, needs the encoder), `paint` (inside a render pass),
//! `cleanup` (free textures egui dropped).

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

/// Which point of the laid-out text block sits on the item's `(x, y)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Anchor {
    #[default]
    BottomLeft,
    BottomCenter,
    TopLeft,
    TopCenter,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextItem {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub color: [u8; 4],
    pub size: f32,
    pub font: Option<String>,
    pub anchor: Anchor,
    pub wrap_width: Option<f32>,
    /// Counter-clockwise, around the anchor.
    pub rotation_deg: f32,
}

impl TextItem {
    pub fn new(text: impl Into<String>, x: f32, y: f32) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            color: [0, 0, 0, 255],
            size: 18.0,
            font: None,
            anchor: Anchor::BottomLeft,
            wrap_width: None,
            rotation_deg: 0.0,
        }
    }

    pub fn color(mut self, color: [u8; 4]) -> Self {
        self.color = color;
        self
    }

    pub fn size(mut self, size: f32) -> Self {
        self.size = size;
        self
    }

    pub fn font(mut self, font: impl Into<String>) -> Self {
        self.font = Some(font.into());
        self
    }

    pub fn anchor(mut self, anchor: Anchor) -> Self {
        self.anchor = anchor;
        self
    }

    pub fn wrap(mut self, width: f32) -> Self {
        self.wrap_width = Some(width);
        self
    }

    pub fn rotated(mut self, degrees: f32) -> Self {
        self.rotation_deg = degrees;
        self
    }
}

/// A TTF file registered under a family name (e.g. "American Typewriter").
#[derive(Debug, Clone)]
pub struct FontSource {
    pub name: String,
    pub path: PathBuf,
}

pub struct PreparedText {
    pub primitives: Vec<egui::ClippedPrimitive>,
    pub textures_delta: egui::TexturesDelta,
    pub screen_descriptor: egui_wgpu::ScreenDescriptor,
}

pub struct TextLayer {
    ctx: egui::Context,
    renderer: egui_wgpu::Renderer,
    layer_id: egui::LayerId,
    families: HashSet<String>,
}

impl TextLayer {
    pub fn new(device: &wgpu::Device, surface_format: wgpu::TextureFormat, name: &str) -> Self {
        Self {
            ctx: egui::Context::default(),
            renderer: egui_wgpu::Renderer::new(device, surface_format, None, 1, false),
            layer_id: egui::LayerId::new(egui::Order::Middle, egui::Id::new(name)),
            families: HashSet::new(),
        }
    }

    /// Registers the given fonts; missing files are skipped and their family
    /// falls back to egui's proportional font. Returns how many loaded.
    pub fn load_fonts(&mut self, fonts: &[FontSource]) -> usize {
        let mut definitions = egui::FontDefinitions::default();
        let fallback = definitions
            .families
            .get(&egui::FontFamily::Proportional)
            .cloned()
            .unwrap_or_default();

        for source in fonts {
            let bytes = match std::fs::read(&source.path) {
                Ok(bytes) => bytes,
                Err(err) => {
                    log::warn!(
                        "Font '{}' not loaded from {}: {err}",
                        source.name,
                        source.path.display()
                    );
                    continue;
                }
            };
            definitions.font_data.insert(
                source.name.clone(),
                Arc::new(egui::FontData::from_owned(bytes)),
            );
            let mut chain = vec![source.name.clone()];
            chain.extend(fallback.iter().cloned());
            definitions
                .families
                .insert(egui::FontFamily::Name(source.name.as_str().into()), chain);
            self.families.insert(source.name.clone());
        }

        self.ctx.set_fonts(definitions);
        self.families.len()
    }

    pub fn prepare(
        &mut self,
        size_px: (u32, u32),
        pixels_per_point: f32,
        items: &[TextItem],
        fade_alpha: Option<u8>,
    ) -> PreparedText {
        let view = egui::vec2(
            size_px.0 as f32 / pixels_per_point,
            size_px.1 as f32 / pixels_per_point,
        );
        let mut raw_input = egui::RawInput {
            screen_rect: Some(egui::Rect::from_min_size(egui::Pos2::ZERO, view)),
            ..Default::default()
        };
        raw_input
            .viewports
            .entry(egui::ViewportId::ROOT)
            .or_default()
            .native_pixels_per_point = Some(pixels_per_point);

        let layer_id = self.layer_id;
        let families = &self.families;
        let full_output = self.ctx.run(raw_input, |ctx| {
            let painter = ctx.layer_painter(layer_id);
            for item in items {
                paint_item(&painter, families, view.y, item);
            }
            if let Some(alpha) = fade_alpha {
                painter.rect_filled(
                    egui::Rect::from_min_size(egui::Pos2::ZERO, view),
                    0.0,
                    egui::Color32::from_black_alpha(alpha),
                );
            }
        });

        let primitives = self
            .ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        PreparedText {
            primitives,
            textures_delta: full_output.textures_delta,
            screen_descriptor: egui_wgpu::ScreenDescriptor {
                size_in_pixels: [size_px.0, size_px.1],
                pixels_per_point,
            },
        }
    }

    pub fn upload(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        prepared: &PreparedText,
    ) {
        for (id, delta) in &prepared.textures_delta.set {
            self.renderer.update_texture(device, queue, *id, delta);
        }
        self.renderer.update_buffers(
            device,
            queue,
            encoder,
            &prepared.primitives,
            &prepared.screen_descriptor,
        );
    }

    pub fn paint(&self, render_pass: &mut wgpu::RenderPass<'static>, prepared: &PreparedText) {
        self.renderer
            .render(render_pass, &prepared.primitives, &prepared.screen_descriptor);
    }

    pub fn cleanup(&mut self, prepared: &PreparedText) {
        for id in &prepared.textures_delta.free {
            self.renderer.free_texture(id);
        }
    }
}

fn paint_item(painter: &egui::Painter, families: &HashSet<String>, view_height: f32, item: &TextItem) {
    let family = match item.font.as_deref() {
        Some(name) if families.contains(name) => egui::FontFamily::Name(name.into()),
        _ => egui::FontFamily::Proportional,
    };
    let [r, g, b, a] = item.color;
    let color = egui::Color32::from_rgba_unmultiplied(r, g, b, a);
    let galley = painter.layout(
        item.text.clone(),
        egui::FontId::new(item.size, family),
        color,
        item.wrap_width.unwrap_or(f32::INFINITY),
    );

    let anchor = egui::pos2(item.x, view_height - item.y);
    let offset = block_offset(item.anchor, galley.size());
    let angle = -item.rotation_deg.to_radians();
    let rotated = egui::emath::Rot2::from_angle(angle) * offset;
    painter.add(egui::epaint::TextShape::new(anchor + rotated, galley, color).with_angle(angle));
}

/// Vector from the anchor point to the block's top-left corner (screen space, y down).
fn block_offset(anchor: Anchor, size: egui::Vec2) -> egui::Vec2 {
    match anchor {
        Anchor::BottomLeft => egui::vec2(0.0, -size.y),
        Anchor::BottomCenter => egui::vec2(-size.x * 0.5, -size.y),
        Anchor::TopLeft => egui::Vec2::ZERO,
        Anchor::TopCenter => egui::vec2(-size.x * 0.5, 0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_style() {
        let item = TextItem::new("Score: 10", 10.0, 10.0)
            .size(30.0)
            .color([255, 255, 255, 255])
            .anchor(Anchor::BottomCenter)
            .wrap(400.0)
            .rotated(20.0)
            .font("American Typewriter");
        assert_eq!(item.size, 30.0);
        assert_eq!(item.color, [255, 255, 255, 255]);
        assert_eq!(item.anchor, Anchor::BottomCenter);
        assert_eq!(item.wrap_width, Some(400.0));
        assert_eq!(item.rotation_deg, 20.0);
        assert_eq!(item.font.as_deref(), Some("American Typewriter"));
    }

    #[test]
    fn block_offset_places_anchor_on_block_edge() {
        let size = egui::vec2(100.0, 20.0);
        assert_eq!(block_offset(Anchor::BottomLeft, size), egui::vec2(0.0, -20.0));
        assert_eq!(block_offset(Anchor::BottomCenter, size), egui::vec2(-50.0, -20.0));
        assert_eq!(block_offset(Anchor::TopCenter, size), egui::vec2(-50.0, 0.0));
        assert_eq!(block_offset(Anchor::TopLeft, size), egui::Vec2::ZERO);
    }
}
