//! Sprite batching and the GPU side of drawing it.
//!
//! The mesh is rebuilt on the CPU every frame. Quads are emitted in draw order
//! and consecutive quads that share a texture collapse into one draw call. The
//! frame is split into two draw-call ranges so text can be composited between
//! them: everything behind the player (tiles, coins, screen pictures) and the
//! player itself.

use std::collections::HashMap;
use std::ops::Range;
use std::path::Path;
use std::sync::Arc;

use glam::Vec2;
use wgpu::util::DeviceExt;
use wc_render::{Camera2D, SpritePipeline, SpriteVertex, Texture};

use crate::entity::SpriteEntity;
use crate::screens::ScreenLayout;
use crate::session::GameSession;

/// 1x1 white texture used for untextured quads and textures that failed to load.
pub const WHITE_TEXTURE: &str = "__white";

/// A contiguous run of indices that share the same texture binding.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub texture_key: Arc<str>,
    pub index_start: u32,
    pub index_count: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct QuadSpec<'a> {
    pub texture_key: &'a str,
    pub center: Vec2,
    pub size: Vec2,
    pub color: [f32; 4],
    pub flip_x: bool,
}

#[derive(Debug, Default)]
pub struct MeshBuilder {
    pub vertices: Vec<SpriteVertex>,
    pub indices: Vec<u32>,
    pub draw_calls: Vec<DrawCall>,
    /// Draw calls below this index are never merged into.
    sealed: usize,
}

impl MeshBuilder {
    pub fn with_capacity(quads: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(quads * 4),
            indices: Vec::with_capacity(quads * 6),
            draw_calls: Vec::with_capacity(16),
            sealed: 0,
        }
    }

    pub fn sprite_count(&self) -> usize {
        self.vertices.len() / 4
    }

    /// Index of the next draw call; used to delimit ranges.
    pub fn mark(&self) -> usize {
        self.draw_calls.len()
    }

    /// Seals the current draw call so the next quad starts a new one even if it
    /// shares the texture.
    fn split(&mut self) -> usize {
        self.sealed = self.draw_calls.len();
        self.sealed
    }

    pub fn add_quad(&mut self, spec: QuadSpec<'_>) {
        let half = spec.size * 0.5;
        let (u0, u1) = if spec.flip_x { (1.0, 0.0) } else { (0.0, 1.0) };
        let base_index = self.vertices.len() as u32;
        let (left, right) = (spec.center.x - half.x, spec.center.x + half.x);
        let (bottom, top) = (spec.center.y - half.y, spec.center.y + half.y);

        self.vertices.extend_from_slice(&[
            SpriteVertex::new([left, bottom], [u0, 1.0], spec.color),
            SpriteVertex::new([right, bottom], [u1, 1.0], spec.color),
            SpriteVertex::new([right, top], [u1, 0.0], spec.color),
            SpriteVertex::new([left, top], [u0, 0.0], spec.color),
        ]);

        let draw_start = self.indices.len() as u32;
        self.indices.extend_from_slice(&[
            base_index,
            base_index + 1,
            base_index + 2,
            base_index,
            base_index + 2,
            base_index + 3,
        ]);
        self.push_draw_call(Arc::from(spec.texture_key), draw_start, 6);
    }

    pub fn add_entity(&mut self, entity: &dyn SpriteEntity) {
        let appearance = entity.appearance();
        self.add_quad(QuadSpec {
            texture_key: appearance.texture.as_deref().unwrap_or(WHITE_TEXTURE),
            center: entity.position(),
            size: entity.size(),
            color: appearance.color,
            flip_x: appearance.flip_x,
        });
    }

    fn push_draw_call(&mut self, texture_key: Arc<str>, index_start: u32, index_count: u32) {
        let mergeable = self.draw_calls.len() > self.sealed;
        if let Some(last) = self.draw_calls.last_mut().filter(|_| mergeable) {
            let contiguous = last.index_start + last.index_count == index_start;
            if *last.texture_key == *texture_key && contiguous {
                last.index_count += index_count;
                return;
            }
        }
        self.draw_calls.push(DrawCall {
            texture_key,
            index_start,
            index_count,
        });
    }

    /// Every texture the mesh references, excluding the built-in white.
    pub fn texture_keys(&self) -> impl Iterator<Item = &str> {
        self.draw_calls
            .iter()
            .map(|d| &*d.texture_key)
            .filter(|key| *key != WHITE_TEXTURE)
    }
}

/// One frame's sprites plus the draw-call ranges each pass consumes.
#[derive(Debug)]
pub struct FrameMesh {
    pub mesh: MeshBuilder,
    pub behind: Range<usize>,
    pub player: Range<usize>,
    pub clear_color: [u8; 3],
}

impl FrameMesh {
    pub fn empty() -> Self {
        Self {
            mesh: MeshBuilder::default(),
            behind: 0..0,
            player: 0..0,
            clear_color: [0, 0, 0],
        }
    }
}

fn visible_in(camera: &Camera2D, centre: Vec2, size: Vec2) -> bool {
    let corner = camera.bottom_left();
    let extent = camera.half_extent() * 2.0;
    let half = size * 0.5;
    centre.x + half.x >= corner.x
        && centre.x - half.x <= corner.x + extent.x
        && centre.y + half.y >= corner.y
        && centre.y - half.y <= corner.y + extent.y
}

/// Tiles and coins in view, in authored layer order, then the player.
pub fn build_game_mesh(session: &GameSession) -> FrameMesh {
    let scene = session.scene();
    let camera = session.camera();
    let estimate = scene.layers.iter().map(|l| l.tiles.len()).sum::<usize>() + scene.coins.len() + 1;
    let mut mesh = MeshBuilder::with_capacity(estimate);

    let layer_tiles = scene
        .layers
        .iter()
        .filter(|layer| layer.visible)
        .flat_map(|layer| layer.tiles.iter().map(|t| t as &dyn SpriteEntity));
    let coins = scene.coins.iter().map(|c| c as &dyn SpriteEntity);
    for entity in layer_tiles.chain(coins) {
        if visible_in(camera, entity.position(), entity.size()) {
            mesh.add_entity(entity);
        }
    }
    let behind = 0..mesh.split();

    mesh.add_entity(session.player());
    let player = behind.end..mesh.mark();

    FrameMesh {
        mesh,
        behind,
        player,
        clear_color: scene.background_color,
    }
}

/// Pictures of a static screen, in view coordinates.
pub fn build_screen_mesh(layout: &ScreenLayout) -> FrameMesh {
    let mut mesh = MeshBuilder::with_capacity(layout.images.len());
    for image in &layout.images {
        mesh.add_quad(QuadSpec {
            texture_key: &image.texture,
            center: image.center,
            size: image.size,
            color: [1.0, 1.0, 1.0, 1.0],
            flip_x: false,
        });
    }
    let end = mesh.mark();
    FrameMesh {
        mesh,
        behind: 0..end,
        player: end..end,
        clear_color: layout.background,
    }
}

struct GpuSpriteTexture {
    _texture: Texture,
    bind_group: wgpu::BindGroup,
}

/// Owns the sprite pipeline, the texture cache and the streamed mesh buffers.
pub struct SpriteRenderer {
    pipeline: SpritePipeline,
    textures: HashMap<Arc<str>, GpuSpriteTexture>,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    vertex_capacity: usize,
    index_capacity: usize,
    draw_calls: Vec<DrawCall>,
    sprite_count: usize,
}

impl SpriteRenderer {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        camera: &Camera2D,
    ) -> Self {
        let pipeline = SpritePipeline::new(device, surface_format);
        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Uniform Buffer"),
            contents: bytemuck::cast_slice(&[camera.build_uniform()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let camera_bind_group = pipeline.create_camera_bind_group(device, &camera_buffer);

        let mut renderer = Self {
            pipeline,
            textures: HashMap::new(),
            vertex_buffer: create_vertex_buffer(device, 1),
            index_buffer: create_index_buffer(device, 1),
            camera_buffer,
            camera_bind_group,
            vertex_capacity: 1,
            index_capacity: 1,
            draw_calls: Vec::new(),
            sprite_count: 0,
        };
        let white = Texture::from_rgba8(device, queue, &[255, 255, 255, 255], 1, 1, "white");
        renderer.insert_texture(device, Arc::from(WHITE_TEXTURE), white);
        renderer
    }

    pub fn draw_call_count(&self) -> usize {
        self.draw_calls.len()
    }

    pub fn sprite_count(&self) -> usize {
        self.sprite_count
    }

    fn insert_texture(&mut self, device: &wgpu::Device, key: Arc<str>, texture: Texture) {
        let bind_group = self.pipeline.create_texture_bind_group(device, &texture);
        self.textures.insert(
            key,
            GpuSpriteTexture {
                _texture: texture,
                bind_group,
            },
        );
    }

    /// Loads textures the mesh needs that are not cached yet. A texture that
    /// fails to load is cached as white so it is only reported once.
    fn ensure_textures(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, mesh: &MeshBuilder) {
        let missing: Vec<Arc<str>> = mesh
            .texture_keys()
            .filter(|key| !self.textures.contains_key(*key))
            .map(Arc::from)
            .collect();
        for key in missing {
            if self.textures.contains_key(&key) {
                continue;
            }
            let texture = match Texture::from_path(device, queue, Path::new(&*key)) {
                Ok(texture) => texture,
                Err(err) => {
                    log::warn!("{err}. Drawing it untextured.");
                    Texture::from_rgba8(device, queue, &[255, 255, 255, 255], 1, 1, &key)
                }
            };
            self.insert_texture(device, key, texture);
        }
    }

    fn ensure_mesh_capacity(&mut self, device: &wgpu::Device, vertex_count: usize, index_count: usize) {
        let needed_vertices = vertex_count.max(1);
        if needed_vertices > self.vertex_capacity {
            self.vertex_capacity = needed_vertices.next_power_of_two();
            self.vertex_buffer = create_vertex_buffer(device, self.vertex_capacity);
        }
        let needed_indices = index_count.max(1);
        if needed_indices > self.index_capacity {
            self.index_capacity = needed_indices.next_power_of_two();
            self.index_buffer = create_index_buffer(device, self.index_capacity);
        }
    }

    /// Streams the frame's mesh and camera into GPU buffers.
    pub fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, frame: &FrameMesh, camera: &Camera2D) {
        let mesh = &frame.mesh;
        self.ensure_textures(device, queue, mesh);
        self.ensure_mesh_capacity(device, mesh.vertices.len(), mesh.indices.len());
        if !mesh.vertices.is_empty() {
            queue.write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(&mesh.vertices));
        }
        if !mesh.indices.is_empty() {
            queue.write_buffer(&self.index_buffer, 0, bytemuck::cast_slice(&mesh.indices));
        }
        queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::cast_slice(&[camera.build_uniform()]),
        );
        self.draw_calls = mesh.draw_calls.clone();
        self.sprite_count = mesh.sprite_count();
    }

    /// Issues the draw calls in `range`, rebinding textures only on change.
    pub fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>, range: Range<usize>) {
        let Some(draws) = self.draw_calls.get(range) else {
            return;
        };
        if draws.is_empty() {
            return;
        }
        render_pass.set_pipeline(&self.pipeline.render_pipeline);
        render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);

        let mut last_bound: Option<&Arc<str>> = None;
        for draw in draws {
            let Some(texture) = self.textures.get(&draw.texture_key) else {
                continue;
            };
            if last_bound != Some(&draw.texture_key) {
                render_pass.set_bind_group(1, &texture.bind_group, &[]);
                last_bound = Some(&draw.texture_key);
            }
            render_pass.draw_indexed(draw.index_start..draw.index_start + draw.index_count, 0, 0..1);
        }
    }
}

fn create_vertex_buffer(device: &wgpu::Device, vertex_capacity: usize) -> wgpu::Buffer {
    let byte_len = (vertex_capacity * std::mem::size_of::<SpriteVertex>()).max(1) as u64;
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Sprite Vertex Buffer"),
        size: byte_len,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn create_index_buffer(device: &wgpu::Device, index_capacity: usize) -> wgpu::Buffer {
    let byte_len = (index_capacity * std::mem::size_of::<u32>()).max(1) as u64;
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Sprite Index Buffer"),
        size: byte_len,
        usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screens::start_layout;
    use crate::session::tests::{session_with, FlatLevels, DT};

    fn quad(texture_key: &str, x: f32) -> QuadSpec<'_> {
        QuadSpec {
            texture_key,
            center: Vec2::new(x, 0.0),
            size: Vec2::new(10.0, 10.0),
            color: [1.0; 4],
            flip_x: false,
        }
    }

    #[test]
    fn consecutive_quads_with_same_texture_share_a_draw_call() {
        let mut mesh = MeshBuilder::default();
        mesh.add_quad(quad("a.png", 0.0));
        mesh.add_quad(quad("a.png", 20.0));
        mesh.add_quad(quad("b.png", 40.0));
        mesh.add_quad(quad("a.png", 60.0));
        assert_eq!(mesh.sprite_count(), 4);
        let counts: Vec<(&str, u32)> = mesh
            .draw_calls
            .iter()
            .map(|d| (&*d.texture_key, d.index_count))
            .collect();
        assert_eq!(counts, vec![("a.png", 12), ("b.png", 6), ("a.png", 6)]);
    }

    #[test]
    fn flipped_quad_mirrors_texture_coordinates() {
        let mut mesh = MeshBuilder::default();
        mesh.add_quad(QuadSpec {
            flip_x: true,
            ..quad("p.png", 0.0)
        });
        assert_eq!(mesh.vertices[0].position, [-5.0, -5.0]);
        assert_eq!(mesh.vertices[0].tex_coords, [1.0, 1.0]);
        assert_eq!(mesh.vertices[1].tex_coords, [0.0, 1.0]);
    }

    #[test]
    fn white_texture_is_not_reported_as_needed() {
        let mut mesh = MeshBuilder::default();
        mesh.add_quad(quad(WHITE_TEXTURE, 0.0));
        mesh.add_quad(quad("x.png", 20.0));
        assert_eq!(mesh.texture_keys().collect::<Vec<_>>(), vec!["x.png"]);
    }

    #[test]
    fn game_mesh_draws_player_last_in_its_own_range() {
        let mut session = session_with(FlatLevels::new(5000.0));
        session.update(DT);
        let frame = build_game_mesh(&session);
        assert!(!frame.behind.is_empty());
        assert_eq!(frame.player.len(), 1);
        assert_eq!(frame.player.start, frame.behind.end);
        let player_draw = &frame.mesh.draw_calls[frame.player.start];
        assert_eq!(&*player_draw.texture_key, session.player().texture_path());
        assert_eq!(frame.clear_color, session.scene().background_color);
    }

    #[test]
    fn game_mesh_culls_tiles_outside_the_view() {
        let session = session_with(FlatLevels::new(5000.0));
        let frame = build_game_mesh(&session);
        // 1000px view over 128px floor cells starting at x = 0: cells 0..=7.
        assert_eq!(frame.mesh.sprite_count(), 8 + 1);
    }

    #[test]
    fn screen_mesh_has_no_player_range() {
        let frame = build_screen_mesh(&start_layout(1000.0, 650.0));
        assert_eq!(frame.mesh.sprite_count(), 3);
        assert!(frame.player.is_empty());
        assert_eq!(frame.clear_color, [255, 255, 255]);
    }
}
