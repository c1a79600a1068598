//! Background parallax.
//!
//! Each background layer gets an explicit `(layer, divisor)` entry at level
//! load. The divisor comes from the layer's position in the name-sorted
//! background list, `(index + 4) * 0.25`, so later names scroll slower. Every
//! frame each layer moves by `camera_dx / divisor`.

use crate::level::LevelScene;

#[derive(Debug, Clone, PartialEq)]
pub struct ParallaxLayer {
    pub layer_id: String,
    /// Position of the layer in `LevelScene::layers`.
    pub scene_index: usize,
    pub divisor: f32,
    pub frozen: bool,
}

#[derive(Debug, Clone)]
pub struct ParallaxScroller {
    layers: Vec<ParallaxLayer>,
    prev_camera_x: f32,
}

pub fn divisor_for(index: usize) -> f32 {
    (index as f32 + 4.0) * 0.25
}

impl ParallaxScroller {
    pub fn new(layers: Vec<ParallaxLayer>, camera_x: f32) -> Self {
        Self {
            layers,
            prev_camera_x: camera_x,
        }
    }

    /// Entries for every background layer in the scene, or none when the level
    /// has parallax switched off.
    pub fn for_scene(scene: &LevelScene, camera_x: f32) -> Self {
        if !scene.config.parallax_enabled {
            return Self::new(Vec::new(), camera_x);
        }
        let layers = scene
            .background_layer_names()
            .into_iter()
            .enumerate()
            .filter_map(|(index, name)| {
                let scene_index = scene.layers.iter().position(|l| l.id == name)?;
                Some(ParallaxLayer {
                    layer_id: name,
                    scene_index,
                    divisor: divisor_for(index),
                    frozen: scene.config.frozen_parallax_layers.contains(&index),
                })
            })
            .collect();
        Self::new(layers, camera_x)
    }

    pub fn layers(&self) -> &[ParallaxLayer] {
        &self.layers
    }

    pub fn prev_camera_x(&self) -> f32 {
        self.prev_camera_x
    }

    /// Per-layer x offsets for this frame as `(scene_index, offset)`. Records
    /// `camera_x` as the new previous sample.
    pub fn step(&mut self, camera_x: f32) -> Vec<(usize, f32)> {
        let delta = camera_x - self.prev_camera_x;
        self.prev_camera_x = camera_x;
        self.layers
            .iter()
            .filter(|layer| !layer.frozen)
            .map(|layer| (layer.scene_index, delta / layer.divisor))
            .collect()
    }

    pub fn scroll(&mut self, camera_x: f32, scene: &mut LevelScene) {
        for (index, offset) in self.step(camera_x) {
            if offset != 0.0 {
                if let Some(layer) = scene.layers.get_mut(index) {
                    layer.shift_x(offset);
                }
            }
        }
    }
}
