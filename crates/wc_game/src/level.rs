//! Level files and the runtime scene built from them.
//!
//! A level is one JSON file (`level_{n}.json`) holding a grid description, an
//! ordered list of layers and optional animation clips and world text. A
//! layer's gameplay role comes from its name:
//!
//! | name          | role                                   |
//! |---------------|----------------------------------------|
//! | `Platforms*`  | walls (collision set from `wall_layers`) |
//! | `Ladders`     | climbable cells                        |
//! | `Coins`       | collectable coins                      |
//! | `Decorations` | foreground decoration                  |
//! | `Player`      | reserved, never drawn from the file    |
//! | anything else | background, scrolled by parallax       |
//!
//! Layers draw in file order. Coins are pulled out into their own list so they
//! can be collected; they draw after every other layer.

use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use wc_core::clip::FrameClip;
use wc_overlay::{Anchor, TextItem};

use crate::collision::{Aabb, CollisionGrid, GridCell, GridSpec};
use crate::entity::{ClipPlayback, Coin, EntityKind, SpriteEntity, Tile};

pub const SUPPORTED_VERSION: &str = "0.1";
/// Width of one authoring unit for the built-in end-of-map table.
pub const MAP_UNIT: f32 = 512.0;
const END_OF_MAP_UNITS: [f32; 4] = [7.25, 12.26, 12.26, 12.26];
const TEXT_Y_SCALE: [f32; 4] = [0.62, 1.0, 1.0, 1.3];

pub const LAYER_PLATFORMS: &str = "Platforms";
pub const LAYER_LADDERS: &str = "Ladders";
pub const LAYER_COINS: &str = "Coins";
pub const LAYER_DECORATIONS: &str = "Decorations";
pub const LAYER_PLAYER: &str = "Player";

// --- File format -----------------------------------------------------------

#[derive(Debug, Deserialize, Clone)]
pub struct LevelFile {
    pub version: String,
    pub level_id: String,
    #[serde(default = "default_background")]
    pub background_color: [u8; 3],
    pub grid: GridSpec,
    #[serde(default)]
    pub config: LevelConfigOverrides,
    pub layers: Vec<LevelLayer>,
    #[serde(default)]
    pub animations: HashMap<String, ClipDef>,
    #[serde(default)]
    pub text: Vec<TextObject>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LevelLayer {
    pub id: String,
    #[serde(default = "default_visible")]
    pub visible: bool,
    /// Texture for every cell in the layer.
    #[serde(default)]
    pub texture: Option<String>,
    #[serde(default = "default_color")]
    pub color: [u8; 4],
    #[serde(default)]
    pub animation: Option<String>,
    #[serde(default)]
    pub cells: Vec<GridCell>,
    #[serde(default)]
    pub sprites: Vec<LevelSprite>,
}

/// A free-placed sprite; `x`/`y` is the bottom-left corner.
#[derive(Debug, Deserialize, Clone)]
pub struct LevelSprite {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    #[serde(default)]
    pub texture: Option<String>,
    #[serde(default)]
    pub color: Option<[u8; 4]>,
    #[serde(default)]
    pub animation: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ClipDef {
    pub frames: Vec<ClipFrameDef>,
    #[serde(default = "default_looping")]
    pub looping: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ClipFrameDef {
    pub texture: String,
    pub duration_ms: u64,
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TextObject {
    pub text: String,
    pub x: f32,
    pub y: f32,
    #[serde(default = "default_text_color")]
    pub color: [u8; 4],
    #[serde(default = "default_font_size")]
    pub font_size: f32,
    #[serde(default)]
    pub width: Option<f32>,
    #[serde(default)]
    pub align: TextAlign,
    #[serde(default)]
    pub font: Option<String>,
    #[serde(default)]
    pub wrap: bool,
    #[serde(default)]
    pub rotation: f32,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct LevelConfigOverrides {
    pub end_of_map: Option<f32>,
    pub text_y_scale: Option<f32>,
    pub wall_layers: Option<Vec<String>>,
    pub parallax_enabled: Option<bool>,
    pub frozen_parallax_layers: Option<Vec<usize>>,
    pub hud_color: Option<[u8; 4]>,
}

// --- Per-level configuration ------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct LevelConfig {
    /// World x the player's right edge must reach to finish the level.
    pub end_of_map: f32,
    pub text_y_scale: f32,
    /// Layers merged into the collision set.
    pub wall_layers: Vec<String>,
    pub parallax_enabled: bool,
    /// Indices into the sorted background layer list that never scroll.
    pub frozen_parallax_layers: Vec<usize>,
    pub hud_color: [u8; 4],
}

impl LevelConfig {
    /// Stock values for levels 1..=4; later levels reuse the last entry.
    pub fn builtin(level: u32) -> Self {
        let index = (level.max(1) as usize - 1).min(END_OF_MAP_UNITS.len() - 1);
        let wall_layers = if level > 1 {
            vec![
                LAYER_PLATFORMS.to_string(),
                format!("{LAYER_PLATFORMS}_1"),
                format!("{LAYER_PLATFORMS}_2"),
            ]
        } else {
            vec![LAYER_PLATFORMS.to_string()]
        };
        Self {
            end_of_map: END_OF_MAP_UNITS[index] * MAP_UNIT,
            text_y_scale: TEXT_Y_SCALE[index],
            wall_layers,
            parallax_enabled: level > 1,
            frozen_parallax_layers: if level == 4 { vec![3] } else { Vec::new() },
            hud_color: if level == 1 {
                [0, 0, 0, 255]
            } else {
                [255, 255, 255, 255]
            },
        }
    }

    pub fn with_overrides(mut self, overrides: &LevelConfigOverrides) -> Self {
        if let Some(end) = overrides.end_of_map {
            self.end_of_map = end;
        }
        if let Some(scale) = overrides.text_y_scale {
            self.text_y_scale = scale;
        }
        if let Some(walls) = &overrides.wall_layers {
            self.wall_layers = walls.clone();
        }
        if let Some(enabled) = overrides.parallax_enabled {
            self.parallax_enabled = enabled;
        }
        if let Some(frozen) = &overrides.frozen_parallax_layers {
            self.frozen_parallax_layers = frozen.clone();
        }
        if let Some(color) = overrides.hud_color {
            self.hud_color = color;
        }
        self
    }
}

// --- Runtime scene ------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerRole {
    Wall,
    Ladder,
    Coins,
    Decoration,
    Player,
    Background,
}

impl LayerRole {
    pub fn from_name(name: &str) -> Self {
        match name {
            LAYER_LADDERS => LayerRole::Ladder,
            LAYER_COINS => LayerRole::Coins,
            LAYER_DECORATIONS => LayerRole::Decoration,
            LAYER_PLAYER => LayerRole::Player,
            _ if name.starts_with(LAYER_PLATFORMS) => LayerRole::Wall,
            _ => LayerRole::Background,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RuntimeLayer {
    pub id: String,
    pub role: LayerRole,
    pub visible: bool,
    pub cells: Vec<GridCell>,
    pub tiles: Vec<Tile>,
}

impl RuntimeLayer {
    pub fn shift_x(&mut self, offset: f32) {
        for tile in &mut self.tiles {
            tile.left += offset;
        }
    }
}

#[derive(Debug, Clone)]
pub struct LevelScene {
    pub level: u32,
    pub level_id: String,
    pub background_color: [u8; 3],
    pub grid: GridSpec,
    pub config: LevelConfig,
    pub layers: Vec<RuntimeLayer>,
    pub coins: Vec<Coin>,
    pub clips: HashMap<String, FrameClip>,
    pub text: Vec<TextObject>,
}

impl LevelScene {
    pub fn from_file(level: u32, file: LevelFile) -> Self {
        let config = LevelConfig::builtin(level).with_overrides(&file.config);
        let clips = file
            .animations
            .iter()
            .map(|(name, def)| (name.clone(), def.to_clip()))
            .collect();

        let mut layers = Vec::with_capacity(file.layers.len());
        let mut coins = Vec::new();
        for layer in &file.layers {
            let role = LayerRole::from_name(&layer.id);
            if role == LayerRole::Player {
                continue;
            }
            let is_wall = config.wall_layers.contains(&layer.id);
            let tiles = build_tiles(&file.grid, layer, role, is_wall);
            if role == LayerRole::Coins {
                coins.extend(tiles.into_iter().map(Coin::new));
                continue;
            }
            layers.push(RuntimeLayer {
                id: layer.id.clone(),
                role,
                visible: layer.visible,
                cells: layer.cells.clone(),
                tiles,
            });
        }

        Self {
            level,
            level_id: file.level_id,
            background_color: file.background_color,
            grid: file.grid,
            config,
            layers,
            coins,
            clips,
            text: file.text,
        }
    }

    pub fn layer(&self, id: &str) -> Option<&RuntimeLayer> {
        self.layers.iter().find(|layer| layer.id == id)
    }

    /// Background layer ids, sorted by name.
    pub fn background_layer_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .layers
            .iter()
            .filter(|layer| layer.role == LayerRole::Background)
            .map(|layer| layer.id.clone())
            .collect();
        names.sort();
        names
    }

    /// Cells of every layer whose tiles are collidable.
    pub fn wall_grid(&self) -> CollisionGrid {
        for name in &self.config.wall_layers {
            if self.layer(name).is_none() {
                log::warn!(
                    "Level {} lists wall layer '{name}' but has no such layer",
                    self.level
                );
            }
        }
        let cells = self
            .layers
            .iter()
            .filter(|layer| layer.tiles.iter().any(|tile| tile.collidable()))
            .flat_map(|layer| layer.cells.iter().copied());
        CollisionGrid::from_cells(self.grid, cells)
    }

    pub fn ladder_grid(&self) -> CollisionGrid {
        let cells = self
            .layers
            .iter()
            .filter(|layer| layer.role == LayerRole::Ladder)
            .flat_map(|layer| layer.cells.iter().copied());
        CollisionGrid::from_cells(self.grid, cells)
    }

    pub fn animate(&mut self, dt_us: u64) {
        let clips = &self.clips;
        for layer in &mut self.layers {
            for tile in &mut layer.tiles {
                tile.animate(dt_us, clips);
            }
        }
        for coin in &mut self.coins {
            coin.animate(dt_us, clips);
        }
    }

    /// Removes every coin touching `bounds` and returns how many were taken.
    pub fn collect_coins(&mut self, bounds: &Aabb) -> usize {
        let before = self.coins.len();
        self.coins.retain(|coin| !coin.bounds().intersects(bounds));
        before - self.coins.len()
    }

    /// Level text in world coordinates.
    pub fn world_text(&self) -> Vec<TextItem> {
        self.text
            .iter()
            .map(|obj| text_item(obj, self.config.text_y_scale))
            .collect()
    }
}

fn text_item(obj: &TextObject, y_scale: f32) -> TextItem {
    let multiline = obj.wrap || obj.text.contains('\n');
    let (x, anchor) = match (obj.align, obj.width) {
        (TextAlign::Center, Some(width)) => (
            obj.x + width * 0.5,
            if multiline { Anchor::TopCenter } else { Anchor::BottomCenter },
        ),
        _ => (obj.x, if multiline { Anchor::TopLeft } else { Anchor::BottomLeft }),
    };
    let mut item = TextItem::new(obj.text.clone(), x, obj.y * y_scale)
        .color(obj.color)
        .size(obj.font_size)
        .anchor(anchor)
        .rotated(obj.rotation);
    if obj.wrap {
        if let Some(width) = obj.width {
            item = item.wrap(width);
        }
    }
    if let Some(font) = &obj.font {
        item = item.font(font.clone());
    }
    item
}

/// Tiles of layers named in `wall_layers` are platforms; everything else is
/// drawn only.
fn build_tiles(grid: &GridSpec, layer: &LevelLayer, role: LayerRole, is_wall: bool) -> Vec<Tile> {
    let kind = match role {
        LayerRole::Coins => EntityKind::Coin,
        _ if is_wall => EntityKind::Platform,
        _ => EntityKind::Decoration,
    };
    let layer_color = rgba(layer.color);

    let cell_tiles = layer.cells.iter().map(|cell| {
        let (left, bottom) = grid.cell_origin(*cell);
        Tile {
            kind,
            left,
            bottom,
            width: grid.cell_size,
            height: grid.cell_size,
            texture: layer.texture.clone(),
            color: layer_color,
            playback: layer.animation.as_deref().map(ClipPlayback::new),
        }
    });

    let sprite_tiles = layer.sprites.iter().map(|sprite| Tile {
        kind,
        left: sprite.x,
        bottom: sprite.y,
        width: sprite.width,
        height: sprite.height,
        texture: sprite.texture.clone().or_else(|| layer.texture.clone()),
        color: sprite.color.map(rgba).unwrap_or(layer_color),
        playback: sprite
            .animation
            .as_deref()
            .or(layer.animation.as_deref())
            .map(ClipPlayback::new),
    });

    cell_tiles.chain(sprite_tiles).collect()
}

pub fn rgba(color: [u8; 4]) -> [f32; 4] {
    color.map(|c| c as f32 / 255.0)
}

impl ClipDef {
    pub fn to_clip(&self) -> FrameClip {
        FrameClip::from_millis(
            self.frames
                .iter()
                .map(|frame| (frame.texture.as_str(), frame.duration_ms)),
            self.looping,
        )
    }
}

// --- Loading ------------------------------------------------------------------

/// Where levels come from. The game reads a directory; tests build levels in memory.
pub trait LevelSource {
    fn load(&self, level: u32) -> Result<LevelScene, String>;
}

pub struct DirLevelSource {
    dir: PathBuf,
}

impl DirLevelSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn level_path(&self, level: u32) -> PathBuf {
        self.dir.join(format!("level_{level}.json"))
    }
}

impl LevelSource for DirLevelSource {
    fn load(&self, level: u32) -> Result<LevelScene, String> {
        let path = self.level_path(level);
        let file = load_level_from_path(&path)?;
        let scene = LevelScene::from_file(level, file);
        log::info!(
            "Loaded level {level} '{}' from {}: {} layers, {} coins, end of map x={:.1} of {:.1}",
            scene.level_id,
            path.display(),
            scene.layers.len(),
            scene.coins.len(),
            scene.config.end_of_map,
            scene.grid.world_width()
        );
        Ok(scene)
    }
}

/// Loads levels `1..=max_level` once so a missing or broken file is caught
/// before play starts.
pub fn check_levels(source: &dyn LevelSource, max_level: u32) -> Result<(), String> {
    for level in 1..=max_level {
        source.load(level).map_err(|e| format!("Level {level}: {e}"))?;
    }
    Ok(())
}

pub fn load_level_from_path(path: &Path) -> Result<LevelFile, String> {
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read level file {}: {e}", path.display()))?;
    let file: LevelFile = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse level JSON {}: {e}", path.display()))?;
    validate_level(&file)?;
    Ok(file)
}

pub fn validate_level(file: &LevelFile) -> Result<(), String> {
    if file.version != SUPPORTED_VERSION {
        return Err(format!(
            "Level validation failed: unsupported version '{}' (expected '{SUPPORTED_VERSION}')",
            file.version
        ));
    }
    if file.grid.cell_size <= 0.0 {
        return Err("Level validation failed: grid cell_size must be > 0".to_string());
    }
    if file.grid.width <= 0 || file.grid.height <= 0 {
        return Err("Level validation failed: grid width and height must be > 0".to_string());
    }
    if file.layers.is_empty() {
        return Err("Level validation failed: layers array is empty".to_string());
    }

    for (name, def) in &file.animations {
        def.to_clip()
            .validate(name)
            .map_err(|e| format!("Level validation failed: {e}"))?;
    }

    let mut layer_ids = HashSet::new();
    for layer in &file.layers {
        if !layer_ids.insert(layer.id.as_str()) {
            return Err(format!(
                "Level validation failed: duplicate layer id '{}'",
                layer.id
            ));
        }
        if layer.cells.is_empty() && layer.sprites.is_empty() {
            log::warn!("Level '{}' layer '{}' is empty", file.level_id, layer.id);
        }

        let mut seen = HashSet::new();
        for cell in &layer.cells {
            if !file.grid.contains(*cell) {
                return Err(format!(
                    "Level validation failed: layer '{}' cell out of bounds ({}, {})",
                    layer.id, cell.x, cell.y
                ));
            }
            if !seen.insert(*cell) {
                return Err(format!(
                    "Level validation failed: layer '{}' duplicate cell ({}, {})",
                    layer.id, cell.x, cell.y
                ));
            }
        }

        for (i, sprite) in layer.sprites.iter().enumerate() {
            if sprite.width <= 0.0 || sprite.height <= 0.0 {
                return Err(format!(
                    "Level validation failed: layer '{}' sprite {i} must have positive size",
                    layer.id
                ));
            }
        }

        let clip_refs = layer
            .animation
            .iter()
            .chain(layer.sprites.iter().filter_map(|s| s.animation.as_ref()));
        for clip in clip_refs {
            if !file.animations.contains_key(clip) {
                return Err(format!(
                    "Level validation failed: layer '{}' references unknown animation '{clip}'",
                    layer.id
                ));
            }
        }
    }

    Ok(())
}

const fn default_background() -> [u8; 3] {
    [255, 255, 255]
}

const fn default_visible() -> bool {
    true
}

const fn default_color() -> [u8; 4] {
    [255, 255, 255, 255]
}

const fn default_text_color() -> [u8; 4] {
    [0, 0, 0, 255]
}

const fn default_font_size() -> f32 {
    24.0
}

const fn default_looping() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file_path(name_hint: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "wc_level_test_{}_{}_{}.json",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    fn write_level_file(path: &Path, body: &str) {
        fs::write(path, body).expect("failed to write temp level file");
    }

    const VALID: &str = r#"
    {
      "version": "0.1",
      "level_id": "lab",
      "background_color": [20, 30, 40],
      "grid": { "cell_size": 128, "width": 30, "height": 6 },
      "config": { "end_of_map": 900.0 },
      "animations": {
        "spin": { "frames": [ { "texture": "coin_0.png", "duration_ms": 100 } ] }
      },
      "layers": [
        { "id": "Sky", "sprites": [ { "x": 0, "y": 0, "width": 1000, "height": 650 } ] },
        { "id": "Platforms", "cells": [ { "x": 0, "y": 0 }, { "x": 1, "y": 0 } ] },
        { "id": "Coins", "animation": "spin", "cells": [ { "x": 3, "y": 1 } ] },
        { "id": "Player", "cells": [] }
      ],
      "text": [ { "text": "Hello", "x": 100, "y": 400, "font_size": 36 } ]
    }
    "#;

    #[test]
    fn load_level_parses_and_builds_scene() {
        let path = temp_file_path("valid");
        write_level_file(&path, VALID);
        let file = load_level_from_path(&path).expect("valid level should load");
        let scene = LevelScene::from_file(1, file);

        assert_eq!(scene.level_id, "lab");
        assert_eq!(scene.background_color, [20, 30, 40]);
        assert_eq!(scene.config.end_of_map, 900.0);
        // Player layer is reserved and coins are pulled out of the layer list.
        assert_eq!(scene.layers.len(), 2);
        assert_eq!(scene.coins.len(), 1);
        assert_eq!(scene.coins[0].tile.left, 384.0);
        assert_eq!(scene.layers[0].role, LayerRole::Background);
        assert_eq!(scene.wall_grid().len(), 2);
        assert_eq!(scene.world_text()[0].size, 36.0);

        let _ = fs::remove_file(path);
    }

    #[test]
    fn rejects_unsupported_version() {
        let path = temp_file_path("version");
        write_level_file(&path, &VALID.replace("\"0.1\"", "\"9.9\""));
        let err = load_level_from_path(&path).expect_err("version should fail");
        assert!(err.contains("unsupported version"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn rejects_duplicate_layer_ids() {
        let path = temp_file_path("dup_layer");
        write_level_file(
            &path,
            r#"{ "version": "0.1", "level_id": "x",
                 "grid": { "cell_size": 64, "width": 4, "height": 4 },
                 "layers": [ { "id": "Platforms" }, { "id": "Platforms" } ] }"#,
        );
        let err = load_level_from_path(&path).expect_err("duplicate ids should fail");
        assert!(err.contains("duplicate layer id"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn rejects_cells_outside_grid_and_duplicates() {
        let path = temp_file_path("cells");
        write_level_file(
            &path,
            r#"{ "version": "0.1", "level_id": "x",
                 "grid": { "cell_size": 64, "width": 4, "height": 4 },
                 "layers": [ { "id": "Platforms", "cells": [ { "x": 4, "y": 0 } ] } ] }"#,
        );
        let err = load_level_from_path(&path).expect_err("out of bounds should fail");
        assert!(err.contains("out of bounds"));

        write_level_file(
            &path,
            r#"{ "version": "0.1", "level_id": "x",
                 "grid": { "cell_size": 64, "width": 4, "height": 4 },
                 "layers": [ { "id": "Platforms", "cells": [ { "x": 1, "y": 0 }, { "x": 1, "y": 0 } ] } ] }"#,
        );
        let err = load_level_from_path(&path).expect_err("duplicate cell should fail");
        assert!(err.contains("duplicate cell"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn rejects_unknown_animation_and_bad_clips() {
        let path = temp_file_path("anim");
        write_level_file(
            &path,
            r#"{ "version": "0.1", "level_id": "x",
                 "grid": { "cell_size": 64, "width": 4, "height": 4 },
                 "layers": [ { "id": "Coins", "animation": "nope", "cells": [ { "x": 1, "y": 1 } ] } ] }"#,
        );
        let err = load_level_from_path(&path).expect_err("unknown clip should fail");
        assert!(err.contains("unknown animation 'nope'"));

        write_level_file(
            &path,
            r#"{ "version": "0.1", "level_id": "x",
                 "grid": { "cell_size": 64, "width": 4, "height": 4 },
                 "animations": { "spin": { "frames": [ { "texture": "a.png", "duration_ms": 0 } ] } },
                 "layers": [ { "id": "Coins" } ] }"#,
        );
        let err = load_level_from_path(&path).expect_err("zero duration should fail");
        assert!(err.contains("zero duration"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn rejects_non_positive_sprite_size() {
        let path = temp_file_path("sprite");
        write_level_file(
            &path,
            r#"{ "version": "0.1", "level_id": "x",
                 "grid": { "cell_size": 64, "width": 4, "height": 4 },
                 "layers": [ { "id": "Sky", "sprites": [ { "x": 0, "y": 0, "width": 0, "height": 10 } ] } ] }"#,
        );
        let err = load_level_from_path(&path).expect_err("zero width should fail");
        assert!(err.contains("positive size"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn builtin_config_matches_stock_tables() {
        let first = LevelConfig::builtin(1);
        assert_eq!(first.end_of_map, 7.25 * 512.0);
        assert_eq!(first.wall_layers, vec!["Platforms".to_string()]);
        assert!(!first.parallax_enabled);
        assert_eq!(first.hud_color, [0, 0, 0, 255]);
        assert_eq!(first.text_y_scale, 0.62);

        let last = LevelConfig::builtin(4);
        assert_eq!(last.wall_layers.len(), 3);
        assert!(last.parallax_enabled);
        assert_eq!(last.frozen_parallax_layers, vec![3]);
        assert_eq!(last.hud_color, [255, 255, 255, 255]);
        assert_eq!(last.text_y_scale, 1.3);
        assert!(LevelConfig::builtin(2).frozen_parallax_layers.is_empty());
    }

    #[test]
    fn layer_roles_follow_names() {
        assert_eq!(LayerRole::from_name("Platforms"), LayerRole::Wall);
        assert_eq!(LayerRole::from_name("Platforms_2"), LayerRole::Wall);
        assert_eq!(LayerRole::from_name("Ladders"), LayerRole::Ladder);
        assert_eq!(LayerRole::from_name("Coins"), LayerRole::Coins);
        assert_eq!(LayerRole::from_name("Decorations"), LayerRole::Decoration);
        assert_eq!(LayerRole::from_name("Player"), LayerRole::Player);
        assert_eq!(LayerRole::from_name("Background_Hills"), LayerRole::Background);
    }

    #[test]
    fn wall_grid_merges_listed_layers_only() {
        let file: LevelFile = serde_json::from_str(
            r#"{ "version": "0.1", "level_id": "x",
                 "grid": { "cell_size": 64, "width": 8, "height": 4 },
                 "layers": [
                   { "id": "Platforms", "cells": [ { "x": 0, "y": 0 } ] },
                   { "id": "Platforms_1", "cells": [ { "x": 1, "y": 0 } ] },
                   { "id": "Platforms_2", "cells": [ { "x": 2, "y": 0 }, { "x": 0, "y": 0 } ] }
                 ] }"#,
        )
        .expect("parse level");
        let first = LevelScene::from_file(1, file.clone());
        assert_eq!(first.wall_grid().len(), 1);
        assert!(first.layer("Platforms").expect("layer").tiles[0].collidable());
        assert!(!first.layer("Platforms_1").expect("layer").tiles[0].collidable());
        assert_eq!(LevelScene::from_file(2, file).wall_grid().len(), 3);
    }

    #[test]
    fn wall_layer_override_makes_any_layer_solid() {
        let file: LevelFile = serde_json::from_str(
            r#"{ "version": "0.1", "level_id": "x",
                 "grid": { "cell_size": 64, "width": 8, "height": 4 },
                 "config": { "wall_layers": ["Crates"] },
                 "layers": [
                   { "id": "Platforms", "cells": [ { "x": 0, "y": 0 } ] },
                   { "id": "Crates", "cells": [ { "x": 3, "y": 1 }, { "x": 4, "y": 1 } ] }
                 ] }"#,
        )
        .expect("parse level");
        let scene = LevelScene::from_file(1, file);
        let walls = scene.wall_grid();
        assert_eq!(walls.len(), 2);
        assert!(walls.is_solid(3, 1));
        assert!(!walls.is_solid(0, 0));
    }

    #[test]
    fn collect_coins_removes_touched_coins_once() {
        let file: LevelFile = serde_json::from_str(
            r#"{ "version": "0.1", "level_id": "x",
                 "grid": { "cell_size": 64, "width": 8, "height": 4 },
                 "layers": [ { "id": "Coins", "cells": [ { "x": 1, "y": 1 }, { "x": 5, "y": 1 } ] } ] }"#,
        )
        .expect("parse level");
        let mut scene = LevelScene::from_file(1, file);
        let player = Aabb {
            center_x: 96.0,
            center_y: 96.0,
            half_w: 24.0,
            half_h: 32.0,
        };
        assert_eq!(scene.collect_coins(&player), 1);
        assert_eq!(scene.collect_coins(&player), 0);
        assert_eq!(scene.coins.len(), 1);
    }

    #[test]
    fn centred_wrapped_text_is_anchored_on_box_centre() {
        let obj = TextObject {
            text: "Chemistry is everywhere".to_string(),
            x: 100.0,
            y: 500.0,
            color: [0, 0, 0, 255],
            font_size: 24.0,
            width: Some(400.0),
            align: TextAlign::Center,
            font: Some("Chalkduster".to_string()),
            wrap: true,
            rotation: 0.0,
        };
        let item = text_item(&obj, 0.5);
        assert_eq!(item.x, 300.0);
        assert_eq!(item.y, 250.0);
        assert_eq!(item.anchor, Anchor::TopCenter);
        assert_eq!(item.wrap_width, Some(400.0));
        assert_eq!(item.font.as_deref(), Some("Chalkduster"));
    }

    #[test]
    fn shipped_levels_load_and_reach_their_end() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../assets/levels");
        let source = DirLevelSource::new(dir);
        for level in 1..=4 {
            let scene = source.load(level).expect("shipped level should load");
            assert!(scene.grid.world_width() >= scene.config.end_of_map);
            assert!(!scene.coins.is_empty());
            assert_eq!(scene.config.parallax_enabled, level > 1);
        }
    }
}
