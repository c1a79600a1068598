//! Game-wide tuning loaded from `assets/config/game.json`.
//!
//! Every field has a default, so a partial file only overrides what it names and
//! a missing file runs the stock game. `WHYCHEM_CONFIG` points at another file.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use wc_core::input::MovementTuning;
use wc_overlay::FontSource;
use wc_platform::window::PlatformConfig;

pub const DEFAULT_CONFIG_PATH: &str = "assets/config/game.json";
pub const CONFIG_ENV_VAR: &str = "WHYCHEM_CONFIG";

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GameConfig {
    pub window: PlatformConfig,
    pub movement_speed: f32,
    pub gravity: f32,
    pub jump_speed: f32,
    pub jump_tolerance: f32,
    pub player_start: [f32; 2],
    pub reentry_point: [f32; 2],
    pub player_half_extents: [f32; 2],
    pub coin_points: u32,
    pub fade_rate: f32,
    pub victory_pause_secs: f32,
    pub camera_follow_speed: f32,
    pub levels_dir: PathBuf,
    pub max_level: u32,
    pub player_texture_prefix: String,
    pub sounds: SoundPaths,
    pub fonts: Vec<FontEntry>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SoundPaths {
    pub jump: PathBuf,
    pub coin: PathBuf,
    pub victory: PathBuf,
    pub theme: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FontEntry {
    pub name: String,
    pub path: PathBuf,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            window: PlatformConfig::default(),
            movement_speed: 7.0,
            gravity: 1.4,
            jump_speed: 30.0,
            jump_tolerance: 10.0,
            player_start: [250.0, 162.5],
            reentry_point: [1000.0, 325.0],
            player_half_extents: [24.0, 32.0],
            coin_points: 10,
            fade_rate: 5.0,
            victory_pause_secs: 2.0,
            camera_follow_speed: 0.2,
            levels_dir: PathBuf::from("assets/levels"),
            max_level: 4,
            player_texture_prefix: "assets/textures/player/femalePerson".to_string(),
            sounds: SoundPaths::default(),
            fonts: Vec::new(),
        }
    }
}

impl Default for SoundPaths {
    fn default() -> Self {
        Self {
            jump: PathBuf::from("assets/sounds/jump1.wav"),
            coin: PathBuf::from("assets/sounds/coin1.wav"),
            victory: PathBuf::from("assets/sounds/victory.mp3"),
            theme: PathBuf::from("assets/sounds/theme.mp3"),
        }
    }
}

impl GameConfig {
    pub fn movement(&self) -> MovementTuning {
        MovementTuning {
            speed: self.movement_speed,
            jump_speed: self.jump_speed,
        }
    }

    pub fn font_sources(&self) -> Vec<FontSource> {
        self.fonts
            .iter()
            .map(|entry| FontSource {
                name: entry.name.clone(),
                path: entry.path.clone(),
            })
            .collect()
    }
}

/// Path from `WHYCHEM_CONFIG`, else the default location.
pub fn config_path() -> PathBuf {
    std::env::var_os(CONFIG_ENV_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

pub fn load_game_config(path: &Path) -> Result<GameConfig, String> {
    if !path.exists() {
        log::info!("No config at {}, using defaults", path.display());
        return Ok(GameConfig::default());
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    let config: GameConfig = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse config JSON {}: {e}", path.display()))?;
    validate_config(&config)?;
    log::info!("Loaded config from {}", path.display());
    Ok(config)
}

fn validate_config(config: &GameConfig) -> Result<(), String> {
    if config.max_level == 0 {
        return Err("Config validation failed: max_level must be >= 1".to_string());
    }
    if config.fade_rate <= 0.0 {
        return Err("Config validation failed: fade_rate must be > 0".to_string());
    }
    if config.player_half_extents.iter().any(|v| *v <= 0.0) {
        return Err("Config validation failed: player_half_extents must be > 0".to_string());
    }
    if !(0.0..=1.0).contains(&config.camera_follow_speed) {
        return Err("Config validation failed: camera_follow_speed must be in [0, 1]".to_string());
    }
    if config.victory_pause_secs < 0.0 {
        return Err("Config validation failed: victory_pause_secs must be >= 0".to_string());
    }
    Ok(())
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
            "wc_config_test_{}_{}_{}.json",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    #[test]
    fn missing_file_yields_defaults() {
        let config = load_game_config(&temp_file_path("missing")).expect("defaults");
        assert_eq!(config.movement_speed, 7.0);
        assert_eq!(config.gravity, 1.4);
        assert_eq!(config.player_start, [250.0, 162.5]);
        assert_eq!(config.max_level, 4);
        assert_eq!(config.window.width, 1000);
        assert_eq!(config.window.title, "WhyChem");
    }

    #[test]
    fn partial_file_overrides_named_fields_only() {
        let path = temp_file_path("partial");
        fs::write(&path, r#"{ "gravity": 2.0, "sounds": { "jump": "x.wav" } }"#)
            .expect("write config");
        let config = load_game_config(&path).expect("partial config should load");
        assert_eq!(config.gravity, 2.0);
        assert_eq!(config.jump_speed, 30.0);
        assert_eq!(config.sounds.jump, PathBuf::from("x.wav"));
        assert_eq!(config.sounds.coin, PathBuf::from("assets/sounds/coin1.wav"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let path = temp_file_path("malformed");
        fs::write(&path, "{ not json").expect("write config");
        let err = load_game_config(&path).expect_err("malformed config should fail");
        assert!(err.contains("Failed to parse config JSON"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn rejects_zero_max_level() {
        let path = temp_file_path("zero_level");
        fs::write(&path, r#"{ "max_level": 0 }"#).expect("write config");
        let err = load_game_config(&path).expect_err("zero max_level should fail");
        assert!(err.contains("max_level"));
        let _ = fs::remove_file(path);
    }
}
