use crate::session::GameSession;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use wc_core::input::Key;

/// Scripted key timeline. Each frame applies its presses and releases once,
/// then runs `repeat` session updates.
#[derive(Debug, Deserialize, Clone)]
pub struct ReplaySequence {
    #[serde(default = "default_dt")]
    pub fixed_dt: f32,
    pub frames: Vec<ReplayFrame>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReplayFrame {
    #[serde(default)]
    pub press: Vec<String>,
    #[serde(default)]
    pub release: Vec<String>,
    #[serde(default = "default_repeat")]
    pub repeat: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReplayStep {
    pub press: Vec<Key>,
    pub release: Vec<Key>,
}

fn key_from_name(name: &str) -> Option<Key> {
    match name {
        "left" => Some(Key::Left),
        "right" => Some(Key::Right),
        "up" => Some(Key::Up),
        "down" => Some(Key::Down),
        "w" => Some(Key::W),
        "a" => Some(Key::A),
        "s" => Some(Key::S),
        "d" => Some(Key::D),
        "space" => Some(Key::Space),
        _ => None,
    }
}

fn keys(names: &[String]) -> Vec<Key> {
    names.iter().filter_map(|n| key_from_name(n)).collect()
}

impl ReplaySequence {
    /// One entry per simulated frame.
    pub fn expanded_steps(&self) -> Vec<ReplayStep> {
        let mut out = Vec::new();
        for frame in &self.frames {
            out.push(ReplayStep {
                press: keys(&frame.press),
                release: keys(&frame.release),
            });
            for _ in 1..frame.repeat.max(1) {
                out.push(ReplayStep {
                    press: Vec::new(),
                    release: Vec::new(),
                });
            }
        }
        out
    }

    pub fn run(&self, session: &mut GameSession) {
        for step in self.expanded_steps() {
            for key in &step.release {
                session.key_up(*key);
            }
            for key in &step.press {
                session.key_down(*key);
            }
            session.update(self.fixed_dt);
        }
    }
}

pub fn load_replay_from_path(path: &Path) -> Result<ReplaySequence, String> {
    let raw =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let replay: ReplaySequence = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse replay JSON {}: {e}", path.display()))?;
    validate_replay(&replay)?;
    Ok(replay)
}

fn validate_replay(replay: &ReplaySequence) -> Result<(), String> {
    if replay.fixed_dt <= 0.0 {
        return Err("Replay validation failed: fixed_dt must be > 0".to_string());
    }
    if replay.frames.is_empty() {
        return Err("Replay validation failed: frames list is empty".to_string());
    }
    for (i, frame) in replay.frames.iter().enumerate() {
        if let Some(name) = frame
            .press
            .iter()
            .chain(&frame.release)
            .find(|n| key_from_name(n).is_none())
        {
            return Err(format!(
                "Replay validation failed: frame {i} names unknown key '{name}'"
            ));
        }
    }
    Ok(())
}

const fn default_dt() -> f32 {
    1.0 / 60.0
}

const fn default_repeat() -> u32 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::SpriteEntity;
    use crate::session::tests::{session_with, FlatLevels};
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file_path(name_hint: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "wc_replay_test_{}_{}_{}.json",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    #[test]
    fn replay_file_parses_and_expands() {
        let path = temp_file_path("parse");
        fs::write(
            &path,
            r#"{
              "frames": [
                { "press": ["right"], "repeat": 3 },
                { "press": ["space"], "release": ["right"] }
              ]
            }"#,
        )
        .expect("write replay file");

        let replay = load_replay_from_path(&path).expect("replay should load");
        let steps = replay.expanded_steps();
        assert_eq!(steps.len(), 4);
        assert_eq!(steps[0].press, vec![Key::Right]);
        assert!(steps[1].press.is_empty());
        assert_eq!(steps[3].release, vec![Key::Right]);

        let _ = fs::remove_file(path);
    }

    #[test]
    fn unknown_key_names_are_rejected() {
        let path = temp_file_path("unknown");
        fs::write(&path, r#"{ "frames": [ { "press": ["f13"] } ] }"#).expect("write replay file");
        let err = load_replay_from_path(&path).expect_err("unknown key should fail");
        assert!(err.contains("unknown key 'f13'"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn replay_run_is_deterministic() {
        let path = temp_file_path("deterministic");
        fs::write(
            &path,
            r#"{
              "fixed_dt": 0.016666667,
              "frames": [
                { "repeat": 30 },
                { "press": ["right"], "repeat": 60 },
                { "press": ["space"], "repeat": 40 },
                { "release": ["space"], "repeat": 20 },
                { "press": ["left"], "release": ["right"], "repeat": 45 }
              ]
            }"#,
        )
        .expect("write replay file");

        let replay = load_replay_from_path(&path).expect("replay should load");
        let mut run_a = session_with(FlatLevels::new(50_000.0));
        let mut run_b = session_with(FlatLevels::new(50_000.0));
        replay.run(&mut run_a);
        replay.run(&mut run_b);

        let (a, b) = (run_a.player(), run_b.player());
        assert!((a.position().x - b.position().x).abs() < 0.0001);
        assert!((a.position().y - b.position().y).abs() < 0.0001);
        assert!((a.velocity.x - b.velocity.x).abs() < 0.0001);
        assert!((a.velocity.y - b.velocity.y).abs() < 0.0001);
        assert_eq!(a.pose(), b.pose());
        assert_eq!(run_a.drain_events(), run_b.drain_events());

        let _ = fs::remove_file(path);
    }
}
