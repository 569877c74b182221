use std::path::{Path, PathBuf};

use glam::Vec2;
use serde::Deserialize;

use crate::assets::documents::read_document;
use crate::error::{EngineError, EngineResult};

pub const CONFIG_FILE: &str = "game.config";

/// Engine configuration, read from `game.config` in the project directory.
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Scene loaded at startup.
    pub initial_scene: String,
    /// Window / log title.
    pub game_title: String,
    /// Physics gravity. Positive Y points down (default: 0, 9.8).
    pub gravity: Vec2,
    /// Frame pacing cap used by the host loop (default: 60).
    pub max_frame_rate: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            initial_scene: String::new(),
            game_title: String::new(),
            gravity: Vec2::new(0.0, 9.8),
            max_frame_rate: 60,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    initial_scene: Option<String>,
    #[serde(default)]
    game_title: Option<String>,
    #[serde(default)]
    gravity: Option<[f32; 2]>,
    #[serde(default)]
    max_frame_rate: Option<u32>,
}

impl GameConfig {
    /// Load `<project>/game.config`. A missing file, bad JSON or a missing
    /// `initial_scene` are all fatal.
    pub fn load(project: &Path) -> EngineResult<Self> {
        let raw: RawConfig = read_document(&project.join(CONFIG_FILE))?;
        Self::from_raw(raw)
    }

    pub fn from_json(json: &str) -> EngineResult<Self> {
        let raw: RawConfig = serde_json::from_str(json).map_err(|source| EngineError::Malformed {
            path: PathBuf::from(CONFIG_FILE),
            source,
        })?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawConfig) -> EngineResult<Self> {
        let defaults = Self::default();
        let initial_scene = raw
            .initial_scene
            .filter(|s| !s.is_empty())
            .ok_or(EngineError::MissingConfigKey("initial_scene"))?;
        Ok(Self {
            initial_scene,
            game_title: raw.game_title.unwrap_or(defaults.game_title),
            gravity: raw.gravity.map(Vec2::from).unwrap_or(defaults.gravity),
            max_frame_rate: raw.max_frame_rate.filter(|r| *r > 0).unwrap_or(defaults.max_frame_rate),
        })
    }

    pub fn with_initial_scene(mut self, scene: &str) -> Self {
        self.initial_scene = scene.to_string();
        self
    }

    pub fn with_gravity(mut self, gravity: Vec2) -> Self {
        self.gravity = gravity;
        self
    }

    /// Target seconds per frame.
    pub fn frame_dt(&self) -> f32 {
        1.0 / self.max_frame_rate.max(1) as f32
    }
}

/// The two-tier resource search path: the project's own resource directory
/// first, the engine's built-in directory second.
#[derive(Debug, Clone)]
pub struct AssetPaths {
    pub project: PathBuf,
    pub builtin: PathBuf,
}

impl AssetPaths {
    pub fn new(project: impl Into<PathBuf>, builtin: impl Into<PathBuf>) -> Self {
        Self {
            project: project.into(),
            builtin: builtin.into(),
        }
    }

    /// First existing `<root>/<category>/<name>.<ext>`, project before builtin.
    pub fn resolve(&self, category: &str, name: &str, ext: &str) -> Option<PathBuf> {
        let file = format!("{name}.{ext}");
        [&self.project, &self.builtin]
            .into_iter()
            .map(|root| root.join(category).join(&file))
            .find(|path| path.is_file())
    }
}
