use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use super::layout::{BlockWidth, FrameDimensions};
use super::styles::StyleRegistry;

pub const PROJECT_CONFIG_FILE: &str = "bulkclip.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClipsConfig {
    /// Directory holding source videos, relative to the project root
    pub video_dir: PathBuf,
    /// Directory holding replacement audio tracks, relative to the project root
    pub audio_dir: PathBuf,
    /// Directory rendered clips are written to, relative to the project root
    pub output_dir: PathBuf,
    /// Audio file used when a row leaves `Audio` empty
    pub default_audio: String,
    /// Video file used when a row leaves `Video` empty
    pub default_video: String,
    /// Trim start in seconds when a row leaves `Start_Time` empty
    pub default_start_time: f64,
    /// Trim end in seconds when a row leaves `End_Time` empty
    pub default_end_time: f64,
    /// Second at which the secondary caption appears when `Inject_Time` is empty
    pub default_inject_time: f64,
    /// How long the secondary caption stays visible, in seconds
    pub injection_window: f64,
    /// Frame size assumed when ffprobe cannot tell
    pub fallback_width: u32,
    pub fallback_height: u32,
    /// Font file passed to every drawtext overlay
    pub font_file: PathBuf,
    /// Width estimate used to anchor multi-line captions
    pub block_width: BlockWidth,
}

impl Default for ClipsConfig {
    fn default() -> Self {
        Self {
            video_dir: PathBuf::from("video"),
            audio_dir: PathBuf::from("audio"),
            output_dir: PathBuf::from("output"),
            default_audio: "lds.mp3".to_string(),
            default_video: "waterfall1.mp4".to_string(),
            default_start_time: Self::DEFAULT_START_TIME,
            default_end_time: Self::DEFAULT_END_TIME,
            default_inject_time: Self::DEFAULT_INJECT_TIME,
            injection_window: Self::DEFAULT_INJECTION_WINDOW,
            fallback_width: FrameDimensions::FALLBACK.width,
            fallback_height: FrameDimensions::FALLBACK.height,
            font_file: PathBuf::from(StyleRegistry::DEFAULT_FONT_FILE),
            block_width: BlockWidth::default(),
        }
    }
}

fn valid_seconds(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

impl ClipsConfig {
    pub const DEFAULT_START_TIME: f64 = 0.0;
    pub const DEFAULT_END_TIME: f64 = 15.0;
    pub const DEFAULT_INJECT_TIME: f64 = 6.0;
    pub const DEFAULT_INJECTION_WINDOW: f64 = 5.0;

    /// Resolution order: explicit path, `<root>/bulkclip.toml`, user config dir, defaults.
    pub fn load(explicit: Option<&Path>, project_root: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            if !path.exists() {
                anyhow::bail!("Config file {} does not exist", path.display());
            }
            return Self::load_from_path(path);
        }

        let project_config = project_root.join(PROJECT_CONFIG_FILE);
        if project_config.exists() {
            return Self::load_from_path(project_config);
        }

        if let Some(user_config) = user_config_path()
            && user_config.exists()
        {
            return Self::load_from_path(user_config);
        }

        Ok(Self::default())
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("reading clips config from {}", path.display()))?;
        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("parsing clips config {}", path.display()))?;
        Ok(config.sanitized())
    }

    fn sanitized(mut self) -> Self {
        if !valid_seconds(self.default_start_time) {
            self.default_start_time = Self::DEFAULT_START_TIME;
        }
        if !valid_seconds(self.default_end_time) {
            self.default_end_time = Self::DEFAULT_END_TIME;
        }
        if !valid_seconds(self.default_inject_time) {
            self.default_inject_time = Self::DEFAULT_INJECT_TIME;
        }
        if !(self.injection_window.is_finite() && self.injection_window > 0.0) {
            self.injection_window = Self::DEFAULT_INJECTION_WINDOW;
        }
        if self.fallback_width == 0 || self.fallback_height == 0 {
            self.fallback_width = FrameDimensions::FALLBACK.width;
            self.fallback_height = FrameDimensions::FALLBACK.height;
        }
        self
    }

    pub fn fallback_dimensions(&self) -> FrameDimensions {
        FrameDimensions::new(self.fallback_width, self.fallback_height)
    }

    pub fn style_registry(&self) -> StyleRegistry {
        StyleRegistry::new(&self.font_file)
    }
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("bulkclip").join("config.toml"))
}

/// Resolved project directories for one batch.
#[derive(Debug, Clone)]
pub struct ProjectPaths {
    video_dir: PathBuf,
    audio_dir: PathBuf,
    output_dir: PathBuf,
}

impl ProjectPaths {
    pub fn new(root: &Path, config: &ClipsConfig) -> Self {
        Self {
            video_dir: root.join(&config.video_dir),
            audio_dir: root.join(&config.audio_dir),
            output_dir: root.join(&config.output_dir),
        }
    }

    pub fn ensure_output_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.output_dir).with_context(|| {
            format!(
                "Failed to create output directory {}",
                self.output_dir.display()
            )
        })
    }

    pub fn video(&self, file: &str) -> PathBuf {
        self.video_dir.join(file)
    }

    pub fn audio(&self, file: &str) -> PathBuf {
        self.audio_dir.join(file)
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}
