use std::path::{Path, PathBuf};

use crate::{
    core::Fps,
    error::{ForgeError, ForgeResult},
    model::EffectSettings,
};

/// Name the exported recording is "downloaded" under.
pub const EXPORT_FILE_NAME: &str = "edited-video.webm";

/// Editor and export settings, loaded from JSON. Every field is optional in
/// the file.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ForgeConfig {
    /// Seconds moved by the skip back/forward buttons.
    pub skip_seconds: f64,
    /// Effect settings the editor starts with.
    pub initial_effects: EffectSettings,
    pub export: ExportConfig,
}

impl Default for ForgeConfig {
    fn default() -> Self {
        Self {
            skip_seconds: 5.0,
            initial_effects: EffectSettings::default(),
            export: ExportConfig::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Capture rate of the canvas stream.
    pub fps: Fps,
    /// Directory the recording lands in.
    pub output_dir: PathBuf,
    pub file_name: String,
    /// Upper bound on captured frames, guards against a clock that never
    /// reaches the trim end.
    pub max_frames: u64,
    /// Background used when flattening transparent canvas pixels.
    pub background_rgba: [u8; 4],
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            fps: Fps::default(),
            output_dir: PathBuf::from("."),
            file_name: EXPORT_FILE_NAME.to_string(),
            max_frames: 30 * 60 * 60,
            background_rgba: [0, 0, 0, 255],
        }
    }
}

impl ExportConfig {
    pub fn out_path(&self) -> PathBuf {
        self.output_dir.join(&self.file_name)
    }

    /// Temporary location the recorder writes to before the final move.
    pub fn partial_path(&self) -> PathBuf {
        self.output_dir.join(format!(".{}.part", self.file_name))
    }

    pub fn validate(&self) -> ForgeResult<()> {
        Fps::new(self.fps.num, self.fps.den)?;
        if self.file_name.trim().is_empty() {
            return Err(ForgeError::validation("export file_name must be non-empty"));
        }
        if self.max_frames == 0 {
            return Err(ForgeError::validation("export max_frames must be > 0"));
        }
        Ok(())
    }
}

impl ForgeConfig {
    pub fn validate(&self) -> ForgeResult<()> {
        if !self.skip_seconds.is_finite() || self.skip_seconds < 0.0 {
            return Err(ForgeError::validation(
                "skip_seconds must be finite and >= 0",
            ));
        }
        self.export.validate()
    }

    pub fn from_json_str(s: &str) -> ForgeResult<Self> {
        let cfg: Self = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: &Path) -> ForgeResult<Self> {
        use anyhow::Context as _;
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        Self::from_json_str(&text)
    }
}
