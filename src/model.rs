use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{ForgeError, ForgeResult};

/// Millisecond-timestamp identifier shared by clips, overlays and transitions.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct ItemId(pub u64);

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hands out timestamp-derived ids that never repeat, even for several
/// allocations within the same millisecond.
#[derive(Clone, Debug, Default)]
pub struct IdSource {
    last: u64,
}

impl IdSource {
    pub fn next_id(&mut self) -> ItemId {
        self.next_at(now_millis())
    }

    pub(crate) fn next_at(&mut self, now_ms: u64) -> ItemId {
        let id = now_ms.max(self.last.saturating_add(1));
        self.last = id;
        ItemId(id)
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Video,
    Audio,
    Text,
}

impl TrackKind {
    pub const ALL: [TrackKind; 3] = [TrackKind::Video, TrackKind::Audio, TrackKind::Text];

    pub fn id(self) -> &'static str {
        match self {
            TrackKind::Video => "video",
            TrackKind::Audio => "audio",
            TrackKind::Text => "text",
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Track {
    pub id: String,
    pub kind: TrackKind,
    pub clips: Vec<Clip>,
}

impl Track {
    pub fn empty(kind: TrackKind) -> Self {
        Self {
            id: kind.id().to_string(),
            kind,
            clips: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Clip {
    pub id: ItemId,
    pub kind: TrackKind,
    pub start: f64,
    pub end: f64,
    pub source: MediaSource,
    pub effects: EffectSettings,
}

/// Playable reference derived from a picked file.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MediaSource {
    /// `blob:` style handle, unique per ingestion.
    pub url: String,
    pub path: std::path::PathBuf,
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct OverlayPosition {
    /// Percent of the preview width.
    pub x: f64,
    /// Percent of the preview height.
    pub y: f64,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct OverlayStyle {
    pub font_size: String,
    pub color: String,
    pub font_family: String,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            font_size: "24px".to_string(),
            color: "#ffffff".to_string(),
            font_family: "Arial".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TextOverlay {
    pub id: ItemId,
    pub text: String,
    pub position: OverlayPosition,
    pub style: OverlayStyle,
    pub start_time: f64,
    pub duration: f64,
}

pub const DEFAULT_OVERLAY_TEXT: &str = "New Text";
pub const DEFAULT_OVERLAY_DURATION: f64 = 5.0;
pub const DEFAULT_TRANSITION_DURATION: f64 = 1.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionKind {
    Fade,
    Wipe,
    Dissolve,
    Slide,
}

impl TransitionKind {
    pub const ALL: [TransitionKind; 4] = [
        TransitionKind::Fade,
        TransitionKind::Wipe,
        TransitionKind::Dissolve,
        TransitionKind::Slide,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TransitionKind::Fade => "fade",
            TransitionKind::Wipe => "wipe",
            TransitionKind::Dissolve => "dissolve",
            TransitionKind::Slide => "slide",
        }
    }
}

impl std::str::FromStr for TransitionKind {
    type Err = ForgeError;

    fn from_str(s: &str) -> ForgeResult<Self> {
        let kind = s.trim().to_ascii_lowercase();
        if kind.is_empty() {
            return Err(ForgeError::validation("transition kind must be non-empty"));
        }
        match kind.as_str() {
            "fade" | "crossfade" => Ok(TransitionKind::Fade),
            "wipe" => Ok(TransitionKind::Wipe),
            "dissolve" => Ok(TransitionKind::Dissolve),
            "slide" => Ok(TransitionKind::Slide),
            _ => Err(ForgeError::validation(format!(
                "unknown transition kind '{kind}'"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Transition {
    pub id: ItemId,
    pub kind: TransitionKind,
    pub duration: f64,
    pub start_time: f64,
}

/// Shared visual parameters. Brightness, contrast and saturation are percents
/// (100 = unchanged); blur is a gaussian standard deviation in pixels.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EffectSettings {
    pub brightness: f64,
    pub contrast: f64,
    pub saturation: f64,
    pub blur: f64,
}

impl Default for EffectSettings {
    fn default() -> Self {
        Self {
            brightness: 100.0,
            contrast: 100.0,
            saturation: 100.0,
            blur: 0.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectParam {
    Brightness,
    Contrast,
    Saturation,
    Blur,
}

impl EffectParam {
    pub const ALL: [EffectParam; 4] = [
        EffectParam::Brightness,
        EffectParam::Contrast,
        EffectParam::Saturation,
        EffectParam::Blur,
    ];

    pub fn name(self) -> &'static str {
        match self {
            EffectParam::Brightness => "brightness",
            EffectParam::Contrast => "contrast",
            EffectParam::Saturation => "saturation",
            EffectParam::Blur => "blur",
        }
    }

    /// Slider range offered by the editor UI. Not enforced on writes.
    pub fn ui_range(self) -> (f64, f64) {
        match self {
            EffectParam::Blur => (0.0, 10.0),
            _ => (0.0, 200.0),
        }
    }
}

impl std::str::FromStr for EffectParam {
    type Err = ForgeError;

    fn from_str(s: &str) -> ForgeResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "brightness" => Ok(EffectParam::Brightness),
            "contrast" => Ok(EffectParam::Contrast),
            "saturation" | "saturate" => Ok(EffectParam::Saturation),
            "blur" => Ok(EffectParam::Blur),
            other => Err(ForgeError::validation(format!(
                "unknown effect parameter '{other}'"
            ))),
        }
    }
}

impl EffectSettings {
    pub fn get(&self, param: EffectParam) -> f64 {
        match param {
            EffectParam::Brightness => self.brightness,
            EffectParam::Contrast => self.contrast,
            EffectParam::Saturation => self.saturation,
            EffectParam::Blur => self.blur,
        }
    }

    pub fn set(&mut self, param: EffectParam, value: f64) {
        match param {
            EffectParam::Brightness => self.brightness = value,
            EffectParam::Contrast => self.contrast = value,
            EffectParam::Saturation => self.saturation = value,
            EffectParam::Blur => self.blur = value,
        }
    }

    pub fn is_neutral(&self) -> bool {
        *self == Self::default()
    }

    /// CSS filter string equivalent to these settings.
    pub fn filter_chain(&self) -> String {
        format!(
            "brightness({}%) contrast({}%) saturate({}%) blur({}px)",
            self.brightness, self.contrast, self.saturation, self.blur
        )
    }
}
