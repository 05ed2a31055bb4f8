#![forbid(unsafe_code)]

pub mod blur_cpu;
pub mod canvas;
pub mod config;
pub mod core;
pub mod editor;
pub mod error;
pub mod export;
pub mod filter;
pub mod landing;
pub mod media;
pub mod model;
pub mod recorder;

pub use canvas::Canvas2d;
pub use config::{EXPORT_FILE_NAME, ExportConfig, ForgeConfig};
pub use crate::core::{Fps, FrameRGBA};
pub use editor::{ClipBar, Editor, TimelineLayout, TrackRow};
pub use error::{ForgeError, ForgeResult};
pub use export::{ExportReport, Exporter, TrimRange};
pub use filter::apply_filter;
pub use landing::LandingView;
pub use media::{FfmpegMedia, MediaElement, TestPatternMedia, VideoSourceInfo};
pub use model::{
    Clip, EffectParam, EffectSettings, ItemId, MediaSource, OverlayPosition, OverlayStyle,
    TextOverlay, Track, TrackKind, Transition, TransitionKind,
};
pub use recorder::{FfmpegRecorder, RecordedMedia, Recorder, StreamFormat};
