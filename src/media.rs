use std::path::{Path, PathBuf};

use crate::{
    core::FrameRGBA,
    error::{ForgeError, ForgeResult},
};

/// The playback element the editor drives: a seekable clock over a decoded
/// video source. Time is in seconds.
pub trait MediaElement {
    fn load(&mut self, source: &Path) -> ForgeResult<()>;

    /// Total duration in seconds; 0 until metadata is known.
    fn duration(&self) -> f64;

    fn current_time(&self) -> f64;

    fn set_current_time(&mut self, t: f64);

    fn play(&mut self) -> ForgeResult<()>;

    fn pause(&mut self);

    fn is_paused(&self) -> bool;

    fn ended(&self) -> bool {
        self.duration() > 0.0 && self.current_time() >= self.duration()
    }

    /// Intrinsic size of the decoded picture.
    fn video_size(&self) -> (u32, u32);

    fn set_volume(&mut self, volume: f64);

    /// Moves the clock forward by `dt` seconds while playing and returns the new
    /// position. Reaching the end pauses playback.
    fn advance(&mut self, dt: f64) -> f64 {
        if self.is_paused() {
            return self.current_time();
        }
        let duration = self.duration();
        let mut t = self.current_time() + dt;
        if duration > 0.0 && t >= duration {
            t = duration;
            self.set_current_time(t);
            self.pause();
        } else {
            self.set_current_time(t);
        }
        t
    }

    /// Picture at the current position.
    fn current_frame(&mut self) -> ForgeResult<FrameRGBA>;
}

/// Synthetic moving gradient. Lets the editor run without decoding anything.
#[derive(Clone, Debug)]
pub struct TestPatternMedia {
    width: u32,
    height: u32,
    duration: f64,
    time: f64,
    paused: bool,
    volume: f64,
    /// Makes `play()` fail, like a host refusing autoplay.
    pub reject_play: bool,
}

impl TestPatternMedia {
    pub fn new(width: u32, height: u32, duration: f64) -> Self {
        Self {
            width,
            height,
            duration,
            time: 0.0,
            paused: true,
            volume: 1.0,
            reject_play: false,
        }
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }
}

impl MediaElement for TestPatternMedia {
    fn load(&mut self, _source: &Path) -> ForgeResult<()> {
        self.time = 0.0;
        self.paused = true;
        Ok(())
    }

    fn duration(&self) -> f64 {
        self.duration
    }

    fn current_time(&self) -> f64 {
        self.time
    }

    fn set_current_time(&mut self, t: f64) {
        self.time = t;
    }

    fn play(&mut self) -> ForgeResult<()> {
        if self.reject_play {
            return Err(ForgeError::media("play() request was rejected"));
        }
        if self.ended() {
            self.time = 0.0;
        }
        self.paused = false;
        Ok(())
    }

    fn pause(&mut self) {
        self.paused = true;
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn video_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn set_volume(&mut self, volume: f64) {
        self.volume = volume;
    }

    fn current_frame(&mut self) -> ForgeResult<FrameRGBA> {
        let mut frame = FrameRGBA::new(self.width, self.height);
        let shift = (self.time * 60.0) as u32;
        let w = self.width.max(1);
        let h = self.height.max(1);
        for (i, px) in frame.data.chunks_exact_mut(4).enumerate() {
            let x = i as u32 % w;
            let y = i as u32 / w;
            let r = (((x + shift) % w) * 255 / w) as u8;
            let g = (y * 255 / h) as u8;
            px.copy_from_slice(&[r, g, 160, 255]);
        }
        Ok(frame)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct VideoSourceInfo {
    pub source_path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub fps_num: u32,
    pub fps_den: u32,
    pub duration_sec: f64,
    pub has_audio: bool,
}

impl VideoSourceInfo {
    pub fn source_fps(&self) -> f64 {
        if self.fps_den == 0 {
            0.0
        } else {
            f64::from(self.fps_num) / f64::from(self.fps_den)
        }
    }
}

/// Frames decoded per ffmpeg invocation during sequential playback.
const DECODE_BATCH: u32 = 24;

/// `MediaElement` backed by `ffprobe` for metadata and `ffmpeg` for pictures.
#[derive(Debug, Default)]
pub struct FfmpegMedia {
    info: Option<VideoSourceInfo>,
    time: f64,
    paused: bool,
    volume: f64,
    batch_start: f64,
    batch: Vec<FrameRGBA>,
    /// Earliest time at which decoding came back empty. The container can
    /// outlast its video stream (e.g. longer audio).
    video_end: Option<f64>,
}

impl FfmpegMedia {
    pub fn new() -> Self {
        Self {
            paused: true,
            volume: 1.0,
            ..Self::default()
        }
    }

    pub fn open(path: &Path) -> ForgeResult<Self> {
        let mut media = Self::new();
        media.load(path)?;
        Ok(media)
    }

    pub fn info(&self) -> Option<&VideoSourceInfo> {
        self.info.as_ref()
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    fn cached_frame(&self, t: f64) -> Option<&FrameRGBA> {
        let info = self.info.as_ref()?;
        let fps = info.source_fps();
        if fps <= 0.0 || t < self.batch_start {
            return None;
        }
        let idx = ((t - self.batch_start) * fps).floor() as usize;
        self.batch.get(idx)
    }
}

impl MediaElement for FfmpegMedia {
    #[tracing::instrument(skip(self))]
    fn load(&mut self, source: &Path) -> ForgeResult<()> {
        let info = probe_video(source)?;
        tracing::debug!(
            width = info.width,
            height = info.height,
            duration = info.duration_sec,
            "loaded video metadata"
        );
        self.info = Some(info);
        self.time = 0.0;
        self.paused = true;
        self.batch.clear();
        self.video_end = None;
        Ok(())
    }

    fn duration(&self) -> f64 {
        self.info.as_ref().map_or(0.0, |i| i.duration_sec)
    }

    fn current_time(&self) -> f64 {
        self.time
    }

    fn set_current_time(&mut self, t: f64) {
        self.time = t;
    }

    fn play(&mut self) -> ForgeResult<()> {
        if self.info.is_none() {
            return Err(ForgeError::media("no source loaded"));
        }
        if self.ended() {
            self.time = 0.0;
        }
        self.paused = false;
        Ok(())
    }

    fn pause(&mut self) {
        self.paused = true;
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn video_size(&self) -> (u32, u32) {
        self.info.as_ref().map_or((0, 0), |i| (i.width, i.height))
    }

    fn set_volume(&mut self, volume: f64) {
        self.volume = volume;
    }

    fn current_frame(&mut self) -> ForgeResult<FrameRGBA> {
        let t = self.time.max(0.0);
        if let Some(frame) = self.cached_frame(t) {
            return Ok(frame.clone());
        }
        if self.video_end.is_some_and(|end| t >= end)
            && let Some(last) = self.batch.last()
        {
            return Ok(last.clone());
        }
        let info = self
            .info
            .as_ref()
            .ok_or_else(|| ForgeError::media("no source loaded"))?;
        let frames = decode_video_frames_rgba8(info, t, DECODE_BATCH)?;
        if frames.is_empty() {
            if let Some(last) = self.batch.last() {
                tracing::debug!(t, "video stream ended before the container; holding last frame");
                self.video_end = Some(self.video_end.map_or(t, |end| end.min(t)));
                return Ok(last.clone());
            }
            return Err(ForgeError::media(format!(
                "ffmpeg returned no video frames for '{}' at {t:.3}s",
                info.source_path.display()
            )));
        }
        self.batch_start = t;
        self.batch = frames;
        Ok(self.batch[0].clone())
    }
}

#[cfg(feature = "media-ffmpeg")]
pub fn probe_video(source_path: &Path) -> ForgeResult<VideoSourceInfo> {
    #[derive(serde::Deserialize)]
    struct ProbeStream {
        codec_type: Option<String>,
        width: Option<u32>,
        height: Option<u32>,
        r_frame_rate: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeFormat {
        duration: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeOut {
        streams: Vec<ProbeStream>,
        format: Option<ProbeFormat>,
    }

    let out = std::process::Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(source_path)
        .output()
        .map_err(|e| ForgeError::media(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(ForgeError::media(format!(
            "ffprobe failed for '{}': {}",
            source_path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let parsed: ProbeOut = serde_json::from_slice(&out.stdout)
        .map_err(|e| ForgeError::media(format!("ffprobe json parse failed: {e}")))?;
    let video_stream = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| ForgeError::media("no video stream found"))?;
    let width = video_stream
        .width
        .ok_or_else(|| ForgeError::media("missing video width from ffprobe"))?;
    let height = video_stream
        .height
        .ok_or_else(|| ForgeError::media("missing video height from ffprobe"))?;

    let (fps_num, fps_den) = parse_ff_ratio(video_stream.r_frame_rate.as_deref().unwrap_or("0/1"))
        .ok_or_else(|| ForgeError::media("invalid video r_frame_rate"))?;
    let duration_sec = parsed
        .format
        .as_ref()
        .and_then(|f| f.duration.as_ref())
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(0.0);
    let has_audio = parsed
        .streams
        .iter()
        .any(|s| s.codec_type.as_deref() == Some("audio"));

    Ok(VideoSourceInfo {
        source_path: source_path.to_path_buf(),
        width,
        height,
        fps_num,
        fps_den,
        duration_sec,
        has_audio,
    })
}

#[cfg(not(feature = "media-ffmpeg"))]
pub fn probe_video(_source_path: &Path) -> ForgeResult<VideoSourceInfo> {
    Err(ForgeError::media(
        "video sources require the 'media-ffmpeg' feature",
    ))
}

#[cfg(feature = "media-ffmpeg")]
fn decode_video_frames_rgba8(
    source: &VideoSourceInfo,
    start_time_sec: f64,
    frame_count: u32,
) -> ForgeResult<Vec<FrameRGBA>> {
    if frame_count == 0 {
        return Ok(Vec::new());
    }

    let out = std::process::Command::new("ffmpeg")
        .args(["-v", "error", "-ss", &format!("{start_time_sec:.6}")])
        .arg("-i")
        .arg(&source.source_path)
        .args([
            "-frames:v",
            &frame_count.to_string(),
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "pipe:1",
        ])
        .output()
        .map_err(|e| ForgeError::media(format!("failed to run ffmpeg for video decode: {e}")))?;

    if !out.status.success() {
        return Err(ForgeError::media(format!(
            "ffmpeg video decode failed for '{}': {}",
            source.source_path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let expected_len = crate::core::byte_len(source.width, source.height);
    if expected_len == 0 {
        return Err(ForgeError::media(
            "decoded video frame size is zero (invalid source dimensions)",
        ));
    }
    if !out.stdout.len().is_multiple_of(expected_len) {
        return Err(ForgeError::media(format!(
            "decoded video batch has invalid size: got {} bytes, expected multiples of {expected_len}",
            out.stdout.len()
        )));
    }

    out.stdout
        .chunks_exact(expected_len)
        .take(frame_count as usize)
        .map(|chunk| FrameRGBA::from_raw(source.width, source.height, chunk.to_vec()))
        .collect()
}

#[cfg(not(feature = "media-ffmpeg"))]
fn decode_video_frames_rgba8(
    _source: &VideoSourceInfo,
    _start_time_sec: f64,
    _frame_count: u32,
) -> ForgeResult<Vec<FrameRGBA>> {
    Err(ForgeError::media(
        "video sources require the 'media-ffmpeg' feature",
    ))
}

#[cfg_attr(not(feature = "media-ffmpeg"), allow(dead_code))]
fn parse_ff_ratio(s: &str) -> Option<(u32, u32)> {
    let mut parts = s.split('/');
    let a = parts.next()?.parse::<u32>().ok()?;
    let b = parts.next()?.parse::<u32>().ok()?;
    if b == 0 {
        return None;
    }
    Some((a, b))
}
