use std::{
    path::{Path, PathBuf},
    process::{Child, ChildStdin, Command, Stdio},
};

use crate::{
    core::{Fps, FrameRGBA, byte_len},
    error::{ForgeError, ForgeResult},
};

pub const WEBM_MIME: &str = "video/webm";

/// Stream shape announced when recording starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StreamFormat {
    pub width: u32,
    pub height: u32,
    pub fps: Fps,
}

impl StreamFormat {
    pub fn validate(&self) -> ForgeResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ForgeError::validation(
                "recording width/height must be non-zero",
            ));
        }
        Fps::new(self.fps.num, self.fps.den)?;
        Ok(())
    }
}

/// Finished recording, still at its temporary location.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedMedia {
    pub path: PathBuf,
    pub mime: String,
    pub frames: u64,
}

/// Captures a live frame stream into a container file.
pub trait Recorder {
    fn start(&mut self, format: StreamFormat) -> ForgeResult<()>;

    fn push_frame(&mut self, frame: &FrameRGBA) -> ForgeResult<()>;

    fn stop(&mut self) -> ForgeResult<RecordedMedia>;
}

pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

pub fn ensure_parent_dir(path: &Path) -> ForgeResult<()> {
    if let Some(parent) = path.parent() {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

struct Session {
    format: StreamFormat,
    child: Child,
    stdin: Option<ChildStdin>,
    frames: u64,
}

/// WebM (VP9) recorder that pipes raw RGBA frames into the system `ffmpeg`.
pub struct FfmpegRecorder {
    out_path: PathBuf,
    bg_rgba: [u8; 4],
    session: Option<Session>,
    scratch: Vec<u8>,
}

impl FfmpegRecorder {
    pub fn new(out_path: impl Into<PathBuf>) -> Self {
        Self {
            out_path: out_path.into(),
            bg_rgba: [0, 0, 0, 255],
            session: None,
            scratch: Vec::new(),
        }
    }

    pub fn with_background(mut self, bg_rgba: [u8; 4]) -> Self {
        self.bg_rgba = bg_rgba;
        self
    }

    pub fn out_path(&self) -> &Path {
        &self.out_path
    }
}

impl Recorder for FfmpegRecorder {
    #[tracing::instrument(skip(self), fields(out = %self.out_path.display()))]
    fn start(&mut self, format: StreamFormat) -> ForgeResult<()> {
        if self.session.is_some() {
            return Err(ForgeError::export("recorder is already recording"));
        }
        format.validate()?;
        ensure_parent_dir(&self.out_path)?;

        if !is_ffmpeg_on_path() {
            return Err(ForgeError::export(
                "ffmpeg is required for recording, but was not found on PATH",
            ));
        }

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .args([
                "-y",
                "-loglevel",
                "error",
                "-f",
                "rawvideo",
                "-pix_fmt",
                "rgba",
                "-s",
                &format!("{}x{}", format.width, format.height),
                "-r",
                &format!("{}/{}", format.fps.num, format.fps.den),
                "-i",
                "pipe:0",
                "-an",
                // yuv420p needs even dimensions; odd sources gain one edge row/column.
                "-vf",
                "pad=ceil(iw/2)*2:ceil(ih/2)*2",
                "-c:v",
                "libvpx-vp9",
                "-b:v",
                "0",
                "-crf",
                "32",
                "-deadline",
                "realtime",
                "-pix_fmt",
                "yuv420p",
                "-f",
                "webm",
            ])
            .arg(&self.out_path);

        let mut child = cmd.spawn().map_err(|e| {
            ForgeError::export(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ForgeError::export("failed to open ffmpeg stdin"))?;

        self.scratch = vec![0u8; byte_len(format.width, format.height)];
        self.session = Some(Session {
            format,
            child,
            stdin: Some(stdin),
            frames: 0,
        });
        tracing::debug!("recording started");
        Ok(())
    }

    fn push_frame(&mut self, frame: &FrameRGBA) -> ForgeResult<()> {
        let Some(session) = self.session.as_mut() else {
            return Err(ForgeError::export("recorder is not recording"));
        };
        if frame.width != session.format.width || frame.height != session.format.height {
            return Err(ForgeError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, session.format.width, session.format.height
            )));
        }

        flatten_to_opaque_rgba8(&mut self.scratch, &frame.data, self.bg_rgba)?;

        let Some(stdin) = session.stdin.as_mut() else {
            return Err(ForgeError::export("ffmpeg stdin is already closed"));
        };
        use std::io::Write as _;
        stdin.write_all(&self.scratch).map_err(|e| {
            ForgeError::export(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;
        session.frames += 1;
        Ok(())
    }

    fn stop(&mut self) -> ForgeResult<RecordedMedia> {
        let Some(mut session) = self.session.take() else {
            return Err(ForgeError::export("recorder is not recording"));
        };
        drop(session.stdin.take());

        let output = session.child.wait_with_output().map_err(|e| {
            ForgeError::export(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ForgeError::export(format!(
                "ffmpeg exited with status {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        tracing::debug!(frames = session.frames, "recording stopped");
        Ok(RecordedMedia {
            path: self.out_path.clone(),
            mime: WEBM_MIME.to_string(),
            frames: session.frames,
        })
    }
}

/// Composites straight-alpha RGBA over an opaque background.
fn flatten_to_opaque_rgba8(dst: &mut [u8], src: &[u8], bg_rgba: [u8; 4]) -> ForgeResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(ForgeError::validation(
            "flatten_to_opaque_rgba8 expects equal-length rgba8 buffers",
        ));
    }

    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let a = u16::from(s[3]);
        if a == 255 {
            d.copy_from_slice(s);
            continue;
        }
        let inv = 255 - a;
        for c in 0..3 {
            let v = mul_div255(u16::from(s[c]), a) + mul_div255(u16::from(bg_rgba[c]), inv);
            d[c] = v.min(255) as u8;
        }
        d[3] = 255;
    }
    Ok(())
}

fn mul_div255(x: u16, y: u16) -> u16 {
    ((u32::from(x) * u32::from(y) + 127) / 255) as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt(width: u32, height: u32) -> StreamFormat {
        StreamFormat {
            width,
            height,
            fps: Fps::default(),
        }
    }

    #[test]
    fn format_validation_catches_bad_values() {
        assert!(fmt(0, 10).validate().is_err());
        assert!(
            StreamFormat {
                fps: Fps { num: 30, den: 0 },
                ..fmt(10, 10)
            }
            .validate()
            .is_err()
        );
        assert!(fmt(640, 360).validate().is_ok());
    }

    #[test]
    fn odd_sizes_are_accepted() {
        assert!(fmt(31, 24).validate().is_ok());
        assert!(fmt(1, 1).validate().is_ok());
    }

    #[test]
    fn flatten_straight_over_black() {
        let src = vec![255u8, 0, 0, 128];
        let mut dst = vec![0u8; 4];
        flatten_to_opaque_rgba8(&mut dst, &src, [0, 0, 0, 255]).unwrap();
        assert_eq!(dst, vec![128u8, 0, 0, 255]);
    }

    #[test]
    fn flatten_keeps_opaque_pixels() {
        let src = vec![1u8, 2, 3, 255];
        let mut dst = vec![0u8; 4];
        flatten_to_opaque_rgba8(&mut dst, &src, [200, 200, 200, 255]).unwrap();
        assert_eq!(dst, src);
    }

    #[test]
    fn push_and_stop_require_a_session() {
        let mut rec = FfmpegRecorder::new("target/recorder_test/never.webm");
        assert!(rec.push_frame(&FrameRGBA::new(2, 2)).is_err());
        assert!(rec.stop().is_err());
    }
}
