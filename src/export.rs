use std::path::PathBuf;

use crate::{
    canvas::Canvas2d,
    config::ExportConfig,
    error::{ForgeError, ForgeResult},
    media::MediaElement,
    model::EffectSettings,
    recorder::{Recorder, RecordedMedia, StreamFormat},
};

/// Portion of the source to record.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrimRange {
    pub start: f64,
    pub end: f64,
}

impl TrimRange {
    pub fn len_secs(self) -> f64 {
        (self.end - self.start).max(0.0)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ExportReport {
    pub out_path: PathBuf,
    pub frames: u64,
    /// Source seconds covered by the recording.
    pub recorded_secs: f64,
}

/// Runs one export: play the trim range through the canvas and record it.
pub struct Exporter<'a> {
    cfg: &'a ExportConfig,
}

impl<'a> Exporter<'a> {
    pub fn new(cfg: &'a ExportConfig) -> Self {
        Self { cfg }
    }

    /// Seeks to the trim start, plays, and captures one canvas frame per tick
    /// until playback reaches the trim end or the source ends. The recording is
    /// then moved to its final name.
    #[tracing::instrument(skip_all, fields(start = trim.start, end = trim.end))]
    pub fn run(
        &self,
        media: &mut dyn MediaElement,
        canvas: &mut Canvas2d,
        effects: &EffectSettings,
        trim: TrimRange,
        recorder: &mut dyn Recorder,
    ) -> ForgeResult<ExportReport> {
        self.cfg.validate()?;
        let (width, height) = media.video_size();
        canvas.resize(width, height);

        recorder.start(StreamFormat {
            width,
            height,
            fps: self.cfg.fps,
        })?;

        let result = self.capture(media, canvas, effects, trim, recorder);
        media.pause();
        let recorded = match result {
            Ok(recorded_secs) => (recorder.stop()?, recorded_secs),
            Err(err) => {
                // Best effort: the partial recording is abandoned.
                if let Err(stop_err) = recorder.stop() {
                    tracing::debug!(error = %stop_err, "recorder stop after failed capture");
                }
                return Err(err);
            }
        };
        let (media_file, recorded_secs) = recorded;

        let out_path = self.deliver(&media_file)?;
        tracing::info!(
            out = %out_path.display(),
            frames = media_file.frames,
            "export finished"
        );
        Ok(ExportReport {
            out_path,
            frames: media_file.frames,
            recorded_secs,
        })
    }

    fn capture(
        &self,
        media: &mut dyn MediaElement,
        canvas: &mut Canvas2d,
        effects: &EffectSettings,
        trim: TrimRange,
        recorder: &mut dyn Recorder,
    ) -> ForgeResult<f64> {
        let dt = self.cfg.fps.frame_duration_secs();
        media.set_current_time(trim.start);
        media.play()?;

        let mut frames = 0u64;
        loop {
            let t = media.current_time();
            if t >= trim.end || media.ended() {
                break;
            }
            if frames >= self.cfg.max_frames {
                return Err(ForgeError::export(format!(
                    "export exceeded {} frames before reaching {:.3}s",
                    self.cfg.max_frames, trim.end
                )));
            }
            canvas.render_tick(media, effects, true)?;
            recorder.push_frame(&canvas.capture_frame())?;
            frames += 1;
            media.advance(dt);
        }

        Ok((media.current_time().min(trim.end) - trim.start).max(0.0))
    }

    fn deliver(&self, recorded: &RecordedMedia) -> ForgeResult<PathBuf> {
        use anyhow::Context as _;
        let out_path = self.cfg.out_path();
        if recorded.path != out_path {
            std::fs::rename(&recorded.path, &out_path).with_context(|| {
                format!(
                    "move recording '{}' to '{}'",
                    recorded.path.display(),
                    out_path.display()
                )
            })?;
        }
        Ok(out_path)
    }
}
