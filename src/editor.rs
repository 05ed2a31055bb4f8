use std::path::Path;

use crate::{
    canvas::Canvas2d,
    config::ForgeConfig,
    export::{ExportReport, Exporter, TrimRange},
    media::MediaElement,
    model::{
        Clip, DEFAULT_OVERLAY_DURATION, DEFAULT_OVERLAY_TEXT, DEFAULT_TRANSITION_DURATION,
        EffectParam, EffectSettings, IdSource, ItemId, MediaSource, OverlayPosition,
        OverlayStyle, TextOverlay, Track, TrackKind, Transition, TransitionKind,
    },
    recorder::Recorder,
};

/// Pixel height of one timeline lane.
pub const TRACK_ROW_PX: u32 = 24;

/// Transient state of the editing widget. Every operation runs to completion
/// on the caller's thread; nothing here is persisted.
#[derive(Clone, Debug, serde::Serialize)]
pub struct Editor {
    pub video_source: Option<MediaSource>,
    pub current_time: f64,
    pub duration: f64,
    pub playing: bool,
    pub volume: f64,
    tracks: Vec<Track>,
    pub effects: EffectSettings,
    pub transitions: Vec<Transition>,
    pub text_overlays: Vec<TextOverlay>,
    pub trim_start: f64,
    pub trim_end: f64,
    pub selected_clip: Option<ItemId>,
    pub selected_effect: Option<EffectParam>,
    pub selected_transition: Option<TransitionKind>,
    #[serde(skip)]
    config: ForgeConfig,
    #[serde(skip)]
    ids: IdSource,
    #[serde(skip)]
    canvas: Canvas2d,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(ForgeConfig::default())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ClipBar {
    pub id: ItemId,
    pub left_pct: f64,
    pub width_pct: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TrackRow {
    pub track_id: String,
    pub top_px: u32,
    pub clips: Vec<ClipBar>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TimelineLayout {
    pub rows: Vec<TrackRow>,
    pub playhead_pct: f64,
}

impl Editor {
    pub fn new(config: ForgeConfig) -> Self {
        Self {
            video_source: None,
            current_time: 0.0,
            duration: 0.0,
            playing: false,
            volume: 1.0,
            tracks: TrackKind::ALL.into_iter().map(Track::empty).collect(),
            effects: config.initial_effects,
            transitions: Vec::new(),
            text_overlays: Vec::new(),
            trim_start: 0.0,
            trim_end: 0.0,
            selected_clip: None,
            selected_effect: None,
            selected_transition: None,
            config,
            ids: IdSource::default(),
            canvas: Canvas2d::new(),
        }
    }

    pub fn config(&self) -> &ForgeConfig {
        &self.config
    }

    pub fn canvas(&self) -> &Canvas2d {
        &self.canvas
    }

    /// The three lanes in `TrackKind::ALL` order.
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn track(&self, kind: TrackKind) -> &Track {
        // The three lanes exist from construction on and are never removed.
        &self.tracks[kind as usize]
    }

    fn track_mut(&mut self, kind: TrackKind) -> &mut Track {
        &mut self.tracks[kind as usize]
    }

    /// Adds a picked file as a new clip on the video lane and points the
    /// player at it. A source the player cannot open is only logged.
    #[tracing::instrument(skip(self, media))]
    pub fn ingest_media(&mut self, path: &Path, media: &mut dyn MediaElement) -> ItemId {
        let id = self.ids.next_id();
        let source = MediaSource {
            url: format!("blob:videoforge/{id}"),
            path: path.to_path_buf(),
        };
        let clip = Clip {
            id,
            kind: TrackKind::Video,
            start: 0.0,
            end: 0.0,
            source: source.clone(),
            effects: self.effects,
        };
        self.track_mut(TrackKind::Video).clips.push(clip);
        self.video_source = Some(source);

        match media.load(path) {
            Ok(()) => self.on_loaded_metadata(media.duration()),
            Err(err) => tracing::warn!(error = %err, "player could not load source"),
        }
        id
    }

    pub fn on_loaded_metadata(&mut self, duration: f64) {
        self.duration = duration;
        self.trim_end = duration;
    }

    /// Playback clock update from the player. Not ordered against seeks.
    pub fn on_time_update(&mut self, t: f64) {
        self.current_time = t;
    }

    /// Seek to a fraction of the timeline width.
    pub fn seek_to_fraction(&mut self, fraction: f64, media: &mut dyn MediaElement) -> f64 {
        let t = fraction * self.duration;
        media.set_current_time(t);
        self.current_time = t;
        t
    }

    /// Click handler of the timeline strip: `click_x` and `rect_left` are in the
    /// same coordinate space, `rect_width` is the strip width.
    pub fn seek_from_pointer(
        &mut self,
        click_x: f64,
        rect_left: f64,
        rect_width: f64,
        media: &mut dyn MediaElement,
    ) -> f64 {
        self.seek_to_fraction((click_x - rect_left) / rect_width, media)
    }

    pub fn skip_back(&mut self, media: &mut dyn MediaElement) {
        media.set_current_time((self.current_time - self.config.skip_seconds).max(0.0));
    }

    pub fn skip_forward(&mut self, media: &mut dyn MediaElement) {
        media.set_current_time((self.current_time + self.config.skip_seconds).min(self.duration));
    }

    /// Flips the mirrored flag regardless of whether the player actually
    /// started.
    pub fn toggle_play(&mut self, media: &mut dyn MediaElement) {
        if self.playing {
            media.pause();
        } else {
            media.set_volume(self.volume);
            if let Err(err) = media.play() {
                tracing::debug!(error = %err, "play request failed");
            }
        }
        self.playing = !self.playing;
    }

    pub fn set_volume(&mut self, volume: f64) {
        self.volume = volume;
    }

    pub fn set_effect(&mut self, param: EffectParam, value: f64) {
        self.effects.set(param, value);
    }

    pub fn select_effect(&mut self, param: EffectParam) {
        self.selected_effect = Some(param);
    }

    pub fn add_text_overlay(&mut self) -> ItemId {
        let id = self.ids.next_id();
        self.text_overlays.push(TextOverlay {
            id,
            text: DEFAULT_OVERLAY_TEXT.to_string(),
            position: OverlayPosition { x: 50.0, y: 50.0 },
            style: OverlayStyle::default(),
            start_time: self.current_time,
            duration: DEFAULT_OVERLAY_DURATION,
        });
        id
    }

    pub fn add_transition(&mut self, kind: TransitionKind) -> ItemId {
        let id = self.ids.next_id();
        self.transitions.push(Transition {
            id,
            kind,
            duration: DEFAULT_TRANSITION_DURATION,
            start_time: self.current_time,
        });
        id
    }

    pub fn select_transition(&mut self, kind: TransitionKind) {
        self.selected_transition = Some(kind);
    }

    pub fn select_clip(&mut self, id: ItemId) {
        self.selected_clip = Some(id);
    }

    pub fn set_trim(&mut self, start: f64, end: f64) {
        self.trim_start = start;
        self.trim_end = end;
    }

    /// Repaints the preview canvas. Only draws while playing.
    pub fn render_tick(&mut self, media: &mut dyn MediaElement) -> bool {
        match self.canvas.render_tick(media, &self.effects, self.playing) {
            Ok(drawn) => drawn,
            Err(err) => {
                tracing::debug!(error = %err, "render tick skipped");
                false
            }
        }
    }

    /// Advances the host clock by `dt`, forwards the time update and repaints.
    pub fn tick(&mut self, media: &mut dyn MediaElement, dt: f64) {
        let t = media.advance(dt);
        self.on_time_update(t);
        self.render_tick(media);
    }

    /// Records the trim range through the effect chain. Failures are logged
    /// and yield `None`.
    pub fn export(
        &mut self,
        media: &mut dyn MediaElement,
        recorder: &mut dyn Recorder,
    ) -> Option<ExportReport> {
        let trim = TrimRange {
            start: self.trim_start,
            end: self.trim_end,
        };
        let result = Exporter::new(&self.config.export).run(
            media,
            &mut self.canvas,
            &self.effects,
            trim,
            recorder,
        );
        self.on_time_update(media.current_time());
        match result {
            Ok(report) => Some(report),
            Err(err) => {
                tracing::error!("Export failed: {err}");
                None
            }
        }
    }

    /// Clip bars and playhead as percentages of the strip width.
    pub fn timeline_layout(&self) -> TimelineLayout {
        let pct = |v: f64| {
            if self.duration > 0.0 {
                v / self.duration * 100.0
            } else {
                0.0
            }
        };
        let rows = self
            .tracks
            .iter()
            .enumerate()
            .map(|(i, track)| TrackRow {
                track_id: track.id.clone(),
                top_px: i as u32 * TRACK_ROW_PX,
                clips: track
                    .clips
                    .iter()
                    .map(|c| ClipBar {
                        id: c.id,
                        left_pct: pct(c.start),
                        width_pct: pct(c.end - c.start),
                    })
                    .collect(),
            })
            .collect();
        TimelineLayout {
            rows,
            playhead_pct: pct(self.current_time),
        }
    }
}
