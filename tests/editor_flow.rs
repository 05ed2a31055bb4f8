use std::{collections::HashSet, path::PathBuf};

use videoforge::{
    EffectParam, Editor, ExportConfig, ForgeConfig, ForgeError, ForgeResult, FrameRGBA,
    MediaElement, RecordedMedia, Recorder, StreamFormat, TestPatternMedia, TrackKind,
    TransitionKind,
};

/// Writes a marker file instead of encoding, so the "download" step can be observed.
struct FileRecorder {
    path: PathBuf,
    frames: Vec<FrameRGBA>,
    fail_on_frame: Option<usize>,
}

impl FileRecorder {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            frames: Vec::new(),
            fail_on_frame: None,
        }
    }
}

impl Recorder for FileRecorder {
    fn start(&mut self, _format: StreamFormat) -> ForgeResult<()> {
        std::fs::create_dir_all(self.path.parent().unwrap()).unwrap();
        Ok(())
    }

    fn push_frame(&mut self, frame: &FrameRGBA) -> ForgeResult<()> {
        if self.fail_on_frame == Some(self.frames.len()) {
            return Err(ForgeError::export("encoder went away"));
        }
        self.frames.push(frame.clone());
        Ok(())
    }

    fn stop(&mut self) -> ForgeResult<RecordedMedia> {
        std::fs::write(&self.path, format!("{} frames", self.frames.len())).unwrap();
        Ok(RecordedMedia {
            path: self.path.clone(),
            mime: "video/webm".to_string(),
            frames: self.frames.len() as u64,
        })
    }
}

fn editor_in(dir: &str) -> Editor {
    Editor::new(ForgeConfig {
        export: ExportConfig {
            output_dir: PathBuf::from(dir),
            ..ExportConfig::default()
        },
        ..ForgeConfig::default()
    })
}

#[test]
fn full_session_exports_trimmed_range() {
    let dir = "target/editor_flow/session";
    let _ = std::fs::remove_dir_all(dir);
    let mut editor = editor_in(dir);
    let mut media = TestPatternMedia::new(16, 12, 6.0);

    editor.ingest_media(std::path::Path::new("holiday.mp4"), &mut media);
    editor.set_effect(EffectParam::Brightness, 120.0);
    editor.set_effect(EffectParam::Blur, 1.0);
    editor.seek_to_fraction(0.5, &mut media);
    editor.add_text_overlay();
    editor.add_transition(TransitionKind::Dissolve);
    editor.set_trim(1.0, 2.0);

    let mut recorder = FileRecorder::new(editor.config().export.partial_path());
    let report = editor.export(&mut media, &mut recorder).expect("export succeeds");

    assert_eq!(report.out_path, PathBuf::from(dir).join("edited-video.webm"));
    assert!(report.out_path.exists());
    assert!(!editor.config().export.partial_path().exists());
    assert!((29..=31).contains(&report.frames));
    assert!(media.is_paused());
    assert!(editor.current_time >= 2.0);

    assert_eq!(editor.text_overlays[0].start_time, 3.0);
    assert_eq!(editor.transitions[0].start_time, 3.0);
    assert_eq!(editor.track(TrackKind::Video).clips.len(), 1);
}

#[test]
fn recorded_frames_carry_the_effects() {
    let dir = "target/editor_flow/effects";
    let _ = std::fs::remove_dir_all(dir);
    let mut editor = editor_in(dir);
    let mut media = TestPatternMedia::new(8, 8, 2.0);
    editor.ingest_media(std::path::Path::new("a.mp4"), &mut media);
    editor.set_effect(EffectParam::Brightness, 0.0);
    editor.set_trim(0.0, 0.2);

    let mut recorder = FileRecorder::new(editor.config().export.partial_path());
    editor.export(&mut media, &mut recorder).expect("export succeeds");

    assert!(!recorder.frames.is_empty());
    for frame in &recorder.frames {
        assert!(frame.data.chunks_exact(4).all(|px| px == [0, 0, 0, 255]));
    }
}

#[test]
fn export_failure_is_logged_not_raised() {
    let dir = "target/editor_flow/failure";
    let _ = std::fs::remove_dir_all(dir);
    let mut editor = editor_in(dir);
    let mut media = TestPatternMedia::new(8, 8, 4.0);
    editor.ingest_media(std::path::Path::new("a.mp4"), &mut media);

    let mut recorder = FileRecorder::new(editor.config().export.partial_path());
    recorder.fail_on_frame = Some(3);
    assert!(editor.export(&mut media, &mut recorder).is_none());
    assert!(!editor.config().export.out_path().exists());
    assert!(media.is_paused());
}

#[test]
fn many_quick_ingestions_keep_unique_ids() {
    let mut editor = Editor::default();
    let mut media = TestPatternMedia::new(4, 4, 1.0);
    let ids: Vec<_> = (0..100)
        .map(|i| editor.ingest_media(std::path::Path::new(&format!("{i}.mp4")), &mut media))
        .collect();
    let unique: HashSet<_> = ids.iter().collect();
    assert_eq!(unique.len(), 100);
    assert_eq!(editor.track(TrackKind::Video).clips.len(), 100);
}

#[test]
fn playback_ticks_follow_media_clock() {
    let mut editor = Editor::default();
    let mut media = TestPatternMedia::new(4, 4, 1.0);
    editor.ingest_media(std::path::Path::new("a.mp4"), &mut media);
    editor.toggle_play(&mut media);
    for _ in 0..40 {
        editor.tick(&mut media, 0.05);
    }
    assert_eq!(editor.current_time, 1.0);
    assert!(media.ended());
    // The mirrored flag is not synchronised with the element reaching its end.
    assert!(editor.playing);
}
