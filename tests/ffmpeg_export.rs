#[cfg(feature = "media-ffmpeg")]
mod ffmpeg_export {
    use std::{path::Path, process::Command};

    use videoforge::{
        EffectParam, Editor, ExportConfig, FfmpegMedia, FfmpegRecorder, ForgeConfig,
        MediaElement, TestPatternMedia, recorder::is_ffmpeg_on_path,
    };

    fn ffmpeg_tools_available() -> bool {
        let ffprobe_ok = Command::new("ffprobe")
            .arg("-version")
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false);
        is_ffmpeg_on_path() && ffprobe_ok
    }

    fn synth_clip(path: &Path) -> anyhow::Result<()> {
        std::fs::create_dir_all(path.parent().unwrap())?;
        let status = Command::new("ffmpeg")
            .args([
                "-v",
                "error",
                "-y",
                "-f",
                "lavfi",
                "-i",
                "testsrc=size=64x48:rate=30",
                "-t",
                "2",
                "-pix_fmt",
                "yuv420p",
                "-c:v",
                "mpeg4",
            ])
            .arg(path)
            .status()?;
        anyhow::ensure!(status.success(), "ffmpeg failed creating {}", path.display());
        Ok(())
    }

    fn editor_in(dir: &Path) -> Editor {
        Editor::new(ForgeConfig {
            export: ExportConfig {
                output_dir: dir.to_path_buf(),
                ..ExportConfig::default()
            },
            ..ForgeConfig::default()
        })
    }

    #[test]
    fn probe_and_decode_real_clip() {
        if !ffmpeg_tools_available() {
            eprintln!("skipping: ffmpeg/ffprobe not on PATH");
            return;
        }
        let clip = Path::new("target/ffmpeg_export/probe/clip.mp4");
        synth_clip(clip).unwrap();

        let mut media = FfmpegMedia::open(clip).unwrap();
        assert_eq!(media.video_size(), (64, 48));
        assert!((media.duration() - 2.0).abs() < 0.1);
        media.set_current_time(0.5);
        let frame = media.current_frame().unwrap();
        assert_eq!((frame.width, frame.height), (64, 48));
    }

    #[test]
    fn exports_webm_from_real_clip() {
        if !ffmpeg_tools_available() {
            eprintln!("skipping: ffmpeg/ffprobe not on PATH");
            return;
        }
        let dir = Path::new("target/ffmpeg_export/real");
        let _ = std::fs::remove_dir_all(dir);
        let clip = dir.join("clip.mp4");
        synth_clip(&clip).unwrap();

        let mut editor = editor_in(dir);
        let mut media = FfmpegMedia::new();
        editor.ingest_media(&clip, &mut media);
        editor.set_effect(EffectParam::Contrast, 140.0);
        editor.set_trim(0.5, 1.0);

        let mut recorder = FfmpegRecorder::new(editor.config().export.partial_path());
        let report = editor.export(&mut media, &mut recorder).expect("export succeeds");

        assert!(report.out_path.ends_with("edited-video.webm"));
        let meta = std::fs::metadata(&report.out_path).unwrap();
        assert!(meta.len() > 0);
        assert!((14..=16).contains(&report.frames));
    }

    #[test]
    fn exports_webm_from_test_pattern() {
        if !ffmpeg_tools_available() {
            eprintln!("skipping: ffmpeg/ffprobe not on PATH");
            return;
        }
        let dir = Path::new("target/ffmpeg_export/pattern");
        let _ = std::fs::remove_dir_all(dir);
        let mut editor = editor_in(dir);
        let mut media = TestPatternMedia::new(32, 24, 1.0);
        editor.ingest_media(Path::new("pattern"), &mut media);

        let mut recorder = FfmpegRecorder::new(editor.config().export.partial_path());
        let report = editor.export(&mut media, &mut recorder).expect("export succeeds");
        assert!(report.out_path.exists());
    }

    #[test]
    fn exports_odd_sized_source() {
        if !ffmpeg_tools_available() {
            eprintln!("skipping: ffmpeg/ffprobe not on PATH");
            return;
        }
        let dir = Path::new("target/ffmpeg_export/odd");
        let _ = std::fs::remove_dir_all(dir);
        let mut editor = editor_in(dir);
        let mut media = TestPatternMedia::new(31, 23, 0.5);
        editor.ingest_media(Path::new("pattern"), &mut media);

        let mut recorder = FfmpegRecorder::new(editor.config().export.partial_path());
        let report = editor.export(&mut media, &mut recorder).expect("export succeeds");
        assert!(std::fs::metadata(&report.out_path).unwrap().len() > 0);
    }

    #[test]
    fn exports_up_to_container_end_when_video_stops_early() {
        if !ffmpeg_tools_available() {
            eprintln!("skipping: ffmpeg/ffprobe not on PATH");
            return;
        }
        let dir = Path::new("target/ffmpeg_export/short_video");
        let _ = std::fs::remove_dir_all(dir);
        std::fs::create_dir_all(dir).unwrap();
        let clip = dir.join("clip.mp4");
        let status = Command::new("ffmpeg")
            .args([
                "-v",
                "error",
                "-y",
                "-f",
                "lavfi",
                "-i",
                "testsrc=size=64x48:rate=30:duration=1",
                "-f",
                "lavfi",
                "-i",
                "sine=frequency=440:duration=2",
                "-pix_fmt",
                "yuv420p",
                "-c:v",
                "mpeg4",
                "-c:a",
                "aac",
            ])
            .arg(&clip)
            .status()
            .unwrap();
        assert!(status.success());

        let mut editor = editor_in(dir);
        let mut media = FfmpegMedia::new();
        editor.ingest_media(&clip, &mut media);
        assert!(editor.duration > 1.5);
        editor.set_trim(0.5, editor.duration);

        let mut recorder = FfmpegRecorder::new(editor.config().export.partial_path());
        let report = editor.export(&mut media, &mut recorder).expect("export succeeds");
        assert!(report.frames >= 40);
        assert!(report.out_path.exists());
    }
}
