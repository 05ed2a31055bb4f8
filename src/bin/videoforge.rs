use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use videoforge::{
    Canvas2d, EffectParam, EffectSettings, Editor, FfmpegMedia, FfmpegRecorder, ForgeConfig,
    LandingView, MediaElement, TestPatternMedia, TransitionKind,
};

#[derive(Parser, Debug)]
#[command(name = "videoforge", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the landing page as text.
    Landing(LandingArgs),
    /// Render one filtered frame as a PNG.
    Frame(FrameArgs),
    /// Record the trimmed, filtered video to WebM (requires `ffmpeg` on PATH).
    Export(ExportArgs),
}

#[derive(Args, Debug)]
struct LandingArgs {
    /// Show the mobile menu expanded.
    #[arg(long)]
    menu_open: bool,

    /// Wrap width in columns.
    #[arg(long, default_value_t = 72)]
    width: usize,
}

#[derive(Args, Debug)]
struct SourceArgs {
    /// Input video file.
    #[arg(long = "in", required_unless_present = "test_pattern")]
    in_path: Option<PathBuf>,

    /// Use a synthetic 320x240 moving gradient instead of a file.
    #[arg(long, conflicts_with = "in_path")]
    test_pattern: bool,

    /// Length of the synthetic source in seconds.
    #[arg(long, default_value_t = 3.0)]
    pattern_secs: f64,
}

#[derive(Args, Debug)]
struct EffectArgs {
    /// Brightness in percent (100 = unchanged).
    #[arg(long)]
    brightness: Option<f64>,

    /// Contrast in percent (100 = unchanged).
    #[arg(long)]
    contrast: Option<f64>,

    /// Saturation in percent (100 = unchanged).
    #[arg(long)]
    saturation: Option<f64>,

    /// Blur radius in pixels.
    #[arg(long)]
    blur: Option<f64>,
}

impl EffectArgs {
    fn overrides(&self) -> impl Iterator<Item = (EffectParam, f64)> {
        [
            (EffectParam::Brightness, self.brightness),
            (EffectParam::Contrast, self.contrast),
            (EffectParam::Saturation, self.saturation),
            (EffectParam::Blur, self.blur),
        ]
        .into_iter()
        .filter_map(|(p, v)| v.map(|v| (p, v)))
    }
}

#[derive(Args, Debug)]
struct FrameArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Position in seconds.
    #[arg(long, default_value_t = 0.0)]
    at: f64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    #[command(flatten)]
    effects: EffectArgs,
}

#[derive(Args, Debug)]
struct ExportArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// JSON config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Trim start in seconds.
    #[arg(long)]
    trim_start: Option<f64>,

    /// Trim end in seconds (defaults to the source duration).
    #[arg(long)]
    trim_end: Option<f64>,

    /// Directory the recording is written to.
    #[arg(long)]
    out_dir: Option<PathBuf>,

    #[command(flatten)]
    effects: EffectArgs,

    /// Add a default text overlay at the trim start.
    #[arg(long)]
    text_overlay: bool,

    /// Record a transition (fade, wipe, dissolve, slide) at the trim start.
    #[arg(long = "transition")]
    transitions: Vec<String>,

    /// Print the editor state as JSON after the export.
    #[arg(long)]
    dump_state: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Landing(args) => cmd_landing(args),
        Command::Frame(args) => cmd_frame(args),
        Command::Export(args) => cmd_export(args),
    }
}

fn open_source(args: &SourceArgs) -> anyhow::Result<(Box<dyn MediaElement>, PathBuf)> {
    if args.test_pattern {
        let media = TestPatternMedia::new(320, 240, args.pattern_secs);
        return Ok((Box::new(media), PathBuf::from("test-pattern")));
    }
    let path = args
        .in_path
        .clone()
        .context("--in is required without --test-pattern")?;
    Ok((Box::new(FfmpegMedia::new()), path))
}

fn cmd_landing(args: LandingArgs) -> anyhow::Result<()> {
    let mut view = LandingView::new();
    if args.menu_open {
        view.toggle_menu();
    }
    print!("{}", view.render_text(args.width));
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let (mut media, path) = open_source(&args.source)?;
    media
        .load(&path)
        .with_context(|| format!("open '{}'", path.display()))?;
    let mut effects = EffectSettings::default();
    for (param, value) in args.effects.overrides() {
        effects.set(param, value);
    }

    media.set_current_time(args.at);
    let mut canvas = Canvas2d::new();
    canvas.render_tick(media.as_mut(), &effects, true)?;
    let frame = canvas.capture_frame();

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    image::save_buffer_with_format(
        &args.out,
        &frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_export(args: ExportArgs) -> anyhow::Result<()> {
    let mut cfg = match &args.config {
        Some(path) => ForgeConfig::load(path)?,
        None => ForgeConfig::default(),
    };
    if let Some(dir) = &args.out_dir {
        cfg.export.output_dir = dir.clone();
    }
    cfg.validate()?;

    let (mut media, path) = open_source(&args.source)?;
    let mut editor = Editor::new(cfg);
    editor.ingest_media(&path, media.as_mut());

    for (param, value) in args.effects.overrides() {
        editor.set_effect(param, value);
    }
    let trim_start = args.trim_start.unwrap_or(editor.trim_start);
    let trim_end = args.trim_end.unwrap_or(editor.trim_end);
    editor.set_trim(trim_start, trim_end);

    editor.seek_to_fraction(
        if editor.duration > 0.0 {
            trim_start / editor.duration
        } else {
            0.0
        },
        media.as_mut(),
    );
    if args.text_overlay {
        editor.add_text_overlay();
    }
    for name in &args.transitions {
        let kind: TransitionKind = name.parse()?;
        editor.add_transition(kind);
    }

    let export_cfg = editor.config().export.clone();
    let mut recorder = FfmpegRecorder::new(export_cfg.partial_path())
        .with_background(export_cfg.background_rgba);
    let report = editor.export(media.as_mut(), &mut recorder);

    if args.dump_state {
        println!("{}", serde_json::to_string_pretty(&editor)?);
    }

    let Some(report) = report else {
        anyhow::bail!("export failed (see log for details)");
    };
    eprintln!(
        "wrote {} ({} frames, {:.2}s)",
        report.out_path.display(),
        report.frames,
        report.recorded_secs
    );
    Ok(())
}
