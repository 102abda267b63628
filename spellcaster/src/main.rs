//! spellcaster: interactive entry point.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use spell_audio::AudioPlayer;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use spellcaster::collab::Collaborator;
use spellcaster::recording::SessionRecorder;
use spellcaster::vision::{
    DetectionSource, FrameSkippingDetector, ImageSequence, PoseSource, SimulatedDetector, SimulatedHands,
    SyntheticCamera, VideoSource,
};
use spellcaster::visualizer::Visualizer;
use spellcaster::{AppMode, Engine, Settings};

/// Boxes the simulated detector tracks.
const SIMULATED_OBJECTS: usize = 3;

#[derive(Parser, Debug)]
#[command(name = "spellcaster", about = "Cast particle spells and drive a HUD with hand gestures")]
struct Cli {
    /// Directory of still images to use as the video source (default: synthetic camera)
    #[arg(long)]
    source: Option<PathBuf>,

    /// Record every output frame as PNG into this directory
    #[arg(long)]
    output: Option<PathBuf>,

    /// Record into a new session directory under the configured output_dir
    #[arg(long)]
    record: bool,

    /// Settings file
    #[arg(long, default_value = "config/settings.toml")]
    config: PathBuf,

    #[arg(long, value_enum, default_value_t = AppMode::Combined)]
    mode: AppMode,

    /// Log at debug level regardless of the configured level
    #[arg(long, short)]
    verbose: bool,

    #[arg(long)]
    no_audio: bool,

    #[arg(long)]
    no_detection: bool,

    /// Stop after this many frames
    #[arg(long)]
    max_frames: Option<u64>,

    /// Run without a window; hands follow a built-in script
    #[arg(long)]
    headless: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Config warnings are shown before the configured subscriber exists.
    let mut settings = tracing::subscriber::with_default(fmt().finish(), || Settings::load(&cli.config));
    if cli.no_audio {
        settings.audio.enabled = false;
    }
    if cli.no_detection {
        settings.detection.enabled = false;
    }
    init_logging(&settings, cli.verbose);

    run(cli, settings)
}

fn init_logging(settings: &Settings, verbose: bool) {
    let level = if verbose { "debug".to_string() } else { settings.logging.level.to_lowercase() };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let file_layer = open_log_file(&settings.logging.file)
        .map(|f| fmt::layer().with_ansi(false).with_writer(Mutex::new(f)));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .init();
}

fn open_log_file(path: &str) -> Option<File> {
    if path.is_empty() {
        return None;
    }
    let path = Path::new(path);
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).ok()?;
    }
    OpenOptions::new().create(true).append(true).open(path).ok()
}

// ════════════════════════════════════════════════════════════════════════════
// run(): the main loop
// ════════════════════════════════════════════════════════════════════════════

fn run(cli: Cli, settings: Settings) -> Result<()> {
    let (w, h) = (settings.camera.width, settings.camera.height);

    // ── video source ──────────────────────────────────────────────────────
    let mut source: Box<dyn VideoSource> = match &cli.source {
        Some(dir) => Box::new(ImageSequence::open(dir, w, h).context("opening video source")?),
        None => Box::new(SyntheticCamera::new(w, h)),
    };
    let (w, h) = source.size();

    // ── collaborators ─────────────────────────────────────────────────────
    let (hands, input) = if cli.headless {
        (SimulatedHands::scripted(), None)
    } else {
        let (sim, tx) = SimulatedHands::live();
        (sim, Some(tx))
    };
    let pose = Collaborator::lazy("hand tracker", move || Ok(Box::new(hands) as Box<dyn PoseSource>));

    let detector = if settings.detection.enabled {
        let backend = Collaborator::lazy("object detector", || {
            Ok(Box::new(SimulatedDetector::new(SIMULATED_OBJECTS, 7)) as Box<dyn DetectionSource>)
        });
        FrameSkippingDetector::new(backend, settings.detection.every_n_frames, settings.detection.confidence_threshold)
    } else {
        FrameSkippingDetector::disabled()
    };

    let audio = AudioPlayer::new(settings.audio.enabled, settings.audio.volume);
    let screenshot_dir = PathBuf::from(&settings.recording.output_dir);

    let mut recorder = match (&cli.output, cli.record) {
        (Some(dir), _) => Some(SessionRecorder::into_dir(dir.clone())?),
        (None, true) => Some(SessionRecorder::start(&screenshot_dir)?),
        (None, false) => None,
    };

    let mut engine = Engine::new(settings, cli.mode, pose, detector, audio);
    engine.set_screenshot_dir(Some(screenshot_dir));

    let mut window = if cli.headless {
        None
    } else {
        Some(Visualizer::new("spellcaster", w, h, input)?)
    };

    info!(mode = ?cli.mode, width = w, height = h, headless = cli.headless, "starting");

    // ── main loop ─────────────────────────────────────────────────────────
    let mut frames = 0u64;
    loop {
        if cli.max_frames.is_some_and(|n| frames >= n) {
            info!(frames, "frame limit reached");
            break;
        }
        if let Some(win) = &mut window {
            if !win.poll_input() {
                break;
            }
        }
        let Some(frame) = source.read() else {
            info!("end of stream");
            break;
        };

        let out = engine.tick(frame, Instant::now());
        frames += 1;

        let failed = match &mut recorder {
            Some(rec) => rec.write(&out).err(),
            None => None,
        };
        if let Some(e) = failed {
            warn!(error = %format!("{:#}", e), "recording stopped");
            recorder = None;
        }
        if let Some(win) = &mut window {
            win.present(&out)?;
        }
    }

    // ── shutdown ──────────────────────────────────────────────────────────
    engine.shutdown();
    if let Some(rec) = recorder {
        rec.finish();
    }
    Ok(())
}
