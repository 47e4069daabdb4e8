use std::cell::RefCell;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process;
use std::rc::Rc;
use std::time::Duration;

use clap::Parser;

use playcast_core::capture::capture_session::CaptureSession;
use playcast_core::capture::progress_logger::ProgressLogger;
use playcast_core::encoding::infrastructure::ffmpeg_encoder::FfmpegEncoder;
use playcast_core::host::infrastructure::synthetic_host::synthetic_scene;
use playcast_core::playback::player_launcher::{locate_player, open_in_player};
use playcast_core::shared::capture_config::{validate_quality, CaptureConfig};
use playcast_core::shared::constants::VIDEO_EXTENSIONS;
use playcast_core::shared::display_flags::DisplayFlags;
use playcast_core::shared::path_utils::{ensure_parent_dir, increment_file_path};
use playcast_core::shared::settings::Settings;
use playcast_core::shared::view_spec::ViewSpec;

const SCENE_TARGET: &str = "synthetic";
const SCENE_START: i64 = 1;
const SCENE_END: i64 = 48;
const SCENE_FRAME_RATE: u32 = 24;
const SCENE_WIDTH: u32 = 640;
const SCENE_HEIGHT: u32 = 360;
const PROGRESS_THROTTLE: usize = 10;

/// Record a viewport playblast through ffmpeg.
#[derive(Parser)]
#[command(name = "playcast")]
struct Cli {
    /// Output video file (.mp4 is appended when the extension is not a video one).
    output: PathBuf,

    /// ffmpeg video codec (default: last used, then libx264).
    #[arg(long)]
    codec: Option<String>,

    /// CRF quality (0=lossless, 51=worst; default: last used, then 24).
    #[arg(long)]
    quality: Option<i32>,

    /// First frame to capture (default: animation start).
    #[arg(long, allow_hyphen_values = true)]
    start: Option<i64>,

    /// Last frame to capture, inclusive (default: animation end).
    #[arg(long, allow_hyphen_values = true)]
    end: Option<i64>,

    /// Output frame rate (default: scene frame rate).
    #[arg(long)]
    fps: Option<u32>,

    /// Capture width in pixels (default: viewport width).
    #[arg(long)]
    width: Option<u32>,

    /// Capture height in pixels (default: viewport height).
    #[arg(long)]
    height: Option<u32>,

    /// Path to the ffmpeg executable (default: saved path, then PATH).
    #[arg(long)]
    ffmpeg: Option<PathBuf>,

    /// Display toggles to keep visible while capturing (comma-separated).
    #[arg(long, value_delimiter = ',')]
    keep_visible: Option<Vec<String>>,

    /// Open the video in a player once it is written.
    #[arg(long)]
    open: bool,

    /// Player executable used with --open (default: saved player, then OpenRV or vlc on PATH, then the system viewer).
    #[arg(long)]
    player: Option<PathBuf>,

    /// Seconds to wait for ffmpeg to finish after the last frame.
    #[arg(long)]
    timeout: Option<u64>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let mut settings = Settings::load();
    let codec = cli.codec.clone().unwrap_or_else(|| settings.codec.clone());
    let quality = cli.quality.unwrap_or(i32::from(settings.quality));

    let output = resolve_output(&cli.output);
    ensure_parent_dir(&output)
        .map_err(|e| format!("Cannot create directory for {}: {e}", output.display()))?;

    let (mut timeline, mut viewport) = synthetic_scene(
        SCENE_TARGET,
        SCENE_START,
        SCENE_END,
        SCENE_FRAME_RATE,
        SCENE_WIDTH,
        SCENE_HEIGHT,
    );

    let config = CaptureConfig::builder(output.clone())
        .codec(codec.as_str())
        .quality(quality)
        .start_frame(cli.start)
        .end_frame(cli.end)
        .frame_rate(cli.fps)
        .build(&timeline)?;

    let mut keep_visible = settings.keep_visible.clone();
    keep_visible.extend(cli.keep_visible.clone().unwrap_or_default());
    let flags = DisplayFlags::catalog().with_sticky(&keep_visible)?;
    let view = ViewSpec::for_target(&viewport, cli.width, cli.height)?.with_display_flags(flags);

    let ffmpeg_path = cli.ffmpeg.clone().or_else(|| settings.ffmpeg_path.clone());
    let encoder = FfmpegEncoder::locate(ffmpeg_path.as_deref())?;
    let located_ffmpeg = encoder.executable().to_path_buf();
    log::info!("Using encoder {}", located_ffmpeg.display());

    let mut session = CaptureSession::new(Box::new(encoder));
    if let Some(secs) = cli.timeout {
        session = session.with_exit_timeout(Duration::from_secs(secs));
    }

    let progress = Rc::new(RefCell::new(ProgressLogger::new(
        config.frame_count(),
        PROGRESS_THROTTLE,
    )));
    let progress_sink = progress.clone();
    session.on_progress(move |done| progress_sink.borrow_mut().progress(done));

    if cli.open {
        let player = cli
            .player
            .clone()
            .or_else(|| settings.player_path.clone())
            .or_else(locate_player);
        session.on_complete(move |path| {
            if let Err(e) = open_in_player(path, player.as_deref()) {
                log::warn!("Could not open {}: {e}", path.display());
            }
        });
    }

    let summary = session.run(&config, &view, &mut timeline, &mut viewport)?;
    progress.borrow().summary();
    log::info!(
        "Output written to {} ({} frames)",
        summary.output_path.display(),
        summary.frames_written
    );

    settings.codec = codec;
    settings.quality = u8::try_from(quality)?;
    settings.last_output = Some(summary.output_path);
    if cli.ffmpeg.is_some() {
        settings.ffmpeg_path = Some(located_ffmpeg);
    }
    if cli.player.is_some() {
        settings.player_path = cli.player;
    }
    if let Err(e) = settings.save() {
        log::warn!("Could not save settings: {e}");
    }

    Ok(())
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(q) = cli.quality {
        validate_quality(q)?;
    }
    if let (Some(start), Some(end)) = (cli.start, cli.end) {
        if end < start {
            return Err(format!("End frame {end} is before start frame {start}").into());
        }
    }
    if cli.fps == Some(0) {
        return Err("Frame rate must be positive".into());
    }
    if cli.width == Some(0) || cli.height == Some(0) {
        return Err("Capture width and height must be positive".into());
    }
    if cli.timeout == Some(0) {
        return Err("Timeout must be at least one second".into());
    }
    Ok(())
}

/// Gives `output` a video extension and steps past existing files.
fn resolve_output(output: &Path) -> PathBuf {
    let output = with_video_extension(output);
    let free = increment_file_path(&output);
    if free != output {
        log::info!(
            "{} exists, writing to {} instead",
            output.display(),
            free.display()
        );
    }
    free
}

fn with_video_extension(path: &Path) -> PathBuf {
    if is_video(path) {
        return path.to_path_buf();
    }
    let mut name: OsString = path.as_os_str().to_os_string();
    name.push(".mp4");
    PathBuf::from(name)
}

fn is_video(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| VIDEO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}
