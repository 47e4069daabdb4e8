use std::time::Duration;

pub const DEFAULT_CODEC: &str = "libx264";
pub const DEFAULT_QUALITY: u8 = 24;

/// CRF bounds shared by x264/x265 (0 = lossless, 51 = worst).
pub const MIN_QUALITY: u8 = 0;
pub const MAX_QUALITY: u8 = 51;

/// RGBA readback.
pub const BYTES_PER_PIXEL: usize = 4;

pub const ENCODER_EXECUTABLE: &str = "ffmpeg";

/// How long to wait for the encoder to flush after its input closes.
pub const ENCODER_EXIT_TIMEOUT: Duration = Duration::from_secs(30);

pub const PLAYER_CANDIDATES: &[&str] = &["OpenRV", "vlc"];

pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "mkv", "avi", "webm"];
