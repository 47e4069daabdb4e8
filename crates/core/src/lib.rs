//! Viewport frame capture streamed into an external video encoder.
//!
//! The host application is reached only through the traits in
//! [`host::domain`]; the encoder is an external process driven over a
//! byte pipe by [`encoding::infrastructure::ffmpeg_encoder::FfmpegEncoder`].
//! [`capture::capture_session::CaptureSession`] ties the two together.

pub mod capture;
pub mod encoding;
pub mod host;
pub mod playback;
pub mod shared;
pub mod viewport;
