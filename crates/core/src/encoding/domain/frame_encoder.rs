use std::time::Duration;

use crate::shared::capture_config::CaptureConfig;
use crate::shared::error::CaptureError;
use crate::shared::view_spec::ViewSpec;

/// How an encoder run ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncoderExit {
    /// Exit status text, e.g. `exit status: 0`.
    pub status: String,
    pub success: bool,
    /// True when the process outlived the timeout and had to be killed.
    pub killed: bool,
    /// Everything the encoder printed on its diagnostic stream.
    pub diagnostics: Vec<String>,
}

/// Abstracts the encoder so the capture session can stream frames
/// without knowing how they reach the video file.
pub trait FrameEncoder {
    fn start(&mut self, config: &CaptureConfig, view: &ViewSpec) -> Result<(), CaptureError>;

    /// True once the encoder can no longer accept frames.
    fn has_exited(&mut self) -> bool;

    fn write_frame(&mut self, bytes: &[u8]) -> Result<(), CaptureError>;

    /// Signals end of input and waits up to `timeout` for the encoder to
    /// finish, force-stopping it after that.
    fn close_and_wait(&mut self, timeout: Duration) -> Result<EncoderExit, CaptureError>;
}
