use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::encoding::domain::frame_encoder::{EncoderExit, FrameEncoder};
use crate::encoding::infrastructure::encoder_locator::locate_encoder;
use crate::encoding::infrastructure::encoder_process::EncoderProcess;
use crate::shared::capture_config::CaptureConfig;
use crate::shared::error::CaptureError;
use crate::shared::view_spec::ViewSpec;

/// Pads odd sizes up to even; yuv chroma subsampling needs both
/// dimensions divisible by two.
const EVEN_PAD_FILTER: &str = "pad=ceil(iw/2)*2:ceil(ih/2)*2";

const OUTPUT_PIXEL_FORMAT: &str = "yuv444p";

/// Streams raw RGBA frames into an ffmpeg process.
pub struct FfmpegEncoder {
    executable: PathBuf,
    process: Option<EncoderProcess>,
}

impl FfmpegEncoder {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            process: None,
        }
    }

    /// Resolves the executable now so a missing encoder is reported
    /// before any capture work starts.
    pub fn locate(explicit: Option<&Path>) -> Result<Self, CaptureError> {
        Ok(Self::new(locate_encoder(explicit)?))
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }
}

/// Full ffmpeg argument vector for one capture.
pub fn encoder_args(config: &CaptureConfig, view: &ViewSpec) -> Vec<OsString> {
    let mut args: Vec<OsString> = [
        "-y",
        "-f",
        "rawvideo",
        "-vcodec",
        "rawvideo",
        "-pix_fmt",
        "rgba",
        "-s",
    ]
    .iter()
    .map(OsString::from)
    .collect();

    args.push(view.size_arg().into());
    args.push("-framerate".into());
    args.push(config.frame_rate().to_string().into());
    args.push("-i".into());
    args.push("-".into());
    args.push("-vf".into());
    args.push(EVEN_PAD_FILTER.into());
    args.push("-c:v".into());
    args.push(config.codec().into());
    args.push("-crf".into());
    args.push(config.quality().to_string().into());
    args.push("-pix_fmt".into());
    args.push(OUTPUT_PIXEL_FORMAT.into());
    args.push(config.output_path().as_os_str().to_os_string());
    args
}

impl FrameEncoder for FfmpegEncoder {
    fn start(&mut self, config: &CaptureConfig, view: &ViewSpec) -> Result<(), CaptureError> {
        if self.process.is_some() {
            return Err(CaptureError::EncoderUnavailable(
                "encoder already started".to_string(),
            ));
        }
        if !self.executable.is_file() {
            self.executable = locate_encoder(Some(self.executable.as_path()))?;
        }

        let args = encoder_args(config, view);
        log::debug!(
            "Launching {} {}",
            self.executable.display(),
            args.iter()
                .map(|a| a.to_string_lossy())
                .collect::<Vec<_>>()
                .join(" ")
        );
        self.process = Some(EncoderProcess::spawn(&self.executable, &args)?);
        Ok(())
    }

    fn has_exited(&mut self) -> bool {
        self.process.as_mut().map_or(true, |p| p.has_exited())
    }

    fn write_frame(&mut self, bytes: &[u8]) -> Result<(), CaptureError> {
        match self.process.as_mut() {
            Some(process) => process.write(bytes),
            None => Err(CaptureError::FrameWrite(io::Error::new(
                io::ErrorKind::NotConnected,
                "encoder not started",
            ))),
        }
    }

    fn close_and_wait(&mut self, timeout: Duration) -> Result<EncoderExit, CaptureError> {
        match self.process.as_mut() {
            Some(process) => process.close_and_wait(timeout),
            None => Err(CaptureError::EncoderUnavailable(
                "encoder was never started".to_string(),
            )),
        }
    }
}
