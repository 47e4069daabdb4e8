use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong between building a capture request and
/// the encoder process exiting.
///
/// `CaptureUnavailable`, `FrameWrite` and `Host` are per-frame: the
/// session logs them and moves on to the next frame. The rest end the
/// session.
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("invalid capture configuration: {0}")]
    InvalidConfig(String),

    #[error("encoder unavailable: {0}")]
    EncoderUnavailable(String),

    #[error("failed to launch encoder {program}: {source}")]
    EncoderSpawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("frame capture unavailable: {0}")]
    CaptureUnavailable(String),

    #[error("failed to write frame to encoder: {0}")]
    FrameWrite(#[source] std::io::Error),

    #[error("host rejected request: {0}")]
    Host(String),

    #[error("encoder terminated prematurely at frame {frame}")]
    EncoderTerminated { frame: i64 },

    #[error("encoder exited abnormally ({status})")]
    EncoderFailed { status: String },

    #[error("failed waiting for encoder: {0}")]
    EncoderWait(#[source] std::io::Error),

    #[error("render target '{0}' is already being captured")]
    TargetBusy(String),

    #[error("capture session has already run")]
    SessionUsed,
}

impl CaptureError {
    /// True for errors that only cost the current frame.
    pub fn is_frame_local(&self) -> bool {
        matches!(
            self,
            CaptureError::CaptureUnavailable(_) | CaptureError::FrameWrite(_) | CaptureError::Host(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_local_errors() {
        assert!(CaptureError::CaptureUnavailable("gone".into()).is_frame_local());
        assert!(CaptureError::FrameWrite(std::io::ErrorKind::BrokenPipe.into()).is_frame_local());
        assert!(CaptureError::Host("locked".into()).is_frame_local());
    }

    #[test]
    fn test_session_errors_are_not_frame_local() {
        assert!(!CaptureError::InvalidConfig("crf".into()).is_frame_local());
        assert!(!CaptureError::EncoderUnavailable("missing".into()).is_frame_local());
        assert!(!CaptureError::EncoderTerminated { frame: 3 }.is_frame_local());
        assert!(!CaptureError::TargetBusy("persp".into()).is_frame_local());
    }

    #[test]
    fn test_terminated_message_names_frame() {
        let err = CaptureError::EncoderTerminated { frame: 2 };
        assert_eq!(err.to_string(), "encoder terminated prematurely at frame 2");
    }
}
