use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::capture::frame_source::FrameSource;
use crate::encoding::domain::frame_encoder::{EncoderExit, FrameEncoder};
use crate::host::domain::render_target::RenderTarget;
use crate::host::domain::timeline::Timeline;
use crate::shared::capture_config::CaptureConfig;
use crate::shared::constants::ENCODER_EXIT_TIMEOUT;
use crate::shared::error::CaptureError;
use crate::shared::view_spec::ViewSpec;
use crate::viewport::target_lock::TargetLock;
use crate::viewport::viewport_state_guard::ViewportStateGuard;

/// Where a session is in its single run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Preparing,
    Recording,
    Finalizing,
    Completed,
    Failed,
}

/// What a finished recording loop produced.
#[derive(Clone, Debug, PartialEq)]
pub struct CaptureSummary {
    pub output_path: PathBuf,
    pub frames_written: usize,
    /// Host frame numbers dropped after a per-frame failure.
    pub skipped_frames: Vec<i64>,
    pub state: SessionState,
}

/// Receives the cumulative number of frames handed to the encoder.
pub type ProgressObserver = Box<dyn FnMut(usize)>;

/// Receives the output path once the video is complete.
pub type CompleteObserver = Box<dyn FnMut(&Path)>;

struct RecordOutcome {
    frames_written: usize,
    skipped_frames: Vec<i64>,
    terminated_at: Option<i64>,
}

/// Drives one capture: lock the target, force minimal display, start the
/// encoder, stream every frame in range, then unwind in order.
///
/// Single-use: a second `run` fails with [`CaptureError::SessionUsed`].
/// Observers are called synchronously, in registration order, on the
/// thread calling `run`.
pub struct CaptureSession {
    encoder: Box<dyn FrameEncoder>,
    exit_timeout: Duration,
    state: SessionState,
    on_progress: Vec<ProgressObserver>,
    on_complete: Vec<CompleteObserver>,
    summary: Option<CaptureSummary>,
}

impl CaptureSession {
    pub fn new(encoder: Box<dyn FrameEncoder>) -> Self {
        Self {
            encoder,
            exit_timeout: ENCODER_EXIT_TIMEOUT,
            state: SessionState::Idle,
            on_progress: Vec::new(),
            on_complete: Vec::new(),
            summary: None,
        }
    }

    pub fn with_exit_timeout(mut self, timeout: Duration) -> Self {
        self.exit_timeout = timeout;
        self
    }

    pub fn on_progress(&mut self, observer: impl FnMut(usize) + 'static) {
        self.on_progress.push(Box::new(observer));
    }

    pub fn on_complete(&mut self, observer: impl FnMut(&Path) + 'static) {
        self.on_complete.push(Box::new(observer));
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Outcome of the recording loop, available once it has run, also
    /// for failed sessions.
    pub fn summary(&self) -> Option<&CaptureSummary> {
        self.summary.as_ref()
    }

    pub fn run(
        &mut self,
        config: &CaptureConfig,
        view: &ViewSpec,
        timeline: &mut dyn Timeline,
        target: &mut dyn RenderTarget,
    ) -> Result<CaptureSummary, CaptureError> {
        if self.state != SessionState::Idle {
            return Err(CaptureError::SessionUsed);
        }

        log::debug!(
            "Starting capture: frames [{} -> {}], size {}, fps {}, codec {}, crf {}",
            config.start_frame(),
            config.end_frame(),
            view.size_arg(),
            config.frame_rate(),
            config.codec(),
            config.quality()
        );

        self.state = SessionState::Preparing;
        let target_lock = match TargetLock::acquire(target.id()) {
            Ok(lock) => lock,
            Err(e) => return self.fail(e),
        };
        let mut viewport = ViewportStateGuard::acquire(target, view.display_flags());
        if let Err(e) = self.encoder.start(config, view) {
            viewport.release();
            drop(target_lock);
            return self.fail(e);
        }

        self.state = SessionState::Recording;
        let recorded = self.record(config, view, timeline, viewport.target());

        self.state = SessionState::Finalizing;
        viewport.release();
        let exit = self.encoder.close_and_wait(self.exit_timeout);
        drop(target_lock);

        let outcome = match recorded {
            Ok(outcome) => outcome,
            Err(e) => {
                log_exit_failure(&exit);
                return self.fail(e);
            }
        };

        let mut summary = CaptureSummary {
            output_path: config.output_path().to_path_buf(),
            frames_written: outcome.frames_written,
            skipped_frames: outcome.skipped_frames,
            state: SessionState::Failed,
        };
        self.summary = Some(summary.clone());

        if let Some(frame) = outcome.terminated_at {
            log_exit_failure(&exit);
            return self.fail(CaptureError::EncoderTerminated { frame });
        }
        match exit {
            Err(e) => return self.fail(e),
            Ok(exit) if !exit.success => {
                return self.fail(CaptureError::EncoderFailed {
                    status: exit.status,
                });
            }
            Ok(_) => {}
        }

        self.state = SessionState::Completed;
        summary.state = SessionState::Completed;
        self.summary = Some(summary.clone());

        if !summary.skipped_frames.is_empty() {
            log::warn!(
                "Capture finished with {} skipped frame(s): {:?}",
                summary.skipped_frames.len(),
                summary.skipped_frames
            );
        }
        for observer in &mut self.on_complete {
            observer(&summary.output_path);
        }
        log::debug!("Capture complete: {}", summary.output_path.display());
        Ok(summary)
    }

    fn record(
        &mut self,
        config: &CaptureConfig,
        view: &ViewSpec,
        timeline: &mut dyn Timeline,
        target: &mut dyn RenderTarget,
    ) -> Result<RecordOutcome, CaptureError> {
        let source = FrameSource::new(view);
        let mut outcome = RecordOutcome {
            frames_written: 0,
            skipped_frames: Vec::new(),
            terminated_at: None,
        };

        for i in 0..config.frame_count() {
            let current = config.start_frame() + i as i64;

            if self.encoder.has_exited() {
                log::error!("Encoder terminated prematurely at frame {current}");
                outcome.terminated_at = Some(current);
                break;
            }

            match self.capture_and_write(&source, timeline, target, current) {
                Ok(()) => {
                    outcome.frames_written += 1;
                    for observer in &mut self.on_progress {
                        observer(outcome.frames_written);
                    }
                }
                Err(e) if e.is_frame_local() => {
                    log::warn!("Frame {current} skipped: {e}");
                    outcome.skipped_frames.push(current);
                }
                Err(e) => return Err(e),
            }
        }

        Ok(outcome)
    }

    fn capture_and_write(
        &mut self,
        source: &FrameSource,
        timeline: &mut dyn Timeline,
        target: &mut dyn RenderTarget,
        current: i64,
    ) -> Result<(), CaptureError> {
        timeline
            .set_current_time(current)
            .map_err(|e| CaptureError::Host(format!("could not move to frame {current}: {e}")))?;
        let frame = source.capture(target, current)?;
        log::trace!("Writing frame {} ({} bytes)", frame.number(), frame.data().len());
        self.encoder.write_frame(frame.data())
    }

    fn fail<T>(&mut self, error: CaptureError) -> Result<T, CaptureError> {
        self.state = SessionState::Failed;
        log::error!("Capture failed: {error}");
        Err(error)
    }
}

fn log_exit_failure(exit: &Result<EncoderExit, CaptureError>) {
    if let Err(e) = exit {
        log::error!("Encoder shutdown after failed capture also failed: {e}");
    }
}
