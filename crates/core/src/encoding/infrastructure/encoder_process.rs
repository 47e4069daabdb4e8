use std::ffi::OsStr;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStderr, ChildStdin, Command, ExitStatus, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

use crate::encoding::domain::frame_encoder::EncoderExit;
use crate::shared::constants::ENCODER_EXIT_TIMEOUT;
use crate::shared::error::CaptureError;

const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// How long stderr may stay open once the encoder itself is gone.
const DRAIN_GRACE: Duration = Duration::from_secs(2);

/// A running encoder subprocess fed through its stdin.
///
/// stderr is drained line by line on a background thread for the whole
/// life of the process so a chatty encoder can never stall on a full
/// pipe. Shutdown closes stdin, waits with a deadline (killing on
/// expiry) and joins the drain unless a leftover descendant still holds
/// stderr. Dropping an unfinished process runs the
/// same shutdown.
pub struct EncoderProcess {
    program: PathBuf,
    child: Child,
    stdin: Option<ChildStdin>,
    drain: Option<JoinHandle<()>>,
    lines: Receiver<String>,
    exit_status: Option<ExitStatus>,
    finished: Option<EncoderExit>,
}

impl EncoderProcess {
    pub fn spawn<I, S>(program: &Path, args: I) -> Result<Self, CaptureError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| CaptureError::EncoderSpawn {
                program: program.to_path_buf(),
                source,
            })?;

        let stdin = child.stdin.take();
        let (line_tx, lines) = crossbeam_channel::unbounded();
        let drain = child.stderr.take().map(|stderr| spawn_drain(stderr, line_tx));

        log::debug!("Started encoder {} (pid {})", program.display(), child.id());

        Ok(Self {
            program: program.to_path_buf(),
            child,
            stdin,
            drain,
            lines,
            exit_status: None,
            finished: None,
        })
    }

    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    /// Polls without blocking. A failed poll counts as exited since the
    /// process can no longer be trusted with frames.
    pub fn has_exited(&mut self) -> bool {
        if self.exit_status.is_some() || self.finished.is_some() {
            return true;
        }
        match self.child.try_wait() {
            Ok(Some(status)) => {
                self.exit_status = Some(status);
                true
            }
            Ok(None) => false,
            Err(e) => {
                log::warn!("Could not poll encoder {}: {e}", self.program.display());
                true
            }
        }
    }

    /// Writes one buffer to the encoder's stdin. May block while the pipe
    /// is full.
    pub fn write(&mut self, bytes: &[u8]) -> Result<(), CaptureError> {
        let stdin = self.stdin.as_mut().ok_or_else(|| {
            CaptureError::FrameWrite(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "encoder input is closed",
            ))
        })?;
        stdin.write_all(bytes).map_err(CaptureError::FrameWrite)
    }

    /// Closes stdin, waits up to `timeout` for exit (killing after that)
    /// and collects stderr, bounded by `DRAIN_GRACE`. Repeat calls return
    /// the first result.
    pub fn close_and_wait(&mut self, timeout: Duration) -> Result<EncoderExit, CaptureError> {
        if let Some(finished) = &self.finished {
            return Ok(finished.clone());
        }

        if let Some(stdin) = self.stdin.take() {
            drop(stdin);
        }

        let waited = self.wait_with_deadline(timeout);
        let diagnostics = self.collect_diagnostics();

        let (status, killed) = waited?;
        let exit = EncoderExit {
            status: status.to_string(),
            success: status.success() && !killed,
            killed,
            diagnostics,
        };

        if exit.success {
            log::debug!("Encoder finished ({})", exit.status);
        } else if exit.diagnostics.is_empty() {
            log::error!("Encoder exited abnormally ({})", exit.status);
        } else {
            log::error!(
                "Encoder exited abnormally ({}), stderr:\n{}",
                exit.status,
                exit.diagnostics.join("\n")
            );
        }

        self.finished = Some(exit.clone());
        Ok(exit)
    }

    /// Gathers stderr lines until the drain ends, then joins it. A
    /// descendant that inherited stderr can keep the pipe open after the
    /// encoder exits; past `DRAIN_GRACE` the drain is detached instead.
    fn collect_diagnostics(&mut self) -> Vec<String> {
        let mut diagnostics = Vec::new();
        let deadline = Instant::now() + DRAIN_GRACE;
        loop {
            match self.lines.recv_deadline(deadline) {
                Ok(line) => diagnostics.push(line),
                Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => {
                    log::warn!(
                        "Encoder stderr still open {:.1}s after exit, detaching drain",
                        DRAIN_GRACE.as_secs_f64()
                    );
                    self.drain = None;
                    return diagnostics;
                }
            }
        }

        if let Some(drain) = self.drain.take() {
            if drain.join().is_err() {
                log::warn!("Encoder stderr drain panicked");
            }
        }
        diagnostics
    }

    fn wait_with_deadline(&mut self, timeout: Duration) -> Result<(ExitStatus, bool), CaptureError> {
        if let Some(status) = self.exit_status {
            return Ok((status, false));
        }

        // A timeout too large to add to `now` means waiting indefinitely.
        let deadline = Instant::now().checked_add(timeout);
        loop {
            match self.child.try_wait() {
                Ok(Some(status)) => {
                    self.exit_status = Some(status);
                    return Ok((status, false));
                }
                Ok(None) if deadline.is_some_and(|d| Instant::now() >= d) => {
                    log::warn!(
                        "Encoder still running after {:.1}s, killing it",
                        timeout.as_secs_f64()
                    );
                    return self.kill_and_reap();
                }
                Ok(None) => std::thread::sleep(EXIT_POLL_INTERVAL),
                Err(e) => {
                    log::error!("Could not poll encoder: {e}");
                    return self.kill_and_reap();
                }
            }
        }
    }

    fn kill_and_reap(&mut self) -> Result<(ExitStatus, bool), CaptureError> {
        if let Err(e) = self.child.kill() {
            log::error!("Failed to kill encoder (pid {}): {e}", self.child.id());
        }
        let status = self.child.wait().map_err(CaptureError::EncoderWait)?;
        self.exit_status = Some(status);
        Ok((status, true))
    }
}

impl Drop for EncoderProcess {
    fn drop(&mut self) {
        if self.finished.is_none() {
            if let Err(e) = self.close_and_wait(ENCODER_EXIT_TIMEOUT) {
                log::error!("Encoder shutdown failed: {e}");
            }
        }
    }
}

fn spawn_drain(stderr: ChildStderr, line_tx: Sender<String>) -> JoinHandle<()> {
    std::thread::spawn(move || {
        let mut reader = BufReader::new(stderr);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf).trim_end().to_string();
                    if line.is_empty() {
                        continue;
                    }
                    log::trace!("encoder: {line}");
                    if line_tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    log::debug!("Encoder stderr read stopped: {e}");
                    break;
                }
            }
        }
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> EncoderProcess {
        EncoderProcess::spawn(Path::new("sh"), ["-c", script]).unwrap()
    }

    fn wait_for_exit(process: &mut EncoderProcess) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !process.has_exited() {
            assert!(Instant::now() < deadline, "process did not exit");
            std::thread::sleep(Duration::from_millis(10));
        }
    }

    #[test]
    fn test_clean_run() {
        let mut process = sh("cat > /dev/null");
        assert!(!process.has_exited());
        process.write(&[0u8; 16384]).unwrap();
        process.write(&[0u8; 16384]).unwrap();

        let exit = process.close_and_wait(Duration::from_secs(5)).unwrap();
        assert!(exit.success);
        assert!(!exit.killed);
        assert!(process.has_exited());
    }

    #[test]
    fn test_diagnostics_collected_on_failure() {
        let mut process = sh("echo 'first problem' >&2; printf 'bad \\377 byte\\n' >&2; exit 3");
        wait_for_exit(&mut process);

        let exit = process.close_and_wait(Duration::from_secs(5)).unwrap();
        assert!(!exit.success);
        assert_eq!(exit.diagnostics.len(), 2);
        assert_eq!(exit.diagnostics[0], "first problem");
        assert!(exit.diagnostics[1].contains('\u{FFFD}'));
    }

    #[test]
    fn test_write_after_exit_fails() {
        let mut process = sh("exit 0");
        wait_for_exit(&mut process);

        let err = process.write(&[0u8; 1024]).unwrap_err();
        assert!(matches!(err, CaptureError::FrameWrite(_)));
    }

    #[test]
    fn test_write_after_close_fails() {
        let mut process = sh("cat > /dev/null");
        process.close_and_wait(Duration::from_secs(5)).unwrap();

        let err = process.write(&[0u8; 4]).unwrap_err();
        assert!(matches!(err, CaptureError::FrameWrite(_)));
    }

    #[test]
    fn test_timeout_kills_and_joins_drain() {
        let mut process = EncoderProcess::spawn(Path::new("sleep"), ["30"]).unwrap();
        let started = Instant::now();

        let exit = process.close_and_wait(Duration::from_millis(200)).unwrap();

        assert!(exit.killed);
        assert!(!exit.success);
        assert!(process.drain.is_none());
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut process = sh("cat > /dev/null");
        let first = process.close_and_wait(Duration::from_secs(5)).unwrap();
        let second = process.close_and_wait(Duration::from_secs(5)).unwrap();
        assert_eq!(first, second);
        assert!(process.stdin.is_none());
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let result = EncoderProcess::spawn(Path::new("/nonexistent/encoder"), ["-y"]);
        assert!(matches!(result, Err(CaptureError::EncoderSpawn { .. })));
    }

    #[test]
    fn test_unbounded_timeout_waits_normally() {
        let mut process = sh("cat > /dev/null");
        process.write(&[0u8; 64]).unwrap();

        let exit = process
            .close_and_wait(Duration::from_secs(u64::MAX))
            .unwrap();
        assert!(exit.success);
        assert!(!exit.killed);
    }

    #[test]
    fn test_inherited_stderr_does_not_block_close() {
        let mut process = sh("sleep 30 & echo 'spawned helper' >&2");
        let started = Instant::now();

        let exit = process.close_and_wait(Duration::from_secs(5)).unwrap();

        assert!(exit.success);
        assert_eq!(exit.diagnostics, vec!["spawned helper".to_string()]);
        assert!(process.drain.is_none());
        assert!(started.elapsed() < DRAIN_GRACE + Duration::from_secs(5));
    }
}
