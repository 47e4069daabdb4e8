use std::time::Instant;

/// Throttled progress output for a capture run plus an end-of-run
/// throughput summary.
///
/// Meant to be wired to a session's progress observer; logging every
/// frame of a long shot floods the terminal, so only every
/// `throttle_frames`-th frame and the last one are reported.
pub struct ProgressLogger {
    throttle_frames: usize,
    total_frames: usize,
    frames_done: usize,
    start_time: Instant,
}

impl ProgressLogger {
    pub fn new(total_frames: usize, throttle_frames: usize) -> Self {
        Self {
            throttle_frames: throttle_frames.max(1),
            total_frames,
            frames_done: 0,
            start_time: Instant::now(),
        }
    }

    /// Records that `done` frames have reached the encoder.
    pub fn progress(&mut self, done: usize) {
        self.frames_done = done;
        if self.should_report(done) {
            let pct = done as f64 / self.total_frames as f64 * 100.0;
            log::info!("Capturing: {done}/{} frames ({pct:.1}%)", self.total_frames);
        }
    }

    fn should_report(&self, done: usize) -> bool {
        self.total_frames > 0 && (done % self.throttle_frames == 0 || done == self.total_frames)
    }

    pub fn frames_done(&self) -> usize {
        self.frames_done
    }

    /// Returns the formatted summary, or `None` if no frame was written.
    pub fn summary_string(&self) -> Option<String> {
        if self.frames_done == 0 {
            return None;
        }

        let elapsed = self.start_time.elapsed().as_secs_f64();
        let mut lines = vec![format!(
            "Capture summary ({}/{} frames, {elapsed:.1}s total):",
            self.frames_done, self.total_frames
        )];

        let missing = self.total_frames.saturating_sub(self.frames_done);
        if missing > 0 {
            lines.push(format!("  Missing frames: {missing}"));
        }
        if elapsed > 0.0 {
            let fps = self.frames_done as f64 / elapsed;
            lines.push(format!("  Throughput: {fps:.1} fps"));
        }

        Some(lines.join("\n"))
    }

    pub fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}

impl Default for ProgressLogger {
    fn default() -> Self {
        Self::new(0, 10)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_tracks_latest_count() {
        let mut logger = ProgressLogger::new(20, 10);
        for i in 1..=20 {
            logger.progress(i);
        }
        assert_eq!(logger.frames_done(), 20);
    }

    #[test]
    fn test_throttle() {
        let logger = ProgressLogger::new(25, 10);
        assert!(!logger.should_report(9));
        assert!(logger.should_report(10));
        assert!(logger.should_report(20));
        assert!(logger.should_report(25));
    }

    #[test]
    fn test_zero_throttle_clamped() {
        let logger = ProgressLogger::new(5, 0);
        assert_eq!(logger.throttle_frames, 1);
        assert!(logger.should_report(3));
    }

    #[test]
    fn test_empty_summary_returns_none() {
        let logger = ProgressLogger::new(10, 10);
        assert!(logger.summary_string().is_none());
    }

    #[test]
    fn test_summary_reports_counts_and_fps() {
        let mut logger = ProgressLogger::new(10, 10);
        logger.progress(10);
        std::thread::sleep(std::time::Duration::from_millis(5));

        let summary = logger.summary_string().unwrap();
        assert!(summary.contains("Capture summary (10/10 frames"));
        assert!(summary.contains("fps"));
        assert!(!summary.contains("Missing"));
    }

    #[test]
    fn test_summary_reports_missing_frames() {
        let mut logger = ProgressLogger::new(10, 10);
        logger.progress(7);
        let summary = logger.summary_string().unwrap();
        assert!(summary.contains("Missing frames: 3"));
    }

    #[test]
    fn test_default_throttle() {
        let logger = ProgressLogger::default();
        assert_eq!(logger.throttle_frames, 10);
    }
}
