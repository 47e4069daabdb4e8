use std::path::{Path, PathBuf};

use crate::host::domain::timeline::Timeline;
use crate::shared::constants::{DEFAULT_CODEC, DEFAULT_QUALITY, MAX_QUALITY, MIN_QUALITY};
use crate::shared::error::CaptureError;

/// What to record and how to encode it. Immutable once built.
#[derive(Clone, Debug, PartialEq)]
pub struct CaptureConfig {
    output_path: PathBuf,
    codec: String,
    quality: i32,
    start_frame: i64,
    end_frame: i64,
    frame_rate: u32,
}

impl CaptureConfig {
    pub fn builder(output_path: impl Into<PathBuf>) -> CaptureConfigBuilder {
        CaptureConfigBuilder::new(output_path.into())
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn codec(&self) -> &str {
        &self.codec
    }

    pub fn quality(&self) -> i32 {
        self.quality
    }

    pub fn start_frame(&self) -> i64 {
        self.start_frame
    }

    pub fn end_frame(&self) -> i64 {
        self.end_frame
    }

    pub fn frame_rate(&self) -> u32 {
        self.frame_rate
    }

    pub fn frame_count(&self) -> usize {
        span(self.start_frame, self.end_frame).unwrap_or(0)
    }

    /// Checks every field invariant. Run by the builder; callers holding a
    /// built config never see it fail.
    pub fn validate(&self) -> Result<(), CaptureError> {
        validate_quality(self.quality)?;
        if self.end_frame < self.start_frame {
            return Err(CaptureError::InvalidConfig(format!(
                "end frame {} is before start frame {}",
                self.end_frame, self.start_frame
            )));
        }
        if span(self.start_frame, self.end_frame).is_none() {
            return Err(CaptureError::InvalidConfig(format!(
                "frame range [{}, {}] is too long",
                self.start_frame, self.end_frame
            )));
        }
        if self.frame_rate == 0 {
            return Err(CaptureError::InvalidConfig(
                "frame rate must be positive".to_string(),
            ));
        }
        if self.codec.trim().is_empty() {
            return Err(CaptureError::InvalidConfig("codec is empty".to_string()));
        }
        Ok(())
    }
}

/// Inclusive frame count, or `None` when it does not fit in a `usize`.
fn span(start: i64, end: i64) -> Option<usize> {
    let last = end.checked_sub(start)?;
    usize::try_from(last).ok()?.checked_add(1)
}

pub fn validate_quality(quality: i32) -> Result<(), CaptureError> {
    if quality < MIN_QUALITY as i32 || quality > MAX_QUALITY as i32 {
        return Err(CaptureError::InvalidConfig(format!(
            "quality must be between {MIN_QUALITY} and {MAX_QUALITY}, got {quality}"
        )));
    }
    Ok(())
}

/// Collects the optional parts of a capture request; anything left unset
/// is read from the host timeline in [`CaptureConfigBuilder::build`].
#[derive(Clone, Debug)]
pub struct CaptureConfigBuilder {
    output_path: PathBuf,
    codec: String,
    quality: i32,
    start_frame: Option<i64>,
    end_frame: Option<i64>,
    frame_rate: Option<u32>,
}

impl CaptureConfigBuilder {
    fn new(output_path: PathBuf) -> Self {
        Self {
            output_path,
            codec: DEFAULT_CODEC.to_string(),
            quality: DEFAULT_QUALITY as i32,
            start_frame: None,
            end_frame: None,
            frame_rate: None,
        }
    }

    pub fn codec(mut self, codec: impl Into<String>) -> Self {
        self.codec = codec.into();
        self
    }

    pub fn quality(mut self, quality: i32) -> Self {
        self.quality = quality;
        self
    }

    pub fn start_frame(mut self, frame: Option<i64>) -> Self {
        self.start_frame = frame;
        self
    }

    pub fn end_frame(mut self, frame: Option<i64>) -> Self {
        self.end_frame = frame;
        self
    }

    pub fn frame_rate(mut self, fps: Option<u32>) -> Self {
        self.frame_rate = fps;
        self
    }

    pub fn build(self, timeline: &dyn Timeline) -> Result<CaptureConfig, CaptureError> {
        validate_quality(self.quality)?;

        if self.output_path.exists() {
            return Err(CaptureError::InvalidConfig(format!(
                "output {} already exists",
                self.output_path.display()
            )));
        }

        let config = CaptureConfig {
            output_path: self.output_path,
            codec: self.codec,
            quality: self.quality,
            start_frame: self
                .start_frame
                .unwrap_or_else(|| timeline.animation_start()),
            end_frame: self.end_frame.unwrap_or_else(|| timeline.animation_end()),
            frame_rate: self.frame_rate.unwrap_or_else(|| timeline.frame_rate()),
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    struct FixedTimeline {
        start: i64,
        end: i64,
        fps: u32,
    }

    impl Timeline for FixedTimeline {
        fn animation_start(&self) -> i64 {
            self.start
        }

        fn animation_end(&self) -> i64 {
            self.end
        }

        fn frame_rate(&self) -> u32 {
            self.fps
        }

        fn set_current_time(&mut self, _frame: i64) -> Result<(), Box<dyn std::error::Error>> {
            Ok(())
        }
    }

    fn timeline() -> FixedTimeline {
        FixedTimeline {
            start: 1,
            end: 120,
            fps: 24,
        }
    }

    fn out_path() -> PathBuf {
        std::env::temp_dir().join("playcast-config-test-never-created.mp4")
    }

    #[rstest]
    #[case::lossless(0)]
    #[case::default(24)]
    #[case::worst(51)]
    fn test_quality_in_range_accepted(#[case] quality: i32) {
        let config = CaptureConfig::builder(out_path())
            .quality(quality)
            .build(&timeline())
            .unwrap();
        assert_eq!(config.quality(), quality);
    }

    #[rstest]
    #[case::negative(-1)]
    #[case::above_max(52)]
    #[case::far_above(100)]
    fn test_quality_out_of_range_rejected(#[case] quality: i32) {
        let err = CaptureConfig::builder(out_path())
            .quality(quality)
            .build(&timeline())
            .unwrap_err();
        assert!(matches!(err, CaptureError::InvalidConfig(_)));
    }

    #[test]
    fn test_unset_fields_resolved_from_timeline() {
        let config = CaptureConfig::builder(out_path()).build(&timeline()).unwrap();
        assert_eq!(config.start_frame(), 1);
        assert_eq!(config.end_frame(), 120);
        assert_eq!(config.frame_rate(), 24);
        assert_eq!(config.codec(), DEFAULT_CODEC);
        assert_eq!(config.quality(), DEFAULT_QUALITY as i32);
    }

    #[test]
    fn test_explicit_fields_win_over_timeline() {
        let config = CaptureConfig::builder(out_path())
            .codec("libx265")
            .start_frame(Some(10))
            .end_frame(Some(20))
            .frame_rate(Some(60))
            .build(&timeline())
            .unwrap();
        assert_eq!(config.codec(), "libx265");
        assert_eq!(config.start_frame(), 10);
        assert_eq!(config.end_frame(), 20);
        assert_eq!(config.frame_rate(), 60);
    }

    #[rstest]
    #[case::single_frame(1, 1, 1)]
    #[case::five_frames(0, 4, 5)]
    #[case::negative_start(-10, 10, 21)]
    fn test_frame_count(#[case] start: i64, #[case] end: i64, #[case] expected: usize) {
        let config = CaptureConfig::builder(out_path())
            .start_frame(Some(start))
            .end_frame(Some(end))
            .build(&timeline())
            .unwrap();
        assert_eq!(config.frame_count(), expected);
    }

    #[rstest]
    #[case::full_i64_range(i64::MIN, i64::MAX)]
    #[case::negative_to_max(-1, i64::MAX)]
    fn test_overlong_range_rejected(#[case] start: i64, #[case] end: i64) {
        let err = CaptureConfig::builder(out_path())
            .start_frame(Some(start))
            .end_frame(Some(end))
            .build(&timeline())
            .unwrap_err();
        assert!(matches!(err, CaptureError::InvalidConfig(_)));
    }

    #[test]
    fn test_inverted_range_rejected() {
        let err = CaptureConfig::builder(out_path())
            .start_frame(Some(10))
            .end_frame(Some(5))
            .build(&timeline())
            .unwrap_err();
        assert!(matches!(err, CaptureError::InvalidConfig(_)));
    }

    #[test]
    fn test_zero_frame_rate_rejected() {
        let err = CaptureConfig::builder(out_path())
            .frame_rate(Some(0))
            .build(&timeline())
            .unwrap_err();
        assert!(matches!(err, CaptureError::InvalidConfig(_)));
    }

    #[test]
    fn test_existing_output_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("taken.mp4");
        std::fs::write(&path, b"").unwrap();

        let err = CaptureConfig::builder(path.clone()).build(&timeline()).unwrap_err();
        assert!(matches!(err, CaptureError::InvalidConfig(_)));
    }
}
