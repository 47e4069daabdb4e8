/// Read access to the host's playback settings plus the one write the
/// capture loop needs: moving the current time.
pub trait Timeline {
    fn animation_start(&self) -> i64;

    fn animation_end(&self) -> i64;

    /// Playback rate in whole frames per second.
    fn frame_rate(&self) -> u32;

    /// Moves the scene to `frame` so the next readback shows it.
    fn set_current_time(&mut self, frame: i64) -> Result<(), Box<dyn std::error::Error>>;
}
