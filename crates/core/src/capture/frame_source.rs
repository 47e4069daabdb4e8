use crate::host::domain::render_target::RenderTarget;
use crate::shared::error::CaptureError;
use crate::shared::frame::{byte_len, Frame};
use crate::shared::view_spec::ViewSpec;

/// Reads finished frames off a render target at a fixed size.
pub struct FrameSource {
    width: u32,
    height: u32,
}

impl FrameSource {
    pub fn new(view: &ViewSpec) -> Self {
        Self {
            width: view.width(),
            height: view.height(),
        }
    }

    /// Bytes per captured frame.
    pub fn frame_len(&self) -> usize {
        byte_len(self.width, self.height)
    }

    /// Reads the current color buffer and returns it top row first.
    pub fn capture(
        &self,
        target: &mut dyn RenderTarget,
        number: i64,
    ) -> Result<Frame, CaptureError> {
        let expected = self.frame_len();
        if expected == 0 {
            return Err(CaptureError::CaptureUnavailable(format!(
                "zero-sized capture {}x{}",
                self.width, self.height
            )));
        }

        let raw = target
            .read_color_buffer(self.width, self.height)
            .map_err(|e| CaptureError::CaptureUnavailable(e.to_string()))?;

        if raw.len() != expected {
            return Err(CaptureError::CaptureUnavailable(format!(
                "color buffer has {} bytes, expected {expected} for {}x{}",
                raw.len(),
                self.width,
                self.height
            )));
        }

        Ok(Frame::from_bottom_up(&raw, self.width, self.height, number))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::domain::render_target::DisplayToggles;
    use crate::shared::display_flags::DisplayFlags;

    struct BufferTarget {
        buffer: Result<Vec<u8>, String>,
        reads: usize,
    }

    impl RenderTarget for BufferTarget {
        fn id(&self) -> &str {
            "buffer"
        }

        fn port_size(&self) -> (u32, u32) {
            (2, 2)
        }

        fn read_color_buffer(
            &mut self,
            _width: u32,
            _height: u32,
        ) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
            self.reads += 1;
            self.buffer.clone().map_err(|e| e.into())
        }

        fn display_toggles(&mut self) -> Option<&mut dyn DisplayToggles> {
            None
        }
    }

    fn view(w: u32, h: u32) -> ViewSpec {
        ViewSpec::new(w, h, DisplayFlags::default()).unwrap()
    }

    #[test]
    fn test_capture_flips_to_top_down() {
        let mut raw = vec![0u8; 16];
        raw[8..].fill(200); // bottom row in readback order
        let mut target = BufferTarget {
            buffer: Ok(raw),
            reads: 0,
        };

        let frame = FrameSource::new(&view(2, 2)).capture(&mut target, 12).unwrap();

        assert_eq!(frame.number(), 12);
        assert_eq!(frame.data().len(), 16);
        assert!(frame.data()[..8].iter().all(|&b| b == 200));
        assert!(frame.data()[8..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_wrong_size_buffer_is_unavailable() {
        let mut target = BufferTarget {
            buffer: Ok(vec![0u8; 12]),
            reads: 0,
        };
        let err = FrameSource::new(&view(2, 2))
            .capture(&mut target, 0)
            .unwrap_err();
        assert!(matches!(err, CaptureError::CaptureUnavailable(_)));
    }

    #[test]
    fn test_readback_error_is_unavailable() {
        let mut target = BufferTarget {
            buffer: Err("view destroyed".to_string()),
            reads: 0,
        };
        let err = FrameSource::new(&view(2, 2))
            .capture(&mut target, 0)
            .unwrap_err();
        assert!(err.to_string().contains("view destroyed"));
    }

    #[test]
    fn test_every_capture_reads_fresh() {
        let mut target = BufferTarget {
            buffer: Ok(vec![0u8; 16]),
            reads: 0,
        };
        let source = FrameSource::new(&view(2, 2));
        source.capture(&mut target, 0).unwrap();
        source.capture(&mut target, 1).unwrap();
        assert_eq!(target.reads, 2);
    }

    #[test]
    fn test_frame_len() {
        assert_eq!(FrameSource::new(&view(64, 64)).frame_len(), 16384);
    }
}
