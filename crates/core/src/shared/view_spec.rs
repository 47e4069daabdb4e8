use crate::host::domain::render_target::RenderTarget;
use crate::shared::display_flags::DisplayFlags;
use crate::shared::error::CaptureError;

/// Pixel size of the capture and the display toggles it manages.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewSpec {
    width: u32,
    height: u32,
    display_flags: DisplayFlags,
}

impl ViewSpec {
    pub fn new(width: u32, height: u32, display_flags: DisplayFlags) -> Result<Self, CaptureError> {
        if width == 0 || height == 0 {
            return Err(CaptureError::InvalidConfig(format!(
                "capture size must be positive, got {width}x{height}"
            )));
        }
        Ok(Self {
            width,
            height,
            display_flags,
        })
    }

    /// Sizes the capture after `target`, overriding either dimension when
    /// given, with a fresh copy of the default flag catalog.
    pub fn for_target(
        target: &dyn RenderTarget,
        width: Option<u32>,
        height: Option<u32>,
    ) -> Result<Self, CaptureError> {
        let (port_w, port_h) = target.port_size();
        Self::new(
            width.unwrap_or(port_w),
            height.unwrap_or(port_h),
            DisplayFlags::catalog(),
        )
    }

    pub fn with_display_flags(mut self, display_flags: DisplayFlags) -> Self {
        self.display_flags = display_flags;
        self
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn display_flags(&self) -> &DisplayFlags {
        &self.display_flags
    }

    /// Size in the `WxH` form the encoder expects.
    pub fn size_arg(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::domain::render_target::DisplayToggles;

    struct FixedTarget(u32, u32);

    impl RenderTarget for FixedTarget {
        fn id(&self) -> &str {
            "fixed"
        }

        fn port_size(&self) -> (u32, u32) {
            (self.0, self.1)
        }

        fn read_color_buffer(
            &mut self,
            _width: u32,
            _height: u32,
        ) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
            Err("not used".into())
        }

        fn display_toggles(&mut self) -> Option<&mut dyn DisplayToggles> {
            None
        }
    }

    #[test]
    fn test_defaults_from_target() {
        let spec = ViewSpec::for_target(&FixedTarget(640, 360), None, None).unwrap();
        assert_eq!(spec.width(), 640);
        assert_eq!(spec.height(), 360);
        assert_eq!(spec.display_flags(), &DisplayFlags::catalog());
    }

    #[test]
    fn test_explicit_size_overrides_target() {
        let spec = ViewSpec::for_target(&FixedTarget(640, 360), Some(1280), None).unwrap();
        assert_eq!(spec.width(), 1280);
        assert_eq!(spec.height(), 360);
    }

    #[test]
    fn test_zero_size_is_invalid() {
        let err = ViewSpec::for_target(&FixedTarget(0, 360), None, None).unwrap_err();
        assert!(matches!(err, CaptureError::InvalidConfig(_)));
    }

    #[test]
    fn test_size_arg() {
        let spec = ViewSpec::new(64, 48, DisplayFlags::default()).unwrap();
        assert_eq!(spec.size_arg(), "64x48");
    }
}
