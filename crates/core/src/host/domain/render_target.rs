/// A viewport surface frames can be read back from.
///
/// Implementations are driven from the thread that owns rendering, so
/// nothing here is required to be `Send`.
pub trait RenderTarget {
    /// Stable identity used to keep two sessions off the same surface.
    fn id(&self) -> &str;

    /// Current drawable size in pixels.
    fn port_size(&self) -> (u32, u32);

    /// Reads the color buffer as packed RGBA, rows ordered bottom to top.
    fn read_color_buffer(
        &mut self,
        width: u32,
        height: u32,
    ) -> Result<Vec<u8>, Box<dyn std::error::Error>>;

    /// The editor controlling this surface's display toggles, or `None`
    /// when the target is detached or headless.
    fn display_toggles(&mut self) -> Option<&mut dyn DisplayToggles>;
}

/// Named visibility switches on a viewport editor.
pub trait DisplayToggles {
    fn get(&self, name: &str) -> Result<bool, Box<dyn std::error::Error>>;

    fn set(&mut self, name: &str, visible: bool) -> Result<(), Box<dyn std::error::Error>>;
}
