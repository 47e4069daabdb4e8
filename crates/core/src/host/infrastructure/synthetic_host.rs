use std::cell::Cell;
use std::collections::BTreeMap;
use std::error::Error;
use std::rc::Rc;

use crate::host::domain::render_target::{DisplayToggles, RenderTarget};
use crate::host::domain::timeline::Timeline;
use crate::shared::display_flags::DisplayFlags;
use crate::shared::frame::{byte_len, flip_rows};

const BAR_STEP: u32 = 4;
const GRID_SPACING: u32 = 16;
const BACKGROUND_BLUE: u8 = 64;
const GRID_COLOR: [u8; 4] = [128, 128, 128, 255];
const BAR_COLOR: [u8; 4] = [255, 255, 255, 255];

/// In-process stand-in for a 3D application's scene.
///
/// The timeline and the viewport share one clock so that moving the
/// timeline changes what the viewport renders next.
pub fn synthetic_scene(
    id: &str,
    start: i64,
    end: i64,
    frame_rate: u32,
    width: u32,
    height: u32,
) -> (SyntheticTimeline, SyntheticViewport) {
    let clock = Rc::new(Cell::new(start));
    let timeline = SyntheticTimeline {
        start,
        end,
        frame_rate,
        clock: clock.clone(),
    };
    let viewport = SyntheticViewport::new(id, width, height, clock);
    (timeline, viewport)
}

pub struct SyntheticTimeline {
    start: i64,
    end: i64,
    frame_rate: u32,
    clock: Rc<Cell<i64>>,
}

impl SyntheticTimeline {
    pub fn current_time(&self) -> i64 {
        self.clock.get()
    }
}

impl Timeline for SyntheticTimeline {
    fn animation_start(&self) -> i64 {
        self.start
    }

    fn animation_end(&self) -> i64 {
        self.end
    }

    fn frame_rate(&self) -> u32 {
        self.frame_rate
    }

    fn set_current_time(&mut self, frame: i64) -> Result<(), Box<dyn Error>> {
        self.clock.set(frame);
        Ok(())
    }
}

/// Renders a gradient with a vertical bar that moves with the clock.
///
/// Every catalog toggle starts visible. Only `grid` changes the picture:
/// while it is visible, grid lines are drawn over the gradient.
pub struct SyntheticViewport {
    id: String,
    width: u32,
    height: u32,
    clock: Rc<Cell<i64>>,
    toggles: BTreeMap<String, bool>,
    headless: bool,
}

impl SyntheticViewport {
    fn new(id: &str, width: u32, height: u32, clock: Rc<Cell<i64>>) -> Self {
        let toggles = DisplayFlags::catalog()
            .iter()
            .map(|flag| (flag.name.clone(), true))
            .collect();
        Self {
            id: id.to_string(),
            width,
            height,
            clock,
            toggles,
            headless: false,
        }
    }

    /// Drops the display editor and readback, like a batch session with
    /// no interactive viewport.
    pub fn headless(mut self) -> Self {
        self.headless = true;
        self
    }

    pub fn toggle(&self, name: &str) -> Option<bool> {
        self.toggles.get(name).copied()
    }

    /// Pixel bytes of one frame, top row first.
    fn render(&self, width: u32, height: u32) -> Vec<u8> {
        let frame = self.clock.get();
        let bar_x = (frame.rem_euclid(i64::from(width.max(1))) as u32 * BAR_STEP) % width.max(1);
        let grid = self.toggle("grid").unwrap_or(false);

        let mut data = Vec::with_capacity(byte_len(width, height));
        for y in 0..height {
            for x in 0..width {
                let pixel = if x == bar_x {
                    BAR_COLOR
                } else if grid && (x % GRID_SPACING == 0 || y % GRID_SPACING == 0) {
                    GRID_COLOR
                } else {
                    [
                        (x * 255 / width.max(2).saturating_sub(1)) as u8,
                        (y * 255 / height.max(2).saturating_sub(1)) as u8,
                        BACKGROUND_BLUE,
                        255,
                    ]
                };
                data.extend_from_slice(&pixel);
            }
        }
        data
    }
}

impl RenderTarget for SyntheticViewport {
    fn id(&self) -> &str {
        &self.id
    }

    fn port_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn read_color_buffer(&mut self, width: u32, height: u32) -> Result<Vec<u8>, Box<dyn Error>> {
        if self.headless {
            return Err(format!("viewport '{}' has no color buffer", self.id).into());
        }
        let top_down = self.render(width, height);
        Ok(flip_rows(&top_down, width, height))
    }

    fn display_toggles(&mut self) -> Option<&mut dyn DisplayToggles> {
        if self.headless {
            None
        } else {
            Some(self)
        }
    }
}

impl DisplayToggles for SyntheticViewport {
    fn get(&self, name: &str) -> Result<bool, Box<dyn Error>> {
        self.toggle(name)
            .ok_or_else(|| format!("unknown display toggle '{name}'").into())
    }

    fn set(&mut self, name: &str, visible: bool) -> Result<(), Box<dyn Error>> {
        match self.toggles.get_mut(name) {
            Some(value) => {
                *value = visible;
                Ok(())
            }
            None => Err(format!("unknown display toggle '{name}'").into()),
        }
    }
}
