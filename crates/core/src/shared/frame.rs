use crate::shared::constants::BYTES_PER_PIXEL;

/// One captured viewport frame: RGBA bytes, rows ordered top to bottom.
///
/// Produced fresh for every capture and handed to the encoder by
/// reference; nothing holds on to it afterwards.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    number: i64,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, number: i64) -> Self {
        debug_assert_eq!(
            data.len(),
            byte_len(width, height),
            "data length must equal width * height * 4"
        );
        Self { data, number }
    }

    /// Builds a frame from a buffer whose rows run bottom to top, as GL
    /// style readback delivers them.
    pub fn from_bottom_up(data: &[u8], width: u32, height: u32, number: i64) -> Self {
        Self::new(flip_rows(data, width, height), width, height, number)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Host frame number this image was captured at.
    pub fn number(&self) -> i64 {
        self.number
    }
}

pub fn byte_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * BYTES_PER_PIXEL
}

/// Reverses row order of a packed RGBA buffer.
pub fn flip_rows(data: &[u8], width: u32, height: u32) -> Vec<u8> {
    let stride = width as usize * BYTES_PER_PIXEL;
    if stride == 0 {
        return Vec::new();
    }
    let mut out = Vec::with_capacity(data.len());
    for row in data.chunks_exact(stride).rev().take(height as usize) {
        out.extend_from_slice(row);
    }
    out
}
