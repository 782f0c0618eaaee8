//! Raster pixel model and the packed-buffer codec.
//!
//! The engine hands `raster` callbacks a buffer of `width * height` packed
//! 32-bit colours. The buffer is consumed in column-major order: the outer
//! iteration advances the column index, the inner one the row index. The
//! engine renders captures back out in the same order, so the traversal must
//! not be "fixed" to row-major; transposing it corrupts output silently.

use crate::errors::DeviceError;

/// One packed pixel colour, decomposed into channels.
///
/// The packed layout is the engine's: red in the low byte, then green, blue
/// and alpha.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Color {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub alpha: u8,
}

impl Color {
    pub const TRANSPARENT: Color = Color {
        red: 255,
        green: 255,
        blue: 255,
        alpha: 0,
    };

    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    /// Opaque colour from channel values.
    pub const fn rgb(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red,
            green,
            blue,
            alpha: 255,
        }
    }

    pub fn from_packed(value: u32) -> Self {
        Self {
            red: (value & 0xff) as u8,
            green: ((value >> 8) & 0xff) as u8,
            blue: ((value >> 16) & 0xff) as u8,
            alpha: ((value >> 24) & 0xff) as u8,
        }
    }

    pub fn to_packed(self) -> u32 {
        u32::from(self.red)
            | u32::from(self.green) << 8
            | u32::from(self.blue) << 16
            | u32::from(self.alpha) << 24
    }

    pub fn is_opaque(self) -> bool {
        self.alpha == 255
    }
}

/// A width x height pixel grid addressed by `(column, row)`.
///
/// Built fresh for each `raster` callback and for each `cap` capture; never
/// aliases engine memory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Raster {
    width: usize,
    height: usize,
    // Stored in decode order: column-major, `column * height + row`.
    pixels: Vec<Color>,
}

impl Raster {
    /// A fully transparent grid.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![Color::TRANSPARENT; width * height],
        }
    }

    /// Decode a packed pixel buffer.
    ///
    /// Fails unless `packed.len() == width * height`.
    pub fn from_packed(width: usize, height: usize, packed: &[u32]) -> Result<Self, DeviceError> {
        if packed.len() != width * height {
            return Err(DeviceError::RasterSizeMismatch {
                width,
                height,
                actual: packed.len(),
            });
        }

        let mut raster = Raster::new(width, height);
        let mut cursor = 0;
        // Column-major: outer over columns, inner over rows. This matches
        // the engine's buffer order exactly.
        for column in 0..width {
            for row in 0..height {
                raster.set(column, row, Color::from_packed(packed[cursor]));
                cursor += 1;
            }
        }
        Ok(raster)
    }

    /// Encode back into the engine's packed buffer order. Inverse of
    /// [`Raster::from_packed`]; used when a capture is handed back to the
    /// engine.
    pub fn to_packed(&self) -> Vec<u32> {
        self.pixels.iter().map(|color| color.to_packed()).collect()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, column: usize, row: usize) -> Color {
        self.pixels[self.index(column, row)]
    }

    pub fn set(&mut self, column: usize, row: usize, color: Color) {
        let index = self.index(column, row);
        self.pixels[index] = color;
    }

    fn index(&self, column: usize, row: usize) -> usize {
        assert!(column < self.width && row < self.height, "pixel out of bounds");
        column * self.height + row
    }
}
