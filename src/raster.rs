//! Fixed-size 8-bit grayscale raster shared by every codec.
//!
//! Samples are stored row-major (stride == width). The dimensions are fixed
//! at 512x512; any other shape is rejected at construction, so a `Raster`
//! reaching a codec is always valid.

use crate::error::{CodecError, Result};

pub const WIDTH: usize = 512;
pub const HEIGHT: usize = 512;
pub const PIXEL_COUNT: usize = WIDTH * HEIGHT;

#[derive(Clone, PartialEq, Eq)]
pub struct Raster {
    pixels: Vec<u8>,
}

impl Raster {
    /// Build a raster from a row-major buffer of `width * height` samples.
    pub fn new(width: usize, height: usize, pixels: Vec<u8>) -> Result<Self> {
        if width != WIDTH || height != HEIGHT {
            return Err(CodecError::UnsupportedImageSize { width, height });
        }
        Self::from_raw_bytes(pixels)
    }

    /// A raster with every sample set to `value`.
    pub fn filled(value: u8) -> Self {
        Self {
            pixels: vec![value; PIXEL_COUNT],
        }
    }

    pub fn zeros() -> Self {
        Self::filled(0)
    }

    /// Build from nested rows, checking both the row count and every row width.
    pub fn from_rows<R: AsRef<[u8]>>(rows: &[R]) -> Result<Self> {
        let height = rows.len();
        if let Some(width) = rows.iter().map(|r| r.as_ref().len()).find(|&w| w != WIDTH) {
            return Err(CodecError::UnsupportedImageSize { width, height });
        }
        if height != HEIGHT {
            return Err(CodecError::UnsupportedImageSize {
                width: WIDTH,
                height,
            });
        }
        let mut pixels = Vec::with_capacity(PIXEL_COUNT);
        for row in rows {
            pixels.extend_from_slice(row.as_ref());
        }
        Ok(Self { pixels })
    }

    /// Import a headerless `.gray` buffer: exactly one byte per pixel, row-major.
    pub fn from_raw_bytes(pixels: Vec<u8>) -> Result<Self> {
        match pixels.len() {
            n if n < PIXEL_COUNT => Err(CodecError::TruncatedData {
                expected: PIXEL_COUNT,
                actual: n,
            }),
            n if n > PIXEL_COUNT => Err(CodecError::Overrun(format!(
                "{n} samples for a {WIDTH}x{HEIGHT} raster"
            ))),
            _ => Ok(Self { pixels }),
        }
    }

    pub fn into_raw_bytes(self) -> Vec<u8> {
        self.pixels
    }

    #[inline]
    pub fn width(&self) -> usize {
        WIDTH
    }

    #[inline]
    pub fn height(&self) -> usize {
        HEIGHT
    }

    #[inline]
    /// Convert (x, y) to a linear index; panics if either coordinate is out of range.
    fn idx(x: usize, y: usize) -> usize {
        assert!(
            x < WIDTH && y < HEIGHT,
            "({x}, {y}) outside {WIDTH}x{HEIGHT} raster"
        );
        y * WIDTH + x
    }

    #[inline]
    /// Get the sample at (x, y).
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.pixels[Self::idx(x, y)]
    }

    #[inline]
    /// Set the sample at (x, y).
    pub fn set(&mut self, x: usize, y: usize, value: u8) {
        self.pixels[Self::idx(x, y)] = value;
    }

    #[inline]
    pub fn row(&self, y: usize) -> &[u8] {
        let start = y * WIDTH;
        &self.pixels[start..start + WIDTH]
    }

    #[inline]
    /// All samples in row-major order.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Occurrence count of every intensity value.
    pub fn histogram(&self) -> [u32; 256] {
        let mut freq = [0u32; 256];
        for &v in &self.pixels {
            freq[v as usize] += 1;
        }
        freq
    }
}

impl std::fmt::Debug for Raster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let distinct = self.histogram().iter().filter(|&&c| c > 0).count();
        f.debug_struct("Raster")
            .field("width", &WIDTH)
            .field("height", &HEIGHT)
            .field("distinct_values", &distinct)
            .finish()
    }
}
