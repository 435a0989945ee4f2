use image::RgbaImage;

use crate::error::{XShotError, XShotResult};

pub const BYTES_PER_PIXEL: usize = 4;

/// Top-left origin RGBA buffer. Rows may carry padding past `width * 4`
/// bytes, so always walk rows with [`Raster::stride`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    stride: usize,
    pixels: Vec<u8>,
}

impl Raster {
    /// Allocates a zeroed raster with the given row stride in bytes.
    pub fn new(width: u32, height: u32, stride: usize) -> XShotResult<Raster> {
        let row_bytes = width as usize * BYTES_PER_PIXEL;
        if stride < row_bytes {
            return Err(XShotError::invalid_argument(format!(
                "stride {stride} is smaller than row width {row_bytes}"
            )));
        }

        let len = stride
            .checked_mul(height as usize)
            .ok_or_else(|| XShotError::resource("raster size overflows"))?;

        Ok(Raster {
            width,
            height,
            stride,
            pixels: vec![0u8; len],
        })
    }

    /// Wraps an existing buffer, e.g. one handed out by a foreign allocator.
    pub fn from_vec(
        width: u32,
        height: u32,
        stride: usize,
        pixels: Vec<u8>,
    ) -> XShotResult<Raster> {
        let row_bytes = width as usize * BYTES_PER_PIXEL;
        let needed = stride.checked_mul(height as usize);
        if stride < row_bytes || needed.is_none_or(|needed| pixels.len() < needed) {
            return Err(XShotError::invalid_argument("buffer not big enough"));
        }

        Ok(Raster {
            width,
            height,
            stride,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Raw bytes including row padding.
    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    pub(crate) fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    /// The visible bytes of row `y`, without padding.
    pub fn row(&self, y: u32) -> Option<&[u8]> {
        if y >= self.height {
            return None;
        }
        let start = y as usize * self.stride;
        self.pixels
            .get(start..start + self.width as usize * BYTES_PER_PIXEL)
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width {
            return None;
        }
        let start = x as usize * BYTES_PER_PIXEL;
        let px = self.row(y)?.get(start..start + BYTES_PER_PIXEL)?;

        Some([px[0], px[1], px[2], px[3]])
    }

    /// Copies into an [`RgbaImage`], dropping any row padding.
    pub fn to_rgba_image(&self) -> XShotResult<RgbaImage> {
        let row_bytes = self.width as usize * BYTES_PER_PIXEL;
        let mut buf = Vec::with_capacity(row_bytes * self.height as usize);
        if row_bytes > 0 {
            for row in self.pixels.chunks_exact(self.stride).take(self.height as usize) {
                buf.extend_from_slice(&row[..row_bytes]);
            }
        }

        RgbaImage::from_raw(self.width, self.height, buf)
            .ok_or_else(|| XShotError::InternalFault("RgbaImage::from_raw failed".into()))
    }
}

/// Factory for destination rasters.
pub trait RasterAllocator {
    fn allocate(&self, width: u32, height: u32) -> XShotResult<Raster>;
}

/// Rows packed back to back, stride `width * 4`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PackedAllocator;

impl RasterAllocator for PackedAllocator {
    fn allocate(&self, width: u32, height: u32) -> XShotResult<Raster> {
        Raster::new(width, height, width as usize * BYTES_PER_PIXEL)
    }
}
