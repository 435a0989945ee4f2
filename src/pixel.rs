use crate::{
    error::{XShotError, XShotResult},
    raster::{BYTES_PER_PIXEL, Raster},
    rect::Rect,
};

pub const OPAQUE_BLACK: [u8; 4] = [0, 0, 0, 255];

/// Writes one server pixel (blue, green, red, pad) as red, green, blue and
/// full alpha. `src` needs at least 3 bytes, `dst` at least 4.
#[inline]
pub fn bgrx_to_rgba(src: &[u8], dst: &mut [u8]) {
    dst[0] = src[2];
    dst[1] = src[1];
    dst[2] = src[0];
    dst[3] = 255;
}

/// Paints every visible pixel with opaque black; row padding is left alone.
pub fn fill_opaque_black(raster: &mut Raster) {
    let row_bytes = raster.width() as usize * BYTES_PER_PIXEL;
    let stride = raster.stride();
    let height = raster.height() as usize;
    if row_bytes == 0 {
        return;
    }

    for row in raster.as_bytes_mut().chunks_exact_mut(stride).take(height) {
        for px in row[..row_bytes].chunks_exact_mut(BYTES_PER_PIXEL) {
            px.copy_from_slice(&OPAQUE_BLACK);
        }
    }
}

/// Copies `raw`, the server bytes for `transfer`, into `raster` whose top-left
/// corner sits at `origin`. `transfer` and `origin` are in virtual-desktop
/// coordinates and `transfer` must lie inside the raster.
pub fn blit(
    raw: &[u8],
    transfer: Rect,
    origin: (i32, i32),
    raster: &mut Raster,
) -> XShotResult<()> {
    if transfer.is_empty() {
        return Ok(());
    }

    let src_row_bytes = transfer.width() as usize * BYTES_PER_PIXEL;
    let expected = src_row_bytes * transfer.height() as usize;
    if raw.len() < expected {
        return Err(XShotError::protocol(format!(
            "image data too short: got {} bytes, expected {expected}",
            raw.len()
        )));
    }

    let dst_col = (transfer.min_x - origin.0) as usize * BYTES_PER_PIXEL;
    let dst_row = (transfer.min_y - origin.1) as usize;
    let stride = raster.stride();
    let pixels = raster.as_bytes_mut();

    for (row, src) in raw[..expected].chunks_exact(src_row_bytes).enumerate() {
        let start = (dst_row + row) * stride + dst_col;
        let dst = &mut pixels[start..start + src_row_bytes];

        for (src_px, dst_px) in src
            .chunks_exact(BYTES_PER_PIXEL)
            .zip(dst.chunks_exact_mut(BYTES_PER_PIXEL))
        {
            bgrx_to_rgba(src_px, dst_px);
        }
    }

    Ok(())
}
