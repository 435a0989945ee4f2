mod sysv_shm;
mod xorg_backend;

pub use sysv_shm::{SysVMapping, SysVShm};
pub use xorg_backend::XcbBackend;

use crate::{
    capture::connect_and_capture,
    config::CaptureConfig,
    connection::ConnectionManager,
    error::XShotResult,
    layout::{DisplayLayout, bounds_of, count_displays, query_layout},
    raster::{PackedAllocator, Raster},
    rect::Rect,
};

static CONNECTION: ConnectionManager<XcbBackend> = ConnectionManager::new();

/// The process-wide display connection, opened on first use.
pub fn connection() -> XShotResult<&'static XcbBackend> {
    CONNECTION.get_or_connect(XcbBackend::connect)
}

/// Captures a rectangle given relative to the primary display.
pub fn capture(x: i32, y: i32, width: u32, height: u32) -> XShotResult<Raster> {
    capture_with_config(CaptureConfig::from_env(), x, y, width, height)
}

pub fn capture_with_config(
    config: CaptureConfig,
    x: i32,
    y: i32,
    width: u32,
    height: u32,
) -> XShotResult<Raster> {
    connect_and_capture(
        connection,
        &SysVShm,
        &PackedAllocator,
        config,
        x,
        y,
        width,
        height,
    )
}

/// Current display layout; errors are propagated.
pub fn display_layout() -> XShotResult<DisplayLayout> {
    query_layout(connection()?, CaptureConfig::from_env().primary)
}

/// Number of active displays, 0 if the server cannot be queried.
pub fn num_active_displays() -> usize {
    count_displays(connection(), CaptureConfig::from_env().primary)
}

/// Bounds of display `index` relative to the primary display's origin.
/// Returns [`Rect::ZERO`] for an unknown index or when the query fails.
pub fn display_bounds(index: usize) -> Rect {
    bounds_of(connection(), CaptureConfig::from_env().primary, index)
}
