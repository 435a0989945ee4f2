mod backend;
mod capture;
mod config;
mod connection;
mod error;
mod layout;
mod pixel;
mod raster;
mod rect;
mod source;

#[cfg(test)]
mod testing;

pub use backend::{DisplayBackend, ScreenInfo, SharedMemory};
pub use capture::{CaptureEngine, connect_and_capture};
pub use config::{CaptureConfig, PrimarySelection, ShmPolicy};
pub use connection::ConnectionManager;
pub use error::{XShotError, XShotResult};
pub use layout::{DisplayLayout, bounds_of, count_displays, query_layout};
pub use pixel::{OPAQUE_BLACK, bgrx_to_rgba};
pub use raster::{BYTES_PER_PIXEL, PackedAllocator, Raster, RasterAllocator};
pub use rect::Rect;
pub use source::{PixelSource, ReplySource, ShmSource};

#[cfg(target_os = "linux")]
mod linux;

#[cfg(target_os = "linux")]
pub use linux::*;
