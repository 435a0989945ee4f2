use crate::{error::XShotResult, rect::Rect};

/// One physical display as reported by Xinerama, in virtual-desktop
/// coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenInfo {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl ScreenInfo {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> ScreenInfo {
        ScreenInfo {
            x,
            y,
            width,
            height,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::from_origin_size(self.x, self.y, self.width, self.height)
    }
}

/// Requests the capture pipeline needs from a display server connection.
///
/// Every method is a synchronous round-trip. Implementations are not expected
/// to serialize concurrent callers.
pub trait DisplayBackend {
    /// Server-side handle for an attached shared-memory segment.
    type Segment: Copy;

    /// Xinerama screens in server order. Fails with `ExtensionUnavailable`
    /// when Xinerama is missing.
    fn query_screens(&self) -> XShotResult<Vec<ScreenInfo>>;

    /// Rectangle of the RandR primary monitor, if the server designates one.
    fn primary_monitor(&self) -> XShotResult<Option<Rect>> {
        Ok(None)
    }

    /// Size of the root window in pixels.
    fn root_size(&self) -> XShotResult<(u32, u32)>;

    /// Probes MIT-SHM on this connection.
    fn shm_available(&self) -> bool;

    fn shm_attach(&self, shmid: u32) -> XShotResult<Self::Segment>;

    fn shm_detach(&self, segment: Self::Segment) -> XShotResult<()>;

    /// Asks the server to write the Z-pixmap for `rect` at offset 0 of
    /// `segment`.
    fn shm_get_image(&self, segment: Self::Segment, rect: Rect) -> XShotResult<()>;

    /// Z-pixmap for `rect`, carried in the reply payload.
    fn get_image(&self, rect: Rect) -> XShotResult<Vec<u8>>;
}

/// Process-side shared memory segments (System V on Linux).
pub trait SharedMemory {
    type Mapping;

    /// Creates a private segment and returns its id.
    fn create(&self, size: usize) -> XShotResult<u32>;

    fn map(&self, id: u32) -> XShotResult<Self::Mapping>;

    fn read(&self, mapping: &Self::Mapping, len: usize) -> XShotResult<Vec<u8>>;

    fn unmap(&self, mapping: Self::Mapping) -> XShotResult<()>;

    /// Marks the segment for removal once every attachment is gone.
    fn remove(&self, id: u32) -> XShotResult<()>;
}
