use scopeguard::guard;

use crate::{
    backend::{DisplayBackend, SharedMemory},
    error::XShotResult,
    raster::BYTES_PER_PIXEL,
    rect::Rect,
};

/// Retrieves raw server pixels (B, G, R, pad) for a rectangle of the root
/// window.
pub trait PixelSource {
    fn fetch(&self, rect: Rect) -> XShotResult<Vec<u8>>;
}

/// Plain `GetImage`: the pixels travel in the reply.
pub struct ReplySource<'a, B> {
    backend: &'a B,
}

impl<'a, B: DisplayBackend> ReplySource<'a, B> {
    pub fn new(backend: &'a B) -> Self {
        ReplySource { backend }
    }
}

impl<B: DisplayBackend> PixelSource for ReplySource<'_, B> {
    fn fetch(&self, rect: Rect) -> XShotResult<Vec<u8>> {
        self.backend.get_image(rect)
    }
}

/// MIT-SHM `GetImage`: the server writes into a segment shared with us.
pub struct ShmSource<'a, B, M> {
    backend: &'a B,
    shm: &'a M,
}

impl<'a, B: DisplayBackend, M: SharedMemory> ShmSource<'a, B, M> {
    pub fn new(backend: &'a B, shm: &'a M) -> Self {
        ShmSource { backend, shm }
    }
}

struct Segment<S, P> {
    id: u32,
    mapping: Option<P>,
    attached: Option<S>,
}

impl<B: DisplayBackend, M: SharedMemory> PixelSource for ShmSource<'_, B, M> {
    fn fetch(&self, rect: Rect) -> XShotResult<Vec<u8>> {
        let size = rect.width() as usize * rect.height() as usize * BYTES_PER_PIXEL;
        let id = self.shm.create(size)?;

        // Released on every exit: server detach, then removal, then unmap.
        let mut segment = guard(
            Segment {
                id,
                mapping: None,
                attached: None,
            },
            |segment| {
                if let Some(attached) = segment.attached {
                    if let Err(err) = self.backend.shm_detach(attached) {
                        log::error!("shm detach of segment {} failed: {err}", segment.id);
                    }
                }
                if let Err(err) = self.shm.remove(segment.id) {
                    log::error!("shm remove of segment {} failed: {err}", segment.id);
                }
                if let Some(mapping) = segment.mapping {
                    if let Err(err) = self.shm.unmap(mapping) {
                        log::error!("shm unmap of segment {} failed: {err}", segment.id);
                    }
                }
            },
        );

        let attached = self.backend.shm_attach(id)?;
        segment.attached = Some(attached);
        let mapping = segment.mapping.insert(self.shm.map(id)?);

        self.backend.shm_get_image(attached, rect)?;
        self.shm.read(mapping, size)
    }
}
