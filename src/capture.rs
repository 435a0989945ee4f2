use std::panic::{AssertUnwindSafe, catch_unwind};

use crate::{
    backend::{DisplayBackend, SharedMemory},
    config::{CaptureConfig, ShmPolicy},
    error::{XShotError, XShotResult},
    layout::query_layout,
    pixel::{blit, fill_opaque_black},
    raster::{Raster, RasterAllocator},
    rect::Rect,
    source::{PixelSource, ReplySource, ShmSource},
};

/// Captures rectangles of the root window through injected collaborators.
pub struct CaptureEngine<'a, B, M, A> {
    backend: &'a B,
    shm: &'a M,
    allocator: &'a A,
    config: CaptureConfig,
}

impl<'a, B, M, A> CaptureEngine<'a, B, M, A>
where
    B: DisplayBackend,
    M: SharedMemory,
    A: RasterAllocator,
{
    pub fn new(backend: &'a B, shm: &'a M, allocator: &'a A, config: CaptureConfig) -> Self {
        CaptureEngine {
            backend,
            shm,
            allocator,
            config,
        }
    }

    /// Captures `width` x `height` pixels at (`x`, `y`) relative to the
    /// primary display. Parts of the request outside the root window come
    /// back as opaque black. Panics raised while capturing are reported as
    /// [`XShotError::InternalFault`].
    pub fn capture(&self, x: i32, y: i32, width: u32, height: u32) -> XShotResult<Raster> {
        guarded((x, y, width, height), || self.capture_unguarded(x, y, width, height))
    }

    fn capture_unguarded(&self, x: i32, y: i32, width: u32, height: u32) -> XShotResult<Raster> {
        if width > u16::MAX as u32 || height > u16::MAX as u32 {
            return Err(XShotError::invalid_argument(format!(
                "capture size {width}x{height} exceeds {}",
                u16::MAX
            )));
        }

        let layout = query_layout(self.backend, self.config.primary)?;
        let (x0, y0) = layout.primary_origin();

        let use_shm = match self.config.shm {
            ShmPolicy::Auto => {
                let available = self.backend.shm_available();
                if !available {
                    log::warn!("MIT-SHM unavailable, falling back to GetImage");
                }
                available
            }
            ShmPolicy::Disabled => false,
        };

        let (root_width, root_height) = self.backend.root_size()?;
        let screen = Rect::from_origin_size(0, 0, root_width, root_height);
        let requested =
            Rect::from_origin_size(x.saturating_add(x0), y.saturating_add(y0), width, height);
        let transfer = screen.intersect(&requested);

        log::debug!(
            "capture request {requested:?}, screen {screen:?}, transfer {transfer:?}, shm {use_shm}"
        );

        let mut raster = self.allocator.allocate(width, height)?;
        if raster.width() != width || raster.height() != height {
            return Err(XShotError::resource(format!(
                "allocator returned {}x{} for {width}x{height}",
                raster.width(),
                raster.height()
            )));
        }
        fill_opaque_black(&mut raster);

        if !transfer.is_empty() {
            let shm_source;
            let reply_source;
            let source: &dyn PixelSource = if use_shm {
                shm_source = ShmSource::new(self.backend, self.shm);
                &shm_source
            } else {
                reply_source = ReplySource::new(self.backend);
                &reply_source
            };

            let raw = source.fetch(transfer)?;
            blit(&raw, transfer, (requested.min_x, requested.min_y), &mut raster)?;
        }

        Ok(raster)
    }
}

/// Like [`CaptureEngine::capture`], but opening the backend through
/// `connect` happens inside the same panic boundary.
#[allow(clippy::too_many_arguments)]
pub fn connect_and_capture<'a, B, M, A, F>(
    connect: F,
    shm: &'a M,
    allocator: &'a A,
    config: CaptureConfig,
    x: i32,
    y: i32,
    width: u32,
    height: u32,
) -> XShotResult<Raster>
where
    B: DisplayBackend + 'a,
    M: SharedMemory,
    A: RasterAllocator,
    F: FnOnce() -> XShotResult<&'a B>,
{
    guarded((x, y, width, height), || {
        let backend = connect()?;
        CaptureEngine::new(backend, shm, allocator, config).capture_unguarded(x, y, width, height)
    })
}

fn guarded<F>(request: (i32, i32, u32, u32), f: F) -> XShotResult<Raster>
where
    F: FnOnce() -> XShotResult<Raster>,
{
    catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|payload| {
        let err = XShotError::from_panic(payload);
        log::error!("capture{request:?} faulted: {err}");
        Err(err)
    })
}
