use xcb::{
    Connection, Extension,
    randr::GetMonitors,
    shm,
    x::{Drawable, GetImage, ImageFormat, ImageOrder, Screen},
    xinerama::QueryScreens,
};

use crate::{
    backend::{DisplayBackend, ScreenInfo},
    error::{XShotError, XShotResult},
    rect::Rect,
};

/// Display server connection plus the screen it was opened on.
pub struct XcbBackend {
    conn: Connection,
    screen_num: usize,
}

impl std::fmt::Debug for XcbBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XcbBackend")
            .field("screen_num", &self.screen_num)
            .finish_non_exhaustive()
    }
}

impl XcbBackend {
    /// Connects to `$DISPLAY`, asking for Xinerama, MIT-SHM and RandR when the
    /// server has them.
    pub fn connect() -> XShotResult<XcbBackend> {
        let (conn, index) = Connection::connect_with_extensions(
            None,
            &[],
            &[Extension::Xinerama, Extension::Shm, Extension::RandR],
        )?;

        let backend = XcbBackend {
            conn,
            screen_num: index as usize,
        };
        backend.screen()?;

        log::debug!(
            "connected to screen {}, extensions {:?}",
            backend.screen_num,
            backend.conn.active_extensions().collect::<Vec<_>>()
        );

        Ok(backend)
    }

    fn screen(&self) -> XShotResult<&Screen> {
        self.conn
            .get_setup()
            .roots()
            .nth(self.screen_num)
            .ok_or_else(|| XShotError::connection("Not found screen"))
    }

    fn has_extension(&self, extension: Extension) -> bool {
        self.conn.active_extensions().any(|ext| ext == extension)
    }

    /// Only 32 bits per pixel in LSB-first byte order decodes as B, G, R, pad.
    fn check_pixel_format(&self, depth: u8) -> XShotResult<()> {
        let setup = self.conn.get_setup();

        let pixmap_format = setup
            .pixmap_formats()
            .iter()
            .find(|item| item.depth() == depth)
            .ok_or_else(|| XShotError::protocol(format!("Not found pixmap format for depth {depth}")))?;

        let bits_per_pixel = pixmap_format.bits_per_pixel();
        let byte_order = setup.image_byte_order();

        if bits_per_pixel != 32 || byte_order != ImageOrder::LsbFirst {
            return Err(XShotError::protocol(format!(
                "unsupported pixel format: depth {depth}, {bits_per_pixel} bits per pixel, {byte_order:?}"
            )));
        }

        Ok(())
    }
}

impl DisplayBackend for XcbBackend {
    type Segment = shm::Seg;

    fn query_screens(&self) -> XShotResult<Vec<ScreenInfo>> {
        if !self.has_extension(Extension::Xinerama) {
            return Err(XShotError::extension_unavailable("XINERAMA"));
        }

        let query_screens_cookie = self.conn.send_request(&QueryScreens {});
        let query_screens_reply = self.conn.wait_for_reply(query_screens_cookie)?;

        let screens = query_screens_reply
            .screen_info()
            .iter()
            .map(|info| {
                ScreenInfo::new(
                    info.x_org as i32,
                    info.y_org as i32,
                    info.width as u32,
                    info.height as u32,
                )
            })
            .collect();

        Ok(screens)
    }

    fn primary_monitor(&self) -> XShotResult<Option<Rect>> {
        if !self.has_extension(Extension::RandR) {
            return Ok(None);
        }

        let get_monitors_cookie = self.conn.send_request(&GetMonitors {
            window: self.screen()?.root(),
            get_active: true,
        });
        let get_monitors_reply = self.conn.wait_for_reply(get_monitors_cookie)?;

        let primary = get_monitors_reply
            .monitors()
            .find(|monitor_info| monitor_info.primary())
            .map(|monitor_info| {
                Rect::from_origin_size(
                    monitor_info.x() as i32,
                    monitor_info.y() as i32,
                    monitor_info.width() as u32,
                    monitor_info.height() as u32,
                )
            });

        Ok(primary)
    }

    fn root_size(&self) -> XShotResult<(u32, u32)> {
        let screen = self.screen()?;

        Ok((
            screen.width_in_pixels() as u32,
            screen.height_in_pixels() as u32,
        ))
    }

    fn shm_available(&self) -> bool {
        if !self.has_extension(Extension::Shm) {
            return false;
        }

        let query_version_cookie = self.conn.send_request(&shm::QueryVersion {});
        match self.conn.wait_for_reply(query_version_cookie) {
            Ok(_) => true,
            Err(err) => {
                log::debug!("MIT-SHM QueryVersion failed: {err:?}");
                false
            }
        }
    }

    fn shm_attach(&self, shmid: u32) -> XShotResult<shm::Seg> {
        let shmseg: shm::Seg = self.conn.generate_id();

        let attach_cookie = self.conn.send_request_checked(&shm::Attach {
            shmseg,
            shmid,
            read_only: false,
        });
        self.conn
            .check_request(attach_cookie)
            .map_err(|err| XShotError::resource(format!("shm Attach({shmid}) failed: {err:?}")))?;

        Ok(shmseg)
    }

    fn shm_detach(&self, segment: shm::Seg) -> XShotResult<()> {
        let detach_cookie = self
            .conn
            .send_request_checked(&shm::Detach { shmseg: segment });
        self.conn
            .check_request(detach_cookie)
            .map_err(|err| XShotError::resource(format!("shm Detach failed: {err:?}")))
    }

    fn shm_get_image(&self, segment: shm::Seg, rect: Rect) -> XShotResult<()> {
        let get_image_cookie = self.conn.send_request(&shm::GetImage {
            drawable: Drawable::Window(self.screen()?.root()),
            x: rect.min_x as i16,
            y: rect.min_y as i16,
            width: rect.width() as u16,
            height: rect.height() as u16,
            plane_mask: u32::MAX,
            format: ImageFormat::ZPixmap as u8,
            shmseg: segment,
            offset: 0,
        });

        let get_image_reply = self.conn.wait_for_reply(get_image_cookie)?;

        self.check_pixel_format(get_image_reply.depth())
    }

    fn get_image(&self, rect: Rect) -> XShotResult<Vec<u8>> {
        let get_image_cookie = self.conn.send_request(&GetImage {
            format: ImageFormat::ZPixmap,
            drawable: Drawable::Window(self.screen()?.root()),
            x: rect.min_x as i16,
            y: rect.min_y as i16,
            width: rect.width() as u16,
            height: rect.height() as u16,
            plane_mask: u32::MAX,
        });

        let get_image_reply = self.conn.wait_for_reply(get_image_cookie)?;
        self.check_pixel_format(get_image_reply.depth())?;

        Ok(get_image_reply.data().to_vec())
    }
}
