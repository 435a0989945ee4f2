use std::panic::{AssertUnwindSafe, catch_unwind};

use crate::{
    backend::{DisplayBackend, ScreenInfo},
    config::PrimarySelection,
    error::{XShotError, XShotResult},
    rect::Rect,
};

/// Physical displays in virtual-desktop coordinates. The first entry is the
/// primary display and is never absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayLayout {
    screens: Vec<ScreenInfo>,
}

impl DisplayLayout {
    pub fn new(screens: Vec<ScreenInfo>) -> XShotResult<DisplayLayout> {
        if screens.is_empty() {
            return Err(XShotError::protocol("Xinerama reported no screens"));
        }

        Ok(DisplayLayout { screens })
    }

    pub fn screens(&self) -> &[ScreenInfo] {
        &self.screens
    }

    pub fn len(&self) -> usize {
        self.screens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.screens.is_empty()
    }

    pub fn primary(&self) -> &ScreenInfo {
        &self.screens[0]
    }

    pub fn primary_origin(&self) -> (i32, i32) {
        let primary = self.primary();
        (primary.x, primary.y)
    }

    /// Bounds of display `index` with the primary origin moved to (0, 0).
    pub fn bounds(&self, index: usize) -> Option<Rect> {
        let (x0, y0) = self.primary_origin();
        let screen = self.screens.get(index)?;

        Some(screen.rect().translate(-x0, -y0))
    }

    fn promote(&mut self, primary: Rect) -> bool {
        match self.screens.iter().position(|s| s.rect() == primary) {
            Some(index) => {
                let screen = self.screens.remove(index);
                self.screens.insert(0, screen);
                true
            }
            None => false,
        }
    }
}

/// Fetches the current layout. Nothing is cached, so hot-plugged monitors
/// show up on the next call.
pub fn query_layout<B: DisplayBackend>(
    backend: &B,
    primary: PrimarySelection,
) -> XShotResult<DisplayLayout> {
    let mut layout = DisplayLayout::new(backend.query_screens()?)?;

    if primary == PrimarySelection::RandrPrimary {
        match backend.primary_monitor() {
            Ok(Some(rect)) => {
                if !layout.promote(rect) {
                    log::debug!("RandR primary {rect:?} matches no Xinerama screen");
                }
            }
            Ok(None) => log::debug!("RandR reports no primary monitor"),
            Err(err) => log::debug!("RandR primary query failed: {err}"),
        }
    }

    log::debug!("display layout: {:?}", layout.screens);

    Ok(layout)
}

/// Number of active displays, or 0 when anything goes wrong.
pub fn count_displays<B: DisplayBackend>(
    backend: XShotResult<&B>,
    primary: PrimarySelection,
) -> usize {
    let result = catch_unwind(AssertUnwindSafe(|| {
        backend.and_then(|backend| query_layout(backend, primary))
    }));

    match result {
        Ok(Ok(layout)) => layout.len(),
        Ok(Err(err)) => {
            log::debug!("counting displays failed: {err}");
            0
        }
        Err(payload) => {
            log::debug!("counting displays failed: {}", XShotError::from_panic(payload));
            0
        }
    }
}

/// Primary-relative bounds of display `index`, or `Rect::ZERO` when the index
/// is out of range or anything goes wrong.
pub fn bounds_of<B: DisplayBackend>(
    backend: XShotResult<&B>,
    primary: PrimarySelection,
    index: usize,
) -> Rect {
    let result = catch_unwind(AssertUnwindSafe(|| {
        backend.and_then(|backend| query_layout(backend, primary))
    }));

    match result {
        Ok(Ok(layout)) => layout.bounds(index).unwrap_or(Rect::ZERO),
        Ok(Err(err)) => {
            log::debug!("display bounds failed: {err}");
            Rect::ZERO
        }
        Err(payload) => {
            log::debug!("display bounds failed: {}", XShotError::from_panic(payload));
            Rect::ZERO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeServer;

    fn dual_head() -> FakeServer {
        FakeServer::new(
            vec![
                ScreenInfo::new(1920, 0, 1280, 1024),
                ScreenInfo::new(0, 56, 1920, 1080),
            ],
            (3200, 1136),
        )
    }

    #[test]
    fn bounds_are_primary_relative() {
        let server = dual_head();

        assert_eq!(
            bounds_of(Ok(&server), PrimarySelection::FirstScreen, 0),
            Rect::new(0, 0, 1280, 1024)
        );
        assert_eq!(
            bounds_of(Ok(&server), PrimarySelection::FirstScreen, 1),
            Rect::new(-1920, 56, 0, 1136)
        );
    }

    #[test]
    fn bounds_out_of_range_is_zero() {
        let server = dual_head();

        assert_eq!(bounds_of(Ok(&server), PrimarySelection::FirstScreen, 2), Rect::ZERO);
    }

    #[test]
    fn absorbing_queries_swallow_errors() {
        let mut server = dual_head();
        server.xinerama = false;

        assert_eq!(count_displays(Ok(&server), PrimarySelection::FirstScreen), 0);
        assert_eq!(bounds_of(Ok(&server), PrimarySelection::FirstScreen, 0), Rect::ZERO);

        let no_conn: XShotResult<&FakeServer> = Err(XShotError::connection("no display"));
        assert_eq!(count_displays(no_conn.clone(), PrimarySelection::FirstScreen), 0);
        assert_eq!(bounds_of(no_conn, PrimarySelection::FirstScreen, 0), Rect::ZERO);
    }

    #[test]
    fn count_matches_screens() {
        let server = dual_head();

        assert_eq!(count_displays(Ok(&server), PrimarySelection::FirstScreen), 2);
    }

    #[test]
    fn query_layout_propagates_extension_error() {
        let mut server = dual_head();
        server.xinerama = false;

        let err = query_layout(&server, PrimarySelection::FirstScreen).unwrap_err();
        assert!(matches!(err, XShotError::ExtensionUnavailable(_)));
    }

    #[test]
    fn empty_layout_is_an_error() {
        let server = FakeServer::new(Vec::new(), (0, 0));

        let err = query_layout(&server, PrimarySelection::FirstScreen).unwrap_err();
        assert!(matches!(err, XShotError::Protocol(_)));
    }

    #[test]
    fn randr_primary_is_promoted() {
        let mut server = dual_head();
        server.randr_primary = Some(Rect::new(0, 56, 1920, 1136));

        let layout = query_layout(&server, PrimarySelection::RandrPrimary).unwrap();
        assert_eq!(layout.primary_origin(), (0, 56));
        assert_eq!(layout.bounds(1), Some(Rect::new(1920, -56, 3200, 968)));

        // first-screen rule ignores RandR
        let layout = query_layout(&server, PrimarySelection::FirstScreen).unwrap();
        assert_eq!(layout.primary_origin(), (1920, 0));
    }

    #[test]
    fn randr_without_primary_keeps_order() {
        let server = dual_head();

        let layout = query_layout(&server, PrimarySelection::RandrPrimary).unwrap();
        assert_eq!(layout.primary_origin(), (1920, 0));
    }
}
