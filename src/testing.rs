//! In-memory display server used by the unit tests.

use std::{collections::HashMap, sync::Mutex};

use crate::{
    backend::{DisplayBackend, ScreenInfo, SharedMemory},
    error::{XShotError, XShotResult},
    rect::Rect,
};

/// Root window pixel at (x, y), as the server lays it out: B, G, R, pad.
pub fn source_pixel(x: i32, y: i32) -> [u8; 4] {
    [x as u8, y as u8, (x.wrapping_mul(7) ^ y.wrapping_mul(3)) as u8, 0x77]
}

/// What a capture must produce for the root pixel at (x, y).
pub fn expected_rgba(x: i32, y: i32) -> [u8; 4] {
    let [b, g, r, _] = source_pixel(x, y);
    [r, g, b, 255]
}

#[derive(Debug, Default)]
struct FakeState {
    next_id: u32,
    segments: HashMap<u32, Vec<u8>>,
    mapped: HashMap<u32, u32>,
    attached: HashMap<u32, u32>,
    events: Vec<&'static str>,
}

#[derive(Debug)]
pub struct FakeServer {
    pub screens: Vec<ScreenInfo>,
    pub root: (u32, u32),
    pub xinerama: bool,
    pub shm: bool,
    pub randr_primary: Option<Rect>,
    pub fail_attach: bool,
    pub fail_map: bool,
    pub fail_shm_get_image: bool,
    pub short_reply: bool,
    pub panic_on_get_image: bool,
    state: Mutex<FakeState>,
}

impl FakeServer {
    pub fn new(screens: Vec<ScreenInfo>, root: (u32, u32)) -> FakeServer {
        FakeServer {
            screens,
            root,
            xinerama: true,
            shm: true,
            randr_primary: None,
            fail_attach: false,
            fail_map: false,
            fail_shm_get_image: false,
            short_reply: false,
            panic_on_get_image: false,
            state: Mutex::new(FakeState::default()),
        }
    }

    pub fn live_segments(&self) -> usize {
        self.state.lock().unwrap().segments.len()
    }

    pub fn mapped_segments(&self) -> usize {
        self.state.lock().unwrap().mapped.len()
    }

    pub fn attached_segments(&self) -> usize {
        self.state.lock().unwrap().attached.len()
    }

    pub fn events(&self) -> Vec<&'static str> {
        self.state.lock().unwrap().events.clone()
    }

    pub fn count(&self, event: &str) -> usize {
        self.events().iter().filter(|e| **e == event).count()
    }

    fn render(&self, rect: Rect) -> XShotResult<Vec<u8>> {
        if self.panic_on_get_image {
            panic!("framebuffer exploded");
        }

        let root = Rect::new(0, 0, self.root.0 as i32, self.root.1 as i32);
        if rect.is_empty() || root.intersect(&rect) != rect {
            return Err(XShotError::protocol(format!("BadMatch for {rect:?}")));
        }

        let mut data = Vec::with_capacity(rect.width() as usize * rect.height() as usize * 4);
        for y in rect.min_y..rect.max_y {
            for x in rect.min_x..rect.max_x {
                data.extend_from_slice(&source_pixel(x, y));
            }
        }
        if self.short_reply {
            data.truncate(data.len() - 1);
        }

        Ok(data)
    }
}

impl DisplayBackend for FakeServer {
    type Segment = u32;

    fn query_screens(&self) -> XShotResult<Vec<ScreenInfo>> {
        if !self.xinerama {
            return Err(XShotError::extension_unavailable("XINERAMA"));
        }
        Ok(self.screens.clone())
    }

    fn primary_monitor(&self) -> XShotResult<Option<Rect>> {
        Ok(self.randr_primary)
    }

    fn root_size(&self) -> XShotResult<(u32, u32)> {
        Ok(self.root)
    }

    fn shm_available(&self) -> bool {
        self.shm
    }

    fn shm_attach(&self, shmid: u32) -> XShotResult<u32> {
        if self.fail_attach {
            return Err(XShotError::resource("BadAccess"));
        }

        let mut state = self.state.lock().unwrap();
        if !state.segments.contains_key(&shmid) {
            return Err(XShotError::resource("BadValue"));
        }
        let seg = 1000 + shmid;
        state.attached.insert(seg, shmid);
        state.events.push("attach");

        Ok(seg)
    }

    fn shm_detach(&self, segment: u32) -> XShotResult<()> {
        let mut state = self.state.lock().unwrap();
        state
            .attached
            .remove(&segment)
            .ok_or_else(|| XShotError::resource("BadShmSeg"))?;
        state.events.push("detach");

        Ok(())
    }

    fn shm_get_image(&self, segment: u32, rect: Rect) -> XShotResult<()> {
        if self.fail_shm_get_image {
            return Err(XShotError::protocol("BadDrawable"));
        }

        let data = self.render(rect)?;
        let mut state = self.state.lock().unwrap();
        let shmid = *state
            .attached
            .get(&segment)
            .ok_or_else(|| XShotError::protocol("BadShmSeg"))?;
        let memory = state
            .segments
            .get_mut(&shmid)
            .ok_or_else(|| XShotError::protocol("segment gone"))?;
        if memory.len() < data.len() {
            return Err(XShotError::protocol("BadAccess"));
        }
        memory[..data.len()].copy_from_slice(&data);
        state.events.push("shm_get_image");

        Ok(())
    }

    fn get_image(&self, rect: Rect) -> XShotResult<Vec<u8>> {
        let data = self.render(rect)?;
        self.state.lock().unwrap().events.push("get_image");

        Ok(data)
    }
}

impl SharedMemory for FakeServer {
    type Mapping = u32;

    fn create(&self, size: usize) -> XShotResult<u32> {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = state.next_id;
        state.segments.insert(id, vec![0u8; size]);
        state.events.push("create");

        Ok(id)
    }

    fn map(&self, id: u32) -> XShotResult<u32> {
        if self.fail_map {
            return Err(XShotError::resource("shmat failed"));
        }

        let mut state = self.state.lock().unwrap();
        *state.mapped.entry(id).or_default() += 1;
        state.events.push("map");

        Ok(id)
    }

    fn read(&self, mapping: &u32, len: usize) -> XShotResult<Vec<u8>> {
        let mut state = self.state.lock().unwrap();
        let data = state
            .segments
            .get(mapping)
            .map(|memory| memory[..len].to_vec())
            .ok_or_else(|| XShotError::resource("segment gone"))?;
        state.events.push("read");

        Ok(data)
    }

    fn unmap(&self, mapping: u32) -> XShotResult<()> {
        let mut state = self.state.lock().unwrap();
        let count = state
            .mapped
            .get_mut(&mapping)
            .ok_or_else(|| XShotError::resource("not mapped"))?;
        *count -= 1;
        if *count == 0 {
            state.mapped.remove(&mapping);
        }
        state.events.push("unmap");

        Ok(())
    }

    fn remove(&self, id: u32) -> XShotResult<()> {
        let mut state = self.state.lock().unwrap();
        state
            .segments
            .remove(&id)
            .ok_or_else(|| XShotError::resource("no such segment"))?;
        state.events.push("remove");

        Ok(())
    }
}
