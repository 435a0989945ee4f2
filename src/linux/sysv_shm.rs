use std::{io, ptr, ptr::NonNull, slice};

use crate::{
    backend::SharedMemory,
    error::{XShotError, XShotResult},
};

/// System V shared memory, the flavour MIT-SHM attaches to.
#[derive(Debug, Default, Clone, Copy)]
pub struct SysVShm;

#[derive(Debug)]
pub struct SysVMapping {
    addr: NonNull<libc::c_void>,
    size: usize,
}

impl SharedMemory for SysVShm {
    type Mapping = SysVMapping;

    fn create(&self, size: usize) -> XShotResult<u32> {
        let shmid = unsafe { libc::shmget(libc::IPC_PRIVATE, size, libc::IPC_CREAT | 0o600) };
        if shmid < 0 {
            return Err(XShotError::resource(format!(
                "shmget({size}) failed: {}",
                io::Error::last_os_error()
            )));
        }

        Ok(shmid as u32)
    }

    fn map(&self, id: u32) -> XShotResult<SysVMapping> {
        let addr = unsafe { libc::shmat(id as libc::c_int, ptr::null(), 0) };
        if addr as isize == -1 {
            return Err(XShotError::resource(format!(
                "shmat({id}) failed: {}",
                io::Error::last_os_error()
            )));
        }
        let addr = NonNull::new(addr).ok_or_else(|| XShotError::resource("shmat returned null"))?;

        let mut stat: libc::shmid_ds = unsafe { std::mem::zeroed() };
        let size = if unsafe { libc::shmctl(id as libc::c_int, libc::IPC_STAT, &mut stat) } == 0 {
            stat.shm_segsz as usize
        } else {
            0
        };

        Ok(SysVMapping { addr, size })
    }

    fn read(&self, mapping: &SysVMapping, len: usize) -> XShotResult<Vec<u8>> {
        if len > mapping.size {
            return Err(XShotError::resource(format!(
                "read of {len} bytes from a {} byte segment",
                mapping.size
            )));
        }

        let bytes = unsafe { slice::from_raw_parts(mapping.addr.as_ptr() as *const u8, len) };

        Ok(bytes.to_vec())
    }

    fn unmap(&self, mapping: SysVMapping) -> XShotResult<()> {
        if unsafe { libc::shmdt(mapping.addr.as_ptr()) } != 0 {
            return Err(XShotError::resource(format!(
                "shmdt failed: {}",
                io::Error::last_os_error()
            )));
        }

        Ok(())
    }

    fn remove(&self, id: u32) -> XShotResult<()> {
        if unsafe { libc::shmctl(id as libc::c_int, libc::IPC_RMID, ptr::null_mut()) } != 0 {
            return Err(XShotError::resource(format!(
                "shmctl({id}, IPC_RMID) failed: {}",
                io::Error::last_os_error()
            )));
        }

        Ok(())
    }
}
