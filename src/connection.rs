use std::sync::OnceLock;

use crate::error::XShotResult;

/// Holds the outcome of the first connection attempt for the lifetime of the
/// manager. Concurrent first callers block until that attempt finishes and a
/// failure is replayed instead of retried.
#[derive(Debug)]
pub struct ConnectionManager<C> {
    cell: OnceLock<XShotResult<C>>,
}

impl<C> ConnectionManager<C> {
    pub const fn new() -> ConnectionManager<C> {
        ConnectionManager {
            cell: OnceLock::new(),
        }
    }

    pub fn get_or_connect<F>(&self, connect: F) -> XShotResult<&C>
    where
        F: FnOnce() -> XShotResult<C>,
    {
        let result = self.cell.get_or_init(|| {
            let result = connect();
            match &result {
                Ok(_) => log::debug!("display connection established"),
                Err(err) => log::error!("display connection failed: {err}"),
            }
            result
        });

        match result {
            Ok(conn) => Ok(conn),
            Err(err) => Err(err.clone()),
        }
    }
}

impl<C> Default for ConnectionManager<C> {
    fn default() -> Self {
        ConnectionManager::new()
    }
}
