use std::any::Any;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum XShotError {
    #[error("connection error: {0}")]
    Connection(String),
    #[error("extension unavailable: {0}")]
    ExtensionUnavailable(String),
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("resource error: {0}")]
    Resource(String),
    #[error("internal fault: {0}")]
    InternalFault(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl XShotError {
    pub fn connection<S: ToString>(err: S) -> Self {
        XShotError::Connection(err.to_string())
    }

    pub fn extension_unavailable<S: ToString>(err: S) -> Self {
        XShotError::ExtensionUnavailable(err.to_string())
    }

    pub fn protocol<S: ToString>(err: S) -> Self {
        XShotError::Protocol(err.to_string())
    }

    pub fn resource<S: ToString>(err: S) -> Self {
        XShotError::Resource(err.to_string())
    }

    pub fn invalid_argument<S: ToString>(err: S) -> Self {
        XShotError::InvalidArgument(err.to_string())
    }

    /// Converts a panic payload caught at the capture boundary.
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(message) = payload.downcast_ref::<&str>() {
            (*message).to_string()
        } else if let Some(message) = payload.downcast_ref::<String>() {
            message.clone()
        } else {
            String::from("unknown panic")
        };

        XShotError::InternalFault(message)
    }
}

pub type XShotResult<T> = Result<T, XShotError>;

#[cfg(target_os = "linux")]
impl From<xcb::ConnError> for XShotError {
    fn from(value: xcb::ConnError) -> Self {
        XShotError::Connection(value.to_string())
    }
}

#[cfg(target_os = "linux")]
impl From<xcb::Error> for XShotError {
    fn from(value: xcb::Error) -> Self {
        match value {
            xcb::Error::Connection(err) => XShotError::from(err),
            xcb::Error::Protocol(err) => XShotError::from(err),
        }
    }
}

#[cfg(target_os = "linux")]
impl From<xcb::ProtocolError> for XShotError {
    fn from(value: xcb::ProtocolError) -> Self {
        XShotError::Protocol(format!("{value:?}"))
    }
}

impl From<image::ImageError> for XShotError {
    fn from(value: image::ImageError) -> Self {
        XShotError::InternalFault(value.to_string())
    }
}
