//! Error types for the Galaxy3D frame crate
//!
//! This module defines the error types returned by render targets, devices
//! and engine backends, plus the `frame_bail!` / `frame_err!` helpers that log
//! an error before handing it back to the caller.

use std::fmt;
use crate::data_type::DataType;

/// Result type for Galaxy3D frame operations
pub type Result<T> = std::result::Result<T, Error>;

/// Galaxy3D frame errors
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// A channel was requested with an element type the engine cannot store
    UnsupportedChannelType {
        /// Canonical channel name (e.g. "channel.albedo")
        channel: String,
        /// The rejected element type
        data_type: DataType,
    },

    /// Render was dispatched without one of renderer / camera / world
    MissingSceneObject(&'static str),

    /// The target has no frame buffer yet (no successful commit)
    NotCommitted,

    /// Backend-specific error (buffer creation, render submission, ...)
    BackendError(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnsupportedChannelType { channel, data_type } => {
                write!(f, "Unsupported channel type: {} cannot hold {:?}", channel, data_type)
            }
            Error::MissingSceneObject(what) => {
                write!(f, "Missing scene object: no {} set on render target", what)
            }
            Error::NotCommitted => write!(f, "Render target has not been committed"),
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

// ===== ERROR MACROS =====

/// Build an `Error::BackendError`, logging it at ERROR with file:line
///
/// # Example
///
/// ```ignore
/// let err = frame_err!("galaxy3d::RenderTarget", "buffer {} lost", id);
/// ```
#[macro_export]
macro_rules! frame_err {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::galaxy3d::Runtime::log_detailed(
            $crate::galaxy3d::log::LogSeverity::Error,
            $source,
            message.clone(),
            file!(),
            line!()
        );
        $crate::galaxy3d::Error::BackendError(message)
    }};
}

/// Log and return an `Error::BackendError` from the enclosing function
///
/// # Example
///
/// ```ignore
/// frame_bail!("galaxy3d::Device", "backend refused buffer {}x{}", w, h);
/// ```
#[macro_export]
macro_rules! frame_bail {
    ($source:expr, $($arg:tt)*) => {
        return Err($crate::frame_err!($source, $($arg)*))
    };
}

/// Log an already-built error at ERROR with file:line and hand it back
pub(crate) fn log_error(source: &str, error: Error, file: &'static str, line: u32) -> Error {
    crate::runtime::Runtime::log_detailed(
        crate::log::LogSeverity::Error,
        source,
        error.to_string(),
        file,
        line,
    );
    error
}

/// Log a typed error before returning it
macro_rules! logged {
    ($source:expr, $error:expr) => {
        $crate::error::log_error($source, $error, file!(), line!())
    };
}

pub(crate) use logged;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
