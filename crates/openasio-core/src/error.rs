//! Result codes and the control-path error type.
//!
//! Every fallible control operation reports through [`Result`]. At the driver
//! boundary an [`Error`] collapses to a single [`ResultCode`]: zero is success,
//! negative values are failures. Nothing else crosses the boundary.

use core::fmt;

use crate::lifecycle::{Operation, SessionState};

/// Numeric result codes shared by drivers and hosts.
///
/// Non-negative raw values denote success (device identifiers returned by
/// `open` are non-negative); negative values denote failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ResultCode {
    /// Success.
    Ok = 0,
    /// Catch-all failure.
    Generic = -1,
    /// Valid request, but the capability is absent.
    Unsupported = -2,
    /// Malformed input.
    InvalidArg = -3,
    /// Backend or hardware failure.
    Device = -4,
    /// Driver-internal failure not attributable to the caller.
    Backend = -5,
    /// Operation illegal in the current lifecycle state.
    State = -6,
}

impl ResultCode {
    /// Raw integer value of this code.
    pub const fn as_raw(self) -> i32 {
        self as i32
    }

    /// Maps a raw integer back to a code.
    ///
    /// Any non-negative value is success. Unknown negative values map to
    /// [`ResultCode::Generic`].
    pub const fn from_raw(raw: i32) -> Self {
        match raw {
            0.. => Self::Ok,
            -2 => Self::Unsupported,
            -3 => Self::InvalidArg,
            -4 => Self::Device,
            -5 => Self::Backend,
            -6 => Self::State,
            _ => Self::Generic,
        }
    }

    /// Returns `true` for [`ResultCode::Ok`].
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ok => "OA_OK",
            Self::Generic => "OA_ERR_GENERIC",
            Self::Unsupported => "OA_ERR_UNSUPPORTED",
            Self::InvalidArg => "OA_ERR_INVALID_ARG",
            Self::Device => "OA_ERR_DEVICE",
            Self::Backend => "OA_ERR_BACKEND",
            Self::State => "OA_ERR_STATE",
        };
        write!(f, "{name} ({})", self.as_raw())
    }
}

/// Control-path error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Catch-all failure.
    #[error("{0}")]
    Generic(String),

    /// The request is well formed but the driver or device cannot honour it.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// The request is malformed (zero sample rate, zero frames, ...).
    #[error("invalid argument: {0}")]
    InvalidArg(String),

    /// The device failed, disappeared, or is busy.
    #[error("device error: {0}")]
    Device(String),

    /// Driver-internal failure.
    #[error("backend error: {0}")]
    Backend(String),

    /// The operation is not legal in the session's current state.
    #[error("`{op}` is not allowed while {state}")]
    State {
        /// Operation that was attempted.
        op: Operation,
        /// State the session was in.
        state: SessionState,
    },
}

impl Error {
    /// Create an [`Error::Unsupported`].
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }

    /// Create an [`Error::InvalidArg`].
    pub fn invalid_arg(msg: impl Into<String>) -> Self {
        Self::InvalidArg(msg.into())
    }

    /// Create an [`Error::Device`].
    pub fn device(msg: impl Into<String>) -> Self {
        Self::Device(msg.into())
    }

    /// Create an [`Error::Backend`].
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    /// The boundary code for this error.
    pub const fn code(&self) -> ResultCode {
        match self {
            Self::Generic(_) => ResultCode::Generic,
            Self::Unsupported(_) => ResultCode::Unsupported,
            Self::InvalidArg(_) => ResultCode::InvalidArg,
            Self::Device(_) => ResultCode::Device,
            Self::Backend(_) => ResultCode::Backend,
            Self::State { .. } => ResultCode::State,
        }
    }
}

/// Convenience result type for control-path operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Collapses a result into its boundary code.
pub fn result_code<T>(result: &Result<T>) -> ResultCode {
    match result {
        Ok(_) => ResultCode::Ok,
        Err(e) => e.code(),
    }
}
