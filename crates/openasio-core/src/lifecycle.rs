//! Session lifecycle states and the operation legality table.
//!
//! ```text
//! Created ─open─▶ Opened ─configure/set_*─▶ Configured ─start─▶ Running
//!                   │                          ▲   │              │
//!                   └──────────start───────────┼───┘             stop
//!                                              │                  ▼
//!                                              └──configure/set_*─ Stopped
//!        any state except Running ──close──▶ Closed (terminal)
//! ```
//!
//! The table is pure data: the session consults [`ensure_allowed`] before it
//! touches anything, so a rejected call has no side effect.

use core::fmt;

use crate::error::{Error, Result};

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Constructed; no device yet.
    Created,
    /// A device is open; no stream configuration recorded.
    Opened,
    /// A stream configuration is recorded but not streaming.
    Configured,
    /// The real-time dispatcher is invoking the host callback.
    Running,
    /// Streaming ended; configuration is retained.
    Stopped,
    /// Device released. Terminal.
    Closed,
}

impl SessionState {
    /// All states, in lifecycle order.
    pub const ALL: [Self; 6] = [
        Self::Created,
        Self::Opened,
        Self::Configured,
        Self::Running,
        Self::Stopped,
        Self::Closed,
    ];

    /// Lower-case name used in messages.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Opened => "opened",
            Self::Configured => "configured",
            Self::Running => "running",
            Self::Stopped => "stopped",
            Self::Closed => "closed",
        }
    }

    /// State reached after `op` succeeds from `self`.
    ///
    /// Only meaningful when `op` is allowed in `self`.
    pub const fn after(self, op: Operation) -> Self {
        match op {
            Operation::Open => Self::Opened,
            Operation::Configure | Operation::SetSampleRate | Operation::SetBufferFrames => {
                Self::Configured
            }
            Operation::Start => Self::Running,
            Operation::Stop => Self::Stopped,
            Operation::Close => Self::Closed,
            Operation::QueryDevices
            | Operation::GetCaps
            | Operation::GetDefaultConfig
            | Operation::GetConfig
            | Operation::GetLatency => self,
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Control operations a host can issue against a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Enumerate device names.
    QueryDevices,
    /// Open a device by name.
    Open,
    /// Release the device.
    Close,
    /// Read the capability mask.
    GetCaps,
    /// Read the device's default stream configuration.
    GetDefaultConfig,
    /// Read the recorded stream configuration.
    GetConfig,
    /// Validate and record a stream configuration without streaming.
    Configure,
    /// Validate a configuration and start streaming.
    Start,
    /// Request the dispatcher to stop at the next period boundary.
    Stop,
    /// Read input/output latency.
    GetLatency,
    /// Change the sample rate while not running.
    SetSampleRate,
    /// Change the period size while not running.
    SetBufferFrames,
}

impl Operation {
    /// Every operation.
    pub const ALL: [Self; 12] = [
        Self::QueryDevices,
        Self::Open,
        Self::Close,
        Self::GetCaps,
        Self::GetDefaultConfig,
        Self::GetConfig,
        Self::Configure,
        Self::Start,
        Self::Stop,
        Self::GetLatency,
        Self::SetSampleRate,
        Self::SetBufferFrames,
    ];

    /// Name as it appears in the driver function table.
    pub const fn name(self) -> &'static str {
        match self {
            Self::QueryDevices => "query_devices",
            Self::Open => "open_device",
            Self::Close => "close_device",
            Self::GetCaps => "get_caps",
            Self::GetDefaultConfig => "get_default_config",
            Self::GetConfig => "get_config",
            Self::Configure => "configure",
            Self::Start => "start",
            Self::Stop => "stop",
            Self::GetLatency => "get_latency",
            Self::SetSampleRate => "set_sample_rate",
            Self::SetBufferFrames => "set_buffer_frames",
        }
    }

    /// Whether this operation is legal in `state`.
    pub const fn is_allowed_in(self, state: SessionState) -> bool {
        use SessionState::{Closed, Configured, Created, Opened, Running, Stopped};
        match self {
            Self::QueryDevices => !matches!(state, Closed),
            Self::Open => matches!(state, Created),
            Self::Close => !matches!(state, Running | Closed),
            Self::GetCaps | Self::GetDefaultConfig | Self::GetLatency => {
                matches!(state, Opened | Configured | Running | Stopped)
            }
            Self::GetConfig => matches!(state, Configured | Running | Stopped),
            Self::Configure | Self::Start | Self::SetSampleRate | Self::SetBufferFrames => {
                matches!(state, Opened | Configured | Stopped)
            }
            Self::Stop => matches!(state, Running),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fails with [`Error::State`] when `op` is not legal in `state`.
pub fn ensure_allowed(op: Operation, state: SessionState) -> Result<()> {
    if op.is_allowed_in(state) {
        Ok(())
    } else {
        Err(Error::State { op, state })
    }
}
