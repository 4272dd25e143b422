//! Session layer for OpenASIO drivers.
//!
//! This crate provides:
//!
//! - **Session state machine**: [`Session`] owns one device and enforces the
//!   lifecycle `Created → Opened → Configured → Running → Stopped → Closed`
//! - **Real-time dispatcher**: one thread per run that adapts buffers and
//!   calls the host once per period without allocating or locking
//! - **Driver contract**: the [`Driver`] operation table, [`DriverFactory`]
//!   and the version-checking [`load_driver`]
//! - **Backend interfaces**: [`AudioBackend`] / [`BackendStream`], plus the
//!   in-process [`SimulatedBackend`]
//!
//! ## Quick Start
//!
//! ```rust
//! use openasio_io::{AudioInput, AudioOutput, Driver, freewheel_driver, host_fn, load_driver};
//!
//! let mut remaining = 10;
//! let host = host_fn(move |_in: &AudioInput<'_>, out: &mut AudioOutput<'_>, frames, _t, _cfg| {
//!     for frame in 0..frames as usize {
//!         for ch in 0..out.channels() {
//!             out.set_f32(frame, ch, 0.25);
//!         }
//!     }
//!     remaining -= 1;
//!     remaining > 0
//! });
//!
//! let mut driver = load_driver(freewheel_driver, Box::new(host))?;
//! driver.open_device(None)?;
//! let config = driver.get_default_config()?;
//! driver.start(&config)?;
//! // The host may already have ended the run; either way it is stopped now.
//! let _ = driver.stop();
//! driver.close_device()?;
//! # Ok::<(), openasio_io::Error>(())
//! ```

pub mod backend;
pub mod dispatcher;
pub mod driver;
pub mod host;
pub mod session;
pub mod simulated;

pub use backend::{AudioBackend, BackendStream, DeviceInfo, Latency, StreamError};
pub use dispatcher::{
    DispatchOutcome, DispatchShared, Dispatcher, DispatcherHandle, ExitReason, SpawnError,
};
pub use driver::{Driver, DriverFactory, freewheel_driver, load_driver, simulated_driver};
pub use host::{AudioInput, AudioOutput, FnHost, HostProcess, host_fn};
pub use session::Session;
pub use simulated::{FaultPlan, Pacing, SimulatedBackend, SimulatedDevice, SimulatedStats, ramp_sample};

pub use openasio_core::{Error, Result};
