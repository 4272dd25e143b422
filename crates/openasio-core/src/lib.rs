//! OpenASIO Core - data model and real-time primitives for the OpenASIO
//! driver/host contract.
//!
//! This crate holds everything about a streaming session that does not need a
//! thread or a device: the shapes exchanged across the driver boundary, the
//! rules that gate them, and the allocation-free code that runs every period.
//!
//! # Contents
//!
//! ## Boundary types
//!
//! - [`ResultCode`] / [`Error`] - the result-code taxonomy (zero is success)
//! - [`Version`] - three-part ABI version and [`check_driver_version`]
//! - [`Capabilities`] - immutable capability bit mask
//! - [`StreamConfig`], [`SampleFormat`], [`BufferLayout`] - negotiated stream shape
//! - [`TimeInfo`] - per-period timing handed to the host callback
//!
//! ## Lifecycle
//!
//! - [`SessionState`], [`Operation`] and [`ensure_allowed`] - which control
//!   operation is legal in which state
//!
//! ## Real-time path
//!
//! - [`BufferAdapter`] - device `f32` interleaved ↔ host format/layout
//! - [`Sample`] - per-format clamping conversion
//! - [`TimingTracker`] / [`XrunCounters`] - monotonic stamps and lock-free xrun counts
//!
//! # Design Principles
//!
//! - **Real-time safe**: nothing called per period allocates, locks, or logs
//! - **Immutable once running**: configuration and capabilities are plain
//!   `Copy` values; only xrun counters are shared across threads
//! - **One error channel**: every fallible control operation returns [`Result`]
//!
//! # Example
//!
//! ```rust
//! use openasio_core::{BufferAdapter, Capabilities, SampleFormat, BufferLayout, StreamConfig};
//!
//! let cfg = StreamConfig::default()
//!     .with_channels(0, 2)
//!     .with_format(SampleFormat::I16)
//!     .with_layout(BufferLayout::NonInterleaved);
//! cfg.validate().unwrap();
//! cfg.check_capabilities(Capabilities::OUTPUT).unwrap();
//!
//! let adapter = BufferAdapter::for_output(&cfg);
//! let host = adapter.allocate_host_buffer();
//! let mut device = adapter.allocate_device_buffer();
//! adapter.host_to_device(host.as_samples(), &mut device);
//! assert!(device.iter().all(|&s| s == 0.0));
//! ```

pub mod adapter;
pub mod caps;
pub mod config;
pub mod error;
pub mod format;
pub mod lifecycle;
pub mod sample;
pub mod timing;
pub mod version;

pub use adapter::{BufferAdapter, deinterleave, interleave, plane_range};
pub use caps::Capabilities;
pub use config::{StreamConfig, clamp_buffer_frames};
pub use error::{Error, Result, ResultCode, result_code};
pub use format::{BufferLayout, SampleFormat};
pub use lifecycle::{Operation, SessionState, ensure_allowed};
pub use sample::{Sample, SampleBuffer, Samples, SamplesMut};
pub use timing::{Clock, MonotonicClock, TimeInfo, TimingTracker, XrunCounters, XrunTotals};
pub use version::{Version, check_driver_version};
