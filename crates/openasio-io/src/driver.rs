//! Driver-facing contract.
//!
//! [`Driver`] is the operation table a host uses to drive any
//! implementation: ten control operations plus a version query. Instances
//! come from a [`DriverFactory`]; dropping the box destroys the driver
//! (stopping and closing it first if needed).
//!
//! [`load_driver`] is the host-side entry point: it creates a driver and
//! refuses one whose major version differs from [`Version::CURRENT`].

use openasio_core::{Capabilities, Result, StreamConfig, Version, check_driver_version};

use crate::backend::Latency;
use crate::host::HostProcess;
use crate::session::Session;
use crate::simulated::{Pacing, SimulatedBackend};

/// Operation table every driver implements.
pub trait Driver: Send {
    /// ABI version this driver implements.
    fn version(&self) -> Version {
        Version::CURRENT
    }

    /// Names of the devices the driver can open.
    fn query_devices(&mut self) -> Result<Vec<String>>;

    /// Claims a device; returns its identifier.
    fn open_device(&mut self, name: Option<&str>) -> Result<u32>;

    /// Releases the device. Terminal.
    fn close_device(&mut self) -> Result<()>;

    /// Capability mask, fixed once a device is open.
    fn get_caps(&self) -> Result<Capabilities>;

    /// Configuration the device runs without customization.
    fn get_default_config(&self) -> Result<StreamConfig>;

    /// Negotiates `config` and starts streaming.
    fn start(&mut self, config: &StreamConfig) -> Result<()>;

    /// Stops streaming; no callback runs after this returns.
    fn stop(&mut self) -> Result<()>;

    /// Input/output latency in frames.
    fn get_latency(&mut self) -> Result<Latency>;

    /// Changes the sample rate between runs.
    fn set_sample_rate(&mut self, sample_rate: u32) -> Result<()>;

    /// Changes the period size between runs.
    fn set_buffer_frames(&mut self, frames: u32) -> Result<()>;
}

impl Driver for Session {
    fn query_devices(&mut self) -> Result<Vec<String>> {
        Session::query_devices(self)
    }

    fn open_device(&mut self, name: Option<&str>) -> Result<u32> {
        self.open(name)
    }

    fn close_device(&mut self) -> Result<()> {
        self.close()
    }

    fn get_caps(&self) -> Result<Capabilities> {
        Session::get_caps(self)
    }

    fn get_default_config(&self) -> Result<StreamConfig> {
        Session::get_default_config(self)
    }

    fn start(&mut self, config: &StreamConfig) -> Result<()> {
        Session::start(self, config)
    }

    fn stop(&mut self) -> Result<()> {
        Session::stop(self)
    }

    fn get_latency(&mut self) -> Result<Latency> {
        Session::get_latency(self)
    }

    fn set_sample_rate(&mut self, sample_rate: u32) -> Result<()> {
        Session::set_sample_rate(self, sample_rate)
    }

    fn set_buffer_frames(&mut self, frames: u32) -> Result<()> {
        Session::set_buffer_frames(self, frames)
    }
}

/// Creates a driver bound to `host`.
pub type DriverFactory = fn(Box<dyn HostProcess>) -> Result<Box<dyn Driver>>;

/// Factory for the simulated driver with wall-clock pacing.
pub fn simulated_driver(host: Box<dyn HostProcess>) -> Result<Box<dyn Driver>> {
    let backend = SimulatedBackend::with_default_devices();
    Ok(Box::new(Session::new(Box::new(backend), host)))
}

/// Factory for the simulated driver running as fast as the host allows.
pub fn freewheel_driver(host: Box<dyn HostProcess>) -> Result<Box<dyn Driver>> {
    let backend = SimulatedBackend::with_default_devices().with_pacing(Pacing::Freewheel);
    Ok(Box::new(Session::new(Box::new(backend), host)))
}

/// Creates a driver through `factory` and checks its version.
pub fn load_driver(factory: DriverFactory, host: Box<dyn HostProcess>) -> Result<Box<dyn Driver>> {
    let driver = factory(host)?;
    let version = driver.version();
    check_driver_version(version)?;
    tracing::debug!(%version, "driver loaded");
    Ok(driver)
}
