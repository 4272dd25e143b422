//! In-process simulated backend.
//!
//! Stands in for hardware in tests, demos and the CLI. Devices are plain
//! [`DeviceInfo`] values; periods are paced either against the wall clock
//! ([`Pacing::Realtime`]) or as fast as the host can process them
//! ([`Pacing::Freewheel`]).
//!
//! Capture produces a deterministic per-channel ramp so hosts can assert on
//! what they receive. Playback is swallowed, with lock-free
//! [`SimulatedStats`] recording what was written. A [`FaultPlan`] injects
//! xruns and fatal device loss at chosen periods.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use openasio_core::{BufferLayout, Error, Result, SampleFormat, StreamConfig};

use crate::backend::{AudioBackend, BackendStream, DeviceInfo, StreamError};

/// How the simulated stream paces periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pacing {
    /// One period per `buffer_frames / sample_rate` of wall time.
    #[default]
    Realtime,
    /// No waiting between periods.
    Freewheel,
}

/// Faults to inject, by zero-based period index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FaultPlan {
    /// Periods whose capture fails with an xrun.
    pub input_overruns: Vec<u64>,
    /// Periods whose playback fails with an xrun.
    pub output_underruns: Vec<u64>,
    /// Period at which the device is lost.
    pub fatal_at: Option<u64>,
}

impl FaultPlan {
    /// No faults.
    pub fn none() -> Self {
        Self::default()
    }

    /// Adds capture xruns at `periods`.
    #[must_use]
    pub fn with_input_overruns(mut self, periods: impl IntoIterator<Item = u64>) -> Self {
        self.input_overruns.extend(periods);
        self.input_overruns.sort_unstable();
        self
    }

    /// Adds playback xruns at `periods`.
    #[must_use]
    pub fn with_output_underruns(mut self, periods: impl IntoIterator<Item = u64>) -> Self {
        self.output_underruns.extend(periods);
        self.output_underruns.sort_unstable();
        self
    }

    /// Loses the device at `period`.
    #[must_use]
    pub fn with_fatal_at(mut self, period: u64) -> Self {
        self.fatal_at = Some(period);
        self
    }
}

/// Counters written by the simulated stream. Lock-free.
#[derive(Debug, Default)]
pub struct SimulatedStats {
    periods: AtomicU64,
    frames_written: AtomicU64,
    last_peak_bits: AtomicU32,
}

impl SimulatedStats {
    /// Periods the device has started.
    pub fn periods(&self) -> u64 {
        self.periods.load(Ordering::Relaxed)
    }

    /// Frames accepted for playback.
    pub fn frames_written(&self) -> u64 {
        self.frames_written.load(Ordering::Relaxed)
    }

    /// Absolute peak of the most recently accepted playback period.
    pub fn last_peak(&self) -> f32 {
        f32::from_bits(self.last_peak_bits.load(Ordering::Relaxed))
    }

    fn reset(&self) {
        self.periods.store(0, Ordering::Relaxed);
        self.frames_written.store(0, Ordering::Relaxed);
        self.last_peak_bits.store(0, Ordering::Relaxed);
    }
}

/// One simulated device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulatedDevice {
    /// Static description; `id` is reassigned by [`SimulatedBackend::new`].
    pub info: DeviceInfo,
    /// Opening a busy device fails with a device error.
    pub busy: bool,
    /// Faults applied to every run on this device.
    pub faults: FaultPlan,
}

impl SimulatedDevice {
    fn base(name: &str, inputs: u16, outputs: u16) -> DeviceInfo {
        DeviceInfo {
            id: 0,
            name: name.to_owned(),
            max_input_channels: inputs,
            max_output_channels: outputs,
            full_duplex: false,
            sample_rates: vec![44100, 48000, 88200, 96000],
            default_sample_rate: 48000,
            min_buffer_frames: 16,
            max_buffer_frames: 4096,
            default_buffer_frames: 256,
            formats: SampleFormat::ALL.to_vec(),
            layouts: vec![BufferLayout::Interleaved, BufferLayout::NonInterleaved],
            rate_reconfigurable: false,
            buffer_reconfigurable: false,
            safety_offset_frames: 32,
        }
    }

    /// Stereo playback device; rate and period size reconfigurable.
    pub fn output() -> Self {
        let mut info = Self::base("Simulated Output", 0, 2);
        info.rate_reconfigurable = true;
        info.buffer_reconfigurable = true;
        Self::from_info(info)
    }

    /// Stereo full-duplex device; only the rate is reconfigurable.
    pub fn duplex() -> Self {
        let mut info = Self::base("Simulated Duplex", 2, 2);
        info.full_duplex = true;
        info.rate_reconfigurable = true;
        Self::from_info(info)
    }

    /// Stereo capture-only device; fixed rate and period size.
    pub fn input() -> Self {
        Self::from_info(Self::base("Simulated Input", 2, 0))
    }

    /// Wraps an arbitrary description.
    pub fn from_info(info: DeviceInfo) -> Self {
        Self {
            info,
            busy: false,
            faults: FaultPlan::none(),
        }
    }

    /// Marks the device as held by another client.
    #[must_use]
    pub fn busy(mut self) -> Self {
        self.busy = true;
        self
    }

    /// Applies `faults` to every run on this device.
    #[must_use]
    pub fn with_faults(mut self, faults: FaultPlan) -> Self {
        self.faults = faults;
        self
    }
}

/// Backend serving [`SimulatedDevice`]s.
#[derive(Debug)]
pub struct SimulatedBackend {
    devices: Vec<SimulatedDevice>,
    open: Option<u32>,
    pacing: Pacing,
    stats: Arc<SimulatedStats>,
}

impl SimulatedBackend {
    /// Backend over `devices`; ids follow list order.
    pub fn new(devices: Vec<SimulatedDevice>) -> Self {
        let devices = devices
            .into_iter()
            .zip(0u32..)
            .map(|(mut device, id)| {
                device.info.id = id;
                device
            })
            .collect();
        Self {
            devices,
            open: None,
            pacing: Pacing::default(),
            stats: Arc::new(SimulatedStats::default()),
        }
    }

    /// Output, duplex and input devices, in that order.
    pub fn with_default_devices() -> Self {
        Self::new(vec![
            SimulatedDevice::output(),
            SimulatedDevice::duplex(),
            SimulatedDevice::input(),
        ])
    }

    /// Sets the pacing used by streams built after this call.
    #[must_use]
    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    /// Shared stream counters.
    pub fn stats(&self) -> Arc<SimulatedStats> {
        Arc::clone(&self.stats)
    }

    fn resolve(&self, name: Option<&str>) -> Result<&SimulatedDevice> {
        let query = name.map(str::trim).unwrap_or_default();
        if query.is_empty() || query.eq_ignore_ascii_case("default") {
            return self
                .devices
                .first()
                .ok_or_else(|| Error::device("no simulated devices configured"));
        }

        let lower = query.to_lowercase();
        self.devices
            .iter()
            .find(|d| d.info.name.to_lowercase() == lower)
            .or_else(|| {
                self.devices
                    .iter()
                    .find(|d| d.info.name.to_lowercase().contains(&lower))
            })
            .ok_or_else(|| Error::device(format!("no device matching '{query}'")))
    }
}

impl Default for SimulatedBackend {
    fn default() -> Self {
        Self::with_default_devices()
    }
}

impl AudioBackend for SimulatedBackend {
    fn name(&self) -> &str {
        "simulated"
    }

    fn list_devices(&self) -> Result<Vec<DeviceInfo>> {
        Ok(self.devices.iter().map(|d| d.info.clone()).collect())
    }

    fn open_device(&mut self, name: Option<&str>) -> Result<DeviceInfo> {
        let device = self.resolve(name)?;
        if device.busy || self.open.is_some() {
            return Err(Error::device(format!(
                "device '{}' is busy",
                device.info.name
            )));
        }
        let info = device.info.clone();
        self.open = Some(info.id);
        Ok(info)
    }

    fn close_device(&mut self, device_id: u32) -> Result<()> {
        match self.open {
            Some(id) if id == device_id => {
                self.open = None;
                Ok(())
            }
            _ => Err(Error::device(format!("device {device_id} is not open"))),
        }
    }

    fn build_stream(
        &mut self,
        device: &DeviceInfo,
        config: &StreamConfig,
    ) -> Result<Box<dyn BackendStream>> {
        if self.open != Some(device.id) {
            return Err(Error::device(format!("device '{}' is not open", device.name)));
        }
        let faults = self
            .devices
            .iter()
            .find(|d| d.info.id == device.id)
            .map(|d| d.faults.clone())
            .unwrap_or_default();

        self.stats.reset();
        Ok(Box::new(SimulatedStream {
            frames: config.buffer_frames,
            in_channels: usize::from(config.in_channels),
            sample_rate: config.sample_rate,
            period_duration: config.period_duration(),
            pacing: self.pacing,
            next_deadline: None,
            period: 0,
            started: false,
            faults,
            stats: Arc::clone(&self.stats),
        }))
    }
}

/// Length of the capture ramp, in frames.
const RAMP_PERIOD: u64 = 64;

/// Capture value for `channel` at absolute frame `frame`.
///
/// A sawtooth in `[-1, 1)`, phase-shifted per channel.
pub fn ramp_sample(channel: usize, frame: u64) -> f32 {
    let phase = (frame + channel as u64 * 8) % RAMP_PERIOD;
    phase as f32 / (RAMP_PERIOD as f32 / 2.0) - 1.0
}

struct SimulatedStream {
    frames: u32,
    in_channels: usize,
    sample_rate: u32,
    period_duration: Duration,
    pacing: Pacing,
    next_deadline: Option<Instant>,
    period: u64,
    started: bool,
    faults: FaultPlan,
    stats: Arc<SimulatedStats>,
}

impl SimulatedStream {
    fn frame_origin(&self) -> u64 {
        self.period * u64::from(self.frames)
    }
}

impl BackendStream for SimulatedStream {
    fn wait_period(&mut self) -> core::result::Result<(), StreamError> {
        if self.started {
            self.period += 1;
        }
        self.started = true;

        if self.pacing == Pacing::Realtime {
            let now = Instant::now();
            let deadline = self.next_deadline.unwrap_or(now);
            if deadline > now {
                std::thread::sleep(deadline - now);
            }
            self.next_deadline = Some(deadline + self.period_duration);
        }

        self.stats.periods.fetch_add(1, Ordering::Relaxed);
        if self.faults.fatal_at == Some(self.period) {
            return Err(StreamError::Fatal("simulated device lost"));
        }
        Ok(())
    }

    fn read_input(&mut self, buffer: &mut [f32]) -> core::result::Result<(), StreamError> {
        if self.faults.input_overruns.binary_search(&self.period).is_ok() {
            return Err(StreamError::Xrun);
        }
        if self.in_channels == 0 {
            return Ok(());
        }
        let origin = self.frame_origin();
        for (frame, chunk) in (0u64..).zip(buffer.chunks_exact_mut(self.in_channels)) {
            for (channel, sample) in chunk.iter_mut().enumerate() {
                *sample = ramp_sample(channel, origin + frame);
            }
        }
        Ok(())
    }

    fn write_output(&mut self, buffer: &[f32]) -> core::result::Result<(), StreamError> {
        if self.faults.output_underruns.binary_search(&self.period).is_ok() {
            return Err(StreamError::Xrun);
        }
        let peak = buffer.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
        self.stats
            .last_peak_bits
            .store(peak.to_bits(), Ordering::Relaxed);
        self.stats
            .frames_written
            .fetch_add(u64::from(self.frames), Ordering::Relaxed);
        Ok(())
    }

    /// Time at the end of the current period on the device's sample clock.
    fn device_time_ns(&self) -> u64 {
        let frames = self.frame_origin() + u64::from(self.frames);
        let ns = u128::from(frames) * 1_000_000_000 / u128::from(self.sample_rate.max(1));
        u64::try_from(ns).unwrap_or(u64::MAX)
    }
}
