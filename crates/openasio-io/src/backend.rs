//! Backend collaborator interfaces.
//!
//! The session never touches hardware. It talks to an [`AudioBackend`] on the
//! control thread (enumeration, open/close, latency, stream construction) and
//! hands the resulting [`BackendStream`] to the real-time dispatcher, which
//! owns it for the lifetime of one run.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────┐
//! │   Session (control thread)   │
//! └──────┬────────────────┬──────┘
//!        │ AudioBackend   │ build_stream
//!        ▼                ▼
//! ┌─────────────┐  ┌──────────────────────────┐
//! │ enumerate   │  │ BackendStream (RT thread)│
//! │ open/close  │  │ wait_period / read_input │
//! │ latency     │  │ write_output             │
//! └─────────────┘  └──────────────────────────┘
//! ```
//!
//! Stream buffers are always interleaved normalized `f32`; the session's
//! buffer adapter converts to whatever the host asked for.

use openasio_core::{
    BufferLayout, Capabilities, Error, Result, SampleFormat, StreamConfig, clamp_buffer_frames,
};

/// Static description of a device, as reported by the backend at open time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Backend-assigned identifier (non-negative).
    pub id: u32,
    /// Human-readable name.
    pub name: String,
    /// Maximum capture channels (0 = no capture).
    pub max_input_channels: u16,
    /// Maximum playback channels (0 = no playback).
    pub max_output_channels: u16,
    /// Whether capture and playback can run together.
    pub full_duplex: bool,
    /// Supported sample rates in Hz.
    pub sample_rates: Vec<u32>,
    /// Rate used by the default configuration.
    pub default_sample_rate: u32,
    /// Smallest period size in frames.
    pub min_buffer_frames: u32,
    /// Largest period size in frames.
    pub max_buffer_frames: u32,
    /// Period size used by the default configuration.
    pub default_buffer_frames: u32,
    /// Host-visible sample formats the driver can produce.
    pub formats: Vec<SampleFormat>,
    /// Host-visible layouts the driver can produce.
    pub layouts: Vec<BufferLayout>,
    /// Sample rate may be changed between runs.
    pub rate_reconfigurable: bool,
    /// Period size may be changed between runs.
    pub buffer_reconfigurable: bool,
    /// Extra frames of latency beyond one period.
    pub safety_offset_frames: u32,
}

impl DeviceInfo {
    /// Capability mask derived from this description.
    pub fn capabilities(&self) -> Capabilities {
        let mut bits = 0;
        if self.max_output_channels > 0 {
            bits |= Capabilities::OUTPUT.bits();
        }
        if self.max_input_channels > 0 {
            bits |= Capabilities::INPUT.bits();
        }
        if self.full_duplex && self.max_input_channels > 0 && self.max_output_channels > 0 {
            bits |= Capabilities::FULL_DUPLEX.bits();
        }
        if self.rate_reconfigurable {
            bits |= Capabilities::SET_SAMPLE_RATE.bits();
        }
        if self.buffer_reconfigurable {
            bits |= Capabilities::SET_BUFFER_FRAMES.bits();
        }
        Capabilities::from_bits_truncate(bits)
    }

    /// Default stream configuration for this device.
    ///
    /// Stereo (or fewer) playback; capture is included only on full-duplex or
    /// input-only devices.
    pub fn default_config(&self) -> StreamConfig {
        let out_channels = self.max_output_channels.min(2);
        let in_channels = if self.full_duplex || out_channels == 0 {
            self.max_input_channels.min(2)
        } else {
            0
        };
        StreamConfig {
            sample_rate: self.default_sample_rate,
            buffer_frames: self.default_buffer_frames,
            in_channels,
            out_channels,
            format: self.formats.first().copied().unwrap_or(SampleFormat::F32),
            layout: self.layouts.first().copied().unwrap_or(BufferLayout::Interleaved),
        }
    }

    /// Validates `requested` against this device and returns the config the
    /// driver will actually run.
    ///
    /// Structural problems fail with [`Error::InvalidArg`]; anything the device
    /// cannot do fails with [`Error::Unsupported`]. The period size is clamped
    /// into `[min_buffer_frames, max_buffer_frames]`.
    pub fn negotiate(&self, requested: &StreamConfig) -> Result<StreamConfig> {
        requested.validate()?;
        requested.check_capabilities(self.capabilities())?;

        if requested.in_channels > self.max_input_channels {
            return Err(Error::unsupported(format!(
                "{} input channels requested, '{}' has {}",
                requested.in_channels, self.name, self.max_input_channels
            )));
        }
        if requested.out_channels > self.max_output_channels {
            return Err(Error::unsupported(format!(
                "{} output channels requested, '{}' has {}",
                requested.out_channels, self.name, self.max_output_channels
            )));
        }
        if !self.sample_rates.contains(&requested.sample_rate) {
            return Err(Error::unsupported(format!(
                "sample rate {} Hz not supported by '{}'",
                requested.sample_rate, self.name
            )));
        }
        if !self.formats.contains(&requested.format) {
            return Err(Error::unsupported(format!(
                "sample format {} not supported by '{}'",
                requested.format, self.name
            )));
        }
        if !self.layouts.contains(&requested.layout) {
            return Err(Error::unsupported(format!(
                "{} layout not supported by '{}'",
                requested.layout, self.name
            )));
        }

        let frames = clamp_buffer_frames(
            requested.buffer_frames,
            self.min_buffer_frames,
            self.max_buffer_frames,
        );
        Ok(requested.with_buffer_frames(frames))
    }
}

/// Input/output latency in frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Latency {
    /// Capture latency (0 when no capture is configured).
    pub input_frames: u32,
    /// Playback latency.
    pub output_frames: u32,
}

/// Per-period I/O failure reported by a [`BackendStream`].
///
/// Carries only static text so that producing it never allocates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum StreamError {
    /// The period's data could not be exchanged in time. Transient.
    #[error("xrun")]
    Xrun,

    /// The device is gone or unusable. The run ends.
    #[error("fatal device error: {0}")]
    Fatal(&'static str),
}

/// Control-plane backend interface.
///
/// Object safe, so sessions hold `Box<dyn AudioBackend>` and backends can be
/// chosen at runtime.
pub trait AudioBackend: Send {
    /// Human-readable backend name (e.g. "simulated").
    fn name(&self) -> &str;

    /// Every device this backend can open.
    fn list_devices(&self) -> Result<Vec<DeviceInfo>>;

    /// Resolves and claims a device. `None`, `""` and `"default"` select the
    /// backend's default device.
    ///
    /// Fails with [`Error::Device`] when nothing matches or the device is busy.
    fn open_device(&mut self, name: Option<&str>) -> Result<DeviceInfo>;

    /// Releases a device claimed by [`open_device`](Self::open_device).
    fn close_device(&mut self, device_id: u32) -> Result<()>;

    /// Builds the real-time half for one run of `config` on `device`.
    ///
    /// Called on the control thread; may allocate.
    fn build_stream(
        &mut self,
        device: &DeviceInfo,
        config: &StreamConfig,
    ) -> Result<Box<dyn BackendStream>>;

    /// Latency for `config` on `device`.
    ///
    /// Default: one period plus the device safety offset, input only when
    /// capture is configured.
    fn latency(&self, device: &DeviceInfo, config: &StreamConfig) -> Latency {
        let frames = config.buffer_frames + device.safety_offset_frames;
        Latency {
            input_frames: if config.has_input() { frames } else { 0 },
            output_frames: if config.has_output() { frames } else { 0 },
        }
    }
}

/// Real-time half of a backend, owned by the dispatcher thread.
///
/// ## Real-Time Safety
///
/// Every method runs on the audio thread once per period. Implementations
/// must not allocate or take locks; [`wait_period`](Self::wait_period) is the
/// only place allowed to block, and only until the next period boundary.
pub trait BackendStream: Send {
    /// Blocks until the device is ready for the next period.
    fn wait_period(&mut self) -> core::result::Result<(), StreamError>;

    /// Fills `buffer` (interleaved `f32`, `frames * in_channels`) with captured audio.
    fn read_input(&mut self, buffer: &mut [f32]) -> core::result::Result<(), StreamError>;

    /// Submits `buffer` (interleaved `f32`, `frames * out_channels`) for playback.
    fn write_output(&mut self, buffer: &[f32]) -> core::result::Result<(), StreamError>;

    /// Device clock in nanoseconds, `0` when unknown.
    fn device_time_ns(&self) -> u64 {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device() -> DeviceInfo {
        DeviceInfo {
            id: 0,
            name: "Test".into(),
            max_input_channels: 2,
            max_output_channels: 2,
            full_duplex: false,
            sample_rates: vec![44100, 48000],
            default_sample_rate: 48000,
            min_buffer_frames: 32,
            max_buffer_frames: 1024,
            default_buffer_frames: 256,
            formats: vec![SampleFormat::F32],
            layouts: vec![BufferLayout::Interleaved],
            rate_reconfigurable: true,
            buffer_reconfigurable: false,
            safety_offset_frames: 16,
        }
    }

    #[test]
    fn capabilities_from_description() {
        let caps = device().capabilities();
        assert!(caps.supports_input());
        assert!(caps.supports_output());
        assert!(!caps.supports_full_duplex());
        assert!(caps.can_set_sample_rate());
        assert!(!caps.can_set_buffer_frames());
    }

    #[test]
    fn default_config_is_output_only_without_duplex() {
        let cfg = device().default_config();
        assert_eq!((cfg.in_channels, cfg.out_channels), (0, 2));
        assert_eq!(cfg.buffer_frames, 256);
        assert!(device().negotiate(&cfg).is_ok());
    }

    #[test]
    fn negotiate_rejects_what_the_device_lacks() {
        let dev = device();
        let base = dev.default_config();
        for cfg in [
            base.with_sample_rate(96000),
            base.with_format(SampleFormat::I16),
            base.with_layout(BufferLayout::NonInterleaved),
            base.with_channels(0, 8),
            base.with_channels(2, 2),
        ] {
            assert!(
                matches!(dev.negotiate(&cfg), Err(Error::Unsupported(_))),
                "{cfg:?}"
            );
        }
    }

    #[test]
    fn negotiate_checks_structure_first() {
        let dev = device();
        let cfg = dev.default_config().with_sample_rate(0).with_format(SampleFormat::I16);
        assert!(matches!(dev.negotiate(&cfg), Err(Error::InvalidArg(_))));
    }

    #[test]
    fn negotiate_clamps_period() {
        let dev = device();
        let cfg = dev.default_config().with_buffer_frames(8);
        assert_eq!(dev.negotiate(&cfg).unwrap().buffer_frames, 32);
    }

    #[test]
    fn stream_error_display() {
        assert_eq!(StreamError::Xrun.to_string(), "xrun");
        assert_eq!(
            StreamError::Fatal("unplugged").to_string(),
            "fatal device error: unplugged"
        );
    }
}
