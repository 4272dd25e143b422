//! Stream configuration and its validation rules.

use core::time::Duration;

use crate::caps::Capabilities;
use crate::error::{Error, Result};
use crate::format::{BufferLayout, SampleFormat};

/// Negotiated stream parameters.
///
/// Defaults to 48 kHz, 256 frames, stereo output, `f32`, interleaved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StreamConfig {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Frames per period. Drivers may clamp this to the device's range.
    pub buffer_frames: u32,
    /// Capture channels.
    #[cfg_attr(feature = "serde", serde(default))]
    pub in_channels: u16,
    /// Playback channels.
    #[cfg_attr(feature = "serde", serde(default))]
    pub out_channels: u16,
    /// Sample encoding seen by the host callback.
    pub format: SampleFormat,
    /// Buffer layout seen by the host callback.
    pub layout: BufferLayout,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            buffer_frames: 256,
            in_channels: 0,
            out_channels: 2,
            format: SampleFormat::F32,
            layout: BufferLayout::Interleaved,
        }
    }
}

impl StreamConfig {
    /// Returns a copy with a different sample rate.
    #[must_use]
    pub const fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Returns a copy with a different period size.
    #[must_use]
    pub const fn with_buffer_frames(mut self, buffer_frames: u32) -> Self {
        self.buffer_frames = buffer_frames;
        self
    }

    /// Returns a copy with different channel counts.
    #[must_use]
    pub const fn with_channels(mut self, in_channels: u16, out_channels: u16) -> Self {
        self.in_channels = in_channels;
        self.out_channels = out_channels;
        self
    }

    /// Returns a copy with a different sample format.
    #[must_use]
    pub const fn with_format(mut self, format: SampleFormat) -> Self {
        self.format = format;
        self
    }

    /// Returns a copy with a different layout.
    #[must_use]
    pub const fn with_layout(mut self, layout: BufferLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Whether capture is requested.
    pub const fn has_input(&self) -> bool {
        self.in_channels > 0
    }

    /// Whether playback is requested.
    pub const fn has_output(&self) -> bool {
        self.out_channels > 0
    }

    /// Whether both directions are requested.
    pub const fn is_duplex(&self) -> bool {
        self.has_input() && self.has_output()
    }

    /// Capture samples per period (`frames * in_channels`).
    pub const fn input_samples(&self) -> usize {
        self.buffer_frames as usize * self.in_channels as usize
    }

    /// Playback samples per period (`frames * out_channels`).
    pub const fn output_samples(&self) -> usize {
        self.buffer_frames as usize * self.out_channels as usize
    }

    /// Wall-clock length of one period.
    ///
    /// Zero for a zero sample rate; callers validate first.
    pub fn period_duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        let nanos = u64::from(self.buffer_frames) * 1_000_000_000 / u64::from(self.sample_rate);
        Duration::from_nanos(nanos)
    }

    /// Structural checks that do not depend on any device.
    ///
    /// Fails with [`Error::InvalidArg`] for a zero sample rate, zero period
    /// size, or no channels in either direction.
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(Error::invalid_arg("sample rate must be > 0"));
        }
        if self.buffer_frames == 0 {
            return Err(Error::invalid_arg("buffer frames must be > 0"));
        }
        if !self.has_input() && !self.has_output() {
            return Err(Error::invalid_arg(
                "at least one input or output channel is required",
            ));
        }
        Ok(())
    }

    /// Checks the channel combination against a capability mask.
    ///
    /// Fails with [`Error::Unsupported`] when input is requested without the
    /// input bit, output without the output bit, or both without full duplex.
    pub fn check_capabilities(&self, caps: Capabilities) -> Result<()> {
        if self.has_input() && !caps.supports_input() {
            return Err(Error::unsupported("device has no input capability"));
        }
        if self.has_output() && !caps.supports_output() {
            return Err(Error::unsupported("device has no output capability"));
        }
        if self.is_duplex() && !caps.supports_full_duplex() {
            return Err(Error::unsupported("device cannot run input and output together"));
        }
        Ok(())
    }
}

/// Clamps `frames` into `[min, max]`.
///
/// Zero is left alone so that validation can reject it.
pub fn clamp_buffer_frames(frames: u32, min: u32, max: u32) -> u32 {
    if frames == 0 {
        return 0;
    }
    let clamped = frames.clamp(min, max.max(min));
    #[cfg(feature = "tracing")]
    if clamped != frames {
        tracing::debug!(requested = frames, clamped, "buffer frames clamped to device range");
    }
    clamped
}
