//! Buffer Adapter: layout and format translation between the backend's
//! device buffers and the host callback's buffers.
//!
//! Backends exchange interleaved normalized `f32` ("device" side). The host
//! sees whatever the stream configuration asks for ("host" side). All storage
//! is sized by [`BufferAdapter::allocate_host_buffer`] and
//! [`BufferAdapter::allocate_device_buffer`] on the control thread when a
//! stream starts; [`BufferAdapter::device_to_host`] and
//! [`BufferAdapter::host_to_device`] only index into it.
//!
//! Non-interleaved data lives in one contiguous block, channel after channel,
//! so a per-channel view is just a sub-slice (see [`plane_range`]).

use crate::config::StreamConfig;
use crate::format::{BufferLayout, SampleFormat};
use crate::sample::{Sample, SampleBuffer, Samples, SamplesMut};

/// Copies channel-major `planar` data into frame-major `interleaved` data.
///
/// `planar.len()` must equal `interleaved.len()` and be a multiple of
/// `channels`. Does nothing when `channels` is zero.
pub fn interleave<T: Copy>(planar: &[T], interleaved: &mut [T], channels: usize) {
    debug_assert_eq!(planar.len(), interleaved.len());
    if channels == 0 {
        return;
    }
    let frames = planar.len() / channels;
    for (ch, plane) in planar.chunks_exact(frames.max(1)).take(channels).enumerate() {
        for (frame, &sample) in plane.iter().enumerate() {
            interleaved[frame * channels + ch] = sample;
        }
    }
}

/// Copies frame-major `interleaved` data into channel-major `planar` data.
///
/// Inverse of [`interleave`].
pub fn deinterleave<T: Copy>(interleaved: &[T], planar: &mut [T], channels: usize) {
    debug_assert_eq!(planar.len(), interleaved.len());
    if channels == 0 {
        return;
    }
    let frames = interleaved.len() / channels;
    for (frame, samples) in interleaved.chunks_exact(channels).enumerate() {
        for (ch, &sample) in samples.iter().enumerate() {
            planar[ch * frames + frame] = sample;
        }
    }
}

/// Index range of channel `channel` inside a non-interleaved block.
pub const fn plane_range(channel: usize, frames: usize) -> core::ops::Range<usize> {
    channel * frames..(channel + 1) * frames
}

/// Per-direction translator fixed at stream start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferAdapter {
    channels: usize,
    frames: usize,
    format: SampleFormat,
    layout: BufferLayout,
}

impl BufferAdapter {
    /// Create an adapter for `channels` channels of `frames` frames.
    pub const fn new(
        channels: usize,
        frames: usize,
        format: SampleFormat,
        layout: BufferLayout,
    ) -> Self {
        Self {
            channels,
            frames,
            format,
            layout,
        }
    }

    /// Adapter for the capture direction of `config`.
    pub fn for_input(config: &StreamConfig) -> Self {
        Self::new(
            usize::from(config.in_channels),
            config.buffer_frames as usize,
            config.format,
            config.layout,
        )
    }

    /// Adapter for the playback direction of `config`.
    pub fn for_output(config: &StreamConfig) -> Self {
        Self::new(
            usize::from(config.out_channels),
            config.buffer_frames as usize,
            config.format,
            config.layout,
        )
    }

    /// Channel count.
    pub const fn channels(&self) -> usize {
        self.channels
    }

    /// Frames per period.
    pub const fn frames(&self) -> usize {
        self.frames
    }

    /// Host-side format.
    pub const fn format(&self) -> SampleFormat {
        self.format
    }

    /// Host-side layout.
    pub const fn layout(&self) -> BufferLayout {
        self.layout
    }

    /// Samples per period on either side.
    pub const fn len(&self) -> usize {
        self.channels * self.frames
    }

    /// Whether this direction carries no samples.
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Allocates the host-side period buffer. Control thread only.
    pub fn allocate_host_buffer(&self) -> SampleBuffer {
        SampleBuffer::silent(self.format, self.len())
    }

    /// Allocates the device-side period buffer. Control thread only.
    pub fn allocate_device_buffer(&self) -> Vec<f32> {
        vec![0.0; self.len()]
    }

    /// Converts one period of device samples into the host buffer.
    ///
    /// Real-time safe: no allocation.
    pub fn device_to_host(&self, device: &[f32], host: SamplesMut<'_>) {
        match host {
            SamplesMut::F32(dst) => self.device_to_host_typed(device, dst),
            SamplesMut::I16(dst) => self.device_to_host_typed(device, dst),
            SamplesMut::U16(dst) => self.device_to_host_typed(device, dst),
        }
    }

    /// Converts one period of host samples into the device buffer.
    ///
    /// Real-time safe: no allocation.
    pub fn host_to_device(&self, host: Samples<'_>, device: &mut [f32]) {
        match host {
            Samples::F32(src) => self.host_to_device_typed(src, device),
            Samples::I16(src) => self.host_to_device_typed(src, device),
            Samples::U16(src) => self.host_to_device_typed(src, device),
        }
    }

    fn device_to_host_typed<T: Sample>(&self, device: &[f32], host: &mut [T]) {
        let len = self.len();
        debug_assert!(device.len() >= len && host.len() >= len);
        if self.channels == 0 {
            return;
        }
        let device = &device[..len];
        match self.layout {
            BufferLayout::Interleaved => {
                for (dst, &src) in host[..len].iter_mut().zip(device) {
                    *dst = T::from_f32(src);
                }
            }
            BufferLayout::NonInterleaved => {
                for (frame, samples) in device.chunks_exact(self.channels).enumerate() {
                    for (ch, &src) in samples.iter().enumerate() {
                        host[ch * self.frames + frame] = T::from_f32(src);
                    }
                }
            }
        }
    }

    fn host_to_device_typed<T: Sample>(&self, host: &[T], device: &mut [f32]) {
        let len = self.len();
        debug_assert!(device.len() >= len && host.len() >= len);
        if self.channels == 0 {
            return;
        }
        let device = &mut device[..len];
        match self.layout {
            BufferLayout::Interleaved => {
                for (dst, &src) in device.iter_mut().zip(&host[..len]) {
                    *dst = src.to_f32();
                }
            }
            BufferLayout::NonInterleaved => {
                for (frame, samples) in device.chunks_exact_mut(self.channels).enumerate() {
                    for (ch, dst) in samples.iter_mut().enumerate() {
                        *dst = host[ch * self.frames + frame].to_f32();
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interleave_stereo() {
        let planar = [1, 2, 3, 10, 20, 30];
        let mut inter = [0; 6];
        interleave(&planar, &mut inter, 2);
        assert_eq!(inter, [1, 10, 2, 20, 3, 30]);

        let mut back = [0; 6];
        deinterleave(&inter, &mut back, 2);
        assert_eq!(back, planar);
    }

    #[test]
    fn zero_channels_is_a_no_op() {
        let mut out: [f32; 0] = [];
        interleave(&[], &mut out, 0);
        deinterleave(&[], &mut out, 0);
    }

    #[test]
    fn plane_ranges() {
        assert_eq!(plane_range(0, 4), 0..4);
        assert_eq!(plane_range(2, 4), 8..12);
    }

    #[test]
    fn device_to_host_non_interleaved_i16() {
        let adapter = BufferAdapter::new(2, 2, SampleFormat::I16, BufferLayout::NonInterleaved);
        let device = [1.0, -1.0, 0.0, 0.5];
        let mut host = adapter.allocate_host_buffer();
        adapter.device_to_host(&device, host.as_samples_mut());
        let expected = SampleBuffer::I16(vec![i16::MAX, 0, i16::MIN, i16::from_f32(0.5)]);
        assert_eq!(host, expected);
    }

    #[test]
    fn host_to_device_interleaved_f32() {
        let adapter = BufferAdapter::new(2, 2, SampleFormat::F32, BufferLayout::Interleaved);
        let host = SampleBuffer::F32(vec![0.1, 0.2, 0.3, 0.4]);
        let mut device = adapter.allocate_device_buffer();
        adapter.host_to_device(host.as_samples(), &mut device);
        assert_eq!(device, vec![0.1, 0.2, 0.3, 0.4]);
    }

    #[test]
    fn roundtrip_through_device_is_exact_for_u16() {
        let adapter = BufferAdapter::new(3, 4, SampleFormat::U16, BufferLayout::NonInterleaved);
        let original: Vec<u16> = (0..12).map(|i| (i * 5000) as u16).collect();
        let host = SampleBuffer::U16(original.clone());
        let mut device = adapter.allocate_device_buffer();
        adapter.host_to_device(host.as_samples(), &mut device);

        let mut back = adapter.allocate_host_buffer();
        adapter.device_to_host(&device, back.as_samples_mut());
        assert_eq!(back, SampleBuffer::U16(original));
    }

    #[test]
    fn sizes_follow_config() {
        let cfg = StreamConfig::default().with_channels(1, 2).with_buffer_frames(64);
        assert_eq!(BufferAdapter::for_input(&cfg).len(), 64);
        assert_eq!(BufferAdapter::for_output(&cfg).len(), 128);
        assert!(BufferAdapter::for_input(&cfg.with_channels(0, 2)).is_empty());
    }
}
