//! Host callback contract.
//!
//! The dispatcher calls [`HostProcess::process`] once per period on the
//! real-time thread with typed views over the session's preallocated
//! buffers. The output view is pre-filled with silence, so a host that writes
//! nothing plays nothing.
//!
//! Buffers are in the negotiated [`SampleFormat`](openasio_core::SampleFormat)
//! and [`BufferLayout`]. Non-interleaved data is one channel-major block;
//! [`AudioInput::channel`] and [`AudioOutput::channel_mut`] hand out the
//! individual planes.

use openasio_core::{
    BufferLayout, Sample, SampleFormat, Samples, SamplesMut, StreamConfig, TimeInfo, plane_range,
};

const fn sample_index(
    layout: BufferLayout,
    channels: usize,
    frames: usize,
    frame: usize,
    channel: usize,
) -> usize {
    match layout {
        BufferLayout::Interleaved => frame * channels + channel,
        BufferLayout::NonInterleaved => channel * frames + frame,
    }
}

/// Read-only view of one period of captured audio.
#[derive(Debug, Clone, Copy)]
pub struct AudioInput<'a> {
    samples: Samples<'a>,
    channels: usize,
    frames: usize,
    layout: BufferLayout,
}

impl<'a> AudioInput<'a> {
    /// Wraps `samples` holding `channels * frames` values in `layout`.
    pub fn new(samples: Samples<'a>, channels: usize, frames: usize, layout: BufferLayout) -> Self {
        debug_assert_eq!(samples.len(), channels * frames);
        Self {
            samples,
            channels,
            frames,
            layout,
        }
    }

    /// Capture channel count (0 when capture is not configured).
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Frames in this period.
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Buffer layout.
    pub fn layout(&self) -> BufferLayout {
        self.layout
    }

    /// Sample format.
    pub fn format(&self) -> SampleFormat {
        self.samples.format()
    }

    /// True when there is nothing to read.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// The whole buffer.
    pub fn samples(&self) -> Samples<'a> {
        self.samples
    }

    /// The whole buffer as `T`, or `None` if `T` is not the negotiated format.
    pub fn typed<T: Sample>(&self) -> Option<&'a [T]> {
        self.samples.typed()
    }

    /// One channel plane. Only available for non-interleaved buffers.
    pub fn channel<T: Sample>(&self, channel: usize) -> Option<&'a [T]> {
        if self.layout != BufferLayout::NonInterleaved || channel >= self.channels {
            return None;
        }
        let range = plane_range(channel, self.frames);
        self.samples.range(range.start, range.end).typed()
    }

    /// Sample at (`frame`, `channel`) as normalized `f32`, regardless of layout.
    #[inline]
    pub fn sample_f32(&self, frame: usize, channel: usize) -> f32 {
        self.samples.get_f32(sample_index(
            self.layout,
            self.channels,
            self.frames,
            frame,
            channel,
        ))
    }
}

/// Writable view of one period of playback audio.
#[derive(Debug)]
pub struct AudioOutput<'a> {
    samples: SamplesMut<'a>,
    channels: usize,
    frames: usize,
    layout: BufferLayout,
}

impl<'a> AudioOutput<'a> {
    /// Wraps `samples` holding `channels * frames` values in `layout`.
    pub fn new(
        samples: SamplesMut<'a>,
        channels: usize,
        frames: usize,
        layout: BufferLayout,
    ) -> Self {
        debug_assert_eq!(samples.len(), channels * frames);
        Self {
            samples,
            channels,
            frames,
            layout,
        }
    }

    /// Playback channel count (0 when playback is not configured).
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Frames in this period.
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Buffer layout.
    pub fn layout(&self) -> BufferLayout {
        self.layout
    }

    /// Sample format.
    pub fn format(&self) -> SampleFormat {
        self.samples.format()
    }

    /// True when there is nothing to write.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// The whole buffer.
    pub fn samples_mut(&mut self) -> SamplesMut<'_> {
        self.samples.reborrow()
    }

    /// The whole buffer as `T`, or `None` if `T` is not the negotiated format.
    pub fn typed_mut<T: Sample>(&mut self) -> Option<&mut [T]> {
        self.samples.reborrow().typed()
    }

    /// One channel plane. Only available for non-interleaved buffers.
    pub fn channel_mut<T: Sample>(&mut self, channel: usize) -> Option<&mut [T]> {
        if self.layout != BufferLayout::NonInterleaved || channel >= self.channels {
            return None;
        }
        let range = plane_range(channel, self.frames);
        self.samples.reborrow().range(range.start, range.end).typed()
    }

    /// Writes normalized `value` at (`frame`, `channel`), converting and
    /// clamping to the negotiated format.
    #[inline]
    pub fn set_f32(&mut self, frame: usize, channel: usize, value: f32) {
        let index = sample_index(self.layout, self.channels, self.frames, frame, channel);
        self.samples.set_f32(index, value);
    }

    /// Resets the whole buffer to the format's silence value.
    pub fn fill_silence(&mut self) {
        self.samples.fill_silence();
    }
}

/// Host-side processing callback.
///
/// ## Real-Time Safety
///
/// [`process`](Self::process) runs on the dispatcher thread. It must not
/// allocate, lock, log, or block. The other methods run on the control
/// thread while no period is in flight.
pub trait HostProcess: Send {
    /// Processes one period. Return `false` to stop streaming; the output
    /// written in that call is not played.
    fn process(
        &mut self,
        input: &AudioInput<'_>,
        output: &mut AudioOutput<'_>,
        frames: u32,
        time: &TimeInfo,
        config: &StreamConfig,
    ) -> bool;

    /// Reported latency changed after a reconfiguration.
    fn latency_changed(&mut self, _input_frames: u32, _output_frames: u32) {}

    /// The driver needs the host to reset: the stream stopped because of a
    /// device fault.
    fn reset_request(&mut self) {}
}

impl<H: HostProcess + ?Sized> HostProcess for Box<H> {
    fn process(
        &mut self,
        input: &AudioInput<'_>,
        output: &mut AudioOutput<'_>,
        frames: u32,
        time: &TimeInfo,
        config: &StreamConfig,
    ) -> bool {
        (**self).process(input, output, frames, time, config)
    }

    fn latency_changed(&mut self, input_frames: u32, output_frames: u32) {
        (**self).latency_changed(input_frames, output_frames);
    }

    fn reset_request(&mut self) {
        (**self).reset_request();
    }
}

/// [`HostProcess`] backed by a closure. Build with [`host_fn`].
pub struct FnHost<F> {
    process: F,
}

impl<F> core::fmt::Debug for FnHost<F> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FnHost").finish_non_exhaustive()
    }
}

/// Wraps a closure as a [`HostProcess`].
///
/// ```rust
/// use openasio_io::{AudioInput, AudioOutput, host_fn};
///
/// let host = host_fn(|_in: &AudioInput<'_>, out: &mut AudioOutput<'_>, frames, _time, _cfg| {
///     for frame in 0..frames as usize {
///         for ch in 0..out.channels() {
///             out.set_f32(frame, ch, 0.1);
///         }
///     }
///     true
/// });
/// # let _ = host;
/// ```
pub fn host_fn<F>(process: F) -> FnHost<F>
where
    F: FnMut(&AudioInput<'_>, &mut AudioOutput<'_>, u32, &TimeInfo, &StreamConfig) -> bool + Send,
{
    FnHost { process }
}

impl<F> HostProcess for FnHost<F>
where
    F: FnMut(&AudioInput<'_>, &mut AudioOutput<'_>, u32, &TimeInfo, &StreamConfig) -> bool + Send,
{
    fn process(
        &mut self,
        input: &AudioInput<'_>,
        output: &mut AudioOutput<'_>,
        frames: u32,
        time: &TimeInfo,
        config: &StreamConfig,
    ) -> bool {
        (self.process)(input, output, frames, time, config)
    }
}
