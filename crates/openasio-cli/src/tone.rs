//! Sine test-tone host.

use std::f32::consts::TAU;

use openasio_core::{StreamConfig, TimeInfo};
use openasio_io::{AudioInput, AudioOutput, HostProcess};

/// Writes a sine to every output channel and optionally stops after a fixed
/// number of periods.
#[derive(Debug, Clone)]
pub struct ToneHost {
    frequency: f32,
    amplitude: f32,
    phase: f32,
    remaining: Option<u64>,
}

impl ToneHost {
    /// Tone at `frequency` Hz and linear `amplitude`, running for
    /// `periods` periods (forever when `None`).
    pub fn new(frequency: f32, amplitude: f32, periods: Option<u64>) -> Self {
        Self {
            frequency,
            amplitude: amplitude.clamp(0.0, 1.0),
            phase: 0.0,
            remaining: periods,
        }
    }
}

impl HostProcess for ToneHost {
    fn process(
        &mut self,
        _input: &AudioInput<'_>,
        output: &mut AudioOutput<'_>,
        frames: u32,
        _time: &TimeInfo,
        config: &StreamConfig,
    ) -> bool {
        let increment = TAU * self.frequency / config.sample_rate as f32;
        for frame in 0..frames as usize {
            let value = self.phase.sin() * self.amplitude;
            for channel in 0..output.channels() {
                output.set_f32(frame, channel, value);
            }
            self.phase += increment;
            if self.phase >= TAU {
                self.phase -= TAU;
            }
        }

        match self.remaining.as_mut() {
            Some(left) => {
                *left = left.saturating_sub(1);
                *left > 0
            }
            None => true,
        }
    }

    fn latency_changed(&mut self, input_frames: u32, output_frames: u32) {
        tracing::info!(input_frames, output_frames, "latency changed");
    }

    fn reset_request(&mut self) {
        tracing::warn!("driver requested a reset");
        self.phase = 0.0;
    }
}
