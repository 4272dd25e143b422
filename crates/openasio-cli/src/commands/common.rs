//! Shared argument groups and helpers for CLI commands.

use clap::Args;
use openasio_core::{BufferLayout, SampleFormat, StreamConfig};
use openasio_io::{DeviceInfo, Pacing, SimulatedBackend};

/// Stream parameter overrides. Unset flags keep the base value.
#[derive(Args, Debug, Clone, Default)]
pub struct StreamArgs {
    /// Sample rate in Hz
    #[arg(long)]
    pub sample_rate: Option<u32>,

    /// Frames per period
    #[arg(long)]
    pub buffer_frames: Option<u32>,

    /// Capture channels
    #[arg(long)]
    pub in_channels: Option<u16>,

    /// Playback channels
    #[arg(long)]
    pub out_channels: Option<u16>,

    /// Sample format: f32, i16, u16
    #[arg(long)]
    pub format: Option<SampleFormat>,

    /// Buffer layout: interleaved, non-interleaved
    #[arg(long)]
    pub layout: Option<BufferLayout>,
}

impl StreamArgs {
    /// `base` with every flag that was given applied on top.
    pub fn apply(&self, base: StreamConfig) -> StreamConfig {
        StreamConfig {
            sample_rate: self.sample_rate.unwrap_or(base.sample_rate),
            buffer_frames: self.buffer_frames.unwrap_or(base.buffer_frames),
            in_channels: self.in_channels.unwrap_or(base.in_channels),
            out_channels: self.out_channels.unwrap_or(base.out_channels),
            format: self.format.unwrap_or(base.format),
            layout: self.layout.unwrap_or(base.layout),
        }
    }
}

/// The backend every command drives.
pub fn backend(freewheel: bool) -> SimulatedBackend {
    let pacing = if freewheel {
        Pacing::Freewheel
    } else {
        Pacing::Realtime
    };
    SimulatedBackend::with_default_devices().with_pacing(pacing)
}

/// JSON description of a device.
pub fn device_json(info: &DeviceInfo) -> serde_json::Value {
    let caps: Vec<&str> = info.capabilities().flag_names().collect();
    serde_json::json!({
        "id": info.id,
        "name": info.name,
        "max_input_channels": info.max_input_channels,
        "max_output_channels": info.max_output_channels,
        "sample_rates": info.sample_rates,
        "buffer_frames": {
            "min": info.min_buffer_frames,
            "max": info.max_buffer_frames,
            "default": info.default_buffer_frames,
        },
        "formats": info.formats.iter().map(|f| f.name()).collect::<Vec<_>>(),
        "capabilities": caps,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_overrides_only_given_flags() {
        let args = StreamArgs {
            buffer_frames: Some(64),
            format: Some(SampleFormat::I16),
            ..StreamArgs::default()
        };
        let cfg = args.apply(StreamConfig::default());
        assert_eq!(cfg.buffer_frames, 64);
        assert_eq!(cfg.format, SampleFormat::I16);
        assert_eq!(cfg.sample_rate, 48000);
        assert_eq!(cfg.out_channels, 2);
    }

    #[test]
    fn device_json_lists_capabilities() {
        let backend = backend(true);
        let info = &openasio_io::AudioBackend::list_devices(&backend).unwrap()[1];
        let json = device_json(info);
        assert_eq!(json["name"], "Simulated Duplex");
        let caps = json["capabilities"].as_array().unwrap();
        assert!(caps.iter().any(|c| c == "FULL_DUPLEX"));
    }
}
