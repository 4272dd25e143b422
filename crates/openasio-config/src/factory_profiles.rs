//! Built-in profiles, always available without files on disk.

use crate::SessionProfile;

/// Names of the factory profiles.
pub static FACTORY_PROFILE_NAMES: &[&str] = &["default-stereo", "duplex-i16"];

static FACTORY_PROFILES_TOML: &[(&str, &str)] = &[
    ("default-stereo", DEFAULT_STEREO),
    ("duplex-i16", DUPLEX_I16),
];

const DEFAULT_STEREO: &str = r#"
name = "default-stereo"
description = "Stereo playback, 48 kHz, 256-frame periods, float"

[stream]
sample_rate = 48000
buffer_frames = 256
in_channels = 0
out_channels = 2
format = "f32"
layout = "interleaved"
"#;

const DUPLEX_I16: &str = r#"
name = "duplex-i16"
description = "Stereo in/out, 48 kHz, 128-frame periods, 16-bit planar"
device = "duplex"

[stream]
sample_rate = 48000
buffer_frames = 128
in_channels = 2
out_channels = 2
format = "i16"
layout = "non-interleaved"
"#;

/// Looks up a factory profile by name (case-insensitive).
pub fn get_factory_profile(name: &str) -> Option<SessionProfile> {
    FACTORY_PROFILES_TOML
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .and_then(|(_, toml)| SessionProfile::from_toml(toml).ok())
}

/// Every factory profile.
pub fn factory_profiles() -> Vec<SessionProfile> {
    FACTORY_PROFILES_TOML
        .iter()
        .filter_map(|(_, toml)| SessionProfile::from_toml(toml).ok())
        .collect()
}
