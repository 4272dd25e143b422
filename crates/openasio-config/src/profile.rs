//! Session profile file format and operations.

use serde::{Deserialize, Serialize};
use std::path::Path;

use openasio_core::StreamConfig;

use crate::error::ConfigError;

/// A named device + stream configuration a host can start from.
///
/// # TOML Format
///
/// ```toml
/// name = "studio"
/// description = "Interface at low latency"
/// device = "Duplex"
///
/// [stream]
/// sample_rate = 96000
/// buffer_frames = 64
/// in_channels = 2
/// out_channels = 2
/// format = "i16"
/// layout = "non-interleaved"
/// ```
///
/// `device` is optional and resolved by the backend (substring match);
/// omitted means the default device.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionProfile {
    /// Name of the profile.
    pub name: String,

    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Device name to open.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,

    /// Stream parameters.
    #[serde(default)]
    pub stream: StreamConfig,
}

impl SessionProfile {
    /// A profile with the default stream configuration.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            device: None,
            stream: StreamConfig::default(),
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the device name.
    pub fn with_device(mut self, device: impl Into<String>) -> Self {
        self.device = Some(device.into());
        self
    }

    /// Sets the stream configuration.
    pub fn with_stream(mut self, stream: StreamConfig) -> Self {
        self.stream = stream;
        self
    }

    /// Structural checks: a usable file-stem name and a valid stream.
    ///
    /// Device capabilities are not consulted; that happens at `start`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_valid_name(&self.name) {
            return Err(ConfigError::InvalidName(self.name.clone()));
        }
        self.stream.validate()?;
        Ok(())
    }

    /// Load a profile from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml(&content)
    }

    /// Parse and validate a profile from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let profile: SessionProfile = toml::from_str(toml_str)?;
        profile.validate()?;
        Ok(profile)
    }

    /// Save the profile to a TOML file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        self.validate()?;

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        Ok(())
    }

    /// Convert the profile to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

impl Default for SessionProfile {
    fn default() -> Self {
        Self::new("default")
    }
}

/// Profile names double as file stems: non-empty, no path separators, no
/// leading dot.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ' ' | '.'))
}
