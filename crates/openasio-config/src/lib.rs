//! Session profiles for OpenASIO hosts.
//!
//! A [`SessionProfile`] names a device and a [`StreamConfig`](openasio_core::StreamConfig)
//! so a host can start a session from a TOML file instead of flags.
//!
//! # Features
//!
//! - **Profiles**: load, validate and save TOML profiles
//! - **Paths**: platform-specific profile directory and lookup by name or path
//! - **Factory profiles**: built-in `default-stereo` and `duplex-i16`
//!
//! # Example
//!
//! ```rust,no_run
//! use openasio_config::{SessionProfile, get_factory_profile, paths};
//!
//! let profile = get_factory_profile("duplex-i16").unwrap();
//! profile.save(paths::user_profiles_dir().join("duplex-i16.toml")).unwrap();
//!
//! let loaded = SessionProfile::load(paths::find_profile("duplex-i16").unwrap()).unwrap();
//! assert_eq!(loaded, profile);
//! ```

mod error;
mod profile;

/// Built-in profiles.
pub mod factory_profiles;

/// Platform-specific paths for profiles.
pub mod paths;

pub use error::ConfigError;
pub use factory_profiles::{FACTORY_PROFILE_NAMES, factory_profiles, get_factory_profile};
pub use paths::{find_profile, list_user_profiles, user_profiles_dir};
pub use profile::{SessionProfile, is_valid_name};

/// Resolves a profile by factory name, file path, or user profile name, in
/// that order.
pub fn resolve_profile(name: &str) -> Result<SessionProfile, ConfigError> {
    resolve_profile_in(&user_profiles_dir(), name)
}

/// [`resolve_profile`] against an explicit profile directory.
pub fn resolve_profile_in(
    dir: &std::path::Path,
    name: &str,
) -> Result<SessionProfile, ConfigError> {
    if let Some(profile) = get_factory_profile(name) {
        return Ok(profile);
    }
    match paths::find_profile_in(dir, name) {
        Some(path) => SessionProfile::load(path),
        None => Err(ConfigError::ProfileNotFound(name.to_string())),
    }
}
