//! Integration tests for profile files on disk.

use openasio_config::{
    ConfigError, SessionProfile, factory_profiles, paths, resolve_profile_in,
};
use openasio_core::{BufferLayout, SampleFormat, StreamConfig};
use tempfile::TempDir;

#[test]
fn save_then_load_through_profile_dir() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("nested").join("profiles");
    let profile = SessionProfile::new("studio")
        .with_description("96k planar")
        .with_device("Duplex")
        .with_stream(
            StreamConfig::default()
                .with_sample_rate(96000)
                .with_buffer_frames(64)
                .with_channels(2, 2)
                .with_format(SampleFormat::I16)
                .with_layout(BufferLayout::NonInterleaved),
        );

    profile.save(paths::profile_path_in(&dir, &profile.name)).unwrap();
    assert_eq!(paths::list_profiles_in(&dir).len(), 1);
    assert_eq!(resolve_profile_in(&dir, "studio").unwrap(), profile);
}

#[test]
fn factory_names_win_over_files() {
    let temp = TempDir::new().unwrap();
    let shadow = SessionProfile::new("default-stereo")
        .with_stream(StreamConfig::default().with_buffer_frames(1024));
    shadow
        .save(paths::profile_path_in(temp.path(), "default-stereo"))
        .unwrap();

    let resolved = resolve_profile_in(temp.path(), "default-stereo").unwrap();
    assert_eq!(resolved.stream.buffer_frames, 256);
}

#[test]
fn missing_profile_is_reported_by_name() {
    let temp = TempDir::new().unwrap();
    let err = resolve_profile_in(temp.path(), "ghost").unwrap_err();
    assert!(matches!(err, ConfigError::ProfileNotFound(ref n) if n == "ghost"));
}

#[test]
fn corrupt_file_is_a_parse_error() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("bad.toml"), "name = [").unwrap();
    assert!(matches!(
        resolve_profile_in(temp.path(), "bad"),
        Err(ConfigError::TomlParse(_))
    ));
}

#[test]
fn invalid_profiles_are_not_saved() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("zero.toml");
    let profile =
        SessionProfile::new("zero").with_stream(StreamConfig::default().with_channels(0, 0));
    assert!(matches!(profile.save(&path), Err(ConfigError::InvalidStream(_))));
    assert!(!path.exists());
}

#[test]
fn factory_profiles_survive_a_disk_round_trip() {
    let temp = TempDir::new().unwrap();
    for profile in factory_profiles() {
        let path = paths::profile_path_in(temp.path(), &profile.name);
        profile.save(&path).unwrap();
        assert_eq!(SessionProfile::load(&path).unwrap(), profile);
    }
}
