//! Platform-specific paths for session profiles.
//!
//! - **User profiles**: `~/.config/openasio/profiles/` (Linux),
//!   `~/Library/Application Support/openasio/profiles/` (macOS),
//!   `%APPDATA%\openasio\profiles\` (Windows)
//!
//! Every lookup has a `*_in` variant taking an explicit directory, which is
//! what tests use.

use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Application name used for directory paths.
const APP_NAME: &str = "openasio";

/// Subdirectory name for profiles.
const PROFILES_SUBDIR: &str = "profiles";

/// Profile file extension.
const EXTENSION: &str = "toml";

/// Returns the user-specific configuration directory.
///
/// Falls back to the current directory if the platform config directory
/// cannot be determined.
pub fn user_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Returns the user-specific profiles directory.
pub fn user_profiles_dir() -> PathBuf {
    user_config_dir().join(PROFILES_SUBDIR)
}

/// Ensure the user profiles directory exists.
pub fn ensure_user_profiles_dir() -> Result<PathBuf, ConfigError> {
    let dir = user_profiles_dir();
    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| ConfigError::create_dir(&dir, e))?;
    }
    Ok(dir)
}

/// File path a profile called `name` is stored under in `dir`.
pub fn profile_path_in(dir: &Path, name: &str) -> PathBuf {
    let file = if has_toml_extension(Path::new(name)) {
        name.to_string()
    } else {
        format!("{name}.{EXTENSION}")
    };
    dir.join(file)
}

/// Find a profile by path, or by name in the user profiles directory.
pub fn find_profile(name: &str) -> Option<PathBuf> {
    find_profile_in(&user_profiles_dir(), name)
}

/// Find a profile by path, or by name in `dir`.
pub fn find_profile_in(dir: &Path, name: &str) -> Option<PathBuf> {
    let path = PathBuf::from(name);
    if path.is_file() {
        return Some(path);
    }
    let candidate = profile_path_in(dir, name);
    candidate.is_file().then_some(candidate)
}

/// Profile files in the user profiles directory, sorted by path.
pub fn list_user_profiles() -> Vec<PathBuf> {
    list_profiles_in(&user_profiles_dir())
}

/// Profile files in `dir`, sorted by path.
///
/// Returns an empty vector if the directory doesn't exist or can't be read.
pub fn list_profiles_in(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut profiles: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && has_toml_extension(path))
        .collect();
    profiles.sort();
    profiles
}

/// Profile name from a file path (the file stem).
pub fn profile_name_from_path(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.to_string())
}

fn has_toml_extension(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn user_dirs_are_namespaced() {
        assert!(user_config_dir().ends_with(APP_NAME));
        assert!(user_profiles_dir().ends_with("openasio/profiles"));
    }

    #[test]
    fn profile_path_adds_extension_once() {
        let dir = Path::new("/p");
        assert_eq!(profile_path_in(dir, "studio"), PathBuf::from("/p/studio.toml"));
        assert_eq!(profile_path_in(dir, "studio.toml"), PathBuf::from("/p/studio.toml"));
    }

    #[test]
    fn find_by_name_and_by_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("live.toml");
        fs::write(&path, "name = \"live\"").unwrap();

        assert_eq!(find_profile_in(temp.path(), "live"), Some(path.clone()));
        assert_eq!(
            find_profile_in(Path::new("/nonexistent"), path.to_str().unwrap()),
            Some(path)
        );
        assert!(find_profile_in(temp.path(), "missing").is_none());
    }

    #[test]
    fn list_filters_and_sorts() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("b.toml"), "").unwrap();
        fs::write(temp.path().join("a.toml"), "").unwrap();
        fs::write(temp.path().join("notes.txt"), "").unwrap();
        fs::create_dir(temp.path().join("dir.toml")).unwrap();

        let names: Vec<String> = list_profiles_in(temp.path())
            .iter()
            .filter_map(|p| profile_name_from_path(p))
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn list_missing_dir_is_empty() {
        assert!(list_profiles_in(Path::new("/nonexistent/openasio/12345")).is_empty());
    }
}
