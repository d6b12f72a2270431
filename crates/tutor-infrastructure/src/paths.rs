//! Unified path management for tutor configuration files.
//!
//! Platform directories are resolved with the `dirs` crate (XDG on Linux,
//! `Application Support` on macOS, `AppData` on Windows).

use std::path::PathBuf;

const APP_DIR: &str = "tutor";
const CONFIG_FILE: &str = "config.toml";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// The platform configuration directory could not be determined.
    ConfigDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::ConfigDirNotFound => write!(f, "Cannot find configuration directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// Path layout of the tutor client.
///
/// # Directory Structure
///
/// ```text
/// ~/.config/tutor/
/// └── config.toml      # Background task, timeout, notification and logging settings
/// ```
pub struct TutorPaths;

impl TutorPaths {
    /// Returns the tutor configuration directory (e.g. `~/.config/tutor/`).
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::ConfigDirNotFound)
    }

    /// Returns the path to the main configuration file.
    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join(CONFIG_FILE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_file_lives_in_app_dir() {
        // Not every CI sandbox has a resolvable config dir
        let (Ok(dir), Ok(file)) = (TutorPaths::config_dir(), TutorPaths::config_file()) else {
            return;
        };

        assert!(dir.ends_with(APP_DIR));
        assert_eq!(file.parent(), Some(dir.as_path()));
        assert_eq!(file.file_name().and_then(|n| n.to_str()), Some(CONFIG_FILE));
    }
}
