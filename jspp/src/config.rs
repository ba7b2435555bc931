//! Configuration file (`.jspp.json`) discovery and loading.
//!
//! A project can keep its default symbols and flags next to its sources:
//!
//! ```json
//! { "semicolon": true, "define": ["DEBUG", "NODE"] }
//! ```
//!
//! The file is looked up from the current directory upwards, stopping at the
//! home directory or the filesystem root. Command line flags add to what the
//! file sets; they never remove from it.

use crate::engine::Options;
use log::debug;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the configuration file searched for.
pub const CONFIG_FILE_NAME: &str = ".jspp.json";

/// When set (to anything), configuration discovery is skipped.
pub const NO_CONFIG_ENV: &str = "JSPP_NO_CONFIG";

/// Contents of a `.jspp.json` file
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Same as `--semicolon`
    pub semicolon: bool,
    /// Same as one `--define` per entry
    pub define: Vec<String>,
}

impl FileConfig {
    /// Combine with command line options. Flags are OR-ed, symbols unioned.
    #[must_use]
    pub fn merge_into(self, mut options: Options) -> Options {
        options.semicolon |= self.semicolon;
        options.defines.extend(self.define);
        options
    }
}

/// A configuration file that exists but cannot be used.
#[derive(Debug, thiserror::Error)]
#[error("{}: {message}", path.display())]
pub struct ConfigError {
    pub path: PathBuf,
    pub message: String,
}

/// Get the user's home directory in a cross-platform way.
pub fn get_home_dir() -> Option<PathBuf> {
    // Try HOME first (Unix-like systems)
    if let Some(home) = std::env::var_os("HOME") {
        return Some(PathBuf::from(home));
    }

    // Try USERPROFILE (Windows)
    if let Some(userprofile) = std::env::var_os("USERPROFILE") {
        return Some(PathBuf::from(userprofile));
    }

    None
}

/// Search `start` and its ancestors for [`CONFIG_FILE_NAME`]. The search ends
/// after checking `home` (when `start` is below it) or the root.
#[must_use]
pub fn find_config_path_from(start: &Path, home: Option<&Path>) -> Option<PathBuf> {
    let mut current_dir = Some(start);

    while let Some(dir) = current_dir {
        let candidate = dir.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            return Some(candidate);
        }

        if home.is_some_and(|home| dir == home) {
            break;
        }
        current_dir = dir.parent();
    }

    None
}

/// Find the configuration file for the current directory, unless discovery
/// is disabled through [`NO_CONFIG_ENV`].
#[must_use]
pub fn find_config_path() -> Option<PathBuf> {
    if std::env::var_os(NO_CONFIG_ENV).is_some() {
        return None;
    }

    let current_dir = std::env::current_dir().ok()?;
    find_config_path_from(&current_dir, get_home_dir().as_deref())
}

/// Load a configuration file. If `path` is a directory, the file is looked
/// for inside it.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read or is not a valid
/// configuration.
pub fn load_from_path(path: &Path) -> Result<FileConfig, ConfigError> {
    let config_path = if path.is_dir() {
        path.join(CONFIG_FILE_NAME)
    } else {
        path.to_path_buf()
    };

    let content = fs::read_to_string(&config_path).map_err(|e| ConfigError {
        path: config_path.clone(),
        message: e.to_string(),
    })?;

    serde_json::from_str(&content).map_err(|e| ConfigError {
        path: config_path,
        message: format!("invalid configuration: {e}"),
    })
}

/// Load the explicitly requested configuration, or the discovered one.
/// Returns `Ok(None)` when no file applies.
///
/// # Errors
///
/// See [`load_from_path`].
pub fn load_config(custom_path: Option<&Path>) -> Result<Option<FileConfig>, ConfigError> {
    let path = match custom_path {
        Some(path) => path.to_path_buf(),
        None => match find_config_path() {
            Some(path) => path,
            None => return Ok(None),
        },
    };

    debug!("loading configuration from {}", path.display());
    load_from_path(&path).map(Some)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config: FileConfig =
            serde_json::from_str(r#"{ "semicolon": true, "define": ["DEBUG", "NODE"] }"#).unwrap();
        assert!(config.semicolon);
        assert_eq!(config.define, vec!["DEBUG".to_string(), "NODE".to_string()]);
    }

    #[test]
    fn test_missing_fields_default() {
        let config: FileConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, FileConfig::default());
    }

    #[test]
    fn test_unknown_fields_rejected() {
        assert!(serde_json::from_str::<FileConfig>(r#"{ "defines": ["X"] }"#).is_err());
    }

    #[test]
    fn test_merge_adds_to_cli_options() {
        let config = FileConfig {
            semicolon: false,
            define: vec!["FILE".to_string()],
        };
        let options = config.merge_into(Options::default().with_semicolon(true).define("CLI"));
        assert!(options.semicolon);
        assert!(options.is_defined("CLI"));
        assert!(options.is_defined("FILE"));
    }

    #[test]
    fn test_find_config_in_ancestor() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("src/lib");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join(CONFIG_FILE_NAME), "{}").unwrap();

        assert_eq!(
            find_config_path_from(&nested, None),
            Some(dir.path().join(CONFIG_FILE_NAME))
        );
    }

    #[test]
    fn test_search_stops_at_home() {
        let dir = tempfile::tempdir().unwrap();
        let home = dir.path().join("home");
        let project = home.join("project");
        fs::create_dir_all(&project).unwrap();
        // Above the home boundary, must not be found
        fs::write(dir.path().join(CONFIG_FILE_NAME), "{}").unwrap();

        assert_eq!(find_config_path_from(&project, Some(&home)), None);

        fs::write(home.join(CONFIG_FILE_NAME), "{}").unwrap();
        assert_eq!(
            find_config_path_from(&project, Some(&home)),
            Some(home.join(CONFIG_FILE_NAME))
        );
    }

    #[test]
    fn test_load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE_NAME), r#"{ "semicolon": true }"#).unwrap();

        let config = load_from_path(dir.path()).unwrap();
        assert!(config.semicolon);
    }

    #[test]
    fn test_load_invalid_json_names_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{ not json").unwrap();

        let err = load_from_path(&path).unwrap_err();
        assert_eq!(err.path, path);
        assert!(err.to_string().contains("invalid configuration"));
    }

    #[test]
    fn test_explicit_missing_config_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(load_config(Some(&missing)).is_err());
    }
}
