//! Configuration file discovery and loading

use super::RecastConfig;
use crate::error::RecastError;
use crate::result::Result;
use std::path::{Path, PathBuf};

/// File names searched for, in priority order
pub const CONFIG_FILE_NAMES: &[&str] = &["recast.toml", "recast.json"];

/// Configuration loader for discovering and loading config files
pub struct ConfigLoader;

impl ConfigLoader {
    /// Auto-discover a config file by traversing upward from `start_path`
    ///
    /// `recast.toml` wins over `recast.json` in the same directory.
    pub fn auto_discover(start_path: &Path) -> Result<Option<PathBuf>> {
        let mut current = start_path
            .canonicalize()
            .map_err(|e| RecastError::config_error(format!("Invalid path: {e}")))?;

        loop {
            for filename in CONFIG_FILE_NAMES {
                let config_path = current.join(filename);
                if config_path.is_file() {
                    tracing::debug!("Found config: {}", config_path.display());
                    return Ok(Some(config_path));
                }
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => break,
            }
        }

        Ok(None)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<RecastConfig> {
        RecastConfig::load(path).map_err(|e| match e {
            RecastError::ConfigError { message } => RecastError::config_error(format!(
                "Failed to load config from '{}': {message}",
                path.display()
            )),
            other => other,
        })
    }

    /// Load config from an explicit path, or discover one
    ///
    /// Without an explicit path and without a discovered file the defaults
    /// are used.
    pub fn load(custom_path: Option<&Path>, start_dir: Option<&Path>) -> Result<RecastConfig> {
        if let Some(path) = custom_path {
            if !path.exists() {
                return Err(RecastError::config_error(format!(
                    "Config file not found: {}. Run 'recast config init' to create one.",
                    path.display()
                )));
            }
            return Self::load_from_file(path);
        }

        let search_dir = start_dir.unwrap_or_else(|| Path::new("."));
        match Self::auto_discover(search_dir)? {
            Some(path) => Self::load_from_file(&path),
            None => {
                tracing::debug!("No config file found, using defaults");
                Ok(RecastConfig::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_temp_config(dir: &Path, filename: &str, content: &str) -> PathBuf {
        let path = dir.join(filename);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_from_file_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = create_temp_config(
            temp_dir.path(),
            "recast.toml",
            r#"
recipes = ["remove-unused-local-variables"]

[engine]
maxPasses = 4
"#,
        );

        let config = ConfigLoader::load_from_file(&config_path).unwrap();
        assert_eq!(config.engine.max_passes, 4);
        assert_eq!(config.recipes, vec!["remove-unused-local-variables"]);
    }

    #[test]
    fn test_auto_discover_from_nested_dir() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("src/main/java");
        fs::create_dir_all(&nested).unwrap();
        create_temp_config(temp_dir.path(), "recast.json", r#"{"recipes": []}"#);

        let found = ConfigLoader::auto_discover(&nested).unwrap();
        assert_eq!(found.unwrap().file_name().unwrap(), "recast.json");
    }

    #[test]
    fn test_toml_preferred_over_json() {
        let temp_dir = TempDir::new().unwrap();
        create_temp_config(temp_dir.path(), "recast.json", "{}");
        create_temp_config(temp_dir.path(), "recast.toml", "");

        let found = ConfigLoader::auto_discover(temp_dir.path()).unwrap();
        assert_eq!(found.unwrap().file_name().unwrap(), "recast.toml");
    }

    #[test]
    fn test_load_invalid_json() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = create_temp_config(temp_dir.path(), "recast.json", "{ invalid json }");

        let err = ConfigLoader::load_from_file(&config_path).unwrap_err();
        assert!(err.to_string().contains("Failed to load config"));
    }

    #[test]
    fn test_zero_passes_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let config_path =
            create_temp_config(temp_dir.path(), "recast.toml", "[engine]\nmaxPasses = 0\n");
        assert!(ConfigLoader::load_from_file(&config_path).is_err());
    }

    #[test]
    fn test_load_missing_custom_path() {
        let result = ConfigLoader::load(Some(Path::new("does/not/exist.toml")), None);
        assert!(result.is_err());
    }

    #[test]
    fn test_load_unsupported_extension() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = create_temp_config(temp_dir.path(), "recast.yaml", "recipes: []");
        assert!(ConfigLoader::load_from_file(&config_path).is_err());
    }
}
