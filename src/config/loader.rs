use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use super::types::GlobalConfig;

const DEFAULT_CONFIG_PATHS: &[&str] = &[
    "./siteup.yaml",
    "./deploy/siteup.yaml",
    "/etc/siteup/config.yaml",
];

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration, trying a custom path first, then the default
    /// candidates, then built-in defaults.
    pub fn load_with_custom_path(custom_path: Option<&Path>) -> Result<GlobalConfig> {
        if let Some(path) = custom_path {
            if path.exists() {
                return Self::load_from_file(path)
                    .with_context(|| format!("Failed to load config from custom path: {:?}", path));
            }
            tracing::warn!(
                "Custom config path does not exist: {:?}, falling back to defaults",
                path
            );
        }

        for path in Self::candidate_paths() {
            if path.exists() {
                match Self::load_from_file(&path) {
                    Ok(config) => {
                        tracing::info!("Loaded configuration from: {:?}", path);
                        return Ok(config);
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                        continue;
                    }
                }
            }
        }

        tracing::info!("No configuration file found, using default settings");
        Ok(GlobalConfig::default())
    }

    fn candidate_paths() -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = DEFAULT_CONFIG_PATHS.iter().map(PathBuf::from).collect();

        if let Some(dirs) = directories::ProjectDirs::from("", "", "siteup") {
            paths.push(dirs.config_dir().join("config.yaml"));
        }

        paths
    }

    fn load_from_file(path: &Path) -> Result<GlobalConfig> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let config: GlobalConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML config: {:?}", path))?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_custom_path_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("siteup.yaml");
        std::fs::write(&path, "tools:\n  service_unit: httpd\n").unwrap();

        let config = ConfigLoader::load_with_custom_path(Some(&path)).unwrap();
        assert_eq!(config.tools.service_unit, "httpd");
    }

    #[test]
    fn test_missing_custom_path_falls_back_to_defaults() {
        let config =
            ConfigLoader::load_with_custom_path(Some(Path::new("/nonexistent/siteup.yaml")))
                .unwrap();
        assert_eq!(config.tools.service_unit, "apache2");
    }

    #[test]
    fn test_invalid_yaml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("siteup.yaml");
        std::fs::write(&path, "tools: [not, a, mapping]\n").unwrap();

        assert!(ConfigLoader::load_with_custom_path(Some(&path)).is_err());
    }
}
