use crate::error::DlaError;
use crate::settings::SimulationSettings;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Complete application configuration for export/import
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Version field for future compatibility
    pub version: u32,
    /// Walker and engine settings
    pub settings: SimulationSettings,
    /// Where `run` writes the cluster
    pub output: PathBuf,
    /// Box sizes for box counting. Empty means powers of two up to the cluster span.
    pub box_sizes: Vec<usize>,
    /// Radii for the mass-radius estimator. Empty means up to the covering radius.
    pub radii: Vec<usize>,
}

impl AppConfig {
    /// Export config to a JSON file
    pub fn save_to_file(&self, path: &Path) -> Result<(), DlaError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Import config from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self, DlaError> {
        let content = fs::read_to_string(path).map_err(|e| {
            DlaError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&content)
            .map_err(|e| DlaError::Config(format!("failed to parse {}: {}", path.display(), e)))
    }

    /// Default config location, `<config_dir>/dla-fractal/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("dla-fractal").join("config.json"))
    }

    /// Load an explicit config file, else the default location if it exists, else defaults
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self, DlaError> {
        if let Some(path) = explicit {
            return Self::load_from_file(path);
        }
        match Self::default_path() {
            Some(path) if path.is_file() => {
                tracing::debug!(path = %path.display(), "Loading default config");
                Self::load_from_file(&path)
            }
            _ => Ok(Self::default()),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: 1,
            settings: SimulationSettings::default(),
            output: PathBuf::from("cluster.txt"),
            box_sizes: Vec::new(),
            radii: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{NeighborhoodType, SpawnMode};
    use tempfile::NamedTempFile;

    #[test]
    fn test_config_serialization_roundtrip() {
        let config = AppConfig {
            version: 1,
            settings: SimulationSettings {
                neighborhood: NeighborhoodType::Moore,
                spawn_mode: SpawnMode::Edges,
                spawn_radius_offset: 12.0,
                escape_multiplier: None,
                max_attempts: Some(50_000),
            },
            output: PathBuf::from("out/cluster.txt"),
            box_sizes: vec![1, 2, 4, 8],
            radii: vec![1, 2, 3],
        };

        let json = serde_json::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed, config);
    }

    #[test]
    fn test_config_file_save_and_load() {
        let config = AppConfig::default();

        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path().to_path_buf();

        config.save_to_file(&path).unwrap();
        let loaded = AppConfig::load_or_default(Some(path.as_path())).unwrap();

        assert_eq!(loaded.version, config.version);
        assert_eq!(loaded.output, PathBuf::from("cluster.txt"));
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let parsed: AppConfig = serde_json::from_str(r#"{"box_sizes":[2,4]}"#).unwrap();
        assert_eq!(parsed.box_sizes, vec![2, 4]);
        assert_eq!(parsed.settings, SimulationSettings::default());
        assert_eq!(parsed.output, PathBuf::from("cluster.txt"));
    }

    #[test]
    fn test_invalid_config_file() {
        let temp_file = NamedTempFile::new().unwrap();
        std::fs::write(temp_file.path(), "not valid json").unwrap();

        let result = AppConfig::load_from_file(temp_file.path());
        assert!(matches!(result, Err(DlaError::Config(_))));
    }

    #[test]
    fn test_missing_config_file() {
        let result = AppConfig::load_from_file(Path::new("/nonexistent/path/config.json"));
        assert!(result.is_err());
    }
}
