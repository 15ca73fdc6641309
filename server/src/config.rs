use serde::Deserialize;
use std::path::PathBuf;

/// `ServerConfig` (SPEC_FULL.md §4.0): loaded once from an optional
/// `toml` file at startup; every field has a compiled-in default so a
/// missing config file is not an error, matching the teacher's own
/// workspace-wide `toml` dependency used the same way for project
/// config.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Path to the local text-generation model file. `None` runs with
    /// `manole_model::NullModel` (tests, or a deliberately model-less
    /// deployment).
    pub model_path: Option<PathBuf>,
    /// Path to a vision-capable model for `ImageCaptioner`. Absent means
    /// no directory ever starts a captioner thread (SPEC_FULL.md §9).
    pub vision_model_path: Option<PathBuf>,
    /// Where `list_indexes` looks for directories this process has
    /// previously initialized.
    pub registry_path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            model_path: None,
            vision_model_path: None,
            registry_path: default_registry_path(),
        }
    }
}

fn default_registry_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("manole")
        .join("known_directories.json")
}

impl ServerConfig {
    pub fn load(path: Option<&std::path::Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("reading config {path:?}: {e}"))?;
        let config: Self = toml::from_str(&raw)
            .map_err(|e| anyhow::anyhow!("parsing config {path:?}: {e}"))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_config_path_uses_defaults() {
        let config = ServerConfig::load(None).unwrap();
        assert!(config.model_path.is_none());
    }

    #[test]
    fn loads_a_partial_toml_file_over_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manole.toml");
        std::fs::write(&path, "model_path = \"/opt/models/model.gguf\"\n").unwrap();
        let config = ServerConfig::load(Some(&path)).unwrap();
        assert_eq!(config.model_path, Some(PathBuf::from("/opt/models/model.gguf")));
        assert!(config.vision_model_path.is_none());
    }
}
