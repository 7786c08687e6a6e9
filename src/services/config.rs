//! Configuration service for agodoc

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::ConfigError;
use crate::models::config::AgodocConfig;

#[async_trait]
pub trait ConfigService: Send + Sync {
    async fn load(&self) -> Result<AgodocConfig, ConfigError>;
    fn config_path(&self) -> PathBuf;
}

pub struct DefaultConfigService {
    path: PathBuf,
}

impl Default for DefaultConfigService {
    fn default() -> Self {
        Self::new(Self::global_config_path())
    }
}

impl DefaultConfigService {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn global_config_path() -> PathBuf {
        // XDG standard: ~/.config/agodoc/config.toml
        std::env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .ok()
            .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."))
            .join("agodoc")
            .join("config.toml")
    }

    async fn load_from_path(path: &Path) -> Result<AgodocConfig, ConfigError> {
        if !path.exists() {
            return Ok(AgodocConfig::default());
        }
        let content = tokio::fs::read_to_string(path).await?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

#[async_trait]
impl ConfigService for DefaultConfigService {
    async fn load(&self) -> Result<AgodocConfig, ConfigError> {
        let config = Self::load_from_path(&self.path).await?;
        apply_env_overrides(config, |key| std::env::var(key).ok())
    }

    fn config_path(&self) -> PathBuf {
        self.path.clone()
    }
}

/// Environment settings win over the config file.
pub fn apply_env_overrides(
    mut config: AgodocConfig,
    var: impl Fn(&str) -> Option<String>,
) -> Result<AgodocConfig, ConfigError> {
    if let Some(val) = var("AGODOC_VIEWER") {
        let mut words = val.split_whitespace().map(String::from);
        let Some(program) = words.next() else {
            return Err(ConfigError::InvalidValue {
                key: "AGODOC_VIEWER".to_string(),
                message: "empty command".to_string(),
            });
        };
        config.viewer.program = program;
        config.viewer.args = words.collect();
    }
    if let Some(val) = var("NAMESPACE")
        && !val.is_empty()
    {
        config.editor.namespace = Some(PathBuf::from(val));
    }
    if let Some(val) = var("AGODOC_EXPORTED_ONLY") {
        config.resolve.exported_only = match val.as_str() {
            "1" | "true" => true,
            "0" | "false" => false,
            _ => {
                return Err(ConfigError::InvalidValue {
                    key: "AGODOC_EXPORTED_ONLY".to_string(),
                    message: format!("expected true or false, got {val:?}"),
                });
            }
        };
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[tokio::test]
    async fn test_missing_file_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let config = DefaultConfigService::load_from_path(&temp.path().join("config.toml"))
            .await
            .unwrap();
        assert_eq!(config.viewer.program, "go");
        assert_eq!(config.viewer.args, vec!["doc"]);
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(
            &path,
            "[viewer]\nprogram = \"godoc-lite\"\nargs = [\"-all\"]\n\n[editor]\nnamespace = \"/run/ns\"\n",
        )
        .unwrap();

        let config = DefaultConfigService::load_from_path(&path).await.unwrap();
        assert_eq!(config.viewer.program, "godoc-lite");
        assert_eq!(config.viewer.args, vec!["-all"]);
        assert_eq!(config.editor.namespace, Some(PathBuf::from("/run/ns")));
        assert_eq!(DefaultConfigService::new(&path).config_path(), path);
    }

    #[tokio::test]
    async fn test_invalid_toml() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "[viewer\nprogram = ").unwrap();

        let err = DefaultConfigService::load_from_path(&path).await.unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_env_overrides() {
        let config = apply_env_overrides(
            AgodocConfig::default(),
            env(&[
                ("AGODOC_VIEWER", "go doc -u"),
                ("NAMESPACE", "/tmp/ns.glenda.:0"),
                ("AGODOC_EXPORTED_ONLY", "true"),
            ]),
        )
        .unwrap();
        assert_eq!(config.viewer.program, "go");
        assert_eq!(config.viewer.args, vec!["doc", "-u"]);
        assert_eq!(
            config.editor.namespace,
            Some(PathBuf::from("/tmp/ns.glenda.:0"))
        );
        assert!(config.resolve.exported_only);
    }

    #[test]
    fn test_no_overrides() {
        let config = apply_env_overrides(AgodocConfig::default(), env(&[])).unwrap();
        assert_eq!(config.viewer.program, "go");
        assert!(config.editor.namespace.is_none());
        assert!(!config.resolve.exported_only);
    }

    #[test]
    fn test_invalid_overrides() {
        let err = apply_env_overrides(
            AgodocConfig::default(),
            env(&[("AGODOC_EXPORTED_ONLY", "maybe")]),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "AGODOC_EXPORTED_ONLY"));

        let err = apply_env_overrides(AgodocConfig::default(), env(&[("AGODOC_VIEWER", "  ")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}
