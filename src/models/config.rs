//! Configuration model for agodoc

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// agodoc configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AgodocConfig {
    #[serde(default)]
    pub viewer: ViewerConfig,

    #[serde(default)]
    pub editor: EditorConfig,

    #[serde(default)]
    pub resolve: ResolveConfig,
}

/// External documentation viewer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewerConfig {
    #[serde(default = "defaults::program")]
    pub program: String,

    /// Arguments placed before the package path and identifier
    #[serde(default = "defaults::args")]
    pub args: Vec<String>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            program: defaults::program(),
            args: defaults::args(),
        }
    }
}

/// Acme connection settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EditorConfig {
    /// plan9port namespace directory holding the `acme` socket
    pub namespace: Option<PathBuf>,
}

/// Identifier resolution policy
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ResolveConfig {
    /// Refuse to look up unexported identifiers
    #[serde(default)]
    pub exported_only: bool,
}

mod defaults {
    pub fn program() -> String {
        "go".to_string()
    }
    pub fn args() -> Vec<String> {
        vec!["doc".to_string()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AgodocConfig::default();
        assert_eq!(config.viewer.program, "go");
        assert_eq!(config.viewer.args, vec!["doc"]);
        assert!(config.editor.namespace.is_none());
        assert!(!config.resolve.exported_only);
    }

    #[test]
    fn test_partial_toml() {
        let config: AgodocConfig = toml::from_str(
            r#"
            [viewer]
            program = "godoc"
            args = []

            [resolve]
            exported_only = true
            "#,
        )
        .unwrap();
        assert_eq!(config.viewer.program, "godoc");
        assert!(config.viewer.args.is_empty());
        assert!(config.resolve.exported_only);
        assert!(config.editor.namespace.is_none());
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config: AgodocConfig = toml::from_str("").unwrap();
        assert_eq!(config.viewer.program, "go");
    }
}
