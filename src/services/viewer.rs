//! Documentation viewer
//!
//! Runs an external program with the lookup key appended to its configured
//! arguments. Its output goes straight to ours, which Acme collects in the
//! `+Errors` window.

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::ViewerError;
use crate::models::config::ViewerConfig;
use crate::models::symbol::LookupKey;

#[async_trait]
pub trait ViewerService: Send + Sync {
    /// Show the documentation for `key`, waiting for the viewer to exit.
    async fn show(&self, key: &LookupKey) -> Result<(), ViewerError>;
}

pub struct DefaultViewerService {
    program: String,
    args: Vec<String>,
}

impl DefaultViewerService {
    pub fn new(config: &ViewerConfig) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
        }
    }

    /// Full argument list for `key`.
    pub fn command_line(&self, key: &LookupKey) -> Vec<String> {
        let mut args = self.args.clone();
        args.extend(key.args().into_iter().map(str::to_string));
        args
    }
}

#[async_trait]
impl ViewerService for DefaultViewerService {
    async fn show(&self, key: &LookupKey) -> Result<(), ViewerError> {
        let args = self.command_line(key);
        tracing::debug!("Running {} {}", self.program, args.join(" "));

        let status = Command::new(&self.program)
            .args(&args)
            .stdin(std::process::Stdio::null())
            .status()
            .await
            .map_err(|source| ViewerError::Launch {
                program: self.program.clone(),
                source,
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(ViewerError::Exit {
                program: self.program.clone(),
                status,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewer(program: &str, args: &[&str]) -> DefaultViewerService {
        DefaultViewerService::new(&ViewerConfig {
            program: program.to_string(),
            args: args.iter().map(|s| s.to_string()).collect(),
        })
    }

    #[test]
    fn test_command_line() {
        let viewer = viewer("go", &["doc"]);
        assert_eq!(
            viewer.command_line(&LookupKey::new("io", "Reader")),
            vec!["doc", "io", "Reader"]
        );
        assert_eq!(
            viewer.command_line(&LookupKey::package("net/http")),
            vec!["doc", "net/http"]
        );
        assert_eq!(
            viewer.command_line(&LookupKey::builtin("append")),
            vec!["doc", "builtin", "append"]
        );
    }

    #[tokio::test]
    async fn test_show_success() {
        let viewer = viewer("true", &[]);
        viewer.show(&LookupKey::new("io", "Reader")).await.unwrap();
    }

    #[tokio::test]
    async fn test_show_nonzero_exit() {
        let viewer = viewer("false", &[]);
        let err = viewer.show(&LookupKey::package("fmt")).await.unwrap_err();
        assert!(matches!(err, ViewerError::Exit { ref program, .. } if program == "false"));
    }

    #[tokio::test]
    async fn test_show_missing_program() {
        let viewer = viewer("agodoc-no-such-viewer", &["doc"]);
        let err = viewer.show(&LookupKey::package("fmt")).await.unwrap_err();
        assert!(matches!(err, ViewerError::Launch { .. }));
    }
}
