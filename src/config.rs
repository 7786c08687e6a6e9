//! Launch context
//!
//! Acme runs agodoc from the window's directory with `$winid` naming the
//! window; both are fixed for the lifetime of the process.

use std::path::PathBuf;

use crate::error::{AgodocResult, EditorError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchConfig {
    pub winid: u32,
    /// Directory of the package being edited
    pub cwd: PathBuf,
}

impl LaunchConfig {
    pub fn from_env() -> AgodocResult<Self> {
        let cwd = std::env::current_dir()?;
        Ok(Self::from_vars(std::env::var("winid").ok(), cwd)?)
    }

    pub fn from_vars(winid: Option<String>, cwd: PathBuf) -> Result<Self, EditorError> {
        let Some(raw) = winid.filter(|s| !s.is_empty()) else {
            return Err(EditorError::MissingWindowId);
        };
        let winid = raw
            .trim()
            .parse()
            .map_err(|_| EditorError::InvalidWindowId(raw.clone()))?;
        Ok(Self { winid, cwd })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_vars() {
        let config = LaunchConfig::from_vars(Some("42".to_string()), PathBuf::from("/src/p")).unwrap();
        assert_eq!(config.winid, 42);
        assert_eq!(config.cwd, PathBuf::from("/src/p"));
    }

    #[test]
    fn test_missing_winid() {
        assert!(matches!(
            LaunchConfig::from_vars(None, PathBuf::new()),
            Err(EditorError::MissingWindowId)
        ));
        assert!(matches!(
            LaunchConfig::from_vars(Some(String::new()), PathBuf::new()),
            Err(EditorError::MissingWindowId)
        ));
    }

    #[test]
    fn test_invalid_winid() {
        assert!(matches!(
            LaunchConfig::from_vars(Some("seven".to_string()), PathBuf::new()),
            Err(EditorError::InvalidWindowId(ref raw)) if raw == "seven"
        ));
    }
}
