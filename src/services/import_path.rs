//! Import path of the package being edited
//!
//! Module mode first (`go.mod` in the directory or a parent), then GOPATH,
//! then GOROOT. A directory outside all of them gets a local import path.

use std::path::{Path, PathBuf};

use crate::error::ResolveError;

const GO_MOD: &str = "go.mod";

/// Build environment used to derive import paths.
#[derive(Debug, Clone, Default)]
pub struct ImportPathFinder {
    gopath: Vec<PathBuf>,
    goroot: Option<PathBuf>,
}

impl ImportPathFinder {
    pub fn new(gopath: Vec<PathBuf>, goroot: Option<PathBuf>) -> Self {
        Self { gopath, goroot }
    }

    /// `$GOPATH` (default `~/go`) and `$GOROOT`.
    pub fn from_env() -> Self {
        let gopath = match std::env::var_os("GOPATH") {
            Some(value) if !value.is_empty() => std::env::split_paths(&value).collect(),
            _ => dirs::home_dir()
                .map(|home| vec![home.join("go")])
                .unwrap_or_default(),
        };
        let goroot = std::env::var_os("GOROOT")
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);
        Self::new(gopath, goroot)
    }

    /// Import path of the package in `dir`.
    pub async fn import_path(&self, dir: &Path) -> Result<String, ResolveError> {
        let dir = std::path::absolute(dir).map_err(|e| ResolveError::ImportPath {
            dir: dir.to_path_buf(),
            message: e.to_string(),
        })?;

        if let Some(path) = module_import_path(&dir).await? {
            tracing::debug!("Import path from {}: {}", GO_MOD, path);
            return Ok(path);
        }

        let roots = self.gopath.iter().chain(self.goroot.iter());
        for root in roots {
            if let Ok(rel) = dir.strip_prefix(root.join("src"))
                && !rel.as_os_str().is_empty()
            {
                return Ok(slash_path(rel));
            }
        }

        Ok(format!("_{}", dir.display()))
    }
}

/// Import path from the nearest enclosing `go.mod`, if any.
async fn module_import_path(dir: &Path) -> Result<Option<String>, ResolveError> {
    for root in dir.ancestors() {
        let go_mod = root.join(GO_MOD);
        let contents = match tokio::fs::read_to_string(&go_mod).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => {
                return Err(ResolveError::ImportPath {
                    dir: dir.to_path_buf(),
                    message: format!("{}: {}", go_mod.display(), e),
                });
            }
        };
        let Some(module) = parse_module_path(&contents) else {
            return Err(ResolveError::ImportPath {
                dir: dir.to_path_buf(),
                message: format!("{}: no module directive", go_mod.display()),
            });
        };
        let rel = dir.strip_prefix(root).unwrap_or(Path::new(""));
        if rel.as_os_str().is_empty() {
            return Ok(Some(module));
        }
        return Ok(Some(format!("{}/{}", module, slash_path(rel))));
    }
    Ok(None)
}

/// Module path from the `module` directive of a go.mod file.
pub fn parse_module_path(go_mod: &str) -> Option<String> {
    go_mod.lines().find_map(|line| {
        let line = line.split("//").next().unwrap_or_default().trim();
        let rest = line.strip_prefix("module")?;
        if !rest.starts_with(char::is_whitespace) && !rest.starts_with('"') {
            return None;
        }
        let path = rest.trim().trim_matches(|c| c == '"' || c == '`');
        (!path.is_empty()).then(|| path.to_string())
    })
}

fn slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_parse_module_path() {
        assert_eq!(
            parse_module_path("module example.com/m\n\ngo 1.22\n").as_deref(),
            Some("example.com/m")
        );
        assert_eq!(
            parse_module_path("// comment\nmodule \"example.com/q\" // trailing\n").as_deref(),
            Some("example.com/q")
        );
        assert_eq!(parse_module_path("modules are fun\n"), None);
        assert_eq!(parse_module_path("go 1.22\n"), None);
    }

    #[tokio::test]
    async fn test_module_root_and_subdirectory() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::write(root.join("go.mod"), "module example.com/m\n\ngo 1.22\n").unwrap();
        fs::create_dir_all(root.join("pkg/util")).unwrap();

        let finder = ImportPathFinder::default();
        assert_eq!(finder.import_path(root).await.unwrap(), "example.com/m");
        assert_eq!(
            finder.import_path(&root.join("pkg/util")).await.unwrap(),
            "example.com/m/pkg/util"
        );
    }

    #[tokio::test]
    async fn test_gopath() {
        let temp = TempDir::new().unwrap();
        let gopath = temp.path().join("gopath");
        let dir = gopath.join("src/github.com/user/repo");
        fs::create_dir_all(&dir).unwrap();

        let finder = ImportPathFinder::new(vec![gopath], None);
        assert_eq!(
            finder.import_path(&dir).await.unwrap(),
            "github.com/user/repo"
        );
    }

    #[tokio::test]
    async fn test_goroot() {
        let temp = TempDir::new().unwrap();
        let goroot = temp.path().join("goroot");
        let dir = goroot.join("src/net/http");
        fs::create_dir_all(&dir).unwrap();

        let finder = ImportPathFinder::new(Vec::new(), Some(goroot));
        assert_eq!(finder.import_path(&dir).await.unwrap(), "net/http");
    }

    #[tokio::test]
    async fn test_local_import_path() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("scratch");
        fs::create_dir_all(&dir).unwrap();

        let finder = ImportPathFinder::default();
        assert_eq!(
            finder.import_path(&dir).await.unwrap(),
            format!("_{}", dir.display())
        );
    }

    #[tokio::test]
    async fn test_missing_module_directive() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("go.mod"), "go 1.22\n").unwrap();

        let err = ImportPathFinder::default()
            .import_path(temp.path())
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::ImportPath { .. }));
    }
}
