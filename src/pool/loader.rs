//! The "parse this file" capability the pool is built around.

use std::path::Path;

use tracing::debug;

use crate::ast::Module;
use crate::dsl;
use crate::error::{DslError, Result};

/// Turns a located `.idsl` file into a [`Module`].
///
/// The pool only ever asks for files it has not cached yet, so an
/// implementation sees each path at most once per pool (or once per
/// `reload`).
pub trait ModuleLoader: Send + Sync {
    fn load(&self, path: &Path) -> Result<Module>;
}

/// Reads the file from disk and runs the interface grammar over it.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileModuleLoader;

impl ModuleLoader for FileModuleLoader {
    fn load(&self, path: &Path) -> Result<Module> {
        debug!(path = %path.display(), "parsing interface file");
        let content = std::fs::read_to_string(path).map_err(|e| DslError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        parse_module(&content, Some(path))
    }
}

/// Parse interface text into a module, recording where it came from.
pub fn parse_module(content: &str, path: Option<&Path>) -> Result<Module> {
    let tree = dsl::parse_interface(content)?;
    Ok(Module::from_tree(tree, path.map(Path::to_path_buf)))
}

impl<F> ModuleLoader for F
where
    F: Fn(&Path) -> Result<Module> + Send + Sync,
{
    fn load(&self, path: &Path) -> Result<Module> {
        self(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_loader_records_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Ping.idsl");
        std::fs::write(&path, "module RoboCompPing { interface Ping { void ping(); }; };").unwrap();
        let module = FileModuleLoader.load(&path).unwrap();
        assert_eq!(module.name, "RoboCompPing");
        assert_eq!(module.file_path.as_deref(), Some(path.as_path()));
        assert_eq!(module.pool_key(), "Ping");
    }

    #[test]
    fn test_file_loader_missing_file() {
        let err = FileModuleLoader.load(Path::new("/no/such/Thing.idsl")).unwrap_err();
        assert!(matches!(err, DslError::FileRead { .. }));
    }

    #[test]
    fn test_closure_loader() {
        let loader = |_: &Path| parse_module("module M { };", None);
        assert_eq!(loader.load(Path::new("M.idsl")).unwrap().name, "M");
    }
}
